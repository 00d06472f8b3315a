use std::sync::Arc;

use credpay::SettlementClient;

use crate::config::CredpayConfig;

/// Shared application state
pub struct AppState<S> {
    pub config: Arc<CredpayConfig>,
    pub settlement: Arc<S>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            settlement: Arc::clone(&self.settlement),
        }
    }
}

impl<S: SettlementClient> AppState<S> {
    pub fn new(config: CredpayConfig, settlement: S) -> Self {
        Self {
            config: Arc::new(config),
            settlement: Arc::new(settlement),
        }
    }
}
