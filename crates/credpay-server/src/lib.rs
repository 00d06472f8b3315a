//! Credpay resource server: a paywalled endpoint plus a delegated payer.
//!
//! `GET /api/premium` is gated by the [`guard`]: without a valid `x-payment`
//! proof it answers 402 with the settlement provider's challenge.
//! `POST /api/credpay` is the [`gateway`]: it pays for a target resource from
//! the configured payer wallet and relays the final response.
//!
//! # Modules
//!
//! - [`config`]: environment configuration ([`CredpayConfig`])
//! - [`guard`]: resource guard ([`require_payment`](guard::require_payment))
//! - [`gateway`]: delegated payer ([`delegated_pay`](gateway::delegated_pay))
//! - [`relay`]: settlement outcome to HTTP response conversion
//! - [`metrics`]: Prometheus metrics for challenges and settlements

pub mod config;
pub mod cors;
pub mod error;
pub mod gateway;
pub mod guard;
pub mod metrics;
pub mod relay;
pub mod routes;
pub mod state;

pub use config::{ConfigError, CredpayConfig};
pub use error::ServerError;
pub use state::AppState;
