pub mod delegated;
pub mod health;
pub mod premium;

use actix_web::web;
use credpay::SettlementClient;

/// Mount every route for a server settling through `S`.
pub fn configure<S: SettlementClient + 'static>(cfg: &mut web::ServiceConfig) {
    premium::configure::<S>(cfg);
    delegated::configure::<S>(cfg);
    health::configure::<S>(cfg);
}
