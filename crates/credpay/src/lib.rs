//! Credpay: x402 pay-per-request gating with a delegated payer.
//!
//! A resource server answers unpaid requests with HTTP 402 and a
//! machine-readable challenge. A delegated payer can satisfy that challenge on
//! behalf of a caller who has no wallet, retry the request with proof attached,
//! and hand back the final response.
//!
//! # Roles
//!
//! - **Resource guard**: asks a [`SettlementClient`] to validate the
//!   `x-payment` proof and either serves the resource or relays the challenge
//! - **Delegated payer**: asks the [`SettlementClient`] to pay for a target
//!   resource and relays whatever the target finally returned
//! - **Settlement provider**: external service behind the
//!   [`SettlementClient`] trait; [`HostedSettlementClient`] talks to a hosted
//!   x402 API over HTTP
//!
//! # Quick example
//!
//! ```no_run
//! use credpay::{FetchRequest, HostedSettlementClient, PayerIdentity, SettlementClient};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let settlement = HostedSettlementClient::builder()
//!     .secret_key("sk_live_...")
//!     .build()
//!     .unwrap();
//!
//! let payer = PayerIdentity::new("0x00B4a967685164aF45D4E6B58bF9F19e8119CA97".parse().unwrap());
//! let target = FetchRequest::get("https://example.com/api/premium".parse().unwrap());
//! let outcome = settlement.pay_and_fetch(&payer, &target).await;
//! println!("{} {:?}", outcome.status, outcome.body);
//! # }
//! ```

// Core types and traits
pub mod constants;
pub mod error;
pub mod network;
pub mod payment;
pub mod price;
pub mod settlement;

// Hosted provider adapter
pub mod hosted;

pub mod security;

// Re-exports
pub use constants::*;
pub use error::CredpayError;
pub use hosted::{HostedSettlementClient, HostedSettlementClientBuilder, WaitUntil};
pub use network::NetworkConfig;
pub use payment::*;
pub use price::parse_price;
pub use settlement::{OutcomeKind, ResponseBody, SettlementClient, SettlementOutcome};
