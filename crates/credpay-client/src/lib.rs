//! Client side of the credpay demo.
//!
//! Drives the two-step manual flow against a credpay server: call the paid
//! resource, observe the 402, ask the delegated payer to settle it, observe
//! the final result. Every step is an explicit [`FlowState`] transition.
//!
//! ```no_run
//! use credpay_client::CredpayDemo;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), credpay_client::ClientError> {
//! let mut demo = CredpayDemo::new("http://localhost:3000")?;
//! demo.call_resource().await?;
//! if demo.state().is_blocked() {
//!     demo.pay().await?;
//! }
//! for line in demo.log().lines() {
//!     println!("{line}");
//! }
//! # Ok(())
//! # }
//! ```

mod http_client;
pub mod orchestrator;

pub use http_client::{ClientError, CredpayDemo, PayerMetadata};
pub use orchestrator::{FlowEvent, FlowLog, FlowState, Phase, TransitionError};
