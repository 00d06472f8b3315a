//! The settlement provider contract.
//!
//! - [`SettlementClient::validate`] judges a proof against one set of
//!   requirements and never moves funds on its own
//! - [`SettlementClient::pay_and_fetch`] pays for a target resource on behalf
//!   of a payer and returns the target's final response
//!
//! Both return a [`SettlementOutcome`] instead of a `Result`: a challenge, a
//! rejection and a provider fault are all answers the caller relays as-is.

use std::future::Future;

use crate::payment::{FetchRequest, PayerIdentity, PaymentProof, PaymentRequirements};

/// Client of an external settlement provider.
///
/// Implementations must bound their own network calls and report expiry as a
/// provider-error outcome. `pay_and_fetch` may move funds and is not
/// idempotent: every call can settle a new payment.
pub trait SettlementClient: Send + Sync {
    /// Validate (and settle) a proof for the given requirements.
    ///
    /// Returns a 2xx outcome when paid, a 402 challenge when the proof is
    /// absent or rejected, anything else for provider faults.
    fn validate(
        &self,
        requirements: &PaymentRequirements,
        proof: Option<&PaymentProof>,
    ) -> impl Future<Output = SettlementOutcome> + Send;

    /// Detect the target's payment requirement, pay it as `payer`, retry with
    /// proof attached, and return the final response.
    fn pay_and_fetch(
        &self,
        payer: &PayerIdentity,
        target: &FetchRequest,
    ) -> impl Future<Output = SettlementOutcome> + Send;
}

/// Body of a provider response, tagged by how it should be relayed.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// JSON payload; relayed re-encoded as JSON.
    Structured(serde_json::Value),
    /// Anything else; relayed byte-for-byte with its content type.
    Raw {
        text: String,
        content_type: Option<String>,
    },
}

impl ResponseBody {
    /// Classify a body by its content type.
    ///
    /// A JSON content type whose body fails to parse is kept raw rather than
    /// turned into an error.
    pub fn from_parts(content_type: Option<&str>, bytes: &[u8]) -> Self {
        let is_json = content_type
            .map(|ct| ct.to_ascii_lowercase().contains("application/json"))
            .unwrap_or(false);

        if is_json {
            if let Ok(value) = serde_json::from_slice(bytes) {
                return ResponseBody::Structured(value);
            }
        }

        ResponseBody::Raw {
            text: String::from_utf8_lossy(bytes).into_owned(),
            content_type: content_type.map(String::from),
        }
    }

    /// Plain-text body with no declared content type.
    pub fn text(text: impl Into<String>) -> Self {
        ResponseBody::Raw {
            text: text.into(),
            content_type: None,
        }
    }

    /// The body as the operator would read it.
    pub fn to_display_string(&self) -> String {
        match self {
            ResponseBody::Structured(value) => value.to_string(),
            ResponseBody::Raw { text, .. } => text.clone(),
        }
    }
}

/// How a caller should treat an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
    Paid,
    PaymentRequired,
    ProviderError,
}

/// Result of a settlement provider call.
///
/// Transient: owned by whoever made the call, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct SettlementOutcome {
    pub status: u16,
    /// Provider headers with their names exactly as received.
    pub headers: Vec<(String, String)>,
    pub body: ResponseBody,
}

impl SettlementOutcome {
    pub fn new(status: u16, body: ResponseBody) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// A provider fault with a JSON `{ "error": message }` body.
    pub fn provider_error(status: u16, message: &str) -> Self {
        Self::new(
            status,
            ResponseBody::Structured(serde_json::json!({ "error": message })),
        )
    }

    pub fn kind(&self) -> OutcomeKind {
        match self.status {
            200..=299 => OutcomeKind::Paid,
            402 => OutcomeKind::PaymentRequired,
            _ => OutcomeKind::ProviderError,
        }
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}
