use alloy_primitives::Address;
use base64::Engine;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::CredpayError;

/// What a caller must pay to access one resource.
///
/// Issued inside the 402 challenge and handed back to the provider when the
/// proof is validated. A proof only satisfies the terms it was signed for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequirements {
    pub scheme: String,
    pub network: String,
    /// Human-readable price, e.g. `"$0.01"`.
    pub price: String,
    /// Price in atomic token units.
    pub amount: String,
    pub asset: Address,
    pub pay_to: Address,
    /// Fully-qualified URL of the protected resource.
    pub resource: String,
    pub max_timeout_seconds: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra: Option<serde_json::Value>,
}

impl PaymentRequirements {
    /// True when both requirements demand the same payment for the same resource.
    ///
    /// Descriptive fields (`price`, `description`, `mimeType`, `extra`) are ignored.
    pub fn same_terms(&self, other: &PaymentRequirements) -> bool {
        self.scheme == other.scheme
            && self.network == other.network
            && self.amount == other.amount
            && self.asset == other.asset
            && self.pay_to == other.pay_to
            && self.resource == other.resource
    }
}

/// The 402 challenge body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequiredBody {
    pub x402_version: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub accepts: Vec<PaymentRequirements>,
}

/// Opaque payment proof taken from the `x-payment` request header.
///
/// Untrusted until a settlement provider accepts it. `Debug` only shows a
/// short prefix so proofs do not end up in logs.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PaymentProof(String);

impl PaymentProof {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Proof from a raw header value; blank values count as absent.
    pub fn from_header(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decode the x402 wire form: base64-encoded JSON payment payload.
    pub fn decode(&self) -> Result<serde_json::Value, CredpayError> {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(self.0.as_bytes())
            .map_err(|e| CredpayError::InvalidPayment(format!("invalid base64: {e}")))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| CredpayError::InvalidPayment(format!("invalid JSON payload: {e}")))
    }

    /// Encode a JSON payment payload into the x402 wire form.
    pub fn encode(payload: &serde_json::Value) -> Result<Self, CredpayError> {
        let json = serde_json::to_vec(payload)?;
        Ok(Self(base64::engine::general_purpose::STANDARD.encode(json)))
    }
}

impl std::fmt::Debug for PaymentProof {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix: String = self.0.chars().take(8).collect();
        write!(f, "PaymentProof({prefix}...)")
    }
}

/// The wallet that fronts payments for callers without one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayerIdentity {
    pub address: Address,
    /// Link where the payer's transactions can be inspected.
    pub explorer_url: Option<String>,
}

impl PayerIdentity {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            explorer_url: None,
        }
    }

    pub fn with_explorer_url(mut self, url: impl Into<String>) -> Self {
        self.explorer_url = Some(url.into());
        self
    }
}

/// A resource the delegated payer should pay for and fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: Url,
    pub method: reqwest::Method,
}

impl FetchRequest {
    pub fn new(url: Url, method: reqwest::Method) -> Self {
        Self { url, method }
    }

    pub fn get(url: Url) -> Self {
        Self::new(url, reqwest::Method::GET)
    }
}

/// Settlement receipt returned by the provider's settle endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettleResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payer: Option<String>,
    /// Transaction hash, if settlement succeeded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction: Option<String>,
    #[serde(default)]
    pub network: String,
}
