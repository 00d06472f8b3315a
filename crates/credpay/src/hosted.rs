//! HTTP adapter for a hosted x402 settlement API.
//!
//! The provider exposes two authenticated endpoints:
//!
//! - `POST /v1/payments/x402/settle`: verify a payment payload against
//!   requirements and settle it
//! - `POST /v1/payments/x402/fetch?from=..&url=..&method=..`: pay for a target
//!   resource from a server wallet and return the target's final response
//!
//! Every request carries the `x-secret-key` credential.

use std::time::Duration;

use base64::Engine;
use url::Url;

use crate::constants::{
    DEFAULT_API_BASE, PAYMENT_REQUIRED_HEADER, PAYMENT_RESPONSE_HEADER, PROVIDER_TIMEOUT_SECS,
    SECRET_KEY_HEADER, X402_VERSION,
};
use crate::error::CredpayError;
use crate::payment::{
    FetchRequest, PayerIdentity, PaymentProof, PaymentRequiredBody, PaymentRequirements,
    SettleResponse,
};
use crate::settlement::{ResponseBody, SettlementClient, SettlementOutcome};

/// How far the provider lets a settlement progress before answering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WaitUntil {
    /// Answer once the transfer is broadcast.
    #[default]
    Submitted,
    /// Answer once the transfer is confirmed on chain.
    Confirmed,
}

impl WaitUntil {
    pub fn as_str(&self) -> &'static str {
        match self {
            WaitUntil::Submitted => "submitted",
            WaitUntil::Confirmed => "confirmed",
        }
    }
}

impl std::str::FromStr for WaitUntil {
    type Err = CredpayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "submitted" => Ok(WaitUntil::Submitted),
            "confirmed" => Ok(WaitUntil::Confirmed),
            other => Err(CredpayError::Config(format!(
                "invalid waitUntil '{other}' (expected submitted or confirmed)"
            ))),
        }
    }
}

/// [`SettlementClient`] backed by a hosted x402 API.
#[derive(Clone)]
pub struct HostedSettlementClient {
    http: reqwest::Client,
    settle_url: Url,
    fetch_url: Url,
    secret_key: Option<String>,
    wait_until: WaitUntil,
}

impl std::fmt::Debug for HostedSettlementClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostedSettlementClient")
            .field("settle_url", &self.settle_url.as_str())
            .field("fetch_url", &self.fetch_url.as_str())
            .field("secret_key", &self.secret_key.as_ref().map(|_| "[REDACTED]"))
            .field("wait_until", &self.wait_until)
            .finish()
    }
}

impl HostedSettlementClient {
    pub fn builder() -> HostedSettlementClientBuilder {
        HostedSettlementClientBuilder::default()
    }

    /// 402 challenge for `requirements`, mirrored into the `PAYMENT-REQUIRED` header.
    pub fn challenge(requirements: &PaymentRequirements, error: &str) -> SettlementOutcome {
        let body = PaymentRequiredBody {
            x402_version: X402_VERSION,
            error: Some(error.to_string()),
            accepts: vec![requirements.clone()],
        };
        let json = match serde_json::to_value(&body) {
            Ok(v) => v,
            Err(e) => {
                tracing::error!(error = %e, "failed to serialize payment challenge");
                return SettlementOutcome::provider_error(500, "failed to build payment challenge");
            }
        };
        let encoded = base64::engine::general_purpose::STANDARD.encode(json.to_string());
        SettlementOutcome::new(402, ResponseBody::Structured(json))
            .with_header(PAYMENT_REQUIRED_HEADER, encoded)
    }

    /// Send a provider request and capture the full response as an outcome.
    async fn send(&self, request: reqwest::RequestBuilder) -> SettlementOutcome {
        let Some(secret) = self.secret_key.as_deref() else {
            tracing::error!("settlement provider called without a secret key");
            return SettlementOutcome::provider_error(500, "settlement credential not configured");
        };

        let resp = match request.header(SECRET_KEY_HEADER, secret).send().await {
            Ok(r) => r,
            Err(e) => return transport_error(&e),
        };

        let status = resp.status().as_u16();
        let headers: Vec<(String, String)> = resp
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        let bytes = match resp.bytes().await {
            Ok(b) => b,
            Err(e) => return transport_error(&e),
        };

        SettlementOutcome {
            status,
            headers,
            body: ResponseBody::from_parts(content_type.as_deref(), &bytes),
        }
    }
}

fn transport_error(e: &reqwest::Error) -> SettlementOutcome {
    if e.is_timeout() {
        tracing::error!(error = %e, "settlement provider timed out");
        SettlementOutcome::provider_error(504, "settlement provider timed out")
    } else {
        tracing::error!(error = %e, "settlement provider request failed");
        SettlementOutcome::provider_error(502, "settlement provider unreachable")
    }
}

impl SettlementClient for HostedSettlementClient {
    async fn validate(
        &self,
        requirements: &PaymentRequirements,
        proof: Option<&PaymentProof>,
    ) -> SettlementOutcome {
        let Some(proof) = proof else {
            return Self::challenge(requirements, "X-PAYMENT header is required");
        };

        let payload = match proof.decode() {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(error = %e, proof = ?proof, "invalid payment header");
                return Self::challenge(requirements, "invalid payment header");
            }
        };

        let body = serde_json::json!({
            "x402Version": X402_VERSION,
            "paymentPayload": payload,
            "paymentRequirements": requirements,
            "waitUntil": self.wait_until.as_str(),
        });

        let outcome = self
            .send(self.http.post(self.settle_url.clone()).json(&body))
            .await;

        if !(200..300).contains(&outcome.status) {
            tracing::warn!(
                status = outcome.status,
                resource = %requirements.resource,
                "settlement provider returned non-success response"
            );
            return outcome;
        }

        let settle: SettleResponse = match &outcome.body {
            ResponseBody::Structured(value) => match serde_json::from_value(value.clone()) {
                Ok(s) => s,
                Err(e) => {
                    tracing::error!(error = %e, "settlement provider response parse failed");
                    return SettlementOutcome::provider_error(
                        502,
                        "invalid settlement provider response",
                    );
                }
            },
            ResponseBody::Raw { .. } => {
                tracing::error!("settlement provider returned a non-JSON settle response");
                return SettlementOutcome::provider_error(
                    502,
                    "invalid settlement provider response",
                );
            }
        };

        if !settle.success {
            let reason = settle
                .error_reason
                .unwrap_or_else(|| "payment rejected".to_string());
            tracing::warn!(
                payer = settle.payer.as_deref().unwrap_or("unknown"),
                reason = %reason,
                "payment rejected"
            );
            return Self::challenge(requirements, &reason);
        }

        tracing::info!(
            payer = settle.payer.as_deref().unwrap_or("unknown"),
            tx = settle.transaction.as_deref().unwrap_or("pending"),
            network = %settle.network,
            "payment settled"
        );

        let receipt = match serde_json::to_vec(&settle) {
            Ok(bytes) => base64::engine::general_purpose::STANDARD.encode(bytes),
            Err(e) => {
                tracing::error!(error = %e, "failed to encode settlement receipt");
                String::new()
            }
        };

        let mut paid = SettlementOutcome::new(200, outcome.body);
        if !receipt.is_empty() {
            paid = paid.with_header(PAYMENT_RESPONSE_HEADER, receipt);
        }
        paid
    }

    async fn pay_and_fetch(
        &self,
        payer: &PayerIdentity,
        target: &FetchRequest,
    ) -> SettlementOutcome {
        let mut url = self.fetch_url.clone();
        url.query_pairs_mut()
            .append_pair("from", &format!("{:#x}", payer.address))
            .append_pair("url", target.url.as_str())
            .append_pair("method", target.method.as_str());

        tracing::info!(
            payer = %format!("{:#x}", payer.address),
            target_url = %target.url,
            method = %target.method,
            "delegated payment requested"
        );

        self.send(self.http.post(url)).await
    }
}

/// Builder for [`HostedSettlementClient`].
#[derive(Debug, Default)]
pub struct HostedSettlementClientBuilder {
    api_base: Option<String>,
    secret_key: Option<String>,
    wait_until: WaitUntil,
    timeout: Option<Duration>,
    http: Option<reqwest::Client>,
}

impl HostedSettlementClientBuilder {
    /// Provider API base URL (default [`DEFAULT_API_BASE`]).
    pub fn api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = Some(base.into());
        self
    }

    pub fn secret_key(mut self, key: impl Into<String>) -> Self {
        self.secret_key = Some(key.into());
        self
    }

    /// Like [`Self::secret_key`] but accepts an absent key.
    pub fn maybe_secret_key(mut self, key: Option<String>) -> Self {
        self.secret_key = key;
        self
    }

    pub fn wait_until(mut self, wait_until: WaitUntil) -> Self {
        self.wait_until = wait_until;
        self
    }

    /// Bound on each provider call (default 30s). Ignored with [`Self::http_client`].
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn http_client(mut self, http: reqwest::Client) -> Self {
        self.http = Some(http);
        self
    }

    pub fn build(self) -> Result<HostedSettlementClient, CredpayError> {
        let base = self
            .api_base
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        // Trailing slash so relative joins extend the base path
        let base = format!("{}/", base.trim_end_matches('/'));
        let base = Url::parse(&base)
            .map_err(|e| CredpayError::Config(format!("invalid settlement API URL: {e}")))?;

        let settle_url = base
            .join("v1/payments/x402/settle")
            .map_err(|e| CredpayError::Config(format!("invalid settlement API URL: {e}")))?;
        let fetch_url = base
            .join("v1/payments/x402/fetch")
            .map_err(|e| CredpayError::Config(format!("invalid settlement API URL: {e}")))?;

        let http = match self.http {
            Some(http) => http,
            None => reqwest::Client::builder()
                .timeout(
                    self.timeout
                        .unwrap_or(Duration::from_secs(PROVIDER_TIMEOUT_SECS)),
                )
                .redirect(reqwest::redirect::Policy::none())
                .build()
                .map_err(|e| CredpayError::Http(format!("failed to build HTTP client: {e}")))?,
        };

        Ok(HostedSettlementClient {
            http,
            settle_url,
            fetch_url,
            secret_key: self.secret_key.filter(|k| !k.is_empty()),
            wait_until: self.wait_until,
        })
    }
}
