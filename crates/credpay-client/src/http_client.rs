use serde::{Deserialize, Serialize};
use url::Url;

use crate::orchestrator::{FlowEvent, FlowLog, FlowState, TransitionError};

/// Paid resource served by the credpay server.
const PREMIUM_PATH: &str = "/api/premium";
/// Delegated payer endpoint (POST to pay, GET for payer metadata).
const CREDPAY_PATH: &str = "/api/credpay";

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error("invalid base URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP error: {0}")]
    Http(String),
}

/// Public description of the wallet that paid on the caller's behalf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayerMetadata {
    pub payer_address: String,
    #[serde(default)]
    pub explorer_url: Option<String>,
}

/// Drives a [`FlowState`] against a live credpay server.
///
/// Bodies are surfaced as the server sent them; the driver never interprets
/// a challenge or an error.
pub struct CredpayDemo {
    http: reqwest::Client,
    premium_url: Url,
    credpay_url: Url,
    state: FlowState,
    log: FlowLog,
}

impl CredpayDemo {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .map_err(|e| ClientError::Http(e.to_string()))?;
        Self::with_http_client(base_url, http)
    }

    /// Create a driver with a custom reqwest::Client.
    pub fn with_http_client(base_url: &str, http: reqwest::Client) -> Result<Self, ClientError> {
        let base = Url::parse(base_url).map_err(|e| ClientError::InvalidUrl(format!("{base_url}: {e}")))?;
        let premium_url = base
            .join(PREMIUM_PATH)
            .map_err(|e| ClientError::InvalidUrl(e.to_string()))?;
        let credpay_url = base
            .join(CREDPAY_PATH)
            .map_err(|e| ClientError::InvalidUrl(e.to_string()))?;

        Ok(Self {
            http,
            premium_url,
            credpay_url,
            state: FlowState::Idle,
            log: FlowLog::new(),
        })
    }

    pub fn state(&self) -> &FlowState {
        &self.state
    }

    pub fn log(&self) -> &FlowLog {
        &self.log
    }

    pub fn premium_url(&self) -> &Url {
        &self.premium_url
    }

    fn apply(&mut self, event: FlowEvent) -> Result<(), ClientError> {
        let from = self.state.phase();
        let next = self.state.transition(event)?;
        self.log.record(from, &next);
        tracing::debug!(from = %from, to = %next.phase(), "flow transition");
        self.state = next;
        Ok(())
    }

    /// Call the paid resource without a proof.
    ///
    /// Ends in `blocked` on 402, `success` on a JSON 2xx, `error` otherwise.
    pub async fn call_resource(&mut self) -> Result<&FlowState, ClientError> {
        self.apply(FlowEvent::CallResource)?;

        let event = match self.http.get(self.premium_url.clone()).send().await {
            Ok(resp) => {
                let status = resp.status().as_u16();
                match (status, resp.text().await) {
                    (_, Err(e)) => FlowEvent::CallFailed {
                        status: Some(status),
                        body: unreadable_body(&e),
                    },
                    (402, Ok(text)) => FlowEvent::ChallengeReceived(text),
                    (200..=299, Ok(text)) => match serde_json::from_str(&text) {
                        Ok(payload) => FlowEvent::ResourceServed(payload),
                        Err(_) => FlowEvent::CallFailed {
                            status: Some(status),
                            body: text,
                        },
                    },
                    (_, Ok(text)) => FlowEvent::CallFailed {
                        status: Some(status),
                        body: text,
                    },
                }
            }
            Err(e) => FlowEvent::CallFailed {
                status: None,
                body: e.to_string(),
            },
        };

        self.apply(event)?;
        Ok(&self.state)
    }

    /// Ask the delegated payer to settle the challenge and fetch the resource.
    ///
    /// Only legal while `blocked`. Each call may spend funds.
    pub async fn pay(&mut self) -> Result<&FlowState, ClientError> {
        self.apply(FlowEvent::Pay)?;

        let request = serde_json::json!({
            "url": self.premium_url.as_str(),
            "method": "GET",
        });
        let event = match self
            .http
            .post(self.credpay_url.clone())
            .json(&request)
            .send()
            .await
        {
            Ok(resp) => {
                let status = resp.status();
                let text = match resp.text().await {
                    Ok(text) => text,
                    Err(e) => {
                        let event = FlowEvent::PaymentFailed {
                            status: Some(status.as_u16()),
                            body: unreadable_body(&e),
                        };
                        self.apply(event)?;
                        return Ok(&self.state);
                    }
                };
                match serde_json::from_str::<serde_json::Value>(&text) {
                    Ok(payload) if status.is_success() => {
                        let payer = match self.fetch_payer_metadata().await {
                            Ok(meta) => Some(meta),
                            Err(e) => {
                                tracing::warn!(error = %e, "payer metadata unavailable");
                                None
                            }
                        };
                        FlowEvent::PaymentSucceeded { payload, payer }
                    }
                    _ => FlowEvent::PaymentFailed {
                        status: Some(status.as_u16()),
                        body: text,
                    },
                }
            }
            Err(e) => FlowEvent::PaymentFailed {
                status: None,
                body: e.to_string(),
            },
        };

        self.apply(event)?;
        Ok(&self.state)
    }

    /// Public payer address and explorer link from `GET /api/credpay`.
    pub async fn fetch_payer_metadata(&self) -> Result<PayerMetadata, ClientError> {
        let resp = self
            .http
            .get(self.credpay_url.clone())
            .send()
            .await
            .map_err(|e| ClientError::Http(format!("payer metadata request failed: {e}")))?;
        if !resp.status().is_success() {
            return Err(ClientError::Http(format!(
                "payer metadata request returned {}",
                resp.status()
            )));
        }
        resp.json()
            .await
            .map_err(|e| ClientError::Http(format!("failed to parse payer metadata: {e}")))
    }
}

fn unreadable_body(e: &reqwest::Error) -> String {
    tracing::warn!(error = %e, "failed to read response body");
    format!("failed to read response body: {e}")
}
