//! Resource guard: admits a request only after the settlement provider
//! reports its payment proof as paid.

use std::time::Instant;

use actix_web::{http::header, HttpRequest, HttpResponse, ResponseError};
use alloy_primitives::Address;
use credpay::{
    OutcomeKind, PaymentProof, PaymentRequirements, SettlementClient, MAX_TIMEOUT_SECONDS,
    PAYMENT_HEADER, SCHEME_NAME,
};

use crate::config::{join_site_path, CredpayConfig};
use crate::metrics::{CHALLENGES, REQUESTS, SETTLEMENTS, SETTLEMENT_LATENCY};
use crate::relay::{self, HeaderPolicy};
use crate::state::AppState;

/// Proof that the current request was paid for.
#[derive(Debug, Clone)]
pub struct PaidAccess {
    /// Provider headers to attach to the success response (the settlement receipt).
    pub headers: Vec<(String, String)>,
}

/// Public URL identifying the resource this request asks for.
///
/// Uses `WEBSITE_URL` when set so the URL matches what external callers see
/// behind a proxy. Otherwise the `Host` header or the bound address is used;
/// forwarding headers are ignored so a caller cannot pick the resource.
pub fn resource_url(req: &HttpRequest, config: &CredpayConfig) -> String {
    if let Some(base) = &config.website_url {
        return join_site_path(base, req.path()).into();
    }
    let app = req.app_config();
    let scheme = req
        .uri()
        .scheme_str()
        .unwrap_or(if app.secure() { "https" } else { "http" });
    let host = req
        .headers()
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .or_else(|| req.uri().authority().map(|a| a.as_str()))
        .unwrap_or_else(|| app.host());
    format!("{scheme}://{host}{}", req.path())
}

/// Requirements for the premium resource at `resource`.
pub fn premium_requirements(
    config: &CredpayConfig,
    pay_to: Address,
    resource: String,
) -> PaymentRequirements {
    PaymentRequirements {
        scheme: SCHEME_NAME.to_string(),
        network: config.network.name.clone(),
        price: config.premium_price.clone(),
        amount: config.premium_amount.clone(),
        asset: config.network.asset,
        pay_to,
        resource,
        max_timeout_seconds: MAX_TIMEOUT_SECONDS,
        description: Some("Premium content".to_string()),
        mime_type: Some("application/json".to_string()),
        extra: Some(serde_json::json!({
            "name": config.network.asset_name,
            "version": config.network.asset_version,
        })),
    }
}

/// High-level payment gate: reads `x-payment`, validates it with the
/// settlement client, and either admits the request or returns the response
/// to send back as-is.
///
/// Configuration is checked before the provider is consulted, so a
/// misconfigured server never issues a challenge it could not settle.
pub async fn require_payment<S: SettlementClient>(
    req: &HttpRequest,
    state: &AppState<S>,
) -> Result<PaidAccess, HttpResponse> {
    let config = &state.config;
    // Use the matched route pattern (not raw path) to prevent cardinality bombs
    let endpoint = req.match_pattern().unwrap_or_else(|| "unknown".to_string());

    let pay_to = match config
        .require_secret_key()
        .and_then(|_| config.require_pay_to())
    {
        Ok(addr) => addr,
        Err(e) => {
            REQUESTS.with_label_values(&[endpoint.as_str(), "500"]).inc();
            return Err(e.error_response());
        }
    };

    let requirements = premium_requirements(config, pay_to, resource_url(req, config));
    let proof = req
        .headers()
        .get(PAYMENT_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(PaymentProof::from_header);

    let start = Instant::now();
    let outcome = state.settlement.validate(&requirements, proof.as_ref()).await;
    SETTLEMENT_LATENCY
        .with_label_values(&["validate"])
        .observe(start.elapsed().as_secs_f64());

    let status = outcome.status.to_string();
    REQUESTS
        .with_label_values(&[endpoint.as_str(), status.as_str()])
        .inc();

    match outcome.kind() {
        OutcomeKind::Paid => {
            SETTLEMENTS.with_label_values(&["paid"]).inc();
            tracing::info!(
                resource = %requirements.resource,
                proof = ?proof,
                "payment accepted"
            );
            Ok(PaidAccess {
                headers: outcome.headers,
            })
        }
        OutcomeKind::PaymentRequired => {
            if proof.is_some() {
                SETTLEMENTS.with_label_values(&["rejected"]).inc();
                tracing::warn!(
                    resource = %requirements.resource,
                    proof = ?proof,
                    reason = %outcome.body.to_display_string(),
                    "payment proof rejected"
                );
            } else {
                CHALLENGES.inc();
                tracing::info!(resource = %requirements.resource, "payment challenge issued");
            }
            Err(relay::into_response(outcome, HeaderPolicy::ForwardAll))
        }
        OutcomeKind::ProviderError => {
            SETTLEMENTS.with_label_values(&["provider_error"]).inc();
            tracing::error!(
                status = outcome.status,
                body = %outcome.body.to_display_string(),
                "settlement provider error"
            );
            Err(relay::into_response(outcome, HeaderPolicy::ForwardAll))
        }
    }
}
