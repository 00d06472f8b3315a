use actix_web::{web, HttpRequest, HttpResponse};
use credpay::security::bearer_matches;
use credpay::SettlementClient;

use crate::metrics::metrics_output;
use crate::state::AppState;

/// GET /health - liveness plus which paid routes are usable
pub async fn health<S: SettlementClient>(state: web::Data<AppState<S>>) -> HttpResponse {
    let config = &state.config;
    let has_secret = config.secret_key.is_some();
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "service": "credpay-server",
        "version": env!("CARGO_PKG_VERSION"),
        "network": config.network.name,
        "guard_configured": has_secret && config.pay_to.is_some(),
        "gateway_configured": has_secret && config.payer_wallet.is_some(),
    }))
}

/// GET /metrics - Prometheus metrics (bearer-gated)
pub async fn metrics<S: SettlementClient>(
    req: HttpRequest,
    state: web::Data<AppState<S>>,
) -> HttpResponse {
    let Some(expected) = state.config.metrics_token.as_deref() else {
        // No token configured, so metrics stay closed.
        return HttpResponse::Forbidden().json(serde_json::json!({
            "error": "Set METRICS_TOKEN to access /metrics"
        }));
    };

    let header = req
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok());
    if !bearer_matches(header, expected) {
        return HttpResponse::Unauthorized().json(serde_json::json!({
            "error": "Valid Bearer token required for /metrics"
        }));
    }

    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(metrics_output())
}

pub fn configure<S: SettlementClient + 'static>(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health::<S>))
        .route("/metrics", web::get().to(metrics::<S>));
}
