use actix_web::{web, HttpResponse};
use credpay::SettlementClient;
use serde::Serialize;

use crate::error::ServerError;
use crate::gateway::delegated_pay;
use crate::state::AppState;

/// Public description of the delegated payer.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayerMetadata {
    pub payer_address: String,
    pub explorer_url: Option<String>,
}

/// POST /api/credpay - pay for `{url, method?}` on the caller's behalf
pub async fn pay<S: SettlementClient>(
    state: web::Data<AppState<S>>,
    body: web::Bytes,
) -> Result<HttpResponse, ServerError> {
    delegated_pay(&state, &body).await
}

/// GET /api/credpay - who pays, and where to watch it
pub async fn payer<S: SettlementClient>(
    state: web::Data<AppState<S>>,
) -> Result<HttpResponse, ServerError> {
    let payer = state.config.require_payer()?;
    Ok(HttpResponse::Ok().json(PayerMetadata {
        payer_address: format!("{:#x}", payer.address),
        explorer_url: payer.explorer_url,
    }))
}

pub fn configure<S: SettlementClient + 'static>(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/credpay", web::post().to(pay::<S>))
        .route("/api/credpay", web::get().to(payer::<S>));
}
