use actix_web::{web, HttpRequest, HttpResponse};
use chrono::{SecondsFormat, Utc};
use credpay::SettlementClient;
use serde::Serialize;

use crate::guard::require_payment;
use crate::relay::forward_headers;
use crate::state::AppState;

pub const PREMIUM_DATA: &str = "Premium content unlocked ✅";

#[derive(Debug, Serialize)]
pub struct PremiumPayload {
    pub ok: bool,
    pub data: &'static str,
    /// RFC 3339 UTC timestamp of when the content was served.
    pub ts: String,
}

/// GET /api/premium - paid resource
pub async fn premium<S: SettlementClient>(
    req: HttpRequest,
    state: web::Data<AppState<S>>,
) -> HttpResponse {
    let access = match require_payment(&req, &state).await {
        Ok(access) => access,
        Err(resp) => return resp,
    };

    let mut builder = HttpResponse::Ok();
    forward_headers(&mut builder, &access.headers);
    builder.json(PremiumPayload {
        ok: true,
        data: PREMIUM_DATA,
        ts: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}

pub fn configure<S: SettlementClient + 'static>(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/premium", web::get().to(premium::<S>));
}
