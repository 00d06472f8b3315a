//! Conversion of settlement outcomes into HTTP responses.

use actix_web::{http::StatusCode, HttpResponse, HttpResponseBuilder};
use credpay::{ResponseBody, SettlementOutcome};

/// Framing headers the server recomputes for its own response.
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "content-length",
    "keep-alive",
    "transfer-encoding",
    "content-type",
];

/// Which provider headers reach the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderPolicy {
    /// Every provider header except framing ones (guard challenges and receipts).
    ForwardAll,
    /// Only the body's content type (delegated payment results).
    ContentTypeOnly,
}

/// Relay an outcome with its status and body unchanged.
pub fn into_response(outcome: SettlementOutcome, policy: HeaderPolicy) -> HttpResponse {
    let status = StatusCode::from_u16(outcome.status).unwrap_or(StatusCode::BAD_GATEWAY);
    let mut builder = HttpResponse::build(status);
    if policy == HeaderPolicy::ForwardAll {
        forward_headers(&mut builder, &outcome.headers);
    }

    match outcome.body {
        ResponseBody::Structured(value) => builder.json(value),
        ResponseBody::Raw { text, content_type } => builder
            .content_type(content_type.unwrap_or_else(|| "text/plain; charset=utf-8".to_string()))
            .body(text),
    }
}

/// Append provider headers to a response under construction.
pub fn forward_headers(builder: &mut HttpResponseBuilder, headers: &[(String, String)]) {
    for (name, value) in headers {
        if HOP_BY_HOP.iter().any(|h| name.eq_ignore_ascii_case(h)) {
            continue;
        }
        builder.append_header((name.as_str(), value.as_str()));
    }
}
