//! Hosted adapter against a fake settlement provider on an ephemeral port.

use std::collections::HashMap;
use std::time::Duration;

use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use alloy_primitives::Address;
use base64::Engine;
use credpay::{
    FetchRequest, HostedSettlementClient, OutcomeKind, PayerIdentity, PaymentProof,
    PaymentRequirements, ResponseBody, SettleResponse, SettlementClient,
};

const SECRET: &str = "sk_test_hosted";
/// How long the fake provider stalls on `slow` requests.
const PROVIDER_DELAY: Duration = Duration::from_secs(3);

fn authorized(req: &HttpRequest) -> bool {
    req.headers()
        .get("x-secret-key")
        .and_then(|v| v.to_str().ok())
        == Some(SECRET)
}

async fn settle(req: HttpRequest, body: web::Json<serde_json::Value>) -> HttpResponse {
    if !authorized(&req) {
        return HttpResponse::Unauthorized().json(serde_json::json!({"error": "bad key"}));
    }
    assert_eq!(body["waitUntil"], "submitted");
    assert_eq!(body["paymentRequirements"]["payTo"], "0x1111111111111111111111111111111111111111");

    match body["paymentPayload"]["signature"].as_str() {
        Some("good") => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "payer": "0x2222222222222222222222222222222222222222",
            "transaction": "0xabc123",
            "network": "base-sepolia",
        })),
        Some("slow") => {
            tokio::time::sleep(PROVIDER_DELAY).await;
            HttpResponse::Ok().json(serde_json::json!({"success": true}))
        }
        Some("fault") => HttpResponse::ServiceUnavailable()
            .content_type("text/plain")
            .insert_header(("Retry-After", "30"))
            .body("provider maintenance"),
        _ => HttpResponse::Ok().json(serde_json::json!({
            "success": false,
            "errorReason": "invalid_exact_evm_payload_signature",
            "network": "base-sepolia",
        })),
    }
}

async fn fetch(req: HttpRequest, query: web::Query<HashMap<String, String>>) -> HttpResponse {
    if !authorized(&req) {
        return HttpResponse::Unauthorized().json(serde_json::json!({"error": "bad key"}));
    }
    let url = query.get("url").cloned().unwrap_or_default();
    match url.as_str() {
        "https://target.example/json" => HttpResponse::Ok().json(serde_json::json!({
            "ok": true,
            "data": "premium",
            "from": query.get("from"),
            "method": query.get("method"),
        })),
        "https://target.example/slow" => {
            tokio::time::sleep(PROVIDER_DELAY).await;
            HttpResponse::Ok().json(serde_json::json!({"ok": true}))
        }
        "https://target.example/unpaid" => HttpResponse::PaymentRequired().json(serde_json::json!({
            "x402Version": 1,
            "error": "insufficient_funds",
        })),
        _ => HttpResponse::InternalServerError()
            .content_type("text/plain")
            .body("upstream exploded"),
    }
}

fn spawn_provider() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(|| {
        App::new()
            .route("/v1/payments/x402/settle", web::post().to(settle))
            .route("/v1/payments/x402/fetch", web::post().to(fetch))
    })
    .workers(1)
    .listen(listener)
    .unwrap()
    .run();
    actix_rt::spawn(server);
    format!("http://{addr}")
}

fn client(base: &str, secret: &str) -> HostedSettlementClient {
    HostedSettlementClient::builder()
        .api_base(base)
        .secret_key(secret)
        .build()
        .unwrap()
}

fn requirements() -> PaymentRequirements {
    PaymentRequirements {
        scheme: "exact".to_string(),
        network: "base-sepolia".to_string(),
        price: "$0.01".to_string(),
        amount: "10000".to_string(),
        asset: Address::ZERO,
        pay_to: Address::repeat_byte(0x11),
        resource: "https://target.example/json".to_string(),
        max_timeout_seconds: 300,
        description: None,
        mime_type: Some("application/json".to_string()),
        extra: None,
    }
}

fn proof(signature: &str) -> PaymentProof {
    PaymentProof::encode(&serde_json::json!({ "signature": signature })).unwrap()
}

#[actix_rt::test]
async fn settled_proof_is_paid_with_receipt_header() {
    let base = spawn_provider();
    let outcome = client(&base, SECRET)
        .validate(&requirements(), Some(&proof("good")))
        .await;

    assert_eq!(outcome.kind(), OutcomeKind::Paid);
    let receipt = outcome.header("x-payment-response").expect("receipt header");
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(receipt)
        .unwrap();
    let settle: SettleResponse = serde_json::from_slice(&decoded).unwrap();
    assert!(settle.success);
    assert_eq!(settle.transaction.as_deref(), Some("0xabc123"));
}

#[actix_rt::test]
async fn rejected_proof_becomes_challenge_with_reason() {
    let base = spawn_provider();
    let outcome = client(&base, SECRET)
        .validate(&requirements(), Some(&proof("forged")))
        .await;

    assert_eq!(outcome.status, 402);
    let ResponseBody::Structured(body) = outcome.body else {
        panic!("challenge must be JSON");
    };
    assert_eq!(body["error"], "invalid_exact_evm_payload_signature");
    assert_eq!(body["accepts"][0]["resource"], "https://target.example/json");
}

#[actix_rt::test]
async fn provider_fault_is_forwarded_verbatim() {
    let base = spawn_provider();
    let outcome = client(&base, SECRET)
        .validate(&requirements(), Some(&proof("fault")))
        .await;

    assert_eq!(outcome.status, 503);
    assert_eq!(outcome.kind(), OutcomeKind::ProviderError);
    assert_eq!(outcome.header("retry-after"), Some("30"));
    assert_eq!(
        outcome.body,
        ResponseBody::Raw {
            text: "provider maintenance".to_string(),
            content_type: Some("text/plain".to_string()),
        }
    );
}

#[actix_rt::test]
async fn wrong_secret_is_forwarded_as_provider_error() {
    let base = spawn_provider();
    let outcome = client(&base, "sk_wrong")
        .validate(&requirements(), Some(&proof("good")))
        .await;
    assert_eq!(outcome.status, 401);
}

#[actix_rt::test]
async fn pay_and_fetch_relays_json_success() {
    let base = spawn_provider();
    let payer = PayerIdentity::new(Address::repeat_byte(0x33));
    let target = FetchRequest::get("https://target.example/json".parse().unwrap());

    let outcome = client(&base, SECRET).pay_and_fetch(&payer, &target).await;

    assert_eq!(outcome.status, 200);
    let ResponseBody::Structured(body) = outcome.body else {
        panic!("expected JSON body");
    };
    assert_eq!(body["ok"], true);
    assert_eq!(body["from"], "0x3333333333333333333333333333333333333333");
    assert_eq!(body["method"], "GET");
}

#[actix_rt::test]
async fn pay_and_fetch_relays_upstream_402() {
    let base = spawn_provider();
    let payer = PayerIdentity::new(Address::repeat_byte(0x33));
    let target = FetchRequest::get("https://target.example/unpaid".parse().unwrap());

    let outcome = client(&base, SECRET).pay_and_fetch(&payer, &target).await;

    assert_eq!(outcome.status, 402);
    assert!(matches!(outcome.body, ResponseBody::Structured(ref b) if b["error"] == "insufficient_funds"));
}

#[actix_rt::test]
async fn pay_and_fetch_relays_plain_text_error() {
    let base = spawn_provider();
    let payer = PayerIdentity::new(Address::repeat_byte(0x33));
    let target = FetchRequest::new(
        "https://target.example/broken".parse().unwrap(),
        reqwest::Method::POST,
    );

    let outcome = client(&base, SECRET).pay_and_fetch(&payer, &target).await;

    assert_eq!(outcome.status, 500);
    assert_eq!(outcome.body.to_display_string(), "upstream exploded");
}

fn impatient_client(base: &str) -> HostedSettlementClient {
    HostedSettlementClient::builder()
        .api_base(base)
        .secret_key(SECRET)
        .timeout(Duration::from_millis(300))
        .build()
        .unwrap()
}

#[actix_rt::test]
async fn stalled_settlement_times_out_as_gateway_timeout() {
    let base = spawn_provider();
    let outcome = impatient_client(&base)
        .validate(&requirements(), Some(&proof("slow")))
        .await;

    assert_eq!(outcome.status, 504);
    assert_eq!(outcome.kind(), OutcomeKind::ProviderError);
    assert!(matches!(
        outcome.body,
        ResponseBody::Structured(ref b) if b["error"] == "settlement provider timed out"
    ));
}

#[actix_rt::test]
async fn stalled_fetch_times_out_as_gateway_timeout() {
    let base = spawn_provider();
    let payer = PayerIdentity::new(Address::repeat_byte(0x33));
    let target = FetchRequest::new(
        "https://target.example/slow".parse().unwrap(),
        reqwest::Method::GET,
    );

    let outcome = impatient_client(&base).pay_and_fetch(&payer, &target).await;

    assert_eq!(outcome.status, 504);
    assert!(matches!(
        outcome.body,
        ResponseBody::Structured(ref b) if b["error"] == "settlement provider timed out"
    ));
}
