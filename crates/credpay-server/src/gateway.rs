//! Delegated payer: pays for a target resource from the server's own wallet
//! and relays whatever the target finally answered.

use std::time::Instant;

use actix_web::HttpResponse;
use credpay::network::is_private_host;
use credpay::{FetchRequest, SettlementClient};
use url::Url;

use crate::config::CredpayConfig;
use crate::error::ServerError;
use crate::metrics::{DELEGATED_PAYMENTS, SETTLEMENT_LATENCY};
use crate::relay::{self, HeaderPolicy};
use crate::state::AppState;

/// Body of `POST /api/credpay`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelegatedPayRequest {
    pub url: String,
    pub method: Option<String>,
}

impl DelegatedPayRequest {
    /// Read `url` and `method` independently from a JSON object.
    ///
    /// A body that is not JSON, or a `url` that is absent, null or blank, is
    /// a missing url. A `url` or `method` of the wrong type is rejected on
    /// its own.
    pub fn from_body(body: &[u8]) -> Result<Self, ServerError> {
        let value: serde_json::Value = serde_json::from_slice(body).unwrap_or_default();

        let url = match value.get("url") {
            None | Some(serde_json::Value::Null) => return Err(ServerError::MissingUrl),
            Some(serde_json::Value::String(url)) if url.trim().is_empty() => {
                return Err(ServerError::MissingUrl)
            }
            Some(serde_json::Value::String(url)) => url.trim().to_string(),
            Some(other) => {
                return Err(ServerError::InvalidUrl(format!("url must be a string, got {other}")))
            }
        };

        let method = match value.get("method") {
            None | Some(serde_json::Value::Null) => None,
            Some(serde_json::Value::String(method)) => Some(method.clone()),
            Some(other) => return Err(ServerError::InvalidMethod(other.to_string())),
        };

        Ok(Self { url, method })
    }
}

/// Uppercase the requested method, defaulting to GET.
pub fn parse_method(method: Option<&str>) -> Result<reqwest::Method, ServerError> {
    let method = method
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_ascii_uppercase)
        .unwrap_or_else(|| "GET".to_string());
    reqwest::Method::from_bytes(method.as_bytes()).map_err(|_| ServerError::InvalidMethod(method))
}

/// Resolve the caller's target into an absolute URL the payer may spend on.
///
/// Paths starting with `/` are resolved under `WEBSITE_URL`, the same way the
/// guard names its resources. Private, loopback and link-local hosts are
/// refused unless they share the `WEBSITE_URL` origin.
pub fn resolve_target(raw: &str, config: &CredpayConfig) -> Result<Url, ServerError> {
    let raw = raw.trim();
    let url = if raw.starts_with('/') {
        config.site_url(raw)?
    } else {
        Url::parse(raw).map_err(|e| ServerError::InvalidUrl(e.to_string()))?
    };

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ServerError::TargetNotAllowed);
    }
    let host = url.host().ok_or(ServerError::TargetNotAllowed)?;

    let same_origin = config
        .website_url
        .as_ref()
        .map(|base| base.origin() == url.origin())
        .unwrap_or(false);
    if !same_origin && is_private_host(&host) {
        return Err(ServerError::TargetNotAllowed);
    }

    Ok(url)
}

/// Pay for `body.url` as the configured payer and relay the final response.
///
/// Calls the settlement client exactly once. Status and body are relayed
/// unchanged; only the content type survives from the upstream headers.
pub async fn delegated_pay<S: SettlementClient>(
    state: &AppState<S>,
    body: &[u8],
) -> Result<HttpResponse, ServerError> {
    let config = &state.config;
    config.require_secret_key()?;
    let payer = config.require_payer()?;

    let request = DelegatedPayRequest::from_body(body)?;
    let method = parse_method(request.method.as_deref())?;
    let url = resolve_target(&request.url, config).inspect_err(|e| {
        tracing::warn!(target_url = %request.url, error = %e, "delegated payment target refused");
    })?;

    let target = FetchRequest::new(url, method);
    tracing::info!(
        payer = %format!("{:#x}", payer.address),
        method = %target.method,
        target_url = %target.url,
        "delegated payment started"
    );

    let start = Instant::now();
    let outcome = state.settlement.pay_and_fetch(&payer, &target).await;
    SETTLEMENT_LATENCY
        .with_label_values(&["pay_and_fetch"])
        .observe(start.elapsed().as_secs_f64());

    let status = outcome.status.to_string();
    DELEGATED_PAYMENTS
        .with_label_values(&[status.as_str()])
        .inc();
    if outcome.status >= 400 {
        tracing::warn!(
            status = outcome.status,
            target_url = %target.url,
            body = %outcome.body.to_display_string(),
            "delegated payment relayed an error"
        );
    } else {
        tracing::info!(
            status = outcome.status,
            target_url = %target.url,
            "delegated payment relayed"
        );
    }

    Ok(relay::into_response(outcome, HeaderPolicy::ContentTypeOnly))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(website: Option<&str>) -> CredpayConfig {
        let website = website.map(String::from);
        CredpayConfig::from_lookup(|key| match key {
            "WEBSITE_URL" => website.clone(),
            _ => None,
        })
        .unwrap()
    }

    fn site() -> CredpayConfig {
        config(Some("http://127.0.0.1:3000"))
    }

    #[test]
    fn body_fields_are_read_independently() {
        let req = DelegatedPayRequest::from_body(br#"{"url":" https://a.example ","method":"post"}"#)
            .unwrap();
        assert_eq!(req.url, "https://a.example");
        assert_eq!(req.method.as_deref(), Some("post"));

        let req = DelegatedPayRequest::from_body(br#"{"url":"https://a.example","extra":[1]}"#)
            .unwrap();
        assert_eq!(req.method, None);
    }

    #[test]
    fn absent_url_is_missing() {
        for body in [
            &b"not json"[..],
            b"",
            b"[]",
            br#"{"url":null}"#,
            br#"{"url":"  "}"#,
            br#"{"method":5}"#,
        ] {
            assert!(
                matches!(DelegatedPayRequest::from_body(body), Err(ServerError::MissingUrl)),
                "{}",
                String::from_utf8_lossy(body)
            );
        }
    }

    #[test]
    fn wrongly_typed_fields_are_rejected_on_their_own() {
        assert!(matches!(
            DelegatedPayRequest::from_body(br#"{"url":42}"#),
            Err(ServerError::InvalidUrl(_))
        ));
        assert!(matches!(
            DelegatedPayRequest::from_body(br#"{"url":"https://api.example/paid","method":5}"#),
            Err(ServerError::InvalidMethod(m)) if m == "5"
        ));
    }

    #[test]
    fn method_defaults_to_get_and_is_uppercased() {
        assert_eq!(parse_method(None).unwrap(), reqwest::Method::GET);
        assert_eq!(parse_method(Some("  ")).unwrap(), reqwest::Method::GET);
        assert_eq!(parse_method(Some("post")).unwrap(), reqwest::Method::POST);
        assert!(matches!(
            parse_method(Some("GE T")),
            Err(ServerError::InvalidMethod(_))
        ));
    }

    #[test]
    fn absolute_public_target_is_used_as_given() {
        let url = resolve_target("https://api.example/paid?q=1", &config(None)).unwrap();
        assert_eq!(url.as_str(), "https://api.example/paid?q=1");
    }

    #[test]
    fn relative_target_joins_website_url() {
        let url = resolve_target("/api/premium", &site()).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:3000/api/premium");
    }

    #[test]
    fn relative_target_keeps_website_path_prefix() {
        let url = resolve_target("/api/premium", &config(Some("https://site.example/app"))).unwrap();
        assert_eq!(url.as_str(), "https://site.example/app/api/premium");
    }

    #[test]
    fn relative_target_without_website_is_missing_config() {
        assert!(matches!(
            resolve_target("/api/premium", &config(None)),
            Err(ServerError::MissingConfig("WEBSITE_URL"))
        ));
    }

    #[test]
    fn private_and_non_http_targets_are_refused() {
        for raw in [
            "http://127.0.0.1:3000/api/premium",
            "http://169.254.169.254/latest/meta-data",
            "http://10.0.0.5/admin",
            "http://localhost/secret",
            "http://[::1]/",
            "file:///etc/passwd",
            "ftp://files.example/x",
        ] {
            assert!(
                matches!(resolve_target(raw, &config(None)), Err(ServerError::TargetNotAllowed)),
                "{raw} should be refused"
            );
        }
    }

    #[test]
    fn own_origin_is_allowed_even_when_private() {
        let url = resolve_target("http://127.0.0.1:3000/api/premium", &site()).unwrap();
        assert_eq!(url.path(), "/api/premium");

        assert!(matches!(
            resolve_target("http://127.0.0.1:9999/other", &site()),
            Err(ServerError::TargetNotAllowed)
        ));
    }

    #[test]
    fn garbage_target_is_invalid_url() {
        assert!(matches!(
            resolve_target("not a url", &config(None)),
            Err(ServerError::InvalidUrl(_))
        ));
    }
}
