use alloy_primitives::Address;
use credpay::{parse_price, NetworkConfig, PayerIdentity, WaitUntil, DEFAULT_API_BASE, DEFAULT_PRICE};
use url::Url;

use crate::error::ServerError;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_RATE_LIMIT_RPM: u32 = 60;

pub const SECRET_KEY_VAR: &str = "THIRDWEB_SECRET_KEY";
pub const PAYER_WALLET_VAR: &str = "CREDPAY_PAYER_WALLET";
pub const PAY_TO_VAR: &str = "API_PAYTO_WALLET";
pub const WEBSITE_URL_VAR: &str = "WEBSITE_URL";

#[derive(Clone)]
pub struct CredpayConfig {
    /// Settlement provider credential (None = every paid route answers 500)
    pub secret_key: Option<String>,
    /// Wallet the delegated payer spends from
    pub payer_wallet: Option<Address>,
    /// Recipient of payments for the protected resource
    pub pay_to: Option<Address>,
    /// Public base URL the protected resource is served under
    pub website_url: Option<Url>,
    /// Explicit explorer link for the payer wallet
    pub explorer_url: Option<String>,
    /// Settlement provider API base
    pub settlement_api_url: String,
    pub network: NetworkConfig,
    pub wait_until: WaitUntil,
    /// Price of the protected resource (e.g. "$0.01")
    pub premium_price: String,
    /// Price in token base units (computed from premium_price)
    pub premium_amount: String,
    pub port: u16,
    pub rate_limit_rpm: u32,
    pub allowed_origins: Vec<String>,
    /// Bearer token required for /metrics (None = metrics disabled)
    pub metrics_token: Option<String>,
}

impl std::fmt::Debug for CredpayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredpayConfig")
            .field("secret_key", &self.secret_key.as_ref().map(|_| "[REDACTED]"))
            .field("payer_wallet", &self.payer_wallet)
            .field("pay_to", &self.pay_to)
            .field("website_url", &self.website_url.as_ref().map(Url::as_str))
            .field("explorer_url", &self.explorer_url)
            .field("settlement_api_url", &self.settlement_api_url)
            .field("network", &self.network.name)
            .field("wait_until", &self.wait_until)
            .field("premium_price", &self.premium_price)
            .field("premium_amount", &self.premium_amount)
            .field("port", &self.port)
            .field("rate_limit_rpm", &self.rate_limit_rpm)
            .field("allowed_origins", &self.allowed_origins)
            .field(
                "metrics_token",
                &self.metrics_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl CredpayConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let secret_key = var(SECRET_KEY_VAR);
        let payer_wallet = var(PAYER_WALLET_VAR)
            .map(|v| parse_address(PAYER_WALLET_VAR, v))
            .transpose()?;
        let pay_to = var(PAY_TO_VAR)
            .map(|v| parse_address(PAY_TO_VAR, v))
            .transpose()?;

        let website_url = var(WEBSITE_URL_VAR)
            .map(|v| parse_http_url(WEBSITE_URL_VAR, v))
            .transpose()?;
        let explorer_url = var("CREDPAY_EXPLORER_URL");

        let settlement_api_url =
            var("SETTLEMENT_API_URL").unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        parse_http_url("SETTLEMENT_API_URL", settlement_api_url.clone())?;

        let network_name = var("SETTLEMENT_NETWORK").unwrap_or_else(|| "base-sepolia".to_string());
        let network = NetworkConfig::from_name(&network_name)
            .map_err(|_| ConfigError::InvalidNetwork(network_name))?;

        let wait_until = match var("SETTLEMENT_WAIT_UNTIL") {
            Some(v) => v.parse().map_err(|_| ConfigError::InvalidValue {
                var: "SETTLEMENT_WAIT_UNTIL",
                value: v,
            })?,
            None => WaitUntil::default(),
        };

        let premium_price = var("PREMIUM_PRICE").unwrap_or_else(|| DEFAULT_PRICE.to_string());
        let premium_amount = parse_price(&premium_price, network.decimals)
            .map_err(|e| ConfigError::InvalidPrice(format!("{premium_price}: {e}")))?;

        let port = parse_number("PORT", var("PORT"), DEFAULT_PORT)?;
        let rate_limit_rpm =
            parse_number("RATE_LIMIT_RPM", var("RATE_LIMIT_RPM"), DEFAULT_RATE_LIMIT_RPM)?;
        if rate_limit_rpm == 0 {
            return Err(ConfigError::InvalidValue {
                var: "RATE_LIMIT_RPM",
                value: "0".to_string(),
            });
        }

        let allowed_origins: Vec<String> = var("ALLOWED_ORIGINS")
            .map(|origins| {
                origins
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_else(|| {
                vec![
                    "http://localhost:3000".to_string(),
                    "http://localhost:5173".to_string(),
                ]
            });

        let metrics_token = var("METRICS_TOKEN");

        Ok(Self {
            secret_key,
            payer_wallet,
            pay_to,
            website_url,
            explorer_url,
            settlement_api_url,
            network,
            wait_until,
            premium_price,
            premium_amount,
            port,
            rate_limit_rpm,
            allowed_origins,
            metrics_token,
        })
    }

    /// Log the operator-facing gaps once at startup.
    pub fn warn_missing(&self) {
        if self.secret_key.is_none() {
            tracing::warn!("{SECRET_KEY_VAR} not set: paid routes will answer 500");
        }
        if self.pay_to.is_none() {
            tracing::warn!("{PAY_TO_VAR} not set: /api/premium will answer 500");
        }
        if self.payer_wallet.is_none() {
            tracing::warn!("{PAYER_WALLET_VAR} not set: /api/credpay will answer 500");
        }
        if self.metrics_token.is_none() {
            tracing::warn!("METRICS_TOKEN not set: /metrics is disabled");
        }
    }

    pub fn require_secret_key(&self) -> Result<&str, ServerError> {
        self.secret_key
            .as_deref()
            .ok_or(ServerError::MissingConfig(SECRET_KEY_VAR))
    }

    pub fn require_pay_to(&self) -> Result<Address, ServerError> {
        self.pay_to.ok_or(ServerError::MissingConfig(PAY_TO_VAR))
    }

    pub fn require_website_url(&self) -> Result<&Url, ServerError> {
        self.website_url
            .as_ref()
            .ok_or(ServerError::MissingConfig(WEBSITE_URL_VAR))
    }

    /// `path` (a `/`-rooted path, optionally with a query) under `WEBSITE_URL`.
    pub fn site_url(&self, path: &str) -> Result<Url, ServerError> {
        Ok(join_site_path(self.require_website_url()?, path))
    }

    /// The delegated payer, with an explorer link from config or the network preset.
    pub fn require_payer(&self) -> Result<PayerIdentity, ServerError> {
        let address = self
            .payer_wallet
            .ok_or(ServerError::MissingConfig(PAYER_WALLET_VAR))?;
        let explorer = self
            .explorer_url
            .clone()
            .unwrap_or_else(|| self.network.explorer_address_url(&address));
        Ok(PayerIdentity::new(address).with_explorer_url(explorer))
    }
}

fn parse_address(var: &'static str, value: String) -> Result<Address, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::InvalidAddress { var, value })
}

fn parse_http_url(var: &'static str, value: String) -> Result<Url, ConfigError> {
    match Url::parse(&value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.host().is_some() => Ok(url),
        _ => Err(ConfigError::InvalidUrl { var, value }),
    }
}

fn parse_number<T: std::str::FromStr>(
    var: &'static str,
    value: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        Some(v) => v
            .parse()
            .map_err(|_| ConfigError::InvalidValue { var, value: v }),
        None => Ok(default),
    }
}

/// Append `path` to `base`, keeping any path prefix `base` carries.
///
/// `https://site/app` + `/api/premium` is `https://site/app/api/premium`.
/// A fragment in `path` is dropped.
pub fn join_site_path(base: &Url, path: &str) -> Url {
    let path = path.split('#').next().unwrap_or_default();
    let (path, query) = match path.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (path, None),
    };
    let mut url = base.clone();
    url.set_path(&format!("{}{}", base.path().trim_end_matches('/'), path));
    url.set_query(query);
    url.set_fragment(None);
    url
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid address in {var}: {value}")]
    InvalidAddress { var: &'static str, value: String },

    #[error("invalid URL in {var}: {value}")]
    InvalidUrl { var: &'static str, value: String },

    #[error("invalid price: {0}")]
    InvalidPrice(String),

    #[error("unsupported settlement network: {0}")]
    InvalidNetwork(String),

    #[error("invalid value for {var}: {value}")]
    InvalidValue { var: &'static str, value: String },
}
