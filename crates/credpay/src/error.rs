use thiserror::Error;

/// Errors returned by credpay operations.
#[derive(Debug, Error)]
pub enum CredpayError {
    #[error("config error: {0}")]
    Config(String),

    #[error("invalid price: {0}")]
    InvalidPrice(String),

    #[error("invalid payment: {0}")]
    InvalidPayment(String),

    #[error("http error: {0}")]
    Http(String),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}
