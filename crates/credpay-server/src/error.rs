use actix_web::{http::StatusCode, HttpResponse, ResponseError};

/// Request-level failures raised before the settlement provider is consulted.
///
/// Every variant renders as `{ "error": <message> }`.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// A required environment value is absent
    #[error("Missing {0}")]
    MissingConfig(&'static str),

    #[error("Missing url")]
    MissingUrl,

    #[error("Invalid url: {0}")]
    InvalidUrl(String),

    #[error("Invalid method: {0}")]
    InvalidMethod(String),

    /// Target resolves to a scheme or host the gateway refuses to pay for
    #[error("Target URL not allowed")]
    TargetNotAllowed,
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServerError::MissingConfig(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::MissingUrl
            | ServerError::InvalidUrl(_)
            | ServerError::InvalidMethod(_)
            | ServerError::TargetNotAllowed => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let ServerError::MissingConfig(var) = self {
            tracing::error!(var, "required configuration is missing");
        }
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "error": self.to_string()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_config_is_500_with_variable_name() {
        let err = ServerError::MissingConfig("THIRDWEB_SECRET_KEY");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "Missing THIRDWEB_SECRET_KEY");
    }

    #[test]
    fn caller_mistakes_are_400() {
        assert_eq!(ServerError::MissingUrl.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ServerError::MissingUrl.to_string(), "Missing url");
        assert_eq!(
            ServerError::TargetNotAllowed.status_code(),
            StatusCode::BAD_REQUEST
        );
    }
}
