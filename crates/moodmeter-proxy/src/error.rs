use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::config::ConfigError;
use crate::upstream::UpstreamFailure;

/// Route-level failures, rendered as `{error, ...}` JSON bodies.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("{message}")]
    BadRequest { message: String },

    #[error("{env_var} is not configured on the proxy server")]
    MissingSecret { env_var: &'static str },

    /// `message` is the client-facing summary; `failure` holds what went wrong upstream.
    #[error("{message}: {failure}")]
    Upstream {
        message: &'static str,
        failure: UpstreamFailure,
        include_details: bool,
    },

    #[error("internal error: {0}")]
    Internal(String),
}

impl ProxyError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    pub fn upstream(message: &'static str, failure: UpstreamFailure) -> Self {
        Self::Upstream {
            message,
            failure,
            include_details: false,
        }
    }

    /// Like [`ProxyError::upstream`], also echoing the failure text as `details`.
    pub fn upstream_with_details(message: &'static str, failure: UpstreamFailure) -> Self {
        Self::Upstream {
            message,
            failure,
            include_details: true,
        }
    }

    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::MissingSecret { .. } | Self::Upstream { .. } | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn body(&self) -> Value {
        match self {
            Self::BadRequest { message } => json!({ "error": message }),
            Self::MissingSecret { .. } => json!({ "error": self.to_string() }),
            Self::Upstream {
                message,
                failure,
                include_details,
            } => {
                let mut body = Map::new();
                body.insert(String::from("error"), Value::from(*message));
                if *include_details {
                    body.insert(String::from("details"), Value::from(failure.to_string()));
                }
                if let Some(status) = failure.vendor_status() {
                    body.insert(String::from("status"), status.clone());
                }
                Value::Object(body)
            }
            Self::Internal(_) => json!({ "error": "Internal server error" }),
        }
    }
}

/// Failures that stop the server from starting, mapped to exit codes.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to initialise server state: {0}")]
    State(#[from] ProxyError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl StartupError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => 2,
            Self::State(_) => 3,
            Self::Io(_) => 10,
        }
    }
}

impl From<ConfigError> for ProxyError {
    fn from(error: ConfigError) -> Self {
        Self::Internal(error.to_string())
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        match &self {
            Self::BadRequest { .. } => tracing::debug!(error = %self, "rejected request"),
            _ => tracing::error!(error = %self, "request failed"),
        }
        (self.status_code(), Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_secret_names_the_variable() {
        let error = ProxyError::MissingSecret {
            env_var: "NEWSAPI_KEY",
        };

        assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            error.body(),
            json!({ "error": "NEWSAPI_KEY is not configured on the proxy server" })
        );
    }

    #[test]
    fn upstream_body_carries_vendor_status_and_optional_details() {
        let failure = UpstreamFailure::http(
            429,
            Some(json!({ "status": { "error_code": 1008, "error_message": "rate limit" } })),
        );

        let plain = ProxyError::upstream("Failed to fetch cryptocurrency data", failure.clone());
        let detailed = ProxyError::upstream_with_details("Failed to search Google News", failure);

        assert_eq!(plain.body()["error"], "Failed to fetch cryptocurrency data");
        assert_eq!(plain.body()["status"]["error_code"], 1008);
        assert!(plain.body().get("details").is_none());
        assert_eq!(detailed.body()["details"], "HTTP error! status: 429");
    }

    #[test]
    fn internal_errors_hide_their_cause() {
        let error = ProxyError::Internal(String::from("lock poisoned"));
        assert_eq!(error.body(), json!({ "error": "Internal server error" }));
    }
}
