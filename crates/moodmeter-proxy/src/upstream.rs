//! Outbound calls to the vendor APIs.

use std::fmt::{Display, Formatter};
use std::sync::Arc;

use moodmeter_core::{HttpClient, HttpRequest};
use serde_json::Value;

use crate::config::Secret;

/// Why an upstream call produced no usable JSON.
#[derive(Debug, Clone, PartialEq)]
pub enum UpstreamFailure {
    /// The request never completed.
    Transport { message: String },
    /// Non-2xx response; `body` is kept when it was JSON.
    Http { status: u16, body: Option<Value> },
    InvalidJson { status: u16, message: String },
    /// 2xx response whose envelope reports an error.
    Vendor { message: String, body: Value },
}

impl UpstreamFailure {
    pub fn http(status: u16, body: Option<Value>) -> Self {
        Self::Http { status, body }
    }

    /// CoinMarketCap `status` object, when the vendor sent one.
    pub fn vendor_status(&self) -> Option<&Value> {
        let body = match self {
            Self::Http { body, .. } => body.as_ref()?,
            Self::Vendor { body, .. } => body,
            _ => return None,
        };
        body.get("status").filter(|status| status.is_object())
    }
}

impl Display for UpstreamFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport { message } => write!(f, "Network error: {message}"),
            Self::Http { status, .. } => write!(f, "HTTP error! status: {status}"),
            Self::InvalidJson { status, message } => {
                write!(f, "invalid JSON from upstream (HTTP {status}): {message}")
            }
            Self::Vendor { message, .. } => write!(f, "vendor error: {message}"),
        }
    }
}

impl std::error::Error for UpstreamFailure {}

/// Sends requests carrying a server-held secret and validates the reply.
#[derive(Clone)]
pub struct UpstreamClient {
    http: Arc<dyn HttpClient>,
    timeout_ms: u64,
}

impl UpstreamClient {
    pub fn new(http: Arc<dyn HttpClient>, timeout_ms: u64) -> Self {
        Self { http, timeout_ms }
    }

    /// Executes `request` and returns the JSON body verbatim.
    ///
    /// `secret` is only used to scrub transport error text, which may echo
    /// the request URL.
    pub async fn fetch_json(
        &self,
        request: HttpRequest,
        secret: &Secret,
    ) -> Result<Value, UpstreamFailure> {
        let response = self
            .http
            .execute(request.with_timeout_ms(self.timeout_ms))
            .await
            .map_err(|error| UpstreamFailure::Transport {
                message: redact(error.message(), secret),
            })?;

        let parsed = serde_json::from_str::<Value>(&response.body);

        if !response.is_success() {
            return Err(UpstreamFailure::http(response.status, parsed.ok()));
        }

        let body = parsed.map_err(|error| UpstreamFailure::InvalidJson {
            status: response.status,
            message: error.to_string(),
        })?;

        if let Some(message) = envelope_error(&body) {
            return Err(UpstreamFailure::Vendor { message, body });
        }

        Ok(body)
    }
}

fn redact(message: &str, secret: &Secret) -> String {
    if secret.expose().is_empty() {
        return message.to_owned();
    }
    let encoded = urlencoding::encode(secret.expose());
    message
        .replace(encoded.as_ref(), "***")
        .replace(secret.expose(), "***")
}

/// Errors reported inside a 2xx body: CoinMarketCap `status.error_code`
/// and NewsAPI `status: "error"`.
fn envelope_error(body: &Value) -> Option<String> {
    let status = body.get("status")?;

    if let Some(code) = status.get("error_code").and_then(Value::as_i64) {
        if code != 0 {
            let message = status
                .get("error_message")
                .and_then(Value::as_str)
                .unwrap_or("unknown error");
            return Some(format!("{message} (code {code})"));
        }
    }

    if status.as_str() == Some("error") {
        let message = body
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown error");
        return Some(message.to_owned());
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use moodmeter_core::{HttpError, HttpResponse};
    use moodmeter_core::http_client::HttpFuture;
    use serde_json::json;

    struct Scripted(Result<HttpResponse, HttpError>);

    impl HttpClient for Scripted {
        fn execute<'a>(&'a self, _request: HttpRequest) -> HttpFuture<'a> {
            let outcome = self.0.clone();
            Box::pin(async move { outcome })
        }
    }

    fn client(outcome: Result<HttpResponse, HttpError>) -> UpstreamClient {
        UpstreamClient::new(Arc::new(Scripted(outcome)), 1_000)
    }

    #[tokio::test]
    async fn transport_errors_never_echo_the_secret() {
        let upstream = client(Err(HttpError::new(
            "error sending request for url (https://newsapi.test/v2/everything?apiKey=abc123)",
        )));

        let failure = upstream
            .fetch_json(HttpRequest::get("https://newsapi.test"), &Secret::new("abc123"))
            .await
            .expect_err("transport failure");

        assert!(!failure.to_string().contains("abc123"));
        assert!(failure.to_string().starts_with("Network error:"));
    }

    #[tokio::test]
    async fn non_success_keeps_json_body_for_vendor_status() {
        let upstream = client(Ok(HttpResponse::new(
            429,
            r#"{"status":{"error_code":1008,"error_message":"rate limit"}}"#,
        )));

        let failure = upstream
            .fetch_json(HttpRequest::get("https://cmc.test"), &Secret::new("k"))
            .await
            .expect_err("http failure");

        assert_eq!(failure.vendor_status().map(|s| s["error_code"].clone()), Some(json!(1008)));
    }

    #[tokio::test]
    async fn success_with_error_envelope_is_a_failure() {
        let upstream = client(Ok(HttpResponse::ok_json(
            r#"{"status":"error","code":"apiKeyInvalid","message":"Your API key is invalid."}"#,
        )));

        let failure = upstream
            .fetch_json(HttpRequest::get("https://newsapi.test"), &Secret::new("k"))
            .await
            .expect_err("vendor failure");

        assert_eq!(failure.to_string(), "vendor error: Your API key is invalid.");
    }

    #[tokio::test]
    async fn success_returns_body_verbatim() {
        let upstream = client(Ok(HttpResponse::ok_json(
            r#"{"status":{"error_code":0},"data":{"BTC":{"id":1}}}"#,
        )));

        let body = upstream
            .fetch_json(HttpRequest::get("https://cmc.test"), &Secret::new("k"))
            .await
            .expect("success");

        assert_eq!(body["data"]["BTC"]["id"], 1);
    }
}
