use std::sync::Arc;

use serde_json::Value;

use crate::adapters::error::VendorApiError;
use crate::circuit_breaker::CircuitBreaker;
use crate::http_client::{HttpClient, HttpRequest};
use crate::throttling::RateLimiter;
use crate::vendor_policy::VendorPolicy;
use crate::VendorId;

const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Call pipeline shared by every adapter that talks to the proxy.
///
/// Order: proxy availability, circuit, throttle, transport, HTML detection,
/// JSON parse, vendor envelope, HTTP status. Every outcome after the throttle
/// is recorded on the circuit breaker.
#[derive(Clone)]
pub struct ProxyChannel {
    vendor: VendorId,
    base_url: String,
    http_client: Arc<dyn HttpClient>,
    circuit_breaker: Arc<CircuitBreaker>,
    rate_limiter: RateLimiter,
    timeout_ms: u64,
}

impl ProxyChannel {
    pub fn new(
        base_url: impl Into<String>,
        http_client: Arc<dyn HttpClient>,
        policy: &VendorPolicy,
    ) -> Self {
        Self {
            vendor: policy.vendor,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            http_client,
            circuit_breaker: Arc::new(CircuitBreaker::new(policy.circuit)),
            rate_limiter: RateLimiter::from_policy(policy),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    pub fn with_circuit_breaker(mut self, circuit_breaker: Arc<CircuitBreaker>) -> Self {
        self.circuit_breaker = circuit_breaker;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub const fn vendor(&self) -> VendorId {
        self.vendor
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn circuit_breaker(&self) -> &Arc<CircuitBreaker> {
        &self.circuit_breaker
    }

    pub async fn get_json(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<Value, VendorApiError> {
        let request = params.iter().fold(
            HttpRequest::get(format!("{}{}", self.base_url, path)),
            |request, (name, value)| request.with_query(name, value),
        );
        self.send(request.with_header("accept", "application/json"))
            .await
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> Result<Value, VendorApiError> {
        let request = HttpRequest::post(format!("{}{}", self.base_url, path))
            .with_header("accept", "application/json")
            .with_json(body);
        self.send(request).await
    }

    async fn send(&self, request: HttpRequest) -> Result<Value, VendorApiError> {
        if !self.circuit_breaker.proxy_available() {
            return Err(VendorApiError::proxy_unavailable(
                self.vendor,
                "proxy server marked unavailable; reset the circuit breaker to retry",
                None,
            ));
        }

        if !self.circuit_breaker.allow_request() {
            let retry_in = self
                .circuit_breaker
                .remaining_open_time()
                .map(|remaining| remaining.as_secs())
                .unwrap_or_default();
            return Err(VendorApiError::circuit_open(self.vendor, retry_in));
        }

        self.rate_limiter.acquire().await;

        let response = match self
            .http_client
            .execute(request.with_timeout_ms(self.timeout_ms))
            .await
        {
            Ok(response) => response,
            Err(error) => {
                return Err(self.fail(VendorApiError::transport(self.vendor, error.message())))
            }
        };

        if looks_like_html(&response.body) {
            self.circuit_breaker.mark_proxy_unavailable();
            return Err(self.fail(VendorApiError::proxy_unavailable(
                self.vendor,
                format!(
                    "proxy returned an HTML page instead of JSON (HTTP {})",
                    response.status
                ),
                Some(response.status),
            )));
        }

        let body: Value = match serde_json::from_str(&response.body) {
            Ok(body) => body,
            Err(error) => {
                return Err(self.fail(VendorApiError::parse(
                    self.vendor,
                    format!("invalid JSON from {} proxy: {error}", self.vendor),
                    response.status,
                )))
            }
        };

        if let Some(error) = envelope_error(self.vendor, &body, response.status) {
            return Err(self.fail(error));
        }

        if !response.is_success() {
            return Err(self.fail(VendorApiError::http_status(self.vendor, response.status)));
        }

        self.circuit_breaker.record_success();
        Ok(body)
    }

    fn fail(&self, error: VendorApiError) -> VendorApiError {
        self.circuit_breaker.record_failure(error.is_rate_limited());
        tracing::warn!(
            vendor = %self.vendor,
            code = error.error_code(),
            status = error.status(),
            message = error.message(),
            "vendor call failed"
        );
        error
    }
}

/// Detects an HTML document served where JSON was expected (dev-server
/// index page, reverse proxy error page).
pub(crate) fn looks_like_html(body: &str) -> bool {
    body.trim_start().starts_with('<')
}

/// Extracts an error reported inside a JSON body.
///
/// Recognizes the CoinMarketCap `status.error_code`, the NewsAPI
/// `status: "error"` envelope, and the proxy's own `{error}` body.
pub(crate) fn envelope_error(
    vendor: VendorId,
    body: &Value,
    http_status: u16,
) -> Option<VendorApiError> {
    let status = (http_status >= 400).then_some(http_status);

    if let Some(cmc_status) = body.get("status").filter(|s| s.is_object()) {
        let code = cmc_status.get("error_code").and_then(Value::as_i64).unwrap_or(0);
        if code != 0 {
            let message = cmc_status
                .get("error_message")
                .and_then(Value::as_str)
                .unwrap_or("API request failed");
            return Some(VendorApiError::vendor_reported(
                vendor,
                message,
                Some(code.to_string()),
                status,
            ));
        }
    }

    if body.get("status").and_then(Value::as_str) == Some("error") {
        let message = body
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("API request failed");
        let code = body.get("code").and_then(Value::as_str).map(str::to_owned);
        return Some(VendorApiError::vendor_reported(vendor, message, code, status));
    }

    match body.get("error") {
        Some(Value::String(message)) => Some(VendorApiError::vendor_reported(
            vendor,
            message.as_str(),
            status.map(|s| s.to_string()),
            status,
        )),
        Some(Value::Object(detail)) => {
            let message = detail
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("API request failed");
            Some(VendorApiError::vendor_reported(
                vendor,
                message,
                status.map(|s| s.to_string()),
                status,
            ))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::error::VendorErrorKind;
    use serde_json::json;

    #[test]
    fn recognizes_html_pages() {
        assert!(looks_like_html("<!DOCTYPE html><html></html>"));
        assert!(looks_like_html("  \n<html lang=\"en\">"));
        assert!(!looks_like_html("{\"data\":[]}"));
        assert!(!looks_like_html(""));
    }

    #[test]
    fn coinmarketcap_status_error_is_extracted() {
        let body = json!({"status": {"error_code": 1008, "error_message": "minute rate limit"}});
        let error = envelope_error(VendorId::CoinMarketCap, &body, 429).expect("error present");

        assert_eq!(error.code(), Some("1008"));
        assert_eq!(error.status(), Some(429));
        assert!(error.is_rate_limited());
    }

    #[test]
    fn zero_error_code_is_success() {
        let body = json!({"status": {"error_code": 0, "error_message": null}, "data": {}});
        assert!(envelope_error(VendorId::CoinMarketCap, &body, 200).is_none());
    }

    #[test]
    fn newsapi_error_envelope_is_extracted() {
        let body = json!({"status": "error", "code": "apiKeyInvalid", "message": "bad key"});
        let error = envelope_error(VendorId::NewsApi, &body, 401).expect("error present");

        assert_eq!(error.message(), "bad key");
        assert_eq!(error.code(), Some("apiKeyInvalid"));
    }

    #[test]
    fn proxy_error_body_is_extracted() {
        let body = json!({"error": "Failed to fetch news headlines"});
        let error = envelope_error(VendorId::NewsApi, &body, 500).expect("error present");

        assert_eq!(error.message(), "Failed to fetch news headlines");
        assert_eq!(error.status(), Some(500));
        assert_eq!(error.kind(), VendorErrorKind::Vendor);
    }

    #[test]
    fn ok_status_string_is_not_an_error() {
        let body = json!({"status": "ok", "articles": []});
        assert!(envelope_error(VendorId::NewsApi, &body, 200).is_none());
    }
}
