use std::fmt::{Display, Formatter};

use crate::VendorId;

/// Adapter-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VendorErrorKind {
    /// The vendor (or the proxy on its behalf) reported an error, or the HTTP status was non-2xx.
    Vendor,
    /// No response: connection refused, timeout, broken body.
    Transport,
    /// The body was not valid JSON or did not match the expected payload.
    Parse,
    /// An HTML page came back where JSON was expected; the proxy is treated as down.
    ProxyUnavailable,
    /// The circuit is open and the call was rejected without network I/O.
    CircuitOpen,
    /// The caller supplied unusable parameters.
    InvalidRequest,
}

/// Structured error raised by the vendor adapters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorApiError {
    vendor: VendorId,
    kind: VendorErrorKind,
    message: String,
    code: Option<String>,
    status: Option<u16>,
}

const RATE_LIMIT_CODES: [&str; 5] = ["429", "1008", "1009", "1010", "1011"];
const RATE_LIMIT_PHRASES: [&str; 3] = ["rate limit", "too many requests", "ratelimited"];

impl VendorApiError {
    fn new(vendor: VendorId, kind: VendorErrorKind, message: impl Into<String>) -> Self {
        Self {
            vendor,
            kind,
            message: message.into(),
            code: None,
            status: None,
        }
    }

    pub fn vendor_reported(
        vendor: VendorId,
        message: impl Into<String>,
        code: Option<String>,
        status: Option<u16>,
    ) -> Self {
        Self {
            code,
            status,
            ..Self::new(vendor, VendorErrorKind::Vendor, message)
        }
    }

    pub fn http_status(vendor: VendorId, status: u16) -> Self {
        Self {
            code: Some(status.to_string()),
            status: Some(status),
            ..Self::new(vendor, VendorErrorKind::Vendor, format!("HTTP {status}"))
        }
    }

    pub fn transport(vendor: VendorId, message: impl Into<String>) -> Self {
        Self::new(
            vendor,
            VendorErrorKind::Transport,
            format!("Network error: {}", message.into()),
        )
    }

    pub fn parse(vendor: VendorId, message: impl Into<String>, status: u16) -> Self {
        Self {
            status: Some(status),
            ..Self::new(vendor, VendorErrorKind::Parse, message)
        }
    }

    /// Payload that passed the envelope checks but did not match the expected shape.
    pub fn payload(vendor: VendorId, error: serde_json::Error) -> Self {
        Self::parse(vendor, format!("unexpected {vendor} payload: {error}"), 200)
    }

    pub fn proxy_unavailable(
        vendor: VendorId,
        message: impl Into<String>,
        status: Option<u16>,
    ) -> Self {
        Self {
            code: Some(String::from("proxy_error")),
            status,
            ..Self::new(vendor, VendorErrorKind::ProxyUnavailable, message)
        }
    }

    pub fn circuit_open(vendor: VendorId, retry_in_secs: u64) -> Self {
        Self {
            code: Some(String::from("circuit_open")),
            ..Self::new(
                vendor,
                VendorErrorKind::CircuitOpen,
                format!("{vendor} API temporarily unavailable; retry in {retry_in_secs}s"),
            )
        }
    }

    pub fn invalid_request(vendor: VendorId, message: impl Into<String>) -> Self {
        Self::new(vendor, VendorErrorKind::InvalidRequest, message)
    }

    pub const fn vendor(&self) -> VendorId {
        self.vendor
    }

    pub const fn kind(&self) -> VendorErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Vendor error code (`error_code`, NewsAPI `code`), `proxy_error`, or the HTTP status.
    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    pub const fn status(&self) -> Option<u16> {
        self.status
    }

    /// Whether the vendor attributed the failure to rate limiting.
    pub fn is_rate_limited(&self) -> bool {
        if self.kind != VendorErrorKind::Vendor {
            return false;
        }
        if self.status == Some(429) {
            return true;
        }
        if self
            .code
            .as_deref()
            .is_some_and(|code| RATE_LIMIT_CODES.contains(&code))
        {
            return true;
        }
        let message = self.message.to_ascii_lowercase();
        RATE_LIMIT_PHRASES
            .iter()
            .any(|phrase| message.contains(phrase))
    }

    /// Short reason suitable for a hook's `error` string.
    pub fn user_message(&self) -> String {
        match self.kind {
            _ if self.is_rate_limited() => String::from("API rate limit reached"),
            VendorErrorKind::CircuitOpen => String::from("API temporarily unavailable"),
            VendorErrorKind::ProxyUnavailable => String::from("API proxy unavailable"),
            _ => self.message.clone(),
        }
    }

    pub const fn error_code(&self) -> &'static str {
        match self.kind {
            VendorErrorKind::Vendor => "vendor.error",
            VendorErrorKind::Transport => "vendor.transport",
            VendorErrorKind::Parse => "vendor.parse",
            VendorErrorKind::ProxyUnavailable => "vendor.proxy_unavailable",
            VendorErrorKind::CircuitOpen => "vendor.circuit_open",
            VendorErrorKind::InvalidRequest => "vendor.invalid_request",
        }
    }
}

impl Display for VendorApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {} ({})", self.vendor, self.message, self.error_code())
    }
}

impl std::error::Error for VendorApiError {}
