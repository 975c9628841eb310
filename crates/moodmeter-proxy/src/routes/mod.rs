pub mod ai;
pub mod coinmarketcap;
pub mod health;
pub mod newsapi;
pub mod serpapi;

use axum::extract::rejection::QueryRejection;
use axum::extract::Query;

use crate::ProxyError;

/// Unwraps a query extraction; a malformed query string becomes a JSON 400.
pub(crate) fn parsed_query<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, ProxyError> {
    query
        .map(|Query(inner)| inner)
        .map_err(|rejection| ProxyError::bad_request(rejection.body_text()))
}

/// Trimmed query value, `None` when absent or blank.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}
