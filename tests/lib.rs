//! Shared fixtures for the MoodMeter behaviour tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use moodmeter_core::http_client::HttpFuture;
use moodmeter_core::{HttpClient, HttpError, HttpRequest, HttpResponse};

/// Replays canned responses in order, repeating the last one, and counts
/// every request that would have reached the network.
pub struct ScriptedTransport {
    responses: Mutex<Vec<Result<HttpResponse, HttpError>>>,
    requests: Mutex<Vec<HttpRequest>>,
    calls: AtomicUsize,
}

impl ScriptedTransport {
    pub fn new(responses: Vec<Result<HttpResponse, HttpError>>) -> Arc<Self> {
        assert!(!responses.is_empty(), "script needs at least one response");
        Arc::new(Self {
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn always(response: Result<HttpResponse, HttpError>) -> Arc<Self> {
        Self::new(vec![response])
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Requests seen so far, oldest first.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl HttpClient for ScriptedTransport {
    fn execute<'a>(&'a self, request: HttpRequest) -> HttpFuture<'a> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);
        let outcome = {
            let mut responses = self.responses.lock().unwrap_or_else(PoisonError::into_inner);
            if responses.len() > 1 {
                responses.remove(0)
            } else {
                responses[0].clone()
            }
        };
        Box::pin(async move { outcome })
    }
}
