//! Testing utilities
//!
//! [`MockTransport`] stands in for the HTTP collaborator: responses are
//! scripted up front, every request is recorded, and calls can be held in
//! flight until the test releases them.

use async_trait::async_trait;
use sfconnect_transport::{HttpRequest, HttpResponse, Result, Transport, TransportError};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use tokio::sync::Semaphore;

#[derive(Debug, Clone)]
enum Scripted {
    Body(String),
    Error(String),
}

/// Scriptable in-memory transport.
///
/// Responses are returned in the order they were enqueued. With the queue
/// empty, calls fail with a transport error.
#[derive(Debug)]
pub struct MockTransport {
    responses: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<HttpRequest>>,
    held: AtomicBool,
    gate: Semaphore,
}

impl MockTransport {
    /// Empty mock that answers immediately.
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            held: AtomicBool::new(false),
            gate: Semaphore::new(0),
        }
    }

    /// Queue a 200 response with `body`.
    pub fn enqueue_body(&self, body: impl Into<String>) {
        lock(&self.responses).push_back(Scripted::Body(body.into()));
    }

    /// Queue a network-level failure whose text is `message`.
    pub fn enqueue_error(&self, message: impl Into<String>) {
        lock(&self.responses).push_back(Scripted::Error(message.into()));
    }

    /// Hold every following call in flight until [`MockTransport::release`].
    pub fn hold(&self) {
        self.held.store(true, Ordering::SeqCst);
    }

    /// Let one held call (or the next one to arrive) complete.
    pub fn release(&self) {
        self.gate.add_permits(1);
    }

    /// Stop holding calls. Calls already waiting still need `release`.
    pub fn resume(&self) {
        self.held.store(false, Ordering::SeqCst);
    }

    /// Every request received so far, in order.
    pub fn requests(&self) -> Vec<HttpRequest> {
        lock(&self.requests).clone()
    }

    /// Number of requests received so far.
    pub fn request_count(&self) -> usize {
        lock(&self.requests).len()
    }

    /// Forget every request received so far. Scripted responses are kept.
    pub fn clear_requests(&self) {
        lock(&self.requests).clear();
    }

    /// Most recent request, if any.
    pub fn last_request(&self) -> Option<HttpRequest> {
        lock(&self.requests).last().cloned()
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send_http(&self, request: HttpRequest) -> Result<HttpResponse> {
        lock(&self.requests).push(request);

        if self.held.load(Ordering::SeqCst) {
            let permit = self
                .gate
                .acquire()
                .await
                .map_err(|e| TransportError::Other(e.to_string()))?;
            permit.forget();
        }

        let scripted = lock(&self.responses).pop_front();
        match scripted {
            Some(Scripted::Body(body)) => Ok(HttpResponse::ok(body)),
            Some(Scripted::Error(message)) => Err(TransportError::Other(message)),
            None => Err(TransportError::Other(
                "no scripted response available".to_string(),
            )),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
