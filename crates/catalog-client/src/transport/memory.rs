//! Scripted in-memory transport

use super::{HttpRequest, HttpResponse, Method, Transport};
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};

#[derive(Debug, Clone)]
enum Reply {
    Response(HttpResponse),
    TransportFailure(String),
}

/// In-memory transport replaying scripted replies
///
/// Replies are queued per `(method, path)`. Each request consumes the head of
/// its queue, except that the last reply stays in place and is repeated.
/// Requests to routes with no script get a 404. Every request is recorded.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    routes: Mutex<HashMap<(Method, String), VecDeque<Reply>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MemoryTransport {
    /// Create a transport with no scripted routes
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for `method path`
    pub fn respond(&self, method: Method, path: &str, response: HttpResponse) -> &Self {
        self.push(method, path, Reply::Response(response));
        self
    }

    /// Queue a transport-level failure for `method path`
    pub fn fail(&self, method: Method, path: &str, message: &str) -> &Self {
        self.push(method, path, Reply::TransportFailure(message.to_string()));
        self
    }

    /// Requests received so far, oldest first
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The most recent request, if any
    pub fn last_request(&self) -> Option<HttpRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }

    fn push(&self, method: Method, path: &str, reply: Reply) {
        let mut routes = self.routes.lock().unwrap_or_else(PoisonError::into_inner);
        routes
            .entry((method, path.to_string()))
            .or_default()
            .push_back(reply);
    }

    fn next_reply(&self, method: Method, path: &str) -> Option<Reply> {
        let mut routes = self.routes.lock().unwrap_or_else(PoisonError::into_inner);
        let queue = routes.get_mut(&(method, path.to_string()))?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let path = request.path();
        let method = request.method;
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);

        match self.next_reply(method, &path) {
            Some(Reply::Response(response)) => Ok(response),
            Some(Reply::TransportFailure(message)) => Err(Error::Transport(message)),
            None => Ok(HttpResponse::new(404, format!("no route for {} {}", method, path))),
        }
    }
}
