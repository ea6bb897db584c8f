//! Common test utilities for catalog client integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use catalog_client::{
    Error, HttpRequest, HttpResponse, Method, RegistrationSpec, Result, Transport,
};
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Hold applied by the fake when a blocking read names no wait
pub const FAKE_DEFAULT_HOLD: Duration = Duration::from_secs(2);

/// Poll interval of the fake's blocking loop
const TICK: Duration = Duration::from_millis(10);

#[derive(Debug)]
struct State {
    index: u64,
    leader: bool,
    holding: usize,
    services: Vec<RegistrationSpec>,
}

/// Counts a blocking read as held until dropped
struct HoldGuard(Arc<Mutex<State>>);

impl HoldGuard {
    fn new(state: Arc<Mutex<State>>) -> Self {
        state.lock().unwrap().holding += 1;
        Self(state)
    }
}

impl Drop for HoldGuard {
    fn drop(&mut self) {
        self.0.lock().unwrap().holding -= 1;
    }
}

/// Stateful stand-in for an agent plus catalog
///
/// Registrations bump the index, blocking reads hold until the index moves
/// or their wait elapses, and `consistent` reads fail without a leader.
#[derive(Debug, Clone)]
pub struct FakeRegistry {
    state: Arc<Mutex<State>>,
}

impl FakeRegistry {
    /// Empty registry at index 1 with a leader
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                index: 1,
                leader: true,
                holding: 0,
                services: Vec::new(),
            })),
        }
    }

    /// Current index
    pub fn index(&self) -> u64 {
        self.state.lock().unwrap().index
    }

    /// Number of blocking reads currently held open
    pub fn holding(&self) -> usize {
        self.state.lock().unwrap().holding
    }

    /// Simulate loss or recovery of leader contact
    pub fn set_leader(&self, leader: bool) {
        self.state.lock().unwrap().leader = leader;
    }

    /// Register directly, bypassing HTTP
    pub fn seed(&self, spec: RegistrationSpec) {
        let mut state = self.state.lock().unwrap();
        state.services.retain(|s| s.service_id() != spec.service_id());
        state.services.push(spec);
        state.index += 1;
    }

    fn catalog_body(&self, name: &str) -> String {
        let state = self.state.lock().unwrap();
        let entries: Vec<_> = state
            .services
            .iter()
            .filter(|s| s.name == name)
            .map(|s| {
                json!({
                    "Node": "node-1",
                    "Address": "10.0.0.1",
                    "ServiceName": s.name,
                    "ServiceID": s.service_id(),
                    "ServiceAddress": s.address.clone().unwrap_or_default(),
                    "ServicePort": s.port.unwrap_or(0),
                    "ServiceTags": s.tags,
                })
            })
            .collect();
        serde_json::to_string(&entries).unwrap()
    }

    fn meta_headers(&self, response: HttpResponse) -> HttpResponse {
        let state = self.state.lock().unwrap();
        response
            .with_header("X-Consul-Index", state.index.to_string())
            .with_header("X-Consul-KnownLeader", state.leader.to_string())
            .with_header("X-Consul-LastContact", "0")
    }

    async fn read(&self, request: &HttpRequest, name: &str) -> HttpResponse {
        let param = |key: &str| {
            request
                .query
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
        };

        if param("consistent").is_some() && !self.state.lock().unwrap().leader {
            return HttpResponse::new(500, "No cluster leader");
        }

        if let Some(index) = param("index").and_then(|v| v.parse::<u64>().ok()) {
            let wait = param("wait")
                .and_then(|w| humantime_serde::re::humantime::parse_duration(&w).ok())
                .unwrap_or(FAKE_DEFAULT_HOLD);
            let _hold = HoldGuard::new(self.state.clone());
            let started = Instant::now();
            while self.index() <= index && started.elapsed() < wait {
                smol::Timer::after(TICK).await;
            }
        }

        self.meta_headers(HttpResponse::new(200, self.catalog_body(name)))
    }
}

#[async_trait]
impl Transport for FakeRegistry {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let segments: Vec<&str> = request.path_segments.iter().map(String::as_str).collect();
        let response = match (request.method, segments.as_slice()) {
            (Method::Get, ["v1", "catalog", "service", name]) => self.read(&request, name).await,
            (Method::Put, ["v1", "agent", "service", "register"]) => {
                let body = request.body.clone().unwrap_or_default();
                match serde_json::from_slice::<RegistrationSpec>(&body) {
                    Ok(spec) => {
                        self.seed(spec);
                        HttpResponse::new(200, "")
                    }
                    Err(e) => HttpResponse::new(400, format!("Request decode failed: {}", e)),
                }
            }
            (Method::Get, ["v1", "agent", "service", "deregister", id]) => {
                let mut state = self.state.lock().unwrap();
                let before = state.services.len();
                state.services.retain(|s| s.service_id() != *id);
                if state.services.len() != before {
                    state.index += 1;
                }
                HttpResponse::new(200, "")
            }
            _ => return Err(Error::Transport(format!("unexpected route {}", request.path()))),
        };
        Ok(response)
    }
}

/// `web` instance from the documented example
pub fn web_spec(id: &str) -> RegistrationSpec {
    RegistrationSpec::new("web")
        .with_id(id)
        .with_address("10.0.0.5")
        .with_port(8080)
        .with_tag("primary")
}
