//! Registration and de-registration against the local agent
//!
//! Mutations are never retried here. A register that timed out may already
//! have been applied, so whether to repeat it is the caller's decision.

use crate::blocking::DEFAULT_REQUEST_TIMEOUT;
use crate::error::{Error, Result};
use crate::models::RegistrationSpec;
use crate::transport::{HttpRequest, HttpResponse, Method, Transport};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Route accepting service definitions
pub const REGISTER_ROUTE: &str = "/v1/agent/service/register";
/// Route prefix removing a service by id
pub const DEREGISTER_ROUTE: &str = "/v1/agent/service/deregister";

/// Status the agent answers mutations with
const SUCCESS_STATUS: u16 = 200;

/// Submits register/deregister mutations to the local agent
#[derive(Clone)]
pub struct RegistrationWriter {
    transport: Arc<dyn Transport>,
    request_timeout: Duration,
}

impl RegistrationWriter {
    /// Create a writer over a transport
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Deadline for each mutation
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Register a service instance with the local agent.
    ///
    /// Succeeds only on status 200. Any other status, including other 2xx
    /// codes, is returned as [`Error::Registration`].
    pub async fn register(&self, spec: &RegistrationSpec) -> Result<()> {
        spec.validate()?;
        let body = serde_json::to_vec(spec).map_err(Error::Encode)?;

        debug!("Registering service {} as {}", spec.name, spec.service_id());
        let request = HttpRequest::new(Method::Put, REGISTER_ROUTE)
            .body(body)
            .timeout(self.request_timeout);
        let response = self.transport.send(request).await?;
        expect_success(response)?;

        debug!("Registered service {} ({})", spec.name, spec.service_id());
        Ok(())
    }

    /// Remove a service instance from the local agent.
    ///
    /// The agent treats an unknown id as a no-op, so repeating this call is
    /// safe. The route is a GET even though it mutates.
    pub async fn deregister(&self, service_id: &str) -> Result<()> {
        if service_id.trim().is_empty() {
            return Err(Error::InvalidArgument(
                "Service id cannot be empty".to_string(),
            ));
        }

        debug!("Deregistering service {}", service_id);
        let request = HttpRequest::new(Method::Get, DEREGISTER_ROUTE)
            .segment(service_id)
            .timeout(self.request_timeout);
        let response = self.transport.send(request).await?;
        expect_success(response)?;

        debug!("Deregistered service {}", service_id);
        Ok(())
    }
}

fn expect_success(response: HttpResponse) -> Result<()> {
    if response.status == SUCCESS_STATUS {
        Ok(())
    } else {
        Err(Error::Registration {
            status: response.status,
            body: response.text(),
        })
    }
}
