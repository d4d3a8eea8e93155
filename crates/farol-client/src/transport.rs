//! Registry transport capability and its HTTP implementation
//!
//! Four operations against the registry's agent/health APIs. The
//! `heartbeat` operation maps the registry's "not registered" responses
//! to [`Error::NotRegistered`], keeping the purged-entry condition
//! distinguishable from a generic transport failure.

use async_trait::async_trait;
use tracing::debug;

use farol_api::{HealthRecord, ServiceDescriptor, ServiceRegistration};

use crate::constants::agent_api_path;
use crate::error::{Error, Result};
use crate::http::RegistryHttpClient;

/// Capability for talking to the registry.
#[async_trait]
pub trait RegistryTransport: Send + Sync {
    /// Declare an instance under its service name/id with the given TTL.
    /// Registering the same id twice is an upsert, never a duplicate.
    async fn register(&self, descriptor: &ServiceDescriptor) -> Result<()>;

    /// Reset the TTL clock for an instance. `Error::NotRegistered` means
    /// the registry already purged the entry.
    async fn heartbeat(&self, service_id: &str) -> Result<()>;

    /// Remove an instance. Best-effort at call sites.
    async fn deregister(&self, service_id: &str) -> Result<()>;

    /// Healthy instances of a named service, optionally restricted to a
    /// tag. An empty list is a valid outcome, not an error.
    async fn query_healthy(
        &self,
        service_name: &str,
        tag: Option<&str>,
    ) -> Result<Vec<HealthRecord>>;
}

/// `RegistryTransport` over the registry's HTTP API.
pub struct HttpRegistryTransport {
    http: RegistryHttpClient,
}

impl HttpRegistryTransport {
    pub fn new(registry: &farol_api::RegistryConfig) -> Result<Self> {
        Ok(Self {
            http: RegistryHttpClient::from_registry(registry)?,
        })
    }

    pub fn with_http(http: RegistryHttpClient) -> Self {
        Self { http }
    }
}

fn pass_path(service_id: &str) -> String {
    // TTL checks registered alongside a service get the derived id
    // `service:<service_id>`.
    format!("{}/service:{}", agent_api_path::CHECK_PASS, service_id)
}

fn deregister_path(service_id: &str) -> String {
    format!("{}/{}", agent_api_path::SERVICE_DEREGISTER, service_id)
}

fn health_path(service_name: &str, tag: Option<&str>) -> String {
    let mut path = format!("{}/{}?passing", agent_api_path::HEALTH_SERVICE, service_name);
    if let Some(tag) = tag {
        let tag = tag.trim();
        if !tag.is_empty() {
            path.push_str("&tag=");
            path.push_str(tag);
        }
    }
    path
}

/// Whether a pass-call response means the registry no longer knows the
/// check. Older registry versions answer 500 with a "does not have
/// associated TTL" message, newer ones plain 404.
fn is_not_registered(status: u16, body: &str) -> bool {
    status == 404 || (status == 500 && body.contains("does not have associated TTL"))
}

#[async_trait]
impl RegistryTransport for HttpRegistryTransport {
    async fn register(&self, descriptor: &ServiceDescriptor) -> Result<()> {
        let body = ServiceRegistration::from(descriptor);
        debug!(
            "registering service={} id={} ttl={}s",
            descriptor.service_name, descriptor.service_id, descriptor.ttl_seconds
        );
        self.http
            .put_json(agent_api_path::SERVICE_REGISTER, &body)
            .await
    }

    async fn heartbeat(&self, service_id: &str) -> Result<()> {
        let (status, body) = self.http.put_raw(&pass_path(service_id)).await?;
        if (200..300).contains(&status) {
            return Ok(());
        }
        if is_not_registered(status, &body) {
            return Err(Error::NotRegistered {
                service_id: service_id.to_string(),
            });
        }
        Err(Error::Status { status, body })
    }

    async fn deregister(&self, service_id: &str) -> Result<()> {
        debug!("deregistering id={}", service_id);
        self.http.put(&deregister_path(service_id)).await
    }

    async fn query_healthy(
        &self,
        service_name: &str,
        tag: Option<&str>,
    ) -> Result<Vec<HealthRecord>> {
        self.http.get_json(&health_path(service_name, tag)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pass_path() {
        assert_eq!(pass_path("orders-1"), "/v1/agent/check/pass/service:orders-1");
    }

    #[test]
    fn test_deregister_path() {
        assert_eq!(
            deregister_path("orders-1"),
            "/v1/agent/service/deregister/orders-1"
        );
    }

    #[test]
    fn test_health_path_without_tag() {
        assert_eq!(
            health_path("orders", None),
            "/v1/health/service/orders?passing"
        );
    }

    #[test]
    fn test_health_path_with_tag_trimmed() {
        assert_eq!(
            health_path("orders", Some("  primary ")),
            "/v1/health/service/orders?passing&tag=primary"
        );
    }

    #[test]
    fn test_health_path_blank_tag_dropped() {
        assert_eq!(
            health_path("orders", Some("   ")),
            "/v1/health/service/orders?passing"
        );
    }

    #[test]
    fn test_is_not_registered() {
        assert!(is_not_registered(404, ""));
        assert!(is_not_registered(
            500,
            r#"CheckID "service:orders-1" does not have associated TTL"#
        ));
        assert!(!is_not_registered(500, "internal error"));
        assert!(!is_not_registered(503, ""));
    }
}
