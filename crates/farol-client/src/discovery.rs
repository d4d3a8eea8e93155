//! Service discovery over the registry's health API
//!
//! Queries healthy instances of a named service and hands back one
//! usable endpoint. Stateless; each call is self-contained and callers
//! may invoke it concurrently. Results are not cached across calls.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use farol_api::DiscoveredInstance;

use crate::error::{Error, Result};
use crate::transport::RegistryTransport;

/// Resolves healthy endpoints for named services.
pub struct DiscoveryClient {
    transport: Arc<dyn RegistryTransport>,
}

impl DiscoveryClient {
    pub fn new(transport: Arc<dyn RegistryTransport>) -> Self {
        Self { transport }
    }

    /// One healthy endpoint of `service_name`, optionally restricted to
    /// a tag.
    ///
    /// Selection among equally healthy instances is arbitrary, not
    /// load-balanced. `Error::NoInstanceAvailable` means the dependency
    /// is currently down, as opposed to a transport failure worth
    /// retrying.
    pub async fn discover(
        &self,
        service_name: &str,
        tag: Option<&str>,
    ) -> Result<DiscoveredInstance> {
        let instances = self.healthy_endpoints(service_name, tag).await?;
        instances
            .into_iter()
            .next()
            .ok_or_else(|| Error::NoInstanceAvailable {
                service_name: service_name.to_string(),
            })
    }

    /// All distinct healthy endpoints of one service.
    ///
    /// Records whose checks are not all passing are dropped even when
    /// the registry returned them; the `?passing` filter is re-verified
    /// on the client side.
    pub async fn healthy_endpoints(
        &self,
        service_name: &str,
        tag: Option<&str>,
    ) -> Result<HashSet<DiscoveredInstance>> {
        let records = self.transport.query_healthy(service_name, tag).await?;
        let instances: HashSet<DiscoveredInstance> = records
            .iter()
            .filter(|record| record.all_passing())
            .map(|record| record.endpoint())
            .collect();
        debug!(
            "discovered {} instance(s) of {} from {} record(s)",
            instances.len(),
            service_name,
            records.len()
        );
        Ok(instances)
    }

    /// Union of distinct healthy endpoints across several service names.
    pub async fn discover_healthy_nodes(
        &self,
        service_names: &[&str],
    ) -> Result<HashSet<DiscoveredInstance>> {
        let mut result = HashSet::new();
        for service_name in service_names {
            result.extend(self.healthy_endpoints(service_name, None).await?);
        }
        Ok(result)
    }

    /// Convenience for the common "where is this dependency" question.
    pub async fn resolve_service(&self, service_name: &str) -> Result<DiscoveredInstance> {
        self.discover(service_name, None).await
    }
}
