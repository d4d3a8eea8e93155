//! Identity and network facts for one locally-hosted service instance.

/// Connection facts for reaching the registry.
///
/// Produced by configuration resolution and read-only afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegistryConfig {
    pub registry_host: String,
    pub registry_port: u16,
}

impl RegistryConfig {
    /// Base URL of the registry's HTTP API.
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.registry_host, self.registry_port)
    }
}

/// Identity and network facts for one service instance.
///
/// Created once at startup from resolved configuration and immutable for
/// the process lifetime. `service_id` is assigned before the first
/// register call and never changes while registered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceDescriptor {
    /// Unique per instance, stable for its lifetime.
    pub service_id: String,
    /// Logical name shared by all instances of the same service.
    pub service_name: String,
    /// Address the service is reachable at.
    pub host: String,
    pub port: u16,
    /// Context path under which the service exposes its resources.
    pub service_root: String,
    /// Heartbeat expiry window negotiated with the registry.
    pub ttl_seconds: u64,
    /// Where to reach the registry.
    pub registry: RegistryConfig,
}
