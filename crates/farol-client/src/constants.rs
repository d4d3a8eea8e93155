//! Well-known configuration keys and registry API paths

/// Default declarative configuration file, loaded once at startup.
pub const CONFIG_FILE: &str = "farol.yml";

/// Root section key inside the configuration file.
pub const CONFIG_ROOT_KEY: &str = "farol";

/// Configuration keys resolved through the override/env/file chain.
pub mod config_key {
    pub const HOST: &str = "host";
    pub const PORT: &str = "port";
    pub const SERVICE_ROOT: &str = "serviceRoot";
    pub const SERVICE_ID: &str = "serviceId";
    pub const SERVICE_TTL: &str = "serviceTTL";
    pub const REGISTRY_HOST: &str = "registryHost";
    pub const REGISTRY_PORT: &str = "registryPort";
}

/// Agent/health API paths on the registry.
pub mod agent_api_path {
    pub const SERVICE_REGISTER: &str = "/v1/agent/service/register";
    pub const SERVICE_DEREGISTER: &str = "/v1/agent/service/deregister";
    pub const CHECK_PASS: &str = "/v1/agent/check/pass";
    pub const HEALTH_SERVICE: &str = "/v1/health/service";
}
