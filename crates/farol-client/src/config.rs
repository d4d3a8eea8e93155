//! Layered configuration resolution
//!
//! A key is resolved through a fixed precedence chain, first hit wins:
//! process-level override, then the `<serviceName>.<key>` environment
//! variable, then the declarative configuration file. Keys are resolved
//! independently and lazily; a key nobody asks for never has to exist.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use parking_lot::RwLock;
use tracing::{debug, warn};

use farol_api::{RegistryConfig, ServiceDescriptor};

use crate::constants::{self, config_key};
use crate::error::{Error, Result};

/// Resolves named configuration keys for one service.
///
/// The configuration file is read once at construction; a missing or
/// malformed file downgrades to an empty source with a diagnostic and
/// resolution falls back to the override/env sources.
pub struct ConfigResolver {
    service_name: String,
    overrides: RwLock<HashMap<String, String>>,
    file: HashMap<String, String>,
}

impl ConfigResolver {
    /// Create a resolver reading the default configuration file from the
    /// working directory.
    pub fn new(service_name: &str) -> Self {
        Self::with_file(service_name, Path::new(constants::CONFIG_FILE))
    }

    /// Create a resolver with an explicit configuration file path.
    pub fn with_file(service_name: &str, path: &Path) -> Self {
        Self {
            service_name: service_name.to_string(),
            overrides: RwLock::new(HashMap::new()),
            file: load_config_file(path),
        }
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Set a process-level override, checked before env and file.
    /// Primarily intended for test injection and command-line overrides.
    pub fn set_override(&self, key: &str, value: &str) {
        self.overrides
            .write()
            .insert(key.to_string(), value.to_string());
    }

    /// Remove a process-level override.
    pub fn clear_override(&self, key: &str) {
        self.overrides.write().remove(key);
    }

    /// Resolve a key: override, then `<serviceName>.<key>` from the
    /// environment, then the configuration file.
    pub fn resolve(&self, key: &str) -> Result<String> {
        if let Some(value) = self.overrides.read().get(key) {
            return Ok(value.clone());
        }

        if let Ok(value) = std::env::var(format!("{}.{}", self.service_name, key)) {
            return Ok(value);
        }

        if let Some(value) = self.file.get(key) {
            return Ok(value.clone());
        }

        Err(Error::Configuration {
            key: key.to_string(),
        })
    }

    fn resolve_parsed<T: FromStr>(&self, key: &str) -> Result<T> {
        let raw = self.resolve(key)?;
        raw.trim().parse().map_err(|_| {
            warn!("configuration key `{}` has unparsable value `{}`", key, raw);
            Error::Configuration {
                key: key.to_string(),
            }
        })
    }

    /// Resolve the connection facts for reaching the registry.
    pub fn registry_config(&self) -> Result<RegistryConfig> {
        Ok(RegistryConfig {
            registry_host: self.resolve(config_key::REGISTRY_HOST)?,
            registry_port: self.resolve_parsed(config_key::REGISTRY_PORT)?,
        })
    }

    /// Build the full descriptor for this instance.
    ///
    /// `serviceId` is the one optional key: when unresolvable, an id is
    /// minted once as `<serviceName>-<uuid>` and reused for the process
    /// lifetime.
    pub fn descriptor(&self) -> Result<ServiceDescriptor> {
        let service_id = self
            .resolve(config_key::SERVICE_ID)
            .ok()
            .unwrap_or_else(|| {
                let minted = format!("{}-{}", self.service_name, uuid::Uuid::new_v4());
                debug!("no serviceId configured, minted {}", minted);
                minted
            });

        Ok(ServiceDescriptor {
            service_id,
            service_name: self.service_name.clone(),
            host: self.resolve(config_key::HOST)?,
            port: self.resolve_parsed(config_key::PORT)?,
            service_root: self.resolve(config_key::SERVICE_ROOT)?,
            ttl_seconds: self.resolve_parsed(config_key::SERVICE_TTL)?,
            registry: self.registry_config()?,
        })
    }
}

/// Load the root section of the configuration file as a flat string map.
///
/// Absence and malformed content are both non-fatal: they downgrade to
/// "no file source" so resolution keeps working from override/env.
fn load_config_file(path: &Path) -> HashMap<String, String> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(_) => {
            debug!(
                "no configuration file at {}, using env properties",
                path.display()
            );
            return HashMap::new();
        }
    };

    let value: serde_yaml::Value = match serde_yaml::from_str(&text) {
        Ok(value) => value,
        Err(e) => {
            warn!(
                "malformed configuration file {}: {}, using env properties",
                path.display(),
                e
            );
            return HashMap::new();
        }
    };

    let Some(serde_yaml::Value::Mapping(section)) = value.get(constants::CONFIG_ROOT_KEY) else {
        warn!(
            "configuration file {} has no `{}` section, using env properties",
            path.display(),
            constants::CONFIG_ROOT_KEY
        );
        return HashMap::new();
    };

    section
        .iter()
        .filter_map(|(key, value)| {
            let key = key.as_str()?.to_string();
            Some((key, scalar_to_string(value)?))
        })
        .collect()
}

fn scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_config(dir: &tempfile::TempDir, content: &str) -> std::path::PathBuf {
        let path = dir.path().join("farol.yml");
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_file_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            "farol:\n  registryHost: consul.local\n  registryPort: 8500\n",
        );

        let resolver = ConfigResolver::with_file("orders", &path);
        assert_eq!(resolver.resolve("registryHost").unwrap(), "consul.local");
        // numeric YAML scalars flatten to strings
        assert_eq!(resolver.resolve("registryPort").unwrap(), "8500");
    }

    #[test]
    fn test_override_beats_env_beats_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "farol:\n  registryHost: file-host\n");

        let resolver = ConfigResolver::with_file("precedence-test", &path);
        unsafe {
            std::env::set_var("precedence-test.registryHost", "env-host");
        }
        assert_eq!(resolver.resolve("registryHost").unwrap(), "env-host");

        resolver.set_override("registryHost", "override-host");
        assert_eq!(resolver.resolve("registryHost").unwrap(), "override-host");

        resolver.clear_override("registryHost");
        assert_eq!(resolver.resolve("registryHost").unwrap(), "env-host");

        unsafe {
            std::env::remove_var("precedence-test.registryHost");
        }
        assert_eq!(resolver.resolve("registryHost").unwrap(), "file-host");
    }

    #[test]
    fn test_unresolvable_key_fails() {
        let resolver =
            ConfigResolver::with_file("missing-test", Path::new("does-not-exist.yml"));
        let err = resolver.resolve("registryHost").unwrap_err();
        assert!(matches!(err, Error::Configuration { key } if key == "registryHost"));
    }

    #[test]
    fn test_malformed_file_downgrades_to_env() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "farol: [unclosed\n  - ][");

        let resolver = ConfigResolver::with_file("malformed-test", &path);
        assert!(resolver.resolve("registryHost").is_err());

        unsafe {
            std::env::set_var("malformed-test.registryHost", "env-host");
        }
        assert_eq!(resolver.resolve("registryHost").unwrap(), "env-host");
        unsafe {
            std::env::remove_var("malformed-test.registryHost");
        }
    }

    #[test]
    fn test_missing_root_section_is_empty_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "other:\n  registryHost: nope\n");

        let resolver = ConfigResolver::with_file("section-test", &path);
        assert!(resolver.resolve("registryHost").is_err());
    }

    #[test]
    fn test_descriptor_from_full_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            concat!(
                "farol:\n",
                "  host: 10.1.10.12\n",
                "  port: 8080\n",
                "  serviceRoot: api\n",
                "  serviceId: orders-1\n",
                "  serviceTTL: 30\n",
                "  registryHost: 127.0.0.1\n",
                "  registryPort: 8500\n",
            ),
        );

        let resolver = ConfigResolver::with_file("orders", &path);
        let descriptor = resolver.descriptor().unwrap();
        assert_eq!(descriptor.service_id, "orders-1");
        assert_eq!(descriptor.service_name, "orders");
        assert_eq!(descriptor.host, "10.1.10.12");
        assert_eq!(descriptor.port, 8080);
        assert_eq!(descriptor.service_root, "api");
        assert_eq!(descriptor.ttl_seconds, 30);
        assert_eq!(descriptor.registry.base_url(), "http://127.0.0.1:8500");
    }

    #[test]
    fn test_descriptor_mints_service_id_when_absent() {
        let resolver = ConfigResolver::with_file("orders", Path::new("does-not-exist.yml"));
        resolver.set_override("host", "10.1.10.12");
        resolver.set_override("port", "8080");
        resolver.set_override("serviceRoot", "api");
        resolver.set_override("serviceTTL", "30");
        resolver.set_override("registryHost", "127.0.0.1");
        resolver.set_override("registryPort", "8500");

        let descriptor = resolver.descriptor().unwrap();
        assert!(descriptor.service_id.starts_with("orders-"));
        assert!(descriptor.service_id.len() > "orders-".len());
    }

    #[test]
    fn test_descriptor_fails_on_missing_required_key() {
        let resolver = ConfigResolver::with_file("orders", Path::new("does-not-exist.yml"));
        resolver.set_override("host", "10.1.10.12");

        let err = resolver.descriptor().unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn test_unparsable_port_is_configuration_error() {
        let resolver = ConfigResolver::with_file("orders", Path::new("does-not-exist.yml"));
        resolver.set_override("registryHost", "127.0.0.1");
        resolver.set_override("registryPort", "not-a-port");

        let err = resolver.registry_config().unwrap_err();
        assert!(matches!(err, Error::Configuration { key } if key == "registryPort"));
    }
}
