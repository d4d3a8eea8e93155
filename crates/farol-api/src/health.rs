//! Health API response models.
//!
//! Field names follow the registry's wire format (PascalCase JSON keys),
//! so every struct carries explicit `#[serde(rename = ...)]` attributes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Aggregate check status values reported by the registry.
pub mod check_status {
    pub const PASSING: &str = "passing";
    pub const WARNING: &str = "warning";
    pub const CRITICAL: &str = "critical";
}

/// The node (agent host) a service instance runs on.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Node {
    #[serde(rename = "Node", default)]
    pub name: String,

    #[serde(rename = "Address", default)]
    pub address: String,
}

/// The service-level entry inside a health record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceEntry {
    #[serde(rename = "ID", default)]
    pub id: String,

    #[serde(rename = "Service", default)]
    pub service: String,

    #[serde(rename = "Tags", default)]
    pub tags: Vec<String>,

    /// Service address; may be empty, in which case the node address is
    /// the effective one.
    #[serde(rename = "Address", default)]
    pub address: String,

    #[serde(rename = "Port", default)]
    pub port: u16,
}

/// One health check status attached to a record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Check {
    #[serde(rename = "CheckID", default)]
    pub check_id: String,

    #[serde(rename = "Name", default)]
    pub name: String,

    #[serde(rename = "Node", default)]
    pub node: String,

    #[serde(rename = "Notes", default)]
    pub notes: String,

    #[serde(rename = "Output", default)]
    pub output: String,

    #[serde(rename = "ServiceID", default)]
    pub service_id: String,

    #[serde(rename = "ServiceName", default)]
    pub service_name: String,

    #[serde(rename = "Status", default)]
    pub status: String,
}

/// One (node, service instance, checks) tuple returned by
/// `GET /v1/health/service/{name}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HealthRecord {
    #[serde(rename = "Node", default)]
    pub node: Node,

    #[serde(rename = "Service", default)]
    pub service: ServiceEntry,

    #[serde(rename = "Checks", default)]
    pub checks: Vec<Check>,
}

impl HealthRecord {
    /// The effective endpoint of this record: the service address when
    /// non-empty, the node address otherwise, paired with the service
    /// port.
    pub fn endpoint(&self) -> DiscoveredInstance {
        let ip = if self.service.address.is_empty() {
            self.node.address.clone()
        } else {
            self.service.address.clone()
        };
        DiscoveredInstance {
            ip,
            port: self.service.port,
        }
    }

    /// Whether every check attached to this record is passing.
    pub fn all_passing(&self) -> bool {
        self.checks
            .iter()
            .all(|check| check.status == check_status::PASSING)
    }
}

/// Reduced form of a health record handed to callers.
///
/// Equality is by value: a set of `DiscoveredInstance` deduplicates
/// identical endpoints returned by multiple checks.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DiscoveredInstance {
    pub ip: String,
    pub port: u16,
}

impl fmt::Display for DiscoveredInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.ip, self.port)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn record(service_address: &str, node_address: &str, port: u16) -> HealthRecord {
        HealthRecord {
            node: Node {
                name: "node-1".to_string(),
                address: node_address.to_string(),
            },
            service: ServiceEntry {
                id: "orders-1".to_string(),
                service: "orders".to_string(),
                address: service_address.to_string(),
                port,
                ..Default::default()
            },
            checks: Vec::new(),
        }
    }

    #[test]
    fn test_endpoint_prefers_service_address() {
        let endpoint = record("10.0.0.5", "192.168.0.1", 8080).endpoint();
        assert_eq!(endpoint.ip, "10.0.0.5");
        assert_eq!(endpoint.port, 8080);
    }

    #[test]
    fn test_endpoint_falls_back_to_node_address() {
        let endpoint = record("", "192.168.0.1", 8080).endpoint();
        assert_eq!(endpoint.ip, "192.168.0.1");
        assert_eq!(endpoint.port, 8080);
    }

    #[test]
    fn test_discovered_instance_dedup() {
        let mut set = HashSet::new();
        set.insert(record("10.0.0.5", "", 8080).endpoint());
        set.insert(record("10.0.0.5", "192.168.0.1", 8080).endpoint());
        set.insert(record("10.0.0.6", "", 8080).endpoint());
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_all_passing() {
        let mut rec = record("10.0.0.5", "", 8080);
        rec.checks.push(Check {
            status: check_status::PASSING.to_string(),
            ..Default::default()
        });
        assert!(rec.all_passing());

        rec.checks.push(Check {
            status: check_status::CRITICAL.to_string(),
            ..Default::default()
        });
        assert!(!rec.all_passing());
    }

    #[test]
    fn test_deserialize_health_response() {
        let json = r#"[
            {
                "Node": {"Node": "agent-one", "Address": "192.168.10.10"},
                "Service": {
                    "ID": "orders-1",
                    "Service": "orders",
                    "Tags": ["primary"],
                    "Address": "10.1.10.12",
                    "Port": 8080
                },
                "Checks": [
                    {
                        "CheckID": "service:orders-1",
                        "Name": "Service 'orders' check",
                        "ServiceID": "orders-1",
                        "ServiceName": "orders",
                        "Status": "passing"
                    }
                ]
            }
        ]"#;

        let records: Vec<HealthRecord> = serde_json::from_str(json).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].node.address, "192.168.10.10");
        assert_eq!(records[0].service.tags, vec!["primary".to_string()]);
        assert_eq!(records[0].checks[0].status, check_status::PASSING);
        assert_eq!(records[0].endpoint().to_string(), "10.1.10.12:8080");
    }
}
