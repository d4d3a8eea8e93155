//! Registration request body for `PUT /v1/agent/service/register`.

use serde::{Deserialize, Serialize};

use crate::descriptor::ServiceDescriptor;

/// TTL health check definition embedded in a registration.
///
/// The registry derives the check id `service:<service_id>` from it and
/// purges the instance when no pass call arrives within the TTL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtlCheck {
    #[serde(rename = "TTL")]
    pub ttl: String,
}

/// Body of a service registration. Registering twice with the same id is
/// an upsert on the registry side, never a duplicate entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceRegistration {
    #[serde(rename = "ID")]
    pub id: String,

    #[serde(rename = "Name")]
    pub name: String,

    #[serde(rename = "Address")]
    pub address: String,

    #[serde(rename = "Port")]
    pub port: u16,

    #[serde(rename = "Check")]
    pub check: TtlCheck,
}

impl From<&ServiceDescriptor> for ServiceRegistration {
    fn from(descriptor: &ServiceDescriptor) -> Self {
        Self {
            id: descriptor.service_id.clone(),
            name: descriptor.service_name.clone(),
            address: descriptor.host.clone(),
            port: descriptor.port,
            check: TtlCheck {
                ttl: format!("{}s", descriptor.ttl_seconds),
            },
        }
    }
}
