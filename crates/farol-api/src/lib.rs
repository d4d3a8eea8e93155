//! Data and wire models for the Farol registry client.
//!
//! `descriptor` holds the locally-resolved identity of one service
//! instance, `registration` the request body sent to the registry, and
//! `health` the records the registry's health API returns.

pub mod descriptor;
pub mod health;
pub mod registration;

pub use descriptor::{RegistryConfig, ServiceDescriptor};
pub use health::{Check, DiscoveredInstance, HealthRecord, Node, ServiceEntry, check_status};
pub use registration::{ServiceRegistration, TtlCheck};
