//! Farol client SDK for a Consul-style service registry.
//!
//! A running service instance uses [`RegistrationLifecycle`] to register
//! itself, keep the registration alive with TTL heartbeats, and
//! deregister on shutdown. Any caller can use [`DiscoveryClient`] to
//! resolve a healthy instance of another named service. Both talk to the
//! registry through the [`RegistryTransport`] capability, implemented
//! over HTTP by [`HttpRegistryTransport`].

pub mod config;
pub mod constants;
pub mod discovery;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod transport;

pub use config::ConfigResolver;
pub use discovery::DiscoveryClient;
pub use error::{Error, Result};
pub use http::{HttpTransportConfig, RegistryHttpClient};
pub use lifecycle::{LifecycleState, RegistrationLifecycle};
pub use transport::{HttpRegistryTransport, RegistryTransport};
