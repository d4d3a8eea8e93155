//! Client error types for the Farol SDK

/// Error type for configuration, transport, and discovery operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required configuration key is absent from all three sources
    /// (process override, environment, configuration file).
    #[error("`{key}` must be configured as a process override, env parameter, or in the configuration file")]
    Configuration { key: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("registry returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// The registry purged the entry because the TTL expired before a
    /// heartbeat arrived. Expected and recoverable.
    #[error("service `{service_id}` is not registered with the registry")]
    NotRegistered { service_id: String },

    /// Discovery succeeded but no healthy instance exists.
    #[error("no healthy instance available for service `{service_name}`")]
    NoInstanceAvailable { service_name: String },
}

impl Error {
    /// Network/protocol failures callers typically retry, as opposed to
    /// the expected `NotRegistered`/`NoInstanceAvailable` conditions.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Http(_) | Error::Status { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
