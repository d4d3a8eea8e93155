//! Registration lifecycle state machine
//!
//! Owns the register → heartbeat-loop → deregister sequence for one
//! local service instance. The host application decides whether the
//! feature is on and passes the flag in explicitly; a configuration
//! problem disables registration with a diagnostic instead of failing
//! the host process.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use farol_api::ServiceDescriptor;

use crate::config::ConfigResolver;
use crate::error::Error;
use crate::transport::{HttpRegistryTransport, RegistryTransport};

/// Observable states of one registration lifecycle.
///
/// `Failed` is terminal and reachable during startup only; heartbeat
/// problems after a successful registration are recovered in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Unregistered,
    Registering,
    Registered,
    Heartbeating,
    Deregistering,
    Deregistered,
    Failed,
}

/// Drives registration for one local service instance.
///
/// One lifecycle per descriptor; multiple independent lifecycles may
/// coexist in a process, each with its own transport.
pub struct RegistrationLifecycle {
    enabled: bool,
    resolver: Arc<ConfigResolver>,
    transport: RwLock<Option<Arc<dyn RegistryTransport>>>,
    descriptor: RwLock<Option<ServiceDescriptor>>,
    state: Arc<Mutex<LifecycleState>>,
    heartbeat: Mutex<Option<JoinHandle<()>>>,
}

impl RegistrationLifecycle {
    /// Create a lifecycle that builds its HTTP transport from the
    /// resolved registry configuration on `start`.
    pub fn new(enabled: bool, resolver: Arc<ConfigResolver>) -> Self {
        Self {
            enabled,
            resolver,
            transport: RwLock::new(None),
            descriptor: RwLock::new(None),
            state: Arc::new(Mutex::new(LifecycleState::Unregistered)),
            heartbeat: Mutex::new(None),
        }
    }

    /// Create a lifecycle with an injected transport.
    pub fn with_transport(
        enabled: bool,
        resolver: Arc<ConfigResolver>,
        transport: Arc<dyn RegistryTransport>,
    ) -> Self {
        Self {
            enabled,
            resolver,
            transport: RwLock::new(Some(transport)),
            descriptor: RwLock::new(None),
            state: Arc::new(Mutex::new(LifecycleState::Unregistered)),
            heartbeat: Mutex::new(None),
        }
    }

    /// Current state.
    pub fn state(&self) -> LifecycleState {
        *self.state.lock()
    }

    /// The resolved descriptor, available once `start` got past
    /// configuration resolution.
    pub fn descriptor(&self) -> Option<ServiceDescriptor> {
        self.descriptor.read().clone()
    }

    fn set_state(&self, state: LifecycleState) {
        *self.state.lock() = state;
    }

    /// Resolve the descriptor, register, and arm the heartbeat timer.
    ///
    /// Failures here never abort the host process: the lifecycle lands
    /// in `Failed` with a diagnostic and the feature stays off.
    pub async fn start(&self) {
        if !self.enabled {
            info!(
                "registration is not enabled for {}",
                self.resolver.service_name()
            );
            return;
        }

        let descriptor = match self.resolver.descriptor() {
            Ok(descriptor) => descriptor,
            Err(e) => {
                error!(
                    "registration is enabled but not configured properly: {}",
                    e
                );
                self.set_state(LifecycleState::Failed);
                return;
            }
        };

        let transport = match self.obtain_transport(&descriptor) {
            Ok(transport) => transport,
            Err(e) => {
                error!("could not build registry transport: {}", e);
                self.set_state(LifecycleState::Failed);
                return;
            }
        };

        *self.descriptor.write() = Some(descriptor.clone());
        self.set_state(LifecycleState::Registering);
        info!(
            "registering {} as {}",
            descriptor.service_name, descriptor.service_id
        );

        if let Err(e) = transport.register(&descriptor).await {
            error!("registration of {} failed: {}", descriptor.service_id, e);
            self.set_state(LifecycleState::Failed);
            return;
        }
        self.set_state(LifecycleState::Registered);

        self.arm_heartbeat(descriptor, transport);
        self.set_state(LifecycleState::Heartbeating);
    }

    fn obtain_transport(
        &self,
        descriptor: &ServiceDescriptor,
    ) -> crate::error::Result<Arc<dyn RegistryTransport>> {
        if let Some(transport) = self.transport.read().clone() {
            return Ok(transport);
        }
        let transport: Arc<dyn RegistryTransport> =
            Arc::new(HttpRegistryTransport::new(&descriptor.registry)?);
        *self.transport.write() = Some(transport.clone());
        Ok(transport)
    }

    fn arm_heartbeat(&self, descriptor: ServiceDescriptor, transport: Arc<dyn RegistryTransport>) {
        let state = Arc::clone(&self.state);
        let period = heartbeat_period(descriptor.ttl_seconds);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // A tick still in flight when the next is due must be
            // skipped, not queued: TTL resets have to stay in order.
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            ticker.tick().await; // the first tick completes immediately

            loop {
                ticker.tick().await;

                match transport.heartbeat(&descriptor.service_id).await {
                    Ok(()) => {
                        debug!("heartbeat ok for {}", descriptor.service_id);
                    }
                    Err(Error::NotRegistered { .. }) => {
                        warn!(
                            "registry purged {}, re-registering",
                            descriptor.service_id
                        );
                        *state.lock() = LifecycleState::Registering;
                        match transport.register(&descriptor).await {
                            Ok(()) => {
                                info!("re-registered {}", descriptor.service_id);
                            }
                            Err(e) => {
                                // retried on the next tick
                                warn!(
                                    "re-registration of {} failed: {}",
                                    descriptor.service_id, e
                                );
                            }
                        }
                        *state.lock() = LifecycleState::Heartbeating;
                    }
                    Err(e) => {
                        warn!(
                            "heartbeat for {} failed, will retry: {}",
                            descriptor.service_id, e
                        );
                    }
                }
            }
        });

        *self.heartbeat.lock() = Some(handle);
    }

    /// Cancel the heartbeat timer, then deregister best-effort.
    ///
    /// The final state is `Deregistered` regardless of whether the
    /// deregister call succeeds; the process is exiting anyway.
    pub async fn shutdown(&self) {
        // Cancel first so no heartbeat or re-register can resurrect the
        // entry. An armed timer means the lifecycle is active even while
        // the task transiently sits in `Registering` during recovery.
        let armed = match self.heartbeat.lock().take() {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        };

        {
            let mut state = self.state.lock();
            let active = armed
                || matches!(
                    *state,
                    LifecycleState::Registered | LifecycleState::Heartbeating
                );
            if !active {
                return;
            }
            *state = LifecycleState::Deregistering;
        }

        let descriptor = self.descriptor.read().clone();
        let transport = self.transport.read().clone();
        if let (Some(descriptor), Some(transport)) = (descriptor, transport) {
            info!("deregistering {}", descriptor.service_id);
            if let Err(e) = transport.deregister(&descriptor.service_id).await {
                warn!(
                    "deregistration of {} failed: {}",
                    descriptor.service_id, e
                );
            }
        }

        self.set_state(LifecycleState::Deregistered);
    }
}

/// Heartbeat period derived from the TTL: a third of the window,
/// floored at half a second. Always strictly below the TTL, even for a
/// one-second window.
fn heartbeat_period(ttl_seconds: u64) -> Duration {
    Duration::from_millis((ttl_seconds * 1000 / 3).max(500))
}
