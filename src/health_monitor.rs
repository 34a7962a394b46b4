//! HealthMonitor: long-running cooperative liveness sweep. A `tokio::spawn`ed
//! loop selects between an interval tick and a shutdown channel; the handle
//! and sender are both stored behind a `Mutex` so `stop` is idempotent. Sweeps
//! agent liveness by checking heartbeat recency and, where configured, probing
//! health endpoints directly.

use crate::models::AgentStatus;
use crate::registry::Registry;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

/// Issues the liveness probe against a declared health endpoint. Kept as a
/// seam so tests don't need a real HTTP server.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    async fn probe(&self, endpoint: &url::Url, timeout: Duration) -> bool;
}

/// `reqwest`-backed probe: a GET against the endpoint, 2xx is healthy.
pub struct HttpHealthProbe {
    client: reqwest::Client,
}

impl HttpHealthProbe {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpHealthProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HealthProbe for HttpHealthProbe {
    async fn probe(&self, endpoint: &url::Url, timeout: Duration) -> bool {
        match self.client.get(endpoint.clone()).timeout(timeout).send().await {
            Ok(response) => response.status().is_success(),
            Err(error) => {
                tracing::debug!(%endpoint, %error, "health probe failed");
                false
            }
        }
    }
}

use crate::config::HealthMonitorConfig;

pub struct HealthMonitor {
    registry: Arc<Registry>,
    probe: Arc<dyn HealthProbe>,
    config: HealthMonitorConfig,
    handle: Mutex<Option<JoinHandle<()>>>,
    shutdown_tx: Mutex<Option<mpsc::Sender<()>>>,
}

impl HealthMonitor {
    pub fn new(registry: Arc<Registry>, probe: Arc<dyn HealthProbe>, config: HealthMonitorConfig) -> Self {
        Self {
            registry,
            probe,
            config,
            handle: Mutex::new(None),
            shutdown_tx: Mutex::new(None),
        }
    }

    /// Starts the background sweep. A second call while already running is
    /// a no-op.
    pub async fn start(self: &Arc<Self>) {
        if self.handle.lock().await.is_some() {
            tracing::warn!("health monitor already running");
            return;
        }

        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        *self.shutdown_tx.lock().await = Some(shutdown_tx);

        let monitor = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(monitor.config.check_interval);
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        monitor.sweep().await;
                    }
                    _ = shutdown_rx.recv() => {
                        tracing::info!("health monitor shutting down");
                        break;
                    }
                }
            }
        });

        *self.handle.lock().await = Some(handle);
        tracing::info!(interval_secs = self.config.check_interval.as_secs(), "health monitor started");
    }

    /// Stops the sweep. Idempotent: calling `stop` on an already-stopped
    /// monitor does nothing.
    pub async fn stop(&self) {
        if let Some(sender) = self.shutdown_tx.lock().await.take() {
            let _ = sender.send(()).await;
        }
        if let Some(handle) = self.handle.lock().await.take() {
            let _ = handle.await;
        }
    }

    /// One pass over active descriptors: heartbeat staleness first, then an
    /// endpoint probe for agents that survived that check. Promotion back to
    /// `ONLINE` happens only via the heartbeat path in the registry, never here.
    pub async fn sweep(&self) {
        let now = chrono::Utc::now();
        let heartbeat_floor =
            now - chrono::Duration::from_std(self.config.heartbeat_timeout).unwrap_or_default();

        for descriptor in self.registry.all().await {
            if !descriptor.status.is_active() {
                continue;
            }

            let heartbeat_is_stale = match descriptor.last_heartbeat {
                Some(heartbeat) => heartbeat <= heartbeat_floor,
                None => descriptor.registered_at <= heartbeat_floor,
            };

            if heartbeat_is_stale {
                tracing::warn!(agent_id = %descriptor.agent_id, "heartbeat timeout, marking offline");
                let _ = self
                    .registry
                    .update_status(&descriptor.agent_id, AgentStatus::Offline)
                    .await;
                continue;
            }

            if let Some(endpoint) = &descriptor.health_endpoint {
                let healthy = self.probe.probe(endpoint, self.config.probe_timeout).await;
                if !healthy {
                    tracing::warn!(agent_id = %descriptor.agent_id, "health probe failed, marking offline");
                    let _ = self
                        .registry
                        .update_status(&descriptor.agent_id, AgentStatus::Offline)
                        .await;
                }
            }
        }
    }
}
