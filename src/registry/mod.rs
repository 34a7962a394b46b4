//! Agent Registry: durable catalog + live in-process index.

mod catalog;

pub use catalog::{DurableCatalog, InMemoryCatalog};

use crate::auth::AgentLookup;
use crate::collaborators::AgentClient;
use crate::error::{CoreError, Result};
use crate::models::{AgentDescriptor, AgentEndpoints, AgentPermissions, AgentStatus};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

/// Builds an invocation client for an external descriptor's declared
/// transport. Construction must never block on I/O.
pub trait AgentClientFactory: Send + Sync {
    fn build(&self, descriptor: &AgentDescriptor) -> Result<Arc<dyn AgentClient>>;
}

/// Secondary store an external descriptor's endpoints/permissions are
/// backfilled from when the registry hasn't learned them yet.
pub trait DisplayConfigStore: Send + Sync {
    fn lookup(&self, agent_id: &str) -> Option<(AgentEndpoints, AgentPermissions)>;
}

/// Validates that an external descriptor's declared requirements are
/// satisfiable: a descriptor requiring mTLS must carry a certificate, one
/// requiring a signature must carry an API key.
fn validate_external_permissions(permissions: &AgentPermissions) -> bool {
    (!permissions.require_mtls || permissions.server_certificate.is_some())
        && (!permissions.require_signature || permissions.api_key.is_some())
}

struct LiveIndex {
    descriptors: HashMap<String, AgentDescriptor>,
    instances: HashMap<String, Arc<dyn AgentClient>>,
}

impl LiveIndex {
    fn new() -> Self {
        Self {
            descriptors: HashMap::new(),
            instances: HashMap::new(),
        }
    }
}

pub struct Registry {
    catalog: Arc<dyn DurableCatalog>,
    display_config: Option<Arc<dyn DisplayConfigStore>>,
    client_factory: Arc<dyn AgentClientFactory>,
    live: RwLock<LiveIndex>,
    hydrated: AtomicBool,
    heartbeat_timeout: Duration,
}

impl Registry {
    pub fn new(
        catalog: Arc<dyn DurableCatalog>,
        client_factory: Arc<dyn AgentClientFactory>,
        display_config: Option<Arc<dyn DisplayConfigStore>>,
        heartbeat_timeout: Duration,
    ) -> Self {
        Self {
            catalog,
            display_config,
            client_factory,
            live: RwLock::new(LiveIndex::new()),
            hydrated: AtomicBool::new(false),
            heartbeat_timeout,
        }
    }

    /// Registers a new descriptor, or treats an existing `agent_id` as an
    /// update. `instance` is the invocable reference for internal agents; ignored
    /// for external ones.
    pub async fn register(
        &self,
        mut descriptor: AgentDescriptor,
        instance: Option<Arc<dyn AgentClient>>,
    ) -> Result<()> {
        self.ensure_hydrated().await;

        let is_internal = descriptor.endpoints.is_internal;

        if !is_internal && !validate_external_permissions(&descriptor.permissions) {
            return Err(CoreError::InvalidConfig(format!(
                "agent '{}' has an inconsistent authentication configuration",
                descriptor.agent_id
            )));
        }

        if is_internal && instance.is_none() {
            tracing::error!(
                agent_id = %descriptor.agent_id,
                "internal agent registered without an invocable reference"
            );
        }

        let already_known = {
            let live = self.live.read().unwrap();
            live.descriptors.contains_key(&descriptor.agent_id)
        };

        if already_known {
            let mut live = self.live.write().unwrap();
            let existing = live.descriptors.get_mut(&descriptor.agent_id).unwrap();
            descriptor.status = AgentStatus::Online;
            descriptor.last_heartbeat = Some(chrono::Utc::now());
            descriptor.is_system_agent = existing.is_system_agent;
            *existing = descriptor.clone();
            if is_internal {
                if let Some(instance) = instance {
                    live.instances.insert(descriptor.agent_id.clone(), instance);
                }
            }
        } else {
            descriptor.is_system_agent = self.catalog.is_system_agent(&descriptor.agent_id).await;
            descriptor.status = AgentStatus::Registering;
            descriptor.registered_at = chrono::Utc::now();
            // A caller-supplied `last_heartbeat` (e.g. an agent re-registering
            // after a restart with knowledge of its own last contact) is
            // preserved rather than reset; a fresh registration with none
            // supplied simply has no heartbeat yet, as before.
            descriptor.load = 0;

            {
                let mut live = self.live.write().unwrap();
                if is_internal {
                    if let Some(instance) = instance {
                        live.instances.insert(descriptor.agent_id.clone(), instance);
                    }
                }
                live.descriptors.insert(descriptor.agent_id.clone(), descriptor.clone());
            }
        }

        self.catalog.save(&descriptor).await?;
        tracing::info!(
            agent_id = %descriptor.agent_id,
            agent_type = %descriptor.agent_type,
            is_internal,
            "agent registered"
        );
        Ok(())
    }

    /// Soft-deletion: descriptor is kept, status forced to `DEPRECATED`,
    /// invocable reference dropped.
    pub async fn unregister(&self, agent_id: &str) -> Result<()> {
        self.ensure_hydrated().await;

        let descriptor = {
            let mut live = self.live.write().unwrap();
            live.instances.remove(agent_id);
            match live.descriptors.get_mut(agent_id) {
                Some(descriptor) => {
                    descriptor.status = AgentStatus::Deprecated;
                    descriptor.clone()
                }
                None => return Err(CoreError::NotFound(agent_id.to_string())),
            }
        };

        self.catalog.update(&descriptor).await?;
        tracing::info!(agent_id, "agent unregistered");
        Ok(())
    }

    /// Stamps `last_heartbeat = now`; a heartbeat from a `MAINTENANCE` agent
    /// auto-promotes it to `ONLINE`.
    pub async fn update_heartbeat(&self, agent_id: &str) -> Result<()> {
        self.ensure_hydrated().await;

        let descriptor = {
            let mut live = self.live.write().unwrap();
            let descriptor = live
                .descriptors
                .get_mut(agent_id)
                .ok_or_else(|| CoreError::NotFound(agent_id.to_string()))?;
            descriptor.last_heartbeat = Some(chrono::Utc::now());
            if descriptor.status == AgentStatus::Maintenance {
                descriptor.status = AgentStatus::Online;
            }
            descriptor.clone()
        };

        self.catalog.update(&descriptor).await?;
        Ok(())
    }

    pub async fn update_status(&self, agent_id: &str, status: AgentStatus) -> Result<()> {
        self.ensure_hydrated().await;

        let descriptor = {
            let mut live = self.live.write().unwrap();
            let descriptor = live
                .descriptors
                .get_mut(agent_id)
                .ok_or_else(|| CoreError::NotFound(agent_id.to_string()))?;
            descriptor.status = status;
            descriptor.clone()
        };

        self.catalog.update(&descriptor).await?;
        Ok(())
    }

    /// Looks up one descriptor, backfilling external endpoints from the
    /// display-config store when they're missing.
    pub async fn get_agent_info(&self, agent_id: &str) -> Option<AgentDescriptor> {
        self.ensure_hydrated().await;

        let needs_backfill = {
            let live = self.live.read().unwrap();
            match live.descriptors.get(agent_id) {
                Some(descriptor) => !descriptor.is_system_agent && !descriptor.has_endpoint(),
                None => return None,
            }
        };

        if needs_backfill {
            if let Some(store) = &self.display_config {
                if let Some((endpoints, permissions)) = store.lookup(agent_id) {
                    let mut live = self.live.write().unwrap();
                    if let Some(descriptor) = live.descriptors.get_mut(agent_id) {
                        descriptor.endpoints = endpoints;
                        descriptor.permissions = permissions;
                    }
                }
            }
        }

        let live = self.live.read().unwrap();
        live.descriptors.get(agent_id).cloned()
    }

    /// Returns the invocable handle for an agent: the cached reference for
    /// internal agents, or a freshly-built protocol client for external ones.
    pub async fn get_agent(&self, agent_id: &str) -> Result<Arc<dyn AgentClient>> {
        let descriptor = self
            .get_agent_info(agent_id)
            .await
            .ok_or_else(|| CoreError::NotFound(agent_id.to_string()))?;

        if descriptor.endpoints.is_internal {
            let live = self.live.read().unwrap();
            live.instances
                .get(agent_id)
                .cloned()
                .ok_or_else(|| CoreError::InstanceMissing(agent_id.to_string()))
        } else {
            self.client_factory.build(&descriptor)
        }
    }

    /// Lists registered descriptors. System agents are excluded by default.
    pub async fn list(&self, include_system_agents: bool) -> Vec<AgentDescriptor> {
        self.ensure_hydrated().await;
        let live = self.live.read().unwrap();
        live.descriptors
            .values()
            .filter(|descriptor| include_system_agents || !descriptor.is_system_agent)
            .cloned()
            .collect()
    }

    /// All descriptors, system agents included — the view Discovery and the
    /// health monitor operate over.
    pub async fn all(&self) -> Vec<AgentDescriptor> {
        self.ensure_hydrated().await;
        self.live.read().unwrap().descriptors.values().cloned().collect()
    }

    /// Hydrates the live index from the durable catalog the first time it's
    /// observed empty.
    async fn ensure_hydrated(&self) {
        if self.hydrated.swap(true, Ordering::SeqCst) {
            return;
        }

        let is_empty = self.live.read().unwrap().descriptors.is_empty();
        if !is_empty {
            return;
        }

        let catalog_entries = match self.catalog.load_all().await {
            Ok(entries) => entries,
            Err(error) => {
                tracing::warn!(%error, "failed to hydrate registry from durable catalog");
                return;
            }
        };

        if catalog_entries.is_empty() {
            return;
        }

        let now = chrono::Utc::now();
        let freshness_floor = now - chrono::Duration::from_std(self.heartbeat_timeout).unwrap_or_default();

        let mut live = self.live.write().unwrap();
        for mut descriptor in catalog_entries {
            if descriptor.registered_at < freshness_floor {
                descriptor.registered_at = now;
            }
            if descriptor.last_heartbeat.is_none() {
                descriptor.last_heartbeat = Some(now);
            }
            live.descriptors.insert(descriptor.agent_id.clone(), descriptor);
        }
    }
}

impl AgentLookup for Registry {
    fn find(&self, agent_id: &str) -> Option<AgentDescriptor> {
        self.live.read().unwrap().descriptors.get(agent_id).cloned()
    }
}
