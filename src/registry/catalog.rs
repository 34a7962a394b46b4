//! Durable catalog seam. The core ships only an in-memory catalog; a hosting
//! process that needs real persistence swaps in its own [`DurableCatalog`]
//! implementation, e.g. backed by a document store.

use crate::error::Result;
use crate::models::AgentDescriptor;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;

#[async_trait]
pub trait DurableCatalog: Send + Sync {
    async fn save(&self, descriptor: &AgentDescriptor) -> Result<()>;
    async fn update(&self, descriptor: &AgentDescriptor) -> Result<()>;
    async fn load_all(&self) -> Result<Vec<AgentDescriptor>>;
    async fn is_system_agent(&self, agent_id: &str) -> bool;
}

/// Best-effort, process-local catalog. Entries do not survive a restart;
/// acceptable for the registry's own semantics but not a substitute for a real
/// durability layer in production deployments.
#[derive(Default)]
pub struct InMemoryCatalog {
    entries: RwLock<HashMap<String, AgentDescriptor>>,
    system_agent_ids: RwLock<HashSet<String>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a set of agent-ids the catalog reports as system agents.
    pub async fn mark_system_agent(&self, agent_id: impl Into<String>) {
        self.system_agent_ids.write().await.insert(agent_id.into());
    }
}

#[async_trait]
impl DurableCatalog for InMemoryCatalog {
    async fn save(&self, descriptor: &AgentDescriptor) -> Result<()> {
        self.entries
            .write()
            .await
            .insert(descriptor.agent_id.clone(), descriptor.clone());
        Ok(())
    }

    async fn update(&self, descriptor: &AgentDescriptor) -> Result<()> {
        self.entries
            .write()
            .await
            .insert(descriptor.agent_id.clone(), descriptor.clone());
        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<AgentDescriptor>> {
        Ok(self.entries.read().await.values().cloned().collect())
    }

    async fn is_system_agent(&self, agent_id: &str) -> bool {
        self.system_agent_ids.read().await.contains(agent_id)
    }
}
