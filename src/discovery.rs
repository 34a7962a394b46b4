//! Discovery: capability / permission / health filtering over registered
//! agents.

use crate::models::{AgentDescriptor, AgentStatus};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

/// Narrow read seam Discovery needs from the registry: every descriptor,
/// system agents included. Kept separate from [`crate::auth::AgentLookup`]
/// because discovery operates on the whole population, not one agent at a
/// time.
#[async_trait]
pub trait AgentSource: Send + Sync {
    async fn all(&self) -> Vec<AgentDescriptor>;
}

#[async_trait]
impl AgentSource for crate::registry::Registry {
    async fn all(&self) -> Vec<AgentDescriptor> {
        crate::registry::Registry::all(self).await
    }
}

/// Query parameters for [`Discovery::discover`].
#[derive(Debug, Clone, Default)]
pub struct DiscoveryQuery {
    pub required_capabilities: Vec<String>,
    pub agent_type: Option<String>,
    pub category: Option<String>,
    pub status: Option<AgentStatus>,
    pub user_id: Option<String>,
    pub user_roles: Vec<String>,
}

pub struct Discovery {
    source: Arc<dyn AgentSource>,
    health_freshness_window: Duration,
}

impl Discovery {
    pub fn new(source: Arc<dyn AgentSource>, health_freshness_window: Duration) -> Self {
        Self {
            source,
            health_freshness_window,
        }
    }

    /// Runs the five-stage filter pipeline in order: type/category/status,
    /// capability subset, permission, health freshness, then a `registered_at`
    /// descending sort as the stable tie-break.
    pub async fn discover(&self, query: &DiscoveryQuery) -> Vec<AgentDescriptor> {
        let status = query.status.unwrap_or(AgentStatus::Online);

        let mut agents: Vec<AgentDescriptor> = self
            .source
            .all()
            .await
            .into_iter()
            .filter(|agent| agent.status == status)
            .filter(|agent| {
                query
                    .agent_type
                    .as_deref()
                    .map(|t| agent.agent_type == t)
                    .unwrap_or(true)
            })
            .filter(|agent| {
                query
                    .category
                    .as_deref()
                    .map(|category| {
                        agent.metadata.category.as_deref() == Some(category)
                            || agent.metadata.tags.iter().any(|tag| tag == category)
                    })
                    .unwrap_or(true)
            })
            .collect();

        if !query.required_capabilities.is_empty() {
            let required: HashSet<&str> =
                query.required_capabilities.iter().map(String::as_str).collect();
            agents.retain(|agent| {
                let capabilities: HashSet<&str> =
                    agent.capabilities.iter().map(String::as_str).collect();
                required.is_subset(&capabilities)
            });
        }

        if query.user_id.is_some() || !query.user_roles.is_empty() {
            agents.retain(|agent| self.accessible(agent, query.user_id.as_deref()));
        }

        agents.retain(|agent| self.is_fresh(agent));

        agents.sort_by(|a, b| b.registered_at.cmp(&a.registered_at));
        agents
    }

    /// Public agents (no declared `api_key`/`secret_id`) are always visible.
    /// Gated agents require an authenticated caller. Role-based refinement
    /// is reserved for future extension.
    fn accessible(&self, agent: &AgentDescriptor, user_id: Option<&str>) -> bool {
        if agent.permissions.is_public() {
            return true;
        }
        user_id.is_some()
    }

    /// A descriptor is fresh if its heartbeat is within the window, or if it
    /// has no heartbeat yet but was registered within the window (benefit
    /// of the doubt for a just-started agent).
    fn is_fresh(&self, agent: &AgentDescriptor) -> bool {
        let now = chrono::Utc::now();
        let floor = now
            - chrono::Duration::from_std(self.health_freshness_window).unwrap_or_default();

        match agent.last_heartbeat {
            Some(heartbeat) => heartbeat > floor,
            None => agent.registered_at > floor,
        }
    }
}
