//! ResourceGuard: per-resource-kind allow-list enforcement.

use crate::auth::AgentLookup;
use crate::models::ResourceKind;
use std::sync::Arc;

/// Grant/deny decision for one `(agent_id, resource_kind, resource_name)`
/// check. Reuses [`AgentLookup`] so it shares the registry seam with `auth`
/// rather than introducing a second way to ask "what do we know about this
/// agent".
pub struct ResourceGuard {
    lookup: Arc<dyn AgentLookup>,
}

impl ResourceGuard {
    pub fn new(lookup: Arc<dyn AgentLookup>) -> Self {
        Self { lookup }
    }

    /// Internal agents: unconditional grant. External agents: exact
    /// membership for `MEMORY|TOOL|LLM|DATABASE`, prefix match for `FILE`.
    /// An empty allow-list for an external agent always denies. Unknown
    /// agent denies with a logged warning.
    pub fn is_allowed(&self, agent_id: &str, kind: ResourceKind, resource_name: &str) -> bool {
        let Some(descriptor) = self.lookup.find(agent_id) else {
            tracing::warn!(agent_id, "resource check against unknown agent, denying");
            return false;
        };

        if descriptor.endpoints.is_internal {
            return true;
        }

        let permissions = &descriptor.permissions;

        if permissions.tier < kind.minimum_tier() {
            tracing::warn!(
                agent_id,
                ?kind,
                tier = ?permissions.tier,
                "resource check below agent's permission tier, denying"
            );
            return false;
        }

        match kind {
            ResourceKind::Memory => permissions
                .allowed_memory_namespaces
                .iter()
                .any(|allowed| allowed == resource_name),
            ResourceKind::Tool => permissions
                .allowed_tools
                .iter()
                .any(|allowed| allowed == resource_name),
            ResourceKind::Llm => permissions
                .allowed_llm_providers
                .iter()
                .any(|allowed| allowed == resource_name),
            ResourceKind::Database => permissions
                .allowed_databases
                .iter()
                .any(|allowed| allowed == resource_name),
            ResourceKind::File => permissions
                .allowed_file_paths
                .iter()
                .any(|prefix| resource_name.starts_with(prefix.as_str())),
        }
    }
}
