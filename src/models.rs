//! Core data model: agent descriptors and task records.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Transport protocol an external agent is reachable over.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Http,
    Mcp,
}

/// Endpoint configuration for one agent.
///
/// Exactly one of `http`/`mcp` is populated when `is_internal` is false;
/// when `is_internal` is true the endpoints are unused (the registry owns
/// an in-process invocable reference instead, see [`AgentDescriptor`]).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AgentEndpoints {
    pub http: Option<url::Url>,
    pub mcp: Option<url::Url>,
    pub protocol: Option<Protocol>,
    pub is_internal: bool,
}

/// Coarse permission tier, a cheap pre-filter ahead of the fine-grained
/// resource allow-lists that `ResourceGuard` enforces.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Default)]
#[serde(rename_all = "lowercase")]
pub enum PermissionTier {
    Read,
    #[default]
    Execute,
    Write,
    Admin,
}

/// Per-agent authentication material and resource allow-lists.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AgentPermissions {
    pub tier: PermissionTier,
    pub api_key: Option<String>,
    pub secret_id: Option<String>,
    pub server_certificate: Option<String>,
    /// Registration-time requirement: reject this descriptor unless
    /// `server_certificate` is present.
    pub require_mtls: bool,
    /// Registration-time requirement: reject this descriptor unless
    /// `api_key` is present.
    pub require_signature: bool,
    pub ip_whitelist: Vec<String>,
    pub server_fingerprint: Option<String>,
    pub allowed_memory_namespaces: Vec<String>,
    pub allowed_tools: Vec<String>,
    pub allowed_llm_providers: Vec<String>,
    pub allowed_databases: Vec<String>,
    pub allowed_file_paths: Vec<String>,
    /// Reserved for future role-based discovery filtering. Not presently honored
    /// by [`crate::discovery`].
    pub allowed_roles: Vec<String>,
}

impl AgentPermissions {
    /// True if neither `api_key` nor `secret_id` is set; discovery treats
    /// such an agent as public.
    pub fn is_public(&self) -> bool {
        self.api_key.is_none() && self.secret_id.is_none()
    }
}

/// Agent metadata.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AgentMetadata {
    pub version: String,
    pub description: Option<String>,
    pub author: Option<String>,
    pub tags: Vec<String>,
    pub category: Option<String>,
}

/// Lifecycle state of a registered agent.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum AgentStatus {
    Registering,
    Online,
    Offline,
    Maintenance,
    Deprecated,
}

impl AgentStatus {
    /// Descriptors eligible for health-monitor probing.
    pub fn is_active(self) -> bool {
        matches!(self, AgentStatus::Online | AgentStatus::Registering)
    }
}

/// The registry entry for one agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentDescriptor {
    pub agent_id: String,
    pub agent_type: String,
    pub name: String,
    pub description: Option<String>,
    pub endpoints: AgentEndpoints,
    pub capabilities: Vec<String>,
    pub metadata: AgentMetadata,
    pub permissions: AgentPermissions,
    pub status: AgentStatus,
    pub is_system_agent: bool,
    pub load: u64,
    pub registered_at: chrono::DateTime<chrono::Utc>,
    pub last_heartbeat: Option<chrono::DateTime<chrono::Utc>>,
    /// Optional health endpoint probed by the health monitor.
    pub health_endpoint: Option<url::Url>,
    /// Recorded identity an internal agent registered with, checked against
    /// a caller-presented `service_identity` by [`crate::auth::InternalVerifier`]
    /// . Unused for external agents.
    pub service_identity: Option<String>,
}

impl AgentDescriptor {
    /// True when the descriptor satisfies the "external must have at least
    /// one endpoint" invariant.
    pub fn has_endpoint(&self) -> bool {
        self.endpoints.http.is_some() || self.endpoints.mcp.is_some()
    }
}

/// Status of one submitted task.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskState {
    Pending,
    Assigned,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl TaskState {
    /// A terminal state admits no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskState::Completed | TaskState::Failed | TaskState::Cancelled
        )
    }
}

impl FromStr for TaskState {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "PENDING" => Ok(TaskState::Pending),
            "ASSIGNED" => Ok(TaskState::Assigned),
            "RUNNING" => Ok(TaskState::Running),
            "COMPLETED" => Ok(TaskState::Completed),
            "FAILED" => Ok(TaskState::Failed),
            "CANCELLED" => Ok(TaskState::Cancelled),
            other => Err(format!("unknown task state: {other}")),
        }
    }
}

/// One submitted unit of work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    pub task_id: String,
    pub instruction: String,
    pub intent: Option<serde_json::Value>,
    pub target_agent_id: Option<String>,
    pub user_id: Option<String>,
    pub status: TaskState,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    pub result: Option<serde_json::Value>,
    pub error: Option<String>,
}

impl TaskRecord {
    pub fn new(instruction: String, user_id: Option<String>) -> Self {
        let now = chrono::Utc::now();
        Self {
            task_id: Uuid::new_v4().to_string(),
            instruction,
            intent: None,
            target_agent_id: None,
            user_id,
            status: TaskState::Pending,
            created_at: now,
            updated_at: now,
            result: None,
            error: None,
        }
    }
}

/// Priority ordering for [`crate::task_tracker::queue::TaskQueue`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

/// Outcome of an authentication attempt.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AuthStatus {
    Success,
    Failed,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticationOutcome {
    pub status: AuthStatus,
    pub agent_id: String,
    pub reason: Option<String>,
}

impl AuthenticationOutcome {
    pub fn success(agent_id: impl Into<String>) -> Self {
        Self {
            status: AuthStatus::Success,
            agent_id: agent_id.into(),
            reason: None,
        }
    }

    pub fn failed(agent_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            status: AuthStatus::Failed,
            agent_id: agent_id.into(),
            reason: Some(reason.into()),
        }
    }
}

/// Resource kinds [`crate::resource_guard::ResourceGuard`] gates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ResourceKind {
    Memory,
    Tool,
    Llm,
    Database,
    File,
}

impl ResourceKind {
    /// Coarse tier floor `ResourceGuard` checks before it even looks at the
    /// fine-grained allow-lists. Memory reads are the least privileged
    /// operation; database and filesystem access can mutate state and so
    /// require at least `Write`.
    pub fn minimum_tier(self) -> PermissionTier {
        match self {
            ResourceKind::Memory => PermissionTier::Read,
            ResourceKind::Tool | ResourceKind::Llm => PermissionTier::Execute,
            ResourceKind::Database | ResourceKind::File => PermissionTier::Write,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_state_terminal_classification() {
        assert!(TaskState::Completed.is_terminal());
        assert!(TaskState::Failed.is_terminal());
        assert!(TaskState::Cancelled.is_terminal());
        assert!(!TaskState::Pending.is_terminal());
        assert!(!TaskState::Running.is_terminal());
    }

    #[test]
    fn task_state_from_str_roundtrips() {
        assert_eq!(TaskState::from_str("running").unwrap(), TaskState::Running);
        assert_eq!(TaskState::from_str("FAILED").unwrap(), TaskState::Failed);
        assert!(TaskState::from_str("bogus").is_err());
    }

    #[test]
    fn public_agent_detection() {
        let perms = AgentPermissions::default();
        assert!(perms.is_public());

        let gated = AgentPermissions {
            api_key: Some("k".into()),
            ..Default::default()
        };
        assert!(!gated.is_public());
    }

    #[test]
    fn priority_orders_ascending() {
        assert!(Priority::Low < Priority::Medium);
        assert!(Priority::Medium < Priority::High);
        assert!(Priority::High < Priority::Critical);
    }
}
