//! Trait seams for the components this core declares out of scope. It never
//! imports a concrete task analyzer, security agent, config catalog, or LLM
//! client at module-init time; it depends on these traits by `Arc<dyn Trait>`,
//! wired up once at process bootstrap.

use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

/// One entry into the orchestrator's state machine.
#[derive(Debug, Clone)]
pub struct Context {
    pub trace_id: Uuid,
    pub fields: HashMap<String, Value>,
}

impl Context {
    pub fn new(trace_id: Uuid) -> Self {
        Self {
            trace_id,
            fields: HashMap::new(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.fields.insert(key.into(), value);
        self
    }
}

/// Structured representation of a user instruction, produced by the
/// external task analyzer.
#[derive(Debug, Clone)]
pub struct Intent {
    pub task_type: String,
    pub scope: Option<String>,
    pub config_data: HashMap<String, Value>,
    pub raw: Value,
}

/// Outcome of [`TaskAnalyzer::analyze`].
#[derive(Debug, Clone)]
pub enum Analysis {
    /// Intent classified; ready for pre-check/authorization.
    Classified(Intent),
    /// Analyzer wants more information before it can classify.
    ClarificationNeeded { question: String },
    /// Intent is a log query; bypasses agent dispatch entirely.
    LogQuery { query: Value },
}

/// The (external) natural-language classifier.
#[async_trait]
pub trait TaskAnalyzer: Send + Sync {
    async fn analyze(
        &self,
        instruction: &str,
        user_id: Option<&str>,
        context: &Context,
    ) -> Result<Analysis>;
}

/// Decision returned by the security agent.
#[derive(Debug, Clone)]
pub struct SecurityDecision {
    pub allowed: bool,
    pub reason: Option<String>,
    pub requires_double_check: bool,
    pub risk_level: RiskLevel,
    pub audit_context: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// The external authorization/risk collaborator.
#[async_trait]
pub trait SecurityAgent: Send + Sync {
    async fn verify_access(
        &self,
        user_id: Option<&str>,
        intent: &Intent,
        context: &Context,
    ) -> Result<SecurityDecision>;
}

/// Declared shape of one config field, as hydrated from the in-memory
/// config catalog.
#[derive(Debug, Clone)]
pub struct ConfigFieldSchema {
    pub field_type: ConfigFieldType,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub options: Option<Vec<Value>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFieldType {
    Integer,
    Number,
    String,
    Boolean,
    Array,
    Object,
}

/// A config scope: field name → schema.
pub type ConfigScope = HashMap<String, ConfigFieldSchema>;

/// In-memory config catalog, hydrated once at startup and never re-read per
/// request.
pub trait ConfigCatalog: Send + Sync {
    fn scope(&self, name: &str) -> Option<ConfigScope>;
}

/// Response shape from the LLM client. Only `content`/`text` are consumed; any
/// other keys are ignored.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct LlmResponse {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

impl LlmResponse {
    pub fn text(&self) -> Option<&str> {
        self.content.as_deref().or(self.text.as_deref())
    }
}

/// The LLM invocation contract.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn generate(&self, prompt: &str, max_tokens: Option<u32>) -> Result<LlmResponse>;
}

/// Request shape sent to an agent.
#[derive(Debug, Clone, serde::Serialize)]
pub struct AgentRequest {
    pub task_id: String,
    pub task_type: String,
    pub task_data: Value,
    pub context: Value,
    pub metadata: Value,
}

/// Response status an agent call can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentResponseStatus {
    Completed,
    Failed,
    Error,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct AgentResponse {
    pub task_id: String,
    pub status: AgentResponseStatus,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub metadata: Option<Value>,
}

/// Uniform `execute` capability every agent — internal or external —
/// exposes.
#[async_trait]
pub trait AgentClient: Send + Sync {
    async fn execute(&self, request: AgentRequest) -> Result<AgentResponse>;
}

/// The three append-only log streams keyed by trace-id: lifecycle events,
/// user/tenant-visible state mutations, and authorization decisions.
pub trait LogSink: Send + Sync {
    fn task(&self, trace_id: Uuid, action: &str, fields: Value);
    fn audit(&self, trace_id: Uuid, action: &str, fields: Value);
    fn security(&self, trace_id: Uuid, action: &str, fields: Value);
}
