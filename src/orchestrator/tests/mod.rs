//! Shared fixtures for the orchestrator's own test suite, split into
//! narrow-focus checks in `unit.rs` and full S0–S10 runs in
//! `integration.rs`.


pub(crate) mod support {
    use crate::auth::AgentLookup;
    use crate::collaborators::*;
    use crate::config::OrchestratorConfig;
    use crate::discovery::Discovery;
    use crate::error::{CoreError, Result};
    use crate::models::*;
    use crate::orchestrator::Orchestrator;
    use crate::registry::{AgentClientFactory, InMemoryCatalog, Registry};
    use crate::resource_guard::ResourceGuard;
    use crate::task_tracker::{InMemoryTaskStore, TaskTracker};
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;
    use uuid::Uuid;

    pub struct FixedAnalyzer(pub Analysis);
    #[async_trait]
    impl TaskAnalyzer for FixedAnalyzer {
        async fn analyze(&self, _instruction: &str, _user_id: Option<&str>, _context: &Context) -> Result<Analysis> {
            Ok(self.0.clone())
        }
    }

    pub struct FailingAnalyzer;
    #[async_trait]
    impl TaskAnalyzer for FailingAnalyzer {
        async fn analyze(&self, _instruction: &str, _user_id: Option<&str>, _context: &Context) -> Result<Analysis> {
            Err(CoreError::Internal(anyhow::anyhow!("analyzer unavailable")))
        }
    }

    pub struct FixedSecurityAgent(pub SecurityDecision);
    #[async_trait]
    impl SecurityAgent for FixedSecurityAgent {
        async fn verify_access(&self, _user_id: Option<&str>, _intent: &Intent, _context: &Context) -> Result<SecurityDecision> {
            Ok(self.0.clone())
        }
    }

    #[derive(Default)]
    pub struct MapConfigCatalog(pub HashMap<String, ConfigScope>);
    impl ConfigCatalog for MapConfigCatalog {
        fn scope(&self, name: &str) -> Option<ConfigScope> {
            self.0.get(name).cloned()
        }
    }

    pub struct EchoLlm(pub String);
    #[async_trait]
    impl LlmClient for EchoLlm {
        async fn generate(&self, _prompt: &str, _max_tokens: Option<u32>) -> Result<LlmResponse> {
            Ok(LlmResponse { content: Some(self.0.clone()), text: None })
        }
    }

    pub struct SilentLogSink;
    impl LogSink for SilentLogSink {
        fn task(&self, _trace_id: Uuid, _action: &str, _fields: Value) {}
        fn audit(&self, _trace_id: Uuid, _action: &str, _fields: Value) {}
        fn security(&self, _trace_id: Uuid, _action: &str, _fields: Value) {}
    }

    pub struct ScriptedAgent {
        pub status: AgentResponseStatus,
        pub result: Option<Value>,
        pub error: Option<String>,
        pub delay: Option<Duration>,
    }
    #[async_trait]
    impl AgentClient for ScriptedAgent {
        async fn execute(&self, request: AgentRequest) -> Result<AgentResponse> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            Ok(AgentResponse {
                task_id: request.task_id,
                status: self.status,
                result: self.result.clone(),
                error: self.error.clone(),
                metadata: None,
            })
        }
    }

    pub struct StubClientFactory;
    impl AgentClientFactory for StubClientFactory {
        fn build(&self, _descriptor: &AgentDescriptor) -> Result<Arc<dyn AgentClient>> {
            Ok(Arc::new(ScriptedAgent {
                status: AgentResponseStatus::Completed,
                result: Some(json!({"ok": true})),
                error: None,
                delay: None,
            }))
        }
    }

    pub fn internal_descriptor(agent_id: &str, agent_type: &str, load: u64) -> AgentDescriptor {
        AgentDescriptor {
            agent_id: agent_id.to_string(),
            agent_type: agent_type.to_string(),
            name: agent_type.to_string(),
            description: None,
            endpoints: AgentEndpoints { is_internal: true, ..Default::default() },
            capabilities: vec![],
            metadata: AgentMetadata::default(),
            permissions: AgentPermissions::default(),
            status: AgentStatus::Registering,
            is_system_agent: false,
            load,
            registered_at: chrono::Utc::now(),
            last_heartbeat: Some(chrono::Utc::now()),
            health_endpoint: None,
            service_identity: None,
        }
    }

    pub fn external_descriptor(agent_id: &str, agent_type: &str, permissions: AgentPermissions) -> AgentDescriptor {
        AgentDescriptor {
            agent_id: agent_id.to_string(),
            agent_type: agent_type.to_string(),
            name: agent_type.to_string(),
            description: None,
            endpoints: AgentEndpoints {
                http: Some("https://agent.example/".parse().unwrap()),
                is_internal: false,
                ..Default::default()
            },
            capabilities: vec![],
            metadata: AgentMetadata::default(),
            permissions,
            status: AgentStatus::Registering,
            is_system_agent: false,
            load: 0,
            registered_at: chrono::Utc::now(),
            last_heartbeat: Some(chrono::Utc::now()),
            health_endpoint: None,
            service_identity: None,
        }
    }

    pub struct Stack {
        pub registry: Arc<Registry>,
        pub discovery: Arc<Discovery>,
        pub task_tracker: Arc<TaskTracker>,
        pub resource_guard: Arc<ResourceGuard>,
    }

    pub fn build_stack() -> Stack {
        let catalog = Arc::new(InMemoryCatalog::new());
        let registry = Arc::new(Registry::new(
            catalog,
            Arc::new(StubClientFactory),
            None,
            Duration::from_secs(300),
        ));
        let discovery = Arc::new(Discovery::new(registry.clone(), Duration::from_secs(300)));
        let task_tracker = Arc::new(TaskTracker::new(
            Arc::new(InMemoryTaskStore::new()),
            Duration::from_secs(3600),
            Duration::from_secs(60),
        ));
        let lookup: Arc<dyn AgentLookup> = registry.clone();
        let resource_guard = Arc::new(ResourceGuard::new(lookup));
        Stack { registry, discovery, task_tracker, resource_guard }
    }

    /// Registers an internal agent and marks it `ONLINE` so discovery can see it.
    pub async fn register_online(stack: &Stack, descriptor: AgentDescriptor, client: Arc<dyn AgentClient>) {
        let agent_id = descriptor.agent_id.clone();
        stack.registry.register(descriptor, Some(client)).await.unwrap();
        stack.registry.update_status(&agent_id, AgentStatus::Online).await.unwrap();
    }

    #[allow(clippy::too_many_arguments)]
    pub fn build_orchestrator(
        stack: &Stack,
        analyzer: Arc<dyn TaskAnalyzer>,
        security_agent: Option<Arc<dyn SecurityAgent>>,
        config_catalog: Arc<dyn ConfigCatalog>,
        llm: Arc<dyn LlmClient>,
        config: OrchestratorConfig,
        routing: HashMap<String, String>,
    ) -> Orchestrator {
        Orchestrator::new(
            stack.registry.clone(),
            stack.discovery.clone(),
            stack.task_tracker.clone(),
            stack.resource_guard.clone(),
            analyzer,
            security_agent,
            config_catalog,
            llm,
            Arc::new(SilentLogSink),
            config,
            routing,
        )
    }

    pub fn allow_decision() -> SecurityDecision {
        SecurityDecision {
            allowed: true,
            reason: None,
            requires_double_check: false,
            risk_level: RiskLevel::Low,
            audit_context: json!({}),
        }
    }

    pub fn deny_decision(reason: &str) -> SecurityDecision {
        SecurityDecision {
            allowed: false,
            reason: Some(reason.to_string()),
            requires_double_check: false,
            risk_level: RiskLevel::High,
            audit_context: json!({}),
        }
    }

    pub fn confirm_decision() -> SecurityDecision {
        SecurityDecision {
            allowed: true,
            reason: None,
            requires_double_check: true,
            risk_level: RiskLevel::Medium,
            audit_context: json!({"reason": "high value transfer"}),
        }
    }

    pub fn classified(task_type: &str) -> Analysis {
        Analysis::Classified(Intent {
            task_type: task_type.to_string(),
            scope: None,
            config_data: HashMap::new(),
            raw: json!({}),
        })
    }

    pub fn classified_with_resource(task_type: &str, resource_kind: &str, resource_name: &str) -> Analysis {
        Analysis::Classified(Intent {
            task_type: task_type.to_string(),
            scope: None,
            config_data: HashMap::new(),
            raw: json!({"resource_kind": resource_kind, "resource_name": resource_name}),
        })
    }

    pub fn config_intent(scope: &str, config_data: HashMap<String, Value>) -> Analysis {
        Analysis::Classified(Intent {
            task_type: "configure".to_string(),
            scope: Some(scope.to_string()),
            config_data: config_data.clone(),
            raw: json!(config_data),
        })
    }

    pub fn default_config() -> OrchestratorConfig {
        OrchestratorConfig {
            call_timeout: Duration::from_secs(5),
            dev_mode: false,
        }
    }
}
