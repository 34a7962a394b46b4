//! Orchestrator: the top-level instruction→result state machine. Owns no
//! storage of its own — it mediates Registry, Discovery, TaskTracker,
//! ResourceGuard, and the four external collaborators (task analyzer, security
//! agent, config catalog, LLM client) behind the trait seams in
//! [`crate::collaborators`]. The dispatch loop and per-agent load tracking
//! generalize a fixed single-process agent roster into registry-mediated
//! discovery plus a classify/pre-check/authorize/dispatch/shape pipeline.

mod precheck;
mod shaping;

use crate::auth::{AgentLookup, AmbientCredentials, ExternalVerifier, Verifier};
use crate::collaborators::{
    Analysis, AgentRequest, AgentResponseStatus, ConfigCatalog, Context, Intent, LlmClient,
    LogSink, RiskLevel, SecurityAgent, SecurityDecision, TaskAnalyzer,
};
use crate::config::OrchestratorConfig;
use crate::discovery::{Discovery, DiscoveryQuery};
use crate::error::{CoreError, Result};
use crate::models::{AgentDescriptor, AgentStatus, AuthStatus, ResourceKind, TaskState};
use crate::registry::Registry;
use crate::resource_guard::ResourceGuard;
use crate::task_tracker::TaskTracker;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// Response shape of [`Orchestrator::process`]. `status` is one of `completed
/// | failed | clarification_needed | validation_failed | permission_denied |
/// confirmation_required | task_created | not_implemented`.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ProcessResponse {
    pub status: String,
    pub result: Option<Value>,
    pub error: Option<String>,
    pub trace_id: Uuid,
}

/// Decrements a per-agent load counter exactly once, regardless of which
/// branch of [`Orchestrator::dispatch`] returns.
struct LoadGuard {
    counter: Arc<AtomicI64>,
}

impl Drop for LoadGuard {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct Orchestrator {
    registry: Arc<Registry>,
    discovery: Arc<Discovery>,
    task_tracker: Arc<TaskTracker>,
    resource_guard: Arc<ResourceGuard>,
    external_verifier: ExternalVerifier,
    task_analyzer: Arc<dyn TaskAnalyzer>,
    security_agent: Option<Arc<dyn SecurityAgent>>,
    config_catalog: Arc<dyn ConfigCatalog>,
    llm_client: Arc<dyn LlmClient>,
    log_sink: Arc<dyn LogSink>,
    config: OrchestratorConfig,
    /// Static `task_type -> agent_type` routing table. A `task_type` absent from
    /// this table routes to an `agent_type` of the same name.
    task_type_routing: HashMap<String, String>,
    /// Per-agent load counters the orchestrator tracks itself, independent of
    /// the registry descriptor's (possibly stale) `load` field.
    loads: RwLock<HashMap<String, Arc<AtomicI64>>>,
}

impl Orchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        registry: Arc<Registry>,
        discovery: Arc<Discovery>,
        task_tracker: Arc<TaskTracker>,
        resource_guard: Arc<ResourceGuard>,
        task_analyzer: Arc<dyn TaskAnalyzer>,
        security_agent: Option<Arc<dyn SecurityAgent>>,
        config_catalog: Arc<dyn ConfigCatalog>,
        llm_client: Arc<dyn LlmClient>,
        log_sink: Arc<dyn LogSink>,
        config: OrchestratorConfig,
        task_type_routing: HashMap<String, String>,
    ) -> Self {
        let lookup: Arc<dyn AgentLookup> = registry.clone();
        Self {
            registry,
            discovery,
            task_tracker,
            resource_guard,
            external_verifier: ExternalVerifier::new(lookup),
            task_analyzer,
            security_agent,
            config_catalog,
            llm_client,
            log_sink,
            config,
            task_type_routing,
            loads: RwLock::new(HashMap::new()),
        }
    }

    /// Entry point: S0 Received through S10 Respond.
    pub async fn process(
        &self,
        instruction: String,
        user_id: Option<String>,
        context: Option<HashMap<String, Value>>,
        specified_agent_id: Option<String>,
    ) -> ProcessResponse {
        let trace_id = Uuid::new_v4();
        let mut ctx = Context::new(trace_id);
        for (key, value) in context.unwrap_or_default() {
            ctx = ctx.with_field(key, value);
        }

        self.log_sink.task(
            trace_id,
            "task_start",
            json!({"instruction": instruction, "user_id": user_id}),
        );

        match self.task_analyzer.analyze(&instruction, user_id.as_deref(), &ctx).await {
            Ok(Analysis::ClarificationNeeded { question }) => {
                self.log_sink
                    .task(trace_id, "task_routing", json!({"outcome": "clarification_needed"}));
                ProcessResponse {
                    status: "clarification_needed".to_string(),
                    result: Some(json!({"clarification_question": question})),
                    error: None,
                    trace_id,
                }
            }
            Ok(Analysis::LogQuery { query }) => {
                // Log storage/query lives outside this core; the logger
                // streams are consumed, not queried, here.
                self.log_sink.task(trace_id, "task_routing", json!({"outcome": "log_query"}));
                ProcessResponse {
                    status: "not_implemented".to_string(),
                    result: Some(json!({"query": query})),
                    error: Some("log query execution is not implemented by this core".to_string()),
                    trace_id,
                }
            }
            Ok(Analysis::Classified(intent)) => {
                self.handle_classified(trace_id, instruction, user_id, ctx, specified_agent_id, intent)
                    .await
            }
            Err(error) => self.fail_response(trace_id, &instruction, error),
        }
    }

    async fn handle_classified(
        &self,
        trace_id: Uuid,
        instruction: String,
        user_id: Option<String>,
        ctx: Context,
        specified_agent_id: Option<String>,
        intent: Intent,
    ) -> ProcessResponse {
        // S4 PreCheck — only for config-style intents.
        if let Some(scope_name) = intent.scope.as_deref() {
            if let Some(scope) = self.config_catalog.scope(scope_name) {
                if let Err(error) = precheck::run(scope_name, &scope, &intent.config_data) {
                    self.log_sink.task(
                        trace_id,
                        "pre_check_failed",
                        json!({"scope": scope_name, "error": error.to_string()}),
                    );
                    return self.fail_response(trace_id, &instruction, error);
                }
            }
        }

        // S5 Authorize
        let decision = match self
            .authorize(&user_id, &intent, &ctx, specified_agent_id.as_deref())
            .await
        {
            Ok(decision) => decision,
            Err(error) => {
                self.log_sink.security(
                    trace_id,
                    "permission_check",
                    json!({"allowed": false, "error": error.to_string()}),
                );
                return self.fail_response(trace_id, &instruction, error);
            }
        };

        self.log_sink.security(
            trace_id,
            "permission_check",
            json!({
                "allowed": decision.allowed,
                "risk_level": decision.risk_level,
                "requires_double_check": decision.requires_double_check,
            }),
        );

        if !decision.allowed {
            return ProcessResponse {
                status: "permission_denied".to_string(),
                result: None,
                error: Some(decision.reason.unwrap_or_else(|| "access denied".to_string())),
                trace_id,
            };
        }

        if decision.requires_double_check {
            return ProcessResponse {
                status: "confirmation_required".to_string(),
                result: Some(json!({"audit_context": decision.audit_context})),
                error: None,
                trace_id,
            };
        }

        // Config-style intents are acknowledged directly; they never reach
        // agent dispatch, since nothing downstream names an agent type for
        // them.
        if intent.scope.is_some() {
            return self.acknowledge_config_intent(trace_id, instruction, user_id, intent).await;
        }

        self.dispatch(trace_id, instruction, user_id, ctx, specified_agent_id, intent).await
    }

    /// S5 Authorize body: the AuthN gate for an explicitly named external
    /// agent, the ResourceGuard check for an intent that names a resource,
    /// then the security agent's risk verdict.
    async fn authorize(
        &self,
        user_id: &Option<String>,
        intent: &Intent,
        ctx: &Context,
        specified_agent_id: Option<&str>,
    ) -> Result<SecurityDecision> {
        if let Some(agent_id) = specified_agent_id {
            if let Some(descriptor) = self.registry.get_agent_info(agent_id).await {
                if !descriptor.endpoints.is_internal {
                    let credentials = extract_credentials(ctx);
                    let outcome = self.external_verifier.verify(agent_id, &credentials);
                    if outcome.status != AuthStatus::Success {
                        return Err(CoreError::AuthFailed {
                            agent_id: agent_id.to_string(),
                            reason: outcome.reason.unwrap_or_else(|| "authentication failed".to_string()),
                        });
                    }
                }
            }

            if let (Some(kind), Some(name)) =
                (resource_kind_of(&intent.raw), resource_name_of(&intent.raw))
            {
                if !self.resource_guard.is_allowed(agent_id, kind, &name) {
                    return Err(CoreError::PermissionDenied(format!(
                        "agent '{agent_id}' is not permitted to access {kind:?} '{name}'"
                    )));
                }
            }
        }

        match &self.security_agent {
            Some(agent) => agent.verify_access(user_id.as_deref(), intent, ctx).await,
            None if self.config.dev_mode => Ok(SecurityDecision {
                allowed: true,
                reason: None,
                requires_double_check: false,
                risk_level: RiskLevel::Low,
                audit_context: json!({}),
            }),
            None => Err(CoreError::PermissionDenied(
                "no security agent configured; refusing to authorize outside dev mode".to_string(),
            )),
        }
    }

    /// Config-style intents are recorded as a task and immediately
    /// completed — there is no agent to dispatch a `scope`/`config_data`
    /// pair to. `status="task_created"` distinguishes this acknowledgement
    /// from a fully agent-executed `"completed"` result.
    async fn acknowledge_config_intent(
        &self,
        trace_id: Uuid,
        instruction: String,
        user_id: Option<String>,
        intent: Intent,
    ) -> ProcessResponse {
        let task_id = match self
            .task_tracker
            .create_task(instruction.clone(), None, user_id, Some(intent.raw.clone()), None, None)
            .await
        {
            Ok(id) => id,
            Err(error) => return self.fail_response(trace_id, &instruction, error),
        };

        let result = json!({"config_data": intent.config_data});
        if let Err(error) = self
            .task_tracker
            .update_task_status(&task_id, TaskState::Completed, Some(result), None)
            .await
        {
            return self.fail_response(trace_id, &instruction, error);
        }

        self.log_sink.task(
            trace_id,
            "task_routing",
            json!({"outcome": "config_intent_acknowledged", "task_id": task_id}),
        );

        ProcessResponse {
            status: "task_created".to_string(),
            result: Some(json!({"task_id": task_id, "config_data": intent.config_data})),
            error: None,
            trace_id,
        }
    }

    /// S7 Dispatch through S10 Respond for a non-config intent.
    async fn dispatch(
        &self,
        trace_id: Uuid,
        instruction: String,
        user_id: Option<String>,
        ctx: Context,
        specified_agent_id: Option<String>,
        intent: Intent,
    ) -> ProcessResponse {
        let target_agent_id = match self
            .select_agent(specified_agent_id, &intent, user_id.as_deref())
            .await
        {
            Ok(agent_id) => agent_id,
            Err(error) => return self.fail_response(trace_id, &instruction, error),
        };

        self.log_sink
            .task(trace_id, "task_routing", json!({"target_agent_id": target_agent_id}));

        let task_id = match self
            .task_tracker
            .create_task(
                instruction.clone(),
                Some(target_agent_id.clone()),
                user_id,
                Some(intent.raw.clone()),
                None,
                None,
            )
            .await
        {
            Ok(id) => id,
            Err(error) => return self.fail_response(trace_id, &instruction, error),
        };

        let _ = self.task_tracker.update_task_status(&task_id, TaskState::Assigned, None, None).await;

        let agent_client = match self.registry.get_agent(&target_agent_id).await {
            Ok(client) => client,
            Err(error) => {
                let message = error.to_string();
                let _ = self
                    .task_tracker
                    .update_task_status(&task_id, TaskState::Failed, None, Some(message.clone()))
                    .await;
                return self.terminal_failure(trace_id, &instruction, message);
            }
        };

        let _load_guard = self.load_guard(&target_agent_id);
        let _ = self.task_tracker.update_task_status(&task_id, TaskState::Running, None, None).await;

        let request = AgentRequest {
            task_id: task_id.clone(),
            task_type: intent.task_type.clone(),
            task_data: intent.raw.clone(),
            context: serde_json::to_value(&ctx.fields).unwrap_or(Value::Null),
            metadata: json!({}),
        };

        let outcome = tokio::time::timeout(self.config.call_timeout, agent_client.execute(request)).await;

        match outcome {
            Err(_) => {
                let message = format!("agent call timed out after {}s", self.config.call_timeout.as_secs());
                let _ = self
                    .task_tracker
                    .update_task_status(&task_id, TaskState::Failed, None, Some(message.clone()))
                    .await;
                self.terminal_failure(trace_id, &instruction, message)
            }
            Ok(Err(error)) => {
                let message = error.to_string();
                let _ = self
                    .task_tracker
                    .update_task_status(&task_id, TaskState::Failed, None, Some(message.clone()))
                    .await;
                self.terminal_failure(trace_id, &instruction, message)
            }
            Ok(Ok(response)) => match response.status {
                AgentResponseStatus::Completed => {
                    let raw_result = response.result.unwrap_or(Value::Null);
                    let _ = self
                        .task_tracker
                        .update_task_status(&task_id, TaskState::Completed, Some(raw_result.clone()), None)
                        .await;
                    let message = shaping::shape_success(self.llm_client.as_ref(), &instruction, &raw_result).await;
                    self.log_sink
                        .task(trace_id, "task_routing", json!({"outcome": "completed", "task_id": task_id}));
                    ProcessResponse {
                        status: "completed".to_string(),
                        result: Some(json!({"message": message, "raw": raw_result, "task_id": task_id})),
                        error: None,
                        trace_id,
                    }
                }
                AgentResponseStatus::Failed | AgentResponseStatus::Error => {
                    let message = response.error.unwrap_or_else(|| "agent reported failure".to_string());
                    let _ = self
                        .task_tracker
                        .update_task_status(&task_id, TaskState::Failed, None, Some(message.clone()))
                        .await;
                    self.terminal_failure(trace_id, &instruction, message)
                }
            },
        }
    }

    /// Agent selection: explicit `agent_id` wins outright; otherwise route by
    /// `task_type`, query Discovery, prefer internal agents, then break ties
    /// by lowest effective load.
    async fn select_agent(
        &self,
        specified_agent_id: Option<String>,
        intent: &Intent,
        user_id: Option<&str>,
    ) -> Result<String> {
        if let Some(agent_id) = specified_agent_id {
            return Ok(agent_id);
        }

        let preferred_type = self
            .task_type_routing
            .get(&intent.task_type)
            .cloned()
            .unwrap_or_else(|| intent.task_type.clone());

        let query = DiscoveryQuery {
            required_capabilities: Vec::new(),
            agent_type: Some(preferred_type.clone()),
            category: None,
            status: Some(AgentStatus::Online),
            user_id: user_id.map(String::from),
            user_roles: Vec::new(),
        };

        let candidates = self.discovery.discover(&query).await;
        if candidates.is_empty() {
            return Err(CoreError::NotFound(format!(
                "no eligible agent for type '{preferred_type}'"
            )));
        }

        let internal: Vec<&AgentDescriptor> =
            candidates.iter().filter(|agent| agent.endpoints.is_internal).collect();
        let pool: Vec<&AgentDescriptor> = if internal.is_empty() {
            candidates.iter().collect()
        } else {
            internal
        };

        let mut best = pool[0];
        let mut best_load = self.effective_load(&best.agent_id).await;
        for candidate in &pool[1..] {
            let load = self.effective_load(&candidate.agent_id).await;
            if load < best_load {
                best = candidate;
                best_load = load;
            }
        }

        Ok(best.agent_id.clone())
    }

    /// `max(descriptor.load, tracked_counter)`.
    async fn effective_load(&self, agent_id: &str) -> i64 {
        let tracked = {
            let loads = self.loads.read().unwrap();
            loads.get(agent_id).map(|counter| counter.load(Ordering::SeqCst)).unwrap_or(0)
        };
        let descriptor_load = self
            .registry
            .get_agent_info(agent_id)
            .await
            .map(|descriptor| descriptor.load as i64)
            .unwrap_or(0);
        tracked.max(descriptor_load)
    }

    fn load_guard(&self, agent_id: &str) -> LoadGuard {
        let counter = {
            let mut loads = self.loads.write().unwrap();
            loads
                .entry(agent_id.to_string())
                .or_insert_with(|| Arc::new(AtomicI64::new(0)))
                .clone()
        };
        counter.fetch_add(1, Ordering::SeqCst);
        LoadGuard { counter }
    }

    fn terminal_failure(&self, trace_id: Uuid, instruction: &str, error_message: String) -> ProcessResponse {
        self.log_sink.task(trace_id, "task_failed", json!({"error": error_message}));
        let message = shaping::deterministic_failure(instruction, &error_message);
        ProcessResponse {
            status: "failed".to_string(),
            result: Some(json!({"message": message})),
            error: Some(error_message),
            trace_id,
        }
    }

    fn fail_response(&self, trace_id: Uuid, instruction: &str, error: CoreError) -> ProcessResponse {
        let status = error.response_status().to_string();
        self.log_sink.task(trace_id, "task_failed", json!({"error": error.to_string()}));
        let result = if status == "failed" {
            Some(json!({"message": shaping::deterministic_failure(instruction, &error.to_string())}))
        } else {
            None
        };
        ProcessResponse {
            status,
            result,
            error: Some(error.to_string()),
            trace_id,
        }
    }
}

/// Reconstructs caller-presented credentials from the request context's
/// `"credentials"` field. The core never reads these off a socket itself — the
/// hosting transport populates `context` before calling
/// [`Orchestrator::process`].
fn extract_credentials(ctx: &Context) -> AmbientCredentials {
    let Some(value) = ctx.fields.get("credentials") else {
        return AmbientCredentials::default();
    };

    AmbientCredentials {
        request_ip: value
            .get("request_ip")
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok()),
        client_certificate: value.get("client_certificate").and_then(Value::as_str).map(String::from),
        api_key: value.get("api_key").and_then(Value::as_str).map(String::from),
        request_signature: value.get("request_signature").and_then(Value::as_str).map(String::from),
        request_body: value.get("request_body").cloned(),
        server_fingerprint: value.get("server_fingerprint").and_then(Value::as_str).map(String::from),
        service_identity: value.get("service_identity").and_then(Value::as_str).map(String::from),
    }
}

fn resource_kind_of(raw: &Value) -> Option<ResourceKind> {
    match raw.get("resource_kind").and_then(Value::as_str) {
        Some("memory") => Some(ResourceKind::Memory),
        Some("tool") => Some(ResourceKind::Tool),
        Some("llm") => Some(ResourceKind::Llm),
        Some("database") => Some(ResourceKind::Database),
        Some("file") => Some(ResourceKind::File),
        _ => None,
    }
}

fn resource_name_of(raw: &Value) -> Option<String> {
    raw.get("resource_name").and_then(Value::as_str).map(String::from)
}

#[cfg(test)]
mod tests;
