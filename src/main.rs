use agentflow_core::collaborators::{
    Analysis, AgentClient, ConfigCatalog, ConfigScope, Context, Intent, LlmClient, LlmResponse,
    TaskAnalyzer,
};
use agentflow_core::discovery::{AgentSource, Discovery};
use agentflow_core::error::{CoreError, Result};
use agentflow_core::health_monitor::{HealthMonitor, HttpHealthProbe};
use agentflow_core::logging::{self, TracingLogSink};
use agentflow_core::models::AgentDescriptor;
use agentflow_core::orchestrator::Orchestrator;
use agentflow_core::registry::{AgentClientFactory, InMemoryCatalog, Registry};
use agentflow_core::resource_guard::ResourceGuard;
use agentflow_core::task_tracker::{InMemoryTaskStore, TaskTracker};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// External agents need a real transport-specific client; a hosting process
/// that registers any supplies its own [`AgentClientFactory`].
struct NullClientFactory;

impl AgentClientFactory for NullClientFactory {
    fn build(&self, descriptor: &AgentDescriptor) -> Result<Arc<dyn AgentClient>> {
        Err(CoreError::InvalidConfig(format!(
            "no client factory configured for external agent `{}`",
            descriptor.agent_id
        )))
    }
}

/// Classifies the first word of the instruction as `task_type`. A hosting
/// process wires a real NLU-backed analyzer in its place.
struct PassthroughAnalyzer;

#[async_trait]
impl TaskAnalyzer for PassthroughAnalyzer {
    async fn analyze(
        &self,
        instruction: &str,
        _user_id: Option<&str>,
        _context: &Context,
    ) -> Result<Analysis> {
        let task_type = instruction
            .split_whitespace()
            .next()
            .unwrap_or("default")
            .to_lowercase();

        Ok(Analysis::Classified(Intent {
            task_type,
            scope: None,
            config_data: HashMap::new(),
            raw: serde_json::json!({ "instruction": instruction }),
        }))
    }
}

struct EmptyConfigCatalog;

impl ConfigCatalog for EmptyConfigCatalog {
    fn scope(&self, _name: &str) -> Option<ConfigScope> {
        None
    }
}

/// Returns the prompt verbatim. A hosting process wires a real LLM client.
struct EchoLlmClient;

#[async_trait]
impl LlmClient for EchoLlmClient {
    async fn generate(&self, prompt: &str, _max_tokens: Option<u32>) -> Result<LlmResponse> {
        Ok(LlmResponse {
            content: Some(prompt.to_string()),
            text: None,
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_tracing();
    tracing::info!("starting agentflow-core");

    let config = agentflow_core::config::Config::load()?;

    let registry = Arc::new(Registry::new(
        Arc::new(InMemoryCatalog::new()),
        Arc::new(NullClientFactory),
        None,
        config.health_monitor.heartbeat_timeout,
    ));

    let source: Arc<dyn AgentSource> = registry.clone();
    let discovery = Arc::new(Discovery::new(
        source,
        config.discovery.health_freshness_window,
    ));

    let task_tracker = Arc::new(TaskTracker::new(
        Arc::new(InMemoryTaskStore::new()),
        config.task_tracker.default_timeout,
        config.task_tracker.reaper_interval,
    ));
    task_tracker.start().await;

    let resource_guard = Arc::new(ResourceGuard::new(registry.clone()));

    let health_monitor = Arc::new(HealthMonitor::new(
        registry.clone(),
        Arc::new(HttpHealthProbe::new()),
        config.health_monitor.clone(),
    ));
    health_monitor.start().await;

    let orchestrator = Arc::new(Orchestrator::new(
        registry,
        discovery,
        task_tracker.clone(),
        resource_guard,
        Arc::new(PassthroughAnalyzer),
        None,
        Arc::new(EmptyConfigCatalog),
        Arc::new(EchoLlmClient),
        Arc::new(TracingLogSink),
        config.orchestrator,
        HashMap::new(),
    ));
    let _ = &orchestrator;

    tracing::info!("agentflow-core running; awaiting shutdown signal");
    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");

    health_monitor.stop().await;
    task_tracker.stop().await;

    Ok(())
}
