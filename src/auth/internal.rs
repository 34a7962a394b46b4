use super::{AgentLookup, AmbientCredentials, Verifier};
use crate::models::AuthenticationOutcome;
use std::sync::Arc;

/// Confirms a caller claiming to be an internal agent matches what the
/// registry recorded at registration time.
pub struct InternalVerifier {
    lookup: Arc<dyn AgentLookup>,
}

impl InternalVerifier {
    pub fn new(lookup: Arc<dyn AgentLookup>) -> Self {
        Self { lookup }
    }
}

impl Verifier for InternalVerifier {
    fn verify(&self, agent_id: &str, credentials: &AmbientCredentials) -> AuthenticationOutcome {
        let Some(descriptor) = self.lookup.find(agent_id) else {
            return AuthenticationOutcome::failed(agent_id, "not found");
        };

        if !descriptor.endpoints.is_internal {
            return AuthenticationOutcome::failed(agent_id, "not an internal agent");
        }

        if let (Some(expected), Some(presented)) = (
            descriptor.service_identity.as_deref(),
            credentials.service_identity.as_deref(),
        ) {
            if expected != presented {
                return AuthenticationOutcome::failed(agent_id, "identity mismatch");
            }
        }

        AuthenticationOutcome::success(agent_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AgentDescriptor, AgentEndpoints, AgentMetadata, AgentPermissions, AgentStatus};
    use std::collections::HashMap;
    use std::sync::RwLock;

    struct FakeRegistry(RwLock<HashMap<String, AgentDescriptor>>);

    impl AgentLookup for FakeRegistry {
        fn find(&self, agent_id: &str) -> Option<AgentDescriptor> {
            self.0.read().unwrap().get(agent_id).cloned()
        }
    }

    fn internal_descriptor(agent_id: &str, service_identity: Option<&str>) -> AgentDescriptor {
        AgentDescriptor {
            agent_id: agent_id.to_string(),
            agent_type: "planner".to_string(),
            name: "Planner".to_string(),
            description: None,
            endpoints: AgentEndpoints {
                is_internal: true,
                ..Default::default()
            },
            capabilities: vec![],
            metadata: AgentMetadata::default(),
            permissions: AgentPermissions::default(),
            status: AgentStatus::Online,
            is_system_agent: true,
            load: 0,
            registered_at: chrono::Utc::now(),
            last_heartbeat: None,
            health_endpoint: None,
            service_identity: service_identity.map(String::from),
        }
    }

    fn registry_with(descriptor: AgentDescriptor) -> Arc<dyn AgentLookup> {
        let mut map = HashMap::new();
        map.insert(descriptor.agent_id.clone(), descriptor);
        Arc::new(FakeRegistry(RwLock::new(map)))
    }

    #[test]
    fn unknown_agent_fails() {
        let verifier = InternalVerifier::new(registry_with(internal_descriptor("a", None)));
        let outcome = verifier.verify("missing", &AmbientCredentials::default());
        assert_eq!(outcome.status, crate::models::AuthStatus::Failed);
    }

    #[test]
    fn external_descriptor_rejected() {
        let mut descriptor = internal_descriptor("a", None);
        descriptor.endpoints.is_internal = false;
        let verifier = InternalVerifier::new(registry_with(descriptor));
        let outcome = verifier.verify("a", &AmbientCredentials::default());
        assert_eq!(outcome.status, crate::models::AuthStatus::Failed);
        assert_eq!(outcome.reason.as_deref(), Some("not an internal agent"));
    }

    #[test]
    fn missing_identity_is_accepted_when_none_was_registered() {
        let verifier = InternalVerifier::new(registry_with(internal_descriptor("a", None)));
        let outcome = verifier.verify("a", &AmbientCredentials::default());
        assert_eq!(outcome.status, crate::models::AuthStatus::Success);
    }

    #[test]
    fn mismatched_identity_fails() {
        let verifier = InternalVerifier::new(registry_with(internal_descriptor("a", Some("svc-a"))));
        let credentials = AmbientCredentials {
            service_identity: Some("svc-b".to_string()),
            ..Default::default()
        };
        let outcome = verifier.verify("a", &credentials);
        assert_eq!(outcome.status, crate::models::AuthStatus::Failed);
        assert_eq!(outcome.reason.as_deref(), Some("identity mismatch"));
    }

    #[test]
    fn matched_identity_succeeds() {
        let verifier = InternalVerifier::new(registry_with(internal_descriptor("a", Some("svc-a"))));
        let credentials = AmbientCredentials {
            service_identity: Some("svc-a".to_string()),
            ..Default::default()
        };
        let outcome = verifier.verify("a", &credentials);
        assert_eq!(outcome.status, crate::models::AuthStatus::Success);
    }
}
