//! AuthN: internal and external agent verifiers. Both verifiers share
//! `verify(agent_id, credentials) -> AuthenticationOutcome` but differ in what
//! they trust: the internal verifier only confirms the caller is who the
//! registry already knows it to be; the external verifier runs the full five-
//! step credential chain with constant-time comparison throughout.

mod external;
mod internal;

pub use external::ExternalVerifier;
pub use internal::InternalVerifier;

use crate::models::AgentDescriptor;
use serde_json::Value;
use std::net::IpAddr;

/// Narrow read seam into the registry: auth depends on this trait, not on the
/// registry's concrete storage, so the two modules never import each other
/// directly.
pub trait AgentLookup: Send + Sync {
    fn find(&self, agent_id: &str) -> Option<AgentDescriptor>;
}

/// Caller-supplied material an inbound request carries. Ambient to whatever
/// transport accepted the request; the core never reads these off a socket
/// itself.
#[derive(Debug, Clone, Default)]
pub struct AmbientCredentials {
    pub request_ip: Option<IpAddr>,
    pub client_certificate: Option<String>,
    pub api_key: Option<String>,
    pub request_signature: Option<String>,
    pub request_body: Option<Value>,
    pub server_fingerprint: Option<String>,
    pub service_identity: Option<String>,
}

/// Shared contract both verifiers implement.
pub trait Verifier: Send + Sync {
    fn verify(
        &self,
        agent_id: &str,
        credentials: &AmbientCredentials,
    ) -> crate::models::AuthenticationOutcome;
}
