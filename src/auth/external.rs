use super::{AgentLookup, AmbientCredentials, Verifier};
use crate::models::AuthenticationOutcome;
use crate::security;
use std::net::IpAddr;
use std::sync::Arc;

/// Runs the five-step external credential chain in order: certificate, API
/// key, request signature, IP whitelist, server fingerprint. First failure
/// short-circuits.
pub struct ExternalVerifier {
    lookup: Arc<dyn AgentLookup>,
}

impl ExternalVerifier {
    pub fn new(lookup: Arc<dyn AgentLookup>) -> Self {
        Self { lookup }
    }
}

impl Verifier for ExternalVerifier {
    fn verify(&self, agent_id: &str, credentials: &AmbientCredentials) -> AuthenticationOutcome {
        let Some(descriptor) = self.lookup.find(agent_id) else {
            return AuthenticationOutcome::failed(agent_id, "not found");
        };

        if descriptor.endpoints.is_internal {
            return AuthenticationOutcome::failed(agent_id, "not an external agent");
        }

        let permissions = &descriptor.permissions;

        if let Some(expected_cert) = permissions.server_certificate.as_deref() {
            match credentials.client_certificate.as_deref() {
                Some(presented) if security::constant_time_eq(presented.trim(), expected_cert.trim()) => {}
                _ => return AuthenticationOutcome::failed(agent_id, "server certificate mismatch"),
            }
        }

        if let Some(expected_key) = permissions.api_key.as_deref() {
            match credentials.api_key.as_deref() {
                Some(presented) if security::constant_time_eq(presented, expected_key) => {}
                _ => return AuthenticationOutcome::failed(agent_id, "api key mismatch"),
            }

            if let (Some(signature), Some(body)) =
                (credentials.request_signature.as_deref(), credentials.request_body.as_ref())
            {
                let expected_signature = security::sign_payload(expected_key, body);
                if !security::constant_time_eq(signature, &expected_signature) {
                    return AuthenticationOutcome::failed(agent_id, "request signature mismatch");
                }
            }
        }

        if !permissions.ip_whitelist.is_empty() {
            match credentials.request_ip {
                Some(ip) if ip_allowed(ip, &permissions.ip_whitelist) => {}
                _ => return AuthenticationOutcome::failed(agent_id, "ip not whitelisted"),
            }
        }

        if let Some(expected_fp) = permissions.server_fingerprint.as_deref() {
            match credentials.server_fingerprint.as_deref() {
                Some(presented) if security::constant_time_eq_ignore_case(presented, expected_fp) => {}
                _ => return AuthenticationOutcome::failed(agent_id, "server fingerprint mismatch"),
            }
        }

        AuthenticationOutcome::success(agent_id)
    }
}

/// Exact address or CIDR containment against each whitelist entry. An empty
/// whitelist is handled by the caller as "allow all"; this function is only
/// reached once the list is known non-empty.
fn ip_allowed(ip: IpAddr, whitelist: &[String]) -> bool {
    whitelist.iter().any(|entry| {
        if let Ok(exact) = entry.parse::<IpAddr>() {
            return exact == ip;
        }
        entry
            .parse::<ipnet::IpNet>()
            .map(|net| net.contains(&ip))
            .unwrap_or(false)
    })
}
