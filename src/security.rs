//! Shared cryptographic primitives used by [`crate::auth`]: key generation,
//! canonical JSON, HMAC signing, and constant-time comparison. Centralized in
//! one module so every comparison against a caller-presented secret goes
//! through [`constant_time_eq`], never `==`.

use hmac::{Hmac, Mac};
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use serde_json::Value;
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// 384 bits of entropy at ~5.95 bits/char, comfortably above the 256-bit
/// floor a bearer credential should carry.
pub const API_KEY_LENGTH: usize = 64;

pub fn generate_secure_api_key() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(API_KEY_LENGTH)
        .map(char::from)
        .collect()
}

/// Shorter identifier for `secret_id` references, not a credential itself —
/// just a handle an external store resolves.
pub fn generate_secret_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Serializes `value` with sorted object keys and minimal separators, the
/// representation the 5-step external check signs over.
pub fn canonical_json(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let body = keys
                .into_iter()
                .map(|k| format!("{}:{}", canonical_json(&Value::String(k.clone())), canonical_json(&map[k])))
                .collect::<Vec<_>>()
                .join(",");
            format!("{{{body}}}")
        }
        Value::Array(items) => {
            let body = items.iter().map(canonical_json).collect::<Vec<_>>().join(",");
            format!("[{body}]")
        }
        other => other.to_string(),
    }
}

/// `HMAC-SHA256(secret, canonical_json(body))`, hex-encoded.
pub fn sign_payload(secret: &str, body: &Value) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts keys of any length");
    mac.update(canonical_json(body).as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Constant-time byte comparison. Every secret comparison in [`crate::auth`]
/// goes through this, never `==` or `str::eq`.
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Case-insensitive constant-time comparison, for the server fingerprint
/// check.
pub fn constant_time_eq_ignore_case(a: &str, b: &str) -> bool {
    constant_time_eq(&a.to_lowercase(), &b.to_lowercase())
}
