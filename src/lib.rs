//! # Agentflow Core
//!
//! The platform-agnostic core of an agent orchestration system: a registry of
//! internal and external agents, capability-based discovery, a durable task
//! tracker, authentication and resource-access gates, and the orchestrator
//! that ties them into a single instruction → result pipeline.
//!
//! ## Architecture
//!
//! - **Registry**: durable catalog plus live in-process index of registered
//!   agents, with heartbeat and status tracking.
//! - **Discovery**: capability/permission/health filtering over the registry.
//! - **TaskTracker**: task lifecycle, timeout reaping, and callback dispatch.
//! - **Auth**: internal and external agent authentication.
//! - **ResourceGuard**: per-agent allow-listed resource access.
//! - **HealthMonitor**: background liveness sweep over active agents.
//! - **Orchestrator**: mediates the above plus four external collaborators
//!   (task analyzer, security agent, config catalog, LLM client) through the
//!   classify/pre-check/authorize/dispatch/shape pipeline.
//!
//! ## Usage
//!
//! This crate has no inbound transport of its own. A hosting process wires
//! concrete implementations of the collaborator traits in
//! [`collaborators`], constructs [`orchestrator::Orchestrator`], and exposes
//! its own API surface (HTTP, CLI, etc.) on top.

/// Authentication and authorization
pub mod auth;
/// Trait seams for out-of-scope collaborators
pub mod collaborators;
/// Runtime configuration
pub mod config;
/// System-wide constants
pub mod constants;
/// Capability/permission/health-filtered agent lookup
pub mod discovery;
/// Error types and handling
pub mod error;
/// Background agent liveness sweep
pub mod health_monitor;
/// Structured task/audit/security logging
pub mod logging;
/// Core data models
pub mod models;
/// The instruction -> result state machine
pub mod orchestrator;
/// Durable catalog + live in-process agent index
pub mod registry;
/// Per-agent allow-listed resource access
pub mod resource_guard;
/// Cryptographic primitives: key generation, signing, constant-time comparison
pub mod security;
/// Task lifecycle, timeout reaping, and callback dispatch
pub mod task_tracker;

pub use error::{CoreError, Result};
