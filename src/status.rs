//! Runtime status aggregation.
//!
//! Folds the runtime health endpoint and the network plugin into the two
//! conditions the kubelet expects from a CRI `Status` call:
//!
//! | Condition      | Source               | Not-ready reason        |
//! |----------------|----------------------|-------------------------|
//! | `RuntimeReady` | [`HealthChecker`]    | `ContainerdNotReady`    |
//! | `NetworkReady` | [`NetworkPlugin`]    | `NetworkPluginNotReady` |
//!
//! Collaborator failures degrade the matching condition; they never fail the
//! call. Only cancellation does.

use crate::constants::{
    NETWORK_NOT_READY_REASON, RUNTIME_NOT_READY_REASON, RUNTIME_NOT_SERVING_MESSAGE,
};
use crate::error::{BoxError, Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::warn;

// =============================================================================
// Collaborators
// =============================================================================

/// Answer from the runtime's health endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServingStatus {
    /// The runtime is serving requests.
    Serving,
    /// The runtime answered but is not serving.
    NotServing,
}

/// Health check against the container runtime (gRPC health service).
#[async_trait]
pub trait HealthChecker: Send + Sync {
    /// Queries the health endpoint. Transport failures are errors.
    async fn check(&self) -> std::result::Result<ServingStatus, BoxError>;
}

/// Network plugin readiness (CNI).
#[async_trait]
pub trait NetworkPlugin: Send + Sync {
    /// Returns an error if the plugin is not ready to set up pod networks.
    async fn status(&self) -> std::result::Result<(), BoxError>;
}

// =============================================================================
// Conditions
// =============================================================================

/// Condition type reported in the runtime status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConditionKind {
    /// The runtime can run containers.
    RuntimeReady,
    /// Pod networking is available.
    NetworkReady,
}

impl std::fmt::Display for ConditionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RuntimeReady => write!(f, "RuntimeReady"),
            Self::NetworkReady => write!(f, "NetworkReady"),
        }
    }
}

/// One readiness condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthCondition {
    /// Condition type.
    pub kind: ConditionKind,
    /// Whether the condition holds.
    pub ready: bool,
    /// Machine-readable reason, empty when ready.
    pub reason: String,
    /// Human-readable detail, empty when ready.
    pub message: String,
}

impl HealthCondition {
    fn ready(kind: ConditionKind) -> Self {
        Self {
            kind,
            ready: true,
            reason: String::new(),
            message: String::new(),
        }
    }

    fn not_ready(kind: ConditionKind, reason: &str, message: String) -> Self {
        Self {
            kind,
            ready: false,
            reason: reason.to_string(),
            message,
        }
    }
}

/// Runtime status: always `[RuntimeReady, NetworkReady]`, in that order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeStatus {
    conditions: [HealthCondition; 2],
}

impl RuntimeStatus {
    /// All conditions, in fixed order.
    pub fn conditions(&self) -> &[HealthCondition] {
        &self.conditions
    }

    /// Returns the condition of the given kind.
    pub fn condition(&self, kind: ConditionKind) -> &HealthCondition {
        match kind {
            ConditionKind::RuntimeReady => &self.conditions[0],
            ConditionKind::NetworkReady => &self.conditions[1],
        }
    }

    /// Returns true if every condition is ready.
    pub fn is_ready(&self) -> bool {
        self.conditions.iter().all(|c| c.ready)
    }
}

// =============================================================================
// Aggregator
// =============================================================================

/// Builds [`RuntimeStatus`] from injected collaborators.
#[derive(Clone)]
pub struct StatusAggregator {
    health: Arc<dyn HealthChecker>,
    network: Arc<dyn NetworkPlugin>,
}

impl StatusAggregator {
    /// Creates an aggregator over the given collaborators.
    pub fn new(health: Arc<dyn HealthChecker>, network: Arc<dyn NetworkPlugin>) -> Self {
        Self { health, network }
    }

    /// Queries both collaborators and reports the two conditions.
    ///
    /// # Errors
    ///
    /// [`Error::Cancelled`] if `cancel` fires while a collaborator call is
    /// pending. Collaborator failures are reported in the conditions instead.
    pub async fn status(&self, cancel: &CancellationToken) -> Result<RuntimeStatus> {
        let health = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(cancelled("runtime health check")),
            health = self.health.check() => health,
        };
        let runtime = runtime_condition(health);

        let network = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(cancelled("network plugin status")),
            network = self.network.status() => network,
        };
        let network = network_condition(network);

        for condition in [&runtime, &network] {
            if !condition.ready {
                warn!(
                    "{} is false: {}: {}",
                    condition.kind, condition.reason, condition.message
                );
            }
        }

        Ok(RuntimeStatus {
            conditions: [runtime, network],
        })
    }
}

impl std::fmt::Debug for StatusAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusAggregator").finish_non_exhaustive()
    }
}

fn runtime_condition(health: std::result::Result<ServingStatus, BoxError>) -> HealthCondition {
    match health {
        Ok(ServingStatus::Serving) => HealthCondition::ready(ConditionKind::RuntimeReady),
        Ok(ServingStatus::NotServing) => HealthCondition::not_ready(
            ConditionKind::RuntimeReady,
            RUNTIME_NOT_READY_REASON,
            RUNTIME_NOT_SERVING_MESSAGE.to_string(),
        ),
        Err(e) => HealthCondition::not_ready(
            ConditionKind::RuntimeReady,
            RUNTIME_NOT_READY_REASON,
            format!("Containerd healthcheck returns error: {}", e),
        ),
    }
}

fn network_condition(status: std::result::Result<(), BoxError>) -> HealthCondition {
    match status {
        Ok(()) => HealthCondition::ready(ConditionKind::NetworkReady),
        Err(e) => HealthCondition::not_ready(
            ConditionKind::NetworkReady,
            NETWORK_NOT_READY_REASON,
            format!("Network plugin returns error: {}", e),
        ),
    }
}

fn cancelled(operation: &str) -> Error {
    Error::Cancelled {
        operation: operation.to_string(),
    }
}
