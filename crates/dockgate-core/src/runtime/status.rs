// crates/dockgate-core/src/runtime/status.rs
// ============================================================================
// Module: Dockgate Status Aggregator
// Description: Read-only fan-out over the gateway and permission store.
// Purpose: Produce the snapshot served by the status surface.
// Dependencies: crate::runtime, serde, tokio, tracing
// ============================================================================

//! ## Overview
//! [`StatusAggregator::snapshot`] queries every allow-listed target
//! concurrently. A target whose query fails is reported as `null` and the
//! remaining targets are still reported.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::task::JoinSet;
use tracing::warn;

use crate::runtime::activity::ActivityLog;
use crate::runtime::gateway::ContainerGateway;
use crate::runtime::permission_store::PermissionStore;

// ============================================================================
// SECTION: Snapshot
// ============================================================================

/// Aggregated state for the status surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    /// Always true for a produced snapshot.
    pub ok: bool,
    /// Runtime status per allow-listed target; `None` when unknown.
    pub containers: BTreeMap<String, Option<String>>,
    /// Current permission mapping.
    pub permissions: BTreeMap<String, Vec<String>>,
    /// Recent activity lines, oldest first.
    pub recent_activity: Vec<String>,
}

// ============================================================================
// SECTION: Aggregator
// ============================================================================

/// Builds [`StatusSnapshot`] values.
#[derive(Clone)]
pub struct StatusAggregator {
    /// Container status source.
    gateway: Arc<ContainerGateway>,
    /// Permission source.
    store: Arc<PermissionStore>,
    /// Activity source.
    activity: Arc<ActivityLog>,
}

impl StatusAggregator {
    /// Creates an aggregator.
    #[must_use]
    pub const fn new(
        gateway: Arc<ContainerGateway>,
        store: Arc<PermissionStore>,
        activity: Arc<ActivityLog>,
    ) -> Self {
        Self {
            gateway,
            store,
            activity,
        }
    }

    /// Returns the status of every allow-listed target.
    pub async fn container_statuses(&self) -> BTreeMap<String, Option<String>> {
        let mut containers: BTreeMap<String, Option<String>> =
            self.gateway.allow_list().iter().map(|target| (target.to_string(), None)).collect();
        let mut tasks = JoinSet::new();
        for target in self.gateway.allow_list() {
            let gateway = Arc::clone(&self.gateway);
            let target = target.clone();
            tasks.spawn(async move {
                let status = gateway.status(&target).await;
                (target, status)
            });
        }
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((target, Ok(state))) => {
                    containers.insert(target.to_string(), Some(state.as_str().to_string()));
                }
                Ok((target, Err(err))) => {
                    warn!(target = %target, error = %err, "status query failed");
                }
                Err(err) => warn!(error = %err, "status task failed"),
            }
        }
        containers
    }

    /// Builds a full snapshot.
    pub async fn snapshot(&self) -> StatusSnapshot {
        let containers = self.container_statuses().await;
        StatusSnapshot {
            ok: true,
            containers,
            permissions: self.store.load_async().await.summary(),
            recent_activity: self.activity.recent(),
        }
    }
}
