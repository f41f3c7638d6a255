use thiserror::Error;
use tracing::debug;

use onboard_signup::capacity::CAPACITY_STATUS_NAME;
use onboard_signup::{ApprovalIntent, CapacityStatus};

use crate::store::{StateStore, StoreError};

#[derive(Debug, Error)]
pub enum PlacementError {
    #[error("capacity status '{0}' is not available")]
    CapacityUnknown(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl PlacementError {
    pub fn is_transient(&self) -> bool {
        match self {
            PlacementError::CapacityUnknown(_) => true,
            PlacementError::Store(err) => err.is_transient(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementRequest<'a> {
    pub intent: ApprovalIntent,
    /// Cluster requested by the signup's social event, if any.
    pub preferred_cluster: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlacementDecision {
    /// The signup is approved and goes to `target_cluster`.
    Approved { target_cluster: String },
    /// Nothing approved the signup yet; capacity was not consulted.
    PendingApproval,
    /// Approved, but no member has room.
    NoClusterAvailable,
}

/// Chooses where (and whether) an approved signup is provisioned.
pub trait PlacementProvider: Send + Sync {
    fn place(&self, request: &PlacementRequest<'_>) -> Result<PlacementDecision, PlacementError>;
}

/// Placement driven by the stored `CapacityStatus` snapshot.
///
/// Automatic intent is only approved when automatic approval is enabled.
/// The preferred cluster wins while it has room; otherwise the member with
/// the most free slots is picked.
pub struct CapacityPlacement<S> {
    store: S,
    automatic_approval: bool,
}

impl<S> CapacityPlacement<S> {
    pub fn new(store: S, automatic_approval: bool) -> Self {
        Self {
            store,
            automatic_approval,
        }
    }
}

impl<S: StateStore> PlacementProvider for CapacityPlacement<S> {
    fn place(&self, request: &PlacementRequest<'_>) -> Result<PlacementDecision, PlacementError> {
        if request.intent == ApprovalIntent::Automatic && !self.automatic_approval {
            return Ok(PlacementDecision::PendingApproval);
        }

        let capacity: CapacityStatus = self
            .store
            .find(CAPACITY_STATUS_NAME)?
            .ok_or_else(|| PlacementError::CapacityUnknown(CAPACITY_STATUS_NAME.to_string()))?;

        if let Some(preferred) = request.preferred_cluster {
            if capacity.member(preferred).is_some_and(|m| m.has_room()) {
                return Ok(PlacementDecision::Approved {
                    target_cluster: preferred.to_string(),
                });
            }
            debug!(cluster = preferred, "preferred cluster has no room");
        }

        Ok(match capacity.best_member() {
            Some(member) => PlacementDecision::Approved {
                target_cluster: member.cluster.clone(),
            },
            None => PlacementDecision::NoClusterAvailable,
        })
    }
}
