use tracing::{debug, info};

use onboard_signup::{ApprovalIntent, FailureReason, SignupRequest, SignupState, StatusUpdate};

use super::{ReconcileError, SignupReconciler};
use crate::external::{PlacementDecision, PlacementRequest};
use crate::store::StateStore;

impl<S: StateStore> SignupReconciler<S> {
    /// Approval and placement for a signup that has no account yet.
    pub(super) fn ensure_account_if_approved(
        &self,
        signup: &mut SignupRequest,
    ) -> Result<(), ReconcileError> {
        if signup.requires_verification() {
            return self.update_status(signup, &[StatusUpdate::VerificationRequired]);
        }

        let intent = signup.approval_intent();
        let decision = self.resolve_placement(signup, intent);
        info!(?intent, ?decision, "resolved placement");

        let target_cluster = match decision {
            Ok(PlacementDecision::Approved { target_cluster }) => target_cluster,
            Ok(PlacementDecision::PendingApproval) => {
                self.set_state_label(signup, SignupState::Pending)?;
                return self.update_status(
                    signup,
                    &[StatusUpdate::PendingApproval, StatusUpdate::IncompletePendingApproval],
                );
            }
            Ok(PlacementDecision::NoClusterAvailable) => {
                return self.no_cluster_available(signup, intent, None);
            }
            Err(err) => return self.no_cluster_available(signup, intent, Some(err)),
        };

        let approval = match intent {
            ApprovalIntent::Manual => StatusUpdate::ApprovedByAdmin,
            ApprovalIntent::Automatic => StatusUpdate::ApprovedAutomatically,
        };
        self.update_status(signup, &[approval])?;
        self.set_state_label(signup, SignupState::Approved)?;

        let tier = match self.user_tier(signup) {
            Ok(tier) => tier,
            Err(err) => {
                return Err(self.fail(
                    signup,
                    &[StatusUpdate::Failed(FailureReason::NoUserTierAvailable)],
                    err,
                ));
            }
        };

        self.provision_account(signup, &target_cluster, &tier)
    }

    /// Sticky placement first, then the placement provider.
    fn resolve_placement(
        &self,
        signup: &SignupRequest,
        intent: ApprovalIntent,
    ) -> Result<PlacementDecision, ReconcileError> {
        let approval_satisfied = intent == ApprovalIntent::Manual || self.config.automatic_approval;
        if approval_satisfied {
            if let Some(cluster) = signup.last_target_cluster() {
                debug!(cluster, "reusing last target cluster");
                return Ok(PlacementDecision::Approved {
                    target_cluster: cluster.to_string(),
                });
            }
        }

        let event = self.social_event(signup)?;
        let preferred_cluster = event.as_ref().and_then(|e| e.spec.target_cluster.as_deref());
        Ok(self.placement.place(&PlacementRequest {
            intent,
            preferred_cluster,
        })?)
    }

    fn no_cluster_available(
        &self,
        signup: &mut SignupRequest,
        intent: ApprovalIntent,
        err: Option<ReconcileError>,
    ) -> Result<(), ReconcileError> {
        self.set_state_label(signup, SignupState::Pending)?;

        match (intent, err) {
            (ApprovalIntent::Manual, err) => {
                let err = err.unwrap_or(ReconcileError::NoCapacity);
                Err(self.fail(
                    signup,
                    &[StatusUpdate::ApprovedByAdmin, StatusUpdate::NoClustersAvailable],
                    err,
                ))
            }
            (ApprovalIntent::Automatic, Some(err)) => Err(self.fail(
                signup,
                &[StatusUpdate::PendingApproval, StatusUpdate::NoClustersAvailable],
                err,
            )),
            // Wait for a capacity change to bring us back.
            (ApprovalIntent::Automatic, None) => self.update_status(
                signup,
                &[StatusUpdate::PendingApproval, StatusUpdate::NoClustersAvailable],
            ),
        }
    }
}
