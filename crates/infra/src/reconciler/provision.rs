use tracing::info;

use onboard_core::Resource;
use onboard_observability::Metric;
use onboard_signup::{FailureReason, SignupRequest, StatusUpdate, UserAccount, UserTier};

use super::{ReconcileError, SignupReconciler};
use crate::store::StateStore;

impl<S: StateStore> SignupReconciler<S> {
    /// Create the user account for an approved signup.
    ///
    /// The target cluster is remembered on the signup first so that a later
    /// re-provisioning lands on the same cluster.
    pub(super) fn provision_account(
        &self,
        signup: &mut SignupRequest,
        target_cluster: &str,
        tier: &UserTier,
    ) -> Result<(), ReconcileError> {
        if signup.last_target_cluster() != Some(target_cluster) {
            signup.set_last_target_cluster(target_cluster);
            match self.store.update(signup) {
                Ok(stored) => *signup = stored,
                Err(err) => {
                    return Err(self.fail(
                        signup,
                        &[StatusUpdate::Failed(FailureReason::FailedToUpdateAnnotation)],
                        err,
                    ));
                }
            }
        }

        let username = match self.allocate_username(signup) {
            Ok(username) => username,
            Err(err) => {
                return Err(self.fail(
                    signup,
                    &[StatusUpdate::Failed(FailureReason::UnableToCreateUserAccount)],
                    err,
                ));
            }
        };

        let account = UserAccount::for_signup(&username, signup, target_cluster, tier.name());
        info!(record = %username, "creating user account");
        if let Err(err) = self.store.create(&account) {
            return Err(self.fail(
                signup,
                &[StatusUpdate::Failed(FailureReason::UnableToCreateUserAccount)],
                err,
            ));
        }

        self.metrics
            .increment(Metric::UserAccounts, Some(self.email_domain(signup)));
        info!(record = %username, target_cluster, "created user account");
        Ok(())
    }
}
