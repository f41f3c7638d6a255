use tracing::info;

use onboard_core::{LabelSelector, Resource};
use onboard_signup::{FailureReason, SignupRequest, SignupState, StatusUpdate, UserAccount, keys};

use super::{ReconcileError, SignupReconciler};
use crate::store::StateStore;

impl<S: StateStore> SignupReconciler<S> {
    /// Handle a signup whose user account already exists.
    ///
    /// Returns `Ok(false)` when there is no account yet (the caller goes on to
    /// approval and provisioning) and `Ok(true)` when this attempt is done.
    pub(super) fn reconcile_existing_account(
        &self,
        signup: &mut SignupRequest,
        banned: bool,
    ) -> Result<bool, ReconcileError> {
        let selector = LabelSelector::new().with(keys::OWNER_LABEL, signup.name());
        let mut accounts: Vec<UserAccount> = match self.store.list(&selector) {
            Ok(accounts) => accounts,
            Err(err) => {
                return Err(self.fail(
                    signup,
                    &[StatusUpdate::Failed(FailureReason::InvalidUserAccountState)],
                    err,
                ));
            }
        };

        let mut account = match accounts.len() {
            0 => return Ok(false),
            1 => accounts.remove(0),
            count => {
                let err = ReconcileError::InvalidRecordState {
                    signup: signup.name().to_string(),
                    count,
                };
                return Err(self.fail(
                    signup,
                    &[StatusUpdate::Failed(FailureReason::InvalidUserAccountState)],
                    err,
                ));
            }
        };

        if banned {
            self.set_state_label(signup, SignupState::Banned)?;
            info!(record = account.name(), "deleting user account since user has been banned");
            self.delete_account(signup, &account, StatusUpdate::Banning)?;
            return Ok(true);
        }

        if signup.is_deactivated() {
            // The state label moves once the account is gone.
            info!(record = account.name(), "deleting user account since user has been deactivated");
            self.delete_account(signup, &account, StatusUpdate::DeactivationInProgress)?;
            return Ok(true);
        }

        self.set_state_label(signup, SignupState::Approved)?;

        let user_tier = match self.user_tier(signup) {
            Ok(tier) => tier,
            Err(err) => {
                return Err(self.fail(
                    signup,
                    &[StatusUpdate::Failed(FailureReason::NoUserTierAvailable)],
                    err,
                ));
            }
        };
        let workspace_tier = match self.workspace_tier(signup) {
            Ok(tier) => tier,
            Err(err) => {
                return Err(self.fail(
                    signup,
                    &[StatusUpdate::Failed(FailureReason::NoWorkspaceTierAvailable)],
                    err,
                ));
            }
        };

        let email = signup.email().unwrap_or_default().to_string();
        if account.migrate(user_tier.name(), &email) {
            info!(record = account.name(), "updating user account after migration");
            if let Err(err) = self.store.update(&account) {
                return Err(self.fail(
                    signup,
                    &[StatusUpdate::Failed(FailureReason::InvalidUserAccountState)],
                    err,
                ));
            }
            return Ok(true);
        }

        if signup.manages_workspace() {
            let (workspace, created) = self.ensure_workspace(signup, &account, workspace_tier.name())?;
            // The workspace watch brings us back once it is stored.
            if created {
                return Ok(true);
            }

            self.ensure_binding(signup, &account, &workspace)?;

            if !workspace.is_ready() {
                self.update_status(
                    signup,
                    &[StatusUpdate::Incomplete {
                        message: format!("workspace {} was not ready", workspace.name()),
                    }],
                )?;
                return Ok(true);
            }
        }

        info!(record = account.name(), "signup complete");
        self.update_status(
            signup,
            &[StatusUpdate::Complete {
                compliant_username: account.name().to_string(),
            }],
        )?;
        Ok(true)
    }

    fn delete_account(
        &self,
        signup: &mut SignupRequest,
        account: &UserAccount,
        in_progress: StatusUpdate,
    ) -> Result<(), ReconcileError> {
        self.update_status(signup, &[in_progress])?;

        match self.store.delete::<UserAccount>(account.name()) {
            Ok(()) => {
                info!(record = account.name(), "deleted user account");
                Ok(())
            }
            Err(err) if err.is_not_found() => Ok(()),
            Err(err) => Err(self.fail(
                signup,
                &[StatusUpdate::Failed(FailureReason::UnableToDeleteUserAccount)],
                err,
            )),
        }
    }
}
