use tracing::info;

use onboard_core::Resource;
use onboard_signup::{
    Binding, FailureReason, SignupRequest, StatusUpdate, UserAccount, Workspace,
};

use super::{ReconcileError, SignupReconciler};
use crate::store::StateStore;

impl<S: StateStore> SignupReconciler<S> {
    /// Get or create the workspace named after `account`.
    ///
    /// The second element is `true` when the workspace was created by this call.
    pub(super) fn ensure_workspace(
        &self,
        signup: &mut SignupRequest,
        account: &UserAccount,
        tier_name: &str,
    ) -> Result<(Workspace, bool), ReconcileError> {
        if let Some(workspace) = self.store.find::<Workspace>(account.name())? {
            if workspace.metadata.is_being_deleted() {
                return Err(ReconcileError::WorkspaceTerminating(workspace.metadata.name));
            }
            return Ok((workspace, false));
        }

        if account.spec.target_cluster.is_empty() {
            return Err(ReconcileError::MissingTargetCluster(account.name().to_string()));
        }

        let workspace = Workspace::for_account(account, signup.name(), tier_name);
        match self.store.create(&workspace) {
            Ok(created) => {
                info!(
                    workspace = created.name(),
                    target_cluster = %created.spec.target_cluster,
                    tier = tier_name,
                    "created workspace"
                );
                Ok((created, true))
            }
            Err(err) => Err(self.fail(
                signup,
                &[StatusUpdate::Failed(FailureReason::UnableToCreateWorkspace)],
                err,
            )),
        }
    }

    /// Get or create the single admin binding between `account` and `workspace`.
    pub(super) fn ensure_binding(
        &self,
        signup: &mut SignupRequest,
        account: &UserAccount,
        workspace: &Workspace,
    ) -> Result<(), ReconcileError> {
        let bindings: Vec<Binding> = self
            .store
            .list(&Binding::selector(account.name(), workspace.name()))?;

        match bindings.as_slice() {
            [] => {}
            [binding] if binding.metadata.is_being_deleted() => {
                return Err(ReconcileError::BindingTerminating(binding.name().to_string()));
            }
            [_] => return Ok(()),
            _ => {
                return Err(ReconcileError::DuplicateBindings {
                    account: account.name().to_string(),
                    workspace: workspace.name().to_string(),
                });
            }
        }

        let binding = Binding::admin(account.name(), workspace.name(), signup.name());
        if let Err(err) = self.store.create(&binding) {
            return Err(self.fail(
                signup,
                &[StatusUpdate::Failed(FailureReason::UnableToCreateBinding)],
                err,
            ));
        }
        info!(record = account.name(), workspace = workspace.name(), "created binding");
        Ok(())
    }
}
