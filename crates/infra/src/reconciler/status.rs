//! Status, state label and metrics persistence.

use tracing::{debug, error, warn};

use onboard_observability::Metric;
use onboard_signup::{FailureReason, SignupRequest, SignupState, StatusUpdate, keys};

use super::{ReconcileError, SignupReconciler};
use crate::store::StateStore;

impl<S: StateStore> SignupReconciler<S> {
    /// Apply `updates` to the signup status and persist it if anything
    /// changed. `signup` is refreshed with the stored version.
    pub(super) fn update_status(
        &self,
        signup: &mut SignupRequest,
        updates: &[StatusUpdate],
    ) -> Result<(), ReconcileError> {
        let mut changed = false;
        for update in updates {
            changed |= update.apply(&mut signup.status, None);
        }
        if !changed {
            return Ok(());
        }
        *signup = self.store.update(signup)?;
        Ok(())
    }

    /// Record `err` on the signup status (best effort) and hand it back.
    ///
    /// A failure to write the status is logged; the original error is what
    /// the caller sees.
    pub(super) fn fail(
        &self,
        signup: &mut SignupRequest,
        updates: &[StatusUpdate],
        err: impl Into<ReconcileError>,
    ) -> ReconcileError {
        let err = err.into();
        let message = err.to_string();

        let mut changed = false;
        for update in updates {
            changed |= update.apply(&mut signup.status, Some(&message));
        }
        if changed {
            match self.store.update(signup) {
                Ok(stored) => *signup = stored,
                Err(status_err) => {
                    error!(error = %status_err, original = %message, "failed to record failure status")
                }
            }
        }
        err
    }

    /// Move the `state` label to `state`.
    ///
    /// Transitions out of `banned`/`deactivated`, and backwards along
    /// `not-ready → pending → approved`, are refused. Writing `approved`
    /// bumps the activation counter. Counters are only updated once the
    /// label write succeeded.
    pub(super) fn set_state_label(
        &self,
        signup: &mut SignupRequest,
        state: SignupState,
    ) -> Result<(), ReconcileError> {
        let raw_old = signup
            .metadata
            .label(keys::STATE_LABEL)
            .unwrap_or_default()
            .to_string();
        let old = signup.state();
        if old == Some(state) {
            return Ok(());
        }
        if let Some(from) = old {
            if !from.can_transition_to(state) {
                let err = ReconcileError::IllegalStateTransition { from, to: state };
                return Err(self.fail(
                    signup,
                    &[StatusUpdate::Failed(FailureReason::FailedToUpdateStateLabel)],
                    err,
                ));
            }
        }

        let previous_meta = signup.metadata.clone();
        signup.set_state(state);
        let activations = if state == SignupState::Approved {
            let (activations, reset) = signup.bump_activation_counter();
            if reset {
                warn!(
                    "activation counter annotation was not an integer and was reset to 1"
                );
            }
            Some(activations)
        } else {
            None
        };

        match self.store.update(signup) {
            Ok(stored) => *signup = stored,
            Err(err) => {
                signup.metadata = previous_meta;
                return Err(self.fail(
                    signup,
                    &[StatusUpdate::Failed(FailureReason::FailedToUpdateStateLabel)],
                    err,
                ));
            }
        }
        debug!(from = %raw_old, to = %state, "state label updated");

        self.record_state_metrics(signup, &raw_old, old, state, activations);
        Ok(())
    }

    fn record_state_metrics(
        &self,
        signup: &SignupRequest,
        raw_old: &str,
        old: Option<SignupState>,
        new: SignupState,
        activations: Option<u32>,
    ) {
        if raw_old.is_empty() {
            self.metrics.increment(Metric::SignupUniqueTotal, None);
        }
        match new {
            SignupState::Approved => self.metrics.increment(Metric::SignupApprovedTotal, None),
            SignupState::Deactivated if old == Some(SignupState::Approved) => {
                self.metrics.increment(Metric::SignupDeactivatedTotal, None)
            }
            SignupState::Banned => self.metrics.increment(Metric::SignupBannedTotal, None),
            _ => {}
        }
        if let Some(activations) = activations {
            self.metrics.increment(
                Metric::UsersPerActivation { activations },
                Some(self.email_domain(signup)),
            );
        }
    }
}
