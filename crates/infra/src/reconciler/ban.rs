use tracing::info;

use onboard_core::DomainError;
use onboard_signup::{BanRecord, FailureReason, SignupRequest, StatusUpdate, is_valid_email_hash};

use super::{ReconcileError, SignupReconciler};
use crate::store::StateStore;

impl<S: StateStore> SignupReconciler<S> {
    /// Whether a ban applies to the signup's email.
    ///
    /// Bans are looked up by the indexed hash and confirmed by literal email
    /// equality. The hash label itself must match the email; a mismatch fails
    /// the attempt even when no ban was found.
    pub(super) fn is_banned(&self, signup: &mut SignupRequest) -> Result<bool, ReconcileError> {
        let identity = signup
            .identity()
            .map(|id| (id.email.to_string(), id.email_hash.to_string()));
        let (email, hash) = match identity {
            Ok(identity) => identity,
            Err(DomainError::MissingAnnotation(key)) => {
                return Err(self.fail(
                    signup,
                    &[StatusUpdate::Failed(FailureReason::MissingUserEmailAnnotation)],
                    ReconcileError::MissingEmailAnnotation(key),
                ));
            }
            Err(DomainError::MissingLabel(key)) => {
                return Err(self.fail(
                    signup,
                    &[StatusUpdate::Failed(FailureReason::MissingEmailHash)],
                    ReconcileError::MissingEmailHashLabel(key),
                ));
            }
            Err(other) => return Err(other.into()),
        };

        let bans: Vec<BanRecord> = match self.store.list(&BanRecord::selector_for_hash(&hash)) {
            Ok(bans) => bans,
            Err(err) => {
                return Err(self.fail(
                    signup,
                    &[StatusUpdate::Failed(FailureReason::FailedToReadBannedUsers)],
                    err,
                ));
            }
        };
        let banned = bans.iter().any(|ban| ban.applies_to(&email));

        if !is_valid_email_hash(&email, &hash) {
            return Err(self.fail(
                signup,
                &[StatusUpdate::Failed(FailureReason::InvalidEmailHash)],
                ReconcileError::InvalidEmailHash(hash),
            ));
        }

        if banned {
            info!("signup email is banned");
        }
        Ok(banned)
    }
}
