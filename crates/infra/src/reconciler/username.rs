use tracing::debug;

use onboard_signup::username::{self, MAX_ATTEMPTS};
use onboard_signup::{SignupRequest, UserAccount};

use super::{ReconcileError, SignupReconciler};
use crate::store::StateStore;

impl<S: StateStore> SignupReconciler<S> {
    /// Derive a compliant, unused account name for the signup.
    pub(super) fn allocate_username(&self, signup: &SignupRequest) -> Result<String, ReconcileError> {
        let base = username::compliant_base(
            &signup.spec.username,
            &self.config.forbidden_username_prefixes,
            &self.config.forbidden_username_suffixes,
        )
        .map_err(|err| ReconcileError::InvalidUsername(err.to_string()))?;

        probe_username(&self.store, &base, &signup.metadata.name).map_err(|err| match err {
            ReconcileError::UsernameExhausted { attempts, .. } => ReconcileError::UsernameExhausted {
                requested: signup.spec.username.clone(),
                attempts,
            },
            other => other,
        })
    }
}

/// Probe `base`, `base-2`, … for a name with no user account.
///
/// Candidates the suffix pushes past the name grammar are skipped; they still
/// count towards the attempt limit.
///
/// An account with that name owned by `owner` means this signup was already
/// provisioned; the caller should not create another one.
pub fn probe_username<S: StateStore>(
    store: &S,
    base: &str,
    owner: &str,
) -> Result<String, ReconcileError> {
    for candidate in username::candidates(base) {
        if username::validate(&candidate).is_err() {
            debug!(candidate = %candidate, "username candidate is not a legal name");
            continue;
        }
        match store.find::<UserAccount>(&candidate)? {
            None => return Ok(candidate),
            Some(existing) if existing.owner() == Some(owner) => {
                return Err(ReconcileError::UsernameOwnedBySignup {
                    username: candidate,
                    signup: owner.to_string(),
                });
            }
            Some(_) => debug!(candidate = %candidate, "username taken"),
        }
    }

    Err(ReconcileError::UsernameExhausted {
        requested: base.to_string(),
        attempts: MAX_ATTEMPTS,
    })
}
