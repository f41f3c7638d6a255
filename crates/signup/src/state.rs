//! Signup lifecycle state (the `state` label).

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use onboard_core::DomainError;

/// Value of the `state` label on a signup.
///
/// # Invariants
/// - Forward progress only: `NotReady → Pending → Approved`.
/// - `Banned` and `Deactivated` are reachable from any state.
/// - Once `Banned` or `Deactivated`, the reconciler never moves the signup back to
///   `Pending`/`Approved`; a re-signup resets the label outside of this system.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SignupState {
    NotReady,
    Pending,
    Approved,
    Banned,
    Deactivated,
}

impl SignupState {
    pub fn as_str(self) -> &'static str {
        match self {
            SignupState::NotReady => "not-ready",
            SignupState::Pending => "pending",
            SignupState::Approved => "approved",
            SignupState::Banned => "banned",
            SignupState::Deactivated => "deactivated",
        }
    }

    /// Terminal states can only be left by an external re-signup.
    pub fn is_terminal(self) -> bool {
        matches!(self, SignupState::Banned | SignupState::Deactivated)
    }

    /// Whether the reconciler may move the label from `self` to `next`.
    pub fn can_transition_to(self, next: SignupState) -> bool {
        use SignupState::*;

        if self == next {
            return true;
        }
        match (self, next) {
            (_, Banned) | (_, Deactivated) => true,
            (Banned, _) | (Deactivated, _) => false,
            (NotReady, Pending) | (NotReady, Approved) | (Pending, Approved) => true,
            _ => false,
        }
    }
}

impl core::fmt::Display for SignupState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignupState {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not-ready" => Ok(SignupState::NotReady),
            "pending" => Ok(SignupState::Pending),
            "approved" => Ok(SignupState::Approved),
            "banned" => Ok(SignupState::Banned),
            "deactivated" => Ok(SignupState::Deactivated),
            other => Err(DomainError::validation(format!("unknown signup state '{other}'"))),
        }
    }
}
