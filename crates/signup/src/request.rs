//! The signup request: tenant onboarding intent tracked through its lifecycle.

use serde::{Deserialize, Serialize};

use onboard_core::{Conditions, DomainResult, ObjectMeta, Resource};

use crate::keys;
use crate::state::SignupState;

/// How the signup is meant to be approved.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApprovalIntent {
    /// An administrator approved the signup explicitly.
    Manual,
    /// Approval is left to the automatic approval policy.
    Automatic,
}

/// Desired state as submitted by the registration front-end (or an admin).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SignupSpec {
    /// Username as requested by the user; not necessarily name-legal.
    pub username: String,
    #[serde(default)]
    pub given_name: Option<String>,
    #[serde(default)]
    pub family_name: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    /// Set by an administrator to approve the signup manually.
    #[serde(default)]
    pub approved: bool,
    #[serde(default)]
    pub verification_required: bool,
    /// The account is inside its pre-deactivation grace period.
    #[serde(default)]
    pub deactivating: bool,
    #[serde(default)]
    pub deactivated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SignupStatus {
    #[serde(default)]
    pub conditions: Conditions,
    /// Name of the provisioned user account once provisioning completed.
    #[serde(default)]
    pub compliant_username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignupRequest {
    pub metadata: ObjectMeta,
    pub spec: SignupSpec,
    #[serde(default)]
    pub status: SignupStatus,
}

impl Resource for SignupRequest {
    const KIND: &'static str = "SignupRequest";

    fn meta(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn meta_mut(&mut self) -> &mut ObjectMeta {
        &mut self.metadata
    }
}

/// Validated identity metadata required before ban status can be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignupIdentity<'a> {
    pub email: &'a str,
    pub email_hash: &'a str,
}

impl SignupRequest {
    pub fn new(name: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            metadata: ObjectMeta::new(name),
            spec: SignupSpec {
                username: username.into(),
                ..Default::default()
            },
            status: SignupStatus::default(),
        }
    }

    /// Read the email annotation and hash label, failing fast on the first
    /// missing key (annotation first).
    pub fn identity(&self) -> DomainResult<SignupIdentity<'_>> {
        let email = self.metadata.require_annotation(keys::EMAIL_ANNOTATION)?;
        let email_hash = self.metadata.require_label(keys::EMAIL_HASH_LABEL)?;
        Ok(SignupIdentity { email, email_hash })
    }

    pub fn email(&self) -> Option<&str> {
        self.metadata.annotation(keys::EMAIL_ANNOTATION)
    }

    /// Current `state` label; `None` when absent or unparseable.
    pub fn state(&self) -> Option<SignupState> {
        self.metadata
            .label(keys::STATE_LABEL)
            .and_then(|s| s.parse().ok())
    }

    pub fn set_state(&mut self, state: SignupState) {
        self.metadata.set_label(keys::STATE_LABEL, state.as_str());
    }

    pub fn social_event(&self) -> Option<&str> {
        self.metadata.label(keys::SOCIAL_EVENT_LABEL)
    }

    pub fn last_target_cluster(&self) -> Option<&str> {
        self.metadata
            .annotation(keys::LAST_TARGET_CLUSTER_ANNOTATION)
            .filter(|c| !c.is_empty())
    }

    pub fn set_last_target_cluster(&mut self, cluster: &str) {
        self.metadata
            .set_annotation(keys::LAST_TARGET_CLUSTER_ANNOTATION, cluster);
    }

    /// Workspace management is on unless explicitly opted out.
    pub fn manages_workspace(&self) -> bool {
        self.metadata
            .annotation(keys::SKIP_AUTO_CREATE_WORKSPACE_ANNOTATION)
            != Some("true")
    }

    pub fn approval_intent(&self) -> ApprovalIntent {
        if self.spec.approved {
            ApprovalIntent::Manual
        } else {
            ApprovalIntent::Automatic
        }
    }

    pub fn is_deactivating(&self) -> bool {
        self.spec.deactivating
    }

    pub fn is_deactivated(&self) -> bool {
        self.spec.deactivated
    }

    pub fn requires_verification(&self) -> bool {
        self.spec.verification_required
    }

    /// Increment the activation counter annotation.
    ///
    /// A missing annotation starts at 1; a non-integer value is reset to 1 and
    /// reported through the second tuple element.
    pub fn bump_activation_counter(&mut self) -> (u32, bool) {
        let (next, corrupted) = match self.metadata.annotation(keys::ACTIVATION_COUNTER_ANNOTATION) {
            None => (1, false),
            Some(raw) => match raw.parse::<u32>() {
                Ok(current) => (current.saturating_add(1), false),
                Err(_) => (1, true),
            },
        };
        self.metadata
            .set_annotation(keys::ACTIVATION_COUNTER_ANNOTATION, next.to_string());
        (next, corrupted)
    }
}
