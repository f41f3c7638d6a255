//! The primary provisioned record: one user account per approved signup.

use serde::{Deserialize, Serialize};

use onboard_core::{ObjectMeta, Resource};

use crate::keys;
use crate::request::SignupRequest;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserAccountSpec {
    /// Cluster the account was placed on.
    #[serde(default)]
    pub target_cluster: String,
    #[serde(default)]
    pub tier_name: String,
    /// Propagated from the signup's email annotation.
    #[serde(default)]
    pub email: String,
}

/// The account name is the signup's compliant username.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    pub metadata: ObjectMeta,
    pub spec: UserAccountSpec,
}

impl Resource for UserAccount {
    const KIND: &'static str = "UserAccount";

    fn meta(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn meta_mut(&mut self) -> &mut ObjectMeta {
        &mut self.metadata
    }
}

impl UserAccount {
    /// Build a new account owned by `signup`.
    ///
    /// The owner label is always set; the owner reference only when the signup
    /// has been persisted.
    pub fn for_signup(
        name: impl Into<String>,
        signup: &SignupRequest,
        target_cluster: impl Into<String>,
        tier_name: impl Into<String>,
    ) -> Self {
        let mut metadata = ObjectMeta::new(name).with_label(keys::OWNER_LABEL, signup.name());
        metadata
            .owner_references
            .extend(signup.controller_reference());

        Self {
            metadata,
            spec: UserAccountSpec {
                target_cluster: target_cluster.into(),
                tier_name: tier_name.into(),
                email: signup.email().unwrap_or_default().to_string(),
            },
        }
    }

    pub fn owner(&self) -> Option<&str> {
        self.metadata.label(keys::OWNER_LABEL)
    }

    /// Fill an empty tier and resync the propagated email.
    ///
    /// Returns `true` when the account needs to be written back.
    pub fn migrate(&mut self, tier_name: &str, email: &str) -> bool {
        let mut changed = false;
        if self.spec.tier_name.is_empty() {
            self.spec.tier_name = tier_name.to_string();
            changed = true;
        }
        if self.spec.email != email {
            self.spec.email = email.to_string();
            changed = true;
        }
        changed
    }
}
