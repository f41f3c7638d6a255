//! Ban records, indexed by email hash.

use serde::{Deserialize, Serialize};

use onboard_core::{LabelSelector, ObjectMeta, Resource};

use crate::email::email_hash;
use crate::keys;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BanRecordSpec {
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BanRecord {
    pub metadata: ObjectMeta,
    pub spec: BanRecordSpec,
}

impl Resource for BanRecord {
    const KIND: &'static str = "BanRecord";

    fn meta(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn meta_mut(&mut self) -> &mut ObjectMeta {
        &mut self.metadata
    }
}

impl BanRecord {
    /// Build a ban for `email`, stamping the hash label used for lookups.
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        let email = email.into();
        Self {
            metadata: ObjectMeta::new(name).with_label(keys::EMAIL_HASH_LABEL, email_hash(&email)),
            spec: BanRecordSpec { email },
        }
    }

    pub fn selector_for_hash(hash: &str) -> LabelSelector {
        LabelSelector::new().with(keys::EMAIL_HASH_LABEL, hash)
    }

    /// Hash collisions are possible, so a ban only applies on a literal match.
    pub fn applies_to(&self, email: &str) -> bool {
        self.spec.email == email
    }
}
