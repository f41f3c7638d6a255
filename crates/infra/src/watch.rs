//! Maps watch events to the signups that must be reconciled.

use onboard_core::{LabelSelector, Resource};
use onboard_events::ResourceEvent;
use onboard_signup::{
    BanRecord, Binding, CapacityStatus, SignupRequest, SignupState, UserAccount, Workspace, keys,
};

use crate::store::{StateStore, StoreError};

/// Event-to-key mapping for the signup controller.
///
/// - `SignupRequest` → itself
/// - `UserAccount` → its `owner` label
/// - `Workspace` / `Binding` → their `creator` label
/// - `BanRecord` → every signup with the same `email-hash` label
/// - `CapacityStatus` → the oldest pending signup, only with automatic
///   approval enabled
pub struct SignupMapper<S> {
    store: S,
    automatic_approval: bool,
}

impl<S: StateStore> SignupMapper<S> {
    pub fn new(store: S, automatic_approval: bool) -> Self {
        Self {
            store,
            automatic_approval,
        }
    }

    pub fn map(&self, event: &ResourceEvent) -> Result<Vec<String>, StoreError> {
        let by_label = |key: &str| Ok(event.label(key).map(str::to_string).into_iter().collect());

        match event.kind() {
            SignupRequest::KIND => Ok(vec![event.name().to_string()]),
            UserAccount::KIND => by_label(keys::OWNER_LABEL),
            Workspace::KIND | Binding::KIND => by_label(keys::CREATOR_LABEL),
            BanRecord::KIND => match event.label(keys::EMAIL_HASH_LABEL) {
                Some(hash) => self.signups_with_hash(hash),
                None => Ok(Vec::new()),
            },
            CapacityStatus::KIND if self.automatic_approval => {
                Ok(self.oldest_pending()?.into_iter().collect())
            }
            _ => Ok(Vec::new()),
        }
    }

    fn signups_with_hash(&self, hash: &str) -> Result<Vec<String>, StoreError> {
        let signups: Vec<SignupRequest> = self
            .store
            .list(&LabelSelector::new().with(keys::EMAIL_HASH_LABEL, hash))?;
        Ok(signups.into_iter().map(|s| s.metadata.name).collect())
    }

    fn oldest_pending(&self) -> Result<Option<String>, StoreError> {
        let pending: Vec<SignupRequest> = self
            .store
            .list(&LabelSelector::new().with(keys::STATE_LABEL, SignupState::Pending.as_str()))?;
        Ok(pending
            .into_iter()
            .min_by_key(|s| (s.metadata.creation_timestamp, s.metadata.uid))
            .map(|s| s.metadata.name))
    }
}
