//! Workspace and binding records created alongside a user account.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use onboard_core::{Conditions, LabelSelector, ObjectMeta, Resource};

use crate::account::UserAccount;
use crate::keys;

pub const READY_CONDITION: &str = "Ready";
pub const PROVISIONED_REASON: &str = "Provisioned";
pub const ADMIN_ROLE: &str = "admin";

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WorkspaceSpec {
    pub target_cluster: String,
    pub tier_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WorkspaceStatus {
    #[serde(default)]
    pub conditions: Conditions,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    pub metadata: ObjectMeta,
    pub spec: WorkspaceSpec,
    #[serde(default)]
    pub status: WorkspaceStatus,
}

impl Resource for Workspace {
    const KIND: &'static str = "Workspace";

    fn meta(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn meta_mut(&mut self) -> &mut ObjectMeta {
        &mut self.metadata
    }
}

impl Workspace {
    /// Workspace named after the account, labelled with the creating signup.
    pub fn for_account(account: &UserAccount, creator: &str, tier_name: &str) -> Self {
        Self {
            metadata: ObjectMeta::new(account.name()).with_label(keys::CREATOR_LABEL, creator),
            spec: WorkspaceSpec {
                target_cluster: account.spec.target_cluster.clone(),
                tier_name: tier_name.to_string(),
            },
            status: WorkspaceStatus::default(),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.status
            .conditions
            .is_true_with_reason(READY_CONDITION, PROVISIONED_REASON)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingSpec {
    pub user_account: String,
    pub workspace: String,
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binding {
    pub metadata: ObjectMeta,
    pub spec: BindingSpec,
}

impl Resource for Binding {
    const KIND: &'static str = "Binding";

    fn meta(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn meta_mut(&mut self) -> &mut ObjectMeta {
        &mut self.metadata
    }
}

impl Binding {
    /// Admin binding of `account` to `workspace`, named `<workspace>-<random>`.
    pub fn admin(account: &str, workspace: &str, creator: &str) -> Self {
        let suffix = Uuid::new_v4().simple().to_string();
        let metadata = ObjectMeta::new(format!("{workspace}-{}", &suffix[..5]))
            .with_label(keys::BINDING_ACCOUNT_LABEL, account)
            .with_label(keys::BINDING_WORKSPACE_LABEL, workspace)
            .with_label(keys::CREATOR_LABEL, creator);

        Self {
            metadata,
            spec: BindingSpec {
                user_account: account.to_string(),
                workspace: workspace.to_string(),
                role: ADMIN_ROLE.to_string(),
            },
        }
    }

    /// Selector matching every binding of `account` to `workspace`.
    pub fn selector(account: &str, workspace: &str) -> LabelSelector {
        LabelSelector::new()
            .with(keys::BINDING_ACCOUNT_LABEL, account)
            .with(keys::BINDING_WORKSPACE_LABEL, workspace)
    }
}
