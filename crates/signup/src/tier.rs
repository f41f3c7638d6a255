//! Tier descriptors and social events. Read-only to the reconciler.

use serde::{Deserialize, Serialize};

use onboard_core::{ObjectMeta, Resource};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserTier {
    pub metadata: ObjectMeta,
    /// Days before an account on this tier is deactivated; `0` disables it.
    #[serde(default)]
    pub deactivation_timeout_days: u32,
}

impl Resource for UserTier {
    const KIND: &'static str = "UserTier";

    fn meta(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn meta_mut(&mut self) -> &mut ObjectMeta {
        &mut self.metadata
    }
}

impl UserTier {
    pub fn new(name: impl Into<String>, deactivation_timeout_days: u32) -> Self {
        Self {
            metadata: ObjectMeta::new(name),
            deactivation_timeout_days,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceTier {
    pub metadata: ObjectMeta,
}

impl Resource for WorkspaceTier {
    const KIND: &'static str = "WorkspaceTier";

    fn meta(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn meta_mut(&mut self) -> &mut ObjectMeta {
        &mut self.metadata
    }
}

impl WorkspaceTier {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            metadata: ObjectMeta::new(name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SocialEventSpec {
    pub user_tier: String,
    pub workspace_tier: String,
    /// Preferred cluster for attendees, if the event pins one.
    #[serde(default)]
    pub target_cluster: Option<String>,
}

/// An event whose attendees get overridden tiers (and maybe a pinned cluster).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialEvent {
    pub metadata: ObjectMeta,
    pub spec: SocialEventSpec,
}

impl Resource for SocialEvent {
    const KIND: &'static str = "SocialEvent";

    fn meta(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn meta_mut(&mut self) -> &mut ObjectMeta {
        &mut self.metadata
    }
}

impl SocialEvent {
    pub fn new(name: impl Into<String>, spec: SocialEventSpec) -> Self {
        Self {
            metadata: ObjectMeta::new(name),
            spec,
        }
    }
}
