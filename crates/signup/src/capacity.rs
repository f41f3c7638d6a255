//! Cluster capacity snapshot used for placement.

use serde::{Deserialize, Serialize};

use onboard_core::{ObjectMeta, Resource};

/// Well-known name of the single capacity status object.
pub const CAPACITY_STATUS_NAME: &str = "capacity";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberCapacity {
    pub cluster: String,
    pub users: u32,
    /// `0` means the member does not accept new users.
    pub max_users: u32,
}

impl MemberCapacity {
    pub fn has_room(&self) -> bool {
        self.users < self.max_users
    }

    /// Remaining slots; used to rank candidates.
    pub fn free(&self) -> u32 {
        self.max_users.saturating_sub(self.users)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityStatus {
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub members: Vec<MemberCapacity>,
}

impl Resource for CapacityStatus {
    const KIND: &'static str = "CapacityStatus";

    fn meta(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn meta_mut(&mut self) -> &mut ObjectMeta {
        &mut self.metadata
    }
}

impl CapacityStatus {
    pub fn new(members: Vec<MemberCapacity>) -> Self {
        Self {
            metadata: ObjectMeta::new(CAPACITY_STATUS_NAME),
            members,
        }
    }

    pub fn member(&self, cluster: &str) -> Option<&MemberCapacity> {
        self.members.iter().find(|m| m.cluster == cluster)
    }

    /// The member with the most free slots; ties go to the first listed.
    pub fn best_member(&self) -> Option<&MemberCapacity> {
        self.members
            .iter()
            .filter(|m| m.has_room())
            .fold(None, |best: Option<&MemberCapacity>, m| match best {
                Some(b) if b.free() >= m.free() => Some(b),
                _ => Some(m),
            })
    }
}
