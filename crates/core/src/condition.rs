//! Status conditions: one live entry per condition type, latest write wins.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

/// A single observed condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    #[serde(rename = "type")]
    pub kind: String,
    pub status: ConditionStatus,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub message: String,
    pub last_transition_time: DateTime<Utc>,
}

impl Condition {
    pub fn new(kind: impl Into<String>, status: ConditionStatus, reason: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            status,
            reason: reason.into(),
            message: String::new(),
            last_transition_time: Utc::now(),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

/// Ordered condition list.
///
/// Order is insertion order of the first write per type; later writes replace
/// the entry in place.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Conditions(Vec<Condition>);

impl Conditions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn find(&self, kind: &str) -> Option<&Condition> {
        self.0.iter().find(|c| c.kind == kind)
    }

    pub fn is_true(&self, kind: &str) -> bool {
        self.find(kind)
            .is_some_and(|c| c.status == ConditionStatus::True)
    }

    /// Absent conditions count as "not true".
    pub fn is_not_true(&self, kind: &str) -> bool {
        !self.is_true(kind)
    }

    pub fn is_true_with_reason(&self, kind: &str, reason: &str) -> bool {
        self.find(kind)
            .is_some_and(|c| c.status == ConditionStatus::True && c.reason == reason)
    }

    /// Insert or replace the condition of the same type.
    ///
    /// Returns `false` when the stored condition already carries the same
    /// status, reason and message (nothing to persist). The transition time is
    /// only moved when the status itself changes.
    pub fn set(&mut self, condition: Condition) -> bool {
        match self.0.iter_mut().find(|c| c.kind == condition.kind) {
            Some(existing) => {
                if existing.status == condition.status
                    && existing.reason == condition.reason
                    && existing.message == condition.message
                {
                    return false;
                }
                let last_transition_time = if existing.status == condition.status {
                    existing.last_transition_time
                } else {
                    condition.last_transition_time
                };
                *existing = Condition {
                    last_transition_time,
                    ..condition
                };
                true
            }
            None => {
                self.0.push(condition);
                true
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Condition> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
