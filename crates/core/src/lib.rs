//! `onboard-core`: foundation building blocks shared across the workspace.
//!
//! This crate contains **pure** primitives (no infrastructure concerns): object
//! metadata, the `Resource` contract every stored kind implements, label
//! selectors and status conditions.

pub mod condition;
pub mod error;
pub mod meta;
pub mod resource;

pub use condition::{Condition, ConditionStatus, Conditions};
pub use error::{DomainError, DomainResult};
pub use meta::{LabelSelector, ObjectMeta, ObjectUid, OwnerReference};
pub use resource::Resource;
