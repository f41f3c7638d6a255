//! `onboard-signup`: the signup domain, resource kinds, lifecycle state
//! machine and the pure decisions the reconciler builds on.
//!
//! Nothing in here performs IO. Store access, notification delivery and
//! placement live in `onboard-infra`.

pub mod account;
pub mod ban;
pub mod capacity;
pub mod email;
pub mod keys;
pub mod notification;
pub mod request;
pub mod state;
pub mod status;
pub mod tier;
pub mod username;
pub mod workspace;

pub use account::{UserAccount, UserAccountSpec};
pub use ban::{BanRecord, BanRecordSpec};
pub use capacity::{CapacityStatus, MemberCapacity};
pub use email::{EmailDomain, email_hash, is_valid_email_hash};
pub use notification::{Notification, NotificationSpec, NotificationType};
pub use request::{ApprovalIntent, SignupIdentity, SignupRequest, SignupSpec, SignupStatus};
pub use state::SignupState;
pub use status::{ConditionType, FailureReason, StatusUpdate};
pub use tier::{SocialEvent, SocialEventSpec, UserTier, WorkspaceTier};
pub use workspace::{Binding, BindingSpec, Workspace, WorkspaceSpec, WorkspaceStatus};
