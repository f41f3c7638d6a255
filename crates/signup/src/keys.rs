//! Label and annotation keys shared by every component.

macro_rules! key {
    ($name:ident, $suffix:literal) => {
        pub const $name: &str = concat!("onboard.dev/", $suffix);
    };
}

// SignupRequest labels.
key!(STATE_LABEL, "state");
key!(EMAIL_HASH_LABEL, "email-hash");
key!(SOCIAL_EVENT_LABEL, "social-event");

// SignupRequest annotations.
key!(EMAIL_ANNOTATION, "user-email");
key!(LAST_TARGET_CLUSTER_ANNOTATION, "last-target-cluster");
key!(ACTIVATION_COUNTER_ANNOTATION, "activation-counter");
key!(SKIP_AUTO_CREATE_WORKSPACE_ANNOTATION, "skip-auto-create-workspace");

// UserAccount.
key!(OWNER_LABEL, "owner");

// Workspace / Binding.
key!(CREATOR_LABEL, "creator");
key!(BINDING_ACCOUNT_LABEL, "user-account");
key!(BINDING_WORKSPACE_LABEL, "workspace");

// Notification.
key!(NOTIFICATION_USERNAME_LABEL, "username");
key!(NOTIFICATION_TYPE_LABEL, "type");
