//! Integration tests for the signup controller.
//!
//! Tests: SignupRequest → SignupReconciler → StateStore (→ EventBus → ControllerWorker)
//!
//! Verifies:
//! - The full provisioning path converges and a converged signup causes no writes
//! - Bans win over every other state and remove the account
//! - Identity metadata is validated before anything else happens
//! - Notifications are sent at most once per (username, type)
//! - Store failures are recorded on the signup status and surfaced to the caller

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::thread;
    use std::time::{Duration, Instant};

    use chrono::Utc;

    use onboard_core::{Condition, ConditionStatus, LabelSelector, Resource};
    use onboard_events::{InMemoryEventBus, ResourceEvent};
    use onboard_observability::{InMemoryMetrics, Metric};
    use onboard_signup::workspace::{PROVISIONED_REASON, READY_CONDITION};
    use onboard_signup::{
        BanRecord, Binding, CapacityStatus, ConditionType, MemberCapacity, Notification,
        NotificationType, SignupRequest, SignupState, SocialEvent, SocialEventSpec, UserAccount,
        UserTier, Workspace, WorkspaceTier, email_hash, keys,
    };

    use crate::config::OnboardingConfig;
    use crate::external::{
        CapacityPlacement, NotificationRequest, NotificationSender, StoreNotificationSender,
    };
    use crate::reconciler::{ReconcileError, SignupReconciler};
    use crate::store::{InMemoryStateStore, PublishingStateStore, StateStore, StoreError};
    use crate::watch::SignupMapper;
    use crate::workers::ControllerWorker;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Op {
        Create,
        Update,
        Delete,
    }

    /// In-memory store that counts successful writes and fails on demand.
    struct FaultyStore {
        inner: InMemoryStateStore,
        writes: AtomicUsize,
        faults: Mutex<Vec<(Op, &'static str)>>,
    }

    impl FaultyStore {
        fn new() -> Self {
            Self {
                inner: InMemoryStateStore::new(),
                writes: AtomicUsize::new(0),
                faults: Mutex::new(Vec::new()),
            }
        }

        fn fail(&self, op: Op, kind: &'static str) {
            self.faults.lock().unwrap().push((op, kind));
        }

        fn heal(&self) {
            self.faults.lock().unwrap().clear();
        }

        fn writes(&self) -> usize {
            self.writes.load(Ordering::SeqCst)
        }

        fn check<R: Resource>(&self, op: Op) -> Result<(), StoreError> {
            if self.faults.lock().unwrap().contains(&(op, R::KIND)) {
                return Err(StoreError::Unavailable(format!("injected {op:?} fault on {}", R::KIND)));
            }
            Ok(())
        }

        fn written<T>(&self, result: Result<T, StoreError>) -> Result<T, StoreError> {
            if result.is_ok() {
                self.writes.fetch_add(1, Ordering::SeqCst);
            }
            result
        }
    }

    impl StateStore for FaultyStore {
        fn get<R: Resource>(&self, name: &str) -> Result<R, StoreError> {
            self.inner.get(name)
        }

        fn list<R: Resource>(&self, selector: &LabelSelector) -> Result<Vec<R>, StoreError> {
            self.inner.list(selector)
        }

        fn create<R: Resource>(&self, resource: &R) -> Result<R, StoreError> {
            self.check::<R>(Op::Create)?;
            self.written(self.inner.create(resource))
        }

        fn update<R: Resource>(&self, resource: &R) -> Result<R, StoreError> {
            self.check::<R>(Op::Update)?;
            self.written(self.inner.update(resource))
        }

        fn delete<R: Resource>(&self, name: &str) -> Result<(), StoreError> {
            self.check::<R>(Op::Delete)?;
            self.written(self.inner.delete::<R>(name))
        }
    }

    struct Harness {
        store: Arc<FaultyStore>,
        metrics: Arc<InMemoryMetrics>,
        reconciler: SignupReconciler<Arc<FaultyStore>>,
    }

    impl Harness {
        fn submit(&self, signup: SignupRequest) -> SignupRequest {
            self.store.create(&signup).unwrap()
        }

        fn reconcile(&self, name: &str) -> Result<(), ReconcileError> {
            self.reconciler.reconcile(name)
        }

        fn signup(&self, name: &str) -> SignupRequest {
            self.store.get(name).unwrap()
        }

        fn edit(&self, name: &str, f: impl FnOnce(&mut SignupRequest)) {
            let mut signup = self.signup(name);
            f(&mut signup);
            self.store.update(&signup).unwrap();
        }

        fn accounts(&self) -> Vec<UserAccount> {
            self.store.list(&LabelSelector::new()).unwrap()
        }

        fn set_capacity(&self, users: u32) {
            let mut capacity: CapacityStatus = self.store.get("capacity").unwrap();
            for member in &mut capacity.members {
                member.users = users.min(member.max_users);
            }
            self.store.update(&capacity).unwrap();
        }

        fn mark_workspace_ready(&self, name: &str) {
            let mut workspace: Workspace = self.store.get(name).unwrap();
            workspace.status.conditions.set(Condition::new(
                READY_CONDITION,
                ConditionStatus::True,
                PROVISIONED_REASON,
            ));
            self.store.update(&workspace).unwrap();
        }
    }

    fn capacity(members: &[(&str, u32, u32)]) -> CapacityStatus {
        CapacityStatus::new(
            members
                .iter()
                .map(|(cluster, users, max_users)| MemberCapacity {
                    cluster: cluster.to_string(),
                    users: *users,
                    max_users: *max_users,
                })
                .collect(),
        )
    }

    fn harness(automatic_approval: bool) -> Harness {
        let store = Arc::new(FaultyStore::new());
        store.create(&UserTier::new("deactivate30", 30)).unwrap();
        store.create(&WorkspaceTier::new("base")).unwrap();
        store
            .create(&capacity(&[("member-1", 0, 10), ("member-2", 0, 5)]))
            .unwrap();

        let config = Arc::new(OnboardingConfig {
            automatic_approval,
            internal_email_domains: vec!["redhat.com".to_string()],
            ..Default::default()
        });
        let metrics = Arc::new(InMemoryMetrics::new());
        let reconciler = SignupReconciler::new(
            store.clone(),
            config,
            Arc::new(CapacityPlacement::new(store.clone(), automatic_approval)),
            Arc::new(StoreNotificationSender::new(store.clone())),
            metrics.clone(),
        );

        Harness {
            store,
            metrics,
            reconciler,
        }
    }

    fn new_signup(name: &str, username: &str, email: &str) -> SignupRequest {
        let mut signup = SignupRequest::new(name, username);
        signup.metadata.set_annotation(keys::EMAIL_ANNOTATION, email);
        signup.metadata.set_label(keys::EMAIL_HASH_LABEL, email_hash(email));
        signup
    }

    fn approved_signup(name: &str, username: &str, email: &str) -> SignupRequest {
        let mut signup = new_signup(name, username, email);
        signup.spec.approved = true;
        signup
    }

    fn condition(signup: &SignupRequest, kind: ConditionType) -> (ConditionStatus, String, String) {
        let c = signup
            .status
            .conditions
            .find(kind.as_str())
            .unwrap_or_else(|| panic!("condition {} not set", kind.as_str()));
        (c.status, c.reason.clone(), c.message.clone())
    }

    fn complete_reason(signup: &SignupRequest) -> (ConditionStatus, String) {
        let (status, reason, _) = condition(signup, ConditionType::Complete);
        (status, reason)
    }

    /// Approve and provision a signup that opted out of workspace creation.
    fn provision_without_workspace(h: &Harness, name: &str, username: &str, email: &str) {
        let mut signup = approved_signup(name, username, email);
        signup
            .metadata
            .set_annotation(keys::SKIP_AUTO_CREATE_WORKSPACE_ANNOTATION, "true");
        h.submit(signup);
        h.reconcile(name).unwrap();
        h.reconcile(name).unwrap();
        assert_eq!(complete_reason(&h.signup(name)).0, ConditionStatus::True);
    }

    #[test]
    fn approved_signup_is_provisioned_end_to_end() {
        let h = harness(false);
        h.submit(approved_signup("john-signup", "john", "john@redhat.com"));

        // Account.
        h.reconcile("john-signup").unwrap();
        let account: UserAccount = h.store.get("john").unwrap();
        assert_eq!(account.spec.target_cluster, "member-1");
        assert_eq!(account.spec.tier_name, "deactivate30");
        assert_eq!(account.spec.email, "john@redhat.com");
        assert_eq!(account.owner(), Some("john-signup"));
        assert_eq!(account.metadata.owner_references[0].name, "john-signup");

        let signup = h.signup("john-signup");
        assert_eq!(signup.state(), Some(SignupState::Approved));
        assert_eq!(signup.last_target_cluster(), Some("member-1"));
        assert_eq!(
            signup.metadata.annotation(keys::ACTIVATION_COUNTER_ANNOTATION),
            Some("1")
        );
        let (status, reason, _) = condition(&signup, ConditionType::Approved);
        assert_eq!((status, reason.as_str()), (ConditionStatus::True, "ApprovedByAdmin"));

        // Workspace.
        h.reconcile("john-signup").unwrap();
        let workspace: Workspace = h.store.get("john").unwrap();
        assert_eq!(workspace.spec.tier_name, "base");
        assert_eq!(workspace.spec.target_cluster, "member-1");
        assert_eq!(workspace.metadata.label(keys::CREATOR_LABEL), Some("john-signup"));

        // Binding; the workspace is not ready yet.
        h.reconcile("john-signup").unwrap();
        let bindings: Vec<Binding> = h.store.list(&Binding::selector("john", "john")).unwrap();
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings[0].spec.role, "admin");
        let (status, reason, message) = condition(&h.signup("john-signup"), ConditionType::Complete);
        assert_eq!(status, ConditionStatus::False);
        assert_eq!(reason, "Provisioning");
        assert_eq!(message, "workspace john was not ready");

        h.mark_workspace_ready("john");
        h.reconcile("john-signup").unwrap();

        let signup = h.signup("john-signup");
        assert_eq!(complete_reason(&signup).0, ConditionStatus::True);
        assert_eq!(signup.status.compliant_username, "john");
    }

    #[test]
    fn converged_signup_causes_no_writes() {
        let h = harness(false);
        h.submit(approved_signup("john-signup", "john", "john@redhat.com"));
        h.reconcile("john-signup").unwrap();
        h.reconcile("john-signup").unwrap();
        h.reconcile("john-signup").unwrap();
        h.mark_workspace_ready("john");
        h.reconcile("john-signup").unwrap();

        let writes = h.store.writes();
        let version = h.signup("john-signup").metadata.resource_version;
        h.reconcile("john-signup").unwrap();
        h.reconcile("john-signup").unwrap();

        assert_eq!(h.store.writes(), writes);
        assert_eq!(h.signup("john-signup").metadata.resource_version, version);
        assert_eq!(h.accounts().len(), 1);
    }

    #[test]
    fn opted_out_signup_completes_without_workspace() {
        let h = harness(false);
        provision_without_workspace(&h, "john-signup", "john", "john@redhat.com");

        let workspaces: Vec<Workspace> = h.store.list(&LabelSelector::new()).unwrap();
        assert!(workspaces.is_empty());
        assert_eq!(h.signup("john-signup").status.compliant_username, "john");
    }

    #[test]
    fn missing_or_terminating_signup_is_a_no_op() {
        let h = harness(false);
        h.reconcile("nobody").unwrap();

        let mut signup = approved_signup("john-signup", "john", "john@redhat.com");
        signup.metadata.deletion_timestamp = Some(Utc::now());
        h.submit(signup);
        let writes = h.store.writes();

        h.reconcile("john-signup").unwrap();
        assert_eq!(h.store.writes(), writes);
        assert!(h.signup("john-signup").state().is_none());
    }

    #[test]
    fn unapproved_signup_waits_for_approval() {
        let h = harness(false);
        h.submit(new_signup("john-signup", "john", "john@redhat.com"));

        h.reconcile("john-signup").unwrap();

        let signup = h.signup("john-signup");
        assert_eq!(signup.state(), Some(SignupState::Pending));
        let (status, reason, _) = condition(&signup, ConditionType::Approved);
        assert_eq!((status, reason.as_str()), (ConditionStatus::False, "PendingApproval"));
        assert_eq!(
            complete_reason(&signup),
            (ConditionStatus::False, "PendingApproval".to_string())
        );
        assert!(h.accounts().is_empty());

        let writes = h.store.writes();
        h.reconcile("john-signup").unwrap();
        assert_eq!(h.store.writes(), writes);
    }

    #[test]
    fn automatic_approval_provisions_without_admin() {
        let h = harness(true);
        h.submit(new_signup("john-signup", "john", "john@redhat.com"));

        h.reconcile("john-signup").unwrap();

        let signup = h.signup("john-signup");
        let (status, reason, _) = condition(&signup, ConditionType::Approved);
        assert_eq!((status, reason.as_str()), (ConditionStatus::True, "ApprovedAutomatically"));
        assert_eq!(h.accounts().len(), 1);
    }

    #[test]
    fn automatic_approval_without_capacity_stays_pending_quietly() {
        let h = harness(true);
        h.set_capacity(u32::MAX);
        h.submit(new_signup("john-signup", "john", "john@redhat.com"));

        h.reconcile("john-signup").unwrap();

        let signup = h.signup("john-signup");
        assert_eq!(signup.state(), Some(SignupState::Pending));
        assert_eq!(
            complete_reason(&signup),
            (ConditionStatus::False, "NoClusterAvailable".to_string())
        );
        assert!(h.accounts().is_empty());
    }

    #[test]
    fn manual_approval_without_capacity_is_retried_until_capacity_frees_up() {
        let h = harness(false);
        h.set_capacity(u32::MAX);
        h.submit(approved_signup("john-signup", "john", "john@redhat.com"));

        let err = h.reconcile("john-signup").unwrap_err();
        assert!(matches!(err, ReconcileError::NoCapacity));
        assert!(err.is_transient());

        let signup = h.signup("john-signup");
        assert_eq!(signup.state(), Some(SignupState::Pending));
        let (status, reason, _) = condition(&signup, ConditionType::Approved);
        assert_eq!((status, reason.as_str()), (ConditionStatus::True, "ApprovedByAdmin"));
        let (status, reason, message) = condition(&signup, ConditionType::Complete);
        assert_eq!((status, reason.as_str()), (ConditionStatus::False, "NoClusterAvailable"));
        assert!(message.contains("capacity was reached"));

        h.set_capacity(0);
        h.reconcile("john-signup").unwrap();
        assert_eq!(h.signup("john-signup").state(), Some(SignupState::Approved));
        assert_eq!(h.accounts().len(), 1);
    }

    #[test]
    fn last_target_cluster_is_reused_without_consulting_capacity() {
        let h = harness(false);
        h.store.delete::<CapacityStatus>("capacity").unwrap();
        let mut signup = approved_signup("john-signup", "john", "john@redhat.com");
        signup.set_last_target_cluster("member-2");
        h.submit(signup);

        h.reconcile("john-signup").unwrap();

        let account: UserAccount = h.store.get("john").unwrap();
        assert_eq!(account.spec.target_cluster, "member-2");
    }

    #[test]
    fn unknown_capacity_is_recorded_and_retried() {
        let h = harness(false);
        h.store.delete::<CapacityStatus>("capacity").unwrap();
        h.submit(approved_signup("john-signup", "john", "john@redhat.com"));

        let err = h.reconcile("john-signup").unwrap_err();
        assert!(matches!(err, ReconcileError::Placement(_)));
        assert!(err.is_transient());
        assert_eq!(
            complete_reason(&h.signup("john-signup")),
            (ConditionStatus::False, "NoClusterAvailable".to_string())
        );
    }

    #[test]
    fn approved_state_never_falls_back_to_pending() {
        let h = harness(false);
        let mut signup = new_signup("john-signup", "john", "john@redhat.com");
        signup.set_state(SignupState::Approved);
        h.submit(signup);

        let err = h.reconcile("john-signup").unwrap_err();
        assert!(matches!(
            err,
            ReconcileError::IllegalStateTransition {
                from: SignupState::Approved,
                to: SignupState::Pending
            }
        ));

        let signup = h.signup("john-signup");
        assert_eq!(signup.state(), Some(SignupState::Approved));
        assert_eq!(
            complete_reason(&signup),
            (ConditionStatus::False, "FailedToUpdateStateLabel".to_string())
        );
    }

    #[test]
    fn verification_blocks_provisioning() {
        let h = harness(true);
        let mut signup = approved_signup("john-signup", "john", "john@redhat.com");
        signup.spec.verification_required = true;
        h.submit(signup);

        h.reconcile("john-signup").unwrap();

        let signup = h.signup("john-signup");
        assert_eq!(signup.state(), Some(SignupState::NotReady));
        assert_eq!(
            complete_reason(&signup),
            (ConditionStatus::False, "VerificationRequired".to_string())
        );
        assert!(h.accounts().is_empty());
    }

    #[test]
    fn missing_email_annotation_fails_fast() {
        let h = harness(false);
        let mut signup = SignupRequest::new("john-signup", "john");
        signup.spec.approved = true;
        signup
            .metadata
            .set_label(keys::EMAIL_HASH_LABEL, email_hash("john@redhat.com"));
        h.submit(signup);

        let err = h.reconcile("john-signup").unwrap_err();
        assert!(matches!(err, ReconcileError::MissingEmailAnnotation(_)));
        assert!(!err.is_transient());
        assert_eq!(
            complete_reason(&h.signup("john-signup")),
            (ConditionStatus::False, "MissingUserEmailAnnotation".to_string())
        );
        assert!(h.accounts().is_empty());
    }

    #[test]
    fn missing_email_hash_label_fails_fast() {
        let h = harness(false);
        let mut signup = SignupRequest::new("john-signup", "john");
        signup
            .metadata
            .set_annotation(keys::EMAIL_ANNOTATION, "john@redhat.com");
        h.submit(signup);

        let err = h.reconcile("john-signup").unwrap_err();
        assert!(matches!(err, ReconcileError::MissingEmailHashLabel(_)));
        assert_eq!(
            complete_reason(&h.signup("john-signup")),
            (ConditionStatus::False, "MissingEmailHash".to_string())
        );
    }

    #[test]
    fn mismatched_email_hash_is_rejected() {
        let h = harness(false);
        let mut signup = approved_signup("john-signup", "john", "john@redhat.com");
        signup
            .metadata
            .set_label(keys::EMAIL_HASH_LABEL, email_hash("jane@redhat.com"));
        h.submit(signup);

        let err = h.reconcile("john-signup").unwrap_err();
        assert!(matches!(err, ReconcileError::InvalidEmailHash(_)));
        assert_eq!(
            complete_reason(&h.signup("john-signup")),
            (ConditionStatus::False, "InvalidEmailHash".to_string())
        );
        assert!(h.accounts().is_empty());
    }

    #[test]
    fn ban_removes_the_account_then_settles_on_banned() {
        let h = harness(false);
        provision_without_workspace(&h, "john-signup", "john", "john@redhat.com");
        h.store
            .create(&BanRecord::new("ban-john", "john@redhat.com"))
            .unwrap();

        h.reconcile("john-signup").unwrap();
        let signup = h.signup("john-signup");
        assert!(h.accounts().is_empty());
        assert_eq!(signup.state(), Some(SignupState::Banned));
        assert_eq!(complete_reason(&signup), (ConditionStatus::False, "Banning".to_string()));

        h.reconcile("john-signup").unwrap();
        let signup = h.signup("john-signup");
        assert_eq!(complete_reason(&signup), (ConditionStatus::True, "Banned".to_string()));
        assert_eq!(h.metrics.total(Metric::SignupBannedTotal), 1);

        let writes = h.store.writes();
        h.reconcile("john-signup").unwrap();
        assert_eq!(h.store.writes(), writes);
    }

    #[test]
    fn banned_signup_is_never_provisioned() {
        let h = harness(true);
        h.store
            .create(&BanRecord::new("ban-john", "john@redhat.com"))
            .unwrap();
        h.submit(approved_signup("john-signup", "john", "john@redhat.com"));

        h.reconcile("john-signup").unwrap();

        let signup = h.signup("john-signup");
        assert_eq!(signup.state(), Some(SignupState::Banned));
        assert_eq!(complete_reason(&signup), (ConditionStatus::True, "Banned".to_string()));
        assert!(h.accounts().is_empty());
    }

    #[test]
    fn ban_with_colliding_hash_but_other_email_does_not_apply() {
        let h = harness(false);
        let mut ban = BanRecord::new("ban-jane", "jane@redhat.com");
        ban.metadata
            .set_label(keys::EMAIL_HASH_LABEL, email_hash("john@redhat.com"));
        h.store.create(&ban).unwrap();
        h.submit(approved_signup("john-signup", "john", "john@redhat.com"));

        h.reconcile("john-signup").unwrap();

        assert_eq!(h.signup("john-signup").state(), Some(SignupState::Approved));
        assert_eq!(h.accounts().len(), 1);
    }

    #[test]
    fn duplicate_accounts_are_an_invalid_state() {
        let h = harness(false);
        let signup = h.submit(approved_signup("john-signup", "john", "john@redhat.com"));
        for name in ["john", "john-2"] {
            h.store
                .create(&UserAccount::for_signup(name, &signup, "member-1", "deactivate30"))
                .unwrap();
        }

        let err = h.reconcile("john-signup").unwrap_err();
        assert!(matches!(err, ReconcileError::InvalidRecordState { count: 2, .. }));
        assert_eq!(
            complete_reason(&h.signup("john-signup")),
            (ConditionStatus::False, "InvalidUserAccountState".to_string())
        );
    }

    #[test]
    fn taken_usernames_get_a_numeric_suffix() {
        let h = harness(false);
        let other = SignupRequest::new("someone-else", "john");
        h.store
            .create(&UserAccount::for_signup("john", &other, "member-1", "deactivate30"))
            .unwrap();
        h.submit(approved_signup("john-signup", "john", "john@redhat.com"));

        h.reconcile("john-signup").unwrap();

        let account: UserAccount = h.store.get("john-2").unwrap();
        assert_eq!(account.owner(), Some("john-signup"));
    }

    #[test]
    fn requested_usernames_are_made_compliant() {
        let h = harness(false);
        h.submit(approved_signup("a", "John.Doe@redhat.com", "john@redhat.com"));
        h.submit(approved_signup("b", "kube-admin", "kube@redhat.com"));

        h.reconcile("a").unwrap();
        h.reconcile("b").unwrap();

        let names: Vec<String> = h.accounts().into_iter().map(|a| a.metadata.name).collect();
        assert_eq!(names, vec!["crt-kube-admin-crt", "john.doe"]);
    }

    #[test]
    fn social_event_overrides_tiers_and_cluster() {
        let h = harness(false);
        h.store.create(&UserTier::new("event-user", 60)).unwrap();
        h.store.create(&WorkspaceTier::new("event-space")).unwrap();
        h.store
            .create(&SocialEvent::new(
                "summit",
                SocialEventSpec {
                    user_tier: "event-user".to_string(),
                    workspace_tier: "event-space".to_string(),
                    target_cluster: Some("member-2".to_string()),
                },
            ))
            .unwrap();
        let mut signup = approved_signup("john-signup", "john", "john@redhat.com");
        signup.metadata.set_label(keys::SOCIAL_EVENT_LABEL, "summit");
        h.submit(signup);

        h.reconcile("john-signup").unwrap();
        h.reconcile("john-signup").unwrap();

        let account: UserAccount = h.store.get("john").unwrap();
        assert_eq!(account.spec.target_cluster, "member-2");
        assert_eq!(account.spec.tier_name, "event-user");
        let workspace: Workspace = h.store.get("john").unwrap();
        assert_eq!(workspace.spec.tier_name, "event-space");
    }

    #[test]
    fn dangling_social_event_falls_back_to_default_tiers() {
        let h = harness(false);
        let mut signup = approved_signup("john-signup", "john", "john@redhat.com");
        signup.metadata.set_label(keys::SOCIAL_EVENT_LABEL, "gone");
        h.submit(signup);

        h.reconcile("john-signup").unwrap();

        let account: UserAccount = h.store.get("john").unwrap();
        assert_eq!(account.spec.tier_name, "deactivate30");
    }

    #[test]
    fn missing_user_tier_is_recorded() {
        let h = harness(false);
        h.store.delete::<UserTier>("deactivate30").unwrap();
        h.submit(approved_signup("john-signup", "john", "john@redhat.com"));

        assert!(h.reconcile("john-signup").is_err());
        assert_eq!(
            complete_reason(&h.signup("john-signup")),
            (ConditionStatus::False, "NoUserTierAvailable".to_string())
        );
        assert!(h.accounts().is_empty());
    }

    #[test]
    fn deactivating_notification_is_sent_once() {
        let h = harness(false);
        provision_without_workspace(&h, "john-signup", "john", "john@redhat.com");
        h.edit("john-signup", |s| s.spec.deactivating = true);

        h.reconcile("john-signup").unwrap();
        h.reconcile("john-signup").unwrap();

        let sent: Vec<Notification> = h
            .store
            .list(&Notification::selector("john", NotificationType::Deactivating))
            .unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].spec.recipient, "john@redhat.com");
        assert_eq!(sent[0].spec.template, "userdeactivating");
        assert_eq!(
            sent[0].spec.context.get("registrationURL").map(String::as_str),
            Some("http://localhost:8080")
        );
        let (status, _, _) =
            condition(&h.signup("john-signup"), ConditionType::DeactivatingNotificationCreated);
        assert_eq!(status, ConditionStatus::True);
    }

    #[test]
    fn existing_notification_is_not_sent_again() {
        let h = harness(false);
        provision_without_workspace(&h, "john-signup", "john", "john@redhat.com");
        let sender = StoreNotificationSender::new(h.store.clone());
        sender
            .send(&NotificationRequest::for_signup(
                &h.signup("john-signup"),
                NotificationType::Deactivating,
                "http://localhost:8080",
            ))
            .unwrap();
        h.edit("john-signup", |s| s.spec.deactivating = true);

        h.reconcile("john-signup").unwrap();

        let sent: Vec<Notification> = h
            .store
            .list(&Notification::selector("john", NotificationType::Deactivating))
            .unwrap();
        assert_eq!(sent.len(), 1);
        let (status, _, _) =
            condition(&h.signup("john-signup"), ConditionType::DeactivatingNotificationCreated);
        assert_eq!(status, ConditionStatus::True);
    }

    #[test]
    fn failed_notification_is_recorded_and_retried() {
        let h = harness(false);
        provision_without_workspace(&h, "john-signup", "john", "john@redhat.com");
        h.edit("john-signup", |s| s.spec.deactivating = true);
        h.store.fail(Op::Create, Notification::KIND);

        let err = h.reconcile("john-signup").unwrap_err();
        assert!(matches!(err, ReconcileError::Notification(_)));
        assert!(err.is_transient());
        let (status, reason, _) =
            condition(&h.signup("john-signup"), ConditionType::DeactivatingNotificationCreated);
        assert_eq!((status, reason.as_str()), (ConditionStatus::False, "NotificationCRCreationFailed"));

        h.store.heal();
        h.reconcile("john-signup").unwrap();
        let (status, _, _) =
            condition(&h.signup("john-signup"), ConditionType::DeactivatingNotificationCreated);
        assert_eq!(status, ConditionStatus::True);
    }

    #[test]
    fn deactivation_removes_the_account_and_notifies_once() {
        let h = harness(false);
        provision_without_workspace(&h, "john-signup", "john", "john@redhat.com");
        h.edit("john-signup", |s| s.spec.deactivated = true);

        h.reconcile("john-signup").unwrap();
        let signup = h.signup("john-signup");
        assert!(h.accounts().is_empty());
        assert_eq!(signup.state(), Some(SignupState::Approved));
        assert_eq!(
            complete_reason(&signup),
            (ConditionStatus::False, "DeactivationInProgress".to_string())
        );

        h.reconcile("john-signup").unwrap();
        let signup = h.signup("john-signup");
        assert_eq!(signup.state(), Some(SignupState::Deactivated));
        assert_eq!(complete_reason(&signup), (ConditionStatus::True, "Deactivated".to_string()));
        let sent: Vec<Notification> = h
            .store
            .list(&Notification::selector("john", NotificationType::Deactivated))
            .unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(h.metrics.total(Metric::SignupDeactivatedTotal), 1);

        let writes = h.store.writes();
        h.reconcile("john-signup").unwrap();
        assert_eq!(h.store.writes(), writes);
    }

    #[test]
    fn never_approved_signup_is_deactivated_silently() {
        let h = harness(false);
        let mut signup = new_signup("john-signup", "john", "john@redhat.com");
        signup.spec.deactivated = true;
        h.submit(signup);

        h.reconcile("john-signup").unwrap();

        assert_eq!(h.signup("john-signup").state(), Some(SignupState::Deactivated));
        let sent: Vec<Notification> = h.store.list(&LabelSelector::new()).unwrap();
        assert!(sent.is_empty());
        assert_eq!(h.metrics.total(Metric::SignupDeactivatedTotal), 0);
    }

    #[test]
    fn counters_are_bucketed_by_email_domain() {
        let h = harness(false);
        h.submit(approved_signup("john-signup", "john", "john@redhat.com"));
        h.submit(approved_signup("jane-signup", "jane", "jane@example.com"));

        h.reconcile("john-signup").unwrap();
        h.reconcile("jane-signup").unwrap();
        h.reconcile("john-signup").unwrap();

        let m = &h.metrics;
        assert_eq!(m.total(Metric::SignupUniqueTotal), 2);
        assert_eq!(m.total(Metric::SignupApprovedTotal), 2);
        assert_eq!(m.get(Metric::UserAccounts, Some("internal")), 1);
        assert_eq!(m.get(Metric::UserAccounts, Some("external")), 1);
        assert_eq!(
            m.get(Metric::UsersPerActivation { activations: 1 }, Some("internal")),
            1
        );
    }

    #[test]
    fn failed_account_creation_is_recorded_and_recovers() {
        let h = harness(false);
        h.store.fail(Op::Create, UserAccount::KIND);
        h.submit(approved_signup("john-signup", "john", "john@redhat.com"));

        let err = h.reconcile("john-signup").unwrap_err();
        assert!(matches!(err, ReconcileError::Store(StoreError::Unavailable(_))));
        assert!(err.is_transient());
        let signup = h.signup("john-signup");
        assert_eq!(
            complete_reason(&signup),
            (ConditionStatus::False, "UnableToCreateUserAccount".to_string())
        );
        assert_eq!(signup.last_target_cluster(), Some("member-1"));
        assert_eq!(h.metrics.total(Metric::UserAccounts), 0);

        h.store.heal();
        h.reconcile("john-signup").unwrap();
        assert_eq!(h.accounts().len(), 1);
    }

    #[test]
    fn failed_label_write_changes_nothing() {
        let h = harness(false);
        h.submit(approved_signup("john-signup", "john", "john@redhat.com"));
        h.store.fail(Op::Update, SignupRequest::KIND);

        assert!(h.reconcile("john-signup").is_err());

        assert!(h.signup("john-signup").state().is_none());
        assert_eq!(h.metrics.total(Metric::SignupUniqueTotal), 0);
    }

    #[test]
    fn failed_account_deletion_is_recorded() {
        let h = harness(false);
        provision_without_workspace(&h, "john-signup", "john", "john@redhat.com");
        h.store
            .create(&BanRecord::new("ban-john", "john@redhat.com"))
            .unwrap();
        h.store.fail(Op::Delete, UserAccount::KIND);

        assert!(h.reconcile("john-signup").is_err());

        assert_eq!(h.accounts().len(), 1);
        assert_eq!(
            complete_reason(&h.signup("john-signup")),
            (ConditionStatus::False, "UnableToDeleteUserAccount".to_string())
        );
    }

    #[test]
    fn failed_workspace_creation_is_recorded() {
        let h = harness(false);
        h.store.fail(Op::Create, Workspace::KIND);
        h.submit(approved_signup("john-signup", "john", "john@redhat.com"));
        h.reconcile("john-signup").unwrap();

        assert!(h.reconcile("john-signup").is_err());
        assert_eq!(
            complete_reason(&h.signup("john-signup")),
            (ConditionStatus::False, "UnableToCreateWorkspace".to_string())
        );
    }

    #[test]
    fn terminating_workspace_blocks_progress() {
        let h = harness(false);
        h.submit(approved_signup("john-signup", "john", "john@redhat.com"));
        h.reconcile("john-signup").unwrap();
        let account: UserAccount = h.store.get("john").unwrap();
        let mut workspace = Workspace::for_account(&account, "john-signup", "base");
        workspace.metadata.deletion_timestamp = Some(Utc::now());
        h.store.create(&workspace).unwrap();

        let err = h.reconcile("john-signup").unwrap_err();
        assert!(matches!(err, ReconcileError::WorkspaceTerminating(ref name) if name == "john"));
    }

    #[test]
    fn duplicate_bindings_block_progress() {
        let h = harness(false);
        h.submit(approved_signup("john-signup", "john", "john@redhat.com"));
        h.reconcile("john-signup").unwrap();
        h.reconcile("john-signup").unwrap();
        for _ in 0..2 {
            h.store
                .create(&Binding::admin("john", "john", "john-signup"))
                .unwrap();
        }

        let err = h.reconcile("john-signup").unwrap_err();
        assert!(matches!(err, ReconcileError::DuplicateBindings { .. }));
    }

    #[test]
    fn controller_worker_drives_signup_to_completion() {
        let bus: Arc<InMemoryEventBus<ResourceEvent>> = Arc::new(InMemoryEventBus::new());
        let store = Arc::new(PublishingStateStore::new(
            Arc::new(InMemoryStateStore::new()),
            bus.clone(),
        ));
        store.create(&UserTier::new("deactivate30", 30)).unwrap();
        store.create(&WorkspaceTier::new("base")).unwrap();
        store.create(&capacity(&[("member-1", 0, 10)])).unwrap();

        let config = Arc::new(OnboardingConfig::default());
        let reconciler = SignupReconciler::new(
            store.clone(),
            config,
            Arc::new(CapacityPlacement::new(store.clone(), false)),
            Arc::new(StoreNotificationSender::new(store.clone())),
            Arc::new(InMemoryMetrics::new()),
        );
        let mapper = SignupMapper::new(store.clone(), false);

        let handle = ControllerWorker::spawn(
            "signup-controller-test",
            bus.clone(),
            move |event: &ResourceEvent| mapper.map(event),
            move |name: &str| reconciler.reconcile(name),
        )
        .unwrap();

        let wait_until = |what: &str, done: &dyn Fn() -> bool| {
            let deadline = Instant::now() + Duration::from_secs(10);
            while !done() {
                assert!(Instant::now() < deadline, "timed out waiting for {what}");
                thread::sleep(Duration::from_millis(20));
            }
        };

        store
            .create(&approved_signup("john-signup", "john", "john@redhat.com"))
            .unwrap();
        wait_until("binding", &|| {
            store
                .list::<Binding>(&Binding::selector("john", "john"))
                .map(|b| b.len() == 1)
                .unwrap_or(false)
        });

        let mut workspace: Workspace = store.get("john").unwrap();
        workspace.status.conditions.set(Condition::new(
            READY_CONDITION,
            ConditionStatus::True,
            PROVISIONED_REASON,
        ));
        store.update(&workspace).unwrap();

        wait_until("completion", &|| {
            store
                .get::<SignupRequest>("john-signup")
                .map(|s| s.status.compliant_username == "john")
                .unwrap_or(false)
        });
        handle.shutdown();

        let signup: SignupRequest = store.get("john-signup").unwrap();
        assert_eq!(signup.state(), Some(SignupState::Approved));
        let by_owner = LabelSelector::new().with(keys::OWNER_LABEL, "john-signup");
        let accounts: Vec<UserAccount> = store.list(&by_owner).unwrap();
        assert_eq!(accounts.len(), 1);
    }
}
