use std::sync::Arc;

use anyhow::{Context, bail};

use onboard_core::Resource;
use onboard_events::{InMemoryEventBus, ResourceEvent};
use onboard_infra::config::OnboardingConfig;
use onboard_infra::external::{CapacityPlacement, StoreNotificationSender};
use onboard_infra::reconciler::SignupReconciler;
use onboard_infra::store::{InMemoryStateStore, PublishingStateStore, StateStore};
use onboard_infra::watch::SignupMapper;
use onboard_infra::workers::ControllerWorker;
use onboard_observability::TracingMetrics;
use onboard_signup::{CapacityStatus, MemberCapacity, UserTier, WorkspaceTier};

/// `name=max_users` pairs, comma separated.
const MEMBER_CLUSTERS_VAR: &str = "ONBOARD_MEMBER_CLUSTERS";
const DEFAULT_DEACTIVATION_DAYS: u32 = 30;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    onboard_observability::init();

    let config = Arc::new(OnboardingConfig::from_env().context("failed to load onboarding config")?);

    let bus: Arc<InMemoryEventBus<ResourceEvent>> = Arc::new(InMemoryEventBus::new());
    let store = Arc::new(PublishingStateStore::new(
        Arc::new(InMemoryStateStore::new()),
        bus.clone(),
    ));

    let reconciler = SignupReconciler::new(
        store.clone(),
        config.clone(),
        Arc::new(CapacityPlacement::new(store.clone(), config.automatic_approval)),
        Arc::new(StoreNotificationSender::new(store.clone())),
        Arc::new(TracingMetrics),
    );
    let mapper = SignupMapper::new(store.clone(), config.automatic_approval);

    let worker = ControllerWorker::spawn(
        "signup-controller",
        bus.clone(),
        move |event: &ResourceEvent| mapper.map(event),
        move |name: &str| reconciler.reconcile(name),
    )
    .context("failed to spawn signup controller")?;

    let members = match std::env::var(MEMBER_CLUSTERS_VAR) {
        Ok(raw) => parse_members(&raw)?,
        Err(_) => Vec::new(),
    };
    seed(store.as_ref(), &config, members)?;

    tracing::info!(
        automatic_approval = config.automatic_approval,
        "signup controller running"
    );

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;

    tracing::info!("shutting down signup controller");
    tokio::task::spawn_blocking(move || worker.shutdown()).await?;
    Ok(())
}

/// Create the default tiers and the capacity snapshot the controller expects.
fn seed<S: StateStore>(
    store: &S,
    config: &OnboardingConfig,
    members: Vec<MemberCapacity>,
) -> anyhow::Result<()> {
    let user_tier = UserTier::new(config.default_user_tier.as_str(), DEFAULT_DEACTIVATION_DAYS);
    store
        .create(&user_tier)
        .with_context(|| format!("failed to seed {} '{}'", UserTier::KIND, user_tier.name()))?;

    let workspace_tier = WorkspaceTier::new(config.default_workspace_tier.as_str());
    store.create(&workspace_tier).with_context(|| {
        format!("failed to seed {} '{}'", WorkspaceTier::KIND, workspace_tier.name())
    })?;

    if members.is_empty() {
        tracing::warn!("no member clusters configured; approved signups will wait for capacity");
    }
    store
        .create(&CapacityStatus::new(members))
        .context("failed to seed capacity status")?;
    Ok(())
}

fn parse_members(raw: &str) -> anyhow::Result<Vec<MemberCapacity>> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let Some((cluster, max)) = entry.split_once('=') else {
                bail!("invalid {MEMBER_CLUSTERS_VAR} entry '{entry}', expected name=max_users");
            };
            let max_users = max
                .trim()
                .parse()
                .with_context(|| format!("invalid max_users in '{entry}'"))?;
            Ok(MemberCapacity {
                cluster: cluster.trim().to_string(),
                users: 0,
                max_users,
            })
        })
        .collect()
}
