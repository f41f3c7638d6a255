//! Counters emitted by the signup reconciler.
//!
//! The sink is an injected capability: constructed once by the process and
//! shared by every component that records counters.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// A counter the reconciler can bump.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Metric {
    /// First time a signup received a state label.
    SignupUniqueTotal,
    SignupApprovedTotal,
    /// Only counted when the signup was previously approved.
    SignupDeactivatedTotal,
    SignupBannedTotal,
    /// Users that have been activated `activations` times, by email domain.
    UsersPerActivation { activations: u32 },
    /// Provisioned user accounts, by email domain.
    UserAccounts,
}

impl Metric {
    pub fn name(&self) -> &'static str {
        match self {
            Metric::SignupUniqueTotal => "onboard_signups_unique_total",
            Metric::SignupApprovedTotal => "onboard_signups_approved_total",
            Metric::SignupDeactivatedTotal => "onboard_signups_deactivated_total",
            Metric::SignupBannedTotal => "onboard_signups_banned_total",
            Metric::UsersPerActivation { .. } => "onboard_users_per_activation_and_domain",
            Metric::UserAccounts => "onboard_user_accounts_by_domain",
        }
    }
}

/// Destination for counter increments.
pub trait MetricsSink: Send + Sync {
    /// `domain` is the email-domain bucket for counters that carry one.
    fn increment(&self, metric: Metric, domain: Option<&str>);
}

impl<T> MetricsSink for Arc<T>
where
    T: MetricsSink + ?Sized,
{
    fn increment(&self, metric: Metric, domain: Option<&str>) {
        (**self).increment(metric, domain)
    }
}

/// In-memory counters for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryMetrics {
    counters: Mutex<HashMap<(Metric, Option<String>), u64>>,
}

impl InMemoryMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of a counter; `0` if it was never incremented.
    pub fn get(&self, metric: Metric, domain: Option<&str>) -> u64 {
        let Ok(counters) = self.counters.lock() else {
            return 0;
        };
        counters
            .get(&(metric, domain.map(str::to_string)))
            .copied()
            .unwrap_or(0)
    }

    /// Sum over every domain bucket.
    pub fn total(&self, metric: Metric) -> u64 {
        let Ok(counters) = self.counters.lock() else {
            return 0;
        };
        counters
            .iter()
            .filter(|((m, _), _)| *m == metric)
            .map(|(_, v)| v)
            .sum()
    }
}

impl MetricsSink for InMemoryMetrics {
    fn increment(&self, metric: Metric, domain: Option<&str>) {
        if let Ok(mut counters) = self.counters.lock() {
            *counters
                .entry((metric, domain.map(str::to_string)))
                .or_default() += 1;
        }
    }
}

/// Emits every increment as a debug event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingMetrics;

impl MetricsSink for TracingMetrics {
    fn increment(&self, metric: Metric, domain: Option<&str>) {
        match metric {
            Metric::UsersPerActivation { activations } => {
                tracing::debug!(metric = metric.name(), activations, domain, "counter incremented")
            }
            _ => tracing::debug!(metric = metric.name(), domain, "counter incremented"),
        }
    }
}
