//! Subscription plans and per-period usage quotas

use crate::error::ApiError;
use chrono::{DateTime, Utc};
use scribe_core::{validation_error, ContentType, ScribeError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};
use utoipa::ToSchema;

/// Subscription plan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    #[default]
    Free,
    Pro,
    Business,
}

impl Plan {
    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Free => "free",
            Plan::Pro => "pro",
            Plan::Business => "business",
        }
    }

    /// Monthly allowance for a quota kind; `None` means unlimited
    pub fn limit(&self, kind: QuotaKind) -> Option<u32> {
        match (self, kind) {
            (Plan::Free, QuotaKind::Ads) => Some(10),
            (Plan::Free, QuotaKind::Articles) => Some(5),
            (Plan::Free, QuotaKind::Books) => Some(1),
            (Plan::Pro, QuotaKind::Ads) => Some(200),
            (Plan::Pro, QuotaKind::Articles) => Some(100),
            (Plan::Pro, QuotaKind::Books) => Some(10),
            (Plan::Business, _) => None,
        }
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Plan {
    type Err = ScribeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "free" => Ok(Plan::Free),
            "pro" => Ok(Plan::Pro),
            "business" => Ok(Plan::Business),
            other => Err(validation_error!(
                format!("Unknown plan '{}'. Expected free, pro or business", other),
                "plan",
                "quota"
            )),
        }
    }
}

/// What a generation request counts against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum QuotaKind {
    Ads,
    Articles,
    Books,
}

impl QuotaKind {
    pub const ALL: [QuotaKind; 3] = [QuotaKind::Ads, QuotaKind::Articles, QuotaKind::Books];

    pub fn for_content(content_type: ContentType) -> Self {
        match content_type {
            ContentType::Ad | ContentType::Social => QuotaKind::Ads,
            ContentType::Book => QuotaKind::Books,
            ContentType::Article | ContentType::Blog | ContentType::Email => QuotaKind::Articles,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QuotaKind::Ads => "ads",
            QuotaKind::Articles => "articles",
            QuotaKind::Books => "books",
        }
    }
}

/// Billing period key, e.g. `2024-05`
pub fn period_key(now: DateTime<Utc>) -> String {
    now.format("%Y-%m").to_string()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct UsageCounts {
    ads: u32,
    articles: u32,
    books: u32,
}

impl UsageCounts {
    fn get(&self, kind: QuotaKind) -> u32 {
        match kind {
            QuotaKind::Ads => self.ads,
            QuotaKind::Articles => self.articles,
            QuotaKind::Books => self.books,
        }
    }

    fn bump(&mut self, kind: QuotaKind) {
        let slot = match kind {
            QuotaKind::Ads => &mut self.ads,
            QuotaKind::Articles => &mut self.articles,
            QuotaKind::Books => &mut self.books,
        };
        *slot = slot.saturating_add(1);
    }
}

/// Used count against the plan limit for one quota kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct QuotaUsage {
    pub used: u32,
    /// `null` for unlimited plans
    pub limit: Option<u32>,
}

/// Usage for one user in one period
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct UsageReport {
    pub period: String,
    pub plan: Plan,
    pub ads: QuotaUsage,
    pub articles: QuotaUsage,
    pub books: QuotaUsage,
}

impl UsageReport {
    fn new(period: String, plan: Plan, counts: UsageCounts) -> Self {
        let usage = |kind| QuotaUsage {
            used: counts.get(kind),
            limit: plan.limit(kind),
        };
        Self {
            ads: usage(QuotaKind::Ads),
            articles: usage(QuotaKind::Articles),
            books: usage(QuotaKind::Books),
            period,
            plan,
        }
    }
}

/// Usage counters keyed by (user id, period)
#[derive(Debug, Default)]
pub struct UsageLedger {
    counts: Mutex<HashMap<(String, String), UsageCounts>>,
}

impl UsageLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn counts(&self) -> MutexGuard<'_, HashMap<(String, String), UsageCounts>> {
        self.counts.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Current period usage for a user
    pub fn report(&self, user_id: &str, plan: Plan, now: DateTime<Utc>) -> UsageReport {
        let period = period_key(now);
        let counts = self
            .counts()
            .get(&(user_id.to_string(), period.clone()))
            .copied()
            .unwrap_or_default();
        UsageReport::new(period, plan, counts)
    }

    /// Record one use of `kind`, or reject if the plan allowance is spent.
    /// The check and the increment happen under one lock.
    pub fn check_and_record(
        &self,
        user_id: &str,
        plan: Plan,
        kind: QuotaKind,
        now: DateTime<Utc>,
    ) -> Result<UsageReport, ApiError> {
        let period = period_key(now);
        let mut all = self.counts();
        let counts = all.entry((user_id.to_string(), period.clone())).or_default();

        if let Some(limit) = plan.limit(kind) {
            if counts.get(kind) >= limit {
                info!(
                    user_id,
                    plan = plan.as_str(),
                    kind = kind.as_str(),
                    limit,
                    "Quota exhausted"
                );
                return Err(ApiError::QuotaExceeded(format!(
                    "Your {} plan allows {} {} per month. Upgrade your plan or wait until next month.",
                    plan,
                    limit,
                    kind.as_str()
                )));
            }
        }

        counts.bump(kind);
        debug!(user_id, kind = kind.as_str(), used = counts.get(kind), "Usage recorded");
        Ok(UsageReport::new(period, plan, *counts))
    }

    /// Drop counters for periods before the one containing `now`; returns how
    /// many entries were removed
    pub fn prune_past_periods(&self, now: DateTime<Utc>) -> usize {
        let current = period_key(now);
        let mut all = self.counts();
        let before = all.len();
        // `YYYY-MM` keys order chronologically as strings
        all.retain(|(_, period), _| *period >= current);
        before - all.len()
    }

    pub fn len(&self) -> usize {
        self.counts().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
