pub mod comments;
pub mod counters;
pub mod relations;
pub mod stats;
pub mod subscriptions;
pub mod views;

pub use comments::{CommentInput, CommentService};
pub use counters::{CounterMaintainer, ReconcileReport};
pub use relations::RelationService;
pub use stats::BlogStatsService;
pub use subscriptions::LiveFeed;
pub use views::ViewCounter;

use crate::config::CounterConfig;
use crate::domain::{Identity, RelationKind};
use crate::security::{AccessRules, SecuredStore};
use document_store::DocumentStore;
use resilience::RetryConfig;
use std::sync::Arc;
use std::time::Duration;

/// Tuning shared by every counter update
#[derive(Debug, Clone)]
pub struct CounterSettings {
    pub retry: RetryConfig,
    pub view_timeout: Duration,
}

impl Default for CounterSettings {
    fn default() -> Self {
        Self::from(&CounterConfig::default())
    }
}

impl From<&CounterConfig> for CounterSettings {
    fn from(config: &CounterConfig) -> Self {
        Self {
            retry: RetryConfig::contention(config.max_retries, config.initial_backoff()),
            view_timeout: views::DEFAULT_VIEW_TIMEOUT,
        }
    }
}

/// Every interaction service, wired to one store handle
#[derive(Clone)]
pub struct Interactions {
    pub counters: CounterMaintainer,
    pub likes: RelationService,
    pub saves: RelationService,
    pub comments: CommentService,
    pub views: ViewCounter,
    pub stats: BlogStatsService,
}

impl Interactions {
    pub fn new(store: Arc<dyn DocumentStore>, settings: &CounterSettings) -> Self {
        let counters = CounterMaintainer::new(store.clone(), settings.retry.clone());

        Self {
            likes: RelationService::likes(store.clone(), counters.clone()),
            saves: RelationService::saves(store.clone(), counters.clone()),
            comments: CommentService::new(store.clone(), counters.clone()),
            views: ViewCounter::new(counters.clone(), settings.view_timeout),
            stats: BlogStatsService::new(store),
            counters,
        }
    }

    pub fn relation(&self, kind: RelationKind) -> &RelationService {
        match kind {
            RelationKind::Like => &self.likes,
            RelationKind::Save => &self.saves,
        }
    }
}

/// Builds [`Interactions`] per caller over a shared store
#[derive(Clone)]
pub struct ServiceContext {
    store: Arc<dyn DocumentStore>,
    rules: Arc<AccessRules>,
    settings: CounterSettings,
}

impl ServiceContext {
    pub fn new(store: Arc<dyn DocumentStore>, rules: AccessRules, settings: CounterSettings) -> Self {
        Self {
            store,
            rules: Arc::new(rules),
            settings,
        }
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub fn rules(&self) -> &AccessRules {
        &self.rules
    }

    /// Services acting for `caller`; every mutation passes the access rules.
    pub fn for_caller(&self, caller: Option<Identity>) -> Interactions {
        let secured = SecuredStore::new(self.store.clone(), self.rules.clone(), caller);
        Interactions::new(Arc::new(secured), &self.settings)
    }

    /// Unrestricted services for trusted background jobs
    pub fn system(&self) -> Interactions {
        Interactions::new(self.store.clone(), &self.settings)
    }
}
