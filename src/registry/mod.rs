//! Public registry existence checks.
//!
//! Answers "does this name exist on the registry?", memoizes the answer for
//! the lifetime of one scan, and bounds the number of in-flight queries.

mod cache;
pub mod npm;

pub use cache::{CachedAnswer, RegistryCache};
pub use npm::NpmRegistry;

use crate::config::EngineConfig;
use crate::types::{ExistenceResult, Provenance};
use governor::{Quota, RateLimiter};
use std::future::Future;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, trace};

/// Raw outcome of a single registry request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// The registry answered with this HTTP status.
    Status(u16),
    /// The request failed before a status was received.
    Failed(String),
}

/// Transport used by the resolver to query the registry.
pub trait RegistryClient: Send + Sync {
    /// Issue one existence request for a package name.
    fn lookup(&self, name: &str) -> impl Future<Output = Lookup> + Send;
}

impl<C: RegistryClient> RegistryClient for &C {
    fn lookup(&self, name: &str) -> impl Future<Output = Lookup> + Send {
        (**self).lookup(name)
    }
}

impl<C: RegistryClient> RegistryClient for Arc<C> {
    fn lookup(&self, name: &str) -> impl Future<Output = Lookup> + Send {
        self.as_ref().lookup(name)
    }
}

/// Map a lookup to an answer.
///
/// 200 means published, 404 means free; every other status and any failure
/// are answered "exists" so that uncertainty is never reported as safe.
pub fn answer_for(lookup: &Lookup) -> CachedAnswer {
    match lookup {
        Lookup::Status(200) => CachedAnswer {
            exists: true,
            conservative: false,
        },
        Lookup::Status(404) => CachedAnswer {
            exists: false,
            conservative: false,
        },
        Lookup::Status(_) | Lookup::Failed(_) => CachedAnswer {
            exists: true,
            conservative: true,
        },
    }
}

type DirectLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Memoizing, concurrency-bounded registry resolver scoped to one scan.
pub struct RegistryResolver<C> {
    client: C,
    cache: RegistryCache,
    permits: Semaphore,
    rate_limiter: Option<DirectLimiter>,
    timeout: Duration,
}

impl<C: RegistryClient> RegistryResolver<C> {
    /// Create a resolver with an empty cache.
    pub fn new(client: C, config: &EngineConfig) -> Self {
        let rate_limiter = config
            .rate_limit
            .and_then(NonZeroU32::new)
            .map(|per_second| RateLimiter::direct(Quota::per_second(per_second)));

        Self {
            client,
            cache: RegistryCache::new(),
            permits: Semaphore::new(config.concurrency.max(1)),
            rate_limiter,
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Override the per-query timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Whether the name exists on the registry.
    pub async fn exists(&self, name: &str) -> bool {
        self.resolve(name).await.exists
    }

    /// Resolve a name, querying the registry at most once per scan.
    pub async fn resolve(&self, name: &str) -> ExistenceResult {
        let slot = self.cache.slot(name);
        let mut queried = false;

        let answer = *slot
            .get_or_init(|| {
                queried = true;
                self.query(name)
            })
            .await;

        let provenance = match (queried, answer.conservative) {
            (false, _) => {
                trace!("Cache hit for {}", name);
                Provenance::Cached
            }
            (true, true) => Provenance::Fallback,
            (true, false) => Provenance::Live,
        };

        ExistenceResult {
            exists: answer.exists,
            provenance,
            conservative: answer.conservative,
        }
    }

    /// The per-scan cache.
    pub fn cache(&self) -> &RegistryCache {
        &self.cache
    }

    async fn query(&self, name: &str) -> CachedAnswer {
        let _permit = self.permits.acquire().await.ok();

        if let Some(ref limiter) = self.rate_limiter {
            limiter.until_ready().await;
        }

        let lookup = match tokio::time::timeout(self.timeout, self.client.lookup(name)).await {
            Ok(lookup) => lookup,
            Err(_) => Lookup::Failed(format!("timed out after {:?}", self.timeout)),
        };

        let answer = answer_for(&lookup);
        if answer.conservative {
            debug!("Registry answer for {} unclear ({:?}), assuming it exists", name, lookup);
        } else {
            debug!("{} exists on registry: {}", name, answer.exists);
        }
        answer
    }
}
