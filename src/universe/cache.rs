//! Universe State Cache
//!
//! Explicit cache service in front of a [`UniverseSource`]. Constructed once
//! at startup and shared by handle; callers never see a hidden global.
//!
//! - Time comes from an injected [`Clock`]
//! - Entries expire after a fixed TTL
//! - [`UniverseCache::invalidate`] drops the entry immediately
//! - `as_of` of every returned snapshot is the clock's current instant,
//!   not the instant the entry was loaded

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex as AsyncMutex;
use tracing::debug;

use super::errors::UniverseResult;
use super::{UniverseState, UniverseStateProvider};

/// Time source for the cache
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock for tests and replays
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, at: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = at;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Backing source the cache reloads from
#[async_trait]
pub trait UniverseSource: Send + Sync {
    async fn load(&self) -> UniverseResult<UniverseState>;
}

/// Loads the snapshot from a JSON file on every reload
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl UniverseSource for JsonFileSource {
    async fn load(&self) -> UniverseResult<UniverseState> {
        let content = tokio::fs::read_to_string(&self.path).await?;
        let state: UniverseState = serde_json::from_str(&content)?;
        Ok(state)
    }
}

/// Cache statistics, passive only
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CacheStats {
    /// Snapshots served from the cached entry
    pub hits: u64,
    /// Snapshots that required a reload
    pub misses: u64,
    /// Explicit invalidations
    pub invalidations: u64,
}

struct CachedEntry {
    loaded_at: DateTime<Utc>,
    state: UniverseState,
}

struct CacheInner {
    entry: Option<CachedEntry>,
    stats: CacheStats,
}

/// TTL cache of the universe snapshot
pub struct UniverseCache<S: UniverseSource> {
    source: S,
    clock: Box<dyn Clock>,
    ttl: Duration,
    inner: AsyncMutex<CacheInner>,
}

impl<S: UniverseSource> UniverseCache<S> {
    /// Create a cache over `source` using the wall clock
    pub fn new(source: S, ttl: Duration) -> Self {
        Self::with_clock(source, ttl, SystemClock)
    }

    /// Create a cache with an explicit clock
    pub fn with_clock(source: S, ttl: Duration, clock: impl Clock + 'static) -> Self {
        Self {
            source,
            clock: Box::new(clock),
            ttl,
            inner: AsyncMutex::new(CacheInner {
                entry: None,
                stats: CacheStats::default(),
            }),
        }
    }

    /// Drop the cached entry; the next call reloads from the source
    pub async fn invalidate(&self) {
        let mut inner = self.inner.lock().await;
        inner.entry = None;
        inner.stats.invalidations += 1;
        debug!("universe cache invalidated");
    }

    pub async fn stats(&self) -> CacheStats {
        self.inner.lock().await.stats.clone()
    }

    fn is_fresh(&self, entry: &CachedEntry, now: DateTime<Utc>) -> bool {
        now - entry.loaded_at < self.ttl
    }
}

#[async_trait]
impl<S: UniverseSource> UniverseStateProvider for UniverseCache<S> {
    async fn current(&self) -> UniverseResult<UniverseState> {
        let now = self.clock.now();
        let mut inner = self.inner.lock().await;

        let cached = match &inner.entry {
            Some(entry) if self.is_fresh(entry, now) => Some(entry.state.clone()),
            _ => None,
        };

        let mut state = match cached {
            Some(state) => {
                inner.stats.hits += 1;
                state
            }
            None => {
                let state = self.source.load().await?;
                inner.stats.misses += 1;
                debug!(ttl_secs = self.ttl.num_seconds(), "universe state reloaded");
                inner.entry = Some(CachedEntry {
                    loaded_at: now,
                    state: state.clone(),
                });
                state
            }
        };

        state.as_of = now;
        Ok(state)
    }
}
