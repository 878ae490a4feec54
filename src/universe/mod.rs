//! Universe State
//!
//! Externally supplied, time-sensitive global configuration consulted by
//! predicates: deadlines, capacity limits, live counters, feature flags.
//!
//! The engine never mutates universe state. Each call obtains one snapshot
//! from a [`UniverseStateProvider`] and hands it to every predicate of the
//! traversal.

mod cache;
mod errors;

pub use cache::{CacheStats, Clock, JsonFileSource, ManualClock, SystemClock, UniverseCache, UniverseSource};
pub use errors::{UniverseError, UniverseResult};

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Snapshot of the global configuration at one instant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UniverseState {
    /// Instant the snapshot represents; deadlines are compared against it
    #[serde(default = "Utc::now")]
    pub as_of: DateTime<Utc>,

    /// Named deadlines (e.g. `application_close`)
    #[serde(default)]
    pub deadlines: BTreeMap<String, DateTime<Utc>>,

    /// Named capacity limits (e.g. `max_confirmed`)
    #[serde(default)]
    pub limits: BTreeMap<String, u64>,

    /// Live counters paired with limits (e.g. `confirmed`)
    #[serde(default)]
    pub counters: BTreeMap<String, u64>,

    /// Boolean switches
    #[serde(default)]
    pub flags: BTreeMap<String, bool>,

    /// Free-form settings
    #[serde(default)]
    pub settings: BTreeMap<String, Value>,
}

impl UniverseState {
    /// Create an empty snapshot taken at `as_of`
    pub fn new(as_of: DateTime<Utc>) -> Self {
        Self {
            as_of,
            deadlines: BTreeMap::new(),
            limits: BTreeMap::new(),
            counters: BTreeMap::new(),
            flags: BTreeMap::new(),
            settings: BTreeMap::new(),
        }
    }

    pub fn with_deadline(mut self, name: impl Into<String>, at: DateTime<Utc>) -> Self {
        self.deadlines.insert(name.into(), at);
        self
    }

    pub fn with_limit(mut self, name: impl Into<String>, limit: u64) -> Self {
        self.limits.insert(name.into(), limit);
        self
    }

    pub fn with_counter(mut self, name: impl Into<String>, value: u64) -> Self {
        self.counters.insert(name.into(), value);
        self
    }

    pub fn with_flag(mut self, name: impl Into<String>, on: bool) -> Self {
        self.flags.insert(name.into(), on);
        self
    }

    pub fn deadline(&self, name: &str) -> Option<DateTime<Utc>> {
        self.deadlines.get(name).copied()
    }

    /// True while `as_of` is strictly before the named deadline.
    ///
    /// An unknown deadline is treated as already passed.
    pub fn before(&self, deadline: &str) -> bool {
        self.deadline(deadline).is_some_and(|at| self.as_of < at)
    }

    /// True while `counters[counter] < limits[limit]`.
    ///
    /// An unknown limit means no capacity; an unknown counter counts as zero.
    pub fn has_capacity(&self, limit: &str, counter: &str) -> bool {
        match self.limits.get(limit) {
            Some(max) => self.counters.get(counter).copied().unwrap_or(0) < *max,
            None => false,
        }
    }

    /// Flag value, false when unset
    pub fn flag(&self, name: &str) -> bool {
        self.flags.get(name).copied().unwrap_or(false)
    }

    pub fn setting(&self, name: &str) -> Option<&Value> {
        self.settings.get(name)
    }
}

impl Default for UniverseState {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

/// Source of the current universe snapshot for one engine call
#[async_trait]
pub trait UniverseStateProvider: Send + Sync {
    async fn current(&self) -> UniverseResult<UniverseState>;
}

/// Provider that always returns the same snapshot
#[derive(Debug, Clone, Default)]
pub struct StaticUniverse {
    state: UniverseState,
}

impl StaticUniverse {
    pub fn new(state: UniverseState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl UniverseStateProvider for StaticUniverse {
    async fn current(&self) -> UniverseResult<UniverseState> {
        Ok(self.state.clone())
    }
}
