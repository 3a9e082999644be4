//! # Sub-resource Locator Cache
//!
//! Invoking a sub-resource locator yields a class, an instance or a
//! `Resource` model that has to be compiled into a routing tree before
//! matching continues. Compiling is expensive, so trees are memoized here.
//!
//! ## Cache Keys
//!
//! | Locator returned | Key | Cached |
//! |---|---|---|
//! | [`LocatorTarget::Class`] | `Arc` identity | always |
//! | [`LocatorTarget::Instance`] | `Arc` identity | only with resource caching or a cache age |
//! | [`LocatorTarget::Model`] | `Arc` identity | only with resource caching or a cache age |
//!
//! Classes are distinct by identity, not by name: two classes that happen to
//! share a name get separate entries. An entry holds on to the target it was
//! built for, so an identity key cannot be reused by a different allocation
//! while the entry exists.
//!
//! ## Aging
//!
//! With an age configured an entry older than the age is rebuilt on the next
//! resolution. Without one entries live until evicted: the cache is bounded
//! and drops its oldest entry when full.
//!
//! ## Thread Safety
//!
//! Entries live in a `DashMap`. Lookups take a shard read lock only. A miss
//! builds the tree outside any lock and installs it through the entry API;
//! when two threads race on the same key both build, the first installed
//! tree wins and both return it. Readers only ever see complete trees.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{debug, info};

use crate::config::LocatorCacheConfig;
use crate::model::{LocatorTarget, ModelError};

use super::tree::RoutingTree;

/// Time source for entry aging.
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    start: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock().unwrap_or_else(|e| e.into_inner());
        *offset += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let offset = *self.offset.lock().unwrap_or_else(|e| e.into_inner());
        self.start + offset
    }
}

/// Cache key of a locator target.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LocatorKey {
    ByClass(usize),
    ByInstance(usize),
    ByModel(usize),
}

impl LocatorKey {
    pub fn of(target: &LocatorTarget) -> Self {
        match target {
            LocatorTarget::Class(class) => LocatorKey::ByClass(Arc::as_ptr(class) as usize),
            LocatorTarget::Instance(instance) => LocatorKey::ByInstance(Arc::as_ptr(instance) as usize),
            LocatorTarget::Model(model) => LocatorKey::ByModel(Arc::as_ptr(model) as usize),
        }
    }

    pub fn is_class(&self) -> bool {
        matches!(self, LocatorKey::ByClass(_))
    }
}

struct CacheEntry {
    tree: Arc<RoutingTree>,
    created: Instant,
    // Keeps identity keys unique while the entry exists.
    _target: LocatorTarget,
}

/// Memoizes the routing trees built for sub-resource locator targets.
pub struct LocatorCache {
    entries: DashMap<LocatorKey, CacheEntry>,
    config: LocatorCacheConfig,
    clock: Arc<dyn Clock>,
    builds: AtomicU64,
}

impl LocatorCache {
    pub fn new(config: LocatorCacheConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: LocatorCacheConfig, clock: Arc<dyn Clock>) -> Self {
        info!(
            max_size = config.max_size,
            age_secs = config.age.map(|a| a.as_secs()),
            resource_caching = config.resource_caching_enabled,
            "Initializing sub-resource locator cache"
        );
        Self {
            entries: DashMap::new(),
            config,
            clock,
            builds: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &LocatorCacheConfig {
        &self.config
    }

    /// Whether trees for `key` are stored at all.
    pub fn is_cacheable(&self, key: &LocatorKey) -> bool {
        key.is_class() || self.config.caches_identities()
    }

    /// Return the routing tree for `target`, building it with `build` when
    /// it is not cached, not cacheable or too old.
    ///
    /// # Errors
    ///
    /// Whatever `build` returns; failed builds are not cached.
    pub fn resolve<F>(&self, target: &LocatorTarget, build: F) -> Result<Arc<RoutingTree>, ModelError>
    where
        F: FnOnce(&LocatorTarget) -> Result<RoutingTree, ModelError>,
    {
        let key = LocatorKey::of(target);
        if !self.is_cacheable(&key) {
            debug!(target_name = %target.name(), "Locator target not cacheable, building");
            return self.build(target, build);
        }

        let now = self.clock.now();
        if let Some(entry) = self.entries.get(&key) {
            if !self.expired(entry.created, now) {
                debug!(target_name = %target.name(), key = ?key, "Locator cache hit");
                return Ok(Arc::clone(&entry.tree));
            }
        }

        let built = self.build(target, build)?;
        let tree = match self.entries.entry(key.clone()) {
            Entry::Occupied(occupied) if !self.expired(occupied.get().created, now) => {
                debug!(
                    target_name = %target.name(),
                    key = ?key,
                    "Locator tree built by another thread"
                );
                Arc::clone(&occupied.get().tree)
            }
            Entry::Occupied(mut occupied) => {
                occupied.insert(self.entry(target, &built, now));
                info!(target_name = %target.name(), key = ?key, "Locator cache entry refreshed");
                built
            }
            Entry::Vacant(vacant) => {
                vacant.insert(self.entry(target, &built, now));
                info!(target_name = %target.name(), key = ?key, "Locator tree built and cached");
                built
            }
        };
        self.evict_overflow();
        Ok(tree)
    }

    fn build<F>(&self, target: &LocatorTarget, build: F) -> Result<Arc<RoutingTree>, ModelError>
    where
        F: FnOnce(&LocatorTarget) -> Result<RoutingTree, ModelError>,
    {
        self.builds.fetch_add(1, Ordering::Relaxed);
        build(target).map(Arc::new)
    }

    fn entry(&self, target: &LocatorTarget, tree: &Arc<RoutingTree>, created: Instant) -> CacheEntry {
        CacheEntry {
            tree: Arc::clone(tree),
            created,
            _target: target.clone(),
        }
    }

    fn expired(&self, created: Instant, now: Instant) -> bool {
        self.config
            .age
            .is_some_and(|age| now.saturating_duration_since(created) > age)
    }

    fn evict_overflow(&self) {
        while self.entries.len() > self.config.max_size {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|e| e.value().created)
                .map(|e| e.key().clone());
            match oldest {
                Some(key) => {
                    self.entries.remove(&key);
                    debug!(key = ?key, "Evicted oldest locator cache entry");
                }
                None => break,
            }
        }
    }

    /// Number of tree builds so far, cached or not.
    pub fn build_count(&self) -> u64 {
        self.builds.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_cached(&self, key: &LocatorKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn clear(&self) {
        let evicted = self.entries.len();
        self.entries.clear();
        info!(evicted = evicted, "Locator cache cleared");
    }
}

impl fmt::Debug for LocatorCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocatorCache")
            .field("len", &self.entries.len())
            .field("config", &self.config)
            .field("builds", &self.build_count())
            .finish()
    }
}
