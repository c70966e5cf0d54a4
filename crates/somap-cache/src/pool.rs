//! Memoizing object pool.
//!
//! An [`ObjectPool`] answers "have I built this before; if not, build and
//! remember it". The bound [`IdentityStrategy`] turns constructor arguments
//! into a key; on a miss the bound [`Constructor`] runs once and its result is
//! stored in the shared [`PoolStore`]; on a hit the stored `Arc` is returned.
//!
//! Per key the state only moves from absent to present. A failed or
//! cancelled construction leaves the key absent, so a corrected retry can
//! succeed.

use crate::args::ConstructorArgs;
use crate::cancel::CancellationToken;
use crate::config::millis_u64;
use crate::error::{FactoryError, FactoryResult, PoolError, Result};
use crate::registry::StoreRegistry;
use crate::store::{CacheStats, PoolStore};
use crate::strategy::{IdentityStrategy, MapIdStrategy};
use std::sync::{Arc, PoisonError};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Builds the objects held by a pool.
pub trait Constructor: Send + Sync + 'static {
    type Output: Send + Sync + 'static;

    /// Build an object from `args`.
    ///
    /// Report unusable arguments as [`FactoryError::ArgumentMismatch`].
    /// Long builds should poll `cancel` and return
    /// [`FactoryError::Cancelled`] once it fires.
    fn construct(
        &self,
        args: &ConstructorArgs,
        cancel: &CancellationToken,
    ) -> FactoryResult<Self::Output>;
}

impl<F, T> Constructor for F
where
    F: Fn(&ConstructorArgs, &CancellationToken) -> FactoryResult<T> + Send + Sync + 'static,
    T: Send + Sync + 'static,
{
    type Output = T;

    fn construct(&self, args: &ConstructorArgs, cancel: &CancellationToken) -> FactoryResult<T> {
        self(args, cancel)
    }
}

/// Keyed pool of constructed objects.
///
/// Pools of one specialization (constructor output type and strategy type)
/// created from the same [`StoreRegistry`] share their entries.
pub struct ObjectPool<C, S = MapIdStrategy>
where
    C: Constructor,
    S: IdentityStrategy,
{
    constructor: C,
    strategy: S,
    store: Arc<PoolStore<C::Output>>,
}

impl<C, S> ObjectPool<C, S>
where
    C: Constructor,
    S: IdentityStrategy + Default,
{
    /// Create a pool attached to the process-wide registry.
    pub fn new(constructor: C) -> Result<Self> {
        Self::in_registry(StoreRegistry::global(), constructor)
    }

    /// Create a pool attached to `registry`.
    pub fn in_registry(registry: &StoreRegistry, constructor: C) -> Result<Self> {
        let store = registry.store::<C::Output, S>()?;
        Ok(Self::with_store(constructor, S::default(), store))
    }

    /// Create a pool with a private store of its own.
    pub fn isolated(constructor: C) -> Self {
        Self::with_store(constructor, S::default(), Arc::new(PoolStore::new()))
    }
}

impl<C, S> ObjectPool<C, S>
where
    C: Constructor,
    S: IdentityStrategy,
{
    /// Create a pool over an explicitly shared store.
    pub fn with_store(constructor: C, strategy: S, store: Arc<PoolStore<C::Output>>) -> Self {
        Self {
            constructor,
            strategy,
            store,
        }
    }

    /// Return the object for `args`, building it on first request.
    pub fn get_or_create(&self, args: &ConstructorArgs) -> Result<Arc<C::Output>> {
        self.get_or_create_with_cancel(args, &CancellationToken::new())
    }

    /// Like [`ObjectPool::get_or_create`], with a cancellable build.
    ///
    /// Concurrent requests for an absent key wait for a single build. If that
    /// build fails, the next waiter retries it.
    pub fn get_or_create_with_cancel(
        &self,
        args: &ConstructorArgs,
        cancel: &CancellationToken,
    ) -> Result<Arc<C::Output>> {
        let key = self.strategy.key(args)?;

        if let Some(object) = self.store.get(&key)? {
            self.store.record_hit();
            debug!(key = %key, strategy = self.strategy.name(), "Pool hit");
            return Ok(object);
        }
        self.store.record_miss();
        debug!(key = %key, strategy = self.strategy.name(), "Pool miss");

        let slot = self.store.join_in_flight(&key)?;
        // The marker guards no data; a panicked builder leaves nothing to repair.
        let _guard = slot.lock().unwrap_or_else(PoisonError::into_inner);

        // Every exit past this point releases the marker.
        let result = match self.store.get(&key) {
            Ok(Some(object)) => {
                debug!(key = %key, "Resolved by concurrent build");
                Ok(object)
            }
            Ok(None) => self.build(&key, args, cancel),
            Err(e) => Err(e),
        };
        self.store.release_in_flight(&key, &slot, result.is_ok())?;
        result
    }

    fn build(
        &self,
        key: &str,
        args: &ConstructorArgs,
        cancel: &CancellationToken,
    ) -> Result<Arc<C::Output>> {
        if let Err(e) = cancel.check() {
            self.store.record_failure();
            info!(key = %key, "Build cancelled before start");
            return Err(e.into());
        }

        info!(key = %key, strategy = self.strategy.name(), "Building pooled object");
        let started = Instant::now();

        match self.constructor.construct(args, cancel) {
            Ok(object) => {
                let elapsed = started.elapsed();
                if elapsed > self.store.config().slow_build_threshold {
                    warn!(key = %key, elapsed_ms = millis_u64(elapsed), "Slow build");
                }
                let object = self.store.insert_if_absent(key, object)?;
                self.store.record_build();
                Ok(object)
            }
            Err(FactoryError::ArgumentMismatch(reason)) => {
                self.store.record_failure();
                warn!(key = %key, %args, reason = %reason, "Constructor rejected arguments");
                Err(PoolError::Construction {
                    reason,
                    args: args.to_string(),
                })
            }
            Err(FactoryError::Cancelled) => {
                self.store.record_failure();
                info!(key = %key, "Build cancelled");
                Err(PoolError::Cancelled)
            }
            Err(FactoryError::Failed(source)) => {
                self.store.record_failure();
                warn!(key = %key, error = %source, "Constructor failed");
                Err(PoolError::Factory {
                    message: source.to_string(),
                    source,
                })
            }
        }
    }

    /// Lookup key for `args` under this pool's strategy.
    pub fn key_for(&self, args: &ConstructorArgs) -> Result<String> {
        self.strategy.key(args)
    }

    /// Whether an object for `args` is stored.
    pub fn contains(&self, args: &ConstructorArgs) -> Result<bool> {
        self.store.contains(&self.strategy.key(args)?)
    }

    pub fn len(&self) -> Result<usize> {
        self.store.len()
    }

    pub fn is_empty(&self) -> Result<bool> {
        self.store.is_empty()
    }

    /// Stored keys, sorted.
    pub fn keys(&self) -> Result<Vec<String>> {
        self.store.keys()
    }

    pub fn stats(&self) -> Result<CacheStats> {
        self.store.stats()
    }

    /// The shared store behind this pool.
    pub fn store(&self) -> &Arc<PoolStore<C::Output>> {
        &self.store
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }
}
