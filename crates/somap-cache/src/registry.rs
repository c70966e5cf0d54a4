//! Registry handing out one shared store per pool specialization.
//!
//! A specialization is the pair (pooled object type, identity strategy type).
//! Pools built from the same registry and specialization share one
//! [`PoolStore`], which is how independently constructed managers observe
//! each other's entries.
//!
//! Two ways to get a registry:
//!
//! - [`StoreRegistry::new`] builds an explicit registry to be passed to the
//!   pools and managers that should share it.
//! - [`StoreRegistry::global`] returns the process-wide registry. It is
//!   initialized lazily on first access, lives until the process exits and is
//!   never replaced. [`StoreRegistry::clear`] detaches its stores; pools that
//!   already hold a store keep using it.

use crate::config::PoolConfig;
use crate::error::{PoolError, Result};
use crate::store::PoolStore;
use crate::strategy::IdentityStrategy;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, LazyLock, Mutex};
use tracing::debug;

type AnyStore = Arc<dyn Any + Send + Sync>;

static GLOBAL: LazyLock<StoreRegistry> = LazyLock::new(StoreRegistry::new);

/// Registry of shared pool stores keyed by specialization.
#[derive(Debug)]
pub struct StoreRegistry {
    stores: Mutex<HashMap<TypeId, AnyStore>>,
    config: PoolConfig,
}

impl StoreRegistry {
    /// Create an empty registry with default store configuration.
    pub fn new() -> Self {
        Self::with_config(PoolConfig::default())
    }

    /// Create an empty registry whose stores use `config`.
    pub fn with_config(config: PoolConfig) -> Self {
        Self {
            stores: Mutex::new(HashMap::new()),
            config,
        }
    }

    /// The process-wide registry.
    pub fn global() -> &'static StoreRegistry {
        &GLOBAL
    }

    /// The shared store for objects of type `T` keyed by strategy `S`.
    ///
    /// Created on first request; every later request returns the same store.
    pub fn store<T, S>(&self) -> Result<Arc<PoolStore<T>>>
    where
        T: Send + Sync + 'static,
        S: IdentityStrategy,
    {
        let mut stores = self
            .stores
            .lock()
            .map_err(|_| PoolError::LockPoisoned { what: "store registry" })?;

        let store = stores
            .entry(TypeId::of::<(T, S)>())
            .or_insert_with(|| {
                debug!(
                    object = std::any::type_name::<T>(),
                    strategy = std::any::type_name::<S>(),
                    "Creating shared pool store"
                );
                Arc::new(PoolStore::<T>::with_config(self.config.clone())) as AnyStore
            })
            .clone();

        store.downcast::<PoolStore<T>>().map_err(|_| PoolError::Config {
            message: format!(
                "store registered for {} has an unexpected type",
                std::any::type_name::<T>()
            ),
        })
    }

    /// Number of specializations with a store.
    pub fn len(&self) -> Result<usize> {
        Ok(self
            .stores
            .lock()
            .map_err(|_| PoolError::LockPoisoned { what: "store registry" })?
            .len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Detach every store from the registry.
    ///
    /// Later requests get fresh stores. Stores already handed out are not
    /// touched.
    pub fn clear(&self) -> Result<()> {
        self.stores
            .lock()
            .map_err(|_| PoolError::LockPoisoned { what: "store registry" })?
            .clear();
        Ok(())
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }
}

impl Default for StoreRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::{MapIdStrategy, PositionalHashStrategy};

    #[test]
    fn test_same_specialization_shares_store() {
        let registry = StoreRegistry::new();
        let a = registry.store::<String, MapIdStrategy>().unwrap();
        let b = registry.store::<String, MapIdStrategy>().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.len().unwrap(), 1);
    }

    #[test]
    fn test_specializations_are_isolated() {
        let registry = StoreRegistry::new();
        let by_id = registry.store::<String, MapIdStrategy>().unwrap();
        let by_hash = registry.store::<String, PositionalHashStrategy>().unwrap();
        let numbers = registry.store::<u64, MapIdStrategy>().unwrap();
        by_id.insert_if_absent("k", "v".to_string()).unwrap();
        assert!(by_hash.is_empty().unwrap());
        assert!(numbers.is_empty().unwrap());
        assert_eq!(registry.len().unwrap(), 3);
    }

    #[test]
    fn test_registries_are_independent() {
        let a = StoreRegistry::new().store::<String, MapIdStrategy>().unwrap();
        let b = StoreRegistry::new().store::<String, MapIdStrategy>().unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_clear_detaches_stores() {
        let registry = StoreRegistry::new();
        let before = registry.store::<String, MapIdStrategy>().unwrap();
        before.insert_if_absent("k", "v".to_string()).unwrap();
        registry.clear().unwrap();
        assert!(registry.is_empty().unwrap());

        let after = registry.store::<String, MapIdStrategy>().unwrap();
        assert!(!Arc::ptr_eq(&before, &after));
        assert!(before.contains("k").unwrap());
    }

    #[test]
    fn test_stores_inherit_config() {
        let config = PoolConfig::new().with_initial_capacity(2);
        let registry = StoreRegistry::with_config(config.clone());
        let store = registry.store::<String, MapIdStrategy>().unwrap();
        assert_eq!(store.config(), &config);
    }

    #[test]
    fn test_global_is_one_instance() {
        assert!(std::ptr::eq(StoreRegistry::global(), StoreRegistry::global()));
    }
}
