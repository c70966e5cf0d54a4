//! Map manager: the entry point for obtaining self-organizing maps.

use crate::args::ConstructorArgs;
use crate::cancel::CancellationToken;
use crate::error::Result;
use crate::identity::MapId;
use crate::pool::{Constructor, ObjectPool};
use crate::registry::StoreRegistry;
use crate::som::{GridType, Initialization, MapType, SomFactory};
use crate::store::CacheStats;
use crate::strategy::MapIdStrategy;
use std::sync::Arc;

/// Hands out one map per [`MapId`], building it through the bound factory on
/// first request.
///
/// A manager owns no entries itself. Managers bound to the same factory type
/// and registry share one store, so a map built through one of them is
/// returned by all of them.
///
/// # Example
///
/// ```
/// use somap_cache::{GridType, Initialization, MapManager, MapType, StoreRegistry};
/// use std::sync::Arc;
///
/// let registry = StoreRegistry::new();
/// let first = MapManager::in_registry(&registry).unwrap();
/// let second = MapManager::in_registry(&registry).unwrap();
///
/// let a = first
///     .get_or_create_map("strains", 10, 10, Initialization::Pca, MapType::Toroid, GridType::Hexagonal)
///     .unwrap();
/// let b = second
///     .get_or_create_map("strains", 10, 10, Initialization::Pca, MapType::Toroid, GridType::Hexagonal)
///     .unwrap();
/// assert!(Arc::ptr_eq(&a, &b));
/// ```
pub struct MapManager<F: Constructor = SomFactory> {
    pool: ObjectPool<F, MapIdStrategy>,
}

impl MapManager<SomFactory> {
    /// Manager over the default factory, attached to the process-wide registry.
    pub fn new() -> Result<Self> {
        Self::with_factory(SomFactory)
    }

    /// Manager over the default factory, attached to `registry`.
    pub fn in_registry(registry: &StoreRegistry) -> Result<Self> {
        Self::with_registry(registry, SomFactory)
    }
}

impl<F: Constructor> MapManager<F> {
    /// Manager over `factory`, attached to the process-wide registry.
    pub fn with_factory(factory: F) -> Result<Self> {
        Self::with_registry(StoreRegistry::global(), factory)
    }

    /// Manager over `factory`, attached to `registry`.
    pub fn with_registry(registry: &StoreRegistry, factory: F) -> Result<Self> {
        Ok(Self {
            pool: ObjectPool::in_registry(registry, factory)?,
        })
    }

    /// Return the map with the given identity, creating it on first request.
    pub fn get_or_create_map(
        &self,
        dataset: &str,
        n_columns: u32,
        n_rows: u32,
        initialization: Initialization,
        map_type: MapType,
        grid_type: GridType,
    ) -> Result<Arc<F::Output>> {
        let args = ConstructorArgs::new()
            .arg(dataset)
            .arg(n_columns)
            .arg(n_rows)
            .kwarg(MapIdStrategy::INITIALIZATION, initialization)
            .kwarg(MapIdStrategy::MAP_TYPE, map_type)
            .kwarg(MapIdStrategy::GRID_TYPE, grid_type);
        self.pool.get_or_create(&args)
    }

    /// Return the map for raw constructor arguments.
    ///
    /// Positional `(dataset, n_columns, n_rows)`; keywords `initialization`,
    /// `map_type`, `grid_type`.
    pub fn get_map(&self, args: &ConstructorArgs) -> Result<Arc<F::Output>> {
        self.pool.get_or_create(args)
    }

    /// Like [`MapManager::get_map`], with a cancellable build.
    pub fn get_map_with_cancel(
        &self,
        args: &ConstructorArgs,
        cancel: &CancellationToken,
    ) -> Result<Arc<F::Output>> {
        self.pool.get_or_create_with_cancel(args, cancel)
    }

    /// Identity the manager would key `args` under.
    pub fn map_id(&self, args: &ConstructorArgs) -> Result<MapId> {
        self.pool.strategy().map_id(args)
    }

    /// Whether a map with this identity has been built.
    pub fn contains(&self, id: &MapId) -> Result<bool> {
        self.pool.store().contains(&id.canonical_string())
    }

    /// Canonical keys of all built maps, sorted.
    pub fn map_keys(&self) -> Result<Vec<String>> {
        self.pool.keys()
    }

    pub fn stats(&self) -> Result<CacheStats> {
        self.pool.stats()
    }

    pub fn pool(&self) -> &ObjectPool<F, MapIdStrategy> {
        &self.pool
    }
}
