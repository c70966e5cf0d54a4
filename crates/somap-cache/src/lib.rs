//! somap-cache - memoizing pool for expensive self-organizing maps.
//!
//! Building a self-organizing map is expensive, and the same map is requested
//! from many places. This crate builds each map once per identity and hands
//! out shared references afterwards.
//!
//! - [`MapId`] is the composite identity of a map and renders the canonical
//!   string used as its key.
//! - [`ObjectPool`] is the generic "build once per key" store, keyed through
//!   a pluggable [`IdentityStrategy`].
//! - [`MapManager`] binds a map factory to a pool and is what callers use.
//! - [`StoreRegistry`] owns the stores shared between pools of one kind.
//!
//! # Example
//!
//! ```rust
//! use somap_cache::{GridType, Initialization, MapManager, MapType};
//!
//! fn main() -> somap_cache::Result<()> {
//!     let manager = MapManager::new()?;
//!     let map = manager.get_or_create_map(
//!         "strains",
//!         10,
//!         10,
//!         Initialization::Pca,
//!         MapType::Toroid,
//!         GridType::Hexagonal,
//!     )?;
//!     assert_eq!(map.n_units(), 100);
//!     Ok(())
//! }
//! ```

pub mod args;
pub mod cancel;
pub mod config;
pub mod error;
pub mod identity;
pub mod manager;
pub mod pool;
pub mod registry;
pub mod som;
pub mod store;
pub mod strategy;

// Re-export commonly used types
pub use args::{ArgValue, ConstructorArgs};
pub use cancel::{CancellationToken, CancelledError};
pub use config::{IdentityConfig, PoolConfig};
pub use error::{FactoryError, FactoryResult, PoolError, Result};
pub use identity::{MapAttributes, MapId, MapIdOverrides};
pub use manager::MapManager;
pub use pool::{Constructor, ObjectPool};
pub use registry::StoreRegistry;
pub use som::{GridType, Initialization, MapType, SelfOrganizingMap, SomFactory};
pub use store::{CacheEntry, CacheStats, PoolStore};
pub use strategy::{IdentityStrategy, MapIdStrategy, PositionalHashStrategy};
