//! Identity strategies: how a pool turns constructor arguments into a key.

use crate::args::{ArgValue, ConstructorArgs};
use crate::config::IdentityConfig;
use crate::error::Result;
use crate::identity::MapId;

/// Derives a lookup key from constructor arguments.
///
/// Strategies are stateless. Two calls whose arguments map to the same key
/// share one pool entry, so a strategy that ignores part of the arguments
/// makes those calls collide.
pub trait IdentityStrategy: Send + Sync + 'static {
    /// Compute the lookup key for `args`.
    fn key(&self, args: &ConstructorArgs) -> Result<String>;

    /// Short name used in log events.
    fn name(&self) -> &'static str;
}

/// Fallback strategy hashing only the positional arguments.
///
/// Keyword arguments are ignored: calls that differ only in keywords collide.
/// Use it for constructors that take no meaningful keywords.
#[derive(Debug, Clone, Copy, Default)]
pub struct PositionalHashStrategy;

impl IdentityStrategy for PositionalHashStrategy {
    fn key(&self, args: &ConstructorArgs) -> Result<String> {
        let joined = args
            .positional()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(IdentityConfig::POSITIONAL_SEPARATOR);
        Ok(hex::encode(blake3::hash(joined.as_bytes()).as_bytes()))
    }

    fn name(&self) -> &'static str {
        "positional-hash"
    }
}

/// Keyword-aware strategy keying self-organizing maps by their [`MapId`].
///
/// Positional arguments are read as `(dataset, n_columns, n_rows)`; the
/// `initialization`, `map_type` and `grid_type` keywords fill the rest.
/// Absent keywords are tolerated and become unset fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct MapIdStrategy;

impl MapIdStrategy {
    pub const INITIALIZATION: &'static str = "initialization";
    pub const MAP_TYPE: &'static str = "map_type";
    pub const GRID_TYPE: &'static str = "grid_type";

    /// Build the identity described by `args`.
    pub fn map_id(&self, args: &ConstructorArgs) -> Result<MapId> {
        let positional = |i: usize| args.get(i).cloned().unwrap_or(ArgValue::None);
        let keyword = |name: &str| args.keyword(name).cloned().unwrap_or(ArgValue::None);

        MapId::new(
            positional(0).to_string(),
            positional(1),
            positional(2),
            keyword(Self::INITIALIZATION),
            keyword(Self::MAP_TYPE),
            keyword(Self::GRID_TYPE),
        )
    }
}

impl IdentityStrategy for MapIdStrategy {
    fn key(&self, args: &ConstructorArgs) -> Result<String> {
        Ok(self.map_id(args)?.canonical_string())
    }

    fn name(&self) -> &'static str {
        "map-id"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PoolError;

    fn som_args() -> ConstructorArgs {
        ConstructorArgs::new()
            .arg("strains")
            .arg(10)
            .arg(10)
            .kwarg("initialization", "pca")
            .kwarg("map_type", "toroid")
            .kwarg("grid_type", "hexagonal")
    }

    #[test]
    fn test_map_id_key() {
        let key = MapIdStrategy.key(&som_args()).unwrap();
        assert_eq!(key, "10-10-strains-hexagonal-pca-toroid");
    }

    #[test]
    fn test_map_id_key_uses_keywords() {
        let planar = som_args().kwarg("map_type", "planar");
        assert_ne!(
            MapIdStrategy.key(&som_args()).unwrap(),
            MapIdStrategy.key(&planar).unwrap()
        );
    }

    #[test]
    fn test_map_id_key_tolerates_missing_keywords() {
        let args = ConstructorArgs::new().arg("strains").arg(10).arg(10);
        assert_eq!(
            MapIdStrategy.key(&args).unwrap(),
            "10-10-strains-None-None-None"
        );
    }

    #[test]
    fn test_map_id_key_rejects_bad_dimensions() {
        let args = ConstructorArgs::new().arg("strains").arg("wide").arg(10);
        let err = MapIdStrategy.key(&args).unwrap_err();
        assert!(matches!(err, PoolError::IdentityConstruction { field: "n_columns", .. }));

        let missing = ConstructorArgs::new().arg("strains").arg(10);
        let err = MapIdStrategy.key(&missing).unwrap_err();
        assert!(matches!(err, PoolError::IdentityConstruction { field: "n_rows", .. }));
    }

    #[test]
    fn test_positional_hash_ignores_keywords() {
        let a = PositionalHashStrategy.key(&som_args()).unwrap();
        let b = PositionalHashStrategy
            .key(&som_args().kwarg("map_type", "planar"))
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_positional_hash_discriminates_positional() {
        let a = PositionalHashStrategy.key(&som_args()).unwrap();
        let b = PositionalHashStrategy
            .key(&ConstructorArgs::new().arg("strains").arg(10).arg(11))
            .unwrap();
        assert_ne!(a, b);
    }
}
