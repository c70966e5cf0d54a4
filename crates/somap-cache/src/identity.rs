//! Composite identity of a self-organizing map.
//!
//! A [`MapId`] names a map by the six attributes that determine what gets
//! trained: the dataset, the grid dimensions, the initialization method, the
//! map topology and the grid shape. Its canonical string is the lookup key of
//! the map pool, so the field enumeration order below is part of the key
//! space.
//!
//! # Field order
//!
//! Fields are enumerated by sorting their storage names. The two structural
//! fields are stored as `_n_columns` and `_n_rows`, and `_` sorts ahead of
//! lowercase letters, which gives:
//!
//! ```text
//! n_columns, n_rows, dataset_name, grid_type, initialization, map_type
//! ```

use crate::args::ArgValue;
use crate::config::IdentityConfig;
use crate::error::{PoolError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

/// Identity fields in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    DatasetName,
    NColumns,
    NRows,
    Initialization,
    MapType,
    GridType,
}

impl Field {
    pub const ALL: [Field; 6] = [
        Field::DatasetName,
        Field::NColumns,
        Field::NRows,
        Field::Initialization,
        Field::MapType,
        Field::GridType,
    ];

    /// Public field name.
    pub fn name(&self) -> &'static str {
        match self {
            Field::DatasetName => "dataset_name",
            Field::NColumns => "n_columns",
            Field::NRows => "n_rows",
            Field::Initialization => "initialization",
            Field::MapType => "map_type",
            Field::GridType => "grid_type",
        }
    }

    /// Storage name; this is what the enumeration order sorts on.
    fn storage_name(&self) -> &'static str {
        match self {
            Field::NColumns => "_n_columns",
            Field::NRows => "_n_rows",
            other => other.name(),
        }
    }
}

static FIELD_ORDER: LazyLock<[Field; 6]> = LazyLock::new(|| {
    let mut order = Field::ALL;
    order.sort_by_key(|f| f.storage_name());
    order
});

/// Fields in enumeration order, shared by [`MapId::fields`] and
/// [`MapId::canonical_string`].
pub fn field_order() -> &'static [Field; 6] {
    &FIELD_ORDER
}

/// Attributes of an already-built map that identify it.
pub trait MapAttributes {
    fn dataset_name(&self) -> &str;
    fn n_columns(&self) -> u32;
    fn n_rows(&self) -> u32;
    fn initialization(&self) -> Option<&str>;
    fn map_type(&self) -> Option<&str>;
    fn grid_type(&self) -> Option<&str>;
}

/// Immutable composite identity of a self-organizing map.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MapId {
    dataset_name: String,
    n_columns: u32,
    n_rows: u32,
    initialization: Option<String>,
    map_type: Option<String>,
    grid_type: Option<String>,
}

impl MapId {
    /// Build an identity, validating the grid dimensions.
    ///
    /// `n_columns` and `n_rows` must be usable as non-negative integers that
    /// fit a `u32`. The enum-like fields accept any value; `ArgValue::None`
    /// marks them unset.
    pub fn new(
        dataset_name: impl Into<String>,
        n_columns: impl Into<ArgValue>,
        n_rows: impl Into<ArgValue>,
        initialization: impl Into<ArgValue>,
        map_type: impl Into<ArgValue>,
        grid_type: impl Into<ArgValue>,
    ) -> Result<Self> {
        Ok(Self {
            dataset_name: dataset_name.into(),
            n_columns: structural(Field::NColumns, &n_columns.into())?,
            n_rows: structural(Field::NRows, &n_rows.into())?,
            initialization: descriptive(initialization.into()),
            map_type: descriptive(map_type.into()),
            grid_type: descriptive(grid_type.into()),
        })
    }

    /// Derive the identity of an existing map, applying `overrides`.
    pub fn from_map<M: MapAttributes + ?Sized>(map: &M, overrides: &MapIdOverrides) -> Self {
        Self {
            dataset_name: overrides
                .dataset_name
                .clone()
                .unwrap_or_else(|| map.dataset_name().to_string()),
            n_columns: overrides.n_columns.unwrap_or_else(|| map.n_columns()),
            n_rows: overrides.n_rows.unwrap_or_else(|| map.n_rows()),
            initialization: overrides
                .initialization
                .clone()
                .or_else(|| map.initialization().map(str::to_string)),
            map_type: overrides
                .map_type
                .clone()
                .or_else(|| map.map_type().map(str::to_string)),
            grid_type: overrides
                .grid_type
                .clone()
                .or_else(|| map.grid_type().map(str::to_string)),
        }
    }

    /// Rendered value of one field.
    pub fn value_of(&self, field: Field) -> String {
        fn text(value: &Option<String>) -> String {
            value
                .clone()
                .unwrap_or_else(|| IdentityConfig::UNSET_TOKEN.to_string())
        }
        match field {
            Field::DatasetName => self.dataset_name.clone(),
            Field::NColumns => self.n_columns.to_string(),
            Field::NRows => self.n_rows.to_string(),
            Field::Initialization => text(&self.initialization),
            Field::MapType => text(&self.map_type),
            Field::GridType => text(&self.grid_type),
        }
    }

    /// `(name, value)` pairs in enumeration order.
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        field_order()
            .iter()
            .map(|f| (f.name(), self.value_of(*f)))
            .collect()
    }

    /// Canonical string form; this is the map pool's lookup key.
    pub fn canonical_string(&self) -> String {
        self.fields()
            .into_iter()
            .map(|(_, value)| value)
            .collect::<Vec<_>>()
            .join(IdentityConfig::KEY_SEPARATOR)
    }

    pub fn dataset_name(&self) -> &str {
        &self.dataset_name
    }

    pub fn n_columns(&self) -> u32 {
        self.n_columns
    }

    pub fn n_rows(&self) -> u32 {
        self.n_rows
    }

    pub fn initialization(&self) -> Option<&str> {
        self.initialization.as_deref()
    }

    pub fn map_type(&self) -> Option<&str> {
        self.map_type.as_deref()
    }

    pub fn grid_type(&self) -> Option<&str> {
        self.grid_type.as_deref()
    }
}

fn structural(field: Field, value: &ArgValue) -> Result<u32> {
    let n = value
        .as_non_negative_int()
        .ok_or_else(|| PoolError::identity(field.name(), value, "expected a non-negative integer"))?;
    u32::try_from(n).map_err(|_| PoolError::identity(field.name(), value, "grid dimension too large"))
}

fn descriptive(value: ArgValue) -> Option<String> {
    match value {
        ArgValue::None => None,
        ArgValue::Text(s) => Some(s),
        other => Some(other.to_string()),
    }
}

impl fmt::Display for MapId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical_string())
    }
}

impl<'a> IntoIterator for &'a MapId {
    type Item = (&'static str, String);
    type IntoIter = std::vec::IntoIter<(&'static str, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields().into_iter()
    }
}

impl MapAttributes for MapId {
    fn dataset_name(&self) -> &str {
        &self.dataset_name
    }

    fn n_columns(&self) -> u32 {
        self.n_columns
    }

    fn n_rows(&self) -> u32 {
        self.n_rows
    }

    fn initialization(&self) -> Option<&str> {
        self.initialization.as_deref()
    }

    fn map_type(&self) -> Option<&str> {
        self.map_type.as_deref()
    }

    fn grid_type(&self) -> Option<&str> {
        self.grid_type.as_deref()
    }
}

/// Named overrides applied by [`MapId::from_map`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapIdOverrides {
    pub dataset_name: Option<String>,
    pub n_columns: Option<u32>,
    pub n_rows: Option<u32>,
    pub initialization: Option<String>,
    pub map_type: Option<String>,
    pub grid_type: Option<String>,
}

impl MapIdOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dataset_name(mut self, value: impl Into<String>) -> Self {
        self.dataset_name = Some(value.into());
        self
    }

    pub fn n_columns(mut self, value: u32) -> Self {
        self.n_columns = Some(value);
        self
    }

    pub fn n_rows(mut self, value: u32) -> Self {
        self.n_rows = Some(value);
        self
    }

    pub fn initialization(mut self, value: impl Into<String>) -> Self {
        self.initialization = Some(value.into());
        self
    }

    pub fn map_type(mut self, value: impl Into<String>) -> Self {
        self.map_type = Some(value.into());
        self
    }

    pub fn grid_type(mut self, value: impl Into<String>) -> Self {
        self.grid_type = Some(value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strains() -> MapId {
        MapId::new("strains", 10, 10, "pca", "toroid", "hexagonal").unwrap()
    }

    #[test]
    fn test_canonical_string() {
        assert_eq!(strains().canonical_string(), "10-10-strains-hexagonal-pca-toroid");
        assert_eq!(strains().to_string(), "10-10-strains-hexagonal-pca-toroid");
    }

    #[test]
    fn test_columns_precede_rows() {
        let id = MapId::new("strains", 12, 7, "random", "planar", "rectangular").unwrap();
        assert_eq!(id.canonical_string(), "12-7-strains-rectangular-random-planar");
    }

    #[test]
    fn test_field_order() {
        let names: Vec<_> = field_order().iter().map(|f| f.name()).collect();
        assert_eq!(
            names,
            vec!["n_columns", "n_rows", "dataset_name", "grid_type", "initialization", "map_type"]
        );
    }

    #[test]
    fn test_fields_and_iteration_agree() {
        let id = strains();
        let iterated: Vec<_> = (&id).into_iter().collect();
        assert_eq!(iterated, id.fields());
        let joined = iterated
            .iter()
            .map(|(_, v)| v.as_str())
            .collect::<Vec<_>>()
            .join("-");
        assert_eq!(joined, id.canonical_string());
    }

    #[test]
    fn test_unset_fields() {
        let id = MapId::new("strains", 5, 5, ArgValue::None, "toroid", ArgValue::None).unwrap();
        assert_eq!(id.initialization(), None);
        assert_eq!(id.canonical_string(), "5-5-strains-None-None-toroid");
    }

    #[test]
    fn test_structural_validation() {
        for bad in [ArgValue::from(-1), ArgValue::from("ten"), ArgValue::from(2.5), ArgValue::None] {
            let err = MapId::new("strains", bad.clone(), 10, "pca", "toroid", "hexagonal").unwrap_err();
            match err {
                PoolError::IdentityConstruction { field, value, .. } => {
                    assert_eq!(field, "n_columns");
                    assert_eq!(value, bad.to_string());
                }
                other => panic!("unexpected error: {other:?}"),
            }
        }
        let err = MapId::new("strains", 10, 1i64 << 40, "pca", "toroid", "hexagonal").unwrap_err();
        assert!(matches!(err, PoolError::IdentityConstruction { field: "n_rows", .. }));
    }

    #[test]
    fn test_text_dimensions_accepted() {
        let id = MapId::new("strains", "10", "10", "pca", "toroid", "hexagonal").unwrap();
        assert_eq!(id, strains());
    }

    #[test]
    fn test_structural_equality() {
        assert_eq!(strains(), strains());
        let other = MapId::new("strains", 10, 11, "pca", "toroid", "hexagonal").unwrap();
        assert_ne!(strains(), other);
        assert_ne!(strains().canonical_string(), other.canonical_string());
    }

    #[test]
    fn test_from_map_without_overrides() {
        let id = strains();
        let rederived = MapId::from_map(&id, &MapIdOverrides::new());
        assert_eq!(rederived, id);
        assert_eq!(rederived.canonical_string(), "10-10-strains-hexagonal-pca-toroid");
    }

    #[test]
    fn test_from_map_with_overrides() {
        let overrides = MapIdOverrides::new()
            .dataset_name("strains-clean")
            .n_rows(20)
            .grid_type("rectangular");
        let id = MapId::from_map(&strains(), &overrides);
        assert_eq!(id.dataset_name(), "strains-clean");
        assert_eq!(id.n_columns(), 10);
        assert_eq!(id.n_rows(), 20);
        assert_eq!(id.canonical_string(), "10-20-strains-clean-rectangular-pca-toroid");
    }

    #[test]
    fn test_json_roundtrip() {
        let id = strains();
        let json = serde_json::to_string(&id).unwrap();
        let back: MapId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
