//! Self-organizing map descriptors and the default map factory.
//!
//! Training is not part of this crate. [`SomFactory`] checks that a
//! construction request has the shape of a map constructor call and returns a
//! [`SelfOrganizingMap`] describing the requested map.

use crate::args::{ArgValue, ConstructorArgs};
use crate::cancel::CancellationToken;
use crate::error::{FactoryError, FactoryResult};
use crate::identity::MapAttributes;
use crate::pool::Constructor;
use crate::strategy::MapIdStrategy;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// How the codebook vectors are initialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Initialization {
    Pca,
    Random,
}

impl Initialization {
    pub fn as_str(&self) -> &'static str {
        match self {
            Initialization::Pca => "pca",
            Initialization::Random => "random",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pca" => Some(Initialization::Pca),
            "random" => Some(Initialization::Random),
            _ => None,
        }
    }
}

/// Topology of the map surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MapType {
    Planar,
    Toroid,
}

impl MapType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MapType::Planar => "planar",
            MapType::Toroid => "toroid",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "planar" => Some(MapType::Planar),
            "toroid" => Some(MapType::Toroid),
            _ => None,
        }
    }
}

/// Shape of the grid cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridType {
    Rectangular,
    Hexagonal,
}

impl GridType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GridType::Rectangular => "rectangular",
            GridType::Hexagonal => "hexagonal",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "rectangular" => Some(GridType::Rectangular),
            "hexagonal" => Some(GridType::Hexagonal),
            _ => None,
        }
    }
}

macro_rules! impl_text_enum {
    ($($t:ty),*) => {
        $(
            impl fmt::Display for $t {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}", self.as_str())
                }
            }

            impl From<$t> for ArgValue {
                fn from(value: $t) -> Self {
                    ArgValue::Text(value.as_str().to_string())
                }
            }
        )*
    };
}

impl_text_enum!(Initialization, MapType, GridType);

/// A requested self-organizing map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelfOrganizingMap {
    pub dataset_name: String,
    pub n_columns: u32,
    pub n_rows: u32,
    pub initialization: Initialization,
    pub map_type: MapType,
    pub grid_type: GridType,
    pub created_at: DateTime<Utc>,
}

impl SelfOrganizingMap {
    /// Number of neurons on the grid.
    pub fn n_units(&self) -> u64 {
        u64::from(self.n_columns) * u64::from(self.n_rows)
    }
}

impl MapAttributes for SelfOrganizingMap {
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
        Some(self.initialization.as_str())
    }

    fn map_type(&self) -> Option<&str> {
        Some(self.map_type.as_str())
    }

    fn grid_type(&self) -> Option<&str> {
        Some(self.grid_type.as_str())
    }
}

/// Default map factory.
///
/// Accepts `(dataset, n_columns, n_rows)` positionally plus the required
/// `initialization`, `map_type` and `grid_type` keywords spelled exactly as
/// their canonical names. Anything else is an argument mismatch, so every map
/// it builds re-derives to the key it is pooled under.
#[derive(Debug, Clone, Copy, Default)]
pub struct SomFactory;

impl SomFactory {
    const POSITIONAL: [&'static str; 3] = ["dataset", "n_columns", "n_rows"];

    fn dimension(name: &str, value: &ArgValue) -> FactoryResult<u32> {
        match value {
            ArgValue::Int(n) if *n > 0 => u32::try_from(*n)
                .map_err(|_| FactoryError::mismatch(format!("{} is too large: {}", name, n))),
            other => Err(FactoryError::mismatch(format!(
                "{} must be a positive integer, got {} '{}'",
                name,
                other.type_name(),
                other
            ))),
        }
    }

    /// Required keyword argument, matched exactly against the canonical
    /// lowercase names so that the built map re-derives to its pool key.
    fn keyword<T>(
        args: &ConstructorArgs,
        name: &str,
        parse: fn(&str) -> Option<T>,
    ) -> FactoryResult<T> {
        match args.keyword(name) {
            None | Some(ArgValue::None) => Err(FactoryError::mismatch(format!(
                "create() missing required keyword argument '{}'",
                name
            ))),
            Some(ArgValue::Text(s)) => parse(s)
                .ok_or_else(|| FactoryError::mismatch(format!("invalid {} '{}'", name, s))),
            Some(other) => Err(FactoryError::mismatch(format!(
                "{} must be text, got {} '{}'",
                name,
                other.type_name(),
                other
            ))),
        }
    }
}

impl Constructor for SomFactory {
    type Output = SelfOrganizingMap;

    fn construct(
        &self,
        args: &ConstructorArgs,
        cancel: &CancellationToken,
    ) -> FactoryResult<SelfOrganizingMap> {
        let positional = args.positional();
        if positional.len() != Self::POSITIONAL.len() {
            return Err(FactoryError::mismatch(format!(
                "create() takes {} positional arguments ({}) but {} were given",
                Self::POSITIONAL.len(),
                Self::POSITIONAL.join(", "),
                positional.len()
            )));
        }

        let known = [
            MapIdStrategy::INITIALIZATION,
            MapIdStrategy::MAP_TYPE,
            MapIdStrategy::GRID_TYPE,
        ];
        if let Some(unknown) = args.keywords().keys().find(|k| !known.contains(&k.as_str())) {
            return Err(FactoryError::mismatch(format!(
                "create() got an unexpected keyword argument '{}'",
                unknown
            )));
        }

        let dataset_name = positional[0]
            .as_text()
            .ok_or_else(|| {
                FactoryError::mismatch(format!(
                    "dataset must be text, got {} '{}'",
                    positional[0].type_name(),
                    positional[0]
                ))
            })?
            .to_string();
        let n_columns = Self::dimension("n_columns", &positional[1])?;
        let n_rows = Self::dimension("n_rows", &positional[2])?;
        let initialization =
            Self::keyword(args, MapIdStrategy::INITIALIZATION, Initialization::parse)?;
        let map_type = Self::keyword(args, MapIdStrategy::MAP_TYPE, MapType::parse)?;
        let grid_type = Self::keyword(args, MapIdStrategy::GRID_TYPE, GridType::parse)?;

        cancel.check()?;

        debug!(
            dataset = %dataset_name,
            n_columns,
            n_rows,
            initialization = %initialization,
            map_type = %map_type,
            grid_type = %grid_type,
            "Creating self-organizing map"
        );

        Ok(SelfOrganizingMap {
            dataset_name,
            n_columns,
            n_rows,
            initialization,
            map_type,
            grid_type,
            created_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{MapId, MapIdOverrides};

    fn args() -> ConstructorArgs {
        ConstructorArgs::new()
            .arg("strains")
            .arg(10)
            .arg(12)
            .kwarg("initialization", "pca")
            .kwarg("map_type", "toroid")
            .kwarg("grid_type", "hexagonal")
    }

    fn create(args: &ConstructorArgs) -> FactoryResult<SelfOrganizingMap> {
        SomFactory.construct(args, &CancellationToken::new())
    }

    fn mismatch_message(args: &ConstructorArgs) -> String {
        match create(args) {
            Err(FactoryError::ArgumentMismatch(msg)) => msg,
            other => panic!("expected argument mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_enum_strings() {
        for init in [Initialization::Pca, Initialization::Random] {
            assert_eq!(Initialization::parse(init.as_str()), Some(init));
        }
        for map_type in [MapType::Planar, MapType::Toroid] {
            assert_eq!(MapType::parse(map_type.as_str()), Some(map_type));
        }
        for grid in [GridType::Rectangular, GridType::Hexagonal] {
            assert_eq!(GridType::parse(grid.as_str()), Some(grid));
        }
        assert_eq!(MapType::parse("TOROID"), None);
        assert_eq!(Initialization::parse("Pca"), None);
        assert_eq!(GridType::parse("triangular"), None);
        assert_eq!(ArgValue::from(GridType::Hexagonal), ArgValue::from("hexagonal"));
    }

    #[test]
    fn test_create() {
        let map = create(&args()).unwrap();
        assert_eq!(map.dataset_name, "strains");
        assert_eq!(map.n_columns, 10);
        assert_eq!(map.n_rows, 12);
        assert_eq!(map.initialization, Initialization::Pca);
        assert_eq!(map.map_type, MapType::Toroid);
        assert_eq!(map.grid_type, GridType::Hexagonal);
        assert_eq!(map.n_units(), 120);
    }

    #[test]
    fn test_keywords_required() {
        let bare = ConstructorArgs::new().arg("strains").arg(4).arg(4);
        assert_eq!(
            mismatch_message(&bare),
            "create() missing required keyword argument 'initialization'"
        );

        let unset_grid = args().kwarg("grid_type", ArgValue::None);
        assert_eq!(
            mismatch_message(&unset_grid),
            "create() missing required keyword argument 'grid_type'"
        );
    }

    #[test]
    fn test_keywords_match_exactly() {
        assert_eq!(
            mismatch_message(&args().kwarg("initialization", "PCA")),
            "invalid initialization 'PCA'"
        );
        assert_eq!(
            mismatch_message(&args().kwarg("map_type", " toroid")),
            "invalid map_type ' toroid'"
        );
    }

    #[test]
    fn test_wrong_arity() {
        let msg = mismatch_message(&ConstructorArgs::new().arg("strains").arg(10));
        assert!(msg.contains("takes 3 positional arguments"));
        assert!(msg.contains("2 were given"));
    }

    #[test]
    fn test_unexpected_keyword() {
        let msg = mismatch_message(&args().kwarg("initilization", "pca"));
        assert_eq!(msg, "create() got an unexpected keyword argument 'initilization'");
    }

    #[test]
    fn test_wrong_types() {
        let bad_dataset = ConstructorArgs::new().arg(5).arg(10).arg(10);
        assert!(mismatch_message(&bad_dataset).contains("dataset must be text"));

        let zero = ConstructorArgs::new().arg("strains").arg(0).arg(10);
        assert!(mismatch_message(&zero).contains("n_columns must be a positive integer"));

        let text_rows = ConstructorArgs::new().arg("strains").arg(10).arg("10");
        assert!(mismatch_message(&text_rows).contains("n_rows must be a positive integer"));

        assert_eq!(
            mismatch_message(&args().kwarg("grid_type", "triangular")),
            "invalid grid_type 'triangular'"
        );
        assert!(mismatch_message(&args().kwarg("map_type", 3)).contains("map_type must be text"));
    }

    #[test]
    fn test_cancelled() {
        let token = CancellationToken::new();
        token.cancel();
        let result = SomFactory.construct(&args(), &token);
        assert!(matches!(result, Err(FactoryError::Cancelled)));
    }

    #[test]
    fn test_map_id_rederivation() {
        let map = create(&args()).unwrap();
        let id = MapId::from_map(&map, &MapIdOverrides::new());
        assert_eq!(id.canonical_string(), "10-12-strains-hexagonal-pca-toroid");
        assert_eq!(
            id.canonical_string(),
            MapIdStrategy.map_id(&args()).unwrap().canonical_string()
        );
    }
}
