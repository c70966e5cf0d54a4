//! Basic usage example - request the same map from two managers

use somap_cache::{
    ConstructorArgs, GridType, Initialization, MapId, MapIdOverrides, MapManager, MapType, Result,
};
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    FmtSubscriber::builder()
        .with_max_level(Level::DEBUG)
        .with_target(false)
        .compact()
        .init();

    // Dataset name from args or a default
    let dataset = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "strains".to_string());

    let clustering = MapManager::new()?;
    let plotting = MapManager::new()?;

    let map = clustering.get_or_create_map(
        &dataset,
        10,
        10,
        Initialization::Pca,
        MapType::Toroid,
        GridType::Hexagonal,
    )?;
    let same = plotting.get_or_create_map(
        &dataset,
        10,
        10,
        Initialization::Pca,
        MapType::Toroid,
        GridType::Hexagonal,
    )?;
    info!(shared = Arc::ptr_eq(&map, &same), "Requested the map twice");

    let id = MapId::from_map(map.as_ref(), &MapIdOverrides::new());
    println!("Map key: {}", id);
    for (name, value) in &id {
        println!("  {:<15} {}", name, value);
    }

    // A misspelled keyword is rejected and nothing is stored
    let typo = ConstructorArgs::new()
        .arg(dataset.as_str())
        .arg(10)
        .arg(10)
        .kwarg("initilization", "pca");
    if let Err(e) = plotting.get_map(&typo) {
        println!("Rejected: {}", e);
    }

    println!("Stats: {:?}", plotting.stats()?);
    Ok(())
}
