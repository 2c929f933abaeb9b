//! Speed outlier scan over the whole records store.
//!
//! Loads every speed-tagged participant, groups them by race, gender and
//! category and reports crews whose speed does not fit their group.
//!
//! # Usage
//!
//! ```bash
//! # Scan a JSON snapshot with the settings of ./repository.toml
//! cargo run --bin speed-outliers
//!
//! # Explicit configuration file, debug logging
//! SPEEDS_CONFIG=config/repository.toml RUST_LOG=debug cargo run --bin speed-outliers
//! ```
//!
//! # Environment Variables
//!
//! - `SPEEDS_CONFIG`: Path to `repository.toml` (default: standard locations)
//! - `REPOSITORY_TYPE` / `SPEEDS_SNAPSHOT`: Store selection when no config file exists.
//!   Only snapshot stores can be scanned.
//! - `RUST_LOG`: Log level (default: info)

use std::env;
use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use regatta_speeds::db::{self, RepositoryConfig, RepositoryFactory};
use regatta_speeds::services::{scan_repository, OutlierConfig};

fn load_config() -> anyhow::Result<Option<RepositoryConfig>> {
    if let Ok(path) = env::var("SPEEDS_CONFIG") {
        let config = RepositoryConfig::from_file(&path)
            .with_context(|| format!("Failed to load configuration from {}", path))?;
        return Ok(Some(config));
    }
    match RepositoryConfig::from_default_location() {
        Ok(config) => Ok(Some(config)),
        Err(e) => {
            warn!("{}; using environment and defaults", e);
            Ok(None)
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    FmtSubscriber::builder()
        .with_max_level(
            env::var("RUST_LOG")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(Level::INFO),
        )
        .with_target(true)
        .init();

    let config = load_config()?;
    db::scan_store_type(config.as_ref()).context("No records store to scan")?;
    let (repository, outliers) = match config {
        Some(config) => {
            db::init_repository(&config)?;
            (Arc::clone(db::get_repository()?), config.outliers)
        }
        None => {
            let repo = RepositoryFactory::from_env().context("Failed to create the records store")?;
            (repo, OutlierConfig::default())
        }
    };
    info!(
        "scanning with threshold={}, batch_size={}, absolute_limits={}, excluded={:?}",
        outliers.threshold, outliers.batch_size, outliers.absolute_limits, outliers.excluded_races
    );

    let scan = scan_repository(repository.as_ref(), outliers).await?;
    for report in &scan.reports {
        info!("found outlier: {:?}", report);
    }
    info!("found {} outliers", scan.reports.len());
    info!("grouped in {} races", scan.races.len());

    println!("{}", serde_json::to_string_pretty(&scan.races)?);
    Ok(())
}
