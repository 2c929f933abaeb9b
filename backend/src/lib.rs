//! # Regatta Speeds
//!
//! Speed analytics for rowing regattas.
//!
//! This crate derives lap-based speeds for race participants and turns them into
//! distributions that can be plotted or reviewed for outliers. Persistence is
//! abstracted behind the repository pattern so the same analytics run against an
//! in-memory store, a JSON snapshot or any other records store.
//!
//! ## Architecture
//!
//! - [`api`]: Data types exchanged with callers (ids, criteria, records, reports)
//! - [`models`]: Stored race and participant rows, lap times
//! - [`db`]: Repository trait, store implementations, factory and configuration
//! - [`services`]: Predicate builder, normalizer, aggregation engine and outlier scanner
//!
//! ## Example
//!
//! ```ignore
//! use regatta_speeds::api::FilterCriteria;
//! use regatta_speeds::db::LocalRepository;
//! use regatta_speeds::services::{predicate, speeds};
//!
//! async fn example(repo: &LocalRepository) -> anyhow::Result<()> {
//!     let criteria = FilterCriteria::new("MALE", "SENIOR").with_day(1);
//!     let rule = predicate::build(&criteria)?;
//!     let distribution = speeds::yearly_distribution(repo, &rule, &[2022, 2023], true).await?;
//!     for year in &distribution.years {
//!         println!("{}: {} speeds", year, distribution.speeds[year].len());
//!     }
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod db;
pub mod models;
pub mod services;
