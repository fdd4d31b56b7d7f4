//! # lotto-history
//!
//! Harvester for historical lottery draw results.
//!
//! A harvest runs in four steps:
//! 1. **Enumerate** - ask the service which draws exist in a date range
//! 2. **Dispatch** - fetch every draw on a fixed-size worker pool, observing
//!    results as they finish
//! 3. **Aggregate** - split outcomes into successes and failures, flattening
//!    each success's `drawDetails`
//! 4. **Write** - save `lotteries.json`, `lotteries.csv` and
//!    `failed_draw_numbers.json`
//!
//! A failed draw never fails the run; it ends up in the failure list instead.
//!
//! ## Quick Start
//!
//! ```no_run
//! use chrono::NaiveDate;
//! use lotto_history::{Config, DrawQuery, LotteryHarvester};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let harvester = LotteryHarvester::new(Config::default())?;
//!
//!     let query = DrawQuery::new(
//!         NaiveDate::from_ymd_opt(2000, 1, 1).ok_or("bad date")?,
//!         chrono::Local::now().date_naive(),
//!         "LOTTO",
//!     );
//!     let report = harvester.run(&query).await?;
//!
//!     println!(
//!         "{} fetched, {} failed",
//!         report.state.success_count, report.state.failure_count
//!     );
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Outcome aggregation
pub mod aggregate;
/// Lottery service client
pub mod client;
/// Configuration types
pub mod config;
/// Bounded concurrent fetch pool
pub mod dispatch;
/// Error types
pub mod error;
/// Pipeline orchestration
pub mod harvest;
/// Artifact writing
pub mod output;
/// Core types and events
pub mod types;

// Re-export commonly used types
pub use aggregate::{AggregateState, Aggregator};
pub use client::{HttpLotteryApi, LotteryApi};
pub use config::{ApiConfig, Config, DispatchConfig, OutputConfig};
pub use dispatch::{Dispatch, dispatch};
pub use error::{Error, Result};
pub use harvest::{HarvestReport, LotteryHarvester};
pub use output::{ArtifactReport, ArtifactStatus, ArtifactWriter};
pub use types::{
    DetailRow, DrawNumber, DrawQuery, DrawRecord, Event, FailureKind, FetchFailure, FetchOutcome,
    Progress,
};
