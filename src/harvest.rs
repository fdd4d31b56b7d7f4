//! Harvest orchestration: enumerate, dispatch, aggregate, write.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::aggregate::{AggregateState, Aggregator};
use crate::client::{HttpLotteryApi, LotteryApi};
use crate::config::Config;
use crate::dispatch::dispatch;
use crate::error::{Error, Result};
use crate::output::{ArtifactReport, ArtifactStatus, ArtifactWriter};
use crate::types::{DrawNumber, DrawQuery, Event, FetchFailure, FetchOutcome};

/// Broadcast buffer for harvest events
const EVENT_CHANNEL_CAPACITY: usize = 1000;

/// Outcome of a complete harvest run
#[derive(Debug)]
pub struct HarvestReport {
    /// Everything collected from the service
    pub state: AggregateState,
    /// What happened to each artifact
    pub artifacts: ArtifactReport,
}

/// Fetches every draw in a date range and writes the results to disk.
pub struct LotteryHarvester {
    api: Arc<dyn LotteryApi>,
    config: Config,
    writer: ArtifactWriter,
    event_tx: tokio::sync::broadcast::Sender<Event>,
}

impl LotteryHarvester {
    /// Create a harvester talking HTTP to the configured endpoints
    ///
    /// # Errors
    /// Returns error if the configuration is invalid or the HTTP client cannot
    /// be created
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let api = HttpLotteryApi::new(config.api.clone())?;
        Self::with_api(config, Arc::new(api))
    }

    /// Create a harvester on top of any [`LotteryApi`]
    pub fn with_api(config: Config, api: Arc<dyn LotteryApi>) -> Result<Self> {
        config.validate()?;
        let (event_tx, _rx) = tokio::sync::broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let writer = ArtifactWriter::new(config.output.clone());

        Ok(Self {
            api,
            config,
            writer,
            event_tx,
        })
    }

    /// Subscribe to harvest events
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// The configuration this harvester runs with
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Send an event to all subscribers; dropped silently when nobody listens.
    fn emit_event(&self, event: Event) {
        self.event_tx.send(event).ok();
    }

    /// Run the whole pipeline for `query`.
    ///
    /// Fails before any draw is fetched if the draw list cannot be retrieved,
    /// and fails after the run if the output directory cannot be created.
    /// Per-draw failures and per-artifact write failures do not fail the run;
    /// they are reported in the returned [`HarvestReport`].
    pub async fn run(&self, query: &DrawQuery) -> Result<HarvestReport> {
        let draw_numbers = self.fetch_draw_numbers(query).await?;
        let state = self.harvest(draw_numbers).await;
        let artifacts = self.write_artifacts(&state)?;

        Ok(HarvestReport { state, artifacts })
    }

    /// Retrieve the draw list for `query`.
    pub async fn fetch_draw_numbers(&self, query: &DrawQuery) -> Result<Vec<DrawNumber>> {
        if query.start_date > query.end_date {
            return Err(Error::config(
                "start_date",
                format!(
                    "start date {} is after end date {}",
                    query.start_date, query.end_date
                ),
            ));
        }

        info!(
            game = %query.game_name,
            start = %query.start_date,
            end = %query.end_date,
            "Fetching the historic draws"
        );
        let draw_numbers = self.api.fetch_draw_numbers(query).await?;
        info!(count = draw_numbers.len(), "Fetched historic draw list");
        self.emit_event(Event::DrawNumbersFetched {
            count: draw_numbers.len(),
        });

        Ok(draw_numbers)
    }

    /// Fetch every draw on the worker pool and collect the outcomes.
    pub async fn harvest(&self, draw_numbers: Vec<DrawNumber>) -> AggregateState {
        let api = Arc::clone(&self.api);
        let outcomes = dispatch(
            draw_numbers,
            self.config.dispatch.worker_count,
            move |draw_number| {
                let api = Arc::clone(&api);
                async move {
                    api.fetch_draw(&draw_number)
                        .await
                        .map_err(FetchFailure::from)
                }
            },
        );

        let state = Aggregator::new(outcomes.total())
            .consume(outcomes, |outcome, progress| match outcome {
                FetchOutcome::Success { draw_number, .. } => {
                    info!(processed = progress.processed, total = progress.total, "Processed {} draws", progress);
                    self.emit_event(Event::DrawFetched {
                        draw_number: draw_number.clone(),
                        progress,
                    });
                }
                FetchOutcome::Failure {
                    draw_number,
                    failure,
                } => {
                    warn!(draw_number = %draw_number, kind = ?failure.kind, error = %failure, "Draw fetch failed");
                    info!(processed = progress.processed, total = progress.total, "Processed {} draws", progress);
                    self.emit_event(Event::DrawFailed {
                        draw_number: draw_number.clone(),
                        error: failure.to_string(),
                        progress,
                    });
                }
            })
            .await;

        info!(
            succeeded = state.success_count,
            failed = state.failure_count,
            "Successfully fetched {} draws, failed to fetch {}",
            state.success_count,
            state.failure_count
        );
        self.emit_event(Event::HarvestComplete {
            succeeded: state.success_count,
            failed: state.failure_count,
        });

        state
    }

    /// Write the artifacts for a finished harvest.
    pub fn write_artifacts(&self, state: &AggregateState) -> Result<ArtifactReport> {
        let report = self.writer.write_all(state)?;

        for status in report.statuses() {
            match status {
                ArtifactStatus::Written(path) => {
                    info!(path = %path.display(), "Wrote artifact");
                    self.emit_event(Event::ArtifactWritten { path: path.clone() });
                }
                ArtifactStatus::Failed { path, error } => {
                    error!(path = %path.display(), error = %error, "Failed to write artifact");
                    self.emit_event(Event::ArtifactFailed {
                        path: path.clone(),
                        error: error.to_string(),
                    });
                }
                ArtifactStatus::Skipped => {}
            }
        }

        Ok(report)
    }
}
