//! Partitioning of fetch outcomes into successes and failures.
//!
//! The [`Aggregator`] is the single writer of [`AggregateState`]: workers only
//! produce outcomes, and the consuming loop feeds them in one at a time.

use futures::{Stream, StreamExt};

use crate::types::{DetailRow, DrawNumber, DrawRecord, FetchOutcome, Progress};

/// Everything collected from one harvest
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AggregateState {
    /// Raw response bodies of successful draws, in completion order
    pub all_records: Vec<DrawRecord>,
    /// `drawDetails` rows of successful draws, parallel to `all_records`
    pub flattened_details: Vec<DetailRow>,
    /// Draws that could not be fetched, in completion order
    pub failed_draw_numbers: Vec<DrawNumber>,
    /// Number of successful draws
    pub success_count: usize,
    /// Number of failed draws
    pub failure_count: usize,
}

impl AggregateState {
    /// Draws that have produced an outcome
    pub fn processed(&self) -> usize {
        self.success_count + self.failure_count
    }

    /// Whether there is nothing at all to write
    pub fn is_empty(&self) -> bool {
        self.processed() == 0
    }
}

/// Incremental consumer of a [`Dispatch`](crate::dispatch::Dispatch) stream
#[derive(Debug)]
pub struct Aggregator {
    state: AggregateState,
    total: usize,
}

impl Aggregator {
    /// Create an empty aggregator expecting `total` outcomes
    pub fn new(total: usize) -> Self {
        Self {
            state: AggregateState::default(),
            total,
        }
    }

    /// Fold one outcome into the state and report progress.
    pub fn record(&mut self, outcome: FetchOutcome) -> Progress {
        match outcome {
            FetchOutcome::Success { record, .. } => {
                self.state.flattened_details.push(record.flatten_details());
                self.state.all_records.push(record);
                self.state.success_count += 1;
            }
            FetchOutcome::Failure { draw_number, .. } => {
                self.state.failed_draw_numbers.push(draw_number);
                self.state.failure_count += 1;
            }
        }
        self.progress()
    }

    /// Current progress
    pub fn progress(&self) -> Progress {
        Progress {
            processed: self.state.processed(),
            total: self.total,
        }
    }

    /// Read-only view of the state collected so far
    pub fn state(&self) -> &AggregateState {
        &self.state
    }

    /// Drain `outcomes`, calling `observe` with each outcome's progress.
    ///
    /// `observe` sees the outcome before it is folded in, together with the
    /// progress after folding.
    pub async fn consume<S, O>(mut self, outcomes: S, mut observe: O) -> AggregateState
    where
        S: Stream<Item = FetchOutcome>,
        O: FnMut(&FetchOutcome, Progress),
    {
        futures::pin_mut!(outcomes);
        while let Some(outcome) = outcomes.next().await {
            let progress = Progress {
                processed: self.state.processed() + 1,
                total: self.total,
            };
            observe(&outcome, progress);
            self.record(outcome);
        }
        self.finish()
    }

    /// Finalize and hand over the collected state
    pub fn finish(self) -> AggregateState {
        self.state
    }
}
