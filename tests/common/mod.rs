//! Common test utilities for lotto-history integration tests

#[allow(dead_code)]
pub mod fixtures;

#[allow(unused_imports)]
pub use fixtures::*;

use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use lotto_history::{DrawNumber, DrawQuery, DrawRecord, Error, LotteryApi, Result};

/// In-memory [`LotteryApi`] with scripted failures and concurrency tracking.
pub struct ScriptedApi {
    draw_numbers: std::result::Result<Vec<DrawNumber>, String>,
    failing: HashSet<String>,
    missing_details: HashSet<String>,
    delay: Duration,
    active: AtomicUsize,
    /// Highest number of fetches observed running at once
    pub peak: AtomicUsize,
    /// Every draw number requested, in request order
    pub requested: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl ScriptedApi {
    /// Serve `draw_numbers` from the history call
    pub fn new(draw_numbers: &[&str]) -> Self {
        Self {
            draw_numbers: Ok(draw_numbers.iter().map(|d| DrawNumber::from(*d)).collect()),
            failing: HashSet::new(),
            missing_details: HashSet::new(),
            delay: Duration::ZERO,
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            requested: Mutex::new(Vec::new()),
        }
    }

    /// Make the history call itself fail
    pub fn with_broken_history(mut self, message: &str) -> Self {
        self.draw_numbers = Err(message.to_string());
        self
    }

    /// Fail these draws with a transport error
    pub fn failing(mut self, draws: &[&str]) -> Self {
        self.failing = draws.iter().map(|d| d.to_string()).collect();
        self
    }

    /// Return bodies without `data.drawDetails` for these draws
    pub fn without_details(mut self, draws: &[&str]) -> Self {
        self.missing_details = draws.iter().map(|d| d.to_string()).collect();
        self
    }

    /// Hold every fetch for `delay`
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Number of draw fetches made so far
    pub fn request_count(&self) -> usize {
        self.requested.lock().map(|r| r.len()).unwrap_or(0)
    }
}

#[async_trait::async_trait]
impl LotteryApi for ScriptedApi {
    async fn fetch_draw_numbers(&self, _query: &DrawQuery) -> Result<Vec<DrawNumber>> {
        self.draw_numbers.clone().map_err(Error::Transport)
    }

    async fn fetch_draw(&self, draw_number: &DrawNumber) -> Result<DrawRecord> {
        if let Ok(mut requested) = self.requested.lock() {
            requested.push(draw_number.to_string());
        }
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.active.fetch_sub(1, Ordering::SeqCst);

        if self.failing.contains(draw_number.as_str()) {
            return Err(Error::Transport(format!(
                "Connection failed for draw {}",
                draw_number
            )));
        }
        if self.missing_details.contains(draw_number.as_str()) {
            return Ok(DrawRecord::new(serde_json::json!({"data": {}})));
        }
        Ok(draw_record(draw_number.as_str()))
    }
}
