//! Core types for lotto-history

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;

/// Identifier of a single lottery draw, as issued by the lottery service.
///
/// Opaque to this crate; only ever compared and sent back to the service.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DrawNumber(pub String);

impl DrawNumber {
    /// Create a new DrawNumber
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Read a draw number out of a JSON value.
    ///
    /// The service is inconsistent about quoting, so both `"1234"` and `1234`
    /// are accepted. Anything else yields `None`.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self(s.clone())),
            Value::Number(n) => Some(Self(n.to_string())),
            _ => None,
        }
    }
}

impl From<&str> for DrawNumber {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for DrawNumber {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for DrawNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A flattened `drawDetails` row, in the key order the service sent.
pub type DetailRow = Map<String, Value>;

/// The full response body for one draw, kept exactly as received.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DrawRecord(pub Value);

impl DrawRecord {
    /// Wrap a parsed response body
    pub fn new(body: Value) -> Self {
        Self(body)
    }

    /// The raw response body
    pub fn body(&self) -> &Value {
        &self.0
    }

    /// The nested `data.drawDetails` mapping, if the record has one.
    pub fn draw_details(&self) -> Option<&DetailRow> {
        self.0
            .get("data")
            .and_then(|data| data.get("drawDetails"))
            .and_then(Value::as_object)
    }

    /// Project the record into a flat detail row.
    ///
    /// Records without a `data.drawDetails` mapping flatten to an empty row.
    pub fn flatten_details(&self) -> DetailRow {
        self.draw_details().cloned().unwrap_or_default()
    }
}

/// Why a single draw could not be fetched
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Network-level failure or non-success HTTP status
    Transport,
    /// Body could not be parsed as structured data
    MalformedResponse,
    /// The fetch task panicked before producing a result
    Panicked,
}

/// Description of a failed draw fetch
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchFailure {
    /// Failure classification
    pub kind: FailureKind,
    /// Human-readable description
    pub message: String,
}

impl FetchFailure {
    /// Create a new failure description
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// Result of fetching one draw, tagged with the draw it belongs to
#[derive(Clone, Debug, PartialEq)]
pub enum FetchOutcome {
    /// The draw was fetched and parsed
    Success {
        /// Draw that was fetched
        draw_number: DrawNumber,
        /// Parsed response body
        record: DrawRecord,
    },
    /// The draw could not be fetched
    Failure {
        /// Draw that failed
        draw_number: DrawNumber,
        /// What went wrong
        failure: FetchFailure,
    },
}

impl FetchOutcome {
    /// The draw this outcome belongs to
    pub fn draw_number(&self) -> &DrawNumber {
        match self {
            FetchOutcome::Success { draw_number, .. } | FetchOutcome::Failure { draw_number, .. } => {
                draw_number
            }
        }
    }

    /// Whether the fetch succeeded
    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Success { .. })
    }
}

/// Running count of processed draws
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    /// Draws that have produced an outcome so far
    pub processed: usize,
    /// Draws in the whole run
    pub total: usize,
}

impl std::fmt::Display for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.processed, self.total)
    }
}

/// Date range and game to enumerate draws for
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawQuery {
    /// First day of the range (inclusive)
    pub start_date: NaiveDate,
    /// Last day of the range (inclusive)
    pub end_date: NaiveDate,
    /// Game name as the service spells it (e.g. "LOTTO")
    pub game_name: String,
}

impl DrawQuery {
    /// Create a query for the given range and game
    pub fn new(start_date: NaiveDate, end_date: NaiveDate, game_name: impl Into<String>) -> Self {
        Self {
            start_date,
            end_date,
            game_name: game_name.into(),
        }
    }
}

/// Events emitted while a harvest runs
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// The draw list for the range was retrieved
    DrawNumbersFetched {
        /// Number of draws to fetch
        count: usize,
    },

    /// One draw was fetched successfully
    DrawFetched {
        /// Draw that was fetched
        draw_number: DrawNumber,
        /// Progress after this draw
        progress: Progress,
    },

    /// One draw failed
    DrawFailed {
        /// Draw that failed
        draw_number: DrawNumber,
        /// Failure description
        error: String,
        /// Progress after this draw
        progress: Progress,
    },

    /// Every draw produced an outcome
    HarvestComplete {
        /// Draws fetched successfully
        succeeded: usize,
        /// Draws that failed
        failed: usize,
    },

    /// An artifact was written to disk
    ArtifactWritten {
        /// Path of the written file
        path: PathBuf,
    },

    /// An artifact could not be written
    ArtifactFailed {
        /// Path that could not be written
        path: PathBuf,
        /// Error description
        error: String,
    },
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn draw_number_accepts_strings_and_numbers() {
        assert_eq!(
            DrawNumber::from_json(&json!("2345")),
            Some(DrawNumber::from("2345"))
        );
        assert_eq!(
            DrawNumber::from_json(&json!(2345)),
            Some(DrawNumber::from("2345"))
        );
        assert_eq!(DrawNumber::from_json(&json!(null)), None);
        assert_eq!(DrawNumber::from_json(&json!({"n": 1})), None);
    }

    #[test]
    fn draw_number_serializes_as_plain_string() {
        let json = serde_json::to_string(&vec![DrawNumber::from("1002")]).unwrap();
        assert_eq!(json, r#"["1002"]"#);
    }

    #[test]
    fn flatten_details_returns_nested_mapping_in_order() {
        let record = DrawRecord::new(json!({
            "data": {
                "drawDetails": {"drawNumber": "1001", "winningNumbers": "1,2,3", "jackpot": 5}
            }
        }));

        let row = record.flatten_details();
        let keys: Vec<&str> = row.keys().map(String::as_str).collect();

        assert_eq!(keys, vec!["drawNumber", "winningNumbers", "jackpot"]);
        assert_eq!(row["jackpot"], json!(5));
    }

    #[test]
    fn flatten_details_substitutes_empty_row_when_missing() {
        for body in [
            json!({}),
            json!({"data": {}}),
            json!({"data": null}),
            json!({"data": {"drawDetails": "not a mapping"}}),
            json!([1, 2, 3]),
        ] {
            assert!(
                DrawRecord::new(body.clone()).flatten_details().is_empty(),
                "expected empty row for {body}"
            );
        }
    }

    #[test]
    fn outcome_accessors_report_draw_and_status() {
        let ok = FetchOutcome::Success {
            draw_number: "1".into(),
            record: DrawRecord::new(json!({})),
        };
        let failed = FetchOutcome::Failure {
            draw_number: "2".into(),
            failure: FetchFailure::new(FailureKind::Transport, "boom"),
        };

        assert!(ok.is_success());
        assert!(!failed.is_success());
        assert_eq!(failed.draw_number().as_str(), "2");
    }

    #[test]
    fn event_serialization_is_tagged() {
        let event = Event::DrawFetched {
            draw_number: "1001".into(),
            progress: Progress {
                processed: 1,
                total: 3,
            },
        };

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "draw_fetched");
        assert_eq!(value["draw_number"], "1001");
        assert_eq!(value["progress"]["total"], 3);
    }
}
