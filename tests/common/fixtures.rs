//! Draw fixtures shared by the integration tests

use chrono::NaiveDate;
use lotto_history::{Config, DrawQuery, DrawRecord};
use serde_json::{Value, json};

/// A `data.drawDetails`-shaped response body for `draw_number`
pub fn draw_body(draw_number: &str) -> Value {
    json!({
        "data": {
            "drawDetails": {
                "drawNumber": draw_number,
                "winningNumbers": "1,2,3"
            }
        }
    })
}

/// [`draw_body`] wrapped as a record
pub fn draw_record(draw_number: &str) -> DrawRecord {
    DrawRecord::new(draw_body(draw_number))
}

/// A history response listing `draw_numbers`
pub fn history_body(draw_numbers: &[&str]) -> Value {
    let data: Vec<Value> = draw_numbers
        .iter()
        .map(|d| json!({"drawNumber": d, "drawDate": "2024/11/30"}))
        .collect();
    json!({ "data": data })
}

/// Query covering all of 2024
pub fn query_2024() -> DrawQuery {
    DrawQuery::new(
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default(),
        NaiveDate::from_ymd_opt(2024, 12, 31).unwrap_or_default(),
        "LOTTO",
    )
}

/// Default config writing into `output_dir` with `workers` workers
pub fn config_in(output_dir: &std::path::Path, workers: usize) -> Config {
    let mut config = Config::default();
    config.output.output_dir = output_dir.to_path_buf();
    config.dispatch.worker_count = workers;
    config
}
