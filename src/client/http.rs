//! HTTP implementation of [`LotteryApi`].
//!
//! The service speaks AJAX-style form posts: every request is a POST with a
//! url-encoded body and `isAjax=true`, and every response is JSON.

use serde_json::Value;
use tracing::debug;

use super::LotteryApi;
use crate::config::ApiConfig;
use crate::error::{Error, Result};
use crate::types::{DrawNumber, DrawQuery, DrawRecord};

/// Date format the history endpoint expects
const DATE_FORMAT: &str = "%d/%m/%Y";

/// Production [`LotteryApi`] backed by a shared reqwest client.
#[derive(Clone, Debug)]
pub struct HttpLotteryApi {
    client: reqwest::Client,
    config: ApiConfig,
}

impl HttpLotteryApi {
    /// Create a client for the configured endpoints
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created
    pub fn new(config: ApiConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.clone());
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| Error::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// The endpoint configuration this client posts to
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// POST a form to `url` and parse the JSON body.
    async fn post_form(&self, url: &str, form: &[(&str, String)]) -> Result<Value> {
        let response = self
            .client
            .post(url)
            .form(form)
            .send()
            .await
            .map_err(|e| {
                let message = if e.is_timeout() {
                    format!("Timeout posting to '{}'", url)
                } else if e.is_connect() {
                    format!("Connection failed for '{}': {}", url, e)
                } else {
                    format!("Request to '{}' failed: {}", url, e)
                };
                Error::Transport(message)
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Transport(format!("HTTP {} from '{}'", status, url)));
        }

        let body = response.bytes().await.map_err(|e| {
            Error::Transport(format!("Failed to read response body from '{}': {}", url, e))
        })?;

        serde_json::from_slice(&body).map_err(|e| {
            Error::MalformedResponse(format!("Response from '{}' is not JSON: {}", url, e))
        })
    }
}

/// Pull the draw numbers out of a history response.
///
/// Expects `{"data": [{"drawNumber": ...}, ...]}`, in the order the service
/// listed them.
fn parse_draw_numbers(body: &Value) -> Result<Vec<DrawNumber>> {
    let entries = body
        .get("data")
        .ok_or_else(|| Error::MalformedResponse("history response has no 'data' field".into()))?
        .as_array()
        .ok_or_else(|| Error::MalformedResponse("history 'data' field is not an array".into()))?;

    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            entry
                .get("drawNumber")
                .and_then(DrawNumber::from_json)
                .ok_or_else(|| {
                    Error::MalformedResponse(format!(
                        "history entry {} has no usable 'drawNumber'",
                        index
                    ))
                })
        })
        .collect()
}

#[async_trait::async_trait]
impl LotteryApi for HttpLotteryApi {
    async fn fetch_draw_numbers(&self, query: &DrawQuery) -> Result<Vec<DrawNumber>> {
        let form = [
            ("gameName", query.game_name.clone()),
            ("startDate", query.start_date.format(DATE_FORMAT).to_string()),
            ("endDate", query.end_date.format(DATE_FORMAT).to_string()),
            ("offset", "0".to_string()),
            ("limit", self.config.history_limit.to_string()),
            ("isAjax", "true".to_string()),
        ];

        debug!(
            game = %query.game_name,
            start = %query.start_date,
            end = %query.end_date,
            "Fetching draw history"
        );
        let body = self.post_form(&self.config.history_url, &form).await?;
        let draw_numbers = parse_draw_numbers(&body)?;

        if draw_numbers.len() >= self.config.history_limit as usize {
            tracing::warn!(
                limit = self.config.history_limit,
                "History response hit the result limit; older draws may be missing"
            );
        }

        Ok(draw_numbers)
    }

    async fn fetch_draw(&self, draw_number: &DrawNumber) -> Result<DrawRecord> {
        let form = [
            ("drawNumber", draw_number.to_string()),
            ("gameName", self.config.game_name.clone()),
            ("isAjax", "true".to_string()),
        ];

        debug!(draw_number = %draw_number, "Fetching draw");
        let body = self.post_form(&self.config.draw_url, &form).await?;
        Ok(DrawRecord::new(body))
    }
}
