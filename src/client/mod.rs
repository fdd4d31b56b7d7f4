//! Lottery service client.
//!
//! - [`LotteryApi`] - the two calls the harvest needs from the service
//! - [`HttpLotteryApi`] - production implementation over HTTP form posts

mod http;

pub use http::HttpLotteryApi;

use crate::error::Result;
use crate::types::{DrawNumber, DrawQuery, DrawRecord};

/// Abstraction over the remote lottery service, enabling testability.
#[async_trait::async_trait]
pub trait LotteryApi: Send + Sync {
    /// List every draw the service knows about in the query's date range.
    ///
    /// Errors here are fatal to a harvest: without the list there is nothing
    /// to fetch.
    async fn fetch_draw_numbers(&self, query: &DrawQuery) -> Result<Vec<DrawNumber>>;

    /// Fetch the full record of a single draw.
    ///
    /// The body is returned as-is; its inner shape is not validated.
    async fn fetch_draw(&self, draw_number: &DrawNumber) -> Result<DrawRecord>;
}
