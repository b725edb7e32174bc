/*
[INPUT]:  Tail source (category + subject, or execute menu item)
[OUTPUT]: Plain-text log content served by the console
[POS]:    HTTP layer - tail endpoints
[UPDATE]: When tail routes change
*/

use async_trait::async_trait;
use reqwest::Method;
use tracing::trace;

use crate::http::{ConsoleClient, Result};
use crate::types::{Category, TailSource};

/// Anything able to fetch the tail of a command run
///
/// The poller only depends on this trait so tests and alternative transports
/// can stand in for the HTTP client.
#[async_trait]
pub trait TailFetcher: Send + Sync {
    async fn fetch_tail(&self, source: &TailSource) -> Result<String>;
}

impl ConsoleClient {
    /// Fetch the current output of a command run
    ///
    /// GET /{category}/tail/{subject}
    /// GET /execute/tail?mname={menu}&gname={group}
    pub async fn tail(&self, source: &TailSource) -> Result<String> {
        let mut url = self.endpoint_url(&source.tail_segments())?;
        let query = source.tail_query();
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }

        let builder = self.request(Method::GET, url);
        let body = self.send_text(builder).await?;
        trace!(source = %source, bytes = body.len(), "tail fetched");
        Ok(body)
    }

    /// GET /{category}/tail/{subject}
    pub async fn tail_command(&self, category: Category, subject: &str) -> Result<String> {
        self.tail(&TailSource::command(category, subject)).await
    }
}

#[async_trait]
impl TailFetcher for ConsoleClient {
    async fn fetch_tail(&self, source: &TailSource) -> Result<String> {
        self.tail(source).await
    }
}
