//! Source adapters for the XEMA observation pages
//!
//! [`MeteocatSource`] fetches the half-hourly period table, and
//! [`DailySummaryAdapter`] fetches the daily summary table.
//! [`ScriptedSource`] serves canned rows for tests and dry runs.

pub mod daily;
pub mod html;
pub mod meteocat;
pub mod scripted;

pub use daily::*;
pub use meteocat::*;
pub use scripted::*;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected status: {0}")]
    Status(u16),

    #[error("Expected table not found")]
    MissingTable,

    #[error("Table has no header cells")]
    MissingHeaders,

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

pub type IngestResult<T> = Result<T, IngestError>;

/// GET a page and return its body, failing on non-2xx statuses
pub(crate) async fn get_text(client: &reqwest::Client, url: &url::Url) -> IngestResult<String> {
    let response = client.get(url.clone()).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(IngestError::Status(status.as_u16()));
    }
    Ok(response.text().await?)
}
