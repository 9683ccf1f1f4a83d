//! Raw-sample retrieval from the external measurement store.

pub mod es;

use crate::model::RawSample;
use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("sample query failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("sample store returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("unexpected sample payload: {0}")]
    Payload(String),
}

/// A backend that can answer "all throughput samples in [from, to)".
#[async_trait::async_trait]
pub trait SampleSource: Send + Sync {
    async fn fetch(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<RawSample>, SourceError>;
}

/// Split [from, to) into consecutive sub-ranges of at most `width`.
/// The final range is shortened to end exactly at `to`.
pub(crate) fn split_window(
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    width: Duration,
) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
    let mut ranges = Vec::new();
    let mut cursor = from;
    while cursor < to {
        let end = std::cmp::min(cursor + width, to);
        ranges.push((cursor, end));
        cursor = end;
    }
    ranges
}

/// Fetch a whole analysis window in sub-range portions and concatenate.
///
/// The store caps aggregation cardinality per query, so long windows must be
/// queried piecewise. Partial results must never be scored (group statistics
/// need the complete window), so the first failed sub-range aborts the fetch.
pub async fn fetch_window(
    source: &dyn SampleSource,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    subwindow: Duration,
) -> Result<Vec<RawSample>, SourceError> {
    let mut samples = Vec::new();
    for (start, end) in split_window(from, to, subwindow) {
        samples.extend(source.fetch(start, end).await?);
    }
    Ok(samples)
}
