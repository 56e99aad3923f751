//! Click analytics
//!
//! One [`ClickEvent`] is appended per successful resolution, together with an
//! atomic bump of the matching aggregate counter bucket. Events are the
//! source of truth; the counters exist for fast stats reads and can be
//! recomputed from the events at any time.

use chrono::NaiveDate;
use chrono::naive::NaiveDateTime;
use serde::Serialize;
use uuid::Uuid;

use crate::platform::Platform;
use crate::storage;
use crate::storage::RecordClickValues;
use crate::storage::Storage;

/// Immutable record of one resolution attempt
#[derive(Clone, Debug)]
pub struct ClickEvent {
    pub id: Uuid,
    pub link_code: String,
    pub platform: Platform,
    pub resolved_url: String,
    pub user_agent_raw: Option<String>,
    pub created_at: NaiveDateTime,
}

/// Aggregated clicks of one link for one platform on one day
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyCount {
    /// Day bucket, UTC
    pub day: NaiveDate,

    /// Classified platform
    pub platform: Platform,

    /// Monotonically increasing click count
    pub clicks: u64,
}

/// Record a single click, best effort
///
/// Failures are logged and swallowed: the redirect response never depends on
/// the analytics subsystem. An occasional duplicate under retries shows up
/// as an extra count, which is acceptable.
pub async fn record<S: Storage>(storage: &S, values: RecordClickValues<'_>) {
    if let Err(err) = storage.record_click(&values).await {
        tracing::warn!(
            "Failed to record click for \"{}\": {err}",
            values.link_code
        );
    }
}

/// Per-platform, per-day click counts for an inclusive day range
///
/// Reads the aggregate counters; when those cannot be read, falls back to
/// scanning and re-aggregating the click events.
pub async fn stats<S: Storage>(
    storage: &S,
    link_code: &str,
    from: NaiveDate,
    to: NaiveDate,
) -> storage::Result<Vec<DailyCount>> {
    match storage.fetch_daily_counts(link_code, from, to).await {
        Ok(counts) => Ok(counts),
        Err(err) => {
            tracing::warn!("Counters unavailable for \"{link_code}\", scanning events: {err}");

            storage.scan_click_events(link_code, from, to).await
        }
    }
}
