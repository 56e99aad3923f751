//! Links API endpoints
//!
//! Minting codes, deactivating links, and reading their click stats

use axum::Extension;
use axum::extract::Query;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use crate::analytics;
use crate::analytics::ClickEvent;
use crate::analytics::DailyCount;
use crate::codes;
use crate::codes::DEFAULT_CODE_LENGTH;
use crate::links::Link;
use crate::platform::Platform;
use crate::storage;
use crate::storage::CreateLinkValues;
use crate::storage::Storage;

use super::Error;
use super::Form;
use super::PathParameters;
use super::Success;
use super::utils::fetch_link;
use super::utils::fetch_project;

/// Times a lost uniqueness race leads to a fresh code draw
const CREATE_ATTEMPTS: usize = 3;

/// Default stats window, matching the original dashboard view
const DEFAULT_STATS_DAYS: i64 = 7;

/// Link response going to the user
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkResponse {
    /// Link ID
    pub id: Uuid,

    /// Owning project
    pub project_id: Uuid,

    /// The short code, immutable once issued
    pub code: String,

    /// Creation date
    pub created_at: NaiveDateTime,

    /// Optional expiry
    pub expires_at: Option<NaiveDateTime>,

    /// Deactivation date, set by the soft delete
    pub deactivated_at: Option<NaiveDateTime>,
}

impl LinkResponse {
    /// Create a response from a [`Link`](Link)
    fn from_link(link: Link) -> Self {
        Self {
            id: link.id,
            project_id: link.project_id,
            code: link.code,
            created_at: link.created_at,
            expires_at: link.expires_at,
            deactivated_at: link.deactivated_at,
        }
    }

    /// Create a response from multiple [`Link`](Link)s
    fn from_link_multiple(links: Vec<Link>) -> Vec<Self> {
        links.into_iter().map(Self::from_link).collect()
    }
}

/// Create link form
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLinkForm {
    /// Optional expiry
    expires_at: Option<NaiveDateTime>,

    /// Optional code length, widened by callers that ran into an exhausted
    /// code space
    code_length: Option<usize>,
}

/// Mint a new link for a project
///
/// Request:
/// ```sh
/// curl -v -X POST -H 'Content-Type: application/json' \
///     --data '{}' \
///     http://localhost:7000/api/projects/<uuid>/links
/// ```
///
/// Response:
/// ```json
/// { "data": { "id": "<uuid>", "code": "xK9mP2", ... } }
/// ```
pub async fn create<S: Storage>(
    Extension(storage): Extension<S>,
    PathParameters(project_id): PathParameters<Uuid>,
    Form(form): Form<CreateLinkForm>,
) -> Result<Success<LinkResponse>, Error> {
    let project = fetch_project(&storage, &project_id).await?;

    let length = form.code_length.unwrap_or(DEFAULT_CODE_LENGTH);

    // the storage uniqueness constraint is the backstop; losing the race
    // between the existence check and the insert means drawing again
    for _ in 0..CREATE_ATTEMPTS {
        let code = codes::generate_code(&storage, length)
            .await
            .map_err(code_error)?;

        match storage
            .create_link(&CreateLinkValues {
                project: &project,
                code: &code,
                expires_at: form.expires_at,
            })
            .await
        {
            Ok(link) => return Ok(Success::created(LinkResponse::from_link(link))),
            Err(storage::Error::DuplicateCode) => continue,
            Err(err) => return Err(Error::internal_server_error(err)),
        }
    }

    Err(Error::conflict(codes::Error::SpaceExhausted { length }))
}

/// List all links of a project
pub async fn list<S: Storage>(
    Extension(storage): Extension<S>,
    PathParameters(project_id): PathParameters<Uuid>,
) -> Result<Success<Vec<LinkResponse>>, Error> {
    let project = fetch_project(&storage, &project_id).await?;

    let links = storage
        .find_all_links_by_project(&project)
        .await
        .map_err(Error::internal_server_error)?;

    Ok(Success::ok(LinkResponse::from_link_multiple(links)))
}

/// Deactivate a link (soft delete)
///
/// Idempotent; deactivating an already deactivated link is a no-op.
pub async fn deactivate<S: Storage>(
    Extension(storage): Extension<S>,
    PathParameters(code): PathParameters<String>,
) -> Result<Success<()>, Error> {
    let link = fetch_link(&storage, &code).await?;

    storage
        .deactivate_link(&link)
        .await
        .map_err(Error::internal_server_error)?;

    Ok(Success::no_content())
}

/// Stats query range, inclusive on both ends
#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    /// First day of the range, defaults to seven days back
    from: Option<NaiveDate>,

    /// Last day of the range, defaults to today
    to: Option<NaiveDate>,
}

/// Per-platform, per-day click counts of a link
///
/// Request:
/// ```sh
/// curl -v 'http://localhost:7000/api/links/xK9mP2/stats?from=2026-08-21&to=2026-08-28'
/// ```
///
/// Response:
/// ```json
/// { "data": [ { "day": "2026-08-28", "platform": "ios", "clicks": 12 } ] }
/// ```
pub async fn stats<S: Storage>(
    Extension(storage): Extension<S>,
    PathParameters(code): PathParameters<String>,
    Query(query): Query<StatsQuery>,
) -> Result<Success<Vec<DailyCount>>, Error> {
    let link = fetch_link(&storage, &code).await?;

    let today = Utc::now().date_naive();
    let to = query.to.unwrap_or(today);
    let from = query
        .from
        .unwrap_or_else(|| to - chrono::Duration::days(DEFAULT_STATS_DAYS - 1));

    if from > to {
        return Err(Error::bad_request("Range start is after range end"));
    }

    let counts = analytics::stats(&storage, &link.code, from, to)
        .await
        .map_err(Error::internal_server_error)?;

    Ok(Success::ok(counts))
}

/// Single click event going to the user
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickResponse {
    /// Event ID
    pub id: Uuid,

    /// Platform the user agent was classified as
    pub platform: Platform,

    /// URL the click was redirected to
    pub resolved_url: String,

    /// Raw user agent header, when one was sent
    pub user_agent_raw: Option<String>,

    /// Click date
    pub created_at: NaiveDateTime,
}

impl ClickResponse {
    /// Create a response from a [`ClickEvent`](ClickEvent)
    fn from_event(event: ClickEvent) -> Self {
        Self {
            id: event.id,
            platform: event.platform,
            resolved_url: event.resolved_url,
            user_agent_raw: event.user_agent_raw,
            created_at: event.created_at,
        }
    }
}

/// Raw click log of a link, newest first
///
/// Request:
/// ```sh
/// curl -v http://localhost:7000/api/links/xK9mP2/clicks
/// ```
pub async fn clicks<S: Storage>(
    Extension(storage): Extension<S>,
    PathParameters(code): PathParameters<String>,
) -> Result<Success<Vec<ClickResponse>>, Error> {
    let link = fetch_link(&storage, &code).await?;

    let events = storage
        .find_all_clicks_by_link(&link.code)
        .await
        .map_err(Error::internal_server_error)?;

    Ok(Success::ok(
        events.into_iter().map(ClickResponse::from_event).collect(),
    ))
}

/// Map a code generation error onto an API error
fn code_error(err: codes::Error) -> Error {
    match err {
        codes::Error::SpaceExhausted { .. } => Error::conflict(err),
        codes::Error::Storage(err) => Error::internal_server_error(err),
    }
}
