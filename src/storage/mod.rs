//! All things related to the storage of projects, links, and click analytics
//!
//! The [`Storage`] trait is the persistence boundary of the resolution
//! engine. The two operations with shared mutable state live here: code
//! uniqueness on link creation (check-then-act, enforced by the backend) and
//! the aggregate counter increments (read-modify-write, atomic per backend).

use async_trait::async_trait;
use chrono::NaiveDate;
use chrono::naive::NaiveDateTime;
use thiserror::Error;
use uuid::Uuid;

use crate::analytics::ClickEvent;
use crate::analytics::DailyCount;
use crate::links::Link;
use crate::platform::Platform;
use crate::projects::Project;

pub use memory::Memory;
#[cfg(feature = "postgres")]
pub use postgres::Postgres;

mod memory;
#[cfg(feature = "postgres")]
mod postgres;

/// Setup the storage
#[cfg(not(feature = "postgres"))]
#[allow(clippy::unused_async)]
pub async fn setup() -> Memory {
    Memory::new()
}

/// Setup the storage
#[cfg(feature = "postgres")]
pub async fn setup() -> Postgres {
    Postgres::new().await
}

/// Storage errors
#[derive(Debug, Error)]
pub enum Error {
    /// A connection error with the storage
    ///
    /// Infrastructure failure, distinct from a legitimate "not found"
    #[error("Connection error: {0}")]
    Connection(String),

    /// The code is already taken by another link
    ///
    /// Backstop for the uniqueness invariant under concurrent creation; the
    /// creation path reacts by drawing a fresh code
    #[error("Code is already in use")]
    DuplicateCode,
}

/// Result type for all storage interactions
pub type Result<T> = core::result::Result<T, Error>;

/// Values to create a Project
pub struct CreateProjectValues<'a> {
    /// Display name of the application
    pub name: &'a str,

    /// App Store destination
    pub ios_url: Option<&'a str>,

    /// Play Store destination
    pub android_url: Option<&'a str>,

    /// Destination for desktop and unrecognized devices
    pub fallback_url: Option<&'a str>,
}

/// Values to update a Project
///
/// `None` leaves the field untouched, `Some(None)` clears it
pub struct UpdateProjectValues<'a> {
    /// New display name
    pub name: Option<&'a str>,

    /// New App Store destination
    pub ios_url: Option<Option<&'a str>>,

    /// New Play Store destination
    pub android_url: Option<Option<&'a str>>,

    /// New fallback destination
    pub fallback_url: Option<Option<&'a str>>,
}

/// Values to create a Link
pub struct CreateLinkValues<'a> {
    /// The owning project
    pub project: &'a Project,

    /// The short code, freshly generated and checked for uniqueness
    pub code: &'a str,

    /// Optional expiry
    pub expires_at: Option<NaiveDateTime>,
}

/// Values to record one click
pub struct RecordClickValues<'a> {
    /// Code of the resolved link
    pub link_code: &'a str,

    /// Classified platform of the requesting device
    pub platform: Platform,

    /// The URL the request was redirected to
    pub resolved_url: &'a str,

    /// Raw user agent, stored for audit, never parsed again
    pub user_agent_raw: Option<&'a str>,

    /// Moment of the resolution
    pub timestamp: NaiveDateTime,
}

/// Storage with all supported operations
#[async_trait]
pub trait Storage: Clone + Send + Sync + 'static {
    /// Find all projects
    async fn find_all_projects(&self) -> Result<Vec<Project>>;

    /// Find a single project by its ID
    async fn find_single_project_by_id(&self, id: &Uuid) -> Result<Option<Project>>;

    /// Create a project
    async fn create_project(&self, values: &CreateProjectValues<'_>) -> Result<Project>;

    /// Update a project
    async fn update_project(
        &self,
        project: &Project,
        values: &UpdateProjectValues<'_>,
    ) -> Result<Project>;

    /// Find a single link by its code
    ///
    /// DOES NOT respect deactivation or expiry, handle with care
    async fn find_single_link_by_code(&self, code: &str) -> Result<Option<Link>>;

    /// Find all links of a project
    async fn find_all_links_by_project(&self, project: &Project) -> Result<Vec<Link>>;

    /// Does any link, active or deactivated, use this code?
    async fn code_exists(&self, code: &str) -> Result<bool>;

    /// Create a link
    ///
    /// Code uniqueness is enforced atomically by the backend; a lost race
    /// surfaces as [`Error::DuplicateCode`]
    async fn create_link(&self, values: &CreateLinkValues<'_>) -> Result<Link>;

    /// Deactivate a link (soft delete)
    async fn deactivate_link(&self, link: &Link) -> Result<()>;

    /// Append a click event and bump the matching counter bucket
    ///
    /// Both writes happen atomically, the increment never loses updates
    /// under concurrent resolutions
    async fn record_click(&self, values: &RecordClickValues<'_>) -> Result<()>;

    /// Read the aggregate counters of a link for an inclusive day range
    async fn fetch_daily_counts(
        &self,
        link_code: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DailyCount>>;

    /// Recompute daily counts by scanning the click events
    ///
    /// Repair path for when the counters cannot be read; events are the
    /// source of truth
    async fn scan_click_events(
        &self,
        link_code: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DailyCount>>;

    /// All recorded click events of a link, newest first
    async fn find_all_clicks_by_link(&self, link_code: &str) -> Result<Vec<ClickEvent>>;
}
