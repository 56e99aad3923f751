//! Postgres storage
//!
//! Runtime-checked queries; the uniqueness constraint on `links.code` and
//! the `ON CONFLICT` counter upsert carry the concurrency discipline.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use crate::analytics::ClickEvent;
use crate::analytics::DailyCount;
use crate::links::Link;
use crate::platform::Platform;
use crate::projects::Project;

use super::CreateLinkValues;
use super::CreateProjectValues;
use super::Error;
use super::RecordClickValues;
use super::Result;
use super::Storage;
use super::UpdateProjectValues;

/// Migrator to run migrations on startup
static MIGRATOR: Migrator = sqlx::migrate!();

/// Postgres storage
#[derive(Clone)]
pub struct Postgres {
    /// Pool of connections
    connection_pool: PgPool,
}

impl Postgres {
    /// Create Postgres storage
    ///
    /// Use the `DATABASE_URL` environment variable
    ///
    /// Migrations will be run
    pub async fn new() -> Self {
        let database_connection_string = std::env::var("DATABASE_URL").expect("Valid DATABASE_URL");

        let connection_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&database_connection_string)
            .await
            .expect("Valid connection");

        Self::new_with_pool(connection_pool).await
    }

    /// Create Postgres storage with existing pool
    ///
    /// Migrations will be run
    pub async fn new_with_pool(connection_pool: PgPool) -> Self {
        let migration_result = MIGRATOR.run(&connection_pool).await;

        if let Err(err) = migration_result {
            panic!("Migrations could not run: {err}");
        }

        Self { connection_pool }
    }
}

/// Postgres version of a project
#[derive(sqlx::FromRow)]
struct ProjectRow {
    id: Uuid,
    name: String,
    ios_url: Option<String>,
    android_url: Option<String>,
    fallback_url: Option<String>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

impl ProjectRow {
    fn into_project(self) -> Project {
        Project {
            id: self.id,
            name: self.name,
            ios_url: self.ios_url,
            android_url: self.android_url,
            fallback_url: self.fallback_url,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Postgres version of a link
#[derive(sqlx::FromRow)]
struct LinkRow {
    id: Uuid,
    project_id: Uuid,
    code: String,
    created_at: NaiveDateTime,
    expires_at: Option<NaiveDateTime>,
    deactivated_at: Option<NaiveDateTime>,
}

impl LinkRow {
    fn into_link(self) -> Link {
        Link {
            id: self.id,
            project_id: self.project_id,
            code: self.code,
            created_at: self.created_at,
            expires_at: self.expires_at,
            deactivated_at: self.deactivated_at,
        }
    }
}

/// Postgres version of a click event
#[derive(sqlx::FromRow)]
struct ClickEventRow {
    id: Uuid,
    link_code: String,
    platform: String,
    resolved_url: String,
    user_agent_raw: Option<String>,
    created_at: NaiveDateTime,
}

impl ClickEventRow {
    fn into_click_event(self) -> ClickEvent {
        ClickEvent {
            id: self.id,
            link_code: self.link_code,
            platform: parse_platform(&self.platform),
            resolved_url: self.resolved_url,
            user_agent_raw: self.user_agent_raw,
            created_at: self.created_at,
        }
    }
}

/// Postgres version of a daily count
#[derive(sqlx::FromRow)]
struct DailyCountRow {
    day: NaiveDate,
    platform: String,
    clicks: i64,
}

impl DailyCountRow {
    fn into_daily_count(self) -> DailyCount {
        DailyCount {
            day: self.day,
            platform: parse_platform(&self.platform),
            clicks: self.clicks.try_into().unwrap_or_default(),
        }
    }
}

/// Platform column values are written by us; anything unexpected maps to
/// the classifier's safe default
fn parse_platform(value: &str) -> Platform {
    value.parse().unwrap_or(Platform::Other)
}

#[async_trait]
impl Storage for Postgres {
    async fn find_all_projects(&self) -> Result<Vec<Project>> {
        let projects = sqlx::query_as::<_, ProjectRow>(
            r"
            SELECT *
            FROM projects
            ORDER BY created_at DESC
            ",
        )
        .fetch_all(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(projects.into_iter().map(ProjectRow::into_project).collect())
    }

    async fn find_single_project_by_id(&self, id: &Uuid) -> Result<Option<Project>> {
        let project = sqlx::query_as::<_, ProjectRow>(
            r"
            SELECT *
            FROM projects
            WHERE id = $1
            LIMIT 1
            ",
        )
        .bind(id)
        .fetch_optional(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(project.map(ProjectRow::into_project))
    }

    async fn create_project(&self, values: &CreateProjectValues<'_>) -> Result<Project> {
        let project = sqlx::query_as::<_, ProjectRow>(
            r"
            INSERT INTO projects (id, name, ios_url, android_url, fallback_url)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            ",
        )
        .bind(Uuid::new_v4())
        .bind(values.name)
        .bind(values.ios_url)
        .bind(values.android_url)
        .bind(values.fallback_url)
        .fetch_one(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(project.into_project())
    }

    async fn update_project(
        &self,
        project: &Project,
        values: &UpdateProjectValues<'_>,
    ) -> Result<Project> {
        let updated_project = sqlx::query_as::<_, ProjectRow>(
            r"
            UPDATE projects
            SET name = $1, ios_url = $2, android_url = $3, fallback_url = $4,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $5
            RETURNING *
            ",
        )
        .bind(values.name.unwrap_or(&project.name))
        .bind(values.ios_url.unwrap_or(project.ios_url.as_deref()))
        .bind(values.android_url.unwrap_or(project.android_url.as_deref()))
        .bind(
            values
                .fallback_url
                .unwrap_or(project.fallback_url.as_deref()),
        )
        .bind(project.id)
        .fetch_one(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(updated_project.into_project())
    }

    async fn find_single_link_by_code(&self, code: &str) -> Result<Option<Link>> {
        let link = sqlx::query_as::<_, LinkRow>(
            r"
            SELECT *
            FROM links
            WHERE code = $1
            LIMIT 1
            ",
        )
        .bind(code)
        .fetch_optional(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(link.map(LinkRow::into_link))
    }

    async fn find_all_links_by_project(&self, project: &Project) -> Result<Vec<Link>> {
        let links = sqlx::query_as::<_, LinkRow>(
            r"
            SELECT *
            FROM links
            WHERE project_id = $1
            ORDER BY created_at DESC
            ",
        )
        .bind(project.id)
        .fetch_all(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(links.into_iter().map(LinkRow::into_link).collect())
    }

    async fn code_exists(&self, code: &str) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            r"
            SELECT EXISTS (SELECT 1 FROM links WHERE code = $1)
            ",
        )
        .bind(code)
        .fetch_one(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(exists)
    }

    async fn create_link(&self, values: &CreateLinkValues<'_>) -> Result<Link> {
        let link = sqlx::query_as::<_, LinkRow>(
            r"
            INSERT INTO links (id, project_id, code, expires_at)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            ",
        )
        .bind(Uuid::new_v4())
        .bind(values.project.id)
        .bind(values.code)
        .bind(values.expires_at)
        .fetch_one(&self.connection_pool)
        .await
        .map_err(|err| {
            if err
                .as_database_error()
                .is_some_and(|err| err.is_unique_violation())
            {
                Error::DuplicateCode
            } else {
                connection_error(err)
            }
        })?;

        Ok(link.into_link())
    }

    async fn deactivate_link(&self, link: &Link) -> Result<()> {
        sqlx::query(
            r"
            UPDATE links
            SET deactivated_at = CURRENT_TIMESTAMP
            WHERE id = $1 AND deactivated_at IS NULL
            ",
        )
        .bind(link.id)
        .execute(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(())
    }

    async fn record_click(&self, values: &RecordClickValues<'_>) -> Result<()> {
        let mut transaction = self
            .connection_pool
            .begin()
            .await
            .map_err(connection_error)?;

        sqlx::query(
            r"
            INSERT INTO click_events (id, link_code, platform, resolved_url, user_agent_raw, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(Uuid::new_v4())
        .bind(values.link_code)
        .bind(values.platform.as_str())
        .bind(values.resolved_url)
        .bind(values.user_agent_raw)
        .bind(values.timestamp)
        .execute(&mut *transaction)
        .await
        .map_err(connection_error)?;

        // atomic read-modify-write, safe across server instances
        sqlx::query(
            r"
            INSERT INTO click_counters (link_code, platform, day, clicks)
            VALUES ($1, $2, $3, 1)
            ON CONFLICT (link_code, platform, day)
            DO UPDATE SET clicks = click_counters.clicks + 1
            ",
        )
        .bind(values.link_code)
        .bind(values.platform.as_str())
        .bind(values.timestamp.date())
        .execute(&mut *transaction)
        .await
        .map_err(connection_error)?;

        transaction.commit().await.map_err(connection_error)?;

        Ok(())
    }

    async fn fetch_daily_counts(
        &self,
        link_code: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DailyCount>> {
        let counts = sqlx::query_as::<_, DailyCountRow>(
            r"
            SELECT day, platform, clicks
            FROM click_counters
            WHERE link_code = $1 AND day BETWEEN $2 AND $3
            ORDER BY day, platform
            ",
        )
        .bind(link_code)
        .bind(from)
        .bind(to)
        .fetch_all(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(counts
            .into_iter()
            .map(DailyCountRow::into_daily_count)
            .collect())
    }

    async fn scan_click_events(
        &self,
        link_code: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DailyCount>> {
        let counts = sqlx::query_as::<_, DailyCountRow>(
            r"
            SELECT created_at::date AS day, platform, COUNT(*) AS clicks
            FROM click_events
            WHERE link_code = $1 AND created_at::date BETWEEN $2 AND $3
            GROUP BY day, platform
            ORDER BY day, platform
            ",
        )
        .bind(link_code)
        .bind(from)
        .bind(to)
        .fetch_all(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(counts
            .into_iter()
            .map(DailyCountRow::into_daily_count)
            .collect())
    }

    async fn find_all_clicks_by_link(&self, link_code: &str) -> Result<Vec<ClickEvent>> {
        let events = sqlx::query_as::<_, ClickEventRow>(
            r"
            SELECT *
            FROM click_events
            WHERE link_code = $1
            ORDER BY created_at DESC
            ",
        )
        .bind(link_code)
        .fetch_all(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(events
            .into_iter()
            .map(ClickEventRow::into_click_event)
            .collect())
    }
}

/// Convert `SQLx` to storage connection error
fn connection_error<E>(err: E) -> Error
where
    E: std::error::Error,
{
    Error::Connection(err.to_string())
}
