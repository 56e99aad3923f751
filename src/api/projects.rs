//! Projects API endpoints
//!
//! Thin management glue around the resolution engine: a project holds the
//! candidate destination URLs its links redirect to.

use axum::Extension;
use chrono::NaiveDateTime;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use crate::projects::Project;
use crate::storage::CreateProjectValues;
use crate::storage::Storage;
use crate::storage::UpdateProjectValues;

use super::Error;
use super::Form;
use super::PathParameters;
use super::Success;
use super::parse_url;
use super::utils::fetch_project;

/// Project response going to the user
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectResponse {
    /// Project ID
    pub id: Uuid,

    /// Display name of the application
    pub name: String,

    /// App Store destination
    pub ios_url: Option<String>,

    /// Play Store destination
    pub android_url: Option<String>,

    /// Destination for desktop and unrecognized devices
    pub fallback_url: Option<String>,

    /// Creation date
    pub created_at: NaiveDateTime,

    /// Last updated at
    pub updated_at: NaiveDateTime,
}

impl ProjectResponse {
    /// Create a response from a [`Project`](Project)
    fn from_project(project: Project) -> Self {
        Self {
            id: project.id,
            name: project.name,
            ios_url: project.ios_url,
            android_url: project.android_url,
            fallback_url: project.fallback_url,
            created_at: project.created_at,
            updated_at: project.updated_at,
        }
    }

    /// Create a response from multiple [`Project`](Project)s
    fn from_project_multiple(projects: Vec<Project>) -> Vec<Self> {
        projects.into_iter().map(Self::from_project).collect()
    }
}

/// List all projects
///
/// Request:
/// ```sh
/// curl -v http://localhost:7000/api/projects
/// ```
///
/// Response:
/// ```json
/// { "data": [ { "id": "<uuid>", "name": "Example App", ... } ] }
/// ```
pub async fn list<S: Storage>(
    Extension(storage): Extension<S>,
) -> Result<Success<Vec<ProjectResponse>>, Error> {
    let projects = storage
        .find_all_projects()
        .await
        .map_err(Error::internal_server_error)?;

    Ok(Success::ok(ProjectResponse::from_project_multiple(
        projects,
    )))
}

/// Get a single project
pub async fn single<S: Storage>(
    Extension(storage): Extension<S>,
    PathParameters(project_id): PathParameters<Uuid>,
) -> Result<Success<ProjectResponse>, Error> {
    fetch_project(&storage, &project_id)
        .await
        .map(|project| Success::ok(ProjectResponse::from_project(project)))
}

/// Create project form
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectForm {
    /// Display name of the application
    name: String,

    /// App Store destination
    ios_url: Option<String>,

    /// Play Store destination
    android_url: Option<String>,

    /// Destination for desktop and unrecognized devices
    fallback_url: Option<String>,
}

/// Create a project
///
/// Request:
/// ```sh
/// curl -v -X POST -H 'Content-Type: application/json' \
///     --data '{ "name": "Example App", "iosUrl": "https://apps.apple.com/app/id123" }' \
///     http://localhost:7000/api/projects
/// ```
///
/// Response:
/// ```json
/// { "data": { "id": "<uuid>", "name": "Example App", ... } }
/// ```
pub async fn create<S: Storage>(
    Extension(storage): Extension<S>,
    Form(form): Form<CreateProjectForm>,
) -> Result<Success<ProjectResponse>, Error> {
    let ios_url = validate_optional_url(form.ios_url.as_deref())?;
    let android_url = validate_optional_url(form.android_url.as_deref())?;
    let fallback_url = validate_optional_url(form.fallback_url.as_deref())?;

    if ios_url.is_none() && android_url.is_none() && fallback_url.is_none() {
        return Err(Error::bad_request(
            "At least one destination URL must be set",
        ));
    }

    if form.name.trim().is_empty() {
        return Err(Error::bad_request("Name can not be empty"));
    }

    let project = storage
        .create_project(&CreateProjectValues {
            name: form.name.trim(),
            ios_url: ios_url.as_deref(),
            android_url: android_url.as_deref(),
            fallback_url: fallback_url.as_deref(),
        })
        .await
        .map_err(Error::internal_server_error)?;

    Ok(Success::created(ProjectResponse::from_project(project)))
}

/// Update project form
///
/// Absent fields stay untouched; URL fields set to `null` explicitly are
/// indistinguishable from absent fields in JSON, so clearing a URL is done
/// with an empty string.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProjectForm {
    /// New display name
    name: Option<String>,

    /// New App Store destination, empty string to clear
    ios_url: Option<String>,

    /// New Play Store destination, empty string to clear
    android_url: Option<String>,

    /// New fallback destination, empty string to clear
    fallback_url: Option<String>,
}

/// Update a project
///
/// The "at least one URL" invariant is re-checked against the resulting
/// project, an update can never leave a project without destinations.
pub async fn update<S: Storage>(
    Extension(storage): Extension<S>,
    PathParameters(project_id): PathParameters<Uuid>,
    Form(form): Form<UpdateProjectForm>,
) -> Result<Success<ProjectResponse>, Error> {
    let project = fetch_project(&storage, &project_id).await?;

    let ios_url = validate_url_change(form.ios_url.as_deref())?;
    let android_url = validate_url_change(form.android_url.as_deref())?;
    let fallback_url = validate_url_change(form.fallback_url.as_deref())?;

    let resulting_ios = ios_url.unwrap_or(project.ios_url.as_deref());
    let resulting_android = android_url.unwrap_or(project.android_url.as_deref());
    let resulting_fallback = fallback_url.unwrap_or(project.fallback_url.as_deref());

    if resulting_ios.is_none() && resulting_android.is_none() && resulting_fallback.is_none() {
        return Err(Error::bad_request(
            "At least one destination URL must be set",
        ));
    }

    if let Some(name) = &form.name {
        if name.trim().is_empty() {
            return Err(Error::bad_request("Name can not be empty"));
        }
    }

    let project = storage
        .update_project(
            &project,
            &UpdateProjectValues {
                name: form.name.as_deref().map(str::trim),
                ios_url,
                android_url,
                fallback_url,
            },
        )
        .await
        .map_err(Error::internal_server_error)?;

    Ok(Success::ok(ProjectResponse::from_project(project)))
}

/// Validate an optional URL on creation
fn validate_optional_url(url: Option<&str>) -> Result<Option<String>, Error> {
    url.map(|url| parse_url(url).map(|url| url.to_string()))
        .transpose()
}

/// Validate a URL change on update
///
/// `None` means untouched, `Some(None)` clears the field (empty string in
/// the form), `Some(Some(url))` replaces it
#[allow(clippy::option_option)]
fn validate_url_change(url: Option<&str>) -> Result<Option<Option<&str>>, Error> {
    match url {
        None => Ok(None),
        Some("") => Ok(Some(None)),
        Some(url) => {
            parse_url(url)?;

            Ok(Some(Some(url)))
        }
    }
}
