//! Utility functions for the API

use uuid::Uuid;

use crate::api::Error;
use crate::links::Link;
use crate::projects::Project;
use crate::storage::Storage;

/// Fetch a project from storage
pub async fn fetch_project<S: Storage>(storage: &S, project_id: &Uuid) -> Result<Project, Error> {
    storage
        .find_single_project_by_id(project_id)
        .await
        .map_err(Error::internal_server_error)?
        .map_or_else(|| Err(Error::not_found("Project not found")), Ok)
}

/// Fetch a link from storage by its code
pub async fn fetch_link<S: Storage>(storage: &S, code: &str) -> Result<Link, Error> {
    storage
        .find_single_link_by_code(code)
        .await
        .map_err(Error::internal_server_error)?
        .map_or_else(|| Err(Error::not_found("Link not found")), Ok)
}
