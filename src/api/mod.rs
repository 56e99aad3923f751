//! All API endpoint setup

use axum::Router;
use axum::routing::delete;
use axum::routing::get;
use axum::routing::patch;
use axum::routing::post;

pub use request::Form;
pub use request::PathParameters;
pub use request::parse_url;
pub use response::Error;
pub use response::Success;

use crate::storage::Storage;

mod links;
mod projects;
mod request;
mod response;
mod utils;

/// Get the Axum router for all API routes
pub fn router<S: Storage>() -> Router {
    let projects = Router::new()
        .route("/", get(projects::list::<S>))
        .route("/", post(projects::create::<S>))
        .route("/{project}", get(projects::single::<S>))
        .route("/{project}", patch(projects::update::<S>))
        .route("/{project}/links", get(links::list::<S>))
        .route("/{project}/links", post(links::create::<S>));

    let links = Router::new()
        .route("/{code}", delete(links::deactivate::<S>))
        .route("/{code}/clicks", get(links::clicks::<S>))
        .route("/{code}/stats", get(links::stats::<S>));

    Router::new()
        .nest("/projects", projects)
        .nest("/links", links)
}
