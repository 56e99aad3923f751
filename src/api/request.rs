//! API request helpers

use axum::extract::FromRequest;
use axum::extract::FromRequestParts;
use axum::extract::Json;
use axum::extract::Path;
use axum::extract::Request;
use axum::extract::rejection::JsonRejection;
use axum::extract::rejection::PathRejection;
use axum::http::request::Parts;
use serde::de::DeserializeOwned;
use url::Url;

use super::Error;

/// Parse and validate a URL
pub fn parse_url<I>(url: I) -> Result<Url, Error>
where
    I: AsRef<str>,
{
    Url::parse(url.as_ref()).map_err(Error::bad_request)
}

/// JSON body extractor with friendlier rejections
pub struct Form<F>(pub F);

impl<S, F> FromRequest<S> for Form<F>
where
    S: Send + Sync,
    F: DeserializeOwned,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<F>::from_request(req, state).await {
            Ok(Json(form)) => Ok(Form(form)),
            Err(rejection) => Err(json_error(&rejection)),
        }
    }
}

fn json_error(rejection: &JsonRejection) -> Error {
    match rejection {
        JsonRejection::JsonDataError(err) => {
            Error::bad_request("Data error").with_description(err)
        }
        JsonRejection::JsonSyntaxError(err) => {
            Error::bad_request("JSON syntax error").with_description(err)
        }
        JsonRejection::MissingJsonContentType(_) => {
            Error::bad_request("Missing `application/json` content type")
        }
        err => Error::bad_request("Could not read JSON body").with_description(err),
    }
}

/// Typed path parameter extractor
pub struct PathParameters<P>(pub P);

impl<S, P> FromRequestParts<S> for PathParameters<P>
where
    S: Send + Sync,
    P: DeserializeOwned + Send,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<P>::from_request_parts(parts, state).await {
            Ok(Path(path)) => Ok(PathParameters(path)),
            Err(rejection) => Err(path_error(&rejection)),
        }
    }
}

fn path_error(rejection: &PathRejection) -> Error {
    match rejection {
        PathRejection::FailedToDeserializePathParams(err) => {
            Error::bad_request("Invalid path parameter").with_description(err)
        }
        PathRejection::MissingPathParams(err) => {
            Error::bad_request("Missing path parameter").with_description(err)
        }
        err => Error::bad_request("Could not read path parameters").with_description(err),
    }
}
