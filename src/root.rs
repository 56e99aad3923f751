//! The root!
//!
//! The most important part of Switchly, the actual redirect logic

use std::str::Utf8Error;

use axum::Extension;
use axum::http::HeaderMap;
use axum::http::HeaderValue;
use axum::http::StatusCode;
use axum::http::Uri;
use axum::http::header::LOCATION;
use axum_extra::TypedHeader;
use axum_extra::headers::UserAgent;
use percent_encoding::percent_decode_str;

use crate::resolve::Resolution;
use crate::resolve::resolve;
use crate::storage::Storage;

/// The root!
///
/// All wildcard requests end up in this function.
///
/// The path is the short code; the `User-Agent` header picks the
/// destination.
pub async fn root<S: Storage>(
    user_agent: Option<TypedHeader<UserAgent>>,
    Extension(storage): Extension<S>,
    uri: Uri,
) -> Result<(StatusCode, HeaderMap), (StatusCode, String)> {
    let code = uri.path().trim_matches('/');
    let code = url_decode_code(code).map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            "URL contains invalid UTF-8 characters".to_string(),
        )
    })?;

    tracing::debug!("Looking for code: /{code}");

    let user_agent = user_agent.map(|TypedHeader(user_agent)| user_agent.to_string());
    let user_agent = user_agent.as_deref().unwrap_or_default();

    let resolution = resolve(&storage, &code, user_agent)
        .await
        .map_err(internal_error)?;

    let mut headers = HeaderMap::new();

    let status_code = match resolution {
        Resolution::Redirect(url) => {
            headers.insert(LOCATION, HeaderValue::from_str(&url).expect("Valid URL"));

            StatusCode::FOUND
        }
        Resolution::Gone => StatusCode::GONE,
        Resolution::NotFound => StatusCode::NOT_FOUND,
    };

    Ok((status_code, headers))
}

/// Utility function for mapping any error into a `500 Internal Server Error`
/// response.
fn internal_error<E>(err: E) -> (StatusCode, String)
where
    E: std::error::Error,
{
    (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
}

/// URL decode short code
///
/// Uses percentage encoding for the decoding, might error in case of invalid UTF-8
fn url_decode_code(code: &str) -> Result<String, Utf8Error> {
    let decoded = percent_decode_str(code);

    decoded.decode_utf8().map(|decoded| decoded.to_string())
}
