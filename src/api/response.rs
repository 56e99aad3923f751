//! API response envelopes
//!
//! Every success body is wrapped in `{ "data": ... }`, every failure in
//! `{ "error": ..., "description": ... }`.

use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use serde::Serialize;

/// A successful API interaction
pub struct Success<V> {
    status_code: StatusCode,
    data: Option<V>,
}

impl<V> Success<V> {
    /// `200 OK` with a body
    pub fn ok(data: V) -> Self {
        Self {
            status_code: StatusCode::OK,
            data: Some(data),
        }
    }

    /// `201 Created` with the fresh resource as body
    pub fn created(data: V) -> Self {
        Self {
            status_code: StatusCode::CREATED,
            data: Some(data),
        }
    }

    /// `204 No Content`, without a body
    pub fn no_content() -> Self {
        Self {
            status_code: StatusCode::NO_CONTENT,
            data: None,
        }
    }
}

#[derive(Serialize)]
struct SuccessBody<V> {
    data: V,
}

impl<V> IntoResponse for Success<V>
where
    V: Serialize,
{
    fn into_response(self) -> Response {
        match self.data {
            Some(data) => (self.status_code, Json(SuccessBody { data })).into_response(),
            None => self.status_code.into_response(),
        }
    }
}

/// A failed API interaction
pub struct Error {
    status_code: StatusCode,
    body: ErrorBody,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

impl Error {
    fn with_status<M>(status_code: StatusCode, message: M) -> Self
    where
        M: ToString,
    {
        Self {
            status_code,
            body: ErrorBody {
                error: message.to_string(),
                description: None,
            },
        }
    }

    pub fn bad_request<M>(message: M) -> Self
    where
        M: ToString,
    {
        Self::with_status(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found<M>(message: M) -> Self
    where
        M: ToString,
    {
        Self::with_status(StatusCode::NOT_FOUND, message)
    }

    pub fn conflict<M>(message: M) -> Self
    where
        M: ToString,
    {
        Self::with_status(StatusCode::CONFLICT, message)
    }

    pub fn internal_server_error<M>(message: M) -> Self
    where
        M: ToString,
    {
        Self::with_status(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// Attach a more detailed description to the error
    pub fn with_description<M>(mut self, description: M) -> Self
    where
        M: ToString,
    {
        self.body.description = Some(description.to_string());

        self
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        (self.status_code, Json(self.body)).into_response()
    }
}
