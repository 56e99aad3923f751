use axum::Router;
use axum::body::Body;
use axum::body::Bytes;
use axum::http::Method;
use axum::http::Request;
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::http::header::LOCATION;
use axum::http::header::USER_AGENT;
use http_body_util::BodyExt;
use serde_json::Map;
use serde_json::Value;
use tower::Service;
use uuid::Uuid;

use crate::create_router;
use crate::storage::Memory;

/// A typical iPhone Safari user agent
pub const IPHONE_USER_AGENT: &str =
    "Mozilla/5.0 (iPhone; CPU iPhone OS 14_6 like Mac OS X) Version/14.1 Mobile/15E148 Safari/604.1";

/// A typical Android Chrome user agent
pub const ANDROID_USER_AGENT: &str =
    "Mozilla/5.0 (Linux; Android 13; Pixel 7) Chrome/109.0.0.0 Mobile Safari/537.36";

/// Not a mobile device at all
pub const CURL_USER_AGENT: &str = "curl/7.64";

/// Test helper version of Project struct
#[derive(Debug)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
}

/// Test helper version of Link struct
#[derive(Debug)]
pub struct Link {
    #[allow(dead_code)]
    pub id: Uuid,
    pub code: String,
}

/// One stats entry
#[derive(Debug, PartialEq, Eq)]
pub struct StatsEntry {
    pub day: String,
    pub platform: String,
    pub clicks: u64,
}

/// Setup the Switchly app on a fresh in-memory storage
pub fn setup_test_app() -> Router {
    create_router(Memory::new())
}

pub async fn root(
    app: &mut Router,
    code: &str,
    user_agent: Option<&str>,
) -> (StatusCode, Option<String>, String) {
    let mut builder = Request::builder()
        .method(Method::GET)
        .uri(format!("/{code}"));

    if let Some(user_agent) = user_agent {
        builder = builder.header(USER_AGENT, user_agent);
    }

    let request = builder.body(Body::empty()).unwrap();

    let response = app.call(request).await.unwrap();

    let status_code = response.status();
    let headers = response.headers();

    let location = headers.get(LOCATION);
    let location = location.map(|header| header.to_str().unwrap().to_string());

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let body = String::from_utf8_lossy(&body[..]).to_string();

    (status_code, location, body)
}

pub async fn maybe_create_project(
    app: &mut Router,
    name: &str,
    ios_url: Option<&str>,
    android_url: Option<&str>,
    fallback_url: Option<&str>,
) -> (StatusCode, Option<Project>, Option<String>) {
    let mut payload = Map::new();
    payload.insert("name".to_string(), Value::String(name.to_string()));

    if let Some(ios_url) = ios_url {
        payload.insert("iosUrl".to_string(), Value::String(ios_url.to_string()));
    }

    if let Some(android_url) = android_url {
        payload.insert(
            "androidUrl".to_string(),
            Value::String(android_url.to_string()),
        );
    }

    if let Some(fallback_url) = fallback_url {
        payload.insert(
            "fallbackUrl".to_string(),
            Value::String(fallback_url.to_string()),
        );
    }

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/projects")
        .header(CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())
        .body(Body::from(serde_json::to_vec(&payload).unwrap()))
        .unwrap();

    let response = app.call(request).await.unwrap();
    let status_code = response.status();

    let body = response.into_body().collect().await.unwrap().to_bytes();

    (
        status_code,
        if status_code == StatusCode::CREATED {
            Some(get_project(&body))
        } else {
            None
        },
        if status_code == StatusCode::BAD_REQUEST {
            Some(get_error_message(&body))
        } else {
            None
        },
    )
}

pub async fn create_project(
    app: &mut Router,
    ios_url: Option<&str>,
    android_url: Option<&str>,
    fallback_url: Option<&str>,
) -> Project {
    let (status_code, project, _) =
        maybe_create_project(app, "Example App", ios_url, android_url, fallback_url).await;

    assert_eq!(StatusCode::CREATED, status_code);

    project.unwrap()
}

pub async fn maybe_update_project(
    app: &mut Router,
    project_id: &Uuid,
    fields: &[(&str, &str)],
) -> (StatusCode, Option<String>) {
    let mut payload = Map::new();

    for (key, value) in fields {
        payload.insert((*key).to_string(), Value::String((*value).to_string()));
    }

    let request = Request::builder()
        .method(Method::PATCH)
        .uri(format!("/api/projects/{project_id}"))
        .header(CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())
        .body(Body::from(serde_json::to_vec(&payload).unwrap()))
        .unwrap();

    let response = app.call(request).await.unwrap();
    let status_code = response.status();

    let body = response.into_body().collect().await.unwrap().to_bytes();

    (
        status_code,
        if status_code == StatusCode::BAD_REQUEST {
            Some(get_error_message(&body))
        } else {
            None
        },
    )
}

pub async fn maybe_create_link(
    app: &mut Router,
    project_id: &Uuid,
    expires_at: Option<&str>,
) -> (StatusCode, Option<Link>, Option<String>) {
    let mut payload = Map::new();

    if let Some(expires_at) = expires_at {
        payload.insert(
            "expiresAt".to_string(),
            Value::String(expires_at.to_string()),
        );
    }

    let request = Request::builder()
        .method(Method::POST)
        .uri(format!("/api/projects/{project_id}/links"))
        .header(CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())
        .body(Body::from(serde_json::to_vec(&payload).unwrap()))
        .unwrap();

    let response = app.call(request).await.unwrap();
    let status_code = response.status();

    let body = response.into_body().collect().await.unwrap().to_bytes();

    (
        status_code,
        if status_code == StatusCode::CREATED {
            Some(get_link(&body))
        } else {
            None
        },
        if status_code == StatusCode::BAD_REQUEST || status_code == StatusCode::NOT_FOUND {
            Some(get_error_message(&body))
        } else {
            None
        },
    )
}

pub async fn create_link(app: &mut Router, project_id: &Uuid) -> Link {
    let (status_code, link, _) = maybe_create_link(app, project_id, None).await;

    assert_eq!(StatusCode::CREATED, status_code);

    link.unwrap()
}

pub async fn deactivate_link(app: &mut Router, code: &str) -> StatusCode {
    let request = Request::builder()
        .method(Method::DELETE)
        .uri(format!("/api/links/{code}"))
        .body(Body::empty())
        .unwrap();

    let response = app.call(request).await.unwrap();

    response.status()
}

pub async fn stats(
    app: &mut Router,
    code: &str,
    range: Option<(&str, &str)>,
) -> (StatusCode, Option<Vec<StatsEntry>>) {
    let uri = match range {
        Some((from, to)) => format!("/api/links/{code}/stats?from={from}&to={to}"),
        None => format!("/api/links/{code}/stats"),
    };

    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let response = app.call(request).await.unwrap();
    let status_code = response.status();

    let body = response.into_body().collect().await.unwrap().to_bytes();

    (
        status_code,
        if status_code == StatusCode::OK {
            Some(get_stats(&body))
        } else {
            None
        },
    )
}

/// Raw click log of a link, as loosely typed JSON values
pub async fn clicks(app: &mut Router, code: &str) -> (StatusCode, Option<Vec<Value>>) {
    let request = Request::builder()
        .method(Method::GET)
        .uri(format!("/api/links/{code}/clicks"))
        .body(Body::empty())
        .unwrap();

    let response = app.call(request).await.unwrap();
    let status_code = response.status();

    let body = response.into_body().collect().await.unwrap().to_bytes();

    (
        status_code,
        if status_code == StatusCode::OK {
            Some(
                serde_json::from_slice::<Value>(&body[..]).unwrap()["data"]
                    .as_array()
                    .unwrap()
                    .clone(),
            )
        } else {
            None
        },
    )
}

/// Total clicks over all stats entries
pub async fn click_total(app: &mut Router, code: &str) -> u64 {
    let (status_code, entries) = stats(app, code, None).await;

    assert_eq!(StatusCode::OK, status_code);

    entries.unwrap().iter().map(|entry| entry.clicks).sum()
}

/// Poll the stats until the expected click total shows up
///
/// Clicks are recorded fire-and-forget, the redirect response does not wait
/// for them.
pub async fn wait_for_click_total(app: &mut Router, code: &str, expected: u64) {
    for _ in 0..200 {
        if click_total(app, code).await == expected {
            return;
        }

        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }

    assert_eq!(expected, click_total(app, code).await);
}

fn value_to_project(project: &Map<String, Value>) -> Project {
    Project {
        id: project["id"].as_str().map(Uuid::parse_str).unwrap().unwrap(),
        name: project["name"].as_str().map(ToString::to_string).unwrap(),
    }
}

fn get_project(body: &Bytes) -> Project {
    serde_json::from_slice::<Value>(&body[..]).unwrap()["data"]
        .as_object()
        .map(value_to_project)
        .unwrap()
}

fn value_to_link(link: &Map<String, Value>) -> Link {
    Link {
        id: link["id"].as_str().map(Uuid::parse_str).unwrap().unwrap(),
        code: link["code"].as_str().map(ToString::to_string).unwrap(),
    }
}

fn get_link(body: &Bytes) -> Link {
    serde_json::from_slice::<Value>(&body[..]).unwrap()["data"]
        .as_object()
        .map(value_to_link)
        .unwrap()
}

fn value_to_stats_entry(entry: &Map<String, Value>) -> StatsEntry {
    StatsEntry {
        day: entry["day"].as_str().map(ToString::to_string).unwrap(),
        platform: entry["platform"].as_str().map(ToString::to_string).unwrap(),
        clicks: entry["clicks"].as_u64().unwrap(),
    }
}

fn get_stats(body: &Bytes) -> Vec<StatsEntry> {
    serde_json::from_slice::<Value>(&body[..]).unwrap()["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry.as_object().unwrap())
        .map(value_to_stats_entry)
        .collect()
}

fn get_error_message(body: &Bytes) -> String {
    serde_json::from_slice::<Value>(&body[..]).unwrap()["error"]
        .as_str()
        .map(ToString::to_string)
        .unwrap()
}
