//! Link resolution
//!
//! Turns a short code and a raw user agent into a [`Resolution`]. Lookups
//! are plain reads against immutable-once-written link data, no locking.
//! The analytics record is emitted fire-and-forget; a broken analytics
//! subsystem never costs a redirect.

use std::time::Duration;

use chrono::Utc;

use crate::analytics;
use crate::links::Link;
use crate::platform::Platform;
use crate::platform::classify;
use crate::projects::Project;
use crate::storage;
use crate::storage::RecordClickValues;
use crate::storage::Storage;

/// Attempts per storage read before the error is surfaced
const LOOKUP_ATTEMPTS: usize = 3;

/// Pause between retries of a failed storage read
const RETRY_DELAY: Duration = Duration::from_millis(25);

/// The outcome of resolving a short code
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// Redirect to this URL
    Redirect(String),

    /// No such code, or the project has no usable URL
    NotFound,

    /// The link is deactivated or expired
    Gone,
}

/// Per-platform destination priority
///
/// One ordered row per platform; the first set URL wins. With at least one
/// URL set on the project, every row yields a destination.
const URL_PRIORITY: [(Platform, [UrlField; 3]); 3] = [
    (
        Platform::Ios,
        [UrlField::Ios, UrlField::Fallback, UrlField::Android],
    ),
    (
        Platform::Android,
        [UrlField::Android, UrlField::Fallback, UrlField::Ios],
    ),
    (
        Platform::Other,
        [UrlField::Fallback, UrlField::Ios, UrlField::Android],
    ),
];

/// Selector for one of the three project URL fields
#[derive(Clone, Copy, Debug)]
enum UrlField {
    Ios,
    Android,
    Fallback,
}

impl UrlField {
    fn get(self, project: &Project) -> Option<&str> {
        match self {
            UrlField::Ios => project.ios_url.as_deref(),
            UrlField::Android => project.android_url.as_deref(),
            UrlField::Fallback => project.fallback_url.as_deref(),
        }
    }
}

/// Pick the destination URL for a platform
///
/// Returns `None` only when the project has no URL set at all.
pub fn choose_destination(project: &Project, platform: Platform) -> Option<&str> {
    URL_PRIORITY
        .iter()
        .find(|(candidate, _)| *candidate == platform)
        .and_then(|(_, fields)| fields.iter().find_map(|field| field.get(project)))
}

/// Resolve a short code for a requesting device
///
/// Storage errors are retried a few times and then surfaced as-is, they are
/// never mapped to [`Resolution::NotFound`].
pub async fn resolve<S: Storage>(
    storage: &S,
    code: &str,
    user_agent: &str,
) -> storage::Result<Resolution> {
    let Some(link) = find_link_with_retry(storage, code).await? else {
        tracing::debug!(r#"Code "{code}" not found"#);

        return Ok(Resolution::NotFound);
    };

    let project = find_project_with_retry(storage, &link).await?;

    let Some(project) = project.filter(Project::has_any_url) else {
        tracing::debug!(r#"Code "{code}" has no usable destination"#);

        return Ok(Resolution::NotFound);
    };

    if link.is_deactivated() || link.is_expired(Utc::now().naive_utc()) {
        tracing::debug!(r#"Code "{code}" no longer active"#);

        return Ok(Resolution::Gone);
    }

    let platform = classify(user_agent);

    let Some(url) = choose_destination(&project, platform) else {
        // unreachable with has_any_url checked above, kept total anyway
        return Ok(Resolution::NotFound);
    };

    tracing::debug!(r#"Code "{code}" ({platform}) redirecting to: {url}"#);

    spawn_click_record(storage, &link, platform, url, user_agent);

    Ok(Resolution::Redirect(url.to_string()))
}

/// Hand the click to the analytics recorder without waiting for it
fn spawn_click_record<S: Storage>(
    storage: &S,
    link: &Link,
    platform: Platform,
    resolved_url: &str,
    user_agent: &str,
) {
    let storage = storage.clone();
    let link_code = link.code.clone();
    let resolved_url = resolved_url.to_string();
    let user_agent = (!user_agent.is_empty()).then(|| user_agent.to_string());
    let timestamp = Utc::now().naive_utc();

    tokio::spawn(async move {
        analytics::record(
            &storage,
            RecordClickValues {
                link_code: &link_code,
                platform,
                resolved_url: &resolved_url,
                user_agent_raw: user_agent.as_deref(),
                timestamp,
            },
        )
        .await;
    });
}

async fn find_link_with_retry<S: Storage>(
    storage: &S,
    code: &str,
) -> storage::Result<Option<Link>> {
    let mut attempt = 1;

    loop {
        match storage.find_single_link_by_code(code).await {
            Ok(link) => return Ok(link),
            Err(err) if attempt < LOOKUP_ATTEMPTS => {
                tracing::warn!("Link lookup failed (attempt {attempt}), retrying: {err}");

                attempt += 1;
                tokio::time::sleep(RETRY_DELAY).await;
            }
            Err(err) => return Err(err),
        }
    }
}

async fn find_project_with_retry<S: Storage>(
    storage: &S,
    link: &Link,
) -> storage::Result<Option<Project>> {
    let mut attempt = 1;

    loop {
        match storage.find_single_project_by_id(&link.project_id).await {
            Ok(project) => return Ok(project),
            Err(err) if attempt < LOOKUP_ATTEMPTS => {
                tracing::warn!("Project lookup failed (attempt {attempt}), retrying: {err}");

                attempt += 1;
                tokio::time::sleep(RETRY_DELAY).await;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;

    fn project(
        ios_url: Option<&str>,
        android_url: Option<&str>,
        fallback_url: Option<&str>,
    ) -> Project {
        Project {
            id: Uuid::new_v4(),
            name: "Example".to_string(),
            ios_url: ios_url.map(ToString::to_string),
            android_url: android_url.map(ToString::to_string),
            fallback_url: fallback_url.map(ToString::to_string),
            created_at: Utc::now().naive_utc(),
            updated_at: Utc::now().naive_utc(),
        }
    }

    #[test]
    fn test_platform_url_wins_when_set() {
        let project = project(Some("ios"), Some("android"), Some("fallback"));

        assert_eq!(
            Some("ios"),
            choose_destination(&project, Platform::Ios)
        );
        assert_eq!(
            Some("android"),
            choose_destination(&project, Platform::Android)
        );
        assert_eq!(
            Some("fallback"),
            choose_destination(&project, Platform::Other)
        );
    }

    #[test]
    fn test_fallback_before_opposite_platform() {
        let project = project(None, Some("android"), Some("fallback"));

        assert_eq!(
            Some("fallback"),
            choose_destination(&project, Platform::Ios)
        );
    }

    #[test]
    fn test_other_prefers_ios_when_fallback_unset() {
        let project = project(Some("ios"), Some("android"), None);

        assert_eq!(Some("ios"), choose_destination(&project, Platform::Other));
    }

    #[test]
    fn test_no_urls_means_no_destination() {
        let project = project(None, None, None);

        for platform in [Platform::Ios, Platform::Android, Platform::Other] {
            assert_eq!(None, choose_destination(&project, platform));
        }
    }

    #[test]
    fn test_selection_is_total_over_all_non_empty_combinations() {
        // every combination with at least one URL set yields a destination
        // for every platform
        for ios in [None, Some("ios")] {
            for android in [None, Some("android")] {
                for fallback in [None, Some("fallback")] {
                    if ios.is_none() && android.is_none() && fallback.is_none() {
                        continue;
                    }

                    let project = project(ios, android, fallback);

                    for platform in [Platform::Ios, Platform::Android, Platform::Other] {
                        assert!(choose_destination(&project, platform).is_some());
                    }
                }
            }
        }
    }
}
