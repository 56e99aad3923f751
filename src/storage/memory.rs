//! Memory storage
//!
//! Will be destroyed on system shutdown

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use chrono::Utc;
use tokio::sync::Mutex;
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

/// Counter bucket key: one count per link, platform, and UTC day
type CounterKey = (String, Platform, NaiveDate);

/// An in-memory storage
///
/// Will be destroyed on system shutdown
#[derive(Clone, Debug)]
pub struct Memory {
    /// All projects in storage
    projects: Arc<Mutex<HashMap<Uuid, Project>>>,

    /// All links in storage, active and deactivated
    links: Arc<Mutex<HashMap<Uuid, Link>>>,

    /// Append-only click event log
    clicks: Arc<Mutex<Vec<ClickEvent>>>,

    /// Aggregate counters, incremented under the same lock as the event
    /// append
    counters: Arc<Mutex<HashMap<CounterKey, u64>>>,
}

impl Memory {
    /// Create a new empty Memory storage
    pub fn new() -> Self {
        Self {
            projects: Arc::new(Mutex::new(HashMap::new())),
            links: Arc::new(Mutex::new(HashMap::new())),
            clicks: Arc::new(Mutex::new(Vec::new())),
            counters: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl Storage for Memory {
    async fn find_all_projects(&self) -> Result<Vec<Project>> {
        Ok(self.projects.lock().await.values().cloned().collect())
    }

    async fn find_single_project_by_id(&self, id: &Uuid) -> Result<Option<Project>> {
        Ok(self.projects.lock().await.get(id).cloned())
    }

    async fn create_project(&self, values: &CreateProjectValues<'_>) -> Result<Project> {
        let project = Project {
            id: Uuid::new_v4(),
            name: values.name.to_string(),
            ios_url: values.ios_url.map(ToString::to_string),
            android_url: values.android_url.map(ToString::to_string),
            fallback_url: values.fallback_url.map(ToString::to_string),
            created_at: Utc::now().naive_utc(),
            updated_at: Utc::now().naive_utc(),
        };

        self.projects
            .lock()
            .await
            .insert(project.id, project.clone());

        Ok(project)
    }

    async fn update_project(
        &self,
        project: &Project,
        values: &UpdateProjectValues<'_>,
    ) -> Result<Project> {
        let mut projects = self.projects.lock().await;

        let project = projects
            .get_mut(&project.id)
            .ok_or_else(|| Error::Connection("Project is gone from storage".to_string()))?;

        if let Some(name) = values.name {
            project.name = name.to_string();
        }

        if let Some(ios_url) = values.ios_url {
            project.ios_url = ios_url.map(ToString::to_string);
        }

        if let Some(android_url) = values.android_url {
            project.android_url = android_url.map(ToString::to_string);
        }

        if let Some(fallback_url) = values.fallback_url {
            project.fallback_url = fallback_url.map(ToString::to_string);
        }

        project.updated_at = Utc::now().naive_utc();

        Ok(project.clone())
    }

    async fn find_single_link_by_code(&self, code: &str) -> Result<Option<Link>> {
        Ok(self
            .links
            .lock()
            .await
            .values()
            .find(|link| link.code == code)
            .cloned())
    }

    async fn find_all_links_by_project(&self, project: &Project) -> Result<Vec<Link>> {
        Ok(self
            .links
            .lock()
            .await
            .values()
            .filter(|link| link.project_id == project.id)
            .cloned()
            .collect())
    }

    async fn code_exists(&self, code: &str) -> Result<bool> {
        Ok(self
            .links
            .lock()
            .await
            .values()
            .any(|link| link.code == code))
    }

    async fn create_link(&self, values: &CreateLinkValues<'_>) -> Result<Link> {
        // uniqueness check and insert happen under one lock
        let mut links = self.links.lock().await;

        if links.values().any(|link| link.code == values.code) {
            return Err(Error::DuplicateCode);
        }

        let link = Link {
            id: Uuid::new_v4(),
            project_id: values.project.id,
            code: values.code.to_string(),
            created_at: Utc::now().naive_utc(),
            expires_at: values.expires_at,
            deactivated_at: None,
        };

        links.insert(link.id, link.clone());

        Ok(link)
    }

    async fn deactivate_link(&self, link: &Link) -> Result<()> {
        if let Some(link) = self.links.lock().await.get_mut(&link.id) {
            if link.deactivated_at.is_none() {
                link.deactivated_at = Some(Utc::now().naive_utc());
            }
        }

        Ok(())
    }

    async fn record_click(&self, values: &RecordClickValues<'_>) -> Result<()> {
        let event = ClickEvent {
            id: Uuid::new_v4(),
            link_code: values.link_code.to_string(),
            platform: values.platform,
            resolved_url: values.resolved_url.to_string(),
            user_agent_raw: values.user_agent_raw.map(ToString::to_string),
            created_at: values.timestamp,
        };

        // event append and counter bump under the clicks lock, so a scan
        // never observes a counter without its event
        let mut clicks = self.clicks.lock().await;
        let mut counters = self.counters.lock().await;

        clicks.push(event);

        let key = (
            values.link_code.to_string(),
            values.platform,
            values.timestamp.date(),
        );
        *counters.entry(key).or_insert(0) += 1;

        Ok(())
    }

    async fn fetch_daily_counts(
        &self,
        link_code: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DailyCount>> {
        let counters = self.counters.lock().await;

        let mut counts = counters
            .iter()
            .filter(|((code, _, day), _)| code == link_code && (from..=to).contains(day))
            .map(|((_, platform, day), clicks)| DailyCount {
                day: *day,
                platform: *platform,
                clicks: *clicks,
            })
            .collect::<Vec<_>>();

        sort_counts(&mut counts);

        Ok(counts)
    }

    async fn scan_click_events(
        &self,
        link_code: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DailyCount>> {
        let clicks = self.clicks.lock().await;

        let mut aggregated: HashMap<(Platform, NaiveDate), u64> = HashMap::new();

        for event in clicks.iter() {
            let day = event.created_at.date();

            if event.link_code == link_code && (from..=to).contains(&day) {
                *aggregated.entry((event.platform, day)).or_insert(0) += 1;
            }
        }

        let mut counts = aggregated
            .into_iter()
            .map(|((platform, day), clicks)| DailyCount {
                day,
                platform,
                clicks,
            })
            .collect::<Vec<_>>();

        sort_counts(&mut counts);

        Ok(counts)
    }

    async fn find_all_clicks_by_link(&self, link_code: &str) -> Result<Vec<ClickEvent>> {
        let mut events = self
            .clicks
            .lock()
            .await
            .iter()
            .filter(|event| event.link_code == link_code)
            .cloned()
            .collect::<Vec<_>>();

        events.reverse();

        Ok(events)
    }
}

/// Stable output order: by day, then platform name
fn sort_counts(counts: &mut [DailyCount]) {
    counts.sort_by(|a, b| {
        a.day
            .cmp(&b.day)
            .then_with(|| a.platform.as_str().cmp(b.platform.as_str()))
    });
}
