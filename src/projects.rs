use chrono::naive::NaiveDateTime;
use uuid::Uuid;

/// A registered application with its candidate destination URLs
///
/// At least one of the three URLs is always set, the API enforces this on
/// create and update. Resolution would be impossible otherwise.
#[derive(Clone, Debug)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub ios_url: Option<String>,
    pub android_url: Option<String>,
    pub fallback_url: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Project {
    /// Does the project have any destination URL at all?
    pub fn has_any_url(&self) -> bool {
        self.ios_url.is_some() || self.android_url.is_some() || self.fallback_url.is_some()
    }
}
