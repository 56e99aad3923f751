use chrono::naive::NaiveDateTime;
use uuid::Uuid;

/// The short-code-to-project mapping resolved on each redirect request
///
/// The code is immutable once issued and unique across all links, including
/// deactivated ones.
#[derive(Clone, Debug)]
pub struct Link {
    pub id: Uuid,
    pub project_id: Uuid,
    pub code: String,
    pub created_at: NaiveDateTime,
    pub expires_at: Option<NaiveDateTime>,
    pub deactivated_at: Option<NaiveDateTime>,
}

impl Link {
    /// Is the link soft-deleted?
    pub fn is_deactivated(&self) -> bool {
        self.deactivated_at.is_some()
    }

    /// Is the link past its optional expiry?
    pub fn is_expired(&self, now: NaiveDateTime) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at < now)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn link(expires_at: Option<NaiveDateTime>) -> Link {
        Link {
            id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            code: "aBc123".to_string(),
            created_at: Utc::now().naive_utc(),
            expires_at,
            deactivated_at: None,
        }
    }

    #[test]
    fn test_link_without_expiry_never_expires() {
        let now = Utc::now().naive_utc();

        assert!(!link(None).is_expired(now));
    }

    #[test]
    fn test_link_expiry() {
        let now = Utc::now().naive_utc();

        assert!(link(Some(now - chrono::Duration::hours(1))).is_expired(now));
        assert!(!link(Some(now + chrono::Duration::hours(1))).is_expired(now));
    }
}
