use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for a student profile, keyed by identity-provider user id
#[derive(Debug, Clone, FromRow)]
pub struct Profile {
    pub user_id: String,
    pub full_name: Option<String>,
    pub title: Option<String>,
    pub location: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub website: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// Profile with no fields filled in, for users who never saved one
    pub fn blank(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            full_name: None,
            title: None,
            location: None,
            bio: None,
            avatar_url: None,
            website: None,
            updated_at: Utc::now(),
        }
    }
}
