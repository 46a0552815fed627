use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for a portfolio project
#[derive(Debug, Clone, FromRow)]
pub struct Project {
    pub id: Uuid,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub title: String,
    pub description: String,
    pub summary: Option<String>,
    /// Public URL of the uploaded media
    pub thumbnail: String,
    pub category: String,
    pub skills: Vec<String>,
    pub is_video: bool,
    pub technical_specs: serde_json::Value,
    pub methodology: Vec<String>,
    pub recruiter_insight: Option<String>,
    pub is_public: bool,
}

/// Data for inserting a project produced by an analysis run
#[derive(Debug, Clone, PartialEq)]
pub struct NewProject {
    pub user_id: String,
    pub title: String,
    pub description: String,
    pub summary: Option<String>,
    pub thumbnail: String,
    pub category: String,
    pub skills: Vec<String>,
    pub is_video: bool,
    pub technical_specs: serde_json::Value,
    pub recruiter_insight: Option<String>,
}
