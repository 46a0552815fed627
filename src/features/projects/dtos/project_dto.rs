use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::features::projects::models::Project;

/// Response DTO for a portfolio project
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectResponseDto {
    pub id: Uuid,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Public URL of the uploaded media
    pub thumbnail: String,
    pub category: String,
    pub skills: Vec<String>,
    pub is_video: bool,
    /// Spec name to value, e.g. `{"microcontroller": "ESP32", "pins": 12}`
    #[schema(value_type = Object)]
    pub technical_specs: serde_json::Value,
    pub methodology: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recruiter_insight: Option<String>,
    pub is_public: bool,
}

impl From<Project> for ProjectResponseDto {
    fn from(project: Project) -> Self {
        Self {
            id: project.id,
            user_id: project.user_id,
            created_at: project.created_at,
            title: project.title,
            description: project.description,
            summary: project.summary,
            thumbnail: project.thumbnail,
            category: project.category,
            skills: project.skills,
            is_video: project.is_video,
            technical_specs: project.technical_specs,
            methodology: project.methodology,
            recruiter_insight: project.recruiter_insight,
            is_public: project.is_public,
        }
    }
}

/// Request DTO for publishing or hiding a project
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVisibilityDto {
    /// Show the project on the public profile
    pub is_public: bool,
}

/// Response DTO for delete operations
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeleteProjectResponseDto {
    /// Confirmation that the project was deleted
    pub deleted: bool,
}
