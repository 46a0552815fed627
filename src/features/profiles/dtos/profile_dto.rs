use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::features::profiles::models::Profile;
use crate::features::projects::dtos::ProjectResponseDto;

/// The caller's own profile
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponseDto {
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl From<Profile> for ProfileResponseDto {
    fn from(profile: Profile) -> Self {
        Self {
            user_id: profile.user_id,
            full_name: profile.full_name,
            title: profile.title,
            location: profile.location,
            bio: profile.bio,
            avatar_url: profile.avatar_url,
            website: profile.website,
            updated_at: profile.updated_at,
        }
    }
}

/// Request DTO for saving the caller's profile. Blank fields are cleared.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpsertProfileDto {
    #[validate(length(max = 128, message = "Name must not exceed 128 characters"))]
    pub full_name: Option<String>,

    #[validate(length(max = 128, message = "Title must not exceed 128 characters"))]
    pub title: Option<String>,

    #[validate(length(max = 128, message = "Location must not exceed 128 characters"))]
    pub location: Option<String>,

    #[validate(length(max = 2000, message = "Bio must not exceed 2000 characters"))]
    pub bio: Option<String>,

    #[validate(url(message = "Avatar must be a valid URL"))]
    pub avatar_url: Option<String>,

    #[validate(url(message = "Website must be a valid URL"))]
    pub website: Option<String>,
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl UpsertProfileDto {
    /// Trim every field and turn blanks into `None`
    pub fn normalized(self) -> Self {
        Self {
            full_name: trimmed(self.full_name),
            title: trimmed(self.title),
            location: trimmed(self.location),
            bio: trimmed(self.bio),
            avatar_url: trimmed(self.avatar_url),
            website: trimmed(self.website),
        }
    }
}

/// A verified skill with its proficiency percentage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SkillLevelDto {
    pub name: String,
    pub level: u8,
}

/// Recruiter-facing portfolio of a user
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublicProfileDto {
    pub user_id: String,
    pub full_name: String,
    pub title: String,
    pub location: String,
    pub bio: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    /// Public projects, newest first
    pub projects: Vec<ProjectResponseDto>,
    /// Distinct skills across the public projects
    pub skills: Vec<SkillLevelDto>,
    /// Recruiter insight of the most recent project
    pub insight: String,
}

/// Number of projects a skill or category appears in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SkillCountDto {
    pub name: String,
    pub projects: u32,
}

/// Competency map of the caller's projects
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SkillRadarDto {
    pub total_projects: u32,
    pub skills: Vec<SkillCountDto>,
    pub categories: Vec<SkillCountDto>,
}
