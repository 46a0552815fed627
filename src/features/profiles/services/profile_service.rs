use sqlx::PgPool;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use crate::core::error::{AppError, Result};
use crate::features::profiles::dtos::{
    ProfileResponseDto, PublicProfileDto, SkillCountDto, SkillLevelDto, SkillRadarDto,
    UpsertProfileDto,
};
use crate::features::profiles::models::Profile;
use crate::features::projects::dtos::ProjectResponseDto;
use crate::features::projects::models::Project;
use crate::features::projects::ProjectService;
use crate::shared::constants::{
    DEFAULT_SKILL_PROFICIENCY, FALLBACK_BIO, FALLBACK_FULL_NAME, FALLBACK_INSIGHT,
    FALLBACK_LOCATION, FALLBACK_TITLE,
};

const PROFILE_COLUMNS: &str =
    "user_id, full_name, title, location, bio, avatar_url, website, updated_at";

fn or_fallback(value: Option<String>, fallback: &str) -> String {
    value
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

/// Assemble the public portfolio from a profile and its public projects
/// (newest first).
pub fn build_public_profile(profile: Profile, projects: Vec<Project>) -> PublicProfileDto {
    let mut seen = HashSet::new();
    let skills = projects
        .iter()
        .flat_map(|p| p.skills.iter())
        .filter(|skill| seen.insert(skill.as_str()))
        .map(|skill| SkillLevelDto {
            name: skill.clone(),
            level: DEFAULT_SKILL_PROFICIENCY,
        })
        .collect();

    let insight = or_fallback(
        projects.first().and_then(|p| p.recruiter_insight.clone()),
        FALLBACK_INSIGHT,
    );

    PublicProfileDto {
        user_id: profile.user_id,
        full_name: or_fallback(profile.full_name, FALLBACK_FULL_NAME),
        title: or_fallback(profile.title, FALLBACK_TITLE),
        location: or_fallback(profile.location, FALLBACK_LOCATION),
        bio: or_fallback(profile.bio, FALLBACK_BIO),
        avatar_url: profile.avatar_url,
        website: profile.website,
        projects: projects.into_iter().map(ProjectResponseDto::from).collect(),
        skills,
        insight,
    }
}

fn sorted_counts(counts: BTreeMap<String, u32>) -> Vec<SkillCountDto> {
    let mut entries: Vec<SkillCountDto> = counts
        .into_iter()
        .map(|(name, projects)| SkillCountDto { name, projects })
        .collect();
    // BTreeMap already ordered by name; stable sort keeps it for ties
    entries.sort_by(|a, b| b.projects.cmp(&a.projects));
    entries
}

/// Count, per skill and per category, how many projects mention it
pub fn build_skill_radar(projects: &[Project]) -> SkillRadarDto {
    let mut skills: BTreeMap<String, u32> = BTreeMap::new();
    let mut categories: BTreeMap<String, u32> = BTreeMap::new();

    for project in projects {
        let unique: HashSet<&str> = project.skills.iter().map(String::as_str).collect();
        for skill in unique {
            *skills.entry(skill.to_string()).or_default() += 1;
        }
        *categories.entry(project.category.clone()).or_default() += 1;
    }

    SkillRadarDto {
        total_projects: projects.len() as u32,
        skills: sorted_counts(skills),
        categories: sorted_counts(categories),
    }
}

/// Service for student profiles and the views built from their projects
pub struct ProfileService {
    pool: PgPool,
    projects: Arc<ProjectService>,
}

impl ProfileService {
    pub fn new(pool: PgPool, projects: Arc<ProjectService>) -> Self {
        Self { pool, projects }
    }

    async fn find(&self, user_id: &str) -> Result<Option<Profile>> {
        let query = format!("SELECT {} FROM profiles WHERE user_id = $1", PROFILE_COLUMNS);
        sqlx::query_as(&query)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    /// Get the caller's profile
    pub async fn get_own(&self, user_id: &str) -> Result<ProfileResponseDto> {
        self.find(user_id)
            .await?
            .map(ProfileResponseDto::from)
            .ok_or_else(|| AppError::NotFound("Profile has not been set up yet".to_string()))
    }

    /// Create or replace the caller's profile
    pub async fn upsert(&self, user_id: &str, dto: UpsertProfileDto) -> Result<ProfileResponseDto> {
        let query = format!(
            r#"
            INSERT INTO profiles (user_id, full_name, title, location, bio, avatar_url, website)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (user_id) DO UPDATE SET
                full_name = EXCLUDED.full_name,
                title = EXCLUDED.title,
                location = EXCLUDED.location,
                bio = EXCLUDED.bio,
                avatar_url = EXCLUDED.avatar_url,
                website = EXCLUDED.website,
                updated_at = NOW()
            RETURNING {}
            "#,
            PROFILE_COLUMNS
        );

        let profile: Profile = sqlx::query_as(&query)
            .bind(user_id)
            .bind(&dto.full_name)
            .bind(&dto.title)
            .bind(&dto.location)
            .bind(&dto.bio)
            .bind(&dto.avatar_url)
            .bind(&dto.website)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to save profile: {:?}", e);
                AppError::Database(e)
            })?;

        tracing::info!("Profile saved: user={}", user_id);

        Ok(profile.into())
    }

    /// Public portfolio of any user. Only public projects are included.
    pub async fn get_public(&self, user_id: &str) -> Result<PublicProfileDto> {
        let profile = self
            .find(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Profile {} not found", user_id)))?;

        let projects = self.projects.list_public_by_user(user_id).await?;

        Ok(build_public_profile(profile, projects))
    }

    /// Preview of the caller's own portfolio, private projects included.
    /// A profile that was never saved shows the fallbacks.
    pub async fn portfolio_preview(&self, user_id: &str) -> Result<PublicProfileDto> {
        let profile = self
            .find(user_id)
            .await?
            .unwrap_or_else(|| Profile::blank(user_id));

        let projects = self.projects.list_all_by_user(user_id).await?;

        Ok(build_public_profile(profile, projects))
    }

    /// Skill radar over all of the caller's projects
    pub async fn skill_radar(&self, user_id: &str) -> Result<SkillRadarDto> {
        let projects = self.projects.list_all_by_user(user_id).await?;
        Ok(build_skill_radar(&projects))
    }
}
