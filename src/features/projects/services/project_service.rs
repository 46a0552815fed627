use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::analysis::ProjectStore;
use crate::features::projects::dtos::ProjectResponseDto;
use crate::features::projects::models::{NewProject, Project};
use crate::modules::storage::MediaStorage;
use crate::shared::types::ListQuery;

const PROJECT_COLUMNS: &str = r#"
    id, user_id, created_at, title, description, summary, thumbnail, category,
    skills, is_video, technical_specs, methodology, recruiter_insight, is_public
"#;

/// `%term%` for ILIKE, with LIKE wildcards in the term taken literally
pub fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// Service for portfolio projects
pub struct ProjectService {
    pool: PgPool,
    storage: Arc<dyn MediaStorage>,
}

impl ProjectService {
    pub fn new(pool: PgPool, storage: Arc<dyn MediaStorage>) -> Self {
        Self { pool, storage }
    }

    /// List the user's projects, newest first, optionally filtered by title,
    /// category or skill
    pub async fn list_by_user(
        &self,
        user_id: &str,
        params: &ListQuery,
    ) -> Result<(Vec<ProjectResponseDto>, i64)> {
        let search = params.search_term().map(like_pattern);

        let filter = r#"
            WHERE user_id = $1
              AND ($2::TEXT IS NULL
                   OR title ILIKE $2
                   OR category ILIKE $2
                   OR EXISTS (SELECT 1 FROM unnest(skills) AS skill WHERE skill ILIKE $2))
        "#;

        let count_query = format!("SELECT COUNT(*) FROM projects {}", filter);
        let total: i64 = sqlx::query_scalar(&count_query)
            .bind(user_id)
            .bind(&search)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)?;

        let query = format!(
            "SELECT {} FROM projects {} ORDER BY created_at DESC LIMIT $3 OFFSET $4",
            PROJECT_COLUMNS, filter
        );
        let projects: Vec<Project> = sqlx::query_as(&query)
            .bind(user_id)
            .bind(&search)
            .bind(params.limit())
            .bind(params.offset())
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)?;

        Ok((
            projects.into_iter().map(ProjectResponseDto::from).collect(),
            total,
        ))
    }

    /// Get one project. Others' projects are visible only when public.
    pub async fn get_visible(&self, id: Uuid, viewer_id: &str) -> Result<ProjectResponseDto> {
        let project = self.find(id).await?;

        if project.user_id != viewer_id && !project.is_public {
            return Err(AppError::NotFound(format!("Project with id {} not found", id)));
        }

        Ok(project.into())
    }

    /// Publish or hide one of the user's projects
    pub async fn set_visibility(
        &self,
        id: Uuid,
        user_id: &str,
        is_public: bool,
    ) -> Result<ProjectResponseDto> {
        self.find_owned(id, user_id).await?;

        let query = format!(
            "UPDATE projects SET is_public = $1 WHERE id = $2 RETURNING {}",
            PROJECT_COLUMNS
        );
        let project: Project = sqlx::query_as(&query)
            .bind(is_public)
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to update project visibility: {:?}", e);
                AppError::Database(e)
            })?;

        tracing::info!("Project {} is_public={}", id, is_public);

        Ok(project.into())
    }

    /// Delete one of the user's projects and its media
    pub async fn delete(&self, id: Uuid, user_id: &str) -> Result<()> {
        let project = self.find_owned(id, user_id).await?;

        sqlx::query("DELETE FROM projects WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;

        // Row is gone either way; a leftover object is only logged
        if let Err(e) = self.storage.remove(&project.thumbnail).await {
            tracing::warn!("Failed to remove media for project {}: {}", id, e);
        }

        tracing::info!("Project deleted: id={}, user={}", id, user_id);

        Ok(())
    }

    /// Public projects of a user, newest first
    pub async fn list_public_by_user(&self, user_id: &str) -> Result<Vec<Project>> {
        let query = format!(
            "SELECT {} FROM projects WHERE user_id = $1 AND is_public ORDER BY created_at DESC",
            PROJECT_COLUMNS
        );
        sqlx::query_as(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    /// Every project of a user, newest first
    pub async fn list_all_by_user(&self, user_id: &str) -> Result<Vec<Project>> {
        let query = format!(
            "SELECT {} FROM projects WHERE user_id = $1 ORDER BY created_at DESC",
            PROJECT_COLUMNS
        );
        sqlx::query_as(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find(&self, id: Uuid) -> Result<Project> {
        let query = format!("SELECT {} FROM projects WHERE id = $1", PROJECT_COLUMNS);
        sqlx::query_as(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?
            .ok_or_else(|| AppError::NotFound(format!("Project with id {} not found", id)))
    }

    async fn find_owned(&self, id: Uuid, user_id: &str) -> Result<Project> {
        let project = self.find(id).await?;
        if project.user_id != user_id {
            return Err(AppError::Forbidden(
                "Project belongs to another user".to_string(),
            ));
        }
        Ok(project)
    }
}

#[async_trait]
impl ProjectStore for ProjectService {
    async fn insert_project(&self, project: NewProject) -> Result<Uuid> {
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO projects (
                user_id, title, description, summary, thumbnail, category,
                skills, is_video, technical_specs, recruiter_insight
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id
            "#,
        )
        .bind(&project.user_id)
        .bind(&project.title)
        .bind(&project.description)
        .bind(&project.summary)
        .bind(&project.thumbnail)
        .bind(&project.category)
        .bind(&project.skills)
        .bind(project.is_video)
        .bind(&project.technical_specs)
        .bind(&project.recruiter_insight)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to insert project: {:?}", e);
            AppError::Database(e)
        })?;

        tracing::info!("Project created: id={}, user={}", id, project.user_id);

        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_wraps_term() {
        assert_eq!(like_pattern("esp32"), "%esp32%");
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("100%"), "%100\\%%");
        assert_eq!(like_pattern("snake_case"), "%snake\\_case%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }
}
