use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::core::error::Result;
use crate::core::extractor::AppJson;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::projects::dtos::{
    DeleteProjectResponseDto, ProjectResponseDto, UpdateVisibilityDto,
};
use crate::features::projects::services::ProjectService;
use crate::shared::types::{ApiResponse, ListQuery, Meta};

/// List the current user's projects
#[utoipa::path(
    get,
    path = "/api/projects",
    params(ListQuery),
    responses(
        (status = 200, description = "Projects, newest first", body = ApiResponse<Vec<ProjectResponseDto>>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "projects",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_projects(
    user: AuthenticatedUser,
    State(service): State<Arc<ProjectService>>,
    Query(params): Query<ListQuery>,
) -> Result<Json<ApiResponse<Vec<ProjectResponseDto>>>> {
    let (projects, total) = service.list_by_user(&user.user_id, &params).await?;

    Ok(Json(ApiResponse::success(
        Some(projects),
        None,
        Some(Meta { total }),
    )))
}

/// Get a project by ID
///
/// Owners see their own projects; anyone else only sees public ones.
#[utoipa::path(
    get,
    path = "/api/projects/{id}",
    params(
        ("id" = Uuid, Path, description = "Project ID")
    ),
    responses(
        (status = 200, description = "Project found", body = ApiResponse<ProjectResponseDto>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Project not found")
    ),
    tag = "projects",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_project(
    user: AuthenticatedUser,
    State(service): State<Arc<ProjectService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ProjectResponseDto>>> {
    let project = service.get_visible(id, &user.user_id).await?;
    Ok(Json(ApiResponse::success(Some(project), None, None)))
}

/// Publish or hide a project on the public profile
#[utoipa::path(
    patch,
    path = "/api/projects/{id}/visibility",
    params(
        ("id" = Uuid, Path, description = "Project ID")
    ),
    request_body = UpdateVisibilityDto,
    responses(
        (status = 200, description = "Visibility updated", body = ApiResponse<ProjectResponseDto>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Project belongs to another user"),
        (status = 404, description = "Project not found")
    ),
    tag = "projects",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_visibility(
    user: AuthenticatedUser,
    State(service): State<Arc<ProjectService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<UpdateVisibilityDto>,
) -> Result<Json<ApiResponse<ProjectResponseDto>>> {
    let project = service
        .set_visibility(id, &user.user_id, dto.is_public)
        .await?;

    let message = if project.is_public {
        "Project is now public"
    } else {
        "Project is now private"
    };

    Ok(Json(ApiResponse::success(
        Some(project),
        Some(message.to_string()),
        None,
    )))
}

/// Delete a project
#[utoipa::path(
    delete,
    path = "/api/projects/{id}",
    params(
        ("id" = Uuid, Path, description = "Project ID")
    ),
    responses(
        (status = 200, description = "Project deleted", body = ApiResponse<DeleteProjectResponseDto>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Project belongs to another user"),
        (status = 404, description = "Project not found")
    ),
    tag = "projects",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_project(
    user: AuthenticatedUser,
    State(service): State<Arc<ProjectService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<DeleteProjectResponseDto>>> {
    service.delete(id, &user.user_id).await?;

    Ok(Json(ApiResponse::success(
        Some(DeleteProjectResponseDto { deleted: true }),
        Some("Project deleted".to_string()),
        None,
    )))
}
