use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::profiles::dtos::{
    ProfileResponseDto, PublicProfileDto, SkillRadarDto, UpsertProfileDto,
};
use crate::features::profiles::services::ProfileService;
use crate::shared::types::ApiResponse;

#[utoipa::path(
    get,
    path = "/api/profiles/me",
    responses(
        (status = 200, description = "Profile retrieved successfully", body = ApiResponse<ProfileResponseDto>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Profile not set up yet")
    ),
    tag = "profiles",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_my_profile(
    user: AuthenticatedUser,
    State(service): State<Arc<ProfileService>>,
) -> Result<Json<ApiResponse<ProfileResponseDto>>> {
    let profile = service.get_own(&user.user_id).await?;
    Ok(Json(ApiResponse::success(Some(profile), None, None)))
}

#[utoipa::path(
    put,
    path = "/api/profiles/me",
    request_body = UpsertProfileDto,
    responses(
        (status = 200, description = "Profile saved successfully", body = ApiResponse<ProfileResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "profiles",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn upsert_my_profile(
    user: AuthenticatedUser,
    State(service): State<Arc<ProfileService>>,
    AppJson(dto): AppJson<UpsertProfileDto>,
) -> Result<Json<ApiResponse<ProfileResponseDto>>> {
    let dto = dto.normalized();
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let profile = service.upsert(&user.user_id, dto).await?;
    Ok(Json(ApiResponse::success(
        Some(profile),
        Some("Profile saved successfully".to_string()),
        None,
    )))
}

/// Skill radar of the current user's projects
#[utoipa::path(
    get,
    path = "/api/profiles/me/skills",
    responses(
        (status = 200, description = "Skill and category counts", body = ApiResponse<SkillRadarDto>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "profiles",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_my_skills(
    user: AuthenticatedUser,
    State(service): State<Arc<ProfileService>>,
) -> Result<Json<ApiResponse<SkillRadarDto>>> {
    let radar = service.skill_radar(&user.user_id).await?;
    Ok(Json(ApiResponse::success(Some(radar), None, None)))
}

/// Preview of the current user's portfolio as visitors would see it,
/// private projects included
#[utoipa::path(
    get,
    path = "/api/profiles/me/portfolio",
    responses(
        (status = 200, description = "Portfolio preview", body = ApiResponse<PublicProfileDto>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "profiles",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_my_portfolio(
    user: AuthenticatedUser,
    State(service): State<Arc<ProfileService>>,
) -> Result<Json<ApiResponse<PublicProfileDto>>> {
    let preview = service.portfolio_preview(&user.user_id).await?;
    Ok(Json(ApiResponse::success(Some(preview), None, None)))
}

/// Public portfolio of a student
///
/// No authentication; only projects marked public are listed.
#[utoipa::path(
    get,
    path = "/api/profiles/{user_id}/public",
    params(
        ("user_id" = String, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Public profile", body = ApiResponse<PublicProfileDto>),
        (status = 404, description = "Profile not found")
    ),
    tag = "profiles"
)]
pub async fn get_public_profile(
    State(service): State<Arc<ProfileService>>,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResponse<PublicProfileDto>>> {
    let profile = service.get_public(&user_id).await?;
    Ok(Json(ApiResponse::success(Some(profile), None, None)))
}
