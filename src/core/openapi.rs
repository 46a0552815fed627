use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::analysis::{
    dtos as analysis_dtos, handlers as analysis_handlers, models as analysis_models,
    services::PipelineOutcome,
};
use crate::features::auth::AuthenticatedUser;
use crate::features::profiles::{dtos as profiles_dtos, handlers as profiles_handlers};
use crate::features::projects::{dtos as projects_dtos, handlers as projects_handlers};
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Analysis
        analysis_handlers::analyze_stream,
        analysis_handlers::analyze_sync,
        // Projects
        projects_handlers::list_projects,
        projects_handlers::get_project,
        projects_handlers::update_visibility,
        projects_handlers::delete_project,
        // Profiles
        profiles_handlers::get_my_profile,
        profiles_handlers::upsert_my_profile,
        profiles_handlers::get_my_skills,
        profiles_handlers::get_my_portfolio,
        profiles_handlers::get_public_profile,
    ),
    components(
        schemas(
            Meta,
            AuthenticatedUser,
            // Analysis
            analysis_models::ThoughtKind,
            analysis_models::Thought,
            analysis_models::MediaKind,
            analysis_models::UploadStatus,
            analysis_models::UploadedFile,
            PipelineOutcome,
            analysis_dtos::AnalyzeMediaDto,
            analysis_dtos::AnalyzeResponseDto,
            ApiResponse<analysis_dtos::AnalyzeResponseDto>,
            // Projects
            projects_dtos::ProjectResponseDto,
            projects_dtos::UpdateVisibilityDto,
            projects_dtos::DeleteProjectResponseDto,
            ApiResponse<projects_dtos::ProjectResponseDto>,
            ApiResponse<Vec<projects_dtos::ProjectResponseDto>>,
            ApiResponse<projects_dtos::DeleteProjectResponseDto>,
            // Profiles
            profiles_dtos::ProfileResponseDto,
            profiles_dtos::UpsertProfileDto,
            profiles_dtos::SkillLevelDto,
            profiles_dtos::PublicProfileDto,
            profiles_dtos::SkillCountDto,
            profiles_dtos::SkillRadarDto,
            ApiResponse<profiles_dtos::ProfileResponseDto>,
            ApiResponse<profiles_dtos::PublicProfileDto>,
            ApiResponse<profiles_dtos::SkillRadarDto>,
        )
    ),
    tags(
        (name = "analysis", description = "AI analysis of project media into portfolio entries"),
        (name = "projects", description = "Portfolio projects of the current user"),
        (name = "profiles", description = "Student profiles, skill radar and public portfolios"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Smart SIWES API",
        version = "0.1.0",
        description = "API documentation for Smart SIWES",
    )
)]
pub struct ApiDoc;

/// Adds Bearer JWT security scheme to OpenAPI spec
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
