use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::features::analysis::models::{Thought, UploadedFile};
use crate::features::analysis::services::PipelineOutcome;

/// Multipart upload schema (documentation only)
///
/// The handlers read axum's Multipart directly. Every part named `file` is
/// collected; parts that are not images or videos are dropped.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct AnalyzeMediaDto {
    /// One or more image/video files. Only the first is analyzed.
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub file: Vec<String>,
}

/// Synchronous analysis result: the collected thoughts plus the terminal outcome
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponseDto {
    pub success: bool,
    /// New project id, empty when the run failed
    pub project_id: String,
    pub thoughts: Vec<Thought>,
    pub files: Vec<UploadedFile>,
}

impl AnalyzeResponseDto {
    pub fn new(outcome: PipelineOutcome, thoughts: Vec<Thought>, files: Vec<UploadedFile>) -> Self {
        Self {
            success: outcome.success,
            project_id: outcome.project_id,
            thoughts,
            files,
        }
    }
}
