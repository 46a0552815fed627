use thiserror::Error;

/// Every way an analysis run can end without a project
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("No files provided")]
    NoFiles,

    #[error("Could not read media: {0}")]
    Encoding(String),

    #[error("Storage upload failed: {0}")]
    Storage(String),

    #[error("Model rejected the request: {0}")]
    UpstreamRejected(String),

    #[error("Model stream interrupted: {0}")]
    StreamInterrupted(String),

    #[error("Model returned no answer")]
    EmptyResponse,

    #[error("Model answer contained no usable analysis: {0}")]
    MalformedAnalysis(String),

    #[error("Model answer does not match the analysis schema: {0}")]
    SchemaMismatch(String),

    #[error("No valid session")]
    Unauthenticated,

    #[error("Could not save project: {0}")]
    Persistence(String),

    #[error("Analysis cancelled")]
    Cancelled,
}

impl AnalysisError {
    /// Short stage-level cause shown to the user in the final warning
    pub fn user_message(&self) -> String {
        let cause = match self {
            AnalysisError::NoFiles => "no media file was provided",
            AnalysisError::Encoding(_) => "the media file could not be read",
            AnalysisError::Storage(_) => "the media could not be uploaded",
            AnalysisError::UpstreamRejected(_) => {
                "the AI service rejected the request, check the API key and file format"
            }
            AnalysisError::StreamInterrupted(_) => "the connection to the AI service was lost",
            AnalysisError::EmptyResponse => "the AI service returned an empty report",
            AnalysisError::MalformedAnalysis(_) => "the AI report could not be read",
            AnalysisError::SchemaMismatch(_) => "the AI report was incomplete",
            AnalysisError::Unauthenticated => "your session has expired, sign in again",
            AnalysisError::Persistence(_) => "the project could not be saved",
            AnalysisError::Cancelled => "the run was cancelled",
        };
        format!("Analysis failed: {}.", cause)
    }
}
