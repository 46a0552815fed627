use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::features::analysis::error::AnalysisError;
use crate::features::analysis::models::{MediaKind, ProjectAnalysis, Thought};
use crate::shared::llm::LlmResponse;
use crate::shared::prompts::{render_analysis_prompts, AnalysisPrompts, TemplateError};

/// One piece of a streamed model response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    /// Intermediate reasoning, shown to the user as it arrives
    Reasoning(String),
    /// Part of the final answer
    Answer(String),
}

/// Everything the model needs for one analysis
#[derive(Debug, Clone)]
pub struct ModelRequest {
    /// Base64 media body
    pub media: String,
    pub mime_type: String,
    pub system_prompt: String,
    pub user_prompt: String,
}

pub type FragmentStream = BoxStream<'static, Result<Fragment, AnalysisError>>;

/// A remote model that streams its reasoning next to its answer
#[async_trait]
pub trait ReasoningModel: Send + Sync {
    /// Open the stream. Rejections before the first fragment are returned here.
    async fn stream(&self, request: ModelRequest) -> Result<FragmentStream, AnalysisError>;
}

/// Sends media to the model, forwards reasoning, and collects the answer
pub struct AnalysisRequester {
    model: Arc<dyn ReasoningModel>,
    image_prompts: AnalysisPrompts,
    video_prompts: AnalysisPrompts,
}

impl AnalysisRequester {
    /// Prompts are rendered once here so a broken template fails at startup.
    pub fn new(model: Arc<dyn ReasoningModel>) -> Result<Self, TemplateError> {
        let schema = ProjectAnalysis::json_schema_string();
        Ok(Self {
            model,
            image_prompts: render_analysis_prompts(MediaKind::Image.as_str(), &schema)?,
            video_prompts: render_analysis_prompts(MediaKind::Video.as_str(), &schema)?,
        })
    }

    fn prompts_for(&self, kind: MediaKind) -> &AnalysisPrompts {
        match kind {
            MediaKind::Image => &self.image_prompts,
            MediaKind::Video => &self.video_prompts,
        }
    }

    /// Run the model call and return the concatenated answer text.
    ///
    /// Each reasoning fragment is passed to `on_thought` as a `process` thought
    /// before the next fragment is read.
    pub async fn request(
        &self,
        media: String,
        mime_type: &str,
        on_thought: &mut (dyn FnMut(Thought) + Send),
        cancel: &CancellationToken,
    ) -> Result<String, AnalysisError> {
        let prompts = self.prompts_for(MediaKind::from_mime(mime_type));
        let request = ModelRequest {
            media,
            mime_type: mime_type.to_string(),
            system_prompt: prompts.system.clone(),
            user_prompt: prompts.user.clone(),
        };

        let mut stream = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(AnalysisError::Cancelled),
            opened = self.model.stream(request) => opened?,
        };

        let mut answer = String::new();
        let mut reasoning_count = 0usize;

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(AnalysisError::Cancelled),
                next = stream.next() => next,
            };

            match next {
                Some(Ok(Fragment::Reasoning(text))) => {
                    if text.is_empty() {
                        continue;
                    }
                    reasoning_count += 1;
                    on_thought(Thought::process(text));
                }
                Some(Ok(Fragment::Answer(text))) => answer.push_str(&text),
                Some(Err(e)) => return Err(e),
                None => break,
            }
        }

        tracing::debug!(
            "Model stream finished: {} reasoning fragments, {} answer bytes",
            reasoning_count,
            answer.len()
        );

        if answer.trim().is_empty() {
            return Err(AnalysisError::EmptyResponse);
        }

        Ok(answer)
    }
}
