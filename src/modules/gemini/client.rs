//! Streaming client for the Gemini `streamGenerateContent` endpoint

use async_trait::async_trait;
use axum::body::Bytes;
use futures::stream::{self, BoxStream};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use super::sse::SseDecoder;
use crate::core::config::GeminiConfig;
use crate::features::analysis::services::{Fragment, FragmentStream, ModelRequest, ReasoningModel};
use crate::features::analysis::AnalysisError;

/// Gemini model client, built once at startup
pub struct GeminiClient {
    http: reqwest::Client,
    config: GeminiConfig,
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig<'a>,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum RequestPart<'a> {
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData<'a>,
    },
    Text {
        text: &'a str,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData<'a> {
    mime_type: &'a str,
    data: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    temperature: f32,
    thinking_config: ThinkingConfig<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig<'a> {
    include_thoughts: bool,
    thinking_level: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StreamChunk {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    thought: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    code: Option<u16>,
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ApiError,
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.code, &self.status) {
            (Some(code), Some(status)) => write!(f, "{} {}: {}", code, status, self.message),
            (Some(code), None) => write!(f, "{}: {}", code, self.message),
            _ => write!(f, "{}", self.message),
        }
    }
}

// =============================================================================
// DECODING
// =============================================================================

/// Split one stream chunk into fragments.
///
/// Parts flagged `thought` are reasoning; any other text part is answer.
pub fn fragments_from_chunk(data: &str) -> Result<Vec<Fragment>, AnalysisError> {
    let chunk: StreamChunk = serde_json::from_str(data).map_err(|e| {
        AnalysisError::StreamInterrupted(format!("undecodable stream chunk: {}", e))
    })?;

    if let Some(error) = chunk.error {
        return Err(AnalysisError::UpstreamRejected(error.to_string()));
    }

    if let Some(reason) = chunk.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(AnalysisError::UpstreamRejected(format!(
            "prompt blocked: {}",
            reason
        )));
    }

    let fragments = chunk
        .candidates
        .into_iter()
        .take(1)
        .filter_map(|candidate| candidate.content)
        .flat_map(|content| content.parts)
        .filter_map(|part| {
            let text = part.text?;
            Some(if part.thought {
                Fragment::Reasoning(text)
            } else {
                Fragment::Answer(text)
            })
        })
        .collect();

    Ok(fragments)
}

/// Readable cause from a non-2xx response body
fn rejection_message(status: reqwest::StatusCode, body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => format!("HTTP {}: {}", status.as_u16(), parsed.error.message),
        Err(_) => {
            let snippet: String = body.chars().take(200).collect();
            format!("HTTP {}: {}", status.as_u16(), snippet)
        }
    }
}

struct StreamState {
    body: BoxStream<'static, reqwest::Result<Bytes>>,
    decoder: SseDecoder,
    pending: VecDeque<Result<Fragment, AnalysisError>>,
    finished: bool,
}

impl StreamState {
    fn enqueue(&mut self, data: &str) {
        match fragments_from_chunk(data) {
            Ok(fragments) => self.pending.extend(fragments.into_iter().map(Ok)),
            Err(e) => self.pending.push_back(Err(e)),
        }
    }
}

/// Turn a response body into fragments. The first error ends the stream.
fn fragment_stream(body: BoxStream<'static, reqwest::Result<Bytes>>) -> FragmentStream {
    let state = StreamState {
        body,
        decoder: SseDecoder::new(),
        pending: VecDeque::new(),
        finished: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.pending.pop_front() {
                if item.is_err() {
                    state.finished = true;
                    state.pending.clear();
                }
                return Some((item, state));
            }
            if state.finished {
                return None;
            }

            match state.body.next().await {
                Some(Ok(bytes)) => {
                    for data in state.decoder.push(&bytes) {
                        state.enqueue(&data);
                    }
                }
                Some(Err(e)) => {
                    state
                        .pending
                        .push_back(Err(AnalysisError::StreamInterrupted(e.to_string())));
                }
                None => {
                    state.finished = true;
                    if let Some(data) = state.decoder.finish() {
                        state.enqueue(&data);
                    }
                }
            }
        }
    })
    .boxed()
}

// =============================================================================
// CLIENT
// =============================================================================

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        tracing::info!(
            "Gemini client initialized for model: {} (thinking level {})",
            config.model,
            config.thinking_level
        );

        Ok(Self { http, config })
    }

    fn stream_url(&self) -> String {
        format!(
            "{}/models/{}:streamGenerateContent?alt=sse",
            self.config.base_url, self.config.model
        )
    }
}

#[async_trait]
impl ReasoningModel for GeminiClient {
    async fn stream(&self, request: ModelRequest) -> Result<FragmentStream, AnalysisError> {
        let body = GenerateRequest {
            system_instruction: Content {
                role: None,
                parts: vec![RequestPart::Text {
                    text: &request.system_prompt,
                }],
            },
            contents: vec![Content {
                role: Some("user"),
                parts: vec![
                    RequestPart::InlineData {
                        inline_data: InlineData {
                            mime_type: &request.mime_type,
                            data: &request.media,
                        },
                    },
                    RequestPart::Text {
                        text: &request.user_prompt,
                    },
                ],
            }],
            generation_config: GenerationConfig {
                temperature: self.config.temperature,
                thinking_config: ThinkingConfig {
                    include_thoughts: true,
                    thinking_level: &self.config.thinking_level,
                },
            },
        };

        tracing::debug!(
            "Sending {} ({} base64 bytes) to {}",
            request.mime_type,
            request.media.len(),
            self.config.model
        );

        let response = self
            .http
            .post(self.stream_url())
            .header("x-goog-api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AnalysisError::StreamInterrupted(format!(
                        "request timed out after {}s",
                        self.config.request_timeout.as_secs()
                    ))
                } else {
                    AnalysisError::StreamInterrupted(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = rejection_message(status, &body);
            tracing::warn!("Gemini rejected request: {}", message);
            return Err(AnalysisError::UpstreamRejected(message));
        }

        Ok(fragment_stream(response.bytes_stream().boxed()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body_of(chunks: Vec<&'static str>) -> BoxStream<'static, reqwest::Result<Bytes>> {
        stream::iter(
            chunks
                .into_iter()
                .map(|c| Ok(Bytes::from_static(c.as_bytes())))
                .collect::<Vec<_>>(),
        )
        .boxed()
    }

    #[test]
    fn test_thought_parts_are_reasoning() {
        let data = r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Looking at the board","thought":true},{"text":"{\"title\""}]}}]}"#;
        let fragments = fragments_from_chunk(data).unwrap();
        assert_eq!(
            fragments,
            vec![
                Fragment::Reasoning("Looking at the board".to_string()),
                Fragment::Answer("{\"title\"".to_string()),
            ]
        );
    }

    #[test]
    fn test_chunk_without_text_yields_nothing() {
        let data = r#"{"candidates":[{"finishReason":"STOP"}],"usageMetadata":{"totalTokenCount":10}}"#;
        assert!(fragments_from_chunk(data).unwrap().is_empty());
    }

    #[test]
    fn test_inline_error_is_rejection() {
        let data = r#"{"error":{"code":429,"message":"Resource exhausted","status":"RESOURCE_EXHAUSTED"}}"#;
        let result = fragments_from_chunk(data);
        assert!(matches!(result, Err(AnalysisError::UpstreamRejected(msg)) if msg.contains("429")));
    }

    #[test]
    fn test_blocked_prompt_is_rejection() {
        let data = r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#;
        assert!(matches!(
            fragments_from_chunk(data),
            Err(AnalysisError::UpstreamRejected(_))
        ));
    }

    #[test]
    fn test_garbage_chunk_is_interruption() {
        assert!(matches!(
            fragments_from_chunk("{not json"),
            Err(AnalysisError::StreamInterrupted(_))
        ));
    }

    #[test]
    fn test_rejection_message_uses_api_error() {
        let message = rejection_message(
            reqwest::StatusCode::FORBIDDEN,
            r#"{"error":{"code":403,"message":"API key not valid","status":"PERMISSION_DENIED"}}"#,
        );
        assert_eq!(message, "HTTP 403: API key not valid");
    }

    #[test]
    fn test_request_body_shape() {
        let body = GenerateRequest {
            system_instruction: Content {
                role: None,
                parts: vec![RequestPart::Text { text: "sys" }],
            },
            contents: vec![Content {
                role: Some("user"),
                parts: vec![
                    RequestPart::InlineData {
                        inline_data: InlineData {
                            mime_type: "image/jpeg",
                            data: "aGk=",
                        },
                    },
                    RequestPart::Text { text: "go" },
                ],
            }],
            generation_config: GenerationConfig {
                temperature: 0.5,
                thinking_config: ThinkingConfig {
                    include_thoughts: true,
                    thinking_level: "HIGH",
                },
            },
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json["contents"][0]["parts"][0]["inlineData"]["mimeType"],
            "image/jpeg"
        );
        assert_eq!(json["contents"][0]["parts"][1]["text"], "go");
        assert_eq!(json["systemInstruction"]["parts"][0]["text"], "sys");
        assert!(json["systemInstruction"].get("role").is_none());
        assert_eq!(
            json["generationConfig"]["thinkingConfig"]["includeThoughts"],
            true
        );
        assert_eq!(
            json["generationConfig"]["thinkingConfig"]["thinkingLevel"],
            "HIGH"
        );
    }

    #[tokio::test]
    async fn test_stream_reassembles_split_events() {
        let body = body_of(vec![
            "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"hmm\",\"thou",
            "ght\":true}]}}]}\r\n\r\ndata: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"{}\"}]}}]}\r\n\r\n",
        ]);

        let items: Vec<_> = fragment_stream(body).collect().await;
        let fragments: Vec<Fragment> = items.into_iter().map(|r| r.unwrap()).collect();
        assert_eq!(
            fragments,
            vec![
                Fragment::Reasoning("hmm".to_string()),
                Fragment::Answer("{}".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn test_stream_stops_after_first_error() {
        let body = body_of(vec![
            "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"a\"}]}}]}\n\n",
            "data: {broken\n\n",
            "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"b\"}]}}]}\n\n",
        ]);

        let items: Vec<_> = fragment_stream(body).collect().await;
        assert_eq!(items.len(), 2);
        assert!(matches!(items[0], Ok(Fragment::Answer(_))));
        assert!(matches!(items[1], Err(AnalysisError::StreamInterrupted(_))));
    }
}
