use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    response::{
        sse::{Event, KeepAlive},
        IntoResponse, Response, Sse,
    },
    Json,
};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::core::error::{AppError, Result};
use crate::features::analysis::dtos::{AnalyzeMediaDto, AnalyzeResponseDto};
use crate::features::analysis::error::AnalysisError;
use crate::features::analysis::models::{
    MediaFile, MediaKind, Thought, ThoughtKind, UploadStatus, UploadedFile,
};
use crate::features::analysis::services::{AnalysisPipeline, PipelineOutcome};
use crate::features::auth::model::{AuthenticatedUser, BearerToken};
use crate::features::auth::{SessionVerifier, TokenSession};
use crate::shared::types::ApiResponse;

/// Events buffered for a slow SSE client
const EVENT_BUFFER: usize = 256;

/// Slots kept free for stage thoughts once reasoning fills the buffer
const RESERVED_EVENT_SLOTS: usize = 16;

/// State for analysis handlers
#[derive(Clone)]
pub struct AnalysisState {
    pub pipeline: Arc<AnalysisPipeline>,
    pub sessions: Arc<dyn SessionVerifier>,
    /// Per-file limit in bytes
    pub max_upload_size: usize,
}

/// Read every image/video `file` part. Other parts are dropped.
async fn read_media(multipart: &mut Multipart, max_upload_size: usize) -> Result<Vec<MediaFile>> {
    let mut files = Vec::new();

    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
        let field_name = field.name().unwrap_or("").to_string();
        if field_name != "file" {
            debug!("Ignoring unknown field: {}", field_name);
            continue;
        }

        let content_type = field
            .content_type()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());
        let name = field
            .file_name()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "unnamed".to_string());

        if !MediaKind::is_supported_mime(&content_type) {
            debug!("Dropping '{}' ({}): not an image or video", name, content_type);
            continue;
        }

        let mut data = Vec::new();
        while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
            if data.len() + chunk.len() > max_upload_size {
                return Err(AppError::PayloadTooLarge(format!(
                    "'{}' is too large. Maximum size is {} MB",
                    name,
                    max_upload_size / 1024 / 1024
                )));
            }
            data.extend_from_slice(&chunk);
        }

        files.push(MediaFile {
            name,
            content_type,
            data: data.into(),
        });
    }

    if files.is_empty() {
        return Err(AppError::BadRequest(AnalysisError::NoFiles.user_message()));
    }

    Ok(files)
}

fn multipart_error(e: axum::extract::multipart::MultipartError) -> AppError {
    debug!("Failed to read multipart data: {}", e);
    if e.status() == axum::http::StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(e.body_text())
    } else {
        AppError::BadRequest(format!("Failed to read multipart data: {}", e))
    }
}

/// Intake records for the received files, all past the upload step
fn intake_records(files: &[MediaFile]) -> Vec<UploadedFile> {
    files
        .iter()
        .map(|file| {
            let mut record = UploadedFile::from_media(file);
            record.advance(UploadStatus::Analyzing);
            record
        })
        .collect()
}

fn sse_event<T: Serialize>(name: &str, payload: &T) -> Option<Event> {
    Event::default()
        .event(name)
        .json_data(payload)
        .map_err(|e| tracing::error!("Failed to encode {} event: {}", name, e))
        .ok()
}

/// Run the pipeline in the background, sending `thought` events and then one
/// `result` event. Dropping the receiver cancels the run.
fn spawn_run(
    pipeline: Arc<AnalysisPipeline>,
    files: Vec<MediaFile>,
    session: TokenSession,
) -> (mpsc::Receiver<Event>, JoinHandle<PipelineOutcome>) {
    let (tx, rx) = mpsc::channel::<Event>(EVENT_BUFFER);

    let handle = tokio::spawn(async move {
        let cancel = CancellationToken::new();
        let finished = CancellationToken::new();

        // Cancel the run once the client stops listening
        {
            let tx = tx.clone();
            let cancel = cancel.clone();
            let finished = finished.clone();
            tokio::spawn(async move {
                tokio::select! {
                    _ = tx.closed() => {
                        debug!("Client disconnected, cancelling analysis");
                        cancel.cancel();
                    }
                    _ = finished.cancelled() => {}
                }
            });
        }

        let thought_tx = tx.clone();
        let mut on_thought = move |thought: Thought| {
            // Reasoning goes first when the client lags
            if thought.kind == ThoughtKind::Process
                && thought_tx.capacity() <= RESERVED_EVENT_SLOTS
            {
                debug!("Client is lagging, dropping thought");
                return;
            }
            if let Some(event) = sse_event("thought", &thought) {
                if let Err(e) = thought_tx.try_send(event) {
                    debug!("Thought not delivered: {}", e);
                }
            }
        };

        let outcome = pipeline.run(files, &session, &mut on_thought, &cancel).await;

        if let Some(event) = sse_event("result", &outcome) {
            if tx.send(event).await.is_err() {
                debug!("Client gone before the result event");
            }
        }
        finished.cancel();
        outcome
    });

    (rx, handle)
}

/// Analyze media and stream progress as Server-Sent Events
///
/// Emits one `thought` event per progress line, then exactly one `result`
/// event `{success, projectId}`. Closing the connection cancels the run.
#[utoipa::path(
    post,
    path = "/api/projects/analyze",
    tag = "analysis",
    request_body(
        content = AnalyzeMediaDto,
        content_type = "multipart/form-data",
        description = "Project media to analyze"
    ),
    responses(
        (status = 200, description = "SSE stream of thought events and one result event", content_type = "text/event-stream"),
        (status = 400, description = "No image or video provided"),
        (status = 401, description = "Unauthorized"),
        (status = 413, description = "File too large")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn analyze_stream(
    user: AuthenticatedUser,
    token: BearerToken,
    State(state): State<AnalysisState>,
    mut multipart: Multipart,
) -> Result<Response> {
    let files = read_media(&mut multipart, state.max_upload_size).await?;
    debug!("User {} started analysis of {} file(s)", user.user_id, files.len());

    let session = TokenSession::new(Arc::clone(&state.sessions), token);
    let (rx, _run) = spawn_run(Arc::clone(&state.pipeline), files, session);

    let stream = ReceiverStream::new(rx).map(Ok::<_, Infallible>);

    // Return SSE response with keepalive
    let sse = Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(std::time::Duration::from_secs(15))
            .text("ping"),
    );

    Ok(sse.into_response())
}

/// Analyze media and return all thoughts with the result (non-streaming fallback)
#[utoipa::path(
    post,
    path = "/api/projects/analyze/sync",
    tag = "analysis",
    request_body(
        content = AnalyzeMediaDto,
        content_type = "multipart/form-data",
        description = "Project media to analyze"
    ),
    responses(
        (status = 200, description = "Run finished; check `success`", body = ApiResponse<AnalyzeResponseDto>),
        (status = 400, description = "No image or video provided"),
        (status = 401, description = "Unauthorized"),
        (status = 413, description = "File too large")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn analyze_sync(
    user: AuthenticatedUser,
    token: BearerToken,
    State(state): State<AnalysisState>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<AnalyzeResponseDto>>> {
    let files = read_media(&mut multipart, state.max_upload_size).await?;
    debug!("User {} started analysis of {} file(s)", user.user_id, files.len());

    let session = TokenSession::new(Arc::clone(&state.sessions), token);
    let mut records = intake_records(&files);
    let mut thoughts = Vec::new();

    let outcome = state
        .pipeline
        .run(
            files,
            &session,
            &mut |thought| thoughts.push(thought),
            &CancellationToken::new(),
        )
        .await;

    if outcome.success {
        if let Some(first) = records.first_mut() {
            first.advance(UploadStatus::Complete);
        }
    }

    let message = thoughts.last().map(|t| t.text.clone());
    Ok(Json(ApiResponse::success(
        Some(AnalyzeResponseDto::new(outcome, thoughts, records)),
        message,
        None,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::analysis::routes::routes;
    use crate::features::analysis::services::fakes::{
        jpeg, pipeline, HangingModel, MemoryStorage, MemoryStore, ScriptedModel,
        LED_BLINKER_ANSWER,
    };
    use crate::features::analysis::services::{AnalysisRequester, Fragment, PersistenceWriter};
    use crate::shared::test_helpers::{with_test_user, AcceptingVerifier, TEST_TOKEN};
    use std::time::Duration;
    use axum::http::StatusCode;
    use axum_test::multipart::{MultipartForm, Part};
    use axum_test::TestServer;

    fn server(model: ScriptedModel, store: Arc<MemoryStore>, max_upload_size: usize) -> TestServer {
        let state = AnalysisState {
            pipeline: Arc::new(pipeline(
                Arc::new(MemoryStorage::default()),
                Arc::new(model),
                store,
            )),
            sessions: Arc::new(AcceptingVerifier),
            max_upload_size,
        };
        TestServer::new(with_test_user(routes(state))).unwrap()
    }

    fn image_form() -> MultipartForm {
        MultipartForm::new().add_part(
            "file",
            Part::bytes(vec![0xFF, 0xD8, 0xFF, 0xE0])
                .file_name("board.jpg")
                .mime_type("image/jpeg"),
        )
    }

    fn led_model() -> ScriptedModel {
        ScriptedModel::new(vec![
            Ok(Fragment::Reasoning("Detecting breadboard components".to_string())),
            Ok(Fragment::Answer(LED_BLINKER_ANSWER.to_string())),
        ])
    }

    #[tokio::test]
    async fn test_sync_analysis_returns_project() {
        let store = Arc::new(MemoryStore::default());
        let server = server(led_model(), store.clone(), 1024);

        let response = server
            .post("/api/projects/analyze/sync")
            .multipart(image_form())
            .await;

        response.assert_status_ok();
        let body: ApiResponse<AnalyzeResponseDto> = response.json();
        let data = body.data.unwrap();
        assert!(data.success);
        assert_eq!(data.files.len(), 1);
        assert_eq!(data.files[0].status, UploadStatus::Complete);
        assert_eq!(data.thoughts.last().unwrap().kind, ThoughtKind::Success);

        let rows = store.rows.lock().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].1.user_id, "test-user");
        assert_eq!(data.project_id, rows[0].0.to_string());
    }

    #[tokio::test]
    async fn test_stream_ends_with_result_event() {
        let server = server(led_model(), Arc::new(MemoryStore::default()), 1024);

        let response = server
            .post("/api/projects/analyze")
            .multipart(image_form())
            .await;

        response.assert_status_ok();
        let body = response.text();
        assert!(body.contains("event: thought"));
        assert!(body.contains("Detecting breadboard components"));
        assert_eq!(body.matches("event: result").count(), 1);
        let result_at = body.find("event: result").unwrap();
        assert!(body[result_at..].contains("\"success\":true"));
        assert!(!body[result_at..].contains("event: thought"));
    }

    #[tokio::test]
    async fn test_non_media_parts_are_dropped() {
        let store = Arc::new(MemoryStore::default());
        let server = server(led_model(), store.clone(), 1024);
        let form = MultipartForm::new().add_part(
            "file",
            Part::bytes(b"%PDF-1.7".to_vec())
                .file_name("report.pdf")
                .mime_type("application/pdf"),
        );

        let response = server
            .post("/api/projects/analyze/sync")
            .multipart(form)
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: ApiResponse<()> = response.json();
        assert_eq!(body.message, Some(AnalysisError::NoFiles.user_message()));
        assert!(store.rows.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_disconnect_cancels_run() {
        let storage = Arc::new(MemoryStorage::default());
        let store = Arc::new(MemoryStore::default());
        let pipeline = Arc::new(AnalysisPipeline::new(
            storage.clone(),
            AnalysisRequester::new(Arc::new(HangingModel)).unwrap(),
            PersistenceWriter::new(store.clone()),
        ));
        let session = TokenSession::new(
            Arc::new(AcceptingVerifier),
            BearerToken(TEST_TOKEN.to_string()),
        );

        let (mut rx, run) = spawn_run(pipeline, vec![jpeg("board.jpg")], session);

        // Upload, encode and request thoughts; the model then never answers
        for _ in 0..4 {
            assert!(rx.recv().await.is_some());
        }
        drop(rx);

        let outcome = tokio::time::timeout(Duration::from_secs(5), run)
            .await
            .expect("run kept waiting on the model")
            .unwrap();

        assert!(!outcome.success);
        assert!(outcome.project_id.is_empty());
        assert_eq!(storage.paths.lock().unwrap().len(), 1);
        assert!(store.rows.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_lagging_client_still_gets_result() {
        let mut fragments: Vec<_> = (0..EVENT_BUFFER * 2)
            .map(|i| Ok(Fragment::Reasoning(format!("step {}", i))))
            .collect();
        fragments.push(Ok(Fragment::Answer(LED_BLINKER_ANSWER.to_string())));
        let store = Arc::new(MemoryStore::default());
        let pipeline = Arc::new(pipeline(
            Arc::new(MemoryStorage::default()),
            Arc::new(ScriptedModel::new(fragments)),
            store.clone(),
        ));
        let session = TokenSession::new(
            Arc::new(AcceptingVerifier),
            BearerToken(TEST_TOKEN.to_string()),
        );

        let (mut rx, run) = spawn_run(pipeline, vec![jpeg("board.jpg")], session);

        // Nothing is read until the run has finished
        let outcome = run.await.unwrap();
        assert!(outcome.success);

        let mut received = 0;
        while rx.recv().await.is_some() {
            received += 1;
        }
        assert!(received <= EVENT_BUFFER);
        assert_eq!(store.rows.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_oversized_file_is_rejected() {
        let store = Arc::new(MemoryStore::default());
        let server = server(led_model(), store.clone(), 2);

        let response = server
            .post("/api/projects/analyze/sync")
            .multipart(image_form())
            .await;

        response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
        assert!(store.rows.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_model_failure_is_reported_in_body() {
        let store = Arc::new(MemoryStore::default());
        let model = ScriptedModel::new(vec![Err(AnalysisError::UpstreamRejected(
            "HTTP 403: API key not valid".to_string(),
        ))]);
        let server = server(model, store.clone(), 1024);

        let response = server
            .post("/api/projects/analyze/sync")
            .multipart(image_form())
            .await;

        response.assert_status_ok();
        let data = response.json::<ApiResponse<AnalyzeResponseDto>>().data.unwrap();
        assert!(!data.success);
        assert_eq!(data.project_id, "");
        assert_eq!(data.thoughts.last().unwrap().kind, ThoughtKind::Warning);
        assert_eq!(data.files[0].status, UploadStatus::Analyzing);
        assert!(store.rows.lock().unwrap().is_empty());
    }
}
