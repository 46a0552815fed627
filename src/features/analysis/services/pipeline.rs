use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use utoipa::ToSchema;
use uuid::Uuid;

use super::encoder::encode_media;
use super::extractor::extract_analysis;
use super::requester::AnalysisRequester;
use super::writer::{PersistenceWriter, SessionProvider};
use crate::features::analysis::error::AnalysisError;
use crate::features::analysis::models::{MediaFile, Thought};
use crate::modules::storage::MediaStorage;
use crate::shared::constants::PROJECT_MEDIA_FOLDER;
use crate::shared::validation::storage_extension;

/// Terminal result of one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PipelineOutcome {
    pub success: bool,
    /// New project id, empty on failure
    pub project_id: String,
}

impl PipelineOutcome {
    fn done(id: Uuid) -> Self {
        Self {
            success: true,
            project_id: id.to_string(),
        }
    }

    fn failed() -> Self {
        Self {
            success: false,
            project_id: String::new(),
        }
    }
}

/// Stages of a run, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Uploading,
    Encoding,
    Requesting,
    Extracting,
    Persisting,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Uploading => "uploading",
            Stage::Encoding => "encoding",
            Stage::Requesting => "requesting",
            Stage::Extracting => "extracting",
            Stage::Persisting => "persisting",
        };
        f.write_str(name)
    }
}

/// Upload, analyze and save one piece of media as a project.
///
/// Runs are independent. Nothing here is shared mutably between them.
pub struct AnalysisPipeline {
    storage: Arc<dyn MediaStorage>,
    requester: AnalysisRequester,
    writer: PersistenceWriter,
}

impl AnalysisPipeline {
    pub fn new(
        storage: Arc<dyn MediaStorage>,
        requester: AnalysisRequester,
        writer: PersistenceWriter,
    ) -> Self {
        Self {
            storage,
            requester,
            writer,
        }
    }

    /// Run the pipeline on the first file.
    ///
    /// Always resolves. A failure emits exactly one `warning` thought and
    /// returns an unsuccessful outcome.
    pub async fn run(
        &self,
        files: Vec<MediaFile>,
        session: &dyn SessionProvider,
        on_thought: &mut (dyn FnMut(Thought) + Send),
        cancel: &CancellationToken,
    ) -> PipelineOutcome {
        let run_id = Uuid::now_v7();

        match self.execute(run_id, files, session, on_thought, cancel).await {
            Ok(project_id) => {
                tracing::info!(run_id = %run_id, project_id = %project_id, "Analysis run done");
                PipelineOutcome::done(project_id)
            }
            Err(e) => {
                match &e {
                    AnalysisError::Cancelled => {
                        tracing::info!(run_id = %run_id, "Analysis run cancelled")
                    }
                    AnalysisError::Persistence(_) | AnalysisError::Storage(_) => {
                        tracing::error!(run_id = %run_id, "Analysis run failed: {}", e)
                    }
                    _ => tracing::warn!(run_id = %run_id, "Analysis run failed: {}", e),
                }
                on_thought(Thought::warning(e.user_message()));
                PipelineOutcome::failed()
            }
        }
    }

    async fn execute(
        &self,
        run_id: Uuid,
        files: Vec<MediaFile>,
        session: &dyn SessionProvider,
        on_thought: &mut (dyn FnMut(Thought) + Send),
        cancel: &CancellationToken,
    ) -> Result<Uuid, AnalysisError> {
        let mut files = files.into_iter();
        let file = files.next().ok_or(AnalysisError::NoFiles)?;

        let ignored = files.count();
        if ignored > 0 {
            tracing::warn!(
                run_id = %run_id,
                "Only the first file is analyzed, ignoring {} more",
                ignored
            );
        }

        // Uploading
        enter(run_id, Stage::Uploading, cancel)?;
        on_thought(Thought::process("Uploading media to secure storage..."));
        let path = format!(
            "{}/{}.{}",
            PROJECT_MEDIA_FOLDER,
            Uuid::new_v4(),
            storage_extension(&file.name, &file.content_type)
        );
        self.storage
            .put(&path, file.data.clone(), &file.content_type)
            .await
            .map_err(|e| AnalysisError::Storage(e.to_string()))?;
        let thumbnail = self.storage.public_address(&path);
        on_thought(Thought::success("Media uploaded successfully."));

        // Encoding
        enter(run_id, Stage::Encoding, cancel)?;
        on_thought(Thought::info("Initializing multimodal perception modules..."));
        let media = encode_media(&file).await?;

        // Requesting
        enter(run_id, Stage::Requesting, cancel)?;
        on_thought(Thought::process("Generating SIWES logbook entry..."));
        let raw_answer = self
            .requester
            .request(media, &file.content_type, on_thought, cancel)
            .await?;
        on_thought(Thought::success("Technical rationale synthesized."));

        // Extracting
        enter(run_id, Stage::Extracting, cancel)?;
        let analysis = extract_analysis(&raw_answer)?;
        on_thought(Thought::process("Drafting professional case study..."));

        // Persisting
        enter(run_id, Stage::Persisting, cancel)?;
        let project_id = self
            .writer
            .persist(analysis, thumbnail, file.is_video(), session)
            .await?;
        on_thought(Thought::success("Proof generation complete."));

        Ok(project_id)
    }
}

/// Log the transition, unless the run was abandoned
fn enter(run_id: Uuid, stage: Stage, cancel: &CancellationToken) -> Result<(), AnalysisError> {
    if cancel.is_cancelled() {
        return Err(AnalysisError::Cancelled);
    }
    tracing::info!(run_id = %run_id, stage = %stage, "Analysis stage");
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::features::analysis::models::ThoughtKind;
    use crate::features::analysis::services::requester::tests::ScriptedModel;
    use crate::features::analysis::services::requester::Fragment;
    use crate::features::analysis::services::writer::tests::{FixedSession, MemoryStore};
    use crate::modules::storage::StorageError;
    use async_trait::async_trait;
    use axum::body::Bytes;
    use std::sync::Mutex;

    pub(crate) const LED_BLINKER_ANSWER: &str = "Sure! ```json\n{\"title\":\"LED Blinker\",\"summary\":\"...\",\"description\":\"d\",\"skills\":[\"C\"],\"technical_specs\":{},\"category\":\"Embedded\",\"recruiter_insight\":\"x\"}\n```";

    /// Storage double keeping uploaded paths in memory
    #[derive(Default)]
    pub(crate) struct MemoryStorage {
        pub paths: Mutex<Vec<String>>,
        pub removed: Mutex<Vec<String>>,
        pub fail: bool,
    }

    #[async_trait]
    impl MediaStorage for MemoryStorage {
        async fn put(
            &self,
            path: &str,
            _data: Bytes,
            _content_type: &str,
        ) -> Result<(), StorageError> {
            if self.fail {
                return Err(StorageError::Request("bucket unreachable".to_string()));
            }
            self.paths.lock().unwrap().push(path.to_string());
            Ok(())
        }

        fn public_address(&self, path: &str) -> String {
            format!("http://storage.test/public/{}", path)
        }

        async fn remove(&self, url: &str) -> Result<(), StorageError> {
            self.removed.lock().unwrap().push(url.to_string());
            Ok(())
        }
    }

    pub(crate) fn jpeg(name: &str) -> MediaFile {
        MediaFile {
            name: name.to_string(),
            content_type: "image/jpeg".to_string(),
            data: Bytes::from_static(&[0xFF, 0xD8, 0xFF, 0xE0]),
        }
    }

    pub(crate) fn pipeline(
        storage: Arc<MemoryStorage>,
        model: Arc<ScriptedModel>,
        store: Arc<MemoryStore>,
    ) -> AnalysisPipeline {
        AnalysisPipeline::new(
            storage,
            AnalysisRequester::new(model).unwrap(),
            PersistenceWriter::new(store),
        )
    }

    fn led_blinker_model() -> Arc<ScriptedModel> {
        Arc::new(ScriptedModel::new(vec![
            Ok(Fragment::Reasoning("Detecting breadboard components".to_string())),
            Ok(Fragment::Answer(LED_BLINKER_ANSWER.to_string())),
        ]))
    }

    #[tokio::test]
    async fn test_jpeg_run_inserts_one_project() {
        let storage = Arc::new(MemoryStorage::default());
        let store = Arc::new(MemoryStore::default());
        let pipeline = pipeline(storage.clone(), led_blinker_model(), store.clone());
        let mut thoughts = Vec::new();

        let outcome = pipeline
            .run(
                vec![jpeg("board.jpg")],
                &FixedSession(Some("user-1")),
                &mut |t| thoughts.push(t),
                &CancellationToken::new(),
            )
            .await;

        assert!(outcome.success);
        let rows = store.rows.lock().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(outcome.project_id, rows[0].0.to_string());
        assert_eq!(rows[0].1.title, "LED Blinker");
        assert_eq!(rows[0].1.skills, vec!["C".to_string()]);
        assert!(!rows[0].1.is_video);

        let paths = storage.paths.lock().unwrap();
        assert_eq!(paths.len(), 1);
        assert!(paths[0].starts_with("project-media/"));
        assert!(paths[0].ends_with(".jpg"));
        assert_eq!(
            rows[0].1.thumbnail,
            format!("http://storage.test/public/{}", paths[0])
        );

        assert!(thoughts.contains(&Thought::process("Detecting breadboard components")));
        let last = thoughts.last().unwrap();
        assert_eq!(last.kind, ThoughtKind::Success);
        assert!(thoughts.iter().all(|t| t.kind != ThoughtKind::Warning));
    }

    #[tokio::test]
    async fn test_empty_file_list_fails_without_insert() {
        let store = Arc::new(MemoryStore::default());
        let pipeline = pipeline(
            Arc::new(MemoryStorage::default()),
            led_blinker_model(),
            store.clone(),
        );
        let mut thoughts = Vec::new();

        let outcome = pipeline
            .run(
                Vec::new(),
                &FixedSession(Some("user-1")),
                &mut |t| thoughts.push(t),
                &CancellationToken::new(),
            )
            .await;

        assert_eq!(outcome, PipelineOutcome::failed());
        assert_eq!(thoughts.len(), 1);
        assert_eq!(thoughts[0].kind, ThoughtKind::Warning);
        assert!(store.rows.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_stream_failure_emits_single_warning() {
        let store = Arc::new(MemoryStore::default());
        let model = Arc::new(ScriptedModel::new(vec![
            Ok(Fragment::Reasoning("Looking at pins".to_string())),
            Err(AnalysisError::StreamInterrupted("connection reset".to_string())),
        ]));
        let pipeline = pipeline(Arc::new(MemoryStorage::default()), model, store.clone());
        let mut thoughts = Vec::new();

        let outcome = pipeline
            .run(
                vec![jpeg("board.jpg")],
                &FixedSession(Some("user-1")),
                &mut |t| thoughts.push(t),
                &CancellationToken::new(),
            )
            .await;

        assert_eq!(outcome, PipelineOutcome::failed());
        let warnings: Vec<_> = thoughts
            .iter()
            .filter(|t| t.kind == ThoughtKind::Warning)
            .collect();
        assert_eq!(warnings.len(), 1);
        assert_eq!(thoughts.last().unwrap().kind, ThoughtKind::Warning);
        assert!(store.rows.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_only_first_file_is_processed() {
        let storage = Arc::new(MemoryStorage::default());
        let model = led_blinker_model();
        let pipeline = pipeline(storage.clone(), model.clone(), Arc::new(MemoryStore::default()));
        let second = MediaFile {
            name: "notes.txt".to_string(),
            content_type: "text/plain".to_string(),
            data: Bytes::from_static(b"ignored"),
        };

        let outcome = pipeline
            .run(
                vec![jpeg("board.jpg"), second],
                &FixedSession(Some("user-1")),
                &mut |_| {},
                &CancellationToken::new(),
            )
            .await;

        assert!(outcome.success);
        assert_eq!(storage.paths.lock().unwrap().len(), 1);
        let requests = model.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].mime_type, "image/jpeg");
    }

    #[tokio::test]
    async fn test_missing_skills_is_schema_mismatch() {
        let store = Arc::new(MemoryStore::default());
        let model = Arc::new(ScriptedModel::new(vec![Ok(Fragment::Answer(
            r#"{"title":"t","summary":"s","description":"d","technical_specs":{},"category":"c","recruiter_insight":"r"}"#
                .to_string(),
        ))]));
        let pipeline = pipeline(Arc::new(MemoryStorage::default()), model, store.clone());
        let mut thoughts = Vec::new();

        let outcome = pipeline
            .run(
                vec![jpeg("board.jpg")],
                &FixedSession(Some("user-1")),
                &mut |t| thoughts.push(t),
                &CancellationToken::new(),
            )
            .await;

        assert!(!outcome.success);
        assert_eq!(
            thoughts.last().unwrap().text,
            AnalysisError::SchemaMismatch(String::new()).user_message()
        );
        assert!(store.rows.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_storage_failure_stops_before_model() {
        let model = led_blinker_model();
        let storage = Arc::new(MemoryStorage {
            fail: true,
            ..Default::default()
        });
        let pipeline = pipeline(storage, model.clone(), Arc::new(MemoryStore::default()));

        let outcome = pipeline
            .run(
                vec![jpeg("board.jpg")],
                &FixedSession(Some("user-1")),
                &mut |_| {},
                &CancellationToken::new(),
            )
            .await;

        assert!(!outcome.success);
        assert!(model.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_expired_session_writes_nothing() {
        let store = Arc::new(MemoryStore::default());
        let pipeline = pipeline(
            Arc::new(MemoryStorage::default()),
            led_blinker_model(),
            store.clone(),
        );
        let mut thoughts = Vec::new();

        let outcome = pipeline
            .run(
                vec![jpeg("board.jpg")],
                &FixedSession(None),
                &mut |t| thoughts.push(t),
                &CancellationToken::new(),
            )
            .await;

        assert!(!outcome.success);
        assert_eq!(
            thoughts.last().unwrap().text,
            AnalysisError::Unauthenticated.user_message()
        );
        assert!(store.rows.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_run_touches_nothing() {
        let storage = Arc::new(MemoryStorage::default());
        let store = Arc::new(MemoryStore::default());
        let pipeline = pipeline(storage.clone(), led_blinker_model(), store.clone());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let outcome = pipeline
            .run(
                vec![jpeg("board.jpg")],
                &FixedSession(Some("user-1")),
                &mut |_| {},
                &cancel,
            )
            .await;

        assert!(!outcome.success);
        assert!(storage.paths.lock().unwrap().is_empty());
        assert!(store.rows.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_same_file_twice_gives_two_projects() {
        let store = Arc::new(MemoryStore::default());
        let pipeline = pipeline(
            Arc::new(MemoryStorage::default()),
            led_blinker_model(),
            store.clone(),
        );

        let session = FixedSession(Some("user-1"));
        let cancel = CancellationToken::new();
        let first = pipeline
            .run(vec![jpeg("board.jpg")], &session, &mut |_| {}, &cancel)
            .await;
        let second = pipeline
            .run(vec![jpeg("board.jpg")], &session, &mut |_| {}, &cancel)
            .await;

        assert!(first.success && second.success);
        assert_ne!(first.project_id, second.project_id);
        assert_eq!(store.rows.lock().unwrap().len(), 2);
    }
}
