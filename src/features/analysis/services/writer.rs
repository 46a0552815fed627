use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::core::error::AppError;
use crate::features::analysis::error::AnalysisError;
use crate::features::analysis::models::ProjectAnalysis;
use crate::features::projects::models::NewProject;
use crate::shared::constants::{
    FALLBACK_PROJECT_CATEGORY, FALLBACK_PROJECT_DESCRIPTION, FALLBACK_PROJECT_TITLE,
};

/// Who is running the analysis, asked at the moment of writing
#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn current_user_id(&self) -> Result<String, AnalysisError>;
}

/// Single-row project insert
#[async_trait]
pub trait ProjectStore: Send + Sync {
    async fn insert_project(&self, project: NewProject) -> Result<Uuid, AppError>;
}

/// Maps an analysis onto a project row and stores it
pub struct PersistenceWriter {
    store: Arc<dyn ProjectStore>,
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Build the row for an analysis. Blank title, description or category get
/// the portfolio defaults; blank skills are dropped.
pub fn project_from_analysis(
    analysis: ProjectAnalysis,
    thumbnail: String,
    is_video: bool,
    user_id: String,
) -> Result<NewProject, AnalysisError> {
    let technical_specs = serde_json::to_value(&analysis.technical_specs)
        .map_err(|e| AnalysisError::Persistence(e.to_string()))?;

    let skills = analysis
        .skills
        .into_iter()
        .filter_map(non_blank)
        .collect();

    Ok(NewProject {
        user_id,
        title: non_blank(analysis.title).unwrap_or_else(|| FALLBACK_PROJECT_TITLE.to_string()),
        description: non_blank(analysis.description)
            .unwrap_or_else(|| FALLBACK_PROJECT_DESCRIPTION.to_string()),
        summary: non_blank(analysis.summary),
        thumbnail,
        category: non_blank(analysis.category)
            .unwrap_or_else(|| FALLBACK_PROJECT_CATEGORY.to_string()),
        skills,
        is_video,
        technical_specs,
        recruiter_insight: non_blank(analysis.recruiter_insight),
    })
}

impl PersistenceWriter {
    pub fn new(store: Arc<dyn ProjectStore>) -> Self {
        Self { store }
    }

    pub async fn persist(
        &self,
        analysis: ProjectAnalysis,
        thumbnail: String,
        is_video: bool,
        session: &dyn SessionProvider,
    ) -> Result<Uuid, AnalysisError> {
        let user_id = session.current_user_id().await?;
        let project = project_from_analysis(analysis, thumbnail, is_video, user_id)?;

        self.store.insert_project(project).await.map_err(|e| {
            tracing::error!("Project insert failed: {}", e);
            AnalysisError::Persistence(e.to_string())
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::features::analysis::models::SpecValue;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    /// In-memory store recording every insert
    #[derive(Default)]
    pub(crate) struct MemoryStore {
        pub rows: Mutex<Vec<(Uuid, NewProject)>>,
        pub fail: bool,
    }

    #[async_trait]
    impl ProjectStore for MemoryStore {
        async fn insert_project(&self, project: NewProject) -> Result<Uuid, AppError> {
            if self.fail {
                return Err(AppError::Internal("connection refused".to_string()));
            }
            let id = Uuid::new_v4();
            self.rows.lock().unwrap().push((id, project));
            Ok(id)
        }
    }

    pub(crate) struct FixedSession(pub Option<&'static str>);

    #[async_trait]
    impl SessionProvider for FixedSession {
        async fn current_user_id(&self) -> Result<String, AnalysisError> {
            self.0
                .map(str::to_string)
                .ok_or(AnalysisError::Unauthenticated)
        }
    }

    fn analysis() -> ProjectAnalysis {
        let mut specs = BTreeMap::new();
        specs.insert("mcu".to_string(), SpecValue::Text("ESP32".to_string()));
        specs.insert("pins".to_string(), SpecValue::Number(12.into()));
        ProjectAnalysis {
            title: "Smart Irrigation".to_string(),
            summary: "A soil moisture controller".to_string(),
            description: "Waters plants".to_string(),
            skills: vec!["C++".to_string(), "  ".to_string(), " MQTT ".to_string()],
            technical_specs: specs,
            category: "IoT".to_string(),
            recruiter_insight: "Strong embedded fundamentals".to_string(),
        }
    }

    #[test]
    fn test_row_mapping() {
        let row = project_from_analysis(
            analysis(),
            "http://cdn/x.jpg".to_string(),
            false,
            "user-1".to_string(),
        )
        .unwrap();

        assert_eq!(row.user_id, "user-1");
        assert_eq!(row.skills, vec!["C++".to_string(), "MQTT".to_string()]);
        assert_eq!(
            row.technical_specs,
            serde_json::json!({"mcu": "ESP32", "pins": 12})
        );
        assert_eq!(row.thumbnail, "http://cdn/x.jpg");
        assert_eq!(row.summary.as_deref(), Some("A soil moisture controller"));
    }

    #[test]
    fn test_blank_fields_get_defaults() {
        let mut blank = analysis();
        blank.title = " ".to_string();
        blank.description = String::new();
        blank.category = String::new();
        blank.summary = String::new();

        let row = project_from_analysis(blank, "u".to_string(), true, "user-1".to_string()).unwrap();
        assert_eq!(row.title, FALLBACK_PROJECT_TITLE);
        assert_eq!(row.description, FALLBACK_PROJECT_DESCRIPTION);
        assert_eq!(row.category, FALLBACK_PROJECT_CATEGORY);
        assert_eq!(row.summary, None);
        assert!(row.is_video);
    }

    #[tokio::test]
    async fn test_no_session_writes_nothing() {
        let store = Arc::new(MemoryStore::default());
        let writer = PersistenceWriter::new(store.clone());

        let result = writer
            .persist(analysis(), "u".to_string(), false, &FixedSession(None))
            .await;

        assert!(matches!(result, Err(AnalysisError::Unauthenticated)));
        assert!(store.rows.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_is_persistence_error() {
        let store = Arc::new(MemoryStore {
            fail: true,
            ..Default::default()
        });
        let writer = PersistenceWriter::new(store);

        let result = writer
            .persist(analysis(), "u".to_string(), false, &FixedSession(Some("user-1")))
            .await;
        assert!(matches!(result, Err(AnalysisError::Persistence(_))));
    }
}
