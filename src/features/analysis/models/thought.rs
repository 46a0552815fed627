use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ThoughtKind {
    Info,
    Process,
    Success,
    Warning,
}

/// One line of progress shown in the analysis terminal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Thought {
    pub text: String,
    #[serde(rename = "type")]
    pub kind: ThoughtKind,
}

impl Thought {
    pub fn info(text: impl Into<String>) -> Self {
        Self::new(text, ThoughtKind::Info)
    }

    pub fn process(text: impl Into<String>) -> Self {
        Self::new(text, ThoughtKind::Process)
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self::new(text, ThoughtKind::Success)
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self::new(text, ThoughtKind::Warning)
    }

    fn new(text: impl Into<String>, kind: ThoughtKind) -> Self {
        Self {
            text: text.into(),
            kind,
        }
    }
}
