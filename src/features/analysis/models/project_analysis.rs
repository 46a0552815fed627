use schemars::gen::SchemaGenerator;
use schemars::schema::{InstanceType, Schema, SchemaObject};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::shared::llm::LlmResponse;

/// Value of one technical spec entry, text or number
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SpecValue {
    Text(String),
    Number(serde_json::Number),
}

impl JsonSchema for SpecValue {
    fn schema_name() -> String {
        "SpecValue".to_string()
    }

    fn json_schema(_gen: &mut SchemaGenerator) -> Schema {
        SchemaObject {
            instance_type: Some(vec![InstanceType::String, InstanceType::Number].into()),
            ..Default::default()
        }
        .into()
    }
}

/// Structured report the model produces for one piece of project media
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ProjectAnalysis {
    /// Professional project title
    pub title: String,
    /// Case-study style summary of about 300 words
    pub summary: String,
    /// Short description for a portfolio card
    pub description: String,
    /// Technical skills demonstrated by the project
    pub skills: Vec<String>,
    /// Specification name to value
    pub technical_specs: BTreeMap<String, SpecValue>,
    /// Engineering area, e.g. Embedded Systems, IoT, Web Dev
    pub category: String,
    /// What the project tells a recruiter about the student
    pub recruiter_insight: String,
}

impl LlmResponse for ProjectAnalysis {
    fn identifying_keys() -> &'static [&'static str] {
        &[
            "title",
            "summary",
            "description",
            "skills",
            "technical_specs",
            "category",
            "recruiter_insight",
        ]
    }
}
