//! Prompt template management module.
//!
//! Templates live in `templates/prompts/` and use Jinja2 syntax.
//!
//! # Usage
//!
//! ```ignore
//! use crate::shared::prompts::render_analysis_prompts;
//!
//! let prompts = render_analysis_prompts(MediaKind::Image, &schema)?;
//! ```

pub mod engine;

pub use engine::{render_template, TemplateError};

use minijinja::Value;
use std::collections::HashMap;

/// System instruction plus the user text sent next to the media
#[derive(Debug, Clone)]
pub struct AnalysisPrompts {
    pub system: String,
    pub user: String,
}

/// Render the project analysis prompts.
///
/// # Arguments
/// * `media_kind` - "image" or "video", used in the wording
/// * `json_schema` - JSON schema string for the expected output
pub fn render_analysis_prompts(
    media_kind: &str,
    json_schema: &str,
) -> Result<AnalysisPrompts, TemplateError> {
    let mut ctx: HashMap<&str, Value> = HashMap::new();
    ctx.insert("media_kind", Value::from(media_kind));
    ctx.insert("json_schema", Value::from(json_schema));

    Ok(AnalysisPrompts {
        system: render_template("analysis/system.jinja", &ctx)?,
        user: render_template("analysis/user.jinja", &ctx)?,
    })
}
