/// Default page size for pagination
pub const DEFAULT_PAGE_SIZE: i64 = 12;

/// Maximum page size allowed
pub const MAX_PAGE_SIZE: i64 = 100;

// =============================================================================
// PROJECT CONSTANTS
// =============================================================================

/// Storage folder (under the public prefix) holding uploaded project media
pub const PROJECT_MEDIA_FOLDER: &str = "project-media";

/// Proficiency shown for every skill verified by at least one public project
pub const DEFAULT_SKILL_PROFICIENCY: u8 = 85;

/// Fallbacks applied when the model leaves a card field empty
pub const FALLBACK_PROJECT_TITLE: &str = "New Project Analysis";
pub const FALLBACK_PROJECT_DESCRIPTION: &str = "AI Analyzed Project";
pub const FALLBACK_PROJECT_CATEGORY: &str = "Engineering";

// =============================================================================
// PUBLIC PROFILE FALLBACKS
// =============================================================================

pub const FALLBACK_FULL_NAME: &str = "Verified Student";
pub const FALLBACK_TITLE: &str = "Engineering Student";
pub const FALLBACK_LOCATION: &str = "Lagos, Nigeria";
pub const FALLBACK_BIO: &str =
    "Showcasing technical excellence through AI-verified projects and industrial training.";
pub const FALLBACK_INSIGHT: &str = "Analyzing technical competencies across projects...";
