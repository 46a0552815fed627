mod profile_service;

pub use profile_service::{build_public_profile, build_skill_radar, ProfileService};
