use axum::body::Bytes;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// `video/*` is a video, anything else is treated as an image
    pub fn from_mime(content_type: &str) -> Self {
        if content_type.starts_with("video/") {
            MediaKind::Video
        } else {
            MediaKind::Image
        }
    }

    /// Only image and video parts are accepted for analysis
    pub fn is_supported_mime(content_type: &str) -> bool {
        content_type.starts_with("image/") || content_type.starts_with("video/")
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    Uploading,
    Analyzing,
    Complete,
}

/// Raw media received in a request
#[derive(Debug, Clone)]
pub struct MediaFile {
    pub name: String,
    pub content_type: String,
    pub data: Bytes,
}

impl MediaFile {
    pub fn kind(&self) -> MediaKind {
        MediaKind::from_mime(&self.content_type)
    }

    pub fn is_video(&self) -> bool {
        self.kind() == MediaKind::Video
    }
}

/// Client-facing record of one received file
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UploadedFile {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: MediaKind,
    /// Human readable size, e.g. "2.50 MB"
    pub size: String,
    pub status: UploadStatus,
}

impl UploadedFile {
    pub fn from_media(file: &MediaFile) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: file.name.clone(),
            kind: file.kind(),
            size: human_size(file.data.len()),
            status: UploadStatus::Uploading,
        }
    }

    /// Move the status forward. Going back is ignored.
    pub fn advance(&mut self, status: UploadStatus) {
        if status > self.status {
            self.status = status;
        }
    }
}

pub fn human_size(bytes: usize) -> String {
    format!("{:.2} MB", bytes as f64 / 1024.0 / 1024.0)
}
