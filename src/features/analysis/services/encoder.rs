use base64::prelude::*;

use crate::features::analysis::error::AnalysisError;
use crate::features::analysis::models::MediaFile;

/// Base64 body of the file, without any `data:` prefix.
///
/// Runs on the blocking pool since videos can be tens of megabytes.
pub async fn encode_media(file: &MediaFile) -> Result<String, AnalysisError> {
    if file.data.is_empty() {
        return Err(AnalysisError::Encoding(format!("'{}' is empty", file.name)));
    }

    let data = file.data.clone();
    tokio::task::spawn_blocking(move || BASE64_STANDARD.encode(&data))
        .await
        .map_err(|e| AnalysisError::Encoding(e.to_string()))
}
