use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Regex for file extensions accepted in storage object keys
    /// Lowercase alphanumeric, 1 to 8 characters
    /// - Valid: "jpg", "mp4", "webm", "heic"
    /// - Invalid: "", "tar.gz", "../x", "JPG", "extension-too-long"
    pub static ref EXTENSION_REGEX: Regex = Regex::new(r"^[a-z0-9]{1,8}$").unwrap();
}

/// Pick a safe extension for a storage key.
///
/// Uses the file name's extension when it is sane, otherwise the MIME subtype
/// (`video/mp4` -> `mp4`), otherwise `bin`.
pub fn storage_extension(file_name: &str, content_type: &str) -> String {
    let from_name = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| EXTENSION_REGEX.is_match(ext));

    if let Some(ext) = from_name {
        return ext;
    }

    content_type
        .split_once('/')
        .map(|(_, subtype)| subtype.split(';').next().unwrap_or("").trim().to_ascii_lowercase())
        .filter(|ext| EXTENSION_REGEX.is_match(ext))
        .unwrap_or_else(|| "bin".to_string())
}
