use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use speedwatch_core::SourceFile;

/// Used when the extension is unknown; the core then rejects the file.
pub const FALLBACK_MEDIA_TYPE: &str = "application/octet-stream";

const VIDEO_EXTENSIONS: &[(&str, &str)] = &[
    ("mp4", "video/mp4"),
    ("m4v", "video/x-m4v"),
    ("avi", "video/x-msvideo"),
    ("mov", "video/quicktime"),
    ("mkv", "video/x-matroska"),
    ("webm", "video/webm"),
];

/// Media type for a file name, by extension (case-insensitive).
pub fn guess_media_type(path: &Path) -> &'static str {
    let Some(extension) = path.extension().and_then(|ext| ext.to_str()) else {
        return FALLBACK_MEDIA_TYPE;
    };
    VIDEO_EXTENSIONS
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(extension))
        .map(|(_, media_type)| *media_type)
        .unwrap_or(FALLBACK_MEDIA_TYPE)
}

/// Reads `path` into memory. `media_type` overrides the guess from the extension.
pub fn load_source_file(path: &Path, media_type: Option<&str>) -> Result<SourceFile> {
    let bytes = fs::read(path).with_context(|| format!("read {}", path.display()))?;
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .with_context(|| format!("{} has no file name", path.display()))?;
    let media_type = media_type
        .map(str::to_string)
        .unwrap_or_else(|| guess_media_type(path).to_string());
    Ok(SourceFile::new(name, media_type, bytes))
}
