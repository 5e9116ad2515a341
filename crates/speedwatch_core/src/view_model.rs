use crate::{ArtifactRef, JobStatus};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UploadViewModel {
    pub status: JobStatus,
    pub file_name: Option<String>,
    pub file_size_label: Option<String>,
    pub result_reference: Option<ArtifactRef>,
    pub error_message: Option<String>,
    pub can_submit: bool,
    pub dirty: bool,
}

/// Formats a byte count as mebibytes with two decimals, e.g. `"12.50 MB"`.
pub fn format_megabytes(bytes: u64) -> String {
    format!("{:.2} MB", bytes as f64 / (1024.0 * 1024.0))
}
