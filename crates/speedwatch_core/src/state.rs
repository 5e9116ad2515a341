use std::fmt;
use std::sync::Arc;

use crate::view_model::{format_megabytes, UploadViewModel};

/// Monotonic tag assigned to each submission. Used to drop late results.
pub type JobId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobStatus {
    #[default]
    Idle,
    Selected,
    Uploading,
    Completed,
    Failed,
}

/// A user-supplied file: payload, name and declared media type.
#[derive(Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub name: String,
    pub media_type: String,
    pub bytes: Arc<[u8]>,
}

impl SourceFile {
    pub fn new(
        name: impl Into<String>,
        media_type: impl Into<String>,
        bytes: impl Into<Arc<[u8]>>,
    ) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            bytes: bytes.into(),
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

// Payloads are large; keep them out of debug output.
impl fmt::Debug for SourceFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceFile")
            .field("name", &self.name)
            .field("media_type", &self.media_type)
            .field("size", &self.size())
            .finish()
    }
}

/// Opaque reference to a processed artifact returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactRef(String);

impl ArtifactRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArtifactRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One submitted video and where it is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProcessingJob {
    job_id: Option<JobId>,
    status: JobStatus,
    source_file: Option<SourceFile>,
    result_reference: Option<ArtifactRef>,
    error_message: Option<String>,
}

impl ProcessingJob {
    /// Id of the last submission, `None` until the first submit after a reset.
    pub fn job_id(&self) -> Option<JobId> {
        self.job_id
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn source_file(&self) -> Option<&SourceFile> {
        self.source_file.as_ref()
    }

    pub fn result_reference(&self) -> Option<&ArtifactRef> {
        self.result_reference.as_ref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }
}

/// Single owned container for the upload workflow.
///
/// Mutated only through [`crate::update`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UploadState {
    job: ProcessingJob,
    last_job_id: JobId,
    dirty: bool,
}

impl UploadState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn job(&self) -> &ProcessingJob {
        &self.job
    }

    pub fn status(&self) -> JobStatus {
        self.job.status
    }

    pub fn view(&self) -> UploadViewModel {
        let file = self.job.source_file.as_ref();
        UploadViewModel {
            status: self.job.status,
            file_name: file.map(|f| f.name.clone()),
            file_size_label: file.map(|f| format_megabytes(f.size())),
            result_reference: self.job.result_reference.clone(),
            error_message: self.job.error_message.clone(),
            can_submit: self.job.status == JobStatus::Selected,
            dirty: self.dirty,
        }
    }

    /// Returns whether anything changed since the last call and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Replaces any previous file, result and error with a freshly selected file.
    pub(crate) fn select_file(&mut self, file: SourceFile) {
        self.job = ProcessingJob {
            job_id: None,
            status: JobStatus::Selected,
            source_file: Some(file),
            result_reference: None,
            error_message: None,
        };
        self.dirty = true;
    }

    /// Selected -> Uploading. Returns the new job id and the file to send.
    pub(crate) fn begin_upload(&mut self) -> Option<(JobId, SourceFile)> {
        if self.job.status != JobStatus::Selected {
            return None;
        }
        let file = self.job.source_file.clone()?;
        self.last_job_id += 1;
        let job_id = self.last_job_id;
        self.job.job_id = Some(job_id);
        self.job.status = JobStatus::Uploading;
        self.job.error_message = None;
        self.dirty = true;
        Some((job_id, file))
    }

    /// Applies the outcome of `job_id`. Returns false if the result is stale.
    pub(crate) fn apply_finished(
        &mut self,
        job_id: JobId,
        result: Result<ArtifactRef, String>,
    ) -> bool {
        if self.job.status != JobStatus::Uploading || self.job.job_id != Some(job_id) {
            return false;
        }
        match result {
            Ok(reference) => {
                self.job.status = JobStatus::Completed;
                self.job.result_reference = Some(reference);
            }
            Err(message) => {
                self.job.status = JobStatus::Failed;
                self.job.error_message = Some(message);
            }
        }
        self.dirty = true;
        true
    }

    /// Back to Idle from any state. The id counter keeps running so results of
    /// calls still in flight cannot match a later job.
    pub(crate) fn reset(&mut self) {
        if self.job != ProcessingJob::default() {
            self.dirty = true;
        }
        self.job = ProcessingJob::default();
    }
}
