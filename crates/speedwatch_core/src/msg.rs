use crate::{ArtifactRef, JobId, SourceFile};

/// Where a candidate file came from. Both go through the same validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionOrigin {
    Picker,
    Drop,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User picked or dropped a file.
    FileChosen {
        file: SourceFile,
        origin: SelectionOrigin,
    },
    /// User asked to start processing the selected file.
    SubmitClicked,
    /// User asked to discard the current job (file, result and error).
    ResetClicked,
    /// The remote call issued for `job_id` resolved.
    ///
    /// `Err` carries the human-readable failure message.
    UploadFinished {
        job_id: JobId,
        result: Result<ArtifactRef, String>,
    },
}
