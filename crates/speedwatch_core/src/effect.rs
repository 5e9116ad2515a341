use crate::{JobId, SelectionOrigin, SourceFile, ValidationError};

/// Side effects requested by [`crate::update`]; executed by the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Send the file to the processing endpoint. The result must come back as
    /// `Msg::UploadFinished` carrying the same `job_id`.
    UploadVideo { job_id: JobId, file: SourceFile },
    /// A candidate file was refused; the state was left untouched.
    SelectionRejected {
        origin: SelectionOrigin,
        error: ValidationError,
    },
}
