//! Speedwatch core: pure upload state machine, view-model helpers and local
//! validation rules.
mod effect;
mod msg;
mod rules;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use msg::{Msg, SelectionOrigin};
pub use rules::{
    normalize_reason, require_non_empty, require_plate, validate_threshold, validate_video_file,
    ThresholdPreset, ValidationError, MAX_THRESHOLD_KMH, REASON_PLACEHOLDER, THRESHOLD_PRESETS,
    VIDEO_MEDIA_PREFIX,
};
pub use state::{ArtifactRef, JobId, JobStatus, ProcessingJob, SourceFile, UploadState};
pub use update::update;
pub use view_model::{format_megabytes, UploadViewModel};
