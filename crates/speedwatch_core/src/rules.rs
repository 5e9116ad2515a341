//! Local preconditions checked before anything is sent to the backend.

use thiserror::Error;

use crate::SourceFile;

/// Media type prefix accepted for uploads.
pub const VIDEO_MEDIA_PREFIX: &str = "video/";

/// Reason recorded for a blacklist entry added without one.
pub const REASON_PLACEHOLDER: &str = "No reason provided";

/// Upper bound (inclusive) for the speed threshold, in km/h.
pub const MAX_THRESHOLD_KMH: f64 = 10_000.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdPreset {
    pub label: &'static str,
    pub kmh: f64,
}

pub const THRESHOLD_PRESETS: [ThresholdPreset; 5] = [
    ThresholdPreset {
        label: "School Zone",
        kmh: 30.0,
    },
    ThresholdPreset {
        label: "City Roads",
        kmh: 50.0,
    },
    ThresholdPreset {
        label: "Highway",
        kmh: 80.0,
    },
    ThresholdPreset {
        label: "Expressway",
        kmh: 120.0,
    },
    ThresholdPreset {
        label: "High Speed",
        kmh: 200.0,
    },
];

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("please select a valid video file (got media type {media_type:?})")]
    NotAVideo { media_type: String },
    #[error("speed threshold must be greater than 0 and at most 10000 km/h (got {value})")]
    ThresholdOutOfRange { value: f64 },
    #[error("{field} must not be empty")]
    EmptyField { field: &'static str },
}

/// Accepts only files whose declared media type is in the video category.
pub fn validate_video_file(file: &SourceFile) -> Result<(), ValidationError> {
    let media_type = file.media_type.trim();
    let is_video = media_type
        .get(..VIDEO_MEDIA_PREFIX.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(VIDEO_MEDIA_PREFIX));
    if is_video {
        Ok(())
    } else {
        Err(ValidationError::NotAVideo {
            media_type: file.media_type.clone(),
        })
    }
}

/// Threshold must lie in (0, 10000] km/h.
pub fn validate_threshold(value: f64) -> Result<f64, ValidationError> {
    if value.is_finite() && value > 0.0 && value <= MAX_THRESHOLD_KMH {
        Ok(value)
    } else {
        Err(ValidationError::ThresholdOutOfRange { value })
    }
}

/// Trims `value` and rejects it when nothing is left.
pub fn require_non_empty(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ValidationError::EmptyField { field })
    } else {
        Ok(trimmed.to_string())
    }
}

pub fn require_plate(plate: &str) -> Result<String, ValidationError> {
    require_non_empty("license plate", plate)
}

/// Blank reasons are replaced by [`REASON_PLACEHOLDER`].
pub fn normalize_reason(reason: &str) -> String {
    let trimmed = reason.trim();
    if trimmed.is_empty() {
        REASON_PLACEHOLDER.to_string()
    } else {
        trimmed.to_string()
    }
}
