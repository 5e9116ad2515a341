//! Speedwatch client: HTTP transport, response normalisation and the
//! effect runner that drives the upload state machine.
mod client;
mod error;
mod normalize;
mod session;
mod transport;
mod types;

pub use client::{DashboardClient, UPLOAD_FAILED_MESSAGE};
pub use error::{ApiError, NetworkFailure, SelectionError};
pub use normalize::{
    filter_blacklist, normalize_analytics, normalize_analytics_with, normalize_blacklist,
    parse_timestamp, synthetic_max_speed, SYNTHETIC_SPEED_RANGE,
};
pub use session::UploadSession;
pub use transport::{ClientSettings, Method, RequestBody, ReqwestTransport, Transport};
pub use types::{
    AnalyticsSnapshot, BlacklistEntry, EmailConfig, LegacyStats, LegacyViolator, MaxSpeed,
    UploadReceipt, ViolatorRecord,
};
