use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Value};
use speedwatch_core::{
    normalize_reason, require_plate, validate_threshold, validate_video_file, ArtifactRef,
    SourceFile,
};
use speedwatch_logging::{watch_info, watch_warn};
use url::Url;

use crate::normalize::{normalize_analytics, normalize_blacklist};
use crate::{
    AnalyticsSnapshot, ApiError, BlacklistEntry, ClientSettings, EmailConfig, LegacyStats, Method,
    RequestBody, ReqwestTransport, Transport, UploadReceipt,
};

/// Message shown for a failed upload when the server gave no reason.
pub const UPLOAD_FAILED_MESSAGE: &str = "Upload failed";

const UPLOAD_PATH: &str = "upload";
const STATS_PATH: &str = "stats";
const BLACKLIST_PATH: &str = "blacklist";
const THRESHOLD_PATH: &str = "threshold";
const EMAIL_CONFIG_PATH: &str = "email-config";

#[derive(Serialize)]
#[serde(rename_all = "lowercase")]
enum BlacklistAction {
    Add,
    Remove,
}

#[derive(Serialize)]
struct BlacklistMutation<'a> {
    action: BlacklistAction,
    numberplate: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'a str>,
}

/// Typed operations against the detection backend.
///
/// Read paths return normalised values; mutators return `()` or the transport
/// error unchanged. Nothing is retried.
pub struct DashboardClient<T = ReqwestTransport> {
    transport: Arc<T>,
    results_path: String,
}

impl<T> Clone for DashboardClient<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            results_path: self.results_path.clone(),
        }
    }
}

impl DashboardClient<ReqwestTransport> {
    pub fn new(settings: &ClientSettings) -> Result<Self, ApiError> {
        let transport = ReqwestTransport::new(settings)?;
        Ok(Self::with_transport(transport, &settings.results_path))
    }
}

impl<T: Transport> DashboardClient<T> {
    pub fn with_transport(transport: T, results_path: &str) -> Self {
        Self {
            transport: Arc::new(transport),
            results_path: results_path.trim_matches('/').to_string(),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Sends the video and waits for the backend to finish processing it.
    pub async fn upload_video(&self, file: &SourceFile) -> Result<UploadReceipt, ApiError> {
        validate_video_file(file)?;
        watch_info!(
            "uploading {} ({} bytes, {})",
            file.name,
            file.size(),
            file.media_type
        );
        let raw = self
            .transport
            .request(
                Method::POST,
                UPLOAD_PATH,
                RequestBody::Multipart {
                    field: "file",
                    file: file.clone(),
                },
            )
            .await?;
        parse_upload_receipt(&raw)
    }

    /// Where the processed artifact can be fetched from.
    pub fn result_url(&self, reference: &ArtifactRef) -> Result<Url, ApiError> {
        let base = self.transport.base_url();
        let mut url = base.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::Setup(format!("base url cannot hold a path: {base}")))?
            .pop_if_empty()
            .extend(self.results_path.split('/').filter(|s| !s.is_empty()))
            .push(reference.as_str());
        Ok(url)
    }

    pub async fn fetch_analytics(&self) -> Result<AnalyticsSnapshot, ApiError> {
        let raw = self.get(STATS_PATH).await?;
        normalize_analytics(&raw)
    }

    /// The `/stats` payload as the legacy backend sends it.
    pub async fn fetch_legacy_stats(&self) -> Result<LegacyStats, ApiError> {
        let raw = self.get(STATS_PATH).await?;
        serde_json::from_value(raw).map_err(|err| ApiError::Parse(err.to_string()))
    }

    /// Lists blacklisted plates.
    ///
    /// Deployments without the endpoint are normal, so a failed call yields an
    /// empty list instead of an error. A malformed body is still an error.
    pub async fn fetch_blacklist(&self) -> Result<Vec<BlacklistEntry>, ApiError> {
        match self.get(BLACKLIST_PATH).await {
            Ok(raw) => normalize_blacklist(&raw),
            Err(err) if err.is_transport_failure() => {
                watch_warn!("blacklist endpoint not available, showing empty list: {err}");
                Ok(Vec::new())
            }
            Err(err) => Err(err),
        }
    }

    pub async fn add_entry(&self, plate: &str, reason: &str) -> Result<(), ApiError> {
        let plate = require_plate(plate)?;
        let reason = normalize_reason(reason);
        let body = BlacklistMutation {
            action: BlacklistAction::Add,
            numberplate: &plate,
            reason: Some(&reason),
        };
        self.post(BLACKLIST_PATH, to_json(&body)?).await?;
        watch_info!("added {plate} to blacklist");
        Ok(())
    }

    pub async fn remove_entry(&self, plate: &str) -> Result<(), ApiError> {
        let plate = require_plate(plate)?;
        let body = BlacklistMutation {
            action: BlacklistAction::Remove,
            numberplate: &plate,
            reason: None,
        };
        self.post(BLACKLIST_PATH, to_json(&body)?).await?;
        watch_info!("removed {plate} from blacklist");
        Ok(())
    }

    /// Sets the over-speed threshold in km/h; must be in (0, 10000].
    pub async fn set_threshold(&self, kmh: f64) -> Result<(), ApiError> {
        let kmh = validate_threshold(kmh)?;
        self.post(THRESHOLD_PATH, json!({ "threshold": threshold_value(kmh) }))
            .await?;
        watch_info!("speed threshold set to {kmh} km/h");
        Ok(())
    }

    pub async fn set_email_config(&self, config: &EmailConfig) -> Result<(), ApiError> {
        let config = config.validated()?;
        self.post(EMAIL_CONFIG_PATH, to_json(&config)?).await?;
        watch_info!("email alerts configured for {}", config.receiver_email);
        Ok(())
    }

    async fn get(&self, path: &str) -> Result<Value, ApiError> {
        self.transport
            .request(Method::GET, path, RequestBody::Empty)
            .await
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value, ApiError> {
        self.transport
            .request(Method::POST, path, RequestBody::Json(body))
            .await
    }
}

fn to_json<S: Serialize>(body: &S) -> Result<Value, ApiError> {
    serde_json::to_value(body).map_err(|err| ApiError::Parse(err.to_string()))
}

/// Whole thresholds go out as integers (`80`, not `80.0`).
fn threshold_value(kmh: f64) -> Value {
    if kmh.fract() == 0.0 {
        json!(kmh as u64)
    } else {
        json!(kmh)
    }
}

fn parse_upload_receipt(raw: &Value) -> Result<UploadReceipt, ApiError> {
    let object = raw
        .as_object()
        .ok_or_else(|| ApiError::Parse("upload response must be an object".to_string()))?;
    let result_video = object
        .get("result_video")
        .and_then(Value::as_str)
        .filter(|reference| !reference.trim().is_empty())
        .ok_or_else(|| ApiError::Parse("upload response has no result_video".to_string()))?;
    Ok(UploadReceipt {
        message: object
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        result_video: ArtifactRef::new(result_video),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_thresholds_serialise_as_integers() {
        assert_eq!(threshold_value(80.0), json!(80));
        assert_eq!(threshold_value(62.5), json!(62.5));
    }

    #[test]
    fn receipt_requires_result_video() {
        let receipt = parse_upload_receipt(&json!({
            "message": "Video processed successfully",
            "result_video": "output.mp4"
        }))
        .unwrap();
        assert_eq!(receipt.result_video, ArtifactRef::new("output.mp4"));
        assert_eq!(receipt.message, "Video processed successfully");

        assert!(matches!(
            parse_upload_receipt(&json!({"message": "ok"})),
            Err(ApiError::Parse(_))
        ));
        assert!(matches!(
            parse_upload_receipt(&json!("ok")),
            Err(ApiError::Parse(_))
        ));
    }
}
