use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use speedwatch_core::{require_non_empty, ArtifactRef, ValidationError};

use crate::normalize::{as_count, as_number};

/// Highest speed recorded for a violator, in km/h.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MaxSpeed {
    /// Reported by the backend.
    Measured(f64),
    /// Placeholder generated locally because the backend omitted the field.
    /// See [`crate::synthetic_max_speed`].
    Synthetic(f64),
}

impl MaxSpeed {
    pub fn kmh(self) -> f64 {
        match self {
            MaxSpeed::Measured(kmh) | MaxSpeed::Synthetic(kmh) => kmh,
        }
    }

    pub fn is_synthetic(self) -> bool {
        matches!(self, MaxSpeed::Synthetic(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViolatorRecord {
    /// Empty only when the backend sent neither plate field.
    pub license_plate: String,
    pub max_speed: MaxSpeed,
    pub violation_count: u32,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnalyticsSnapshot {
    pub total_vehicles: u64,
    pub speed_violations: u64,
    pub blacklisted_detections: u64,
    /// Backend order, not re-sorted.
    pub top_violators: Vec<ViolatorRecord>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlacklistEntry {
    pub license_plate: String,
    pub reason: String,
    /// Parsed addition time, when the backend sent something recognisable.
    pub created_at: Option<DateTime<Utc>>,
    /// The timestamp text as received (empty if absent).
    pub created_at_raw: String,
}

impl BlacklistEntry {
    /// Date shown next to the entry: `YYYY-MM-DD`, or the raw text if unparsed.
    pub fn created_date_label(&self) -> String {
        match self.created_at {
            Some(at) => at.format("%Y-%m-%d").to_string(),
            None => self.created_at_raw.clone(),
        }
    }
}

/// Successful `/upload` response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub message: String,
    pub result_video: ArtifactRef,
}

/// Raw legacy `/stats` payload, kept for callers that want the unnormalised
/// numbers (it is the only place `average_speed` is exposed).
///
/// Numbers may arrive as JSON strings (SQL decimals) and any field may be
/// null; both read the same way the normaliser reads them.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LegacyStats {
    #[serde(deserialize_with = "lenient_count")]
    pub total_vehicles: u64,
    #[serde(deserialize_with = "lenient_number")]
    pub average_speed: f64,
    #[serde(deserialize_with = "lenient_count")]
    pub overspeeding: u64,
    #[serde(deserialize_with = "lenient_count")]
    pub blacklisted: u64,
    #[serde(deserialize_with = "lenient_list")]
    pub top_violators: Vec<LegacyViolator>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LegacyViolator {
    #[serde(deserialize_with = "lenient_text")]
    pub numberplate: String,
    #[serde(deserialize_with = "lenient_count")]
    pub violation_count: u64,
}

fn lenient_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(as_number(&value).unwrap_or_default())
}

fn lenient_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(as_count(&value).unwrap_or_default())
}

fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(text) => Ok(text),
        _ => Ok(String::new()),
    }
}

fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Alert mail settings pushed to `/email-config`.
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EmailConfig {
    pub sender_email: String,
    pub sender_password: String,
    pub receiver_email: String,
}

impl EmailConfig {
    /// Trims every field and rejects the config if any is empty.
    pub fn validated(&self) -> Result<Self, ValidationError> {
        Ok(Self {
            sender_email: require_non_empty("sender email", &self.sender_email)?,
            sender_password: require_non_empty("sender password", &self.sender_password)?,
            receiver_email: require_non_empty("receiver email", &self.receiver_email)?,
        })
    }
}

impl fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmailConfig")
            .field("sender_email", &self.sender_email)
            .field("sender_password", &"<redacted>")
            .field("receiver_email", &self.receiver_email)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_config_requires_every_field() {
        let config = EmailConfig {
            sender_email: " alerts@example.com ".to_string(),
            sender_password: "app-password".to_string(),
            receiver_email: String::new(),
        };
        assert_eq!(
            config.validated(),
            Err(ValidationError::EmptyField {
                field: "receiver email"
            })
        );
    }

    #[test]
    fn email_config_debug_hides_password() {
        let config = EmailConfig {
            sender_email: "a@example.com".to_string(),
            sender_password: "hunter2".to_string(),
            receiver_email: "b@example.com".to_string(),
        };
        let printed = format!("{config:?}");
        assert!(!printed.contains("hunter2"));
        assert!(printed.contains("a@example.com"));
    }

    #[test]
    fn legacy_stats_tolerate_missing_fields() {
        let stats: LegacyStats =
            serde_json::from_value(serde_json::json!({"total_vehicles": 4})).unwrap();
        assert_eq!(stats.total_vehicles, 4);
        assert_eq!(stats.average_speed, 0.0);
        assert!(stats.top_violators.is_empty());
    }

    #[test]
    fn legacy_stats_accept_decimal_strings_and_nulls() {
        let stats: LegacyStats = serde_json::from_value(serde_json::json!({
            "total_vehicles": 42,
            "average_speed": "63.25",
            "overspeeding": "7",
            "blacklisted": null,
            "top_violators": [
                {"numberplate": null, "violation_count": "3"},
                {"numberplate": "KA01AB1234", "violation_count": 2}
            ]
        }))
        .unwrap();
        assert_eq!(stats.total_vehicles, 42);
        assert_eq!(stats.average_speed, 63.25);
        assert_eq!(stats.overspeeding, 7);
        assert_eq!(stats.blacklisted, 0);
        assert_eq!(
            stats.top_violators,
            vec![
                LegacyViolator {
                    numberplate: String::new(),
                    violation_count: 3,
                },
                LegacyViolator {
                    numberplate: "KA01AB1234".to_string(),
                    violation_count: 2,
                },
            ]
        );

        let stats: LegacyStats =
            serde_json::from_value(serde_json::json!({"top_violators": null})).unwrap();
        assert!(stats.top_violators.is_empty());
    }
}
