//! Maps loosely shaped backend payloads onto the stable read models.
//!
//! Two `/stats` schemas are in the wild: the legacy one (`overspeeding`,
//! `blacklisted`, violators keyed by `numberplate`) and the newer analytics one
//! (`speed_violations`, `blacklisted_detections`, `license_plate`). Legacy names
//! win when both are present. Missing numbers become 0, never an error; only a
//! payload of the wrong overall shape is rejected.

use std::ops::Range;

use chrono::{DateTime, NaiveDateTime, Utc};
use rand::Rng;
use serde_json::{Map, Value};
use speedwatch_core::normalize_reason;
use speedwatch_logging::watch_warn;

use crate::{AnalyticsSnapshot, ApiError, BlacklistEntry, MaxSpeed, ViolatorRecord};

/// Range of the synthetic `max_speed` fallback, in km/h.
pub const SYNTHETIC_SPEED_RANGE: Range<f64> = 50.0..100.0;

/// Placeholder speed for a violator the backend reported without `max_speed`.
///
/// This is display filler for incomplete backends, drawn uniformly from
/// [`SYNTHETIC_SPEED_RANGE`]. It is not an estimate of anything and is always
/// tagged [`MaxSpeed::Synthetic`]. It should go away once the backend reports
/// the field for every violator.
pub fn synthetic_max_speed<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    rng.gen_range(SYNTHETIC_SPEED_RANGE)
}

/// Normalises a `/stats` payload using the thread RNG for synthetic speeds.
pub fn normalize_analytics(raw: &Value) -> Result<AnalyticsSnapshot, ApiError> {
    normalize_analytics_with(raw, &mut rand::thread_rng())
}

pub fn normalize_analytics_with<R: Rng + ?Sized>(
    raw: &Value,
    rng: &mut R,
) -> Result<AnalyticsSnapshot, ApiError> {
    let object = raw.as_object().ok_or_else(|| {
        ApiError::Parse(format!(
            "analytics payload must be an object, got {}",
            kind_of(raw)
        ))
    })?;

    let top_violators = match object.get("top_violators") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(entries)) => entries
            .iter()
            .enumerate()
            .map(|(index, entry)| normalize_violator(index, entry, rng))
            .collect::<Result<Vec<_>, _>>()?,
        Some(other) => {
            watch_warn!(
                "ignoring top_violators of type {}; expected an array",
                kind_of(other)
            );
            Vec::new()
        }
    };

    Ok(AnalyticsSnapshot {
        total_vehicles: count_field(object, &["total_vehicles"]),
        speed_violations: count_field(object, &["overspeeding", "speed_violations"]),
        blacklisted_detections: count_field(object, &["blacklisted", "blacklisted_detections"]),
        top_violators,
    })
}

fn normalize_violator<R: Rng + ?Sized>(
    index: usize,
    entry: &Value,
    rng: &mut R,
) -> Result<ViolatorRecord, ApiError> {
    let object = entry.as_object().ok_or_else(|| {
        ApiError::Parse(format!(
            "top_violators[{index}] must be an object, got {}",
            kind_of(entry)
        ))
    })?;

    let max_speed = match object.get("max_speed").and_then(as_number) {
        Some(kmh) if kmh >= 0.0 => MaxSpeed::Measured(kmh),
        _ => MaxSpeed::Synthetic(synthetic_max_speed(rng)),
    };
    let violation_count = object
        .get("violation_count")
        .and_then(as_count)
        .filter(|count| *count > 0)
        .map(|count| u32::try_from(count).unwrap_or(u32::MAX))
        .unwrap_or(1);

    Ok(ViolatorRecord {
        license_plate: text_field(object, &["numberplate", "license_plate"]),
        max_speed,
        violation_count,
    })
}

/// Normalises a `/blacklist` listing. `null` is read as an empty list.
pub fn normalize_blacklist(raw: &Value) -> Result<Vec<BlacklistEntry>, ApiError> {
    let entries = match raw {
        Value::Null => return Ok(Vec::new()),
        Value::Array(entries) => entries,
        other => {
            return Err(ApiError::Parse(format!(
                "blacklist payload must be an array, got {}",
                kind_of(other)
            )))
        }
    };

    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let object = entry.as_object().ok_or_else(|| {
                ApiError::Parse(format!(
                    "blacklist[{index}] must be an object, got {}",
                    kind_of(entry)
                ))
            })?;
            let (created_at, created_at_raw) = match object.get("created_at") {
                Some(Value::String(text)) => (parse_timestamp(text), text.clone()),
                Some(Value::Number(secs)) => (
                    secs.as_i64()
                        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0)),
                    secs.to_string(),
                ),
                _ => (None, String::new()),
            };
            Ok(BlacklistEntry {
                license_plate: text_field(object, &["license_plate", "numberplate"]),
                reason: normalize_reason(
                    object.get("reason").and_then(Value::as_str).unwrap_or(""),
                ),
                created_at,
                created_at_raw,
            })
        })
        .collect()
}

/// Accepts RFC 3339, RFC 2822 (what Flask emits for datetimes) and bare
/// `YYYY-MM-DD HH:MM:SS` (read as UTC).
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(text) {
        return Some(at.with_timezone(&Utc));
    }
    if let Ok(at) = DateTime::parse_from_rfc2822(text) {
        return Some(at.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(|naive| naive.and_utc())
}

/// Entries whose plate or reason contains `term`, ignoring case.
pub fn filter_blacklist<'a>(entries: &'a [BlacklistEntry], term: &str) -> Vec<&'a BlacklistEntry> {
    let needle = term.trim().to_lowercase();
    entries
        .iter()
        .filter(|entry| {
            needle.is_empty()
                || entry.license_plate.to_lowercase().contains(&needle)
                || entry.reason.to_lowercase().contains(&needle)
        })
        .collect()
}

fn count_field(object: &Map<String, Value>, names: &[&str]) -> u64 {
    names
        .iter()
        .find_map(|name| object.get(*name).and_then(as_count))
        .unwrap_or(0)
}

fn text_field(object: &Map<String, Value>, names: &[&str]) -> String {
    names
        .iter()
        .filter_map(|name| object.get(*name).and_then(Value::as_str))
        .find(|text| !text.is_empty())
        .unwrap_or_default()
        .to_string()
}

/// Numbers, or strings holding a number (some drivers serialise decimals as text).
pub(crate) fn as_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}

/// Non-negative whole numbers only.
pub(crate) fn as_count(value: &Value) -> Option<u64> {
    if let Some(count) = value.as_u64() {
        return Some(count);
    }
    as_number(value)
        .filter(|number| *number >= 0.0 && number.fract() == 0.0)
        .map(|number| number as u64)
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
