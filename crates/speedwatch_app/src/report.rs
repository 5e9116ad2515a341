//! Plain-text rendering of backend data for the terminal.

use std::fmt::Write;

use speedwatch_client::{AnalyticsSnapshot, BlacklistEntry, MaxSpeed};
use speedwatch_core::{UploadViewModel, THRESHOLD_PRESETS};
use url::Url;

const UNKNOWN_PLATE: &str = "(unknown)";

pub fn render_analytics(snapshot: &AnalyticsSnapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Total vehicles:         {}", snapshot.total_vehicles);
    let _ = writeln!(out, "Speed violations:       {}", snapshot.speed_violations);
    let _ = writeln!(
        out,
        "Blacklisted detections: {}",
        snapshot.blacklisted_detections
    );
    out.push('\n');

    if snapshot.top_violators.is_empty() {
        out.push_str("No violators recorded.\n");
        return out;
    }

    let _ = writeln!(out, "{:<16} {:>12} {:>10}", "PLATE", "MAX SPEED", "VIOLATIONS");
    for violator in &snapshot.top_violators {
        let plate = if violator.license_plate.is_empty() {
            UNKNOWN_PLATE
        } else {
            violator.license_plate.as_str()
        };
        let _ = writeln!(
            out,
            "{:<16} {:>12} {:>10}",
            plate,
            speed_label(violator.max_speed),
            violator.violation_count
        );
    }
    if snapshot
        .top_violators
        .iter()
        .any(|violator| violator.max_speed.is_synthetic())
    {
        out.push_str("~ placeholder, the backend did not report a max speed\n");
    }
    out
}

fn speed_label(speed: MaxSpeed) -> String {
    match speed {
        MaxSpeed::Measured(kmh) => format!("{kmh:.1} km/h"),
        MaxSpeed::Synthetic(kmh) => format!("~{kmh:.1} km/h"),
    }
}

/// `shown` is the filtered subset of `total` entries.
pub fn render_blacklist(shown: &[&BlacklistEntry], total: usize) -> String {
    if total == 0 {
        return "No blacklisted plates.\n".to_string();
    }
    let mut out = String::new();
    let _ = writeln!(out, "Showing {} of {} blacklisted plates", shown.len(), total);
    for entry in shown {
        let _ = writeln!(
            out,
            "{:<16} {:<10} {}",
            entry.license_plate,
            entry.created_date_label(),
            entry.reason
        );
    }
    out
}

pub fn render_presets() -> String {
    THRESHOLD_PRESETS
        .iter()
        .map(|preset| format!("{:<12} {:>5} km/h\n", preset.label, preset.kmh))
        .collect()
}

pub fn render_upload_success(view: &UploadViewModel, result_url: Option<&Url>) -> String {
    let mut out = String::new();
    if let Some(name) = &view.file_name {
        let _ = writeln!(
            out,
            "Uploaded {} ({})",
            name,
            view.file_size_label.as_deref().unwrap_or("?")
        );
    }
    if let Some(reference) = &view.result_reference {
        let _ = writeln!(out, "Processed video: {reference}");
    }
    if let Some(url) = result_url {
        let _ = writeln!(out, "Download: {url}");
    }
    out
}
