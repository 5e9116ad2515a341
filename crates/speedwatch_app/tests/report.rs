use pretty_assertions::assert_eq;
use speedwatch_app::report::{render_analytics, render_blacklist, render_presets, render_upload_success};
use speedwatch_client::{AnalyticsSnapshot, BlacklistEntry, MaxSpeed, ViolatorRecord};
use speedwatch_core::{ArtifactRef, JobStatus, UploadViewModel};
use url::Url;

#[test]
fn analytics_marks_placeholder_speeds() {
    let snapshot = AnalyticsSnapshot {
        total_vehicles: 12,
        speed_violations: 3,
        blacklisted_detections: 1,
        top_violators: vec![
            ViolatorRecord {
                license_plate: "KA01AB1234".to_string(),
                max_speed: MaxSpeed::Measured(91.0),
                violation_count: 2,
            },
            ViolatorRecord {
                license_plate: String::new(),
                max_speed: MaxSpeed::Synthetic(72.44),
                violation_count: 1,
            },
        ],
    };

    let text = render_analytics(&snapshot);
    assert!(text.contains("Total vehicles:         12"));
    assert!(text.contains("Blacklisted detections: 1"));
    assert!(text.contains("91.0 km/h"));
    assert!(text.contains("~72.4 km/h"));
    assert!(text.contains("(unknown)"));
    assert!(text.contains("~ placeholder"));
}

#[test]
fn analytics_without_violators() {
    let text = render_analytics(&AnalyticsSnapshot::default());
    assert!(text.contains("No violators recorded."));
    assert!(!text.contains("placeholder"));
}

#[test]
fn blacklist_shows_filtered_count() {
    let entries = [
        BlacklistEntry {
            license_plate: "KA01AB1234".to_string(),
            reason: "Stolen vehicle".to_string(),
            created_at: "2024-03-01T10:30:00Z".parse().ok(),
            created_at_raw: "2024-03-01T10:30:00Z".to_string(),
        },
        BlacklistEntry {
            license_plate: "MH12XY9999".to_string(),
            reason: "No reason provided".to_string(),
            created_at: None,
            created_at_raw: String::new(),
        },
    ];
    let shown = vec![&entries[0]];

    let text = render_blacklist(&shown, entries.len());
    assert!(text.starts_with("Showing 1 of 2 blacklisted plates\n"));
    assert!(text.contains("2024-03-01"));
    assert!(text.contains("Stolen vehicle"));
    assert!(!text.contains("MH12XY9999"));

    assert_eq!(render_blacklist(&[], 0), "No blacklisted plates.\n");
}

#[test]
fn presets_list_every_entry() {
    let text = render_presets();
    assert_eq!(text.lines().count(), 5);
    assert!(text.lines().next().unwrap().starts_with("School Zone"));
    assert!(text.contains("200 km/h"));
}

#[test]
fn upload_success_links_the_result() {
    let view = UploadViewModel {
        status: JobStatus::Completed,
        file_name: Some("clip.mp4".to_string()),
        file_size_label: Some("12.50 MB".to_string()),
        result_reference: Some(ArtifactRef::new("output_clip.mp4")),
        ..UploadViewModel::default()
    };
    let url = Url::parse("http://localhost:5000/results/output_clip.mp4").unwrap();

    assert_eq!(
        render_upload_success(&view, Some(&url)),
        "Uploaded clip.mp4 (12.50 MB)\n\
         Processed video: output_clip.mp4\n\
         Download: http://localhost:5000/results/output_clip.mp4\n"
    );
}
