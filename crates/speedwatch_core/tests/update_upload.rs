use std::sync::Once;

use pretty_assertions::assert_eq;
use speedwatch_core::{
    update, ArtifactRef, Effect, JobStatus, Msg, SelectionOrigin, SourceFile, UploadState,
    ValidationError,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(speedwatch_logging::initialize_for_tests);
}

fn video(name: &str) -> SourceFile {
    SourceFile::new(name, "video/mp4", vec![0u8; 2048])
}

fn choose(state: UploadState, file: SourceFile) -> (UploadState, Vec<Effect>) {
    update(
        state,
        Msg::FileChosen {
            file,
            origin: SelectionOrigin::Picker,
        },
    )
}

fn submitted_job(effects: &[Effect]) -> u64 {
    effects
        .iter()
        .find_map(|effect| match effect {
            Effect::UploadVideo { job_id, .. } => Some(*job_id),
            _ => None,
        })
        .expect("upload effect")
}

#[test]
fn selecting_a_video_moves_idle_to_selected() {
    init_logging();
    let (mut state, effects) = choose(UploadState::new(), video("clip.mp4"));

    assert!(effects.is_empty());
    let view = state.view();
    assert_eq!(view.status, JobStatus::Selected);
    assert_eq!(view.file_name.as_deref(), Some("clip.mp4"));
    assert_eq!(view.file_size_label.as_deref(), Some("0.00 MB"));
    assert!(view.can_submit);
    assert!(state.consume_dirty());
}

#[test]
fn non_video_is_rejected_without_state_change() {
    init_logging();
    let (state, _) = choose(UploadState::new(), video("first.mp4"));
    let before = state.clone();

    let (next, effects) = update(
        state,
        Msg::FileChosen {
            file: SourceFile::new("notes.txt", "text/plain", b"hi".to_vec()),
            origin: SelectionOrigin::Drop,
        },
    );

    assert_eq!(next, before);
    assert_eq!(
        effects,
        vec![Effect::SelectionRejected {
            origin: SelectionOrigin::Drop,
            error: ValidationError::NotAVideo {
                media_type: "text/plain".to_string()
            },
        }]
    );
}

#[test]
fn submit_walks_selected_uploading_completed() {
    init_logging();
    let (state, _) = choose(UploadState::new(), video("clip.mp4"));
    let (state, effects) = update(state, Msg::SubmitClicked);

    assert_eq!(state.status(), JobStatus::Uploading);
    assert!(!state.view().can_submit);
    assert_eq!(effects.len(), 1);
    let job_id = submitted_job(&effects);
    match &effects[0] {
        Effect::UploadVideo { file, .. } => assert_eq!(file.name, "clip.mp4"),
        other => panic!("unexpected effect {other:?}"),
    }

    let (state, effects) = update(
        state,
        Msg::UploadFinished {
            job_id,
            result: Ok(ArtifactRef::new("output.mp4")),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.status(), JobStatus::Completed);
    assert_eq!(
        state.job().result_reference(),
        Some(&ArtifactRef::new("output.mp4"))
    );
    assert_eq!(state.job().error_message(), None);
}

#[test]
fn failed_upload_keeps_message() {
    init_logging();
    let (state, _) = choose(UploadState::new(), video("clip.mp4"));
    let (state, effects) = update(state, Msg::SubmitClicked);
    let job_id = submitted_job(&effects);

    let (state, _) = update(
        state,
        Msg::UploadFinished {
            job_id,
            result: Err("Video processing failed".to_string()),
        },
    );

    assert_eq!(state.status(), JobStatus::Failed);
    assert_eq!(state.job().error_message(), Some("Video processing failed"));
    assert_eq!(state.job().result_reference(), None);
}

#[test]
fn submit_outside_selected_is_noop() {
    init_logging();
    let idle = UploadState::new();
    let (next, effects) = update(idle.clone(), Msg::SubmitClicked);
    assert_eq!(next, idle);
    assert!(effects.is_empty());

    let (state, _) = choose(UploadState::new(), video("clip.mp4"));
    let (uploading, _) = update(state, Msg::SubmitClicked);
    let (next, effects) = update(uploading.clone(), Msg::SubmitClicked);
    assert_eq!(next, uploading);
    assert!(effects.is_empty());
}

#[test]
fn choosing_a_file_while_uploading_is_ignored() {
    init_logging();
    let (state, _) = choose(UploadState::new(), video("clip.mp4"));
    let (uploading, _) = update(state, Msg::SubmitClicked);

    let (next, effects) = choose(uploading.clone(), video("other.mp4"));
    assert_eq!(next, uploading);
    assert!(effects.is_empty());
}

#[test]
fn resubmitting_after_failure_needs_a_new_selection() {
    init_logging();
    let (state, _) = choose(UploadState::new(), video("clip.mp4"));
    let (state, effects) = update(state, Msg::SubmitClicked);
    let first = submitted_job(&effects);
    let (state, _) = update(
        state,
        Msg::UploadFinished {
            job_id: first,
            result: Err("Upload failed".to_string()),
        },
    );

    let (state, effects) = update(state, Msg::SubmitClicked);
    assert!(effects.is_empty());
    assert_eq!(state.status(), JobStatus::Failed);

    let (state, _) = choose(state, video("clip.mp4"));
    assert_eq!(state.job().error_message(), None);
    let (_, effects) = update(state, Msg::SubmitClicked);
    assert!(submitted_job(&effects) > first);
}
