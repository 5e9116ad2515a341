use crate::{validate_video_file, Effect, JobStatus, Msg, UploadState};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: UploadState, msg: Msg) -> (UploadState, Vec<Effect>) {
    let effects = match msg {
        Msg::FileChosen { file, origin } => {
            // The slot is busy until the in-flight call resolves or the user resets.
            if state.status() == JobStatus::Uploading {
                return (state, Vec::new());
            }
            match validate_video_file(&file) {
                Ok(()) => {
                    state.select_file(file);
                    Vec::new()
                }
                Err(error) => vec![Effect::SelectionRejected { origin, error }],
            }
        }
        Msg::SubmitClicked => match state.begin_upload() {
            Some((job_id, file)) => vec![Effect::UploadVideo { job_id, file }],
            None => Vec::new(),
        },
        Msg::ResetClicked => {
            state.reset();
            Vec::new()
        }
        Msg::UploadFinished { job_id, result } => {
            state.apply_finished(job_id, result);
            Vec::new()
        }
    };

    (state, effects)
}
