use speedwatch_core::{
    update, Effect, JobStatus, Msg, SelectionOrigin, SourceFile, UploadState, UploadViewModel,
};
use speedwatch_logging::{watch_debug, watch_info, watch_warn};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use url::Url;

use crate::{DashboardClient, ReqwestTransport, SelectionError, Transport, UPLOAD_FAILED_MESSAGE};

/// Drives the upload state machine against a backend.
///
/// Messages go through [`speedwatch_core::update`]; upload effects run as
/// tasks spawned on the runtime behind `runtime` and report back through a
/// channel. Results are applied only when drained with
/// [`UploadSession::wait_for_outcome`] or [`UploadSession::settle`].
pub struct UploadSession<T = ReqwestTransport> {
    client: DashboardClient<T>,
    runtime: Handle,
    state: UploadState,
    msg_tx: mpsc::UnboundedSender<Msg>,
    msg_rx: mpsc::UnboundedReceiver<Msg>,
    in_flight: usize,
}

impl<T: Transport + 'static> UploadSession<T> {
    /// Uploads are spawned on `runtime`, so [`UploadSession::submit`] works
    /// from any thread. Results are only applied while an async method of the
    /// session is awaited.
    pub fn new(client: DashboardClient<T>, runtime: Handle) -> Self {
        let (msg_tx, msg_rx) = mpsc::unbounded_channel();
        Self {
            client,
            runtime,
            state: UploadState::new(),
            msg_tx,
            msg_rx,
            in_flight: 0,
        }
    }

    pub fn state(&self) -> &UploadState {
        &self.state
    }

    pub fn status(&self) -> JobStatus {
        self.state.status()
    }

    pub fn view(&self) -> UploadViewModel {
        self.state.view()
    }

    /// Number of upload requests still awaiting a response.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Offers a file to the job slot. On error the state is unchanged:
    /// either the file failed validation or an upload holds the slot.
    pub fn select_file(
        &mut self,
        file: SourceFile,
        origin: SelectionOrigin,
    ) -> Result<(), SelectionError> {
        if self.status() == JobStatus::Uploading {
            watch_info!("ignoring {origin:?} selection of {} during upload", file.name);
            return Err(SelectionError::Busy);
        }
        let effects = self.dispatch(Msg::FileChosen { file, origin });
        effects
            .into_iter()
            .find_map(|effect| match effect {
                Effect::SelectionRejected { error, .. } => Some(SelectionError::Rejected(error)),
                _ => None,
            })
            .map_or(Ok(()), Err)
    }

    /// Starts the upload. Returns false (and does nothing) unless a file is
    /// selected and no upload is running.
    pub fn submit(&mut self) -> bool {
        let effects = self.dispatch(Msg::SubmitClicked);
        !effects.is_empty()
    }

    /// Clears the slot. A request already sent keeps running; its result is
    /// dropped when it arrives.
    pub fn reset(&mut self) {
        self.dispatch(Msg::ResetClicked);
    }

    /// Submits and waits for the terminal state.
    pub async fn submit_and_wait(&mut self) -> JobStatus {
        if self.submit() {
            self.wait_for_outcome().await
        } else {
            self.status()
        }
    }

    /// Applies incoming results until the current job leaves `Uploading`.
    pub async fn wait_for_outcome(&mut self) -> JobStatus {
        while self.status() == JobStatus::Uploading {
            if !self.apply_next().await {
                break;
            }
        }
        self.status()
    }

    /// Waits for every request still in flight and applies (or discards) its result.
    pub async fn settle(&mut self) {
        while self.in_flight > 0 {
            if !self.apply_next().await {
                break;
            }
        }
    }

    /// URL of the processed video once the job completed.
    pub fn result_url(&self) -> Option<Url> {
        let reference = self.state.job().result_reference()?;
        match self.client.result_url(reference) {
            Ok(url) => Some(url),
            Err(err) => {
                watch_warn!("cannot build result url for {reference}: {err}");
                None
            }
        }
    }

    async fn apply_next(&mut self) -> bool {
        let Some(msg) = self.msg_rx.recv().await else {
            return false;
        };
        if let Msg::UploadFinished { job_id, .. } = &msg {
            self.in_flight = self.in_flight.saturating_sub(1);
            let current = self.state.job();
            if current.status() != JobStatus::Uploading || current.job_id() != Some(*job_id) {
                watch_debug!("discarding stale result for job {job_id}");
            }
        }
        self.dispatch(msg);
        true
    }

    fn dispatch(&mut self, msg: Msg) -> Vec<Effect> {
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        for effect in &effects {
            self.run_effect(effect);
        }
        effects
    }

    fn run_effect(&mut self, effect: &Effect) {
        match effect {
            Effect::UploadVideo { job_id, file } => {
                let job_id = *job_id;
                let file = file.clone();
                let client = self.client.clone();
                let msg_tx = self.msg_tx.clone();
                self.in_flight += 1;
                self.runtime.spawn(async move {
                    let result = match client.upload_video(&file).await {
                        Ok(receipt) => {
                            watch_info!("job {job_id} finished: {}", receipt.result_video);
                            Ok(receipt.result_video)
                        }
                        Err(err) => {
                            watch_warn!("job {job_id} failed: {err}");
                            Err(err.user_message(UPLOAD_FAILED_MESSAGE))
                        }
                    };
                    let _ = msg_tx.send(Msg::UploadFinished { job_id, result });
                });
            }
            Effect::SelectionRejected { origin, error } => {
                watch_info!("rejected {origin:?} selection: {error}");
            }
        }
    }
}
