use crate::{AppState, Effect, Msg};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::FileSelected { kind, file } => {
            state.select_file(kind, file);
            Vec::new()
        }
        Msg::UploadClicked(kind) => match state.begin_upload(kind) {
            Ok(effect) => vec![effect],
            Err(err) => {
                state.record_error(err);
                Vec::new()
            }
        },
        Msg::UploadSucceeded {
            kind,
            attempt,
            doc_id,
            status_updates,
        } => {
            state.apply_upload_success(kind, attempt, doc_id, status_updates);
            Vec::new()
        }
        Msg::UploadFailed {
            kind,
            attempt,
            message,
        } => {
            state.apply_upload_failure(kind, attempt, message);
            Vec::new()
        }
        Msg::GenerateClicked => match state.begin_generate() {
            Ok(effects) => effects,
            Err(err) => {
                state.record_error(err);
                Vec::new()
            }
        },
        Msg::GenerateSucceeded {
            epoch,
            job_id,
            filename,
            status_updates,
        } => state
            .apply_generate_success(epoch, job_id, filename, status_updates)
            .into_iter()
            .collect(),
        Msg::GenerateFailed { epoch, message } => {
            state.apply_generate_failure(epoch, message);
            Vec::new()
        }
        Msg::ProgressReported {
            job_id,
            epoch,
            progress,
            status,
        } => state
            .apply_progress(&job_id, epoch, progress, status)
            .into_iter()
            .collect(),
        Msg::ProgressFailed {
            job_id,
            epoch,
            message,
        } => {
            if state.apply_progress_failure(&job_id, epoch, message) {
                vec![Effect::CancelPoll]
            } else {
                Vec::new()
            }
        }
        Msg::DownloadClicked => match state.request_download() {
            Ok(effect) => {
                state.clear_notice();
                vec![effect]
            }
            Err(err) => {
                state.record_error(err);
                Vec::new()
            }
        },
        Msg::Shutdown => {
            state.shutdown();
            vec![Effect::CancelPoll]
        }
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}
