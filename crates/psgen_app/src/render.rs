//! Plain-text rendering of the view model for terminal front-ends.

use psgen_core::{AppViewModel, PollPhase};

const BAR_WIDTH: usize = 30;

/// `[#########.....................]  30% Working`
pub fn progress_line(percent: u8, status: &str) -> String {
    let percent = percent.min(100);
    let filled = usize::from(percent) * BAR_WIDTH / 100;
    format!(
        "[{}{}] {:>3}% {}",
        "#".repeat(filled),
        ".".repeat(BAR_WIDTH - filled),
        percent,
        status
    )
    .trim_end()
    .to_string()
}

/// Full snapshot of the view, one line per item.
pub fn render(view: &AppViewModel) -> Vec<String> {
    let mut lines = Vec::new();
    for slot in &view.slots {
        let id = slot.remote_id.as_deref().unwrap_or("-");
        lines.push(format!("{:<11} {:?} ({id})", slot.kind.label(), slot.phase));
    }
    lines.push(format!("Status: {}", view.status));
    for entry in &view.status_log {
        lines.push(format!("  - {entry}"));
    }
    if shows_progress(view) {
        lines.push(progress_line(view.progress_percent, &view.progress_status));
    }
    if let Some(notice) = &view.notice {
        lines.push(format!("! {notice}"));
    }
    lines
}

/// An idle tracker still shows its label after a failed generate.
fn shows_progress(view: &AppViewModel) -> bool {
    view.poll_phase != PollPhase::Idle || !view.progress_status.is_empty()
}

/// Emits only what changed since the previous view, so a polling loop
/// does not reprint the whole log every second.
#[derive(Debug, Default)]
pub struct Renderer {
    last_log: Vec<String>,
    last_progress: Option<String>,
    last_notice: Option<String>,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn changes(&mut self, view: &AppViewModel) -> Vec<String> {
        let mut lines = Vec::new();

        if view.status_log != self.last_log {
            lines.extend(view.status_log.iter().map(|entry| format!("  - {entry}")));
            self.last_log = view.status_log.clone();
        }

        let progress = shows_progress(view)
            .then(|| progress_line(view.progress_percent, &view.progress_status));
        if progress.is_some() && progress != self.last_progress {
            lines.extend(progress.clone());
        }
        self.last_progress = progress;

        if view.notice.is_some() && view.notice != self.last_notice {
            lines.extend(view.notice.as_ref().map(|notice| format!("! {notice}")));
        }
        self.last_notice = view.notice.clone();

        lines
    }
}
