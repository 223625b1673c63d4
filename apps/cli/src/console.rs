//! Console rendering of upload progress and item listings.

use std::cell::Cell;
use std::io::Write;

use moduploader_protocol::{CATEGORY_TAG, ItemRecord};
use moduploader_workshop::{Phase, ProgressSink};

const BAR_WIDTH: usize = 30;

/// Draws a progress bar on stderr.
#[derive(Debug, Default)]
pub struct ConsoleProgress {
    last_percent: Cell<Option<u32>>,
    drawing: Cell<bool>,
}

impl ConsoleProgress {
    /// Terminates the bar line, if one is being drawn.
    pub fn finish(&self) {
        if self.drawing.replace(false) {
            eprintln!();
        }
    }
}

impl ProgressSink for ConsoleProgress {
    fn report(&self, fraction: f32) {
        let percent = percent(fraction);
        if self.last_percent.replace(Some(percent)) == Some(percent) {
            return;
        }
        self.drawing.set(true);
        let mut err = std::io::stderr().lock();
        let _ = write!(err, "\r{}", render_bar(fraction));
        let _ = err.flush();
    }

    fn phase(&self, phase: Phase) {
        self.finish();
        self.last_percent.set(None);
        if let Some(label) = phase_label(phase) {
            eprintln!("{label}");
        }
    }
}

fn percent(fraction: f32) -> u32 {
    (fraction.clamp(0.0, 1.0) * 100.0).round() as u32
}

/// `[#######.......................]  25%`; zero renders as waiting.
pub fn render_bar(fraction: f32) -> String {
    let fraction = fraction.clamp(0.0, 1.0);
    if fraction == 0.0 {
        return format!("[{}] waiting", ".".repeat(BAR_WIDTH));
    }
    let filled = ((fraction * BAR_WIDTH as f32).round() as usize).min(BAR_WIDTH);
    format!(
        "[{}{}] {:>3}%",
        "#".repeat(filled),
        ".".repeat(BAR_WIDTH - filled),
        percent(fraction)
    )
}

fn phase_label(phase: Phase) -> Option<&'static str> {
    match phase {
        Phase::Create => Some("Creating workshop item..."),
        Phase::Guard => Some("Locking mod files..."),
        Phase::Upload => Some("Uploading..."),
        Phase::Validate | Phase::Resolve | Phase::List => None,
    }
}

/// One `(id) title` line per mod, or a notice when there is none.
pub fn format_listing<'r>(items: impl IntoIterator<Item = &'r ItemRecord>) -> String {
    let lines: Vec<String> = items
        .into_iter()
        .filter(|item| item.has_tag(CATEGORY_TAG))
        .map(|item| format!("({}) {}", item.id, item.title))
        .collect();
    if lines.is_empty() {
        return "You have not published any mods yet.".into();
    }
    lines.join("\n")
}
