use std::io::Write;

use crate::ports::playlist::ProgressListener;

/// Progress line on stderr, rewritten in place while a playlist downloads.
pub struct ConsoleProgress {
    label: String,
}

impl ConsoleProgress {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }

    fn render(&self, completed: usize, total: usize) -> String {
        let percent = if total == 0 {
            100
        } else {
            completed * 100 / total
        };
        format!("{}: {}/{} tracks ({}%)", self.label, completed, total, percent)
    }
}

impl ProgressListener for ConsoleProgress {
    fn on_progress(&self, completed: usize, total: usize) {
        log::debug!("{}: {}/{}", self.label, completed, total);
        let line = self.render(completed, total);
        let mut stderr = std::io::stderr().lock();
        let end = if completed >= total { "\n" } else { "" };
        // Write errors on a closed stderr are ignored.
        let _ = write!(stderr, "\r{}{}", line, end);
        let _ = stderr.flush();
    }
}
