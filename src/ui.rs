//! Terminal output for the one-shot commands: a spinner while the carrier
//! API is working and a colored result line.

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::carrier::CallCreated;

pub struct CallProgress {
    pb: ProgressBar,
    green: Style,
    red: Style,
}

impl CallProgress {
    /// Start the spinner while `to` is being dialed.
    pub fn start(to: &str) -> Self {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(format!("Placing test call to {to}"));
        pb.enable_steady_tick(std::time::Duration::from_millis(100));

        Self {
            pb,
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
        }
    }

    pub fn placed(&self, call: &CallCreated) {
        self.pb.finish_and_clear();
        println!(
            "  {} Call is being initiated (SID {}, status {})",
            self.green.apply_to("✓"),
            call.sid,
            call.status.as_deref().unwrap_or("unknown")
        );
    }

    pub fn failed(&self, reason: &str) {
        self.pb.finish_and_clear();
        println!("  {} Test call failed: {reason}", self.red.apply_to("✗"));
    }
}
