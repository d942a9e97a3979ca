//! Operator-facing console output
//!
//! Diagnostics go through `tracing`; this is what the operator reads.
//! Progress and informational lines are dropped in quiet mode, warnings,
//! errors and the final summary never are.

use crate::config::OutputConfig;
use crate::domain::AccessRule;
use crate::service::workflow::{ChangeStatus, RunReport};
use colored::{ColoredString, Colorize};

#[derive(Debug, Clone)]
pub struct Console {
    quiet: bool,
    color: bool,
}

impl Console {
    pub fn new(config: &OutputConfig) -> Self {
        Self {
            quiet: config.quiet,
            color: config.color,
        }
    }

    /// Quiet, uncolored console.
    pub fn silent() -> Self {
        Self {
            quiet: true,
            color: false,
        }
    }

    fn paint(&self, text: &str, style: fn(&str) -> ColoredString) -> String {
        if self.color {
            style(text).to_string()
        } else {
            text.to_string()
        }
    }

    pub fn heading(&self, text: &str) {
        if !self.quiet {
            println!("\n{}", self.paint(text, |s| s.bold()));
        }
    }

    pub fn info(&self, text: &str) {
        if !self.quiet {
            println!("{}", text);
        }
    }

    pub fn success(&self, text: &str) {
        println!("{}", self.paint(text, |s| s.green()));
    }

    pub fn warn(&self, text: &str) {
        eprintln!("{} {}", self.paint("warning:", |s| s.yellow().bold()), text);
    }

    pub fn error(&self, text: &str) {
        eprintln!("{} {}", self.paint("error:", |s| s.red().bold()), text);
    }

    pub fn progress(&self, attempt: u32, max: u32, status: &str, percent: u32) {
        if !self.quiet {
            println!(
                "  publish {} ({}%) [{}/{}]",
                status, percent, attempt, max
            );
        }
    }

    /// Numbered rule listing shown before selection.
    pub fn rules(&self, rules: &[AccessRule]) {
        if self.quiet {
            return;
        }
        self.heading(&format!("{} access rules", rules.len()));
        for rule in rules {
            println!(
                "  {:>4}  {:<40}  {}",
                rule.position,
                rule.display_name(),
                rule.track
            );
        }
    }

    /// Before/after table and success count.
    pub fn summary(&self, report: &RunReport) {
        if !self.quiet {
            self.heading(&format!(
                "Track changes in layer '{}' (package '{}')",
                report.layer, report.package
            ));
            for change in &report.changes {
                let after = match &change.status {
                    ChangeStatus::Applied => change.after.clone(),
                    ChangeStatus::Failed(message) => {
                        self.paint(&format!("FAILED: {}", message), |s| s.red())
                    }
                };
                println!(
                    "  {:>4}  {:<40}  {} -> {}",
                    change.position, change.name, change.before, after
                );
            }
        }

        let line = format!(
            "Updated {} of {} rules",
            report.success_count(),
            report.total()
        );
        if report.success_count() == report.total() {
            self.success(&line);
        } else {
            println!("{}", self.paint(&line, |s| s.yellow()));
        }
    }
}
