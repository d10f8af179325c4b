// Output formatting and display for CLI

use crate::error::SilError;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

/// Printed when certificate validation of the logs endpoint is disabled
pub const SKIP_SSL_WARNING: &str =
    "Skipping verification of the logs endpoint certificate. Not recommended!";

/// Printed after a failure that looks certificate related
pub const CERTIFICATE_HINT: &str = "Hint: try --skip-ssl-validation at your own risk.";

/// Print the banner for the action about to run
pub fn print_action(message: &str) {
    println!("{}...", message);
}

/// Print a warning to stderr
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "Warning:".yellow().bold(), message);
}

/// Print a failure, with a hint when the error looks like a certificate
/// problem
pub fn print_failure(error: &SilError) {
    let message = error.to_string();
    println!("{}", "FAILED".red().bold());
    println!("{}", message);
    if looks_like_certificate_error(&message) {
        println!("{}", CERTIFICATE_HINT);
    }
}

fn looks_like_certificate_error(message: &str) -> bool {
    let message = message.to_lowercase();
    message.contains("unknown authority") || message.contains("certificate")
}

/// Create a spinner for long operations
pub fn create_progress_bar(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    // Template is a constant; fall back to the default style if it is ever rejected
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(
            style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Finish a spinner with success
pub fn finish_progress_success(pb: ProgressBar, message: &str) {
    pb.finish_with_message(format!("{} {}", "✓".green(), message));
}

/// Finish a spinner with error
pub fn finish_progress_error(pb: ProgressBar, message: &str) {
    pb.finish_with_message(format!("{} {}", "✗".red(), message));
}

/// In-memory sink shared between the writer and whoever prints it later
#[derive(Debug, Clone, Default)]
pub struct LineBuffer(Arc<Mutex<Vec<u8>>>);

impl LineBuffer {
    /// Take everything written so far
    pub fn take(&self) -> Vec<u8> {
        self.0
            .lock()
            .map(|mut buf| std::mem::take(&mut *buf))
            .unwrap_or_default()
    }
}

impl Write for LineBuffer {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        let mut buf = self
            .0
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "line buffer poisoned"))?;
        buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
