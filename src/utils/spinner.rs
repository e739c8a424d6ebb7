use crate::utils::logger::{LogLevel, Logger};
use indicatif::{ProgressBar, ProgressStyle};
use std::cell::Cell;
use std::fmt::Display;
use std::time::Duration;

pub struct Spinner {
    bar: ProgressBar,
    active: Cell<bool>,
}

impl Spinner {
    pub fn new(message: impl Into<String>) -> Self {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        bar.set_style(style);
        bar.set_message(message.into());
        bar.enable_steady_tick(Duration::from_millis(80));

        Spinner {
            bar,
            active: Cell::new(true),
        }
    }

    pub fn succeed(&self, message: impl Into<String>) {
        if self.active.get() {
            self.bar.finish_and_clear();
            Logger::new().log_message(LogLevel::Success, &message.into());
            self.active.set(false);
        }
    }

    pub fn fail(&self, message: impl Into<String>) {
        if self.active.get() {
            self.bar.finish_and_clear();
            Logger::new().log_message(LogLevel::Error, &message.into());
            self.active.set(false);
        }
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        if self.active.get() {
            self.bar.abandon();
            self.active.set(false);
        }
    }
}

/// Runs one build step under a spinner, logging its outcome.
pub fn run_step<T, E, F, S>(start_message: &str, on_success: S, action: F) -> Result<T, E>
where
    E: Display,
    F: FnOnce() -> Result<T, E>,
    S: FnOnce(&T) -> String,
{
    let spinner = Spinner::new(start_message);
    match action() {
        Ok(value) => {
            spinner.succeed(on_success(&value));
            Ok(value)
        }
        Err(err) => {
            spinner.fail(err.to_string());
            Err(err)
        }
    }
}
