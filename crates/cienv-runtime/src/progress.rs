//! Progress reporting for provisioning runs.
//!
//! The provisioner reports step boundaries through [`ProgressReporter`] so
//! the CLI can draw a step bar while library callers and tests stay silent.
//!
//! # Feature Flags
//!
//! - `cli`: Enables `CliProgress` which uses `indicatif` for a terminal step bar.
//!   Without this feature, only `NoopProgress` is available.

/// Receives progress updates while a plan executes.
pub trait ProgressReporter: Send + Sync {
    /// Called once before the first step.
    ///
    /// * `total` - number of steps in the plan
    fn start(&self, message: &str, total: u64);

    /// Called when a step begins. `index` is zero-based.
    fn step(&self, index: u64, description: &str);

    /// Called to log a message without disturbing the bar.
    fn message(&self, msg: &str);

    /// Called when every step succeeded.
    fn finish(&self, message: &str);

    /// Called when a step failed and the run stops.
    fn finish_with_error(&self, message: &str);
}

/// A progress reporter that ignores all updates.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn start(&self, _message: &str, _total: u64) {}
    fn step(&self, _index: u64, _description: &str) {}
    fn message(&self, _msg: &str) {}
    fn finish(&self, _message: &str) {}
    fn finish_with_error(&self, _message: &str) {}
}

/// CLI progress reporter using indicatif.
///
/// This is only available with the `cli` feature flag.
#[cfg(feature = "cli")]
pub mod cli_progress {
    use super::ProgressReporter;
    use indicatif::{ProgressBar, ProgressStyle};
    use std::sync::Mutex;

    const STEP_TEMPLATE: &str = "{spinner:.green} [{elapsed_precise}] [{bar:30.cyan/blue}] {pos}/{len} {msg}";

    /// Terminal step bar.
    pub struct CliProgress {
        bar: Mutex<Option<ProgressBar>>,
    }

    impl CliProgress {
        pub fn new() -> Self {
            Self {
                bar: Mutex::new(None),
            }
        }

        fn create_step_bar(total: u64) -> ProgressBar {
            let pb = ProgressBar::new(total);
            let style = ProgressStyle::default_bar()
                .template(STEP_TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▓░");
            pb.set_style(style);
            pb
        }
    }

    impl Default for CliProgress {
        fn default() -> Self {
            Self::new()
        }
    }

    impl ProgressReporter for CliProgress {
        fn start(&self, message: &str, total: u64) {
            let pb = Self::create_step_bar(total);
            pb.set_message(message.to_string());

            if let Ok(mut guard) = self.bar.lock() {
                *guard = Some(pb);
            }
        }

        fn step(&self, index: u64, description: &str) {
            if let Ok(guard) = self.bar.lock()
                && let Some(ref pb) = *guard
            {
                pb.set_position(index);
                pb.set_message(description.to_string());
            }
        }

        fn message(&self, msg: &str) {
            match self.bar.lock() {
                Ok(guard) if guard.is_some() => {
                    if let Some(ref pb) = *guard {
                        pb.println(msg);
                    }
                }
                _ => println!("{msg}"),
            }
        }

        fn finish(&self, message: &str) {
            if let Ok(mut guard) = self.bar.lock()
                && let Some(pb) = guard.take()
            {
                if let Some(len) = pb.length() {
                    pb.set_position(len);
                }
                pb.finish_with_message(message.to_string());
            }
        }

        fn finish_with_error(&self, message: &str) {
            if let Ok(mut guard) = self.bar.lock()
                && let Some(pb) = guard.take()
            {
                pb.abandon_with_message(message.to_string());
            }
        }
    }
}

#[cfg(feature = "cli")]
pub use cli_progress::CliProgress;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_progress_does_not_panic() {
        let progress = NoopProgress;
        progress.start("Provisioning", 8);
        progress.step(0, "Sync submodules");
        progress.message("hello");
        progress.finish("done");
        progress.finish_with_error("failed");
    }

    #[cfg(feature = "cli")]
    #[test]
    fn cli_progress_tolerates_calls_without_start() {
        let progress = CliProgress::new();
        progress.step(1, "Install framework");
        progress.finish("done");
        progress.finish_with_error("failed");
    }
}
