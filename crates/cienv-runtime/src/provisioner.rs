//! Provisioning orchestration.
//!
//! Activates the environment, builds the plan and runs each step in order
//! through a [`CommandRunner`]. The first failing step aborts the run.

use cienv_core::{
    CommandRunner, ComputeVariant, EnvHandle, Platform, ProvisionConfig, ProvisionPlan,
    ProvisionRecord, StepKind,
};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

use crate::activate::activate_from_process;
use crate::error::{ProvisionError, ProvisionResult};
use crate::progress::{NoopProgress, ProgressReporter};

/// A step that completed successfully.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepReport {
    pub kind: StepKind,
    pub command: String,
    pub elapsed: Duration,
}

/// Summary of a successful run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvisionReport {
    pub variant: ComputeVariant,
    pub platform: Platform,
    pub toolkit: String,
    pub steps: Vec<StepReport>,
    /// Where the provision record was written, if writing it succeeded.
    pub record_path: Option<PathBuf>,
}

impl ProvisionReport {
    pub fn total_elapsed(&self) -> Duration {
        self.steps.iter().map(|s| s.elapsed).sum()
    }
}

/// Runs provisioning plans.
pub struct Provisioner<R: CommandRunner> {
    runner: R,
    progress: Arc<dyn ProgressReporter>,
    platform: Platform,
    tool_version: String,
}

impl<R: CommandRunner> Provisioner<R> {
    pub fn new(runner: R) -> Self {
        Self {
            runner,
            progress: Arc::new(NoopProgress),
            platform: Platform::detect(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ProgressReporter>) -> Self {
        self.progress = progress;
        self
    }

    #[must_use]
    pub const fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Version string stored in the provision record.
    #[must_use]
    pub fn with_tool_version(mut self, version: impl Into<String>) -> Self {
        self.tool_version = version.into();
        self
    }

    pub const fn platform(&self) -> Platform {
        self.platform
    }

    /// Resolve the configuration into a plan for this provisioner's platform.
    pub fn plan(&self, config: &ProvisionConfig) -> ProvisionResult<ProvisionPlan> {
        Ok(ProvisionPlan::build(config, self.platform)?)
    }

    /// Full run: resolve, activate, execute, record.
    ///
    /// The selector is resolved before the environment is touched, so an
    /// invalid selector never reaches activation.
    pub async fn provision(&self, config: &ProvisionConfig) -> ProvisionResult<ProvisionReport> {
        let plan = self.plan(config)?;
        info!(
            variant = %plan.variant,
            toolkit = %plan.toolkit,
            platform = %plan.platform,
            "Resolved compute variant"
        );
        for notice in notices(config, &plan) {
            warn!("{notice}");
            self.progress.message(&notice);
        }

        let env = activate_from_process(&config.env_prefix, &config.stale_vars)?;
        info!(prefix = %env.prefix().display(), "Activated environment");

        let steps = self.execute(&plan, &env).await?;

        let record_path = self.write_record(&plan, &env);

        Ok(ProvisionReport {
            variant: plan.variant,
            platform: plan.platform,
            toolkit: plan.toolkit,
            steps,
            record_path,
        })
    }

    /// Run every step of `plan` in order inside `env`.
    ///
    /// Stops at the first step that cannot start or exits non-zero.
    pub async fn execute(
        &self,
        plan: &ProvisionPlan,
        env: &EnvHandle,
    ) -> ProvisionResult<Vec<StepReport>> {
        let total = plan.len() as u64;
        self.progress
            .start(&format!("Provisioning {}", plan.variant.display_name()), total);

        let mut reports = Vec::with_capacity(plan.len());
        for (index, step) in plan.steps.iter().enumerate() {
            let command = step.command.to_string();
            self.progress.step(index as u64, &step.description);
            info!(step = %step.kind, command = %command, "Running step");

            let started = Instant::now();
            let outcome = match self.runner.run(&step.command, env).await {
                Ok(outcome) => outcome,
                Err(source) => {
                    error!(step = %step.kind, error = %source, "Step could not run");
                    self.progress
                        .finish_with_error(&format!("{} could not run", step.kind));
                    return Err(ProvisionError::Runner {
                        step: step.kind,
                        source,
                    });
                }
            };

            if !outcome.is_success() {
                error!(step = %step.kind, code = ?outcome.code, command = %command, "Step failed");
                self.progress
                    .finish_with_error(&format!("{} failed", step.kind));
                return Err(ProvisionError::StepFailed {
                    step: step.kind,
                    command,
                    code: outcome.code,
                });
            }

            let elapsed = started.elapsed().max(outcome.elapsed);
            info!(step = %step.kind, elapsed_ms = elapsed.as_millis() as u64, "Step finished");
            reports.push(StepReport {
                kind: step.kind,
                command,
                elapsed,
            });
        }

        self.progress.finish("Environment provisioned");
        Ok(reports)
    }

    fn write_record(&self, plan: &ProvisionPlan, env: &EnvHandle) -> Option<PathBuf> {
        if env.is_host() {
            return None;
        }
        let path = ProvisionRecord::path_in(env.prefix());
        let record = ProvisionRecord::from_plan(plan, self.tool_version.clone());
        match record.save(&path) {
            Ok(()) => {
                info!(path = %path.display(), "Wrote provision record");
                Some(path)
            }
            Err(e) => {
                warn!(error = %e, "Could not write provision record");
                None
            }
        }
    }
}

/// Reproducibility warnings for a resolved plan.
fn notices(config: &ProvisionConfig, plan: &ProvisionPlan) -> Vec<String> {
    let mut notices = Vec::new();
    if !config.companion.is_pinned() {
        notices.push(format!(
            "companion library is not pinned; installing the repository head ({})",
            plan.companion_requirement
        ));
    }
    if let Some(parsed) = plan.variant.cuda_version()
        && plan.toolkit != cienv_core::variant::cuda_toolkit_constraint(parsed)
    {
        notices.push(format!(
            "installing {} although the selector asks for CUDA {parsed}",
            plan.toolkit
        ));
    }
    notices
}
