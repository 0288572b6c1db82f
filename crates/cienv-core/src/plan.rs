//! Provisioning plan.
//!
//! The plan is the exact, ordered list of external commands the provisioner
//! runs. Building it is pure, so `cienv plan` prints precisely what
//! `cienv provision` would execute.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use tracing::warn;

use crate::config::ProvisionConfig;
use crate::platform::Platform;
use crate::variant::{ComputeVariant, CudaVersion, VariantError, cuda_toolkit_constraint};

/// Kind of a provisioning step, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepKind {
    SyncSubmodules,
    UpdateSubmodules,
    InstallFramework,
    InstallBuildHelper,
    InstallCompanion,
    SmokeTestCompanion,
    BuildProject,
    SmokeTestProject,
}

impl StepKind {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::SyncSubmodules => "sync-submodules",
            Self::UpdateSubmodules => "update-submodules",
            Self::InstallFramework => "install-framework",
            Self::InstallBuildHelper => "install-build-helper",
            Self::InstallCompanion => "install-companion",
            Self::SmokeTestCompanion => "smoke-test-companion",
            Self::BuildProject => "build-project",
            Self::SmokeTestProject => "smoke-test-project",
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An external command: program, arguments and optional working directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn has_arg(&self, arg: &str) -> bool {
        self.args.iter().any(|a| a == arg)
    }
}

impl fmt::Display for CommandSpec {
    /// Shell-like rendering, quoting arguments that contain whitespace or quotes.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(|c: char| c.is_whitespace() || c == '"' || c == '\'')
            {
                write!(f, " \"{}\"", arg.replace('"', "\\\""))?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

/// One step of the plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub kind: StepKind,
    pub description: String,
    pub command: CommandSpec,
}

impl Step {
    fn new(kind: StepKind, description: impl Into<String>, command: CommandSpec) -> Self {
        Self {
            kind,
            description: description.into(),
            command,
        }
    }
}

/// Resolved variant plus the ordered steps to run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionPlan {
    pub variant: ComputeVariant,
    pub platform: Platform,
    /// Toolkit constraint used by the framework install.
    pub toolkit: String,
    /// Requirement the companion library is installed from.
    pub companion_requirement: String,
    pub steps: Vec<Step>,
}

impl ProvisionPlan {
    /// Build the plan for a configuration on the given platform.
    pub fn build(config: &ProvisionConfig, platform: Platform) -> Result<Self, VariantError> {
        let variant = config.variant()?;
        let toolkit = resolve_toolkit(variant, config.toolkit_override()?);
        let project_dir = &config.project.dir;

        let mut steps = Vec::with_capacity(8);

        if config.project.sync_submodules {
            steps.push(Step::new(
                StepKind::SyncSubmodules,
                "Synchronize submodule URLs",
                CommandSpec::new(&config.git)
                    .args(["submodule", "sync"])
                    .current_dir(project_dir),
            ));
            steps.push(Step::new(
                StepKind::UpdateSubmodules,
                "Initialize and update submodules",
                CommandSpec::new(&config.git)
                    .args(["submodule", "update", "--init", "--recursive"])
                    .current_dir(project_dir),
            ));
        }

        let framework = &config.framework;
        let install_framework = match variant {
            ComputeVariant::Cpu => Step::new(
                StepKind::InstallFramework,
                format!("Install {} nightly (CPU)", framework.pip_name),
                CommandSpec::new(&config.pip)
                    .args(["install", "--pre"])
                    .arg(&framework.pip_name)
                    .arg("-f")
                    .arg(&framework.cpu_index_url),
            ),
            ComputeVariant::Cuda(_) => Step::new(
                StepKind::InstallFramework,
                format!("Install {} nightly ({toolkit})", framework.conda_name),
                CommandSpec::new(&config.conda)
                    .args(["install", "-y", "--prefix"])
                    .arg(config.env_prefix.to_string_lossy())
                    .arg(&framework.conda_name)
                    .arg(&toolkit)
                    .arg("-c")
                    .arg(&framework.nightly_channel),
            ),
        };
        steps.push(install_framework);

        let companion = &config.companion;
        let companion_requirement = companion.pip_requirement();
        steps.push(Step::new(
            StepKind::InstallBuildHelper,
            format!("Install {}", companion.build_helper),
            CommandSpec::new(&config.pip)
                .arg("install")
                .arg(&companion.build_helper),
        ));
        steps.push(Step::new(
            StepKind::InstallCompanion,
            format!("Install {} from source control", companion.module),
            CommandSpec::new(&config.pip)
                .arg("install")
                .arg(&companion_requirement),
        ));
        steps.push(Step::new(
            StepKind::SmokeTestCompanion,
            format!("Import {}", companion.module),
            import_check(&config.python, &companion.module),
        ));

        let project = &config.project;
        steps.push(Step::new(
            StepKind::BuildProject,
            format!("Build {} in development mode", project.module),
            CommandSpec::new(&config.python)
                .args(project.build_args.iter().cloned())
                .current_dir(project_dir),
        ));
        steps.push(Step::new(
            StepKind::SmokeTestProject,
            format!("Import {}", project.module),
            import_check(&config.python, &project.module),
        ));

        Ok(Self {
            variant,
            platform,
            toolkit,
            companion_requirement,
            steps,
        })
    }

    pub fn step(&self, kind: StepKind) -> Option<&Step> {
        self.steps.iter().find(|s| s.kind == kind)
    }

    pub fn contains(&self, kind: StepKind) -> bool {
        self.step(kind).is_some()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Toolkit constraint for a variant, honouring an explicit override.
pub fn resolve_toolkit(variant: ComputeVariant, override_version: Option<CudaVersion>) -> String {
    match (variant, override_version) {
        (ComputeVariant::Cpu, Some(version)) => {
            warn!(toolkit = %version, "CUDA toolkit override ignored for CPU variant");
            variant.toolkit_constraint()
        }
        (ComputeVariant::Cuda(parsed), Some(version)) => {
            if parsed != version {
                warn!(
                    selector_version = %parsed,
                    toolkit = %version,
                    "CUDA toolkit override differs from the selector version"
                );
            }
            cuda_toolkit_constraint(version)
        }
        (_, None) => variant.toolkit_constraint(),
    }
}

fn import_check(python: &str, module: &str) -> CommandSpec {
    CommandSpec::new(python)
        .arg("-c")
        .arg(format!("import {module}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(plan: &ProvisionPlan) -> Vec<StepKind> {
        plan.steps.iter().map(|s| s.kind).collect()
    }

    #[test]
    fn cpu_plan_uses_package_index() {
        let plan = ProvisionPlan::build(&ProvisionConfig::new("cpu"), Platform::Linux).unwrap();

        assert_eq!(plan.toolkit, "cpuonly");
        let install = &plan.step(StepKind::InstallFramework).unwrap().command;
        assert_eq!(install.program, "pip");
        assert!(install.has_arg("--pre"));
        assert!(install.has_arg("torch"));
        assert!(install.has_arg(crate::config::defaults::CPU_NIGHTLY_INDEX));
        assert!(plan.steps.iter().all(|s| s.command.program != "conda"));
    }

    #[test]
    fn gpu_plan_threads_parsed_version_into_conda_install() {
        let plan = ProvisionPlan::build(
            &ProvisionConfig::new("cu113").with_env_prefix("/ci/env"),
            Platform::Linux,
        )
        .unwrap();

        assert_eq!(plan.toolkit, "cudatoolkit=11.3");
        let install = &plan.step(StepKind::InstallFramework).unwrap().command;
        assert_eq!(install.program, "conda");
        assert_eq!(
            install.args,
            vec![
                "install",
                "-y",
                "--prefix",
                "/ci/env",
                "pytorch",
                "cudatoolkit=11.3",
                "-c",
                "pytorch-nightly"
            ]
        );
    }

    #[test]
    fn toolkit_override_reproduces_legacy_pin() {
        let config = ProvisionConfig::new("cu113").with_cuda_toolkit("10.2");
        let plan = ProvisionPlan::build(&config, Platform::Linux).unwrap();
        assert_eq!(plan.variant, ComputeVariant::Cuda(CudaVersion::new(11, 3)));
        assert_eq!(plan.toolkit, "cudatoolkit=10.2");
        assert!(
            plan.step(StepKind::InstallFramework)
                .unwrap()
                .command
                .has_arg("cudatoolkit=10.2")
        );
    }

    #[test]
    fn toolkit_override_is_ignored_for_cpu() {
        assert_eq!(
            resolve_toolkit(ComputeVariant::Cpu, Some(CudaVersion::new(10, 2))),
            "cpuonly"
        );
    }

    #[test]
    fn steps_follow_fixed_order() {
        let plan = ProvisionPlan::build(&ProvisionConfig::new("cpu"), Platform::MacOsx).unwrap();
        assert_eq!(
            kinds(&plan),
            vec![
                StepKind::SyncSubmodules,
                StepKind::UpdateSubmodules,
                StepKind::InstallFramework,
                StepKind::InstallBuildHelper,
                StepKind::InstallCompanion,
                StepKind::SmokeTestCompanion,
                StepKind::BuildProject,
                StepKind::SmokeTestProject,
            ]
        );
        assert_eq!(plan.platform, Platform::MacOsx);
    }

    #[test]
    fn submodules_can_be_skipped() {
        let plan = ProvisionPlan::build(
            &ProvisionConfig::new("cpu").without_submodules(),
            Platform::Linux,
        )
        .unwrap();
        assert!(!plan.contains(StepKind::SyncSubmodules));
        assert!(!plan.contains(StepKind::UpdateSubmodules));
        assert_eq!(plan.len(), 6);
    }

    #[test]
    fn companion_revision_is_pinned_in_requirement() {
        let plan = ProvisionPlan::build(
            &ProvisionConfig::new("cpu").with_companion_revision("v0.2.0"),
            Platform::Linux,
        )
        .unwrap();
        let install = &plan.step(StepKind::InstallCompanion).unwrap().command;
        assert_eq!(
            install.args,
            vec!["install", "git+https://github.com/pytorch-labs/tensordict@v0.2.0"]
        );
        assert_eq!(
            plan.companion_requirement,
            "git+https://github.com/pytorch-labs/tensordict@v0.2.0"
        );
    }

    #[test]
    fn build_and_smoke_tests_use_interpreter() {
        let plan = ProvisionPlan::build(
            &ProvisionConfig::new("cpu").with_project_dir("/work/repo"),
            Platform::Linux,
        )
        .unwrap();

        let build = &plan.step(StepKind::BuildProject).unwrap().command;
        assert_eq!(build.program, "python");
        assert_eq!(build.args, vec!["setup.py", "develop"]);
        assert_eq!(build.cwd, Some(PathBuf::from("/work/repo")));

        let smoke = &plan.step(StepKind::SmokeTestProject).unwrap().command;
        assert_eq!(smoke.args, vec!["-c", "import torchrl"]);
        let smoke = &plan.step(StepKind::SmokeTestCompanion).unwrap().command;
        assert_eq!(smoke.args, vec!["-c", "import tensordict"]);
    }

    #[test]
    fn invalid_selector_produces_no_plan() {
        assert!(ProvisionPlan::build(&ProvisionConfig::new("cu1"), Platform::Linux).is_err());
        assert!(ProvisionPlan::build(&ProvisionConfig::new(""), Platform::Linux).is_err());
    }

    #[test]
    fn command_display_quotes_arguments_with_spaces() {
        let cmd = CommandSpec::new("python").arg("-c").arg("import torchrl");
        assert_eq!(cmd.to_string(), "python -c \"import torchrl\"");
    }
}
