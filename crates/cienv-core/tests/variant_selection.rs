//! Selector decoding and the plans it produces.

use cienv_core::{
    ComputeVariant, CudaVersion, Platform, ProvisionConfig, ProvisionPlan, StepKind, VariantError,
};

fn install_command(selector: &str) -> String {
    let plan = ProvisionPlan::build(&ProvisionConfig::new(selector), Platform::Linux).unwrap();
    plan.step(StepKind::InstallFramework)
        .unwrap()
        .command
        .to_string()
}

#[test]
fn cpu_selects_pip_branch_with_cpuonly_constraint() {
    let plan = ProvisionPlan::build(&ProvisionConfig::new("cpu"), Platform::Linux).unwrap();
    assert_eq!(plan.variant, ComputeVariant::Cpu);
    assert_eq!(plan.toolkit, "cpuonly");
    assert!(install_command("cpu").starts_with("pip install --pre torch -f https://"));
}

#[test]
fn four_character_codes_use_single_digit_major() {
    assert_eq!(
        ComputeVariant::parse("cu92").unwrap(),
        ComputeVariant::Cuda(CudaVersion::new(9, 2))
    );
    assert_eq!(
        ComputeVariant::parse("cu80").unwrap().toolkit_constraint(),
        "cudatoolkit=8.0"
    );
}

#[test]
fn five_character_codes_use_two_digit_major() {
    for (selector, expected) in [("cu102", (10, 2)), ("cu113", (11, 3)), ("cu117", (11, 7))] {
        let version = ComputeVariant::parse(selector)
            .unwrap()
            .cuda_version()
            .unwrap();
        assert_eq!((version.major, version.minor), expected, "{selector}");
    }
}

#[test]
fn offsets_ignore_the_leading_characters() {
    // Only the characters from offset 2 onward carry the version
    assert_eq!(ComputeVariant::parse("1130").unwrap().to_string(), "CUDA 3.0");
    assert_eq!(ComputeVariant::parse("11300").unwrap().to_string(), "CUDA 30.0");
}

#[test]
fn other_lengths_fail_loudly() {
    for selector in ["cu1", "cu1130", "gpu", "cuda11.3"] {
        let err = ComputeVariant::parse(selector).unwrap_err();
        assert!(
            matches!(err, VariantError::UnsupportedLength { .. }),
            "{selector}: {err}"
        );
    }
    assert_eq!(ComputeVariant::parse("").unwrap_err(), VariantError::Empty);
    assert_eq!(ComputeVariant::parse("   ").unwrap_err(), VariantError::Empty);
}

#[test]
fn unset_selector_is_rejected_when_planning() {
    let config = ProvisionConfig::from_lookup(|_| None).unwrap();
    let err = ProvisionPlan::build(&config, Platform::Linux).unwrap_err();
    assert_eq!(err, VariantError::Empty);
}

#[test]
fn gpu_plan_threads_parsed_version_into_conda_install() {
    let command = install_command("cu113");
    assert!(command.starts_with("conda install -y --prefix "));
    assert!(command.ends_with("pytorch cudatoolkit=11.3 -c pytorch-nightly"));
}

#[test]
fn legacy_toolkit_pin_is_an_explicit_override() {
    let config = ProvisionConfig::new("cu113").with_cuda_toolkit("10.2");
    let plan = ProvisionPlan::build(&config, Platform::Linux).unwrap();
    assert_eq!(plan.variant.cuda_version(), Some(CudaVersion::new(11, 3)));
    assert_eq!(plan.toolkit, "cudatoolkit=10.2");
}

#[test]
fn platform_labels_follow_kernel_name() {
    assert_eq!(Platform::from_kernel_name("Darwin").label(), "MacOSX");
    assert_eq!(Platform::from_kernel_name("Linux").label(), "Linux");
    assert_eq!(Platform::from_kernel_name("FreeBSD").label(), "Linux");
}
