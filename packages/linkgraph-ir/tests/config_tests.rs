//! Configuration presets, validation and YAML round trips

use linkgraph_ir::config::*;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::io::Write;

// ============================================================================
// Presets
// ============================================================================

#[test]
fn test_presets_validate() {
    for preset in [Preset::Fast, Preset::Balanced, Preset::Thorough, Preset::Custom] {
        let config = LinkConfig::preset(preset);
        assert_eq!(config.preset, preset);
        config.validate().unwrap();
    }
}

#[test]
fn test_presets_are_ordered_by_budget() {
    let fast = LinkConfig::preset(Preset::Fast);
    let balanced = LinkConfig::preset(Preset::Balanced);
    let thorough = LinkConfig::preset(Preset::Thorough);

    assert!(fast.max_closure_iterations < balanced.max_closure_iterations);
    assert!(balanced.max_closure_iterations < thorough.max_closure_iterations);
    assert!(fast.max_call_depth < balanced.max_call_depth);
    assert!(balanced.max_call_depth < thorough.max_call_depth);
}

#[test]
fn test_default_is_balanced() {
    assert_eq!(LinkConfig::default(), LinkConfig::preset(Preset::Balanced));
}

// ============================================================================
// Validation
// ============================================================================

#[test]
fn test_zero_closure_budget_rejected() {
    let err = LinkConfig::default()
        .max_closure_iterations(0)
        .validate()
        .unwrap_err();
    assert!(matches!(err, ConfigError::Range { ref field, .. } if field == "max_closure_iterations"));
}

#[test]
fn test_workers_without_parallelism_rejected() {
    let err = LinkConfig::default()
        .parallel(false)
        .num_workers(4)
        .validate()
        .unwrap_err();
    assert!(matches!(err, ConfigError::Validation(_)));
}

#[test]
fn test_workers_default_to_cpu_count() {
    let config = LinkConfig::default();
    assert_eq!(config.num_workers, 0);
    assert!(config.workers() >= 1);
    assert_eq!(config.num_workers(3).workers(), 3);
}

// ============================================================================
// YAML
// ============================================================================

#[test]
fn test_yaml_file_with_overrides() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "version: 1\npreset: fast\noverrides:\n  max_call_depth: 3\n  leak_conditional_sub_links: true\n"
    )
    .unwrap();

    let config = LinkConfig::from_yaml(file.path()).unwrap();
    assert_eq!(config.preset, Preset::Fast);
    assert_eq!(config.max_call_depth, 3);
    assert!(config.leak_conditional_sub_links);
    assert_eq!(
        config.max_closure_iterations,
        LinkConfig::preset(Preset::Fast).max_closure_iterations
    );
}

#[test]
fn test_yaml_round_trip() {
    let config = LinkConfig::preset(Preset::Thorough)
        .force_shallow(true)
        .max_call_depth(7);
    let yaml = config.to_yaml().unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("linkgraph.yaml");
    std::fs::write(&path, yaml).unwrap();

    assert_eq!(LinkConfig::from_yaml(&path).unwrap(), config);
}

#[test]
fn test_yaml_missing_version() {
    let err = LinkConfig::from_yaml_str("preset: fast\n").unwrap_err();
    assert!(matches!(err, ConfigError::MissingVersion));
}

#[test]
fn test_yaml_unsupported_version() {
    let err = LinkConfig::from_yaml_str("version: 2\npreset: fast\n").unwrap_err();
    assert!(matches!(err, ConfigError::UnsupportedVersion { found: 2, .. }));
}

#[test]
fn test_yaml_unknown_preset() {
    let err = LinkConfig::from_yaml_str("version: 1\npreset: exhaustive\n").unwrap_err();
    assert!(matches!(err, ConfigError::UnknownPreset(ref p) if p == "exhaustive"));
}

#[test]
fn test_yaml_override_out_of_range() {
    let yaml = "version: 1\npreset: balanced\noverrides:\n  max_call_depth: 0\n";
    let err = LinkConfig::from_yaml_str(yaml).unwrap_err();
    assert!(matches!(err, ConfigError::Range { .. }));
}

#[test]
fn test_yaml_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = LinkConfig::from_yaml(dir.path().join("absent.yaml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}

// ============================================================================
// Properties
// ============================================================================

fn preset() -> impl Strategy<Value = Preset> {
    prop_oneof![
        Just(Preset::Fast),
        Just(Preset::Balanced),
        Just(Preset::Thorough),
        Just(Preset::Custom),
    ]
}

proptest! {
    #[test]
    fn prop_in_range_configs_validate(
        preset in preset(),
        iterations in 1usize..=1000,
        depth in 1usize..=10_000,
        workers in 0usize..=1024,
    ) {
        let config = LinkConfig::preset(preset)
            .max_closure_iterations(iterations)
            .max_call_depth(depth)
            .num_workers(workers);
        prop_assert!(config.validate().is_ok());
    }

    #[test]
    fn prop_yaml_round_trip(
        preset in preset(),
        iterations in 1usize..=1000,
        force_shallow in any::<bool>(),
        leak in any::<bool>(),
    ) {
        let config = LinkConfig::preset(preset)
            .max_closure_iterations(iterations)
            .force_shallow(force_shallow)
            .leak_conditional_sub_links(leak);
        let yaml = config.to_yaml().unwrap();
        prop_assert_eq!(LinkConfig::from_yaml_str(&yaml).unwrap(), config);
    }
}
