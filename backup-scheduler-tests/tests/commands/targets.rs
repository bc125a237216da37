//! Tests for the 'targets' command
//!
//! The targets command lists every registered backup target kind.

use backup_scheduler::config::{parse_endpoint, ConfigError};
use backup_scheduler::targets::{clickhouse, BackupTarget, TargetRegistry, TargetSettings};
use test_utils::MockTarget;

fn settings() -> TargetSettings {
    TargetSettings::new(parse_endpoint("http://localhost:7171").unwrap())
}

#[test]
fn test_builtin_targets_include_clickhouse() {
    let registry = TargetRegistry::builtin();
    assert!(registry.kinds().contains(&clickhouse::KIND));
    assert!(registry.contains("clickhouse"));
}

#[test]
fn test_build_clickhouse_target() {
    let target = TargetRegistry::builtin()
        .build(clickhouse::KIND, &settings())
        .unwrap();
    assert_eq!(target.kind(), "clickhouse");
}

#[test]
fn test_build_unknown_target() {
    let result = TargetRegistry::builtin().build("postgres", &settings());
    assert!(matches!(result, Err(ConfigError::UnknownTarget(kind)) if kind == "postgres"));
}

#[test]
fn test_register_additional_target() {
    fn mock_constructor(_: &TargetSettings) -> Result<Box<dyn BackupTarget>, ConfigError> {
        Ok(Box::new(MockTarget::new()))
    }

    let mut registry = TargetRegistry::builtin();
    registry.register("mock", mock_constructor);

    assert!(registry.contains("mock"));
    assert!(registry.contains("clickhouse"));
    let target = registry.build("mock", &settings()).unwrap();
    assert_eq!(target.kind(), "mock");
}
