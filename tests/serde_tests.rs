//! Loading schemas and metric definitions from JSON.

#![cfg(feature = "serde")]

use romsampler::metric::{DirectionMethod, ForceCoefficient, Metric, MetricKind};
use romsampler::parameter::{DEFAULT_LEVELS, Parameter, validate_schema};
use romsampler::{DesignStrategy, Scale, SnapshotTable};

#[test]
fn schema_defaults_fill_missing_fields() {
    let json = r#"[
        {"name": "velocity", "min": 1.0, "max": 10.0},
        {"name": "viscosity", "min": 1e-6, "max": 1e-3, "scale": "log", "levels": 5, "active": false}
    ]"#;
    let params: Vec<Parameter> = serde_json::from_str(json).unwrap();
    validate_schema(&params).unwrap();

    assert_eq!(params[0].scale, Scale::Linear);
    assert_eq!(params[0].levels, DEFAULT_LEVELS);
    assert!(params[0].active);
    assert_eq!(params[1].scale, Scale::Log);
    assert_eq!(params[1].levels, 5);
    assert!(!params[1].active);
}

#[test]
fn metric_category_is_tagged() {
    let json = r#"{
        "category": "force_coefficient",
        "boundaries": ["wing"],
        "coefficient": "Lift",
        "drag_direction": [1.0, 0.0, 0.0],
        "lift_direction": [0.0, 0.0, 1.0],
        "center_of_rotation": [0.25, 0.0, 0.0],
        "angle_of_attack": 4.0,
        "angle_of_sideslip": 0.0
    }"#;
    let kind: MetricKind = serde_json::from_str(json).unwrap();
    assert!(matches!(
        kind,
        MetricKind::ForceCoefficient {
            coefficient: ForceCoefficient::Lift,
            direction_method: DirectionMethod::Direct,
            region: None,
            ..
        }
    ));
    assert_eq!(Metric::new(kind).label(), "Cl @ wing");
}

#[test]
fn force_direction_method_and_region_are_kept() {
    let json = r#"{
        "category": "force_coefficient",
        "region": "fluid",
        "boundaries": ["wing"],
        "coefficient": "Drag",
        "direction_method": "AoA_AoS",
        "drag_direction": [1.0, 0.0, 0.0],
        "lift_direction": [0.0, 0.0, 1.0],
        "center_of_rotation": [0.0, 0.0, 0.0],
        "angle_of_attack": 4.0,
        "angle_of_sideslip": 1.5
    }"#;
    let kind: MetricKind = serde_json::from_str(json).unwrap();
    let MetricKind::ForceCoefficient {
        region,
        direction_method,
        angle_of_sideslip,
        ..
    } = &kind
    else {
        panic!("expected a force coefficient, got {kind:?}");
    };
    assert_eq!(region.as_deref(), Some("fluid"));
    assert_eq!(*direction_method, DirectionMethod::AngleOfAttack);
    assert_eq!(*angle_of_sideslip, 1.5);

    let back = serde_json::to_value(&kind).unwrap();
    assert_eq!(back["direction_method"], "AoA_AoS");
    assert_eq!(back["region"], "fluid");
    assert_eq!(Metric::new(kind).label(), "Cd @ wing");
}

#[test]
fn strategy_and_table_serialize() {
    let strategy: DesignStrategy = serde_json::from_str(r#""full_factorial""#).unwrap();
    assert_eq!(strategy, DesignStrategy::FullFactorial);

    let mut table = SnapshotTable::new(["x"]);
    table
        .push("case_0000", [("x".to_owned(), 2.0)].into_iter().collect())
        .unwrap();
    let json = serde_json::to_string(&table).unwrap();
    let back: SnapshotTable = serde_json::from_str(&json).unwrap();
    assert_eq!(back, table);
}
