//! Integration tests for design-of-experiments generation.

use romsampler::design::{DesignGenerator, DesignStrategy, HALTON_PRIMES};
use romsampler::parameter::Parameter;
use romsampler::{Error, Scale};

fn xy_schema() -> Vec<Parameter> {
    vec![
        Parameter::new("x", 0.0, 10.0),
        Parameter::new("y", 1.0, 100.0).log_scale(),
    ]
}

fn mixed_schema() -> Vec<Parameter> {
    vec![
        Parameter::new("velocity", 0.5, 30.0).levels(3),
        Parameter::new("viscosity", 1e-6, 1e-2).log_scale().levels(2),
        Parameter::new("angle", -10.0, 10.0).levels(5),
    ]
}

fn strategies() -> Vec<DesignStrategy> {
    #[allow(unused_mut)]
    let mut all = vec![
        DesignStrategy::LatinHypercube,
        DesignStrategy::Halton,
        DesignStrategy::FullFactorial,
    ];
    #[cfg(feature = "sobol")]
    all.push(DesignStrategy::Sobol);
    all
}

#[test]
fn every_strategy_stays_in_bounds() {
    let params = mixed_schema();
    for strategy in strategies() {
        let design = DesignGenerator::builder()
            .strategy(strategy)
            .seed(3)
            .build()
            .generate(&params, 37)
            .unwrap();
        assert!(!design.is_empty());
        for row in design.rows() {
            for (p, &v) in params.iter().zip(row) {
                assert!(
                    v >= p.min && v <= p.max,
                    "{strategy}: {} = {v} outside [{}, {}]",
                    p.name,
                    p.min,
                    p.max
                );
            }
        }
    }
}

#[test]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn latin_hypercube_fills_every_stratum() {
    let n = 17;
    let design = DesignGenerator::builder()
        .strategy(DesignStrategy::LatinHypercube)
        .seed(11)
        .build()
        .generate(&mixed_schema(), n)
        .unwrap();

    for j in 0..3 {
        let mut strata: Vec<usize> = design
            .unit_rows()
            .iter()
            .map(|row| (row[j] * n as f64).floor() as usize)
            .collect();
        strata.sort_unstable();
        assert_eq!(strata, (0..n).collect::<Vec<_>>(), "dimension {j}");
    }
}

#[test]
fn halton_is_deterministic() {
    let params = vec![Parameter::new("a", 0.0, 1.0), Parameter::new("b", 0.0, 1.0)];
    let generator = DesignGenerator::new(DesignStrategy::Halton);
    let first = generator.generate(&params, 10).unwrap();
    let second = generator.generate(&params, 10).unwrap();
    for (r1, r2) in first.rows().iter().zip(second.rows()) {
        for (a, b) in r1.iter().zip(r2) {
            assert_eq!(a.to_bits(), b.to_bits());
        }
    }
    // Index offset: the first point is the radical inverse of 1.
    assert_eq!(first.rows()[0], vec![0.5, 1.0 / 3.0]);
}

#[test]
fn halton_rejects_too_many_dimensions() {
    let params: Vec<Parameter> = (0..=HALTON_PRIMES.len())
        .map(|i| Parameter::new(format!("p{i}"), 0.0, 1.0))
        .collect();
    let err = DesignGenerator::new(DesignStrategy::Halton)
        .generate(&params, 4)
        .unwrap_err();
    assert!(matches!(err, Error::UnsupportedDimension { dims: 16, max: 15 }));
}

#[test]
fn factorial_row_count_is_product_of_levels() {
    let design = DesignGenerator::new(DesignStrategy::FullFactorial)
        .generate(&mixed_schema(), 1)
        .unwrap();
    assert_eq!(design.len(), 3 * 2 * 5);

    // First parameter varies slowest.
    let velocity = design.column("velocity").unwrap();
    assert!(velocity[..10].iter().all(|&v| v == 0.5));
    assert!(velocity[20..].iter().all(|&v| v == 30.0));
}

#[test]
fn factorial_log_levels_are_geometric() {
    let params = vec![Parameter::new("re", 1.0, 100.0).scale(Scale::Log).levels(3)];
    let design = DesignGenerator::new(DesignStrategy::FullFactorial)
        .generate(&params, 1)
        .unwrap();
    let col = design.column("re").unwrap();
    assert_eq!(col.len(), 3);
    assert!((col[0] - 1.0).abs() < 1e-12);
    assert!((col[1] - 10.0).abs() < 1e-9);
    assert!((col[2] - 100.0).abs() < 1e-9);
}

#[test]
fn factorial_zero_levels_rejected() {
    let params = vec![Parameter::new("a", 0.0, 1.0).levels(0)];
    let err = DesignGenerator::new(DesignStrategy::FullFactorial)
        .generate(&params, 1)
        .unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
}

#[test]
fn factorial_grid_too_large_to_count_is_rejected() {
    let params = vec![
        Parameter::new("a", 0.0, 1.0).levels(usize::MAX / 4 + 1),
        Parameter::new("b", 0.0, 1.0).levels(2),
        Parameter::new("c", 0.0, 1.0).levels(2),
    ];
    let generator = DesignGenerator::builder()
        .strategy(DesignStrategy::FullFactorial)
        .build();
    assert!(matches!(
        generator.generate(&params, 1),
        Err(Error::InvalidArgument(_))
    ));
}

#[test]
fn maximin_restarts_never_lose_to_single_draw() {
    let params = xy_schema();
    let restarted = DesignGenerator::builder()
        .strategy(DesignStrategy::LatinHypercube)
        .restarts(50)
        .seed(42)
        .build()
        .generate(&params, 8)
        .unwrap();
    let single = DesignGenerator::builder()
        .strategy(DesignStrategy::LatinHypercube)
        .restarts(1)
        .seed(42)
        .build()
        .generate(&params, 8)
        .unwrap();

    assert_eq!(restarted.len(), 8);
    for row in restarted.rows() {
        assert!((0.0..=10.0).contains(&row[0]));
        assert!((1.0..=100.0).contains(&row[1]));
    }
    assert!(restarted.min_unit_distance() >= single.min_unit_distance());
}

#[test]
fn seeded_lhs_is_reproducible() {
    let generator = DesignGenerator::builder().seed(9).build();
    let a = generator.generate(&xy_schema(), 6).unwrap();
    let b = generator.generate(&xy_schema(), 6).unwrap();
    assert_eq!(a.rows(), b.rows());
}

#[test]
fn invalid_schemas_are_rejected() {
    let generator = DesignGenerator::default();

    let err = generator
        .generate(&[Parameter::new("a", 2.0, 1.0)], 4)
        .unwrap_err();
    assert!(matches!(err, Error::InvalidBounds { .. }));

    let err = generator
        .generate(&[Parameter::new("a", 0.0, 1.0).log_scale()], 4)
        .unwrap_err();
    assert!(matches!(err, Error::Domain { .. }));

    let err = generator
        .generate(&[Parameter::new("a", 0.0, 1.0), Parameter::new("a", 0.0, 2.0)], 4)
        .unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
}

#[test]
fn design_becomes_snapshot_table() {
    let design = DesignGenerator::builder()
        .seed(1)
        .build()
        .generate(&xy_schema(), 4)
        .unwrap();
    let first = design.point(0).unwrap();
    let table = design.into_snapshot_table(12).unwrap();
    assert_eq!(table.len(), 4);
    assert_eq!(table.get("case_0012").unwrap(), first);
    assert_eq!(table.next_case_name(), "case_0016");
}
