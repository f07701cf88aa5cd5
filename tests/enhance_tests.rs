//! Integration tests for the enhancement loop, driven by a scripted executor.

use std::sync::Arc;

use romsampler::enhance::{CancelToken, CaseExecutor, EnhancementLoop, LoopState};
use romsampler::metric::{DirectionMethod, Fidelity, ForceCoefficient, Metric, MetricKind};
use romsampler::parameter::Parameter;
use romsampler::snapshot::{ParamValues, SnapshotTable};
use romsampler::storage::{MemorySnapshotStore, SnapshotStore};
use romsampler::{AcquisitionSelector, Error};

/// Executor with fixed metric values that can fail at a chosen step.
#[derive(Default)]
struct ScriptedExecutor {
    rom_value: f64,
    cfd_value: f64,
    fail_run_on: Option<usize>,
    fail_rebuild: bool,
    runs: Vec<(String, ParamValues)>,
    reconstructed: Vec<String>,
    rebuilds: Vec<Vec<String>>,
    evaluations: Vec<(String, Fidelity)>,
}

impl ScriptedExecutor {
    fn new(rom_value: f64, cfd_value: f64) -> Self {
        Self {
            rom_value,
            cfd_value,
            ..Self::default()
        }
    }
}

impl CaseExecutor for ScriptedExecutor {
    async fn reconstruct(&mut self, case: &str, _params: &ParamValues) -> romsampler::Result<()> {
        self.reconstructed.push(case.to_owned());
        Ok(())
    }

    async fn run_case(&mut self, case: &str, params: &ParamValues) -> romsampler::Result<()> {
        if self.fail_run_on == Some(self.runs.len()) {
            return Err(Error::CaseExecution(format!("solver diverged for {case}")));
        }
        self.runs.push((case.to_owned(), params.clone()));
        Ok(())
    }

    async fn evaluate_metric(
        &mut self,
        case: &str,
        _metric: &Metric,
        fidelity: Fidelity,
    ) -> romsampler::Result<f64> {
        self.evaluations.push((case.to_owned(), fidelity));
        Ok(match fidelity {
            Fidelity::Rom => self.rom_value,
            Fidelity::Cfd => self.cfd_value,
        })
    }

    async fn rebuild_rom(&mut self, snapshots: &[String]) -> romsampler::Result<()> {
        if self.fail_rebuild {
            return Err(Error::RomBuild("not enough modes".into()));
        }
        self.rebuilds.push(snapshots.to_vec());
        Ok(())
    }
}

fn schema() -> Vec<Parameter> {
    vec![
        Parameter::new("velocity", 1.0, 10.0),
        Parameter::new("temperature", 250.0, 350.0).inactive(),
    ]
}

fn seeded_table() -> SnapshotTable {
    let mut table = SnapshotTable::new(["velocity", "temperature"]);
    for (name, v, t) in [
        ("case_0000", 1.0, 260.0),
        ("case_0001", 4.0, 290.0),
        ("baseline", 6.0, 310.0),
        ("case_0007", 9.0, 340.0),
    ] {
        table
            .push(
                name,
                ParamValues::from([("velocity".into(), v), ("temperature".into(), t)]),
            )
            .unwrap();
    }
    table
}

fn drag() -> Metric {
    Metric::new(MetricKind::ForceCoefficient {
        region: None,
        boundaries: vec!["body".into()],
        coefficient: ForceCoefficient::Drag,
        direction_method: DirectionMethod::Direct,
        drag_direction: [1.0, 0.0, 0.0],
        lift_direction: [0.0, 1.0, 0.0],
        center_of_rotation: [0.0; 3],
        angle_of_attack: 0.0,
        angle_of_sideslip: 0.0,
    })
}

fn pressure_probe() -> Metric {
    Metric::new(MetricKind::PointProbe {
        coordinate: [1.0, 0.0, 0.0],
        field: "p".into(),
        component: None,
        snap_onto_boundary: None,
    })
}

fn enhancer(iterations: usize) -> EnhancementLoop {
    EnhancementLoop::builder()
        .parameters(schema())
        .metrics(vec![drag(), pressure_probe()])
        .iterations(iterations)
        .selector(AcquisitionSelector::with_seed(21))
        .build()
        .unwrap()
}

#[tokio::test]
async fn appends_cases_with_fresh_names() {
    let mut table = seeded_table();
    let mut executor = ScriptedExecutor::new(0.9, 1.0);

    let report = enhancer(3)
        .run(&mut table, &mut executor, &CancelToken::new())
        .await;

    assert!(report.is_done());
    assert_eq!(report.iterations_completed, 3);
    assert_eq!(report.new_cases, ["case_0008", "case_0009", "case_0010"]);
    assert_eq!(table.len(), 7);
    assert_eq!(executor.reconstructed, report.new_cases);

    // Every new row respects the schema ranges.
    for case in &report.new_cases {
        let row = table.get(case).unwrap();
        assert!((1.0..=10.0).contains(&row["velocity"]));
        assert!((260.0..=340.0).contains(&row["temperature"]));
    }

    // The ROM is rebuilt from the whole table after every append.
    assert_eq!(executor.rebuilds.len(), 3);
    assert_eq!(executor.rebuilds[2], table.case_names());
}

#[tokio::test]
async fn records_one_result_per_metric_per_iteration() {
    let mut table = seeded_table();
    let mut executor = ScriptedExecutor::new(0.9, 1.0);

    let report = enhancer(2)
        .run(&mut table, &mut executor, &CancelToken::new())
        .await;

    let rows = report.results.rows();
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0].case, "case_0008");
    assert_eq!(rows[0].metric_label, "Cd @ body");
    assert_eq!(rows[1].metric_label, "p @ (1, 0, 0)");
    for r in rows {
        assert!((r.relative_error_percent - 10.0).abs() < 1e-9);
    }
    assert_eq!(executor.evaluations.len(), 8);
    assert_eq!(executor.evaluations[0].1, Fidelity::Rom);
    assert_eq!(executor.evaluations[1].1, Fidelity::Cfd);
}

#[tokio::test]
async fn zero_cfd_value_gives_zero_error() {
    let mut table = seeded_table();
    let mut executor = ScriptedExecutor::new(0.4, 0.0);

    let report = enhancer(1)
        .run(&mut table, &mut executor, &CancelToken::new())
        .await;

    assert!(report.is_done());
    assert!(report.results.rows().iter().all(|r| r.relative_error_percent == 0.0));
}

#[tokio::test]
async fn failure_keeps_earlier_rows() {
    let mut table = seeded_table();
    let mut executor = ScriptedExecutor::new(1.0, 1.0);
    executor.fail_run_on = Some(1);

    let report = enhancer(3)
        .run(&mut table, &mut executor, &CancelToken::new())
        .await;

    assert_eq!(report.state, LoopState::Failed);
    assert_eq!(report.failed_in, Some(LoopState::RunningCase));
    assert!(matches!(report.error(), Some(Error::CaseExecution(_))));
    assert_eq!(report.iterations_completed, 1);
    assert_eq!(report.new_cases, ["case_0008"]);
    assert_eq!(table.len(), 5);
    assert_eq!(report.results.len(), 2);
    assert!(report.into_result().is_err());
}

#[tokio::test]
async fn rebuild_failure_keeps_the_appended_row() {
    let mut table = seeded_table();
    let mut executor = ScriptedExecutor::new(1.0, 2.0);
    executor.fail_rebuild = true;

    let report = enhancer(2)
        .run(&mut table, &mut executor, &CancelToken::new())
        .await;

    assert_eq!(report.failed_in, Some(LoopState::RebuildingRom));
    assert!(matches!(report.error(), Some(Error::RomBuild(_))));
    assert!(table.contains("case_0008"));
    assert_eq!(report.results.len(), 2);
}

#[tokio::test]
async fn cancelled_before_first_iteration() {
    let mut table = seeded_table();
    let mut executor = ScriptedExecutor::new(1.0, 1.0);
    let cancel = CancelToken::new();
    cancel.cancel();

    let report = enhancer(5).run(&mut table, &mut executor, &cancel).await;

    assert_eq!(report.state, LoopState::Cancelled);
    assert_eq!(report.iterations_completed, 0);
    assert!(report.new_cases.is_empty());
    assert!(report.error().is_none());
    assert_eq!(table.len(), 4);
    assert!(executor.runs.is_empty());
}

#[tokio::test]
async fn too_few_snapshots_fail_in_selection() {
    let mut table = SnapshotTable::new(["velocity", "temperature"]);
    table
        .push(
            "case_0000",
            ParamValues::from([("velocity".into(), 2.0), ("temperature".into(), 300.0)]),
        )
        .unwrap();
    let mut executor = ScriptedExecutor::new(1.0, 1.0);

    let report = enhancer(1)
        .run(&mut table, &mut executor, &CancelToken::new())
        .await;

    assert_eq!(report.failed_in, Some(LoopState::Selecting));
    assert!(matches!(
        report.error(),
        Some(Error::InsufficientData { required: 2, got: 1 })
    ));
}

#[tokio::test]
async fn appended_rows_reach_the_store() {
    let store = Arc::new(MemorySnapshotStore::new(["velocity", "temperature"]));
    let mut table = seeded_table();
    let mut executor = ScriptedExecutor::new(1.0, 1.0);

    let enhancer = EnhancementLoop::builder()
        .parameters(schema())
        .metric(drag())
        .iterations(2)
        .shared_store(Arc::clone(&store) as Arc<dyn SnapshotStore>)
        .build()
        .unwrap();
    let report = enhancer
        .run(&mut table, &mut executor, &CancelToken::new())
        .await;

    assert!(report.is_done());
    let stored = store.load_snapshots().unwrap();
    assert_eq!(stored.case_names(), report.new_cases);
    assert_eq!(stored.get("case_0009"), table.get("case_0009"));
}
