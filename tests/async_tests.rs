//! Async integration tests for the blocking-pool helpers.
//!
//! These tests are only compiled when the `async` feature is enabled.

#![cfg(feature = "async")]

use std::sync::Arc;
use std::thread::ThreadId;

use parking_lot::Mutex;
use romsampler::design::{DesignGenerator, DesignStrategy};
use romsampler::enhance::{CancelToken, CaseExecutor, EnhancementLoop};
use romsampler::metric::{Fidelity, Metric, MetricKind};
use romsampler::parameter::Parameter;
use romsampler::snapshot::{ParamValues, SnapshotTable};
use romsampler::storage::{MemorySnapshotStore, SnapshotStore};
use romsampler::{AcquisitionSelector, Error, offload};

fn schema() -> Vec<Parameter> {
    vec![
        Parameter::new("x", 0.0, 10.0),
        Parameter::new("y", 1.0, 100.0).log_scale(),
    ]
}

#[tokio::test]
async fn offloaded_design_matches_inline_design() {
    let generator = DesignGenerator::builder()
        .strategy(DesignStrategy::LatinHypercube)
        .seed(42)
        .build();
    let inline = generator.generate(&schema(), 8).unwrap();
    let offloaded = offload::generate_design(generator, schema(), 8).await.unwrap();
    assert_eq!(inline.rows(), offloaded.rows());
}

#[tokio::test]
async fn offloaded_errors_are_preserved() {
    let err = offload::generate_design(DesignGenerator::default(), schema(), 0)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
}

#[tokio::test(flavor = "multi_thread")]
async fn offloaded_selection_matches_inline_selection() {
    let table: SnapshotTable = DesignGenerator::builder()
        .seed(5)
        .build()
        .generate(&schema(), 6)
        .unwrap()
        .into_snapshot_table(0)
        .unwrap();
    let selector = AcquisitionSelector::with_seed(99);
    let inline = selector.select_next(&table, &schema()).unwrap();
    let offloaded = offload::select_next(selector, &table, schema()).await.unwrap();
    assert_eq!(inline, offloaded);
}

/// Memory store that remembers which thread each write ran on.
struct ThreadRecordingStore {
    inner: MemorySnapshotStore,
    threads: Mutex<Vec<ThreadId>>,
}

impl SnapshotStore for ThreadRecordingStore {
    fn persist_snapshot(&self, case: &str, params: &ParamValues) -> romsampler::Result<()> {
        self.threads.lock().push(std::thread::current().id());
        self.inner.persist_snapshot(case, params)
    }

    fn load_snapshots(&self) -> romsampler::Result<SnapshotTable> {
        self.inner.load_snapshots()
    }
}

struct ConstantExecutor;

impl CaseExecutor for ConstantExecutor {
    async fn reconstruct(&mut self, _: &str, _: &ParamValues) -> romsampler::Result<()> {
        Ok(())
    }

    async fn run_case(&mut self, _: &str, _: &ParamValues) -> romsampler::Result<()> {
        Ok(())
    }

    async fn evaluate_metric(
        &mut self,
        _: &str,
        _: &Metric,
        _: Fidelity,
    ) -> romsampler::Result<f64> {
        Ok(1.0)
    }

    async fn rebuild_rom(&mut self, _: &[String]) -> romsampler::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn loop_persists_off_the_executor_thread() {
    let store = Arc::new(ThreadRecordingStore {
        inner: MemorySnapshotStore::new(["x"]),
        threads: Mutex::new(Vec::new()),
    });
    let mut table = SnapshotTable::new(["x"]);
    for (i, x) in [1.0, 4.0, 8.0].into_iter().enumerate() {
        table
            .push(format!("case_{i:04}"), ParamValues::from([("x".into(), x)]))
            .unwrap();
    }

    let enhancer = EnhancementLoop::builder()
        .parameters(vec![Parameter::new("x", 0.0, 10.0)])
        .metric(Metric::new(MetricKind::VolumeAggregate {
            volume: "fluid".into(),
            report_type: "volumeAverage".into(),
            field: "T".into(),
            component: None,
        }))
        .iterations(2)
        .selector(AcquisitionSelector::with_seed(3))
        .shared_store(Arc::clone(&store) as Arc<dyn SnapshotStore>)
        .build()
        .unwrap();
    let report = enhancer
        .run(&mut table, &mut ConstantExecutor, &CancelToken::new())
        .await;

    assert!(report.is_done());
    assert_eq!(store.inner.len(), 2);
    let caller = std::thread::current().id();
    let threads = store.threads.lock();
    assert_eq!(threads.len(), 2);
    assert!(threads.iter().all(|&t| t != caller));
}

#[tokio::test]
async fn offloaded_persist_reports_store_errors() {
    let store: Arc<dyn SnapshotStore> = Arc::new(MemorySnapshotStore::new(["x"]));
    let row = ParamValues::from([("x".to_owned(), 1.0)]);
    offload::persist_snapshot(Arc::clone(&store), "case_0000".into(), row.clone())
        .await
        .unwrap();
    let err = offload::persist_snapshot(store, "case_0000".into(), row)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::DuplicateCase(_)));
}
