mod support;

use std::sync::{Arc, OnceLock};

use macadvisor::dataset::record::{BUDGET_SENSITIVITY, ROLE};
use macadvisor::dataset::{FieldValue, Level, generate, heuristic_label, write_dataset};
use macadvisor::ml::explain::try_explain;
use macadvisor::ml::{
    ExplainOptions, FittedPipeline, ImportanceReport, PredictError, PredictionService,
    SchemaMismatch, SharedPipeline, TrainOptions, explain, load_pipeline,
};
use support::fixtures::{Workspace, mac_leaning_profile, windows_leaning_profile};
use tempfile::{TempDir, tempdir};

struct Trained {
    _dir: TempDir,
    workspace: Workspace,
    pipeline: Arc<FittedPipeline>,
}

/// 2000 records with seed 42, trained once per test binary with default options.
fn trained() -> &'static Trained {
    static TRAINED: OnceLock<Trained> = OnceLock::new();
    TRAINED.get_or_init(|| {
        let dir = tempdir().expect("tempdir");
        let workspace = Workspace::in_dir(dir.path());
        let report = workspace.train(&generate(42, 2000), &TrainOptions::default());
        assert_eq!(report.train_rows + report.test_rows, 2000);
        let pipeline = Arc::new(load_pipeline(&workspace.model).expect("load model"));
        Trained {
            _dir: dir,
            workspace,
            pipeline,
        }
    })
}

#[test]
fn mac_leaning_profile_is_recommended_a_mac() {
    let service = PredictionService::new(Arc::clone(&trained().pipeline));
    let result = service.predict(&mac_leaning_profile()).unwrap();
    assert_eq!(result.label, 1);
    assert!(result.probability > 0.5, "{}", result.probability);
}

#[test]
fn windows_leaning_profile_is_not_recommended_a_mac() {
    let service = PredictionService::new(Arc::clone(&trained().pipeline));
    let result = service.predict(&windows_leaning_profile()).unwrap();
    assert_eq!(result.label, 0);
    assert!(result.probability <= 0.5, "{}", result.probability);
}

#[test]
fn held_out_metrics_are_strong() {
    let dir = tempdir().unwrap();
    let workspace = Workspace::in_dir(dir.path());
    let options = TrainOptions {
        n_trees: 50,
        ..TrainOptions::default()
    };
    let report = workspace.train(&generate(42, 2000), &options);
    assert!((399..=401).contains(&report.test_rows), "{}", report.test_rows);
    assert!(report.evaluation.accuracy > 0.95, "{}", report.evaluation.accuracy);
    assert!(report.evaluation.roc_auc.unwrap() > 0.95);
    assert_eq!(
        report.evaluation.confusion.counts.iter().sum::<u32>() as usize,
        report.test_rows
    );
}

#[test]
fn shared_handle_loads_once_and_serves_predictions() {
    let shared = SharedPipeline::new(&trained().workspace.model);
    assert!(!shared.is_loaded());
    let first = PredictionService::from_shared(&shared).unwrap();
    let second = PredictionService::from_shared(&shared).unwrap();
    assert!(shared.is_loaded());
    assert!(std::ptr::eq(first.pipeline(), second.pipeline()));
    assert_eq!(
        first.predict(&mac_leaning_profile()).unwrap(),
        second.predict(&mac_leaning_profile()).unwrap()
    );
}

#[test]
fn missing_column_is_a_schema_mismatch() {
    let service = PredictionService::new(Arc::clone(&trained().pipeline));
    let mut input = mac_leaning_profile();
    input.remove(BUDGET_SENSITIVITY);
    match service.predict(&input) {
        Err(PredictError::Schema(SchemaMismatch::MissingColumns(columns))) => {
            assert_eq!(columns, vec![BUDGET_SENSITIVITY.to_string()]);
        }
        other => panic!("expected missing-column error, got {other:?}"),
    }
}

#[test]
fn unseen_role_still_gets_a_prediction() {
    let service = PredictionService::new(Arc::clone(&trained().pipeline));
    let mut input = mac_leaning_profile();
    input.insert(ROLE, FieldValue::category("Astronaut"));
    let result = service.predict(&input).unwrap();
    assert!((0.0..=1.0).contains(&result.probability));
}

#[test]
fn same_seed_writes_identical_files() {
    let dir = tempdir().unwrap();
    let first = dir.path().join("a.csv");
    let second = dir.path().join("b.csv");
    write_dataset(&generate(42, 500), &first).unwrap();
    write_dataset(&generate(42, 500), &second).unwrap();
    assert_eq!(std::fs::read(&first).unwrap(), std::fs::read(&second).unwrap());
}

#[test]
fn default_report_lists_top_ten_features() {
    let trained = trained();
    let report = explain(
        &trained.workspace.dataset,
        &trained.pipeline,
        &ExplainOptions::default(),
    );
    let entries = report.entries().expect("importances available");
    assert_eq!(entries.len(), 10);
    assert!(
        entries
            .windows(2)
            .all(|pair| pair[0].importance >= pair[1].importance)
    );
    let top: Vec<&str> = entries.iter().take(3).map(|entry| entry.feature.as_str()).collect();
    assert!(
        top.contains(&"requires_windows_only_apps") || top.contains(&"preferred_os_mac"),
        "{top:?}"
    );
}

#[test]
fn constant_column_scores_zero_importance() {
    let records: Vec<_> = generate(7, 1200)
        .into_iter()
        .map(|mut record| {
            record.mobility = Level::Medium;
            record.recommend_mac = Some(heuristic_label(&record));
            record
        })
        .collect();
    let dir = tempdir().unwrap();
    let workspace = Workspace::in_dir(dir.path());
    let options = TrainOptions {
        n_trees: 30,
        ..TrainOptions::default()
    };
    workspace.train(&records, &options);
    let pipeline = load_pipeline(&workspace.model).unwrap();

    let explain_options = ExplainOptions {
        top_k: usize::MAX,
        ..ExplainOptions::default()
    };
    let entries = try_explain(&workspace.dataset, &pipeline, &explain_options).unwrap();
    assert_eq!(entries.len(), pipeline.feature_names().len());
    let mobility = entries
        .iter()
        .find(|entry| entry.feature == "mobility_medium")
        .expect("mobility column present");
    assert!(mobility.importance.abs() < 1e-9, "{}", mobility.importance);
}

#[test]
fn missing_dataset_makes_importances_unavailable() {
    let dir = tempdir().unwrap();
    let report = explain(
        &dir.path().join("absent.csv"),
        &trained().pipeline,
        &ExplainOptions::default(),
    );
    match report {
        ImportanceReport::Unavailable { reason } => assert!(!reason.is_empty()),
        ImportanceReport::Available(_) => panic!("expected unavailable report"),
    }
}
