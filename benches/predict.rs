use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use macadvisor::dataset::{RawRecord, generate, write_dataset};
use macadvisor::ml::{PredictionService, TrainOptions, load_pipeline, train};
use tempfile::tempdir;

const RECORD_COUNT: usize = 2_000;
const TREE_COUNT: usize = 200;

fn setup_service() -> PredictionService {
    let dir = tempdir().expect("tempdir");
    let dataset = dir.path().join("mac_dataset.csv");
    let model = dir.path().join("model.bin");
    write_dataset(&generate(42, RECORD_COUNT), &dataset).expect("write dataset");
    let options = TrainOptions {
        n_trees: TREE_COUNT,
        ..TrainOptions::default()
    };
    train(&dataset, &model, &options).expect("train");
    PredictionService::new(Arc::new(load_pipeline(&model).expect("load model")))
}

fn bench_single_prediction(c: &mut Criterion) {
    let service = setup_service();
    let input = RawRecord::from_record(&generate(7, 1)[0]);
    c.bench_with_input(
        BenchmarkId::new("predict_single", TREE_COUNT),
        &input,
        |b, input| {
            b.iter(|| {
                service.predict(black_box(input)).expect("predict");
            });
        },
    );
}

criterion_group!(benches, bench_single_prediction);
criterion_main!(benches);
