//! Trains the Mac recommendation model and reports held-out metrics.

use std::path::PathBuf;

use macadvisor::config;
use macadvisor::logging;
use macadvisor::ml::{TrainOptions, train};

const CLASS_NAMES: [&str; 2] = ["other", "mac"];

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let options = parse_args(std::env::args().skip(1).collect())?;
    let settings = config::load_or_default(options.config.as_deref()).map_err(|err| err.to_string())?;
    let _log = logging::init_or_report(env!("CARGO_BIN_NAME"), &settings.logging);
    let dataset = options.dataset.unwrap_or(settings.dataset_path.clone());
    let model_out = options.model_out.unwrap_or(settings.model_path.clone());
    let mut train_options = TrainOptions::from(&settings.training);
    if let Some(trees) = options.trees {
        train_options.n_trees = trees;
    }
    if let Some(seed) = options.seed {
        train_options.seed = seed;
    }
    if let Some(fraction) = options.test_fraction {
        train_options.test_fraction = fraction;
    }

    let report = train(&dataset, &model_out, &train_options).map_err(|err| err.to_string())?;
    let evaluation = &report.evaluation;
    println!(
        "trained on {} rows, evaluated on {} rows",
        report.train_rows, report.test_rows
    );
    println!("test accuracy: {:.4}", evaluation.accuracy);
    match evaluation.roc_auc {
        Some(auc) => println!("roc auc: {auc:.4}"),
        None => println!("roc auc: skipped (single class in test set)"),
    }
    for (idx, stats) in evaluation.per_class.iter().enumerate() {
        println!(
            "class {} {:<6}  precision={:.3}  recall={:.3}  f1={:.3}  support={}",
            idx,
            CLASS_NAMES[idx],
            stats.precision,
            stats.recall,
            stats.f1,
            stats.support
        );
    }
    let cm = &evaluation.confusion;
    println!("confusion matrix (rows=true, cols=pred):");
    for truth in 0..cm.n_classes {
        let mut row = String::new();
        for pred in 0..cm.n_classes {
            row.push_str(&format!("{:6}", cm.get(truth, pred)));
        }
        println!("{row}");
    }
    println!("model saved to {}", report.model_path.display());
    Ok(())
}

#[derive(Debug, Default)]
struct CliOptions {
    dataset: Option<PathBuf>,
    model_out: Option<PathBuf>,
    trees: Option<usize>,
    seed: Option<u64>,
    test_fraction: Option<f64>,
    config: Option<PathBuf>,
}

fn parse_args(args: Vec<String>) -> Result<CliOptions, String> {
    let mut options = CliOptions::default();
    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "-h" | "--help" => return Err(help_text()),
            "--dataset" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--dataset requires a value".to_string())?;
                options.dataset = Some(PathBuf::from(value));
            }
            "--out" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--out requires a value".to_string())?;
                options.model_out = Some(PathBuf::from(value));
            }
            "--trees" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--trees requires a value".to_string())?;
                options.trees = Some(
                    value
                        .parse::<usize>()
                        .map_err(|_| format!("Invalid --trees value: {value}"))?,
                );
            }
            "--seed" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--seed requires a value".to_string())?;
                options.seed = Some(
                    value
                        .parse::<u64>()
                        .map_err(|_| format!("Invalid --seed value: {value}"))?,
                );
            }
            "--test-fraction" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--test-fraction requires a value".to_string())?;
                options.test_fraction = Some(
                    value
                        .parse::<f64>()
                        .map_err(|_| format!("Invalid --test-fraction value: {value}"))?,
                );
            }
            "--config" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--config requires a value".to_string())?;
                options.config = Some(PathBuf::from(value));
            }
            unknown => return Err(format!("Unknown argument: {unknown}\n\n{}", help_text())),
        }
        idx += 1;
    }
    Ok(options)
}

fn help_text() -> String {
    [
        "macadvisor-train",
        "",
        "Trains a random forest on a generated dataset and saves the fitted pipeline.",
        "",
        "Usage:",
        "  macadvisor-train [--dataset <file>] [--out <file>] [options]",
        "",
        "Options:",
        "  --dataset <file>        Training CSV (default: mac_dataset.csv).",
        "  --out <file>            Model artifact path (default: model.bin).",
        "  --trees <n>             Number of trees (default: 200).",
        "  --seed <n>              Seed for the split and bootstrap sampling (default: 42).",
        "  --test-fraction <f64>   Share of each class held out (default: 0.2).",
        "  --config <file>         Settings file (default: macadvisor.toml in the app directory).",
    ]
    .join("\n")
}
