//! Writes a synthetic labeled dataset of hardware-recommendation records.

use std::path::PathBuf;

use macadvisor::config;
use macadvisor::dataset::{SampleSynthesizer, write_dataset};
use macadvisor::logging;

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
    let count = options.count.unwrap_or(settings.generate.count);
    let seed = options.seed.unwrap_or(settings.generate.seed);
    let out = options.out.unwrap_or(settings.dataset_path);

    let records = SampleSynthesizer::new(seed).generate(count);
    write_dataset(&records, &out).map_err(|err| err.to_string())?;
    let positives = records
        .iter()
        .filter(|record| record.recommend_mac == Some(true))
        .count();
    println!(
        "wrote {} records ({} recommend_mac=1) to {}",
        records.len(),
        positives,
        out.display()
    );
    Ok(())
}

#[derive(Debug, Default)]
struct CliOptions {
    count: Option<usize>,
    seed: Option<u64>,
    out: Option<PathBuf>,
    config: Option<PathBuf>,
}

fn parse_args(args: Vec<String>) -> Result<CliOptions, String> {
    let mut options = CliOptions::default();
    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "-h" | "--help" => return Err(help_text()),
            "--count" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--count requires a value".to_string())?;
                options.count = Some(
                    value
                        .parse::<usize>()
                        .map_err(|_| format!("Invalid --count value: {value}"))?,
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
            "--out" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--out requires a value".to_string())?;
                options.out = Some(PathBuf::from(value));
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
        "macadvisor-generate",
        "",
        "Writes a deterministic synthetic dataset for the Mac recommendation model.",
        "",
        "Usage:",
        "  macadvisor-generate [--count <n>] [--seed <n>] [--out <file>]",
        "",
        "Options:",
        "  --count <n>      Number of records (default: 2000).",
        "  --seed <n>       Random seed (default: 42).",
        "  --out <file>     Output CSV path (default: mac_dataset.csv).",
        "  --config <file>  Settings file (default: macadvisor.toml in the app directory).",
    ]
    .join("\n")
}
