//! Scores one employee profile against a saved model.

use std::path::PathBuf;

use macadvisor::config;
use macadvisor::dataset::{FieldValue, RawRecord};
use macadvisor::dataset::record::{
    BUDGET_SENSITIVITY, MOBILITY, PREFERRED_OS, REQUIRES_WINDOWS_ONLY_APPS, ROLE,
    SECURITY_SENSITIVITY, USES_DESIGN_TOOLS, USES_OFFICE_APPS,
};
use macadvisor::logging;
use macadvisor::ml::{ExplainOptions, ImportanceReport, PredictionService, SharedPipeline, explain};

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
    let model_path = options.model.unwrap_or(settings.model_path.clone());
    let dataset_path = options.dataset.unwrap_or(settings.dataset_path.clone());

    let shared = SharedPipeline::new(model_path);
    let service = PredictionService::from_shared(&shared).map_err(|err| err.to_string())?;
    let result = service.predict(&options.input).map_err(|err| err.to_string())?;

    println!("probability: {:.1}%", result.probability * 100.0);
    if result.recommends_mac() {
        println!("recommendation: Mac");
    } else {
        println!("recommendation: not a Mac");
    }
    if options.no_explain {
        return Ok(());
    }

    let explain_options = ExplainOptions::from(&settings.explain);
    match explain(&dataset_path, service.pipeline(), &explain_options) {
        ImportanceReport::Available(entries) => {
            println!("top features (mean accuracy drop when shuffled):");
            for entry in entries {
                println!("  {:<32} {:+.4}", entry.feature, entry.importance);
            }
        }
        ImportanceReport::Unavailable { reason } => {
            println!("importances unavailable: {reason}");
        }
    }
    Ok(())
}

#[derive(Debug)]
struct CliOptions {
    model: Option<PathBuf>,
    dataset: Option<PathBuf>,
    config: Option<PathBuf>,
    input: RawRecord,
    no_explain: bool,
}

fn parse_args(args: Vec<String>) -> Result<CliOptions, String> {
    let mut model = None;
    let mut dataset = None;
    let mut config = None;
    let mut json_input: Option<RawRecord> = None;
    let mut fields = RawRecord::new();
    let mut no_explain = false;

    let mut idx = 0usize;
    while idx < args.len() {
        let flag = args[idx].as_str();
        match flag {
            "-h" | "--help" => return Err(help_text()),
            "--no-explain" => no_explain = true,
            "--model" | "--dataset" | "--config" | "--input" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| format!("{flag} requires a value"))?;
                match flag {
                    "--model" => model = Some(PathBuf::from(value)),
                    "--dataset" => dataset = Some(PathBuf::from(value)),
                    "--config" => config = Some(PathBuf::from(value)),
                    _ => {
                        json_input = Some(
                            serde_json::from_str(value)
                                .map_err(|err| format!("Invalid --input JSON: {err}"))?,
                        )
                    }
                }
            }
            _ => {
                let Some(column) = column_for_flag(flag) else {
                    return Err(format!("Unknown argument: {flag}\n\n{}", help_text()));
                };
                idx += 1;
                let value = args.get(idx).ok_or_else(|| format!("{flag} requires a value"))?;
                let field = if is_indicator(column) {
                    parse_indicator(flag, value)?
                } else {
                    FieldValue::category(value.as_str())
                };
                fields.insert(column, field);
            }
        }
        idx += 1;
    }

    let input = match json_input {
        Some(_) if !fields.is_empty() => {
            return Err("Use either --input or individual field flags, not both".to_string());
        }
        Some(input) => input,
        None if fields.is_empty() => return Err(help_text()),
        None => fields,
    };
    Ok(CliOptions {
        model,
        dataset,
        config,
        input,
        no_explain,
    })
}

fn column_for_flag(flag: &str) -> Option<&'static str> {
    match flag {
        "--role" => Some(ROLE),
        "--design" => Some(USES_DESIGN_TOOLS),
        "--office" => Some(USES_OFFICE_APPS),
        "--windows-only" => Some(REQUIRES_WINDOWS_ONLY_APPS),
        "--mobility" => Some(MOBILITY),
        "--security" => Some(SECURITY_SENSITIVITY),
        "--budget" => Some(BUDGET_SENSITIVITY),
        "--os" => Some(PREFERRED_OS),
        _ => None,
    }
}

fn is_indicator(column: &str) -> bool {
    matches!(
        column,
        USES_DESIGN_TOOLS | USES_OFFICE_APPS | REQUIRES_WINDOWS_ONLY_APPS
    )
}

fn parse_indicator(flag: &str, value: &str) -> Result<FieldValue, String> {
    match value {
        "0" | "false" => Ok(FieldValue::indicator(false)),
        "1" | "true" => Ok(FieldValue::indicator(true)),
        _ => Err(format!("Invalid {flag} value: {value} (expected 0 or 1)")),
    }
}

fn help_text() -> String {
    [
        "macadvisor-predict",
        "",
        "Predicts whether a Mac should be recommended for one employee profile.",
        "",
        "Usage:",
        "  macadvisor-predict --input '<json object>' [options]",
        "  macadvisor-predict --role <role> --design 0|1 --office 0|1 --windows-only 0|1 \\",
        "                     --mobility <level> --security <level> --budget <level> --os <os> [options]",
        "",
        "Fields:",
        "  --role           Developer, Designer, Marketing, Management, Support or DataScientist.",
        "  --mobility, --security, --budget   low, medium or high.",
        "  --os             mac, windows, linux or none.",
        "",
        "Options:",
        "  --model <file>    Model artifact (default: model.bin).",
        "  --dataset <file>  Dataset used for feature importances (default: mac_dataset.csv).",
        "  --no-explain      Skip the feature importance report.",
        "  --config <file>   Settings file (default: macadvisor.toml in the app directory).",
    ]
    .join("\n")
}
