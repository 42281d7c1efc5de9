use std::path::{Path, PathBuf};

use macadvisor::dataset::{FieldValue, RawRecord, Record, write_dataset};
use macadvisor::ml::{TrainOptions, TrainingReport, train};

pub struct Workspace {
    pub dataset: PathBuf,
    pub model: PathBuf,
}

impl Workspace {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            dataset: dir.join("mac_dataset.csv"),
            model: dir.join("model.bin"),
        }
    }

    pub fn train(&self, records: &[Record], options: &TrainOptions) -> TrainingReport {
        write_dataset(records, &self.dataset).expect("write dataset");
        train(&self.dataset, &self.model, options).expect("train")
    }
}

/// Build a raw record from `(column, value)` pairs; integer values become indicators.
pub fn raw(fields: &[(&str, &str)]) -> RawRecord {
    fields
        .iter()
        .map(|(column, value)| {
            let field = match value.parse::<u8>() {
                Ok(flag) => FieldValue::Indicator(flag),
                Err(_) => FieldValue::category(*value),
            };
            (column.to_string(), field)
        })
        .collect()
}

pub fn mac_leaning_profile() -> RawRecord {
    raw(&[
        ("role", "Designer"),
        ("uses_design_tools", "1"),
        ("uses_office_apps", "0"),
        ("requires_windows_only_apps", "0"),
        ("mobility", "high"),
        ("security_sensitivity", "low"),
        ("budget_sensitivity", "low"),
        ("preferred_os", "mac"),
    ])
}

pub fn windows_leaning_profile() -> RawRecord {
    raw(&[
        ("role", "Support"),
        ("uses_design_tools", "0"),
        ("uses_office_apps", "1"),
        ("requires_windows_only_apps", "1"),
        ("mobility", "low"),
        ("security_sensitivity", "low"),
        ("budget_sensitivity", "low"),
        ("preferred_os", "windows"),
    ])
}
