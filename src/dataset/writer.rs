use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::info;

use super::DatasetError;
use super::record::{FEATURE_COLUMNS, LABEL_COLUMN, Record};

/// Write records as CSV with a header row, replacing any existing file.
///
/// Unlabeled records get an empty label cell.
pub fn write_dataset(records: &[Record], path: &Path) -> Result<(), DatasetError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| DatasetError::io(parent, source))?;
    }
    let file = File::create(path).map_err(|source| DatasetError::io(path, source))?;
    let mut writer = BufWriter::new(file);
    write_records(&mut writer, records)
        .and_then(|_| writer.flush())
        .map_err(|source| DatasetError::io(path, source))?;
    info!("Wrote {} rows to {}", records.len(), path.display());
    Ok(())
}

/// Serialize records into any writer using the dataset CSV layout.
pub fn write_records<W: Write>(out: &mut W, records: &[Record]) -> std::io::Result<()> {
    writeln!(out, "{},{LABEL_COLUMN}", FEATURE_COLUMNS.join(","))?;
    for record in records {
        let label = match record.recommend_mac {
            Some(value) => indicator(value),
            None => "",
        };
        writeln!(
            out,
            "{},{},{},{},{},{},{},{},{}",
            record.role,
            indicator(record.uses_design_tools),
            indicator(record.uses_office_apps),
            indicator(record.requires_windows_only_apps),
            record.mobility,
            record.security_sensitivity,
            record.budget_sensitivity,
            record.preferred_os,
            label,
        )?;
    }
    Ok(())
}

fn indicator(value: bool) -> &'static str {
    if value { "1" } else { "0" }
}
