//! Writes a run's records to a timestamped JSONL or CSV file.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Utc};
use offscrape_core::{OutputFormat, ProductRecord};
use serde_json::Value;

/// CSV column order consumed by the cleaning stage.
pub(crate) const CSV_COLUMNS: [&str; 17] = [
    "nom",
    "nom_générique",
    "brands_tags",
    "marque",
    "prix",
    "image",
    "score_nutritionnel",
    "nutriments",
    "poids_unité",
    "pays_origine",
    "fabricant",
    "pays_commercialisation",
    "distributeur",
    "code_barres",
    "date_peremption",
    "source",
    "index",
];

/// `<dir>/products_<UTC timestamp>.<ext>`.
pub(crate) fn output_path(dir: &Path, format: OutputFormat, now: DateTime<Utc>) -> PathBuf {
    dir.join(format!(
        "products_{}.{}",
        now.format("%Y%m%d_%H%M%S"),
        format.extension()
    ))
}

/// Creates `dir` if needed and writes every record. An empty slice still
/// produces a file.
///
/// # Errors
///
/// Returns an error if the directory or file cannot be created or written.
pub(crate) fn write_records(
    records: &[ProductRecord],
    format: OutputFormat,
    dir: &Path,
) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("cannot create output directory {}", dir.display()))?;

    let path = output_path(dir, format, Utc::now());
    let file =
        File::create(&path).with_context(|| format!("cannot create {}", path.display()))?;
    let writer = BufWriter::new(file);

    match format {
        OutputFormat::Jsonl => write_jsonl(writer, records)?,
        OutputFormat::Csv => write_csv(writer, records)?,
    }
    Ok(path)
}

pub(crate) fn write_jsonl<W: Write>(
    mut writer: W,
    records: &[ProductRecord],
) -> anyhow::Result<()> {
    for record in records {
        serde_json::to_writer(&mut writer, record)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

pub(crate) fn write_csv<W: Write>(writer: W, records: &[ProductRecord]) -> anyhow::Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(CSV_COLUMNS)?;

    for record in records {
        let value = serde_json::to_value(record)?;
        let row: Vec<String> = CSV_COLUMNS
            .iter()
            .map(|column| csv_cell(value.get(*column)))
            .collect();
        csv.write_record(&row)?;
    }
    csv.flush()?;
    Ok(())
}

/// Strings verbatim, absent values empty, lists and objects as JSON.
fn csv_cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
