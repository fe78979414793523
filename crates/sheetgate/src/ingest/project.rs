// Chart data projector — the coercion pass that turns normalized
// records plus a classification into a render-ready projection.

use indexmap::IndexMap;
use serde::Serialize;

use sheetgate_core::error::GateError;
use sheetgate_core::options::PipelineOptions;

use super::amount;
use super::infer::{self, ColumnKind};
use super::records::Record;

/// A coerced cell: numeric columns become numbers, everything else is
/// display text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
}

/// One coerced row, key order preserved.
pub type ProjectedRecord = IndexMap<String, CellValue>;

/// A render-ready dataset view. Replaced wholesale on every refetch or
/// reconfiguration, never mutated in place.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartProjection {
    pub records: Vec<ProjectedRecord>,
    pub x_key: String,
    pub y_keys: Vec<String>,
    pub categorical_keys: Vec<String>,
}

/// Build a projection from normalized records.
///
/// Classifies columns, picks axes, then coerces: numeric cells through
/// the amount parser, date cells reformatted for display, and rows
/// whose x-axis value is empty dropped entirely.
pub fn project(
    records: &[Record],
    options: &PipelineOptions,
) -> Result<ChartProjection, GateError> {
    let kinds = infer::classify_columns(records, options.sample_size)?;
    let axes = infer::select_axes(&kinds, options.max_series);

    let mut projected = Vec::with_capacity(records.len());
    for record in records {
        let x_raw = record.get(&axes.x_key).map(String::as_str).unwrap_or("");
        if x_raw.trim().is_empty() {
            continue;
        }

        let mut row: ProjectedRecord = IndexMap::with_capacity(record.len());
        for (key, value) in record {
            let cell = match kinds.get(key) {
                Some(ColumnKind::Numeric) => CellValue::Number(amount::parse_amount_str(value)),
                Some(ColumnKind::DateLike) => CellValue::Text(format_date(value)),
                _ => CellValue::Text(value.clone()),
            };
            row.insert(key.clone(), cell);
        }
        projected.push(row);
    }

    Ok(ChartProjection {
        records: projected,
        x_key: axes.x_key,
        y_keys: axes.y_keys,
        categorical_keys: axes.categorical_keys,
    })
}

/// Reformat a date-like cell for display; cells that fail to parse are
/// passed through untouched.
fn format_date(raw: &str) -> String {
    match infer::parse_date(raw) {
        Some(date) => date.format("%b %-d, %Y").to_string(),
        None => raw.to_string(),
    }
}
