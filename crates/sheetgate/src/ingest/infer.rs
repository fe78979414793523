// Column type inference — classifies columns over a leading sample and
// picks chart axes.

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use sheetgate_core::error::GateError;

use super::records::Record;

/// Classification of one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ColumnKind {
    Numeric,
    DateLike,
    Categorical,
}

/// Classify every column of a dataset.
///
/// Samples the first `min(sample_size, N)` records. A column is
/// `DateLike` if any sampled value parses as a date without also being
/// a plain number (so numeric strings are never misread as dates),
/// `Numeric` if every sampled value is empty or a finite number, and
/// `Categorical` otherwise.
pub fn classify_columns(
    records: &[Record],
    sample_size: usize,
) -> Result<IndexMap<String, ColumnKind>, GateError> {
    if records.is_empty() {
        return Err(GateError::no_data());
    }

    let sample = &records[..records.len().min(sample_size.max(1))];
    let mut kinds = IndexMap::new();

    for key in records[0].keys() {
        let values = || {
            sample
                .iter()
                .map(|r| r.get(key).map(String::as_str).unwrap_or(""))
        };

        let date_like = values().any(|v| {
            let v = v.trim();
            !v.is_empty() && parse_date(v).is_some() && !is_finite_number(v)
        });

        let kind = if date_like {
            ColumnKind::DateLike
        } else if values().all(|v| v.trim().is_empty() || is_finite_number(v)) {
            ColumnKind::Numeric
        } else {
            ColumnKind::Categorical
        };
        kinds.insert(key.clone(), kind);
    }

    Ok(kinds)
}

/// The axes chosen for a projection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AxisSelection {
    pub x_key: String,
    pub y_keys: Vec<String>,
    pub categorical_keys: Vec<String>,
}

/// Pick chart axes from a classification map.
///
/// X-axis preference: a `DateLike` column, else a `Categorical` column,
/// else the first column. Y-axis candidates are the `Numeric` columns
/// in original order, excluding the x-axis, capped at `max_series` —
/// unless that leaves nothing and the x-axis itself is numeric.
pub fn select_axes(kinds: &IndexMap<String, ColumnKind>, max_series: usize) -> AxisSelection {
    let first_of = |kind: ColumnKind| {
        kinds
            .iter()
            .find(|(_, k)| **k == kind)
            .map(|(key, _)| key.clone())
    };

    let x_key = first_of(ColumnKind::DateLike)
        .or_else(|| first_of(ColumnKind::Categorical))
        .or_else(|| kinds.keys().next().cloned())
        .unwrap_or_default();

    let mut y_keys: Vec<String> = kinds
        .iter()
        .filter(|(key, kind)| **kind == ColumnKind::Numeric && **key != x_key)
        .map(|(key, _)| key.clone())
        .take(max_series)
        .collect();

    if y_keys.is_empty() && kinds.get(&x_key) == Some(&ColumnKind::Numeric) {
        y_keys.push(x_key.clone());
    }

    let categorical_keys = kinds
        .iter()
        .filter(|(_, kind)| **kind == ColumnKind::Categorical)
        .map(|(key, _)| key.clone())
        .collect();

    AxisSelection {
        x_key,
        y_keys,
        categorical_keys,
    }
}

pub(crate) fn is_finite_number(value: &str) -> bool {
    value
        .trim()
        .parse::<f64>()
        .map(|n| n.is_finite())
        .unwrap_or(false)
}

const DATE_FORMATS: [&str; 7] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%b %d, %Y",
    "%d %b %Y",
];

/// Try to read a calendar date out of a cell.
pub(crate) fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(value) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.date());
    }
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
}
