// Row normalizer — turns tokenized rows into header-keyed records.

use indexmap::IndexMap;

use sheetgate_core::error::GateError;

/// One normalized data row. Key order follows the original header
/// order; keys map to raw cell strings, possibly empty.
pub type Record = IndexMap<String, String>;

/// Normalize tokenized rows into records.
///
/// Requires a header row plus at least one data row after all-blank
/// rows are dropped. Headers are trimmed and stripped of stray quote
/// characters; missing trailing fields default to the empty string and
/// surplus fields beyond the header width are ignored.
pub fn normalize_rows(rows: &[Vec<String>]) -> Result<Vec<Record>, GateError> {
    let non_blank: Vec<&Vec<String>> = rows.iter().filter(|row| !is_blank(row)).collect();
    if non_blank.len() < 2 {
        return Err(GateError::malformed_input(
            "expected a header row and at least one data row",
        ));
    }

    let headers: Vec<String> = non_blank[0]
        .iter()
        .map(|h| strip_quotes(h.trim()).to_string())
        .collect();

    let records = non_blank[1..]
        .iter()
        .map(|row| {
            headers
                .iter()
                .enumerate()
                .map(|(i, header)| (header.clone(), row.get(i).cloned().unwrap_or_default()))
                .collect::<Record>()
        })
        .collect();

    Ok(records)
}

fn is_blank(row: &[String]) -> bool {
    row.iter().all(|cell| cell.trim().is_empty())
}

fn strip_quotes(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::csv::tokenize;

    #[test]
    fn test_recovers_all_data_rows() {
        let rows = tokenize("date,sales\n2024-01-01,100\n2024-01-02,200\n");
        let records = normalize_rows(&rows).unwrap();
        assert_eq!(records.len(), 2);
        let keys: Vec<&String> = records[0].keys().collect();
        assert_eq!(keys, ["date", "sales"]);
        assert_eq!(records[1]["sales"], "200");
    }

    #[test]
    fn test_blank_rows_dropped() {
        let rows = tokenize("a,b\n1,2\n,\n  , \n3,4");
        let records = normalize_rows(&rows).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1]["a"], "3");
    }

    #[test]
    fn test_header_only_rejected() {
        let rows = tokenize("a,b\n");
        let err = normalize_rows(&rows).unwrap_err();
        assert_eq!(err.code, sheetgate_core::ErrorCode::MalformedInput);
    }

    #[test]
    fn test_header_trimmed_and_unquoted() {
        let rows = vec![
            vec!["\" name \"".to_string(), " age".to_string()],
            vec!["ada".to_string(), "36".to_string()],
        ];
        let records = normalize_rows(&rows).unwrap();
        let keys: Vec<&String> = records[0].keys().collect();
        assert_eq!(keys, [" name ", "age"]);
    }

    #[test]
    fn test_missing_trailing_fields_default_empty() {
        let rows = tokenize("a,b,c\n1,2");
        let records = normalize_rows(&rows).unwrap();
        assert_eq!(records[0]["c"], "");
    }

    #[test]
    fn test_surplus_fields_ignored() {
        let rows = tokenize("a,b\n1,2,3,4");
        let records = normalize_rows(&rows).unwrap();
        assert_eq!(records[0].len(), 2);
    }

    #[test]
    fn test_key_order_follows_headers() {
        let rows = tokenize("z,m,a\n1,2,3");
        let records = normalize_rows(&rows).unwrap();
        let keys: Vec<&String> = records[0].keys().collect();
        assert_eq!(keys, ["z", "m", "a"]);
    }
}
