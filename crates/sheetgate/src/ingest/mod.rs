// Tabular ingestion pipeline — raw delimited text or values-API rows
// in, render-ready chart projection out.

pub mod amount;
pub mod csv;
pub mod infer;
pub mod project;
pub mod records;

pub use amount::{parse_amount, parse_amount_str};
pub use csv::{tokenize, tokenize_strict};
pub use infer::{classify_columns, select_axes, AxisSelection, ColumnKind};
pub use project::{project, CellValue, ChartProjection, ProjectedRecord};
pub use records::{normalize_rows, Record};
