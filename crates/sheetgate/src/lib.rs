// sheetgate — main library crate
//
// Wires together crypto, token management, the gate state machine, the
// remote auth client, spreadsheet fetching, and the ingestion pipeline.

pub mod client;
pub mod crypto;
pub mod fetch;
pub mod gate;
pub mod ingest;
pub mod token;

// Re-exports for convenience
pub use client::{AuthClient, IssuedToken};
pub use fetch::{FetchCoordinator, RefreshHandle, SheetFetcher, SheetSource};
pub use gate::{GateSession, GateState, Navigation};
pub use ingest::amount::{parse_amount, parse_amount_str};
pub use ingest::infer::ColumnKind;
pub use ingest::project::{CellValue, ChartProjection};
pub use ingest::records::Record;
pub use token::{AuthSession, TokenManager};
