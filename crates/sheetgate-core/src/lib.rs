#![doc = include_str!("../README.md")]

pub mod error;
pub mod logger;
pub mod options;
pub mod storage;
pub mod utils;

// Re-exports for convenience
pub use error::{ErrorCode, GateError, Result, SheetgateError};
pub use logger::{GateLogger, LogHandler, LogLevel, LoggerConfig};
pub use options::{
    FetchOptions, GateOptions, GateRoute, PipelineOptions, SaltMode, SheetgateOptions,
};
pub use storage::{MemoryTokenStore, TokenStore, TokenStoreError};
