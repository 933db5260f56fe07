// Apportion - Core Library
// Priority-method seat apportionment, exposed for the CLI and tests

pub mod error;
pub mod config;     // Run parameters + table format
pub mod registry;   // Entity Registry
pub mod allocator;  // Priority function + run loop
pub mod report;     // Result table rendering

// Re-export commonly used types
pub use error::{ApportionError, Result};
pub use config::{MeanMode, RunConfig, Settings, TableFormat, DEFAULT_TARGET_SEATS};
pub use registry::{Entity, Registry};
pub use allocator::{assign_next, divisor, priority, run, run_traced, Allocation, RunOutcome};
pub use report::{write_priority_list, Report, ReportRow};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
