//! Report pipeline.
//!
//! One pass per run:
//! 1. `SheetSource::fetch()`: raw cells
//! 2. `transform()`: column selection, GAP, sort
//! 3. `render_report()`: HTML document
//! 4. `EmailNotifier::deliver()`: email to the roster

pub mod columns;
pub mod processor;
pub mod transform;
pub mod types;

pub use processor::{ReportRunner, RunOutcome, StopReason};
pub use transform::{parse_numeric_or_zero, transform};
