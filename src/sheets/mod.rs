//! Spreadsheet source.
//!
//! The runner only sees `SheetSource`; `SheetsClient` is the production
//! implementation against the Sheets REST API.

pub mod api;
pub mod client;

pub use client::SheetsClient;

use async_trait::async_trait;

use crate::error::SourceError;
use crate::pipeline::types::RawTable;

/// Something that yields the raw report table.
///
/// Implementations fail loudly: any fetch problem is an error, never a
/// partially filled table. An empty range is `Ok` with an empty table.
#[async_trait]
pub trait SheetSource: Send + Sync {
    async fn fetch(&self) -> Result<RawTable, SourceError>;
}
