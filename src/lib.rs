//! Headcount report: spreadsheet to GAP table to email.

pub mod channels;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod report;
pub mod sheets;
