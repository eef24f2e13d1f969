//! HTML report rendering.

pub mod format;
pub mod html;

pub use html::{GapClass, render_report};

use chrono::NaiveDate;

/// Date as shown in the report header and email subject (`DD-MM-YYYY`).
pub fn format_report_date(date: NaiveDate) -> String {
    date.format("%d-%m-%Y").to_string()
}
