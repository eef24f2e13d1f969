//! Raw sheet values → GAP-sorted report table.

use std::cmp::Ordering;

use tracing::{debug, info, warn};

use crate::error::TransformError;
use crate::pipeline::columns::{resolve_current, resolve_plan, select_columns};
use crate::pipeline::types::{ColumnSpec, GAP_COLUMN, OutputRow, OutputTable};

/// Parse a cell as a number, absorbing anything unusable to zero.
///
/// Empty, non-numeric, NaN and infinite cells all become `0.0`. The report
/// has to render even when the source sheet is half filled in.
pub fn parse_numeric_or_zero(cell: &str) -> f64 {
    cell.trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .unwrap_or(0.0)
}

/// Stable sort, highest GAP first.
pub fn sort_by_gap_desc(rows: &mut [OutputRow]) {
    rows.sort_by(|a, b| b.gap().partial_cmp(&a.gap()).unwrap_or(Ordering::Equal));
}

fn is_blank_row(row: &[String]) -> bool {
    row.iter().all(|cell| cell.is_empty())
}

fn cell(row: &[String], index: usize) -> &str {
    row.get(index).map(String::as_str).unwrap_or("")
}

/// Project, compute GAP, and sort.
///
/// Fails only when there is no header or no data row at all.
pub fn transform(table: &[Vec<String>], spec: &ColumnSpec) -> Result<OutputTable, TransformError> {
    let Some((headers, data_rows)) = table.split_first().filter(|(_, rest)| !rest.is_empty())
    else {
        warn!(rows = table.len(), "Insufficient data to process");
        return Err(TransformError::EmptyInput { rows: table.len() });
    };

    info!("Filtering columns and calculating GAP");

    let plan = resolve_plan(headers, spec);
    let current = resolve_current(headers, spec);
    let columns = select_columns(headers, spec, &plan);

    let mut output_headers: Vec<String> = columns.iter().map(|c| c.header.clone()).collect();
    output_headers.push(GAP_COLUMN.to_string());

    info!(headers = ?output_headers, "Output headers resolved");
    debug!(
        plan_index = plan.index(),
        current_index = current.index(),
        data_rows = data_rows.len(),
        "Processing data rows"
    );

    let mut rows: Vec<OutputRow> = Vec::with_capacity(data_rows.len());
    for (offset, row) in data_rows.iter().enumerate() {
        if is_blank_row(row) {
            // Sheet row numbers are 1-based and row 1 is the header.
            debug!(sheet_row = offset + 2, "Skipping empty row");
            continue;
        }

        let mut out = OutputRow::new();
        for column in &columns {
            out.insert(column.header.as_str(), cell(row, column.index));
        }

        let plan_value = parse_numeric_or_zero(cell(row, plan.index()));
        let current_value = parse_numeric_or_zero(cell(row, current.index()));
        out.insert(GAP_COLUMN, plan_value - current_value);

        rows.push(out);
    }

    info!(
        processed = rows.len(),
        total = data_rows.len(),
        "Processed data rows"
    );
    if rows.is_empty() {
        warn!(
            first_row = ?data_rows.first(),
            "No data rows were processed; check that rows are not empty and column positions match the sheet"
        );
    }

    sort_by_gap_desc(&mut rows);

    Ok(OutputTable {
        headers: output_headers,
        rows,
        plan,
        current,
    })
}
