//! Shared types for the report pipeline.

use std::collections::HashMap;

use crate::config::{
    DEFAULT_COLUMNS, DEFAULT_CURRENT_DATE_FRAGMENTS, DEFAULT_CURRENT_FRAGMENT,
    DEFAULT_PLAN_FRAGMENT,
};

/// Name of the synthetic column appended to every output table.
pub const GAP_COLUMN: &str = "GAP";

/// Raw sheet values. Row 0 is the header row; rows may be ragged.
pub type RawTable = Vec<Vec<String>>;

// ── Column spec ─────────────────────────────────────────────────────

/// Which source columns end up in the report and how the two GAP operands
/// are located.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    /// Fixed source positions. The first one is the identifier column.
    pub positions: Vec<usize>,
    /// Header fragment locating the plan (target) column.
    pub plan_fragment: String,
    /// Header fragment locating the current headcount column.
    pub current_fragment: String,
    /// Extra fragments that also identify the current column. Header text
    /// for it changes every reporting period.
    pub current_date_fragments: Vec<String>,
    /// Position used when no header matches the plan fragment.
    pub plan_fallback: usize,
    /// Position used when no header matches the current fragments.
    pub current_fallback: usize,
    /// Headers containing any of these are never reported.
    pub excluded_markers: Vec<String>,
}

impl Default for ColumnSpec {
    fn default() -> Self {
        Self {
            positions: DEFAULT_COLUMNS.to_vec(),
            plan_fragment: DEFAULT_PLAN_FRAGMENT.to_string(),
            current_fragment: DEFAULT_CURRENT_FRAGMENT.to_string(),
            current_date_fragments: DEFAULT_CURRENT_DATE_FRAGMENTS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            plan_fallback: 2,
            current_fallback: 18,
            excluded_markers: vec!["peak hc".to_string(), "state".to_string()],
        }
    }
}

// ── Column resolution ───────────────────────────────────────────────

/// Outcome of locating a column by header text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnResolution {
    /// A header matched; `header` is its text.
    ByName { index: usize, header: String },
    /// Nothing matched and the hard-coded position was used. The column at
    /// this position may be the wrong one, or may not exist at all.
    Fallback { index: usize },
}

impl ColumnResolution {
    pub fn index(&self) -> usize {
        match self {
            Self::ByName { index, .. } | Self::Fallback { index } => *index,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }
}

// ── Output ──────────────────────────────────────────────────────────

/// A single report cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
}

impl CellValue {
    /// Numeric view of the cell, if it is a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(_) => None,
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

/// One report row keyed by output header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutputRow {
    values: HashMap<String, CellValue>,
}

impl OutputRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, header: impl Into<String>, value: impl Into<CellValue>) {
        self.values.insert(header.into(), value.into());
    }

    /// Builder-style `insert`.
    pub fn with(mut self, header: impl Into<String>, value: impl Into<CellValue>) -> Self {
        self.insert(header, value);
        self
    }

    pub fn get(&self, header: &str) -> Option<&CellValue> {
        self.values.get(header)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// GAP as used for ordering. Missing, textual or non-finite values sort
    /// as zero.
    pub fn gap(&self) -> f64 {
        self.get(GAP_COLUMN)
            .and_then(CellValue::as_number)
            .filter(|n| n.is_finite())
            .unwrap_or(0.0)
    }
}

/// Transform result: ordered headers and GAP-sorted rows.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputTable {
    /// Output headers, unique, always ending with `GAP`.
    pub headers: Vec<String>,
    pub rows: Vec<OutputRow>,
    /// How the plan column was found.
    pub plan: ColumnResolution,
    /// How the current headcount column was found.
    pub current: ColumnResolution,
}

impl OutputTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
