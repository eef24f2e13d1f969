//! Column resolution against an unstable header row.
//!
//! The sheet layout shifts between reporting periods, so the two GAP operands
//! are found by header text first and only then by a hard-coded position.
//! The retained columns come from a fixed position list, minus anything
//! carrying an exclusion marker.

use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::pipeline::types::{ColumnResolution, ColumnSpec, GAP_COLUMN};

/// A retained source column: output header and source position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedColumn {
    pub header: String,
    pub index: usize,
}

/// Find the first non-empty header containing any fragment
/// (case-insensitive), else fall back to `fallback`.
pub fn resolve_column<S: AsRef<str>>(
    headers: &[String],
    fragments: &[S],
    fallback: usize,
) -> ColumnResolution {
    let needles: Vec<String> = fragments
        .iter()
        .map(|f| f.as_ref().trim().to_lowercase())
        .filter(|f| !f.is_empty())
        .collect();

    headers
        .iter()
        .enumerate()
        .filter(|(_, header)| !header.is_empty())
        .find(|(_, header)| {
            let lower = header.to_lowercase();
            needles.iter().any(|needle| lower.contains(needle.as_str()))
        })
        .map(|(index, header)| ColumnResolution::ByName {
            index,
            header: header.clone(),
        })
        .unwrap_or(ColumnResolution::Fallback { index: fallback })
}

/// Locate the plan column.
pub fn resolve_plan(headers: &[String], spec: &ColumnSpec) -> ColumnResolution {
    let resolution = resolve_column(
        headers,
        std::slice::from_ref(&spec.plan_fragment),
        spec.plan_fallback,
    );
    log_resolution("plan", &spec.plan_fragment, headers, &resolution);
    resolution
}

/// Locate the current headcount column, by name or by date fragment.
pub fn resolve_current(headers: &[String], spec: &ColumnSpec) -> ColumnResolution {
    let fragments: Vec<&str> = std::iter::once(spec.current_fragment.as_str())
        .chain(spec.current_date_fragments.iter().map(String::as_str))
        .collect();
    let resolution = resolve_column(headers, &fragments, spec.current_fallback);
    log_resolution("current", &spec.current_fragment, headers, &resolution);
    resolution
}

fn log_resolution(role: &str, fragment: &str, headers: &[String], resolution: &ColumnResolution) {
    match resolution {
        ColumnResolution::ByName { index, header } => {
            info!(role, index, header = %header, "Resolved column by header");
        }
        ColumnResolution::Fallback { index } => {
            let preview: Vec<&str> = headers.iter().take(10).map(String::as_str).collect();
            warn!(
                role,
                fragment,
                index,
                available = ?preview,
                "No header matched; using default column position"
            );
        }
    }
}

/// Whether a header carries an exclusion marker (case-insensitive).
pub fn is_excluded(header: &str, spec: &ColumnSpec) -> bool {
    let lower = header.to_lowercase();
    spec.excluded_markers
        .iter()
        .map(|m| m.to_lowercase())
        .filter(|m| !m.is_empty())
        .any(|m| lower.contains(&m))
}

/// Build the ordered retained column list (GAP not included).
///
/// Order: identifier column, plan column, remaining fixed positions. Header
/// texts are unique; the first occurrence wins.
pub fn select_columns(
    headers: &[String],
    spec: &ColumnSpec,
    plan: &ColumnResolution,
) -> Vec<SelectedColumn> {
    let plan_index = plan.index();
    let mut selected: Vec<SelectedColumn> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    let mut push = |header: &str, index: usize| {
        if seen.insert(header.to_string()) {
            selected.push(SelectedColumn {
                header: header.to_string(),
                index,
            });
        }
    };

    // Identifier column
    if let Some(&first) = spec.positions.first()
        && first != plan_index
        && let Some(header) = headers.get(first)
        && !is_excluded(header, spec)
        && header != GAP_COLUMN
    {
        push(header, first);
    }

    // Plan column, directly after the identifier
    if let Some(header) = headers.get(plan_index)
        && !header.is_empty()
        && header != GAP_COLUMN
    {
        push(header, plan_index);
    }

    for &index in spec.positions.iter().skip(1) {
        if index == plan_index {
            continue;
        }
        let Some(header) = headers.get(index) else {
            debug!(index, "Column position beyond header row; skipping");
            continue;
        };
        if is_excluded(header, spec) {
            info!(index, header = %header, "Skipping excluded column");
            continue;
        }
        if header == GAP_COLUMN {
            debug!(index, "Source GAP column replaced by computed GAP");
            continue;
        }
        push(header, index);
    }

    // Final pass: the plan header bypasses the marker check above.
    selected.retain(|column| !is_excluded(&column.header, spec));
    selected
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn spec(positions: &[usize]) -> ColumnSpec {
        ColumnSpec {
            positions: positions.to_vec(),
            ..ColumnSpec::default()
        }
    }

    // ── resolve_column ──────────────────────────────────────────────

    #[test]
    fn resolve_by_substring_case_insensitive() {
        let h = headers(&["Hub Name", "State", "fe aop (dec)", "FE AOP"]);
        let r = resolve_column(&h, &["FE AOP"], 2);
        assert_eq!(
            r,
            ColumnResolution::ByName {
                index: 2,
                header: "fe aop (dec)".into()
            }
        );
    }

    #[test]
    fn resolve_falls_back_when_missing() {
        let h = headers(&["Hub Name", "State"]);
        assert_eq!(
            resolve_column(&h, &["FE AOP"], 2),
            ColumnResolution::Fallback { index: 2 }
        );
    }

    #[test]
    fn resolve_skips_empty_headers_and_fragments() {
        let h = headers(&["", "Hub"]);
        assert_eq!(
            resolve_column(&h, &[""], 7),
            ColumnResolution::Fallback { index: 7 }
        );
    }

    #[test]
    fn current_matches_exact_name() {
        let h = headers(&["Hub", "4D Active (30th)", "Latest"]);
        let r = resolve_current(&h, &ColumnSpec::default());
        assert_eq!(r.index(), 1);
        assert!(!r.is_fallback());
    }

    #[test]
    fn current_matches_date_fragment() {
        let h = headers(&["Hub", "FE AOP", "Latest HC (30/11/2025)"]);
        let r = resolve_current(&h, &ColumnSpec::default());
        assert_eq!(
            r,
            ColumnResolution::ByName {
                index: 2,
                header: "Latest HC (30/11/2025)".into()
            }
        );
    }

    #[test]
    fn current_first_match_wins() {
        let h = headers(&["Hub", "Joined 30TH", "4D Active (30th)"]);
        assert_eq!(resolve_current(&h, &ColumnSpec::default()).index(), 1);
    }

    #[test]
    fn current_falls_back_to_18() {
        let h = headers(&["Hub", "FE AOP"]);
        assert_eq!(
            resolve_current(&h, &ColumnSpec::default()),
            ColumnResolution::Fallback { index: 18 }
        );
    }

    // ── select_columns ──────────────────────────────────────────────

    #[test]
    fn plan_follows_identifier() {
        let h = headers(&["Hub", "State", "Peak HC", "A", "B", "FE AOP"]);
        let s = spec(&[0, 3, 4]);
        let plan = resolve_plan(&h, &s);
        let names: Vec<String> = select_columns(&h, &s, &plan)
            .into_iter()
            .map(|c| c.header)
            .collect();
        assert_eq!(names, vec!["Hub", "FE AOP", "A", "B"]);
    }

    #[test]
    fn excluded_markers_dropped_from_fixed_list() {
        let h = headers(&["Hub", "State", "Peak HC", "FE AOP", "Zone STATE code"]);
        let s = spec(&[0, 1, 2, 4]);
        let plan = resolve_plan(&h, &s);
        let names: Vec<String> = select_columns(&h, &s, &plan)
            .into_iter()
            .map(|c| c.header)
            .collect();
        assert_eq!(names, vec!["Hub", "FE AOP"]);
    }

    #[test]
    fn plan_not_duplicated_when_in_fixed_list() {
        let h = headers(&["Hub", "X", "FE AOP"]);
        let s = spec(&[0, 2, 1]);
        let plan = resolve_plan(&h, &s);
        let cols = select_columns(&h, &s, &plan);
        assert_eq!(
            cols,
            vec![
                SelectedColumn {
                    header: "Hub".into(),
                    index: 0
                },
                SelectedColumn {
                    header: "FE AOP".into(),
                    index: 2
                },
                SelectedColumn {
                    header: "X".into(),
                    index: 1
                },
            ]
        );
    }

    #[test]
    fn fallback_plan_beyond_header_row_omitted() {
        let h = headers(&["Hub", "A"]);
        let s = spec(&[0, 1]);
        let plan = ColumnResolution::Fallback { index: 2 };
        let names: Vec<String> = select_columns(&h, &s, &plan)
            .into_iter()
            .map(|c| c.header)
            .collect();
        assert_eq!(names, vec!["Hub", "A"]);
    }

    #[test]
    fn fallback_plan_with_peak_marker_removed_in_final_pass() {
        let h = headers(&["Hub", "State", "Peak HC", "A"]);
        let s = spec(&[0, 3]);
        let plan = resolve_plan(&h, &s);
        assert!(plan.is_fallback());
        let names: Vec<String> = select_columns(&h, &s, &plan)
            .into_iter()
            .map(|c| c.header)
            .collect();
        assert_eq!(names, vec!["Hub", "A"]);
    }

    #[test]
    fn duplicate_header_text_keeps_first() {
        let h = headers(&["Hub", "FE AOP", "Total", "Total"]);
        let s = spec(&[0, 2, 3]);
        let plan = resolve_plan(&h, &s);
        let cols = select_columns(&h, &s, &plan);
        assert_eq!(cols.len(), 3);
        assert_eq!(cols[2].index, 2);
    }

    #[test]
    fn positions_beyond_headers_ignored() {
        let h = headers(&["Hub", "FE AOP"]);
        let s = spec(&[0, 18, 19, 20]);
        let plan = resolve_plan(&h, &s);
        assert_eq!(select_columns(&h, &s, &plan).len(), 2);
    }

    #[test]
    fn source_gap_column_not_retained() {
        let h = headers(&["Hub", "FE AOP", "GAP"]);
        let s = spec(&[0, 2]);
        let plan = resolve_plan(&h, &s);
        let names: Vec<String> = select_columns(&h, &s, &plan)
            .into_iter()
            .map(|c| c.header)
            .collect();
        assert_eq!(names, vec!["Hub", "FE AOP"]);
    }

    #[test]
    fn identifier_that_is_plan_comes_once() {
        let h = headers(&["FE AOP", "A"]);
        let s = spec(&[0, 1]);
        let plan = resolve_plan(&h, &s);
        let names: Vec<String> = select_columns(&h, &s, &plan)
            .into_iter()
            .map(|c| c.header)
            .collect();
        assert_eq!(names, vec!["FE AOP", "A"]);
    }

    #[test]
    fn excluded_marker_check() {
        let s = ColumnSpec::default();
        assert!(is_excluded("Peak HC", &s));
        assert!(is_excluded("PEAK HC (Nov)", &s));
        assert!(is_excluded("state", &s));
        assert!(!is_excluded("Hub Name", &s));
    }
}
