//! Wire types for the Sheets v4 REST API and the pure helpers around them.

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::config::SheetSelector;
use crate::error::SourceError;
use crate::pipeline::types::RawTable;

/// `GET /spreadsheets/{id}?fields=sheets.properties`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpreadsheetMeta {
    #[serde(default)]
    pub sheets: Vec<Sheet>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Sheet {
    pub properties: SheetProperties,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetProperties {
    /// Zero is omitted on the wire.
    #[serde(default)]
    pub sheet_id: u64,
    pub title: String,
}

/// `GET /spreadsheets/{id}/values/{range}`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueRange {
    #[serde(default)]
    pub range: Option<String>,
    /// Absent when the range holds no data.
    #[serde(default)]
    pub values: Vec<Vec<Value>>,
}

impl SpreadsheetMeta {
    pub fn properties(&self) -> Vec<SheetProperties> {
        self.sheets.iter().map(|s| s.properties.clone()).collect()
    }
}

impl ValueRange {
    /// Convert to a raw table of text cells.
    pub fn into_table(self) -> RawTable {
        self.values
            .iter()
            .map(|row| row.iter().map(cell_text).collect())
            .collect()
    }
}

/// Text form of a cell. Formatted values arrive as strings already; other
/// JSON scalars are stringified and nulls become empty.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Sheet-qualified A1 reference, e.g. `'South ODH'!A1:V23`.
pub fn a1_reference(title: &str, range: &str) -> String {
    format!("'{}'!{}", title.replace('\'', "''"), range)
}

/// Pick the sheet to read.
///
/// A name must exist. An id that is unparseable or unknown falls back to the
/// first sheet with a warning.
pub fn resolve_sheet<'a>(
    sheets: &'a [SheetProperties],
    selector: &SheetSelector,
    spreadsheet_id: &str,
) -> Result<&'a SheetProperties, SourceError> {
    let first = move || {
        sheets.first().ok_or_else(|| SourceError::NoSheets {
            spreadsheet_id: spreadsheet_id.to_string(),
        })
    };

    match selector {
        SheetSelector::Name(name) => sheets
            .iter()
            .find(|s| s.title == *name)
            .ok_or_else(|| SourceError::SheetNotFound {
                spreadsheet_id: spreadsheet_id.to_string(),
                name: name.clone(),
            }),
        SheetSelector::Id(raw) => {
            let found = raw
                .trim()
                .parse::<u64>()
                .ok()
                .and_then(|id| sheets.iter().find(|s| s.sheet_id == id));
            match found {
                Some(sheet) => Ok(sheet),
                None => {
                    let titles: Vec<&str> = sheets.iter().map(|s| s.title.as_str()).collect();
                    let sheet = first()?;
                    warn!(
                        sheet_id = %raw,
                        available = ?titles,
                        fallback = %sheet.title,
                        "Could not find sheet by id; using first sheet"
                    );
                    Ok(sheet)
                }
            }
        }
        SheetSelector::First => first(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheets() -> Vec<SheetProperties> {
        vec![
            SheetProperties {
                sheet_id: 0,
                title: "Summary".into(),
            },
            SheetProperties {
                sheet_id: 851267488,
                title: "South ODH".into(),
            },
        ]
    }

    #[test]
    fn resolve_by_id() {
        let s = sheets();
        let sel = SheetSelector::Id("851267488".into());
        assert_eq!(resolve_sheet(&s, &sel, "x").unwrap().title, "South ODH");
    }

    #[test]
    fn unknown_id_falls_back_to_first() {
        let s = sheets();
        let sel = SheetSelector::Id("42".into());
        assert_eq!(resolve_sheet(&s, &sel, "x").unwrap().title, "Summary");
    }

    #[test]
    fn unparseable_id_falls_back_to_first() {
        let s = sheets();
        let sel = SheetSelector::Id("gid=abc".into());
        assert_eq!(resolve_sheet(&s, &sel, "x").unwrap().title, "Summary");
    }

    #[test]
    fn resolve_by_name() {
        let s = sheets();
        let sel = SheetSelector::Name("South ODH".into());
        assert_eq!(resolve_sheet(&s, &sel, "x").unwrap().sheet_id, 851267488);
    }

    #[test]
    fn unknown_name_is_error() {
        let s = sheets();
        let sel = SheetSelector::Name("North".into());
        assert!(matches!(
            resolve_sheet(&s, &sel, "x"),
            Err(SourceError::SheetNotFound { .. })
        ));
    }

    #[test]
    fn no_sheets_is_error() {
        let sel = SheetSelector::Id("1".into());
        assert!(matches!(
            resolve_sheet(&[], &sel, "x"),
            Err(SourceError::NoSheets { .. })
        ));
        assert!(resolve_sheet(&[], &SheetSelector::First, "x").is_err());
    }

    #[test]
    fn a1_reference_quotes_title() {
        assert_eq!(a1_reference("South ODH", "A1:V23"), "'South ODH'!A1:V23");
        assert_eq!(a1_reference("Hub's", "A:C"), "'Hub''s'!A:C");
    }

    #[test]
    fn metadata_deserializes_with_missing_zero_id() {
        let json = r#"{"sheets":[
            {"properties":{"title":"Summary","index":0}},
            {"properties":{"sheetId":851267488,"title":"South ODH","index":1}}
        ]}"#;
        let meta: SpreadsheetMeta = serde_json::from_str(json).unwrap();
        assert_eq!(meta.properties(), sheets());
    }

    #[test]
    fn value_range_without_values_is_empty() {
        let vr: ValueRange = serde_json::from_str(r#"{"range":"'S'!A1:V23"}"#).unwrap();
        assert!(vr.into_table().is_empty());
    }

    #[test]
    fn value_range_cells_stringified() {
        let json = r#"{"values":[["Hub","FE AOP"],["Hosur",120,null,true]]}"#;
        let vr: ValueRange = serde_json::from_str(json).unwrap();
        assert_eq!(
            vr.into_table(),
            vec![
                vec!["Hub".to_string(), "FE AOP".to_string()],
                vec![
                    "Hosur".to_string(),
                    "120".to_string(),
                    String::new(),
                    "true".to_string()
                ],
            ]
        );
    }
}
