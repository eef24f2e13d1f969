//! Self-contained HTML rendering of the GAP table.
//!
//! The document embeds its own stylesheet and references no external assets,
//! so it can be used as an email body as-is.

use chrono::NaiveDate;

use crate::config::PresentationConfig;
use crate::pipeline::types::{CellValue, GAP_COLUMN, OutputTable};
use crate::report::format::{escape_html, format_number};
use crate::report::format_report_date;

const STYLESHEET: &str = r#"
        body {
            font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif;
            line-height: 1.6;
            color: #2c3e50;
            margin: 0;
            padding: 20px;
            background: linear-gradient(135deg, #667eea 0%, #764ba2 100%);
            min-height: 100vh;
        }
        .container {
            max-width: 1200px;
            margin: 0 auto;
            background: white;
            border-radius: 15px;
            box-shadow: 0 10px 40px rgba(0,0,0,0.2);
            overflow: hidden;
        }
        .header {
            background: linear-gradient(135deg, #FF6B35 0%, #F7931E 50%, #FFD23F 100%);
            color: white;
            padding: 10px 20px;
            text-align: center;
        }
        .header h1 {
            margin: 0;
            font-size: 16px;
            font-weight: bold;
            text-shadow: 2px 2px 4px rgba(0,0,0,0.2);
        }
        .header p {
            margin: 5px 0 0 0;
            font-size: 11px;
            opacity: 0.95;
        }
        .content {
            padding: 15px 20px;
        }
        table {
            width: 100%;
            border-collapse: collapse;
            font-size: 11px;
            box-shadow: 0 4px 6px rgba(0,0,0,0.1);
            border-radius: 8px;
            overflow: hidden;
        }
        th {
            background: linear-gradient(135deg, #667eea 0%, #764ba2 100%);
            color: white;
            padding: 8px 10px;
            text-align: left;
            font-weight: 600;
            text-transform: uppercase;
            font-size: 10px;
            letter-spacing: 0.3px;
            border: none;
        }
        th:first-child {
            border-top-left-radius: 8px;
        }
        th:last-child {
            border-top-right-radius: 8px;
        }
        td {
            padding: 8px 10px;
            border-bottom: 1px solid #e0e0e0;
            background: white;
            font-size: 11px;
        }
        tr:nth-child(even) td {
            background: #f8f9fa;
        }
        .gap-positive {
            background: #ffcdd2 !important;
            color: #c62828;
            font-weight: bold;
        }
        .gap-negative {
            background: #c8e6c9 !important;
            color: #2e7d32;
            font-weight: bold;
        }
        .gap-zero {
            background: #fff9c4 !important;
            color: #f57f17;
            font-weight: bold;
        }
        .number-cell {
            text-align: center;
            font-weight: 500;
        }
        .footer {
            background: #f5f5f5;
            padding: 12px 20px;
            text-align: center;
            color: #666;
            font-size: 10px;
            border-top: 3px solid #FF6B35;
        }
"#;

/// GAP styling bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GapClass {
    Positive,
    Negative,
    Zero,
}

impl GapClass {
    pub fn of(gap: f64) -> Self {
        if gap > 0.0 {
            Self::Positive
        } else if gap < 0.0 {
            Self::Negative
        } else {
            Self::Zero
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            Self::Positive => "gap-positive",
            Self::Negative => "gap-negative",
            Self::Zero => "gap-zero",
        }
    }
}

/// Render the report document for `date`.
pub fn render_report(
    table: &OutputTable,
    date: NaiveDate,
    presentation: &PresentationConfig,
) -> String {
    let mut rows_html = String::new();

    rows_html.push_str("                <tr>\n");
    for header in &table.headers {
        rows_html.push_str(&format!(
            "                    <th>{}</th>\n",
            escape_html(header)
        ));
    }
    rows_html.push_str("                </tr>\n");

    for row in &table.rows {
        rows_html.push_str("                <tr>\n");
        for header in &table.headers {
            let (class, text) = render_cell(header, row.get(header));
            rows_html.push_str(&format!(
                "                    <td class=\"{class}\">{text}</td>\n"
            ));
        }
        rows_html.push_str("                </tr>\n");
    }

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>{title}</title>
    <style>{css}    </style>
</head>
<body>
    <div class="container">
        <div class="header">
            <h1>{title}</h1>
            <p>Report Date: {date}</p>
        </div>
        <div class="content">
            <table>
{rows}            </table>
        </div>
        <div class="footer">
            <p>This report is automatically generated by the headcount report job</p>
            <p>For questions or issues, please contact {contact}</p>
        </div>
    </div>
</body>
</html>"#,
        title = escape_html(&presentation.title),
        css = STYLESHEET,
        date = format_report_date(date),
        rows = rows_html,
        contact = escape_html(&presentation.contact_email),
    )
}

/// Class attribute and display text for one cell.
fn render_cell(header: &str, value: Option<&CellValue>) -> (String, String) {
    match value {
        Some(CellValue::Number(n)) => {
            let mut class = String::from("number-cell");
            if header == GAP_COLUMN {
                class.push(' ');
                class.push_str(GapClass::of(*n).css_class());
            }
            (class, format_number(*n))
        }
        Some(CellValue::Text(text)) => (String::new(), escape_html(text)),
        None => (String::new(), String::new()),
    }
}
