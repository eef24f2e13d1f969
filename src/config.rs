//! Configuration types.
//!
//! Everything is read once from the process environment in `main` and handed
//! to each component as a plain value. `from_lookup` takes any key lookup so
//! tests can build a config without touching the real environment.

use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;
use secrecy::SecretString;

use crate::error::ConfigError;
use crate::pipeline::types::ColumnSpec;

/// Default cell range read from the sheet (22 columns, header + 22 rows).
pub const DEFAULT_RANGE: &str = "A1:V23";

/// Default source positions: hub name plus the 4D active snapshot columns.
pub const DEFAULT_COLUMNS: &[usize] = &[0, 18, 19, 20, 21, 22];

pub const DEFAULT_PLAN_FRAGMENT: &str = "FE AOP";
pub const DEFAULT_CURRENT_FRAGMENT: &str = "4D Active (30th)";
pub const DEFAULT_CURRENT_DATE_FRAGMENTS: &[&str] = &["30th", "30/11"];

pub const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";
pub const DEFAULT_SMTP_PORT: u16 = 587;

pub const DEFAULT_SUBJECT_PREFIX: &str = "Today's 4D Active - South Flipkart ODH";
pub const DEFAULT_TITLE: &str = "4D Active Report - South Flipkart ODH";

pub const DEFAULT_SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4";

static A1_RANGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z]{1,3}[0-9]*(:[A-Za-z]{1,3}[0-9]*)?$").unwrap());

/// Full configuration for one report run.
#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub source: SheetConfig,
    pub columns: ColumnSpec,
    pub email: EmailConfig,
    pub presentation: PresentationConfig,
    /// Where to also write the rendered HTML, if anywhere.
    pub html_out: Option<PathBuf>,
}

/// Which sheet inside the spreadsheet to read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetSelector {
    /// Sheet title. Must exist.
    Name(String),
    /// Sheet id (gid) as configured. Unknown or unparseable ids fall back to
    /// the first sheet.
    Id(String),
    /// First sheet in the spreadsheet.
    First,
}

/// Credential used against the spreadsheet API.
#[derive(Debug, Clone)]
pub enum SheetsCredential {
    /// Service-account key file. Access tokens are minted and refreshed from
    /// it for every run, so private sheets work unattended.
    ServiceAccountFile(PathBuf),
    /// OAuth access token, sent as a bearer token.
    AccessToken(SecretString),
    /// API key, sent as the `key` query parameter. Only works for sheets
    /// readable by link.
    ApiKey(SecretString),
}

/// Spreadsheet source configuration.
#[derive(Debug, Clone)]
pub struct SheetConfig {
    pub spreadsheet_id: String,
    pub sheet: SheetSelector,
    /// A1 range without the sheet prefix, e.g. `A1:V23`.
    pub range: String,
    pub credential: SheetsCredential,
    pub api_base: String,
}

/// A named report recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    pub name: String,
    pub address: String,
}

/// Outbound mail configuration.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub sender: String,
    /// SMTP password. `None` means delivery is skipped and the report is
    /// only previewed in the log.
    pub password: Option<SecretString>,
    pub smtp_host: String,
    pub smtp_port: u16,
    /// Everyone on the roster goes in "To".
    pub roster: Vec<Recipient>,
    pub cc: Vec<String>,
    pub subject_prefix: String,
}

/// Text that appears in the rendered document.
#[derive(Debug, Clone)]
pub struct PresentationConfig {
    pub title: String,
    pub contact_email: String,
}

impl ReportConfig {
    /// Build config from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let require = |key: &str, hint: &str| {
            get(key).ok_or_else(|| ConfigError::MissingRequired {
                key: key.to_string(),
                hint: hint.to_string(),
            })
        };

        // ── Source ──────────────────────────────────────────────────
        let spreadsheet_id = require(
            "REPORT_SPREADSHEET_ID",
            "Set it to the id in the spreadsheet URL (/spreadsheets/d/<id>/edit).",
        )?;

        let sheet = match (get("REPORT_SHEET_NAME"), get("REPORT_SHEET_ID")) {
            (Some(name), _) => SheetSelector::Name(name),
            (None, Some(id)) => SheetSelector::Id(id),
            (None, None) => SheetSelector::First,
        };

        let range = get("REPORT_RANGE").unwrap_or_else(|| DEFAULT_RANGE.to_string());
        if !A1_RANGE.is_match(&range) {
            return Err(ConfigError::InvalidValue {
                key: "REPORT_RANGE".into(),
                message: format!("{range:?} is not an A1 range like A1:V23"),
            });
        }

        let credential = match (
            get("GOOGLE_SERVICE_ACCOUNT_FILE"),
            get("GOOGLE_SHEETS_ACCESS_TOKEN"),
            get("GOOGLE_SHEETS_API_KEY"),
        ) {
            (Some(path), _, _) => SheetsCredential::ServiceAccountFile(PathBuf::from(path)),
            (None, Some(token), _) => SheetsCredential::AccessToken(SecretString::from(token)),
            (None, None, Some(key)) => SheetsCredential::ApiKey(SecretString::from(key)),
            (None, None, None) => {
                return Err(ConfigError::MissingRequired {
                    key: "GOOGLE_SERVICE_ACCOUNT_FILE".into(),
                    hint: "Point it at a service-account key file shared on the sheet, or set \
                           GOOGLE_SHEETS_ACCESS_TOKEN or GOOGLE_SHEETS_API_KEY instead."
                        .into(),
                });
            }
        };

        let api_base = get("GOOGLE_SHEETS_API_BASE")
            .unwrap_or_else(|| DEFAULT_SHEETS_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();

        // ── Columns ─────────────────────────────────────────────────
        let positions = match get("REPORT_COLUMNS") {
            Some(raw) => parse_positions("REPORT_COLUMNS", &raw)?,
            None => DEFAULT_COLUMNS.to_vec(),
        };

        let date_fragments = match get("REPORT_CURRENT_DATE_FRAGMENTS") {
            Some(raw) => split_list(&raw),
            None => DEFAULT_CURRENT_DATE_FRAGMENTS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        };

        let columns = ColumnSpec {
            positions,
            plan_fragment: get("REPORT_PLAN_COLUMN")
                .unwrap_or_else(|| DEFAULT_PLAN_FRAGMENT.to_string()),
            current_fragment: get("REPORT_CURRENT_COLUMN")
                .unwrap_or_else(|| DEFAULT_CURRENT_FRAGMENT.to_string()),
            current_date_fragments: date_fragments,
            ..ColumnSpec::default()
        };

        // ── Email ───────────────────────────────────────────────────
        let sender = require(
            "GMAIL_SENDER_EMAIL",
            "The report is sent from this address.",
        )?;

        let smtp_port = match get("REPORT_SMTP_PORT") {
            Some(raw) => raw.parse().map_err(|e| ConfigError::InvalidValue {
                key: "REPORT_SMTP_PORT".into(),
                message: format!("{raw:?}: {e}"),
            })?,
            None => DEFAULT_SMTP_PORT,
        };

        let roster = parse_roster(&require(
            "REPORT_ROSTER",
            "Comma-separated Name:address pairs, e.g. Asha:asha@example.com.",
        )?)?;

        let cc = get("REPORT_CC").map(|raw| split_list(&raw)).unwrap_or_default();

        let email = EmailConfig {
            sender: sender.clone(),
            password: get("GMAIL_APP_PASSWORD").map(SecretString::from),
            smtp_host: get("REPORT_SMTP_HOST").unwrap_or_else(|| DEFAULT_SMTP_HOST.to_string()),
            smtp_port,
            roster,
            cc,
            subject_prefix: get("REPORT_SUBJECT_PREFIX")
                .unwrap_or_else(|| DEFAULT_SUBJECT_PREFIX.to_string()),
        };

        let presentation = PresentationConfig {
            title: get("REPORT_TITLE").unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            contact_email: get("REPORT_CONTACT_EMAIL").unwrap_or(sender),
        };

        Ok(Self {
            source: SheetConfig {
                spreadsheet_id,
                sheet,
                range,
                credential,
                api_base,
            },
            columns,
            email,
            presentation,
            html_out: get("REPORT_HTML_OUT").map(PathBuf::from),
        })
    }
}

/// Split a comma-separated list, dropping blanks.
fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_positions(key: &str, raw: &str) -> Result<Vec<usize>, ConfigError> {
    let positions = split_list(raw)
        .iter()
        .map(|s| {
            s.parse::<usize>().map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("{s:?} is not a column position: {e}"),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    if positions.is_empty() {
        return Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: "at least one column position is required".into(),
        });
    }
    Ok(positions)
}

/// Parse `Name:address` pairs. A bare address is its own name.
fn parse_roster(raw: &str) -> Result<Vec<Recipient>, ConfigError> {
    let roster = split_list(raw)
        .into_iter()
        .map(|entry| {
            let (name, address) = match entry.split_once(':') {
                Some((name, address)) => (name.trim().to_string(), address.trim().to_string()),
                None => (entry.clone(), entry.clone()),
            };
            if !address.contains('@') {
                return Err(ConfigError::InvalidValue {
                    key: "REPORT_ROSTER".into(),
                    message: format!("{entry:?} has no email address"),
                });
            }
            Ok(Recipient { name, address })
        })
        .collect::<Result<Vec<_>, _>>()?;

    if roster.is_empty() {
        return Err(ConfigError::InvalidValue {
            key: "REPORT_ROSTER".into(),
            message: "at least one recipient is required".into(),
        });
    }
    Ok(roster)
}
