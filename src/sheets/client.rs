//! Sheets v4 REST client.

use std::sync::Arc;

use async_trait::async_trait;
use gcp_auth::{CustomServiceAccount, TokenProvider};
use reqwest::Url;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::config::{SheetConfig, SheetsCredential};
use crate::error::SourceError;
use crate::pipeline::types::RawTable;
use crate::sheets::SheetSource;
use crate::sheets::api::{SpreadsheetMeta, ValueRange, a1_reference, resolve_sheet};

/// Maximum length of an error body carried into `SourceError::Status`.
const MAX_ERROR_BODY: usize = 500;

/// Read-only scope requested for service-account tokens.
const SHEETS_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets.readonly";

/// How requests are authorized.
enum Authorizer {
    Bearer(SecretString),
    ApiKey(SecretString),
    /// Mints and caches access tokens from a service-account key.
    ServiceAccount(Arc<CustomServiceAccount>),
}

/// Reads one range from one sheet over the Sheets REST API.
pub struct SheetsClient {
    config: SheetConfig,
    auth: Authorizer,
    client: reqwest::Client,
}

impl SheetsClient {
    /// Fails when a service-account key file cannot be read or parsed.
    pub fn new(config: SheetConfig) -> Result<Self, SourceError> {
        let auth = match &config.credential {
            SheetsCredential::AccessToken(token) => Authorizer::Bearer(token.clone()),
            SheetsCredential::ApiKey(key) => Authorizer::ApiKey(key.clone()),
            SheetsCredential::ServiceAccountFile(path) => {
                let account = CustomServiceAccount::from_file(path).map_err(|e| {
                    SourceError::Auth(format!(
                        "Failed to load service account key {}: {e}",
                        path.display()
                    ))
                })?;
                info!(path = %path.display(), "Using service account credentials");
                Authorizer::ServiceAccount(Arc::new(account))
            }
        };

        Ok(Self {
            config,
            auth,
            client: reqwest::Client::new(),
        })
    }

    fn base_url(&self) -> Result<Url, SourceError> {
        let raw = format!("{}/spreadsheets", self.config.api_base);
        Url::parse(&raw).map_err(|e| SourceError::RequestFailed {
            url: raw,
            reason: format!("Invalid API base: {e}"),
        })
    }

    /// `{base}/spreadsheets/{id}?fields=sheets.properties`
    pub fn metadata_url(&self) -> Result<Url, SourceError> {
        let mut url = self.base_url()?;
        push_segments(&mut url, &[self.config.spreadsheet_id.as_str()])?;
        url.query_pairs_mut()
            .append_pair("fields", "sheets.properties");
        Ok(url)
    }

    /// `{base}/spreadsheets/{id}/values/{'Title'!range}`
    pub fn values_url(&self, sheet_title: &str) -> Result<Url, SourceError> {
        let mut url = self.base_url()?;
        let reference = a1_reference(sheet_title, &self.config.range);
        push_segments(
            &mut url,
            &[self.config.spreadsheet_id.as_str(), "values", reference.as_str()],
        )?;
        Ok(url)
    }

    /// GET a JSON document. The URL path (never the query, which may carry
    /// an API key) is used in errors.
    async fn get_json<T: DeserializeOwned>(&self, mut url: Url) -> Result<T, SourceError> {
        let shown = url.path().to_string();

        let request = match &self.auth {
            Authorizer::Bearer(token) => self.client.get(url).bearer_auth(token.expose_secret()),
            Authorizer::ApiKey(key) => {
                url.query_pairs_mut().append_pair("key", key.expose_secret());
                self.client.get(url)
            }
            Authorizer::ServiceAccount(account) => {
                let token = account
                    .token(&[SHEETS_READONLY_SCOPE])
                    .await
                    .map_err(|e| SourceError::Auth(format!("Failed to mint access token: {e}")))?;
                self.client.get(url).bearer_auth(token.as_str())
            }
        };

        let response = request
            .send()
            .await
            .map_err(|e| SourceError::RequestFailed {
                url: shown.clone(),
                reason: e.without_url().to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body: String = response
                .text()
                .await
                .unwrap_or_default()
                .chars()
                .take(MAX_ERROR_BODY)
                .collect();
            return Err(SourceError::Status {
                url: shown,
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| SourceError::InvalidResponse(format!("{shown}: {}", e.without_url())))
    }
}

fn push_segments(url: &mut Url, segments: &[&str]) -> Result<(), SourceError> {
    let shown = url.to_string();
    url.path_segments_mut()
        .map_err(|_| SourceError::RequestFailed {
            url: shown,
            reason: "API base cannot carry a path".into(),
        })?
        .extend(segments);
    Ok(())
}

#[async_trait]
impl SheetSource for SheetsClient {
    async fn fetch(&self) -> Result<RawTable, SourceError> {
        info!(
            spreadsheet_id = %self.config.spreadsheet_id,
            sheet = ?self.config.sheet,
            range = %self.config.range,
            "Reading data from spreadsheet"
        );

        let meta: SpreadsheetMeta = self.get_json(self.metadata_url()?).await?;
        let sheets = meta.properties();
        debug!(count = sheets.len(), "Fetched sheet list");

        let sheet = resolve_sheet(&sheets, &self.config.sheet, &self.config.spreadsheet_id)?;
        info!(title = %sheet.title, sheet_id = sheet.sheet_id, "Using sheet");

        let values: ValueRange = self.get_json(self.values_url(&sheet.title)?).await?;
        let range = values.range.clone().unwrap_or_else(|| self.config.range.clone());
        let table = values.into_table();

        if table.is_empty() {
            warn!(range = %range, "No data found in the specified range");
        } else {
            info!(rows = table.len(), range = %range, "Read rows from spreadsheet");
        }
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;

    use super::*;
    use crate::config::{DEFAULT_SHEETS_API_BASE, SheetSelector};

    fn config(credential: SheetsCredential) -> SheetConfig {
        SheetConfig {
            spreadsheet_id: "1yexw-abc".into(),
            sheet: SheetSelector::Id("851267488".into()),
            range: "A1:V23".into(),
            credential,
            api_base: DEFAULT_SHEETS_API_BASE.into(),
        }
    }

    fn client() -> SheetsClient {
        SheetsClient::new(config(SheetsCredential::AccessToken(SecretString::from(
            "token",
        ))))
        .unwrap()
    }

    #[test]
    fn metadata_url_requests_properties_only() {
        let url = client().metadata_url().unwrap();
        assert_eq!(
            url.as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/1yexw-abc?fields=sheets.properties"
        );
    }

    #[test]
    fn values_url_encodes_sheet_reference() {
        let url = client().values_url("South ODH").unwrap();
        assert_eq!(url.path(), "/v4/spreadsheets/1yexw-abc/values/'South%20ODH'!A1:V23");
        assert!(url.query().is_none());
    }

    #[test]
    fn values_url_escapes_slash_in_title() {
        let url = client().values_url("Nov/Dec").unwrap();
        assert!(url.path().ends_with("/values/'Nov%2FDec'!A1:V23"));
    }

    #[test]
    fn bad_api_base_is_source_error() {
        let mut c = client();
        c.config.api_base = "not a url".into();
        assert!(matches!(
            c.metadata_url(),
            Err(SourceError::RequestFailed { .. })
        ));
    }

    #[test]
    fn missing_service_account_file_is_auth_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        let result = SheetsClient::new(config(SheetsCredential::ServiceAccountFile(path)));
        assert!(matches!(result, Err(SourceError::Auth(_))));
    }

    #[test]
    fn malformed_service_account_file_is_auth_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sa.json");
        std::fs::write(&path, r#"{"type":"service_account"}"#).unwrap();
        let result = SheetsClient::new(config(SheetsCredential::ServiceAccountFile(path)));
        assert!(matches!(result, Err(SourceError::Auth(_))));
    }
}
