//! Report runner: fetch, transform, render and send, once per run.
//!
//! Flow:
//! 1. `SheetSource::fetch()`: raw table, empty means nothing to send
//! 2. `transform()`: GAP table, header-only means nothing to send
//! 3. `render_report()`: HTML, optionally written to disk
//! 4. `EmailNotifier::deliver()`: send, or preview when unconfigured
//!
//! Any error aborts the run. Nothing is retried.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::channels::{Delivery, EmailNotifier};
use crate::config::{PresentationConfig, ReportConfig};
use crate::error::{Result, TransformError};
use crate::pipeline::transform::transform;
use crate::pipeline::types::ColumnSpec;
use crate::report::render_report;
use crate::sheets::{SheetSource, SheetsClient};

/// Why a run stopped before sending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// The range returned no data at all.
    EmptySource,
    /// Header only, or not even a header.
    EmptyInput { rows: usize },
    /// Data rows existed but all were blank.
    NoRows,
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Clean stop; nothing was rendered or sent.
    NothingToSend(StopReason),
    /// Report rendered and handed to the notifier.
    Completed { rows: usize, delivery: Delivery },
}

/// Runs the report once.
pub struct ReportRunner {
    source: Arc<dyn SheetSource>,
    columns: ColumnSpec,
    presentation: PresentationConfig,
    notifier: EmailNotifier,
    html_out: Option<PathBuf>,
}

impl ReportRunner {
    pub fn new(
        source: Arc<dyn SheetSource>,
        columns: ColumnSpec,
        presentation: PresentationConfig,
        notifier: EmailNotifier,
    ) -> Self {
        Self {
            source,
            columns,
            presentation,
            notifier,
            html_out: None,
        }
    }

    /// Also write the rendered HTML to `path`.
    pub fn with_html_out(mut self, path: Option<PathBuf>) -> Self {
        self.html_out = path;
        self
    }

    /// Production wiring: Sheets REST source and SMTP notifier.
    pub fn from_config(config: ReportConfig) -> Result<Self> {
        let source = Arc::new(SheetsClient::new(config.source)?);
        let notifier = EmailNotifier::new(config.email);
        Ok(
            Self::new(source, config.columns, config.presentation, notifier)
                .with_html_out(config.html_out),
        )
    }

    /// Run the pipeline for the report date `today`.
    pub async fn run(&self, today: NaiveDate) -> Result<RunOutcome> {
        // Step 1: Fetch
        let raw = self.source.fetch().await?;
        if raw.is_empty() {
            warn!("No data to process");
            return Ok(RunOutcome::NothingToSend(StopReason::EmptySource));
        }

        // Step 2: Transform
        let table = match transform(&raw, &self.columns) {
            Ok(table) => table,
            Err(TransformError::EmptyInput { rows }) => {
                warn!(rows, "Header without data; nothing to send");
                return Ok(RunOutcome::NothingToSend(StopReason::EmptyInput { rows }));
            }
        };
        drop(raw);

        if table.is_empty() {
            warn!("No filtered data to send");
            return Ok(RunOutcome::NothingToSend(StopReason::NoRows));
        }
        if table.plan.is_fallback() || table.current.is_fallback() {
            warn!(
                plan = ?table.plan,
                current = ?table.current,
                "GAP computed from default column positions; verify the sheet layout"
            );
        }

        // Step 3: Render
        let html = render_report(&table, today, &self.presentation);
        info!(bytes = html.len(), "HTML report rendered");

        if let Some(path) = &self.html_out {
            tokio::fs::write(path, &html).await?;
            info!(path = %path.display(), "HTML report written");
        }

        // Step 4: Notify
        let delivery = self.notifier.deliver(&html, today).await?;

        Ok(RunOutcome::Completed {
            rows: table.rows.len(),
            delivery,
        })
    }
}
