//! Email delivery of the rendered report, SMTP via lettre.
//!
//! One message per run: the whole roster in "To", the fixed CC list in "Cc".
//! Without an SMTP password the report is previewed in the log instead and
//! nothing touches the network.

use std::sync::Arc;

use chrono::NaiveDate;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, Message, SmtpTransport, Transport};
use secrecy::{ExposeSecret, SecretString};
use tracing::{info, warn};

use crate::config::EmailConfig;
use crate::error::NotifyError;
use crate::report::format_report_date;

/// How many characters of HTML to log when delivery is skipped.
const PREVIEW_CHARS: usize = 500;

/// Line width of the plain-text alternative.
const PLAIN_TEXT_WIDTH: usize = 120;

// ── Transport ───────────────────────────────────────────────────────

/// Sends a fully built message. Blocking; the notifier calls it off the
/// async runtime.
pub trait Mailer: Send + Sync {
    fn send(&self, message: &Message) -> Result<(), NotifyError>;
}

/// Authenticated SMTP with STARTTLS.
pub struct SmtpMailer {
    host: String,
    port: u16,
    username: String,
    password: SecretString,
}

impl SmtpMailer {
    pub fn new(host: &str, port: u16, username: &str, password: SecretString) -> Self {
        Self {
            host: host.to_string(),
            port,
            username: username.to_string(),
            password,
        }
    }

    fn transport_error(&self, reason: String) -> NotifyError {
        NotifyError::Transport {
            host: self.host.clone(),
            port: self.port,
            reason,
        }
    }
}

impl Mailer for SmtpMailer {
    fn send(&self, message: &Message) -> Result<(), NotifyError> {
        let creds = Credentials::new(
            self.username.clone(),
            self.password.expose_secret().to_string(),
        );

        info!(host = %self.host, port = self.port, "Connecting to SMTP server");
        let transport = SmtpTransport::starttls_relay(&self.host)
            .map_err(|e| self.transport_error(format!("SMTP relay error: {e}")))?
            .port(self.port)
            .credentials(creds)
            .build();

        transport
            .send(message)
            .map_err(|e| self.transport_error(format!("SMTP send failed: {e}")))?;
        Ok(())
    }
}

// ── Notifier ────────────────────────────────────────────────────────

/// Result of a delivery attempt that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Sent {
        subject: String,
        to: usize,
        cc: usize,
    },
    /// No SMTP password configured; content was only logged.
    Skipped,
}

/// Delivers the report email.
pub struct EmailNotifier {
    config: EmailConfig,
    mailer: Option<Arc<dyn Mailer>>,
}

impl EmailNotifier {
    /// Notifier that sends over SMTP using the configured credentials.
    pub fn new(config: EmailConfig) -> Self {
        Self {
            config,
            mailer: None,
        }
    }

    /// Notifier with an explicit transport.
    pub fn with_mailer(config: EmailConfig, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            config,
            mailer: Some(mailer),
        }
    }

    /// `"{prefix} - DD-MM-YYYY"`
    pub fn subject(&self, date: NaiveDate) -> String {
        format!("{} - {}", self.config.subject_prefix, format_report_date(date))
    }

    /// Roster addresses, in configured order.
    pub fn recipients(&self) -> Vec<&str> {
        self.config
            .roster
            .iter()
            .map(|r| r.address.as_str())
            .collect()
    }

    /// Build the multipart message without sending it.
    pub fn build_message(&self, html: &str, date: NaiveDate) -> Result<Message, NotifyError> {
        let mut builder = Message::builder()
            .from(parse_mailbox("from", &self.config.sender)?)
            .subject(self.subject(date));

        for recipient in &self.config.roster {
            let address = parse_address("to", &recipient.address)?;
            let name = (recipient.name != recipient.address).then(|| recipient.name.clone());
            builder = builder.to(Mailbox::new(name, address));
        }
        for cc in &self.config.cc {
            builder = builder.cc(parse_mailbox("cc", cc)?);
        }

        builder
            .multipart(MultiPart::alternative_plain_html(
                html_to_text(html)?,
                html.to_string(),
            ))
            .map_err(|e| NotifyError::Build(e.to_string()))
    }

    /// Send the report, or log a preview when no password is configured.
    pub async fn deliver(&self, html: &str, date: NaiveDate) -> Result<Delivery, NotifyError> {
        self.log_roster();

        let Some(password) = self.config.password.clone() else {
            warn!("SMTP password not set (GMAIL_APP_PASSWORD); skipping email send");
            info!(preview = %preview(html), "HTML content preview");
            return Ok(Delivery::Skipped);
        };

        let message = self.build_message(html, date)?;
        let subject = self.subject(date);

        info!(
            to = %self.recipients().join(", "),
            cc = %self.config.cc.join(", "),
            "Email recipients configured"
        );

        let mailer: Arc<dyn Mailer> = match &self.mailer {
            Some(mailer) => Arc::clone(mailer),
            None => Arc::new(SmtpMailer::new(
                &self.config.smtp_host,
                self.config.smtp_port,
                &self.config.sender,
                password,
            )),
        };

        info!("Sending email");
        tokio::task::spawn_blocking(move || mailer.send(&message))
            .await
            .map_err(|e| NotifyError::Transport {
                host: self.config.smtp_host.clone(),
                port: self.config.smtp_port,
                reason: format!("Send task panicked: {e}"),
            })??;

        info!(subject = %subject, "Email sent successfully");
        Ok(Delivery::Sent {
            subject,
            to: self.config.roster.len(),
            cc: self.config.cc.len(),
        })
    }

    fn log_roster(&self) {
        let mut roster: Vec<_> = self.config.roster.iter().collect();
        roster.sort_by(|a, b| a.name.cmp(&b.name));
        info!(count = roster.len(), "Using full recipient roster");
        for recipient in roster {
            info!(name = %recipient.name, address = %recipient.address, "Recipient");
        }
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

fn parse_address(field: &'static str, raw: &str) -> Result<Address, NotifyError> {
    raw.parse().map_err(|e: lettre::address::AddressError| NotifyError::InvalidAddress {
        field,
        address: raw.to_string(),
        reason: e.to_string(),
    })
}

fn parse_mailbox(field: &'static str, raw: &str) -> Result<Mailbox, NotifyError> {
    raw.parse().map_err(|e: lettre::address::AddressError| NotifyError::InvalidAddress {
        field,
        address: raw.to_string(),
        reason: e.to_string(),
    })
}

/// First few hundred characters of the document, for the log.
pub fn preview(html: &str) -> String {
    let mut out: String = html.chars().take(PREVIEW_CHARS).collect();
    if html.chars().count() > PREVIEW_CHARS {
        out.push_str("...");
    }
    out
}

/// Plain-text fallback for the HTML body. Entities are decoded and the
/// table is laid out as text.
pub fn html_to_text(html: &str) -> Result<String, NotifyError> {
    html2text::from_read(html.as_bytes(), PLAIN_TEXT_WIDTH)
        .map_err(|e| NotifyError::Build(format!("Plain-text body: {e}")))
}
