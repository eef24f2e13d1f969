//! Outbound delivery of the rendered report.

pub mod email;

pub use email::{Delivery, EmailNotifier, Mailer, SmtpMailer};
