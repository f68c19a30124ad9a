//! Payslip notifications.
//!
//! A [`Notification`] is a plain description of one email: recipient,
//! subject, text body and the PDF attachment.  Delivery goes through
//! the [`Mailer`] trait so the batch runner can be exercised without a
//! mail server; [`SmtpMailer`] is the production implementation over
//! `lettre`'s blocking SMTP transport.

use crate::config::SmtpSettings;
use crate::models::PayPeriod;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("invalid address {address:?}: {reason}")]
    Address { address: String, reason: String },
    #[error("invalid attachment content type: {0}")]
    ContentType(String),
    #[error("failed to build message: {0}")]
    Build(#[from] lettre::error::Error),
    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfAttachment {
    pub filename: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub attachment: PdfAttachment,
}

impl Notification {
    /// The monthly payslip email for `full_name`.
    pub fn payslip(
        to: &str,
        full_name: &str,
        period: PayPeriod,
        company: &str,
        sender_name: &str,
        attachment: PdfAttachment,
    ) -> Self {
        let month = period.month_name();
        let year = period.year();
        let body = format!(
            "Dear {full_name},\n\n\
             Please find enclosed Payslip for the month of {month} {year}. \
             We suggest that you save it in your personal records for any future reference.\n\n\
             Important:\n\
             - Please ensure that you check the entries in your payslip and for any queries \
             or concerns, you may approach your HR Manager or Payroll Admin.\n\n\
             Regards,\n{sender_name}"
        );
        Self {
            to: to.to_string(),
            subject: format!("Payslip For {month} {year} - {company}"),
            body,
            attachment,
        }
    }
}

/// Outbound delivery of notifications.
pub trait Mailer {
    fn send(&self, notification: &Notification) -> Result<(), MailError>;
}

pub struct SmtpMailer {
    transport: SmtpTransport,
    from: Mailbox,
}

fn mailbox(name: Option<String>, address: &str) -> Result<Mailbox, MailError> {
    let email = address.parse().map_err(|e: lettre::address::AddressError| MailError::Address {
        address: address.to_string(),
        reason: e.to_string(),
    })?;
    Ok(Mailbox::new(name, email))
}

impl SmtpMailer {
    /// Build a mailer for `settings`.  STARTTLS is used on the submission
    /// port when enabled, implicit TLS otherwise.
    pub fn new(settings: &SmtpSettings) -> Result<Self, MailError> {
        let builder = if settings.starttls {
            SmtpTransport::starttls_relay(&settings.host)?
        } else {
            SmtpTransport::relay(&settings.host)?
        };
        let transport = builder
            .port(settings.port)
            .credentials(Credentials::new(
                settings.username.clone(),
                settings.password.clone(),
            ))
            .timeout(Some(settings.timeout))
            .build();
        Ok(Self {
            transport,
            from: mailbox(Some(settings.from_name.clone()), &settings.from_email)?,
        })
    }

    fn message(&self, notification: &Notification) -> Result<Message, MailError> {
        let pdf = ContentType::parse("application/pdf")
            .map_err(|e| MailError::ContentType(e.to_string()))?;
        let message = Message::builder()
            .from(self.from.clone())
            .to(mailbox(None, &notification.to)?)
            .subject(notification.subject.clone())
            .multipart(
                MultiPart::mixed()
                    .singlepart(SinglePart::plain(notification.body.clone()))
                    .singlepart(
                        Attachment::new(notification.attachment.filename.clone())
                            .body(notification.attachment.bytes.clone(), pdf),
                    ),
            )?;
        Ok(message)
    }
}

impl Mailer for SmtpMailer {
    fn send(&self, notification: &Notification) -> Result<(), MailError> {
        let message = self.message(notification)?;
        self.transport.send(&message)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn attachment() -> PdfAttachment {
        PdfAttachment {
            filename: "Arun Kumar-payslip-November-2025.pdf".into(),
            bytes: b"%PDF-1.3".to_vec(),
        }
    }

    #[test]
    fn payslip_subject_and_body() {
        let n = Notification::payslip(
            "arun@example.com",
            "Arun Kumar",
            PayPeriod::new(2025, 11).unwrap(),
            "Arun Arudra",
            "Payroll Team",
            attachment(),
        );
        assert_eq!(n.subject, "Payslip For November 2025 - Arun Arudra");
        assert!(n.body.starts_with(
            "Dear Arun Kumar,\n\nPlease find enclosed Payslip for the month of November 2025."
        ));
        assert!(n.body.contains("\n\nImportant:\n- Please ensure"));
        assert!(n.body.ends_with("Regards,\nPayroll Team"));
    }

    fn settings() -> SmtpSettings {
        SmtpSettings {
            host: "localhost".into(),
            port: 2525,
            username: "payroll@example.com".into(),
            password: "secret".into(),
            starttls: true,
            timeout: Duration::from_secs(5),
            from_name: "Arun Arudra".into(),
            from_email: "payroll@example.com".into(),
        }
    }

    #[test]
    fn builds_a_multipart_message_with_the_pdf() {
        let mailer = SmtpMailer::new(&settings()).unwrap();
        let n = Notification::payslip(
            "arun@example.com",
            "Arun Kumar",
            PayPeriod::new(2025, 11).unwrap(),
            "Arun Arudra",
            "Arun Arudra",
            attachment(),
        );
        let formatted = String::from_utf8(mailer.message(&n).unwrap().formatted()).unwrap();
        assert!(formatted.contains("Subject: Payslip For November 2025 - Arun Arudra"));
        assert!(formatted.contains("Content-Type: application/pdf"));
        assert!(formatted.contains("Arun Kumar-payslip-November-2025.pdf"));
    }

    #[test]
    fn rejects_a_malformed_recipient() {
        let mailer = SmtpMailer::new(&settings()).unwrap();
        let mut n = Notification::payslip(
            "not-an-address",
            "Arun Kumar",
            PayPeriod::new(2025, 11).unwrap(),
            "Arun Arudra",
            "Arun Arudra",
            attachment(),
        );
        assert!(matches!(mailer.message(&n), Err(MailError::Address { .. })));
        n.to = "arun@example.com".into();
        assert!(mailer.message(&n).is_ok());
    }

    #[test]
    fn rejects_a_malformed_sender() {
        let mut bad = settings();
        bad.from_email = "payroll".into();
        assert!(matches!(SmtpMailer::new(&bad), Err(MailError::Address { .. })));
    }
}
