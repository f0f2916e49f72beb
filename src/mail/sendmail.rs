use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials, Message,
    SmtpTransport, Transport,
};
use thiserror::Error;

use crate::config::SmtpConfig;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("no recipient configured")]
    NoRecipient,

    #[error("invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("could not build message: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("SMTP send failed: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("mail task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[derive(Debug, Clone)]
pub struct Mailer {
    config: SmtpConfig,
}

impl Mailer {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }

    pub fn admin_email(&self) -> &str {
        &self.config.admin_email
    }

    fn transport(&self) -> Result<SmtpTransport, lettre::transport::smtp::Error> {
        let builder = if self.config.port == 465 {
            SmtpTransport::relay(&self.config.host)?
        } else {
            SmtpTransport::starttls_relay(&self.config.host)?
        };

        let builder = builder.port(self.config.port);
        let builder = if self.config.username.is_empty() {
            builder
        } else {
            builder.credentials(Credentials::new(
                self.config.username.clone(),
                self.config.password.clone(),
            ))
        };

        Ok(builder.build())
    }

    /// Sends a plain-text message. The SMTP exchange is blocking, so it runs
    /// on the blocking pool.
    pub async fn send_text(
        &self,
        to_email: &str,
        reply_to: Option<&str>,
        subject: &str,
        body: String,
    ) -> Result<(), MailError> {
        if to_email.is_empty() {
            return Err(MailError::NoRecipient);
        }

        let mut builder = Message::builder()
            .from(self.config.from.parse()?)
            .to(to_email.parse()?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN);
        if let Some(reply_to) = reply_to {
            builder = builder.reply_to(reply_to.parse()?);
        }
        let email = builder.body(body)?;

        let transport = self.transport()?;
        tokio::task::spawn_blocking(move || transport.send(&email)).await??;

        tracing::info!("Email sent via SMTP to {}", to_email);
        Ok(())
    }
}
