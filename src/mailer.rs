use crate::config::MailConfig;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{Message, SmtpTransport, Transport};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MailError {
    #[error("Email server is not configured")]
    NotConfigured,

    #[error("Invalid email address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Could not build email: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("{0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    #[error("Mail worker failed: {0}")]
    Worker(String),
}

impl MailError {
    /// Message shown to the user when a send fails
    pub fn user_message(&self) -> String {
        match self {
            MailError::NotConfigured => "Email server is not configured in .env file.".to_string(),
            MailError::Transport(e) if e.is_permanent() => {
                "Email login failed or the server rejected the message. Check MAIL_USERNAME/MAIL_PASSWORD (or App Password for Gmail).".to_string()
            }
            other => format!("Failed to send email: {}", other),
        }
    }
}

/// Something that can deliver a plain-text email
pub trait EmailSender: Send + Sync {
    fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<(), MailError>;
}

pub struct Mailer {
    smtp: SmtpTransport,
    from: String,
}

impl Mailer {
    /// Build an SMTP transport from the `MAIL_*` settings
    ///
    /// `use_ssl` selects implicit TLS, otherwise `use_tls` selects STARTTLS,
    /// otherwise the connection is unencrypted. The username doubles as the
    /// sender address and is only checked when a message is sent.
    pub fn new(config: &MailConfig) -> Result<Self, MailError> {
        let creds = Credentials::new(config.username.clone(), config.password.clone());

        let builder = if config.use_ssl {
            let tls_parameters = TlsParameters::new(config.server.clone())?;
            SmtpTransport::relay(&config.server)?.tls(Tls::Wrapper(tls_parameters))
        } else if config.use_tls {
            SmtpTransport::starttls_relay(&config.server)?
        } else {
            SmtpTransport::builder_dangerous(&config.server)
        };

        let smtp = builder.port(config.port).credentials(creds).build();

        tracing::info!(
            server = %config.server,
            port = config.port,
            ssl = config.use_ssl,
            tls = config.use_tls,
            "configured SMTP transport"
        );

        Ok(Mailer {
            smtp,
            from: config.username.clone(),
        })
    }
}

impl EmailSender for Mailer {
    fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<(), MailError> {
        let from: Mailbox = self.from.parse()?;
        let email = Message::builder()
            .from(from)
            .to(recipient.parse()?)
            .subject(subject)
            .body(body.to_string())?;

        self.smtp.send(&email)?;
        tracing::info!(recipient, "email sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(ssl: bool, tls: bool) -> MailConfig {
        MailConfig {
            server: "localhost".to_string(),
            port: 2525,
            username: "reports@example.com".to_string(),
            password: "secret".to_string(),
            use_tls: tls,
            use_ssl: ssl,
        }
    }

    #[test]
    fn builds_for_every_security_mode() {
        assert!(Mailer::new(&config(false, false)).is_ok());
        assert!(Mailer::new(&config(false, true)).is_ok());
        assert!(Mailer::new(&config(true, false)).is_ok());
    }

    #[test]
    fn plain_login_fails_only_when_sending() {
        let mut login = config(false, false);
        login.username = "reports".to_string();
        let mailer = Mailer::new(&login).unwrap();

        let err = mailer.send("boss@example.com", "s", "b").unwrap_err();
        assert!(matches!(err, MailError::Address(_)));
        assert!(err.user_message().starts_with("Failed to send email: Invalid email address"));
    }

    #[test]
    fn bad_recipient_is_rejected_before_connecting() {
        let mailer = Mailer::new(&config(false, false)).unwrap();
        let err = mailer.send("nobody", "s", "b").unwrap_err();
        assert!(matches!(err, MailError::Address(_)));
        assert!(err.user_message().starts_with("Failed to send email:"));
    }

    #[test]
    fn not_configured_message() {
        assert_eq!(
            MailError::NotConfigured.user_message(),
            "Email server is not configured in .env file."
        );
    }
}
