//! Defines the SMTP transport used to send account emails.

use lettre::{
    Message, SmtpTransport, Transport,
    address::AddressError,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};

use crate::Error;

/// Connection details for an SMTP relay.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    /// The relay host name, e.g. "smtp.gmail.com".
    pub host: String,
    /// The submission port on the relay.
    pub port: u16,
    /// The account used to authenticate with the relay, also used as the
    /// from address.
    pub username: String,
    /// The password for `username`.
    pub password: String,
    /// The display name shown on outgoing mail.
    pub display_name: String,
}

/// Sends account emails over SMTP.
///
/// A mailer created with [Mailer::disabled] logs the message subject instead
/// of sending, so development setups work without an SMTP account.
#[derive(Clone)]
pub struct Mailer {
    sender: Option<Sender>,
}

#[derive(Clone)]
struct Sender {
    transport: SmtpTransport,
    from_mailbox: Mailbox,
}

impl Mailer {
    /// Create a mailer that sends through the relay in `config`.
    ///
    /// # Errors
    /// Returns [Error::MailError] if the from address could not be parsed or
    /// the relay host could not be resolved into a transport.
    pub fn new(config: &SmtpConfig) -> Result<Self, Error> {
        let from_address = config
            .username
            .parse()
            .map_err(|error: AddressError| Error::MailError(error.to_string()))?;
        let from_mailbox = Mailbox::new(Some(config.display_name.clone()), from_address);

        let transport = SmtpTransport::starttls_relay(&config.host)
            .map_err(|error| Error::MailError(error.to_string()))?
            .port(config.port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();

        Ok(Self {
            sender: Some(Sender {
                transport,
                from_mailbox,
            }),
        })
    }

    /// Create a mailer that logs instead of sending.
    pub fn disabled() -> Self {
        Self { sender: None }
    }

    /// Whether this mailer actually sends mail.
    pub fn is_enabled(&self) -> bool {
        self.sender.is_some()
    }

    /// Send an HTML email to `to`.
    ///
    /// # Errors
    /// Returns [Error::MailError] if the message could not be built or the
    /// relay rejected it.
    pub fn send(&self, to: &str, subject: &str, html_body: String) -> Result<(), Error> {
        let Some(sender) = &self.sender else {
            tracing::info!("email sending is disabled, skipping '{subject}' to {to}");
            return Ok(());
        };

        let to_mailbox = to
            .parse()
            .map_err(|error: AddressError| Error::MailError(error.to_string()))?;

        let message = Message::builder()
            .from(sender.from_mailbox.clone())
            .to(to_mailbox)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html_body)
            .map_err(|error| Error::MailError(error.to_string()))?;

        sender
            .transport
            .send(&message)
            .map_err(|error| Error::MailError(error.to_string()))?;

        tracing::debug!("sent '{subject}' to {to}");

        Ok(())
    }
}
