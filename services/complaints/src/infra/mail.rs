use anyhow::Context as _;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::info;

use crate::config::SmtpConfig;
use crate::domain::repository::Notifier;
use crate::domain::types::Mail;
use crate::error::ComplaintsServiceError;

/// Implicit-TLS submission port. Every other port negotiates STARTTLS.
const SMTPS_PORT: u16 = 465;

/// Delivers HTML mail through an SMTP relay.
#[derive(Clone)]
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpNotifier {
    pub fn new(config: &SmtpConfig) -> anyhow::Result<Self> {
        let from = config
            .from
            .parse()
            .with_context(|| format!("MAIL_FROM {:?} is not a valid mailbox", config.from))?;
        let builder = if config.port == SMTPS_PORT {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
        }
        .with_context(|| format!("invalid SMTP host {}", config.host))?
        .port(config.port);

        let builder = match (&config.username, &config.password) {
            (Some(user), Some(pass)) => {
                builder.credentials(Credentials::new(user.clone(), pass.clone()))
            }
            _ => builder,
        };

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

impl Notifier for SmtpNotifier {
    async fn send(&self, mail: &Mail) -> Result<(), ComplaintsServiceError> {
        let to: Mailbox = mail
            .to
            .parse()
            .map_err(|e| ComplaintsServiceError::validation(format!("invalid recipient: {e}")))?;
        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(mail.subject.clone())
            .header(ContentType::TEXT_HTML)
            .body(mail.body.clone())
            .context("build mail message")?;

        self.transport
            .send(message)
            .await
            .map_err(|e| ComplaintsServiceError::DependencyFailure(format!("smtp: {e}")))?;
        Ok(())
    }
}

/// Stands in for SMTP when no relay is configured: records the mail in the log.
#[derive(Clone, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    async fn send(&self, mail: &Mail) -> Result<(), ComplaintsServiceError> {
        info!(to = %mail.to, subject = %mail.subject, "smtp not configured, mail logged only");
        Ok(())
    }
}

/// The notifier chosen at startup.
#[derive(Clone)]
pub enum MailNotifier {
    Smtp(SmtpNotifier),
    Log(LogNotifier),
}

impl MailNotifier {
    pub fn from_config(smtp: Option<&SmtpConfig>) -> anyhow::Result<Self> {
        Ok(match smtp {
            Some(config) => Self::Smtp(SmtpNotifier::new(config)?),
            None => Self::Log(LogNotifier),
        })
    }
}

impl Notifier for MailNotifier {
    async fn send(&self, mail: &Mail) -> Result<(), ComplaintsServiceError> {
        match self {
            Self::Smtp(n) => n.send(mail).await,
            Self::Log(n) => n.send(mail).await,
        }
    }
}
