use std::time::Duration;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::info;

use super::backend::{Notification, NotifyBackend};
use crate::config::SmtpSettings;
use crate::error::NotifyError;

const SMTP_TIMEOUT: Duration = Duration::from_secs(30);

/// E-mail delivery over SMTP, optionally upgraded with STARTTLS.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: Mailbox,
    to: Vec<Mailbox>,
}

impl SmtpMailer {
    /// Build the transport and parse all mailboxes up front so a bad address
    /// fails at startup rather than at the first outage.
    pub fn new(settings: &SmtpSettings) -> Result<Self, NotifyError> {
        let builder = if settings.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&settings.host)
        };

        let mut builder = builder.port(settings.port).timeout(Some(SMTP_TIMEOUT));
        if !settings.username.is_empty() {
            builder = builder.credentials(Credentials::new(
                settings.username.clone(),
                settings.password.clone(),
            ));
        }

        if settings.to.is_empty() {
            return Err(NotifyError::NoRecipients);
        }

        let sender = parse_mailbox(&settings.from)?;
        let to = settings
            .to
            .iter()
            .map(|r| parse_mailbox(r))
            .collect::<Result<Vec<_>, _>>()?;

        info!(
            host = settings.host.as_str(),
            port = settings.port,
            tls = settings.use_tls,
            recipients = to.len(),
            "SMTP notifications enabled"
        );

        Ok(Self {
            transport: builder.build(),
            sender,
            to,
        })
    }

    fn build_message(&self, notification: &Notification) -> Result<Message, NotifyError> {
        let mut builder = Message::builder()
            .from(self.sender.clone())
            .subject(notification.subject.clone())
            .header(ContentType::TEXT_PLAIN);
        for mailbox in &self.to {
            builder = builder.to(mailbox.clone());
        }
        Ok(builder.body(notification.body.clone())?)
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, NotifyError> {
    address
        .trim()
        .parse::<Mailbox>()
        .map_err(|source| NotifyError::Address {
            address: address.to_string(),
            source,
        })
}

#[async_trait]
impl NotifyBackend for SmtpMailer {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let message = self.build_message(notification)?;
        self.transport.send(message).await?;
        Ok(())
    }

    fn recipients(&self) -> Vec<String> {
        self.to.iter().map(|m| m.to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> SmtpSettings {
        SmtpSettings {
            host: "smtp.example.test".into(),
            port: 587,
            username: "watcher".into(),
            password: "secret".into(),
            from: "Outage Watch <watch@example.test>".into(),
            to: vec!["jan@example.test".into(), "anna@example.test".into()],
            use_tls: false,
        }
    }

    #[test]
    fn builds_message_for_all_recipients() {
        let mailer = SmtpMailer::new(&settings()).unwrap();
        assert_eq!(mailer.recipients(), vec!["jan@example.test", "anna@example.test"]);

        let message = mailer
            .build_message(&Notification {
                subject: "Powiadomienie".into(),
                body: "Cześć".into(),
            })
            .unwrap();
        assert_eq!(message.envelope().to().len(), 2);
    }

    #[test]
    fn invalid_recipient_is_rejected() {
        let mut s = settings();
        s.to.push("not an address".into());
        let err = SmtpMailer::new(&s).err().unwrap();
        assert!(matches!(err, NotifyError::Address { .. }));
    }

    #[test]
    fn empty_recipient_list_is_rejected() {
        let mut s = settings();
        s.to.clear();
        assert!(matches!(SmtpMailer::new(&s), Err(NotifyError::NoRecipients)));
    }
}
