use crate::configuration::EmailClientSettings;
use crate::domain::SubscriberEmail;
use crate::email::Email;
use anyhow::Context;
use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use secrecy::ExposeSecret;

pub struct SmtpEmailClient {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: Mailbox,
}

impl SmtpEmailClient {
    /// Connects lazily: the STARTTLS session is only opened on the first send.
    pub fn new(settings: &EmailClientSettings) -> Result<Self, anyhow::Error> {
        let sender = settings
            .sender()
            .map_err(|e| anyhow::anyhow!(e))
            .context("Invalid sender email address.")?;
        let sender = sender
            .as_ref()
            .parse::<Mailbox>()
            .context("The sender email address is not a valid mailbox.")?;
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.smtp_host)
            .context("Failed to configure the SMTP relay.")?
            .port(settings.smtp_port)
            .credentials(Credentials::new(
                settings.username.clone(),
                settings.password.expose_secret().clone(),
            ))
            .timeout(Some(settings.timeout()))
            .build();
        Ok(Self { transport, sender })
    }

    fn compose(
        &self,
        recipient: &SubscriberEmail,
        subject: &str,
        html_content: &str,
        text_content: &str,
    ) -> Result<Message, anyhow::Error> {
        let recipient = recipient
            .as_ref()
            .parse::<Mailbox>()
            .with_context(|| format!("{} is not a valid mailbox.", recipient))?;
        let message = Message::builder()
            .from(self.sender.clone())
            .to(recipient)
            .subject(subject)
            .multipart(MultiPart::alternative_plain_html(
                text_content.to_string(),
                html_content.to_string(),
            ))
            .context("Failed to assemble the email message.")?;
        Ok(message)
    }
}

#[async_trait]
impl Email for SmtpEmailClient {
    #[tracing::instrument(
        name = "Send email over SMTP",
        skip(self, html_content, text_content),
        fields(recipient = %recipient)
    )]
    async fn send_email(
        &self,
        recipient: SubscriberEmail,
        subject: &str,
        html_content: &str,
        text_content: &str,
    ) -> Result<(), anyhow::Error> {
        let message = self.compose(&recipient, subject, html_content, text_content)?;
        self.transport
            .send(message)
            .await
            .with_context(|| format!("The SMTP server did not accept the email to {}", recipient))?;
        Ok(())
    }
}
