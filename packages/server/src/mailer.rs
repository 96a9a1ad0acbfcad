use async_trait::async_trait;
use tracing::{debug, info};

/// An email ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Outbound email transport.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: OutgoingMail) -> anyhow::Result<()>;
}

/// Writes mail to the log instead of delivering it.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: OutgoingMail) -> anyhow::Result<()> {
        info!(to = %mail.to, subject = %mail.subject, "Outgoing email (log transport)");
        debug!(body = %mail.body, "Outgoing email body");
        Ok(())
    }
}

pub fn password_reset_mail(to: &str, link: &str, valid_minutes: i64) -> OutgoingMail {
    OutgoingMail {
        to: to.to_string(),
        subject: "Reset your password".to_string(),
        body: format!(
            "Someone asked to reset the password of this account.\n\n\
             Open the link below within {valid_minutes} minutes to choose a new one:\n\
             {link}\n\n\
             If this wasn't you, you can ignore this email."
        ),
    }
}
