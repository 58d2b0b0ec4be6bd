use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use tracing::{error, info};

use crate::config::SmtpConfig;

/// Outbound mail, abstracted so tests can swap in a fake.
/// Delivery failures must surface to the caller; the password-reset flow
/// rolls back the stored credential when the send fails.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_password_reset(
        &self,
        to: &str,
        user_name: &str,
        token: &str,
    ) -> anyhow::Result<()>;
}

#[derive(Clone)]
pub struct SmtpMailer {
    server: String,
    port: u16,
    credentials: Credentials,
    from_email: String,
    from_name: String,
    reset_url: String,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Self {
        Self {
            server: config.server.clone(),
            port: config.port,
            credentials: Credentials::new(config.username.clone(), config.password.clone()),
            from_email: config.from_email.clone(),
            from_name: config.from_name.clone(),
            reset_url: config.reset_url.clone(),
        }
    }

    fn build_transport(&self) -> anyhow::Result<SmtpTransport> {
        let transport = SmtpTransport::relay(&self.server)?
            .port(self.port)
            .credentials(self.credentials.clone())
            .build();
        Ok(transport)
    }

    fn from_header(&self) -> String {
        format!("{} <{}>", self.from_name, self.from_email)
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_password_reset(
        &self,
        to: &str,
        user_name: &str,
        token: &str,
    ) -> anyhow::Result<()> {
        let reset_link = format!("{}?token={}", self.reset_url, token);
        let body = format!(
            "Hello {user_name},\n\n\
             We received a request to reset your password.\n\n\
             Open the link below to choose a new one:\n{reset_link}\n\n\
             The link expires in one hour. If you did not request this,\n\
             you can safely ignore this email.\n"
        );

        let email = Message::builder()
            .from(self.from_header().parse()?)
            .to(to.parse()?)
            .subject("Password recovery")
            .header(ContentType::TEXT_PLAIN)
            .body(body)?;

        let transport = self.build_transport()?;
        // lettre's SmtpTransport is blocking; keep it off the runtime threads.
        tokio::task::spawn_blocking(move || transport.send(&email)).await??;

        info!(to = %to, "password reset email sent");
        Ok(())
    }
}

/// In-memory mailer for tests: records sends, optionally fails on demand.
#[derive(Default)]
pub struct FakeMailer {
    pub fail: bool,
    pub sent: std::sync::Mutex<Vec<(String, String)>>,
}

impl FakeMailer {
    pub fn failing() -> Self {
        Self {
            fail: true,
            sent: std::sync::Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Mailer for FakeMailer {
    async fn send_password_reset(
        &self,
        to: &str,
        _user_name: &str,
        token: &str,
    ) -> anyhow::Result<()> {
        if self.fail {
            error!(to = %to, "fake mailer configured to fail");
            anyhow::bail!("smtp unavailable");
        }
        self.sent
            .lock()
            .expect("fake mailer lock")
            .push((to.to_string(), token.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fake_mailer_records_sends() {
        let mailer = FakeMailer::default();
        mailer
            .send_password_reset("a@x.com", "Ana", "tok123")
            .await
            .expect("send should succeed");
        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "a@x.com");
        assert_eq!(sent[0].1, "tok123");
    }

    #[tokio::test]
    async fn fake_mailer_can_fail() {
        let mailer = FakeMailer::failing();
        let err = mailer
            .send_password_reset("a@x.com", "Ana", "tok123")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("smtp"));
        assert!(mailer.sent.lock().unwrap().is_empty());
    }
}
