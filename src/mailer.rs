use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Mailer
///
/// The outbound-mail collaborator used for email verification and password reset.
/// Same trait/mock split as the storage layer: the real implementation talks to an
/// HTTP mail API, the mock records sends so tests can assert on them.
///
/// Mail delivery is best-effort from the caller's perspective: a failed send is
/// logged by the handler but never fails the signup or reset request that triggered
/// it.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Sends the email-verification link minted at signup.
    async fn send_verification(&self, to: &str, token: &str) -> Result<(), String>;

    /// Sends the password-reset link minted by forgot-password.
    async fn send_password_reset(&self, to: &str, token: &str) -> Result<(), String>;
}

/// MailerState
///
/// The concrete type used to share the mailer across the application state.
pub type MailerState = Arc<dyn Mailer>;

/// HttpMailer
///
/// Delivers mail through an HTTP mail API (a Resend/Mailgun-style `POST /send`
/// endpoint authenticated with a bearer key). The message bodies link back into this
/// deployment via the configured public base URL.
pub struct HttpMailer {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    from: String,
    app_url: String,
}

impl HttpMailer {
    pub fn new(api_url: &str, api_key: &str, from: &str, app_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            from: from.to_string(),
            app_url: app_url.trim_end_matches('/').to_string(),
        }
    }

    async fn send(&self, to: &str, subject: &str, html: String) -> Result<(), String> {
        let response = self
            .client
            .post(format!("{}/send", self.api_url))
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({
                "from": self.from,
                "to": to,
                "subject": subject,
                "html": html,
            }))
            .send()
            .await
            .map_err(|e| e.to_string())?;

        if !response.status().is_success() {
            return Err(format!("mail API returned {}", response.status()));
        }
        Ok(())
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send_verification(&self, to: &str, token: &str) -> Result<(), String> {
        let link = format!("{}/verifyemail?token={}", self.app_url, token);
        self.send(
            to,
            "Verify your email",
            format!(
                "<p>Welcome! Confirm your address by opening \
                 <a href=\"{link}\">this link</a>. The link expires in 24 hours.</p>"
            ),
        )
        .await
    }

    async fn send_password_reset(&self, to: &str, token: &str) -> Result<(), String> {
        let link = format!("{}/reset-password?token={}", self.app_url, token);
        self.send(
            to,
            "Reset your password",
            format!(
                "<p>A password reset was requested for this address. \
                 <a href=\"{link}\">Choose a new password</a>. The link expires in \
                 one hour. If this wasn't you, ignore this mail.</p>"
            ),
        )
        .await
    }
}

/// MockMailer
///
/// Records every send as a `(recipient, token)` pair for test assertions.
#[derive(Default)]
pub struct MockMailer {
    pub sent: Mutex<Vec<(String, String)>>,
    pub should_fail: bool,
}

impl MockMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            should_fail: true,
        }
    }
}

#[async_trait]
impl Mailer for MockMailer {
    async fn send_verification(&self, to: &str, token: &str) -> Result<(), String> {
        if self.should_fail {
            return Err("mock mail error: simulation requested".to_string());
        }
        self.sent
            .lock()
            .expect("mailer mutex poisoned")
            .push((to.to_string(), token.to_string()));
        Ok(())
    }

    async fn send_password_reset(&self, to: &str, token: &str) -> Result<(), String> {
        if self.should_fail {
            return Err("mock mail error: simulation requested".to_string());
        }
        self.sent
            .lock()
            .expect("mailer mutex poisoned")
            .push((to.to_string(), token.to_string()));
        Ok(())
    }
}
