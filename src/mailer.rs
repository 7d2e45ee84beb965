use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::config::AppConfig;

/// EmailMessage
///
/// One outbound transactional message (order confirmation, contact form
/// forward). Plain text only; the provider handles delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Mailer
///
/// Contract for the transactional email layer. There is deliberately no
/// queueing or retry behind this trait: a failed send is reported to the
/// caller once, and every current caller logs it and moves on, because no
/// triggering operation is allowed to fail on account of email.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: EmailMessage) -> Result<(), String>;
}

/// MailerState
///
/// The concrete type used to share the mailer across the application state.
pub type MailerState = Arc<dyn Mailer>;

/// HttpMailer
///
/// The production implementation: a JSON POST to the email provider's HTTP
/// API, authenticated with a bearer key.
pub struct HttpMailer {
    api_url: String,
    api_key: String,
    from: String,
    http: reqwest::Client,
}

impl HttpMailer {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            api_url: config.mail_api_url.clone(),
            api_key: config.mail_api_key.clone(),
            from: config.mail_from.clone(),
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, message: EmailMessage) -> Result<(), String> {
        let response = self
            .http
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({
                "from": self.from,
                "to": [message.to],
                "subject": message.subject,
                "text": message.body,
            }))
            .send()
            .await
            .map_err(|e| e.to_string())?;

        if !response.status().is_success() {
            return Err(format!("mail provider returned {}", response.status()));
        }

        Ok(())
    }
}

/// MockMailer
///
/// Test implementation recording every accepted message, with a switch to
/// simulate provider failure so callers' swallow-and-log behavior can be
/// asserted.
#[derive(Default)]
pub struct MockMailer {
    pub sent: Mutex<Vec<EmailMessage>>,
    pub should_fail: bool,
}

impl MockMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        Self {
            sent: Mutex::new(vec![]),
            should_fail: true,
        }
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().map(|s| s.len()).unwrap_or(0)
    }
}

#[async_trait]
impl Mailer for MockMailer {
    async fn send(&self, message: EmailMessage) -> Result<(), String> {
        if self.should_fail {
            return Err("mock mail failure".to_string());
        }
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(message);
        }
        Ok(())
    }
}
