//! Outbound mail collaborator
//!
//! Mail delivery is plumbing: the platform hands over a recipient, a
//! subject, a template id and its data, and moves on. A delivery failure
//! surfaces as its own error but never rolls back the work that
//! triggered the mail (an issued activation ticket stays valid).

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

/// Narrow interface to whatever delivers mail
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(
        &self,
        to: &str,
        subject: &str,
        template: &str,
        data: serde_json::Value,
    ) -> anyhow::Result<()>;
}

/// Development mailer that only logs what it would send
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(
        &self,
        to: &str,
        subject: &str,
        template: &str,
        data: serde_json::Value,
    ) -> anyhow::Result<()> {
        info!(
            "Mail (log only) to={} subject={:?} template={} data={}",
            to, subject, template, data
        );
        Ok(())
    }
}

/// Mailer that posts to a transactional-mail HTTP endpoint
pub struct HttpMailer {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpMailer {
    pub fn new(endpoint: String) -> Self {
        Self {
            endpoint,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(
        &self,
        to: &str,
        subject: &str,
        template: &str,
        data: serde_json::Value,
    ) -> anyhow::Result<()> {
        let payload = json!({
            "to": to,
            "subject": subject,
            "template": template,
            "data": data,
        });

        let response = self
            .client
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            anyhow::bail!("Mail endpoint returned {}", response.status());
        }

        Ok(())
    }
}

/// Pick a mailer from the environment
///
/// # Environment Variables
/// - `MAILER_URL`: transactional-mail endpoint; when unset, mail is
///   logged instead of delivered
pub fn from_env() -> Arc<dyn Mailer> {
    match std::env::var("MAILER_URL") {
        Ok(endpoint) if !endpoint.is_empty() => Arc::new(HttpMailer::new(endpoint)),
        _ => {
            warn!("MAILER_URL not set, outbound mail will only be logged");
            Arc::new(LogMailer)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_mailer_always_delivers() {
        let mailer = LogMailer;
        let result = mailer
            .send(
                "a@b.com",
                "Account Activation",
                "activation-mail",
                json!({"name": "A", "activation_code": "1234"}),
            )
            .await;
        assert!(result.is_ok());
    }
}
