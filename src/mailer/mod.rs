use async_trait::async_trait;
use serde_json::Value;

/// Outbound notification dispatcher. Delivery is an external concern; the
/// core hands over a recipient, a template name and the template data, and
/// logs failures without retrying.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, recipient: &str, template: &str, data: Value) -> anyhow::Result<()>;
}

/// Dispatcher that records notifications in the log instead of delivering
/// them. Used in development and tests.
#[derive(Debug, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, recipient: &str, template: &str, data: Value) -> anyhow::Result<()> {
        // Template data may carry credential plaintext; log only its shape.
        let fields: Vec<&str> = data
            .as_object()
            .map(|o| o.keys().map(String::as_str).collect())
            .unwrap_or_default();
        tracing::info!(recipient, template, ?fields, "notification dispatched");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn log_mailer_accepts_any_template() {
        let mailer = LogMailer;
        let result = mailer
            .send(
                "officer@example.com",
                "user_welcome",
                json!({ "activation_token": "redacted" }),
            )
            .await;
        assert!(result.is_ok());
    }
}
