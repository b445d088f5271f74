// Confirmation email delivery
// Decision: Console mailer for dev mode logs the link instead of sending
// Decision: Delivery failures are logged and swallowed - registration must
// not fail because the mail provider is down

use serde::Serialize;

/// Outbound email payload (Resend API shape).
#[derive(Debug, Clone, Serialize)]
pub struct SendEmail {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
}

/// Email delivery backend.
#[derive(Clone)]
pub enum Mailer {
    /// Log the message instead of sending (dev mode, tests)
    Console,
    /// Resend HTTP API
    Resend {
        client: reqwest::Client,
        api_key: String,
        from: String,
    },
}

impl Mailer {
    pub fn console() -> Self {
        Self::Console
    }

    pub fn resend(api_key: String, from: String) -> Self {
        Self::Resend {
            client: reqwest::Client::new(),
            api_key,
            from,
        }
    }

    /// Send the account-confirmation link to a freshly registered address.
    pub async fn send_confirmation(&self, to: &str, link: &str) {
        match self {
            Self::Console => {
                tracing::info!(%to, %link, "confirmation email (console mailer)");
            }
            Self::Resend {
                client,
                api_key,
                from,
            } => {
                let email = SendEmail {
                    from: from.clone(),
                    to: vec![to.to_string()],
                    subject: "Confirm your email".to_string(),
                    html: format!(r#"<a href="{link}">Confirm your email</a>"#),
                };
                if let Err(e) = Self::deliver(client, api_key, &email).await {
                    tracing::error!(%to, "failed to send confirmation email: {e:#}");
                }
            }
        }
    }

    async fn deliver(
        client: &reqwest::Client,
        api_key: &str,
        email: &SendEmail,
    ) -> anyhow::Result<()> {
        let response = client
            .post("https://api.resend.com/emails")
            .bearer_auth(api_key)
            .json(email)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Resend API error: HTTP {status}: {body}");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_email_serialization() {
        let email = SendEmail {
            from: "noreply@example.com".to_string(),
            to: vec!["bob@example.com".to_string()],
            subject: "Confirm your email".to_string(),
            html: "<a href=\"http://localhost:4000/confirm/abc\">Confirm your email</a>"
                .to_string(),
        };
        let json = serde_json::to_string(&email).unwrap();
        assert!(json.contains("bob@example.com"));
        assert!(json.contains("/confirm/abc"));
    }

    #[tokio::test]
    async fn test_console_mailer_never_fails() {
        Mailer::console()
            .send_confirmation("bob@example.com", "http://localhost:4000/confirm/abc")
            .await;
    }
}
