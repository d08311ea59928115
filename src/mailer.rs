use anyhow::Context as _;
use aws_sdk_sesv2::types::{Body, Content, Destination, EmailContent, Message};
use aws_sdk_sesv2::Client as SesClient;
use axum::async_trait;

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> anyhow::Result<()>;
}

/// SES-backed mailer used for password-reset delivery.
#[derive(Clone)]
pub struct SesMailer {
    client: SesClient,
    from_address: String,
}

impl SesMailer {
    pub fn new(client: SesClient, from_address: &str) -> Self {
        Self {
            client,
            from_address: from_address.to_string(),
        }
    }
}

#[async_trait]
impl Mailer for SesMailer {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> anyhow::Result<()> {
        let destination = Destination::builder().to_addresses(to).build();

        let subject = Content::builder()
            .data(subject)
            .charset("UTF-8")
            .build()
            .context("build subject content")?;

        let html = Content::builder()
            .data(html_body)
            .charset("UTF-8")
            .build()
            .context("build html content")?;

        let message = Message::builder()
            .subject(subject)
            .body(Body::builder().html(html).build())
            .build();

        self.client
            .send_email()
            .from_email_address(&self.from_address)
            .destination(destination)
            .content(EmailContent::builder().simple(message).build())
            .send()
            .await
            .context("ses send_email")?;

        Ok(())
    }
}

/// Body of the password-reset email. The raw token appears only here; the
/// store keeps just its hash.
pub fn reset_email_body(frontend_url: &str, raw_token: &str) -> String {
    let link = format!("{}/password/reset/{}", frontend_url, raw_token);
    format!(
        r#"<html>
<body>
    <p>You requested a password reset. Click the link below to choose a new password:</p>
    <p><a href="{link}" target="_blank">Reset your password</a></p>
    <p>If the link does not work, copy this URL into your browser:</p>
    <p>{link}</p>
    <p>The link expires shortly. If you did not request this, you can safely ignore this email.</p>
</body>
</html>"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_body_contains_link_with_raw_token() {
        let body = reset_email_body("https://app.example.com", "abc123");
        assert!(body.contains("https://app.example.com/password/reset/abc123"));
    }
}
