use anyhow::{Context, Result};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use crate::core::config::Settings;

/// Plain-text mail sent through an HTTP mail API (`POST {MAIL_API_URL}` with a bearer key).
#[derive(Debug, Clone)]
pub(crate) struct Mailer {
    client: Client,
    api_url: String,
    api_key: String,
    from: String,
}

#[derive(Debug, Serialize)]
struct OutgoingMail<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
}

impl Mailer {
    pub(crate) fn from_settings(settings: &Settings) -> Result<Option<Self>> {
        let mail = settings.mail();
        if !mail.is_configured() {
            return Ok(None);
        }

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(mail.timeout_seconds))
            .build()
            .context("Failed to build mail HTTP client")?;

        Ok(Some(Self {
            client,
            api_url: mail.api_url.trim_end_matches('/').to_string(),
            api_key: mail.api_key.clone(),
            from: mail.from.clone(),
        }))
    }

    pub(crate) async fn send(&self, to: &str, subject: &str, text: &str) -> Result<()> {
        let mut request = self.client.post(&self.api_url).json(&OutgoingMail {
            from: &self.from,
            to,
            subject,
            text,
        });
        if !self.api_key.is_empty() {
            request = request.bearer_auth(&self.api_key);
        }

        let response = request.send().await.context("Failed to call mail API")?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Mail API returned status {status}: {body}");
        }

        Ok(())
    }
}

pub(crate) fn progress_report_body(
    student_name: &str,
    academic_year: &str,
    download_url: &str,
    message: Option<&str>,
) -> String {
    let mut body = format!(
        "Good day,\n\nThe IEP progress report of {student_name} for school year {academic_year} \
         is ready.\n\nDownload it here (the link expires soon):\n{download_url}\n"
    );
    if let Some(message) = message.map(str::trim).filter(|value| !value.is_empty()) {
        body.push_str("\nMessage from the teacher:\n");
        body.push_str(message);
        body.push('\n');
    }
    body.push_str("\nLiterexia");
    body
}
