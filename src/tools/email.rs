//! Outbound email through the Resend HTTP API
//!
//! One `POST` per message with bearer authentication. Resend answers `200`
//! or `202` on acceptance; anything else is reported as a delivery error
//! carrying the status code and response body.

use crate::types::{AppError, Result};
use crate::utils::toml_config::DeliveryConfig;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// A rendered message ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub subject: String,
    pub html: String,
}

#[derive(Debug, Serialize)]
struct ResendPayload<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
}

#[derive(Debug, Clone)]
pub struct ResendMailer {
    client: Client,
    api_url: String,
    api_key: String,
    from: String,
    to: String,
}

impl ResendMailer {
    pub fn new(
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_url: api_url.into(),
            api_key: api_key.into(),
            from: from.into(),
            to: to.into(),
        })
    }

    /// Build a mailer from configuration.
    ///
    /// Returns `Ok(None)` when the API key or the recipient is not available,
    /// which leaves the pipeline able to preview but not send.
    pub fn from_config(config: &DeliveryConfig) -> Result<Option<Self>> {
        let (Some(api_key), Some(to)) = (config.api_key(), config.recipient()) else {
            return Ok(None);
        };

        let from = format!("{} <{}>", config.from_name, config.from_email);
        Self::new(config.api_url.clone(), api_key, from, to).map(Some)
    }

    pub fn recipient(&self) -> &str {
        &self.to
    }

    pub async fn send(&self, message: &EmailMessage) -> Result<()> {
        let payload = ResendPayload {
            from: &self.from,
            to: [&self.to],
            subject: &message.subject,
            html: &message.html,
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| AppError::Delivery(format!("Email request failed: {}", e)))?;

        let status = response.status();
        if status == StatusCode::OK || status == StatusCode::ACCEPTED {
            tracing::info!(to = %self.to, "email accepted by resend");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(AppError::Delivery(format!(
            "Email API returned {}: {}",
            status.as_u16(),
            body
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_shape() {
        let payload = ResendPayload {
            from: "Deep Research <onboarding@resend.dev>",
            to: ["reader@example.com"],
            subject: "Research Report: tides",
            html: "<p>hi</p>",
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["to"][0], "reader@example.com");
        assert_eq!(json["from"], "Deep Research <onboarding@resend.dev>");
        assert_eq!(json["subject"], "Research Report: tides");
    }

    #[test]
    fn test_from_config_without_recipient_is_none() {
        let config = DeliveryConfig {
            api_key_env: "DEEPRESEARCH_TEST_UNSET_KEY".to_string(),
            to_email: None,
            ..Default::default()
        };
        assert!(ResendMailer::from_config(&config).unwrap().is_none());
    }
}
