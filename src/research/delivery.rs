//! Delivery stage: Report → email or preview. Never fails the run.

use crate::research::model::{DeliveryMode, DeliveryOutcome, Report};
use crate::research::render::{email_subject, render_report_html};
use crate::tools::email::{EmailMessage, ResendMailer};
use async_trait::async_trait;

#[async_trait]
pub trait Delivery: Send + Sync {
    /// Deliver `report`. Every error is reported as [`DeliveryOutcome::Failed`].
    async fn deliver(&self, report: &Report, mode: DeliveryMode) -> DeliveryOutcome;
}

/// Renders reports to HTML and sends them through Resend.
///
/// Without a mailer (no API key or recipient configured) preview still works
/// and sending reports a failed delivery.
#[derive(Debug, Clone, Default)]
pub struct EmailDelivery {
    mailer: Option<ResendMailer>,
}

impl EmailDelivery {
    pub fn new(mailer: Option<ResendMailer>) -> Self {
        Self { mailer }
    }

    pub fn can_send(&self) -> bool {
        self.mailer.is_some()
    }
}

#[async_trait]
impl Delivery for EmailDelivery {
    async fn deliver(&self, report: &Report, mode: DeliveryMode) -> DeliveryOutcome {
        let html = render_report_html(report);

        match mode {
            DeliveryMode::Preview => {
                tracing::debug!(chars = html.len(), "email preview rendered");
                DeliveryOutcome::Previewed { content: html }
            }
            DeliveryMode::Send => {
                let Some(mailer) = &self.mailer else {
                    tracing::warn!("email delivery requested but no API key or recipient is configured");
                    return DeliveryOutcome::failed("email delivery is not configured (missing API key or recipient)");
                };

                let message = EmailMessage {
                    subject: email_subject(&report.topic),
                    html,
                };
                match mailer.send(&message).await {
                    Ok(()) => DeliveryOutcome::Sent,
                    Err(e) => {
                        tracing::warn!(to = mailer.recipient(), error = %e, "email delivery failed");
                        DeliveryOutcome::failed(e.to_string())
                    }
                }
            }
        }
    }
}
