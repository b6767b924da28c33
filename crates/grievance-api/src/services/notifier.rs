//! Submission confirmation messages.
//!
//! Confirmations go only to non-anonymous complainants who left an e-mail
//! address. Delivery is advisory: callers log failures and move on.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info, warn};

use grievance_core::defaults::NOTIFY_TIMEOUT_SECS;
use grievance_core::{Error, Grievance, Notifier, OutboundMessage, Result};

/// Build the confirmation for a freshly stored grievance, if one is due.
pub fn confirmation_message(grievance: &Grievance) -> Option<OutboundMessage> {
    if grievance.is_anonymous {
        return None;
    }
    let to = grievance.complainant_email.as_deref()?.trim();
    if to.is_empty() {
        return None;
    }

    let greeting = match grievance.complainant_name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => format!("Dear {},", name),
        _ => "Dear Complainant,".to_string(),
    };

    let body = format!(
        "{greeting}\n\n\
         Thank you for submitting your grievance to Vaka Sosiale.\n\n\
         Your grievance has been received and assigned the tracking number:\n\
         {id}\n\n\
         You can use this tracking number to check the status of your grievance at any time.\n\n\
         We will review your submission and update you on the progress.\n\n\
         Best regards,\n\
         Vaka Sosiale Grievance Team\n",
        greeting = greeting,
        id = grievance.id,
    );

    Some(OutboundMessage {
        to: to.to_string(),
        subject: format!("Grievance Confirmation - {}", grievance.id),
        body,
    })
}

/// Send in the background; failures are logged only.
pub fn dispatch(notifier: std::sync::Arc<dyn Notifier>, message: OutboundMessage, grievance_id: String) {
    tokio::spawn(async move {
        match notifier.send(&message).await {
            Ok(()) => debug!(
                subsystem = "api",
                component = "notifier",
                grievance_id = %grievance_id,
                "Confirmation sent"
            ),
            Err(e) => warn!(
                subsystem = "api",
                component = "notifier",
                grievance_id = %grievance_id,
                error = %e,
                "Confirmation delivery failed"
            ),
        }
    });
}

// =============================================================================
// IMPLEMENTATIONS
// =============================================================================

/// Logs messages instead of delivering them.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, message: &OutboundMessage) -> Result<()> {
        info!(
            subsystem = "api",
            component = "notifier",
            to = %message.to,
            subject = %message.subject,
            "Confirmation (log only, no mail relay configured)"
        );
        Ok(())
    }
}

#[derive(Serialize)]
struct RelayRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
}

/// Posts messages as JSON to an HTTP mail relay.
pub struct HttpMailNotifier {
    client: reqwest::Client,
    endpoint: String,
    from: String,
    api_key: Option<String>,
}

impl HttpMailNotifier {
    pub fn new(endpoint: impl Into<String>, from: impl Into<String>, api_key: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(NOTIFY_TIMEOUT_SECS))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            from: from.into(),
            api_key,
        })
    }
}

#[async_trait]
impl Notifier for HttpMailNotifier {
    async fn send(&self, message: &OutboundMessage) -> Result<()> {
        let mut request = self.client.post(&self.endpoint).json(&RelayRequest {
            from: &self.from,
            to: &message.to,
            subject: &message.subject,
            text: &message.body,
        });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Notification(format!("mail relay unreachable: {}", e)))?;
        if !response.status().is_success() {
            return Err(Error::Notification(format!(
                "mail relay returned {}",
                response.status()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use grievance_core::NewGrievance;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn grievance(anonymous: bool, name: Option<&str>, email: Option<&str>) -> Grievance {
        Grievance::create(
            "GRV-01K75H29FXZKT9QS3YQY1Z3GQ8".to_string(),
            NewGrievance {
                is_anonymous: anonymous,
                complainant_name: name.map(String::from),
                complainant_email: email.map(String::from),
                ..Default::default()
            },
            Utc::now(),
        )
    }

    #[test]
    fn test_no_message_for_anonymous_or_missing_email() {
        assert!(confirmation_message(&grievance(true, Some("Tia"), Some("tia@example.org"))).is_none());
        assert!(confirmation_message(&grievance(false, Some("Tia"), None)).is_none());
    }

    #[test]
    fn test_message_contents() {
        let msg = confirmation_message(&grievance(false, Some("Tia"), Some("tia@example.org"))).unwrap();
        assert_eq!(msg.to, "tia@example.org");
        assert_eq!(msg.subject, "Grievance Confirmation - GRV-01K75H29FXZKT9QS3YQY1Z3GQ8");
        assert!(msg.body.starts_with("Dear Tia,"));
        assert!(msg.body.contains("GRV-01K75H29FXZKT9QS3YQY1Z3GQ8"));

        let msg = confirmation_message(&grievance(false, None, Some("x@example.org"))).unwrap();
        assert!(msg.body.starts_with("Dear Complainant,"));
    }

    #[tokio::test]
    async fn test_http_notifier_posts_to_relay() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/send"))
            .and(header("Authorization", "Bearer relay-key"))
            .and(body_partial_json(serde_json::json!({
                "from": "noreply@grievance.local",
                "to": "tia@example.org"
            })))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = HttpMailNotifier::new(
            format!("{}/send", server.uri()),
            "noreply@grievance.local",
            Some("relay-key".to_string()),
        )
        .unwrap();
        let msg = confirmation_message(&grievance(false, Some("Tia"), Some("tia@example.org"))).unwrap();
        notifier.send(&msg).await.unwrap();
    }

    #[tokio::test]
    async fn test_http_notifier_reports_relay_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let notifier = HttpMailNotifier::new(server.uri(), "noreply@grievance.local", None).unwrap();
        let msg = OutboundMessage {
            to: "a@b.org".into(),
            subject: "s".into(),
            body: "b".into(),
        };
        assert!(matches!(notifier.send(&msg).await, Err(Error::Notification(_))));
    }
}
