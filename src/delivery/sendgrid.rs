use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::Serialize;

use super::{DeliveryClient, DeliveryError};

const DEFAULT_BASE_URL: &str = "https://api.sendgrid.com";
const DEFAULT_FROM_EMAIL: &str = "newsletter@example.com";
const DEFAULT_FROM_NAME: &str = "Newsy";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Clone, Debug)]
pub struct SendGridConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub from_email: String,
    pub from_name: String,
    pub timeout: Duration,
}

impl Default for SendGridConfig {
    fn default() -> Self {
        Self {
            api_key: std::env::var("SENDGRID_API_KEY").ok(),
            base_url: DEFAULT_BASE_URL.to_string(),
            from_email: std::env::var("NEWSY_EMAIL_FROM")
                .unwrap_or_else(|_| DEFAULT_FROM_EMAIL.to_string()),
            from_name: DEFAULT_FROM_NAME.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl SendGridConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(base) = std::env::var("SENDGRID_BASE_URL") {
            cfg.base_url = base;
        }
        cfg
    }
}

/// SendGrid v3 mail-send client.
pub struct SendGridClient {
    http: HttpClient,
    cfg: SendGridConfig,
}

impl SendGridClient {
    pub fn new(cfg: SendGridConfig) -> Result<Self, DeliveryError> {
        let http = HttpClient::builder()
            .timeout(cfg.timeout)
            .build()
            .map_err(DeliveryError::http)?;
        Ok(Self { http, cfg })
    }

    fn resolve_api_key(&self) -> Result<String, DeliveryError> {
        if let Some(key) = &self.cfg.api_key {
            return Ok(key.clone());
        }
        std::env::var("SENDGRID_API_KEY").map_err(|_| DeliveryError::MissingApiKey)
    }

    fn endpoint(&self) -> String {
        format!("{}/v3/mail/send", self.cfg.base_url.trim_end_matches('/'))
    }

    fn build_payload(&self, to: &str, subject: &str, html: &str) -> MailSendRequest {
        MailSendRequest {
            personalizations: vec![Personalization {
                to: vec![Address {
                    email: to.to_string(),
                    name: None,
                }],
            }],
            from: Address {
                email: self.cfg.from_email.clone(),
                name: Some(self.cfg.from_name.clone()),
            },
            subject: subject.to_string(),
            content: vec![Content {
                r#type: "text/html".to_string(),
                value: html.to_string(),
            }],
        }
    }
}

#[async_trait]
impl DeliveryClient for SendGridClient {
    async fn deliver(&self, to: &str, subject: &str, html: &str) -> Result<(), DeliveryError> {
        let api_key = self.resolve_api_key()?;
        let payload = self.build_payload(to, subject, html);

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await
            .map_err(DeliveryError::http)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DeliveryError::Api { status, body });
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct MailSendRequest {
    personalizations: Vec<Personalization>,
    from: Address,
    subject: String,
    content: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Personalization {
    to: Vec<Address>,
}

#[derive(Debug, Serialize)]
struct Address {
    email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

#[derive(Debug, Serialize)]
struct Content {
    r#type: String,
    value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> SendGridClient {
        SendGridClient::new(SendGridConfig {
            api_key: Some("test".into()),
            base_url: DEFAULT_BASE_URL.to_string(),
            from_email: "digest@example.com".into(),
            from_name: "Newsy".into(),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[test]
    fn payload_matches_mail_send_shape() {
        let client = test_client();
        let payload = client.build_payload("reader@example.com", "Today's digest", "<p>hi</p>");
        let value = serde_json::to_value(&payload).unwrap();

        assert_eq!(
            value["personalizations"][0]["to"][0]["email"],
            "reader@example.com"
        );
        assert_eq!(value["from"]["email"], "digest@example.com");
        assert_eq!(value["from"]["name"], "Newsy");
        assert_eq!(value["subject"], "Today's digest");
        assert_eq!(value["content"][0]["type"], "text/html");
        assert_eq!(value["content"][0]["value"], "<p>hi</p>");
    }

    #[test]
    fn endpoint_trims_trailing_slash() {
        let mut cfg = SendGridConfig::default();
        cfg.api_key = Some("test".into());
        cfg.base_url = "https://sendgrid.local/".into();
        let client = SendGridClient::new(cfg).unwrap();
        assert_eq!(client.endpoint(), "https://sendgrid.local/v3/mail/send");
    }
}
