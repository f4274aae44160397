pub mod render;
pub mod sendgrid;

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::StatusCode;

/// Outbound delivery seam. The digest recorder only runs when at least one
/// delivery through this trait succeeded.
#[async_trait]
pub trait DeliveryClient: Send + Sync {
    async fn deliver(&self, to: &str, subject: &str, html: &str) -> Result<(), DeliveryError>;
}

#[derive(Debug)]
pub enum DeliveryError {
    MissingApiKey,
    Http(reqwest::Error),
    Timeout,
    Api { status: StatusCode, body: String },
    MockQueueEmpty,
}

impl DeliveryError {
    pub(crate) fn http(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            DeliveryError::Timeout
        } else {
            DeliveryError::Http(err)
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            DeliveryError::Timeout | DeliveryError::Http(_) => true,
            DeliveryError::Api { status, .. } => status.is_server_error(),
            DeliveryError::MissingApiKey | DeliveryError::MockQueueEmpty => false,
        }
    }
}

impl std::fmt::Display for DeliveryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeliveryError::MissingApiKey => write!(f, "SENDGRID_API_KEY is not set"),
            DeliveryError::Http(err) => write!(f, "http error: {err}"),
            DeliveryError::Timeout => write!(f, "request timed out"),
            DeliveryError::Api { status, body } => write!(f, "api error {status}: {body}"),
            DeliveryError::MockQueueEmpty => write!(f, "mock delivery queue is empty"),
        }
    }
}

impl std::error::Error for DeliveryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DeliveryError::Http(err) => Some(err),
            _ => None,
        }
    }
}

/// Records every send and replays queued outcomes, for orchestration tests.
#[derive(Debug, Default)]
pub struct MockDelivery {
    outcomes: Mutex<VecDeque<Result<(), DeliveryError>>>,
    sends: Mutex<Vec<MockSend>>,
}

#[derive(Debug, Clone)]
pub struct MockSend {
    pub to: String,
    pub subject: String,
    pub html: String,
}

impl MockDelivery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_outcome(&self, outcome: Result<(), DeliveryError>) {
        self.outcomes.lock().unwrap().push_back(outcome);
    }

    pub fn sends(&self) -> Vec<MockSend> {
        self.sends.lock().unwrap().clone()
    }
}

#[async_trait]
impl DeliveryClient for MockDelivery {
    async fn deliver(&self, to: &str, subject: &str, html: &str) -> Result<(), DeliveryError> {
        self.sends.lock().unwrap().push(MockSend {
            to: to.to_string(),
            subject: subject.to_string(),
            html: html.to_string(),
        });
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(DeliveryError::MockQueueEmpty))
    }
}
