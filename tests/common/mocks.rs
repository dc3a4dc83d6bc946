use async_trait::async_trait;
use axum::http::StatusCode;
use imagegen_relay::{
    Error, Result,
    stability::{GeneratedImage, GenerationRequest, ImageGenerator},
};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Canned outcome for [`MockImageGenerator`].
#[derive(Debug, Clone)]
pub enum MockOutcome {
    Image(String),
    Upstream(StatusCode, String),
    NoImage(Value),
    Misconfigured,
    ServerError(String),
}

/// Stub generator that records every request it receives.
#[derive(Debug, Clone)]
pub struct MockImageGenerator {
    pub requests: Arc<Mutex<Vec<GenerationRequest>>>,
    pub outcome: MockOutcome,
    pub delay: Option<Duration>,
}

impl MockImageGenerator {
    pub fn new() -> Self {
        Self {
            requests: Arc::new(Mutex::new(Vec::new())),
            outcome: MockOutcome::Image("AAA=".to_string()),
            delay: None,
        }
    }

    pub fn with_outcome(mut self, outcome: MockOutcome) -> Self {
        self.outcome = outcome;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn get_requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ImageGenerator for MockImageGenerator {
    async fn generate(&self, request: GenerationRequest) -> Result<GeneratedImage> {
        self.requests.lock().unwrap().push(request);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match &self.outcome {
            MockOutcome::Image(b64) => Ok(GeneratedImage::from_base64(b64.clone())),
            MockOutcome::Upstream(status, details) => Err(Error::Upstream {
                status: *status,
                details: details.clone(),
            }),
            MockOutcome::NoImage(raw) => Err(Error::NoImageReturned { raw: raw.clone() }),
            MockOutcome::Misconfigured => Err(Error::misconfigured(
                "STABILITY_API_KEY not configured on server.",
            )),
            MockOutcome::ServerError(msg) => Err(Error::server(msg.clone())),
        }
    }
}

impl Default for MockImageGenerator {
    fn default() -> Self {
        Self::new()
    }
}
