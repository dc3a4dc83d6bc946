use super::types::*;
use crate::{Error, Result, config::StabilityConfig};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error};

#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(&self, request: GenerationRequest) -> Result<GeneratedImage>;
}

/// Client for the Stability AI v1 `text-to-image` endpoint.
pub struct StabilityClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl StabilityClient {
    pub fn new(config: StabilityConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        let endpoint = format!(
            "{}/v1/generation/{}/text-to-image",
            config.base_url.trim_end_matches('/'),
            config.engine
        );

        Ok(Self {
            client,
            endpoint,
            api_key: config.api_key.filter(|key| !key.trim().is_empty()),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ImageGenerator for StabilityClient {
    async fn generate(&self, request: GenerationRequest) -> Result<GeneratedImage> {
        let Some(api_key) = self.api_key.as_deref() else {
            error!("STABILITY_API_KEY not configured; refusing to call upstream");
            return Err(Error::misconfigured("STABILITY_API_KEY not configured on server."));
        };

        debug!(
            "Requesting {}x{} image ({} steps, {} samples)",
            request.width, request.height, request.steps, request.samples
        );

        let response = self
            .client
            .post(&self.endpoint)
            .header(AUTHORIZATION, format!("Bearer {}", api_key))
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .json(&TextToImageBody::from(&request))
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let text = response.text().await.map_err(transport_error)?;

        if !status.is_success() {
            error!("Stability API error: {} {}", status.as_u16(), text);
            return Err(Error::Upstream {
                status,
                details: text,
            });
        }

        let body: Value = serde_json::from_str(&text)
            .map_err(|e| Error::server(format!("Malformed upstream response: {}", e)))?;

        match first_artifact_base64(&body) {
            Some(b64) => {
                debug!("Received image ({} base64 chars)", b64.len());
                Ok(GeneratedImage::from_base64(b64))
            }
            None => {
                error!("Stability API response contained no image");
                Err(Error::NoImageReturned { raw: body })
            }
        }
    }
}

fn transport_error(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        error!("Stability API request timed out: {}", e);
        Error::server(format!("Upstream request timed out: {}", e))
    } else {
        error!("Stability API request failed: {}", e);
        Error::server(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn create_test_config() -> StabilityConfig {
        StabilityConfig {
            base_url: "https://api.stability.ai/".to_string(),
            engine: "stable-diffusion-xl-1024-v1-0".to_string(),
            api_key: Some("test-api-key".to_string()),
            timeout_secs: 5,
        }
    }

    #[test]
    fn test_endpoint_construction() {
        let client = StabilityClient::new(create_test_config()).unwrap();
        assert_eq!(
            client.endpoint(),
            "https://api.stability.ai/v1/generation/stable-diffusion-xl-1024-v1-0/text-to-image"
        );
    }

    #[test]
    fn test_blank_api_key_treated_as_missing() {
        let mut config = create_test_config();
        config.api_key = Some("".to_string());
        let client = StabilityClient::new(config).unwrap();
        assert!(client.api_key.is_none());
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_without_call() {
        let mut config = create_test_config();
        // Unroutable: any attempt to connect would surface as a server error.
        config.base_url = "http://127.0.0.1:9".to_string();
        config.api_key = None;
        let client = StabilityClient::new(config).unwrap();

        let err = client
            .generate(GenerationRequest::new("a cat"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ServerMisconfigured(_)));
        assert_eq!(err.kind(), "server_config");
    }
}
