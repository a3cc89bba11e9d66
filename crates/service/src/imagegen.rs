//! Client for the remote image generation API used by the catalog's
//! proxy endpoint.

use std::time::Duration;

use base64::Engine;
use bytes::Bytes;
use reqwest::Client;
use serde::Serialize;
use url::Url;

pub const DEFAULT_ENDPOINT: &str = "https://api.kie.ai/api/v1/jobs/createTask";
/// Environment variable holding the upstream API key.
pub const API_KEY_ENV: &str = "MINIDROP_IMAGEGEN_API_KEY";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(90);

#[derive(Debug, Clone)]
pub struct ImageGenConfig {
    pub endpoint: Url,
    pub api_key: String,
    pub timeout: Duration,
}

impl ImageGenConfig {
    pub fn new(endpoint: Url, api_key: impl Into<String>) -> Self {
        Self {
            endpoint,
            api_key: api_key.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Build a config from [`API_KEY_ENV`]. Returns `None` when the
    ///  variable is unset or empty.
    pub fn from_env(endpoint: Url) -> Option<Self> {
        std::env::var(API_KEY_ENV)
            .ok()
            .filter(|key| !key.is_empty())
            .map(|key| Self::new(endpoint, key))
    }
}

#[derive(Debug, Serialize)]
struct CreateTaskRequest<'a> {
    prompt: &'a str,
    image_size: &'a str,
    image_resolution: &'a str,
    max_images: u32,
    seed: u64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    reference_images: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ImageGenError {
    #[error("image generation request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("could not decode image generation response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("image generation API returned {status}: {message}")]
    Status {
        status: reqwest::StatusCode,
        message: String,
    },
    #[error("image generation API did not answer within {0:?}")]
    TimedOut(Duration),
}

#[derive(Debug, Clone)]
pub struct ImageGenClient {
    config: ImageGenConfig,
    client: Client,
}

impl ImageGenClient {
    pub fn new(config: ImageGenConfig) -> Result<Self, ImageGenError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }

    pub fn endpoint(&self) -> &Url {
        &self.config.endpoint
    }

    pub fn timeout(&self) -> Duration {
        self.config.timeout
    }

    /// Submit a generation task with up to two reference images and
    ///  return the upstream JSON untouched.
    pub async fn generate(
        &self,
        prompt: &str,
        images: &[Bytes],
    ) -> Result<serde_json::Value, ImageGenError> {
        let reference_images = images
            .iter()
            .filter(|image| !image.is_empty())
            .map(|image| {
                format!(
                    "data:application/octet-stream;base64,{}",
                    base64::engine::general_purpose::STANDARD.encode(image)
                )
            })
            .collect();

        let request = CreateTaskRequest {
            prompt,
            image_size: "portrait_3_4",
            image_resolution: "4K",
            max_images: 1,
            seed: 54321,
            reference_images,
        };

        let response = self
            .client
            .post(self.config.endpoint.clone())
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            let message = serde_json::from_slice::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
                .unwrap_or_else(|| format!("bad status: {}", status.as_u16()));
            return Err(ImageGenError::Status { status, message });
        }

        Ok(serde_json::from_slice(&body)?)
    }
}
