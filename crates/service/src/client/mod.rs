//! Typed HTTP client for the node and catalog services.
//!
//! Each request type knows how to build its own HTTP request by
//! implementing [`ApiRequest`]; the implementations live next to the
//! handlers that serve them.

use reqwest::{Client, RequestBuilder};
use url::Url;

mod error;

pub use error::ApiError;

pub trait ApiRequest {
    type Response;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError>;
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    pub remote: Url,
    client: Client,
}

impl ApiClient {
    pub fn new(remote: &Url) -> Result<Self, ApiError> {
        let client = Client::builder().build()?;

        Ok(Self {
            remote: remote.clone(),
            client,
        })
    }

    /// Send `request` and decode a JSON response.
    pub async fn call<T>(&self, request: T) -> Result<T::Response, ApiError>
    where
        T: ApiRequest,
        T::Response: serde::de::DeserializeOwned,
    {
        let response = self.send(request).await?;
        Ok(response.json::<T::Response>().await?)
    }

    /// Send `request` and return the raw response body.
    pub async fn call_bytes<T: ApiRequest>(&self, request: T) -> Result<bytes::Bytes, ApiError> {
        let response = self.send(request).await?;
        Ok(response.bytes().await?)
    }

    async fn send<T: ApiRequest>(&self, request: T) -> Result<reqwest::Response, ApiError> {
        let request_builder = request.build_request(&self.remote, &self.client)?;
        let response = request_builder.send().await?;

        if response.status().is_success() {
            Ok(response)
        } else {
            Err(ApiError::HttpStatus(
                response.status(),
                response.text().await?,
            ))
        }
    }

    /// Get the base URL for API requests
    pub fn base_url(&self) -> &Url {
        &self.remote
    }

    /// Get the underlying HTTP client for custom requests
    pub fn http_client(&self) -> &Client {
        &self.client
    }
}
