use axum::extract::{Json, State};
use reqwest::{Client, RequestBuilder};
use url::Url;

use common::prelude::FileRecord;

use super::CatalogState;
use crate::client::{ApiError, ApiRequest};

// The snapshot is taken and the lock released before serialization.
pub async fn handler(State(state): State<CatalogState>) -> Json<Vec<FileRecord>> {
    Json(state.catalog().list_files())
}

#[derive(Debug, Clone, Default)]
pub struct ListRequest;

impl ApiRequest for ListRequest {
    type Response = Vec<FileRecord>;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        let full_url = base_url.join("/list")?;
        Ok(client.get(full_url))
    }
}
