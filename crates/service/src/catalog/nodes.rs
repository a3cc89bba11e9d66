use axum::extract::{Json, State};
use reqwest::{Client, RequestBuilder};
use url::Url;

use common::prelude::NodeRecord;

use super::CatalogState;
use crate::client::{ApiError, ApiRequest};

pub async fn handler(State(state): State<CatalogState>) -> Json<Vec<NodeRecord>> {
    Json(state.nodes().list_nodes())
}

#[derive(Debug, Clone, Default)]
pub struct NodesRequest;

impl ApiRequest for NodesRequest {
    type Response = Vec<NodeRecord>;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        let full_url = base_url.join("/nodes")?;
        Ok(client.get(full_url))
    }
}
