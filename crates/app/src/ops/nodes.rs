use clap::Args;

use common::prelude::NodeStatus;
use service::catalog::NodesRequest;
use service::client::ApiError;

#[derive(Args, Debug, Clone)]
pub struct Nodes;

#[derive(Debug, thiserror::Error)]
pub enum NodesError {
    #[error("node listing failed: {0}")]
    Api(#[from] ApiError),
}

#[async_trait::async_trait]
impl crate::op::Op for Nodes {
    type Error = NodesError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let nodes = ctx.catalog.call(NodesRequest).await?;
        if nodes.is_empty() {
            return Ok("No nodes registered".to_string());
        }

        let lines: Vec<String> = nodes
            .iter()
            .map(|n| {
                let status = match n.status {
                    NodeStatus::Active => "active",
                    NodeStatus::Inactive => "inactive",
                };
                format!("{}  {}", n.address, status)
            })
            .collect();
        Ok(lines.join("\n"))
    }
}
