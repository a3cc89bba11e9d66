use clap::Args;

use service::catalog::ListRequest;
use service::client::ApiError;

#[derive(Args, Debug, Clone)]
pub struct List;

#[derive(Debug, thiserror::Error)]
pub enum ListError {
    #[error("list failed: {0}")]
    Api(#[from] ApiError),
}

#[async_trait::async_trait]
impl crate::op::Op for List {
    type Error = ListError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let files = ctx.catalog.call(ListRequest).await?;
        if files.is_empty() {
            return Ok("No files registered".to_string());
        }

        let lines: Vec<String> = files
            .iter()
            .map(|f| {
                format!(
                    "{}  {:>10}  {}  ({} replicas)",
                    f.fingerprint,
                    f.size,
                    f.name,
                    f.replicas.len()
                )
            })
            .collect();
        Ok(lines.join("\n"))
    }
}
