use std::path::PathBuf;

use clap::Args;

use common::prelude::Fingerprint;
use service::client::ApiError;
use service::node::RetrieveRequest;

#[derive(Args, Debug, Clone)]
pub struct Retrieve {
    /// Fingerprint of the blob to fetch
    pub fingerprint: Fingerprint,

    /// Where to write the blob (defaults to the fingerprint in the current directory)
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum RetrieveError {
    #[error("retrieve failed: {0}")]
    Api(#[from] ApiError),
    #[error("node returned content with fingerprint {0}")]
    Mismatch(Fingerprint),
    #[error("failed to write {0}: {1}")]
    Write(PathBuf, std::io::Error),
}

#[async_trait::async_trait]
impl crate::op::Op for Retrieve {
    type Error = RetrieveError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let data = ctx
            .node
            .call_bytes(RetrieveRequest {
                fingerprint: self.fingerprint.to_string(),
            })
            .await?;

        let actual = Fingerprint::of(&data);
        if actual != self.fingerprint {
            return Err(RetrieveError::Mismatch(actual));
        }

        let output = self
            .output
            .clone()
            .unwrap_or_else(|| PathBuf::from(self.fingerprint.as_str()));
        tokio::fs::write(&output, &data)
            .await
            .map_err(|e| RetrieveError::Write(output.clone(), e))?;

        Ok(format!(
            "Wrote {} bytes to {}",
            data.len(),
            output.display()
        ))
    }
}
