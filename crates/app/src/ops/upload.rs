use std::path::PathBuf;

use clap::Args;

use common::prelude::FileRecord;
use service::catalog::RegisterRequest;
use service::client::ApiError;
use service::node::UploadRequest;

#[derive(Args, Debug, Clone)]
pub struct Upload {
    /// File to store on the node
    pub path: PathBuf,

    /// Name to record for the file (defaults to the file name)
    #[arg(long)]
    pub name: Option<String>,

    /// Also register the file in the catalog with this node as its replica
    #[arg(long)]
    pub register: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("failed to read {0}: {1}")]
    Read(PathBuf, std::io::Error),
    #[error("upload failed: {0}")]
    Upload(#[source] ApiError),
    #[error("stored on node but registration failed: {0}")]
    Register(#[source] ApiError),
}

impl Upload {
    fn file_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| {
            self.path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "unnamed".to_string())
        })
    }
}

#[async_trait::async_trait]
impl crate::op::Op for Upload {
    type Error = UploadError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let data = tokio::fs::read(&self.path)
            .await
            .map_err(|e| UploadError::Read(self.path.clone(), e))?;
        let name = self.file_name();

        let uploaded = ctx
            .node
            .call(UploadRequest {
                filename: name.clone(),
                data,
            })
            .await
            .map_err(UploadError::Upload)?;

        let mut output = format!(
            "Stored {} on {}\n  fingerprint: {}\n  size: {} bytes",
            name,
            ctx.node_address(),
            uploaded.fingerprint,
            uploaded.size
        );

        if self.register {
            let record = FileRecord::new(&uploaded.fingerprint, name, uploaded.size as i64)
                .with_replica(ctx.node_address());
            let registered = ctx
                .catalog
                .call(RegisterRequest(record))
                .await
                .map_err(UploadError::Register)?;
            output.push_str(&format!("\n{}", registered.message));
        }

        Ok(output)
    }
}
