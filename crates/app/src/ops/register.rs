use clap::Args;

use common::prelude::FileRecord;
use service::catalog::RegisterRequest;
use service::client::ApiError;

#[derive(Args, Debug, Clone)]
pub struct Register {
    /// Fingerprint returned by the node upload
    #[arg(long)]
    pub fingerprint: String,

    /// File name to record
    #[arg(long)]
    pub name: String,

    /// File size in bytes
    #[arg(long, allow_negative_numbers = true)]
    pub size: i64,

    /// Node address holding a copy; repeat for more replicas
    #[arg(long = "replica")]
    pub replicas: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum RegisterError {
    #[error("registration failed: {0}")]
    Api(#[from] ApiError),
}

#[async_trait::async_trait]
impl crate::op::Op for Register {
    type Error = RegisterError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        // validation happens on the catalog so the CLI reports its verdict
        let record = FileRecord {
            fingerprint: self.fingerprint.clone(),
            name: self.name.clone(),
            size: self.size,
            replicas: self.replicas.iter().cloned().collect(),
        };

        let registered = ctx.catalog.call(RegisterRequest(record)).await?;
        Ok(format!("{}: {}", registered.message, registered.fingerprint))
    }
}
