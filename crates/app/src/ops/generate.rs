use std::path::PathBuf;

use clap::Args;

use service::catalog::GenerateRequest;
use service::client::ApiError;

const MAX_IMAGES: usize = 2;

#[derive(Args, Debug, Clone)]
pub struct Generate {
    /// Text prompt for the image
    pub prompt: String,

    /// Reference image; may be given twice
    #[arg(long = "image")]
    pub images: Vec<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("at most 2 reference images are accepted")]
    TooManyImages,
    #[error("failed to read {0}: {1}")]
    Read(PathBuf, std::io::Error),
    #[error("generation failed: {0}")]
    Api(#[from] ApiError),
    #[error("could not format response: {0}")]
    Format(#[from] serde_json::Error),
}

#[async_trait::async_trait]
impl crate::op::Op for Generate {
    type Error = GenerateError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        if self.images.len() > MAX_IMAGES {
            return Err(GenerateError::TooManyImages);
        }

        let mut images = Vec::with_capacity(self.images.len());
        for path in &self.images {
            let data = tokio::fs::read(path)
                .await
                .map_err(|e| GenerateError::Read(path.clone(), e))?;
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "image".to_string());
            images.push((name, data));
        }

        let response = ctx
            .catalog
            .call(GenerateRequest {
                prompt: self.prompt.clone(),
                images,
            })
            .await?;

        Ok(serde_json::to_string_pretty(&response)?)
    }
}
