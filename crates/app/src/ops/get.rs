use clap::Args;

use common::prelude::FileRecord;
use service::catalog::GetRequest;
use service::client::ApiError;

#[derive(Args, Debug, Clone)]
pub struct Get {
    /// Fingerprint to look up
    pub fingerprint: String,
}

#[derive(Debug, thiserror::Error)]
pub enum GetError {
    #[error("lookup failed: {0}")]
    Api(#[from] ApiError),
}

pub fn describe(record: &FileRecord) -> String {
    let mut lines = vec![
        record.name.clone(),
        format!("  fingerprint: {}", record.fingerprint),
        format!("  size: {} bytes", record.size),
    ];
    if record.replicas.is_empty() {
        lines.push("  replicas: none".to_string());
    } else {
        lines.push("  replicas:".to_string());
        lines.extend(record.replicas.iter().map(|r| format!("    {}", r)));
    }
    lines.join("\n")
}

#[async_trait::async_trait]
impl crate::op::Op for Get {
    type Error = GetError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let record = ctx
            .catalog
            .call(GetRequest {
                fingerprint: self.fingerprint.clone(),
            })
            .await?;
        Ok(describe(&record))
    }
}

#[cfg(test)]
mod tests {
    use common::prelude::Fingerprint;

    use super::*;

    #[test]
    fn test_describe() {
        let record = FileRecord::new(&Fingerprint::of(b"hello"), "hello.txt", 5)
            .with_replica("http://localhost:8001");
        let text = describe(&record);
        assert!(text.starts_with("hello.txt\n"));
        assert!(text.contains("size: 5 bytes"));
        assert!(text.contains("    http://localhost:8001"));

        let bare = FileRecord::new(&Fingerprint::of(b"hello"), "hello.txt", 5);
        assert!(describe(&bare).contains("replicas: none"));
    }
}
