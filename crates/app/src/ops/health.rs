use std::convert::Infallible;

use clap::Args;

use service::client::ApiClient;

use crate::state::AppState;

#[derive(Args, Debug, Clone)]
pub struct Health;

async fn probe(client: &ApiClient, path: &str) -> String {
    let url = format!(
        "{}{}",
        client.base_url().as_str().trim_end_matches('/'),
        path
    );
    match client.http_client().get(&url).send().await {
        Ok(resp) if resp.status().is_success() => "OK".to_string(),
        Ok(resp) => format!("UNHEALTHY ({})", resp.status()),
        Err(_) => "NOT REACHABLE".to_string(),
    }
}

#[async_trait::async_trait]
impl crate::op::Op for Health {
    type Error = Infallible;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut lines = Vec::new();

        lines.push("Config:".to_string());
        match AppState::load(ctx.config_path.clone()) {
            Ok(state) => {
                lines.push(format!("  directory:    {}", state.minidrop_dir.display()));
                lines.push("  config.toml:  OK".to_string());
                lines.push("  data/:        OK".to_string());
                lines.push(format!("  catalog_port: {}", state.config.catalog_port));
                lines.push(format!("  node_ports:   {:?}", state.config.node_ports));
            }
            Err(e) => {
                lines.push(format!("  error: {}", e));
            }
        }

        lines.push(String::new());
        lines.push(format!("Catalog ({}):", ctx.catalog.base_url()));
        lines.push(format!("  livez:  {}", probe(&ctx.catalog, "/_status/livez").await));
        lines.push(format!("  readyz: {}", probe(&ctx.catalog, "/_status/readyz").await));

        lines.push(String::new());
        lines.push(format!("Node ({}):", ctx.node.base_url()));
        lines.push(format!("  health: {}", probe(&ctx.node, "/health").await));
        lines.push(format!("  readyz: {}", probe(&ctx.node, "/_status/readyz").await));

        Ok(lines.join("\n"))
    }
}
