use anyhow::Result;
use tokio::io::BufReader;

use super::AppContext;
use sf_docs::mcp::McpServer;

pub async fn run(ctx: &AppContext) -> Result<()> {
    let service = ctx.search_service(false).await?;
    let server = McpServer::new(service, ctx.config.search.clone());

    server
        .run(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
        .await?;
    Ok(())
}
