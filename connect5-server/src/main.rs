use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use connect5_server::{serve, Hub, ServerConfig};
use protocol::{Listener, TcpListener};

#[tokio::main]
async fn main() -> Result<()> {
    let config = ServerConfig::from_env()?;

    // 初始化日志
    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    for directive in config.log_directives() {
        filter = filter.add_directive(directive.parse()?);
    }
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(filter)
        .init();

    info!("五子连珠服务端启动中...");

    let addr = config.network.addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("无法监听 {}", addr))?;

    serve(listener, Arc::new(Hub::new())).await?;

    Ok(())
}
