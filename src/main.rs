use std::sync::Arc;
use tokio::net::TcpListener;

mod config;
mod handler;
mod http;
mod logger;
mod server;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = config::Config::load()?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: config::Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.socket_addr()?;
    let state = Arc::new(config::AppState::new(&cfg)?);

    // A taken port (second instance) fails here and exits non-zero
    let listener = TcpListener::bind(addr).await?;

    logger::log_server_start(&listener.local_addr()?, &state.root);

    server::run(listener, state).await;
    Ok(())
}
