use std::sync::Arc;
use tokio::sync::watch;

mod config;
mod handler;
mod http;
mod invocation;
mod logger;
mod server;
mod trigger;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Optional config file path (without extension), defaults to ./config
    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config".to_string());
    let cfg = config::Config::load_from(&config_path)?;

    logger::init(&cfg)?;

    // Create Tokio runtime, sized by the workers setting
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();

    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }

    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: config::Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.socket_addr()?;

    // Bind before announcing readiness; the host starts forwarding once we log
    let listener = server::bind_listener(addr, cfg.server.backlog)?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    server::install_shutdown_handler(shutdown_tx)?;

    logger::log_server_start(&listener.local_addr()?, &cfg);

    let state = Arc::new(config::AppState::new(cfg));
    server::run(listener, state, shutdown_rx).await?;

    Ok(())
}
