use std::sync::Arc;

mod api;
mod auth;
mod config;
mod http;
mod logger;
mod model;
mod server;
mod store;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Config file path without extension, e.g. `mealease /etc/mealease/config`
    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config".to_string());
    let cfg = config::Config::load_from(&config_path)?;
    logger::init(&cfg.logging)?;

    // Create Tokio runtime, worker count from config (default: CPU cores)
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: config::Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;

    if cfg.auth.jwt_secret == config::DEFAULT_JWT_SECRET {
        logger::log_warning(
            "auth.jwt_secret is the built-in default; set MEALEASE_AUTH__JWT_SECRET before deploying",
        );
    }

    let store = store::Store::open(&cfg.storage).await?;
    let listener = server::create_listener(addr)?;
    let state = Arc::new(config::AppState::new(cfg, store));

    logger::log_server_start(&addr, &state.config, state.store.backend_name());
    server::start_signal_handler(Arc::clone(&state))?;

    server::start_server_loop(listener, state).await?;
    Ok(())
}
