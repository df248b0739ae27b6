//! MathQuest API server
//!
//! ```text
//! mathquest [config/server.ron]
//! ```
//!
//! `MATHQUEST_LISTEN` overrides the configured listen addresses and
//! `RUST_LOG` tunes log output.

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use mathquest_server::config::LISTEN_ENV;
use mathquest_server::{build_state, handle_request, AppState, Config};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG: &str = "config/server.ron";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("mathquest=info".parse()?))
        .init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG.to_string());

    let mut config = if Path::new(&config_path).exists() {
        info!(path = %config_path, "loading configuration");
        Config::load(&config_path)?
    } else {
        warn!(path = %config_path, "configuration not found, using defaults");
        Config::default()
    };
    config.apply_env();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.worker_threads())
        .enable_all()
        .build()?;

    runtime.block_on(serve(config))
}

async fn serve(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let addrs = config.listen_addrs()?;
    let state = Arc::new(build_state(&config)?);

    let mut handles = Vec::new();
    for addr in addrs {
        let listener = TcpListener::bind(addr).await?;
        info!(%addr, "listening");
        handles.push(tokio::spawn(accept_loop(listener, state.clone())));
    }

    info!(
        storage = ?config.storage,
        workers = config.worker_threads(),
        listen_env = LISTEN_ENV,
        "server started"
    );

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("shutting down");
        }
        _ = async {
            for handle in handles {
                let _ = handle.await;
            }
        } => {}
    }

    Ok(())
}

async fn accept_loop(listener: TcpListener, state: Arc<AppState>) {
    loop {
        let (stream, remote_addr): (_, SocketAddr) = match listener.accept().await {
            Ok(conn) => conn,
            Err(e) => {
                warn!(error = %e, "accept error");
                continue;
            }
        };

        let state = state.clone();
        tokio::spawn(async move {
            let io = TokioIo::new(stream);
            let service = service_fn(move |req| {
                let state = state.clone();
                async move { handle_request(state, req).await }
            });

            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                warn!(remote = %remote_addr, error = %e, "connection error");
            }
        });
    }
}
