#![forbid(unsafe_code)]

use graft_server::{bootstrap, build_router, init_tracing, ServerConfig};
use tokio::net::TcpListener;
use tracing::{error, info, warn};

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match (
            signal(SignalKind::terminate()),
            signal(SignalKind::interrupt()),
        ) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => {}
                    _ = sigint.recv() => {}
                }
            }
            _ => {
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

#[tokio::main]
async fn main() -> Result<(), String> {
    let config = ServerConfig::from_env();
    init_tracing(config.log_json);
    if config.uses_dev_cursor_secret() {
        warn!("GRAFT_CURSOR_SECRET is unset; using the development cursor secret");
    }

    let state = match bootstrap(&config) {
        Ok(state) => state,
        Err(e) => {
            error!("startup aborted: {e}");
            std::process::exit(i32::from(e.exit_code() as u8));
        }
    };
    info!(
        fields = state.registry.len(),
        max_page_size = config.limits.max_page_size,
        "graft-server configured"
    );
    let app = build_router(state);

    let addr: std::net::SocketAddr = config
        .bind
        .parse()
        .map_err(|e| format!("invalid bind addr {}: {e}", config.bind))?;
    let socket = if addr.is_ipv4() {
        tokio::net::TcpSocket::new_v4().map_err(|e| format!("socket v4 failed: {e}"))?
    } else {
        tokio::net::TcpSocket::new_v6().map_err(|e| format!("socket v6 failed: {e}"))?
    };
    socket
        .set_reuseaddr(true)
        .map_err(|e| format!("set_reuseaddr failed: {e}"))?;
    socket.bind(addr).map_err(|e| format!("bind failed: {e}"))?;
    let listener: TcpListener = socket
        .listen(1024)
        .map_err(|e| format!("listen failed: {e}"))?;
    info!("graft-server listening on {}", config.bind);
    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown_signal())
        .await
        .map_err(|e| format!("server failed: {e}"))
}
