use anyhow::Context;

use axum::Router;

use tokio::net::TcpListener;

use tracing::{info, warn};

use std::net::SocketAddr;

use crate::{access_log, config::WebConfiguration, controller};

pub async fn run(web_configuration: &WebConfiguration) -> anyhow::Result<()> {
    let routes = controller::create_routes(
        access_log::new_tracing_access_log_sink(),
        web_configuration.request_timeout,
    );

    let listener = create_listener(web_configuration).await?;

    serve(listener, routes).await
}

async fn create_listener(web_configuration: &WebConfiguration) -> anyhow::Result<TcpListener> {
    let bind_address = (web_configuration.address.as_str(), web_configuration.port);

    let tcp_listener = TcpListener::bind(bind_address)
        .await
        .with_context(|| format!("TCP server bind error address = {bind_address:?}"))?;

    let local_addr = tcp_listener
        .local_addr()
        .with_context(|| format!("TCP server local_addr error address = {bind_address:?}"))?;

    info!("starting webserver on {}", local_addr);

    Ok(tcp_listener)
}

async fn serve(listener: TcpListener, routes: Router) -> anyhow::Result<()> {
    axum::serve(
        listener,
        routes.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("axum::serve error")?;

    info!("webserver stopped");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!("error installing ctrl-c handler: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!("error installing SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received");
}
