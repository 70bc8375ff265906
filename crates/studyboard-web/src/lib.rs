//! studyboard-web - HTTP API for the analytics dashboard

pub mod error;
pub mod router;

pub use error::AppError;
pub use router::create_router;

use anyhow::Result;
use std::net::SocketAddr;
use studyboard_core::AnalyticsService;
use tokio::net::TcpListener;
use tracing::info;

/// Run the web server until Ctrl-C
pub async fn run(service: AnalyticsService, addr: SocketAddr) -> Result<()> {
    let backend = service.backend_kind();
    let router = create_router(service);

    let listener = TcpListener::bind(addr).await?;

    info!(backend, "Web server listening on http://{}", addr);
    println!("Web server listening on http://{}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Web server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
