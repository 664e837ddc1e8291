use std::net::SocketAddr;

use todo_api::{
    application::todo_service::TodoServiceImpl,
    config::{AppConfig, StorageBackend},
    domain::repository::TodoRepository,
    http::routing::{self, todos},
    infrastructure::{memory_repo::InMemoryTodoRepository, sqlite_repo::SqliteTodoRepository},
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    match config.storage {
        StorageBackend::Memory => {
            tracing::warn!("using in-memory storage; data is lost on shutdown");
            serve(config.bind_addr, InMemoryTodoRepository::new()).await
        }
        StorageBackend::Sqlite(url) => {
            let repo = SqliteTodoRepository::open(&url).await?;
            tracing::info!(database_url = %url, "storage ready");
            serve(config.bind_addr, repo).await
        }
    }
}

async fn serve<R: TodoRepository + Clone>(addr: SocketAddr, repo: R) -> anyhow::Result<()> {
    let service = TodoServiceImpl::new(repo);
    let router = routing::app(todos::router(todos::AppState { service }));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "listening");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal::ctrl_c;
    let _ = ctrl_c().await;
    tracing::info!("shutdown");
}
