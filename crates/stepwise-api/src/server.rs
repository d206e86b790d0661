//! API server.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use crate::http::routes::create_router;
use crate::state::AppState;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

/// The HTTP and WebSocket server.
pub struct ApiServer {
    config: ServerConfig,
    state: Arc<AppState>,
}

impl ApiServer {
    pub fn new(config: ServerConfig, state: Arc<AppState>) -> Self {
        Self { config, state }
    }

    /// Get the server address.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.config.host, self.config.port)
    }

    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    /// Serve until Ctrl-C.
    pub async fn run(&self) -> Result<(), Box<dyn std::error::Error>> {
        self.run_until(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await
    }

    /// Serve until `shutdown` resolves, then let open requests finish.
    pub async fn run_until<F>(&self, shutdown: F) -> Result<(), Box<dyn std::error::Error>>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr: SocketAddr = self.addr().parse()?;
        let listener = TcpListener::bind(addr).await?;
        self.serve(listener, shutdown).await
    }

    /// Serve on an already bound listener.
    pub async fn serve<F>(
        &self,
        listener: TcpListener,
        shutdown: F,
    ) -> Result<(), Box<dyn std::error::Error>>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = create_router(self.state.clone());
        info!("Stepwise server listening on {}", listener.local_addr()?);
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;
        info!("Server stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stepwise_config::Config;
    use stepwise_runtime::ScriptedAgentFactory;

    fn test_state() -> Arc<AppState> {
        let factory = Arc::new(ScriptedAgentFactory::new(Vec::new()));
        Arc::new(AppState::from_config(factory, &Config::default()))
    }

    #[test]
    fn test_server_config_default() {
        let config = ServerConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8000);
    }

    #[test]
    fn test_server_addr_format() {
        let server = ApiServer::new(ServerConfig::new("0.0.0.0", 3000), test_state());
        assert_eq!(server.addr(), "0.0.0.0:3000");
    }

    #[tokio::test]
    async fn test_invalid_addr_is_error() {
        let server = ApiServer::new(ServerConfig::new("not a host", 3000), test_state());
        assert!(server.run_until(async {}).await.is_err());
    }

    #[tokio::test]
    async fn test_graceful_shutdown() {
        let server = ApiServer::new(ServerConfig::new("127.0.0.1", 0), test_state());
        // Shutdown resolves immediately, so serving returns.
        assert!(server.run_until(async {}).await.is_ok());
    }
}
