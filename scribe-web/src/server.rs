//! Scribe Web Server
//!
//! Binds the listener, runs the rate limiter sweep and serves the router
//! until Ctrl-C.

use crate::state::SweepReport;
use crate::{create_app, AppState, WebError, WebResult};
use axum::serve;
use scribe_core::{AuthMode, ScribeConfig};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

/// Main Scribe web server
pub struct ScribeServer {
    config: ScribeConfig,
    state: AppState,
}

impl ScribeServer {
    /// Validate the configuration and build the shared state
    pub fn new(config: ScribeConfig) -> WebResult<Self> {
        let state = AppState::new(config.clone())?;
        Ok(Self { config, state })
    }

    /// Start the web server
    pub async fn start(self) -> WebResult<()> {
        let address = self.config.server.address();

        info!(
            address = %address,
            dev_mode = self.config.server.dev_mode,
            auth_mode = ?self.config.auth.mode,
            "Starting Scribe web server"
        );
        if self.config.server.dev_mode && self.config.auth.mode == AuthMode::Open {
            warn!("Authentication is disabled; anonymous callers are only IP rate limited");
        }

        let app = create_app(self.state.clone());

        let listener = TcpListener::bind(&address)
            .await
            .map_err(WebError::Server)?;

        info!("Server listening on http://{}", address);

        // Drop expired rate limit windows and past usage periods
        let sweep_state = self.state.clone();
        let sweep_every = Duration::from_secs(self.config.rate_limits.sweep_interval_secs.max(1));
        let sweeper = tokio::spawn(async move {
            let mut interval = tokio::time::interval(sweep_every);
            loop {
                interval.tick().await;
                let report = sweep_state.sweep();
                if report != SweepReport::default() {
                    debug!(
                        rate_limit_windows = report.rate_limit_windows,
                        usage_periods = report.usage_periods,
                        "Sweep removed stale entries"
                    );
                }
            }
        });

        let result = serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await;

        sweeper.abort();

        if let Err(e) = result {
            error!("Server error: {}", e);
            return Err(WebError::Server(e));
        }

        info!("Server stopped");
        Ok(())
    }

    /// Get server configuration
    pub fn config(&self) -> &ScribeConfig {
        &self.config
    }

    /// Get application state
    pub fn state(&self) -> &AppState {
        &self.state
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Failed to listen for the shutdown signal: {}", e),
    }
}

/// Builder for ScribeServer
pub struct ScribeServerBuilder {
    config: ScribeConfig,
}

impl ScribeServerBuilder {
    pub fn new() -> Self {
        Self {
            config: ScribeConfig::default(),
        }
    }

    /// Start from an already loaded configuration
    pub fn with_config(config: ScribeConfig) -> Self {
        Self { config }
    }

    pub fn host<S: Into<String>>(mut self, host: S) -> Self {
        self.config.server.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.server.port = port;
        self
    }

    /// Development mode relaxes the JWT secret requirement
    pub fn dev_mode(mut self, dev_mode: bool) -> Self {
        self.config.server.dev_mode = dev_mode;
        self
    }

    pub fn auth_mode(mut self, mode: AuthMode) -> Self {
        self.config.auth.mode = mode;
        self
    }

    pub fn build(self) -> WebResult<ScribeServer> {
        ScribeServer::new(self.config)
    }
}

impl Default for ScribeServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
