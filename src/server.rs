//! Server initialization and startup logic for Stepwise.

use std::path::Path;
use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use stepwise_api::{ApiServer, AppState, ServerConfig};
use stepwise_config::{Config, ConfigLoader, ConfigValidator, LoggingConfig};

use crate::register::build_agent_factory;

/// Initialize tracing with console and optional file output.
///
/// Log files rotate daily in `logging.dir`; `RUST_LOG` overrides `logging.level`.
pub(crate) fn init_tracing(logging: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let file_layer = if logging.file {
        let log_dir = logging.log_dir();
        std::fs::create_dir_all(&log_dir)?;

        let file_appender = RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix("stepwise")
            .filename_suffix("log")
            .max_log_files(30)
            .build(&log_dir)?;
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        // Flushes buffered lines on exit
        static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
            std::sync::OnceLock::new();
        let _ = GUARD.set(guard);

        Some(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .boxed(),
        )
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true).with_ansi(true))
        .with(file_layer)
        .init();

    Ok(())
}

/// Load configuration, falling back to defaults when the file is absent.
pub(crate) fn load_config(path: &Path) -> Result<Config, Box<dyn std::error::Error>> {
    Ok(ConfigLoader::load_or_default(path)?)
}

/// Validate configuration. Warnings are logged; any error aborts startup.
pub(crate) fn check_config(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let result = ConfigValidator::validate(config);
    for warning in &result.warnings {
        warn!("Config {}: {}", warning.path, warning.message);
    }
    for err in &result.errors {
        error!("Config {}: {}", err.path, err.message);
    }
    if !result.is_valid() {
        return Err(format!("{} configuration error(s)", result.errors.len()).into());
    }
    Ok(())
}

/// Run the server in foreground until Ctrl-C.
pub(crate) async fn run_server(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    info!("Starting Stepwise v{}", env!("CARGO_PKG_VERSION"));
    check_config(&config)?;

    let factory = build_agent_factory(&config.agent)?;
    let state = Arc::new(AppState::from_config(factory, &config));

    if config.transcript.enabled {
        info!("Transcripts: {}", config.transcript.dir.display());
    } else {
        info!("Transcripts disabled");
    }
    info!(
        "Agent budget: {} steps, step timeout: {}s",
        config.agent.max_steps, config.agent.step_timeout_seconds
    );

    let server = ApiServer::new(
        ServerConfig::new(config.server.host.clone(), config.server.port),
        state,
    );
    info!("WebSocket endpoint: ws://{}/ws/chat/{{client_id}}", server.addr());

    server.run().await
}
