use anyhow::{Context, Result};
use clap::Parser;

use icm::app::App;
use icm::cli::Options;
use icm::config::{Config, EnvOverrides};
use icm::logging;
use icm::shutdown::ShutdownGuard;

#[tokio::main]
async fn main() -> Result<()> {
    let options = Options::parse();

    // A broken config file must not stop startup
    let (config, config_error) = match Config::load() {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };

    let logger = logging::global()
        .init(config.logger_config(&EnvOverrides::from_env()))
        .context("Failed to initialize logger")?;
    let guard = ShutdownGuard::new(logger);

    // Route tracing events into the logger BEFORE any tracing calls
    logging::init_tracing(guard.logger());

    if let Some(e) = config_error {
        tracing::warn!("Using default config: {:#}", e);
        guard.logger().post_error(format!("config ignored: {:#}", e));
    }
    tracing::debug!("options: {}", options.summary());

    let mut app = App::new(std::sync::Arc::clone(guard.logger()), options)?;
    app.run().await
}
