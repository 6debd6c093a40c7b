// logging.rs
use log::{info, warn};
use std::fs;
use std::path::Path;

/// Initializes log4rs from `config_path`, or env_logger when the file is missing.
pub fn init(config_path: &str) -> anyhow::Result<()> {
    if Path::new(config_path).exists() {
        // Create logs directory if it doesn't exist
        fs::create_dir_all("logs")?;
        log4rs::init_file(config_path, Default::default())?;
        info!("Logging configured from {}", config_path);
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).try_init()?;
        warn!("{} not found, logging to stderr", config_path);
    }
    Ok(())
}
