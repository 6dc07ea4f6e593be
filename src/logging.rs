use crate::config::Config;
use anyhow::Context;
use log::LevelFilter;
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode, WriteLogger};
use std::fs::OpenOptions;

/// Installs the global logger: a file logger when `log_file` is set,
/// stderr otherwise. Does nothing when logging is off.
pub fn init(config: &Config) -> anyhow::Result<()> {
    if config.log_level == LevelFilter::Off {
        return Ok(());
    }

    let log_config = ConfigBuilder::new()
        .set_thread_level(LevelFilter::Off)
        .set_target_level(LevelFilter::Off)
        .build();

    let installed = match &config.log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("opening log file {}", path.display()))?;
            WriteLogger::init(config.log_level, log_config, file)
        }
        None => TermLogger::init(
            config.log_level,
            log_config,
            TerminalMode::Stderr,
            ColorChoice::Auto,
        ),
    };
    installed.context("installing logger")
}
