use log::LevelFilter;
use std::env;
use std::ffi::OsString;
use std::path::PathBuf;

pub const DEFAULT_PROMPT: &str = "$ ";
pub const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Warn;

/// Settings read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Raw `PATH`, searched for executables.
    pub search_path: Option<OsString>,
    /// `HOME`, used by `cd` without arguments and for `~`.
    pub home: Option<PathBuf>,
    pub prompt: String,
    pub log_level: LevelFilter,
    /// Log to this file instead of stderr.
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            search_path: None,
            home: None,
            prompt: DEFAULT_PROMPT.to_string(),
            log_level: DEFAULT_LOG_LEVEL,
            log_file: None,
        }
    }
}

impl Config {
    /// Builds the configuration from `PATH`, `HOME`, `MINISHELL_PROMPT`,
    /// `MINISHELL_LOG` and `MINISHELL_LOG_FILE`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var_os(key))
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<OsString>) -> Self {
        let text = |key: &str| lookup(key).and_then(|v| v.into_string().ok());

        Self {
            search_path: lookup("PATH"),
            home: lookup("HOME").filter(|h| !h.is_empty()).map(PathBuf::from),
            prompt: text("MINISHELL_PROMPT").unwrap_or_else(|| DEFAULT_PROMPT.to_string()),
            log_level: text("MINISHELL_LOG")
                .and_then(|level| level.trim().parse().ok())
                .unwrap_or(DEFAULT_LOG_LEVEL),
            log_file: lookup("MINISHELL_LOG_FILE")
                .filter(|f| !f.is_empty())
                .map(PathBuf::from),
        }
    }
}
