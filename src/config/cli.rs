use std::path::PathBuf;

use clap::{Args, ValueHint, builder::BoolishValueParser};

/// Configuration flags shared by every binary entry point.
#[derive(Debug, Args, Default, Clone)]
pub struct ConfigArgs {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "PHARMADESK_CONFIG_FILE",
        value_name = "PATH",
        value_hint = ValueHint::FilePath,
        global = true
    )]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: ConfigOverrides,
}

/// Highest-precedence settings layer.
#[derive(Debug, Args, Default, Clone)]
pub struct ConfigOverrides {
    /// Override the backend base URL.
    #[arg(long = "api-base-url", value_name = "URL", global = true)]
    pub api_base_url: Option<String>,

    /// Override the backend request timeout.
    #[arg(long = "api-timeout-seconds", value_name = "SECONDS", global = true)]
    pub api_timeout_seconds: Option<u64>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub log_json: Option<bool>,

    /// Toggle the resource cache.
    #[arg(
        long = "cache-enabled",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub cache_enabled: Option<bool>,

    /// Override the number of cached resources kept.
    #[arg(long = "cache-capacity", value_name = "COUNT", global = true)]
    pub cache_capacity: Option<u64>,

    /// Override the search quiet interval.
    #[arg(long = "search-debounce-ms", value_name = "MILLIS", global = true)]
    pub search_debounce_ms: Option<u64>,

    /// Override the inventory page size used for pagination bounds.
    #[arg(long = "inventory-page-size", value_name = "COUNT", global = true)]
    pub inventory_page_size: Option<u64>,
}
