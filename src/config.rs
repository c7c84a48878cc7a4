use std::ops::RangeInclusive;
use std::path::PathBuf;

use chrono::NaiveDate;
use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Toml},
};

/// A single, unified struct holding all application settings. Every field
/// has a default, so a missing settings file still yields a runnable
/// configuration.
#[derive(serde::Deserialize, Debug, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub loader: LoaderConfig,
}

#[derive(serde::Deserialize, Debug, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Connection parameters for the destination database. The table is
/// expected to exist already; no DDL is ever issued.
#[derive(serde::Deserialize, Debug, Clone)]
pub struct DatabaseConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_user")]
    pub user: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_database")]
    pub database: String,
    #[serde(default = "default_table")]
    pub table: String,
}

#[derive(serde::Deserialize, Debug, Clone)]
pub struct LoaderConfig {
    #[serde(default = "default_target_count")]
    pub target_count: u64,
    #[serde(default = "default_batch_size")]
    pub batch_size: u64,
    #[serde(default = "default_user_id_range")]
    pub user_id_range: RangeInclusive<u32>,
    #[serde(default = "default_amount_range")]
    pub amount_range: RangeInclusive<f64>,
    #[serde(default = "default_date_range")]
    pub date_range: RangeInclusive<NaiveDate>,
    /// When set, data generation is fully reproducible.
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    3307
}

fn default_user() -> String {
    "root".to_string()
}

fn default_database() -> String {
    "orders_partition_demo".to_string()
}

fn default_table() -> String {
    "orders_normal".to_string()
}

fn default_target_count() -> u64 {
    1_000_000
}

fn default_batch_size() -> u64 {
    50_000
}

fn default_user_id_range() -> RangeInclusive<u32> {
    1000..=9999
}

fn default_amount_range() -> RangeInclusive<f64> {
    10.0..=5000.0
}

fn default_date_range() -> RangeInclusive<NaiveDate> {
    let start = NaiveDate::from_ymd_opt(2023, 1, 1).expect("valid calendar date");
    let end = NaiveDate::from_ymd_opt(2023, 12, 31).expect("valid calendar date");
    start..=end
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_log_level(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig {
            host: default_host(),
            port: default_port(),
            user: default_user(),
            password: String::new(),
            database: default_database(),
            table: default_table(),
        }
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        LoaderConfig {
            target_count: default_target_count(),
            batch_size: default_batch_size(),
            user_id_range: default_user_id_range(),
            amount_range: default_amount_range(),
            date_range: default_date_range(),
            seed: None,
        }
    }
}

impl Config {
    fn validate(self) -> anyhow::Result<Self> {
        let loader = &self.loader;
        anyhow::ensure!(loader.batch_size > 0, "loader.batch_size must be positive");
        anyhow::ensure!(
            !loader.user_id_range.is_empty(),
            "loader.user_id_range is empty"
        );
        anyhow::ensure!(
            !loader.amount_range.is_empty(),
            "loader.amount_range is empty"
        );
        anyhow::ensure!(
            loader.date_range.start() <= loader.date_range.end(),
            "loader.date_range is empty"
        );
        Ok(self)
    }
}

/// Parses command-line arguments using the clap derive macro.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the TOML settings file.
    #[arg(short, long, default_value = "config/settings.toml")]
    config: PathBuf,

    /// Total number of rows to insert.
    #[arg(long)]
    target_count: Option<u64>,

    /// Rows per multi-row INSERT and per commit.
    #[arg(long)]
    batch_size: Option<u64>,

    /// Seed for reproducible data generation.
    #[arg(long)]
    seed: Option<u64>,
}

/// Loads configuration from the TOML file, `ORDERS_*` environment
/// variables (`ORDERS_DATABASE__PASSWORD=...`), and CLI arguments, in
/// rising order of precedence.
pub fn get_config() -> anyhow::Result<Config> {
    let cli = Cli::parse();

    let mut figment = Figment::new()
        .merge(Toml::file(&cli.config))
        .merge(Env::prefixed("ORDERS_").split("__"));

    if let Some(target_count) = cli.target_count {
        figment = figment.merge(("loader.target_count", target_count));
    }
    if let Some(batch_size) = cli.batch_size {
        figment = figment.merge(("loader.batch_size", batch_size));
    }
    if let Some(seed) = cli.seed {
        figment = figment.merge(("loader.seed", seed));
    }

    let config: Config = figment.extract()?;
    config.validate()
}
