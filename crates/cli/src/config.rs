use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};

use alloy::primitives::Address;
use clap::Parser;
use flowbid_core::{RetryPolicy, constants::DEFAULT_AUCTION_ADDRESS};
use reqwest::Url;
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "flowbid.toml";
pub const API_KEY_ENV: &str = "BANKR_API_KEY";

const DEFAULT_POLL_MS: u64 = 1_000;
const DEFAULT_LOG_RETRIES: u32 = 3;
const DEFAULT_RETRY_BASE_MS: u64 = 300;
const DEFAULT_LOG_LEVEL: &str = "info";

fn default_min_native_eth() -> Decimal {
    Decimal::new(1, 4)
}

/// Watches a Flow auction on Base and places bids through the Bankr custody API.
#[derive(Debug, Default, Parser)]
#[command(name = "flowbid", version)]
pub struct CliArgs {
    /// Path to a TOML config file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Primary Base RPC endpoint
    #[arg(long, env = "BASE_RPC_URL", value_name = "URL")]
    pub rpc_url: Option<String>,

    /// Comma separated fallback RPC endpoints
    #[arg(long, env = "BASE_RPC_FALLBACK_URLS", value_name = "URLS")]
    pub rpc_fallback_urls: Option<String>,

    /// Auction contract to watch
    #[arg(long, env = "FLOW_AUCTION_ADDRESS", value_name = "ADDRESS")]
    pub auction: Option<String>,

    /// Log polling interval in milliseconds
    #[arg(long, env = "POLL_MS", value_name = "MS")]
    pub poll_ms: Option<u64>,

    /// Minimum ETH kept for gas before a bid is allowed
    #[arg(long, env = "MIN_NATIVE_ETH", value_name = "ETH")]
    pub min_native_eth: Option<Decimal>,

    /// Retries for a failed log query before the cycle fails
    #[arg(long, env = "MONITOR_LOG_RETRIES", value_name = "N")]
    pub log_retries: Option<u32>,

    /// Base delay of the log query backoff in milliseconds
    #[arg(long, env = "MONITOR_RETRY_BASE_MS", value_name = "MS")]
    pub retry_base_ms: Option<u64>,
}

/// Optional on-disk config. Every field can be overridden by flags or env.
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub rpc_url: Option<String>,
    #[serde(default)]
    pub rpc_fallback_urls: Vec<String>,
    pub auction: Option<String>,
    pub poll_ms: Option<u64>,
    pub min_native_eth: Option<Decimal>,
    pub log_retries: Option<u32>,
    pub retry_base_ms: Option<u64>,
    pub log_level: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub api_key: String,
    /// Primary endpoint first, duplicates removed.
    pub rpc_urls: Vec<Url>,
    pub auction: Address,
    pub poll_interval: Duration,
    pub min_native_eth: Decimal,
    pub retry: RetryPolicy,
    pub log_level: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse toml at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("missing custody api key: set {API_KEY_ENV}")]
    MissingApiKey,
    #[error("missing rpc url: pass --rpc-url or set BASE_RPC_URL")]
    MissingRpcUrl,
    #[error("invalid rpc url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("invalid auction address {value:?}: {reason}")]
    InvalidAddress { value: String, reason: String },
    #[error("{field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: String },
}

pub fn load_config(path: impl AsRef<Path>) -> Result<FileConfig, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// `./flowbid.toml`, else `<config dir>/flowbid/flowbid.toml`, if either exists.
pub fn default_config_path() -> Option<PathBuf> {
    let local = PathBuf::from(DEFAULT_CONFIG_FILE);
    if local.is_file() {
        return Some(local);
    }
    dirs::config_dir()
        .map(|dir| dir.join("flowbid").join(DEFAULT_CONFIG_FILE))
        .filter(|path| path.is_file())
}

/// Reads the config file named on the command line, or the default one when present.
pub fn load_file_config(args: &CliArgs) -> Result<FileConfig, ConfigError> {
    match args.config.clone().or_else(default_config_path) {
        Some(path) => load_config(path),
        None => Ok(FileConfig::default()),
    }
}

impl Settings {
    pub fn resolve(
        args: CliArgs,
        file: FileConfig,
        api_key: Option<String>,
    ) -> Result<Self, ConfigError> {
        let api_key = api_key
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        let primary = args
            .rpc_url
            .or(file.rpc_url)
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .ok_or(ConfigError::MissingRpcUrl)?;
        let fallbacks = match args.rpc_fallback_urls {
            Some(csv) => split_csv(&csv),
            None => file.rpc_fallback_urls,
        };
        let rpc_urls = rpc_urls(primary, fallbacks)?;

        let auction = match args.auction.or(file.auction) {
            Some(value) if !value.trim().is_empty() => parse_address(&value)?,
            _ => DEFAULT_AUCTION_ADDRESS,
        };

        let poll_ms = positive("poll_ms", args.poll_ms.or(file.poll_ms), DEFAULT_POLL_MS)?;
        let log_retries = positive(
            "log_retries",
            args.log_retries.or(file.log_retries),
            DEFAULT_LOG_RETRIES,
        )?;
        let retry_base_ms = positive(
            "retry_base_ms",
            args.retry_base_ms.or(file.retry_base_ms),
            DEFAULT_RETRY_BASE_MS,
        )?;
        let min_native_eth = args
            .min_native_eth
            .or(file.min_native_eth)
            .unwrap_or_else(default_min_native_eth);
        if min_native_eth <= Decimal::ZERO {
            return Err(ConfigError::NotPositive {
                field: "min_native_eth",
                value: min_native_eth.to_string(),
            });
        }

        Ok(Self {
            api_key,
            rpc_urls,
            auction,
            poll_interval: Duration::from_millis(poll_ms),
            min_native_eth,
            retry: RetryPolicy::new(log_retries, Duration::from_millis(retry_base_ms)),
            log_level: file.log_level.unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
        })
    }
}

fn positive<T>(field: &'static str, value: Option<T>, default: T) -> Result<T, ConfigError>
where
    T: Default + PartialOrd + ToString,
{
    let value = value.unwrap_or(default);
    if value <= T::default() {
        return Err(ConfigError::NotPositive {
            field,
            value: value.to_string(),
        });
    }
    Ok(value)
}

fn split_csv(csv: &str) -> Vec<String> {
    csv.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(String::from)
        .collect()
}

fn rpc_urls(primary: String, fallbacks: Vec<String>) -> Result<Vec<Url>, ConfigError> {
    let mut urls: Vec<Url> = Vec::with_capacity(fallbacks.len() + 1);
    for raw in std::iter::once(primary).chain(fallbacks) {
        let url = Url::parse(raw.trim()).map_err(|err| ConfigError::InvalidUrl {
            url: raw.clone(),
            reason: err.to_string(),
        })?;
        if !urls.contains(&url) {
            urls.push(url);
        }
    }
    Ok(urls)
}

/// Mixed-case input must carry a valid EIP-55 checksum.
pub fn parse_address(value: &str) -> Result<Address, ConfigError> {
    let value = value.trim();
    let digits = value.strip_prefix("0x").unwrap_or(value);
    let mixed_case = digits.chars().any(|c| c.is_ascii_uppercase())
        && digits.chars().any(|c| c.is_ascii_lowercase());

    let parsed = if mixed_case {
        Address::parse_checksummed(value, None).map_err(|err| err.to_string())
    } else {
        Address::from_str(value).map_err(|err| err.to_string())
    };
    parsed.map_err(|reason| ConfigError::InvalidAddress {
        value: value.to_string(),
        reason,
    })
}
