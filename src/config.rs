use anyhow::{anyhow, Result};

use crate::indexer::DEFAULT_INDEXER_URL;
use crate::node_rpc::DEFAULT_NODE_URL;
use crate::router::DEFAULT_VERSION_THRESHOLD;

/// Connection and behaviour settings shared by every subcommand.
///
/// Configuration priority: CLI args > Environment variables > Defaults
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// GraphQL indexer endpoint
    #[arg(long, env = "INDEXER_URL", global = true)]
    pub indexer_url: Option<String>,

    /// Fullnode REST endpoint (including the /v1 prefix)
    #[arg(long, env = "NODE_URL", global = true)]
    pub node_url: Option<String>,

    /// HTTP request timeout in milliseconds (1000-60000)
    #[arg(long, env = "RPC_TIMEOUT_MS", global = true)]
    pub rpc_timeout_ms: Option<u64>,

    /// Rows per page in list views (1-100)
    #[arg(long, env = "PAGE_SIZE", global = true)]
    pub page_size: Option<u32>,

    /// Numbers above this are searched as transaction versions, the rest as
    /// block heights
    #[arg(long, env = "VERSION_THRESHOLD", global = true)]
    pub version_threshold: Option<u64>,

    /// Reject call arguments that do not match the declared parameter type
    #[arg(long, env = "STRICT_ARGS", global = true)]
    pub strict_args: Option<bool>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub indexer_url: String,
    pub node_url: String,
    pub rpc_timeout_ms: u64,
    pub page_size: u32,
    pub version_threshold: u64,
    pub strict_args: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            indexer_url: DEFAULT_INDEXER_URL.to_string(),
            node_url: DEFAULT_NODE_URL.to_string(),
            rpc_timeout_ms: 10_000,
            page_size: 25,
            version_threshold: DEFAULT_VERSION_THRESHOLD,
            strict_args: false,
        }
    }
}

/// Validate that a value is within a given range (inclusive)
fn validate_in_range<T>(val: T, min: T, max: T, name: &str) -> Result<T>
where
    T: PartialOrd + std::fmt::Display + Copy,
{
    if val < min || val > max {
        Err(anyhow!("{name} must be in range [{min}, {max}], got {val}"))
    } else {
        Ok(val)
    }
}

/// Validate URL format (basic check)
fn validate_url(url: &str, name: &str) -> Result<()> {
    if url.is_empty() {
        return Err(anyhow!("{name} cannot be empty"));
    }
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(anyhow!("{name} must start with http:// or https://"))
    }
}

impl Config {
    /// Resolve parsed arguments (already merged with the environment by
    /// clap) against the defaults and validate them.
    pub fn from_args(args: ConfigArgs) -> Result<Config> {
        let defaults = Config::default();

        let indexer_url = args.indexer_url.unwrap_or(defaults.indexer_url);
        validate_url(&indexer_url, "INDEXER_URL")?;

        let node_url = args.node_url.unwrap_or(defaults.node_url);
        validate_url(&node_url, "NODE_URL")?;

        let rpc_timeout_ms = validate_in_range(
            args.rpc_timeout_ms.unwrap_or(defaults.rpc_timeout_ms),
            1000,
            60000,
            "RPC_TIMEOUT_MS",
        )?;

        let page_size = validate_in_range(
            args.page_size.unwrap_or(defaults.page_size),
            1,
            100,
            "PAGE_SIZE",
        )?;

        Ok(Config {
            indexer_url,
            node_url,
            rpc_timeout_ms,
            page_size,
            version_threshold: args
                .version_threshold
                .unwrap_or(defaults.version_threshold),
            strict_args: args.strict_args.unwrap_or(defaults.strict_args),
        })
    }

    /// Print current configuration (useful for debugging)
    pub fn print_summary(&self) {
        eprintln!("movex configuration:");
        eprintln!("  Indexer URL: {}", self.indexer_url);
        eprintln!("  Node URL: {}", self.node_url);
        eprintln!("  RPC Timeout: {}ms", self.rpc_timeout_ms);
        eprintln!("  Page Size: {}", self.page_size);
        eprintln!("  Version Threshold: {}", self.version_threshold);
        eprintln!("  Strict Args: {}", self.strict_args);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = Config::from_args(ConfigArgs::default()).unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.page_size, 25);
        assert!(!cfg.strict_args);
    }

    #[test]
    fn test_overrides() {
        let cfg = Config::from_args(ConfigArgs {
            node_url: Some("http://localhost:8080/v1".to_string()),
            page_size: Some(50),
            version_threshold: Some(10),
            strict_args: Some(true),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(cfg.node_url, "http://localhost:8080/v1");
        assert_eq!(cfg.page_size, 50);
        assert_eq!(cfg.version_threshold, 10);
        assert!(cfg.strict_args);
    }

    #[test]
    fn test_rejects_out_of_range() {
        let err = Config::from_args(ConfigArgs {
            rpc_timeout_ms: Some(10),
            ..Default::default()
        })
        .unwrap_err();
        assert!(err.to_string().contains("RPC_TIMEOUT_MS"));

        assert!(Config::from_args(ConfigArgs {
            page_size: Some(0),
            ..Default::default()
        })
        .is_err());
    }

    #[test]
    fn test_rejects_bad_url() {
        let err = Config::from_args(ConfigArgs {
            indexer_url: Some("ftp://indexer".to_string()),
            ..Default::default()
        })
        .unwrap_err();
        assert!(err.to_string().contains("INDEXER_URL"));
    }
}
