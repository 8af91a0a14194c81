//! Configuration types for the bootstrap
//!
//! Everything is read from the process environment. A missing or malformed
//! value is a precondition violation and stops the run before any RPC call.

use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;

use crate::constants::{DEFAULT_GROUP_NUM, DEFAULT_PROGRAM_ID};
use crate::{Cluster, ConfigError, GroupNum};

/// JSON-RPC endpoint of the lending program's administrative gateway.
///
/// A plain Solana RPC node does not serve the gateway methods; every step
/// against one fails with -32601 (method not found) and is tolerated as rejected.
pub const ENV_CLUSTER_URL: &str = "CLUSTER_URL";
pub const ENV_PAYER_KEYPAIR: &str = "MANGO_MAINNET_PAYER_KEYPAIR";
pub const ENV_CLUSTER: &str = "BOOTSTRAP_CLUSTER";
pub const ENV_PROGRAM_ID: &str = "BOOTSTRAP_PROGRAM_ID";
pub const ENV_GROUP_NUM: &str = "BOOTSTRAP_GROUP_NUM";
pub const ENV_REPORT_FORMAT: &str = "BOOTSTRAP_REPORT_FORMAT";
pub const ENV_REQUEST_TIMEOUT: &str = "BOOTSTRAP_REQUEST_TIMEOUT_SECS";

/// RPC connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcConfig {
    /// Gateway URL (e.g., "http://127.0.0.1:8899")
    pub url: String,

    /// Per-request timeout inside the client
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8899".to_string(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// How the verification report is printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("expected 'text' or 'json', got '{}'", other)),
        }
    }
}

/// Bootstrap run configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapConfig {
    pub rpc: RpcConfig,

    /// Admin keypair file (JSON array of 64 bytes)
    pub keypair_path: PathBuf,

    /// Cluster selecting the asset catalog
    pub cluster: Cluster,

    pub program_id: Pubkey,

    #[serde(default)]
    pub group_num: GroupNum,

    #[serde(default)]
    pub report_format: ReportFormat,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            rpc: RpcConfig::default(),
            keypair_path: PathBuf::from("admin-keypair.json"),
            cluster: Cluster::MainnetBeta,
            program_id: default_program_id(),
            group_num: DEFAULT_GROUP_NUM,
            report_format: ReportFormat::Text,
        }
    }
}

fn default_program_id() -> Pubkey {
    Pubkey::from_str(DEFAULT_PROGRAM_ID).unwrap_or_default()
}

impl BootstrapConfig {
    /// Load from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let url = get(ENV_CLUSTER_URL).ok_or(ConfigError::Missing {
            var: ENV_CLUSTER_URL,
        })?;
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                var: ENV_CLUSTER_URL,
                value: url,
                reason: "expected an http(s) URL".to_string(),
            });
        }

        let keypair_path = get(ENV_PAYER_KEYPAIR)
            .map(PathBuf::from)
            .ok_or(ConfigError::Missing {
                var: ENV_PAYER_KEYPAIR,
            })?;

        let defaults = Self::default();
        let opt = |var: &'static str| (get(var), var);

        let timeout_secs = parse_or(opt(ENV_REQUEST_TIMEOUT), defaults.rpc.timeout_secs)?;
        if timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                var: ENV_REQUEST_TIMEOUT,
                value: timeout_secs.to_string(),
                reason: "must be at least 1 second".to_string(),
            });
        }

        Ok(Self {
            rpc: RpcConfig { url, timeout_secs },
            keypair_path,
            cluster: parse_or(opt(ENV_CLUSTER), defaults.cluster)?,
            program_id: parse_or(opt(ENV_PROGRAM_ID), defaults.program_id)?,
            group_num: parse_or(opt(ENV_GROUP_NUM), defaults.group_num)?,
            report_format: parse_or(opt(ENV_REPORT_FORMAT), defaults.report_format)?,
        })
    }
}

fn parse_or<T>(
    (raw, var): (Option<String>, &'static str),
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            reason: e.to_string(),
            value,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = BootstrapConfig::default();
        assert_eq!(config.rpc.timeout_secs, 30);
        assert_eq!(config.cluster, Cluster::MainnetBeta);
        assert_eq!(config.program_id.to_string(), DEFAULT_PROGRAM_ID);
        assert_eq!(config.group_num, 0);
    }

    #[test]
    fn test_minimal_env() {
        let config = BootstrapConfig::from_lookup(lookup(&[
            (ENV_CLUSTER_URL, "https://api.example.org"),
            (ENV_PAYER_KEYPAIR, "/keys/admin.json"),
        ]))
        .unwrap();

        assert_eq!(config.rpc.url, "https://api.example.org");
        assert_eq!(config.keypair_path, PathBuf::from("/keys/admin.json"));
        assert_eq!(config.report_format, ReportFormat::Text);
    }

    #[test]
    fn test_overrides() {
        let config = BootstrapConfig::from_lookup(lookup(&[
            (ENV_CLUSTER_URL, "http://127.0.0.1:8899"),
            (ENV_PAYER_KEYPAIR, "k.json"),
            (ENV_CLUSTER, "devnet"),
            (ENV_GROUP_NUM, "7"),
            (ENV_REPORT_FORMAT, "JSON"),
            (ENV_REQUEST_TIMEOUT, "5"),
        ]))
        .unwrap();

        assert_eq!(config.cluster, Cluster::Devnet);
        assert_eq!(config.group_num, 7);
        assert_eq!(config.report_format, ReportFormat::Json);
        assert_eq!(config.rpc.timeout_secs, 5);
    }

    #[test]
    fn test_missing_url() {
        let err = BootstrapConfig::from_lookup(lookup(&[(ENV_PAYER_KEYPAIR, "k.json")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Missing { var } if var == ENV_CLUSTER_URL));
    }

    #[test]
    fn test_blank_keypair_counts_as_missing() {
        let err = BootstrapConfig::from_lookup(lookup(&[
            (ENV_CLUSTER_URL, "http://localhost:8899"),
            (ENV_PAYER_KEYPAIR, "   "),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Missing { var } if var == ENV_PAYER_KEYPAIR));
    }

    #[test]
    fn test_malformed_values() {
        let err = BootstrapConfig::from_lookup(lookup(&[
            (ENV_CLUSTER_URL, "ws://localhost:8900"),
            (ENV_PAYER_KEYPAIR, "k.json"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var, .. } if var == ENV_CLUSTER_URL));

        let err = BootstrapConfig::from_lookup(lookup(&[
            (ENV_CLUSTER_URL, "http://localhost:8899"),
            (ENV_PAYER_KEYPAIR, "k.json"),
            (ENV_PROGRAM_ID, "not-a-pubkey"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var, .. } if var == ENV_PROGRAM_ID));

        let err = BootstrapConfig::from_lookup(lookup(&[
            (ENV_CLUSTER_URL, "http://localhost:8899"),
            (ENV_PAYER_KEYPAIR, "k.json"),
            (ENV_REQUEST_TIMEOUT, "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var, .. } if var == ENV_REQUEST_TIMEOUT));
        assert!(err.to_string().contains("must be at least 1 second"));
    }

    #[test]
    fn test_config_serialization() {
        let config = BootstrapConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: BootstrapConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.rpc.url, config.rpc.url);
        assert_eq!(parsed.program_id, config.program_id);
    }
}
