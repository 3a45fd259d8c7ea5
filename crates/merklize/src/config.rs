//! Merklizer configuration from the environment.
//!
//! Deployment-level knobs only; hashers, trees and loaders are chosen in
//! code through [`MerklizeOptions`](crate::MerklizeOptions).

use serde::{Deserialize, Serialize};
use url::Url;

/// Environment-derived merklizer settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerklizeConfig {
    /// Reject properties without an IRI mapping.
    pub safe_mode: bool,
    /// Gateway for `ipfs://` contexts.
    pub ipfs_gateway: Option<Url>,
    /// Timeout of the default HTTP document loader.
    pub http_timeout_secs: u64,
    /// Levels of the default sparse Merkle tree.
    pub mt_levels: usize,
}

impl Default for MerklizeConfig {
    fn default() -> Self {
        Self {
            safe_mode: true,
            ipfs_gateway: None,
            http_timeout_secs: 30,
            mt_levels: merklize_crypto::DEFAULT_MT_LEVELS,
        }
    }
}

impl MerklizeConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `MERKLIZE_SAFE_MODE` (default: `true`)
    /// - `MERKLIZE_IPFS_GATEWAY_URL` (optional)
    /// - `MERKLIZE_HTTP_TIMEOUT_SECS` (default: 30)
    /// - `MERKLIZE_MT_LEVELS` (default: 40)
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            safe_mode: env_bool("MERKLIZE_SAFE_MODE", defaults.safe_mode)?,
            ipfs_gateway: env_optional_url("MERKLIZE_IPFS_GATEWAY_URL")?,
            http_timeout_secs: env_parse("MERKLIZE_HTTP_TIMEOUT_SECS", defaults.http_timeout_secs)?,
            mt_levels: env_parse("MERKLIZE_MT_LEVELS", defaults.mt_levels)?,
        })
    }
}

fn env_bool(var: &str, default: bool) -> Result<bool, ConfigError> {
    match std::env::var(var) {
        Err(_) => Ok(default),
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            _ => Err(ConfigError::InvalidValue(var.to_string(), raw)),
        },
    }
}

fn env_parse<T: std::str::FromStr>(var: &str, default: T) -> Result<T, ConfigError> {
    match std::env::var(var) {
        Err(_) => Ok(default),
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(var.to_string(), raw)),
    }
}

fn env_optional_url(var: &str) -> Result<Option<Url>, ConfigError> {
    match std::env::var(var) {
        Err(_) => Ok(None),
        Ok(raw) if raw.trim().is_empty() => Ok(None),
        Ok(raw) => Url::parse(raw.trim())
            .map(Some)
            .map_err(|e| ConfigError::InvalidUrl(var.to_string(), e.to_string())),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {0}: {1:?}")]
    InvalidValue(String, String),
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_vars_absent() {
        assert!(env_bool("MERKLIZE_TEST_ABSENT_BOOL", true).unwrap());
        assert_eq!(env_parse("MERKLIZE_TEST_ABSENT_NUM", 40usize).unwrap(), 40);
        assert_eq!(env_optional_url("MERKLIZE_TEST_ABSENT_URL").unwrap(), None);
    }

    #[test]
    fn parses_booleans() {
        std::env::set_var("MERKLIZE_TEST_BOOL_OFF", "False");
        let off = env_bool("MERKLIZE_TEST_BOOL_OFF", true);
        std::env::remove_var("MERKLIZE_TEST_BOOL_OFF");
        assert!(!off.unwrap());

        std::env::set_var("MERKLIZE_TEST_BOOL_BAD", "maybe");
        let bad = env_bool("MERKLIZE_TEST_BOOL_BAD", true);
        std::env::remove_var("MERKLIZE_TEST_BOOL_BAD");
        assert!(matches!(bad, Err(ConfigError::InvalidValue(_, _))));
    }

    #[test]
    fn rejects_non_numeric_levels() {
        std::env::set_var("MERKLIZE_TEST_LEVELS", "forty");
        let result = env_parse("MERKLIZE_TEST_LEVELS", 40usize);
        std::env::remove_var("MERKLIZE_TEST_LEVELS");
        assert!(result.is_err());
    }

    #[test]
    fn gateway_url_is_validated() {
        std::env::set_var("MERKLIZE_TEST_GATEWAY", "https://ipfs.io");
        let ok = env_optional_url("MERKLIZE_TEST_GATEWAY");
        std::env::set_var("MERKLIZE_TEST_GATEWAY", "not a url");
        let bad = env_optional_url("MERKLIZE_TEST_GATEWAY");
        std::env::remove_var("MERKLIZE_TEST_GATEWAY");
        assert_eq!(ok.unwrap().unwrap().as_str(), "https://ipfs.io/");
        assert!(bad.is_err());
    }

    #[test]
    fn serde_roundtrip_keeps_gateway() {
        let cfg = MerklizeConfig {
            ipfs_gateway: Some(Url::parse("https://ipfs.io/").unwrap()),
            ..MerklizeConfig::default()
        };
        let json = serde_json::to_string(&cfg).unwrap();
        let back: MerklizeConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cfg);
    }
}
