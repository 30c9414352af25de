//! Shop configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional.
//!
//! - `SHOP_DATA_DIR` - Directory holding persisted state (default: `.shunny`)
//! - `SHOP_STARTING_BALANCE` - Balance seeded when none is persisted (default: 5000000)
//! - `SHOP_CATALOG_URL` - Products endpoint (default: `http://localhost:5000/api/products`)
//! - `SHOP_PAGE_SIZE` - Products per catalog page (default: 12)

use std::path::PathBuf;

use shunny_core::Amount;
use thiserror::Error;
use url::Url;

use crate::balance::DEFAULT_STARTING_BALANCE;
use crate::pagination::DEFAULT_PAGE_SIZE;

const DEFAULT_DATA_DIR: &str = ".shunny";
const DEFAULT_CATALOG_URL: &str = "http://localhost:5000/api/products";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Shop configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShopConfig {
    /// Directory for the file-backed store
    pub data_dir: PathBuf,
    /// Balance used only when no balance has been persisted
    pub starting_balance: Amount,
    /// Catalog products endpoint
    pub catalog_url: Url,
    /// Products per catalog page (at least 1)
    pub page_size: usize,
}

impl ShopConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let data_dir = PathBuf::from(
            lookup("SHOP_DATA_DIR").unwrap_or_else(|| DEFAULT_DATA_DIR.to_string()),
        );

        let starting_balance = match lookup("SHOP_STARTING_BALANCE") {
            Some(raw) => raw.parse::<Amount>().map_err(|e| {
                ConfigError::InvalidEnvVar("SHOP_STARTING_BALANCE".to_string(), e.to_string())
            })?,
            None => Amount::from_units(DEFAULT_STARTING_BALANCE),
        };

        let catalog_url = Url::parse(
            &lookup("SHOP_CATALOG_URL").unwrap_or_else(|| DEFAULT_CATALOG_URL.to_string()),
        )
        .map_err(|e| ConfigError::InvalidEnvVar("SHOP_CATALOG_URL".to_string(), e.to_string()))?;

        let page_size = match lookup("SHOP_PAGE_SIZE") {
            Some(raw) => parse_page_size(&raw)?,
            None => DEFAULT_PAGE_SIZE,
        };

        Ok(Self {
            data_dir,
            starting_balance,
            catalog_url,
            page_size,
        })
    }
}

impl Default for ShopConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            starting_balance: Amount::from_units(DEFAULT_STARTING_BALANCE),
            catalog_url: Url::parse(DEFAULT_CATALOG_URL)
                .unwrap_or_else(|_| unreachable!("default catalog URL is valid")),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse a page size, rejecting zero.
fn parse_page_size(raw: &str) -> Result<usize, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidEnvVar("SHOP_PAGE_SIZE".to_string(), reason);
    let size = raw.trim().parse::<usize>().map_err(|e| invalid(e.to_string()))?;
    if size == 0 {
        return Err(invalid("must be at least 1".to_string()));
    }
    Ok(size)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<ShopConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        ShopConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config, ShopConfig::default());
        assert_eq!(config.starting_balance, Amount::from_units(5_000_000));
        assert_eq!(config.page_size, 12);
        assert_eq!(config.catalog_url.path(), "/api/products");
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("SHOP_DATA_DIR", "/var/lib/shunny"),
            ("SHOP_STARTING_BALANCE", "1000"),
            ("SHOP_CATALOG_URL", "https://shop.example/api/products"),
            ("SHOP_PAGE_SIZE", "24"),
        ])
        .unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/shunny"));
        assert_eq!(config.starting_balance, Amount::from_units(1000));
        assert_eq!(config.catalog_url.host_str(), Some("shop.example"));
        assert_eq!(config.page_size, 24);
    }

    #[test]
    fn test_negative_starting_balance_rejected() {
        let err = load(&[("SHOP_STARTING_BALANCE", "-1")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref key, _) if key == "SHOP_STARTING_BALANCE"));
    }

    #[test]
    fn test_invalid_catalog_url_rejected() {
        assert!(load(&[("SHOP_CATALOG_URL", "not a url")]).is_err());
    }

    #[test]
    fn test_zero_page_size_rejected() {
        assert!(load(&[("SHOP_PAGE_SIZE", "0")]).is_err());
        assert!(load(&[("SHOP_PAGE_SIZE", "ten")]).is_err());
    }
}
