//! Integration tests for Shunny Shop.
//!
//! Every test runs the engine against a [`FileStore`] in its own temporary
//! directory, so persisted state survives a simulated restart exactly as it
//! would on disk.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p shunny-integration-tests
//! ```

use std::path::Path;
use std::sync::Arc;

use shunny_core::{Amount, CartProduct, ProductId};
use shunny_storefront::store::{self, keys};
use shunny_storefront::{FileStore, KeyValueStore, ShopConfig, ShopContext};
use tempfile::TempDir;

/// A data directory that is removed when dropped.
pub struct TestShop {
    dir: TempDir,
    config: ShopConfig,
}

impl TestShop {
    /// Create an empty data directory with default configuration.
    ///
    /// # Panics
    ///
    /// Panics if the temporary directory cannot be created.
    #[must_use]
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let config = ShopConfig {
            data_dir: dir.path().to_path_buf(),
            ..ShopConfig::default()
        };
        Self { dir, config }
    }

    /// The data directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// A fresh file store over the data directory.
    #[must_use]
    pub fn store(&self) -> Arc<dyn KeyValueStore> {
        Arc::new(FileStore::new(self.dir.path()))
    }

    /// Open a context, as a front end would at start-up.
    #[must_use]
    pub fn open(&self) -> ShopContext {
        ShopContext::open(self.store(), &self.config)
    }

    /// Persist a balance directly, bypassing the ledger.
    ///
    /// # Panics
    ///
    /// Panics if the write fails.
    pub fn write_balance(&self, units: u64) {
        store::save_json(self.store().as_ref(), keys::BALANCE, &Amount::from_units(units))
            .expect("failed to write balance");
    }

    /// Read a raw persisted document.
    ///
    /// # Panics
    ///
    /// Panics if the read fails.
    #[must_use]
    pub fn raw(&self, key: &str) -> Option<String> {
        self.store().get(key).expect("failed to read store")
    }
}

impl Default for TestShop {
    fn default() -> Self {
        Self::new()
    }
}

/// A cart product with a generated title.
#[must_use]
pub fn product(id: i64, price: u64) -> CartProduct {
    CartProduct {
        id: ProductId::new(id),
        title: format!("Product {id}"),
        image: Some(format!("https://img.example/{id}.png")),
        price: Amount::from_units(price),
    }
}
