/*
[INPUT]:  Human symbol names
[OUTPUT]: Asset indices and canonical coin ids
[POS]:    Collaborator seam - symbol directory interface
[UPDATE]: When the directory contract changes
*/

use std::collections::HashMap;

use crate::errors::{HyperliquidError, Result};

/// Symbol-directory collaborator consumed by action builders before
/// hashing. The live implementation sits outside this crate; trading flows
/// only depend on this seam.
pub trait AssetDirectory: Send + Sync {
    /// Resolve a symbol name to its asset index. Spot assets start at 10000.
    fn resolve(&self, name: &str) -> Result<u32>;

    /// Normalize a symbol name to the canonical coin id used on the wire.
    fn normalize(&self, name: &str) -> Result<String>;
}

/// Map-backed directory for tests and static deployments
#[derive(Debug, Default, Clone)]
pub struct StaticDirectory {
    name_to_asset: HashMap<String, u32>,
    name_to_coin: HashMap<String, String>,
}

impl StaticDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a symbol with its asset index; the coin id defaults to the
    /// symbol itself.
    pub fn insert(&mut self, name: impl Into<String>, asset: u32) {
        let name = name.into();
        self.name_to_coin.insert(name.clone(), name.clone());
        self.name_to_asset.insert(name, asset);
    }

    /// Register a symbol whose canonical coin id differs from its name
    /// (spot pairs trade under internal ids like "@107").
    pub fn insert_aliased(
        &mut self,
        name: impl Into<String>,
        coin: impl Into<String>,
        asset: u32,
    ) {
        let name = name.into();
        self.name_to_coin.insert(name.clone(), coin.into());
        self.name_to_asset.insert(name, asset);
    }
}

impl AssetDirectory for StaticDirectory {
    fn resolve(&self, name: &str) -> Result<u32> {
        self.name_to_asset
            .get(name)
            .copied()
            .ok_or_else(|| HyperliquidError::UnknownAsset(name.to_string()))
    }

    fn normalize(&self, name: &str) -> Result<String> {
        self.name_to_coin
            .get(name)
            .cloned()
            .ok_or_else(|| HyperliquidError::UnknownAsset(name.to_string()))
    }
}
