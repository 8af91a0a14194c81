//! Asset catalog
//!
//! Mint and oracle addresses per cluster, keyed by token symbol.

use std::str::FromStr;

use bootstrap_core::{CatalogError, Cluster};
use serde::Serialize;
use solana_sdk::pubkey::Pubkey;

/// Mainnet-beta addresses
pub mod mainnet {
    pub const USDC_MINT: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";

    /// Wrapped BTC (Sollet)
    pub const BTC_MINT: &str = "9n4nbM75f5Ui33ZbPYXn59EwSgE8CGsHtAeTH5YFeJ9E";

    /// Native mint (wrapped SOL)
    pub const SOL_MINT: &str = "So11111111111111111111111111111111111111112";

    /// Pyth BTC/USD price account
    pub const BTC_ORACLE: &str = "GVXRSBjFk6e6J3NbVPXohDJetcTjaeeuykUpbQF8UoMU";

    /// Pyth SOL/USD price account
    pub const SOL_ORACLE: &str = "H6ARHf6YXhGYeQfUzQNGk6rDNnLBQKrenN712K4AQJEG";
}

/// Raw catalog row
#[derive(Debug, Clone, Copy)]
pub struct CatalogEntry {
    pub symbol: &'static str,
    pub mint: &'static str,
    /// Published external oracle, if the asset has one
    pub oracle: Option<&'static str>,
}

const MAINNET_ENTRIES: &[CatalogEntry] = &[
    CatalogEntry {
        symbol: "USDC",
        mint: mainnet::USDC_MINT,
        oracle: None,
    },
    CatalogEntry {
        symbol: "BTC",
        mint: mainnet::BTC_MINT,
        oracle: Some(mainnet::BTC_ORACLE),
    },
    CatalogEntry {
        symbol: "SOL",
        mint: mainnet::SOL_MINT,
        oracle: Some(mainnet::SOL_ORACLE),
    },
];

/// A catalog entry with parsed addresses
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Asset {
    pub symbol: String,
    #[serde(serialize_with = "crate::report::as_base58")]
    pub mint: Pubkey,
    #[serde(serialize_with = "crate::report::as_base58_opt")]
    pub oracle: Option<Pubkey>,
}

/// Symbol to address lookup for one cluster
#[derive(Debug, Clone)]
pub struct AssetCatalog {
    cluster: Cluster,
    entries: &'static [CatalogEntry],
}

impl AssetCatalog {
    /// Get the catalog for a cluster
    pub fn for_cluster(cluster: Cluster) -> Result<Self, CatalogError> {
        match cluster {
            Cluster::MainnetBeta => Ok(Self {
                cluster,
                entries: MAINNET_ENTRIES,
            }),
            Cluster::Devnet | Cluster::Localnet => Err(CatalogError::ClusterNotSupported {
                cluster: cluster.to_string(),
            }),
        }
    }

    pub fn cluster(&self) -> Cluster {
        self.cluster
    }

    pub fn symbols(&self) -> Vec<&'static str> {
        self.entries.iter().map(|e| e.symbol).collect()
    }

    /// Look up a symbol (case-sensitive)
    pub fn lookup(&self, symbol: &str) -> Result<Asset, CatalogError> {
        let entry = self
            .entries
            .iter()
            .find(|e| e.symbol == symbol)
            .ok_or_else(|| CatalogError::UnknownSymbol {
                symbol: symbol.to_string(),
                cluster: self.cluster.to_string(),
            })?;

        let parse = |address: &str| {
            Pubkey::from_str(address).map_err(|_| CatalogError::InvalidAddress {
                symbol: entry.symbol.to_string(),
                address: address.to_string(),
            })
        };

        Ok(Asset {
            symbol: entry.symbol.to_string(),
            mint: parse(entry.mint)?,
            oracle: entry.oracle.map(parse).transpose()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mainnet_catalog() {
        let catalog = AssetCatalog::for_cluster(Cluster::MainnetBeta).unwrap();
        assert_eq!(catalog.symbols(), vec!["USDC", "BTC", "SOL"]);

        let btc = catalog.lookup("BTC").unwrap();
        assert_eq!(btc.mint.to_string(), mainnet::BTC_MINT);
        assert_eq!(btc.oracle.unwrap().to_string(), mainnet::BTC_ORACLE);

        let usdc = catalog.lookup("USDC").unwrap();
        assert!(usdc.oracle.is_none());
    }

    #[test]
    fn test_every_entry_parses() {
        let catalog = AssetCatalog::for_cluster(Cluster::MainnetBeta).unwrap();
        for symbol in catalog.symbols() {
            assert!(catalog.lookup(symbol).is_ok(), "{} failed to parse", symbol);
        }
    }

    #[test]
    fn test_unknown_symbol() {
        let catalog = AssetCatalog::for_cluster(Cluster::MainnetBeta).unwrap();
        let err = catalog.lookup("btc").unwrap_err();
        assert!(matches!(err, CatalogError::UnknownSymbol { .. }));
        assert_eq!(
            err.to_string(),
            "Symbol btc not found in the mainnet-beta catalog"
        );
    }

    #[test]
    fn test_devnet_not_supported() {
        assert!(matches!(
            AssetCatalog::for_cluster(Cluster::Devnet),
            Err(CatalogError::ClusterNotSupported { .. })
        ));
    }
}
