//! Core type definitions for the bootstrap

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Index of a bank inside its group, assigned by the provisioning plan
pub type TokenIndex = u16;

/// Discriminator letting one admin own several groups
pub type GroupNum = u32;

/// Cluster the run targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Cluster {
    MainnetBeta,
    Devnet,
    Localnet,
}

impl Cluster {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MainnetBeta => "mainnet-beta",
            Self::Devnet => "devnet",
            Self::Localnet => "localnet",
        }
    }
}

impl fmt::Display for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Cluster {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mainnet-beta" | "mainnet" => Ok(Self::MainnetBeta),
            "devnet" => Ok(Self::Devnet),
            "localnet" | "localhost" => Ok(Self::Localnet),
            other => Err(format!("unknown cluster '{}'", other)),
        }
    }
}

/// Constants
pub mod constants {
    use super::GroupNum;

    /// Lending program that owns groups, banks and stub oracles
    pub const DEFAULT_PROGRAM_ID: &str = "4MangoMjqJ2firMokCjjGgoK8d4MXcrgL7XJaL3w6fVg";

    /// Group number used by the bootstrap
    pub const DEFAULT_GROUP_NUM: GroupNum = 0;

    /// PDA seed prefixes
    pub const GROUP_SEED: &[u8] = b"Group";
    pub const BANK_SEED: &[u8] = b"Bank";
    pub const STUB_ORACLE_SEED: &[u8] = b"StubOracle";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cluster_parse() {
        assert_eq!("mainnet-beta".parse::<Cluster>(), Ok(Cluster::MainnetBeta));
        assert_eq!("Mainnet".parse::<Cluster>(), Ok(Cluster::MainnetBeta));
        assert_eq!("devnet".parse::<Cluster>(), Ok(Cluster::Devnet));
        assert!("moonnet".parse::<Cluster>().is_err());
    }

    #[test]
    fn test_cluster_display() {
        assert_eq!(Cluster::MainnetBeta.to_string(), "mainnet-beta");
        assert_eq!(Cluster::Localnet.as_str(), "localnet");
    }

    #[test]
    fn test_default_program_id_parses() {
        let id: solana_sdk::pubkey::Pubkey = constants::DEFAULT_PROGRAM_ID.parse().unwrap();
        assert_eq!(id.to_string(), constants::DEFAULT_PROGRAM_ID);
    }
}
