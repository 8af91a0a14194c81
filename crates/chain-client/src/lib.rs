//! chain-client: Administrative client for the lending program
//!
//! This crate defines the [`ChainClient`] boundary the bootstrap drives, a
//! JSON-RPC implementation that signs requests with the admin keypair, and an
//! in-memory ledger with fault injection for tests and rehearsals.

pub mod keypair;
pub mod memory;
pub mod rpc;

use async_trait::async_trait;
use bootstrap_core::constants::{BANK_SEED, GROUP_SEED, STUB_ORACLE_SEED};
use bootstrap_core::{ClientError, GroupNum, RiskParams, TokenIndex};
use solana_sdk::pubkey::Pubkey;

pub use keypair::load_admin_keypair;
pub use memory::{InMemoryChain, Operation};
pub use rpc::RpcChainClient;

/// Result type for chain client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Top-level market container
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub address: Pubkey,
    pub admin: Pubkey,
    pub group_num: GroupNum,
    /// Non-admin callers may register tokens
    pub permissionless: bool,
    /// Cached bank set, as of the last fetch or reload
    pub banks: Vec<Bank>,
}

impl Group {
    pub fn bank_by_index(&self, token_index: TokenIndex) -> Option<&Bank> {
        self.banks.iter().find(|b| b.token_index == token_index)
    }
}

/// A registered token inside a group
#[derive(Debug, Clone, PartialEq)]
pub struct Bank {
    pub address: Pubkey,
    pub group: Pubkey,
    pub name: String,
    pub token_index: TokenIndex,
    pub mint: Pubkey,
    pub oracle: Pubkey,
    pub oracle_conf_filter: f64,
    pub risk: RiskParams,
}

/// Admin-owned, manually priced oracle
#[derive(Debug, Clone, PartialEq)]
pub struct StubOracle {
    pub address: Pubkey,
    pub group: Pubkey,
    pub mint: Pubkey,
    pub price: f64,
}

/// Arguments of a token registration
#[derive(Debug, Clone, PartialEq)]
pub struct TokenRegistration {
    pub group: Pubkey,
    pub mint: Pubkey,
    pub oracle: Pubkey,
    /// Oracle confidence filter: prices with a wider confidence band are rejected
    pub oracle_conf_filter: f64,
    pub token_index: TokenIndex,
    pub name: String,
    pub risk: RiskParams,
}

/// Operations the bootstrap needs from the chain.
///
/// Mutating calls report duplicates as [`ClientError::AlreadyExists`] and
/// never modify the existing resource. Read-backs report absence as
/// [`ClientError::NotFound`].
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Identity every mutating call is signed by
    fn admin(&self) -> Pubkey;

    async fn create_group(&self, group_num: GroupNum, permissionless: bool) -> Result<()>;

    /// Fetch the admin's group with its banks loaded
    async fn get_group_by_admin(&self, admin: &Pubkey, group_num: GroupNum) -> Result<Group>;

    async fn create_stub_oracle(&self, group: &Pubkey, mint: &Pubkey, price: f64) -> Result<()>;

    async fn get_stub_oracle(&self, group: &Pubkey, mint: &Pubkey) -> Result<StubOracle>;

    async fn register_token(&self, registration: &TokenRegistration) -> Result<()>;

    /// Refresh the group's bank set from the authoritative store
    async fn reload_group_state(&self, group: &Group) -> Result<Group>;
}

/// Program-derived address of a group
pub fn group_address(program_id: &Pubkey, admin: &Pubkey, group_num: GroupNum) -> Pubkey {
    Pubkey::find_program_address(
        &[GROUP_SEED, admin.as_ref(), &group_num.to_le_bytes()],
        program_id,
    )
    .0
}

/// Program-derived address of a bank (bank number 0)
pub fn bank_address(program_id: &Pubkey, group: &Pubkey, token_index: TokenIndex) -> Pubkey {
    Pubkey::find_program_address(
        &[
            group.as_ref(),
            BANK_SEED,
            &token_index.to_le_bytes(),
            &0u32.to_le_bytes(),
        ],
        program_id,
    )
    .0
}

/// Program-derived address of a stub oracle
pub fn stub_oracle_address(program_id: &Pubkey, group: &Pubkey, mint: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(
        &[group.as_ref(), STUB_ORACLE_SEED, mint.as_ref()],
        program_id,
    )
    .0
}
