//! In-memory ledger
//!
//! Implements [`ChainClient`] against process-local state with the same
//! duplicate and not-found semantics as the real program. Addresses are
//! program-derived, so re-running against the same ledger yields the same
//! accounts. Faults can be injected per operation to rehearse partial runs.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use bootstrap_core::{ClientError, GroupNum, TokenIndex};
use solana_sdk::pubkey::Pubkey;
use tracing::debug;

use crate::{
    bank_address, group_address, stub_oracle_address, Bank, ChainClient, Group, Result,
    StubOracle, TokenRegistration,
};

/// Chain client operations, for fault injection and the call journal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    CreateGroup,
    GetGroupByAdmin,
    CreateStubOracle,
    GetStubOracle,
    RegisterToken,
    ReloadGroupState,
}

#[derive(Debug, Clone)]
struct GroupAccount {
    address: Pubkey,
    admin: Pubkey,
    group_num: GroupNum,
    permissionless: bool,
}

#[derive(Debug, Default)]
struct Ledger {
    groups: Vec<GroupAccount>,
    banks: Vec<Bank>,
    stub_oracles: HashMap<Pubkey, StubOracle>,
    /// Reads left before a fresh stub oracle becomes visible
    stub_oracle_lag: HashMap<Pubkey, u32>,
}

#[derive(Debug, Default)]
struct Faults {
    fail_next: HashMap<Operation, u32>,
    rejected_indexes: HashSet<TokenIndex>,
    stub_oracle_read_lag: u32,
}

/// Simulated lending-program ledger
#[derive(Debug)]
pub struct InMemoryChain {
    program_id: Pubkey,
    admin: Pubkey,
    ledger: Mutex<Ledger>,
    faults: Mutex<Faults>,
    journal: Mutex<Vec<Operation>>,
    registrations: Mutex<Vec<TokenRegistration>>,
}

impl InMemoryChain {
    pub fn new(program_id: Pubkey, admin: Pubkey) -> Self {
        Self {
            program_id,
            admin,
            ledger: Mutex::new(Ledger::default()),
            faults: Mutex::new(Faults::default()),
            journal: Mutex::new(Vec::new()),
            registrations: Mutex::new(Vec::new()),
        }
    }

    pub fn program_id(&self) -> Pubkey {
        self.program_id
    }

    /// Fail the next `times` calls of `op` as if the endpoint were down
    pub fn fail_next(&self, op: Operation, times: u32) {
        lock(&self.faults).fail_next.insert(op, times);
    }

    /// Reject every registration of `token_index`
    pub fn reject_token_index(&self, token_index: TokenIndex) {
        lock(&self.faults).rejected_indexes.insert(token_index);
    }

    /// Hide each newly created stub oracle from the next `reads` read-backs
    pub fn set_stub_oracle_read_lag(&self, reads: u32) {
        lock(&self.faults).stub_oracle_read_lag = reads;
    }

    /// Every call received, in order
    pub fn journal(&self) -> Vec<Operation> {
        lock(&self.journal).clone()
    }

    /// Every registration request received, accepted or not
    pub fn registration_requests(&self) -> Vec<TokenRegistration> {
        lock(&self.registrations).clone()
    }

    pub fn bank_count(&self) -> usize {
        lock(&self.ledger).banks.len()
    }

    pub fn stub_oracle_count(&self) -> usize {
        lock(&self.ledger).stub_oracles.len()
    }

    pub fn group_count(&self) -> usize {
        lock(&self.ledger).groups.len()
    }

    /// Record the call and consume an injected failure, if any
    fn enter(&self, op: Operation) -> Result<()> {
        lock(&self.journal).push(op);

        let mut faults = lock(&self.faults);
        if let Some(remaining) = faults.fail_next.get_mut(&op) {
            if *remaining > 0 {
                *remaining -= 1;
                debug!(?op, "Injected failure");
                return Err(ClientError::Unreachable {
                    url: "memory://ledger".to_string(),
                });
            }
        }
        Ok(())
    }

    fn load_group(ledger: &Ledger, account: &GroupAccount) -> Group {
        Group {
            address: account.address,
            admin: account.admin,
            group_num: account.group_num,
            permissionless: account.permissionless,
            banks: ledger
                .banks
                .iter()
                .filter(|b| b.group == account.address)
                .cloned()
                .collect(),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl ChainClient for InMemoryChain {
    fn admin(&self) -> Pubkey {
        self.admin
    }

    async fn create_group(&self, group_num: GroupNum, permissionless: bool) -> Result<()> {
        self.enter(Operation::CreateGroup)?;

        let address = group_address(&self.program_id, &self.admin, group_num);
        let mut ledger = lock(&self.ledger);
        if ledger.groups.iter().any(|g| g.address == address) {
            return Err(ClientError::AlreadyExists {
                resource: format!("group {} of {}", group_num, self.admin),
            });
        }

        ledger.groups.push(GroupAccount {
            address,
            admin: self.admin,
            group_num,
            permissionless,
        });
        debug!(group = %address, group_num, "Group created");
        Ok(())
    }

    async fn get_group_by_admin(&self, admin: &Pubkey, group_num: GroupNum) -> Result<Group> {
        self.enter(Operation::GetGroupByAdmin)?;

        let ledger = lock(&self.ledger);
        ledger
            .groups
            .iter()
            .find(|g| g.admin == *admin && g.group_num == group_num)
            .map(|account| Self::load_group(&ledger, account))
            .ok_or_else(|| ClientError::NotFound {
                resource: format!("group {} of {}", group_num, admin),
            })
    }

    async fn create_stub_oracle(&self, group: &Pubkey, mint: &Pubkey, price: f64) -> Result<()> {
        self.enter(Operation::CreateStubOracle)?;

        let address = stub_oracle_address(&self.program_id, group, mint);
        let lag = lock(&self.faults).stub_oracle_read_lag;
        let mut ledger = lock(&self.ledger);
        if !ledger.groups.iter().any(|g| g.address == *group) {
            return Err(ClientError::NotFound {
                resource: format!("group {}", group),
            });
        }
        if ledger.stub_oracles.contains_key(&address) {
            return Err(ClientError::AlreadyExists {
                resource: format!("stub oracle for mint {}", mint),
            });
        }

        ledger.stub_oracles.insert(
            address,
            StubOracle {
                address,
                group: *group,
                mint: *mint,
                price,
            },
        );
        if lag > 0 {
            ledger.stub_oracle_lag.insert(address, lag);
        }
        debug!(oracle = %address, %mint, price, "Stub oracle created");
        Ok(())
    }

    async fn get_stub_oracle(&self, group: &Pubkey, mint: &Pubkey) -> Result<StubOracle> {
        self.enter(Operation::GetStubOracle)?;

        let address = stub_oracle_address(&self.program_id, group, mint);
        let mut ledger = lock(&self.ledger);
        let not_found = || ClientError::NotFound {
            resource: format!("stub oracle for mint {}", mint),
        };

        if let Some(remaining) = ledger.stub_oracle_lag.get_mut(&address) {
            *remaining -= 1;
            if *remaining == 0 {
                ledger.stub_oracle_lag.remove(&address);
            }
            return Err(not_found());
        }

        ledger
            .stub_oracles
            .get(&address)
            .cloned()
            .ok_or_else(not_found)
    }

    async fn register_token(&self, registration: &TokenRegistration) -> Result<()> {
        self.enter(Operation::RegisterToken)?;
        lock(&self.registrations).push(registration.clone());

        if lock(&self.faults)
            .rejected_indexes
            .contains(&registration.token_index)
        {
            return Err(ClientError::Rejected {
                code: -32000,
                message: format!("token index {} rejected", registration.token_index),
            });
        }

        let mut ledger = lock(&self.ledger);
        if !ledger.groups.iter().any(|g| g.address == registration.group) {
            return Err(ClientError::NotFound {
                resource: format!("group {}", registration.group),
            });
        }
        if ledger
            .banks
            .iter()
            .any(|b| b.group == registration.group && b.token_index == registration.token_index)
        {
            return Err(ClientError::AlreadyExists {
                resource: format!("bank with token index {}", registration.token_index),
            });
        }

        let address = bank_address(&self.program_id, &registration.group, registration.token_index);
        ledger.banks.push(Bank {
            address,
            group: registration.group,
            name: registration.name.clone(),
            token_index: registration.token_index,
            mint: registration.mint,
            oracle: registration.oracle,
            oracle_conf_filter: registration.oracle_conf_filter,
            risk: registration.risk,
        });
        debug!(bank = %address, name = %registration.name, "Bank registered");
        Ok(())
    }

    async fn reload_group_state(&self, group: &Group) -> Result<Group> {
        self.enter(Operation::ReloadGroupState)?;

        let ledger = lock(&self.ledger);
        ledger
            .groups
            .iter()
            .find(|g| g.address == group.address)
            .map(|account| Self::load_group(&ledger, account))
            .ok_or_else(|| ClientError::NotFound {
                resource: format!("group {}", group.address),
            })
    }
}
