//! market-bootstrap: Provisioning of a lending market group
//!
//! Creates a group, registers its tokens (BTC, USDC, SOL) with their oracles
//! and risk parameters, and reports the banks the chain ended up with.
//!
//! # Modules
//! - [`catalog`]: symbol to mint/oracle lookup per cluster
//! - [`plan`]: tokens to register and their risk parameters
//! - [`step`]: step identities and outcomes
//! - [`orchestrator`]: the provisioning sequence
//! - [`report`]: verification report

pub mod catalog;
pub mod orchestrator;
pub mod plan;
pub mod report;
pub mod step;

use bootstrap_core::GroupNum;
use chain_client::ChainClient;

pub use catalog::{Asset, AssetCatalog};
pub use orchestrator::{BootstrapRun, Orchestrator, RunSummary};
pub use plan::{default_plan, resolve_plan, PlanError, ResolvedToken};
pub use report::{BankRecord, VerificationReport};
pub use step::{BootstrapState, Step, StepOutcome, StepRecord, Tolerance};

/// Resolve the default plan against `catalog` and run it once.
///
/// Fails only when the plan cannot be resolved, before any chain call.
pub async fn bootstrap<C: ChainClient + ?Sized>(
    client: &C,
    catalog: &AssetCatalog,
    group_num: GroupNum,
) -> Result<BootstrapRun, PlanError> {
    let tokens = resolve_plan(&default_plan(), catalog)?;
    Ok(Orchestrator::new(client, group_num, tokens).run().await)
}
