//! Bootstrap orchestrator
//!
//! Drives the provisioning sequence against a [`ChainClient`]: create the
//! group, read it back, then for each planned token create its stub oracle
//! (if any), register the bank and reload the group. Every step ends in a
//! [`StepOutcome`]. A failed step is logged and the sequence moves on;
//! re-running the whole sequence is the retry.

use bootstrap_core::{ClientError, GroupNum};
use chain_client::{ChainClient, Group, TokenRegistration};
use serde::Serialize;
use solana_sdk::pubkey::Pubkey;

use crate::plan::{ResolvedOracle, ResolvedToken};
use crate::step::{BootstrapState, Step, StepOutcome, StepRecord, Tolerance};

/// Groups created by the bootstrap accept token registrations from anyone
pub const PERMISSIONLESS: bool = true;

/// Counts of step outcomes
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub succeeded: usize,
    pub tolerated: usize,
    pub skipped: usize,
}

/// Everything a run produced
#[derive(Debug, Clone)]
pub struct BootstrapRun {
    /// Group as of the last successful fetch or reload
    pub group: Option<Group>,
    pub steps: Vec<StepRecord>,
    /// Furthest state reached through successful steps
    pub reached: BootstrapState,
    /// Always [`BootstrapState::Done`] once `run` returns
    pub state: BootstrapState,
}

impl BootstrapRun {
    pub fn summary(&self) -> RunSummary {
        self.steps
            .iter()
            .fold(RunSummary::default(), |mut summary, record| {
                match record.outcome {
                    StepOutcome::Succeeded => summary.succeeded += 1,
                    StepOutcome::Tolerated { .. } => summary.tolerated += 1,
                    StepOutcome::Skipped { .. } => summary.skipped += 1,
                }
                summary
            })
    }

    /// Outcome of the first step matching `step`
    pub fn outcome_of(&self, step: &Step) -> Option<&StepOutcome> {
        self.steps
            .iter()
            .find(|record| record.step == *step)
            .map(|record| &record.outcome)
    }
}

/// Runs the provisioning sequence once
pub struct Orchestrator<'a, C: ChainClient + ?Sized> {
    client: &'a C,
    group_num: GroupNum,
    tokens: Vec<ResolvedToken>,
    state: BootstrapState,
    steps: Vec<StepRecord>,
}

impl<'a, C: ChainClient + ?Sized> Orchestrator<'a, C> {
    pub fn new(client: &'a C, group_num: GroupNum, tokens: Vec<ResolvedToken>) -> Self {
        Self {
            client,
            group_num,
            tokens,
            state: BootstrapState::NoGroup,
            steps: Vec::new(),
        }
    }

    pub async fn run(mut self) -> BootstrapRun {
        let client = self.client;
        let admin = client.admin();
        tracing::info!(
            %admin,
            group_num = self.group_num,
            tokens = self.tokens.len(),
            "Starting bootstrap"
        );

        let step = self.begin(Step::CreateGroup);
        let created = client.create_group(self.group_num, PERMISSIONLESS).await;
        self.settle(step, created, Some(BootstrapState::GroupCreated));

        let step = self.begin(Step::FetchGroup);
        let fetched = client.get_group_by_admin(&admin, self.group_num).await;
        let tokens = std::mem::take(&mut self.tokens);
        // A fetched group proves creation even when this run's create was a duplicate
        let fetched = self.settle(step, fetched, Some(BootstrapState::GroupCreated));
        let Some(mut group) = fetched else {
            for token in &tokens {
                self.skip(register_step(token), "group could not be fetched");
            }
            return self.finish(None);
        };
        tracing::info!(group = %group.address, banks = group.banks.len(), "Group ready");

        for token in &tokens {
            self.provision(&mut group, token).await;
        }

        let step = self.begin(Step::FinalReconcile);
        let reconciled = client.reload_group_state(&group).await;
        if let Some(fresh) = self.settle(step, reconciled, None) {
            group = fresh;
        }

        self.finish(Some(group))
    }

    async fn provision(&mut self, group: &mut Group, token: &ResolvedToken) {
        let client = self.client;
        let symbol = token.symbol.clone();

        let oracle = match token.oracle {
            ResolvedOracle::External(address) => {
                self.state = BootstrapState::TokenPending(token.token_index);
                address
            }
            ResolvedOracle::Stub { price } => {
                self.state = BootstrapState::OraclePending(token.token_index);

                let step = self.begin(Step::CreateStubOracle {
                    symbol: symbol.clone(),
                });
                let created = client
                    .create_stub_oracle(&group.address, &token.mint, price)
                    .await;
                self.settle(step, created, None);

                // Only the read-back address is used, never the create result
                let step = self.begin(Step::FetchStubOracle {
                    symbol: symbol.clone(),
                });
                let fetched = client.get_stub_oracle(&group.address, &token.mint).await;
                let ready = Some(BootstrapState::OracleReady(token.token_index));
                match self.settle(step, fetched, ready) {
                    Some(stub) => stub.address,
                    None => {
                        self.skip(register_step(token), "stub oracle could not be read back");
                        return;
                    }
                }
            }
        };

        let registration = registration(group.address, oracle, token);
        let step = self.begin(register_step(token));
        let registered = client.register_token(&registration).await;
        let registered_state = Some(BootstrapState::TokenRegistered(token.token_index));
        if self.settle(step, registered, registered_state).is_none() {
            return;
        }

        let step = self.begin(Step::ReloadGroup { symbol });
        let reloaded = client.reload_group_state(group).await;
        if let Some(fresh) = self.settle(step, reloaded, None) {
            *group = fresh;
        }
    }

    fn begin(&self, step: Step) -> Step {
        tracing::debug!(step = step.name(), symbol = step.symbol(), "Starting step");
        step
    }

    /// Record the outcome of a step; the value survives only on success.
    ///
    /// A success moves the state machine to `next`, a failure leaves it where it is.
    fn settle<T>(
        &mut self,
        step: Step,
        result: Result<T, ClientError>,
        next: Option<BootstrapState>,
    ) -> Option<T> {
        let (outcome, value) = match result {
            Ok(value) => {
                if let Some(next) = next {
                    self.state = next;
                }
                tracing::info!(
                    step = step.name(),
                    symbol = step.symbol(),
                    state = ?self.state,
                    "Step succeeded"
                );
                (StepOutcome::Succeeded, Some(value))
            }
            Err(e) => {
                log_failure(&step, &e);
                (StepOutcome::tolerated(&e), None)
            }
        };
        self.steps.push(StepRecord {
            step,
            outcome,
            state: self.state,
        });
        value
    }

    fn skip(&mut self, step: Step, reason: &str) {
        tracing::warn!(step = step.name(), symbol = step.symbol(), reason, "Step skipped");
        self.steps.push(StepRecord {
            step,
            outcome: StepOutcome::skipped(reason),
            state: self.state,
        });
    }

    fn finish(self, group: Option<Group>) -> BootstrapRun {
        let run = BootstrapRun {
            group,
            steps: self.steps,
            reached: self.state,
            state: BootstrapState::Done,
        };
        let summary = run.summary();
        tracing::info!(
            reached = ?run.reached,
            succeeded = summary.succeeded,
            tolerated = summary.tolerated,
            skipped = summary.skipped,
            "Bootstrap finished"
        );
        run
    }
}

fn register_step(token: &ResolvedToken) -> Step {
    Step::RegisterToken {
        symbol: token.symbol.clone(),
        token_index: token.token_index,
    }
}

fn registration(group: Pubkey, oracle: Pubkey, token: &ResolvedToken) -> TokenRegistration {
    TokenRegistration {
        group,
        mint: token.mint,
        oracle,
        oracle_conf_filter: token.oracle_conf_filter,
        token_index: token.token_index,
        name: token.symbol.clone(),
        risk: token.risk,
    }
}

fn log_failure(step: &Step, e: &ClientError) {
    let code = e.error_code();
    match Tolerance::classify(e) {
        Tolerance::Duplicate => tracing::info!(
            step = step.name(),
            symbol = step.symbol(),
            code,
            error = %e,
            "Already exists, continuing"
        ),
        Tolerance::Transient => tracing::warn!(
            step = step.name(),
            symbol = step.symbol(),
            code,
            error = %e,
            "Step failed, continuing; re-run to retry"
        ),
        Tolerance::Rejected => tracing::error!(
            step = step.name(),
            symbol = step.symbol(),
            code,
            error = %e,
            "Step rejected, continuing"
        ),
    }
}
