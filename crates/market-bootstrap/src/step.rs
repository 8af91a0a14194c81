//! Steps of a bootstrap run and their outcomes

use std::fmt;

use bootstrap_core::{ClientError, TokenIndex};
use serde::Serialize;

/// One chain interaction in the provisioning sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    CreateGroup,
    FetchGroup,
    CreateStubOracle { symbol: String },
    FetchStubOracle { symbol: String },
    RegisterToken { symbol: String, token_index: TokenIndex },
    ReloadGroup { symbol: String },
    /// Reload before the report, whatever happened earlier
    FinalReconcile,
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateGroup => "create_group",
            Self::FetchGroup => "fetch_group",
            Self::CreateStubOracle { .. } => "create_stub_oracle",
            Self::FetchStubOracle { .. } => "fetch_stub_oracle",
            Self::RegisterToken { .. } => "register_token",
            Self::ReloadGroup { .. } => "reload_group",
            Self::FinalReconcile => "final_reconcile",
        }
    }

    /// Symbol of the token the step belongs to, if any
    pub fn symbol(&self) -> Option<&str> {
        match self {
            Self::CreateStubOracle { symbol }
            | Self::FetchStubOracle { symbol }
            | Self::RegisterToken { symbol, .. }
            | Self::ReloadGroup { symbol } => Some(symbol),
            _ => None,
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.symbol() {
            Some(symbol) => write!(f, "{} {}", self.name(), symbol),
            None => write!(f, "{}", self.name()),
        }
    }
}

/// Position in the provisioning state machine.
///
/// Successful mutations advance it; a failed step leaves it where it was while
/// the run moves on to the next step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "token_index", rename_all = "snake_case")]
pub enum BootstrapState {
    NoGroup,
    GroupCreated,
    TokenPending(TokenIndex),
    OraclePending(TokenIndex),
    OracleReady(TokenIndex),
    TokenRegistered(TokenIndex),
    Done,
}

/// Why a failed step was let through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tolerance {
    /// The resource is already there; nothing to do
    Duplicate,
    /// Outage or read-after-write lag; a re-run may succeed
    Transient,
    /// The chain refused the request
    Rejected,
}

impl Tolerance {
    pub fn classify(err: &ClientError) -> Self {
        if err.is_duplicate() {
            Self::Duplicate
        } else if err.is_transient() {
            Self::Transient
        } else {
            Self::Rejected
        }
    }
}

/// Result of a single step.
///
/// Precondition failures never show up here: they stop the run before the
/// first step (see [`crate::plan::PlanError`]).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StepOutcome {
    Succeeded,
    Tolerated {
        tolerance: Tolerance,
        code: &'static str,
        error: String,
    },
    /// Not attempted because an earlier step left nothing to work with
    Skipped { reason: String },
}

impl StepOutcome {
    pub fn tolerated(err: &ClientError) -> Self {
        Self::Tolerated {
            tolerance: Tolerance::classify(err),
            code: err.error_code(),
            error: err.to_string(),
        }
    }

    pub fn skipped(reason: impl Into<String>) -> Self {
        Self::Skipped {
            reason: reason.into(),
        }
    }
}

/// Journal entry of a run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepRecord {
    #[serde(flatten)]
    pub step: Step,
    #[serde(flatten)]
    pub outcome: StepOutcome,
    /// State after the step settled
    pub state: BootstrapState,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_display() {
        assert_eq!(Step::CreateGroup.to_string(), "create_group");
        let step = Step::RegisterToken {
            symbol: "SOL".into(),
            token_index: 2,
        };
        assert_eq!(step.to_string(), "register_token SOL");
        assert_eq!(step.symbol(), Some("SOL"));
    }

    #[test]
    fn test_classify() {
        let dup = ClientError::AlreadyExists {
            resource: "bank".into(),
        };
        assert_eq!(Tolerance::classify(&dup), Tolerance::Duplicate);

        let lag = ClientError::NotFound {
            resource: "stub oracle".into(),
        };
        assert_eq!(Tolerance::classify(&lag), Tolerance::Transient);

        let down = ClientError::Timeout { secs: 30 };
        assert_eq!(Tolerance::classify(&down), Tolerance::Transient);

        let refused = ClientError::Rejected {
            code: -32000,
            message: "invalid oracle".into(),
        };
        assert_eq!(Tolerance::classify(&refused), Tolerance::Rejected);

        let bad = ClientError::ParseError("missing field".into());
        assert_eq!(Tolerance::classify(&bad), Tolerance::Rejected);
    }

    #[test]
    fn test_record_json() {
        let record = StepRecord {
            step: Step::RegisterToken {
                symbol: "BTC".into(),
                token_index: 0,
            },
            outcome: StepOutcome::tolerated(&ClientError::AlreadyExists {
                resource: "bank with token index 0".into(),
            }),
            state: BootstrapState::TokenPending(0),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["step"], "register_token");
        assert_eq!(json["symbol"], "BTC");
        assert_eq!(json["token_index"], 0);
        assert_eq!(json["outcome"], "tolerated");
        assert_eq!(json["tolerance"], "duplicate");
        assert_eq!(json["code"], "already_exists");
        assert_eq!(json["state"]["state"], "token_pending");
        assert_eq!(json["state"]["token_index"], 0);
    }
}
