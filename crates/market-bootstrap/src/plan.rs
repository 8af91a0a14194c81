//! Provisioning plan
//!
//! Which tokens the group gets, at which index, priced by which oracle and
//! with which risk parameters. Resolved against the asset catalog before any
//! network call so that a bad symbol never leaves a half-built group behind.

use std::collections::HashSet;

use bootstrap_core::risk::WEIGHT_SCALE_DISABLED;
use bootstrap_core::{CatalogError, RiskParams, TokenIndex};
use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

use crate::catalog::AssetCatalog;

/// Confidence filter passed with every registration (10%)
pub const ORACLE_CONF_FILTER: f64 = 0.1;

/// Price the USDC stub oracle is created with
pub const USDC_STUB_PRICE: f64 = 1.0;

/// Plan resolution errors. All of them abort the run before it starts.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("{symbol} is planned with an external oracle but the catalog lists none")]
    MissingOracle { symbol: String },

    #[error("Token index {token_index} is planned twice")]
    DuplicateTokenIndex { token_index: TokenIndex },
}

/// Where a token's price comes from
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OracleSource {
    /// The oracle published in the asset catalog
    External,
    /// An admin-owned oracle created by the run
    Stub { price: f64 },
}

/// One token as planned
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedToken {
    pub symbol: &'static str,
    pub token_index: TokenIndex,
    pub oracle: OracleSource,
    pub risk: RiskParams,
}

/// Oracle of a resolved token
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResolvedOracle {
    External(Pubkey),
    Stub { price: f64 },
}

/// A planned token with its catalog addresses filled in
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedToken {
    pub symbol: String,
    pub token_index: TokenIndex,
    pub mint: Pubkey,
    pub oracle: ResolvedOracle,
    pub oracle_conf_filter: f64,
    pub risk: RiskParams,
}

/// Rate curve and weights shared by every token; only `max_rate` differs
const BASE_RISK: RiskParams = RiskParams {
    util0: 0.4,
    rate0: 0.07,
    util1: 0.8,
    rate1: 0.9,
    max_rate: 1.0,
    loan_fee_rate: 0.0005,
    loan_origination_fee_rate: 1.5,
    maint_asset_weight: 0.8,
    init_asset_weight: 0.6,
    maint_liab_weight: 1.2,
    init_liab_weight: 1.4,
    liquidation_fee: 0.02,
    deposit_weight_scale_start_quote: WEIGHT_SCALE_DISABLED,
    borrow_weight_scale_start_quote: WEIGHT_SCALE_DISABLED,
};

pub const BTC_RISK: RiskParams = RiskParams {
    max_rate: 0.88,
    ..BASE_RISK
};
pub const USDC_RISK: RiskParams = RiskParams {
    max_rate: 1.5,
    ..BASE_RISK
};
pub const SOL_RISK: RiskParams = RiskParams {
    max_rate: 0.63,
    ..BASE_RISK
};

/// BTC@0 and SOL@2 on their catalog oracles, USDC@1 on a stub priced at 1.0
pub fn default_plan() -> Vec<PlannedToken> {
    vec![
        PlannedToken {
            symbol: "BTC",
            token_index: 0,
            oracle: OracleSource::External,
            risk: BTC_RISK,
        },
        PlannedToken {
            symbol: "USDC",
            token_index: 1,
            oracle: OracleSource::Stub {
                price: USDC_STUB_PRICE,
            },
            risk: USDC_RISK,
        },
        PlannedToken {
            symbol: "SOL",
            token_index: 2,
            oracle: OracleSource::External,
            risk: SOL_RISK,
        },
    ]
}

/// Resolve every planned token against the catalog, in plan order
pub fn resolve_plan(
    plan: &[PlannedToken],
    catalog: &AssetCatalog,
) -> Result<Vec<ResolvedToken>, PlanError> {
    let mut seen = HashSet::new();
    let mut resolved = Vec::with_capacity(plan.len());

    for planned in plan {
        if !seen.insert(planned.token_index) {
            return Err(PlanError::DuplicateTokenIndex {
                token_index: planned.token_index,
            });
        }

        let asset = catalog.lookup(planned.symbol)?;
        let oracle = match planned.oracle {
            OracleSource::External => {
                let address = asset.oracle.ok_or_else(|| PlanError::MissingOracle {
                    symbol: planned.symbol.to_string(),
                })?;
                ResolvedOracle::External(address)
            }
            OracleSource::Stub { price } => ResolvedOracle::Stub { price },
        };

        resolved.push(ResolvedToken {
            symbol: asset.symbol,
            token_index: planned.token_index,
            mint: asset.mint,
            oracle,
            oracle_conf_filter: ORACLE_CONF_FILTER,
            risk: planned.risk,
        });
    }

    Ok(resolved)
}
