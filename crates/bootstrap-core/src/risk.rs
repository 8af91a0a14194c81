//! Risk parameters carried by a bank registration
//!
//! Field order matches the order the lending program's `token_register`
//! instruction consumes them. Keep it that way: serializers and the RPC
//! client walk the fields in declaration order.

use serde::{Deserialize, Serialize};

/// Sentinel for the weight-scaling thresholds: scaling never kicks in
pub const WEIGHT_SCALE_DISABLED: f64 = f64::MAX;

/// Lending risk profile of a single bank
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskParams {
    /// First utilization breakpoint of the interest curve
    pub util0: f64,
    /// Borrow rate at `util0`
    pub rate0: f64,
    /// Second utilization breakpoint
    pub util1: f64,
    /// Borrow rate at `util1`
    pub rate1: f64,
    /// Borrow rate at full utilization
    pub max_rate: f64,
    /// Fee fraction charged on outstanding loans
    pub loan_fee_rate: f64,
    /// Fee fraction charged when a loan is opened
    pub loan_origination_fee_rate: f64,
    pub maint_asset_weight: f64,
    pub init_asset_weight: f64,
    pub maint_liab_weight: f64,
    pub init_liab_weight: f64,
    /// Liquidation fee fraction
    pub liquidation_fee: f64,
    /// Deposits above this quote value get a scaled-down asset weight
    #[serde(default = "weight_scale_disabled")]
    pub deposit_weight_scale_start_quote: f64,
    /// Borrows above this quote value get a scaled-up liability weight
    #[serde(default = "weight_scale_disabled")]
    pub borrow_weight_scale_start_quote: f64,
}

fn weight_scale_disabled() -> f64 {
    WEIGHT_SCALE_DISABLED
}

impl RiskParams {
    /// Field names in instruction order
    pub const FIELD_ORDER: [&'static str; 14] = [
        "util0",
        "rate0",
        "util1",
        "rate1",
        "max_rate",
        "loan_fee_rate",
        "loan_origination_fee_rate",
        "maint_asset_weight",
        "init_asset_weight",
        "maint_liab_weight",
        "init_liab_weight",
        "liquidation_fee",
        "deposit_weight_scale_start_quote",
        "borrow_weight_scale_start_quote",
    ];

    /// Values in instruction order, for wire encoders that take a flat list
    pub fn ordered_values(&self) -> [f64; 14] {
        [
            self.util0,
            self.rate0,
            self.util1,
            self.rate1,
            self.max_rate,
            self.loan_fee_rate,
            self.loan_origination_fee_rate,
            self.maint_asset_weight,
            self.init_asset_weight,
            self.maint_liab_weight,
            self.init_liab_weight,
            self.liquidation_fee,
            self.deposit_weight_scale_start_quote,
            self.borrow_weight_scale_start_quote,
        ]
    }

    /// Inverse of [`RiskParams::ordered_values`]; `None` unless exactly 14 values
    pub fn from_ordered(values: &[f64]) -> Option<Self> {
        let v: [f64; 14] = values.try_into().ok()?;
        Some(Self {
            util0: v[0],
            rate0: v[1],
            util1: v[2],
            rate1: v[3],
            max_rate: v[4],
            loan_fee_rate: v[5],
            loan_origination_fee_rate: v[6],
            maint_asset_weight: v[7],
            init_asset_weight: v[8],
            maint_liab_weight: v[9],
            init_liab_weight: v[10],
            liquidation_fee: v[11],
            deposit_weight_scale_start_quote: v[12],
            borrow_weight_scale_start_quote: v[13],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RiskParams {
        RiskParams {
            util0: 0.4,
            rate0: 0.07,
            util1: 0.8,
            rate1: 0.9,
            max_rate: 0.63,
            loan_fee_rate: 0.0005,
            loan_origination_fee_rate: 1.5,
            maint_asset_weight: 0.8,
            init_asset_weight: 0.6,
            maint_liab_weight: 1.2,
            init_liab_weight: 1.4,
            liquidation_fee: 0.02,
            deposit_weight_scale_start_quote: WEIGHT_SCALE_DISABLED,
            borrow_weight_scale_start_quote: WEIGHT_SCALE_DISABLED,
        }
    }

    /// Every field carries its 1-based position, so any transposition shows up
    fn positional() -> RiskParams {
        RiskParams {
            util0: 1.0,
            rate0: 2.0,
            util1: 3.0,
            rate1: 4.0,
            max_rate: 5.0,
            loan_fee_rate: 6.0,
            loan_origination_fee_rate: 7.0,
            maint_asset_weight: 8.0,
            init_asset_weight: 9.0,
            maint_liab_weight: 10.0,
            init_liab_weight: 11.0,
            liquidation_fee: 12.0,
            deposit_weight_scale_start_quote: 13.0,
            borrow_weight_scale_start_quote: 14.0,
        }
    }

    #[test]
    fn test_ordered_values_follow_instruction_order() {
        assert_eq!(
            positional().ordered_values(),
            [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0, 12.0, 13.0, 14.0]
        );
        assert_eq!(
            sample().ordered_values(),
            [0.4, 0.07, 0.8, 0.9, 0.63, 0.0005, 1.5, 0.8, 0.6, 1.2, 1.4, 0.02, f64::MAX, f64::MAX]
        );
    }

    #[test]
    fn test_from_ordered_assigns_by_position() {
        let values: Vec<f64> = (1..=14).map(f64::from).collect();
        let params = RiskParams::from_ordered(&values).unwrap();
        assert_eq!(params, positional());
        assert_eq!(params.max_rate, 5.0);
        assert_eq!(params.loan_fee_rate, 6.0);
        assert_eq!(params.maint_liab_weight, 10.0);
        assert_eq!(params.borrow_weight_scale_start_quote, 14.0);
    }

    #[test]
    fn test_field_order_names() {
        assert_eq!(RiskParams::FIELD_ORDER[0], "util0");
        assert_eq!(RiskParams::FIELD_ORDER[4], "max_rate");
        assert_eq!(RiskParams::FIELD_ORDER[5], "loan_fee_rate");
        assert_eq!(RiskParams::FIELD_ORDER[7], "maint_asset_weight");
        assert_eq!(RiskParams::FIELD_ORDER[10], "init_liab_weight");
        assert_eq!(RiskParams::FIELD_ORDER[13], "borrow_weight_scale_start_quote");
    }

    #[test]
    fn test_field_order_matches_serde_order() {
        let params = sample();
        let json = serde_json::to_value(params).unwrap();
        for (name, value) in RiskParams::FIELD_ORDER.iter().zip(params.ordered_values()) {
            assert_eq!(json[*name].as_f64(), Some(value), "field {}", name);
        }
    }

    #[test]
    fn test_from_ordered() {
        let params = sample();
        assert_eq!(RiskParams::from_ordered(&params.ordered_values()), Some(params));
        assert_eq!(RiskParams::from_ordered(&[0.4, 0.07]), None);
    }

    #[test]
    fn test_weight_scale_defaults_when_absent() {
        let json = serde_json::json!({
            "util0": 0.4, "rate0": 0.07, "util1": 0.8, "rate1": 0.9,
            "max_rate": 0.88, "loan_fee_rate": 0.0005, "loan_origination_fee_rate": 1.5,
            "maint_asset_weight": 0.8, "init_asset_weight": 0.6,
            "maint_liab_weight": 1.2, "init_liab_weight": 1.4, "liquidation_fee": 0.02
        });
        let parsed: RiskParams = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.deposit_weight_scale_start_quote, WEIGHT_SCALE_DISABLED);
        assert_eq!(parsed.borrow_weight_scale_start_quote, WEIGHT_SCALE_DISABLED);
    }
}
