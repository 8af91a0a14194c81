//! Verification report
//!
//! Lists the group's banks as the chain client last reported them.

use std::fmt;

use bootstrap_core::{ReportFormat, TokenIndex};
use chain_client::Group;
use serde::{Serialize, Serializer};
use solana_sdk::pubkey::Pubkey;

use crate::orchestrator::BootstrapRun;

pub(crate) fn as_base58<S: Serializer>(key: &Pubkey, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(key)
}

pub(crate) fn as_base58_opt<S: Serializer>(
    key: &Option<Pubkey>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match key {
        Some(key) => serializer.collect_str(key),
        None => serializer.serialize_none(),
    }
}

/// One registered bank
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BankRecord {
    pub symbol: String,
    pub token_index: TokenIndex,
    #[serde(serialize_with = "as_base58")]
    pub bank: Pubkey,
    #[serde(serialize_with = "as_base58")]
    pub mint: Pubkey,
    #[serde(serialize_with = "as_base58")]
    pub oracle: Pubkey,
}

impl fmt::Display for BankRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "...registered Bank {} {} {}, mint {}, oracle {}",
            self.symbol, self.token_index, self.bank, self.mint, self.oracle
        )
    }
}

/// Records for every bank of the group, in the group's order
pub fn bank_records(group: &Group) -> Vec<BankRecord> {
    group
        .banks
        .iter()
        .map(|bank| BankRecord {
            symbol: bank.name.clone(),
            token_index: bank.token_index,
            bank: bank.address,
            mint: bank.mint,
            oracle: bank.oracle,
        })
        .collect()
}

/// What the run left on chain
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationReport {
    #[serde(serialize_with = "as_base58_opt")]
    pub group: Option<Pubkey>,
    pub banks: Vec<BankRecord>,
}

impl VerificationReport {
    pub fn from_run(run: &BootstrapRun) -> Self {
        match &run.group {
            Some(group) => Self {
                group: Some(group.address),
                banks: bank_records(group),
            },
            None => Self {
                group: None,
                banks: Vec::new(),
            },
        }
    }

    pub fn render(&self, format: ReportFormat) -> String {
        match format {
            ReportFormat::Text => self.to_string(),
            ReportFormat::Json => serde_json::to_string_pretty(self)
                .unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e)),
        }
    }
}

impl fmt::Display for VerificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.group {
            Some(group) => writeln!(f, "Group {}", group)?,
            None => writeln!(f, "Group not found")?,
        }
        for record in &self.banks {
            writeln!(f, "{}", record)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bootstrap_core::RiskParams;
    use chain_client::Bank;

    fn bank(group: Pubkey, name: &str, token_index: TokenIndex) -> Bank {
        Bank {
            address: Pubkey::new_unique(),
            group,
            name: name.to_string(),
            token_index,
            mint: Pubkey::new_unique(),
            oracle: Pubkey::new_unique(),
            oracle_conf_filter: 0.1,
            risk: RiskParams::from_ordered(&[0.0; 14]).unwrap(),
        }
    }

    fn group() -> Group {
        let address = Pubkey::new_unique();
        Group {
            address,
            admin: Pubkey::new_unique(),
            group_num: 0,
            permissionless: true,
            banks: vec![bank(address, "SOL", 2), bank(address, "BTC", 0)],
        }
    }

    #[test]
    fn test_records_keep_group_order() {
        let records = bank_records(&group());
        let indexes: Vec<_> = records.iter().map(|r| r.token_index).collect();
        assert_eq!(indexes, vec![2, 0]);
    }

    #[test]
    fn test_text_line() {
        let group = group();
        let record = &bank_records(&group)[0];
        let line = record.to_string();
        assert!(line.starts_with("...registered Bank SOL 2 "));
        assert!(line.contains(&format!("mint {}", group.banks[0].mint)));
        assert!(line.ends_with(&format!("oracle {}", group.banks[0].oracle)));
    }

    #[test]
    fn test_json_uses_base58() {
        let group = group();
        let report = VerificationReport {
            group: Some(group.address),
            banks: bank_records(&group),
        };
        let json: serde_json::Value =
            serde_json::from_str(&report.render(ReportFormat::Json)).unwrap();
        assert_eq!(json["group"], group.address.to_string());
        assert_eq!(json["banks"][1]["symbol"], "BTC");
        assert_eq!(json["banks"][1]["tokenIndex"], 0);
        assert_eq!(json["banks"][1]["bank"], group.banks[1].address.to_string());
    }

    #[test]
    fn test_empty_report() {
        let report = VerificationReport {
            group: None,
            banks: vec![],
        };
        assert_eq!(report.render(ReportFormat::Text), "Group not found\n");
        let json: serde_json::Value =
            serde_json::from_str(&report.render(ReportFormat::Json)).unwrap();
        assert!(json["group"].is_null());
    }
}
