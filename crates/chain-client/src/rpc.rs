//! JSON-RPC chain client
//!
//! Talks JSON-RPC 2.0 to the administrative gateway in front of the lending
//! program. Mutating calls carry the admin pubkey and an ed25519 signature
//! over the serialized payload; the gateway turns them into program
//! instructions. Read-backs are unsigned.
//!
//! The endpoint must serve the gateway methods (`createGroup`,
//! `getGroupByAdmin`, `createStubOracle`, `getStubOracle`, `registerToken`,
//! `getGroup`). A plain Solana RPC node answers them with "method not found"
//! (-32601), which surfaces as a rejected step.

use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bootstrap_core::{ClientError, GroupNum, RiskParams, RpcConfig, TokenIndex};
use serde_json::{json, Value};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signer};

use crate::{Bank, ChainClient, Group, Result, StubOracle, TokenRegistration};

/// Gateway error code for a resource that already exists
pub const ERR_ALREADY_EXISTS: i64 = -32010;
/// Gateway error code for a missing account
pub const ERR_NOT_FOUND: i64 = -32011;

/// Chain client backed by the administrative JSON-RPC gateway
pub struct RpcChainClient {
    http: reqwest::Client,
    url: String,
    program_id: Pubkey,
    keypair: Keypair,
    timeout: Duration,
    next_id: AtomicU64,
}

impl RpcChainClient {
    pub fn new(config: &RpcConfig, program_id: Pubkey, keypair: Keypair) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent("market-bootstrap")
            .build()
            .map_err(|e| ClientError::Unreachable {
                url: format!("{}: {}", config.url, e),
            })?;

        Ok(Self {
            http,
            url: config.url.clone(),
            program_id,
            keypair,
            timeout: Duration::from_secs(config.timeout_secs),
            next_id: AtomicU64::new(1),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Unsigned read call
    async fn query(&self, method: &str, params: Value) -> Result<Value> {
        self.call(method, params).await
    }

    /// Signed mutating call
    async fn submit(&self, method: &str, payload: Value) -> Result<()> {
        let params = sign_payload(&self.keypair, payload)?;
        self.call(method, params).await.map(|_| ())
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        tracing::debug!(method, id, "RPC request");

        let response = tokio::time::timeout(self.timeout, self.post_json(&body))
            .await
            .map_err(|_| ClientError::Timeout {
                secs: self.timeout.as_secs(),
            })?
            .map_err(|e| map_transport_error(e, &self.url))?;

        parse_envelope(response)
    }

    async fn post_json(&self, body: &Value) -> std::result::Result<Value, reqwest::Error> {
        let response = self.http.post(&self.url).json(body).send().await?;
        response.error_for_status()?.json().await
    }
}

fn map_transport_error(err: reqwest::Error, url: &str) -> ClientError {
    if err.is_connect() {
        ClientError::Unreachable {
            url: url.to_string(),
        }
    } else if let Some(status) = err.status() {
        ClientError::Rejected {
            code: i64::from(status.as_u16()),
            message: err.to_string(),
        }
    } else {
        ClientError::ParseError(err.to_string())
    }
}

/// Wrap a payload with the signer and its signature over the payload bytes
fn sign_payload(keypair: &Keypair, payload: Value) -> Result<Value> {
    let bytes = serde_json::to_vec(&payload)
        .map_err(|e| ClientError::ParseError(format!("Failed to serialize payload: {}", e)))?;
    let signature = keypair.sign_message(&bytes);

    Ok(json!({
        "payload": payload,
        "signer": keypair.pubkey().to_string(),
        "signature": signature.to_string(),
    }))
}

/// Split a JSON-RPC response into its result or a typed error
fn parse_envelope(response: Value) -> Result<Value> {
    if let Some(error) = response.get("error").filter(|e| !e.is_null()) {
        let code = error["code"].as_i64().unwrap_or_default();
        let message = error["message"].as_str().unwrap_or("unknown error").to_string();
        return Err(match code {
            ERR_ALREADY_EXISTS => ClientError::AlreadyExists { resource: message },
            ERR_NOT_FOUND => ClientError::NotFound { resource: message },
            _ => ClientError::Rejected { code, message },
        });
    }

    response
        .get("result")
        .cloned()
        .ok_or_else(|| ClientError::ParseError("Response has neither result nor error".into()))
}

fn parse_pubkey(json: &Value, field: &str) -> Result<Pubkey> {
    let raw = json[field]
        .as_str()
        .ok_or_else(|| ClientError::ParseError(format!("Missing {}", field)))?;
    Pubkey::from_str(raw)
        .map_err(|e| ClientError::ParseError(format!("Invalid {} '{}': {}", field, raw, e)))
}

fn parse_f64(json: &Value, field: &str) -> Result<f64> {
    json[field]
        .as_f64()
        .ok_or_else(|| ClientError::ParseError(format!("Missing {}", field)))
}

fn parse_bank(json: &Value, group: &Pubkey) -> Result<Bank> {
    let values: Vec<f64> = json["riskParams"]
        .as_array()
        .map(|arr| arr.iter().filter_map(Value::as_f64).collect())
        .unwrap_or_default();
    let risk = RiskParams::from_ordered(&values).ok_or_else(|| {
        ClientError::ParseError(format!("Expected 14 risk params, got {}", values.len()))
    })?;

    let token_index = json["tokenIndex"]
        .as_u64()
        .and_then(|i| TokenIndex::try_from(i).ok())
        .ok_or_else(|| ClientError::ParseError("Missing or invalid tokenIndex".into()))?;

    Ok(Bank {
        address: parse_pubkey(json, "address")?,
        group: *group,
        name: json["name"].as_str().unwrap_or_default().to_string(),
        token_index,
        mint: parse_pubkey(json, "mint")?,
        oracle: parse_pubkey(json, "oracle")?,
        oracle_conf_filter: parse_f64(json, "oracleConfFilter")?,
        risk,
    })
}

fn parse_group(json: &Value) -> Result<Group> {
    let address = parse_pubkey(json, "address")?;
    let group_num = json["groupNum"]
        .as_u64()
        .and_then(|n| GroupNum::try_from(n).ok())
        .ok_or_else(|| ClientError::ParseError("Missing or invalid groupNum".into()))?;

    let banks = json["banks"]
        .as_array()
        .map(|arr| {
            arr.iter()
                .map(|b| parse_bank(b, &address))
                .collect::<Result<Vec<_>>>()
        })
        .unwrap_or_else(|| Ok(Vec::new()))?;

    Ok(Group {
        address,
        admin: parse_pubkey(json, "admin")?,
        group_num,
        permissionless: json["permissionless"].as_bool().unwrap_or(false),
        banks,
    })
}

fn parse_stub_oracle(json: &Value) -> Result<StubOracle> {
    Ok(StubOracle {
        address: parse_pubkey(json, "address")?,
        group: parse_pubkey(json, "group")?,
        mint: parse_pubkey(json, "mint")?,
        price: parse_f64(json, "price")?,
    })
}

/// `registerToken` payload; risk parameters travel as a flat array in instruction order
fn registration_payload(program_id: &Pubkey, registration: &TokenRegistration) -> Value {
    json!({
        "programId": program_id.to_string(),
        "group": registration.group.to_string(),
        "mint": registration.mint.to_string(),
        "oracle": registration.oracle.to_string(),
        "oracleConfFilter": registration.oracle_conf_filter,
        "tokenIndex": registration.token_index,
        "name": registration.name,
        "riskParams": registration.risk.ordered_values(),
    })
}

#[async_trait]
impl ChainClient for RpcChainClient {
    fn admin(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    async fn create_group(&self, group_num: GroupNum, permissionless: bool) -> Result<()> {
        self.submit(
            "createGroup",
            json!({
                "programId": self.program_id.to_string(),
                "groupNum": group_num,
                "permissionless": permissionless,
            }),
        )
        .await
    }

    async fn get_group_by_admin(&self, admin: &Pubkey, group_num: GroupNum) -> Result<Group> {
        let result = self
            .query(
                "getGroupByAdmin",
                json!({
                    "programId": self.program_id.to_string(),
                    "admin": admin.to_string(),
                    "groupNum": group_num,
                }),
            )
            .await?;
        if result.is_null() {
            return Err(ClientError::NotFound {
                resource: format!("group {} of {}", group_num, admin),
            });
        }
        parse_group(&result)
    }

    async fn create_stub_oracle(&self, group: &Pubkey, mint: &Pubkey, price: f64) -> Result<()> {
        self.submit(
            "createStubOracle",
            json!({
                "programId": self.program_id.to_string(),
                "group": group.to_string(),
                "mint": mint.to_string(),
                "price": price,
            }),
        )
        .await
    }

    async fn get_stub_oracle(&self, group: &Pubkey, mint: &Pubkey) -> Result<StubOracle> {
        let result = self
            .query(
                "getStubOracle",
                json!({
                    "programId": self.program_id.to_string(),
                    "group": group.to_string(),
                    "mint": mint.to_string(),
                }),
            )
            .await?;

        // The gateway answers with every stub oracle for the mint; the first is canonical
        let first = match &result {
            Value::Array(items) => items.first().cloned().unwrap_or(Value::Null),
            other => other.clone(),
        };
        if first.is_null() {
            return Err(ClientError::NotFound {
                resource: format!("stub oracle for mint {}", mint),
            });
        }
        parse_stub_oracle(&first)
    }

    async fn register_token(&self, registration: &TokenRegistration) -> Result<()> {
        self.submit(
            "registerToken",
            registration_payload(&self.program_id, registration),
        )
        .await
    }

    async fn reload_group_state(&self, group: &Group) -> Result<Group> {
        let result = self
            .query(
                "getGroup",
                json!({
                    "programId": self.program_id.to_string(),
                    "group": group.address.to_string(),
                }),
            )
            .await?;
        if result.is_null() {
            return Err(ClientError::NotFound {
                resource: format!("group {}", group.address),
            });
        }
        parse_group(&result)
    }
}
