//! Three-step endpoint probe chain
//!
//! Validates that an RPC endpoint is live and minimally functional:
//! latest block number → block by number (with full transactions) →
//! first transaction by hash. Each step's failure (missing result, present
//! error, empty transaction list, transport failure) short-circuits the
//! chain; later steps are skipped, not retried.

use std::time::{Duration, Instant};

use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::rpc::{RpcClient, ETH_BLOCK_NUMBER, ETH_GET_BLOCK_BY_NUMBER, ETH_GET_TRANSACTION_BY_HASH};

/// Outcome of one chain step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum StepOutcome {
    Passed,
    Failed(String),
    /// A prior step failed, so this one never ran.
    Skipped,
}

impl StepOutcome {
    pub fn passed(&self) -> bool {
        matches!(self, StepOutcome::Passed)
    }

    pub fn skipped(&self) -> bool {
        matches!(self, StepOutcome::Skipped)
    }
}

/// One executed (or skipped) chain step.
#[derive(Debug, Clone, Serialize)]
pub struct ProbeStep {
    pub method: &'static str,
    pub outcome: StepOutcome,
    /// Wall-clock time of the remote call; zero for skipped steps.
    pub elapsed: Duration,
}

impl ProbeStep {
    fn skipped(method: &'static str) -> Self {
        Self {
            method,
            outcome: StepOutcome::Skipped,
            elapsed: Duration::ZERO,
        }
    }
}

/// Result of probing one endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ProbeReport {
    pub endpoint: String,
    pub block_number: ProbeStep,
    pub block_details: ProbeStep,
    pub transaction: ProbeStep,
}

impl ProbeReport {
    /// True iff all three steps ran and passed.
    pub fn fully_passed(&self) -> bool {
        self.block_number.outcome.passed()
            && self.block_details.outcome.passed()
            && self.transaction.outcome.passed()
    }

    /// True iff the first call failed and nothing after it ran.
    pub fn halted_at_first_step(&self) -> bool {
        !self.block_number.outcome.passed()
            && self.block_details.outcome.skipped()
            && self.transaction.outcome.skipped()
    }

    /// Durations of the steps that actually issued a request.
    pub fn request_durations(&self) -> Vec<Duration> {
        [&self.block_number, &self.block_details, &self.transaction]
            .into_iter()
            .filter(|s| !s.outcome.skipped())
            .map(|s| s.elapsed)
            .collect()
    }
}

/// The reusable probe chain, shared by the UI scenarios and the load test.
#[derive(Debug, Clone)]
pub struct ProbeChain {
    client: RpcClient,
}

impl ProbeChain {
    pub fn new(client: RpcClient) -> Self {
        Self { client }
    }

    /// Run the chain against `endpoint`. Remote-call failures are folded
    /// into the report rather than raised, per the harness error policy.
    pub async fn run(&self, endpoint: &str) -> ProbeReport {
        let (block_number_step, block_number) = self.latest_block_number(endpoint).await;

        let Some(block_number) = block_number else {
            warn!(%endpoint, "probe halted: no usable block number");
            return ProbeReport {
                endpoint: endpoint.to_string(),
                block_number: block_number_step,
                block_details: ProbeStep::skipped(ETH_GET_BLOCK_BY_NUMBER),
                transaction: ProbeStep::skipped(ETH_GET_TRANSACTION_BY_HASH),
            };
        };
        info!(%endpoint, %block_number, "latest block number");

        let (block_details_step, tx_hash) = self.block_by_number(endpoint, &block_number).await;

        let Some(tx_hash) = tx_hash else {
            return ProbeReport {
                endpoint: endpoint.to_string(),
                block_number: block_number_step,
                block_details: block_details_step,
                transaction: ProbeStep::skipped(ETH_GET_TRANSACTION_BY_HASH),
            };
        };
        info!(%endpoint, %tx_hash, "using first transaction hash from block");

        let transaction_step = self.transaction_by_hash(endpoint, &tx_hash).await;

        ProbeReport {
            endpoint: endpoint.to_string(),
            block_number: block_number_step,
            block_details: block_details_step,
            transaction: transaction_step,
        }
    }

    /// Step 1: `eth_blockNumber`. Passes iff a result is present and no
    /// error is; the result string feeds step 2.
    async fn latest_block_number(&self, endpoint: &str) -> (ProbeStep, Option<String>) {
        let start = Instant::now();
        let outcome = self.client.call(endpoint, ETH_BLOCK_NUMBER, vec![]).await;
        let elapsed = start.elapsed();

        let (outcome, block_number) = match outcome {
            Ok(resp) if resp.is_ok() => match resp.result.as_ref().and_then(Value::as_str) {
                Some(n) => (StepOutcome::Passed, Some(n.to_string())),
                None => (
                    StepOutcome::Failed("block number result is not a string".to_string()),
                    None,
                ),
            },
            Ok(resp) => (StepOutcome::Failed(resp.failure_reason()), None),
            Err(e) => (StepOutcome::Failed(e.to_string()), None),
        };

        if let StepOutcome::Failed(reason) = &outcome {
            warn!(%endpoint, reason, "eth_blockNumber failed");
        }

        (
            ProbeStep {
                method: ETH_BLOCK_NUMBER,
                outcome,
                elapsed,
            },
            block_number,
        )
    }

    /// Step 2: `eth_getBlockByNumber(blockNumber, true)`. Passes iff the
    /// block is present and its transaction list is non-empty; the first
    /// transaction hash feeds step 3.
    async fn block_by_number(&self, endpoint: &str, block_number: &str) -> (ProbeStep, Option<String>) {
        let params = vec![json!(block_number), json!(true)];
        let start = Instant::now();
        let outcome = self.client.call(endpoint, ETH_GET_BLOCK_BY_NUMBER, params).await;
        let elapsed = start.elapsed();

        let (outcome, tx_hash) = match outcome {
            Ok(resp) if resp.is_ok() => match first_transaction_hash(resp.result.as_ref()) {
                Some(hash) => (StepOutcome::Passed, Some(hash)),
                None => (
                    StepOutcome::Failed("no transactions found in the block".to_string()),
                    None,
                ),
            },
            Ok(resp) => (StepOutcome::Failed(resp.failure_reason()), None),
            Err(e) => (StepOutcome::Failed(e.to_string()), None),
        };

        if let StepOutcome::Failed(reason) = &outcome {
            warn!(%endpoint, block_number, reason, "eth_getBlockByNumber failed");
        }

        (
            ProbeStep {
                method: ETH_GET_BLOCK_BY_NUMBER,
                outcome,
                elapsed,
            },
            tx_hash,
        )
    }

    /// Step 3: `eth_getTransactionByHash(hash)`. Passes iff a result is
    /// present and no error is.
    async fn transaction_by_hash(&self, endpoint: &str, tx_hash: &str) -> ProbeStep {
        let params = vec![json!(tx_hash)];
        let start = Instant::now();
        let outcome = self
            .client
            .call(endpoint, ETH_GET_TRANSACTION_BY_HASH, params)
            .await;
        let elapsed = start.elapsed();

        let outcome = match outcome {
            Ok(resp) if resp.is_ok() => StepOutcome::Passed,
            Ok(resp) => StepOutcome::Failed(resp.failure_reason()),
            Err(e) => StepOutcome::Failed(e.to_string()),
        };

        if let StepOutcome::Failed(reason) = &outcome {
            warn!(%endpoint, tx_hash, reason, "eth_getTransactionByHash failed");
        }

        ProbeStep {
            method: ETH_GET_TRANSACTION_BY_HASH,
            outcome,
            elapsed,
        }
    }
}

/// Hash of the first transaction in a block result, if any. With
/// `fullTransactionObjects = true` entries are objects carrying a `hash`
/// field; bare hash strings are accepted for robustness.
fn first_transaction_hash(block: Option<&Value>) -> Option<String> {
    let first = block?.get("transactions")?.as_array()?.first()?;
    match first {
        Value::String(hash) => Some(hash.clone()),
        Value::Object(_) => first.get("hash")?.as_str().map(str::to_string),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_hash_from_full_transaction_objects() {
        let block = json!({
            "number": "0x14fd2e1",
            "transactions": [
                { "hash": "0xaaa", "from": "0x1" },
                { "hash": "0xbbb", "from": "0x2" }
            ]
        });
        assert_eq!(first_transaction_hash(Some(&block)).as_deref(), Some("0xaaa"));
    }

    #[test]
    fn first_hash_from_bare_hash_list() {
        let block = json!({ "transactions": ["0xccc", "0xddd"] });
        assert_eq!(first_transaction_hash(Some(&block)).as_deref(), Some("0xccc"));
    }

    #[test]
    fn empty_or_missing_transactions_yield_none() {
        assert_eq!(first_transaction_hash(Some(&json!({ "transactions": [] }))), None);
        assert_eq!(first_transaction_hash(Some(&json!({ "number": "0x1" }))), None);
        assert_eq!(first_transaction_hash(None), None);
    }

    #[test]
    fn report_halted_at_first_step() {
        let report = ProbeReport {
            endpoint: "https://site1.example/sepolia/dead".to_string(),
            block_number: ProbeStep {
                method: ETH_BLOCK_NUMBER,
                outcome: StepOutcome::Failed("rpc error: not found".to_string()),
                elapsed: Duration::from_millis(12),
            },
            block_details: ProbeStep::skipped(ETH_GET_BLOCK_BY_NUMBER),
            transaction: ProbeStep::skipped(ETH_GET_TRANSACTION_BY_HASH),
        };
        assert!(report.halted_at_first_step());
        assert!(!report.fully_passed());
        assert_eq!(report.request_durations().len(), 1);
    }
}
