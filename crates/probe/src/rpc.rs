//! JSON-RPC 2.0 client

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{ProbeError, Result};

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Ethereum-style JSON-RPC method names used by the probe chain.
pub const ETH_BLOCK_NUMBER: &str = "eth_blockNumber";
pub const ETH_GET_BLOCK_BY_NUMBER: &str = "eth_getBlockByNumber";
pub const ETH_GET_TRANSACTION_BY_HASH: &str = "eth_getTransactionByHash";

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    method: &'a str,
    params: &'a [Value],
    id: u64,
}

/// A JSON-RPC response. By the remote contract, `result` and `error` are
/// mutually exclusive; a response that violates that is treated as failed.
#[derive(Debug, Clone, Deserialize)]
pub struct RpcResponse {
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<Value>,
}

impl RpcResponse {
    /// True iff the call succeeded: a result is present and no error is.
    pub fn is_ok(&self) -> bool {
        self.result.is_some() && self.error.is_none()
    }

    /// Short description of why this response failed, for logging.
    pub fn failure_reason(&self) -> String {
        match &self.error {
            Some(err) => format!("rpc error: {err}"),
            None => "response has no result".to_string(),
        }
    }
}

/// Thin JSON-RPC client over HTTP POST.
#[derive(Debug, Clone)]
pub struct RpcClient {
    http: reqwest::Client,
}

impl RpcClient {
    pub fn new() -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { http })
    }

    /// Issue `{jsonrpc:"2.0", method, params, id:1}` against `endpoint`.
    ///
    /// Transport and decode failures are errors; an RPC-level `error` field
    /// is data in the returned response, never retried or classified.
    pub async fn call(&self, endpoint: &str, method: &str, params: Vec<Value>) -> Result<RpcResponse> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            method,
            params: &params,
            id: 1,
        };

        let response = self
            .http
            .post(endpoint)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        debug!(%endpoint, method, %status, "rpc response");

        serde_json::from_str(&body).map_err(|e| {
            ProbeError::Body(format!("{method} returned non-JSON-RPC body ({status}): {e}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn result_xor_error() {
        let ok: RpcResponse = serde_json::from_value(json!({
            "jsonrpc": "2.0", "id": 1, "result": "0x14fd2e1"
        }))
        .unwrap();
        assert!(ok.is_ok());

        let err: RpcResponse = serde_json::from_value(json!({
            "jsonrpc": "2.0", "id": 1,
            "error": { "code": -32601, "message": "method not found" }
        }))
        .unwrap();
        assert!(!err.is_ok());
        assert!(err.failure_reason().contains("method not found"));

        let empty: RpcResponse = serde_json::from_value(json!({ "jsonrpc": "2.0", "id": 1 })).unwrap();
        assert!(!empty.is_ok());
        assert_eq!(empty.failure_reason(), "response has no result");
    }

    #[test]
    fn request_envelope_shape() {
        let request = RpcRequest {
            jsonrpc: "2.0",
            method: ETH_GET_BLOCK_BY_NUMBER,
            params: &[json!("0x14fd2e1"), json!(true)],
            id: 1,
        };
        let encoded = serde_json::to_value(&request).unwrap();
        assert_eq!(
            encoded,
            json!({
                "jsonrpc": "2.0",
                "method": "eth_getBlockByNumber",
                "params": ["0x14fd2e1", true],
                "id": 1
            })
        );
    }
}
