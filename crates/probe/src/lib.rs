//! Nodeharness RPC/REST probing
//!
//! One shared implementation of the endpoint validation logic used by every
//! call-site (UI scenarios, load test, negative tests):
//!
//! - [`rpc::RpcClient`] — JSON-RPC 2.0 over HTTP POST; a response carries
//!   `result` XOR `error` and error responses are data, never retried.
//! - [`chain::ProbeChain`] — the three dependent calls that validate an
//!   endpoint: latest block number → block by number (with transactions) →
//!   transaction by hash. Any step failure short-circuits the rest.
//! - [`nft::NftClient`] — API-key-gated NFT index query; non-2xx statuses are
//!   logged and surfaced as data.

pub mod chain;
pub mod error;
pub mod nft;
pub mod rpc;

pub use chain::{ProbeChain, ProbeReport, ProbeStep, StepOutcome};
pub use error::{ProbeError, Result};
pub use nft::{NftClient, NftFetch};
pub use rpc::{RpcClient, RpcResponse, ETH_BLOCK_NUMBER, ETH_GET_BLOCK_BY_NUMBER, ETH_GET_TRANSACTION_BY_HASH};
