//! Probe chain and NFT client integration tests against a local mock of the
//! RPC and NFT-index endpoints.

use axum::extract::Path;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use nodeharness_probe::{NftClient, ProbeChain, RpcClient, StepOutcome};

const API_KEY: &str = "test-api-key";
const WALLET: &str = "0xff3879b8a363aed92a6eaba8f61f1a96a9ec3c1e";

/// A healthy endpoint: current block with one full transaction object.
async fn healthy_rpc(Json(request): Json<Value>) -> Json<Value> {
    let id = request["id"].clone();
    let reply = match request["method"].as_str() {
        Some("eth_blockNumber") => json!({ "jsonrpc": "2.0", "id": id, "result": "0x14fd2e1" }),
        Some("eth_getBlockByNumber") => {
            assert_eq!(request["params"], json!(["0x14fd2e1", true]));
            json!({
                "jsonrpc": "2.0", "id": id,
                "result": {
                    "number": "0x14fd2e1",
                    "transactions": [
                        { "hash": "0xfeed", "from": "0x1", "to": "0x2" },
                        { "hash": "0xbeef", "from": "0x3", "to": "0x4" }
                    ]
                }
            })
        }
        Some("eth_getTransactionByHash") => {
            assert_eq!(request["params"], json!(["0xfeed"]));
            json!({
                "jsonrpc": "2.0", "id": id,
                "result": { "hash": "0xfeed", "blockNumber": "0x14fd2e1" }
            })
        }
        other => json!({
            "jsonrpc": "2.0", "id": id,
            "error": { "code": -32601, "message": format!("unknown method {other:?}") }
        }),
    };
    Json(reply)
}

/// An endpoint that rejects everything at the RPC level.
async fn erroring_rpc(Json(request): Json<Value>) -> Json<Value> {
    Json(json!({
        "jsonrpc": "2.0", "id": request["id"],
        "error": { "code": -32000, "message": "unauthorized node id" }
    }))
}

/// A quiet chain: block number works but the block has no transactions.
async fn quiet_rpc(Json(request): Json<Value>) -> Json<Value> {
    let id = request["id"].clone();
    let reply = match request["method"].as_str() {
        Some("eth_blockNumber") => json!({ "jsonrpc": "2.0", "id": id, "result": "0x1" }),
        Some("eth_getBlockByNumber") => json!({
            "jsonrpc": "2.0", "id": id,
            "result": { "number": "0x1", "transactions": [] }
        }),
        _ => panic!("transaction lookup must not run when the block is empty"),
    };
    Json(reply)
}

async fn nft_index(Path(wallet): Path<String>, headers: HeaderMap) -> impl IntoResponse {
    if headers.get("X-API-Key").and_then(|v| v.to_str().ok()) != Some(API_KEY) {
        return (axum::http::StatusCode::UNAUTHORIZED, Json(json!({ "message": "invalid key" })));
    }
    if wallet != WALLET {
        return (
            axum::http::StatusCode::BAD_REQUEST,
            Json(json!({ "message": "invalid address provided" })),
        );
    }
    (
        axum::http::StatusCode::OK,
        Json(json!({ "page": 0, "result": [{ "token_id": "1", "name": "Test NFT" }] })),
    )
}

async fn spawn_mock() -> String {
    let app = Router::new()
        .route("/rpc/healthy", post(healthy_rpc))
        .route("/rpc/erroring", post(erroring_rpc))
        .route("/rpc/quiet", post(quiet_rpc))
        .route("/api/:wallet/nft", get(nft_index));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn full_chain_passes_on_healthy_endpoint() {
    let base = spawn_mock().await;
    let chain = ProbeChain::new(RpcClient::new().unwrap());

    let report = chain.run(&format!("{base}/rpc/healthy")).await;

    assert!(report.fully_passed(), "report: {report:?}");
    assert_eq!(report.request_durations().len(), 3);
}

#[tokio::test]
async fn rpc_error_halts_chain_after_first_step() {
    let base = spawn_mock().await;
    let chain = ProbeChain::new(RpcClient::new().unwrap());

    let report = chain.run(&format!("{base}/rpc/erroring")).await;

    assert!(report.halted_at_first_step(), "report: {report:?}");
    assert!(matches!(report.block_number.outcome, StepOutcome::Failed(_)));
    assert!(report.block_details.outcome.skipped());
    assert!(report.transaction.outcome.skipped());
}

#[tokio::test]
async fn empty_transaction_list_skips_transaction_lookup() {
    let base = spawn_mock().await;
    let chain = ProbeChain::new(RpcClient::new().unwrap());

    let report = chain.run(&format!("{base}/rpc/quiet")).await;

    assert!(report.block_number.outcome.passed());
    assert!(matches!(report.block_details.outcome, StepOutcome::Failed(_)));
    assert!(report.transaction.outcome.skipped());
}

#[tokio::test]
async fn unreachable_endpoint_halts_after_first_step() {
    let base = spawn_mock().await;
    let chain = ProbeChain::new(RpcClient::new().unwrap());

    // Wrong path on a live server: 404 with a non-JSON-RPC body.
    let report = chain.run(&format!("{base}/rpc/no-such-node")).await;
    assert!(report.halted_at_first_step(), "report: {report:?}");

    // No server at all.
    let report = chain.run("http://127.0.0.1:9/rpc").await;
    assert!(report.halted_at_first_step(), "report: {report:?}");
}

#[tokio::test]
async fn nft_fetch_succeeds_with_valid_key_and_wallet() {
    let base = spawn_mock().await;
    let client = NftClient::new(format!("{base}/api"), API_KEY).unwrap();

    let fetch = client.fetch_wallet_nfts(WALLET).await.unwrap();
    assert_eq!(fetch.status, 200);
    assert!(fetch.passed());
    assert!(fetch.body.contains("Test NFT"));
}

#[tokio::test]
async fn nft_fetch_surfaces_bad_request_without_raising() {
    let base = spawn_mock().await;
    let client = NftClient::new(format!("{base}/api"), API_KEY).unwrap();

    let fetch = client.fetch_wallet_nfts("incorrect_wallet_address").await.unwrap();
    assert_eq!(fetch.status, 400);
    assert!(!fetch.passed());
}

#[tokio::test]
async fn nft_fetch_surfaces_unauthorized_key() {
    let base = spawn_mock().await;
    let client = NftClient::new(format!("{base}/api"), "wrong-key").unwrap();

    let fetch = client.fetch_wallet_nfts(WALLET).await.unwrap();
    assert_eq!(fetch.status, 401);
    assert!(!fetch.passed());
}
