//! Short end-to-end load run against a local mock of the RPC and NFT
//! endpoints. Uses a compressed schedule so the whole test stays under a
//! few seconds of wall-clock time.

use std::time::Duration;

use axum::extract::Path;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use nodeharness_loadgen::{LoadRunner, LoadTestConfig, Stage, StagePlan, VuSettings};

const API_KEY: &str = "test-api-key";
const WALLET: &str = "0xff3879b8a363aed92a6eaba8f61f1a96a9ec3c1e";

async fn healthy_rpc(Json(request): Json<Value>) -> Json<Value> {
    let id = request["id"].clone();
    let reply = match request["method"].as_str() {
        Some("eth_blockNumber") => json!({ "jsonrpc": "2.0", "id": id, "result": "0x14fd2e1" }),
        Some("eth_getBlockByNumber") => json!({
            "jsonrpc": "2.0", "id": id,
            "result": {
                "number": "0x14fd2e1",
                "transactions": [{ "hash": "0xfeed", "from": "0x1", "to": "0x2" }]
            }
        }),
        Some("eth_getTransactionByHash") => json!({
            "jsonrpc": "2.0", "id": id,
            "result": { "hash": "0xfeed", "blockNumber": "0x14fd2e1" }
        }),
        other => json!({
            "jsonrpc": "2.0", "id": id,
            "error": { "code": -32601, "message": format!("unknown method {other:?}") }
        }),
    };
    Json(reply)
}

async fn nft_index(Path(_wallet): Path<String>) -> Json<Value> {
    Json(json!({ "page": 0, "result": [{ "token_id": "1", "name": "Test NFT" }] }))
}

async fn spawn_mock() -> String {
    let app = Router::new()
        .route("/rpc/site1", post(healthy_rpc))
        .route("/rpc/site2", post(healthy_rpc))
        .route("/api/:wallet/nft", get(nft_index));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test(flavor = "multi_thread")]
async fn short_run_records_traffic_and_meets_threshold() {
    let base = spawn_mock().await;

    let config = LoadTestConfig {
        // Jump straight to 2 VUs, hold for 2s.
        plan: StagePlan::new(vec![
            Stage::new(Duration::ZERO, 2),
            Stage::new(Duration::from_secs(2), 2),
        ]),
        p95_threshold: Duration::from_millis(500),
        settings: VuSettings {
            group_pause: Duration::from_millis(10),
        },
        api_base: format!("{base}/api"),
        api_key: API_KEY.to_string(),
        wallet: WALLET.to_string(),
        site1_endpoint: format!("{base}/rpc/site1"),
        site2_endpoint: format!("{base}/rpc/site2"),
    };

    let summary = LoadRunner::new(config).run().await.unwrap();

    assert!(summary.requests > 0, "summary: {summary:?}");
    assert_eq!(summary.checks_failed, 0, "summary: {summary:?}");
    assert!(summary.checks_passed > 0);
    assert!(summary.meets_latency_threshold(Duration::from_millis(500)));
}

#[tokio::test(flavor = "multi_thread")]
async fn dead_endpoint_shows_up_as_failed_checks() {
    let base = spawn_mock().await;

    let config = LoadTestConfig {
        plan: StagePlan::new(vec![
            Stage::new(Duration::ZERO, 1),
            Stage::new(Duration::from_secs(1), 1),
        ]),
        p95_threshold: Duration::from_millis(500),
        settings: VuSettings {
            group_pause: Duration::from_millis(10),
        },
        api_base: format!("{base}/api"),
        api_key: API_KEY.to_string(),
        wallet: WALLET.to_string(),
        // site1 healthy, site2 is a wrong path returning 404.
        site1_endpoint: format!("{base}/rpc/site1"),
        site2_endpoint: format!("{base}/rpc/missing"),
    };

    let summary = LoadRunner::new(config).run().await.unwrap();

    assert!(summary.checks_failed > 0, "summary: {summary:?}");
    assert!(summary.checks_passed > 0, "summary: {summary:?}");
}
