//! The per-VU iteration

use std::sync::Arc;
use std::time::{Duration, Instant};

use nodeharness_probe::{NftClient, ProbeChain, RpcClient, StepOutcome, ETH_BLOCK_NUMBER};
use tracing::debug;

use crate::recorder::Recorder;

/// Knobs for the iteration body.
#[derive(Debug, Clone)]
pub struct VuSettings {
    /// Pause between request groups within one iteration.
    pub group_pause: Duration,
}

impl Default for VuSettings {
    fn default() -> Self {
        Self {
            group_pause: Duration::from_secs(1),
        }
    }
}

/// Everything one virtual user needs: clients, targets, and the shared
/// recorder. Clone-cheap; each VU task holds its own copy.
#[derive(Clone)]
pub struct VuContext {
    pub nft: NftClient,
    pub rpc: RpcClient,
    pub chain: ProbeChain,
    pub recorder: Arc<Recorder>,
    pub wallet: String,
    pub site1_endpoint: String,
    pub site2_endpoint: String,
    pub settings: VuSettings,
}

impl VuContext {
    /// One full iteration: NFT fetch, then a block-number call and the full
    /// probe chain against each of the two endpoints. Failures are recorded
    /// as failed checks and never abort the iteration.
    pub async fn iteration(&self) {
        self.nft_group().await;
        tokio::time::sleep(self.settings.group_pause).await;

        self.block_number_group("site1", &self.site1_endpoint).await;
        tokio::time::sleep(self.settings.group_pause).await;

        self.chain_group("site1", &self.site1_endpoint).await;
        tokio::time::sleep(self.settings.group_pause).await;

        self.block_number_group("site2", &self.site2_endpoint).await;
        tokio::time::sleep(self.settings.group_pause).await;

        self.chain_group("site2", &self.site2_endpoint).await;
    }

    async fn nft_group(&self) {
        let start = Instant::now();
        match self.nft.fetch_wallet_nfts(&self.wallet).await {
            Ok(fetch) => {
                self.recorder.record_request(start.elapsed());
                self.recorder.check("nft status is 200", fetch.status == 200);
                self.recorder.check("nft body is non-empty", !fetch.body.is_empty());
            }
            Err(e) => {
                debug!(error = %e, "nft fetch transport failure");
                self.recorder.record_request(start.elapsed());
                self.recorder.check("nft status is 200", false);
                self.recorder.check("nft body is non-empty", false);
            }
        }
    }

    async fn block_number_group(&self, site: &str, endpoint: &str) {
        let start = Instant::now();
        let response = self.rpc.call(endpoint, ETH_BLOCK_NUMBER, vec![]).await;
        self.recorder.record_request(start.elapsed());

        match response {
            Ok(resp) => {
                self.recorder
                    .check(&format!("{site} blockNumber has result"), resp.result.is_some());
                self.recorder
                    .check(&format!("{site} blockNumber has no error"), resp.error.is_none());
            }
            Err(e) => {
                debug!(error = %e, endpoint, "blockNumber transport failure");
                self.recorder
                    .check(&format!("{site} blockNumber has result"), false);
                self.recorder
                    .check(&format!("{site} blockNumber has no error"), false);
            }
        }
    }

    async fn chain_group(&self, site: &str, endpoint: &str) {
        let report = self.chain.run(endpoint).await;
        self.recorder.record_requests(report.request_durations());

        for step in [&report.block_number, &report.block_details, &report.transaction] {
            if step.outcome.skipped() {
                continue;
            }
            self.recorder.check(
                &format!("{site} {} passed", step.method),
                matches!(step.outcome, StepOutcome::Passed),
            );
        }
    }
}
