//! Staged VU scheduler

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use nodeharness_probe::{NftClient, ProbeChain, Result, RpcClient};
use rand::Rng;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::recorder::{Recorder, Summary};
use crate::scenario::{VuContext, VuSettings};
use crate::stages::StagePlan;

/// How often the scheduler re-evaluates the desired VU count.
const SCHEDULER_TICK: Duration = Duration::from_secs(1);

/// How long an idle VU slot dozes before re-checking whether it is wanted.
const IDLE_POLL: Duration = Duration::from_millis(200);

/// Configuration for one load-test run.
#[derive(Debug, Clone)]
pub struct LoadTestConfig {
    pub plan: StagePlan,
    /// Pass/fail latency bar applied to the run's p95.
    pub p95_threshold: Duration,
    pub settings: VuSettings,
    pub api_base: String,
    pub api_key: String,
    pub wallet: String,
    pub site1_endpoint: String,
    pub site2_endpoint: String,
}

/// Executes a [`StagePlan`] against live endpoints and reports a [`Summary`].
pub struct LoadRunner {
    config: LoadTestConfig,
    recorder: Arc<Recorder>,
}

impl LoadRunner {
    pub fn new(config: LoadTestConfig) -> Self {
        Self {
            config,
            recorder: Arc::new(Recorder::new()),
        }
    }

    /// Run the full schedule to completion. Slots above the current desired
    /// VU count idle; the scheduler moves the desired count along the plan
    /// once per tick and shuts everything down when the plan ends.
    pub async fn run(&self) -> Result<Summary> {
        let plan = self.config.plan.clone();
        let slots = plan.max_target();
        let total = plan.total_duration();
        info!(slots, total_secs = total.as_secs(), "starting load test");

        let context = self.build_context()?;
        let (desired_tx, desired_rx) = watch::channel(plan.target_at(Duration::ZERO));
        let done = Arc::new(AtomicBool::new(false));

        let mut workers = Vec::with_capacity(slots as usize);
        for slot in 0..slots {
            let context = context.clone();
            let desired = desired_rx.clone();
            let done = done.clone();
            workers.push(tokio::spawn(vu_slot(slot, context, desired, done)));
        }

        let started = Instant::now();
        loop {
            let elapsed = started.elapsed();
            if elapsed >= total {
                break;
            }
            let target = plan.target_at(elapsed);
            if *desired_tx.borrow() != target {
                debug!(target, elapsed_secs = elapsed.as_secs(), "adjusting VU count");
            }
            let _ = desired_tx.send(target);
            tokio::time::sleep(SCHEDULER_TICK.min(total - elapsed)).await;
        }

        done.store(true, Ordering::SeqCst);
        let _ = desired_tx.send(0);
        for worker in workers {
            let _ = worker.await;
        }

        let summary = self.recorder.summary();
        info!(
            requests = summary.requests,
            checks_passed = summary.checks_passed,
            checks_failed = summary.checks_failed,
            p95_ms = summary.p95_ms,
            "load test finished"
        );
        Ok(summary)
    }

    pub fn recorder(&self) -> Arc<Recorder> {
        self.recorder.clone()
    }

    fn build_context(&self) -> Result<VuContext> {
        let rpc = RpcClient::new()?;
        Ok(VuContext {
            nft: NftClient::new(&self.config.api_base, &self.config.api_key)?,
            rpc: rpc.clone(),
            chain: ProbeChain::new(rpc),
            recorder: self.recorder.clone(),
            wallet: self.config.wallet.clone(),
            site1_endpoint: self.config.site1_endpoint.clone(),
            site2_endpoint: self.config.site2_endpoint.clone(),
            settings: self.config.settings.clone(),
        })
    }
}

/// One VU slot. Slot `n` is active whenever the desired count exceeds `n`,
/// so ramping down retires the highest slots first.
async fn vu_slot(
    slot: u32,
    context: VuContext,
    desired: watch::Receiver<u32>,
    done: Arc<AtomicBool>,
) {
    // Stagger startup so iterations do not run in lockstep.
    let jitter = rand::thread_rng().gen_range(0..200);
    tokio::time::sleep(Duration::from_millis(jitter)).await;

    while !done.load(Ordering::SeqCst) {
        // Copy the target out so the watch borrow is not held across awaits.
        let wanted = *desired.borrow();
        if wanted > slot {
            context.iteration().await;
        } else {
            tokio::time::sleep(IDLE_POLL).await;
        }
    }
    debug!(slot, "VU slot stopped");
}
