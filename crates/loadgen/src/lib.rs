//! Nodeharness load generation
//!
//! A staged virtual-user (VU) driver for the RPC and NFT endpoints. The
//! schedule is a list of [`stages::Stage`]s interpolated linearly (ramp up,
//! hold, ramp down). Each VU runs a stateless, sequential iteration of one
//! NFT fetch plus two endpoint probe flows; every request duration and named
//! check lands in a shared [`recorder::Recorder`]. The run verdict is a p95
//! latency threshold.

pub mod recorder;
pub mod runner;
pub mod scenario;
pub mod stages;

pub use recorder::{Recorder, Summary};
pub use runner::{LoadRunner, LoadTestConfig};
pub use scenario::{VuContext, VuSettings};
pub use stages::{Stage, StagePlan};
