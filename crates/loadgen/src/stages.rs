//! Staged virtual-user schedule

use std::time::Duration;

/// One schedule segment: move (linearly) to `target` VUs over `duration`.
#[derive(Debug, Clone)]
pub struct Stage {
    pub duration: Duration,
    pub target: u32,
}

impl Stage {
    pub fn new(duration: Duration, target: u32) -> Self {
        Self { duration, target }
    }
}

/// The full schedule. The run starts at 0 VUs; each stage interpolates from
/// the previous stage's target to its own.
#[derive(Debug, Clone)]
pub struct StagePlan {
    stages: Vec<Stage>,
}

impl StagePlan {
    pub fn new(stages: Vec<Stage>) -> Self {
        Self { stages }
    }

    /// Ramp up, hold, ramp down.
    pub fn ramp(ramp_up: Duration, hold: Duration, ramp_down: Duration, target: u32) -> Self {
        Self::new(vec![
            Stage::new(ramp_up, target),
            Stage::new(hold, target),
            Stage::new(ramp_down, 0),
        ])
    }

    /// The default profile: 0→10 VUs over one minute, hold ten for three
    /// minutes, back to zero over one minute.
    pub fn default_ramp() -> Self {
        Self::ramp(
            Duration::from_secs(60),
            Duration::from_secs(180),
            Duration::from_secs(60),
            10,
        )
    }

    pub fn total_duration(&self) -> Duration {
        self.stages.iter().map(|s| s.duration).sum()
    }

    /// The largest VU count the schedule ever requests.
    pub fn max_target(&self) -> u32 {
        self.stages.iter().map(|s| s.target).max().unwrap_or(0)
    }

    /// Desired VU count at `elapsed` since the start of the run.
    pub fn target_at(&self, elapsed: Duration) -> u32 {
        let mut previous: u32 = 0;
        let mut offset = Duration::ZERO;

        for stage in &self.stages {
            if elapsed < offset + stage.duration {
                let fraction =
                    (elapsed - offset).as_secs_f64() / stage.duration.as_secs_f64();
                let from = previous as f64;
                let to = stage.target as f64;
                return (from + (to - from) * fraction).round() as u32;
            }
            previous = stage.target;
            offset += stage.duration;
        }

        // Past the end of the schedule.
        previous
    }
}
