//! Staged progress simulator for the mock face analysis.
//!
//! A run walks a fixed list of stages, one every `interval`, reporting each
//! stage's percentage to an observer. After the last stage it builds a
//! [`MockAnalysis`] and reports completion. The run lives in a spawned task
//! owned by [`AnalysisTask`]; dropping or cancelling that handle stops it.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::services::mock_analysis::{AnalysisSource, MockAnalysis};

pub const DEFAULT_STEP_INTERVAL: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AnalysisStage {
    pub percent: u8,
    pub label: &'static str,
    pub description: &'static str,
}

pub const ANALYSIS_STAGES: [AnalysisStage; 5] = [
    AnalysisStage {
        percent: 20,
        label: "Face Detection",
        description: "Detecting face and extracting landmarks...",
    },
    AnalysisStage {
        percent: 40,
        label: "Feature Analysis",
        description: "Analyzing facial features with CNN models...",
    },
    AnalysisStage {
        percent: 60,
        label: "Skin Analysis",
        description: "Processing skin tone and texture...",
    },
    AnalysisStage {
        percent: 80,
        label: "Recommendations",
        description: "Generating personalized recommendations...",
    },
    AnalysisStage {
        percent: 100,
        label: "Health Insights",
        description: "Analysis complete!",
    },
];

/// The stage a progress bar at `percent` is in: the first stage whose
/// threshold has not been passed yet.
pub fn stage_for_percent(percent: u8) -> &'static AnalysisStage {
    ANALYSIS_STAGES
        .iter()
        .find(|stage| percent <= stage.percent)
        .unwrap_or(&ANALYSIS_STAGES[ANALYSIS_STAGES.len() - 1])
}

#[derive(Debug, Clone)]
pub enum AnalysisEvent {
    Progress(AnalysisStage),
    Completed(Box<MockAnalysis>),
}

#[derive(Debug, Clone)]
pub struct StagedSimulator {
    stages: Vec<AnalysisStage>,
    interval: Duration,
}

impl Default for StagedSimulator {
    fn default() -> Self {
        Self::new(DEFAULT_STEP_INTERVAL)
    }
}

impl StagedSimulator {
    pub fn new(interval: Duration) -> Self {
        Self::with_stages(ANALYSIS_STAGES.to_vec(), interval)
    }

    pub fn with_stages(stages: Vec<AnalysisStage>, interval: Duration) -> Self {
        Self { stages, interval }
    }

    /// Starts a run for `source`.
    ///
    /// Stage `i` is delivered at `start + (i + 1) * interval`, measured from
    /// the moment of this call so a slow observer does not push later stages
    /// back. `Completed` is delivered exactly once, right after the last
    /// stage, and is also the task's output.
    pub fn spawn<F>(&self, source: AnalysisSource, mut observer: F) -> AnalysisTask
    where
        F: FnMut(AnalysisEvent) + Send + 'static,
    {
        let stages = self.stages.clone();
        let interval = self.interval;
        let start = Instant::now();

        let handle = tokio::spawn(async move {
            for (index, stage) in stages.into_iter().enumerate() {
                tokio::time::sleep_until(start + interval * (index as u32 + 1)).await;
                observer(AnalysisEvent::Progress(stage));
            }

            let mut rng = StdRng::from_entropy();
            let result = MockAnalysis::generate(&mut rng, source);
            observer(AnalysisEvent::Completed(Box::new(result.clone())));
            result
        });

        AnalysisTask {
            handle: Some(handle),
        }
    }
}

/// Owner of a running simulation. Dropping it aborts the run.
#[derive(Debug)]
pub struct AnalysisTask {
    handle: Option<JoinHandle<MockAnalysis>>,
}

impl AnalysisTask {
    /// Stops the run. No further events are delivered after this returns
    /// unless the observer is already executing.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
impl AnalysisTask {
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |h| h.is_finished())
    }

    /// Waits for the run to finish. `None` if it was cancelled.
    pub async fn join(mut self) -> Option<MockAnalysis> {
        let handle = self.handle.take()?;
        handle.await.ok()
    }
}

impl Drop for AnalysisTask {
    fn drop(&mut self) {
        self.cancel();
    }
}
