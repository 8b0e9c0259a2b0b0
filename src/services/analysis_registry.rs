use std::{collections::HashMap, sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{broadcast, mpsc, Mutex};
use tokio::time::Instant;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::analysis::{
    stage_for_percent, AnalysisEvent, AnalysisStage, AnalysisTask, StagedSimulator,
};
use crate::services::mock_analysis::{AnalysisSource, MockAnalysis};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    Running,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisSnapshot {
    pub id: Uuid,
    pub source: AnalysisSource,
    pub status: AnalysisStatus,
    pub progress: u8,
    pub stage: AnalysisStage,
    pub result: Option<MockAnalysis>,
    pub summary: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

struct TrackedAnalysis {
    snapshot: AnalysisSnapshot,
    task: Option<AnalysisTask>,
    finished: Option<Instant>,
}

/// Running and recently finished analyses, keyed by id.
///
/// Progress is applied by a per-run forwarder task and fanned out as JSON on
/// the broadcast channel, when one is configured.
#[derive(Clone)]
pub struct AnalysisRegistry {
    entries: Arc<Mutex<HashMap<Uuid, TrackedAnalysis>>>,
    events: Option<broadcast::Sender<String>>,
}

impl AnalysisRegistry {
    pub fn new(events: Option<broadcast::Sender<String>>) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            events,
        }
    }

    pub async fn start(&self, simulator: &StagedSimulator, source: AnalysisSource) -> AnalysisSnapshot {
        let id = Uuid::new_v4();
        let snapshot = AnalysisSnapshot {
            id,
            source: source.clone(),
            status: AnalysisStatus::Running,
            progress: 0,
            stage: *stage_for_percent(0),
            result: None,
            summary: None,
            started_at: Utc::now(),
            finished_at: None,
        };

        let (tx, mut rx) = mpsc::unbounded_channel();

        {
            let mut entries = self.entries.lock().await;
            let task = simulator.spawn(source, move |event| {
                let _ = tx.send(event);
            });
            entries.insert(
                id,
                TrackedAnalysis {
                    snapshot: snapshot.clone(),
                    task: Some(task),
                    finished: None,
                },
            );
        }

        // Ends once the run finishes or is aborted, since that drops `tx`.
        let registry = self.clone();
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                registry.apply(id, event).await;
            }
        });

        tracing::info!(
            analysis_id = %id,
            file_name = %snapshot.source.file_name,
            kind = snapshot.source.kind.noun(),
            "Analysis started"
        );

        snapshot
    }

    pub async fn get(&self, id: Uuid) -> Option<AnalysisSnapshot> {
        let entries = self.entries.lock().await;
        entries.get(&id).map(|t| t.snapshot.clone())
    }

    /// Cancels a running analysis. Cancelling twice is a no-op; cancelling
    /// a completed analysis is a conflict.
    pub async fn cancel(&self, id: Uuid) -> AppResult<AnalysisSnapshot> {
        let mut entries = self.entries.lock().await;
        let tracked = entries
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound("Analysis not found".into()))?;

        match tracked.snapshot.status {
            AnalysisStatus::Completed => {
                return Err(AppError::Conflict("Analysis already completed".into()));
            }
            AnalysisStatus::Cancelled => return Ok(tracked.snapshot.clone()),
            AnalysisStatus::Running => {}
        }

        if let Some(mut task) = tracked.task.take() {
            task.cancel();
        }
        tracked.snapshot.status = AnalysisStatus::Cancelled;
        tracked.snapshot.finished_at = Some(Utc::now());
        tracked.finished = Some(Instant::now());

        tracing::info!(analysis_id = %id, progress = tracked.snapshot.progress, "Analysis cancelled");
        self.publish(serde_json::json!({
            "type": "analysis_cancelled",
            "analysis_id": id,
            "progress": tracked.snapshot.progress,
        }));

        Ok(tracked.snapshot.clone())
    }

    /// Drops finished analyses that ended more than `retention` ago.
    pub async fn purge_finished(&self, retention: Duration) -> usize {
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|_, tracked| match tracked.finished {
            Some(at) => at.elapsed() < retention,
            None => true,
        });
        before - entries.len()
    }

    async fn apply(&self, id: Uuid, event: AnalysisEvent) {
        let mut entries = self.entries.lock().await;
        let Some(tracked) = entries.get_mut(&id) else {
            return;
        };
        // Events queued before a cancel are stale.
        if tracked.snapshot.status != AnalysisStatus::Running {
            return;
        }

        match event {
            AnalysisEvent::Progress(stage) => {
                tracked.snapshot.progress = stage.percent;
                tracked.snapshot.stage = stage;
                tracing::debug!(analysis_id = %id, progress = stage.percent, stage = stage.label, "Analysis progress");
                self.publish(serde_json::json!({
                    "type": "analysis_progress",
                    "analysis_id": id,
                    "progress": stage.percent,
                    "stage": stage,
                }));
            }
            AnalysisEvent::Completed(result) => {
                let summary = result.summary();
                tracked.snapshot.status = AnalysisStatus::Completed;
                tracked.snapshot.finished_at = Some(Utc::now());
                tracked.snapshot.summary = Some(summary.clone());
                tracked.snapshot.result = Some(*result);
                tracked.finished = Some(Instant::now());
                tracked.task = None;
                tracing::info!(analysis_id = %id, "Analysis completed");
                self.publish(serde_json::json!({
                    "type": "analysis_completed",
                    "analysis_id": id,
                    "summary": summary,
                    "result": tracked.snapshot.result,
                }));
            }
        }
    }

    fn publish(&self, message: serde_json::Value) {
        if let Some(tx) = self.events.as_ref() {
            // No subscribers is not an error.
            let _ = tx.send(message.to_string());
        }
    }
}
