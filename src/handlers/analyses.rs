use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::handlers::uploads::read_candidates;
use crate::services::analysis_registry::AnalysisSnapshot;
use crate::services::mock_analysis::AnalysisSource;
use crate::services::upload::screen_uploads;
use crate::AppState;

/// Screens the uploaded files and starts a simulated analysis of the first
/// accepted one. Nothing is started when every file was rejected.
pub async fn start_analysis(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<AnalysisSnapshot>)> {
    let candidates = read_candidates(&mut multipart, state.config.upload_max_bytes).await?;
    if candidates.is_empty() {
        return Err(AppError::Validation("No file uploaded".into()));
    }

    let report = screen_uploads(&candidates, state.config.upload_max_bytes);
    let Some(upload) = report.first_accepted() else {
        return Err(AppError::Validation(report.notice_text()));
    };

    let snapshot = state
        .analyses
        .start(&state.simulator, AnalysisSource::from(upload))
        .await;

    Ok((StatusCode::ACCEPTED, Json(snapshot)))
}

pub async fn get_analysis(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<AnalysisSnapshot>> {
    state
        .analyses
        .get(id)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Analysis not found".into()))
}

pub async fn cancel_analysis(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<AnalysisSnapshot>> {
    let snapshot = state.analyses.cancel(id).await?;
    Ok(Json(snapshot))
}

#[cfg(test)]
mod tests {
    use crate::test_support::{
        body_json, delete, get, post_multipart, test_state, test_state_with_step, TestFile,
    };
    use crate::AppState;
    use axum::http::StatusCode;
    use serde_json::Value;
    use std::time::Duration;

    // Real time: the sqlite pool does not tolerate a paused clock.

    /// Polls the analysis until `done` holds, or panics after a few seconds.
    async fn wait_for(state: &AppState, uri: &str, done: impl Fn(&Value) -> bool) -> Value {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
        loop {
            let (status, snapshot) = body_json(get(state, uri).await).await;
            assert_eq!(status, StatusCode::OK);
            if done(&snapshot) {
                return snapshot;
            }
            assert!(
                tokio::time::Instant::now() < deadline,
                "analysis never reached the expected state: {snapshot}"
            );
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    #[tokio::test]
    async fn test_analysis_runs_to_completion() {
        let state = test_state_with_step(Duration::from_millis(20)).await;
        let (status, started) = post_multipart(
            &state,
            "/api/analyses",
            &[TestFile::new("me.jpg", "image/jpeg", 4096)],
        )
        .await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(started["status"], "running");
        assert_eq!(started["source"]["kind"], "image");

        let uri = format!("/api/analyses/{}", started["id"].as_str().unwrap());
        let done = wait_for(&state, &uri, |s| s["status"] == "completed").await;

        assert_eq!(done["progress"], 100);
        assert_eq!(done["result"]["landmarks"].as_array().unwrap().len(), 68);
        assert_eq!(done["result"]["confidence_score"], 92);
    }

    #[tokio::test]
    async fn test_cancel_running_analysis() {
        let state = test_state_with_step(Duration::from_secs(2)).await;
        let (_, started) = post_multipart(
            &state,
            "/api/analyses",
            &[TestFile::new("clip.mov", "video/quicktime", 4096)],
        )
        .await;
        let uri = format!("/api/analyses/{}", started["id"].as_str().unwrap());

        // The next stage is a full step away once the first one lands.
        wait_for(&state, &uri, |s| s["progress"] == 20).await;
        let (status, cancelled) = body_json(delete(&state, &uri).await).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(cancelled["status"], "cancelled");
        assert_eq!(cancelled["progress"], 20);

        let (status, again) = body_json(delete(&state, &uri).await).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(again["status"], "cancelled");
    }

    #[tokio::test]
    async fn test_no_accepted_files_does_not_start() {
        let state = test_state().await;
        let (status, body) = post_multipart(
            &state,
            "/api/analyses",
            &[TestFile::new("essay.txt", "text/plain", 100)],
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            body["error"]["message"],
            "essay.txt is not a valid image or video file"
        );
    }

    #[tokio::test]
    async fn test_starts_are_rate_limited_per_client() {
        let state = test_state().await;
        let limit = state.config.analysis_rate_limit;
        let files = [TestFile::new("me.jpg", "image/jpeg", 512)];

        for i in 0..limit {
            let (status, _) = post_multipart(&state, "/api/analyses", &files).await;
            assert_eq!(status, StatusCode::ACCEPTED, "start {} should be allowed", i + 1);
        }

        let (status, body) = post_multipart(&state, "/api/analyses", &files).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["error"]["code"], 429);
    }

    #[tokio::test]
    async fn test_unknown_analysis_is_not_found() {
        let state = test_state().await;
        let uri = format!("/api/analyses/{}", uuid::Uuid::new_v4());
        let (status, _) = body_json(get(&state, &uri).await).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
