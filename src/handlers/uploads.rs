use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    Json,
};

use crate::error::AppResult;
use crate::services::upload::{screen_uploads, UploadCandidate, UploadReport};
use crate::AppState;

/// Reads every file part of a multipart body, counting bytes as they stream
/// in. File contents are not kept.
///
/// A file stops being counted once it passes `max_bytes`; its reported size
/// is then only a lower bound. When the request body limit cuts the stream
/// short, the file being read is reported as oversized and the files before
/// it are kept.
pub async fn read_candidates(
    multipart: &mut Multipart,
    max_bytes: u64,
) -> AppResult<Vec<UploadCandidate>> {
    let mut candidates = Vec::new();

    loop {
        let mut field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            // The skipped tail of an oversized file ran past the body limit.
            Err(err) if hit_body_limit(&err) && !candidates.is_empty() => break,
            Err(err) => return Err(err.into()),
        };

        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();

        let mut size: u64 = 0;
        let mut body_exhausted = false;
        loop {
            match field.chunk().await {
                Ok(Some(chunk)) => {
                    size += chunk.len() as u64;
                    if size > max_bytes {
                        break;
                    }
                }
                Ok(None) => break,
                Err(err) if hit_body_limit(&err) => {
                    size = size.max(max_bytes.saturating_add(1));
                    body_exhausted = true;
                    break;
                }
                Err(err) => return Err(err.into()),
            }
        }

        candidates.push(UploadCandidate {
            file_name,
            content_type,
            size,
        });

        if body_exhausted {
            tracing::warn!(files_read = candidates.len(), "Upload body limit reached");
            break;
        }
    }

    Ok(candidates)
}

fn hit_body_limit(err: &MultipartError) -> bool {
    err.status() == StatusCode::PAYLOAD_TOO_LARGE
}

pub async fn screen(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<UploadReport>> {
    let candidates = read_candidates(&mut multipart, state.config.upload_max_bytes).await?;
    let report = screen_uploads(&candidates, state.config.upload_max_bytes);

    tracing::debug!(
        accepted = report.accepted.len(),
        rejected = report.rejected.len(),
        "Uploads screened"
    );

    Ok(Json(report))
}

#[cfg(test)]
mod tests {
    use crate::test_support::{post_multipart, test_state, TestFile};
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_screen_reports_each_file() {
        let state = test_state().await;
        let (status, report) = post_multipart(
            &state,
            "/api/uploads",
            &[
                TestFile::new("face.png", "image/png", 2048),
                TestFile::new("notes.txt", "text/plain", 10),
            ],
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["accepted"][0]["file_name"], "face.png");
        assert_eq!(report["accepted"][0]["size_display"], "2 KB");
        assert_eq!(report["rejected"][0]["reason"], "unsupported_type");
        assert_eq!(report["notices"][0]["level"], "error");
        assert_eq!(report["notices"][1]["message"], "1 file(s) uploaded successfully");
    }

    #[tokio::test]
    async fn test_oversized_file_is_rejected_not_fatal() {
        let state = test_state().await;
        let (status, report) = post_multipart(
            &state,
            "/api/uploads",
            &[TestFile::new("big.jpg", "image/jpeg", 11 * 1024 * 1024)],
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(report["accepted"].as_array().unwrap().is_empty());
        assert_eq!(
            report["rejected"][0]["message"],
            "big.jpg is too large. Maximum size is 10MB"
        );
    }

    #[tokio::test]
    async fn test_file_past_body_limit_keeps_earlier_files() {
        let state = test_state().await;
        let (status, report) = post_multipart(
            &state,
            "/api/uploads",
            &[
                TestFile::new("face.png", "image/png", 2048),
                TestFile::new("long.mp4", "video/mp4", 40 * 1024 * 1024),
            ],
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["accepted"].as_array().unwrap().len(), 1);
        assert_eq!(report["accepted"][0]["file_name"], "face.png");
        assert_eq!(report["rejected"][0]["file_name"], "long.mp4");
        assert_eq!(report["rejected"][0]["reason"], "too_large");
        assert_eq!(
            report["notices"][0]["message"],
            "long.mp4 is too large. Maximum size is 10MB"
        );
        assert_eq!(report["notices"][1]["message"], "1 file(s) uploaded successfully");
    }

    #[tokio::test]
    async fn test_lone_file_past_body_limit_is_rejected() {
        let state = test_state().await;
        let (status, report) = post_multipart(
            &state,
            "/api/uploads",
            &[TestFile::new("long.mp4", "video/mp4", 40 * 1024 * 1024)],
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(report["accepted"].as_array().unwrap().is_empty());
        assert_eq!(report["rejected"][0]["reason"], "too_large");
    }
}
