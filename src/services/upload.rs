//! Acceptance rules for photos and videos submitted for analysis.

use serde::Serialize;

pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub fn from_mime(mime: &str) -> Option<Self> {
        let mime = mime.trim().to_ascii_lowercase();
        if mime.starts_with("image/") {
            Some(MediaKind::Image)
        } else if mime.starts_with("video/") {
            Some(MediaKind::Video)
        } else {
            None
        }
    }

    pub fn noun(self) -> &'static str {
        match self {
            MediaKind::Image => "photo",
            MediaKind::Video => "video",
        }
    }
}

/// What the client told us about one submitted file.
#[derive(Debug, Clone)]
pub struct UploadCandidate {
    pub file_name: String,
    pub content_type: String,
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AcceptedUpload {
    pub file_name: String,
    pub content_type: String,
    pub kind: MediaKind,
    pub size: u64,
    pub size_display: String,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UploadRejection {
    #[error("{file_name} is not a valid image or video file")]
    UnsupportedType { file_name: String },

    #[error("{file_name} is too large. Maximum size is {}", size_limit_label(.max_bytes))]
    TooLarge { file_name: String, max_bytes: u64 },
}

impl UploadRejection {
    pub fn code(&self) -> &'static str {
        match self {
            UploadRejection::UnsupportedType { .. } => "unsupported_type",
            UploadRejection::TooLarge { .. } => "too_large",
        }
    }

    pub fn file_name(&self) -> &str {
        match self {
            UploadRejection::UnsupportedType { file_name }
            | UploadRejection::TooLarge { file_name, .. } => file_name,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Error,
}

/// A user-facing message about the outcome of an upload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct RejectedUpload {
    pub file_name: String,
    pub reason: &'static str,
    pub message: String,
}

#[derive(Debug, Default, Serialize)]
pub struct UploadReport {
    pub accepted: Vec<AcceptedUpload>,
    pub rejected: Vec<RejectedUpload>,
    pub notices: Vec<Notice>,
}

impl UploadReport {
    pub fn first_accepted(&self) -> Option<&AcceptedUpload> {
        self.accepted.first()
    }

    /// All notices joined into one line, for error responses.
    pub fn notice_text(&self) -> String {
        self.notices
            .iter()
            .map(|n| n.message.as_str())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Type is checked before size.
pub fn validate_upload(
    candidate: &UploadCandidate,
    max_bytes: u64,
) -> Result<AcceptedUpload, UploadRejection> {
    let kind = MediaKind::from_mime(&candidate.content_type).ok_or_else(|| {
        UploadRejection::UnsupportedType {
            file_name: candidate.file_name.clone(),
        }
    })?;

    if candidate.size > max_bytes {
        return Err(UploadRejection::TooLarge {
            file_name: candidate.file_name.clone(),
            max_bytes,
        });
    }

    Ok(AcceptedUpload {
        file_name: candidate.file_name.clone(),
        content_type: candidate.content_type.clone(),
        kind,
        size: candidate.size,
        size_display: format_file_size(candidate.size),
    })
}

/// Splits candidates into accepted and rejected files, with one notice per
/// rejection and a single success notice when anything got through.
pub fn screen_uploads(candidates: &[UploadCandidate], max_bytes: u64) -> UploadReport {
    let mut report = UploadReport::default();

    for candidate in candidates {
        match validate_upload(candidate, max_bytes) {
            Ok(accepted) => report.accepted.push(accepted),
            Err(rejection) => {
                tracing::info!(
                    file_name = %rejection.file_name(),
                    reason = rejection.code(),
                    "Upload rejected"
                );
                let message = rejection.to_string();
                report.notices.push(Notice {
                    level: NoticeLevel::Error,
                    message: message.clone(),
                });
                report.rejected.push(RejectedUpload {
                    file_name: rejection.file_name().to_string(),
                    reason: rejection.code(),
                    message,
                });
            }
        }
    }

    if !report.accepted.is_empty() {
        report.notices.push(Notice {
            level: NoticeLevel::Success,
            message: format!("{} file(s) uploaded successfully", report.accepted.len()),
        });
    }

    report
}

/// Upload limits are quoted as whole megabytes when they divide evenly.
fn size_limit_label(max_bytes: &u64) -> String {
    const MB: u64 = 1024 * 1024;
    if *max_bytes >= MB && max_bytes % MB == 0 {
        format!("{}MB", max_bytes / MB)
    } else {
        format_file_size(*max_bytes)
    }
}

/// Human-readable size: `0 Bytes`, `512 Bytes`, `1.5 KB`, `10 MB`.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".into();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = (value * 100.0).round() / 100.0;
    // `{}` on f64 drops trailing zeros, so 10.00 prints as 10.
    format!("{} {}", rounded, UNITS[unit])
}
