use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Suggested descriptive tags offered alongside the mood scale.
pub const COMMON_TAGS: [&str; 8] = [
    "stressed",
    "anxious",
    "excited",
    "tired",
    "motivated",
    "grateful",
    "overwhelmed",
    "peaceful",
];

/// Self-reported mood on a 1-5 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct MoodLevel(u8);

impl MoodLevel {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(value: u8) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&value).then_some(Self(value))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn label(self) -> &'static str {
        match self.0 {
            1 => "Very Sad",
            2 => "Sad",
            3 => "Neutral",
            4 => "Happy",
            _ => "Very Happy",
        }
    }

    pub fn all() -> impl Iterator<Item = MoodLevel> {
        (Self::MIN..=Self::MAX).map(MoodLevel)
    }
}

impl TryFrom<u8> for MoodLevel {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        MoodLevel::new(value).ok_or_else(|| format!("mood must be between 1 and 5, got {}", value))
    }
}

impl From<MoodLevel> for u8 {
    fn from(level: MoodLevel) -> Self {
        level.0
    }
}

/// One day's mood record. At most one entry exists per `date`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodEntry {
    pub id: Uuid,
    pub date: NaiveDate,
    pub mood: MoodLevel,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl MoodEntry {
    pub fn new(date: NaiveDate, mood: MoodLevel, note: String, tags: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            date,
            mood,
            note: note.trim().to_string(),
            tags: normalize_tags(tags),
        }
    }
}

/// Trims, lower-cases and de-duplicates tags, keeping first-seen order.
pub fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().to_lowercase();
        if !tag.is_empty() && !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoodTrend {
    Improving,
    Declining,
    Stable,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpsertMoodRequest {
    /// Calendar day being logged. Default: today (UTC)
    pub date: Option<NaiveDate>,

    #[validate(range(min = 1, max = 5, message = "Mood must be between 1 and 5"))]
    pub mood: i32,

    #[validate(length(max = 2000, message = "Note must be under 2000 characters"))]
    pub note: Option<String>,

    #[validate(length(max = 16, message = "At most 16 tags per entry"))]
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct MoodQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoodInsights {
    pub average_mood: f64,
    pub total_entries: usize,
    pub trend: MoodTrend,
}

#[derive(Debug, Serialize)]
pub struct MoodScaleItem {
    pub value: u8,
    pub label: &'static str,
}

#[derive(Debug, Serialize)]
pub struct MoodVocabulary {
    pub tags: Vec<&'static str>,
    pub scale: Vec<MoodScaleItem>,
}

impl MoodVocabulary {
    pub fn standard() -> Self {
        Self {
            tags: COMMON_TAGS.to_vec(),
            scale: MoodLevel::all()
                .map(|level| MoodScaleItem {
                    value: level.value(),
                    label: level.label(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mood_level_bounds() {
        assert!(MoodLevel::new(0).is_none());
        assert!(MoodLevel::new(6).is_none());
        assert_eq!(MoodLevel::new(3).map(MoodLevel::label), Some("Neutral"));
    }

    #[test]
    fn test_mood_level_rejects_out_of_range_json() {
        let json = r#"{"id":"00000000-0000-0000-0000-000000000001","date":"2026-03-01","mood":9}"#;
        assert!(serde_json::from_str::<MoodEntry>(json).is_err());
    }

    #[test]
    fn test_entry_defaults_missing_note_and_tags() {
        let json = r#"{"id":"00000000-0000-0000-0000-000000000001","date":"2026-03-01","mood":4}"#;
        let entry: MoodEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.mood.value(), 4);
        assert!(entry.note.is_empty());
        assert!(entry.tags.is_empty());
    }

    #[test]
    fn test_normalize_tags() {
        let tags = vec![
            " Grateful ".to_string(),
            "grateful".to_string(),
            "".to_string(),
            "Tired".to_string(),
        ];
        assert_eq!(normalize_tags(tags), vec!["grateful", "tired"]);
    }

    #[test]
    fn test_trend_serializes_lowercase() {
        assert_eq!(serde_json::to_value(MoodTrend::Improving).unwrap(), "improving");
    }

    #[test]
    fn test_upsert_request_validation() {
        let ok = UpsertMoodRequest {
            date: None,
            mood: 5,
            note: Some("fine".into()),
            tags: None,
        };
        assert!(ok.validate().is_ok());

        let bad = UpsertMoodRequest {
            date: None,
            mood: 6,
            note: None,
            tags: None,
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_vocabulary_has_full_scale() {
        let vocab = MoodVocabulary::standard();
        assert_eq!(vocab.scale.len(), 5);
        assert_eq!(vocab.scale[0].label, "Very Sad");
        assert_eq!(vocab.tags.len(), COMMON_TAGS.len());
    }
}
