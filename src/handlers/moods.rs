use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::models::mood::{
    MoodEntry, MoodInsights, MoodLevel, MoodQuery, MoodVocabulary, UpsertMoodRequest,
};
use crate::AppState;

const DEFAULT_RECENT_LIMIT: usize = 7;
const MAX_RECENT_LIMIT: usize = 366;

pub async fn upsert_mood(
    State(state): State<AppState>,
    Json(body): Json<UpsertMoodRequest>,
) -> AppResult<Json<MoodEntry>> {
    body.validate()?;

    let mood = u8::try_from(body.mood)
        .ok()
        .and_then(MoodLevel::new)
        .ok_or_else(|| AppError::Validation("Mood must be between 1 and 5".into()))?;
    let date = body.date.unwrap_or_else(|| Utc::now().date_naive());

    let entry = MoodEntry::new(
        date,
        mood,
        body.note.unwrap_or_default(),
        body.tags.unwrap_or_default(),
    );

    let saved = state.moods.save(entry).await?;
    Ok(Json(saved))
}

pub async fn list_moods(
    State(state): State<AppState>,
    Query(query): Query<MoodQuery>,
) -> AppResult<Json<Vec<MoodEntry>>> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_RECENT_LIMIT)
        .min(MAX_RECENT_LIMIT);

    let journal = state.moods.load().await?;
    let entries = journal.recent(limit).into_iter().cloned().collect();
    Ok(Json(entries))
}

pub async fn todays_mood(State(state): State<AppState>) -> AppResult<Json<Option<MoodEntry>>> {
    let today = Utc::now().date_naive();
    let journal = state.moods.load().await?;
    Ok(Json(journal.entry_for(today).cloned()))
}

pub async fn mood_insights(State(state): State<AppState>) -> AppResult<Json<MoodInsights>> {
    let journal = state.moods.load().await?;
    Ok(Json(journal.insights()))
}

pub async fn mood_vocabulary() -> Json<MoodVocabulary> {
    Json(MoodVocabulary::standard())
}
