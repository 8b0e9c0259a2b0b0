use std::sync::Arc;

use sqlx::SqlitePool;
use tokio::sync::Mutex;

use crate::db::kv;
use crate::error::AppResult;
use crate::models::mood::MoodEntry;
use crate::services::mood_journal::MoodJournal;

/// Storage key holding the whole mood log as one JSON list.
pub const MOOD_ENTRIES_KEY: &str = "moodEntries";

/// Mood journal persisted under a single key/value slot.
///
/// Writes are read-modify-write of the whole list, so they are serialized
/// through `write_lock`.
#[derive(Clone)]
pub struct MoodStore {
    db: SqlitePool,
    write_lock: Arc<Mutex<()>>,
}

impl MoodStore {
    pub fn new(db: SqlitePool) -> Self {
        Self {
            db,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub async fn load(&self) -> AppResult<MoodJournal> {
        let stored: Vec<MoodEntry> = kv::get_json(&self.db, MOOD_ENTRIES_KEY)
            .await?
            .unwrap_or_default();
        let journal = MoodJournal::from_entries(stored);
        if journal.is_empty() {
            tracing::debug!(key = MOOD_ENTRIES_KEY, "No mood entries stored yet");
        }
        Ok(journal)
    }

    /// Saves `entry`, replacing whatever was logged for the same date.
    pub async fn save(&self, entry: MoodEntry) -> AppResult<MoodEntry> {
        let _guard = self.write_lock.lock().await;

        let mut journal = self.load().await?;
        let replaced = journal.entry_for(entry.date).is_some();
        let saved = journal.upsert(entry).clone();

        kv::put_json(&self.db, MOOD_ENTRIES_KEY, journal.entries()).await?;

        tracing::debug!(
            date = %saved.date,
            mood = saved.mood.value(),
            replaced,
            total = journal.len(),
            "Mood entry saved"
        );

        Ok(saved)
    }
}
