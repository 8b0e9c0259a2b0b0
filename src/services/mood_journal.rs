use chrono::NaiveDate;

use crate::models::mood::{MoodEntry, MoodInsights};
use crate::services::mood_trend::{average_mood, mood_trend};

/// In-memory view of the mood log, kept sorted oldest first with at most
/// one entry per calendar date.
#[derive(Debug, Clone, Default)]
pub struct MoodJournal {
    entries: Vec<MoodEntry>,
}

impl MoodJournal {
    /// Builds a journal from a stored log. When a date appears more than
    /// once the later record wins.
    pub fn from_entries(stored: Vec<MoodEntry>) -> Self {
        let mut journal = Self::default();
        for entry in stored {
            journal.upsert(entry);
        }
        journal
    }

    /// Inserts `entry`, replacing any existing entry for the same date.
    pub fn upsert(&mut self, entry: MoodEntry) -> &MoodEntry {
        let idx = match self.entries.binary_search_by_key(&entry.date, |e| e.date) {
            Ok(idx) => {
                self.entries[idx] = entry;
                idx
            }
            Err(idx) => {
                self.entries.insert(idx, entry);
                idx
            }
        };
        &self.entries[idx]
    }

    pub fn entry_for(&self, date: NaiveDate) -> Option<&MoodEntry> {
        self.entries
            .binary_search_by_key(&date, |e| e.date)
            .ok()
            .map(|idx| &self.entries[idx])
    }

    /// Up to `limit` entries, newest first.
    pub fn recent(&self, limit: usize) -> Vec<&MoodEntry> {
        self.entries.iter().rev().take(limit).collect()
    }

    pub fn insights(&self) -> MoodInsights {
        MoodInsights {
            average_mood: average_mood(&self.entries),
            total_entries: self.entries.len(),
            trend: mood_trend(&self.entries),
        }
    }

    pub fn entries(&self) -> &[MoodEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::mood::{MoodLevel, MoodTrend};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    fn entry(d: u32, mood: u8) -> MoodEntry {
        MoodEntry::new(day(d), MoodLevel::new(mood).unwrap(), String::new(), vec![])
    }

    #[test]
    fn test_same_date_replaces() {
        let mut journal = MoodJournal::default();
        journal.upsert(entry(5, 2));
        let replaced = journal.upsert(entry(5, 4)).clone();

        assert_eq!(journal.len(), 1);
        assert_eq!(journal.entry_for(day(5)), Some(&replaced));
        assert_eq!(replaced.mood.value(), 4);
    }

    #[test]
    fn test_entries_stay_chronological() {
        let mut journal = MoodJournal::default();
        journal.upsert(entry(9, 3));
        journal.upsert(entry(1, 3));
        journal.upsert(entry(5, 3));

        let dates: Vec<_> = journal.entries().iter().map(|e| e.date).collect();
        assert_eq!(dates, vec![day(1), day(5), day(9)]);
    }

    #[test]
    fn test_from_entries_keeps_last_duplicate() {
        let journal = MoodJournal::from_entries(vec![entry(2, 1), entry(3, 3), entry(2, 5)]);
        assert_eq!(journal.len(), 2);
        assert_eq!(journal.entry_for(day(2)).unwrap().mood.value(), 5);
    }

    #[test]
    fn test_recent_is_newest_first_and_limited() {
        let journal = MoodJournal::from_entries((1..=10).map(|d| entry(d, 3)).collect());
        let recent: Vec<_> = journal.recent(3).iter().map(|e| e.date).collect();
        assert_eq!(recent, vec![day(10), day(9), day(8)]);
    }

    #[test]
    fn test_insights() {
        let journal = MoodJournal::from_entries(vec![entry(1, 2), entry(2, 3), entry(3, 5)]);
        let insights = journal.insights();
        assert_eq!(insights.total_entries, 3);
        assert_eq!(insights.average_mood, 3.3);
        assert_eq!(insights.trend, MoodTrend::Stable);
    }

    #[test]
    fn test_empty_insights() {
        let journal = MoodJournal::default();
        assert!(journal.is_empty());
        let insights = journal.insights();
        assert_eq!(insights.average_mood, 0.0);
        assert_eq!(insights.trend, MoodTrend::Stable);
    }
}
