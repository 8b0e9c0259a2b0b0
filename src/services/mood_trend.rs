//! Average and trend calculations over a chronological mood journal.

use crate::models::mood::{MoodEntry, MoodTrend};

/// Number of entries in each comparison window.
pub const TREND_WINDOW: usize = 7;

/// Minimum mean difference between windows before a trend is reported.
pub const TREND_THRESHOLD: f64 = 0.3;

/// Mean of all moods, rounded to one decimal place. 0.0 when empty.
pub fn average_mood(entries: &[MoodEntry]) -> f64 {
    match mean(entries) {
        Some(avg) => (avg * 10.0).round() / 10.0,
        None => 0.0,
    }
}

/// Compares the last [`TREND_WINDOW`] entries against the window before.
///
/// `entries` must be ordered oldest first. Fewer than two entries, or no
/// older window at all, is always `Stable`.
pub fn mood_trend(entries: &[MoodEntry]) -> MoodTrend {
    if entries.len() < 2 {
        return MoodTrend::Stable;
    }

    let recent_start = entries.len().saturating_sub(TREND_WINDOW);
    let older_start = recent_start.saturating_sub(TREND_WINDOW);

    let recent = &entries[recent_start..];
    let older = &entries[older_start..recent_start];

    let Some(recent_avg) = mean(recent) else {
        return MoodTrend::Stable;
    };
    let older_avg = mean(older).unwrap_or(recent_avg);

    if recent_avg > older_avg + TREND_THRESHOLD {
        MoodTrend::Improving
    } else if recent_avg < older_avg - TREND_THRESHOLD {
        MoodTrend::Declining
    } else {
        MoodTrend::Stable
    }
}

fn mean(entries: &[MoodEntry]) -> Option<f64> {
    if entries.is_empty() {
        return None;
    }
    let sum: u32 = entries.iter().map(|e| u32::from(e.mood.value())).sum();
    Some(sum as f64 / entries.len() as f64)
}
