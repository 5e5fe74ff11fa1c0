use crate::journal_entry::{JournalEntry, ReadingStatus};
use std::collections::BTreeMap;
use tracing::{debug, warn};

pub const TOTAL_SURAHS: u32 = 114;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProgressStats {
    pub total_surahs: u32,
    pub completed: u32,
    pub in_progress: u32,
    pub not_started: u32,
    pub total_entries: usize,
}

impl ProgressStats {
    /// Share of all surahs completed, in percent.
    pub fn completion_percent(&self) -> f64 {
        if self.total_surahs == 0 {
            return 0.0;
        }
        f64::from(self.completed) * 100.0 / f64::from(self.total_surahs)
    }
}

/// Status of every surah that has at least one entry, taken from its most
/// recently updated entry. When two entries share `updated_at`, the later
/// one in `entries` wins. Entries naming a surah outside `1..=114` are
/// skipped.
pub fn resolve_chapter_statuses(entries: &[JournalEntry]) -> BTreeMap<u16, ReadingStatus> {
    let mut latest: BTreeMap<u16, &JournalEntry> = BTreeMap::new();
    for entry in entries {
        if !is_known_surah(entry.surah_number) {
            warn!(id = %entry.id, surah = entry.surah_number, "ignoring entry for unknown surah");
            continue;
        }
        latest
            .entry(entry.surah_number)
            .and_modify(|current| {
                if entry.updated_at >= current.updated_at {
                    *current = entry;
                }
            })
            .or_insert(entry);
    }
    latest
        .into_iter()
        .map(|(surah, entry)| (surah, entry.status))
        .collect()
}

fn is_known_surah(surah_number: u16) -> bool {
    (1..=TOTAL_SURAHS).contains(&u32::from(surah_number))
}

pub fn chapter_status(entries: &[JournalEntry], surah_number: u16) -> ReadingStatus {
    entries
        .iter()
        .filter(|e| e.surah_number == surah_number)
        .fold(None::<&JournalEntry>, |best, e| match best {
            Some(b) if e.updated_at < b.updated_at => Some(b),
            _ => Some(e),
        })
        .map_or(ReadingStatus::NotStarted, |e| e.status)
}

pub fn progress_stats(entries: &[JournalEntry]) -> ProgressStats {
    let statuses = resolve_chapter_statuses(entries);

    let mut completed = 0;
    let mut in_progress = 0;
    for status in statuses.values() {
        match status {
            ReadingStatus::Completed => completed += 1,
            ReadingStatus::InProgress => in_progress += 1,
            ReadingStatus::NotStarted => {}
        }
    }

    // Surahs without entries count as not started, so derive by subtraction.
    let not_started = TOTAL_SURAHS.saturating_sub(completed + in_progress);

    let stats = ProgressStats {
        total_surahs: TOTAL_SURAHS,
        completed,
        in_progress,
        not_started,
        total_entries: entries.len(),
    };
    debug!(?stats, surahs_with_entries = statuses.len(), "progress recomputed");
    stats
}
