use crate::error::{JournalError, JournalResult};
use crate::journal_entry::{EntryFields, EntryId, EntryPatch, JournalEntry};
use crate::persistence::{JournalSnapshot, Persistence};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashSet;
use tracing::{error, info, warn};

pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Owns the journal entries and keeps them in step with a [`Persistence`]
/// backend. Mutations are staged, written, and only then committed, so a
/// failed write leaves the in-memory journal untouched.
///
/// Not internally synchronized; callers sharing one across threads must
/// hold a lock around each mutating call.
pub struct JournalStore {
    entries: Vec<JournalEntry>,
    persistence: Box<dyn Persistence>,
    clock: Box<dyn Clock>,
    last_stamp: Option<DateTime<Utc>>,
}

impl JournalStore {
    pub fn new(persistence: Box<dyn Persistence>) -> Self {
        Self::with_clock(persistence, Box::new(SystemClock))
    }

    pub fn with_clock(persistence: Box<dyn Persistence>, clock: Box<dyn Clock>) -> Self {
        JournalStore {
            entries: Vec::new(),
            persistence,
            clock,
            last_stamp: None,
        }
    }

    /// Replaces the in-memory journal with what the backend holds. A backend
    /// that can't be read or parsed yields an empty journal so the app still
    /// starts.
    pub fn load(&mut self) -> &[JournalEntry] {
        self.entries = match self.persistence.read_all() {
            Ok(entries) => {
                info!(
                    count = entries.len(),
                    backend = %self.persistence.describe(),
                    "loaded journal"
                );
                with_unique_ids(entries)
            }
            Err(e) => {
                warn!(
                    error = %e,
                    backend = %self.persistence.describe(),
                    "unreadable journal, starting empty"
                );
                Vec::new()
            }
        };
        self.last_stamp = self.entries.iter().map(|e| e.updated_at).max();
        &self.entries
    }

    pub fn create(&mut self, fields: EntryFields) -> JournalResult<JournalEntry> {
        let now = self.next_stamp(None);
        let entry = JournalEntry::new(fields, now);

        let mut staged = self.entries.clone();
        staged.push(entry.clone());
        self.commit(staged, now)?;

        info!(id = %entry.id, surah = entry.surah_number, "created entry");
        Ok(entry)
    }

    pub fn update(&mut self, id: &EntryId, patch: EntryPatch) -> JournalResult<JournalEntry> {
        let index = self.position(id)?;
        let now = self.next_stamp(Some(self.entries[index].updated_at));
        let updated = self.entries[index].patched(patch, now);

        let mut staged = self.entries.clone();
        staged[index] = updated.clone();
        self.commit(staged, now)?;

        info!(id = %id, surah = updated.surah_number, "updated entry");
        Ok(updated)
    }

    pub fn delete(&mut self, id: &EntryId) -> JournalResult<()> {
        let index = self.position(id)?;
        let now = self.next_stamp(None);

        let mut staged = self.entries.clone();
        staged.remove(index);
        self.commit(staged, now)?;

        info!(id = %id, "deleted entry");
        Ok(())
    }

    /// All entries, most recently updated first. Entries with equal
    /// `updated_at` keep their creation order.
    pub fn list(&self) -> Vec<JournalEntry> {
        let mut sorted = self.entries.clone();
        sorted.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        sorted
    }

    pub fn get_by_id(&self, id: &EntryId) -> Option<JournalEntry> {
        self.entries.iter().find(|e| &e.id == id).cloned()
    }

    pub fn list_by_surah(&self, surah_number: u16) -> Vec<JournalEntry> {
        self.entries
            .iter()
            .filter(|e| e.surah_number == surah_number)
            .cloned()
            .collect()
    }

    /// Case-insensitive match on reflection text, or an exact surah number.
    pub fn search(&self, query: &str) -> Vec<JournalEntry> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return self.list();
        }
        let surah = query.parse::<u16>().ok();
        self.list()
            .into_iter()
            .filter(|e| {
                Some(e.surah_number) == surah || e.reflection.to_lowercase().contains(&query)
            })
            .collect()
    }

    /// Raw collection in storage order, for aggregation.
    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    fn position(&self, id: &EntryId) -> JournalResult<usize> {
        self.entries
            .iter()
            .position(|e| &e.id == id)
            .ok_or_else(|| JournalError::NotFound(id.clone()))
    }

    fn commit(&mut self, staged: Vec<JournalEntry>, now: DateTime<Utc>) -> JournalResult<()> {
        let snapshot = JournalSnapshot {
            entries: &staged,
            last_updated: now,
        };
        if let Err(e) = self.persistence.write_all(&snapshot) {
            error!(error = %e, backend = %self.persistence.describe(), "failed to save journal");
            return Err(e.into());
        }
        self.entries = staged;
        Ok(())
    }

    /// Strictly increasing across calls, and strictly after `floor` when given.
    fn next_stamp(&mut self, floor: Option<DateTime<Utc>>) -> DateTime<Utc> {
        let tick = Duration::microseconds(1);
        let mut stamp = self.clock.now();
        for previous in self.last_stamp.iter().chain(floor.iter()) {
            if stamp <= *previous {
                stamp = *previous + tick;
            }
        }
        self.last_stamp = Some(stamp);
        stamp
    }
}

/// Older journals used millisecond timestamps as ids, so two saves in the
/// same millisecond could share one. Every repeat after the first gets a
/// fresh id; it reaches the backend with the next write.
fn with_unique_ids(mut entries: Vec<JournalEntry>) -> Vec<JournalEntry> {
    let mut seen = HashSet::new();
    for entry in &mut entries {
        if !seen.insert(entry.id.clone()) {
            let fresh = EntryId::generate();
            warn!(old = %entry.id, new = %fresh, "duplicate entry id in journal, reassigning");
            entry.id = fresh.clone();
            seen.insert(fresh);
        }
    }
    entries
}
