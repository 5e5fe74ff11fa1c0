//! Reading journal for the 114 surahs: entries, their storage, and the
//! progress derived from them.

pub mod chapters;
pub mod config;
pub mod error;
pub mod journal_entry;
pub mod journal_state;
pub mod persistence;
pub mod progress;
pub mod ui;
