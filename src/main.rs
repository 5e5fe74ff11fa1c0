use color_eyre::eyre::{Result, WrapErr};
use quran_journal::{
    chapters::{validate_fields, validate_progress, Chapter, ChapterClient},
    config::{Config, StorageKind},
    journal_entry::EntryFields,
    journal_state::JournalStore,
    persistence::{FileBackend, KeyValueBackend, MemoryKv, Persistence},
    progress,
    ui::{Action, MessageKind, UI},
};
use std::{fs::OpenOptions, sync::Mutex};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    dotenvy::dotenv().ok();
    let config = Config::from_env();
    init_tracing(&config)?;

    let backend: Box<dyn Persistence> = match config.storage {
        StorageKind::File => Box::new(FileBackend::new(&config.data_path)),
        StorageKind::Memory => Box::new(KeyValueBackend::new(MemoryKv::default())),
    };
    let mut journal = JournalStore::new(backend);
    journal.load();

    let chapters = ChapterClient::new(&config.api_base_url, config.api_timeout)
        .wrap_err("failed to build http client")?
        .fetch_chapters()
        .await;

    let mut ui = UI::new()?;
    run(&mut ui, &mut journal, &chapters)?;
    info!("exiting");

    Ok(())
}

fn run(ui: &mut UI, journal: &mut JournalStore, chapters: &[Chapter]) -> Result<()> {
    loop {
        let stats = progress::progress_stats(journal.entries());
        let entries = journal.list();
        ui.display(&stats, &entries, chapters)?;

        let Some(action) = ui.handle_input(!entries.is_empty())? else {
            continue;
        };
        match action {
            Action::Write => {
                if let Some(fields) = ui.get_new_entry(chapters, None)? {
                    write_entry(ui, journal, chapters, fields);
                }
            }
            Action::Chapters => {
                if let Some(number) = ui.browse_chapters(chapters, journal.entries())? {
                    if let Some(fields) = ui.get_new_entry(chapters, Some(number))? {
                        write_entry(ui, journal, chapters, fields);
                    }
                }
            }
            Action::View => ui.view_entries(&entries, chapters)?,
            Action::Edit => {
                if let Some(entry) = ui.select_entry("Select Entry to Edit", &entries, chapters)? {
                    if let Some(patch) = ui.edit_entry(&entry, chapters)? {
                        let ayahs = patch.ayahs_completed.unwrap_or(entry.ayahs_completed);
                        let result = validate_progress(entry.surah_number, ayahs, chapters)
                            .and_then(|_| journal.update(&entry.id, patch));
                        match result {
                            Ok(_) => ui.show_message("Journal entry updated.", MessageKind::Success),
                            Err(e) => ui.show_message(e.to_string(), MessageKind::Error),
                        }
                    }
                }
            }
            Action::Delete => {
                if let Some(entry) = ui.select_entry("Select Entry to Delete", &entries, chapters)? {
                    if ui.confirm("Are you sure you want to delete this entry?")? {
                        match journal.delete(&entry.id) {
                            Ok(()) => ui.show_message("Journal entry deleted.", MessageKind::Success),
                            Err(e) => ui.show_message(e.to_string(), MessageKind::Error),
                        }
                    }
                }
            }
            Action::Search => {
                if let Some(query) = ui.get_search_query()? {
                    let results = journal.search(&query);
                    if results.is_empty() {
                        ui.show_message(format!("No entries match \"{query}\"."), MessageKind::Error);
                    } else {
                        ui.view_entries(&results, chapters)?;
                    }
                }
            }
            Action::Quit => return Ok(()),
        }
    }
}

fn write_entry(
    ui: &mut UI,
    journal: &mut JournalStore,
    chapters: &[Chapter],
    fields: EntryFields,
) {
    let result = validate_fields(&fields, chapters).and_then(|_| journal.create(fields));
    match result {
        Ok(_) => ui.show_message("Journal entry saved successfully!", MessageKind::Success),
        Err(e) => ui.show_message(e.to_string(), MessageKind::Error),
    }
}

/// Logs go to a file since the terminal belongs to the UI.
fn init_tracing(config: &Config) -> Result<()> {
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_path)
        .wrap_err_with(|| format!("failed to open log file {}", config.log_path.display()))?;
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(Mutex::new(log_file))
        .with_ansi(false)
        .with_target(false)
        .compact()
        .init();
    Ok(())
}
