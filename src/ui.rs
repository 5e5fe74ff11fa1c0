use crate::chapters::{filter_chapters, find_chapter, status_for_ayahs, Chapter};
use crate::journal_entry::{EntryFields, EntryPatch, JournalEntry, ReadingStatus};
use crate::progress::{chapter_status, ProgressStats};
use color_eyre::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use std::{
    io::{stdout, Stdout},
    time::{Duration, Instant},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const MESSAGE_TTL: Duration = Duration::from_secs(3);

pub enum Action {
    Write,
    View,
    Edit,
    Delete,
    Search,
    Chapters,
    Quit,
}

pub enum MessageKind {
    Success,
    Error,
}

struct Message {
    text: String,
    kind: MessageKind,
    shown_at: Instant,
}

pub struct UI {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    message: Option<Message>,
}

impl UI {
    pub fn new() -> Result<Self> {
        enable_raw_mode()?;
        stdout().execute(EnterAlternateScreen)?;

        let backend = CrosstermBackend::new(stdout());
        let terminal = Terminal::new(backend)?;

        Ok(UI {
            terminal,
            message: None,
        })
    }

    pub fn show_message(&mut self, text: impl Into<String>, kind: MessageKind) {
        self.message = Some(Message {
            text: text.into(),
            kind,
            shown_at: Instant::now(),
        });
    }

    pub fn display(
        &mut self,
        stats: &ProgressStats,
        entries: &[JournalEntry],
        chapters: &[Chapter],
    ) -> Result<()> {
        if self
            .message
            .as_ref()
            .is_some_and(|m| m.shown_at.elapsed() >= MESSAGE_TTL)
        {
            self.message = None;
        }
        let message = self.message.as_ref();

        self.terminal.draw(|f| {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .margin(1)
                .constraints([
                    Constraint::Length(3),
                    Constraint::Length(5),
                    Constraint::Min(0),
                    Constraint::Length(1),
                    Constraint::Length(2),
                ])
                .split(f.area());

            f.render_widget(title("Quran Journal"), chunks[0]);
            render_stats(f, chunks[1], stats);

            let width = chunks[2].width.saturating_sub(4) as usize;
            let items: Vec<ListItem> = entries
                .iter()
                .map(|e| entry_item(e, chapters, width))
                .collect();
            let entries_list = List::new(items).block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Journal Entries"),
            );
            f.render_widget(entries_list, chunks[2]);

            if let Some(message) = message {
                let color = match message.kind {
                    MessageKind::Success => Color::Green,
                    MessageKind::Error => Color::Red,
                };
                f.render_widget(
                    Paragraph::new(message.text.as_str())
                        .style(Style::default().fg(color))
                        .alignment(Alignment::Center),
                    chunks[3],
                );
            }

            let mut keys = vec![("w", "write"), ("c", "chapters")];
            if !entries.is_empty() {
                keys.extend([("v", "view"), ("e", "edit"), ("d", "delete"), ("s", "search")]);
            }
            keys.push(("q", "quit"));
            f.render_widget(controls(&keys), chunks[4]);
        })?;

        Ok(())
    }

    /// Waits briefly for a key so expired messages get cleared on redraw.
    pub fn handle_input(&self, has_entries: bool) -> Result<Option<Action>> {
        if !event::poll(Duration::from_millis(250))? {
            return Ok(None);
        }
        match read_key()? {
            Some(KeyCode::Char('w')) => Ok(Some(Action::Write)),
            Some(KeyCode::Char('c')) => Ok(Some(Action::Chapters)),
            Some(KeyCode::Char('q')) => Ok(Some(Action::Quit)),
            Some(KeyCode::Char('v')) if has_entries => Ok(Some(Action::View)),
            Some(KeyCode::Char('e')) if has_entries => Ok(Some(Action::Edit)),
            Some(KeyCode::Char('d')) if has_entries => Ok(Some(Action::Delete)),
            Some(KeyCode::Char('s')) if has_entries => Ok(Some(Action::Search)),
            _ => Ok(None),
        }
    }

    /// Collects a new entry. `preset` skips the surah prompt.
    pub fn get_new_entry(
        &mut self,
        chapters: &[Chapter],
        preset: Option<u16>,
    ) -> Result<Option<EntryFields>> {
        let surah_number = match preset {
            Some(n) => n,
            None => match self.prompt("Add Journal Entry", "Surah number (1-114)", "")? {
                Some(raw) => match raw.trim().parse::<u16>() {
                    Ok(n) => n,
                    Err(_) => {
                        self.show_message("Please select a surah.", MessageKind::Error);
                        return Ok(None);
                    }
                },
                None => return Ok(None),
            },
        };

        let chapter = find_chapter(chapters, surah_number);
        let ayah_label = match chapter {
            Some(c) => format!(
                "Ayahs completed for {} (total ayahs: {})",
                c.english_name, c.number_of_ayahs
            ),
            None => format!("Ayahs completed for Surah {surah_number}"),
        };
        let Some(ayahs_completed) = self.prompt_ayahs("Add Journal Entry", &ayah_label, 0)? else {
            return Ok(None);
        };

        let suggested = match chapter {
            Some(c) => status_for_ayahs(ayahs_completed, c.number_of_ayahs),
            None if ayahs_completed == 0 => ReadingStatus::NotStarted,
            None => ReadingStatus::InProgress,
        };
        let Some(status) = self.select_status(suggested)? else {
            return Ok(None);
        };
        let Some(reflection) = self.prompt("Add Journal Entry", "Reflection (optional)", "")? else {
            return Ok(None);
        };

        Ok(Some(EntryFields {
            surah_number,
            ayahs_completed,
            status,
            reflection,
        }))
    }

    pub fn edit_entry(
        &mut self,
        entry: &JournalEntry,
        chapters: &[Chapter],
    ) -> Result<Option<EntryPatch>> {
        let heading = format!("Edit {}", surah_label(entry.surah_number, chapters));
        let Some(ayahs_completed) =
            self.prompt_ayahs(&heading, "Ayahs completed", entry.ayahs_completed)?
        else {
            return Ok(None);
        };

        let suggested = match find_chapter(chapters, entry.surah_number) {
            Some(c) if ayahs_completed != entry.ayahs_completed => {
                status_for_ayahs(ayahs_completed, c.number_of_ayahs)
            }
            _ => entry.status,
        };
        let Some(status) = self.select_status(suggested)? else {
            return Ok(None);
        };
        let Some(reflection) = self.prompt(&heading, "Reflection", &entry.reflection)? else {
            return Ok(None);
        };

        Ok(Some(EntryPatch {
            ayahs_completed: Some(ayahs_completed),
            status: Some(status),
            reflection: Some(reflection),
            ..Default::default()
        }))
    }

    /// Lets the user pick one entry. Enter on an entry returns it, Esc returns `None`.
    pub fn select_entry(
        &mut self,
        heading: &str,
        entries: &[JournalEntry],
        chapters: &[Chapter],
    ) -> Result<Option<JournalEntry>> {
        if entries.is_empty() {
            return Ok(None);
        }
        let mut selected_index = 0;

        loop {
            self.terminal.draw(|f| {
                let chunks = three_rows(f.area());
                f.render_widget(title(heading), chunks[0]);

                let width = chunks[1].width.saturating_sub(6) as usize;
                let items: Vec<ListItem> = entries
                    .iter()
                    .map(|e| entry_item(e, chapters, width))
                    .collect();
                let list = List::new(items)
                    .block(Block::default().borders(Borders::ALL).title("Entries"))
                    .highlight_style(Style::default().add_modifier(Modifier::BOLD))
                    .highlight_symbol("> ");
                f.render_stateful_widget(
                    list,
                    chunks[1],
                    &mut ListState::default().with_selected(Some(selected_index)),
                );

                f.render_widget(
                    instructions("Up/Down: Navigate, Enter: Select, Esc: Cancel"),
                    chunks[2],
                );
            })?;

            match read_key()? {
                Some(KeyCode::Up) => selected_index = selected_index.saturating_sub(1),
                Some(KeyCode::Down) if selected_index + 1 < entries.len() => selected_index += 1,
                Some(KeyCode::Enter) => return Ok(Some(entries[selected_index].clone())),
                Some(KeyCode::Esc) => return Ok(None),
                _ => {}
            }
        }
    }

    pub fn view_entries(&mut self, entries: &[JournalEntry], chapters: &[Chapter]) -> Result<()> {
        while let Some(entry) = self.select_entry("View Entries", entries, chapters)? {
            self.view_full_entry(&entry, chapters)?;
        }
        Ok(())
    }

    fn view_full_entry(&mut self, entry: &JournalEntry, chapters: &[Chapter]) -> Result<()> {
        let chapter = find_chapter(chapters, entry.surah_number);
        let total = chapter.map_or_else(|| "?".to_string(), |c| c.number_of_ayahs.to_string());
        let heading = surah_label(entry.surah_number, chapters);

        self.terminal.draw(|f| {
            let chunks = three_rows(f.area());
            f.render_widget(title(&heading), chunks[0]);

            let body = vec![
                Line::from(format!(
                    "Progress: {}/{} ayahs ({})",
                    entry.ayahs_completed,
                    total,
                    entry.status.label()
                )),
                Line::from(format!(
                    "Created {}   Updated {}",
                    entry.created_at.format("%Y-%m-%d %H:%M"),
                    entry.updated_at.format("%Y-%m-%d %H:%M")
                )),
                Line::from(""),
                Line::from(if entry.reflection.is_empty() {
                    "No reflection written.".to_string()
                } else {
                    entry.reflection.clone()
                }),
            ];
            let content = Paragraph::new(body)
                .wrap(Wrap { trim: false })
                .block(Block::default().borders(Borders::ALL).title("Entry"));
            f.render_widget(content, chunks[1]);
            f.render_widget(instructions("Any key: Back"), chunks[2]);
        })?;

        while read_key()?.is_none() {}
        Ok(())
    }

    pub fn confirm(&mut self, question: &str) -> Result<bool> {
        self.terminal.draw(|f| {
            let chunks = three_rows(f.area());
            f.render_widget(title("Confirm"), chunks[0]);
            f.render_widget(
                Paragraph::new(question)
                    .alignment(Alignment::Center)
                    .block(Block::default().borders(Borders::ALL)),
                chunks[1],
            );
            f.render_widget(instructions("y: Yes, any other key: No"), chunks[2]);
        })?;

        loop {
            if let Some(code) = read_key()? {
                return Ok(matches!(code, KeyCode::Char('y') | KeyCode::Char('Y')));
            }
        }
    }

    pub fn get_search_query(&mut self) -> Result<Option<String>> {
        self.prompt("Search Entries", "Reflection text or surah number", "")
    }

    /// Browses chapter metadata with per-surah status. Returns the surah
    /// the user chose to journal, if any.
    pub fn browse_chapters(
        &mut self,
        chapters: &[Chapter],
        entries: &[JournalEntry],
    ) -> Result<Option<u16>> {
        let mut query = String::new();
        let mut selected_index = 0;

        loop {
            let visible = filter_chapters(chapters, &query);
            selected_index = selected_index.min(visible.len().saturating_sub(1));

            self.terminal.draw(|f| {
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .margin(1)
                    .constraints([
                        Constraint::Length(3),
                        Constraint::Length(3),
                        Constraint::Min(5),
                        Constraint::Length(3),
                    ])
                    .split(f.area());

                f.render_widget(title("Surahs"), chunks[0]);
                f.render_widget(
                    Paragraph::new(query.as_str())
                        .block(Block::default().borders(Borders::ALL).title("Search")),
                    chunks[1],
                );

                let items: Vec<ListItem> = if visible.is_empty() {
                    vec![ListItem::new("No surahs found")]
                } else {
                    visible
                        .iter()
                        .map(|c| {
                            let status = chapter_status(entries, c.number);
                            ListItem::new(Line::from(vec![
                                Span::raw(format!(
                                    "{:>3}. {} ({}) - {}, {} ayahs, {:?}  ",
                                    c.number,
                                    c.english_name,
                                    c.name,
                                    c.english_name_translation,
                                    c.number_of_ayahs,
                                    c.revelation_type
                                )),
                                Span::styled(status.label(), status_style(status)),
                            ]))
                        })
                        .collect()
                };
                let list = List::new(items)
                    .block(Block::default().borders(Borders::ALL))
                    .highlight_style(Style::default().add_modifier(Modifier::BOLD))
                    .highlight_symbol("> ");
                f.render_stateful_widget(
                    list,
                    chunks[2],
                    &mut ListState::default().with_selected(Some(selected_index)),
                );
                f.render_widget(
                    instructions("Type to filter, Up/Down: Navigate, Enter: Add to journal, Esc: Back"),
                    chunks[3],
                );
            })?;

            match read_key()? {
                Some(KeyCode::Esc) => return Ok(None),
                Some(KeyCode::Enter) => {
                    if let Some(chapter) = visible.get(selected_index) {
                        return Ok(Some(chapter.number));
                    }
                }
                Some(KeyCode::Up) => selected_index = selected_index.saturating_sub(1),
                Some(KeyCode::Down) if selected_index + 1 < visible.len() => selected_index += 1,
                Some(KeyCode::Char(c)) => {
                    query.push(c);
                    selected_index = 0;
                }
                Some(KeyCode::Backspace) => {
                    query.pop();
                    selected_index = 0;
                }
                _ => {}
            }
        }
    }

    fn prompt_ayahs(&mut self, heading: &str, label: &str, initial: u32) -> Result<Option<u32>> {
        let Some(raw) = self.prompt(heading, label, &initial.to_string())? else {
            return Ok(None);
        };
        match raw.trim().parse::<u32>() {
            Ok(n) => Ok(Some(n)),
            Err(_) => {
                self.show_message(
                    "Please enter a valid number of ayahs completed.",
                    MessageKind::Error,
                );
                Ok(None)
            }
        }
    }

    fn select_status(&mut self, suggested: ReadingStatus) -> Result<Option<ReadingStatus>> {
        const CHOICES: [ReadingStatus; 3] = [
            ReadingStatus::NotStarted,
            ReadingStatus::InProgress,
            ReadingStatus::Completed,
        ];
        let mut selected_index = CHOICES.iter().position(|s| *s == suggested).unwrap_or(0);

        loop {
            self.terminal.draw(|f| {
                let chunks = three_rows(f.area());
                f.render_widget(title("Status"), chunks[0]);
                let items: Vec<ListItem> = CHOICES
                    .iter()
                    .map(|s| ListItem::new(Span::styled(s.label(), status_style(*s))))
                    .collect();
                let list = List::new(items)
                    .block(Block::default().borders(Borders::ALL))
                    .highlight_style(Style::default().add_modifier(Modifier::BOLD))
                    .highlight_symbol("> ");
                f.render_stateful_widget(
                    list,
                    chunks[1],
                    &mut ListState::default().with_selected(Some(selected_index)),
                );
                f.render_widget(
                    instructions("Up/Down: Choose, Enter: Confirm, Esc: Cancel"),
                    chunks[2],
                );
            })?;

            match read_key()? {
                Some(KeyCode::Up) => selected_index = selected_index.saturating_sub(1),
                Some(KeyCode::Down) if selected_index + 1 < CHOICES.len() => selected_index += 1,
                Some(KeyCode::Enter) => return Ok(Some(CHOICES[selected_index])),
                Some(KeyCode::Esc) => return Ok(None),
                _ => {}
            }
        }
    }

    /// Single text field. Enter accepts, Esc cancels.
    fn prompt(&mut self, heading: &str, label: &str, initial: &str) -> Result<Option<String>> {
        let mut input = initial.to_string();

        loop {
            self.terminal.draw(|f| {
                let chunks = three_rows(f.area());
                f.render_widget(title(heading), chunks[0]);
                let field = Paragraph::new(format!("{input}|"))
                    .wrap(Wrap { trim: false })
                    .block(Block::default().borders(Borders::ALL).title(label));
                f.render_widget(field, chunks[1]);
                f.render_widget(instructions("Enter: Accept, Esc: Cancel"), chunks[2]);
            })?;

            match read_key()? {
                Some(KeyCode::Enter) => return Ok(Some(input)),
                Some(KeyCode::Esc) => return Ok(None),
                Some(KeyCode::Char(c)) => input.push(c),
                Some(KeyCode::Backspace) => {
                    input.pop();
                }
                _ => {}
            }
        }
    }
}

impl Drop for UI {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = stdout().execute(LeaveAlternateScreen);
    }
}

fn read_key() -> Result<Option<KeyCode>> {
    match event::read()? {
        Event::Key(key) if key.kind == KeyEventKind::Press => Ok(Some(key.code)),
        _ => Ok(None),
    }
}

fn three_rows(area: Rect) -> std::rc::Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(3),
        ])
        .split(area)
}

fn title(text: &str) -> Paragraph<'_> {
    Paragraph::new(text)
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center)
}

fn instructions(text: &str) -> Paragraph<'_> {
    Paragraph::new(text)
        .style(Style::default().fg(Color::Yellow))
        .alignment(Alignment::Center)
}

fn controls<'a>(keys: &[(&'a str, &'a str)]) -> Paragraph<'a> {
    let mut spans = vec![Span::raw("Press ")];
    for (i, (key, action)) in keys.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw(", "));
        }
        spans.push(Span::styled(*key, Style::default().add_modifier(Modifier::BOLD)));
        spans.push(Span::raw(format!(" to {action}")));
    }
    Paragraph::new(Line::from(spans))
        .style(Style::default().fg(Color::Yellow))
        .alignment(Alignment::Center)
}

fn render_stats(f: &mut Frame, area: Rect, stats: &ProgressStats) {
    let block = Block::default().borders(Borders::ALL).title("Progress");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1), Constraint::Min(0)])
        .split(inner);

    let counts = Line::from(vec![
        Span::styled(
            format!("Completed: {}  ", stats.completed),
            status_style(ReadingStatus::Completed),
        ),
        Span::styled(
            format!("In Progress: {}  ", stats.in_progress),
            status_style(ReadingStatus::InProgress),
        ),
        Span::styled(
            format!("Not Started: {}  ", stats.not_started),
            status_style(ReadingStatus::NotStarted),
        ),
        Span::styled(
            format!("Journal Entries: {}", stats.total_entries),
            Style::default().fg(Color::Blue),
        ),
    ]);
    f.render_widget(Paragraph::new(counts), rows[0]);

    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(Color::Green))
        .ratio((stats.completion_percent() / 100.0).clamp(0.0, 1.0))
        .label(format!(
            "{}/{} surahs ({:.1}%)",
            stats.completed,
            stats.total_surahs,
            stats.completion_percent()
        ));
    f.render_widget(gauge, rows[1]);
}

fn status_style(status: ReadingStatus) -> Style {
    match status {
        ReadingStatus::Completed => Style::default().fg(Color::Green),
        ReadingStatus::InProgress => Style::default().fg(Color::Yellow),
        ReadingStatus::NotStarted => Style::default().fg(Color::Gray),
    }
}

fn surah_label(number: u16, chapters: &[Chapter]) -> String {
    match find_chapter(chapters, number) {
        Some(c) => format!("{}. {} ({})", c.number, c.english_name, c.name),
        None => format!("Surah {number}"),
    }
}

fn entry_item<'a>(entry: &JournalEntry, chapters: &[Chapter], width: usize) -> ListItem<'a> {
    let reflection = entry.reflection.lines().next().unwrap_or("");
    ListItem::new(vec![
        Line::from(vec![
            Span::raw(format!(
                "[{}] {} - {} ayahs ",
                entry.updated_at.format("%Y-%m-%d %H:%M"),
                surah_label(entry.surah_number, chapters),
                entry.ayahs_completed
            )),
            Span::styled(entry.status.label(), status_style(entry.status)),
        ]),
        Line::from(Span::styled(
            truncate_to_width(reflection, width),
            Style::default().fg(Color::DarkGray),
        )),
    ])
}

/// Cuts `text` to at most `max` terminal columns, marking the cut with `…`.
fn truncate_to_width(text: &str, max: usize) -> String {
    if max == 0 {
        return String::new();
    }
    if text.width() <= max {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > max.saturating_sub(1) {
            out.push('…');
            return out;
        }
        used += w;
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_untouched() {
        assert_eq!(truncate_to_width("mercy", 10), "mercy");
        assert_eq!(truncate_to_width("mercy", 5), "mercy");
    }

    #[test]
    fn zero_width_yields_nothing() {
        assert_eq!(truncate_to_width("mercy", 0), "");
        assert_eq!(truncate_to_width("", 0), "");
    }

    #[test]
    fn long_text_is_cut_by_columns() {
        assert_eq!(truncate_to_width("patience", 5), "pati…");
        // Full-width characters take two columns each.
        assert_eq!(truncate_to_width("慈悲慈悲", 5), "慈悲…");
    }
}
