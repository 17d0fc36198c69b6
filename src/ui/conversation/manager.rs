use crate::config::Config;
use crate::conversation::ConversationId;
use crate::events::ConversationRole;
use crate::store::{SharedStore, StoreError};
use crate::ui::conversation::composer::{ConversationResult, INPUT_PLACEHOLDER};
use crate::ui::conversation::history_sheet::{short_id, HistorySheetResult};
use crate::ui::conversation::{
    get_help_text, parse_slash_command, ConversationComposer, HistorySheet, MessageList,
    ParsedCommand, SlashCommand,
};
use crate::ui::theme::Theme;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::Widget,
};
use tracing::{debug, info};

/// Actions that can be requested by the conversation manager
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationAction {
    None,
    Exit,
    ShowHistory { query: Option<String> },
}

/// Snapshot of an archived conversation for listing outside the store lock
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub id: ConversationId,
    pub name: String,
    pub message_count: usize,
}

/// Maps user input onto conversation store operations
pub struct ConversationManager {
    store: SharedStore,
    composer: ConversationComposer,
    history_sheet: HistorySheet,
    role: ConversationRole,
    show_timestamps: bool,
    theme: Theme,
    notice: Option<String>,
}

impl ConversationManager {
    pub fn new(store: SharedStore, config: &Config) -> Self {
        let theme = Theme::from(config.ui.theme);
        let mut composer = ConversationComposer::new(INPUT_PLACEHOLDER, config.default_role);
        composer.set_focus(true);
        composer.set_theme(theme);

        Self {
            store,
            composer,
            history_sheet: HistorySheet::new(),
            role: config.default_role,
            show_timestamps: config.ui.show_timestamps,
            theme,
            notice: None,
        }
    }

    /// Handle one line of submitted text: a slash command or a message
    pub fn handle_input(&mut self, input: &str) -> Result<ConversationAction> {
        if let Some(command) = parse_slash_command(input) {
            return self.handle_slash_command(command);
        }

        let trimmed = input.trim();
        if trimmed.starts_with('/') {
            let head = trimmed.split_whitespace().next().unwrap_or(trimmed);
            self.set_notice(format!("Unknown command {head}. Type /help for a list."));
            return Ok(ConversationAction::None);
        }

        self.send_message(input)?;
        Ok(ConversationAction::None)
    }

    /// Append `content` to the current conversation with the active role
    pub fn send_message(&mut self, content: &str) -> Result<()> {
        let role = self.role;
        let appended = self
            .store
            .with(|store| store.append_message(content, role).map(|message| message.id))?;

        match appended {
            Ok(message_id) => {
                debug!(%message_id, %role, "Message sent");
                self.notice = None;
            }
            Err(err) => self.report(err)?,
        }
        Ok(())
    }

    /// Archive the current conversation and start a new one
    pub fn start_new_conversation(&mut self) -> Result<()> {
        let (archived, was_empty) = self.store.with(|store| {
            let was_empty = store.current().is_empty();
            (store.archive_current_conversation(), was_empty)
        })?;

        info!(conversation_id = %archived, "Started new conversation");
        self.set_notice(if was_empty {
            "Started a new chat".to_string()
        } else {
            format!("Saved chat {} to history", short_id(archived))
        });
        Ok(())
    }

    /// Select an archived conversation by full id or unique id prefix
    pub fn select_conversation(&mut self, reference: &str) -> Result<()> {
        let reference = reference.trim().to_lowercase();
        if reference.is_empty() {
            self.set_notice("Usage: /select <id or id prefix>");
            return Ok(());
        }

        let matches: Vec<ConversationId> = self.store.with(|store| {
            store
                .list_history()
                .iter()
                .map(|conversation| conversation.id)
                .filter(|id| id.to_string().starts_with(&reference))
                .collect()
        })?;

        match matches.as_slice() {
            [id] => self.select_by_id(*id),
            [] => self.report(StoreError::NotFound { id: reference }),
            _ => {
                self.set_notice(format!(
                    "'{reference}' matches {} conversations, type more of the id",
                    matches.len()
                ));
                Ok(())
            }
        }
    }

    pub fn select_by_id(&mut self, id: ConversationId) -> Result<()> {
        let selected = self
            .store
            .with(|store| store.select_conversation(id).map(|c| c.name.clone()))?;

        match selected {
            Ok(name) => {
                info!(conversation_id = %id, "Reopened conversation");
                self.set_notice(format!("Opened {name}"));
                Ok(())
            }
            Err(err) => self.report(err),
        }
    }

    /// Archived conversations whose name matches `query`
    pub fn history_entries(&self, query: &str) -> Result<Vec<HistoryEntry>> {
        let entries: Vec<HistoryEntry> = self.store.with(|store| {
            store
                .search_history(query)
                .into_iter()
                .map(|conversation| HistoryEntry {
                    id: conversation.id,
                    name: conversation.name.clone(),
                    message_count: conversation.len(),
                })
                .collect()
        })?;
        Ok(entries)
    }

    pub fn set_role(&mut self, role: ConversationRole) {
        self.role = role;
        self.composer.set_role(role);
    }

    pub fn role(&self) -> ConversationRole {
        self.role
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn take_notice(&mut self) -> Option<String> {
        self.notice.take()
    }

    pub fn open_history(&mut self, query: Option<&str>) {
        self.history_sheet.open(query);
    }

    pub fn is_history_open(&self) -> bool {
        self.history_sheet.is_open()
    }

    /// Handle key input from the terminal UI
    pub fn handle_key(&mut self, key: KeyEvent) -> Result<ConversationAction> {
        if key.kind != KeyEventKind::Press {
            return Ok(ConversationAction::None);
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('c') | KeyCode::Char('d') => return Ok(ConversationAction::Exit),
                KeyCode::Char('r') => {
                    self.history_sheet.open(None);
                    return Ok(ConversationAction::None);
                }
                KeyCode::Char('n') => {
                    self.start_new_conversation()?;
                    return Ok(ConversationAction::None);
                }
                KeyCode::Char(_) => return Ok(ConversationAction::None),
                _ => {}
            }
        }

        if self.history_sheet.is_open() {
            let sheet = &mut self.history_sheet;
            let result = self.store.with(|store| {
                let entries = store.search_history(sheet.query());
                sheet.handle_key(key, &entries)
            })?;
            if let HistorySheetResult::Select(id) = result {
                self.select_by_id(id)?;
            }
            return Ok(ConversationAction::None);
        }

        match self.composer.handle_key(key) {
            ConversationResult::Submitted(input) => self.handle_input(&input),
            ConversationResult::Command(command) => self.handle_slash_command(command),
            ConversationResult::None => Ok(ConversationAction::None),
        }
    }

    /// Route pasted text to the history search while the sheet is open
    pub fn paste(&mut self, text: &str) {
        if self.history_sheet.is_open() {
            self.history_sheet.paste(text);
        } else {
            self.composer.paste(text);
        }
    }

    /// Handle slash commands
    fn handle_slash_command(&mut self, command: ParsedCommand) -> Result<ConversationAction> {
        debug!(command = command.command.command(), "Slash command");
        match command.command {
            SlashCommand::New => {
                self.start_new_conversation()?;
                Ok(ConversationAction::None)
            }
            SlashCommand::History => Ok(ConversationAction::ShowHistory {
                query: command.argument,
            }),
            SlashCommand::Select => {
                self.select_conversation(command.argument().unwrap_or_default())?;
                Ok(ConversationAction::None)
            }
            SlashCommand::Role => {
                match command.role_target() {
                    Some(role) => {
                        self.set_role(role);
                        self.set_notice(format!("Sending as {role}"));
                    }
                    None => self.set_notice("Usage: /role <user|assistant|system>"),
                }
                Ok(ConversationAction::None)
            }
            SlashCommand::Help => {
                self.set_notice(get_help_text());
                Ok(ConversationAction::None)
            }
            SlashCommand::Bye => Ok(ConversationAction::Exit),
        }
    }

    // Recoverable store errors become notices; a poisoned store is fatal.
    fn report(&mut self, err: StoreError) -> Result<()> {
        match err {
            StoreError::Poisoned => Err(err.into()),
            other => {
                self.set_notice(other.to_string());
                Ok(())
            }
        }
    }

    fn set_notice(&mut self, notice: impl Into<String>) {
        self.notice = Some(notice.into());
    }
}

impl ConversationManager {
    /// Render the conversation UI components
    pub fn render(&self, area: Rect, buf: &mut Buffer) -> Result<()> {
        let notice_height = self
            .notice
            .as_ref()
            .map_or(0, |notice| notice.lines().count().min(8) as u16);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(5),                // Messages
                Constraint::Length(notice_height), // Notice
                Constraint::Length(4),             // Composer
            ])
            .split(area);

        let store = self.store.lock()?;
        MessageList::new(store.current())
            .show_timestamps(self.show_timestamps)
            .theme(self.theme)
            .render(chunks[0], buf);

        if let Some(notice) = &self.notice {
            let notice_area = chunks[1].intersection(buf.area);
            for (i, text) in notice.lines().take(notice_area.height as usize).enumerate() {
                let line = Line::from(Span::styled(text, Style::default().fg(self.theme.notice)));
                buf.set_line(notice_area.x, notice_area.y + i as u16, &line, notice_area.width);
            }
        }

        (&self.composer).render(chunks[2], buf);

        if self.history_sheet.is_open() {
            let entries = store.search_history(self.history_sheet.query());
            let sheet_area = centered(area, 80, 70);
            self.history_sheet
                .view(&entries, self.theme)
                .render(sheet_area, buf);
        }

        Ok(())
    }
}

fn centered(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let width = (u32::from(area.width) * u32::from(percent_x) / 100) as u16;
    let height = (u32::from(area.height) * u32::from(percent_y) / 100) as u16;
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ConversationStore;

    fn manager() -> ConversationManager {
        ConversationManager::new(SharedStore::new(ConversationStore::new()), &Config::default())
    }

    fn current_contents(manager: &ConversationManager) -> Vec<(String, ConversationRole)> {
        manager
            .store()
            .with(|store| {
                store
                    .current()
                    .messages()
                    .iter()
                    .map(|m| (m.content.clone(), m.role))
                    .collect()
            })
            .unwrap()
    }

    #[test]
    fn plain_input_is_appended_with_active_role() {
        let mut manager = manager();
        manager.handle_input("Hello").unwrap();
        manager.handle_input("/role assistant").unwrap();
        manager.handle_input("Hi there").unwrap();

        assert_eq!(
            current_contents(&manager),
            [
                ("Hello".to_string(), ConversationRole::User),
                ("Hi there".to_string(), ConversationRole::Assistant)
            ]
        );
    }

    #[test]
    fn blank_submission_reports_validation_error() {
        let mut manager = manager();
        assert_eq!(manager.handle_input("   ").unwrap(), ConversationAction::None);
        assert!(current_contents(&manager).is_empty());
        assert_eq!(manager.notice(), Some("Message content must not be empty"));
    }

    #[test]
    fn new_command_archives_current_conversation() {
        let mut manager = manager();
        manager.handle_input("Hello").unwrap();
        manager.handle_input("/new").unwrap();

        let entries = manager.history_entries("").unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].message_count, 1);
        assert!(current_contents(&manager).is_empty());
    }

    #[test]
    fn select_by_prefix_reopens_conversation() {
        let mut manager = manager();
        manager.handle_input("remember me").unwrap();
        manager.handle_input("/new").unwrap();
        let id = manager.history_entries("").unwrap()[0].id;

        manager
            .handle_input(&format!("/select {}", short_id(id)))
            .unwrap();

        assert_eq!(
            current_contents(&manager),
            [("remember me".to_string(), ConversationRole::User)]
        );
        assert!(manager.history_entries("").unwrap().is_empty());
    }

    #[test]
    fn select_unknown_reports_not_found() {
        let mut manager = manager();
        manager.handle_input("stay").unwrap();

        manager.handle_input("/select ffffffff").unwrap();

        assert!(manager.notice().unwrap().contains("not found"));
        assert_eq!(current_contents(&manager).len(), 1);
    }

    #[test]
    fn unknown_command_is_not_appended() {
        let mut manager = manager();
        manager.handle_input("/teleport mars").unwrap();

        assert!(current_contents(&manager).is_empty());
        assert!(manager.notice().unwrap().contains("/teleport"));
    }

    #[test]
    fn history_and_bye_are_returned_to_the_frontend() {
        let mut manager = manager();
        assert_eq!(
            manager.handle_input("/history rain").unwrap(),
            ConversationAction::ShowHistory {
                query: Some("rain".to_string())
            }
        );
        assert_eq!(manager.handle_input("/q").unwrap(), ConversationAction::Exit);
    }

    #[test]
    fn history_sheet_selection_via_keys() {
        let mut manager = manager();
        manager.handle_input("archived").unwrap();
        manager.handle_input("/new").unwrap();

        manager
            .handle_key(KeyEvent::new(KeyCode::Char('r'), KeyModifiers::CONTROL))
            .unwrap();
        assert!(manager.is_history_open());
        manager
            .handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE))
            .unwrap();

        assert!(!manager.is_history_open());
        assert_eq!(current_contents(&manager).len(), 1);
    }

    #[test]
    fn paste_goes_to_history_search_while_sheet_is_open() {
        let mut manager = manager();
        manager.open_history(Some("weather "));

        manager.paste("in Oslo");

        assert_eq!(manager.history_sheet.query(), "weather in Oslo");
        assert!(manager.composer.content().is_empty());

        manager
            .handle_key(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE))
            .unwrap();
        manager.paste("typed later");
        assert_eq!(manager.composer.content(), "typed later");
    }

    #[test]
    fn pasted_query_filters_history() {
        let mut manager = manager();
        manager.handle_input("first").unwrap();
        manager.handle_input("/new").unwrap();
        manager.open_history(None);

        manager.paste("no such chat");
        // Enter on an empty result list keeps the sheet open and selects nothing.
        manager
            .handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE))
            .unwrap();

        assert!(manager.is_history_open());
        assert!(current_contents(&manager).is_empty());
        assert!(manager.composer.content().is_empty());
    }

    #[test]
    fn renders_on_short_terminals() {
        let mut manager = manager();
        manager.handle_input("Hello").unwrap();
        manager.handle_input("/help").unwrap();
        manager.paste("draft\nsecond line");

        for height in [1, 3, 5, 8] {
            let area = Rect::new(0, 0, 80, height);
            let mut buf = Buffer::empty(area);
            manager.render(area, &mut buf).unwrap();

            manager.open_history(None);
            let mut buf = Buffer::empty(area);
            manager.render(area, &mut buf).unwrap();
            manager
                .handle_key(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE))
                .unwrap();
        }
    }

    #[test]
    fn notice_uses_configured_theme() {
        let mut config = Config::default();
        config.ui.theme = crate::ui::theme::ThemeKind::Light;
        let mut manager =
            ConversationManager::new(SharedStore::new(ConversationStore::new()), &config);
        manager.handle_input("/teleport").unwrap();

        let area = Rect::new(0, 0, 60, 12);
        let mut buf = Buffer::empty(area);
        manager.render(area, &mut buf).unwrap();

        // Notice row sits directly above the four-row composer.
        assert_eq!(buf.get(0, 7).fg, Theme::light().notice);
    }

    #[test]
    fn renders_without_panicking_on_small_area() {
        let mut manager = manager();
        manager.handle_input("Hello").unwrap();
        manager.open_history(None);

        let area = Rect::new(0, 0, 30, 12);
        let mut buf = Buffer::empty(area);
        manager.render(area, &mut buf).unwrap();
    }
}
