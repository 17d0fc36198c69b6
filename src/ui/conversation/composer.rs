use crate::events::ConversationRole;
use crate::ui::conversation::commands::{command_entries, parse_slash_command, CommandEntry, ParsedCommand};
use crate::ui::theme::Theme;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};
use std::cell::{Cell, RefCell};

pub const INPUT_PLACEHOLDER: &str = "Ask anything";

/// Result returned when the user interacts with the conversation composer
#[derive(Debug, PartialEq)]
pub enum ConversationResult {
    Submitted(String),
    Command(ParsedCommand),
    None,
}

/// State for the text area within the composer
#[derive(Debug, Clone, Default)]
pub struct TextAreaState {
    pub content: String,
    /// Cursor position in characters, not bytes
    pub cursor_position: usize,
}

impl TextAreaState {
    fn char_count(&self) -> usize {
        self.content.chars().count()
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.content
            .char_indices()
            .nth(char_index)
            .map_or(self.content.len(), |(index, _)| index)
    }
}

/// Input bar for composing messages and slash commands
#[derive(Clone)]
pub struct ConversationComposer {
    state: RefCell<TextAreaState>,
    placeholder: String,
    has_focus: bool,
    role: ConversationRole,
    theme: Theme,
    command_entries: Vec<CommandEntry>,
    filtered_commands: RefCell<Vec<CommandEntry>>,
    show_command_palette: Cell<bool>,
    selected_command: Cell<Option<usize>>,
}

impl ConversationComposer {
    pub fn new(placeholder: impl Into<String>, role: ConversationRole) -> Self {
        Self {
            state: RefCell::new(TextAreaState::default()),
            placeholder: placeholder.into(),
            has_focus: false,
            role,
            theme: Theme::default(),
            command_entries: command_entries(),
            filtered_commands: RefCell::new(Vec::new()),
            show_command_palette: Cell::new(false),
            selected_command: Cell::new(None),
        }
    }

    /// Handle key input
    pub fn handle_key(&self, key: KeyEvent) -> ConversationResult {
        if key.kind != KeyEventKind::Press {
            return ConversationResult::None;
        }

        let mut state = self.state.borrow_mut();

        match key.code {
            KeyCode::Enter => {
                if key.modifiers.contains(KeyModifiers::SHIFT) {
                    self.insert_char(&mut state, '\n');
                } else if self.show_command_palette.get() && self.apply_selected_command(&mut state) {
                    return ConversationResult::None;
                } else if !state.content.trim().is_empty() {
                    let content = std::mem::take(&mut state.content);
                    state.cursor_position = 0;
                    self.close_command_palette();
                    drop(state);
                    return match parse_slash_command(&content) {
                        Some(command) => ConversationResult::Command(command),
                        None => ConversationResult::Submitted(content),
                    };
                }
            }
            KeyCode::Up => {
                if self.show_command_palette.get() {
                    self.move_command_selection(-1);
                }
            }
            KeyCode::Down => {
                if self.show_command_palette.get() {
                    self.move_command_selection(1);
                }
            }
            KeyCode::Esc => {
                if self.show_command_palette.get() {
                    self.close_command_palette();
                }
            }
            KeyCode::Tab => {
                if self.show_command_palette.get() {
                    self.apply_selected_command(&mut state);
                }
            }
            KeyCode::Char(c) => {
                self.insert_char(&mut state, c);

                if state.content.starts_with('/') && !state.content.contains(char::is_whitespace) {
                    if self.show_command_palette.get() {
                        self.refresh_command_palette(&state);
                    } else {
                        self.open_command_palette(&state);
                    }
                } else {
                    self.close_command_palette();
                }
            }
            KeyCode::Backspace => {
                if self.backspace(&mut state) {
                    self.sync_palette(&state);
                }
            }
            KeyCode::Delete => {
                if self.delete(&mut state) {
                    self.sync_palette(&state);
                }
            }
            KeyCode::Left => {
                state.cursor_position = state.cursor_position.saturating_sub(1);
            }
            KeyCode::Right => {
                if state.cursor_position < state.char_count() {
                    state.cursor_position += 1;
                }
            }
            KeyCode::Home => {
                state.cursor_position = 0;
            }
            KeyCode::End => {
                state.cursor_position = state.char_count();
            }
            _ => {}
        }

        ConversationResult::None
    }

    /// Insert pasted text at the cursor
    pub fn paste(&self, text: &str) {
        let mut state = self.state.borrow_mut();
        let index = state.byte_index(state.cursor_position);
        state.content.insert_str(index, text);
        state.cursor_position += text.chars().count();
    }

    fn insert_char(&self, state: &mut TextAreaState, c: char) {
        let index = state.byte_index(state.cursor_position);
        state.content.insert(index, c);
        state.cursor_position += 1;
    }

    fn backspace(&self, state: &mut TextAreaState) -> bool {
        if state.cursor_position == 0 {
            return false;
        }
        state.cursor_position -= 1;
        let index = state.byte_index(state.cursor_position);
        state.content.remove(index);
        true
    }

    fn delete(&self, state: &mut TextAreaState) -> bool {
        if state.cursor_position >= state.char_count() {
            return false;
        }
        let index = state.byte_index(state.cursor_position);
        state.content.remove(index);
        true
    }

    fn sync_palette(&self, state: &TextAreaState) {
        if !self.show_command_palette.get() {
            return;
        }
        if state.content.starts_with('/') {
            self.refresh_command_palette(state);
        } else {
            self.close_command_palette();
        }
    }

    fn open_command_palette(&self, state: &TextAreaState) {
        self.show_command_palette.set(true);
        self.selected_command.set(Some(0));
        self.refresh_command_palette(state);
    }

    fn close_command_palette(&self) {
        self.show_command_palette.set(false);
        self.filtered_commands.borrow_mut().clear();
        self.selected_command.set(None);
    }

    fn refresh_command_palette(&self, state: &TextAreaState) {
        let query = state.content.trim_start_matches('/').to_lowercase();
        let mut filtered = self.filtered_commands.borrow_mut();
        filtered.clear();

        for entry in &self.command_entries {
            if query.is_empty() || entry.keyword.starts_with(&query) {
                filtered.push(*entry);
            }
        }

        if filtered.is_empty() {
            self.selected_command.set(None);
        } else {
            let index = self.selected_command.get().unwrap_or(0);
            self.selected_command.set(Some(index.min(filtered.len() - 1)));
        }
    }

    fn move_command_selection(&self, delta: isize) {
        let filtered = self.filtered_commands.borrow();
        if filtered.is_empty() {
            self.selected_command.set(None);
            return;
        }

        let len = filtered.len() as isize;
        let current = self.selected_command.get().unwrap_or(0) as isize;
        let next = (current + delta).rem_euclid(len);
        self.selected_command.set(Some(next as usize));
    }

    fn apply_selected_command(&self, state: &mut TextAreaState) -> bool {
        let entry = {
            let filtered = self.filtered_commands.borrow();
            match self.selected_command.get().and_then(|index| filtered.get(index)) {
                Some(entry) => *entry,
                None => return false,
            }
        };

        state.content = format!("/{} ", entry.keyword);
        state.cursor_position = state.char_count();
        self.close_command_palette();
        true
    }

    /// Set focus state
    pub fn set_focus(&mut self, has_focus: bool) {
        self.has_focus = has_focus;
    }

    /// Update the role shown in the title
    pub fn set_role(&mut self, role: ConversationRole) {
        self.role = role;
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
    }

    /// Get current content
    pub fn content(&self) -> String {
        self.state.borrow().content.clone()
    }

    pub fn is_palette_open(&self) -> bool {
        self.show_command_palette.get()
    }

    fn title(&self) -> String {
        format!("{} Send as {}", self.role.icon(), self.role.display_name())
    }
}

impl Widget for &ConversationComposer {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let area = area.intersection(buf.area);
        if area.is_empty() {
            return;
        }
        let state = self.state.borrow();

        let block = Block::default()
            .borders(Borders::ALL)
            .title(self.title())
            .style(if self.has_focus {
                Style::default().fg(self.theme.focus)
            } else {
                Style::default().fg(self.theme.muted)
            });

        let inner_area = block.inner(area);
        block.render(area, buf);
        // A bar of two rows or fewer is all border.
        if inner_area.is_empty() {
            return;
        }

        if state.content.is_empty() {
            let placeholder_line = Line::from(vec![Span::styled(
                self.placeholder.as_str(),
                Style::default().fg(self.theme.faint),
            )]);
            buf.set_line(inner_area.x, inner_area.y, &placeholder_line, inner_area.width);
        } else {
            let mut content = state.content.clone();
            if self.has_focus {
                content.insert(state.byte_index(state.cursor_position), '▌');
            }

            // Show the last lines when the input outgrows the bar.
            let lines: Vec<&str> = content.split('\n').collect();
            let height = inner_area.height as usize;
            let start = lines.len().saturating_sub(height);
            for (i, line_text) in lines[start..].iter().enumerate() {
                let line = Line::from(vec![Span::raw(*line_text)]);
                buf.set_line(inner_area.x, inner_area.y + i as u16, &line, inner_area.width);
            }
        }

        if self.show_command_palette.get() {
            let filtered = self.filtered_commands.borrow();
            let palette_height = (filtered.len().min(5) + 2) as u16;
            let palette_area = Rect {
                x: area.x,
                y: area.y.saturating_sub(palette_height),
                width: area.width,
                height: palette_height.min(area.y),
            }
            .intersection(buf.area);
            if palette_area.height < 3 {
                return;
            }

            let block = Block::default()
                .borders(Borders::ALL)
                .title("Commands")
                .style(Style::default().fg(self.theme.accent));
            let inner = block.inner(palette_area);
            block.render(palette_area, buf);

            let selected = self.selected_command.get();
            for (index, entry) in filtered.iter().take(inner.height as usize).enumerate() {
                let style = if selected == Some(index) {
                    Style::default()
                        .fg(self.theme.highlight_fg)
                        .bg(self.theme.accent)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(self.theme.text)
                };

                let line = Line::from(vec![
                    Span::styled(format!("/{}", entry.keyword), style),
                    Span::styled(" - ", Style::default().fg(self.theme.faint)),
                    Span::styled(entry.description, Style::default().fg(self.theme.muted)),
                ]);

                buf.set_line(inner.x, inner.y + index as u16, &line, inner.width);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::conversation::commands::SlashCommand;

    fn press(composer: &ConversationComposer, code: KeyCode) -> ConversationResult {
        composer.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_text(composer: &ConversationComposer, text: &str) {
        for c in text.chars() {
            press(composer, KeyCode::Char(c));
        }
    }

    #[test]
    fn enter_submits_and_clears() {
        let composer = ConversationComposer::new(INPUT_PLACEHOLDER, ConversationRole::User);
        type_text(&composer, "How is the weather?");

        let result = press(&composer, KeyCode::Enter);

        assert_eq!(result, ConversationResult::Submitted("How is the weather?".to_string()));
        assert!(composer.content().is_empty());
    }

    #[test]
    fn blank_input_is_not_submitted() {
        let composer = ConversationComposer::new(INPUT_PLACEHOLDER, ConversationRole::User);
        type_text(&composer, "   ");

        assert_eq!(press(&composer, KeyCode::Enter), ConversationResult::None);
        assert_eq!(composer.content(), "   ");
    }

    #[test]
    fn shift_enter_inserts_newline() {
        let composer = ConversationComposer::new(INPUT_PLACEHOLDER, ConversationRole::User);
        type_text(&composer, "one");
        composer.handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::SHIFT));
        type_text(&composer, "two");

        assert_eq!(
            press(&composer, KeyCode::Enter),
            ConversationResult::Submitted("one\ntwo".to_string())
        );
    }

    #[test]
    fn editing_handles_multibyte_characters() {
        let composer = ConversationComposer::new(INPUT_PLACEHOLDER, ConversationRole::User);
        type_text(&composer, "héllo");
        press(&composer, KeyCode::Left);
        press(&composer, KeyCode::Left);
        press(&composer, KeyCode::Left);
        press(&composer, KeyCode::Backspace);
        composer.paste("é");
        press(&composer, KeyCode::End);
        press(&composer, KeyCode::Backspace);

        assert_eq!(composer.content(), "héll");
    }

    #[test]
    fn slash_opens_palette_and_tab_completes() {
        let composer = ConversationComposer::new(INPUT_PLACEHOLDER, ConversationRole::User);
        type_text(&composer, "/hi");
        assert!(composer.is_palette_open());

        press(&composer, KeyCode::Tab);
        assert_eq!(composer.content(), "/history ");
        assert!(!composer.is_palette_open());

        type_text(&composer, "rain");
        match press(&composer, KeyCode::Enter) {
            ConversationResult::Command(command) => {
                assert_eq!(command.command, SlashCommand::History);
                assert_eq!(command.argument(), Some("rain"));
            }
            other => panic!("expected command, got {other:?}"),
        }
    }

    #[test]
    fn renders_placeholder_when_empty() {
        let composer = ConversationComposer::new(INPUT_PLACEHOLDER, ConversationRole::Assistant);
        let area = Rect::new(0, 0, 40, 3);
        let mut buf = Buffer::empty(area);

        (&composer).render(area, &mut buf);

        let row: String = (0..area.width)
            .map(|x| buf.get(x, 1).symbol().to_string())
            .collect();
        assert!(row.contains(INPUT_PLACEHOLDER));
    }

    #[test]
    fn renders_border_only_when_too_short_for_text() {
        let composer = ConversationComposer::new(INPUT_PLACEHOLDER, ConversationRole::User);
        type_text(&composer, "first\nsecond");

        for height in [0, 1, 2] {
            let area = Rect::new(0, 0, 40, height.max(1));
            let mut buf = Buffer::empty(area);
            (&composer).render(Rect::new(0, 0, 40, height), &mut buf);
        }

        // Area partly outside the buffer is clipped to it.
        let mut buf = Buffer::empty(Rect::new(0, 0, 40, 4));
        (&composer).render(Rect::new(0, 2, 40, 4), &mut buf);
    }

    #[test]
    fn focus_border_follows_theme() {
        let mut composer = ConversationComposer::new(INPUT_PLACEHOLDER, ConversationRole::User);
        composer.set_focus(true);
        let area = Rect::new(0, 0, 40, 3);

        let mut dark = Buffer::empty(area);
        (&composer).render(area, &mut dark);
        composer.set_theme(Theme::light());
        let mut light = Buffer::empty(area);
        (&composer).render(area, &mut light);

        assert_eq!(dark.get(0, 0).fg, Theme::dark().focus);
        assert_eq!(light.get(0, 0).fg, Theme::light().focus);
    }
}
