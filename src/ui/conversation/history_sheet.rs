//! Searchable sheet listing archived conversations

use crate::conversation::{Conversation, ConversationId};
use crate::ui::theme::Theme;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Widget},
};

/// What the sheet asks of its owner after a key press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistorySheetResult {
    None,
    Close,
    Select(ConversationId),
}

/// Search and selection state of the history sheet
#[derive(Debug, Clone, Default)]
pub struct HistorySheet {
    query: String,
    selected: usize,
    is_open: bool,
}

impl HistorySheet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self, query: Option<&str>) {
        self.is_open = true;
        self.query = query.unwrap_or_default().to_string();
        self.selected = 0;
    }

    pub fn close(&mut self) {
        self.is_open = false;
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Append pasted text to the search query; line breaks become spaces
    pub fn paste(&mut self, text: &str) {
        self.query
            .extend(text.chars().map(|c| if c.is_control() { ' ' } else { c }));
        self.selected = 0;
    }

    /// Handle a key press against the currently visible entries
    pub fn handle_key(&mut self, key: KeyEvent, entries: &[&Conversation]) -> HistorySheetResult {
        if key.kind != KeyEventKind::Press {
            return HistorySheetResult::None;
        }

        match key.code {
            KeyCode::Esc => {
                self.close();
                return HistorySheetResult::Close;
            }
            KeyCode::Enter => {
                if let Some(conversation) = entries.get(self.selected) {
                    self.close();
                    return HistorySheetResult::Select(conversation.id);
                }
            }
            KeyCode::Up => {
                self.selected = self.selected.saturating_sub(1);
            }
            KeyCode::Down => {
                if self.selected + 1 < entries.len() {
                    self.selected += 1;
                }
            }
            KeyCode::Backspace => {
                self.query.pop();
                self.selected = 0;
            }
            KeyCode::Char(c) => {
                self.query.push(c);
                self.selected = 0;
            }
            _ => {}
        }

        HistorySheetResult::None
    }

    /// Widget rendering this sheet over `entries`
    pub fn view<'a>(&'a self, entries: &'a [&'a Conversation], theme: Theme) -> HistorySheetView<'a> {
        HistorySheetView {
            sheet: self,
            entries,
            theme,
        }
    }
}

pub struct HistorySheetView<'a> {
    sheet: &'a HistorySheet,
    entries: &'a [&'a Conversation],
    theme: Theme,
}

impl Widget for HistorySheetView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let area = area.intersection(buf.area);
        if area.is_empty() {
            return;
        }
        let theme = self.theme;
        Clear.render(area, buf);

        let block = Block::default()
            .borders(Borders::ALL)
            .title("📜 History (Esc to close)")
            .style(Style::default().fg(theme.accent));
        let inner = block.inner(area);
        block.render(area, buf);

        if inner.is_empty() {
            return;
        }

        let search = Line::from(vec![
            Span::styled("🔍 ", Style::default().fg(theme.faint)),
            Span::styled(
                if self.sheet.query.is_empty() {
                    "Search".to_string()
                } else {
                    format!("{}▌", self.sheet.query)
                },
                Style::default().fg(if self.sheet.query.is_empty() {
                    theme.faint
                } else {
                    theme.text
                }),
            ),
        ]);
        buf.set_line(inner.x, inner.y, &search, inner.width);

        let list_top = inner.y + 1;
        let rows = inner.height.saturating_sub(1) as usize;

        if self.entries.is_empty() {
            if rows > 0 {
                let empty = Line::from(Span::styled(
                    "No conversations",
                    Style::default().fg(theme.muted),
                ));
                buf.set_line(inner.x, list_top, &empty, inner.width);
            }
            return;
        }

        // Scroll so the selected row stays visible.
        let offset = (self.sheet.selected + 1).saturating_sub(rows);
        for (row, (index, conversation)) in self
            .entries
            .iter()
            .enumerate()
            .skip(offset)
            .take(rows)
            .enumerate()
        {
            let style = if index == self.sheet.selected {
                Style::default()
                    .fg(theme.highlight_fg)
                    .bg(theme.accent)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(theme.text)
            };
            let line = Line::from(vec![
                Span::styled(conversation.name.clone(), style),
                Span::styled(
                    format!("  {} messages  {}", conversation.len(), short_id(conversation.id)),
                    Style::default().fg(theme.faint),
                ),
            ]);
            buf.set_line(inner.x, list_top + row as u16, &line, inner.width);
        }
    }
}

/// First block of a conversation id, enough to type into /select
pub fn short_id(id: ConversationId) -> String {
    id.to_string().chars().take(8).collect()
}
