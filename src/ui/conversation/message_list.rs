//! Message list for the current conversation

use crate::conversation::{Conversation, Message};
use crate::events::ConversationRole;
use crate::ui::theme::Theme;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

/// Renders the messages of one conversation, newest at the bottom
pub struct MessageList<'a> {
    conversation: &'a Conversation,
    show_timestamps: bool,
    theme: Theme,
}

impl<'a> MessageList<'a> {
    pub fn new(conversation: &'a Conversation) -> Self {
        Self {
            conversation,
            show_timestamps: true,
            theme: Theme::default(),
        }
    }

    pub fn show_timestamps(mut self, show: bool) -> Self {
        self.show_timestamps = show;
        self
    }

    pub fn theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    /// Render a single message into lines
    fn render_message(&self, message: &Message, width: u16) -> Vec<Line<'static>> {
        let mut lines = Vec::new();

        let mut header = format!("{} {}", message.role.icon(), message.role.display_name());
        if self.show_timestamps {
            let local = message.created_at.with_timezone(&chrono::Local);
            header.push(' ');
            header.push_str(&local.format("%H:%M:%S").to_string());
        }
        lines.push(Line::from(vec![Span::styled(
            header,
            Style::default().fg(self.theme.faint),
        )]));

        for content_line in wrap_text(&message.content, width.saturating_sub(2) as usize) {
            lines.push(Line::from(vec![
                Span::raw("  "),
                Span::styled(content_line, content_style(message.role, &self.theme)),
            ]));
        }

        lines
    }
}

impl Widget for MessageList<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let area = area.intersection(buf.area);
        if area.is_empty() {
            return;
        }

        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!("💬 {}", self.conversation.name));

        let inner_area = block.inner(area);
        block.render(area, buf);
        if inner_area.is_empty() {
            return;
        }

        if self.conversation.is_empty() {
            let welcome_lines = vec![
                Line::from(vec![Span::styled("Welcome to OpenChat!", Style::default().fg(self.theme.assistant))]),
                Line::from(vec![Span::raw("")]),
                Line::from(vec![Span::styled(
                    "Type a message below and press Enter to send.",
                    Style::default().fg(self.theme.muted),
                )]),
                Line::from(vec![Span::styled(
                    "Shift+Enter for a new line, /help for commands.",
                    Style::default().fg(self.theme.faint),
                )]),
            ];

            for (i, line) in welcome_lines.iter().take(inner_area.height as usize).enumerate() {
                buf.set_line(inner_area.x, inner_area.y + i as u16, line, inner_area.width);
            }
            return;
        }

        let mut all_lines: Vec<Line> = Vec::new();
        for message in self.conversation.messages() {
            all_lines.extend(self.render_message(message, inner_area.width));
            all_lines.push(Line::from(vec![Span::raw("")]));
        }
        // No spacer after the last message.
        all_lines.pop();

        let height = inner_area.height as usize;
        let start = all_lines.len().saturating_sub(height);
        for (i, line) in all_lines[start..].iter().enumerate() {
            buf.set_line(inner_area.x, inner_area.y + i as u16, line, inner_area.width);
        }
    }
}

/// Wrap text to fit within the given width, keeping explicit line breaks
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut current_line = String::new();
        let mut current_width = 0;

        for word in paragraph.split_whitespace() {
            let word_width = word.chars().count();
            if current_width > 0 && current_width + word_width + 1 > width {
                lines.push(std::mem::take(&mut current_line));
                current_width = 0;
            }
            if current_width > 0 {
                current_line.push(' ');
                current_width += 1;
            }
            current_line.push_str(word);
            current_width += word_width;
        }

        lines.push(current_line);
    }

    lines
}

fn content_style(role: ConversationRole, theme: &Theme) -> Style {
    match role {
        ConversationRole::User => Style::default().fg(theme.user),
        ConversationRole::Assistant => Style::default().fg(theme.assistant),
        ConversationRole::System => Style::default().fg(theme.system),
    }
}
