//! Conversation transcript

use crate::events::Role;
use crate::reveal::Reveal;
use crate::ui::markup::{escape_markup, render_markup};
use chrono::{DateTime, Local};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

/// A single rendered turn in the transcript
#[derive(Debug, Clone)]
pub struct ChatTurn {
    role: Role,
    text: String,
    metadata: Option<String>,
    reveal: Option<Reveal>,
    timestamp: DateTime<Local>,
}

impl ChatTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text.into(), None, false)
    }

    /// Bot turn; `typing` reveals the text progressively.
    pub fn bot(text: impl Into<String>, metadata: Option<String>, typing: bool) -> Self {
        Self::new(Role::Bot, text.into(), metadata, typing)
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new(Role::System, text.into(), None, false)
    }

    fn new(role: Role, text: String, metadata: Option<String>, typing: bool) -> Self {
        let reveal = typing.then(|| Reveal::new(text.clone()));
        Self {
            role,
            text,
            metadata,
            reveal,
            timestamp: Local::now(),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Full primary text, unescaped
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Metadata line, plain text
    pub fn metadata(&self) -> Option<&str> {
        self.metadata.as_deref()
    }

    pub fn is_typing(&self) -> bool {
        self.reveal.as_ref().is_some_and(Reveal::is_running)
    }

    /// Primary text as currently on display
    pub fn displayed_text(&self) -> &str {
        match &self.reveal {
            Some(reveal) => reveal.current(),
            None => &self.text,
        }
    }

    /// Display text escaped for insertion as markup
    pub fn markup(&self) -> String {
        escape_markup(self.displayed_text())
    }

    /// Advance the reveal by one tick; true if the display changed
    fn tick(&mut self) -> bool {
        self.reveal
            .as_mut()
            .is_some_and(|reveal| reveal.next_frame().is_some())
    }
}

/// Append-only transcript of the conversation
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    turns: Vec<ChatTurn>,
    /// Lines scrolled up from the newest line
    scroll_offset: usize,
    show_timestamps: bool,
}

impl Transcript {
    pub fn new(show_timestamps: bool) -> Self {
        Self {
            turns: Vec::new(),
            scroll_offset: 0,
            show_timestamps,
        }
    }

    /// Append a turn and jump to it
    pub fn append(&mut self, turn: ChatTurn) {
        self.turns.push(turn);
        self.scroll_to_bottom();
    }

    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    pub fn last(&self) -> Option<&ChatTurn> {
        self.turns.last()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn count_role(&self, role: Role) -> usize {
        self.turns.iter().filter(|turn| turn.role == role).count()
    }

    /// Advance every running reveal by one frame. Returns true if anything
    /// on screen changed.
    pub fn tick(&mut self) -> bool {
        let mut changed = false;
        for turn in &mut self.turns {
            changed |= turn.tick();
        }
        changed
    }

    pub fn is_animating(&self) -> bool {
        self.turns.iter().any(ChatTurn::is_typing)
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.scroll_offset = self.scroll_offset.saturating_add(lines);
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(lines);
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll_offset = 0;
    }

    pub fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    /// Lay out every turn for the given width
    pub fn lines(&self, width: u16) -> Vec<Line<'static>> {
        let mut lines = Vec::new();
        for turn in &self.turns {
            self.push_turn_lines(turn, width, &mut lines);
            lines.push(Line::from(""));
        }
        lines
    }

    fn push_turn_lines(&self, turn: &ChatTurn, width: u16, lines: &mut Vec<Line<'static>>) {
        let header = if self.show_timestamps {
            format!(
                "{} {} {}",
                turn.role.icon(),
                turn.timestamp.format("%H:%M:%S"),
                "─".repeat(20)
            )
        } else {
            format!("{} {}", turn.role.icon(), "─".repeat(20))
        };
        lines.push(Line::from(Span::styled(
            header,
            Style::default().fg(Color::DarkGray),
        )));

        let content = render_markup(&turn.markup());
        for content_line in wrap_text(&content, width.saturating_sub(2) as usize) {
            lines.push(Line::from(vec![
                Span::raw("  "),
                Span::styled(content_line, content_style(turn.role)),
            ]));
        }

        if let Some(metadata) = &turn.metadata {
            lines.push(Line::from(vec![
                Span::raw("  "),
                Span::styled(
                    metadata.clone(),
                    Style::default()
                        .fg(Color::Gray)
                        .add_modifier(Modifier::ITALIC),
                ),
            ]));
        }
    }
}

fn content_style(role: Role) -> Style {
    match role {
        Role::User => Style::default().fg(Color::Blue),
        Role::Bot => Style::default().fg(Color::Green),
        Role::System => Style::default().fg(Color::Yellow),
    }
}

/// Word-wrap text to `width` columns, keeping explicit line breaks
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut current = String::new();
        let mut current_width = 0;

        for word in paragraph.split_whitespace() {
            let word_width = word.chars().count();
            if current_width > 0 && current_width + 1 + word_width > width {
                lines.push(std::mem::take(&mut current));
                current_width = 0;
            }
            if current_width > 0 {
                current.push(' ');
                current_width += 1;
            }
            current.push_str(word);
            current_width += word_width;
        }

        lines.push(current);
    }

    lines
}

impl Widget for &Transcript {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title("💬 Conversation");

        let inner = block.inner(area);
        block.render(area, buf);

        if self.turns.is_empty() {
            let welcome = [
                Line::from(Span::styled(
                    "Hi, I'm here to listen. 🌱",
                    Style::default().fg(Color::Green),
                )),
                Line::from(""),
                Line::from(Span::styled(
                    "Tell me how you're feeling below.",
                    Style::default().fg(Color::Gray),
                )),
                Line::from(Span::styled(
                    "Enter sends, / opens commands, F2 dictates.",
                    Style::default().fg(Color::DarkGray),
                )),
            ];
            for (i, line) in welcome.iter().enumerate().take(inner.height as usize) {
                buf.set_line(inner.x, inner.y + i as u16, line, inner.width);
            }
            return;
        }

        let all_lines = self.lines(inner.width);
        let height = inner.height as usize;
        let max_offset = all_lines.len().saturating_sub(height);
        let end = all_lines.len() - self.scroll_offset.min(max_offset);
        let start = end.saturating_sub(height);

        for (i, line) in all_lines[start..end].iter().enumerate() {
            buf.set_line(inner.x, inner.y + i as u16, line, inner.width);
        }
    }
}
