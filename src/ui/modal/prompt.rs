//! Single-line input prompts (bookmark names, revsets).

use crossterm::event::{KeyCode, KeyEvent};

use super::char_to_byte;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget},
};

/// What the prompted value will be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptPurpose {
    BookmarkCreate,
    BookmarkDelete,
    RebaseDestination,
    LogRevset,
}

impl PromptPurpose {
    pub fn title(&self) -> &'static str {
        match self {
            PromptPurpose::BookmarkCreate => " Create Bookmark ",
            PromptPurpose::BookmarkDelete => " Delete Bookmark ",
            PromptPurpose::RebaseDestination => " Rebase Onto ",
            PromptPurpose::LogRevset => " Log Revset ",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            PromptPurpose::BookmarkCreate | PromptPurpose::BookmarkDelete => " Bookmark name ",
            PromptPurpose::RebaseDestination => " Destination revision ",
            PromptPurpose::LogRevset => " Revset ",
        }
    }
}

/// State for a single-line prompt modal.
pub struct PromptModalState {
    pub purpose: PromptPurpose,
    pub input: String,
    pub cursor_pos: usize,
    pub error_message: Option<String>,
}

impl PromptModalState {
    pub fn new(purpose: PromptPurpose) -> Self {
        Self {
            purpose,
            input: String::new(),
            cursor_pos: 0,
            error_message: None,
        }
    }

    /// Handle key input for the prompt.
    /// Returns Some(value) when the user confirms a non-empty value.
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<String> {
        match key.code {
            KeyCode::Enter => {
                let value = self.input.trim().to_string();
                if value.is_empty() {
                    self.error_message = Some("Value cannot be empty".to_string());
                    return None;
                }
                return Some(value);
            }
            KeyCode::Char(c) => {
                let byte_pos = char_to_byte(&self.input, self.cursor_pos);
                self.input.insert(byte_pos, c);
                self.cursor_pos += 1;
                self.error_message = None;
            }
            KeyCode::Backspace => {
                if self.cursor_pos > 0 {
                    self.cursor_pos -= 1;
                    let byte_pos = char_to_byte(&self.input, self.cursor_pos);
                    self.input.remove(byte_pos);
                }
            }
            KeyCode::Delete => {
                if self.cursor_pos < self.input.chars().count() {
                    let byte_pos = char_to_byte(&self.input, self.cursor_pos);
                    self.input.remove(byte_pos);
                }
            }
            KeyCode::Left => {
                if self.cursor_pos > 0 {
                    self.cursor_pos -= 1;
                }
            }
            KeyCode::Right => {
                if self.cursor_pos < self.input.chars().count() {
                    self.cursor_pos += 1;
                }
            }
            KeyCode::Home => self.cursor_pos = 0,
            KeyCode::End => self.cursor_pos = self.input.chars().count(),
            _ => {}
        }
        None
    }
}

/// Widget for rendering a prompt modal.
pub struct PromptModal<'a> {
    state: &'a PromptModalState,
}

impl<'a> PromptModal<'a> {
    pub fn new(state: &'a PromptModalState) -> Self {
        Self { state }
    }

    /// Calculate the modal area (centered, 50% width, fixed height)
    pub fn calculate_area(total: Rect) -> Rect {
        // Widened multiply: u16 arithmetic overflows on wide terminals.
        let width = ((u32::from(total.width) * 50 / 100) as u16)
            .max(40)
            .min(total.width.saturating_sub(4));
        let height = 8u16.min(total.height.saturating_sub(4));

        let x = (total.width.saturating_sub(width)) / 2;
        let y = (total.height.saturating_sub(height)) / 2;

        Rect::new(x, y, width, height)
    }
}

impl Widget for PromptModal<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width < 30 || area.height < 6 {
            return;
        }

        Clear.render(area, buf);

        let block = Block::default()
            .title(self.state.purpose.title())
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));

        let inner = block.inner(area);
        block.render(area, buf);

        let chunks = Layout::vertical([
            Constraint::Length(3), // Input field
            Constraint::Length(1), // Error message
            Constraint::Min(0),    // Spacer
            Constraint::Length(1), // Help bar
        ])
        .split(inner);

        let input_block = Block::default()
            .title(self.state.purpose.label())
            .borders(Borders::ALL)
            .border_style(if self.state.error_message.is_some() {
                Style::default().fg(Color::Red)
            } else {
                Style::default().fg(Color::Yellow)
            });
        let input_inner = input_block.inner(chunks[0]);
        input_block.render(chunks[0], buf);
        self.render_input_text(input_inner, buf);

        if let Some(ref error) = self.state.error_message {
            Paragraph::new(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )))
            .render(chunks[1], buf);
        }

        let help = Paragraph::new(Line::from(vec![
            Span::styled(" Enter ", Style::default().fg(Color::Cyan)),
            Span::raw("confirm "),
            Span::styled(" Esc ", Style::default().fg(Color::Cyan)),
            Span::raw("cancel"),
        ]))
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
        help.render(chunks[3], buf);
    }
}

impl PromptModal<'_> {
    fn render_input_text(&self, area: Rect, buf: &mut Buffer) {
        let display_text = &self.state.input;
        let cursor_pos = self.state.cursor_pos;

        let mut spans = Vec::new();
        for (i, c) in display_text.chars().enumerate() {
            if i == cursor_pos {
                spans.push(Span::styled(
                    c.to_string(),
                    Style::default()
                        .bg(Color::White)
                        .fg(Color::Black)
                        .add_modifier(Modifier::BOLD),
                ));
            } else {
                spans.push(Span::raw(c.to_string()));
            }
        }
        if cursor_pos >= display_text.chars().count() {
            spans.push(Span::styled(" ", Style::default().bg(Color::White)));
        }

        Paragraph::new(Line::from(spans)).render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(state: &mut PromptModalState, text: &str) {
        for c in text.chars() {
            state.handle_key(key(KeyCode::Char(c)));
        }
    }

    #[test]
    fn enter_confirms_a_trimmed_value() {
        let mut state = PromptModalState::new(PromptPurpose::BookmarkCreate);
        type_text(&mut state, "  feature-x ");
        assert_eq!(
            state.handle_key(key(KeyCode::Enter)),
            Some("feature-x".to_string())
        );
    }

    #[test]
    fn empty_value_is_rejected_with_an_error() {
        let mut state = PromptModalState::new(PromptPurpose::RebaseDestination);
        assert_eq!(state.handle_key(key(KeyCode::Enter)), None);
        assert!(state.error_message.is_some());
    }

    #[test]
    fn multibyte_characters_edit_cleanly() {
        let mut state = PromptModalState::new(PromptPurpose::BookmarkCreate);
        type_text(&mut state, "éx");
        assert_eq!(state.input, "éx");
        assert_eq!(state.cursor_pos, 2);

        state.handle_key(key(KeyCode::Backspace));
        assert_eq!(state.input, "é");
        state.handle_key(key(KeyCode::Home));
        state.handle_key(key(KeyCode::Delete));
        assert_eq!(state.input, "");
    }

    #[test]
    fn cursor_bounds_count_characters_not_bytes() {
        let mut state = PromptModalState::new(PromptPurpose::LogRevset);
        type_text(&mut state, "日本語");
        state.handle_key(key(KeyCode::Right));
        assert_eq!(state.cursor_pos, 3);
        state.handle_key(key(KeyCode::Home));
        type_text(&mut state, "r:");
        assert_eq!(
            state.handle_key(key(KeyCode::Enter)),
            Some("r:日本語".to_string())
        );
    }

    #[test]
    fn area_stays_sane_on_very_wide_frames() {
        let rect = PromptModal::calculate_area(Rect::new(0, 0, 1200, 50));
        assert_eq!(rect.width, 600);
        assert_eq!(rect.x, 300);
    }

    #[test]
    fn backspace_edits_at_the_cursor() {
        let mut state = PromptModalState::new(PromptPurpose::LogRevset);
        type_text(&mut state, "main");
        state.handle_key(key(KeyCode::Backspace));
        assert_eq!(state.input, "mai");
        state.handle_key(key(KeyCode::Home));
        state.handle_key(key(KeyCode::Delete));
        assert_eq!(state.input, "ai");
    }
}
