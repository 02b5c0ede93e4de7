//! Multi-line editor for change descriptions.
//!
//! Opens pre-filled with comment-prefixed scaffolding lines; the scaffolding
//! is stripped again before the description is submitted.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget},
};

use super::char_to_byte;
use crate::commands::{description_scaffold, strip_description_scaffold};

/// Outcome of one key event in the describe editor.
pub enum DescribeKeyResult {
    /// Key was handled; keep editing.
    Consumed,
    /// User cancelled the edit.
    Cancel,
    /// User submitted; scaffolding already stripped.
    Submit(String),
}

/// State for the describe editor modal.
pub struct DescribeModalState {
    pub lines: Vec<String>,
    pub cursor_row: usize,
    pub cursor_col: usize,
    pub error_message: Option<String>,
}

impl DescribeModalState {
    /// Fresh editor with scaffolding, cursor on the first (empty) line.
    pub fn new() -> Self {
        Self {
            lines: description_scaffold(),
            cursor_row: 0,
            cursor_col: 0,
            error_message: None,
        }
    }

    /// Handle key input for the editor. Ctrl-s submits, Esc cancels.
    pub fn handle_key(&mut self, key: KeyEvent) -> DescribeKeyResult {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('s') {
            let description = strip_description_scaffold(&self.lines);
            if description.is_empty() {
                self.error_message = Some("Description is empty".to_string());
                return DescribeKeyResult::Consumed;
            }
            return DescribeKeyResult::Submit(description);
        }

        match key.code {
            KeyCode::Esc => return DescribeKeyResult::Cancel,
            KeyCode::Char(c) => {
                let line = &mut self.lines[self.cursor_row];
                let byte_pos = char_to_byte(line, self.cursor_col);
                line.insert(byte_pos, c);
                self.cursor_col += 1;
                self.error_message = None;
            }
            KeyCode::Enter => {
                let line = &mut self.lines[self.cursor_row];
                let byte_pos = char_to_byte(line, self.cursor_col);
                let rest = line.split_off(byte_pos);
                self.lines.insert(self.cursor_row + 1, rest);
                self.cursor_row += 1;
                self.cursor_col = 0;
            }
            KeyCode::Backspace => {
                if self.cursor_col > 0 {
                    self.cursor_col -= 1;
                    let line = &mut self.lines[self.cursor_row];
                    let byte_pos = char_to_byte(line, self.cursor_col);
                    line.remove(byte_pos);
                } else if self.cursor_row > 0 {
                    // Join with the previous line.
                    let removed = self.lines.remove(self.cursor_row);
                    self.cursor_row -= 1;
                    self.cursor_col = self.lines[self.cursor_row].chars().count();
                    self.lines[self.cursor_row].push_str(&removed);
                }
            }
            KeyCode::Left => {
                if self.cursor_col > 0 {
                    self.cursor_col -= 1;
                }
            }
            KeyCode::Right => {
                let len = self.lines[self.cursor_row].chars().count();
                if self.cursor_col < len {
                    self.cursor_col += 1;
                }
            }
            KeyCode::Up => {
                if self.cursor_row > 0 {
                    self.cursor_row -= 1;
                    self.clamp_col();
                }
            }
            KeyCode::Down => {
                if self.cursor_row + 1 < self.lines.len() {
                    self.cursor_row += 1;
                    self.clamp_col();
                }
            }
            KeyCode::Home => self.cursor_col = 0,
            KeyCode::End => self.cursor_col = self.lines[self.cursor_row].chars().count(),
            _ => {}
        }
        DescribeKeyResult::Consumed
    }

    fn clamp_col(&mut self) {
        let len = self.lines[self.cursor_row].chars().count();
        self.cursor_col = self.cursor_col.min(len);
    }
}

impl Default for DescribeModalState {
    fn default() -> Self {
        Self::new()
    }
}

/// Widget for rendering the describe editor.
pub struct DescribeModal<'a> {
    state: &'a DescribeModalState,
}

impl<'a> DescribeModal<'a> {
    pub fn new(state: &'a DescribeModalState) -> Self {
        Self { state }
    }

    /// Calculate the modal area (centered, 60% width, 50% height)
    pub fn calculate_area(total: Rect) -> Rect {
        // Widened multiply: u16 arithmetic overflows on wide terminals.
        let width = ((u32::from(total.width) * 60 / 100) as u16)
            .max(40)
            .min(total.width.saturating_sub(4));
        let height = ((u32::from(total.height) * 50 / 100) as u16)
            .max(10)
            .min(total.height.saturating_sub(4));

        let x = (total.width.saturating_sub(width)) / 2;
        let y = (total.height.saturating_sub(height)) / 2;

        Rect::new(x, y, width, height)
    }
}

impl Widget for DescribeModal<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width < 30 || area.height < 6 {
            return;
        }

        Clear.render(area, buf);

        let block = Block::default()
            .title(" Describe Change ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));

        let inner = block.inner(area);
        block.render(area, buf);

        let chunks = Layout::vertical([
            Constraint::Min(1),    // Editor
            Constraint::Length(1), // Error message
            Constraint::Length(1), // Help bar
        ])
        .split(inner);

        self.render_lines(chunks[0], buf);

        if let Some(ref error) = self.state.error_message {
            Paragraph::new(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )))
            .render(chunks[1], buf);
        }

        let help = Paragraph::new(Line::from(vec![
            Span::styled(" C-s ", Style::default().fg(Color::Cyan)),
            Span::raw("submit "),
            Span::styled(" Esc ", Style::default().fg(Color::Cyan)),
            Span::raw("cancel"),
        ]))
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
        help.render(chunks[2], buf);
    }
}

impl DescribeModal<'_> {
    fn render_lines(&self, area: Rect, buf: &mut Buffer) {
        for (row, line) in self.state.lines.iter().enumerate() {
            if row as u16 >= area.height {
                break;
            }
            let y = area.y + row as u16;

            let style = if line.trim_start().starts_with(crate::commands::DESCRIPTION_COMMENT_PREFIX)
            {
                Style::default().fg(Color::DarkGray)
            } else {
                Style::default()
            };
            buf.set_string(area.x, y, line, style);

            if row == self.state.cursor_row {
                let x = area.x + self.state.cursor_col.min(area.width as usize - 1) as u16;
                if let Some(cell) = buf.cell_mut((x, y)) {
                    cell.set_style(
                        Style::default()
                            .bg(Color::White)
                            .fg(Color::Black)
                            .add_modifier(Modifier::BOLD),
                    );
                }
            }
        }
    }
}
