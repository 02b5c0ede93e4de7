//! Session pane widget rendering a session's vt100 screen.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Widget},
};

use crate::session::{style_from_vt100_cell, Session};

/// Widget displaying one terminal session.
pub struct SessionPane<'a> {
    session: &'a Session,
    focused: bool,
}

impl<'a> SessionPane<'a> {
    pub fn new(session: &'a Session, focused: bool) -> Self {
        Self { session, focused }
    }

    fn title(&self) -> String {
        let command = self.session.last_command.as_deref().unwrap_or("idle");
        let done = self
            .session
            .surface
            .as_ref()
            .is_some_and(|s| s.read_only);
        if done {
            format!(" {command} [done] ")
        } else {
            format!(" {command} ")
        }
    }
}

impl Widget for SessionPane<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border_style = if self.focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        let block = Block::default()
            .title(self.title())
            .borders(Borders::ALL)
            .border_style(border_style);

        let inner = block.inner(area);
        block.render(area, buf);

        let Some(screen) = self.session.screen() else {
            let placeholder = "no command has run here yet";
            let x = inner.x + (inner.width.saturating_sub(placeholder.len() as u16)) / 2;
            let y = inner.y + inner.height / 2;
            if y < inner.y + inner.height && x < inner.x + inner.width {
                buf.set_string(x, y, placeholder, Style::default().fg(Color::DarkGray));
            }
            return;
        };

        let cursor_row = self
            .session
            .surface
            .as_ref()
            .map(|s| s.cursor_row)
            .unwrap_or(0);
        let (rows, cols) = screen.size();

        for row in 0..rows.min(inner.height) {
            let y = inner.y + row;
            let on_cursor_row = self.focused && row == cursor_row;

            for col in 0..cols.min(inner.width) {
                let x = inner.x + col;
                let Some(cell) = screen.cell(row, col) else {
                    continue;
                };

                let mut style = style_from_vt100_cell(cell);
                if on_cursor_row {
                    style = style.add_modifier(Modifier::REVERSED);
                }

                let contents = cell.contents();
                if contents.is_empty() {
                    if on_cursor_row {
                        if let Some(buf_cell) = buf.cell_mut((x, y)) {
                            buf_cell.set_char(' ');
                            buf_cell.set_style(style);
                        }
                    }
                } else {
                    buf.set_string(x, y, &contents, style);
                }
            }
        }
    }
}
