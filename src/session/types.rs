//! Session kinds and helpers for rendering vt100 screen content.

use ratatui::style::{Color, Modifier, Style};

/// Which presentation region a session renders into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionKind {
    /// Split region alongside the home pane.
    Split,
    /// Centered overlay on top of everything else.
    Floating,
}

impl SessionKind {
    /// Label shown in the surface title.
    pub fn label(&self) -> &'static str {
        match self {
            SessionKind::Split => "split",
            SessionKind::Floating => "floating",
        }
    }
}

/// Convert a vt100 color to a ratatui color.
pub fn color_from_vt100(color: vt100::Color) -> Color {
    match color {
        vt100::Color::Default => Color::Reset,
        vt100::Color::Idx(idx) => Color::Indexed(idx),
        vt100::Color::Rgb(r, g, b) => Color::Rgb(r, g, b),
    }
}

/// Convert one vt100 cell's colors and attributes to a ratatui style.
pub fn style_from_vt100_cell(cell: &vt100::Cell) -> Style {
    let mut style = Style::default()
        .fg(color_from_vt100(cell.fgcolor()))
        .bg(color_from_vt100(cell.bgcolor()));

    if cell.bold() {
        style = style.add_modifier(Modifier::BOLD);
    }
    if cell.italic() {
        style = style.add_modifier(Modifier::ITALIC);
    }
    if cell.underline() {
        style = style.add_modifier(Modifier::UNDERLINED);
    }
    if cell.inverse() {
        style = style.add_modifier(Modifier::REVERSED);
    }

    style
}

/// Plain text of one screen row, with trailing whitespace removed.
///
/// This is the text the line parsers see when the user triggers a
/// line-oriented binding.
pub fn row_text(screen: &vt100::Screen, row: u16) -> String {
    let (_, cols) = screen.size();
    let mut text = String::new();
    for col in 0..cols {
        if let Some(cell) = screen.cell(row, col) {
            text.push_str(&cell.contents());
        }
    }
    text.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_text_reads_processed_output() {
        let mut parser = vt100::Parser::new(5, 40, 0);
        parser.process(b"M src/lib.rs\r\nA docs/readme.md");
        assert_eq!(row_text(parser.screen(), 0), "M src/lib.rs");
        assert_eq!(row_text(parser.screen(), 1), "A docs/readme.md");
    }

    #[test]
    fn row_text_is_empty_for_untouched_rows() {
        let parser = vt100::Parser::new(3, 20, 0);
        assert_eq!(row_text(parser.screen(), 0), "");
        assert_eq!(row_text(parser.screen(), 2), "");
    }

    #[test]
    fn row_text_preserves_multibyte_glyphs() {
        let mut parser = vt100::Parser::new(3, 40, 0);
        parser.process("◆ a1b2c3 description".as_bytes());
        assert_eq!(row_text(parser.screen(), 0), "◆ a1b2c3 description");
    }
}
