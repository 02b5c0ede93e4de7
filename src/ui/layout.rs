//! Pane layout helpers.

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Split the frame into home area, optional split-session area and the
/// one-line help bar at the bottom.
pub fn create_layout(area: Rect, split_visible: bool, split_pct: u8) -> (Rect, Option<Rect>, Rect) {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(area);

    let main_area = vertical[0];
    let help_area = vertical[1];

    if !split_visible {
        return (main_area, None, help_area);
    }

    let split_pct = u16::from(split_pct.clamp(1, 99));
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(100 - split_pct),
            Constraint::Percentage(split_pct),
        ])
        .split(main_area);

    (chunks[0], Some(chunks[1]), help_area)
}

/// Centered overlay region taking `pct` percent of the frame's width and
/// height.
pub fn floating_rect(area: Rect, pct: u8) -> Rect {
    // Widened multiply: u16 arithmetic overflows once width * pct exceeds
    // u16::MAX, reachable on wide terminals.
    let pct = u32::from(pct.clamp(1, 100));
    let width = ((u32::from(area.width) * pct / 100) as u16).max(1);
    let height = ((u32::from(area.height) * pct / 100) as u16).max(1);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}
