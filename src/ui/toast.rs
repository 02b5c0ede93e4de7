//! Toast notifications.
//!
//! Every recoverable error and every silent-command result surfaces here as a
//! single user-visible notification.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastType {
    Info,    // Blue
    Success, // Green
    Warning, // Yellow
    Error,   // Red
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub message: String,
    pub toast_type: ToastType,
    pub created_at: Instant,
    pub duration: Duration,
}

impl Toast {
    pub fn new(message: impl Into<String>, toast_type: ToastType) -> Self {
        Self {
            message: message.into(),
            toast_type,
            created_at: Instant::now(),
            duration: Duration::from_secs(3),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.created_at.elapsed() >= self.duration
    }
}

pub struct ToastManager {
    queue: VecDeque<Toast>,
    max_visible: usize,
}

impl ToastManager {
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
            max_visible: 5,
        }
    }

    pub fn push(&mut self, message: impl Into<String>, toast_type: ToastType) {
        self.queue.push_back(Toast::new(message, toast_type));
        while self.queue.len() > self.max_visible {
            self.queue.pop_front();
        }
    }

    /// Remove expired toasts.
    pub fn update(&mut self) {
        self.queue.retain(|t| !t.is_expired());
    }

    pub fn visible_toasts(&self) -> Vec<&Toast> {
        self.queue.iter().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl Default for ToastManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Render toasts stacked in the bottom-right corner of `area`.
pub fn render_toasts(frame: &mut Frame, area: Rect, toasts: &[&Toast]) {
    let toast_width = 40u16;
    let toast_height = 3u16;
    let gap = 1u16;

    for (idx, toast) in toasts.iter().enumerate() {
        let offset = idx as u16 * (toast_height + gap);
        let x = area.right().saturating_sub(toast_width + 2);
        let y = area.bottom().saturating_sub(toast_height + 2 + offset);
        let toast_area = Rect::new(
            x,
            y,
            toast_width.min(area.width),
            toast_height.min(area.height),
        );

        frame.render_widget(Clear, toast_area);

        let accent = accent_style(toast.toast_type);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(accent)
            .style(Style::default().bg(Color::Black));

        let text = Paragraph::new(Line::from(vec![
            Span::styled(icon(toast.toast_type), accent.add_modifier(Modifier::BOLD)),
            Span::raw(" "),
            Span::raw(toast.message.clone()),
        ]))
        .block(block)
        .alignment(Alignment::Left);

        frame.render_widget(text, toast_area);
    }
}

fn icon(toast_type: ToastType) -> &'static str {
    match toast_type {
        ToastType::Info => "ℹ",
        ToastType::Success => "✓",
        ToastType::Warning => "⚠",
        ToastType::Error => "✗",
    }
}

fn accent_style(toast_type: ToastType) -> Style {
    let color = match toast_type {
        ToastType::Info => Color::Cyan,
        ToastType::Success => Color::Green,
        ToastType::Warning => Color::Yellow,
        ToastType::Error => Color::Red,
    };
    Style::default().fg(color)
}
