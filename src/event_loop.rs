//! Main event loop and draw pass.

use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame, Terminal,
};

use crate::app::{App, Focus, InputMode, ModalState};
use crate::handlers::{handle_key_event, KeyAction};
use crate::session::{SessionKind, SurfaceBinding};
use crate::ui::layout::{create_layout, floating_rect};
use crate::ui::modal::{DescribeModal, PromptModal};
use crate::ui::session_pane::SessionPane;
use crate::ui::toast::render_toasts;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

pub fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    let size = terminal.size().context("Failed to query terminal size")?;
    app.resize(size.width, size.height);

    loop {
        // Tasks queued on the previous turn run before anything else.
        app.drain_deferred();
        app.sessions.pump_output();
        app.collect_exit_events();
        app.toasts.update();

        terminal.draw(|frame| draw_ui(frame, app))?;

        if event::poll(POLL_INTERVAL).context("Failed to poll for events")? {
            match event::read().context("Failed to read event")? {
                Event::Key(key) if key.kind != KeyEventKind::Release => {
                    if handle_key_event(app, key) == KeyAction::Quit {
                        app.should_quit = true;
                    }
                }
                Event::Resize(width, height) => app.resize(width, height),
                _ => {}
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn draw_ui(frame: &mut Frame, app: &App) {
    let area = frame.area();
    let split_visible = app.sessions.is_visible(SessionKind::Split);
    let (main_area, split_area, help_area) =
        create_layout(area, split_visible, app.config.layout.split_pct);

    draw_home(frame, main_area, app);

    if let Some(split_area) = split_area {
        frame.render_widget(
            SessionPane::new(
                app.sessions.session(SessionKind::Split),
                app.focus == Focus::Session(SessionKind::Split),
            ),
            split_area,
        );
    }

    if app.sessions.is_visible(SessionKind::Floating) {
        let content = Rect::new(area.x, area.y, area.width, area.height.saturating_sub(1));
        let float_area = floating_rect(content, app.config.layout.floating_pct);
        frame.render_widget(Clear, float_area);
        frame.render_widget(
            SessionPane::new(
                app.sessions.session(SessionKind::Floating),
                app.focus == Focus::Session(SessionKind::Floating),
            ),
            float_area,
        );
    }

    draw_help_bar(frame, help_area, app);
    render_toasts(frame, area, &app.toasts.visible_toasts());

    // Modals draw on top of everything.
    match &app.modal {
        ModalState::None => {}
        ModalState::Describe(state) => {
            frame.render_widget(
                DescribeModal::new(state),
                DescribeModal::calculate_area(area),
            );
        }
        ModalState::Prompt(state) => {
            frame.render_widget(PromptModal::new(state), PromptModal::calculate_area(area));
        }
    }
}

fn draw_home(frame: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .title(" jjtui ")
        .borders(Borders::ALL)
        .border_style(if app.focus == Focus::Home {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        });
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines = vec![
        Line::from(vec![
            Span::styled("workspace ", Style::default().fg(Color::DarkGray)),
            Span::raw(app.workspace_root.display().to_string()),
        ]),
        Line::default(),
        hint_line("s", "status"),
        hint_line("l", "log"),
        hint_line("L", "log revset"),
        hint_line("d", "diff"),
        hint_line("m", "describe"),
        hint_line("n", "new change"),
        hint_line("S", "squash"),
        hint_line("r", "rebase"),
        hint_line("b", "create bookmark"),
        hint_line("B", "delete bookmark"),
        hint_line("q", "quit"),
    ];

    frame.render_widget(Paragraph::new(lines), inner);
}

fn hint_line(key: &'static str, label: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(
            format!("  {key:>2} "),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(label),
    ])
}

fn draw_help_bar(frame: &mut Frame, area: Rect, app: &App) {
    let mode = match app.input_mode {
        InputMode::Normal => " NORMAL ",
        InputMode::Insert => " INSERT ",
    };
    let mut spans = vec![
        Span::styled(
            mode,
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
    ];

    match app.focus {
        Focus::Home => {
            spans.push(Span::styled(
                "Tab focus pane",
                Style::default().fg(Color::DarkGray),
            ));
        }
        Focus::Session(kind) => {
            spans.push(Span::styled(
                format!("{} | j/k move | q close | Esc hide", kind.label()),
                Style::default().fg(Color::DarkGray),
            ));
            if let Some(surface) = app.sessions.session(kind).surface.as_ref() {
                for binding in surface.keymaps.command_bindings() {
                    if binding.help.is_empty() {
                        continue;
                    }
                    spans.push(Span::raw(" | "));
                    spans.push(Span::styled(
                        key_label(binding),
                        Style::default().fg(Color::Cyan),
                    ));
                    spans.push(Span::raw(" "));
                    spans.push(Span::styled(
                        binding.help,
                        Style::default().fg(Color::DarkGray),
                    ));
                }
            }
        }
    }

    frame.render_widget(
        Paragraph::new(Line::from(spans)).alignment(Alignment::Left),
        area,
    );
}

fn key_label(binding: &SurfaceBinding) -> String {
    let base = match binding.key {
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Enter => "Enter".to_string(),
        KeyCode::Esc => "Esc".to_string(),
        KeyCode::Tab => "Tab".to_string(),
        other => format!("{other:?}"),
    };
    if binding.mods.contains(KeyModifiers::CONTROL) {
        format!("C-{base}")
    } else {
        base
    }
}
