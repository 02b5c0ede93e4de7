//! Application state and command dispatch.

mod state;

pub use state::{DeferredTask, Focus, InputMode};

use std::collections::VecDeque;
use std::path::PathBuf;

use anyhow::Result;
use ratatui::layout::Rect;

use crate::commands::{self, Dispatch, JjCommand};
use crate::config::Config;
use crate::session::{SessionKind, SessionManager};
use crate::ui::layout::{create_layout, floating_rect};
use crate::ui::modal::{DescribeModalState, PromptModalState, PromptPurpose};
use crate::ui::toast::{ToastManager, ToastType};

/// The modal currently capturing input, if any.
pub enum ModalState {
    None,
    Describe(Box<DescribeModalState>),
    Prompt(Box<PromptModalState>),
}

impl ModalState {
    pub fn is_open(&self) -> bool {
        !matches!(self, ModalState::None)
    }
}

/// Top-level application state.
pub struct App {
    pub workspace_root: PathBuf,
    pub config: Config,
    pub sessions: SessionManager,
    pub focus: Focus,
    pub input_mode: InputMode,
    pub modal: ModalState,
    pub toasts: ToastManager,
    deferred: VecDeque<DeferredTask>,
    pub term_size: (u16, u16),
    pub should_quit: bool,
}

impl App {
    pub fn new(workspace_root: PathBuf) -> Result<Self> {
        let config = Config::load()?;
        Ok(Self::with_config(workspace_root, config))
    }

    pub fn with_config(workspace_root: PathBuf, config: Config) -> Self {
        Self {
            sessions: SessionManager::new(workspace_root.clone()),
            workspace_root,
            config,
            focus: Focus::Home,
            input_mode: InputMode::Normal,
            modal: ModalState::None,
            toasts: ToastManager::new(),
            deferred: VecDeque::new(),
            term_size: (80, 24),
            should_quit: false,
        }
    }

    /// Screen region a session of `kind` is presented in, matching what the
    /// draw pass computes from the same state.
    pub fn session_rect(&self, kind: SessionKind) -> Rect {
        let frame = Rect::new(0, 0, self.term_size.0, self.term_size.1);
        match kind {
            SessionKind::Split => {
                let (_, split, _) = create_layout(frame, true, self.config.layout.split_pct);
                split.unwrap_or(frame)
            }
            SessionKind::Floating => {
                let content = Rect::new(0, 0, frame.width, frame.height.saturating_sub(1));
                floating_rect(content, self.config.layout.floating_pct)
            }
        }
    }

    /// Interior dimensions (rows, cols) of the session region, inside its
    /// border.
    fn session_region_dims(&self, kind: SessionKind) -> (u16, u16) {
        let rect = self.session_rect(kind);
        (
            rect.height.saturating_sub(2).max(1),
            rect.width.saturating_sub(2).max(1),
        )
    }

    /// Execute a built jj command: silent ones run to completion and report
    /// through a toast, the rest stream into their session and take focus.
    pub fn dispatch(&mut self, command: &JjCommand) {
        match command.dispatch {
            Dispatch::Silent => {
                match commands::run_silent(command, &self.workspace_root) {
                    Ok(summary) => {
                        self.toasts.push(summary, ToastType::Success);
                        // The split session usually shows status or log; bring
                        // it up to date with whatever the command changed.
                        self.refresh_session(SessionKind::Split);
                    }
                    Err(e) => self.toasts.push(e.to_string(), ToastType::Error),
                }
            }
            Dispatch::Surface(kind) => {
                let (rows, cols) = self.session_region_dims(kind);
                let result = self.sessions.run(
                    &command.command_line(),
                    kind,
                    command.surface_bindings(),
                    rows,
                    cols,
                );
                match result {
                    Ok(()) => self.focus = Focus::Session(kind),
                    Err(e) => self.toasts.push(format!("{e:#}"), ToastType::Error),
                }
            }
        }
    }

    /// Re-run the session's last command. A session that never ran anything
    /// is left alone.
    pub fn refresh_session(&mut self, kind: SessionKind) {
        let (rows, cols) = self.session_region_dims(kind);
        if let Err(e) = self.sessions.refresh(kind, rows, cols) {
            self.toasts.push(format!("{e:#}"), ToastType::Error);
        }
    }

    /// Hide the session's surface; focus returns home.
    pub fn hide_session(&mut self, kind: SessionKind) {
        self.sessions.hide(kind);
        if self.focus == Focus::Session(kind) {
            self.focus = Focus::Home;
        }
    }

    /// Destroy the session entirely; focus returns home.
    pub fn close_session(&mut self, kind: SessionKind) {
        self.sessions.destroy(kind);
        if self.focus == Focus::Session(kind) {
            self.focus = Focus::Home;
        }
    }

    /// Copy text to the system clipboard.
    pub fn yank(&mut self, text: &str) {
        let copied = arboard::Clipboard::new().and_then(|mut cb| cb.set_text(text.to_string()));
        match copied {
            Ok(()) => self
                .toasts
                .push(format!("Copied \"{text}\""), ToastType::Success),
            Err(e) => self
                .toasts
                .push(format!("Clipboard error: {e}"), ToastType::Error),
        }
    }

    pub fn open_describe_modal(&mut self) {
        self.modal = ModalState::Describe(Box::new(DescribeModalState::new()));
        self.input_mode = InputMode::Insert;
    }

    pub fn open_prompt(&mut self, purpose: PromptPurpose) {
        self.modal = ModalState::Prompt(Box::new(PromptModalState::new(purpose)));
        self.input_mode = InputMode::Insert;
    }

    pub fn close_modal(&mut self) {
        self.modal = ModalState::None;
        self.input_mode = InputMode::Normal;
    }

    /// Turn exit notifications from the session manager into deferred tasks.
    pub fn collect_exit_events(&mut self) {
        for (kind, surface_id) in self.sessions.take_exit_events() {
            self.deferred
                .push_back(DeferredTask::ProcessExited { kind, surface_id });
        }
    }

    /// Execute tasks queued on a previous event-loop turn.
    pub fn drain_deferred(&mut self) {
        while let Some(task) = self.deferred.pop_front() {
            match task {
                DeferredTask::ProcessExited { kind, surface_id } => {
                    self.sessions.finish_process_exit(kind, surface_id);
                    if self.focus == Focus::Session(kind)
                        && !self.modal.is_open()
                        && self.input_mode == InputMode::Insert
                    {
                        self.input_mode = InputMode::Normal;
                    }
                }
            }
        }
    }

    /// Propagate a terminal resize to every live session.
    pub fn resize(&mut self, width: u16, height: u16) {
        self.term_size = (width, height);
        for kind in [SessionKind::Split, SessionKind::Floating] {
            if self.sessions.session(kind).surface.is_some() {
                let (rows, cols) = self.session_region_dims(kind);
                if let Err(e) = self.sessions.resize(kind, rows, cols) {
                    self.toasts.push(format!("{e:#}"), ToastType::Error);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> App {
        let mut app = App::with_config(std::env::temp_dir(), Config::default());
        app.term_size = (100, 40);
        app
    }

    #[test]
    fn surface_dispatch_takes_focus() {
        let mut app = app();
        // A plain shell command stands in for jj, which may be absent here.
        let (rows, cols) = app.session_region_dims(SessionKind::Split);
        app.sessions
            .run("true", SessionKind::Split, Vec::new(), rows, cols)
            .unwrap();
        app.focus = Focus::Session(SessionKind::Split);

        app.close_session(SessionKind::Split);
        assert_eq!(app.focus, Focus::Home);
        assert!(app.sessions.session(SessionKind::Split).is_idle());
    }

    #[test]
    fn process_exit_flows_through_the_deferred_queue() {
        let mut app = app();
        app.sessions
            .run("true", SessionKind::Floating, Vec::new(), 10, 40)
            .unwrap();

        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
        while app.sessions.session(SessionKind::Floating).process_running()
            && std::time::Instant::now() < deadline
        {
            std::thread::sleep(std::time::Duration::from_millis(10));
        }
        app.sessions.pump_output();
        app.collect_exit_events();
        app.drain_deferred();

        let surface = app
            .sessions
            .session(SessionKind::Floating)
            .surface
            .as_ref()
            .unwrap();
        assert!(surface.read_only);
        app.close_session(SessionKind::Floating);
    }

    #[test]
    fn modals_toggle_insert_mode() {
        let mut app = app();
        app.open_describe_modal();
        assert_eq!(app.input_mode, InputMode::Insert);
        assert!(app.modal.is_open());
        app.close_modal();
        assert_eq!(app.input_mode, InputMode::Normal);
        assert!(!app.modal.is_open());
    }

    #[test]
    fn session_rects_fit_inside_the_frame() {
        let app = app();
        let frame = Rect::new(0, 0, 100, 40);
        for kind in [SessionKind::Split, SessionKind::Floating] {
            let rect = app.session_rect(kind);
            assert!(rect.right() <= frame.right());
            assert!(rect.bottom() <= frame.bottom());
        }
    }
}
