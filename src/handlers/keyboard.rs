//! Keyboard routing.
//!
//! Modals capture input first. Otherwise keys are routed by focus: the home
//! view dispatches jj subcommands, a focused session resolves keys through
//! the keymaps installed on its surface. Line-oriented session bindings parse
//! the line under the cursor on demand; a line that does not parse makes the
//! key a silent no-op.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{App, Focus, ModalState};
use crate::commands::{self, LogOptions};
use crate::parser::{parse_file_change, parse_revision};
use crate::session::{BindingAction, SessionKind};
use crate::ui::modal::{DescribeKeyResult, PromptPurpose};

/// What the event loop should do after a key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Continue,
    Quit,
}

pub fn handle_key_event(app: &mut App, key: KeyEvent) -> KeyAction {
    if handle_modal_key(app, key) {
        return KeyAction::Continue;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('q') {
        return KeyAction::Quit;
    }

    match app.focus {
        Focus::Home => handle_home_key(app, key),
        Focus::Session(kind) => {
            handle_session_key(app, kind, key);
            KeyAction::Continue
        }
    }
}

/// Route a key into the open modal. Returns false when no modal is open.
fn handle_modal_key(app: &mut App, key: KeyEvent) -> bool {
    match std::mem::replace(&mut app.modal, ModalState::None) {
        ModalState::None => false,
        ModalState::Describe(mut state) => {
            match state.handle_key(key) {
                DescribeKeyResult::Consumed => app.modal = ModalState::Describe(state),
                DescribeKeyResult::Cancel => app.close_modal(),
                DescribeKeyResult::Submit(description) => {
                    app.close_modal();
                    app.dispatch(&commands::describe(&description));
                }
            }
            true
        }
        ModalState::Prompt(mut state) => {
            if key.code == KeyCode::Esc {
                app.close_modal();
                return true;
            }
            let purpose = state.purpose;
            match state.handle_key(key) {
                Some(value) => {
                    app.close_modal();
                    submit_prompt(app, purpose, &value);
                }
                None => app.modal = ModalState::Prompt(state),
            }
            true
        }
    }
}

fn submit_prompt(app: &mut App, purpose: PromptPurpose, value: &str) {
    match purpose {
        PromptPurpose::BookmarkCreate => app.dispatch(&commands::bookmark_create(value)),
        PromptPurpose::BookmarkDelete => app.dispatch(&commands::bookmark_delete(value)),
        PromptPurpose::RebaseDestination => app.dispatch(&commands::rebase_destination(value)),
        PromptPurpose::LogRevset => {
            let opts = LogOptions {
                limit: Some(app.config.log_limit),
                revset: Some(value.to_string()),
                ..LogOptions::default()
            };
            app.dispatch(&commands::log(&opts));
        }
    }
}

fn handle_home_key(app: &mut App, key: KeyEvent) -> KeyAction {
    match key.code {
        KeyCode::Char('q') => return KeyAction::Quit,
        KeyCode::Char('s') => app.dispatch(&commands::status()),
        KeyCode::Char('l') => {
            let opts = LogOptions {
                limit: Some(app.config.log_limit),
                ..LogOptions::default()
            };
            app.dispatch(&commands::log(&opts));
        }
        KeyCode::Char('L') => app.open_prompt(PromptPurpose::LogRevset),
        KeyCode::Char('d') => app.dispatch(&commands::diff()),
        KeyCode::Char('m') => app.open_describe_modal(),
        KeyCode::Char('n') => app.dispatch(&commands::new_change()),
        KeyCode::Char('S') => app.dispatch(&commands::squash()),
        KeyCode::Char('r') => app.open_prompt(PromptPurpose::RebaseDestination),
        KeyCode::Char('b') => app.open_prompt(PromptPurpose::BookmarkCreate),
        KeyCode::Char('B') => app.open_prompt(PromptPurpose::BookmarkDelete),
        KeyCode::Tab => {
            if app.sessions.is_visible(SessionKind::Split) {
                app.focus = Focus::Session(SessionKind::Split);
            }
        }
        _ => {}
    }
    KeyAction::Continue
}

fn handle_session_key(app: &mut App, kind: SessionKind, key: KeyEvent) {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => {
            app.sessions.move_cursor(kind, 1);
            return;
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.sessions.move_cursor(kind, -1);
            return;
        }
        KeyCode::Tab => {
            app.focus = Focus::Home;
            return;
        }
        _ => {}
    }

    let action = app
        .sessions
        .session(kind)
        .surface
        .as_ref()
        .and_then(|surface| surface.keymaps.resolve(&key));
    let Some(action) = action else {
        return;
    };

    match action {
        BindingAction::CloseSurface => app.close_session(kind),
        BindingAction::HideSurface => app.hide_session(kind),
        BindingAction::Refresh => app.refresh_session(kind),
        BindingAction::Suppressed => {}
        line_action => handle_line_action(app, kind, line_action),
    }
}

/// Bindings that act on the line under the cursor. Parsing happens here, on
/// demand; nothing is extracted while output streams in.
fn handle_line_action(app: &mut App, kind: SessionKind, action: BindingAction) {
    let Some(line) = app.sessions.line_under_cursor(kind) else {
        return;
    };

    match action {
        BindingAction::OpenFile | BindingAction::RestoreFile | BindingAction::DiffFile => {
            let Some(change) = parse_file_change(&line) else {
                return;
            };
            match action {
                BindingAction::OpenFile => app.dispatch(&commands::show_file(&change.new_path)),
                BindingAction::RestoreFile => {
                    app.dispatch(&commands::restore_path(&change.new_path));
                }
                BindingAction::DiffFile => app.dispatch(&commands::diff_path(&change.new_path)),
                _ => unreachable!(),
            }
        }
        BindingAction::EditRevision
        | BindingAction::DiffRevision
        | BindingAction::NewChild
        | BindingAction::YankRevision => {
            let Some(revision) = parse_revision(&line) else {
                return;
            };
            match action {
                BindingAction::EditRevision => app.dispatch(&commands::edit(&revision.id)),
                BindingAction::DiffRevision => {
                    app.dispatch(&commands::diff_revision(&revision.id));
                }
                BindingAction::NewChild => app.dispatch(&commands::new_child(&revision.id)),
                BindingAction::YankRevision => app.yank(&revision.id),
                _ => unreachable!(),
            }
        }
        _ => {}
    }
}
