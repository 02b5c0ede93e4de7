//! Small state enums shared across the app.

use crate::session::SessionKind;

/// Which region keyboard input is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    /// The home view; command keys dispatch jj subcommands.
    Home,
    /// A terminal session; keys resolve through its installed keymaps.
    Session(SessionKind),
}

/// Text-input mode. Insert is active only while a modal editor is open;
/// normal-mode command keys are ignored until it closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Insert,
}

/// Work queued during one event-loop turn and executed at the start of the
/// next, so state mutation never runs inside the turn that observed its
/// trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferredTask {
    /// A session's process exited; mark its surface read-only if the surface
    /// still exists.
    ProcessExited { kind: SessionKind, surface_id: u64 },
}
