//! Reusable PTY-backed terminal sessions.
//!
//! This module provides:
//! - `SessionManager` - owns the split and floating sessions
//! - `Session`/`Surface` - per-kind state records and their lifecycle
//! - per-surface key binding tables replaced on every run

pub mod bindings;
pub mod manager;
pub mod types;

pub use bindings::{log_bindings, status_bindings, BindingAction, KeymapSet, SurfaceBinding};
pub use manager::{InstalledCapabilities, Session, SessionManager, Surface};
pub use types::{row_text, style_from_vt100_cell, SessionKind};
