//! jjtui - a terminal UI for the jj version control system.
//!
//! Commands run through a small façade that decides whether they execute
//! silently with a toast notification or stream into one of two reusable
//! PTY-backed terminal sessions. Session output is parsed on demand to drive
//! line-oriented key bindings.

pub mod app;
pub mod commands;
pub mod config;
pub mod event_loop;
pub mod handlers;
pub mod parser;
pub mod session;
pub mod ui;
