//! Terminal session manager.
//!
//! Owns the two reusable PTY-backed sessions (split and floating) and every
//! lifecycle transition they go through: creation, reuse, process
//! replacement, teardown. All session mutation happens through the manager's
//! methods; nothing else touches the records.

use std::collections::VecDeque;
use std::io::Read;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result};
use portable_pty::{native_pty_system, ChildKiller, CommandBuilder, PtyPair, PtySize};

use super::bindings::{KeymapSet, SurfaceBinding};
use super::types::{row_text, SessionKind};

/// Scrollback lines retained per channel.
const SCROLLBACK_LINES: usize = 2000;

/// Terminal reset fed into every fresh channel before its process starts, so
/// no escape state or content bleeds through from a previous run.
const RESET_SEQUENCE: &[u8] = b"\x1bc";

/// Idempotent-installation guards recorded alongside the surface, checked
/// before every installation step when `run` hits a live surface again.
#[derive(Debug, Clone, Copy, Default)]
pub struct InstalledCapabilities {
    /// Teardown-on-destruction handling is in place for this surface.
    pub cleanup: bool,
    /// Baseline key bindings are in place.
    pub keymaps: bool,
}

/// A display surface bound to a session.
pub struct Surface {
    /// Identity of this surface; stable across runs while the surface lives.
    pub id: u64,
    pub rows: u16,
    pub cols: u16,
    /// Hidden surfaces stay live and are re-shown on the next run.
    pub visible: bool,
    /// Set once the process feeding the surface has exited.
    pub read_only: bool,
    /// Cursor row for line-oriented bindings (0-based screen row).
    pub cursor_row: u16,
    pub keymaps: KeymapSet,
    pub installed: InstalledCapabilities,
}

impl Surface {
    fn new(id: u64, rows: u16, cols: u16) -> Self {
        Self {
            id,
            rows,
            cols,
            visible: true,
            read_only: false,
            cursor_row: 0,
            keymaps: KeymapSet::default(),
            installed: InstalledCapabilities::default(),
        }
    }
}

/// Byte-stream conduit feeding terminal-formatted output into a surface.
///
/// Channels are never reused across runs: each carries a fresh vt100 parser
/// so terminal-escape state always starts clean.
struct Channel {
    pair: PtyPair,
    output_rx: Receiver<Vec<u8>>,
    parser: vt100::Parser,
    /// Cleared by the reader thread on EOF, i.e. when the process is gone.
    alive: Arc<AtomicBool>,
    _reader_thread: thread::JoinHandle<()>,
}

impl Channel {
    /// Open a PTY sized to the surface and start draining it on a reader
    /// thread. Output chunks are forwarded verbatim; this is the only path by
    /// which process output reaches a surface.
    fn open(rows: u16, cols: u16) -> Result<Self> {
        let pty_system = native_pty_system();
        let pair = pty_system
            .openpty(PtySize {
                rows,
                cols,
                pixel_width: 0,
                pixel_height: 0,
            })
            .context("Failed to open PTY")?;

        let mut reader = pair
            .master
            .try_clone_reader()
            .context("Failed to clone PTY reader")?;

        let (output_tx, output_rx): (Sender<Vec<u8>>, Receiver<Vec<u8>>) = mpsc::channel();
        let alive = Arc::new(AtomicBool::new(true));
        let alive_clone = Arc::clone(&alive);

        let reader_thread = thread::spawn(move || {
            let mut buf = [0u8; 4096];
            loop {
                match reader.read(&mut buf) {
                    Ok(0) => break, // EOF
                    Ok(n) => {
                        if output_tx.send(buf[..n].to_vec()).is_err() {
                            break; // Channel closed
                        }
                    }
                    Err(_) => break,
                }
            }
            alive_clone.store(false, Ordering::SeqCst);
        });

        let mut parser = vt100::Parser::new(rows, cols, SCROLLBACK_LINES);
        parser.process(RESET_SEQUENCE);

        Ok(Self {
            pair,
            output_rx,
            parser,
            alive,
            _reader_thread: reader_thread,
        })
    }
}

/// Handle to the subprocess currently attached to a session.
struct ProcessHandle {
    killer: Box<dyn ChildKiller + Send + Sync>,
    /// Shared with the channel's reader thread; false once the process exited.
    alive: Arc<AtomicBool>,
}

/// One reusable terminal session: surface + channel + process.
///
/// Invariants: a set channel implies a live surface; a set process implies a
/// set channel. The session is idle when all three are absent.
pub struct Session {
    kind: SessionKind,
    pub surface: Option<Surface>,
    channel: Option<Channel>,
    process: Option<ProcessHandle>,
    /// Last command line run into this session, for refresh.
    pub last_command: Option<String>,
}

impl Session {
    fn new(kind: SessionKind) -> Self {
        Self {
            kind,
            surface: None,
            channel: None,
            process: None,
            last_command: None,
        }
    }

    pub fn kind(&self) -> SessionKind {
        self.kind
    }

    pub fn is_idle(&self) -> bool {
        self.surface.is_none() && self.channel.is_none() && self.process.is_none()
    }

    pub fn is_active(&self) -> bool {
        self.surface.is_some() && self.channel.is_some() && self.process.is_some()
    }

    /// Screen of the current channel, if one is open.
    pub fn screen(&self) -> Option<&vt100::Screen> {
        self.channel.as_ref().map(|c| c.parser.screen())
    }

    pub fn process_running(&self) -> bool {
        self.process
            .as_ref()
            .is_some_and(|p| p.alive.load(Ordering::SeqCst))
    }

    fn kill_process(&mut self) {
        // Best-effort, fire-and-forget: we do not wait for termination before
        // starting a replacement. A dying process may flush a little more
        // output into its old, detached channel; that channel is closed, so
        // the output is discarded.
        if let Some(mut process) = self.process.take() {
            let _ = process.killer.kill();
        }
    }
}

/// Manages the split and floating sessions.
pub struct SessionManager {
    split: Session,
    floating: Session,
    /// Workspace root every command runs in.
    workspace_root: PathBuf,
    next_surface_id: u64,
    /// (kind, surface id) pairs whose process exited; drained by the app into
    /// deferred tasks so post-exit UI mutation never runs inside the turn
    /// that observed the exit.
    exited: VecDeque<(SessionKind, u64)>,
}

impl SessionManager {
    pub fn new(workspace_root: PathBuf) -> Self {
        Self {
            split: Session::new(SessionKind::Split),
            floating: Session::new(SessionKind::Floating),
            workspace_root,
            next_surface_id: 0,
            exited: VecDeque::new(),
        }
    }

    pub fn session(&self, kind: SessionKind) -> &Session {
        match kind {
            SessionKind::Split => &self.split,
            SessionKind::Floating => &self.floating,
        }
    }

    fn session_mut(&mut self, kind: SessionKind) -> &mut Session {
        match kind {
            SessionKind::Split => &mut self.split,
            SessionKind::Floating => &mut self.floating,
        }
    }

    /// Run a command line into the session for `kind`.
    ///
    /// Reuses the session's surface when it is still live, terminates any
    /// process still running there, and always opens a fresh channel.
    /// `rows`/`cols` are the dimensions of the presentation region the
    /// surface occupies.
    ///
    /// A PTY allocation failure aborts the run and leaves the session idle.
    /// A process-spawn failure is written into the surface instead; the
    /// channel stays open so the user sees the message.
    pub fn run(
        &mut self,
        command_line: &str,
        kind: SessionKind,
        bindings: Vec<SurfaceBinding>,
        rows: u16,
        cols: u16,
    ) -> Result<()> {
        self.ensure_surface(kind, rows, cols);

        let workspace_root = self.workspace_root.clone();
        let session = self.session_mut(kind);

        // At most one process per session.
        session.kill_process();
        // Channels are never reused; escape state must start clean.
        session.channel = None;

        let mut channel = match Channel::open(rows, cols) {
            Ok(channel) => channel,
            Err(e) => {
                // Nothing may be left half-active after a failed run.
                session.surface = None;
                session.last_command = None;
                return Err(e);
            }
        };

        let mut cmd = CommandBuilder::new("sh");
        cmd.arg("-c");
        cmd.arg(command_line);
        cmd.cwd(&workspace_root);
        cmd.env("TERM", "xterm-256color");
        cmd.env("COLORTERM", "truecolor");
        // jj must never block on a pager inside the PTY.
        cmd.env("PAGER", "cat");
        cmd.env("DELTA_PAGER", "cat");
        cmd.env("COLORFGBG", "15;0");

        let process = match channel.pair.slave.spawn_command(cmd) {
            Ok(mut child) => {
                let killer = child.clone_killer();
                Some(ProcessHandle {
                    killer,
                    alive: Arc::clone(&channel.alive),
                })
            }
            Err(e) => {
                let message = format!("failed to start `{command_line}`: {e}\r\n");
                channel.parser.process(message.as_bytes());
                None
            }
        };

        session.channel = Some(channel);
        session.process = process;
        session.last_command = Some(command_line.to_string());

        if let Some(surface) = session.surface.as_mut() {
            if !surface.installed.keymaps {
                surface.keymaps.install_baseline();
                surface.installed.keymaps = true;
            }
            if !surface.installed.cleanup {
                // Teardown on destruction runs through destroy(); the flag
                // records that this surface is covered.
                surface.installed.cleanup = true;
            }
            surface.keymaps.replace_command_bindings(bindings);
        }

        Ok(())
    }

    /// Re-run the session's last command with its current bindings.
    /// Returns false when there is nothing to re-run.
    pub fn refresh(&mut self, kind: SessionKind, rows: u16, cols: u16) -> Result<bool> {
        let session = self.session(kind);
        let Some(command_line) = session.last_command.clone() else {
            return Ok(false);
        };
        let bindings = session
            .surface
            .as_ref()
            .map(|s| s.keymaps.command_bindings().to_vec())
            .unwrap_or_default();
        self.run(&command_line, kind, bindings, rows, cols)?;
        Ok(true)
    }

    /// Resolve a live surface for the session: reuse the existing one when it
    /// is still present, otherwise create a new one. Also covers stale-handle
    /// recovery: a session whose surface is gone is reset before anything
    /// else happens.
    fn ensure_surface(&mut self, kind: SessionKind, rows: u16, cols: u16) {
        let session = match kind {
            SessionKind::Split => &mut self.split,
            SessionKind::Floating => &mut self.floating,
        };

        if session.surface.is_none() {
            session.kill_process();
            session.channel = None;
        }

        match session.surface.as_mut() {
            Some(surface) => {
                // Reuse: re-display in a (possibly new) presentation region.
                surface.visible = true;
                surface.read_only = false;
                surface.cursor_row = 0;
                surface.rows = rows;
                surface.cols = cols;
            }
            None => {
                session.surface = Some(Surface::new(self.next_surface_id, rows, cols));
                self.next_surface_id += 1;
            }
        }
    }

    /// Drain pending PTY output into each session's channel and record
    /// process exits. Output chunks reach the screen verbatim. Returns true
    /// when any session received output.
    pub fn pump_output(&mut self) -> bool {
        let mut had_output = false;
        for session in [&mut self.split, &mut self.floating] {
            if let Some(channel) = session.channel.as_mut() {
                while let Ok(data) = channel.output_rx.try_recv() {
                    channel.parser.process(&data);
                    had_output = true;
                }
            }

            let exited = session
                .process
                .as_ref()
                .is_some_and(|p| !p.alive.load(Ordering::SeqCst));
            if exited {
                session.process = None;
                if let Some(surface) = session.surface.as_ref() {
                    self.exited.push_back((session.kind, surface.id));
                }
            }
        }
        had_output
    }

    /// Exit notifications collected by `pump_output`. Callers turn these into
    /// deferred tasks executed on the next event-loop turn.
    pub fn take_exit_events(&mut self) -> Vec<(SessionKind, u64)> {
        self.exited.drain(..).collect()
    }

    /// Deferred post-exit mutation: mark the surface read-only. A no-op when
    /// the surface has since been destroyed or replaced.
    pub fn finish_process_exit(&mut self, kind: SessionKind, surface_id: u64) {
        let session = self.session_mut(kind);
        if let Some(surface) = session.surface.as_mut() {
            if surface.id == surface_id {
                surface.read_only = true;
            }
        }
    }

    /// Destroy the surface for `kind`: close the channel, terminate any
    /// running process, reset the session to idle. No channel or process
    /// outlives its surface.
    pub fn destroy(&mut self, kind: SessionKind) {
        let session = self.session_mut(kind);
        session.kill_process();
        session.channel = None;
        session.surface = None;
        session.last_command = None;
    }

    /// Hide the surface; the session stays live for reuse.
    pub fn hide(&mut self, kind: SessionKind) {
        if let Some(surface) = self.session_mut(kind).surface.as_mut() {
            surface.visible = false;
        }
    }

    pub fn is_visible(&self, kind: SessionKind) -> bool {
        self.session(kind)
            .surface
            .as_ref()
            .is_some_and(|s| s.visible)
    }

    /// Move the cursor row of the surface, clamped to the screen.
    pub fn move_cursor(&mut self, kind: SessionKind, delta: i32) {
        let session = self.session_mut(kind);
        if let Some(surface) = session.surface.as_mut() {
            let max_row = surface.rows.saturating_sub(1);
            let row = i64::from(surface.cursor_row) + i64::from(delta);
            surface.cursor_row = row.clamp(0, i64::from(max_row)) as u16;
        }
    }

    /// Text of the line under the surface's cursor, for on-demand parsing.
    pub fn line_under_cursor(&self, kind: SessionKind) -> Option<String> {
        let session = self.session(kind);
        let surface = session.surface.as_ref()?;
        let screen = session.screen()?;
        Some(row_text(screen, surface.cursor_row))
    }

    /// Resize the surface's presentation region and the attached PTY.
    pub fn resize(&mut self, kind: SessionKind, rows: u16, cols: u16) -> Result<()> {
        let session = self.session_mut(kind);
        let Some(surface) = session.surface.as_mut() else {
            return Ok(());
        };
        surface.rows = rows;
        surface.cols = cols;
        surface.cursor_row = surface.cursor_row.min(rows.saturating_sub(1));

        if let Some(channel) = session.channel.as_mut() {
            channel
                .pair
                .master
                .resize(PtySize {
                    rows,
                    cols,
                    pixel_width: 0,
                    pixel_height: 0,
                })
                .context("Failed to resize PTY")?;
            channel.parser = vt100::Parser::new(rows, cols, SCROLLBACK_LINES);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::bindings::{log_bindings, status_bindings, BindingAction};
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use std::io::Write as _;
    use std::time::{Duration, Instant};

    fn manager() -> SessionManager {
        SessionManager::new(std::env::temp_dir())
    }

    /// Pump until `done` holds or the timeout elapses.
    fn pump_until(mgr: &mut SessionManager, done: impl Fn(&SessionManager) -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            mgr.pump_output();
            if done(mgr) {
                return true;
            }
            thread::sleep(Duration::from_millis(10));
        }
        false
    }

    #[test]
    fn run_creates_an_active_session() {
        let mut mgr = manager();
        mgr.run("sleep 5", SessionKind::Split, Vec::new(), 10, 40)
            .unwrap();
        let session = mgr.session(SessionKind::Split);
        assert!(session.is_active());
        assert!(session.process_running());
        mgr.destroy(SessionKind::Split);
    }

    #[test]
    fn repeated_runs_reuse_the_surface() {
        let mut mgr = manager();
        mgr.run("true", SessionKind::Split, Vec::new(), 10, 40)
            .unwrap();
        let first_id = mgr.session(SessionKind::Split).surface.as_ref().unwrap().id;

        mgr.run("true", SessionKind::Split, Vec::new(), 10, 40)
            .unwrap();
        let second_id = mgr.session(SessionKind::Split).surface.as_ref().unwrap().id;

        assert_eq!(first_id, second_id);
        mgr.destroy(SessionKind::Split);
    }

    #[test]
    fn sessions_of_different_kinds_are_independent() {
        let mut mgr = manager();
        mgr.run("true", SessionKind::Split, Vec::new(), 10, 40)
            .unwrap();
        mgr.run("true", SessionKind::Floating, Vec::new(), 10, 40)
            .unwrap();
        let split_id = mgr.session(SessionKind::Split).surface.as_ref().unwrap().id;
        let float_id = mgr
            .session(SessionKind::Floating)
            .surface
            .as_ref()
            .unwrap()
            .id;
        assert_ne!(split_id, float_id);
        mgr.destroy(SessionKind::Split);
        mgr.destroy(SessionKind::Floating);
    }

    #[test]
    fn rerun_replaces_bindings_without_leftovers() {
        let mut mgr = manager();
        mgr.run("true", SessionKind::Split, status_bindings(), 10, 40)
            .unwrap();
        mgr.run("true", SessionKind::Split, log_bindings(), 10, 40)
            .unwrap();

        let surface = mgr.session(SessionKind::Split).surface.as_ref().unwrap();
        assert!(surface.installed.keymaps);
        assert!(surface.installed.cleanup);
        // Status bindings from the first run must be gone.
        let enter = KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE);
        assert_eq!(surface.keymaps.resolve(&enter), None);
        let edit = KeyEvent::new(KeyCode::Char('e'), KeyModifiers::NONE);
        assert_eq!(
            surface.keymaps.resolve(&edit),
            Some(BindingAction::EditRevision)
        );
        mgr.destroy(SessionKind::Split);
    }

    #[test]
    fn destroy_leaves_the_session_idle() {
        let mut mgr = manager();
        mgr.run("sleep 5", SessionKind::Floating, Vec::new(), 10, 40)
            .unwrap();
        mgr.destroy(SessionKind::Floating);
        let session = mgr.session(SessionKind::Floating);
        assert!(session.is_idle());
        assert!(session.last_command.is_none());
    }

    #[test]
    fn process_exit_is_deferred_then_marks_read_only() {
        let mut mgr = manager();
        mgr.run("true", SessionKind::Split, Vec::new(), 10, 40)
            .unwrap();

        assert!(pump_until(&mut mgr, |m| !m
            .session(SessionKind::Split)
            .process_running()));
        assert!(pump_until(&mut mgr, |m| m
            .session(SessionKind::Split)
            .process
            .is_none()));

        let events = mgr.take_exit_events();
        assert_eq!(events.len(), 1);
        let (kind, surface_id) = events[0];
        assert_eq!(kind, SessionKind::Split);

        // Not read-only until the deferred task runs.
        assert!(!mgr.session(SessionKind::Split).surface.as_ref().unwrap().read_only);
        mgr.finish_process_exit(kind, surface_id);
        assert!(mgr.session(SessionKind::Split).surface.as_ref().unwrap().read_only);
        mgr.destroy(SessionKind::Split);
    }

    #[test]
    fn finish_process_exit_ignores_destroyed_surfaces() {
        let mut mgr = manager();
        mgr.run("true", SessionKind::Split, Vec::new(), 10, 40)
            .unwrap();
        let surface_id = mgr.session(SessionKind::Split).surface.as_ref().unwrap().id;
        mgr.destroy(SessionKind::Split);
        // Must not panic or resurrect anything.
        mgr.finish_process_exit(SessionKind::Split, surface_id);
        assert!(mgr.session(SessionKind::Split).is_idle());
    }

    #[test]
    fn output_reaches_the_screen_verbatim() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "M src/app.go").unwrap();

        let mut mgr = manager();
        let command = format!("cat {}", file.path().display());
        mgr.run(&command, SessionKind::Split, Vec::new(), 10, 60)
            .unwrap();

        assert!(pump_until(&mut mgr, |m| {
            m.session(SessionKind::Split)
                .screen()
                .map(|s| s.contents().contains("M src/app.go"))
                .unwrap_or(false)
        }));

        assert_eq!(
            mgr.line_under_cursor(SessionKind::Split).unwrap(),
            "M src/app.go"
        );
        mgr.destroy(SessionKind::Split);
    }

    #[test]
    fn refresh_reruns_the_last_command() {
        let mut mgr = manager();
        mgr.run("printf again", SessionKind::Split, log_bindings(), 10, 40)
            .unwrap();
        assert!(mgr.refresh(SessionKind::Split, 10, 40).unwrap());

        let session = mgr.session(SessionKind::Split);
        assert_eq!(session.last_command.as_deref(), Some("printf again"));
        let surface = session.surface.as_ref().unwrap();
        assert_eq!(
            surface.keymaps.command_bindings().len(),
            log_bindings().len()
        );
        mgr.destroy(SessionKind::Split);
    }

    #[test]
    fn refresh_on_an_idle_session_is_a_noop() {
        let mut mgr = manager();
        assert!(!mgr.refresh(SessionKind::Floating, 10, 40).unwrap());
        assert!(mgr.session(SessionKind::Floating).is_idle());
    }

    #[test]
    fn hide_keeps_the_surface_live_for_reuse() {
        let mut mgr = manager();
        mgr.run("true", SessionKind::Floating, Vec::new(), 10, 40)
            .unwrap();
        let id = mgr
            .session(SessionKind::Floating)
            .surface
            .as_ref()
            .unwrap()
            .id;

        mgr.hide(SessionKind::Floating);
        assert!(!mgr.is_visible(SessionKind::Floating));

        mgr.run("true", SessionKind::Floating, Vec::new(), 10, 40)
            .unwrap();
        assert!(mgr.is_visible(SessionKind::Floating));
        let reused = mgr
            .session(SessionKind::Floating)
            .surface
            .as_ref()
            .unwrap()
            .id;
        assert_eq!(id, reused);
        mgr.destroy(SessionKind::Floating);
    }

    #[test]
    fn cursor_movement_clamps_to_the_screen() {
        let mut mgr = manager();
        mgr.run("true", SessionKind::Split, Vec::new(), 5, 40)
            .unwrap();
        mgr.move_cursor(SessionKind::Split, -3);
        assert_eq!(
            mgr.session(SessionKind::Split).surface.as_ref().unwrap().cursor_row,
            0
        );
        mgr.move_cursor(SessionKind::Split, 99);
        assert_eq!(
            mgr.session(SessionKind::Split).surface.as_ref().unwrap().cursor_row,
            4
        );
        mgr.destroy(SessionKind::Split);
    }
}
