//! Per-surface key bindings.
//!
//! Each surface carries a baseline set, installed once for its lifetime, and a
//! command set that is fully replaced every time a new command runs into the
//! surface. Bindings never accumulate across reuse cycles.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Action a surface binding resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingAction {
    /// Show the file under the cursor (status output).
    OpenFile,
    /// Restore the file under the cursor to its committed state.
    RestoreFile,
    /// Diff the file under the cursor.
    DiffFile,
    /// Check out the revision under the cursor (log output).
    EditRevision,
    /// Diff the revision under the cursor.
    DiffRevision,
    /// Create a new child of the revision under the cursor.
    NewChild,
    /// Copy the revision id under the cursor to the clipboard.
    YankRevision,
    /// Re-run the last command in this surface.
    Refresh,
    /// Destroy the surface and reset the session.
    CloseSurface,
    /// Hide the surface; it stays live for reuse.
    HideSurface,
    /// Swallow the key. Surfaces are output-only, so insertion triggers
    /// must not reach any other handler.
    Suppressed,
}

/// A key bound on a surface for the lifetime of the current command's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceBinding {
    pub key: KeyCode,
    pub mods: KeyModifiers,
    pub action: BindingAction,
    /// Short label for the help bar.
    pub help: &'static str,
}

impl SurfaceBinding {
    const fn plain(key: KeyCode, action: BindingAction, help: &'static str) -> Self {
        Self {
            key,
            mods: KeyModifiers::NONE,
            action,
            help,
        }
    }

    const fn ctrl(key: KeyCode, action: BindingAction, help: &'static str) -> Self {
        Self {
            key,
            mods: KeyModifiers::CONTROL,
            action,
            help,
        }
    }

    fn matches(&self, event: &KeyEvent) -> bool {
        self.key == event.code && self.mods == event.modifiers
    }
}

/// Binding table for one surface.
#[derive(Debug, Default)]
pub struct KeymapSet {
    baseline: Vec<SurfaceBinding>,
    command: Vec<SurfaceBinding>,
}

impl KeymapSet {
    /// Install the baseline bindings. Callers guard this with the surface's
    /// installed-capabilities flag so repeat runs do not reinstall.
    pub fn install_baseline(&mut self) {
        self.baseline = baseline_bindings();
    }

    /// Unbind every binding registered by the previous run and bind the new
    /// set. The replaced set is simply dropped; a binding that was already
    /// gone is not an error.
    pub fn replace_command_bindings(&mut self, bindings: Vec<SurfaceBinding>) {
        self.command = bindings;
    }

    /// Resolve a key event. Command bindings shadow baseline bindings.
    pub fn resolve(&self, event: &KeyEvent) -> Option<BindingAction> {
        self.command
            .iter()
            .chain(self.baseline.iter())
            .find(|b| b.matches(event))
            .map(|b| b.action)
    }

    /// The currently bound command set, for the help bar.
    pub fn command_bindings(&self) -> &[SurfaceBinding] {
        &self.command
    }
}

/// Bindings every surface gets exactly once: close/hide, refresh, and
/// suppression of editing triggers.
fn baseline_bindings() -> Vec<SurfaceBinding> {
    vec![
        SurfaceBinding::plain(KeyCode::Char('q'), BindingAction::CloseSurface, "close"),
        SurfaceBinding::plain(KeyCode::Esc, BindingAction::HideSurface, "hide"),
        SurfaceBinding::ctrl(KeyCode::Char('r'), BindingAction::Refresh, "refresh"),
        SurfaceBinding::plain(KeyCode::Char('i'), BindingAction::Suppressed, ""),
        SurfaceBinding::plain(KeyCode::Char('a'), BindingAction::Suppressed, ""),
        SurfaceBinding::plain(KeyCode::Char('o'), BindingAction::Suppressed, ""),
    ]
}

/// Command bindings for status output.
pub fn status_bindings() -> Vec<SurfaceBinding> {
    vec![
        SurfaceBinding::plain(KeyCode::Enter, BindingAction::OpenFile, "open"),
        SurfaceBinding::plain(KeyCode::Char('r'), BindingAction::RestoreFile, "restore"),
        SurfaceBinding::plain(KeyCode::Char('d'), BindingAction::DiffFile, "diff"),
    ]
}

/// Command bindings for log output.
pub fn log_bindings() -> Vec<SurfaceBinding> {
    vec![
        SurfaceBinding::plain(KeyCode::Char('e'), BindingAction::EditRevision, "edit"),
        SurfaceBinding::plain(KeyCode::Char('d'), BindingAction::DiffRevision, "diff"),
        SurfaceBinding::plain(KeyCode::Char('n'), BindingAction::NewChild, "new"),
        SurfaceBinding::plain(KeyCode::Char('y'), BindingAction::YankRevision, "yank id"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl_key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::CONTROL)
    }

    fn installed_set() -> KeymapSet {
        let mut set = KeymapSet::default();
        set.install_baseline();
        set
    }

    #[test]
    fn baseline_resolves_close_hide_and_refresh() {
        let set = installed_set();
        assert_eq!(
            set.resolve(&key(KeyCode::Char('q'))),
            Some(BindingAction::CloseSurface)
        );
        assert_eq!(
            set.resolve(&key(KeyCode::Esc)),
            Some(BindingAction::HideSurface)
        );
        assert_eq!(
            set.resolve(&ctrl_key(KeyCode::Char('r'))),
            Some(BindingAction::Refresh)
        );
    }

    #[test]
    fn insertion_triggers_are_suppressed() {
        let set = installed_set();
        for c in ['i', 'a', 'o'] {
            assert_eq!(
                set.resolve(&key(KeyCode::Char(c))),
                Some(BindingAction::Suppressed)
            );
        }
    }

    #[test]
    fn replacement_leaves_only_the_new_command_set() {
        let mut set = installed_set();
        set.replace_command_bindings(status_bindings());
        assert_eq!(
            set.resolve(&key(KeyCode::Enter)),
            Some(BindingAction::OpenFile)
        );

        set.replace_command_bindings(log_bindings());
        // Old status bindings must be gone.
        assert_eq!(set.resolve(&key(KeyCode::Enter)), None);
        assert_eq!(
            set.resolve(&key(KeyCode::Char('e'))),
            Some(BindingAction::EditRevision)
        );
        assert_eq!(set.command_bindings().len(), log_bindings().len());
    }

    #[test]
    fn command_bindings_shadow_baseline() {
        let mut set = installed_set();
        // Plain 'r' is unbound at baseline (refresh is Ctrl-r), so the status
        // set's restore binding must win without ambiguity.
        set.replace_command_bindings(status_bindings());
        assert_eq!(
            set.resolve(&key(KeyCode::Char('r'))),
            Some(BindingAction::RestoreFile)
        );
        assert_eq!(
            set.resolve(&ctrl_key(KeyCode::Char('r'))),
            Some(BindingAction::Refresh)
        );
    }

    #[test]
    fn unbound_keys_resolve_to_none() {
        let set = installed_set();
        assert_eq!(set.resolve(&key(KeyCode::Char('z'))), None);
        assert_eq!(set.resolve(&ctrl_key(KeyCode::Char('q'))), None);
    }

    #[test]
    fn baseline_survives_command_replacement() {
        let mut set = installed_set();
        set.replace_command_bindings(log_bindings());
        set.replace_command_bindings(Vec::new());
        assert_eq!(
            set.resolve(&key(KeyCode::Char('q'))),
            Some(BindingAction::CloseSurface)
        );
    }
}
