//! Command façade for jj.
//!
//! Builds concrete jj command lines and decides, per subcommand, how the
//! result is presented: executed silently with a result notification, or
//! rendered into a terminal session together with the line-oriented bindings
//! that make sense for that output.

use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result};

use crate::session::{log_bindings, status_bindings, SessionKind, SurfaceBinding};

/// Default number of revisions shown by `jj log`.
pub const DEFAULT_LOG_LIMIT: u32 = 20;

/// Comment prefix on scaffolding lines in the describe editor.
pub const DESCRIPTION_COMMENT_PREFIX: &str = "JJ:";

/// How a built command reaches the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Run to completion, capture output, report via notification.
    Silent,
    /// Stream into the terminal session of this kind.
    Surface(SessionKind),
}

/// A fully built jj invocation.
#[derive(Debug, Clone)]
pub struct JjCommand {
    args: Vec<String>,
    pub dispatch: Dispatch,
}

impl JjCommand {
    fn surface(kind: SessionKind, args: Vec<String>) -> Self {
        Self {
            args,
            dispatch: Dispatch::Surface(kind),
        }
    }

    fn silent(args: Vec<String>) -> Self {
        Self {
            args,
            dispatch: Dispatch::Silent,
        }
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Shell-escaped command line for execution inside a PTY. User-supplied
    /// paths and text must never reach the shell unescaped.
    pub fn command_line(&self) -> String {
        let words: Vec<&str> = std::iter::once("jj")
            .chain(self.args.iter().map(String::as_str))
            .collect();
        shell_words::join(words)
    }

    /// Subcommand keyword, used to pick session bindings.
    fn keyword(&self) -> &str {
        self.args.first().map(String::as_str).unwrap_or("")
    }

    /// Bindings a session rendering this command's output should carry.
    pub fn surface_bindings(&self) -> Vec<SurfaceBinding> {
        match self.keyword() {
            "status" => status_bindings(),
            "log" => log_bindings(),
            _ => Vec::new(),
        }
    }
}

/// Options for `jj log`.
#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    pub summary: bool,
    pub reversed: bool,
    pub no_graph: bool,
    /// None falls back to [`DEFAULT_LOG_LIMIT`].
    pub limit: Option<u32>,
    /// Explicit revset to show.
    pub revset: Option<String>,
}

pub fn status() -> JjCommand {
    JjCommand::surface(SessionKind::Split, vec!["status".to_string()])
}

pub fn log(opts: &LogOptions) -> JjCommand {
    let mut args = vec!["log".to_string()];
    if opts.summary {
        args.push("--summary".to_string());
    }
    if opts.reversed {
        args.push("--reversed".to_string());
    }
    if opts.no_graph {
        args.push("--no-graph".to_string());
    }
    args.push("--limit".to_string());
    args.push(opts.limit.unwrap_or(DEFAULT_LOG_LIMIT).to_string());
    if let Some(revset) = &opts.revset {
        args.push("-r".to_string());
        args.push(revset.clone());
    }
    JjCommand::surface(SessionKind::Split, args)
}

/// Diff of the whole working copy.
pub fn diff() -> JjCommand {
    JjCommand::surface(SessionKind::Floating, vec!["diff".to_string()])
}

/// Diff of a single file.
pub fn diff_path(path: &str) -> JjCommand {
    JjCommand::surface(
        SessionKind::Floating,
        vec!["diff".to_string(), path.to_string()],
    )
}

/// Diff of one revision.
pub fn diff_revision(rev: &str) -> JjCommand {
    JjCommand::surface(
        SessionKind::Floating,
        vec!["diff".to_string(), "-r".to_string(), rev.to_string()],
    )
}

/// Show a file's content in the floating session.
pub fn show_file(path: &str) -> JjCommand {
    JjCommand::surface(
        SessionKind::Floating,
        vec!["file".to_string(), "show".to_string(), path.to_string()],
    )
}

/// Set the working-copy commit's description.
pub fn describe(message: &str) -> JjCommand {
    JjCommand::silent(vec![
        "describe".to_string(),
        "-m".to_string(),
        message.to_string(),
    ])
}

/// Create a new change on top of the working copy.
pub fn new_change() -> JjCommand {
    JjCommand::silent(vec!["new".to_string()])
}

/// Create a new change on top of the given revision.
pub fn new_child(rev: &str) -> JjCommand {
    JjCommand::silent(vec!["new".to_string(), rev.to_string()])
}

/// Check out the given revision for editing.
pub fn edit(rev: &str) -> JjCommand {
    JjCommand::silent(vec!["edit".to_string(), rev.to_string()])
}

/// Squash the working copy into its parent.
pub fn squash() -> JjCommand {
    JjCommand::silent(vec!["squash".to_string()])
}

/// Rebase the current change onto a destination revision.
pub fn rebase_destination(dest: &str) -> JjCommand {
    JjCommand::silent(vec![
        "rebase".to_string(),
        "-d".to_string(),
        dest.to_string(),
    ])
}

pub fn bookmark_create(name: &str) -> JjCommand {
    JjCommand::silent(vec![
        "bookmark".to_string(),
        "create".to_string(),
        name.to_string(),
    ])
}

pub fn bookmark_delete(name: &str) -> JjCommand {
    JjCommand::silent(vec![
        "bookmark".to_string(),
        "delete".to_string(),
        name.to_string(),
    ])
}

/// Restore a file in the working copy to its committed state.
pub fn restore_path(path: &str) -> JjCommand {
    JjCommand::silent(vec!["restore".to_string(), path.to_string()])
}

/// Scaffolding shown in a fresh describe editor. Comment lines are stripped
/// again before submission.
pub fn description_scaffold() -> Vec<String> {
    vec![
        String::new(),
        format!("{DESCRIPTION_COMMENT_PREFIX} Enter a description for this change."),
        format!("{DESCRIPTION_COMMENT_PREFIX} Lines starting with \"{DESCRIPTION_COMMENT_PREFIX}\" are removed."),
    ]
}

/// Drop scaffolding comment lines and surrounding blank lines from an edited
/// description.
pub fn strip_description_scaffold(lines: &[String]) -> String {
    let kept: Vec<&str> = lines
        .iter()
        .map(String::as_str)
        .filter(|line| !line.trim_start().starts_with(DESCRIPTION_COMMENT_PREFIX))
        .collect();
    kept.join("\n").trim().to_string()
}

/// Why the environment preflight failed.
#[derive(Debug)]
pub enum RepoError {
    /// jj is not on PATH.
    NotInstalled,
    /// The working directory is not inside a jj workspace.
    NotAWorkspace(String),
    /// Running jj failed for another reason.
    Io(std::io::Error),
}

impl std::fmt::Display for RepoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RepoError::NotInstalled => write!(f, "jj is not installed or not on PATH"),
            RepoError::NotAWorkspace(detail) => {
                if detail.is_empty() {
                    write!(f, "Not inside a jj workspace")
                } else {
                    write!(f, "Not inside a jj workspace: {detail}")
                }
            }
            RepoError::Io(e) => write!(f, "Failed to run jj: {e}"),
        }
    }
}

impl std::error::Error for RepoError {}

/// Locate the jj workspace root for `dir`.
///
/// Checked once before any command dispatch; everything else short-circuits
/// on failure.
pub fn workspace_root(dir: &Path) -> Result<PathBuf, RepoError> {
    let output = Command::new("jj")
        .arg("root")
        .current_dir(dir)
        .output()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                RepoError::NotInstalled
            } else {
                RepoError::Io(e)
            }
        })?;

    if !output.status.success() {
        let detail = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(RepoError::NotAWorkspace(detail));
    }

    Ok(PathBuf::from(
        String::from_utf8_lossy(&output.stdout).trim(),
    ))
}

/// Run a silent command to completion and return a one-line summary for the
/// result notification.
///
/// jj reports outcomes like "Working copy now at ..." on stderr, so the
/// summary prefers stderr over stdout.
pub fn run_silent(command: &JjCommand, workspace_root: &Path) -> Result<String> {
    let output = Command::new("jj")
        .args(command.args())
        .current_dir(workspace_root)
        .env("PAGER", "cat")
        .env("DELTA_PAGER", "cat")
        .output()
        .context("Failed to run jj")?;

    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);

    if !output.status.success() {
        let reason = first_line(&stderr)
            .or_else(|| first_line(&stdout))
            .unwrap_or("jj failed");
        anyhow::bail!("{reason}");
    }

    let summary = first_line(&stderr)
        .or_else(|| first_line(&stdout))
        .unwrap_or("Done");
    Ok(summary.to_string())
}

fn first_line(text: &str) -> Option<&str> {
    text.lines().map(str::trim).find(|line| !line.is_empty())
}
