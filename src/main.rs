use std::io::{self, IsTerminal};
use std::path::Path;
use std::process::ExitCode;

use anyhow::Result;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use jjtui::app::App;
use jjtui::commands;
use jjtui::event_loop::run_app;

fn main() -> ExitCode {
    if !io::stdout().is_terminal() {
        eprintln!("jjtui must run in a terminal");
        return ExitCode::FAILURE;
    }

    // Environment preflight happens before the terminal is touched, so the
    // message lands on a normal screen.
    let workspace_root = match commands::workspace_root(Path::new(".")) {
        Ok(root) => root,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    match run(workspace_root) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(workspace_root: std::path::PathBuf) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = App::new(workspace_root).and_then(|mut app| run_app(&mut terminal, &mut app));

    // Always restore the terminal, even when the app errored.
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}
