// UI layer: the interactive prompts (`dialoguer`), the external text editor
// (`$VISUAL`/`$EDITOR` on a `tempfile` buffer), the spinner shown while a
// remote call is in flight (`indicatif`) and markdown output (`termimad`).
// The session loop only sees the `Prompter` and `Console` traits so it can
// be driven without a terminal.

use std::env;
use std::fs;
use std::io::{self, IsTerminal, Write};
use std::process::Command;
use std::time::Duration;

use dialoguer::theme::{SimpleTheme, Theme};
use dialoguer::{Confirm, Input};
use indicatif::{ProgressBar, ProgressStyle};
use termimad::MadSkin;

use crate::error::PromptError;

/// Interactive prompt surface.
pub trait Prompter {
    /// Yes/no question.
    fn confirm(&mut self, prompt: &str) -> Result<bool, PromptError>;

    /// Multi-line text in an external editor, optionally pre-filled. Empty
    /// text is a valid answer.
    fn edit_text(&mut self, prompt: &str, initial: Option<&str>) -> Result<String, PromptError>;

    /// Single line of text.
    fn input_line(&mut self, prompt: &str) -> Result<String, PromptError>;
}

/// Formatted console output.
pub trait Console {
    /// Plain status line.
    fn notice(&mut self, message: &str);

    /// Text that may contain light markdown.
    fn render_markdown(&mut self, text: &str);
}

/// `Prompter` backed by `dialoguer` on the controlling terminal.
#[derive(Default)]
pub struct DialoguerPrompter;

impl Prompter for DialoguerPrompter {
    fn confirm(&mut self, prompt: &str) -> Result<bool, PromptError> {
        Confirm::new()
            .with_prompt(prompt)
            .default(true)
            .interact()
            .map_err(PromptError::from_io)
    }

    fn edit_text(&mut self, prompt: &str, initial: Option<&str>) -> Result<String, PromptError> {
        // The editor takes over the terminal; without one there is nothing to
        // hand it to.
        if !io::stdin().is_terminal() || !io::stdout().is_terminal() {
            return Err(PromptError::NotInteractive);
        }
        // Same prompt styling and stream (stderr) as the other widgets.
        let mut line = String::new();
        if SimpleTheme
            .format_prompt(&mut line, prompt.trim_end_matches(':'))
            .is_ok()
        {
            eprintln!("{line}");
        }
        editor_outcome(run_editor(&editor_command(), initial.unwrap_or("")), initial)
    }

    fn input_line(&mut self, prompt: &str) -> Result<String, PromptError> {
        Input::<String>::new()
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()
            .map_err(PromptError::from_io)
    }
}

/// Editor named by `VISUAL` or `EDITOR`, else the platform default.
fn editor_command() -> String {
    env::var("VISUAL")
        .or_else(|_| env::var("EDITOR"))
        .ok()
        .filter(|e| !e.trim().is_empty())
        .unwrap_or_else(|| {
            if cfg!(windows) {
                "notepad.exe".into()
            } else {
                "vi".into()
            }
        })
}

/// Open `initial` in `command` and return the saved buffer. A non-zero exit
/// status (vim `:cq`, a killed editor) yields `Ok(None)`.
fn run_editor(command: &str, initial: &str) -> io::Result<Option<String>> {
    let mut words = command.split_whitespace();
    let program = words
        .next()
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no editor configured"))?;
    let mut file = tempfile::Builder::new()
        .prefix("gemini-chat-")
        .suffix(".md")
        .tempfile()?;
    file.write_all(initial.as_bytes())?;
    file.flush()?;
    let status = Command::new(program).args(words).arg(file.path()).status()?;
    if !status.success() {
        return Ok(None);
    }
    fs::read_to_string(file.path()).map(Some)
}

/// Map an editor run onto the prompt taxonomy. An aborted pre-filled buffer
/// is a cancellation; an aborted blank one is an empty answer.
fn editor_outcome(
    result: io::Result<Option<String>>,
    initial: Option<&str>,
) -> Result<String, PromptError> {
    match (result.map_err(PromptError::from_io)?, initial) {
        (Some(text), _) => Ok(text),
        (None, Some(_)) => Err(PromptError::Cancelled),
        (None, None) => Ok(String::new()),
    }
}

/// `Console` writing to stdout, rendering markdown with `termimad`.
pub struct TerminalConsole {
    skin: MadSkin,
}

impl TerminalConsole {
    pub fn new() -> Self {
        let mut skin = MadSkin::default();
        skin.inline_code
            .set_fg(termimad::crossterm::style::Color::Yellow);
        TerminalConsole { skin }
    }
}

impl Default for TerminalConsole {
    fn default() -> Self {
        Self::new()
    }
}

impl Console for TerminalConsole {
    fn notice(&mut self, message: &str) {
        println!("{message}");
    }

    fn render_markdown(&mut self, text: &str) {
        println!("{}", self.skin.term_text(text));
    }
}

/// Spinner on stderr that keeps ticking while the caller blocks.
pub fn spinner(message: &'static str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}
