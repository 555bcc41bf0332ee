//! Terminal host: render target, creation prompts and the interactive loop

use crate::client::TaskApi;
use crate::command::Command;
use crate::dispatcher::{Console, StagedForm, TaskForm};
use crate::error::Result;
use crate::render::{RenderTarget, Slot};
use std::io::{self, Write};
use std::sync::Mutex;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

const PROMPT: &str = "tsh> ";

/// Which slots get printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum View {
    #[default]
    Both,
    Json,
    Text,
}

impl View {
    fn shows(self, slot: Slot) -> bool {
        match self {
            View::Both => true,
            View::Json => slot == Slot::Structured,
            View::Text => slot == Slot::Text,
        }
    }
}

/// Prints each slot under a `[slotName]` header
pub struct TerminalTarget<W: Write> {
    out: Mutex<W>,
    view: View,
}

impl TerminalTarget<io::Stdout> {
    pub fn stdout(view: View) -> Self {
        Self::new(io::stdout(), view)
    }
}

impl<W: Write> TerminalTarget<W> {
    pub fn new(out: W, view: View) -> Self {
        Self {
            out: Mutex::new(out),
            view,
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(|e| e.into_inner())
    }
}

impl<W: Write> RenderTarget for TerminalTarget<W> {
    fn show(&self, slot: Slot, content: &str) {
        if !self.view.shows(slot) {
            return;
        }
        let mut out = self.out.lock().unwrap_or_else(|e| e.into_inner());
        let written = match self.view {
            View::Both => writeln!(out, "[{}]\n{}", slot, content),
            _ => writeln!(out, "{}", content),
        };
        if let Err(e) = written.and_then(|()| out.flush()) {
            tracing::warn!(slot = %slot, error = %e, "Failed to write output");
        }
    }
}

/// Interactive loop: one command per line until `exit`, `quit` or end of input.
///
/// After `fork` the shell asks for the task name and description and submits
/// them, the way the creation form would.
pub async fn run_shell<A, R, I, P>(
    console: &Console<A, R, StagedForm>,
    mut input: I,
    prompt: &mut P,
) -> Result<()>
where
    A: TaskApi,
    R: RenderTarget,
    I: AsyncBufRead + Unpin,
    P: AsyncWrite + Unpin,
{
    loop {
        let Some(line) = ask(&mut input, prompt, PROMPT).await? else {
            break;
        };

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed.eq_ignore_ascii_case("exit") || trimmed.eq_ignore_ascii_case("quit") {
            break;
        }

        console.handle_command(trimmed).await;

        if Command::parse(trimmed) == Command::Fork && console.form().is_visible() {
            let Some(name) = ask(&mut input, prompt, "name: ").await? else {
                break;
            };
            let Some(description) = ask(&mut input, prompt, "description: ").await? else {
                break;
            };
            console.form().stage(name, description);
            console.create_task().await;
        }
    }

    tracing::debug!("Shell session ended");
    Ok(())
}

/// Write `label` and read one line; `None` at end of input
async fn ask<I, P>(input: &mut I, prompt: &mut P, label: &str) -> Result<Option<String>>
where
    I: AsyncBufRead + Unpin,
    P: AsyncWrite + Unpin,
{
    prompt.write_all(label.as_bytes()).await?;
    prompt.flush().await?;

    let mut line = String::new();
    if input.read_line(&mut line).await? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}
