//! Line-oriented console driver.
//!
//! Reads lines, groups them into blocks, and dispatches blocks and slash
//! commands to a [`SessionCoordinator`]. Every action yields
//! [`ConsoleOutput`] values that the caller formats.

mod command;
mod input;
mod tokenizer;

pub use command::{Command, HELP_TEXT};
pub use input::{BlockBuffer, Input};
pub use tokenizer::{tokenize, ParseError};

use crate::output::{ConsoleOutput, OutputWriter};
use crate::session::SessionCoordinator;
use crate::splitter;
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::debug;

const PROMPT: &str = "gconsole> ";
const CONTINUATION_PROMPT: &str = "       -> ";

/// What the driver should do after an input.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub outputs: Vec<ConsoleOutput>,
    pub quit: bool,
}

impl Step {
    fn show(output: ConsoleOutput) -> Self {
        Self {
            outputs: vec![output],
            quit: false,
        }
    }

    fn quit() -> Self {
        Self {
            outputs: Vec::new(),
            quit: true,
        }
    }
}

/// Drives one session from line input.
pub struct Console<'a> {
    session: &'a SessionCoordinator,
    split_only: bool,
}

impl<'a> Console<'a> {
    pub fn new(session: &'a SessionCoordinator) -> Self {
        Self {
            session,
            split_only: false,
        }
    }

    /// Prints how blocks split instead of running them.
    pub fn split_only(mut self, split_only: bool) -> Self {
        self.split_only = split_only;
        self
    }

    /// Handles one unit of input.
    pub async fn handle(&self, input: Input) -> Step {
        match input {
            Input::Block(block) => Step::show(self.submit(&block).await),
            Input::Command(line) => match Command::parse(&line) {
                Ok(command) => self.execute(command).await,
                Err(e) => Step::show(ConsoleOutput::error(e.to_string())),
            },
        }
    }

    async fn submit(&self, block: &str) -> ConsoleOutput {
        if self.split_only {
            return ConsoleOutput::Split(splitter::split(block));
        }
        self.run_text(block.to_string()).await
    }

    async fn run_text(&self, text: String) -> ConsoleOutput {
        match self.session.run(text, None).await {
            Ok(seq) => {
                let state = self.session.snapshot();
                ConsoleOutput::Results(state.entries_for_run(seq).cloned().collect())
            }
            Err(e) => ConsoleOutput::error(e.to_string()),
        }
    }

    /// Executes a parsed slash command.
    pub async fn execute(&self, command: Command) -> Step {
        debug!(?command, "Executing console command");

        let output = match command {
            Command::Quit => return Step::quit(),
            Command::Help => ConsoleOutput::info(HELP_TEXT),
            Command::Favorites => ConsoleOutput::Favorites(self.session.snapshot().favorites),
            Command::Save(name) => {
                let statement = self.session.snapshot().last_text;
                match self.session.add_favorite(name.clone(), statement).await {
                    Ok(()) => ConsoleOutput::info(format!("Saved favorite '{name}'.")),
                    Err(e) => ConsoleOutput::error(e.to_string()),
                }
            }
            Command::Run(name) => {
                let favorite = self
                    .session
                    .snapshot()
                    .favorites
                    .get(&name)
                    .map(str::to_string);
                match favorite {
                    Some(statement) => self.run_text(statement).await,
                    None => ConsoleOutput::error(format!("No favorite named '{name}'.")),
                }
            }
            Command::Forget(name) => match self.session.remove_favorite(&name).await {
                Ok(true) => ConsoleOutput::info(format!("Removed favorite '{name}'.")),
                Ok(false) => ConsoleOutput::error(format!("No favorite named '{name}'.")),
                Err(e) => ConsoleOutput::error(e.to_string()),
            },
            Command::Params => match self.session.get_params().await {
                Ok(()) => ConsoleOutput::Params(self.session.snapshot().params),
                Err(e) => ConsoleOutput::error(e.to_string()),
            },
            Command::History { limit } => {
                let history = self.session.snapshot().history;
                let limit = limit.unwrap_or(history.len());
                ConsoleOutput::History(history.into_iter().take(limit).collect())
            }
            Command::Reset => {
                self.session.reset_model();
                ConsoleOutput::info("Session reset.")
            }
        };

        Step::show(output)
    }

    /// Reads `reader` to the end (or `/quit`), writing formatted results to
    /// `out` and errors to `err`.
    ///
    /// When `prompt` is set, a prompt is written to `out` before each line.
    pub async fn run_lines<R, O, E>(
        &self,
        reader: R,
        writer: &OutputWriter,
        out: &mut O,
        err: &mut E,
        prompt: bool,
    ) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        O: Write,
        E: Write,
    {
        let mut lines = reader.lines();
        let mut buffer = BlockBuffer::new();

        loop {
            if prompt {
                let prompt = if buffer.is_pending() {
                    CONTINUATION_PROMPT
                } else {
                    PROMPT
                };
                write!(out, "{prompt}")?;
                out.flush()?;
            }

            let Some(line) = lines.next_line().await? else {
                break;
            };
            let Some(input) = buffer.push_line(&line) else {
                continue;
            };

            let step = self.handle(input).await;
            emit(&step.outputs, writer, out, err)?;
            if step.quit {
                return Ok(());
            }
        }

        if let Some(input) = buffer.finish() {
            let step = self.handle(input).await;
            emit(&step.outputs, writer, out, err)?;
        }
        Ok(())
    }
}

fn emit<O: Write, E: Write>(
    outputs: &[ConsoleOutput],
    writer: &OutputWriter,
    out: &mut O,
    err: &mut E,
) -> std::io::Result<()> {
    for output in outputs {
        let text = writer.format(output);
        if output.is_error() {
            writeln!(err, "{text}")?;
        } else {
            writeln!(out, "{text}")?;
        }
    }
    out.flush()
}
