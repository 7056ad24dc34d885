//! Slash-command parsing.
//!
//! Lines starting with `/` control the console itself; everything else is
//! query input and goes to the splitter.

use super::tokenizer::{tokenize, ParseError};

/// Help text displayed for the /help command.
pub const HELP_TEXT: &str = r#"Query input:
  Lines ending with `;` run immediately; `;\` continues on the next line.
  A blank line runs whatever has been typed so far.
  `:param <name> => <value>` sets a session parameter, `:params` lists them.

Console commands:
  /favorites        - List saved statements
  /save <name>      - Save the last run text as a favorite
  /run <name>       - Run a favorite
  /forget <name>    - Delete a favorite
  /params           - Fetch and show session parameters
  /history [N]      - Show past results, newest first
  /reset            - Restore the default statement and clear history
  /help             - Show this help message
  /quit, /exit      - Exit the console"#;

/// A parsed console command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Favorites,
    Save(String),
    Run(String),
    Forget(String),
    Params,
    History { limit: Option<usize> },
    Reset,
    Help,
    Quit,
}

impl Command {
    /// Returns true if `line` should be parsed as a command.
    pub fn is_command(line: &str) -> bool {
        line.trim_start().starts_with('/')
    }

    /// Parses a `/`-prefixed line.
    pub fn parse(input: &str) -> Result<Command, ParseError> {
        let input = input.trim();
        let (command, args) = match input.split_once(char::is_whitespace) {
            Some((command, args)) => (command, args),
            None => (input, ""),
        };
        let command = command.to_lowercase();
        let args = tokenize(args);

        match command.as_str() {
            "/favorites" | "/favs" => no_args(&command, &args, Command::Favorites),
            "/save" => single_name(&command, &args).map(Command::Save),
            "/run" => single_name(&command, &args).map(Command::Run),
            "/forget" => single_name(&command, &args).map(Command::Forget),
            "/params" => no_args(&command, &args, Command::Params),
            "/history" => parse_history(&command, &args),
            "/reset" => no_args(&command, &args, Command::Reset),
            "/help" => Ok(Command::Help),
            "/quit" | "/exit" => Ok(Command::Quit),
            _ => Err(ParseError::new(command.as_str(), "unknown command")
                .with_hint("Type /help for available commands")),
        }
    }
}

fn no_args(command: &str, args: &[String], parsed: Command) -> Result<Command, ParseError> {
    if args.is_empty() {
        Ok(parsed)
    } else {
        Err(ParseError::new(command, "takes no arguments"))
    }
}

fn single_name(command: &str, args: &[String]) -> Result<String, ParseError> {
    match args {
        [name] if !name.trim().is_empty() => Ok(name.clone()),
        [] | [_] => Err(ParseError::new(command, "missing name")
            .with_hint(format!("Usage: {command} <name>"))),
        _ => Err(ParseError::new(command, "expected a single name")
            .with_hint("Quote names that contain spaces")),
    }
}

fn parse_history(command: &str, args: &[String]) -> Result<Command, ParseError> {
    match args {
        [] => Ok(Command::History { limit: None }),
        [limit] => limit
            .parse::<usize>()
            .map(|limit| Command::History { limit: Some(limit) })
            .map_err(|_| {
                ParseError::new(command, format!("invalid limit '{limit}'"))
                    .with_hint("Usage: /history [N]")
            }),
        _ => Err(ParseError::new(command, "too many arguments")),
    }
}
