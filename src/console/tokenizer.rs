//! Tokenizer for slash-command arguments.
//!
//! Splits on whitespace, with single- and double-quoted strings kept whole
//! so favorite names may contain spaces: `/save "top players"`.

/// Tokenizes a command argument string.
///
/// - Whitespace-separated words
/// - Quoted strings: `"hello world"` → `hello world`
/// - Escapes inside quotes: `"say \"hi\""` → `say "hi"`
/// - Adjacent quoted and bare parts join: `top"  "10` → `top  10`
pub fn tokenize(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        let mut word = String::new();
        let mut quoted = false;
        while let Some(&c) = chars.peek() {
            if c.is_whitespace() {
                break;
            }
            chars.next();
            if c == '"' || c == '\'' {
                quoted = true;
                word.push_str(&collect_quoted(&mut chars, c));
            } else {
                word.push(c);
            }
        }

        if !word.is_empty() || quoted {
            tokens.push(word);
        }
    }

    tokens
}

/// Collects characters inside quotes, handling escape sequences.
fn collect_quoted(chars: &mut std::iter::Peekable<std::str::Chars<'_>>, quote: char) -> String {
    let mut result = String::new();
    let mut escaped = false;

    for c in chars.by_ref() {
        if escaped {
            match c {
                'n' => result.push('\n'),
                't' => result.push('\t'),
                '\\' | '"' | '\'' => result.push(c),
                _ => {
                    // Unknown escape, keep as-is
                    result.push('\\');
                    result.push(c);
                }
            }
            escaped = false;
            continue;
        }

        if c == '\\' {
            escaped = true;
            continue;
        }

        if c == quote {
            break;
        }

        result.push(c);
    }

    result
}

/// Parse error with context for helpful error messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// The command that failed to parse.
    pub command: String,
    /// Error message describing what went wrong.
    pub message: String,
    /// Optional hint for how to fix the error.
    pub hint: Option<String>,
}

impl ParseError {
    /// Creates a new parse error.
    pub fn new(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            message: message.into(),
            hint: None,
        }
    }

    /// Adds a hint to the error.
    pub fn with_hint(self, hint: impl Into<String>) -> Self {
        Self {
            hint: Some(hint.into()),
            ..self
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.command, self.message)?;
        if let Some(hint) = &self.hint {
            write!(f, " ({hint})")?;
        }
        Ok(())
    }
}
