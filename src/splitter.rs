//! Statement splitting for console input.
//!
//! Partitions one raw submission into parameter directives and executable
//! statements. The rules mirror the graph console's line semantics:
//!
//! - `a; b; c;` on one line is a single unit (the backend reports the last
//!   clause's result).
//! - A `;` at the end of a line terminates a unit, so `a;\nb;` is two units.
//! - `;\` at the end of a line continues the unit on the next line; the
//!   backslash and line break are removed, so `a;\\\nb;` becomes `a;b;`.
//!
//! Quoted runs (`'...'` or `"..."`, with `\` escaping the next character)
//! are opaque: nothing inside them ever splits or gets rewritten. An
//! unterminated quote runs to the end of input.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Prefix that marks a session-parameter directive.
pub const DIRECTIVE_PREFIX: char = ':';

/// Result of splitting one raw submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitQuery {
    /// `:`-prefixed directives, in input order.
    pub param_directives: Vec<String>,
    /// Executable statements with continuation markers removed, in input order.
    pub statements: Vec<String>,
}

impl SplitQuery {
    /// Returns true if the input produced neither directives nor statements.
    pub fn is_empty(&self) -> bool {
        self.param_directives.is_empty() && self.statements.is_empty()
    }

    /// Returns true if any directive may change session parameters.
    ///
    /// Read-only `:params` inspections never require a refresh.
    pub fn requires_param_refresh(&self) -> bool {
        self.param_directives
            .iter()
            .any(|directive| !is_param_inspection(directive))
    }
}

/// Splits raw console input into parameter directives and statements.
///
/// Never fails: any input, including malformed quoting, yields a result.
pub fn split(raw: &str) -> SplitQuery {
    let mut result = SplitQuery::default();

    for segment in cut_segments(raw) {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }

        if segment.starts_with(DIRECTIVE_PREFIX) {
            result.param_directives.push(segment.to_string());
        } else {
            let statement = join_continuations(segment);
            if !statement.is_empty() {
                result.statements.push(statement);
            }
        }
    }

    result
}

/// Returns true for a read-only parameter inspection directive (`:params`).
pub fn is_param_inspection(directive: &str) -> bool {
    static INSPECTION: OnceLock<Regex> = OnceLock::new();
    INSPECTION
        .get_or_init(|| Regex::new(r"(?i)^\s*:params").expect("static pattern is valid"))
        .is_match(directive)
}

/// Returns true if `text` ends inside a quoted run that was never closed.
///
/// Uses the same quoting rules as [`split`], so a caller buffering lines can
/// tell whether a `;` or a blank line it sees is still quoted content.
pub fn ends_open_quote(text: &str) -> bool {
    let mut scanner = UnquotedBytes::new(text.as_bytes());
    scanner.by_ref().for_each(drop);
    scanner.unterminated
}

/// Splits one statement into its clauses at every unquoted `;`.
///
/// Used to find the clause whose result a backend reports when several
/// clauses share a unit. Empty clauses are dropped.
pub fn clauses(statement: &str) -> Vec<&str> {
    let bytes = statement.as_bytes();
    let mut clauses = Vec::new();
    let mut start = 0;

    for (pos, byte) in UnquotedBytes::new(bytes) {
        if byte == b';' {
            clauses.push(&statement[start..pos]);
            start = pos + 1;
        }
    }
    clauses.push(&statement[start..]);

    clauses
        .into_iter()
        .map(str::trim)
        .filter(|clause| !clause.is_empty())
        .collect()
}

/// Cuts the input at every unquoted `;` that ends a line.
///
/// The terminating `;` is dropped; the line break stays with the next
/// segment and is removed by trimming.
fn cut_segments(raw: &str) -> Vec<&str> {
    let bytes = raw.as_bytes();
    let mut segments = Vec::new();
    let mut start = 0;

    for (pos, byte) in UnquotedBytes::new(bytes) {
        if byte == b';' && line_break_len(bytes, pos + 1).is_some() {
            segments.push(&raw[start..pos]);
            start = pos + 1;
        }
    }
    segments.push(&raw[start..]);

    segments
}

/// Rewrites every unquoted `;\` + line break to a bare `;`.
fn join_continuations(segment: &str) -> String {
    let bytes = segment.as_bytes();
    let mut joined = String::with_capacity(segment.len());
    let mut copied = 0;
    let mut scanner = UnquotedBytes::new(bytes);

    while let Some((pos, byte)) = scanner.next() {
        if byte != b';' || bytes.get(pos + 1) != Some(&b'\\') {
            continue;
        }
        if let Some(len) = line_break_len(bytes, pos + 2) {
            joined.push_str(&segment[copied..=pos]);
            copied = pos + 2 + len;
            scanner.skip_to(copied);
        }
    }
    joined.push_str(&segment[copied..]);

    joined
}

/// Length of the line break starting at `pos` (`\n` or `\r\n`), if any.
fn line_break_len(bytes: &[u8], pos: usize) -> Option<usize> {
    match (bytes.get(pos), bytes.get(pos + 1)) {
        (Some(b'\n'), _) => Some(1),
        (Some(b'\r'), Some(b'\n')) => Some(2),
        _ => None,
    }
}

/// Iterates over the bytes of a string that lie outside quoted runs.
///
/// Quote delimiters and everything between them are skipped. Only ASCII
/// bytes are ever compared, so positions yielded for `;` are always valid
/// char boundaries.
struct UnquotedBytes<'a> {
    bytes: &'a [u8],
    pos: usize,
    /// Set once a quoted run reaches the end of input without closing.
    unterminated: bool,
}

impl<'a> UnquotedBytes<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            pos: 0,
            unterminated: false,
        }
    }

    /// Moves the cursor forward; never moves it back.
    fn skip_to(&mut self, pos: usize) {
        self.pos = self.pos.max(pos);
    }

    /// Returns the position just past the quoted run opening at `open`, or
    /// `None` if the run is still open at the end of input.
    fn end_of_quoted(&self, open: usize) -> Option<usize> {
        let quote = self.bytes[open];
        let mut pos = open + 1;

        while pos < self.bytes.len() {
            match self.bytes[pos] {
                b'\\' => pos += 2,
                byte if byte == quote => return Some(pos + 1),
                _ => pos += 1,
            }
        }

        None
    }
}

impl Iterator for UnquotedBytes<'_> {
    type Item = (usize, u8);

    fn next(&mut self) -> Option<Self::Item> {
        while self.pos < self.bytes.len() {
            let pos = self.pos;
            match self.bytes[pos] {
                b'\'' | b'"' => match self.end_of_quoted(pos) {
                    Some(end) => self.pos = end,
                    None => {
                        self.unterminated = true;
                        self.pos = self.bytes.len();
                    }
                },
                byte => {
                    self.pos += 1;
                    return Some((pos, byte));
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn statements(raw: &str) -> Vec<String> {
        split(raw).statements
    }

    #[test]
    fn test_single_statement_without_semicolon() {
        assert_eq!(statements("  SHOW SPACES  "), vec!["SHOW SPACES"]);
    }

    #[test]
    fn test_empty_and_blank_input() {
        assert!(split("").is_empty());
        assert!(split("   \n\t  ").is_empty());
        assert!(split(";\n;\n").is_empty());
    }

    #[test]
    fn test_same_line_statements_stay_together() {
        assert_eq!(
            statements("stmt1; stmt2; stmt3;"),
            vec!["stmt1; stmt2; stmt3;"]
        );
    }

    #[test]
    fn test_line_terminated_statements_split() {
        assert_eq!(
            statements("stmt1;\nstmt2;\nstmt3;"),
            vec!["stmt1", "stmt2", "stmt3;"]
        );
    }

    #[test]
    fn test_crlf_line_endings_split() {
        assert_eq!(statements("stmt1;\r\nstmt2;"), vec!["stmt1", "stmt2;"]);
    }

    #[test]
    fn test_semicolon_before_trailing_spaces_does_not_split() {
        assert_eq!(statements("stmt1;  \nstmt2"), vec!["stmt1;  \nstmt2"]);
    }

    #[test]
    fn test_continuation_joins_lines() {
        assert_eq!(statements("stmt1;\\\nstmt2"), vec!["stmt1;stmt2"]);
        // A final `;` with no line break after it is not a terminator and stays.
        assert_eq!(
            statements("stmt1;\\\nstmt2;\\\nstmt3;"),
            vec!["stmt1;stmt2;stmt3;"]
        );
    }

    #[test]
    fn test_continuation_with_crlf() {
        assert_eq!(statements("stmt1;\\\r\nstmt2;"), vec!["stmt1;stmt2;"]);
    }

    #[test]
    fn test_continuation_followed_by_terminated_line() {
        assert_eq!(
            statements("USE nba;\\\nMATCH (v) RETURN v;\nSHOW HOSTS;"),
            vec!["USE nba;MATCH (v) RETURN v", "SHOW HOSTS;"]
        );
    }

    #[test]
    fn test_semicolon_in_double_quotes() {
        assert_eq!(statements("select \"a;b\""), vec!["select \"a;b\""]);
        assert_eq!(
            statements("YIELD \"x;\ny\";\nSHOW HOSTS"),
            vec!["YIELD \"x;\ny\"", "SHOW HOSTS"]
        );
    }

    #[test]
    fn test_semicolon_in_single_quotes() {
        assert_eq!(
            statements("YIELD 'a;\nb' AS s;\nSHOW HOSTS"),
            vec!["YIELD 'a;\nb' AS s", "SHOW HOSTS"]
        );
    }

    #[test]
    fn test_escaped_quote_does_not_close_run() {
        let raw = "YIELD \"say \\\";\n\" AS s;\nSHOW HOSTS";
        assert_eq!(
            statements(raw),
            vec!["YIELD \"say \\\";\n\" AS s", "SHOW HOSTS"]
        );
    }

    #[test]
    fn test_other_quote_kind_inside_run() {
        assert_eq!(
            statements("YIELD \"it's;\n\";\nSHOW HOSTS"),
            vec!["YIELD \"it's;\n\"", "SHOW HOSTS"]
        );
    }

    #[test]
    fn test_quoted_continuation_is_not_rewritten() {
        assert_eq!(
            statements("YIELD \"a;\\\nb\";\\\nSHOW HOSTS"),
            vec!["YIELD \"a;\\\nb\";SHOW HOSTS"]
        );
    }

    #[test]
    fn test_unterminated_quote_swallows_rest() {
        assert_eq!(
            statements("YIELD \"open;\nSHOW HOSTS;\nSHOW SPACES"),
            vec!["YIELD \"open;\nSHOW HOSTS;\nSHOW SPACES"]
        );
        assert_eq!(statements("YIELD 'abc\\"), vec!["YIELD 'abc\\"]);
    }

    #[test]
    fn test_ends_open_quote() {
        assert!(!ends_open_quote("YIELD 1;"));
        assert!(!ends_open_quote("YIELD \"a;\nb\";"));
        assert!(ends_open_quote("YIELD \"a;"));
        assert!(ends_open_quote("YIELD 'it\\'s;"));
        assert!(ends_open_quote("YIELD \"x\\"));
        assert!(!ends_open_quote("YIELD \"it's\";"));
    }

    #[test]
    fn test_directives_are_extracted() {
        let result = split(":param p1 => 1;\nMATCH (v) RETURN v;\n:params");
        assert_eq!(result.param_directives, vec![":param p1 => 1", ":params"]);
        assert_eq!(result.statements, vec!["MATCH (v) RETURN v"]);
    }

    #[test]
    fn test_directives_only() {
        let result = split("  :params  ");
        assert_eq!(result.param_directives, vec![":params"]);
        assert!(result.statements.is_empty());
    }

    #[test]
    fn test_directive_detection_after_trim() {
        let result = split("SHOW SPACES;\n   :param x => 2");
        assert_eq!(result.param_directives, vec![":param x => 2"]);
        assert_eq!(result.statements, vec!["SHOW SPACES"]);
    }

    #[test]
    fn test_unicode_content_is_preserved() {
        assert_eq!(
            statements("YIELD \"héllo;\n\" AS s;\nYIELD 'ünï'"),
            vec!["YIELD \"héllo;\n\" AS s", "YIELD 'ünï'"]
        );
    }

    #[test]
    fn test_is_param_inspection() {
        assert!(is_param_inspection(":params"));
        assert!(is_param_inspection("  :PARAMS"));
        assert!(is_param_inspection(":params p1"));
        assert!(!is_param_inspection(":param p1 => 1"));
        assert!(!is_param_inspection("SHOW :params"));
    }

    #[test]
    fn test_requires_param_refresh() {
        assert!(!split(":params").requires_param_refresh());
        assert!(split(":param p => 1").requires_param_refresh());
        assert!(split(":params;\n:param p => 1").requires_param_refresh());
        assert!(!split("SHOW SPACES").requires_param_refresh());
    }

    #[test]
    fn test_clauses() {
        assert_eq!(
            clauses("USE nba; MATCH (v) RETURN v;"),
            vec!["USE nba", "MATCH (v) RETURN v"]
        );
        assert_eq!(clauses("YIELD \"a;b\""), vec!["YIELD \"a;b\""]);
        assert!(clauses(" ; ").is_empty());
    }
}
