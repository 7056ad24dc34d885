//! Integration tests for statement splitting.

use graph_console::splitter::{split, SplitQuery};
use pretty_assertions::assert_eq;

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_console_session_script() {
    let raw = "\
:param team => 'Spurs';
:params;
USE basketballplayer;\\
MATCH (v:player)-[:serve]->(t:team {name: $team}) RETURN v;
SHOW HOSTS; SHOW SPACES;
YIELD \"done;\nreally\"";

    assert_eq!(
        split(raw),
        SplitQuery {
            param_directives: strings(&[":param team => 'Spurs'", ":params"]),
            statements: strings(&[
                "USE basketballplayer;MATCH (v:player)-[:serve]->(t:team {name: $team}) RETURN v",
                "SHOW HOSTS; SHOW SPACES",
                "YIELD \"done;\nreally\"",
            ]),
        }
    );
}

#[test]
fn test_text_without_semicolons_is_one_trimmed_statement() {
    for raw in ["SHOW SPACES", "  MATCH (v)\n  RETURN v  ", "\tYIELD 1\n"] {
        assert_eq!(split(raw).statements, vec![raw.trim().to_string()]);
        assert!(split(raw).param_directives.is_empty());
    }
}

#[test]
fn test_directive_only_input() {
    let result = split(":param a => 1;\n:param b => 2");
    assert!(result.statements.is_empty());
    assert_eq!(
        result.param_directives,
        strings(&[":param a => 1", ":param b => 2"])
    );
    assert!(result.requires_param_refresh());
}

#[test]
fn test_split_never_panics_on_odd_input() {
    let inputs = [
        "\"",
        "'",
        "\\",
        ";\\",
        ";\\\n",
        "'\\",
        "\";\n\\'",
        "\r\n;\r\n",
        "ä;\nö;\\\nü",
    ];
    for raw in inputs {
        let result = split(raw);
        for part in result.statements.iter().chain(&result.param_directives) {
            assert_eq!(part.trim(), part);
            assert!(!part.is_empty());
        }
    }
}
