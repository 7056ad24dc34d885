//! Integration tests for the line-oriented console.

use graph_console::backend::MockBackend;
use graph_console::console::Console;
use graph_console::output::{OutputFormat, OutputWriter};
use graph_console::persistence::MemoryStore;
use graph_console::session::{SessionConfig, SessionCoordinator};
use std::sync::Arc;
use std::time::Duration;

async fn create_session() -> SessionCoordinator {
    let config = SessionConfig {
        settle_delay: Duration::ZERO,
        ..SessionConfig::default()
    };
    SessionCoordinator::new(
        Arc::new(MockBackend::new()),
        Arc::new(MemoryStore::new()),
        config,
    )
    .await
    .unwrap()
}

async fn run(console: &Console<'_>, script: &str, format: OutputFormat) -> (String, String) {
    let mut out = Vec::new();
    let mut err = Vec::new();
    console
        .run_lines(
            script.as_bytes(),
            &OutputWriter::new(format),
            &mut out,
            &mut err,
            false,
        )
        .await
        .unwrap();
    (
        String::from_utf8(out).unwrap(),
        String::from_utf8(err).unwrap(),
    )
}

#[tokio::test]
async fn test_json_script() {
    let session = create_session().await;
    let console = Console::new(&session);
    let script = ":param p => 7;\nYIELD $p;\n/params\n";

    let (out, err) = run(&console, script, OutputFormat::Json).await;
    assert!(err.is_empty(), "unexpected errors: {err}");

    let docs: Vec<serde_json::Value> = out
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(docs.len(), 3);
    assert_eq!(docs[0]["results"][0]["text"], ":param p => 7;");
    assert_eq!(docs[1]["results"][0]["text"], "YIELD $p;");
    assert_eq!(docs[2]["params"]["p"], 7);
}

#[tokio::test]
async fn test_split_only_script() {
    let session = create_session().await;
    let console = Console::new(&session).split_only(true);
    let script = "USE nba;\\\nMATCH (v) RETURN v;\n:params\n\n";

    let (out, _) = run(&console, script, OutputFormat::Text).await;

    assert_eq!(
        out,
        "statement: USE nba;MATCH (v) RETURN v;\ndirective: :params\n"
    );
    assert!(session.snapshot().history.is_empty());
}

#[tokio::test]
async fn test_favorites_workflow() {
    let session = create_session().await;
    let console = Console::new(&session);
    let script = "\
SHOW SPACES;
/save \"all spaces\"
/reset
/run \"all spaces\"
/forget \"all spaces\"
/favorites
";

    let (out, err) = run(&console, script, OutputFormat::Text).await;

    assert!(err.is_empty(), "unexpected errors: {err}");
    assert!(out.contains("Saved favorite 'all spaces'."));
    assert!(out.contains("Session reset."));
    assert!(out.contains("Removed favorite 'all spaces'."));
    assert!(out.ends_with("No favorites saved.\n"));
    assert_eq!(session.snapshot().history.len(), 1);
}
