use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

#[test]
fn help_lists_sync_subcommand() {
    let mut cmd = Command::cargo_bin("portal-sync").expect("Binary exists");
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("sync"));
}

#[test]
fn sync_fails_without_portal_config() {
    let root = tempdir().expect("temp dir");
    let mut cmd = Command::cargo_bin("portal-sync").expect("Binary exists");

    cmd.arg("sync")
        .arg("--root")
        .arg(root.path())
        .arg("--pat")
        .arg("kpat_test")
        .env_remove("INPUT_KONNECT_PAT");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("portal.yaml"));
}

#[test]
fn sync_fails_without_token() {
    let root = tempdir().expect("temp dir");
    std::fs::write(root.path().join("portal.yaml"), "portalId: p-1\n").unwrap();

    let mut cmd = Command::cargo_bin("portal-sync").expect("Binary exists");
    cmd.arg("sync")
        .arg("--root")
        .arg(root.path())
        .env_remove("INPUT_KONNECT_PAT");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("INPUT_KONNECT_PAT"));
}

use std::sync::{Arc, Mutex};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{layer::Context, Layer, Registry};

/// Custom Layer to collect emitted event messages.
struct EventCollector {
    events: Arc<Mutex<Vec<String>>>,
}

impl<S> Layer<S> for EventCollector
where
    S: tracing::Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        self.events.lock().unwrap().push(format!("{:?}", event));
    }
}

#[tokio::test]
async fn emits_trace_initialised_event() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let collector = EventCollector {
        events: events.clone(),
    };
    let subscriber = Registry::default().with(collector);
    let _guard = tracing::subscriber::set_default(subscriber);

    use portal_sync::cli::{run, Cli, Commands};

    let cli = Cli {
        command: Commands::Sync {
            root: std::path::PathBuf::from("does-not-exist"),
            pat: Some("kpat_test".into()),
            api_url: None,
        },
    };

    let result = run(cli).await;
    assert!(result.is_err(), "missing portal tree must fail");

    let event_msgs = events.lock().unwrap();
    assert!(
        event_msgs.iter().any(|msg| msg.contains("trace_initialised")),
        "Expected a 'trace_initialised' trace event, got: {:?}",
        event_msgs
    );
}
