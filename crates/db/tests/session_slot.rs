use guidepost_core::config::{SessionBackend, SessionConfig};
use guidepost_core::flows::PlayerState;
use guidepost_core::script::ConversationScript;
use guidepost_core::session::{PlayerSnapshot, StepRecord};
use guidepost_db::open_session_store;

fn sqlite_config(url: String) -> SessionConfig {
    SessionConfig { backend: SessionBackend::Sqlite, url, key: "demo".to_owned(), max_connections: 2 }
}

fn analyzing_snapshot() -> PlayerSnapshot {
    let script = ConversationScript::supplier_delay();
    let mut first = script.steps()[0].start();
    first.complete(script.steps()[0].result.clone()).expect("complete first step");
    let second = script.steps()[1].start();

    let mut snapshot = PlayerSnapshot::idle("demo");
    snapshot.state = PlayerState::Analyzing;
    snapshot.steps = vec![StepRecord::from(&first), StepRecord::from(&second)];
    snapshot
}

#[tokio::test]
async fn sqlite_slot_survives_reopening_the_database() {
    let dir = tempfile::tempdir().expect("tempdir");
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("guidepost.db").display());
    let snapshot = analyzing_snapshot();

    {
        let store = open_session_store(&sqlite_config(url.clone())).await.expect("open");
        store.save("demo", &snapshot).await.expect("save");
    }

    let reopened = open_session_store(&sqlite_config(url)).await.expect("reopen");
    let loaded = reopened.load("demo").await.expect("load").expect("slot present");
    assert_eq!(loaded, snapshot);

    let steps = loaded.restore_steps();
    assert_eq!(steps.len(), 2);
    assert_eq!(steps[0].icon, ConversationScript::supplier_delay().steps()[0].start().icon);

    let slots = reopened.list().await.expect("list");
    assert_eq!(slots.len(), 1);
    assert_eq!(slots[0].state, "analyzing");
}
