use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{Map, Value};

use super::{ExtensionRuntime, FavoriteToggle};
use crate::adapters::config::Settings;
use crate::adapters::emitter::LogEmitter;
use crate::adapters::host::MemoryChatHost;
use crate::core::favorites::MessageRef;
use crate::core::ports::chat::{ChatMessage, DynError, HostEvent};
use crate::core::ports::emitter::EmitterPort;
use crate::core::ports::store::SettingsStorePort;
use crate::core::preview::BuildPacing;

struct MemoryStore {
    tree: Mutex<Map<String, Value>>,
}

impl MemoryStore {
    fn new() -> Self {
        Self {
            tree: Mutex::new(Map::new()),
        }
    }
}

impl SettingsStorePort for MemoryStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.tree.lock().expect("memory store lock").get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) {
        self.tree
            .lock()
            .expect("memory store lock")
            .insert(key.to_string(), value);
    }

    fn save_debounced(&self) {}

    fn flush(&self) -> Result<(), DynError> {
        Ok(())
    }
}

struct CapturingEmitter {
    events: Mutex<Vec<(String, Value)>>,
}

impl CapturingEmitter {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            events: Mutex::new(Vec::new()),
        })
    }

    fn on_channel(&self, channel: &str) -> Vec<Value> {
        self.events
            .lock()
            .expect("emitter lock")
            .iter()
            .filter(|(name, _)| name == channel)
            .map(|(_, payload)| payload.clone())
            .collect()
    }
}

impl EmitterPort for CapturingEmitter {
    fn emit(&self, channel: &str, payload: &Value) {
        self.events
            .lock()
            .expect("emitter lock")
            .push((channel.to_string(), payload.clone()));
    }
}

fn test_settings() -> Settings {
    Settings {
        pacing: BuildPacing {
            create_settle_ms: 0,
            switch_settle_ms: 0,
            clear_settle_ms: 0,
            append_gap_ms: 0,
            append_failure_pause_ms: 0,
        },
        ..Settings::default()
    }
}

fn message(id: i64) -> ChatMessage {
    ChatMessage {
        id,
        sender: "Seren".to_string(),
        is_user: id % 2 == 0,
        is_system: false,
        text: format!("line {id}"),
        sent_at: "2026-01-01T00:00:00Z".to_string(),
        source_message_id: None,
        extra: Value::Null,
    }
}

fn seeded_host(count: i64) -> Arc<MemoryChatHost> {
    let host = Arc::new(MemoryChatHost::new());
    host.seed_chat("main-1", "Main", (0..count).map(message).collect());
    host.select_character("C9");
    host
}

fn build_runtime(host: Arc<MemoryChatHost>) -> (Arc<CapturingEmitter>, Arc<ExtensionRuntime>) {
    let _ = env_logger::builder().is_test(true).try_init();
    let emitter = CapturingEmitter::new();
    let runtime = Arc::new(ExtensionRuntime::new(
        host,
        Arc::new(MemoryStore::new()),
        emitter.clone(),
        &test_settings(),
    ));
    (emitter, runtime)
}

#[test]
fn toggle_adds_then_removes() {
    let host = seeded_host(5);
    let (emitter, runtime) = build_runtime(host);

    let added = runtime.toggle_favorite(3).expect("toggle add");
    let FavoriteToggle::Added { favorite_id } = added else {
        panic!("expected an add, got {added:?}");
    };
    assert!(runtime.registry().is_favorited("main-1", 3));

    let removed = runtime.toggle_favorite(3).expect("toggle remove");
    assert_eq!(removed, FavoriteToggle::Removed { favorite_id });
    assert!(!runtime.registry().is_favorited("main-1", 3));

    let changed = emitter.on_channel("favorites:changed");
    assert_eq!(changed.len(), 2);
    assert_eq!(changed[0].get("count").and_then(|v| v.as_u64()), Some(1));
    assert_eq!(changed[1].get("count").and_then(|v| v.as_u64()), Some(0));
}

#[test]
fn add_favorite_is_idempotent_and_checks_liveness() {
    let host = seeded_host(5);
    let (_emitter, runtime) = build_runtime(host);

    assert!(runtime.add_favorite(2).expect("add").is_some());
    assert_eq!(runtime.add_favorite(2).expect("repeat add"), None);

    let err = runtime.add_favorite(42).expect_err("message is gone");
    assert!(err.to_string().contains("not in the live chat"));
}

#[test]
fn operations_require_an_active_conversation() {
    let host = Arc::new(MemoryChatHost::new());
    let (_emitter, runtime) = build_runtime(host);

    let err = runtime.add_favorite(0).expect_err("no active chat");
    assert!(err.to_string().contains("no active conversation"));
    assert!(runtime.list_favorites().is_err());
    assert!(runtime.toggle_favorite(0).is_err());
}

#[test]
fn notes_and_removal_round_trip() {
    let host = seeded_host(6);
    let (_emitter, runtime) = build_runtime(host);

    let id = runtime.add_favorite(1).expect("add").expect("assigned");
    assert!(runtime.set_favorite_note(id, "opening scene").expect("note"));
    let listed = runtime.list_favorites().expect("list");
    assert_eq!(listed[0].note, "opening scene");

    assert!(runtime.remove_favorite(id).expect("remove"));
    assert!(!runtime.remove_favorite(id).expect("second remove is a no-op"));

    runtime.add_favorite(2).expect("add").expect("assigned");
    assert!(runtime.remove_favorite_by_message(2).expect("remove by message"));
    assert!(!runtime.remove_favorite_by_message(2).expect("repeat is a no-op"));
}

#[test]
fn clear_invalid_drops_dangling_favorites_and_notifies() {
    let host = seeded_host(3);
    let (emitter, runtime) = build_runtime(host);
    runtime.add_favorite(0).expect("add").expect("assigned");
    runtime.add_favorite(2).expect("add").expect("assigned");
    runtime
        .registry()
        .add(
            "main-1",
            MessageRef {
                message_id: 9,
                is_user: false,
                sender: "Seren".to_string(),
                preview: "gone".to_string(),
            },
        )
        .expect("dangling record");

    let removed = runtime.clear_invalid().expect("clear invalid");
    assert_eq!(removed, 1);
    assert_eq!(
        runtime.registry().favorited_message_ids("main-1"),
        vec![0, 2]
    );

    let notices = emitter.on_channel("favorites:notice");
    assert!(notices
        .iter()
        .any(|n| n.get("message").and_then(|v| v.as_str())
            == Some("Removed 1 invalid favorite(s)")));
}

#[tokio::test]
async fn preview_build_runs_through_the_runtime() {
    let host = seeded_host(8);
    let (emitter, runtime) = build_runtime(host.clone());
    runtime.add_favorite(5).expect("add").expect("assigned");
    runtime.add_favorite(1).expect("add").expect("assigned");

    let report = runtime.build_preview().await.expect("build");
    assert_eq!(report.appended, 2);
    let ids: Vec<i64> = host
        .messages_of(&report.chat_id)
        .iter()
        .map(|m| m.id)
        .collect();
    assert_eq!(ids, vec![1, 5]);
    assert_eq!(emitter.on_channel("preview:done").len(), 1);
}

#[tokio::test]
async fn event_pump_refreshes_indicators_on_host_events() {
    let host = seeded_host(4);
    let (emitter, runtime) = build_runtime(host.clone());
    runtime.add_favorite(1).expect("add").expect("assigned");
    let baseline = emitter.on_channel("favorites:changed").len();

    let pump = runtime.start_event_pump();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(emitter.on_channel("favorites:changed").len(), baseline + 1);

    host.emit_host_event(HostEvent::MessageReceived);
    tokio::time::sleep(Duration::from_millis(50)).await;
    let after = emitter.on_channel("favorites:changed");
    assert_eq!(after.len(), baseline + 2);
    let last = after.last().expect("refresh payload");
    assert_eq!(
        last.get("message_ids")
            .and_then(|v| v.as_array())
            .map(|ids| ids.len()),
        Some(1)
    );

    pump.abort();
}

#[test]
fn refresh_without_active_chat_is_silent() {
    let host = Arc::new(MemoryChatHost::new());
    let (emitter, runtime) = build_runtime(host);
    runtime.refresh_indicators();
    assert!(emitter.on_channel("favorites:changed").is_empty());
}

#[tokio::test]
async fn headless_wiring_runs_with_the_log_emitter() {
    let _ = env_logger::builder().is_test(true).try_init();
    let host = seeded_host(3);
    let runtime = Arc::new(ExtensionRuntime::new(
        host.clone(),
        Arc::new(MemoryStore::new()),
        Arc::new(LogEmitter),
        &test_settings(),
    ));

    runtime.add_favorite(1).expect("add").expect("assigned");
    let report = runtime.build_preview().await.expect("build");
    assert_eq!(report.appended, 1);
    assert_eq!(host.messages_of(&report.chat_id).len(), 1);
}
