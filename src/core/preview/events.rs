use serde_json::{json, Value};

use crate::core::ports::emitter::EmitterPort;

use super::state::BuildPhase;

pub(super) fn now_iso() -> String {
    chrono::Utc::now().to_rfc3339()
}

pub(super) fn emit_build_state(
    emitter: &dyn EmitterPort,
    build_id: &str,
    phase: BuildPhase,
    detail: Option<&str>,
) {
    let mut payload = serde_json::Map::new();
    payload.insert("build_id".to_string(), json!(build_id));
    payload.insert("phase".to_string(), json!(phase.as_str()));
    payload.insert("ts".to_string(), json!(now_iso()));
    if let Some(detail) = detail {
        payload.insert("detail".to_string(), json!(detail));
    }
    emitter.emit("preview:state", &Value::Object(payload));
}

#[allow(clippy::too_many_arguments)]
pub(super) fn emit_build_done(
    emitter: &dyn EmitterPort,
    build_id: &str,
    preview_key: &str,
    chat_id: &str,
    appended: usize,
    skipped: usize,
    reused_existing: bool,
) {
    emitter.emit(
        "preview:done",
        &json!({
            "build_id": build_id,
            "preview_key": preview_key,
            "chat_id": chat_id,
            "appended": appended,
            "skipped": skipped,
            "reused_existing": reused_existing,
            "ts": now_iso(),
        }),
    );
}

pub(super) fn notify_success(emitter: &dyn EmitterPort, message: &str) {
    notify(emitter, "success", message);
}

pub(super) fn notify_warning(emitter: &dyn EmitterPort, message: &str) {
    notify(emitter, "warning", message);
}

pub(super) fn notify_error(emitter: &dyn EmitterPort, message: &str) {
    notify(emitter, "error", message);
}

fn notify(emitter: &dyn EmitterPort, level: &str, message: &str) {
    emitter.emit(
        "favorites:notice",
        &json!({
            "level": level,
            "message": message,
            "ts": now_iso(),
        }),
    );
}
