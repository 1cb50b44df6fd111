use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{Map, Value};

use crate::core::ports::chat::DynError;
use crate::core::ports::store::SettingsStorePort;

/// File-backed settings namespace: one pretty-printed JSON object.
///
/// `set` mutates the in-memory tree only. `save_debounced` schedules a
/// write after the debounce window and collapses bursts through a
/// generation counter; outside a tokio runtime it degrades to an
/// immediate write. `flush` writes synchronously and supersedes any
/// pending debounced write.
pub struct JsonSettingsStore {
    inner: Arc<Inner>,
}

struct Inner {
    path: PathBuf,
    tree: Mutex<Map<String, Value>>,
    save_generation: AtomicU64,
    debounce_ms: u64,
}

pub fn default_settings_path() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".starmark/settings.json"))
        .unwrap_or_else(|| PathBuf::from(".starmark/settings.json"))
}

impl JsonSettingsStore {
    pub fn open(path: impl Into<PathBuf>, debounce_ms: u64) -> Self {
        let path = path.into();
        let tree = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<Value>(&raw) {
                Ok(Value::Object(map)) => map,
                Ok(_) => {
                    log::warn!(
                        "settings file {} is not a JSON object, starting empty",
                        path.display()
                    );
                    Map::new()
                }
                Err(err) => {
                    log::warn!(
                        "settings file {} is unreadable ({err}), starting empty",
                        path.display()
                    );
                    Map::new()
                }
            },
            Err(_) => Map::new(),
        };
        Self {
            inner: Arc::new(Inner {
                path,
                tree: Mutex::new(tree),
                save_generation: AtomicU64::new(0),
                debounce_ms,
            }),
        }
    }
}

impl Inner {
    fn write_file(&self) -> Result<(), DynError> {
        let body = {
            let tree = self.tree.lock().expect("settings tree lock poisoned");
            serde_json::to_string_pretty(&Value::Object(tree.clone()))?
        };
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, body)?;
        Ok(())
    }
}

impl SettingsStorePort for JsonSettingsStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.inner
            .tree
            .lock()
            .expect("settings tree lock poisoned")
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: Value) {
        self.inner
            .tree
            .lock()
            .expect("settings tree lock poisoned")
            .insert(key.to_string(), value);
    }

    fn save_debounced(&self) {
        let inner = Arc::clone(&self.inner);
        let scheduled = inner.save_generation.fetch_add(1, Ordering::SeqCst) + 1;
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    tokio::time::sleep(Duration::from_millis(inner.debounce_ms)).await;
                    // A later save or flush supersedes this one.
                    if inner.save_generation.load(Ordering::SeqCst) != scheduled {
                        return;
                    }
                    if let Err(err) = inner.write_file() {
                        log::warn!("debounced settings save failed: {err}");
                    }
                });
            }
            Err(_) => {
                if let Err(err) = inner.write_file() {
                    log::warn!("settings save failed: {err}");
                }
            }
        }
    }

    fn flush(&self) -> Result<(), DynError> {
        // Invalidate pending debounced writes; this write is newer.
        self.inner.save_generation.fetch_add(1, Ordering::SeqCst);
        self.inner.write_file()
    }
}

impl Drop for JsonSettingsStore {
    fn drop(&mut self) {
        let _ = self.inner.write_file();
    }
}
