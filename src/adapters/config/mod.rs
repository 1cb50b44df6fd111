use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::adapters::settings_store::default_settings_path;
use crate::core::preview::BuildPacing;

/// Bump this when adding new fields with non-trivial defaults.
/// When a loaded config has a lower version, it is re-saved to disk
/// so that users see the new keys in their `config.toml`.
const CURRENT_CONFIG_VERSION: u32 = 1;

fn default_preview_chat_name() -> String {
    "<Preview Chat>".to_string()
}

fn default_save_debounce_ms() -> u64 {
    500
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct Settings {
    pub config_version: u32,
    /// Display name assigned to newly created preview conversations.
    /// Cosmetic; reuse is keyed on the recorded conversation id.
    #[serde(default = "default_preview_chat_name")]
    pub preview_chat_name: String,
    /// Override for the favorites settings file; defaults to
    /// `~/.starmark/settings.json`.
    pub settings_path: Option<String>,
    #[serde(default = "default_save_debounce_ms")]
    pub save_debounce_ms: u64,
    #[serde(default)]
    pub pacing: BuildPacing,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            config_version: 0,
            preview_chat_name: default_preview_chat_name(),
            settings_path: None,
            save_debounce_ms: default_save_debounce_ms(),
            pacing: BuildPacing::default(),
        }
    }
}

impl Settings {
    fn global_config_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".starmark")
    }

    fn global_config_path() -> PathBuf {
        Self::global_config_dir().join("config.toml")
    }

    pub fn load_global() -> Self {
        let path = Self::global_config_path();
        if path.exists() {
            let content = std::fs::read_to_string(&path).unwrap_or_default();
            let mut settings: Self = match toml::from_str(&content) {
                Ok(s) => s,
                Err(e) => {
                    eprintln!(
                        "[config] Failed to parse {}: {e}. Using defaults.",
                        path.display()
                    );
                    Self::default()
                }
            };

            // Re-save when config is from an older version so new fields
            // (with their defaults) appear in the file on disk.
            if settings.config_version < CURRENT_CONFIG_VERSION {
                settings.config_version = CURRENT_CONFIG_VERSION;
                if let Err(e) = settings.save() {
                    eprintln!(
                        "[config] Failed to migrate config to v{CURRENT_CONFIG_VERSION}: {e}"
                    );
                }
            }

            settings
        } else {
            Self {
                config_version: CURRENT_CONFIG_VERSION,
                ..Self::default()
            }
        }
    }

    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        let global_dir = Self::global_config_dir();
        std::fs::create_dir_all(&global_dir)?;
        let content = toml::to_string_pretty(self)?;
        std::fs::write(Self::global_config_path(), &content)?;
        Ok(())
    }

    pub fn set_preview_chat_name(&mut self, name: &str) {
        let normalized = name.trim();
        if normalized.is_empty() {
            self.preview_chat_name = default_preview_chat_name();
            return;
        }
        self.preview_chat_name = normalized.to_string();
    }

    pub fn preview_chat_name(&self) -> String {
        let trimmed = self.preview_chat_name.trim();
        if trimmed.is_empty() {
            default_preview_chat_name()
        } else {
            trimmed.to_string()
        }
    }

    /// Where the favorites settings namespace lives on disk.
    pub fn settings_store_path(&self) -> PathBuf {
        self.settings_path
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_settings_path)
    }
}

#[cfg(test)]
mod tests {
    use super::{Settings, CURRENT_CONFIG_VERSION};

    #[test]
    fn defaults_match_the_documented_pacing() {
        let settings = Settings::default();
        assert_eq!(settings.preview_chat_name(), "<Preview Chat>");
        assert_eq!(settings.save_debounce_ms, 500);
        assert_eq!(settings.pacing.create_settle_ms, 2_000);
        assert_eq!(settings.pacing.switch_settle_ms, 1_000);
        assert_eq!(settings.pacing.clear_settle_ms, 300);
        assert_eq!(settings.pacing.append_gap_ms, 100);
        assert_eq!(settings.pacing.append_failure_pause_ms, 500);
    }

    #[test]
    fn old_config_without_version_gets_defaults_on_deserialize() {
        // Simulates an old config.toml that has no config_version field.
        // serde(default) should set config_version to 0 (u32 default).
        let toml_str = r#"
preview_chat_name = "Favorites Review"
"#;
        let settings: Settings = toml::from_str(toml_str).expect("parse old config");
        assert_eq!(settings.config_version, 0);
        assert_eq!(settings.preview_chat_name(), "Favorites Review");
        assert_eq!(settings.save_debounce_ms, 500);
        assert_eq!(settings.pacing.append_gap_ms, 100);
    }

    #[test]
    fn default_settings_have_zero_config_version_for_serde() {
        // Default::default() returns version 0 so that serde fills missing
        // config_version as 0 (triggers migration). load_global() bumps it.
        let settings = Settings::default();
        assert_eq!(settings.config_version, 0);
    }

    #[test]
    fn partial_pacing_table_fills_the_rest_with_defaults() {
        let toml_str = "[pacing]\nappend_gap_ms = 0\ncreate_settle_ms = 50\n";
        let settings: Settings = toml::from_str(toml_str).expect("parse pacing override");
        assert_eq!(settings.pacing.append_gap_ms, 0);
        assert_eq!(settings.pacing.create_settle_ms, 50);
        assert_eq!(settings.pacing.switch_settle_ms, 1_000);
        assert_eq!(settings.pacing.append_failure_pause_ms, 500);
    }

    #[test]
    fn set_preview_chat_name_trims_and_restores_default_on_empty() {
        let mut settings = Settings::default();
        settings.set_preview_chat_name("  Pinned Scenes  ");
        assert_eq!(settings.preview_chat_name(), "Pinned Scenes");

        settings.set_preview_chat_name("   ");
        assert_eq!(settings.preview_chat_name(), "<Preview Chat>");
    }

    #[test]
    fn settings_store_path_prefers_non_empty_override() {
        let mut settings = Settings::default();
        assert!(settings
            .settings_store_path()
            .ends_with(".starmark/settings.json"));

        settings.settings_path = Some("/tmp/starmark-alt.json".to_string());
        assert_eq!(
            settings.settings_store_path(),
            std::path::PathBuf::from("/tmp/starmark-alt.json")
        );

        settings.settings_path = Some("   ".to_string());
        assert!(settings
            .settings_store_path()
            .ends_with(".starmark/settings.json"));
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let toml_str = "config_version = 1\nlegacy_flag = true\n";
        let settings: Settings = toml::from_str(toml_str).expect("parse with unknown key");
        assert_eq!(settings.config_version, CURRENT_CONFIG_VERSION);
    }

    #[test]
    fn save_and_reload_preserves_config_version() {
        let dir = std::env::temp_dir()
            .join(format!("starmark-config-ver-test-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).expect("create temp dir");

        let config_path = dir.join("config.toml");

        // Write a v0 config (no config_version field)
        std::fs::write(&config_path, "preview_chat_name = \"Review\"\n")
            .expect("write old config");

        let content = std::fs::read_to_string(&config_path).expect("read");
        let mut settings: Settings = toml::from_str(&content).expect("parse");
        assert_eq!(settings.config_version, 0);

        // Simulate the migration: bump version and re-save
        settings.config_version = CURRENT_CONFIG_VERSION;
        let serialized = toml::to_string_pretty(&settings).expect("serialize");
        std::fs::write(&config_path, &serialized).expect("write migrated");

        let content2 = std::fs::read_to_string(&config_path).expect("read migrated");
        let reloaded: Settings = toml::from_str(&content2).expect("parse migrated");
        assert_eq!(reloaded.config_version, CURRENT_CONFIG_VERSION);
        assert_eq!(reloaded.preview_chat_name(), "Review");
        // Check that new defaults are present in the serialized content
        assert!(content2.contains("config_version"));
        assert!(content2.contains("save_debounce_ms"));
        assert!(content2.contains("[pacing]"));

        let _ = std::fs::remove_dir_all(dir);
    }
}
