use serde::{Deserialize, Serialize};

use crate::core::preview::BuildReport;
use crate::runtime::FavoriteToggle;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ToggleResponse {
    pub action: String,
    pub favorite_id: i64,
}

impl From<FavoriteToggle> for ToggleResponse {
    fn from(toggle: FavoriteToggle) -> Self {
        match toggle {
            FavoriteToggle::Added { favorite_id } => Self {
                action: "added".to_string(),
                favorite_id,
            },
            FavoriteToggle::Removed { favorite_id } => Self {
                action: "removed".to_string(),
                favorite_id,
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BuildResponse {
    pub build_id: String,
    pub preview_key: String,
    pub chat_id: String,
    pub appended: usize,
    pub skipped: usize,
    pub reused_existing: bool,
}

impl From<BuildReport> for BuildResponse {
    fn from(report: BuildReport) -> Self {
        Self {
            build_id: report.build_id,
            preview_key: report.preview_key,
            chat_id: report.chat_id,
            appended: report.appended,
            skipped: report.skipped,
            reused_existing: report.reused_existing,
        }
    }
}
