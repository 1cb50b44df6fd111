use serde::{Deserialize, Serialize};

/// Settle waits applied after host operations. The host exposes no
/// awaitable completion for switching, clearing, or appending, so these
/// pauses approximate "the UI has caught up". They are a documented
/// reliability gap, not a completion contract; a host that signals real
/// completion can run with all of them at zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildPacing {
    /// After creating a fresh preview conversation.
    pub create_settle_ms: u64,
    /// After switching to an already-recorded preview conversation.
    pub switch_settle_ms: u64,
    /// After clearing the target conversation.
    pub clear_settle_ms: u64,
    /// Between consecutive appends.
    pub append_gap_ms: u64,
    /// After an append failure, before trying the next message.
    pub append_failure_pause_ms: u64,
}

impl Default for BuildPacing {
    fn default() -> Self {
        Self {
            create_settle_ms: 2_000,
            switch_settle_ms: 1_000,
            clear_settle_ms: 300,
            append_gap_ms: 100,
            append_failure_pause_ms: 500,
        }
    }
}
