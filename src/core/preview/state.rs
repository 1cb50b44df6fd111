#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildPhase {
    Resolving,
    Switching,
    Creating,
    Clearing,
    Appending,
    Completed,
    Failed,
}

impl BuildPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            BuildPhase::Resolving => "resolving",
            BuildPhase::Switching => "switching",
            BuildPhase::Creating => "creating",
            BuildPhase::Clearing => "clearing",
            BuildPhase::Appending => "appending",
            BuildPhase::Completed => "completed",
            BuildPhase::Failed => "failed",
        }
    }
}
