//! Transition engine configuration.

/// Configuration for the coverage service.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// How many times a transition is re-read, re-planned and re-committed
    /// after the store reports a concurrent writer (default: 3).
    /// Zero surfaces the first conflict to the caller.
    pub max_conflict_retries: u32,
    /// Whether deleting a track also promotes a complete `Pending`
    /// submission on the other track, in addition to an `Inactive` one
    /// (default: false).
    pub reactivate_pending_on_delete: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_conflict_retries: 3,
            reactivate_pending_on_delete: false,
        }
    }
}
