/// Tuning knobs for one `EmulatorWrapper`, mirroring the teacher's
/// config-struct-with-defaults idiom rather than a global config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmulatorConfig {
    /// Native backend scrollback limit (lines retained by the VT engine
    /// itself before the oldest line rolls off into our cache).
    pub scrollback_limit: usize,
    /// Maximum entries held in the LRU scrollback line cache.
    pub scrollback_cache_capacity: usize,
    /// Entries the cache is trimmed down to once it exceeds capacity.
    pub scrollback_cache_trim_target: usize,
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        EmulatorConfig {
            scrollback_limit: 10_000,
            scrollback_cache_capacity: 1000,
            scrollback_cache_trim_target: 500,
        }
    }
}
