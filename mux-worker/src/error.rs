use thiserror::Error;

/// Spec §7: "Unknown PTY / session: no-op for best-effort operations
/// (write, resize), rejected promise for queries." `Cancelled` covers a
/// request whose pending entry was dropped before a reply arrived.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("unknown session {0}")]
    UnknownSession(u64),

    #[error("request cancelled")]
    Cancelled,

    #[error("shard {0} is shutting down")]
    ShardUnavailable(usize),

    #[error("failed to spawn session: {0}")]
    SpawnFailed(String),
}
