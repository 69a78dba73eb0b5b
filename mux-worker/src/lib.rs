//! Sharded worker pool: owns per-PTY emulator state off the main thread,
//! answers requests asynchronously, and fuses dirty deltas with scroll
//! state into one ordered update feed per session (spec §4.4/§4.5).
//!
//! Each session is pinned to exactly one shard by a stable hash of its
//! id; within a shard, execution is strictly sequential (cooperative);
//! across shards, it is parallel — there is no shared mutable emulator
//! state anywhere in this crate.

mod error;
mod pool;
mod proto;
mod session;
mod shard;

pub use error::PoolError;
pub use pool::WorkerPool;
pub use proto::{
    LifecycleKind, ReplyPayload, RequestId, SearchMatch, SessionId, StreamKind, SubscriptionId,
    UnifiedTerminalUpdate, WorkerEvent, WorkerMessage,
};
