//! Worker pool wire contract (spec §6.3): tag-prefixed inbound messages,
//! outbound events, and the unified update stream's fused payload. These
//! types are plain data — nothing here is async or channel-specific, so a
//! host that does shuttle them across a real process boundary can
//! serialize them without depending on `tokio`.

use mux_cells::Cell;
use mux_term::{DirtyUpdate, ScrollState};

pub type SessionId = u64;
pub type RequestId = u32;
pub type SubscriptionId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    /// Dirty-row deltas only (the "legacy" substream, spec §4.4).
    Terminal,
    /// Fused `{terminalUpdate, scrollState}` feed.
    Unified,
    /// Scroll-only updates (viewport moved, no content change).
    Scroll,
    Title,
    Lifecycle,
}

/// Inbound messages the pool dispatches to a session's owning shard.
#[derive(Debug, Clone)]
pub enum WorkerMessage {
    Write {
        sid: SessionId,
        data: Vec<u8>,
    },
    Resize {
        sid: SessionId,
        cols: u16,
        rows: u16,
    },
    Reset {
        sid: SessionId,
    },
    GetScrollbackLine {
        sid: SessionId,
        offset: usize,
        req_id: RequestId,
    },
    GetScrollbackLines {
        sid: SessionId,
        start: usize,
        count: usize,
        req_id: RequestId,
    },
    Search {
        sid: SessionId,
        query: String,
        req_id: RequestId,
        limit: Option<usize>,
    },
    Subscribe {
        sid: SessionId,
        stream: StreamKind,
        req_id: RequestId,
    },
    Unsubscribe {
        sid: SessionId,
        stream: StreamKind,
        subscription_id: SubscriptionId,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchMatch {
    pub absolute_row: usize,
    pub start_col: u16,
    pub end_col: u16,
}

/// Spec §4.4's `UnifiedTerminalUpdate = {terminalUpdate, scrollState}`.
/// `scroll_state` mirrors `terminal_update.scroll_state` — carried as its
/// own field because a scroll-only update (empty `dirty_rows`, current
/// cursor/scroll state) is exactly this struct with an otherwise-empty
/// `terminal_update`, and consumers of the scroll substream read only
/// this field without unpacking the dirty update at all.
#[derive(Debug, Clone)]
pub struct UnifiedTerminalUpdate {
    pub terminal_update: DirtyUpdate,
    pub scroll_state: ScrollState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleKind {
    Created,
    Destroyed,
}

/// Reply payloads for request/response message kinds.
#[derive(Debug, Clone)]
pub enum ReplyPayload {
    ScrollbackLine(Option<Vec<Cell>>),
    ScrollbackLines(Vec<(usize, Vec<Cell>)>),
    SearchMatches(Vec<SearchMatch>),
    Subscribed(SubscriptionId),
    Ack,
}

/// Outbound events the pool delivers to subscribers.
#[derive(Debug, Clone)]
pub enum WorkerEvent {
    UnifiedUpdate {
        sid: SessionId,
        update: UnifiedTerminalUpdate,
    },
    TitleChange {
        sid: SessionId,
        title: String,
    },
    Lifecycle {
        sid: SessionId,
        kind: LifecycleKind,
    },
}
