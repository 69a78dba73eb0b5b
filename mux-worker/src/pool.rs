use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

use mux_pty::{PtyHandle, SpawnConfig};
use mux_term::{EmulatorConfig, EmulatorInit};
use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};

use crate::error::PoolError;
use crate::proto::{
    RequestId, ReplyPayload, SearchMatch, SessionId, StreamKind, SubscriptionId, WorkerEvent,
    WorkerMessage,
};
use crate::shard::{self, Completion, ShardCommand};
use mux_cells::Cell;

struct ShardHandle {
    tx: mpsc::UnboundedSender<ShardCommand>,
}

struct PendingRequest {
    sid: SessionId,
    resolver: oneshot::Sender<Result<ReplyPayload, PoolError>>,
}

/// Sharded pool of single-threaded-per-shard workers (spec §4.5). Each
/// session is pinned to one shard by a stable hash of its id; the pool
/// never touches session state directly, only routes messages to the
/// owning shard's queue.
pub struct WorkerPool {
    shards: Mutex<Vec<ShardHandle>>,
    completions_tx: mpsc::UnboundedSender<Completion>,
    pending: Arc<Mutex<HashMap<RequestId, PendingRequest>>>,
    next_request_id: AtomicU32,
    next_session_id: AtomicU64,
    next_subscription_id: AtomicU64,
    session_shard: Mutex<HashMap<SessionId, usize>>,
}

fn stable_hash(sid: SessionId) -> usize {
    let mut hasher = DefaultHasher::new();
    sid.hash(&mut hasher);
    hasher.finish() as usize
}

impl WorkerPool {
    /// Spawns `shard_count` worker tasks plus one completion dispatcher on
    /// the caller's `tokio` runtime.
    pub fn new(shard_count: usize) -> Arc<Self> {
        assert!(shard_count > 0, "a worker pool needs at least one shard");

        let (completions_tx, mut completions_rx) = mpsc::unbounded_channel::<Completion>();
        let pending = Arc::new(Mutex::new(HashMap::new()));

        let mut shards = Vec::with_capacity(shard_count);
        for shard_id in 0..shard_count {
            let (tx, rx) = mpsc::unbounded_channel();
            let completions_for_shard = completions_tx.clone();
            tokio::spawn(shard::run(shard_id, rx, completions_for_shard, tx.clone()));
            shards.push(ShardHandle { tx });
        }

        let pending_for_dispatcher = pending.clone();
        tokio::spawn(async move {
            while let Some((req_id, result)) = completions_rx.recv().await {
                if let Some(pending_req) = pending_for_dispatcher.lock().remove(&req_id) {
                    let _ = pending_req.resolver.send(result);
                }
            }
        });

        Arc::new(WorkerPool {
            shards: Mutex::new(shards),
            completions_tx,
            pending,
            next_request_id: AtomicU32::new(0),
            next_session_id: AtomicU64::new(1),
            next_subscription_id: AtomicU64::new(1),
            session_shard: Mutex::new(HashMap::new()),
        })
    }

    fn shard_count(&self) -> usize {
        self.shards.lock().len()
    }

    fn shard_for(&self, sid: SessionId) -> usize {
        stable_hash(sid) % self.shard_count()
    }

    fn send_to_shard(&self, shard_id: usize, cmd: ShardCommand) {
        let shards = self.shards.lock();
        if let Some(handle) = shards.get(shard_id) {
            let _ = handle.tx.send(cmd);
        }
    }

    /// Spawns a PTY and an emulator, assigns a session id, and pins it to
    /// a shard by stable hash. The returned id is used for every
    /// subsequent message.
    pub fn spawn_session(
        &self,
        spawn: SpawnConfig,
        init: EmulatorInit,
        config: EmulatorConfig,
    ) -> Result<SessionId, PoolError> {
        let pty = PtyHandle::spawn(&spawn).map_err(|e| {
            log::warn!("failed to spawn pty for new session: {e}");
            PoolError::SpawnFailed(e.to_string())
        })?;

        let sid = self.next_session_id.fetch_add(1, Ordering::Relaxed);
        let shard_id = self.shard_for(sid);
        self.session_shard.lock().insert(sid, shard_id);
        self.send_to_shard(shard_id, ShardCommand::CreateSession { sid, pty, init, config });
        Ok(sid)
    }

    pub fn destroy_session(&self, sid: SessionId) {
        if let Some(shard_id) = self.session_shard.lock().remove(&sid) {
            self.send_to_shard(shard_id, ShardCommand::DestroySession { sid });
        }
    }

    fn dispatch_best_effort(&self, sid: SessionId, message: WorkerMessage) {
        let shard_id = match self.session_shard.lock().get(&sid).copied() {
            Some(id) => id,
            None => return,
        };
        self.send_to_shard(shard_id, ShardCommand::Dispatch { message, reply: None });
    }

    pub fn write(&self, sid: SessionId, data: Vec<u8>) {
        self.dispatch_best_effort(sid, WorkerMessage::Write { sid, data });
    }

    /// Delivers an encoded keystroke or pasted text straight to the
    /// child's stdin, bypassing the emulator. Distinct from `write`,
    /// which re-runs PTY output through query passthrough and the VT
    /// backend (spec §4.2); input only ever needs to reach the child.
    pub fn send_input(&self, sid: SessionId, data: Vec<u8>) {
        let shard_id = match self.session_shard.lock().get(&sid).copied() {
            Some(id) => id,
            None => return,
        };
        self.send_to_shard(shard_id, ShardCommand::SendInput { sid, data });
    }

    pub fn resize(&self, sid: SessionId, cols: u16, rows: u16) {
        self.dispatch_best_effort(sid, WorkerMessage::Resize { sid, cols, rows });
    }

    pub fn reset(&self, sid: SessionId) {
        self.dispatch_best_effort(sid, WorkerMessage::Reset { sid });
    }

    async fn request(&self, sid: SessionId, build: impl FnOnce(RequestId) -> WorkerMessage) -> Result<ReplyPayload, PoolError> {
        let shard_id = self
            .session_shard
            .lock()
            .get(&sid)
            .copied()
            .ok_or(PoolError::UnknownSession(sid))?;

        let req_id = self.next_request_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.pending.lock().insert(req_id, PendingRequest { sid, resolver: tx });

        let message = build(req_id);
        self.send_to_shard(shard_id, ShardCommand::Dispatch { message, reply: Some(req_id) });

        rx.await.unwrap_or(Err(PoolError::Cancelled))
    }

    pub async fn get_scrollback_line(&self, sid: SessionId, offset: usize) -> Result<Option<Vec<Cell>>, PoolError> {
        match self.request(sid, |req_id| WorkerMessage::GetScrollbackLine { sid, offset, req_id }).await? {
            ReplyPayload::ScrollbackLine(row) => Ok(row),
            _ => Ok(None),
        }
    }

    pub async fn get_scrollback_lines(
        &self,
        sid: SessionId,
        start: usize,
        count: usize,
    ) -> Result<Vec<(usize, Vec<Cell>)>, PoolError> {
        match self
            .request(sid, |req_id| WorkerMessage::GetScrollbackLines { sid, start, count, req_id })
            .await?
        {
            ReplyPayload::ScrollbackLines(rows) => Ok(rows),
            _ => Ok(Vec::new()),
        }
    }

    pub async fn search(&self, sid: SessionId, query: String, limit: Option<usize>) -> Result<Vec<SearchMatch>, PoolError> {
        match self
            .request(sid, |req_id| WorkerMessage::Search { sid, query, req_id, limit })
            .await?
        {
            ReplyPayload::SearchMatches(matches) => Ok(matches),
            _ => Ok(Vec::new()),
        }
    }

    /// Cancels a pending request: the entry is dropped from the map, and
    /// the reply (if it eventually arrives from the shard) is discarded
    /// by the completion dispatcher finding nothing to resolve (spec §7
    /// cancellation semantics).
    pub fn cancel(&self, req_id: RequestId) {
        self.pending.lock().remove(&req_id);
    }

    pub fn subscribe(&self, sid: SessionId, stream: StreamKind) -> Result<(SubscriptionId, mpsc::UnboundedReceiver<WorkerEvent>), PoolError> {
        let shard_id = self
            .session_shard
            .lock()
            .get(&sid)
            .copied()
            .ok_or(PoolError::UnknownSession(sid))?;

        let subscription_id = self.next_subscription_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();
        self.send_to_shard(shard_id, ShardCommand::Subscribe { sid, stream, subscription_id, tx });
        Ok((subscription_id, rx))
    }

    pub fn unsubscribe(&self, sid: SessionId, stream: StreamKind, subscription_id: SubscriptionId) {
        self.dispatch_best_effort(sid, WorkerMessage::Unsubscribe { sid, stream, subscription_id });
    }

    /// Spec §7: "Worker crash: fatal for sessions on that shard; host may
    /// restart shard and recreate sessions with fresh scrollback." Drains
    /// and rejects every pending request belonging to a session on
    /// `shard_id`, drops those sessions' shard assignment (the caller must
    /// recreate them), and replaces the shard with a fresh, empty one.
    pub fn restart_shard(self: &Arc<Self>, shard_id: usize) {
        let dead_sids: Vec<SessionId> = {
            let mut map = self.session_shard.lock();
            let dead: Vec<SessionId> = map
                .iter()
                .filter(|(_, &s)| s == shard_id)
                .map(|(&sid, _)| sid)
                .collect();
            for sid in &dead {
                map.remove(sid);
            }
            dead
        };

        {
            let mut pending = self.pending.lock();
            let stale: Vec<RequestId> = pending
                .iter()
                .filter(|(_, p)| dead_sids.contains(&p.sid))
                .map(|(&req_id, _)| req_id)
                .collect();
            for req_id in stale {
                if let Some(p) = pending.remove(&req_id) {
                    let _ = p.resolver.send(Err(PoolError::ShardUnavailable(shard_id)));
                }
            }
        }

        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(shard::run(shard_id, rx, self.completions_tx.clone(), tx.clone()));
        let mut shards = self.shards.lock();
        if let Some(slot) = shards.get_mut(shard_id) {
            slot.tx = tx;
        }
        log::warn!("restarted shard {shard_id}; {} session(s) must be recreated", dead_sids.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mux_term::EmulatorInit;

    fn echo_config() -> SpawnConfig {
        SpawnConfig {
            cols: 20,
            rows: 5,
            command: Some("/bin/sh".to_string()),
            args: vec!["-c".to_string(), "sleep 30".to_string()],
            ..Default::default()
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn spawned_session_is_pinned_to_a_shard() {
        let pool = WorkerPool::new(4);
        let sid = pool
            .spawn_session(echo_config(), EmulatorInit::default(), EmulatorConfig::default())
            .expect("spawn session");
        assert!(pool.session_shard.lock().contains_key(&sid));
        pool.destroy_session(sid);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn unknown_session_query_returns_unknown_session_error() {
        let pool = WorkerPool::new(2);
        let result = pool.get_scrollback_line(999, 0).await;
        assert_eq!(result, Err(PoolError::UnknownSession(999)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn restart_shard_rejects_pending_requests_for_its_sessions() {
        let pool = WorkerPool::new(1);
        let sid = pool
            .spawn_session(echo_config(), EmulatorInit::default(), EmulatorConfig::default())
            .expect("spawn session");

        // Give the shard a moment to register the session before we crash it.
        tokio::task::yield_now().await;
        pool.write(sid, b"hi".to_vec());
        tokio::task::yield_now().await;

        pool.restart_shard(0);
        let result = pool.get_scrollback_line(sid, 0).await;
        assert!(result.is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn subscribe_receives_unified_updates_after_write() {
        let pool = WorkerPool::new(2);
        let sid = pool
            .spawn_session(echo_config(), EmulatorInit::default(), EmulatorConfig::default())
            .expect("spawn session");
        tokio::task::yield_now().await;

        let (_sub_id, mut rx) = pool.subscribe(sid, StreamKind::Unified).expect("subscribe");
        pool.write(sid, b"hi".to_vec());

        let event = rx.recv().await.expect("update event");
        match event {
            WorkerEvent::UnifiedUpdate { sid: got_sid, .. } => assert_eq!(got_sid, sid),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    /// `send_input` writes straight to the child's stdin; the PTY's own
    /// canonical-mode echo of that input comes back out through the
    /// session's dedicated reader task and reaches the emulator on its
    /// own, with no direct `write` call from the test at all.
    #[cfg(unix)]
    #[tokio::test]
    async fn send_input_round_trips_through_pty_echo() {
        let pool = WorkerPool::new(2);
        let sid = pool
            .spawn_session(echo_config(), EmulatorInit::default(), EmulatorConfig::default())
            .expect("spawn session");
        tokio::task::yield_now().await;

        let (_sub_id, mut rx) = pool.subscribe(sid, StreamKind::Unified).expect("subscribe");
        pool.send_input(sid, b"hi".to_vec());

        let event = tokio::time::timeout(std::time::Duration::from_secs(5), rx.recv())
            .await
            .expect("update arrived before timeout")
            .expect("update event");
        match event {
            WorkerEvent::UnifiedUpdate { sid: got_sid, .. } => assert_eq!(got_sid, sid),
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
