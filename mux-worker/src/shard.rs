use std::collections::HashMap;
use std::io::Read;

use mux_pty::PtyHandle;
use mux_term::{EmulatorConfig, EmulatorInit};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

use crate::error::PoolError;
use crate::proto::{ReplyPayload, SessionId, StreamKind, SubscriptionId, WorkerEvent, WorkerMessage};
use crate::session::WorkerSession;

/// Chunk size for one blocking `read` off a PTY master (spec §5 "On
/// workers: PTY read loop and emulator feed").
const READ_CHUNK: usize = 8192;

pub type Completion = (crate::proto::RequestId, Result<ReplyPayload, PoolError>);

/// Internal command a shard task consumes. Distinct from `WorkerMessage`
/// because shard-local session lifecycle (create/destroy) and
/// subscriptions aren't part of the spec's wire vocabulary but still have
/// to flow through the same single-threaded-per-shard queue.
pub enum ShardCommand {
    CreateSession {
        sid: SessionId,
        pty: PtyHandle,
        init: EmulatorInit,
        config: EmulatorConfig,
    },
    DestroySession {
        sid: SessionId,
    },
    Dispatch {
        message: WorkerMessage,
        /// Present only for request/reply message kinds (spec's query
        /// messages); `write`/`resize`/`reset` are best-effort and carry
        /// no reply channel.
        reply: Option<crate::proto::RequestId>,
    },
    Subscribe {
        sid: SessionId,
        stream: StreamKind,
        subscription_id: SubscriptionId,
        tx: UnboundedSender<WorkerEvent>,
    },
    /// A chunk the session's dedicated PTY reader task pulled off the
    /// child's master side. Routed back through the shard's own inbox
    /// (rather than handled inline in the reader task) so every mutation
    /// of a session's emulator state still happens on the single
    /// cooperative shard loop that owns it (spec §4.5).
    PtyOutput {
        sid: SessionId,
        data: Vec<u8>,
    },
    /// Bytes to write straight to the child's stdin (e.g. an encoded
    /// keystroke from `mux-input`), bypassing the emulator entirely —
    /// distinct from `WorkerMessage::Write`, which is PTY output run
    /// back through query passthrough + the VT backend.
    SendInput {
        sid: SessionId,
        data: Vec<u8>,
    },
    Shutdown,
}

/// Spawns the blocking read loop for one session's PTY master. Runs on
/// the blocking thread pool (`portable_pty`'s reader is synchronous);
/// every chunk it reads is re-queued onto the shard's own inbox as a
/// `PtyOutput` command so emulator mutation stays single-threaded per
/// shard. Exits on EOF (child exited) or a closed inbox (shard shut
/// down or session destroyed and reader end dropped).
fn spawn_pty_reader(shard_id: usize, sid: SessionId, mut reader: Box<dyn Read + Send>, inbox: UnboundedSender<ShardCommand>) {
    tokio::task::spawn_blocking(move || {
        let mut buf = [0u8; READ_CHUNK];
        loop {
            match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    if inbox.send(ShardCommand::PtyOutput { sid, data: buf[..n].to_vec() }).is_err() {
                        break;
                    }
                }
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(_) => break,
            }
        }
        log::info!("shard {shard_id}: pty reader for session {sid} stopped");
    });
}

/// Cooperative, single-threaded-per-shard worker loop (spec §4.5/§5): one
/// `tokio` task processes every message for every session it owns, in
/// arrival order, never yielding mid-mutation. Multiple shards run
/// concurrently on the runtime's worker threads.
pub async fn run(
    shard_id: usize,
    mut inbox: UnboundedReceiver<ShardCommand>,
    completions: UnboundedSender<Completion>,
    self_tx: UnboundedSender<ShardCommand>,
) {
    let mut sessions: HashMap<SessionId, WorkerSession> = HashMap::new();

    while let Some(cmd) = inbox.recv().await {
        match cmd {
            ShardCommand::CreateSession { sid, pty, init, config } => {
                let mut session = WorkerSession::new(sid, pty, init, config);
                session.notify_created();
                match session.try_clone_pty_reader() {
                    Ok(reader) => spawn_pty_reader(shard_id, sid, reader, self_tx.clone()),
                    Err(e) => log::warn!("shard {shard_id}: no pty reader for session {sid}: {e}"),
                }
                sessions.insert(sid, session);
                log::info!("shard {shard_id}: created session {sid}");
            }
            ShardCommand::DestroySession { sid } => {
                if let Some(mut session) = sessions.remove(&sid) {
                    session.notify_destroyed();
                    log::info!("shard {shard_id}: destroyed session {sid}");
                }
            }
            ShardCommand::PtyOutput { sid, data } => {
                if let Some(session) = sessions.get_mut(&sid) {
                    session.feed_output(&data);
                }
            }
            ShardCommand::SendInput { sid, data } => {
                if let Some(session) = sessions.get_mut(&sid) {
                    session.send_input(&data);
                }
            }
            ShardCommand::Subscribe { sid, stream, subscription_id, tx } => {
                if let Some(session) = sessions.get_mut(&sid) {
                    session.subscribe(stream, subscription_id, tx);
                }
            }
            ShardCommand::Dispatch { message, reply } => {
                dispatch(&mut sessions, message, reply, &completions);
            }
            ShardCommand::Shutdown => break,
        }
    }
    log::info!("shard {shard_id}: stopped");
}

fn dispatch(
    sessions: &mut HashMap<SessionId, WorkerSession>,
    message: WorkerMessage,
    reply: Option<crate::proto::RequestId>,
    completions: &UnboundedSender<Completion>,
) {
    let complete = |req_id: crate::proto::RequestId, result: Result<ReplyPayload, PoolError>| {
        let _ = completions.send((req_id, result));
    };

    match message {
        WorkerMessage::Write { sid, data } => {
            if let Some(session) = sessions.get_mut(&sid) {
                session.feed_output(&data);
            }
        }
        WorkerMessage::Resize { sid, cols, rows } => {
            if let Some(session) = sessions.get_mut(&sid) {
                session.resize(cols, rows);
            }
        }
        WorkerMessage::Reset { sid } => {
            if let Some(session) = sessions.get_mut(&sid) {
                session.reset();
            }
        }
        WorkerMessage::GetScrollbackLine { sid, offset, req_id } => {
            let result = match sessions.get_mut(&sid) {
                Some(session) => Ok(ReplyPayload::ScrollbackLine(session.get_scrollback_line(offset))),
                None => Err(PoolError::UnknownSession(sid)),
            };
            complete(req_id, result);
        }
        WorkerMessage::GetScrollbackLines { sid, start, count, req_id } => {
            let result = match sessions.get_mut(&sid) {
                Some(session) => Ok(ReplyPayload::ScrollbackLines(session.get_scrollback_lines(start, count))),
                None => Err(PoolError::UnknownSession(sid)),
            };
            complete(req_id, result);
        }
        WorkerMessage::Search { sid, query, req_id, limit } => {
            let result = match sessions.get_mut(&sid) {
                Some(session) => Ok(ReplyPayload::SearchMatches(session.search(&query, limit))),
                None => Err(PoolError::UnknownSession(sid)),
            };
            complete(req_id, result);
        }
        WorkerMessage::Subscribe { sid, .. } => {
            // Handled via `ShardCommand::Subscribe` (carries the channel
            // sender, which isn't part of the wire `WorkerMessage`).
            if let Some(req_id) = reply {
                let result = if sessions.contains_key(&sid) {
                    Ok(ReplyPayload::Ack)
                } else {
                    Err(PoolError::UnknownSession(sid))
                };
                complete(req_id, result);
            }
        }
        WorkerMessage::Unsubscribe { sid, stream, subscription_id } => {
            if let Some(session) = sessions.get_mut(&sid) {
                session.unsubscribe(stream, subscription_id);
            }
        }
    }
}
