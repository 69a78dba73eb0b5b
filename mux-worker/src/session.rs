use std::collections::HashMap;

use mux_cells::Cell;
use mux_pty::PtyHandle;
use mux_term::{EmulatorConfig, EmulatorInit, EmulatorWrapper};
use tokio::sync::mpsc::UnboundedSender;

use crate::proto::{
    LifecycleKind, SearchMatch, SessionId, StreamKind, SubscriptionId, UnifiedTerminalUpdate,
    WorkerEvent,
};

fn row_matches(row: &[Cell], query: &[char], absolute_row: usize, out: &mut Vec<SearchMatch>, limit: usize) {
    if query.is_empty() || row.len() < query.len() {
        return;
    }
    let chars: Vec<char> = row.iter().map(|c| c.ch).collect();
    for start in 0..=chars.len() - query.len() {
        if out.len() >= limit {
            return;
        }
        if chars[start..start + query.len()] == query[..] {
            out.push(SearchMatch {
                absolute_row,
                start_col: start as u16,
                end_col: (start + query.len()) as u16,
            });
        }
    }
}

/// One PTY session: the emulator wrapper that owns VT state, the PTY
/// handle that owns the child process, and the subscriber table for its
/// four update streams (spec §4.4/§4.5). Exclusively owned by the shard
/// it was created on — no other task ever touches it.
pub struct WorkerSession {
    pub id: SessionId,
    wrapper: EmulatorWrapper,
    pty: PtyHandle,
    subscribers: HashMap<StreamKind, HashMap<SubscriptionId, UnboundedSender<WorkerEvent>>>,
}

impl WorkerSession {
    pub fn new(id: SessionId, pty: PtyHandle, init: EmulatorInit, config: EmulatorConfig) -> Self {
        WorkerSession {
            id,
            wrapper: EmulatorWrapper::new(init, config),
            pty,
            subscribers: HashMap::new(),
        }
    }

    pub fn subscribe(
        &mut self,
        stream: StreamKind,
        subscription_id: SubscriptionId,
        tx: UnboundedSender<WorkerEvent>,
    ) {
        self.subscribers.entry(stream).or_default().insert(subscription_id, tx);
    }

    pub fn unsubscribe(&mut self, stream: StreamKind, subscription_id: SubscriptionId) {
        if let Some(table) = self.subscribers.get_mut(&stream) {
            table.remove(&subscription_id);
        }
    }

    fn broadcast(&mut self, stream: StreamKind, event: WorkerEvent) {
        if let Some(table) = self.subscribers.get_mut(&stream) {
            table.retain(|_, tx| tx.send(event.clone()).is_ok());
        }
    }

    fn publish_update(&mut self, terminal_update: mux_term::DirtyUpdate, legacy_only: bool) {
        let scroll_state = terminal_update.scroll_state;
        let unified = UnifiedTerminalUpdate {
            terminal_update,
            scroll_state,
        };
        self.broadcast(
            StreamKind::Unified,
            WorkerEvent::UnifiedUpdate {
                sid: self.id,
                update: unified.clone(),
            },
        );
        if !legacy_only {
            self.broadcast(
                StreamKind::Terminal,
                WorkerEvent::UnifiedUpdate {
                    sid: self.id,
                    update: unified.clone(),
                },
            );
        }
        self.broadcast(
            StreamKind::Scroll,
            WorkerEvent::UnifiedUpdate {
                sid: self.id,
                update: unified,
            },
        );
    }

    fn publish_title_if_changed(&mut self) {
        if let Some(title) = self.wrapper.take_title() {
            self.broadcast(
                StreamKind::Title,
                WorkerEvent::TitleChange { sid: self.id, title },
            );
        }
    }

    /// Runs a chunk of PTY output through the emulator (spec §4.2 steps
    /// 1-4): query passthrough, backend feed, dirty re-conversion. Any
    /// synthesized query replies get written straight back to the PTY.
    pub fn feed_output(&mut self, data: &[u8]) {
        let outcome = self.wrapper.write(data);
        if !outcome.pty_writes.is_empty()
            && let Err(e) = self.pty.write(&outcome.pty_writes)
        {
            log::warn!("session {}: pty write failed: {e}", self.id);
        }
        self.publish_update(outcome.update, false);
        self.publish_title_if_changed();
    }

    /// Writes bytes straight to the child's stdin — an encoded keystroke
    /// or pasted text from the host — without running them through the
    /// emulator. The PTY's own output (the child's echo, if any) comes
    /// back through the session's dedicated reader task and `feed_output`
    /// like any other output.
    pub fn send_input(&mut self, data: &[u8]) {
        if let Err(e) = self.pty.write(data) {
            log::warn!("session {}: pty input write failed: {e}", self.id);
        }
    }

    /// Clones a fresh reader for this session's PTY master, for the
    /// shard to hand to a dedicated blocking read-loop task.
    pub fn try_clone_pty_reader(&self) -> Result<Box<dyn std::io::Read + Send>, mux_pty::PtyError> {
        self.pty.try_clone_reader()
    }

    pub fn resize(&mut self, cols: u16, rows: u16) {
        if let Err(e) = self.pty.resize(cols, rows) {
            log::warn!("session {}: pty resize failed: {e}", self.id);
            return;
        }
        let update = self.wrapper.resize(cols, rows);
        self.publish_update(update, false);
    }

    pub fn reset(&mut self) {
        self.wrapper.reset();
    }

    pub fn get_scrollback_line(&mut self, offset: usize) -> Option<Vec<Cell>> {
        self.wrapper.get_scrollback_line(offset)
    }

    pub fn get_scrollback_lines(&mut self, start: usize, count: usize) -> Vec<(usize, Vec<Cell>)> {
        self.wrapper.get_scrollback_lines(start, count)
    }

    pub fn search(&mut self, query: &str, limit: Option<usize>) -> Vec<SearchMatch> {
        let query_chars: Vec<char> = query.chars().collect();
        if query_chars.is_empty() {
            return Vec::new();
        }
        let limit = limit.unwrap_or(usize::MAX);
        let mut matches = Vec::new();

        let scrollback_length = self.wrapper.scrollback_length();
        for abs in 0..scrollback_length {
            if matches.len() >= limit {
                return matches;
            }
            if let Some(row) = self.wrapper.get_scrollback_line(abs) {
                row_matches(&row, &query_chars, abs, &mut matches, limit);
            }
        }

        for (i, row) in self.wrapper.viewport_rows().iter().enumerate() {
            if matches.len() >= limit {
                break;
            }
            row_matches(row, &query_chars, scrollback_length + i, &mut matches, limit);
        }
        matches
    }

    pub fn notify_created(&mut self) {
        self.broadcast(
            StreamKind::Lifecycle,
            WorkerEvent::Lifecycle {
                sid: self.id,
                kind: LifecycleKind::Created,
            },
        );
    }

    pub fn notify_destroyed(&mut self) {
        self.broadcast(
            StreamKind::Lifecycle,
            WorkerEvent::Lifecycle {
                sid: self.id,
                kind: LifecycleKind::Destroyed,
            },
        );
    }
}
