use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

static NEXT_HOST_ID: AtomicU32 = AtomicU32::new(1);

/// What the cache remembers about one transmitted image, keyed by the
/// guest (client-chosen) image id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInfo {
    pub host_id: u32,
    pub format: Option<String>,
}

fn parse_control(body: &str) -> Vec<(String, String)> {
    body.trim_start_matches('G')
        .split(',')
        .filter_map(|kv| {
            let (k, v) = kv.split_once('=')?;
            Some((k.to_string(), v.to_string()))
        })
        .collect()
}

fn render_control(pairs: &[(String, String)]) -> String {
    let mut s = String::from("G");
    for (i, (k, v)) in pairs.iter().enumerate() {
        if i > 0 {
            s.push(',');
        }
        s.push_str(k);
        s.push('=');
        s.push_str(v);
    }
    s
}

/// Outcome of routing one complete Kitty APC sequence through the cache.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KittyOutcome {
    /// Bytes to forward to the host's real output (the backend never
    /// renders graphics itself, but unknown APC is otherwise harmless to
    /// hand through). Empty for pure capability queries (`a=q`), which
    /// never touch any image store.
    pub forward: Vec<u8>,
    /// A synthesized reply, queued for write back to the PTY ahead of
    /// anything the passthrough's CSI/OSC/DCS parsers produce from the
    /// same chunk.
    pub reply: Option<Vec<u8>>,
}

/// Per-PTY Kitty graphics transmit cache. Tracks guest image ids seen on
/// one PTY and maps them to process-wide unique host ids so two panes
/// transmitting image id `1` never collide in the shared texture/image
/// store the renderer keeps.
#[derive(Debug, Default)]
pub struct KittyTransmitCache {
    images: HashMap<u32, ImageInfo>,
}

impl KittyTransmitCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn host_id_for(&mut self, guest_id: u32, format: Option<String>) -> u32 {
        if let Some(info) = self.images.get(&guest_id) {
            return info.host_id;
        }
        let host_id = NEXT_HOST_ID.fetch_add(1, Ordering::Relaxed);
        self.images.insert(guest_id, ImageInfo { host_id, format });
        host_id
    }

    /// Drops every cached mapping. Called when the owning PTY is
    /// restarted and the renderer's corresponding image store is reset,
    /// so stale host ids can never be referenced again.
    pub fn force_invalidate(&mut self) {
        self.images.clear();
    }

    /// Rewrites one complete Kitty APC sequence (including its ESC
    /// header and ST/BEL terminator), translating guest image ids to
    /// host ids on transmit and pruning the cache on delete. A pure
    /// capability query (`a=q`) never reaches the backend — the
    /// backend has no concept of Kitty graphics, so this cache answers
    /// it directly with `i=<id>;OK`, matching how a real Kitty-capable
    /// terminal responds without actually displaying anything.
    pub fn handle_sequence(&mut self, raw: &[u8]) -> KittyOutcome {
        let (header_len, term_len) = match raw.first() {
            Some(0x1B) => (2, if raw.ends_with(b"\x1b\\") { 2 } else { 1 }),
            _ => (1, if raw.ends_with(b"\x1b\\") { 2 } else { 1 }),
        };
        if raw.len() < header_len + term_len {
            return KittyOutcome {
                forward: raw.to_vec(),
                reply: None,
            };
        }
        let body = &raw[header_len..raw.len() - term_len];
        let text = String::from_utf8_lossy(body);
        let (control, payload) = match text.split_once(';') {
            Some((c, p)) => (c, Some(p)),
            None => (text.as_ref(), None),
        };

        let mut pairs = parse_control(control);
        let action = pairs.iter().find(|(k, _)| k == "a").map(|(_, v)| v.clone());
        let guest_id: Option<u32> = pairs
            .iter()
            .find(|(k, _)| k == "i")
            .and_then(|(_, v)| v.parse().ok());

        if action.as_deref() == Some("q") {
            let reply = guest_id.map(|id| format!("\x1b_Gi={id};OK\x1b\\").into_bytes());
            return KittyOutcome { forward: Vec::new(), reply };
        }

        match action.as_deref() {
            Some("d") => {
                if let Some(id) = guest_id {
                    self.images.remove(&id);
                } else {
                    self.images.clear();
                }
            }
            Some("t") | Some("T") | Some("f") => {
                if let Some(id) = guest_id {
                    let format = pairs.iter().find(|(k, _)| k == "f").map(|(_, v)| v.clone());
                    let host_id = self.host_id_for(id, format);
                    for pair in pairs.iter_mut() {
                        if pair.0 == "i" {
                            pair.1 = host_id.to_string();
                        }
                    }
                }
            }
            _ => {}
        }

        let mut rewritten = Vec::with_capacity(raw.len());
        rewritten.extend_from_slice(&raw[..header_len]);
        rewritten.extend(render_control(&pairs).into_bytes());
        if let Some(p) = payload {
            rewritten.push(b';');
            rewritten.extend(p.as_bytes());
        }
        rewritten.extend_from_slice(&raw[raw.len() - term_len..]);
        KittyOutcome {
            forward: rewritten,
            reply: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_action_answers_ok_without_forwarding_or_caching() {
        let mut cache = KittyTransmitCache::new();
        let input = b"\x1b_Ga=q,t=f,i=1;\x1b\\";
        let out = cache.handle_sequence(input);
        assert!(out.forward.is_empty());
        assert_eq!(out.reply, Some(b"\x1b_Gi=1;OK\x1b\\".to_vec()));
        assert!(cache.images.is_empty());
    }

    #[test]
    fn transmit_rewrites_guest_id_to_stable_host_id() {
        let mut cache = KittyTransmitCache::new();
        let first = cache.handle_sequence(b"\x1b_Ga=t,f=24,i=7;AAAA\x1b\\").forward;
        let second = cache.handle_sequence(b"\x1b_Ga=p,i=7;\x1b\\").forward;
        let first_text = String::from_utf8(first).unwrap();
        let second_text = String::from_utf8(second).unwrap();
        let extract_id = |s: &str| -> String {
            s.split([',', ';'])
                .find_map(|kv| kv.strip_prefix("i="))
                .unwrap()
                .to_string()
        };
        assert_eq!(extract_id(&first_text), extract_id(&second_text));
        assert_ne!(extract_id(&first_text), "7");
    }

    #[test]
    fn delete_prunes_cached_entry() {
        let mut cache = KittyTransmitCache::new();
        cache.handle_sequence(b"\x1b_Ga=t,f=24,i=3;AAAA\x1b\\");
        assert!(cache.images.contains_key(&3));
        cache.handle_sequence(b"\x1b_Ga=d,i=3;\x1b\\");
        assert!(!cache.images.contains_key(&3));
    }

    #[test]
    fn force_invalidate_clears_all_mappings() {
        let mut cache = KittyTransmitCache::new();
        cache.handle_sequence(b"\x1b_Ga=t,f=24,i=1;AAAA\x1b\\");
        cache.handle_sequence(b"\x1b_Ga=t,f=24,i=2;AAAA\x1b\\");
        cache.force_invalidate();
        assert!(cache.images.is_empty());
    }
}
