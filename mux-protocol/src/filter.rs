use crate::context::QueryContext;
use crate::kitty::KittyTransmitCache;
use crate::responses;

const STANDARD_LIMIT: usize = 8 * 1024;
const KITTY_LIMIT: usize = 8 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SeqKind {
    Csi,
    Osc,
    Dcs,
    Apc,
}

impl SeqKind {
    fn limit(self) -> usize {
        match self {
            SeqKind::Apc => KITTY_LIMIT,
            _ => STANDARD_LIMIT,
        }
    }
}

/// Result of running a chunk of PTY output through the filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassthroughResult {
    /// Bytes to hand to the emulator (queries stripped, everything else
    /// forwarded, Kitty APC sequences forwarded after cache bookkeeping).
    pub filtered: Vec<u8>,
    /// Synthesized reply bytes to write back to the PTY, in generation
    /// order.
    pub replies: Vec<u8>,
}

/// Streaming passthrough filter. One instance per PTY.
#[derive(Debug, Default)]
pub struct PassthroughFilter {
    carry: Vec<u8>,
}

fn seq_kind_at(buf: &[u8], pos: usize) -> Option<(SeqKind, usize)> {
    match buf.get(pos) {
        Some(0x1B) => match buf.get(pos + 1) {
            Some(b'[') => Some((SeqKind::Csi, 2)),
            Some(b']') => Some((SeqKind::Osc, 2)),
            Some(b'P') => Some((SeqKind::Dcs, 2)),
            Some(b'_') => Some((SeqKind::Apc, 2)),
            _ => None,
        },
        Some(0x9B) => Some((SeqKind::Csi, 1)),
        Some(0x9D) => Some((SeqKind::Osc, 1)),
        Some(0x90) => Some((SeqKind::Dcs, 1)),
        Some(0x9F) => Some((SeqKind::Apc, 1)),
        _ => None,
    }
}

/// Finds the index just past the terminator, if the sequence is complete.
fn find_terminator(kind: SeqKind, buf: &[u8], header_end: usize) -> Option<usize> {
    match kind {
        SeqKind::Csi => {
            let mut i = header_end;
            while i < buf.len() {
                if (0x40..=0x7E).contains(&buf[i]) {
                    return Some(i + 1);
                }
                i += 1;
            }
            None
        }
        SeqKind::Osc | SeqKind::Dcs | SeqKind::Apc => {
            let mut i = header_end;
            while i < buf.len() {
                if buf[i] == 0x07 {
                    return Some(i + 1);
                }
                if buf[i] == 0x1B && buf.get(i + 1) == Some(&b'\\') {
                    return Some(i + 2);
                }
                i += 1;
            }
            None
        }
    }
}

/// Strips the ST/BEL terminator from a complete OSC/DCS/APC payload span.
fn body_without_terminator(buf: &[u8]) -> &[u8] {
    if buf.last() == Some(&0x07) {
        &buf[..buf.len() - 1]
    } else if buf.len() >= 2 && buf[buf.len() - 2] == 0x1B && buf[buf.len() - 1] == b'\\' {
        &buf[..buf.len() - 2]
    } else {
        buf
    }
}

fn handle_csi(params: &str, replies: &mut Vec<u8>, filtered: &mut Vec<u8>, raw: &[u8], ctx: &QueryContext) {
    let final_byte = params.chars().last();
    let body = &params[..params.len().saturating_sub(1)];

    match final_byte {
        Some('n') if body == "6" => replies.extend(responses::cpr(ctx)),
        Some('n') if body == "?6" => replies.extend(responses::extended_cpr(ctx)),
        Some('n') if body == "5" => replies.extend(responses::device_status()),
        Some('c') if body.is_empty() || body == "0" => replies.extend(responses::primary_da()),
        Some('c') if body == ">" || body == ">0" => replies.extend(responses::secondary_da()),
        Some('c') if body == "=" || body == "=0" => replies.extend(responses::tertiary_da()),
        Some('q') if body == ">" || body == ">0" => replies.extend(responses::xtversion()),
        Some('u') if body == "?" => replies.extend(responses::kitty_keyboard(ctx)),
        Some('p') if body.starts_with('?') && body.ends_with('$') => {
            if let Ok(ps) = body[1..body.len() - 1].parse::<u16>() {
                replies.extend(responses::decrqm(ps, ctx));
            } else {
                filtered.extend_from_slice(raw);
            }
        }
        Some('t') => {
            if let Ok(op) = body.parse::<u16>()
                && let Some(resp) = responses::xtwinops(op, ctx)
            {
                replies.extend(resp);
            } else {
                filtered.extend_from_slice(raw);
            }
        }
        _ => filtered.extend_from_slice(raw),
    }
}

fn handle_osc(payload: &[u8], replies: &mut Vec<u8>, filtered: &mut Vec<u8>, raw: &[u8], ctx: &QueryContext) {
    let text = String::from_utf8_lossy(payload);
    let parts: Vec<&str> = text.split(';').collect();

    match parts.as_slice() {
        ["4", idx, "?"] => {
            if let Ok(i) = idx.parse::<usize>() {
                let rgb = ctx.palette[i % ctx.palette.len()];
                replies.extend(responses::osc4_color(i as u8, rgb));
            } else {
                filtered.extend_from_slice(raw);
            }
        }
        ["10", "?"] => replies.extend(responses::osc_color(10, ctx.fg)),
        ["11", "?"] => replies.extend(responses::osc_color(11, ctx.bg)),
        ["12", "?"] => replies.extend(responses::osc_color(12, ctx.cursor_color)),
        ["52", _sel, "?"] => replies.extend(responses::osc52_empty()),
        _ => filtered.extend_from_slice(raw),
    }
}

fn handle_dcs(payload: &[u8], replies: &mut Vec<u8>, filtered: &mut Vec<u8>, raw: &[u8], ctx: &QueryContext) {
    let text = String::from_utf8_lossy(payload);
    if let Some(rest) = text.strip_prefix("+q") {
        replies.extend(responses::xtgettcap(rest, ctx));
    } else if let Some(rest) = text.strip_prefix("$q") {
        replies.extend(responses::decrqss(rest));
    } else {
        filtered.extend_from_slice(raw);
    }
}

impl PassthroughFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs one chunk of PTY output through the filter.
    pub fn process(
        &mut self,
        input: &[u8],
        ctx: &QueryContext,
        kitty_cache: &mut KittyTransmitCache,
    ) -> PassthroughResult {
        let buf: Vec<u8> = if self.carry.is_empty() {
            input.to_vec()
        } else {
            let mut b = std::mem::take(&mut self.carry);
            b.extend_from_slice(input);
            b
        };

        let mut result = PassthroughResult::default();
        let mut pos = 0usize;

        while pos < buf.len() {
            let Some(start_rel) = buf[pos..].iter().position(|&b| {
                matches!(b, 0x1B | 0x9B | 0x9D | 0x90 | 0x9F)
            }) else {
                result.filtered.extend_from_slice(&buf[pos..]);
                break;
            };
            let start = pos + start_rel;
            result.filtered.extend_from_slice(&buf[pos..start]);

            let Some((kind, header_len)) = seq_kind_at(&buf, start) else {
                // Lone ESC (or ESC followed by something we don't
                // recognize as a sequence prefix) not yet resolvable:
                // if it's the tail of the chunk, it might be a genuine
                // partial sequence; otherwise it's just a byte.
                if start + 1 >= buf.len() {
                    self.carry = buf[start..].to_vec();
                    pos = buf.len();
                    break;
                }
                result.filtered.push(buf[start]);
                pos = start + 1;
                continue;
            };
            let header_end = start + header_len;

            match find_terminator(kind, &buf, header_end) {
                Some(end) => {
                    let raw = &buf[start..end];
                    match kind {
                        SeqKind::Csi => {
                            let params = String::from_utf8_lossy(&buf[header_end..end]).into_owned();
                            handle_csi(&params, &mut result.replies, &mut result.filtered, raw, ctx);
                        }
                        SeqKind::Osc => {
                            let payload = body_without_terminator(&buf[header_end..end]);
                            handle_osc(payload, &mut result.replies, &mut result.filtered, raw, ctx);
                        }
                        SeqKind::Dcs => {
                            let payload = body_without_terminator(&buf[header_end..end]);
                            handle_dcs(payload, &mut result.replies, &mut result.filtered, raw, ctx);
                        }
                        SeqKind::Apc => {
                            let outcome = kitty_cache.handle_sequence(raw);
                            result.filtered.extend(outcome.forward);
                            if let Some(reply) = outcome.reply {
                                result.replies.extend(reply);
                            }
                        }
                    }
                    pos = end;
                }
                None => {
                    let pending = buf.len() - start;
                    if pending <= kind.limit() {
                        self.carry = buf[start..].to_vec();
                    } else {
                        log::warn!("passthrough buffer limit exceeded, flushing {pending} bytes unchanged");
                        result.filtered.extend_from_slice(&buf[start..]);
                    }
                    pos = buf.len();
                }
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_reply_ordering_scenario() {
        let ctx = QueryContext {
            cursor_x: 3,
            cursor_y: 1,
            cols: 10,
            ..QueryContext::default()
        };
        let mut filter = PassthroughFilter::new();
        let mut cache = KittyTransmitCache::new();
        let result = filter.process(b"hello\x1b[6nworld", &ctx, &mut cache);
        assert_eq!(result.filtered, b"helloworld");
        assert_eq!(result.replies, b"\x1b[2;4R");
    }

    #[test]
    fn kitty_query_passthrough_answers_ok_without_reaching_emulator() {
        let ctx = QueryContext::default();
        let mut filter = PassthroughFilter::new();
        let mut cache = KittyTransmitCache::new();
        let input = b"\x1b_Ga=q,t=f,i=1;\x1b\\";
        let result = filter.process(input, &ctx, &mut cache);
        assert!(result.filtered.is_empty());
        assert_eq!(result.replies, b"\x1b_Gi=1;OK\x1b\\");
    }

    #[test]
    fn buffers_partial_sequence_across_chunks() {
        let ctx = QueryContext {
            cursor_x: 0,
            cursor_y: 0,
            ..QueryContext::default()
        };
        let mut filter = PassthroughFilter::new();
        let mut cache = KittyTransmitCache::new();

        let first = filter.process(b"abc\x1b[6", &ctx, &mut cache);
        assert_eq!(first.filtered, b"abc");
        assert!(first.replies.is_empty());

        let second = filter.process(b"n", &ctx, &mut cache);
        assert!(second.filtered.is_empty());
        assert_eq!(second.replies, b"\x1b[1;1R");
    }

    #[test]
    fn oversized_partial_is_flushed_unchanged() {
        let ctx = QueryContext::default();
        let mut filter = PassthroughFilter::new();
        let mut cache = KittyTransmitCache::new();
        let mut input = vec![0x1B, b'['];
        input.extend(std::iter::repeat(b'1').take(STANDARD_LIMIT + 10));
        let result = filter.process(&input, &ctx, &mut cache);
        assert_eq!(result.filtered, input);
    }

    #[test]
    fn unrecognized_osc_passes_through_unchanged() {
        let ctx = QueryContext::default();
        let mut filter = PassthroughFilter::new();
        let mut cache = KittyTransmitCache::new();
        let input = b"\x1b]0;my title\x07";
        let result = filter.process(input, &ctx, &mut cache);
        assert_eq!(result.filtered, input);
        assert!(result.replies.is_empty());
    }
}
