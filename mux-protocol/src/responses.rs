use crate::context::QueryContext;

pub const ST: &str = "\x1b\\";

pub fn cpr(ctx: &QueryContext) -> Vec<u8> {
    format!("\x1b[{};{}R", ctx.cursor_y + 1, ctx.cursor_x + 1).into_bytes()
}

pub fn extended_cpr(ctx: &QueryContext) -> Vec<u8> {
    format!("\x1b[?{};{};0R", ctx.cursor_y + 1, ctx.cursor_x + 1).into_bytes()
}

pub fn device_status() -> Vec<u8> {
    b"\x1b[0n".to_vec()
}

pub fn primary_da() -> Vec<u8> {
    // VT220 with ANSI color, matching xterm's commonly-seen response shape.
    b"\x1b[?62;1;22c".to_vec()
}

pub fn secondary_da() -> Vec<u8> {
    // VT500-class terminal, openmux firmware version 1.0.0, no cartridge.
    b"\x1b[>65;100;0c".to_vec()
}

pub fn tertiary_da() -> Vec<u8> {
    format!("\x1bP!|00000000{ST}").into_bytes()
}

pub fn xtversion() -> Vec<u8> {
    format!("\x1bP>|openmux({}){ST}", env!("CARGO_PKG_VERSION")).into_bytes()
}

pub fn decrqm(ps: u16, ctx: &QueryContext) -> Vec<u8> {
    format!("\x1b[?{};{}$y", ps, ctx.mode_state(ps).to_code()).into_bytes()
}

pub fn kitty_keyboard(ctx: &QueryContext) -> Vec<u8> {
    format!("\x1b[?{}u", ctx.kitty_keyboard_flags).into_bytes()
}

/// XTWINOPS 14/16/18: pixel size / cell size / char size respectively.
pub fn xtwinops(op: u16, ctx: &QueryContext) -> Option<Vec<u8>> {
    match op {
        14 => Some(format!("\x1b[4;{};{}t", ctx.window_height_px, ctx.window_width_px).into_bytes()),
        16 => Some(format!("\x1b[6;{};{}t", ctx.cell_height_px, ctx.cell_width_px).into_bytes()),
        18 => Some(format!("\x1b[8;{};{}t", ctx.rows, ctx.cols).into_bytes()),
        _ => None,
    }
}

/// A small static capability table for XTGETTCAP; anything else is
/// reported unsupported (leading `0` per the DCS response convention).
fn tcap_value(name: &str, ctx: &QueryContext) -> Option<String> {
    match name {
        "colors" => Some("256".to_string()),
        "Co" => Some("256".to_string()),
        "RGB" => Some("8".to_string()),
        "TN" | "name" => Some("openmux".to_string()),
        "cols" => Some(ctx.cols.to_string()),
        "lines" => Some(ctx.rows.to_string()),
        _ => None,
    }
}

fn hex_encode(s: &str) -> String {
    s.bytes().map(|b| format!("{b:02X}")).collect()
}

fn hex_decode(s: &str) -> Option<String> {
    if s.len() % 2 != 0 {
        return None;
    }
    let mut out = Vec::with_capacity(s.len() / 2);
    let bytes = s.as_bytes();
    for chunk in bytes.chunks(2) {
        let byte = u8::from_str_radix(std::str::from_utf8(chunk).ok()?, 16).ok()?;
        out.push(byte);
    }
    String::from_utf8(out).ok()
}

/// `DCS+q<hex;hex;...>ST`
pub fn xtgettcap(payload: &str, ctx: &QueryContext) -> Vec<u8> {
    let mut parts = Vec::new();
    let mut any_found = false;
    for hex_name in payload.split(';') {
        let Some(name) = hex_decode(hex_name) else {
            continue;
        };
        if let Some(value) = tcap_value(&name, ctx) {
            any_found = true;
            parts.push(format!("{}={}", hex_encode(&name), hex_encode(&value)));
        }
    }
    let status = if any_found { 1 } else { 0 };
    format!("\x1bP{}+r{}{ST}", status, parts.join(";")).into_bytes()
}

/// `DCS$q<Pt>ST` — handles a small set of well-known settings.
pub fn decrqss(pt: &str) -> Vec<u8> {
    let response = match pt {
        "m" => Some("0m"),                  // SGR: report "no attributes set"
        "r" => Some("1;24r"),               // DECSTBM: full-screen scroll region
        "\"q" => Some("0\"q"),              // DECSCA
        " q" => Some("2 q"),                // DECSCUSR: steady block cursor
        _ => None,
    };
    match response {
        Some(body) => format!("\x1bP1$r{body}{ST}").into_bytes(),
        None => format!("\x1bP0$r{ST}").into_bytes(),
    }
}

pub fn osc4_color(index: u8, rgb: [u8; 3]) -> Vec<u8> {
    format!(
        "\x1b]4;{};rgb:{:02x}/{:02x}/{:02x}\x07",
        index, rgb[0], rgb[1], rgb[2]
    )
    .into_bytes()
}

pub fn osc_color(code: u16, rgb: [u8; 3]) -> Vec<u8> {
    format!("\x1b]{};rgb:{:02x}/{:02x}/{:02x}\x07", code, rgb[0], rgb[1], rgb[2]).into_bytes()
}

/// OSC 52 clipboard read queries never disclose clipboard contents.
pub fn osc52_empty() -> Vec<u8> {
    b"\x1b]52;c;\x07".to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cpr_is_one_based() {
        let ctx = QueryContext {
            cursor_x: 3,
            cursor_y: 1,
            ..QueryContext::default()
        };
        assert_eq!(cpr(&ctx), b"\x1b[2;4R");
    }

    #[test]
    fn xtgettcap_round_trips_known_capability() {
        let ctx = QueryContext::default();
        let query = hex_encode("colors");
        let response = xtgettcap(&query, &ctx);
        let response = String::from_utf8(response).unwrap();
        assert!(response.starts_with("\x1bP1+r"));
        assert!(response.contains(&hex_encode("colors")));
    }
}
