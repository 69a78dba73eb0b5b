//! Character normalization applied to every cell re-converted from the
//! backend (spec §4.2 step 3): zero-width/invisible characters collapse to
//! a fully-transparent space, space-like characters collapse to plain
//! U+0020 while keeping their colors/attributes.

/// Zero-width or invisible characters that must render as nothing: soft
/// hyphen, ZWJ/ZWSP, bidi marks, variation selectors, the tag block,
/// Mongolian vowel separators, Hangul filler, BOM.
fn is_zero_width_or_invisible(ch: char) -> bool {
    matches!(ch,
        '\u{00AD}' // soft hyphen
        | '\u{200B}' // ZWSP
        | '\u{200C}' // ZWNJ
        | '\u{200D}' // ZWJ
        | '\u{200E}' | '\u{200F}' // LRM/RLM
        | '\u{202A}'..='\u{202E}' // bidi embedding/override controls
        | '\u{2060}'..='\u{2064}' // word joiner, invisible operators
        | '\u{FE00}'..='\u{FE0F}' // variation selectors
        | '\u{E0000}'..='\u{E007F}' // tag block
        | '\u{180B}'..='\u{180E}' // Mongolian vowel separators and variation selectors
        | '\u{3164}' // Hangul filler
        | '\u{FEFF}' // BOM
    )
}

/// Visible-but-space-shaped characters that normalize to plain space while
/// preserving the cell's colors and attributes.
fn is_space_like(ch: char) -> bool {
    matches!(ch,
        '\u{00A0}' // NBSP
        | '\u{1680}' // Ogham space mark
        | '\u{2000}'..='\u{200A}' // en quad .. hair space
        | '\u{202F}' // narrow NBSP
        | '\u{205F}' // medium mathematical space
        | '\u{3000}' // ideographic space
        | '\u{2800}' // braille blank pattern
    )
}

/// CJK ideographs (and the common compatibility/extension blocks) that are
/// normally East-Asian-wide. The caller uses this to detect the case the
/// backend itself reported as narrow (width 1) despite the character being
/// an ideograph — spec §4.2 step 3 replaces that cell with a space rather
/// than rendering a wide glyph into a single-wide cell.
pub fn is_cjk_ideograph(ch: char) -> bool {
    matches!(ch,
        '\u{2E80}'..='\u{2EFF}' // CJK radicals supplement
        | '\u{3400}'..='\u{4DBF}' // CJK unified ideographs extension A
        | '\u{4E00}'..='\u{9FFF}' // CJK unified ideographs
        | '\u{F900}'..='\u{FAFF}' // CJK compatibility ideographs
        | '\u{20000}'..='\u{2A6DF}' // CJK unified ideographs extension B
        | '\u{2A700}'..='\u{2EBEF}' // CJK unified ideographs extension C-F
        | '\u{2F800}'..='\u{2FA1F}' // CJK compatibility ideographs supplement
    )
}

/// Applies the normalization rules to one backend-reported character.
/// Width/wide-CJK-with-backend-width-1 handling is applied by the caller,
/// which has access to the backend's reported cell width.
pub fn normalize_char(ch: char) -> char {
    if is_zero_width_or_invisible(ch) {
        ' '
    } else if is_space_like(ch) {
        ' '
    } else {
        ch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_width_joiner_normalizes_to_space() {
        assert_eq!(normalize_char('\u{200D}'), ' ');
    }

    #[test]
    fn nbsp_normalizes_to_plain_space() {
        assert_eq!(normalize_char('\u{00A0}'), ' ');
    }

    #[test]
    fn ordinary_characters_pass_through() {
        assert_eq!(normalize_char('a'), 'a');
        assert_eq!(normalize_char('中'), '中');
    }

    #[test]
    fn cjk_ideograph_is_detected_for_the_width_1_fallback() {
        assert!(is_cjk_ideograph('中'));
        assert!(is_cjk_ideograph('\u{F900}'));
        assert!(!is_cjk_ideograph('a'));
    }
}
