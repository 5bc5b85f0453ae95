/// Strip rich-text markup (`<color=...>`, `<sprite ...>`) and characters that
/// confuse screen readers, then trim.
pub fn clean_rich_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_tag = false;
    for c in text.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if in_tag => {}
            // zero-width and directional marks, word joiner, line/paragraph separators
            '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{FEFF}' | '\u{200E}' | '\u{200F}' | '\u{2060}'
            | '\u{2028}' | '\u{2029}' => {}
            '\u{00A0}' => out.push(' '),
            _ => out.push(c),
        }
    }
    out.trim().to_string()
}
