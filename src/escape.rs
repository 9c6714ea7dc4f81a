//! JSON string escaping.
//!
//! This module implements the one escaping routine the whole crate relies
//! on: turning raw bytes into a form that is safe to embed between double
//! quotes in a JSON document, and safe to embed in HTML/JS contexts on top
//! of that. It runs in a single left-to-right pass and copies contiguous
//! safe runs in bulk, so the common all-safe string costs one `memcpy`.

const HEX: &[u8; 16] = b"0123456789abcdef";

/// ASCII bytes that can pass through unescaped.
///
/// Printable ASCII minus `"` and `\`, and minus `<`, `>`, `&` because the
/// output may be rendered into HTML or evaluated as JavaScript; escaping
/// them unconditionally closes that injection hole.
static HTML_SAFE: [bool; 128] = build_html_safe();

const fn build_html_safe() -> [bool; 128] {
    let mut set = [false; 128];
    let mut b = 0x20;
    while b < 0x80 {
        set[b] = !matches!(b as u8, b'"' | b'\\' | b'<' | b'>' | b'&');
        b += 1;
    }
    set
}

/// Appends the JSON-safe escaped form of `s` to `buff`, without surrounding
/// quotes.
///
/// Escaping rules, in order:
///
/// * safe ASCII passes through untouched, copied in bulk runs
/// * `\` and `"` become `\\` and `\"`
/// * `\n`, `\r`, `\t` become their two-character escapes
/// * other control bytes become `\u00XX`
/// * invalid UTF-8 becomes `�`, consuming one byte per error
/// * U+2028 and U+2029 become ` ` / ` ` -- they are legal raw JSON
///   but break when the output is evaluated as JavaScript, so they are
///   escaped unconditionally
///
/// # Examples
///
/// ```
/// let mut buff = Vec::new();
/// linelog::escape::append_json_safe(&mut buff, b"a \"quoted\" <tag>");
/// assert_eq!(buff, br#"a \"quoted\" \u003ctag\u003e"#);
/// ```
pub fn append_json_safe(buff: &mut Vec<u8>, s: &[u8]) {
    let mut start = 0;
    let mut i = 0;
    while i < s.len() {
        let b = s[i];
        if b < 0x80 {
            if HTML_SAFE[b as usize] {
                i += 1;
                continue;
            }
            if start < i {
                buff.extend_from_slice(&s[start..i]);
            }
            buff.push(b'\\');
            match b {
                b'\\' | b'"' => buff.push(b),
                b'\n' => buff.push(b'n'),
                b'\r' => buff.push(b'r'),
                b'\t' => buff.push(b't'),
                _ => {
                    buff.extend_from_slice(b"u00");
                    buff.push(HEX[(b >> 4) as usize]);
                    buff.push(HEX[(b & 0xf) as usize]);
                }
            }
            i += 1;
            start = i;
            continue;
        }
        match decode_char(&s[i..]) {
            Some((c, width)) => {
                if c == '\u{2028}' || c == '\u{2029}' {
                    if start < i {
                        buff.extend_from_slice(&s[start..i]);
                    }
                    buff.extend_from_slice(b"\\u202");
                    buff.push(HEX[(c as usize) & 0xf]);
                    i += width;
                    start = i;
                    continue;
                }
                i += width;
            }
            None => {
                if start < i {
                    buff.extend_from_slice(&s[start..i]);
                }
                buff.extend_from_slice(b"\\ufffd");
                i += 1;
                start = i;
            }
        }
    }
    if start < s.len() {
        buff.extend_from_slice(&s[start..]);
    }
}

/// Decodes one UTF-8 character at the start of `s`, returning the character
/// and its encoded width. `None` means the leading byte does not begin a
/// valid sequence.
fn decode_char(s: &[u8]) -> Option<(char, usize)> {
    let width = match s[0] {
        0xc0..=0xdf => 2,
        0xe0..=0xef => 3,
        0xf0..=0xf7 => 4,
        _ => return None,
    };
    if s.len() < width {
        return None;
    }
    std::str::from_utf8(&s[..width])
        .ok()
        .and_then(|chunk| chunk.chars().next())
        .map(|c| (c, width))
}
