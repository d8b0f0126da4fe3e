//! Cleaning raw request values before they are trusted.

/// Remove backslash escaping added by the transport (`\'` becomes `'`,
/// `\\` becomes `\`). A trailing lone backslash is dropped.
pub fn unslash(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Sanitize a single-line text value.
///
/// Strips markup tags, removes percent-encoded octets, turns line breaks and
/// tabs into spaces, collapses whitespace runs and trims the result.
pub fn text_field(raw: &str) -> String {
    let stripped = strip_tags(raw);
    let decoded = strip_octets(&stripped);
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn strip_tags(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        let opens_tag = c == '<'
            && chars
                .peek()
                .is_some_and(|n| n.is_ascii_alphabetic() || matches!(n, '/' | '!' | '?'));
        if opens_tag {
            // An unterminated tag swallows the rest of the input.
            for skipped in chars.by_ref() {
                if skipped == '>' {
                    break;
                }
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn strip_octets(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut out = String::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        let is_octet = bytes[i] == b'%'
            && bytes.get(i + 1).is_some_and(u8::is_ascii_hexdigit)
            && bytes.get(i + 2).is_some_and(u8::is_ascii_hexdigit);
        if is_octet {
            i += 3;
            continue;
        }
        // `%` and hex digits are ASCII, so `i` always sits on a char boundary.
        let Some(c) = raw[i..].chars().next() else {
            break;
        };
        out.push(c);
        i += c.len_utf8();
    }
    out
}
