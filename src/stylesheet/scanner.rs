//! Tokenizer for the parts of CSS the rewrite engine cares about
//!
//! Only two constructs are recognized: `@import` rules and `url(...)`
//! functions. Comments and string literals are skipped so that text such as
//! `content: "url(x)"` or a commented-out import is never rewritten.
//!
//! Where this differs from a full CSS tokenizer:
//! - an unquoted `url(` containing `(`, a quote, or whitespace before `)` is a
//!   bad-url token and is skipped, never partially matched;
//! - an unterminated `url(` stops only that reference; scanning resumes right
//!   after the `url(` keyword and its opening quote.

use std::ops::Range;

/// A reference found in CSS text, with the byte span it occupies
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CssReference {
    /// `@import <target> <conditions>;`. The span covers the whole rule,
    /// including the terminating `;` when present
    Import {
        span: Range<usize>,
        target: String,
        conditions: String,
    },
    /// `url(<value>)`. The span covers `url(` through `)`
    Url { span: Range<usize>, value: String },
}

impl CssReference {
    #[must_use]
    pub fn span(&self) -> &Range<usize> {
        match self {
            CssReference::Import { span, .. } | CssReference::Url { span, .. } => span,
        }
    }
}

/// Scan `css` and return every `@import` and `url()` reference in order
#[must_use]
pub fn scan(css: &str) -> Vec<CssReference> {
    let bytes = css.as_bytes();
    let mut refs = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i = skip_comment(bytes, i);
            }
            b'"' | b'\'' => {
                i = match read_string(bytes, i) {
                    Some((end, _)) => end,
                    None => line_end(bytes, i),
                };
            }
            b'\\' => i += 2,
            b'@' if starts_with_ci(bytes, i + 1, b"import")
                && !bytes.get(i + 7).copied().is_some_and(is_ident_byte) =>
            {
                match read_import(bytes, i) {
                    Some(import) => {
                        i = import.span().end;
                        refs.push(import);
                    }
                    None => {
                        log::debug!("Skipping malformed @import at byte {i}");
                        i += 7;
                    }
                }
            }
            b'u' | b'U'
                if starts_with_ci(bytes, i, b"url(")
                    && (i == 0 || !is_ident_byte(bytes[i - 1])) =>
            {
                match read_url(bytes, i) {
                    Some((end, value)) => {
                        refs.push(CssReference::Url {
                            span: i..end,
                            value,
                        });
                        i = end;
                    }
                    None => {
                        log::debug!("Skipping malformed url() at byte {i}");
                        i = past_url_keyword(bytes, i);
                    }
                }
            }
            _ => i += 1,
        }
    }

    refs
}

/// Replace each span with its replacement text. Spans must be sorted and
/// non-overlapping (as returned by [`scan`]).
#[must_use]
pub fn splice(css: &str, replacements: Vec<(Range<usize>, String)>) -> String {
    let mut out = String::with_capacity(css.len());
    let mut cursor = 0;
    for (span, replacement) in replacements {
        out.push_str(&css[cursor..span.start]);
        out.push_str(&replacement);
        cursor = span.end;
    }
    out.push_str(&css[cursor..]);
    out
}

/// Parse `@import` starting at the `@`
fn read_import(bytes: &[u8], start: usize) -> Option<CssReference> {
    let mut j = skip_whitespace(bytes, start + 7);

    let target = match bytes.get(j)? {
        b'"' | b'\'' => {
            let (end, value) = read_string(bytes, j)?;
            j = end;
            value
        }
        b'u' | b'U' if starts_with_ci(bytes, j, b"url(") => {
            let (end, value) = read_url(bytes, j)?;
            j = end;
            value
        }
        _ => return None,
    };

    // Conditions (media list, layer(), supports()) run up to the `;`
    let conditions_start = j;
    let mut depth = 0usize;
    while j < bytes.len() {
        match bytes[j] {
            b'"' | b'\'' => {
                j = read_string(bytes, j)?.0;
                continue;
            }
            b'(' => depth += 1,
            b')' => depth = depth.saturating_sub(1),
            b';' if depth == 0 => break,
            b'{' | b'}' if depth == 0 => return None,
            _ => {}
        }
        j += 1;
    }

    let conditions = String::from_utf8_lossy(&bytes[conditions_start..j.min(bytes.len())])
        .trim()
        .to_string();
    let end = if j < bytes.len() { j + 1 } else { bytes.len() };

    Some(CssReference::Import {
        span: start..end,
        target,
        conditions,
    })
}

/// Parse `url(...)` starting at the `u`; returns the index after `)` and the
/// unescaped value
fn read_url(bytes: &[u8], start: usize) -> Option<(usize, String)> {
    let mut j = skip_whitespace(bytes, start + 4);

    match bytes.get(j)? {
        b'"' | b'\'' => {
            let (end, value) = read_string(bytes, j)?;
            j = skip_whitespace(bytes, end);
            (bytes.get(j)? == &b')').then_some((j + 1, value))
        }
        _ => {
            let mut value = Vec::new();
            while j < bytes.len() {
                match bytes[j] {
                    b')' => return Some((j + 1, bytes_to_string(value))),
                    b'"' | b'\'' | b'(' => return None,
                    b'\\' => {
                        let (next, decoded) = read_escape(bytes, j)?;
                        value.extend_from_slice(decoded.encode_utf8(&mut [0; 4]).as_bytes());
                        j = next;
                    }
                    c if c.is_ascii_whitespace() => {
                        j = skip_whitespace(bytes, j);
                        return (bytes.get(j)? == &b')')
                            .then(|| (j + 1, bytes_to_string(value)));
                    }
                    c => {
                        value.push(c);
                        j += 1;
                    }
                }
            }
            None
        }
    }
}

/// Parse a quoted string starting at the quote; returns the index after the
/// closing quote and the unescaped content
fn read_string(bytes: &[u8], start: usize) -> Option<(usize, String)> {
    let quote = bytes[start];
    let mut value = Vec::new();
    let mut j = start + 1;

    while j < bytes.len() {
        match bytes[j] {
            c if c == quote => return Some((j + 1, bytes_to_string(value))),
            b'\n' | b'\r' | b'\x0c' => return None,
            b'\\' => {
                // Escaped newline is a line continuation
                if matches!(bytes.get(j + 1), Some(b'\n' | b'\r' | b'\x0c')) {
                    j += 2;
                    continue;
                }
                let (next, decoded) = read_escape(bytes, j)?;
                value.extend_from_slice(decoded.encode_utf8(&mut [0; 4]).as_bytes());
                j = next;
            }
            c => {
                value.push(c);
                j += 1;
            }
        }
    }
    None
}

/// Decode the escape starting at the backslash
fn read_escape(bytes: &[u8], start: usize) -> Option<(usize, char)> {
    let first = *bytes.get(start + 1)?;
    if !first.is_ascii_hexdigit() {
        // Copy the escaped character (which may be multi-byte) as-is
        let len = utf8_len(first);
        let ch = std::str::from_utf8(bytes.get(start + 1..start + 1 + len)?)
            .ok()?
            .chars()
            .next()?;
        return Some((start + 1 + len, ch));
    }

    let mut j = start + 1;
    let mut code = 0u32;
    while j < bytes.len() && j < start + 7 && bytes[j].is_ascii_hexdigit() {
        code = code * 16 + char::from(bytes[j]).to_digit(16)?;
        j += 1;
    }
    // One whitespace character after a hex escape belongs to the escape
    if j < bytes.len() && bytes[j].is_ascii_whitespace() {
        j += 1;
    }
    let ch = char::from_u32(code)
        .filter(|&c| c != '\0')
        .unwrap_or('\u{FFFD}');
    Some((j, ch))
}

/// Index just after `url(` and an opening quote, if any, so a broken
/// reference is not re-read as an unterminated string
fn past_url_keyword(bytes: &[u8], start: usize) -> usize {
    let j = skip_whitespace(bytes, start + 4);
    match bytes.get(j) {
        Some(b'"' | b'\'') => j + 1,
        _ => start + 4,
    }
}

fn skip_comment(bytes: &[u8], start: usize) -> usize {
    let mut j = start + 2;
    while j + 1 < bytes.len() {
        if bytes[j] == b'*' && bytes[j + 1] == b'/' {
            return j + 2;
        }
        j += 1;
    }
    bytes.len()
}

fn skip_whitespace(bytes: &[u8], mut j: usize) -> usize {
    while j < bytes.len() && bytes[j].is_ascii_whitespace() {
        j += 1;
    }
    j
}

fn line_end(bytes: &[u8], start: usize) -> usize {
    bytes[start + 1..]
        .iter()
        .position(|&b| b == b'\n')
        .map_or(bytes.len(), |p| start + 1 + p)
}

fn starts_with_ci(bytes: &[u8], at: usize, needle: &[u8]) -> bool {
    bytes
        .get(at..at + needle.len())
        .is_some_and(|window| window.eq_ignore_ascii_case(needle))
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b == b'\\' || b >= 0x80
}

fn utf8_len(first: u8) -> usize {
    match first {
        0xF0..=0xFF => 4,
        0xE0..=0xEF => 3,
        0xC0..=0xDF => 2,
        _ => 1,
    }
}

fn bytes_to_string(bytes: Vec<u8>) -> String {
    String::from_utf8(bytes).unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
}
