//! JSON Pointer implementation (RFC 6901).
//!
//! Segments are `/`-separated, with `~` escaped as `~0` and `/` escaped as `~1`.
//! Validation issues are reported at pointer paths, and local `$ref`s
//! (`#`, `#/$defs/Name`) are resolved by splitting them into segments.

/// Appends a segment to a JSON Pointer path, applying RFC 6901 escaping.
pub fn push_segment(path: &mut String, segment: &str) {
    path.push('/');
    for c in segment.chars() {
        match c {
            '~' => path.push_str("~0"),
            '/' => path.push_str("~1"),
            other => path.push(other),
        }
    }
}

/// Returns `path` with `segment` appended.
#[must_use]
pub fn format(path: &str, segment: &str) -> String {
    let mut result: String = path.to_string();
    push_segment(&mut result, segment);
    result
}

/// Splits a document-local reference (`#` or `#/a/b`) into unescaped segments.
///
/// Returns `None` for references into other documents (`other.json#/a`) and
/// for malformed pointers. `#` yields an empty list (the root).
pub fn local_ref_segments(reference: &str) -> Option<Vec<String>> {
    let pointer: &str = reference.strip_prefix('#')?;
    if pointer.is_empty() {
        return Some(Vec::new());
    }
    let pointer: &str = pointer.strip_prefix('/')?;
    pointer.split('/').map(unescape_segment).collect()
}

/// Reverses RFC 6901 escaping. A `~` not followed by `0` or `1` is malformed.
fn unescape_segment(segment: &str) -> Option<String> {
    let mut out: String = String::with_capacity(segment.len());
    let mut chars = segment.chars();
    while let Some(c) = chars.next() {
        if c == '~' {
            match chars.next() {
                Some('0') => out.push('~'),
                Some('1') => out.push('/'),
                _ => return None,
            }
        } else {
            out.push(c);
        }
    }
    Some(out)
}
