//! The path resolver (C5): drives the token parser to walk down a dotted path
//! like `u.Jack.Age./`, narrowing the search bound into nested objects as it
//! goes, until it lands on the token the path names.

use crate::device::PageDevice;
use crate::parser::{Token, TokenKind, TokenParser};
use crate::status::{FindResult, FindStatus};

/// Resolve `query` (a dotted path terminated by `/`, e.g. `u.Jack.Age./`) against
/// the live document on `device`.
pub(crate) fn resolve<D: PageDevice>(device: &D, region_len: u32, query: &[u8]) -> FindResult {
    let mut parser = TokenParser::new(device, region_len);
    let root = parser.next();
    if root.kind != TokenKind::Object {
        return FindResult::not_found(0);
    }

    let mut bound = root.end;
    let mut q = query;

    loop {
        let dot_index = match index_of(q, b'.') {
            Some(i) => i,
            None => return FindResult::not_found(0),
        };

        loop {
            let tok = parser.next();
            match tok.kind {
                TokenKind::End => return FindResult::not_found(tok.start),
                TokenKind::String => {
                    if tok.end > bound {
                        return FindResult::not_found(tok.start);
                    }
                    if part_matches(device, &tok, q, dot_index) {
                        break;
                    }
                }
                _ => {}
            }
        }

        let value = parser.next();
        if matches!(value.kind, TokenKind::Object | TokenKind::Array) {
            bound = value.end;
        }

        let last_part = q.get(dot_index + 1) == Some(&b'/');
        if last_part {
            return FindResult {
                status: FindStatus::Found,
                kind: value.kind,
                start: value.start,
                end: value.end,
            };
        }
        q = &q[dot_index + 1..];
    }
}

fn index_of(haystack: &[u8], needle: u8) -> Option<usize> {
    haystack.iter().position(|&b| b == needle)
}

/// Compare a flash-resident string token against the current query part,
/// char-by-char. The query index cycles back to zero once it passes the
/// part's terminating `.`, rather than stopping — so a match requires the
/// flash string's length to equal the part's length exactly, not merely share
/// a matching prefix.
fn part_matches<D: PageDevice>(device: &D, tok: &Token, query: &[u8], dot_index: usize) -> bool {
    if tok.start > tok.end {
        return dot_index == 0;
    }
    if device.read_byte(tok.start) != query[0] {
        return false;
    }

    let mut eq = 0usize;
    let mut qi = 0usize;
    let mut p = tok.start;
    let end_excl = tok.end + 1;
    while p != end_excl {
        let c = device.read_byte(p);
        if c == query[qi] {
            eq += 1;
            qi += 1;
            if qi > dot_index {
                qi = 0;
            }
            p += 1;
        } else {
            break;
        }
    }
    eq >= dot_index
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::VecDevice;
    use pretty_assertions::assert_eq;

    fn device_for(json: &str, page_size: u32, len: u32) -> VecDevice {
        let mut bytes = json.as_bytes().to_vec();
        bytes.push(b'/');
        bytes.resize(len as usize, 0xFF);
        VecDevice::preloaded(bytes, page_size)
    }

    #[test]
    fn finds_nested_primitive() {
        let device = device_for(r#"{"u":{"Jack":{"Age":28}}}"#, 256, 1024);
        let result = resolve(&device, 1024, b"u.Jack.Age./");
        assert_eq!(result.status, FindStatus::Found);
        assert_eq!(result.kind, TokenKind::Primitive);
        let mut buf = vec![0u8; result.len() as usize];
        device.read(result.start, &mut buf);
        assert_eq!(buf, b"28");
    }

    #[test]
    fn finds_top_level_object() {
        let device = device_for(r#"{"u":{"Jack":{"Age":28}}}"#, 256, 1024);
        let result = resolve(&device, 1024, b"u./");
        assert_eq!(result.status, FindStatus::Found);
        assert_eq!(result.kind, TokenKind::Object);
    }

    #[test]
    fn missing_key_is_not_found() {
        let device = device_for(r#"{"u":{"Jack":{"Age":28}}}"#, 256, 1024);
        let result = resolve(&device, 1024, b"u.Jill.Age./");
        assert_eq!(result.status, FindStatus::NotFound);
    }

    #[test]
    fn sibling_with_matching_prefix_does_not_match() {
        let device = device_for(r#"{"Age":1,"Ages":2}"#, 256, 1024);
        let result = resolve(&device, 1024, b"Age./");
        assert_eq!(result.status, FindStatus::Found);
        let mut buf = vec![0u8; result.len() as usize];
        device.read(result.start, &mut buf);
        assert_eq!(buf, b"1");
    }

    #[test]
    fn finds_array_value() {
        let device = device_for(r#"{"list":[1,2,3]}"#, 256, 1024);
        let result = resolve(&device, 1024, b"list./");
        assert_eq!(result.status, FindStatus::Found);
        assert_eq!(result.kind, TokenKind::Array);
    }
}
