//! Insert (C6): rewrites the caller's single-quoted convenience syntax into
//! proper double-quoted JSON, then streams the result through the append writer
//! (C2) a quad at a time, one document at a time, until every `/`-terminated
//! document in the buffer has been written.

use crate::device::PageDevice;
use crate::status::InsertError;
use crate::writer::AppendWriter;

/// Replace every `'` with `"` in place. The caller-facing API accepts single
/// quotes so literal JSON can be embedded in a Rust string without escaping.
pub(crate) fn rewrite_quotes(buf: &mut [u8]) {
    for b in buf.iter_mut() {
        if *b == b'\'' {
            *b = b'"';
        }
    }
}

/// Length of the text preceding the terminating `/` in a caller-supplied
/// single-document buffer (used by `update`/`append_array`, which take one
/// value rather than a stream of them).
pub(crate) fn value_len(buf: &[u8]) -> usize {
    buf.iter().position(|&b| b == b'/').unwrap_or(buf.len())
}

// Byte `i` of `buf`, or `0` once `i` reaches `bound` — pads the final,
// possibly-partial quad of a document with the zero bytes `write_quad`
// expects, without reading into whatever document follows it in the buffer.
fn byte_at(buf: &[u8], i: usize, bound: usize) -> u8 {
    if i >= bound {
        0
    } else {
        buf[i]
    }
}

/// Stream `n` `/`-terminated documents out of `buf` into flash via `writer`.
pub(crate) fn insert<D: PageDevice>(
    writer: &mut AppendWriter,
    device: &D,
    buf: &mut [u8],
    n: usize,
) -> Result<(), InsertError> {
    rewrite_quotes(buf);

    let mut pos = 0usize;
    for _ in 0..n {
        let term = buf[pos..]
            .iter()
            .position(|&b| b == b'/')
            .map(|i| pos + i)
            .unwrap_or(buf.len().saturating_sub(1));
        let doc_len = term - pos + 1;

        let bound = pos + doc_len;
        let mut written = 0usize;
        while written < doc_len {
            let b1 = byte_at(buf, pos + written, bound);
            let b2 = byte_at(buf, pos + written + 1, bound);
            let b3 = byte_at(buf, pos + written + 2, bound);
            let b4 = byte_at(buf, pos + written + 3, bound);
            writer.write_quad(device, b1, b2, b3, b4)?;
            written += 4;
        }
        pos += doc_len;
    }
    Ok(())
}
