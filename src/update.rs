//! The update engine (C7): replaces the value at a resolved path with a new one,
//! using only the store's two page-sized RAM buffers no matter how far the
//! replacement's length differs from the original.
//!
//! All three public operations this module backs — replacing a scalar, adding an
//! object member, and appending an array element — reduce to one primitive,
//! [`splice`]: cut `old_len` bytes starting at `edit_start` out of the live
//! stream and put `replacement` in their place. Adding a member or an element is
//! just a splice with `old_len == 0` at the position of the closing bracket.
//!
//! Shifting live bytes out of the way for an expanding splice walks destination
//! pages from the high end of the document down to the page containing
//! `edit_start`, erasing and reprogramming one page at a time (I5). Each page's
//! new content is reconstructed byte-by-byte from three sources: the untouched
//! prefix before `edit_start`, the replacement itself, and the untouched
//! original bytes beyond the edited region (read from wherever they currently
//! live, since the shift only ever moves bytes downward in address-space terms
//! relative to what has already been written — a descending pass never reads a
//! byte that a higher, earlier iteration has already overwritten). The one
//! exception is the page containing `edit_start` itself: once that page's own
//! erase/program cycle begins, its pre-shift content is gone, so it is captured
//! into the second RAM buffer before any erasing starts.

use crate::addr::page_base;
use crate::device::PageDevice;
use crate::status::UpdateError;

pub(crate) struct SpliceEdit<'a> {
    pub edit_start: u32,
    pub old_len: u32,
    pub replacement: &'a [u8],
}

/// Replace `old_len` live bytes starting at `edit_start` with `replacement`,
/// growing or keeping flat the live region as needed. `live_end` is one past the
/// last live byte before the edit; returns the new value of `live_end`.
///
/// Fails with `ContractionUnsupported` if `replacement` is shorter than
/// `old_len` — shrinking in place would require compaction, which this store
/// does not implement.
pub(crate) fn splice<D: PageDevice, const PAGE: usize>(
    device: &D,
    scratch: &mut [u8; PAGE],
    prestore: &mut [u8; PAGE],
    live_end: u32,
    capacity: u32,
    edit: SpliceEdit<'_>,
) -> Result<u32, UpdateError> {
    let replacement_len = edit.replacement.len() as u32;
    if replacement_len < edit.old_len {
        return Err(UpdateError::ContractionUnsupported);
    }

    let delta = replacement_len - edit.old_len;
    if live_end + delta > capacity {
        return Err(UpdateError::NoMemory);
    }

    let page = PAGE as u32;
    let anchor_page = page_base(edit.edit_start, page);
    device.read(anchor_page, prestore);

    let source = |addr: u32| -> u8 {
        if addr >= anchor_page && addr < anchor_page + page {
            prestore[(addr - anchor_page) as usize]
        } else {
            device.read_byte(addr)
        }
    };

    let new_live_end = live_end + delta;
    if delta == 0 {
        // Nothing moves; only the edited range itself changes, possibly
        // spanning more than one page when the value is large.
        let mut p = anchor_page;
        let last_page = page_base(edit.edit_start + replacement_len.max(1) - 1, page);
        loop {
            fill_page(scratch, p, page, edit.edit_start, delta, &edit, &source);
            erase_and_program(device, p, scratch)?;
            if p >= last_page {
                break;
            }
            p += page;
        }
        return Ok(new_live_end);
    }

    let mut dest_page = page_base(new_live_end.saturating_sub(1), page);
    loop {
        fill_page(scratch, dest_page, page, edit.edit_start, delta, &edit, &source);
        erase_and_program(device, dest_page, scratch)?;
        if dest_page == anchor_page {
            break;
        }
        dest_page -= page;
    }

    Ok(new_live_end)
}

/// Reconstruct the final, post-splice content of one page into `scratch`.
fn fill_page(
    scratch: &mut [u8],
    page_start: u32,
    page_len: u32,
    edit_start: u32,
    delta: u32,
    edit: &SpliceEdit<'_>,
    source: &impl Fn(u32) -> u8,
) {
    let replacement_len = edit.replacement.len() as u32;
    for i in 0..page_len {
        let f = page_start + i;
        scratch[i as usize] = if f < edit_start {
            source(f)
        } else if f < edit_start + replacement_len {
            edit.replacement[(f - edit_start) as usize]
        } else {
            source(f - delta)
        };
    }
}

fn erase_and_program<D: PageDevice>(
    device: &D,
    page_start: u32,
    page: &[u8],
) -> Result<(), UpdateError> {
    unsafe {
        device.erase_page(page_start)?;
        for (i, chunk) in page.chunks(4).enumerate() {
            let addr = page_start + (i as u32) * 4;
            match chunk {
                [a, b, c, d] => {
                    let word = u32::from(*a) | u32::from(*b) << 8 | u32::from(*c) << 16 | u32::from(*d) << 24;
                    device.program_word(addr, word)?;
                }
                [a, b] => {
                    let half = u16::from(*a) | u16::from(*b) << 8;
                    device.program_half_word(addr, half)?;
                }
                _ => unreachable!("page length must be a multiple of 2"),
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::VecDevice;
    use pretty_assertions::assert_eq;

    const PAGE: usize = 64;

    fn device_with(content: &[u8], total: u32) -> VecDevice {
        let mut bytes = content.to_vec();
        bytes.resize(total as usize, 0xFF);
        VecDevice::preloaded(bytes, PAGE as u32)
    }

    fn read_all(device: &VecDevice, len: u32) -> Vec<u8> {
        let mut buf = vec![0u8; len as usize];
        device.read(0, &mut buf);
        buf
    }

    #[test]
    fn in_place_replacement_of_equal_length() {
        let live = b"{\"Age\":28}/";
        let device = device_with(live, 256);
        unsafe {
            device.unlock();
        }
        let mut scratch = [0u8; PAGE];
        let mut prestore = [0u8; PAGE];
        // Replace "28" with "30" at offset 7..=8.
        let new_end = splice(
            &device,
            &mut scratch,
            &mut prestore,
            live.len() as u32,
            255,
            SpliceEdit {
                edit_start: 7,
                old_len: 2,
                replacement: b"30",
            },
        )
        .unwrap();
        assert_eq!(new_end, live.len() as u32);
        assert_eq!(&read_all(&device, new_end)[..], b"{\"Age\":30}/".as_ref());
    }

    #[test]
    fn expanding_replacement_shifts_tail_right() {
        let live = b"{\"Age\":9}/";
        let device = device_with(live, 256);
        unsafe {
            device.unlock();
        }
        let mut scratch = [0u8; PAGE];
        let mut prestore = [0u8; PAGE];
        let new_end = splice(
            &device,
            &mut scratch,
            &mut prestore,
            live.len() as u32,
            255,
            SpliceEdit {
                edit_start: 7,
                old_len: 1,
                replacement: b"4096",
            },
        )
        .unwrap();
        assert_eq!(new_end, live.len() as u32 + 3);
        assert_eq!(
            &read_all(&device, new_end)[..],
            b"{\"Age\":4096}/".as_ref()
        );
    }

    #[test]
    fn object_member_append_inserts_before_closing_brace() {
        let live = b"{\"a\":1}/";
        let device = device_with(live, 256);
        unsafe {
            device.unlock();
        }
        let mut scratch = [0u8; PAGE];
        let mut prestore = [0u8; PAGE];
        // Closing brace is at offset 6; insert ,"b":2 there.
        let new_end = splice(
            &device,
            &mut scratch,
            &mut prestore,
            live.len() as u32,
            255,
            SpliceEdit {
                edit_start: 6,
                old_len: 0,
                replacement: b",\"b\":2",
            },
        )
        .unwrap();
        assert_eq!(
            &read_all(&device, new_end)[..],
            b"{\"a\":1,\"b\":2}/".as_ref()
        );
    }

    #[test]
    fn shift_spans_multiple_pages() {
        // Force the replacement to shift data across a page boundary.
        let mut live = b"{\"a\":1,\"pad\":\"".to_vec();
        live.extend(std::iter::repeat(b'x').take(80));
        live.extend_from_slice(b"\"}/");
        let total = 512;
        let device = device_with(&live, total);
        unsafe {
            device.unlock();
        }
        let mut scratch = [0u8; PAGE];
        let mut prestore = [0u8; PAGE];
        let new_end = splice(
            &device,
            &mut scratch,
            &mut prestore,
            live.len() as u32,
            total - 1,
            SpliceEdit {
                edit_start: 6,
                old_len: 0,
                replacement: b",\"extra\":true",
            },
        )
        .unwrap();
        let out = read_all(&device, new_end);
        assert!(out.starts_with(b"{\"a\":1,\"extra\":true,\"pad\":\""));
        assert!(out.ends_with(b"\"}/"));
    }

    #[test]
    fn contraction_is_rejected() {
        let live = b"{\"Age\":4096}/";
        let device = device_with(live, 256);
        unsafe {
            device.unlock();
        }
        let mut scratch = [0u8; PAGE];
        let mut prestore = [0u8; PAGE];
        let err = splice(
            &device,
            &mut scratch,
            &mut prestore,
            live.len() as u32,
            255,
            SpliceEdit {
                edit_start: 7,
                old_len: 4,
                replacement: b"9",
            },
        )
        .unwrap_err();
        assert_eq!(err, UpdateError::ContractionUnsupported);
    }

    #[test]
    fn no_memory_when_capacity_exhausted() {
        let live = b"{\"a\":1}/";
        let device = device_with(live, 256);
        unsafe {
            device.unlock();
        }
        let mut scratch = [0u8; PAGE];
        let mut prestore = [0u8; PAGE];
        let err = splice(
            &device,
            &mut scratch,
            &mut prestore,
            live.len() as u32,
            live.len() as u32 + 2,
            SpliceEdit {
                edit_start: 6,
                old_len: 0,
                replacement: b",\"bb\":22",
            },
        )
        .unwrap_err();
        assert_eq!(err, UpdateError::NoMemory);
    }
}
