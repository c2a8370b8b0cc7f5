//! Array append (C8): a thin specialization of the update engine's splice
//! primitive. Appending an element is exactly like adding an object member —
//! new content goes in immediately before the closing bracket, preceded by a
//! comma unless the array was empty.

use crate::device::PageDevice;
use crate::status::AppendError;
use crate::update::{splice, SpliceEdit};

pub(crate) fn append_element<D: PageDevice, const PAGE: usize>(
    device: &D,
    scratch: &mut [u8; PAGE],
    prestore: &mut [u8; PAGE],
    live_end: u32,
    capacity: u32,
    array_start: u32,
    array_end: u32,
    element: &[u8],
) -> Result<u32, AppendError> {
    let empty = array_end - array_start == 1;
    let mut replacement = [0u8; 130];
    let mut len = 0usize;
    if !empty {
        replacement[0] = b',';
        len += 1;
    }
    if len + element.len() > replacement.len() {
        // Elements longer than fit in the stack buffer stream straight from the
        // caller's slice instead of being copied first.
        return append_long_element(
            device, scratch, prestore, live_end, capacity, array_end, empty, element,
        );
    }
    replacement[len..len + element.len()].copy_from_slice(element);
    len += element.len();

    splice(
        device,
        scratch,
        prestore,
        live_end,
        capacity,
        SpliceEdit {
            edit_start: array_end,
            old_len: 0,
            replacement: &replacement[..len],
        },
    )
    .map_err(|e| match e {
        crate::status::UpdateError::NoMemory => AppendError::NoMemory,
        crate::status::UpdateError::MediumFailure => AppendError::MediumFailure,
        _ => AppendError::MediumFailure,
    })
}

fn append_long_element<D: PageDevice, const PAGE: usize>(
    device: &D,
    scratch: &mut [u8; PAGE],
    prestore: &mut [u8; PAGE],
    live_end: u32,
    capacity: u32,
    array_end: u32,
    empty: bool,
    element: &[u8],
) -> Result<u32, AppendError> {
    let comma_end = if empty {
        array_end
    } else {
        splice(
            device,
            scratch,
            prestore,
            live_end,
            capacity,
            SpliceEdit {
                edit_start: array_end,
                old_len: 0,
                replacement: b",",
            },
        )
        .map_err(|_| AppendError::MediumFailure)?;
        array_end + 1
    };
    let new_live_end = if empty { live_end } else { live_end + 1 };
    splice(
        device,
        scratch,
        prestore,
        new_live_end,
        capacity,
        SpliceEdit {
            edit_start: comma_end,
            old_len: 0,
            replacement: element,
        },
    )
    .map_err(|e| match e {
        crate::status::UpdateError::NoMemory => AppendError::NoMemory,
        _ => AppendError::MediumFailure,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::VecDevice;
    use pretty_assertions::assert_eq;

    const PAGE: usize = 64;

    #[test]
    fn appends_to_nonempty_array() {
        let live = b"{\"list\":[1,2]}/";
        let mut bytes = live.to_vec();
        bytes.resize(256, 0xFF);
        let device = VecDevice::preloaded(bytes, PAGE as u32);
        unsafe {
            device.unlock();
        }
        let mut scratch = [0u8; PAGE];
        let mut prestore = [0u8; PAGE];
        // "[1,2]" spans offsets 9..=13 (array_end is the ']').
        let new_end = append_element(
            &device,
            &mut scratch,
            &mut prestore,
            live.len() as u32,
            255,
            9,
            13,
            b"3",
        )
        .unwrap();
        let mut out = vec![0u8; new_end as usize];
        device.read(0, &mut out);
        assert_eq!(&out[..], b"{\"list\":[1,2,3]}/".as_ref());
    }

    #[test]
    fn appends_to_empty_array_without_comma() {
        let live = b"{\"list\":[]}/";
        let mut bytes = live.to_vec();
        bytes.resize(256, 0xFF);
        let device = VecDevice::preloaded(bytes, PAGE as u32);
        unsafe {
            device.unlock();
        }
        let mut scratch = [0u8; PAGE];
        let mut prestore = [0u8; PAGE];
        // "[]" spans offsets 9..=10.
        let new_end = append_element(
            &device,
            &mut scratch,
            &mut prestore,
            live.len() as u32,
            255,
            9,
            10,
            b"1",
        )
        .unwrap();
        let mut out = vec![0u8; new_end as usize];
        device.read(0, &mut out);
        assert_eq!(&out[..], b"{\"list\":[1]}/".as_ref());
    }
}
