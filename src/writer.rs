//! The append writer (C2): programs the live cursor forward one quad of input
//! bytes at a time, choosing word- or half-word-granularity programming so the
//! trailing NUL padding of a document's final quad never has to be written out
//! explicitly (I4).

use crate::device::PageDevice;
use crate::status::InsertError;

/// Tracks where the next byte will land and programs flash a quad at a time.
pub(crate) struct AppendWriter {
    cursor: u32,
}

impl AppendWriter {
    pub(crate) fn new(cursor: u32) -> AppendWriter {
        AppendWriter { cursor }
    }

    pub(crate) fn cursor(&self) -> u32 {
        self.cursor
    }

    /// Program one quad of input bytes at the cursor. Whenever the third byte is
    /// non-zero there is real data beyond the first half-word, so the whole quad
    /// is programmed as a 32-bit word and the cursor advances by 4; otherwise
    /// only the first two bytes are programmed as a half-word and the cursor
    /// advances by 2, leaving the trailing zero byte(s) — which can only be
    /// padding, never real data, once the third byte is zero — for the region's
    /// natural erased state.
    pub(crate) fn write_quad<D: PageDevice>(
        &mut self,
        device: &D,
        b1: u8,
        b2: u8,
        b3: u8,
        b4: u8,
    ) -> Result<(), InsertError> {
        if b3 != 0 {
            let word = u32::from(b1) | u32::from(b2) << 8 | u32::from(b3) << 16 | u32::from(b4) << 24;
            unsafe {
                device.program_word(self.cursor, word)?;
            }
            self.cursor += 4;
        } else {
            let half = u16::from(b1) | u16::from(b2) << 8;
            unsafe {
                device.program_half_word(self.cursor, half)?;
            }
            self.cursor += 2;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::VecDevice;
    use pretty_assertions::assert_eq;

    #[test]
    fn full_word_written_when_all_four_bytes_nonzero() {
        let device = VecDevice::new(1024, 256);
        unsafe {
            device.unlock();
        }
        let mut writer = AppendWriter::new(0);
        writer.write_quad(&device, b'a', b'b', b'c', b'd').unwrap();
        assert_eq!(writer.cursor(), 4);
        let mut buf = [0u8; 4];
        device.read(0, &mut buf);
        assert_eq!(&buf, b"abcd");
    }

    #[test]
    fn half_word_written_when_trailing_bytes_are_zero() {
        let device = VecDevice::new(1024, 256);
        unsafe {
            device.unlock();
        }
        let mut writer = AppendWriter::new(0);
        writer.write_quad(&device, b'{', b'/', 0, 0).unwrap();
        assert_eq!(writer.cursor(), 2);
        let mut buf = [0u8; 2];
        device.read(0, &mut buf);
        assert_eq!(&buf, b"{/");
    }

    #[test]
    fn full_word_written_when_third_byte_is_nonzero_even_if_fourth_is_zero() {
        // A third byte of real data with a zero fourth byte must still take the
        // word path, or that third byte is silently dropped.
        let device = VecDevice::new(1024, 256);
        unsafe {
            device.unlock();
        }
        let mut writer = AppendWriter::new(0);
        writer.write_quad(&device, b'1', b'}', b'/', 0).unwrap();
        assert_eq!(writer.cursor(), 4);
        let mut buf = [0u8; 3];
        device.read(0, &mut buf);
        assert_eq!(&buf, b"1}/");
    }
}
