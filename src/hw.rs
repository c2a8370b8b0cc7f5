//! Binds [`PageDevice`] to real STM32 Flash hardware via `stm32-hal`'s `Flash`
//! trait, the same low-level crate `eeprom` is built on. A document store's
//! region is some sub-window of the chip's Flash, so this wrapper also carries
//! the absolute base address the window starts at; the crate-wide address
//! offsets used everywhere else are relative to that base, never the window's
//! real silicon address.

use crate::device::{DeviceError, DeviceResult, PageDevice};
use stm32_hal::flash::{Flash, FlashError};

/// Adapts any `stm32_hal::flash::Flash` implementation (in practice, the
/// `FLASH` peripheral) into a [`PageDevice`] over a sub-window starting at
/// `base`.
pub struct HardwarePageDevice<F: Flash> {
    flash: F,
    base: usize,
    page_size: u32,
}

impl<F: Flash> HardwarePageDevice<F> {
    /// Wrap `flash`, treating `base` as offset 0 of the document store's window.
    pub fn new(flash: F, base: usize, page_size: u32) -> HardwarePageDevice<F> {
        HardwarePageDevice {
            flash,
            base,
            page_size,
        }
    }

    fn absolute(&self, offset: u32) -> usize {
        self.base + offset as usize
    }
}

impl From<FlashError> for DeviceError {
    fn from(e: FlashError) -> DeviceError {
        match e {
            FlashError::VerifyFailed => DeviceError::VerifyFailed,
            _ => DeviceError::ControllerFailed,
        }
    }
}

impl<F: Flash> PageDevice for HardwarePageDevice<F> {
    fn page_size(&self) -> u32 {
        self.page_size
    }

    fn is_locked(&self) -> bool {
        self.flash.is_locked()
    }

    unsafe fn unlock(&self) {
        self.flash.unlock();
    }

    unsafe fn lock(&self) {
        self.flash.lock();
    }

    unsafe fn erase_page(&self, addr: u32) -> DeviceResult {
        self.flash.erase_page(self.absolute(addr)).map_err(Into::into)
    }

    unsafe fn program_word(&self, addr: u32, data: u32) -> DeviceResult {
        self.flash
            .program_word(self.absolute(addr), data)
            .map_err(Into::into)
    }

    unsafe fn program_half_word(&self, addr: u32, data: u16) -> DeviceResult {
        self.flash
            .program_half_word(self.absolute(addr), data)
            .map_err(Into::into)
    }

    fn read(&self, addr: u32, buf: &mut [u8]) {
        self.flash.read(self.absolute(addr), buf);
    }
}
