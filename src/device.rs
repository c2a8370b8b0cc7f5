//! The page device contract (C1 of the design): word/half-word Flash programming,
//! single-page erase, and raw reads over a fixed-size window. A page device knows
//! nothing about what is stored in the window — that is the whole point of the
//! split, mirroring how `eeprom` is built on top of `stm32-hal`'s `Flash` trait
//! rather than touching Flash registers itself.

use core::ops::Deref;

/// Outcome of a single Flash program or erase attempt.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DeviceError {
    /// The program completed, but reading the cell back did not return what was
    /// written. Per I3, the engine does not retry indefinitely (see `WriteToFLASH`
    /// in the design notes) — a single mismatch is reported up to the caller.
    VerifyFailed,
    /// The underlying controller reported a failure (busy, locked, write-protected).
    ControllerFailed,
}

/// Result of a single Flash operation.
pub type DeviceResult = Result<(), DeviceError>;

/// A contiguous, page-erasable, word-programmable region of Flash, addressed by
/// byte offsets from the start of the region (never raw pointers — see the
/// "pointer arithmetic over flash addresses" design note).
///
/// Implementations are responsible for satisfying I3: a successful
/// `program_word`/`program_half_word` has already been read back and verified
/// before returning `Ok`.
pub trait PageDevice {
    /// Size of a single erase unit, in bytes. Always a power of two.
    fn page_size(&self) -> u32;

    /// Whether the Flash program/erase controller is currently locked.
    fn is_locked(&self) -> bool;

    /// Unlock the Flash program/erase controller.
    ///
    /// # Safety
    /// Must not be called while a [`DeviceGuard`] for this device is already live.
    unsafe fn unlock(&self);

    /// Lock the Flash program/erase controller.
    ///
    /// # Safety
    unsafe fn lock(&self);

    /// Unlock the controller for the scope of the returned guard; it is re-locked
    /// on drop, restoring the lock on every exit path including early returns.
    ///
    /// # Safety
    /// Same caveat as [`PageDevice::unlock`].
    unsafe fn unlock_guard(&self) -> DeviceGuard<'_, Self>
    where
        Self: Sized,
    {
        let was_locked = self.is_locked();
        if was_locked {
            self.unlock();
        }
        DeviceGuard {
            device: self,
            should_lock: was_locked,
        }
    }

    /// Erase the page starting at `addr`. `addr` must be page-aligned.
    ///
    /// # Safety
    unsafe fn erase_page(&self, addr: u32) -> DeviceResult;

    /// Program one 32-bit word at `addr`. `addr` must be 4-byte aligned and the
    /// target cell must have been erased (or hold a value this write only narrows).
    ///
    /// # Safety
    unsafe fn program_word(&self, addr: u32, data: u32) -> DeviceResult;

    /// Program one 16-bit half-word at `addr`. `addr` must be 2-byte aligned.
    ///
    /// # Safety
    unsafe fn program_half_word(&self, addr: u32, data: u16) -> DeviceResult;

    /// Copy `buf.len()` raw bytes starting at `addr` into `buf`. Reading flash has
    /// no program/erase side effects and never fails.
    fn read(&self, addr: u32, buf: &mut [u8]);

    /// Read a single byte at `addr`.
    fn read_byte(&self, addr: u32) -> u8 {
        let mut b = [0u8; 1];
        self.read(addr, &mut b);
        b[0]
    }
}

/// RAII scoped unlock: the device is locked again when this guard drops, on every
/// exit path including early returns from a failed operation.
pub struct DeviceGuard<'a, D: PageDevice> {
    device: &'a D,
    should_lock: bool,
}

impl<'a, D: PageDevice> Drop for DeviceGuard<'a, D> {
    fn drop(&mut self) {
        if self.should_lock {
            unsafe {
                self.device.lock();
            }
        }
    }
}

impl<'a, D: PageDevice> Deref for DeviceGuard<'a, D> {
    type Target = D;

    fn deref(&self) -> &D {
        self.device
    }
}
