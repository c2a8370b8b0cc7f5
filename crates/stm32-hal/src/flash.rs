use core;
use core::result::Result;

#[cfg(feature = "stm32f103")]
use stm32f1::stm32f103::FLASH;

/// Low-level access to a single contiguous region of program Flash: page erase,
/// word/half-word programming, and raw reads. This is the "page device" contract a
/// document store builds on — it knows nothing about what is stored in the region.
pub trait Flash
where
    Self: Sized,
{
    /// Check if Flash program and erase controller is locked
    fn is_locked(&self) -> bool;

    /// Check Flash status
    fn status(&self) -> FlashResult;

    /// Unlocks the Flash program and erase controller (FPEC).
    ///
    /// # Panics
    /// Panics if unlock sequence did not unlock the flash
    ///
    /// # Safety
    ///
    unsafe fn unlock(&self);

    /// Lock the Flash program and erase controller (FPEC).
    ///
    /// # Safety
    ///
    unsafe fn lock(&self);

    /// Unlocks the Flash program and erase controller (FPEC).
    /// An RAII guard is returned to allow scoped unlock of the Flash. When the guard goes out of scope,
    /// the Flash will be unlocked.
    ///
    /// # Note
    /// If flash is unlocked already, unlock sequence is skipped and it Flash is not locked when guard drops.
    ///
    /// # Safety
    ///
    unsafe fn unlock_guard(&self) -> UnlockResult<Self> {
        let locked = self.is_locked();
        if locked {
            self.unlock();
        }
        Ok(UnlockGuard {
            flash: self,
            should_lock: locked,
        })
    }

    /// Erase specified flash page. `address` must be an address of a beginning of the page in
    /// Flash memory.
    ///
    /// # Safety
    ///
    unsafe fn erase_page(&self, address: usize) -> FlashResult;

    /// Program half-word (16-bit) value at a specified address. `address` must be an address of
    /// a location in the Flash memory aligned to two bytes.
    ///
    /// # Safety
    ///
    unsafe fn program_half_word(&self, address: usize, data: u16) -> FlashResult;

    /// Program a full word (32-bit) value at `address`, which must be 4-byte aligned.
    ///
    /// # Safety
    ///
    unsafe fn program_word(&self, address: usize, data: u32) -> FlashResult;

    /// Read `buf.len()` raw bytes starting at `address`. Flash is memory-mapped, so this is a
    /// plain copy with no program/erase side effects.
    fn read(&self, address: usize, buf: &mut [u8]);
}

/// Flash operation error
#[derive(Copy, Clone, Debug)]
pub enum FlashError {
    /// Flash program and erase controller failed to unlock
    UnlockFailed,
    /// Timeout while waiting for the completion of the operation
    Timeout,
    /// Address to be programmed contains a value different from '0xFFFF' before programming
    ProgrammingError,
    /// Programming a write-protected address of the Flash memory
    WriteProtectionError,
    /// Programming and erase controller is busy
    Busy,
    /// Read-back after a program did not match what was written
    VerifyFailed,
}

/// A type alias for the result of a Flash operation.
pub type FlashResult = Result<(), FlashError>;

/// A type alias for the result of a Flash unlock method.
pub type UnlockResult<'a, FlashT> = Result<UnlockGuard<'a, FlashT>, FlashError>;

/// An RAII implementation of a "scoped unlock" of a Flash. When this structure is dropped (falls
/// out of scope), the Flash will be locked.
pub struct UnlockGuard<'a, FlashT: Flash>
where
    FlashT: 'a,
{
    flash: &'a FlashT,
    should_lock: bool,
}

impl<'a, FlashT: Flash> Drop for UnlockGuard<'a, FlashT> {
    fn drop(&mut self) {
        if self.should_lock {
            unsafe {
                self.flash.lock();
            }
        }
    }
}

impl<'a, FlashT: Flash> core::ops::Deref for UnlockGuard<'a, FlashT> {
    type Target = FlashT;

    fn deref(&self) -> &FlashT {
        self.flash
    }
}

#[cfg(feature = "stm32f103")]
const FLASH_KEY1: u32 = 0x4567_0123;

#[cfg(feature = "stm32f103")]
const FLASH_KEY2: u32 = 0xCDEF_89AB;

#[cfg(feature = "stm32f103")]
const ERASE_TIMEOUT: u32 = 0x000B_0000;

#[cfg(feature = "stm32f103")]
const PROGRAM_TIMEOUT: u32 = 0x0000_2000;

#[cfg(feature = "stm32f103")]
impl Flash for FLASH {
    fn is_locked(&self) -> bool {
        self.cr.read().lock().bit_is_set()
    }

    fn status(&self) -> FlashResult {
        let sr = self.sr.read();
        if sr.bsy().bit_is_set() {
            Err(FlashError::Busy)
        } else if sr.pgerr().bit_is_set() {
            Err(FlashError::ProgrammingError)
        } else if sr.wrprterr().bit_is_set() {
            Err(FlashError::WriteProtectionError)
        } else {
            Ok(())
        }
    }

    unsafe fn erase_page(&self, address: usize) -> FlashResult {
        self.status()?;

        self.cr.modify(|_, w| w.per().set_bit());
        self.ar.write(|w| w.bits(address as u32));
        self.cr.modify(|_, w| w.strt().set_bit()); // Erase page
        let res = wait_complete(self, ERASE_TIMEOUT);
        self.cr.modify(|_, w| w.per().clear_bit());
        res
    }

    unsafe fn program_half_word(&self, address: usize, data: u16) -> FlashResult {
        self.status()?;

        self.cr.modify(|_, w| w.pg().set_bit());
        core::ptr::write_volatile(address as *mut u16, data); // Program the half-word
        let res = wait_complete(self, PROGRAM_TIMEOUT);
        self.cr.modify(|_, w| w.pg().clear_bit());
        if res.is_ok() && core::ptr::read_volatile(address as *const u16) != data {
            return Err(FlashError::VerifyFailed);
        }
        res
    }

    unsafe fn program_word(&self, address: usize, data: u32) -> FlashResult {
        self.program_half_word(address, (data & 0xffff) as u16)?;
        self.program_half_word(address + 2, (data >> 16) as u16)
    }

    fn read(&self, address: usize, buf: &mut [u8]) {
        unsafe {
            core::ptr::copy_nonoverlapping(address as *const u8, buf.as_mut_ptr(), buf.len());
        }
    }

    /// Unlocks the Flash program and erase controller (FPEC)
    unsafe fn unlock(&self) {
        self.keyr.write(|w| w.key().bits(FLASH_KEY1));
        self.keyr.write(|w| w.key().bits(FLASH_KEY2));
        if self.is_locked() {
            panic!("Flash should be unlocked at this point");
        }
    }

    /// Locks the Flash program and erase controller (FPEC)
    unsafe fn lock(&self) {
        self.cr.modify(|_, w| w.lock().set_bit());
    }
}

#[cfg(feature = "stm32f103")]
/// Wait till last Flash operation is complete and return Flash status.
fn wait_complete(flash: &FLASH, mut timeout: u32) -> FlashResult {
    while flash.sr.read().bsy().bit_is_set() && timeout > 0 {
        timeout -= 1
    }
    if timeout == 0 {
        return Err(FlashError::Timeout);
    }
    flash.status()
}
