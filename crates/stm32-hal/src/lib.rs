//! Low-level Flash program/erase access for STM32 devices, shared by higher-level
//! storage crates built on top of `stm32f103`.
#![no_std]
#![warn(missing_docs)]
#![deny(warnings)]

/// Flash memory controller access: page erase, word/half-word programming, raw reads.
///
/// # Examples
///
/// Erasing a flash page and writing some data to it:
///
/// ```rust,no_run
/// extern crate stm32f1;
/// extern crate stm32_hal;
/// use stm32f1::stm32f103::FLASH;
/// use stm32_hal::flash::Flash;
///
/// # pub fn main() {
/// # let flash = unsafe { &*FLASH::ptr() };
/// // Get flash somehow...
/// unsafe {
///     let flash = flash.unlock_guard().unwrap(); // Unlock Flash for writing
///     flash.erase_page(0x800_fc00).unwrap(); // last 1K page on a chip with 64K flash memory
///     flash.program_half_word(0x800_fc00, 0xcafe).unwrap();
///     flash.program_half_word(0x800_fc02, 0xbabe).unwrap();
/// }
/// # }
/// ```
///
pub mod flash;
