//! A flash-resident, allocation-free store for a single JSON-like document,
//! aimed at microcontrollers with nothing but a Flash region and a page-sized
//! chunk of RAM to spare.
//!
//! Documents are appended to the region as raw text, terminated by `/`; the
//! store never builds a tree, it drives a streaming parser over flash directly.
//! Reads resolve dotted paths like `u.Jack.Age./` in place. Writes that fit
//! within the old value's size are rewritten in place; writes that grow a value
//! shift the rest of the live document rightward one page at a time, using at
//! most two page-sized RAM buffers no matter how large the document gets.
#![no_std]
#![warn(missing_docs)]
#![deny(warnings)]

#[cfg(test)]
extern crate std;

mod addr;
mod array;
mod config;
mod device;
mod insert;
mod parser;
mod path;
mod status;
mod store;
mod update;
mod writer;

#[cfg(test)]
mod test_support;

#[cfg(feature = "stm32f103")]
mod hw;

pub use config::StoreConfig;
#[cfg(feature = "default-store")]
pub use config::default_config;
pub use device::{DeviceError, DeviceGuard, DeviceResult, PageDevice};
pub use parser::TokenKind;
pub use status::{AppendError, FindResult, FindStatus, InitError, InsertError, UpdateError};
pub use store::Store;

#[cfg(feature = "stm32f103")]
pub use hw::HardwarePageDevice;
