//! The public face of the crate: a [`Store`] ties the page device, its
//! configuration, and the two RAM buffers the update engine needs together,
//! and exposes the five operations a caller actually needs — init, insert,
//! find, update, append_array.

use crate::array;
use crate::config::{StoreConfig, SENTINEL};
use crate::device::PageDevice;
use crate::insert;
use crate::parser::TokenKind;
use crate::path;
use crate::status::{AppendError, FindResult, FindStatus, InitError, InsertError, UpdateError};
use crate::update::{self, SpliceEdit};
use crate::writer::AppendWriter;

/// A flash-resident document store over a page device `D`, with a static
/// `PAGE`-byte scratch buffer sized to the device's erase granularity.
///
/// `PAGE` must equal `config.page_size` passed to [`Store::new`]; a mismatch is
/// caught by a debug assertion the first time it would matter.
pub struct Store<D: PageDevice, const PAGE: usize> {
    device: D,
    config: StoreConfig,
    cursor: u32,
    scratch: [u8; PAGE],
    prestore: [u8; PAGE],
}

impl<D: PageDevice, const PAGE: usize> Store<D, PAGE> {
    /// Construct a store over `device` with the given `config`. Call
    /// [`Store::init`] before the first `insert`/`find`/`update` to recover or
    /// format the cursor.
    pub fn new(device: D, config: StoreConfig) -> Store<D, PAGE> {
        debug_assert_eq!(
            config.page_size, PAGE as u32,
            "StoreConfig::page_size must match the Store's const PAGE parameter"
        );
        Store {
            device,
            config,
            cursor: 0,
            scratch: [0u8; PAGE],
            prestore: [0u8; PAGE],
        }
    }

    /// Construct a store reading its region's size and page size from the
    /// linker-provided `_docstore_len`/`_docstore_page_size` symbols.
    #[cfg(feature = "default-store")]
    pub fn new_default(device: D) -> Store<D, PAGE> {
        Store::new(device, crate::config::default_config())
    }

    /// Recover the append cursor from an already-formatted region, or format a
    /// fresh one. Must be called once before any other operation.
    ///
    /// Reads the sentinel byte at the region's last address. If it reads
    /// `0xDB`, the region was formatted before: scan forward for the first
    /// erased byte and recover the cursor there. Otherwise erase every page in
    /// the region and program the sentinel, so P1 ("byte `END-1` == `0xDB`
    /// after any public call") holds from the very first call onward.
    pub fn init(&mut self) -> Result<(), InitError> {
        let sentinel_at = self.config.len - 1;
        let limit = sentinel_at; // last byte is the sentinel, never live

        if self.device.read_byte(sentinel_at) == SENTINEL {
            let mut i = 0u32;
            while i < limit && self.device.read_byte(i) != self.config.erased_byte {
                i += 1;
            }
            if i >= limit {
                return Err(InitError::Full);
            }
            self.cursor = i;
            return Ok(());
        }

        let guard = unsafe { self.device.unlock_guard() };
        let mut addr = 0u32;
        while addr < self.config.len {
            unsafe {
                guard.erase_page(addr)?;
            }
            addr += self.config.page_size;
        }
        let sentinel_half_word =
            u16::from(self.config.erased_byte) | u16::from(SENTINEL) << 8;
        unsafe {
            guard.program_half_word(sentinel_at - 1, sentinel_half_word)?;
        }

        // Confirm the erase took, tolerating up to two stray non-erased bytes
        // left over from programming the sentinel itself.
        let mut non_erased = 0u32;
        for addr in 0..limit {
            if self.device.read_byte(addr) != self.config.erased_byte {
                non_erased += 1;
            }
        }
        if non_erased > 2 {
            return Err(InitError::MediumFailure);
        }

        self.cursor = 0;
        Ok(())
    }

    /// Append one or more `/`-terminated JSON documents (single-quoted for
    /// convenience) to the store.
    pub fn insert(&mut self, buf: &mut [u8], n: usize) -> Result<(), InsertError> {
        if self.cursor >= self.config.len - 1 {
            return Err(InsertError::Full);
        }
        let guard = unsafe { self.device.unlock_guard() };
        let mut writer = AppendWriter::new(self.cursor);
        let result = insert::insert(&mut writer, &*guard, buf, n);
        self.cursor = writer.cursor();
        drop(guard);
        result
    }

    /// Resolve a dotted path (e.g. `u.Jack.Age./`) against the most recently
    /// inserted document.
    pub fn find(&self, query: &[u8]) -> FindResult {
        if self.cursor == 0 {
            return FindResult::not_found(0);
        }
        path::resolve(&self.device, self.config.len, query)
    }

    /// Replace the value at `path` with `value` (single-quoted JSON). Fails with
    /// [`UpdateError::ContractionUnsupported`] if `value` is shorter than the
    /// value it replaces.
    pub fn update(&mut self, path: &[u8], value: &mut [u8]) -> Result<(), UpdateError> {
        insert::rewrite_quotes(value);
        let found = self.find(path);
        if found.status != FindStatus::Found {
            return Err(UpdateError::PathNotFound);
        }

        let guard = unsafe { self.device.unlock_guard() };
        let capacity = self.config.len - 1;
        let value_text = &value[..insert::value_len(value)];

        let edit = match found.kind {
            TokenKind::Object => {
                let empty = found.end - found.start == 1;
                let comma_end = if empty {
                    found.end
                } else {
                    match update::splice(
                        &*guard,
                        &mut self.scratch,
                        &mut self.prestore,
                        self.cursor,
                        capacity,
                        SpliceEdit {
                            edit_start: found.end,
                            old_len: 0,
                            replacement: b",",
                        },
                    ) {
                        Ok(new_end) => {
                            self.cursor = new_end;
                            found.end + 1
                        }
                        Err(e) => return Err(e),
                    }
                };
                update::splice(
                    &*guard,
                    &mut self.scratch,
                    &mut self.prestore,
                    self.cursor,
                    capacity,
                    SpliceEdit {
                        edit_start: comma_end,
                        old_len: 0,
                        replacement: value_text,
                    },
                )
            }
            TokenKind::Array => Err(UpdateError::DataIsArray),
            _ => update::splice(
                &*guard,
                &mut self.scratch,
                &mut self.prestore,
                self.cursor,
                capacity,
                SpliceEdit {
                    edit_start: found.start,
                    old_len: found.len(),
                    replacement: value_text,
                },
            ),
        };

        match edit {
            Ok(new_end) => {
                self.cursor = new_end;
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Append `element` (single-quoted JSON) to the array at `path`.
    pub fn append_array(&mut self, path: &[u8], element: &mut [u8]) -> Result<(), AppendError> {
        insert::rewrite_quotes(element);
        let found = self.find(path);
        if found.status != FindStatus::Found {
            return Err(AppendError::PathNotFound);
        }
        if found.kind != TokenKind::Array {
            return Err(AppendError::PathNotArray);
        }

        let guard = unsafe { self.device.unlock_guard() };
        let capacity = self.config.len - 1;
        let element_text = &element[..insert::value_len(element)];
        let new_end = array::append_element(
            &*guard,
            &mut self.scratch,
            &mut self.prestore,
            self.cursor,
            capacity,
            found.start,
            found.end,
            element_text,
        )?;
        self.cursor = new_end;
        Ok(())
    }
}
