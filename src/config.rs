//! Build-time configuration: the size and shape of the flash region backing a
//! [`Store`](crate::Store). Two ways to obtain one, mirroring `eeprom::EEPROM::new`
//! vs. `eeprom::EEPROM::new_default`: explicit construction, or linker symbols
//! baked in by the board's memory layout.

/// The byte written at the last address of a formatted region, marking it as
/// initialized for this store (I1, P1).
pub(crate) const SENTINEL: u8 = 0xDB;

/// Location and shape of the flash region backing a [`Store`](crate::Store).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct StoreConfig {
    /// Total length of the region, in bytes. The last byte is reserved for the
    /// erase-tracking sentinel and is never part of a document.
    pub len: u32,
    /// Page size, in bytes. Must match the const `PAGE` generic parameter used to
    /// instantiate the [`Store`](crate::Store), and must be a power of two.
    pub page_size: u32,
    /// The byte value flash reads back as when erased (almost always `0xFF`).
    pub erased_byte: u8,
}

impl StoreConfig {
    /// Construct a configuration, checking the invariants a page device depends on.
    pub fn new(len: u32, page_size: u32, erased_byte: u8) -> StoreConfig {
        debug_assert!(
            page_size.is_power_of_two(),
            "page size must be a power of two"
        );
        debug_assert!(
            len >= page_size,
            "store region must span at least one page"
        );
        debug_assert_eq!(
            len % page_size,
            0,
            "store region must be a whole number of pages"
        );
        StoreConfig {
            len,
            page_size,
            erased_byte,
        }
    }
}

#[cfg(feature = "default-store")]
extern "C" {
    #[link_name = "_docstore_len"]
    static DOCSTORE_LEN: u32;
    #[link_name = "_docstore_page_size"]
    static DOCSTORE_PAGE_SIZE: u32;
}

/// Read `len` and `page_size` from the linker script's `_docstore_len` /
/// `_docstore_page_size` symbols, the way `eeprom::new_default` reads
/// `_eeprom_start`/`_eeprom_end`. `erased_byte` is fixed at `0xFF`, the value
/// almost every NOR flash part erases to.
///
/// The symbols are never dereferenced: their *addresses*, not their contents,
/// encode the values, per the usual linker-script trick.
#[cfg(feature = "default-store")]
pub fn default_config() -> StoreConfig {
    let len = unsafe { &DOCSTORE_LEN } as *const u32 as u32;
    let page_size = unsafe { &DOCSTORE_PAGE_SIZE } as *const u32 as u32;
    StoreConfig::new(len, page_size, 0xFF)
}
