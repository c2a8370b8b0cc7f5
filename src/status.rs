//! Per-operation outcome types. The original returns one flat status enum from
//! every entry point; here each public operation gets its own error type so a
//! caller can only match on outcomes that operation can actually produce.

use crate::parser::TokenKind;

/// Failure of [`Store::init`](crate::Store::init).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InitError {
    /// An erase or program readback disagreed while (re-)formatting the region.
    MediumFailure,
    /// The region is already full of documents with no trailing erased byte to
    /// recover a cursor from.
    Full,
}

/// Failure of [`Store::insert`](crate::Store::insert).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InsertError {
    /// An erase or program readback disagreed while appending.
    MediumFailure,
    /// The region has no room left for the new document(s).
    Full,
}

/// Whether [`Store::find`](crate::Store::find) located the requested path.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FindStatus {
    /// The path resolved to a value.
    Found,
    /// The path does not exist in the stored document.
    NotFound,
}

/// Result of a [`Store::find`](crate::Store::find) call.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FindResult {
    /// Whether the path was found.
    pub status: FindStatus,
    /// Kind of the token at `[start, end]`. Meaningless when `status` is `NotFound`.
    pub kind: TokenKind,
    /// Offset of the first byte of the value's payload, from the store's start.
    pub start: u32,
    /// Offset of the last byte of the value's payload (inclusive), from the
    /// store's start.
    pub end: u32,
}

impl FindResult {
    pub(crate) fn not_found(at: u32) -> FindResult {
        FindResult {
            status: FindStatus::NotFound,
            kind: TokenKind::Undefined,
            start: at,
            end: at,
        }
    }

    /// Number of bytes spanned by `[start, end]`.
    pub fn len(&self) -> u32 {
        self.end - self.start + 1
    }
}

/// Failure of [`Store::update`](crate::Store::update).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UpdateError {
    /// An erase or program readback disagreed while splicing in the new value.
    MediumFailure,
    /// The path does not exist in the stored document.
    PathNotFound,
    /// The new value no longer fits in the remaining capacity.
    NoMemory,
    /// The path resolved to an array; arrays are updated wholesale by replacing
    /// one of their elements, not via `update`.
    DataIsArray,
    /// The new value is shorter than the value it replaces. Shrinking a document
    /// in place would require compaction, which this store does not implement
    /// (see the Non-goals).
    ContractionUnsupported,
}

/// Failure of [`Store::append_array`](crate::Store::append_array).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AppendError {
    /// An erase or program readback disagreed while splicing in the new element.
    MediumFailure,
    /// The path does not exist in the stored document.
    PathNotFound,
    /// The path resolved to something other than an array.
    PathNotArray,
    /// The new element no longer fits in the remaining capacity.
    NoMemory,
}

impl From<crate::device::DeviceError> for InitError {
    fn from(_: crate::device::DeviceError) -> InitError {
        InitError::MediumFailure
    }
}

impl From<crate::device::DeviceError> for InsertError {
    fn from(_: crate::device::DeviceError) -> InsertError {
        InsertError::MediumFailure
    }
}

impl From<crate::device::DeviceError> for UpdateError {
    fn from(_: crate::device::DeviceError) -> UpdateError {
        UpdateError::MediumFailure
    }
}

impl From<crate::device::DeviceError> for AppendError {
    fn from(_: crate::device::DeviceError) -> AppendError {
        AppendError::MediumFailure
    }
}
