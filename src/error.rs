//! Decoder-originated error taxonomy. See spec §7.
//!
//! Every variant here is captured into the output tree as a `Message`
//! node by the record/block decoders (§7's propagation policy) — callers
//! of [`crate::decode`] never see a `Result`. The `Result`-returning
//! internals exist so call sites inside the crate keep using `?`.
use thiserror::Error;

use crate::cursor::Truncated;
use crate::tree::Severity;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DecodeError {
    #[error("truncated read: wanted {want} bit(s), had {have}")]
    Truncated { want: u64, have: u64 },

    #[error("FSPEC did not terminate within {cap} byte(s)")]
    TruncatedFspec { cap: u8 },

    #[error("block length {len} is invalid (header declares {len}, {remaining} byte(s) remain)")]
    MalformedBlock { len: usize, remaining: usize },

    #[error("category {0} is not present in the catalogue")]
    UnknownCategory(u8),

    #[error("item {0:?} is referenced by the UAP but not defined in this category")]
    UnknownItem(String),

    #[error("no UAP predicate matched for category {0}")]
    NoApplicableUap(u16),

    #[error("explicit-length item declared invalid length {len} ({remaining} byte(s) remain)")]
    InvalidExplicitLength { len: u8, remaining: usize },

    #[error("record left {0} trailing byte(s) unparsed")]
    TrailingBytes(usize),

    #[error("unrecognized BDS register {0:#04x}")]
    UnknownBds(u8),

    #[error("a variable-format extension bit was set but no further part is declared")]
    MissingExtensionFormat,

    #[error("FSPEC bit set for FRN with no UAP entry")]
    UnknownFrn,
}

impl DecodeError {
    /// Severity to attach to the `Message` node this error produces, per §7.
    pub fn severity(&self) -> Severity {
        match self {
            DecodeError::Truncated { .. } => Severity::Err,
            DecodeError::TruncatedFspec { .. } => Severity::Err,
            DecodeError::MalformedBlock { .. } => Severity::Err,
            DecodeError::UnknownCategory(_) => Severity::Warn,
            DecodeError::UnknownItem(_) => Severity::Err,
            DecodeError::NoApplicableUap(_) => Severity::Err,
            DecodeError::InvalidExplicitLength { .. } => Severity::Err,
            DecodeError::TrailingBytes(_) => Severity::Warn,
            DecodeError::UnknownBds(_) => Severity::Warn,
            DecodeError::MissingExtensionFormat => Severity::Err,
            DecodeError::UnknownFrn => Severity::Warn,
        }
    }
}

impl From<Truncated> for DecodeError {
    fn from(err: Truncated) -> Self {
        DecodeError::Truncated { want: err.want, have: err.have }
    }
}

/// Errors raised while building or validating a [`crate::catalogue::Catalogue`],
/// as distinct from errors raised while decoding a buffer against one.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CatalogueError {
    #[error("category {0} already present in catalogue")]
    DuplicateCategory(u16),

    #[error("category {category} id out of range (0..=256)")]
    CategoryIdOutOfRange { category: u32 },

    #[error("UAP in category {category} references undefined item {item:?}")]
    DanglingUapEntry { category: u16, item: String },

    #[error("field {field:?} in item {item:?} has width {width} exceeding 64 bits")]
    FieldWidthTooWide { item: String, field: String, width: u32 },

    #[error("field {field:?} in item {item:?} has non-byte-multiple width {width} for its encoding")]
    FieldWidthNotByteMultiple { item: String, field: String, width: u32 },

    #[error("field {field:?} in item {item:?} lies outside the item's byte extent")]
    FieldOutsideItem { item: String, field: String },

    #[error("UAP entry for item {item:?} in category {category} declares length {declared}, but its Fixed format is {actual} byte(s)")]
    DeclaredLenMismatch { category: u16, item: String, declared: u16, actual: usize },
}
