//! Static, immutable-after-load metadata for one named field (§3, §4.C).
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::CatalogueError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Encoding {
    Unsigned,
    SignedTwosComplement,
    Ascii,
    OctalDigitCoded,
    HexBytes,
    SpeciallyFormattedTime,
}

impl Encoding {
    fn is_integer(self) -> bool {
        matches!(self, Encoding::Unsigned | Encoding::SignedTwosComplement | Encoding::SpeciallyFormattedTime)
    }

    fn requires_byte_multiple(self) -> bool {
        matches!(self, Encoding::Ascii | Encoding::HexBytes)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub short_name: String,
    pub long_name: String,
    /// Inclusive, MSB-first bit numbering within the item: `bit_from >= bit_to`.
    pub bit_from: u8,
    pub bit_to: u8,
    pub encoding: Encoding,
    /// Rational multiplier, e.g. `1.0 / 128.0` for 1/128 NM.
    pub scale: f64,
    pub unit: Option<String>,
    pub enum_map: Option<BTreeMap<u64, String>>,
    /// The string used when matching against a [`crate::filter::Filter`].
    pub filter_tag: String,
}

impl FieldDescriptor {
    pub fn width(&self) -> u32 {
        (self.bit_from - self.bit_to) as u32 + 1
    }

    /// Validates the invariants from §3: width bounds and byte extent,
    /// given the owning item's total length in bytes.
    pub fn validate(&self, item_id: &str, item_len_bytes: usize) -> Result<(), CatalogueError> {
        let width = self.width();
        if self.encoding.is_integer() && width > 64 {
            return Err(CatalogueError::FieldWidthTooWide {
                item: item_id.to_string(),
                field: self.short_name.clone(),
                width,
            });
        }
        if self.encoding.requires_byte_multiple() && width % 8 != 0 {
            return Err(CatalogueError::FieldWidthNotByteMultiple {
                item: item_id.to_string(),
                field: self.short_name.clone(),
                width,
            });
        }
        let item_bits = item_len_bytes as u32 * 8;
        if self.bit_from as u32 >= item_bits {
            return Err(CatalogueError::FieldOutsideItem {
                item: item_id.to_string(),
                field: self.short_name.clone(),
            });
        }
        Ok(())
    }

    /// Bit offset of this field's most-significant bit, counted from the
    /// start of the item (0 = MSB of the item's first byte).
    pub fn start_bit_from_item_start(&self, item_len_bytes: usize) -> u32 {
        let item_bits = item_len_bytes as u32 * 8;
        item_bits - 1 - self.bit_from as u32
    }
}
