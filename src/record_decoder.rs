//! Parses one record (FSPEC + FRN-ordered items) out of a block's payload
//! (§4.H). Called repeatedly by [`crate::block_decoder`] until a block's
//! payload is consumed or a record fails.
use std::collections::BTreeSet;

use crate::category::Category;
use crate::catalogue::Catalogue;
use crate::error::DecodeError;
use crate::format::FormatContext;
use crate::options::DecodeOptions;
use crate::tree::{GroupKind, Node};

pub struct RecordResult {
    pub node: Node,
    pub consumed: usize,
    /// `false` means the record hit an unrecoverable error (§4.H's
    /// `Failed` state) and the caller should stop walking this block.
    pub ok: bool,
}

/// Reads the FX-chained FSPEC at the start of `buf`, capped at
/// `options.fspec_byte_cap` bytes (§4.H point 1, §8's FSPEC upper bound).
fn read_fspec<'a>(buf: &'a [u8], cap: u8) -> Result<&'a [u8], DecodeError> {
    let mut len = 0usize;
    loop {
        if len >= buf.len() {
            return Err(DecodeError::TruncatedFspec { cap });
        }
        let b = buf[len];
        len += 1;
        if b & 1 == 0 {
            break;
        }
        if len >= cap as usize {
            return Err(DecodeError::TruncatedFspec { cap });
        }
    }
    Ok(&buf[..len])
}

pub fn decode_record(
    category: &Category,
    catalogue: &Catalogue,
    buf: &[u8],
    base_offset: usize,
    options: &DecodeOptions,
) -> RecordResult {
    let fspec = match read_fspec(buf, options.fspec_byte_cap) {
        Ok(fspec) => fspec,
        Err(err) => {
            options.sink.report(err.severity(), &err.to_string());
            return RecordResult {
                node: Node::message(err.severity(), base_offset, buf.len(), err.to_string()),
                consumed: buf.len(),
                ok: false,
            };
        }
    };
    let fspec_len = fspec.len();

    let uap = match category.resolve_uap(fspec) {
        Ok(uap) => uap,
        Err(err) => {
            options.sink.report(err.severity(), &err.to_string());
            return RecordResult {
                node: Node::message(err.severity(), base_offset, fspec_len, err.to_string()),
                consumed: fspec_len,
                ok: false,
            };
        }
    };

    let ctx = FormatContext { catalogue, category_id: category.id, sink: options.sink };
    let mut children = Vec::new();
    let mut consumed = fspec_len;
    let mut covered: BTreeSet<(usize, u8)> = BTreeSet::new();

    for entry in uap.data_entries() {
        covered.insert((entry.byte_nr, entry.bit_nr));
        let present = fspec.get(entry.byte_nr).map(|b| (b >> entry.bit_nr) & 1 == 1).unwrap_or(false);
        if !present {
            continue;
        }
        let item_id = entry.item_id.as_deref().unwrap_or_default();
        let Some(item) = category.items.get(item_id) else {
            let err = DecodeError::UnknownItem(item_id.to_string());
            options.sink.report(err.severity(), &err.to_string());
            children.push(Node::message(err.severity(), base_offset + consumed, 0, err.to_string()));
            return RecordResult {
                node: record_group(base_offset, consumed, children),
                consumed,
                ok: false,
            };
        };
        let remaining = &buf[consumed..];
        match item.format.parse(remaining, base_offset + consumed, item_id, item_id, &ctx) {
            Ok((n, node)) => {
                children.push(node);
                consumed += n;
            }
            Err(DecodeError::InvalidExplicitLength { len, remaining }) => {
                // §7: abort this item, continue the record if possible.
                let err = DecodeError::InvalidExplicitLength { len, remaining };
                options.sink.report(err.severity(), &err.to_string());
                children.push(Node::message(err.severity(), base_offset + consumed, remaining, err.to_string()));
            }
            Err(err) => {
                options.sink.report(err.severity(), &err.to_string());
                children.push(Node::message(err.severity(), base_offset + consumed, buf.len() - consumed, err.to_string()));
                return RecordResult {
                    node: record_group(base_offset, consumed, children),
                    consumed,
                    ok: false,
                };
            }
        }
    }

    // Unknown FRN: an FSPEC bit set for a position no UAP entry covers.
    for (byte_nr, byte) in fspec.iter().enumerate() {
        for bit_nr in (1..=7u8).rev() {
            if (byte >> bit_nr) & 1 == 1 && !covered.contains(&(byte_nr, bit_nr)) {
                let err = DecodeError::UnknownFrn;
                options.sink.report(err.severity(), &err.to_string());
                children.push(Node::message(err.severity(), base_offset, fspec_len, err.to_string()));
            }
        }
    }

    RecordResult { node: record_group(base_offset, consumed, children), consumed, ok: true }
}

fn record_group(base_offset: usize, byte_length: usize, children: Vec<Node>) -> Node {
    Node::Group {
        label: "record".to_string(),
        kind: GroupKind::Record,
        byte_offset: base_offset,
        byte_length,
        children,
    }
}
