//! Splits a byte stream into self-framed blocks (CAT, LEN, payload) and
//! delegates each payload to the record decoder (§4.I).
use crate::catalogue::Catalogue;
use crate::error::DecodeError;
use crate::options::DecodeOptions;
use crate::record_decoder::decode_record;
use crate::tree::{GroupKind, Node, Severity, Value};

const BLOCK_HEADER_LEN: usize = 3;

/// Top-level entry point for §4.I: walks `bytes` block by block, building
/// the root [`Node::Group`] described in spec §6.
pub fn decode_blocks(catalogue: &Catalogue, bytes: &[u8], timestamp: Option<f64>, options: &DecodeOptions) -> Node {
    let mut children = Vec::new();
    let mut offset = 0usize;

    while offset < bytes.len() {
        if bytes.len() - offset < BLOCK_HEADER_LEN {
            let err = DecodeError::MalformedBlock { len: 0, remaining: bytes.len() - offset };
            options.sink.report(err.severity(), &err.to_string());
            children.push(Node::message(err.severity(), offset, bytes.len() - offset, err.to_string()));
            break;
        }

        let cat = bytes[offset];
        let len = u16::from_be_bytes([bytes[offset + 1], bytes[offset + 2]]) as usize;
        let remaining = bytes.len() - offset;
        if len < 4 || len > remaining {
            let err = DecodeError::MalformedBlock { len, remaining };
            options.sink.report(err.severity(), &err.to_string());
            children.push(Node::message(err.severity(), offset, remaining, err.to_string()));
            break;
        }

        let payload = &bytes[offset + BLOCK_HEADER_LEN..offset + len];
        match catalogue.get(cat as u16) {
            None => {
                let err = DecodeError::UnknownCategory(cat);
                options.sink.report(err.severity(), &err.to_string());
                children.push(Node::message(err.severity(), offset, len, err.to_string()));
            }
            Some(category) => {
                children.push(decode_one_block(category, catalogue, cat, payload, offset, timestamp, options));
            }
        }

        offset += len;
    }

    Node::Group {
        label: "asterix".to_string(),
        kind: GroupKind::Root,
        byte_offset: 0,
        byte_length: bytes.len(),
        children,
    }
}

fn decode_one_block(
    category: &crate::category::Category,
    catalogue: &Catalogue,
    cat: u8,
    payload: &[u8],
    block_offset: usize,
    timestamp: Option<f64>,
    options: &DecodeOptions,
) -> Node {
    let mut record_children = Vec::new();
    if let Some(ts) = timestamp {
        record_children.push(Node::Leaf {
            label: "timestamp".to_string(),
            pid: "timestamp".to_string(),
            item_id: String::new(),
            byte_offset: block_offset,
            byte_length: 0,
            value: Value::Raw(ts.to_le_bytes().to_vec()),
            value_label: Some(ts.to_string()),
            severity: Severity::Ok,
        });
    }

    let mut payload_offset = 0usize;
    while payload_offset < payload.len() {
        let result = decode_record(
            category,
            catalogue,
            &payload[payload_offset..],
            block_offset + BLOCK_HEADER_LEN + payload_offset,
            options,
        );
        let ok = result.ok;
        let advanced = result.consumed.max(1);
        record_children.push(result.node);
        payload_offset += advanced;
        if !ok {
            break;
        }
    }

    if payload_offset < payload.len() {
        let n = payload.len() - payload_offset;
        let err = DecodeError::TrailingBytes(n);
        let severity = if options.trailing_bytes_is_error { Severity::Err } else { err.severity() };
        options.sink.report(severity, &err.to_string());
        record_children.push(Node::message(
            severity,
            block_offset + BLOCK_HEADER_LEN + payload_offset,
            n,
            err.to_string(),
        ));
    }

    Node::Group {
        label: format!("CAT{cat:03}"),
        kind: GroupKind::Block { category_id: cat as u16, filterable: category.filter_flag },
        byte_offset: block_offset,
        byte_length: BLOCK_HEADER_LEN + payload.len(),
        children: record_children,
    }
}
