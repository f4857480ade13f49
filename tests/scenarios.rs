//! End-to-end decode scenarios against the public `decode` entry point,
//! mirroring spec.md §8's boundary behaviours and the teacher's
//! one-file-per-concern `tests/*.rs` layout.
use asterix_core::{
    decode, decode_with_options, Catalogue, Category, DecodeOptions, Encoding, FieldDescriptor, FixedPart,
    FormatStrategy, GroupKind, ItemDescription, Node, Severity, Uap, UapEntry,
};

fn byte_field(name: &str) -> FieldDescriptor {
    FieldDescriptor {
        short_name: name.to_string(),
        long_name: name.to_string(),
        bit_from: 7,
        bit_to: 0,
        encoding: Encoding::Unsigned,
        scale: 1.0,
        unit: None,
        enum_map: None,
        filter_tag: name.to_string(),
    }
}

fn cat048_with_repetitive() -> Catalogue {
    let item010 = ItemDescription::new("010", FormatStrategy::Fixed(FixedPart::new(2, vec![byte_field("SAC"), byte_field("SIC")])));
    let element = FixedPart::new(1, vec![byte_field("TRACK")]);
    let item161 = ItemDescription::new("161", FormatStrategy::Repetitive { rep_len: 1, element });
    let uap = Uap::new(vec![UapEntry::for_frn(1, "010"), UapEntry::for_frn(2, "161")]);
    let category = Category::new(48, "CAT048", "1.0", vec![uap]).with_item(item010).with_item(item161);
    let mut catalogue = Catalogue::new();
    catalogue.insert(category).unwrap();
    catalogue
}

fn sum_lengths(node: &Node) -> usize {
    match node {
        Node::Group { children, .. } => children.iter().map(Node::byte_length).sum(),
        _ => 0,
    }
}

/// Block with `L = 3` (header only, no payload) is malformed: there isn't
/// even an FSPEC byte to read.
#[test]
fn block_with_header_only_length_is_malformed() {
    let catalogue = cat048_with_repetitive();
    let buf = [0x30, 0x00, 0x03];
    let tree = decode(&catalogue, &buf, None);
    match tree {
        Node::Group { children, .. } => {
            assert_eq!(children.len(), 1);
            assert!(matches!(children[0], Node::Message { severity: Severity::Err, .. }));
        }
        other => panic!("expected root group, got {other:?}"),
    }
}

/// A record whose repetitive item has a nonzero count decodes each element
/// in order and the record's declared byte length accounts for all of them.
#[test]
fn repetitive_item_with_nonzero_count_decodes_every_element() {
    let catalogue = cat048_with_repetitive();
    // FSPEC 0xC0 = FRN1 (010) + FRN2 (161) set, FX clear.
    // 010: SAC=1, SIC=2. 161: count=2, elements [0x05, 0x06].
    let buf = [0x30, 0x00, 0x09, 0xC0, 0x01, 0x02, 0x02, 0x05, 0x06];
    let tree = decode(&catalogue, &buf, None);
    let block = match &tree {
        Node::Group { children, .. } => &children[0],
        other => panic!("expected root group, got {other:?}"),
    };
    let record = match block {
        Node::Group { children, .. } => &children[0],
        other => panic!("expected block group, got {other:?}"),
    };
    match record {
        Node::Group { children, byte_length, .. } => {
            assert_eq!(children.len(), 2);
            // FSPEC(1) + item010(2) + item161(1 count + 2 elements) = 6.
            assert_eq!(*byte_length, 6);
            match &children[1] {
                Node::Group { kind: GroupKind::Item { item_id, .. }, children, label, .. } => {
                    assert_eq!(item_id, "161");
                    assert!(label.contains("x2"));
                    assert_eq!(children.len(), 2);
                }
                other => panic!("expected item group, got {other:?}"),
            }
        }
        other => panic!("expected record group, got {other:?}"),
    }
}

/// Round-trip-ish law (§8): the sum of a block's child Group byte-lengths
/// equals the block's payload length, and the record's own length equals
/// FSPEC + its children's lengths.
#[test]
fn record_and_block_lengths_account_for_every_byte() {
    let catalogue = cat048_with_repetitive();
    let buf = [0x30, 0x00, 0x09, 0xC0, 0x01, 0x02, 0x02, 0x05, 0x06];
    let tree = decode(&catalogue, &buf, None);
    let block = match &tree {
        Node::Group { children, .. } => &children[0],
        _ => unreachable!(),
    };
    let (block_byte_length, records_sum) = match block {
        Node::Group { byte_length, children, .. } => (*byte_length, children.iter().map(Node::byte_length).sum::<usize>()),
        _ => unreachable!(),
    };
    // Block byte_length includes the 3-byte header; payload is len - 3.
    assert_eq!(block_byte_length - 3, records_sum);

    let record = match block {
        Node::Group { children, .. } => &children[0],
        _ => unreachable!(),
    };
    let (record_byte_length, fspec_plus_children) = match record {
        Node::Group { byte_length, .. } => (*byte_length, 1 + sum_lengths(record)),
        _ => unreachable!(),
    };
    assert_eq!(record_byte_length, fspec_plus_children);
}

/// An FX chain that never clears within the configured cap aborts the
/// record as `TruncatedFspec` rather than reading forever.
#[test]
fn fspec_chain_past_cap_aborts_record_as_truncated() {
    let catalogue = cat048_with_repetitive();
    let mut options = DecodeOptions::default();
    options.fspec_byte_cap = 2;
    // Two FSPEC bytes, both with FX set, then no more bytes.
    let buf = [0x30, 0x00, 0x05, 0xFF, 0xFF];
    let tree = decode_with_options(&catalogue, &buf, None, &options);
    let block = match &tree {
        Node::Group { children, .. } => &children[0],
        other => panic!("expected root group, got {other:?}"),
    };
    match block {
        Node::Group { children, .. } => {
            assert_eq!(children.len(), 1);
            assert!(matches!(children[0], Node::Message { severity: Severity::Err, .. }));
        }
        other => panic!("expected block group, got {other:?}"),
    }
}

/// `decode` run twice on identical input yields structurally equal trees
/// (§8's idempotence property), including across a category with a
/// repetitive item.
#[test]
fn decode_is_idempotent_with_repetitive_items() {
    let catalogue = cat048_with_repetitive();
    let buf = [0x30, 0x00, 0x09, 0xC0, 0x01, 0x02, 0x02, 0x05, 0x06];
    assert_eq!(decode(&catalogue, &buf, None), decode(&catalogue, &buf, None));
}

/// Two blocks where the first is malformed by length: the stream stops at
/// the first malformed block rather than trying to resynchronize (§4.I).
#[test]
fn malformed_block_stops_the_whole_stream_even_with_more_bytes_after() {
    let catalogue = cat048_with_repetitive();
    let mut buf = vec![0x30, 0x00, 0x02];
    buf.extend_from_slice(&[0x30, 0x00, 0x06, 0x80, 0x01, 0x02]);
    let tree = decode(&catalogue, &buf, None);
    match tree {
        Node::Group { children, .. } => {
            assert_eq!(children.len(), 1);
            assert!(matches!(children[0], Node::Message { .. }));
        }
        other => panic!("expected root group, got {other:?}"),
    }
}

/// A record that fails partway through (here: a Fixed item truncated by a
/// too-short payload) leaves genuine unconsumed bytes in its block; those
/// are reported as `TrailingBytes`, which defaults to a warning but can be
/// escalated to an error via `DecodeOptions` for strict pipelines.
#[test]
fn trailing_bytes_after_a_failed_record_follows_options_severity() {
    let catalogue = cat048_with_repetitive();
    // FSPEC 0x80 (FRN1/010 only), but only one of item 010's two declared
    // bytes follows -> the item fails Truncated, leaving that one byte as
    // an unconsumed trailing byte in the block.
    let buf = [0x30, 0x00, 0x05, 0x80, 0x01];

    let default_tree = decode(&catalogue, &buf, None);
    let block = match &default_tree {
        Node::Group { children, .. } => &children[0],
        _ => unreachable!(),
    };
    match block {
        Node::Group { children, .. } => {
            let trailing = children
                .iter()
                .find(|c| matches!(c, Node::Message { text, .. } if text.contains("trailing")))
                .expect("expected a TrailingBytes message");
            assert!(matches!(trailing, Node::Message { severity: Severity::Warn, .. }));
        }
        _ => unreachable!(),
    }

    let mut options = DecodeOptions::default();
    options.trailing_bytes_is_error = true;
    let strict_tree = decode_with_options(&catalogue, &buf, None, &options);
    let block = match &strict_tree {
        Node::Group { children, .. } => &children[0],
        _ => unreachable!(),
    };
    match block {
        Node::Group { children, .. } => {
            let trailing = children
                .iter()
                .find(|c| matches!(c, Node::Message { text, .. } if text.contains("trailing")))
                .expect("expected a TrailingBytes message");
            assert!(matches!(trailing, Node::Message { severity: Severity::Err, .. }));
        }
        _ => unreachable!(),
    }
}

/// Top-level severity (§3/§7) rolls up through Group -> Record -> Message
/// so a renderer can highlight the worst problem at a glance.
#[test]
fn root_severity_reflects_the_worst_nested_message() {
    let catalogue = cat048_with_repetitive();
    let buf = [0x30, 0x00, 0x05, 0x80, 0x01];
    let tree = decode(&catalogue, &buf, None);
    assert_eq!(tree.severity(), Severity::Err);
}
