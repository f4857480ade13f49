//! Format strategies: the variant set that knows how to parse one item's
//! bytes into a subtree (§3, §4.C).
use crate::catalogue::Catalogue;
use crate::cursor::BitCursor;
use crate::descriptor::{Encoding, FieldDescriptor};
use crate::error::{CatalogueError, DecodeError};
use crate::options::DiagnosticsSink;
use crate::tree::{GroupKind, Node, Severity, Value};

/// One fixed-length run of fields, e.g. a `Fixed` item's whole body, one
/// part of a `Variable` chain, one element of a `Repetitive` item, or one
/// presence byte's worth of bits in a `Compound` item.
#[derive(Debug, Clone)]
pub struct FixedPart {
    pub len: usize,
    pub fields: Vec<FieldDescriptor>,
}

impl FixedPart {
    pub fn new(len: usize, fields: Vec<FieldDescriptor>) -> Self {
        Self { len, fields }
    }

    /// Validates every field's §3 invariants against this part's own byte
    /// extent (the slice each field is actually extracted from at parse time).
    fn validate_fields(&self, item_id: &str) -> Result<(), CatalogueError> {
        for field in &self.fields {
            field.validate(item_id, self.len)?;
        }
        Ok(())
    }
}

/// Context threaded through parsing for strategies that need catalogue
/// lookups outside their own item (only [`FormatStrategy::Bds`], which
/// dispatches through pseudo-category 256) and for reporting anomalies
/// that a strategy recovers from internally (also only `Bds`, for an
/// unrecognized register) through the same sink every other call site uses.
pub struct FormatContext<'a> {
    pub catalogue: &'a Catalogue,
    pub category_id: u16,
    pub sink: &'a dyn DiagnosticsSink,
}

#[derive(Debug, Clone)]
pub enum FormatStrategy {
    Fixed(FixedPart),
    Variable { parts: Vec<FixedPart> },
    Repetitive { rep_len: u8, element: FixedPart },
    Compound { presence_fields_per_byte: u8, subitems: Vec<(String, FormatStrategy)> },
    Explicit { sub: Option<Box<FormatStrategy>> },
    Bds,
    ReservedExpansion { tags: std::collections::BTreeMap<u8, FormatStrategy> },
}

impl FormatStrategy {
    /// Parses one item out of `buf` (a borrowed slice starting at this
    /// item's first byte). Returns bytes consumed and the resulting
    /// subtree, or a [`DecodeError`] per §4.C / §7.
    pub fn parse(
        &self,
        buf: &[u8],
        base_offset: usize,
        label: &str,
        pid: &str,
        ctx: &FormatContext,
    ) -> Result<(usize, Node), DecodeError> {
        match self {
            FormatStrategy::Fixed(part) => parse_fixed(part, buf, base_offset, label, pid, ctx),
            FormatStrategy::Variable { parts } => parse_variable(parts, buf, base_offset, label, pid, ctx),
            FormatStrategy::Repetitive { rep_len, element } => {
                parse_repetitive(*rep_len, element, buf, base_offset, label, pid, ctx)
            }
            FormatStrategy::Compound { presence_fields_per_byte, subitems } => {
                parse_compound(*presence_fields_per_byte, subitems, buf, base_offset, label, pid, ctx)
            }
            FormatStrategy::Explicit { sub } => parse_explicit(sub.as_deref(), buf, base_offset, label, pid, ctx),
            FormatStrategy::Bds => parse_bds(buf, base_offset, label, pid, ctx),
            FormatStrategy::ReservedExpansion { tags } => {
                parse_reserved_expansion(tags, buf, base_offset, label, pid, ctx)
            }
        }
    }

    /// Validates §3's field-descriptor invariants (integer width ≤ 64,
    /// ASCII/hex widths byte-multiples, bits within the owning part's byte
    /// extent) for every [`FieldDescriptor`] reachable from this strategy,
    /// recursing into `Compound`/`Explicit`/`ReservedExpansion` sub-strategies.
    pub fn validate_fields(&self, item_id: &str) -> Result<(), CatalogueError> {
        match self {
            FormatStrategy::Fixed(part) => part.validate_fields(item_id),
            FormatStrategy::Variable { parts } => {
                parts.iter().try_for_each(|part| part.validate_fields(item_id))
            }
            FormatStrategy::Repetitive { element, .. } => element.validate_fields(item_id),
            FormatStrategy::Compound { subitems, .. } => {
                subitems.iter().try_for_each(|(_, sub)| sub.validate_fields(item_id))
            }
            FormatStrategy::Explicit { sub } => match sub {
                Some(sub) => sub.validate_fields(item_id),
                None => Ok(()),
            },
            FormatStrategy::Bds => Ok(()),
            FormatStrategy::ReservedExpansion { tags } => {
                tags.values().try_for_each(|strategy| strategy.validate_fields(item_id))
            }
        }
    }
}

fn truncated(want_bytes: usize, have_bytes: usize) -> DecodeError {
    DecodeError::Truncated { want: want_bytes as u64 * 8, have: have_bytes as u64 * 8 }
}

fn take(buf: &[u8], n: usize) -> Result<&[u8], DecodeError> {
    if n > buf.len() {
        Err(truncated(n, buf.len()))
    } else {
        Ok(&buf[..n])
    }
}

fn leaf_for_field(field: &FieldDescriptor, item_bytes: &[u8], item_offset: usize, item_id: &str) -> Node {
    let width = field.width();
    let start_bit = field.start_bit_from_item_start(item_bytes.len());
    let start_byte = (start_bit / 8) as usize;
    let start_sub_bit = (start_bit % 8) as u8;

    let (value, value_label) = match field.encoding {
        Encoding::Unsigned | Encoding::SpeciallyFormattedTime => {
            let mut c = BitCursor::at(item_bytes, start_byte, start_sub_bit);
            let raw = c.read_unsigned(width).unwrap_or(0);
            let label = numeric_label(field, raw as f64, raw);
            (Value::Uint(raw), label)
        }
        Encoding::SignedTwosComplement => {
            let mut c = BitCursor::at(item_bytes, start_byte, start_sub_bit);
            let raw = c.read_signed(width).unwrap_or(0);
            // Enum labels key on the field's raw unsigned bit pattern (§4.C),
            // not the sign-extended i64, which would reinterpret a negative
            // value as a huge unsigned one and never hit the map.
            let mut unsigned_c = BitCursor::at(item_bytes, start_byte, start_sub_bit);
            let unsigned_raw = unsigned_c.read_unsigned(width).unwrap_or(0);
            let label = numeric_label(field, raw as f64, unsigned_raw);
            (Value::Int(raw), label)
        }
        Encoding::Ascii => {
            let mut c = BitCursor::at(item_bytes, start_byte, start_sub_bit);
            let mut bytes = Vec::with_capacity((width / 8) as usize);
            for _ in 0..(width / 8) {
                bytes.push(c.read_unsigned(8).unwrap_or(0) as u8);
            }
            let label = Some(String::from_utf8_lossy(&bytes).trim_end().to_string());
            (Value::Str(bytes), label)
        }
        Encoding::HexBytes => {
            let mut c = BitCursor::at(item_bytes, start_byte, start_sub_bit);
            let mut bytes = Vec::with_capacity((width / 8) as usize);
            for _ in 0..(width / 8) {
                bytes.push(c.read_unsigned(8).unwrap_or(0) as u8);
            }
            let label = Some(bytes.iter().map(|b| format!("{b:02X}")).collect::<String>());
            (Value::Raw(bytes), label)
        }
        Encoding::OctalDigitCoded => {
            let mut c = BitCursor::at(item_bytes, start_byte, start_sub_bit);
            let digits = width / 3;
            let mut s = String::with_capacity(digits as usize);
            for _ in 0..digits {
                let d = c.read_unsigned(3).unwrap_or(0);
                s.push(char::from_digit(d as u32, 8).unwrap_or('?'));
            }
            (Value::Str(s.clone().into_bytes()), Some(s))
        }
    };

    Node::Leaf {
        label: field.short_name.clone(),
        pid: field.filter_tag.clone(),
        item_id: item_id.to_string(),
        byte_offset: item_offset + start_byte,
        byte_length: ((width as usize) + 7) / 8,
        value,
        value_label,
        severity: Severity::Ok,
    }
}

fn numeric_label(field: &FieldDescriptor, scaled_raw: f64, unsigned_raw: u64) -> Option<String> {
    if let Some(map) = &field.enum_map {
        if let Some(label) = map.get(&unsigned_raw) {
            return Some(label.clone());
        }
    }
    if field.scale != 1.0 {
        let scaled = scaled_raw * field.scale;
        return Some(match &field.unit {
            Some(unit) => format!("{scaled} {unit}"),
            None => format!("{scaled}"),
        });
    }
    None
}

fn parse_fixed(
    part: &FixedPart,
    buf: &[u8],
    base_offset: usize,
    label: &str,
    pid: &str,
    ctx: &FormatContext,
) -> Result<(usize, Node), DecodeError> {
    let bytes = take(buf, part.len)?;
    let children = part.fields.iter().map(|f| leaf_for_field(f, bytes, base_offset, pid)).collect();
    Ok((
        part.len,
        Node::Group {
            label: label.to_string(),
            kind: GroupKind::Item { category_id: ctx.category_id, item_id: pid.to_string() },
            byte_offset: base_offset,
            byte_length: part.len,
            children,
        },
    ))
}

fn parse_variable(
    parts: &[FixedPart],
    buf: &[u8],
    base_offset: usize,
    label: &str,
    pid: &str,
    ctx: &FormatContext,
) -> Result<(usize, Node), DecodeError> {
    let mut consumed = 0usize;
    let mut children = Vec::new();
    for (i, part) in parts.iter().enumerate() {
        let remaining = &buf[consumed..];
        let bytes = take(remaining, part.len)?;
        let part_offset = base_offset + consumed;
        for field in &part.fields {
            children.push(leaf_for_field(field, bytes, part_offset, pid));
        }
        let fx = bytes[part.len - 1] & 1 == 1;
        consumed += part.len;
        if !fx {
            break;
        }
        if i + 1 == parts.len() {
            return Err(DecodeError::MissingExtensionFormat);
        }
    }
    Ok((
        consumed,
        Node::Group {
            label: label.to_string(),
            kind: GroupKind::Item { category_id: ctx.category_id, item_id: pid.to_string() },
            byte_offset: base_offset,
            byte_length: consumed,
            children,
        },
    ))
}

fn parse_repetitive(
    rep_len: u8,
    element: &FixedPart,
    buf: &[u8],
    base_offset: usize,
    label: &str,
    pid: &str,
    ctx: &FormatContext,
) -> Result<(usize, Node), DecodeError> {
    let rep_len = rep_len as usize;
    let count_bytes = take(buf, rep_len)?;
    let mut count: u64 = 0;
    for b in count_bytes {
        count = (count << 8) | *b as u64;
    }
    let mut offset = rep_len;
    let mut children = Vec::with_capacity(count as usize);
    for i in 0..count {
        let remaining = &buf[offset..];
        let bytes = take(remaining, element.len)?;
        let elem_offset = base_offset + offset;
        let elem_children = element.fields.iter().map(|f| leaf_for_field(f, bytes, elem_offset, pid)).collect();
        children.push(Node::Group {
            label: format!("{label}[{i}]"),
            kind: GroupKind::Element,
            byte_offset: elem_offset,
            byte_length: element.len,
            children: elem_children,
        });
        offset += element.len;
    }
    Ok((
        offset,
        Node::Group {
            label: format!("{label} (x{count})"),
            kind: GroupKind::Item { category_id: ctx.category_id, item_id: pid.to_string() },
            byte_offset: base_offset,
            byte_length: offset,
            children,
        },
    ))
}

/// Reads an FX-chained presence bitmap, returning the raw presence bytes
/// and bytes consumed. `cap` bounds the chain the same way FSPEC is bounded
/// in the record decoder (§4.H).
fn read_fx_chain<'a>(buf: &'a [u8], cap: usize) -> Result<&'a [u8], DecodeError> {
    let mut len = 0usize;
    loop {
        if len >= buf.len() {
            return Err(truncated(len + 1, buf.len()));
        }
        let b = buf[len];
        len += 1;
        if b & 1 == 0 {
            break;
        }
        if len >= cap {
            return Err(DecodeError::MissingExtensionFormat);
        }
    }
    Ok(&buf[..len])
}

fn parse_compound(
    _presence_fields_per_byte: u8,
    subitems: &[(String, FormatStrategy)],
    buf: &[u8],
    base_offset: usize,
    label: &str,
    pid: &str,
    ctx: &FormatContext,
) -> Result<(usize, Node), DecodeError> {
    let cap = subitems.len().div_ceil(7).max(1);
    let presence = read_fx_chain(buf, cap)?;
    let mut consumed = presence.len();
    let mut children = Vec::new();
    let mut sub_idx = 0usize;
    'outer: for byte in presence {
        for bit in (1..=7u8).rev() {
            if sub_idx >= subitems.len() {
                break 'outer;
            }
            let present = (byte >> bit) & 1 == 1;
            let (sub_label, sub_format) = &subitems[sub_idx];
            sub_idx += 1;
            if !present {
                continue;
            }
            let remaining = &buf[consumed..];
            let (n, node) = sub_format.parse(remaining, base_offset + consumed, sub_label, sub_label, ctx)?;
            children.push(node);
            consumed += n;
        }
    }
    Ok((
        consumed,
        Node::Group {
            label: label.to_string(),
            kind: GroupKind::Item { category_id: ctx.category_id, item_id: pid.to_string() },
            byte_offset: base_offset,
            byte_length: consumed,
            children,
        },
    ))
}

fn parse_explicit(
    sub: Option<&FormatStrategy>,
    buf: &[u8],
    base_offset: usize,
    label: &str,
    pid: &str,
    ctx: &FormatContext,
) -> Result<(usize, Node), DecodeError> {
    if buf.is_empty() {
        return Err(truncated(1, 0));
    }
    let len = buf[0] as usize;
    if len == 0 || len > buf.len() {
        return Err(DecodeError::InvalidExplicitLength { len: buf[0], remaining: buf.len() });
    }
    let body = &buf[1..len];
    let children = if let Some(sub) = sub {
        let (_, node) = sub.parse(body, base_offset + 1, label, pid, ctx)?;
        vec![node]
    } else if body.is_empty() {
        Vec::new()
    } else {
        vec![Node::Leaf {
            label: format!("{label} (raw)"),
            pid: pid.to_string(),
            item_id: pid.to_string(),
            byte_offset: base_offset + 1,
            byte_length: body.len(),
            value: Value::Raw(body.to_vec()),
            value_label: None,
            severity: Severity::Ok,
        }]
    };
    Ok((
        len,
        Node::Group {
            label: label.to_string(),
            kind: GroupKind::Item { category_id: ctx.category_id, item_id: pid.to_string() },
            byte_offset: base_offset,
            byte_length: len,
            children,
        },
    ))
}

fn parse_reserved_expansion(
    tags: &std::collections::BTreeMap<u8, FormatStrategy>,
    buf: &[u8],
    base_offset: usize,
    label: &str,
    pid: &str,
    ctx: &FormatContext,
) -> Result<(usize, Node), DecodeError> {
    if buf.is_empty() {
        return Err(truncated(1, 0));
    }
    let len = buf[0] as usize;
    if len == 0 || len > buf.len() {
        return Err(DecodeError::InvalidExplicitLength { len: buf[0], remaining: buf.len() });
    }
    let body = &buf[1..len];
    let children = if let Some(tag_byte) = body.first() {
        match tags.get(tag_byte) {
            Some(strategy) => {
                let (_, node) = strategy.parse(&body[1..], base_offset + 2, label, pid, ctx)?;
                vec![node]
            }
            None => vec![Node::message(
                Severity::Warn,
                base_offset + 1,
                body.len(),
                format!("unrecognized reserved-expansion tag {tag_byte:#04x}"),
            )],
        }
    } else {
        Vec::new()
    };
    Ok((
        len,
        Node::Group {
            label: label.to_string(),
            kind: GroupKind::Item { category_id: ctx.category_id, item_id: pid.to_string() },
            byte_offset: base_offset,
            byte_length: len,
            children,
        },
    ))
}

fn parse_bds(
    buf: &[u8],
    base_offset: usize,
    label: &str,
    pid: &str,
    ctx: &FormatContext,
) -> Result<(usize, Node), DecodeError> {
    let bytes = take(buf, 8)?;
    let bds_number = bytes[0];
    let pseudo = ctx.catalogue.get(256);
    let item = pseudo.and_then(|cat| cat.items.get(&format!("{bds_number:02X}")));
    let node = match item {
        Some(item_desc) => {
            let (_, inner) = item_desc.format.parse(bytes, base_offset, label, pid, ctx)?;
            inner
        }
        None => {
            let err = DecodeError::UnknownBds(bds_number);
            ctx.sink.report(err.severity(), &err.to_string());
            Node::Leaf {
                label: label.to_string(),
                pid: pid.to_string(),
                item_id: pid.to_string(),
                byte_offset: base_offset,
                byte_length: 8,
                value: Value::Raw(bytes.to_vec()),
                value_label: None,
                severity: err.severity(),
            }
        }
    };
    Ok((8, node))
}
