//! The decoder's neutral output tree (§3, §6). Renderers are the only
//! intended consumers; this module never looks back at them.
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Ok,
    Warn,
    Err,
}

/// What kind of structural position a [`Node::Group`] occupies. Carried
/// alongside the tree so [`crate::filter`] can make category/item-level
/// decisions without re-deriving them from labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupKind {
    Root,
    /// `filterable` mirrors the owning [`crate::category::Category`]'s
    /// `filter_flag`, baked in at decode time so [`crate::filter::apply`]
    /// doesn't need catalogue access to honor it.
    Block { category_id: u16, filterable: bool },
    Record,
    /// One ASTERIX item (e.g. I048/010) inside a record.
    Item { category_id: u16, item_id: String },
    /// One repetition of a `Repetitive` item's element, or one subitem of
    /// a `Compound` item — not independently filterable.
    Element,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Uint(u64),
    Int(i64),
    Str(Vec<u8>),
    Raw(Vec<u8>),
    None,
}

impl Value {
    /// Lossy UTF-8 view of a `Str`/`Raw` value, for renderers that want text.
    pub fn as_text(&self) -> Option<std::borrow::Cow<'_, str>> {
        match self {
            Value::Str(bytes) | Value::Raw(bytes) => Some(String::from_utf8_lossy(bytes)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    Group {
        label: String,
        kind: GroupKind,
        byte_offset: usize,
        byte_length: usize,
        children: Vec<Node>,
    },
    Leaf {
        label: String,
        pid: String,
        /// Id of the enclosing [`GroupKind::Item`], empty for leaves with
        /// no enclosing item (e.g. the synthetic timestamp leaf). Carried
        /// on the leaf itself so [`crate::filter`] can decide at field
        /// granularity without re-deriving it from ancestor groups.
        item_id: String,
        byte_offset: usize,
        byte_length: usize,
        value: Value,
        value_label: Option<String>,
        severity: Severity,
    },
    Message {
        severity: Severity,
        byte_offset: usize,
        byte_length: usize,
        text: String,
    },
}

impl Node {
    pub fn byte_offset(&self) -> usize {
        match self {
            Node::Group { byte_offset, .. } => *byte_offset,
            Node::Leaf { byte_offset, .. } => *byte_offset,
            Node::Message { byte_offset, .. } => *byte_offset,
        }
    }

    pub fn byte_length(&self) -> usize {
        match self {
            Node::Group { byte_length, .. } => *byte_length,
            Node::Leaf { byte_length, .. } => *byte_length,
            Node::Message { byte_length, .. } => *byte_length,
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Node::Group { children, .. } => children
                .iter()
                .map(Node::severity)
                .max()
                .unwrap_or(Severity::Ok),
            Node::Leaf { severity, .. } => *severity,
            Node::Message { severity, .. } => *severity,
        }
    }

    pub fn message(severity: Severity, byte_offset: usize, byte_length: usize, text: impl Into<String>) -> Node {
        Node::Message { severity, byte_offset, byte_length, text: text.into() }
    }
}
