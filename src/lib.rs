#![doc = include_str!("../README.md")]

pub mod block_decoder;
pub mod category;
pub mod catalogue;
pub mod cursor;
pub mod descriptor;
pub mod error;
pub mod filter;
pub mod format;
pub mod item;
pub mod options;
pub mod record_decoder;
pub mod tree;
pub mod uap;

pub use catalogue::Catalogue;
pub use category::Category;
pub use descriptor::{Encoding, FieldDescriptor};
pub use error::{CatalogueError, DecodeError};
pub use filter::{Decision, Filter, NoopFilter};
pub use format::{FixedPart, FormatStrategy};
pub use item::ItemDescription;
pub use options::{DecodeOptions, DiagnosticsSink, LogSink, NoopSink};
pub use tree::{GroupKind, Node, Severity, Value};
pub use uap::{Uap, UapEntry, UapSelector, UapSet};

/// Decodes `bytes` against `catalogue`, returning the root [`Node::Group`]
/// described in spec §6: one child `Group` per block, each containing one
/// child `Group` per record. Always returns a tree — recoverable failures
/// are captured as `Message` nodes (§7) rather than returned as `Err`.
///
/// `timestamp`, when supplied, is attached to each successfully-decoded
/// block as a numeric leaf (seconds since epoch).
///
/// This function is a pure function of its arguments: the catalogue is
/// borrowed read-only and may be shared across any number of concurrent
/// invocations (§5); decoding never consults a filter, so its output is
/// independent of how a caller later renders it (§4.K, §8's filter
/// neutrality property).
pub fn decode(catalogue: &Catalogue, bytes: &[u8], timestamp: Option<f64>) -> Node {
    let options = DecodeOptions::default();
    block_decoder::decode_blocks(catalogue, bytes, timestamp, &options)
}

/// Like [`decode`], but with caller-supplied [`DecodeOptions`] (a custom
/// diagnostics sink, a non-default FSPEC byte cap, …).
pub fn decode_with_options(catalogue: &Catalogue, bytes: &[u8], timestamp: Option<f64>, options: &DecodeOptions) -> Node {
    block_decoder::decode_blocks(catalogue, bytes, timestamp, options)
}
