//! Named item (e.g. "010") bound to the format strategy that parses it (§3).
use crate::format::FormatStrategy;

#[derive(Debug, Clone)]
pub struct ItemDescription {
    /// Conventionally 3 characters, e.g. "010".
    pub id: String,
    pub format: FormatStrategy,
}

impl ItemDescription {
    pub fn new(id: impl Into<String>, format: FormatStrategy) -> Self {
        Self { id: id.into(), format }
    }

    /// Meaningful only when `format` is [`FormatStrategy::Repetitive`].
    pub fn repetitive_count_width(&self) -> Option<u8> {
        match &self.format {
            FormatStrategy::Repetitive { rep_len, .. } => Some(*rep_len),
            _ => None,
        }
    }
}
