//! User Application Profile: ordered FRN→item-id bindings, optionally
//! gated behind an FSPEC-bit predicate (§3, §4.E).

#[derive(Debug, Clone)]
pub struct UapEntry {
    pub frn: u32,
    /// 0-based FSPEC byte this FRN's bit lives in.
    pub byte_nr: usize,
    /// Bit position within that byte, MSB-first (7 = first data bit, 0 = FX).
    pub bit_nr: u8,
    pub is_fx: bool,
    /// `None` only for the synthetic FX entries; always `Some` otherwise.
    pub item_id: Option<String>,
    /// Length hint carried over from the original UAP entry format
    /// (`UAPItem::m_nLen`). Cross-checked against a Fixed item's actual
    /// length by [`crate::category::Category::validate`]; not consulted
    /// while decoding a record.
    pub declared_len: Option<u16>,
}

impl UapEntry {
    /// Builds a data-item entry for 1-based Field Reference Number `frn`,
    /// per the bit-position formula in spec §4.H.
    pub fn for_frn(frn: u32, item_id: impl Into<String>) -> Self {
        let byte_nr = ((frn - 1) / 7) as usize;
        let bit_nr = 7 - ((frn - 1) % 7) as u8;
        Self { frn, byte_nr, bit_nr, is_fx: false, item_id: Some(item_id.into()), declared_len: None }
    }

    pub fn with_declared_len(mut self, len: u16) -> Self {
        self.declared_len = Some(len);
        self
    }
}

#[derive(Debug, Clone, Copy)]
pub struct UapSelector {
    pub byte_nr: usize,
    pub bit_nr: u8,
    pub expected: u8,
}

impl UapSelector {
    pub fn matches(&self, fspec: &[u8]) -> bool {
        fspec.get(self.byte_nr).map(|b| (b >> self.bit_nr) & 1 == self.expected).unwrap_or(false)
    }
}

#[derive(Debug, Clone)]
pub struct Uap {
    pub name: Option<String>,
    pub entries: Vec<UapEntry>,
    /// `None` means "use unconditionally" (the common case, and the only
    /// option when a category has a single UAP).
    pub selector: Option<UapSelector>,
}

impl Uap {
    pub fn new(entries: Vec<UapEntry>) -> Self {
        Self { name: None, entries, selector: None }
    }

    pub fn with_selector(mut self, selector: UapSelector) -> Self {
        self.selector = Some(selector);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Non-FX entries in FSPEC order, the canonical walk order for record
    /// decoding (§4.H point 3, §5's ordering guarantee).
    pub fn data_entries(&self) -> impl Iterator<Item = &UapEntry> {
        self.entries.iter().filter(|e| !e.is_fx)
    }

    pub fn max_frn(&self) -> u32 {
        self.entries.iter().map(|e| e.frn).max().unwrap_or(0)
    }
}

/// The set of UAPs a category declares. Selection per §4.E: if there's
/// only one UAP with no predicate, use it; otherwise evaluate predicates
/// in declaration order and take the first match (§9's Open Question,
/// resolved here).
#[derive(Debug, Clone)]
pub struct UapSet {
    pub uaps: Vec<Uap>,
}

impl UapSet {
    pub fn new(uaps: Vec<Uap>) -> Self {
        Self { uaps }
    }

    pub fn resolve(&self, fspec: &[u8]) -> Option<&Uap> {
        if self.uaps.len() == 1 && self.uaps[0].selector.is_none() {
            return self.uaps.first();
        }
        self.uaps.iter().find(|uap| match &uap.selector {
            None => true,
            Some(sel) => sel.matches(fspec),
        })
    }
}
