//! Tri-state filter predicate, consulted by renderers during emission —
//! never by the decoder itself (§4.K). Decoding stays filter-neutral and
//! reproducible; only the pruned view a renderer builds changes.
use crate::tree::{GroupKind, Node};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Keep,
    Drop,
    Default,
}

pub trait Filter {
    fn decide_category(&self, category_id: u16) -> Decision;
    fn decide_item(&self, category_id: u16, item_id: &str) -> Decision;
    fn decide_field(&self, category_id: u16, item_id: &str, field_tag: &str) -> Decision;
}

/// A filter that never drops anything; `decode` output piped straight
/// through `apply` with this filter is structurally unchanged.
pub struct NoopFilter;

impl Filter for NoopFilter {
    fn decide_category(&self, _category_id: u16) -> Decision {
        Decision::Default
    }
    fn decide_item(&self, _category_id: u16, _item_id: &str) -> Decision {
        Decision::Default
    }
    fn decide_field(&self, _category_id: u16, _item_id: &str, _field_tag: &str) -> Decision {
        Decision::Default
    }
}

fn keeps(decision: Decision) -> bool {
    !matches!(decision, Decision::Drop)
}

/// Applies `filter` to `tree`, pruning dropped leaves and collapsing any
/// `Group` all of whose children were dropped. `category_id` threads down
/// from the nearest enclosing [`GroupKind::Block`] so item/field decisions
/// have the context they need. A category is only ever filtered if both
/// its own `filter_flag` (baked into `GroupKind::Block::filterable` at
/// decode time, §3's `filter_flag`) and the `Filter`'s own category-level
/// decision allow it — either one can force a category through unfiltered.
pub fn apply(node: &Node, filter: &dyn Filter, category_id: Option<u16>, category_filterable: bool) -> Option<Node> {
    match node {
        Node::Message { .. } => Some(node.clone()),
        Node::Leaf { pid, item_id, .. } => {
            if !category_filterable {
                return Some(node.clone());
            }
            let cat = category_id.unwrap_or_default();
            let decision = filter.decide_field(cat, item_id, pid);
            if keeps(decision) {
                Some(node.clone())
            } else {
                None
            }
        }
        Node::Group { label, kind, byte_offset, byte_length, children } => {
            let (next_category, next_filterable) = match kind {
                GroupKind::Block { category_id, filterable } => {
                    if *filterable {
                        let decision = filter.decide_category(*category_id);
                        if !keeps(decision) {
                            return None;
                        }
                    }
                    (Some(*category_id), *filterable)
                }
                GroupKind::Item { category_id, item_id } => {
                    if category_filterable {
                        let decision = filter.decide_item(*category_id, item_id);
                        if !keeps(decision) {
                            return None;
                        }
                    }
                    (Some(*category_id), category_filterable)
                }
                _ => (category_id, category_filterable),
            };

            let filtered: Vec<Node> =
                children.iter().filter_map(|c| apply(c, filter, next_category, next_filterable)).collect();

            if !children.is_empty() && filtered.is_empty() {
                return None;
            }

            Some(Node::Group {
                label: label.clone(),
                kind: kind.clone(),
                byte_offset: *byte_offset,
                byte_length: *byte_length,
                children: filtered,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{Severity, Value};

    struct DropField(&'static str);
    impl Filter for DropField {
        fn decide_category(&self, _: u16) -> Decision {
            Decision::Default
        }
        fn decide_item(&self, _: u16, _: &str) -> Decision {
            Decision::Default
        }
        fn decide_field(&self, _: u16, _: &str, field_tag: &str) -> Decision {
            if field_tag == self.0 {
                Decision::Drop
            } else {
                Decision::Default
            }
        }
    }

    fn leaf(pid: &str) -> Node {
        leaf_of("010", pid)
    }

    fn leaf_of(item_id: &str, pid: &str) -> Node {
        Node::Leaf {
            label: pid.to_string(),
            pid: pid.to_string(),
            item_id: item_id.to_string(),
            byte_offset: 0,
            byte_length: 1,
            value: Value::Uint(1),
            value_label: None,
            severity: Severity::Ok,
        }
    }

    #[test]
    fn noop_filter_is_identity() {
        let tree = Node::Group {
            label: "r".into(),
            kind: GroupKind::Root,
            byte_offset: 0,
            byte_length: 1,
            children: vec![leaf("SAC")],
        };
        let filtered = apply(&tree, &NoopFilter, None, true).unwrap();
        assert_eq!(filtered, tree);
    }

    #[test]
    fn dropping_all_children_collapses_the_group() {
        let tree = Node::Group {
            label: "item".into(),
            kind: GroupKind::Item { category_id: 48, item_id: "010".into() },
            byte_offset: 0,
            byte_length: 2,
            children: vec![leaf("SAC"), leaf("SIC")],
        };
        let filtered = apply(&tree, &DropField("SAC"), Some(48), true);
        match filtered.unwrap() {
            Node::Group { children, .. } => assert_eq!(children.len(), 1),
            _ => panic!("expected group"),
        }

        let tree_all_dropped = Node::Group {
            label: "item".into(),
            kind: GroupKind::Item { category_id: 48, item_id: "010".into() },
            byte_offset: 0,
            byte_length: 1,
            children: vec![leaf("SAC")],
        };
        assert!(apply(&tree_all_dropped, &DropField("SAC"), Some(48), true).is_none());
    }

    /// `decide_field` must see the enclosing item's real id, not an empty
    /// placeholder, so a filter scoped to one item doesn't also match a
    /// same-named field tag belonging to a different item.
    #[test]
    fn field_decision_uses_the_enclosing_items_real_id() {
        struct DropFieldInItem {
            item_id: &'static str,
            field_tag: &'static str,
        }
        impl Filter for DropFieldInItem {
            fn decide_category(&self, _: u16) -> Decision {
                Decision::Default
            }
            fn decide_item(&self, _: u16, _: &str) -> Decision {
                Decision::Default
            }
            fn decide_field(&self, _: u16, item_id: &str, field_tag: &str) -> Decision {
                if item_id == self.item_id && field_tag == self.field_tag {
                    Decision::Drop
                } else {
                    Decision::Default
                }
            }
        }
        let filter = DropFieldInItem { item_id: "010", field_tag: "SAC" };

        let item_010 = Node::Group {
            label: "010".into(),
            kind: GroupKind::Item { category_id: 48, item_id: "010".into() },
            byte_offset: 0,
            byte_length: 1,
            children: vec![leaf_of("010", "SAC")],
        };
        assert!(apply(&item_010, &filter, Some(48), true).is_none());

        let item_020 = Node::Group {
            label: "020".into(),
            kind: GroupKind::Item { category_id: 48, item_id: "020".into() },
            byte_offset: 0,
            byte_length: 1,
            children: vec![leaf_of("020", "SAC")],
        };
        let filtered = apply(&item_020, &filter, Some(48), true).unwrap();
        match filtered {
            Node::Group { children, .. } => assert_eq!(children.len(), 1),
            _ => panic!("expected group"),
        }
    }

    /// A category whose `filter_flag` is unset passes through even when
    /// the `Filter` itself would drop it — the category's own flag wins.
    #[test]
    fn category_filter_flag_overrides_a_filter_that_would_drop_it() {
        struct DropEverything;
        impl Filter for DropEverything {
            fn decide_category(&self, _: u16) -> Decision {
                Decision::Drop
            }
            fn decide_item(&self, _: u16, _: &str) -> Decision {
                Decision::Drop
            }
            fn decide_field(&self, _: u16, _: &str, _: &str) -> Decision {
                Decision::Drop
            }
        }
        let block = Node::Group {
            label: "CAT048".into(),
            kind: GroupKind::Block { category_id: 48, filterable: false },
            byte_offset: 0,
            byte_length: 1,
            children: vec![leaf("SAC")],
        };
        let filtered = apply(&block, &DropEverything, None, true).unwrap();
        assert_eq!(filtered, block);
    }

    /// A filterable category whose `Filter` drops it at the category level
    /// collapses entirely — it must not instead disable filtering for (and
    /// so pass through unfiltered) everything beneath it.
    #[test]
    fn category_level_drop_collapses_the_whole_block() {
        struct DropCategory48;
        impl Filter for DropCategory48 {
            fn decide_category(&self, category_id: u16) -> Decision {
                if category_id == 48 {
                    Decision::Drop
                } else {
                    Decision::Default
                }
            }
            fn decide_item(&self, _: u16, _: &str) -> Decision {
                Decision::Default
            }
            fn decide_field(&self, _: u16, _: &str, _: &str) -> Decision {
                Decision::Default
            }
        }
        let block = Node::Group {
            label: "CAT048".into(),
            kind: GroupKind::Block { category_id: 48, filterable: true },
            byte_offset: 0,
            byte_length: 1,
            children: vec![leaf("SAC")],
        };
        assert!(apply(&block, &DropCategory48, None, true).is_none());
    }
}
