// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Document order

use std::cell::Cell;
use std::cmp::Ordering;

use crate::dom::Node;

/// Compare two nodes by their position in a pre-order walk.
///
/// Siblings compare by index; otherwise the ancestor chains are walked from
/// the root to the lowest common ancestor and the diverging children are
/// compared. An ancestor precedes its descendants. Nodes from different trees
/// order by the creation order of their roots, so each tree stays contiguous.
pub fn document_order(a: &Node, b: &Node) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }

    if let (Some(ap), Some(bp)) = (a.parent(), b.parent()) {
        if ap == bp {
            return sibling_order(a, b);
        }
    }

    let a_chain = chain(a);
    let b_chain = chain(b);
    if a_chain[0] != b_chain[0] {
        return a_chain[0].id.cmp(&b_chain[0].id);
    }

    let mut i = 0;
    while i < a_chain.len() && i < b_chain.len() && a_chain[i] == b_chain[i] {
        i += 1;
    }

    match (a_chain.get(i), b_chain.get(i)) {
        (None, _) => Ordering::Less,
        (_, None) => Ordering::Greater,
        (Some(x), Some(y)) => sibling_order(x, y),
    }
}

fn sibling_order(a: &Node, b: &Node) -> Ordering {
    a.index().cmp(&b.index())
}

/// Root-first ancestor chain ending with the node itself
fn chain(node: &Node) -> Vec<Node> {
    let mut chain = node.ancestors();
    chain.reverse();
    chain.push(node.clone());
    chain
}

/// Sort into document order and drop duplicate references.
///
/// Returns whether duplicates were found.
pub fn unique_sort(nodes: &mut Vec<Node>) -> bool {
    let has_duplicate = Cell::new(false);
    nodes.sort_by(|a, b| {
        let order = document_order(a, b);
        if order == Ordering::Equal {
            has_duplicate.set(true);
        }
        order
    });

    if has_duplicate.get() {
        nodes.dedup();
    }
    has_duplicate.get()
}
