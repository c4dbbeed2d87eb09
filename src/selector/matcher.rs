// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Compiled matcher values and the context they run in

use std::fmt;
use std::sync::Arc;

use crate::dom::{Node, NodeType};

use super::cache::ScanState;
use super::order::unique_sort;

type ElementFn = dyn Fn(&Node, &ScanContext<'_>) -> bool + Send + Sync;
type SetFn = dyn Fn(&[Node], &ScanContext<'_>) -> Vec<bool> + Send + Sync;

/// Predicate over a single element
#[derive(Clone)]
pub struct ElementMatcher(Arc<ElementFn>);

impl ElementMatcher {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Node, &ScanContext<'_>) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Matcher accepting every element
    pub fn always() -> Self {
        Self::new(|_, _| true)
    }

    #[inline]
    pub fn matches(&self, node: &Node, ctx: &ScanContext<'_>) -> bool {
        (self.0)(node, ctx)
    }
}

impl fmt::Debug for ElementMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ElementMatcher")
    }
}

/// Predicate over an ordered candidate list. Returns one keep flag per
/// candidate; positional pseudos need the whole list.
#[derive(Clone)]
pub struct SetPredicate(Arc<SetFn>);

impl SetPredicate {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&[Node], &ScanContext<'_>) -> Vec<bool> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Subset of `candidates` the predicate keeps, order preserved
    pub fn apply(&self, candidates: Vec<Node>, ctx: &ScanContext<'_>) -> Vec<Node> {
        let keep = (self.0)(&candidates, ctx);
        candidates
            .into_iter()
            .zip(keep)
            .filter_map(|(node, keep)| keep.then_some(node))
            .collect()
    }
}

impl fmt::Debug for SetPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SetPredicate")
    }
}

/// What a single filter token compiles to
#[derive(Debug, Clone)]
pub enum Matcher {
    Element(ElementMatcher),
    Set(SetPredicate),
}

/// Where a selector is evaluated
#[derive(Debug, Clone)]
pub enum Scope {
    /// No context: nothing constrains the leftmost compound and there is
    /// nothing to search. Used for matching given elements.
    Free,
    /// Searching a whole document
    Document(Node),
    /// Searching under an element or fragment; matches must lie inside it
    Within(Node),
    /// Searching relative to several context elements at once
    Many(Vec<Node>),
}

impl Scope {
    pub fn from_context(context: &Node) -> Self {
        match context.node_type() {
            NodeType::Document => Scope::Document(context.clone()),
            _ => Scope::Within(context.clone()),
        }
    }

    /// Whether the leftmost compound must be related to a context node
    pub fn constrains(&self) -> bool {
        matches!(self, Scope::Within(_) | Scope::Many(_))
    }

    /// Whether `node` is (one of) the context node(s)
    pub fn is_context(&self, node: &Node) -> bool {
        match self {
            Scope::Free => false,
            Scope::Document(root) | Scope::Within(root) => root == node,
            Scope::Many(roots) => roots.contains(node),
        }
    }

    fn roots(&self) -> &[Node] {
        match self {
            Scope::Free => &[],
            Scope::Document(root) | Scope::Within(root) => std::slice::from_ref(root),
            Scope::Many(roots) => roots,
        }
    }
}

/// Per-execution state handed to every matcher
#[derive(Debug, Clone)]
pub struct ScanContext<'a> {
    pub(crate) state: &'a ScanState,
    pub scope: Scope,
    pub xml: bool,
    pub generation: u64,
}

impl<'a> ScanContext<'a> {
    pub(crate) fn new(state: &'a ScanState, scope: Scope, xml: bool) -> Self {
        Self {
            state,
            scope,
            xml,
            generation: state.next_generation(),
        }
    }

    /// Fresh context for a nested search under a different scope
    pub(crate) fn rescoped(&self, scope: Scope) -> Self {
        Self::new(self.state, scope, self.xml)
    }

    /// Context-free view of this execution, for negation tests
    pub(crate) fn unscoped(&self) -> Self {
        Self {
            state: self.state,
            scope: Scope::Free,
            xml: self.xml,
            generation: self.generation,
        }
    }

    /// Candidate elements for an unseeded search, in document order.
    ///
    /// With `expand` (selector starts with `+` or `~`) the search runs from
    /// each context's parent so siblings of the context are reachable.
    pub(crate) fn candidates(&self, expand: bool) -> Vec<Node> {
        let bases: Vec<Node> = self
            .scope
            .roots()
            .iter()
            .map(|root| match (expand, root.parent()) {
                (true, Some(parent)) => parent,
                _ => root.clone(),
            })
            .collect();

        match bases.as_slice() {
            [] => Vec::new(),
            [base] => base.descendant_elements(),
            _ => {
                let mut all: Vec<Node> = bases.iter().flat_map(Node::descendant_elements).collect();
                unique_sort(&mut all);
                all
            }
        }
    }
}
