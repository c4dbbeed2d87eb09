// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Selector compiler
//!
//! Each comma group compiles to either one element predicate or a staged
//! set matcher. Element predicates are evaluated right to left: the rightmost
//! compound is tested on the candidate and combinators walk towards the
//! context. The first positional pseudo in a group splits it into
//!
//! - a prefix filter (everything before the pseudo),
//! - the set predicate itself,
//! - a post filter (the rest of the pseudo's compound),
//! - a post finder (everything after the next combinator, searched relative
//!   to the survivors).

use std::collections::HashSet;
use std::sync::Arc;

use regex::Regex;

use crate::dom::{Node, NodeId};
use crate::error::Result;

use super::cache::ScanState;
use super::engine::Engine;
use super::filter;
use super::matcher::{ElementMatcher, Matcher, ScanContext, Scope, SetPredicate};
use super::order::unique_sort;
use super::token::{Combinator, Token, TokenGroup};

/// A selector compiled against one engine
#[derive(Debug)]
pub struct CompiledSelector {
    source: String,
    element_matchers: Vec<ElementMatcher>,
    set_matchers: Vec<Arc<SetMatcher>>,
    expands_context: bool,
}

impl CompiledSelector {
    /// Selector text this was compiled from
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Whether any group depends on candidate positions
    pub fn has_set_matchers(&self) -> bool {
        !self.set_matchers.is_empty()
    }

    pub fn group_count(&self) -> usize {
        self.element_matchers.len() + self.set_matchers.len()
    }

    /// Test one element against the element-level groups only
    pub(crate) fn matches_element(&self, node: &Node, ctx: &ScanContext<'_>) -> bool {
        self.element_matchers.iter().any(|m| m.matches(node, ctx))
    }

    /// Run the selector. With a seed, results are the seed elements that
    /// match; otherwise candidates are gathered from the scope.
    pub(crate) fn execute(
        &self,
        state: &ScanState,
        scope: Scope,
        xml: bool,
        seed: Option<&[Node]>,
    ) -> Vec<Node> {
        let _guard = state.enter();
        let ctx = ScanContext::new(state, scope, xml);

        let candidates: Vec<Node> = match seed {
            Some(seed) => seed.iter().filter(|n| n.is_element()).cloned().collect(),
            None => ctx.candidates(self.expands_context),
        };

        let mut results: Vec<Node> = if self.element_matchers.is_empty() {
            Vec::new()
        } else {
            candidates
                .iter()
                .filter(|n| self.matches_element(n, &ctx))
                .cloned()
                .collect()
        };
        let mut contributors = usize::from(!results.is_empty());

        for set in &self.set_matchers {
            let found = set.run(seed.map(|_| candidates.as_slice()), &ctx);
            if !found.is_empty() {
                contributors += 1;
                results.extend(found);
            }
        }

        if seed.is_some() || contributors > 1 {
            unique_sort(&mut results);
        }
        results
    }
}

/// Compiled form of one group (or of a group's tail)
#[derive(Debug, Clone)]
enum GroupMatcher {
    Element(ElementMatcher),
    Set(Arc<SetMatcher>),
}

impl GroupMatcher {
    fn filter(&self, seed: &[Node], ctx: &ScanContext<'_>) -> Vec<Node> {
        match self {
            GroupMatcher::Element(m) => seed.iter().filter(|n| m.matches(n, ctx)).cloned().collect(),
            GroupMatcher::Set(set) => set.run(Some(seed), ctx),
        }
    }
}

/// Staged matcher for a group containing a positional pseudo
#[derive(Debug)]
pub(crate) struct SetMatcher {
    pre_filter: Option<ElementMatcher>,
    predicate: SetPredicate,
    post_filter: Option<GroupMatcher>,
    post_finder: Option<PostFinder>,
    expands_context: bool,
}

#[derive(Debug)]
struct PostFinder {
    matcher: GroupMatcher,
    expands_context: bool,
}

impl SetMatcher {
    pub(crate) fn run(&self, seed: Option<&[Node]>, ctx: &ScanContext<'_>) -> Vec<Node> {
        let source = match seed {
            Some(seed) => seed.to_vec(),
            None => ctx.candidates(self.expands_context),
        };
        let matcher_in: Vec<Node> = match &self.pre_filter {
            Some(pre) => source.into_iter().filter(|n| pre.matches(n, ctx)).collect(),
            None => source,
        };

        let mut survivors = self.predicate.apply(matcher_in, ctx);

        if let Some(post) = &self.post_filter {
            survivors = post.filter(&survivors, ctx);
        }

        let Some(finder) = &self.post_finder else {
            return survivors;
        };
        if survivors.is_empty() {
            return survivors;
        }

        let inner = ctx.rescoped(Scope::Many(survivors));
        let found: Vec<Node> = match &finder.matcher {
            GroupMatcher::Element(m) => inner
                .candidates(finder.expands_context)
                .into_iter()
                .filter(|n| m.matches(n, &inner))
                .collect(),
            GroupMatcher::Set(set) => set.run(None, &inner),
        };

        match seed {
            Some(seed) => {
                let found: HashSet<NodeId> = found.iter().map(|n| n.id).collect();
                seed.iter().filter(|n| found.contains(&n.id)).cloned().collect()
            }
            None => found,
        }
    }
}

/// Builds matchers for one selector string
pub(crate) struct Compiler<'e> {
    engine: &'e Engine,
    source: &'e str,
    depth: usize,
}

impl<'e> Compiler<'e> {
    pub(crate) fn new(engine: &'e Engine, source: &'e str, depth: usize) -> Self {
        Self {
            engine,
            source,
            depth,
        }
    }

    /// Full selector text, for error reporting
    pub(crate) fn source(&self) -> &str {
        self.source
    }

    pub(crate) fn class_pattern(&self, name: &str) -> Result<Regex> {
        self.engine.class_pattern(name)
    }

    /// Compile a selector argument one level deeper
    pub(crate) fn nested(&self, selector: &str) -> Result<Arc<CompiledSelector>> {
        self.engine.compile_at_depth(selector, self.depth + 1)
    }

    pub(crate) fn compile(&self, groups: &[TokenGroup]) -> Result<CompiledSelector> {
        let mut element_matchers = Vec::new();
        let mut set_matchers = Vec::new();
        let mut expands_context = false;

        for group in groups {
            expands_context |= starts_with_sibling(group);
            match self.matcher_from_tokens(group, true)? {
                GroupMatcher::Element(m) => element_matchers.push(m),
                GroupMatcher::Set(s) => set_matchers.push(s),
            }
        }

        Ok(CompiledSelector {
            source: self.source.to_string(),
            element_matchers,
            set_matchers,
            expands_context,
        })
    }

    /// `check_context` is off for post filters, which only re-test elements
    /// that already satisfied the context relation.
    fn matcher_from_tokens(&self, tokens: &[Token], check_context: bool) -> Result<GroupMatcher> {
        let leading = tokens.first().and_then(Token::combinator);
        let mut i = usize::from(leading.is_some());

        let mut matchers = Vec::new();
        if check_context {
            matchers.push(self.leading_matcher(leading));
        }

        while i < tokens.len() {
            let token = &tokens[i];

            if let Some(combinator) = token.combinator() {
                let chained = element_matcher(std::mem::take(&mut matchers));
                matchers.push(self.add_combinator(chained, combinator, false));
                i += 1;
                continue;
            }

            match filter::build(self, token)? {
                Matcher::Element(m) => matchers.push(m),
                Matcher::Set(predicate) => {
                    return self.set_matcher(tokens, i, matchers, predicate);
                }
            }
            i += 1;
        }

        Ok(GroupMatcher::Element(element_matcher(matchers)))
    }

    fn set_matcher(
        &self,
        tokens: &[Token],
        at: usize,
        matchers: Vec<ElementMatcher>,
        predicate: SetPredicate,
    ) -> Result<GroupMatcher> {
        let next_combinator = tokens[at + 1..]
            .iter()
            .position(|t| t.combinator().is_some())
            .map_or(tokens.len(), |p| at + 1 + p);

        let pre_filter = (!matchers.is_empty()).then(|| element_matcher(matchers));

        let post_filter = if at + 1 < next_combinator {
            Some(self.matcher_from_tokens(&tokens[at + 1..next_combinator], false)?)
        } else {
            None
        };

        let post_finder = if next_combinator < tokens.len() {
            let rest = &tokens[next_combinator..];
            Some(PostFinder {
                matcher: self.matcher_from_tokens(rest, true)?,
                expands_context: starts_with_sibling(rest),
            })
        } else {
            None
        };

        Ok(GroupMatcher::Set(Arc::new(SetMatcher {
            pre_filter,
            predicate,
            post_filter,
            post_finder,
            expands_context: starts_with_sibling(tokens),
        })))
    }

    /// Relates the leftmost compound to the context. Without an explicit
    /// leading combinator the relation is "descendant of", and it is only
    /// checked when the scope is narrower than a whole document.
    fn leading_matcher(&self, leading: Option<Combinator>) -> ElementMatcher {
        let is_context = ElementMatcher::new(|node, ctx| ctx.scope.is_context(node));
        let relation = self.add_combinator(is_context, leading.unwrap_or(Combinator::Descendant), true);
        let explicit = leading.is_some();

        ElementMatcher::new(move |node, ctx| {
            if !explicit && !ctx.scope.constrains() {
                return true;
            }
            relation.matches(node, ctx)
        })
    }

    /// Wrap `matcher` so it is tested on the node the combinator leads to.
    /// `base` lets ancestor walks land on non-element context nodes.
    fn add_combinator(&self, matcher: ElementMatcher, combinator: Combinator, base: bool) -> ElementMatcher {
        let step = self.engine.scan_state().next_step();
        let parent = move |node: &Node| node.parent().filter(|p| base || p.is_element());

        match combinator {
            Combinator::Child => {
                ElementMatcher::new(move |node, ctx| parent(node).map_or(false, |p| matcher.matches(&p, ctx)))
            }
            Combinator::Adjacent => ElementMatcher::new(move |node, ctx| {
                node.prev_element_sibling()
                    .map_or(false, |s| matcher.matches(&s, ctx))
            }),
            Combinator::Descendant => {
                ElementMatcher::new(move |node, ctx| walk(node, ctx, step, &parent, &matcher))
            }
            Combinator::General => ElementMatcher::new(move |node, ctx| {
                walk(node, ctx, step, &Node::prev_element_sibling, &matcher)
            }),
        }
    }
}

fn starts_with_sibling(tokens: &[Token]) -> bool {
    tokens
        .first()
        .and_then(Token::combinator)
        .map_or(false, |c| c.is_sibling())
}

/// Conjunction of matchers, most recently added first
fn element_matcher(mut matchers: Vec<ElementMatcher>) -> ElementMatcher {
    match matchers.len() {
        0 => ElementMatcher::always(),
        1 => matchers.remove(0),
        _ => ElementMatcher::new(move |node, ctx| matchers.iter().rev().all(|m| m.matches(node, ctx))),
    }
}

/// Walk `next` from `start` until `matcher` accepts a node.
///
/// Every node visited is stamped with the walk's outcome for this step and
/// generation: the outcome from any node equals the outcome from the node it
/// leads to, so a later walk reaching a stamped node stops there.
fn walk(
    start: &Node,
    ctx: &ScanContext<'_>,
    step: usize,
    next: &dyn Fn(&Node) -> Option<Node>,
    matcher: &ElementMatcher,
) -> bool {
    let mut visited = Vec::new();
    let mut cur = next(start);
    let mut result = false;

    while let Some(node) = cur {
        if let Some(known) = ctx.state.combinator_result(node.id, step, ctx.generation) {
            result = known;
            break;
        }
        visited.push(node.id);
        if matcher.matches(&node, ctx) {
            result = true;
            break;
        }
        cur = next(&node);
    }

    for id in visited {
        ctx.state
            .store_combinator_result(id, step, ctx.generation, result);
    }
    result
}
