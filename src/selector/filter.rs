// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Element predicates for the simple selector types

use std::collections::HashMap;

use regex::Regex;

use crate::dom::{html_words, Node, NodeId};
use crate::error::{Error, Result};

use super::cache::OrdinalKey;
use super::compiler::Compiler;
use super::matcher::{ElementMatcher, Matcher};
use super::pseudo;
use super::token::{
    AttrOperator, AttributeTest, ChildPosition, ChildTest, NthPattern, Token, TokenKind,
};

/// Whitespace as the class attribute splits it
pub(crate) const CLASS_WHITESPACE: &str = r"[\x20\t\r\n\x0c]";

/// Compile one non-combinator token
pub(crate) fn build(compiler: &Compiler<'_>, token: &Token) -> Result<Matcher> {
    let matcher = match &token.kind {
        TokenKind::Tag(name) => tag(name),
        TokenKind::Id(id) => id_matcher(id.clone()),
        TokenKind::Class(name) => class(compiler.class_pattern(name)?),
        TokenKind::Attribute(test) => attribute(test.clone()),
        TokenKind::Child(test) => child(test.clone()),
        TokenKind::Pseudo { name, argument } => {
            return pseudo::build(compiler, name, argument.as_deref())
        }
        TokenKind::Combinator(_) => {
            return Err(Error::syntax(compiler.source(), token.value.clone()))
        }
    };
    Ok(Matcher::Element(matcher))
}

/// Regex for a whole-word class match
pub(crate) fn class_regex(name: &str) -> Result<Regex> {
    let pattern = format!(
        "(^|{ws}){name}({ws}|$)",
        ws = CLASS_WHITESPACE,
        name = regex::escape(name)
    );
    Regex::new(&pattern).map_err(|e| Error::other(format!("class pattern for {name:?}: {e}")))
}

fn tag(name: &str) -> ElementMatcher {
    if name == "*" {
        return ElementMatcher::always();
    }
    let name = name.to_string();
    let lower = name.to_lowercase();
    ElementMatcher::new(move |node, ctx| match node.local_name() {
        Some(local) if ctx.xml => local == name,
        Some(local) => local.to_lowercase() == lower,
        None => false,
    })
}

fn id_matcher(id: String) -> ElementMatcher {
    ElementMatcher::new(move |node, _| node.get_attribute("id").as_deref() == Some(id.as_str()))
}

fn class(pattern: Regex) -> ElementMatcher {
    ElementMatcher::new(move |node, _| {
        node.get_attribute("class")
            .map(|c| pattern.is_match(&c))
            .unwrap_or(false)
    })
}

fn attribute(test: AttributeTest) -> ElementMatcher {
    ElementMatcher::new(move |node, _| {
        let value = node.get_attribute(&test.name);
        match (value, test.operator) {
            (None, Some(AttrOperator::NotEquals)) => true,
            (None, _) => false,
            (Some(_), None) => true,
            (Some(value), Some(op)) => attribute_value_matches(&value, op, &test.value),
        }
    })
}

/// Compare an attribute's value against a selector operand
pub fn attribute_value_matches(value: &str, op: AttrOperator, check: &str) -> bool {
    match op {
        AttrOperator::Equals => value == check,
        AttrOperator::NotEquals => value != check,
        AttrOperator::Prefix => !check.is_empty() && value.starts_with(check),
        AttrOperator::Substring => !check.is_empty() && value.contains(check),
        AttrOperator::Suffix => !check.is_empty() && value.ends_with(check),
        AttrOperator::Includes => {
            !check.is_empty()
                && !check.contains(|c: char| c.is_ascii_whitespace())
                && html_words(value).any(|word| word == check)
        }
        AttrOperator::DashMatch => {
            value == check
                || (value.len() > check.len()
                    && value.starts_with(check)
                    && value.as_bytes()[check.len()] == b'-')
        }
    }
}

fn child(test: ChildTest) -> ElementMatcher {
    let ChildTest {
        position,
        of_type,
        nth,
    } = test;

    if position.is_simple() {
        return ElementMatcher::new(move |node, _| {
            if node.parent().is_none() {
                return false;
            }
            let name = if of_type { node.local_name() } else { None };
            let same_kind = |n: &Node| n.is_element() && (!of_type || n.local_name() == name);

            let first = || !has_sibling(node, &same_kind, Node::prev_sibling);
            let last = || !has_sibling(node, &same_kind, Node::next_sibling);
            match position {
                ChildPosition::First => first(),
                ChildPosition::Last => last(),
                _ => first() && last(),
            }
        });
    }

    let pattern = nth.unwrap_or(NthPattern::new(1, 0));
    let forward = position.is_forward();

    ElementMatcher::new(move |node, ctx| {
        let Some(parent) = node.parent() else {
            return false;
        };
        if pattern.matches_all() {
            return true;
        }

        let of_type_name = if of_type { node.local_name() } else { None };
        let key = OrdinalKey {
            parent: parent.id,
            forward,
            of_type: of_type_name.clone(),
        };
        ctx.state
            .ordinal(key, node.id, ctx.generation, || {
                sibling_ordinals(&parent, forward, of_type_name.as_deref())
            })
            .map(|ordinal| pattern.matches(ordinal as i64))
            .unwrap_or(false)
    })
}

fn has_sibling(
    node: &Node,
    same_kind: impl Fn(&Node) -> bool,
    step: fn(&Node) -> Option<Node>,
) -> bool {
    let mut cur = step(node);
    while let Some(sibling) = cur {
        if same_kind(&sibling) {
            return true;
        }
        cur = step(&sibling);
    }
    false
}

/// 1-based ordinals of a parent's element children
fn sibling_ordinals(parent: &Node, forward: bool, of_type: Option<&str>) -> HashMap<NodeId, usize> {
    let mut children: Vec<Node> = parent
        .element_children()
        .into_iter()
        .filter(|c| of_type.is_none() || c.local_name().as_deref() == of_type)
        .collect();
    if !forward {
        children.reverse();
    }
    children
        .into_iter()
        .enumerate()
        .map(|(i, c)| (c.id, i + 1))
        .collect()
}
