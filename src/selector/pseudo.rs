// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Pseudo-class builders
//!
//! Element pseudos become `ElementMatcher`s. Positional pseudos (`:first`,
//! `:eq(n)`, ...) and `:not` of a positional selector need the whole
//! candidate list and become `SetPredicate`s.

use std::collections::HashSet;

use crate::dom::{Node, NodeId, NodeType};
use crate::error::{Error, Result};

use super::compiler::Compiler;
use super::matcher::{ElementMatcher, Matcher, Scope, SetPredicate};
use super::tokenizer::{is_identifier, unescape};

/// Compile a pseudo-class token
pub(crate) fn build(compiler: &Compiler<'_>, name: &str, argument: Option<&str>) -> Result<Matcher> {
    if let Some(position) = Position::parse(name, argument)? {
        return Ok(positional(position));
    }

    match name {
        "not" => not(compiler, selector_argument(compiler, name, argument)?),
        "has" => has(compiler, selector_argument(compiler, name, argument)?),
        "contains" => Ok(Matcher::Element(contains(required(name, argument)?))),
        "lang" => Ok(Matcher::Element(lang(required(name, argument)?)?)),
        _ => match element_pseudo(name) {
            Some(test) => Ok(Matcher::Element(ElementMatcher::new(move |node, _| test(node)))),
            None => Err(Error::unsupported_pseudo(compiler.source(), name)),
        },
    }
}

/// Whether a pseudo name is known to the engine
pub fn is_supported(name: &str) -> bool {
    matches!(
        name,
        "not" | "has" | "contains" | "lang" | "first" | "last" | "even" | "odd" | "eq" | "nth" | "lt" | "gt"
    ) || element_pseudo(name).is_some()
}

fn required<'a>(name: &str, argument: Option<&'a str>) -> Result<&'a str> {
    argument.ok_or_else(|| Error::invalid_argument(name, ""))
}

/// A nested selector argument; `:not()` with nothing inside is malformed
fn selector_argument<'a>(compiler: &Compiler<'_>, name: &str, argument: Option<&'a str>) -> Result<&'a str> {
    let argument = required(name, argument)?;
    if argument.trim().is_empty() {
        return Err(Error::syntax(compiler.source(), format!(":{name}()")));
    }
    Ok(argument)
}

/// Index-based pseudos over the current candidate list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    First,
    Last,
    Even,
    Odd,
    Eq(i64),
    Lt(i64),
    Gt(i64),
}

impl Position {
    fn parse(name: &str, argument: Option<&str>) -> Result<Option<Self>> {
        let index = || -> Result<i64> {
            let raw = argument.unwrap_or("");
            raw.trim()
                .parse()
                .map_err(|_| Error::invalid_argument(name, raw))
        };
        let position = match name {
            "first" => Position::First,
            "last" => Position::Last,
            "even" => Position::Even,
            "odd" => Position::Odd,
            "eq" | "nth" => Position::Eq(index()?),
            "lt" => Position::Lt(index()?),
            "gt" => Position::Gt(index()?),
            _ => return Ok(None),
        };
        Ok(Some(position))
    }

    /// Whether candidate `index` of `len` is selected. Negative arguments
    /// count from the end.
    pub fn selects(&self, index: i64, len: i64) -> bool {
        let resolve = |n: i64| if n < 0 { n + len } else { n };
        match *self {
            Position::First => index == 0,
            Position::Last => index == len - 1,
            Position::Even => index % 2 == 0,
            Position::Odd => index % 2 == 1,
            Position::Eq(n) => index == resolve(n),
            Position::Lt(n) => index < resolve(n),
            Position::Gt(n) => index > resolve(n),
        }
    }
}

fn positional(position: Position) -> Matcher {
    Matcher::Set(SetPredicate::new(move |candidates, _| {
        let len = candidates.len() as i64;
        (0..len).map(|i| position.selects(i, len)).collect()
    }))
}

fn not(compiler: &Compiler<'_>, argument: &str) -> Result<Matcher> {
    let inner = compiler.nested(argument)?;

    if !inner.has_set_matchers() {
        return Ok(Matcher::Element(ElementMatcher::new(move |node, ctx| {
            !inner.matches_element(node, &ctx.unscoped())
        })));
    }

    Ok(Matcher::Set(SetPredicate::new(move |candidates, ctx| {
        let matched: HashSet<NodeId> = inner
            .execute(ctx.state, Scope::Free, ctx.xml, Some(candidates))
            .iter()
            .map(|n| n.id)
            .collect();
        candidates.iter().map(|n| !matched.contains(&n.id)).collect()
    })))
}

fn has(compiler: &Compiler<'_>, argument: &str) -> Result<Matcher> {
    let inner = compiler.nested(argument)?;
    Ok(Matcher::Element(ElementMatcher::new(move |node, ctx| {
        !inner
            .execute(ctx.state, Scope::Within(node.clone()), ctx.xml, None)
            .is_empty()
    })))
}

fn contains(argument: &str) -> ElementMatcher {
    let text = unescape(argument).into_owned();
    ElementMatcher::new(move |node, _| node.text_content().contains(&text))
}

fn lang(argument: &str) -> Result<ElementMatcher> {
    if !is_identifier(argument) {
        return Err(Error::invalid_argument("lang", argument));
    }
    let wanted = unescape(argument).to_lowercase();
    let prefix = format!("{wanted}-");

    Ok(ElementMatcher::new(move |node, ctx| {
        let mut cur = Some(node.clone());
        while let Some(elem) = cur {
            if !elem.is_element() {
                break;
            }
            let declared = if ctx.xml {
                elem.get_attribute("xml:lang").or_else(|| elem.get_attribute("lang"))
            } else {
                elem.get_attribute("lang")
            };
            if let Some(value) = declared.filter(|v| !v.is_empty()) {
                let value = value.to_lowercase();
                return value == wanted || value.starts_with(&prefix);
            }
            cur = elem.parent();
        }
        false
    }))
}

fn element_pseudo(name: &str) -> Option<fn(&Node) -> bool> {
    let test: fn(&Node) -> bool = match name {
        "root" => is_root,
        "empty" => is_empty,
        "parent" => |n| !is_empty(n),
        "header" => is_header,
        "input" => |n| is_one_of(n, &["input", "select", "textarea", "button"]),
        "button" => |n| is_one_of(n, &["button"]) || (is_one_of(n, &["input"]) && input_type(n) == "button"),
        "text" => |n| is_input_of_type(n, "text"),
        "radio" => |n| is_input_of_type(n, "radio"),
        "checkbox" => |n| is_input_of_type(n, "checkbox"),
        "file" => |n| is_input_of_type(n, "file"),
        "password" => |n| is_input_of_type(n, "password"),
        "image" => |n| is_input_of_type(n, "image"),
        "submit" => |n| is_one_of(n, &["input", "button"]) && input_type(n) == "submit",
        "reset" => |n| is_one_of(n, &["input", "button"]) && input_type(n) == "reset",
        "enabled" => |n| is_form_control(n) && !n.has_attribute("disabled"),
        "disabled" => |n| is_form_control(n) && n.has_attribute("disabled"),
        "checked" => |n| {
            (is_one_of(n, &["input"]) && n.has_attribute("checked"))
                || (is_one_of(n, &["option"]) && n.has_attribute("selected"))
        },
        "selected" => |n| is_one_of(n, &["option"]) && n.has_attribute("selected"),
        _ => return None,
    };
    Some(test)
}

fn is_root(node: &Node) -> bool {
    node.parent()
        .map(|p| p.node_type() == NodeType::Document)
        .unwrap_or(false)
}

/// No element or text children; comments do not count
fn is_empty(node: &Node) -> bool {
    !node
        .children()
        .iter()
        .any(|c| matches!(c.node_type(), NodeType::Element | NodeType::Text))
}

fn is_header(node: &Node) -> bool {
    is_one_of(node, &["h1", "h2", "h3", "h4", "h5", "h6"])
}

fn is_one_of(node: &Node, names: &[&str]) -> bool {
    node.local_name()
        .map(|local| names.iter().any(|n| local.eq_ignore_ascii_case(n)))
        .unwrap_or(false)
}

fn is_form_control(node: &Node) -> bool {
    is_one_of(
        node,
        &["input", "button", "select", "textarea", "option", "optgroup", "fieldset"],
    )
}

/// Effective `type` of an input or button, with the element defaults
fn input_type(node: &Node) -> String {
    match node.get_attribute("type") {
        Some(t) => t.to_lowercase(),
        None if is_one_of(node, &["button"]) => "submit".to_string(),
        None => "text".to_string(),
    }
}

fn is_input_of_type(node: &Node, kind: &str) -> bool {
    is_one_of(node, &["input"]) && input_type(node) == kind
}
