// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Selector tokenizer
//!
//! Consumes the selector left to right. At every position a comma may open a
//! new group, then a combinator may follow, then each simple-selector type is
//! tried once in a fixed order (tag, class, attribute, child, pseudo, id).
//! Raw captures go through the pre-filters below before they become tokens.

use std::borrow::Cow;

use lazy_static::lazy_static;
use regex::{Captures, Regex};

use super::token::{
    AttrOperator, AttributeTest, ChildPosition, ChildTest, Combinator, NthPattern, Token,
    TokenGroup, TokenKind,
};
use crate::error::{Error, Result};

const WS: &str = r"[\x20\t\r\n\x0c]";
const IDENT: &str = r"(?:\\.|[\w-]|[^\x00-\xa0])+";

lazy_static! {
    static ref COMMA: Regex = Regex::new(&format!(r"^{WS}*,{WS}*")).unwrap();
    static ref COMBINATOR: Regex = Regex::new(&format!(r"^{WS}*([>+~]|{WS}){WS}*")).unwrap();
    static ref ID: Regex = Regex::new(&format!(r"^#({IDENT})")).unwrap();
    static ref CLASS: Regex = Regex::new(&format!(r"^\.({IDENT})")).unwrap();
    static ref TAG: Regex = Regex::new(r"^((?:\\.|[\w*-]|[^\x00-\xa0])+)").unwrap();
    static ref ATTR: Regex = Regex::new(&format!(
        r#"^\[{WS}*({IDENT}){WS}*(?:([*^$|!~]?=){WS}*(?:'((?:\\.|[^\\'])*)'|"((?:\\.|[^\\"])*)"|((?:\\.|[\w#-]|[^\x00-\xa0])+))|){WS}*\]"#
    ))
    .unwrap();
    static ref CHILD: Regex = Regex::new(&format!(
        r"(?i)^:(only|first|last|nth|nth-last)-(child|of-type)(?:\({WS}*(even|odd|(([+-]|)(\d*)n|){WS}*(?:([+-]|){WS}*(\d+)|)){WS}*\)|)"
    ))
    .unwrap();
    static ref PSEUDO: Regex = Regex::new(&format!(r"^:({IDENT})")).unwrap();
    static ref UNESCAPE: Regex =
        Regex::new(&format!(r"\\([\da-fA-F]{{1,6}}{WS}?|({WS})|.)")).unwrap();
    static ref IDENTIFIER: Regex = Regex::new(&format!(r"^{IDENT}$")).unwrap();
}

/// Resolve CSS backslash escapes (hex code points and escaped characters)
pub fn unescape(s: &str) -> Cow<'_, str> {
    if !s.contains('\\') {
        return Cow::Borrowed(s);
    }
    UNESCAPE.replace_all(s, |caps: &Captures<'_>| {
        let escaped = &caps[1];
        if caps.get(2).is_some() {
            return escaped.to_string();
        }
        let hex = escaped.trim_end_matches(|c: char| c.is_ascii_whitespace());
        if hex.starts_with(|c: char| c.is_ascii_hexdigit()) {
            let code = u32::from_str_radix(hex, 16).unwrap_or(0);
            let c = match code {
                0 => '\u{FFFD}',
                _ => char::from_u32(code).unwrap_or('\u{FFFD}'),
            };
            c.to_string()
        } else {
            escaped.to_string()
        }
    })
}

/// Check that `s` is a single CSS identifier
pub fn is_identifier(s: &str) -> bool {
    IDENTIFIER.is_match(s)
}

/// Split a selector into token groups
pub fn tokenize(selector: &str) -> Result<Vec<TokenGroup>> {
    let mut groups: Vec<TokenGroup> = Vec::new();
    let mut tokens: TokenGroup = Vec::new();
    let mut rest = selector;
    let mut started = false;

    while !rest.is_empty() {
        if !started {
            started = true;
        } else if let Some(m) = COMMA.find(rest) {
            // A trailing comma leaves the comma unconsumed so it is reported
            let after = &rest[m.end()..];
            if !after.is_empty() {
                rest = after;
            }
            groups.push(close_group(selector, std::mem::take(&mut tokens))?);
        }

        let mut matched = false;

        if let Some(caps) = COMBINATOR.captures(rest) {
            let len = caps[0].len();
            let combinator = caps[1]
                .chars()
                .next()
                .and_then(Combinator::from_char)
                .unwrap_or(Combinator::Descendant);
            if tokens.last().and_then(Token::combinator).is_some() {
                return Err(Error::syntax(selector, rest));
            }
            // trailing whitespace is not a combinator
            if len == rest.len() && combinator == Combinator::Descendant {
                rest = "";
                break;
            }
            tokens.push(Token::new(&rest[..len], TokenKind::Combinator(combinator)));
            rest = &rest[len..];
            matched = true;
        }

        for matcher in TYPE_MATCHERS {
            if let Some((len, kind)) = matcher(rest, selector)? {
                tokens.push(Token::new(&rest[..len], kind));
                rest = &rest[len..];
                matched = true;
            }
        }

        if !matched {
            break;
        }
    }

    if !rest.is_empty() {
        return Err(Error::syntax(selector, rest));
    }
    if started {
        groups.push(close_group(selector, tokens)?);
    }
    Ok(groups)
}

fn close_group(selector: &str, tokens: TokenGroup) -> Result<TokenGroup> {
    match tokens.last() {
        None => Err(Error::syntax(selector, selector)),
        Some(last) if last.combinator().is_some() => {
            Err(Error::syntax(selector, last.value.trim()))
        }
        Some(_) => Ok(tokens),
    }
}

type Matched = Result<Option<(usize, TokenKind)>>;

/// Simple-selector matchers in the order they are tried at each position
const TYPE_MATCHERS: [fn(&str, &str) -> Matched; 6] = [
    match_tag,
    match_class,
    match_attribute,
    match_child,
    match_pseudo,
    match_id,
];

fn match_tag(rest: &str, _selector: &str) -> Matched {
    Ok(TAG
        .captures(rest)
        .map(|caps| (caps[0].len(), TokenKind::Tag(unescape(&caps[1]).into_owned()))))
}

fn match_class(rest: &str, _selector: &str) -> Matched {
    Ok(CLASS
        .captures(rest)
        .map(|caps| (caps[0].len(), TokenKind::Class(unescape(&caps[1]).into_owned()))))
}

fn match_id(rest: &str, _selector: &str) -> Matched {
    Ok(ID
        .captures(rest)
        .map(|caps| (caps[0].len(), TokenKind::Id(unescape(&caps[1]).into_owned()))))
}

/// Attribute pre-filter: pick the quoted or bare value, default to presence
fn match_attribute(rest: &str, _selector: &str) -> Matched {
    let Some(caps) = ATTR.captures(rest) else {
        return Ok(None);
    };
    let operator = caps.get(2).and_then(|m| AttrOperator::parse(m.as_str()));
    let value = caps
        .get(3)
        .or_else(|| caps.get(4))
        .or_else(|| caps.get(5))
        .map(|m| unescape(m.as_str()).into_owned())
        .unwrap_or_default();

    Ok(Some((
        caps[0].len(),
        TokenKind::Attribute(AttributeTest {
            name: unescape(&caps[1]).into_owned(),
            operator,
            value,
        }),
    )))
}

/// Child pre-filter: validate the argument and derive (step, offset)
fn match_child(rest: &str, selector: &str) -> Matched {
    let Some(caps) = CHILD.captures(rest) else {
        return Ok(None);
    };
    let len = caps[0].len();
    // `:first-childish` is a pseudo, not `:first-child` followed by a tag
    let continues_name = rest[len..].starts_with(|c: char| c.is_alphanumeric() || c == '-' || c == '_');
    if caps.get(3).is_none() && continues_name {
        return Ok(None);
    }

    let raw = &rest[..len];
    let position = ChildPosition::parse(&caps[1].to_ascii_lowercase())
        .ok_or_else(|| Error::syntax(selector, raw))?;
    let of_type = caps[2].eq_ignore_ascii_case("of-type");
    let argument = caps.get(3).map(|m| m.as_str().trim().to_ascii_lowercase());

    let nth = match (position.is_simple(), argument) {
        (true, None) => None,
        (true, Some(_)) | (false, None) => return Err(Error::syntax(selector, raw)),
        (false, Some(arg)) => {
            Some(parse_nth(&caps, &arg).ok_or_else(|| Error::syntax(selector, raw))?)
        }
    };

    Ok(Some((len, TokenKind::Child(ChildTest { position, of_type, nth }))))
}

fn parse_nth(caps: &Captures<'_>, arg: &str) -> Option<NthPattern> {
    match arg {
        "even" => return Some(NthPattern::new(2, 0)),
        "odd" => return Some(NthPattern::new(2, 1)),
        _ => {}
    }

    let group = |i: usize| caps.get(i).map(|m| m.as_str()).unwrap_or("");
    let step = if group(4).is_empty() {
        0
    } else {
        let digits = match group(6) {
            "" => "1",
            d => d,
        };
        format!("{}{}", group(5), digits).parse().ok()?
    };
    let offset = match group(8) {
        "" => 0,
        digits => format!("{}{}", group(7), digits).parse().ok()?,
    };
    Some(NthPattern::new(step, offset))
}

/// Pseudo pre-filter: lowercase the name, take a balanced argument
fn match_pseudo(rest: &str, _selector: &str) -> Matched {
    let Some(caps) = PSEUDO.captures(rest) else {
        return Ok(None);
    };
    let name = unescape(&caps[1]).to_lowercase();
    let mut len = caps[0].len();
    let mut argument = None;

    if rest[len..].starts_with('(') {
        if let Some(close) = find_closing_paren(&rest[len..]) {
            let inner = rest[len + 1..len + close].trim();
            argument = Some(unquote(inner).unwrap_or(inner).to_string());
            len += close + 1;
        }
    }

    Ok(Some((len, TokenKind::Pseudo { name, argument })))
}

/// Byte index of the `)` closing the `(` at the start of `s`
fn find_closing_paren(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut chars = s.char_indices();

    while let Some((i, c)) = chars.next() {
        match (quote, c) {
            (_, '\\') => {
                chars.next();
            }
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"') | (None, '\'') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Strip matching quotes when the whole argument is one quoted string
fn unquote(s: &str) -> Option<&str> {
    let quote = s.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let body = &s[1..];
    let mut chars = body.char_indices();
    while let Some((i, c)) = chars.next() {
        if c == '\\' {
            chars.next();
        } else if c == quote {
            return (i + 1 == body.len()).then(|| &body[..i]);
        }
    }
    None
}
