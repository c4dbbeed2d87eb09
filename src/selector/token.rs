// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Selector tokens
//!
//! Token payloads are already normalized by the tokenizer's pre-filters:
//! escapes are resolved and `nth-*` arguments are reduced to a step/offset
//! pair.

use serde::Serialize;

/// Combinator between compound selectors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Combinator {
    /// Descendant (whitespace)
    Descendant,
    /// Child (>)
    Child,
    /// Adjacent sibling (+)
    Adjacent,
    /// General sibling (~)
    General,
}

impl Combinator {
    /// Map a combinator character; any whitespace is a descendant combinator
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '>' => Some(Combinator::Child),
            '+' => Some(Combinator::Adjacent),
            '~' => Some(Combinator::General),
            ' ' | '\t' | '\r' | '\n' | '\x0c' => Some(Combinator::Descendant),
            _ => None,
        }
    }

    /// Canonical text of the combinator
    pub fn as_str(&self) -> &'static str {
        match self {
            Combinator::Descendant => " ",
            Combinator::Child => ">",
            Combinator::Adjacent => "+",
            Combinator::General => "~",
        }
    }

    /// Whether the combinator moves across siblings instead of ancestors
    pub fn is_sibling(&self) -> bool {
        matches!(self, Combinator::Adjacent | Combinator::General)
    }

    /// Whether only the immediate parent / previous sibling is checked
    pub fn is_immediate(&self) -> bool {
        matches!(self, Combinator::Child | Combinator::Adjacent)
    }
}

/// Token type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TokenType {
    Tag,
    Id,
    Class,
    Attribute,
    Pseudo,
    Child,
    Combinator(Combinator),
}

/// Attribute selector operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttrOperator {
    /// [attr=value] - exact match
    Equals,
    /// [attr!=value] - not equal (or missing)
    NotEquals,
    /// [attr^=value] - starts with
    Prefix,
    /// [attr*=value] - contains substring
    Substring,
    /// [attr$=value] - ends with
    Suffix,
    /// [attr~=value] - word in space-separated list
    Includes,
    /// [attr|=value] - exact or prefix with hyphen
    DashMatch,
}

impl AttrOperator {
    /// Parse the operator text captured by the tokenizer
    pub fn parse(op: &str) -> Option<Self> {
        match op {
            "=" => Some(AttrOperator::Equals),
            "!=" => Some(AttrOperator::NotEquals),
            "^=" => Some(AttrOperator::Prefix),
            "*=" => Some(AttrOperator::Substring),
            "$=" => Some(AttrOperator::Suffix),
            "~=" => Some(AttrOperator::Includes),
            "|=" => Some(AttrOperator::DashMatch),
            _ => None,
        }
    }
}

/// Attribute test; `operator == None` is a presence check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeTest {
    pub name: String,
    pub operator: Option<AttrOperator>,
    pub value: String,
}

/// Which structural child pseudo-class a token is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChildPosition {
    First,
    Last,
    Only,
    Nth,
    NthLast,
}

impl ChildPosition {
    /// Parse the `only|first|last|nth|nth-last` prefix
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "first" => Some(ChildPosition::First),
            "last" => Some(ChildPosition::Last),
            "only" => Some(ChildPosition::Only),
            "nth" => Some(ChildPosition::Nth),
            "nth-last" => Some(ChildPosition::NthLast),
            _ => None,
        }
    }

    /// `first`/`last`/`only` need no ordinal, just a sibling walk
    pub fn is_simple(&self) -> bool {
        !matches!(self, ChildPosition::Nth | ChildPosition::NthLast)
    }

    /// Counting starts from the first child
    pub fn is_forward(&self) -> bool {
        !matches!(self, ChildPosition::Last | ChildPosition::NthLast)
    }
}

/// `an+b` reduced to a cycle length and an offset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NthPattern {
    pub step: i64,
    pub offset: i64,
}

impl NthPattern {
    pub const fn new(step: i64, offset: i64) -> Self {
        Self { step, offset }
    }

    /// Test a 1-based ordinal; step 0 matches exactly `ordinal == offset`
    pub fn matches(&self, ordinal: i64) -> bool {
        // any i64 step or offset fits in i128 without overflow
        let diff = i128::from(ordinal) - i128::from(self.offset);
        let step = i128::from(self.step);
        if step == 0 {
            diff == 0
        } else {
            diff % step == 0 && diff / step >= 0
        }
    }

    /// `:nth-child(n)` matches every element with a parent
    pub fn matches_all(&self) -> bool {
        self.step == 1 && self.offset == 0
    }
}

/// Structural child pseudo-class
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChildTest {
    pub position: ChildPosition,
    pub of_type: bool,
    pub nth: Option<NthPattern>,
}

/// Structured token payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Tag(String),
    Id(String),
    Class(String),
    Attribute(AttributeTest),
    Child(ChildTest),
    Pseudo {
        name: String,
        argument: Option<String>,
    },
    Combinator(Combinator),
}

/// One parsed unit of a selector
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    /// Raw matched text
    pub value: String,
    pub kind: TokenKind,
}

impl Token {
    pub fn new(value: impl Into<String>, kind: TokenKind) -> Self {
        Self {
            value: value.into(),
            kind,
        }
    }

    pub fn token_type(&self) -> TokenType {
        match &self.kind {
            TokenKind::Tag(_) => TokenType::Tag,
            TokenKind::Id(_) => TokenType::Id,
            TokenKind::Class(_) => TokenType::Class,
            TokenKind::Attribute(_) => TokenType::Attribute,
            TokenKind::Child(_) => TokenType::Child,
            TokenKind::Pseudo { .. } => TokenType::Pseudo,
            TokenKind::Combinator(c) => TokenType::Combinator(*c),
        }
    }

    pub fn combinator(&self) -> Option<Combinator> {
        match self.kind {
            TokenKind::Combinator(c) => Some(c),
            _ => None,
        }
    }
}

/// One comma-separated alternative of a selector
pub type TokenGroup = Vec<Token>;

/// Rebuild selector text from tokens
pub fn to_selector(tokens: &[Token]) -> String {
    tokens.iter().map(|t| t.value.as_str()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nth_pattern() {
        let odd = NthPattern::new(2, 1);
        assert!(odd.matches(1));
        assert!(!odd.matches(2));
        assert!(odd.matches(3));

        let even = NthPattern::new(2, 0);
        assert!(!even.matches(1));
        assert!(even.matches(2));

        let third = NthPattern::new(0, 3);
        assert!(third.matches(3));
        assert!(!third.matches(6));

        let first_three = NthPattern::new(-1, 3);
        assert!(first_three.matches(1));
        assert!(first_three.matches(3));
        assert!(!first_three.matches(4));

        let none = NthPattern::new(0, 0);
        assert!((1..10).all(|i| !none.matches(i)));

        assert!(NthPattern::new(1, 0).matches_all());
    }

    #[test]
    fn test_nth_pattern_extreme_values() {
        let far = NthPattern::new(1, i64::MIN);
        assert!(far.matches(1));
        assert!(far.matches(i64::MAX));

        let min_step = NthPattern::new(i64::MIN, 1);
        assert!(min_step.matches(1));
        assert!(!min_step.matches(2));

        assert!(!NthPattern::new(-1, i64::MIN).matches(1));
        assert!(NthPattern::new(0, i64::MAX).matches(i64::MAX));
    }

    #[test]
    fn test_combinator_chars() {
        assert_eq!(Combinator::from_char('\t'), Some(Combinator::Descendant));
        assert_eq!(Combinator::from_char('~'), Some(Combinator::General));
        assert_eq!(Combinator::from_char('a'), None);
        assert!(Combinator::Adjacent.is_sibling());
        assert!(Combinator::Adjacent.is_immediate());
        assert!(!Combinator::Descendant.is_immediate());
    }

    #[test]
    fn test_child_position() {
        assert!(ChildPosition::parse("only").unwrap().is_simple());
        assert!(!ChildPosition::parse("nth-last").unwrap().is_forward());
        assert!(ChildPosition::parse("middle").is_none());
    }

    #[test]
    fn test_to_selector() {
        let tokens = vec![
            Token::new("ul", TokenKind::Tag("ul".into())),
            Token::new(" > ", TokenKind::Combinator(Combinator::Child)),
            Token::new(".a", TokenKind::Class("a".into())),
        ];
        assert_eq!(to_selector(&tokens), "ul > .a");
        assert_eq!(tokens[1].token_type(), TokenType::Combinator(Combinator::Child));
    }
}
