// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! CSS selector engine
//!
//! Selectors are tokenized, compiled into matcher closures and run against
//! the DOM right to left. Compiled selectors are cached per engine.

mod cache;
mod compiler;
mod config;
mod engine;
mod filter;
mod matcher;
pub mod order;
mod pseudo;
mod token;
mod tokenizer;

pub use cache::BoundedCache;
pub use compiler::CompiledSelector;
pub use config::{EngineConfig, DEFAULT_CACHE_SIZE, DEFAULT_MAX_NESTING};
pub use engine::{Engine, EngineStats};
pub use filter::attribute_value_matches;
pub use matcher::{ElementMatcher, Matcher, ScanContext, Scope, SetPredicate};
pub use order::{document_order, unique_sort};
pub use pseudo::{is_supported as is_supported_pseudo, Position};
pub use token::{
    to_selector, AttrOperator, AttributeTest, ChildPosition, ChildTest, Combinator, NthPattern, Token,
    TokenGroup, TokenKind, TokenType,
};
pub use tokenizer::{is_identifier, tokenize, unescape};
