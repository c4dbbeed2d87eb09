// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! # Sizzle - CSS Selector Engine
//!
//! A pure Rust CSS selector engine over an html5ever-backed DOM.
//!
//! ## Features
//!
//! - CSS3 selectors: combinators, attribute operators, `nth-*` structural pseudos
//! - Extensions: `:not`, `:has`, `:contains`, `:lang`, form pseudos
//! - Positional pseudos: `:first`, `:last`, `:eq(n)`, `:lt(n)`, `:gt(n)`, `:even`, `:odd`
//! - Relative selectors from an element context (`> li`, `+ li`, `~ li`)
//! - Results in document order without duplicates
//! - Bounded caches for tokens, compiled selectors and class patterns
//!
//! ## Example
//!
//! ```rust,no_run
//! use sizzle::parse_html;
//!
//! fn main() -> sizzle::Result<()> {
//!     let doc = parse_html(r#"<ul id="list"><li>A</li><li class="sel">B</li></ul>"#)?;
//!
//!     for li in doc.select("#list li:not(.sel)")? {
//!         println!("{}", li.text_content());
//!     }
//!
//!     let b = doc.query_selector("li.sel")?.expect("present");
//!     assert!(doc.matches(&b, "li:nth-last-child(1)")?);
//!     Ok(())
//! }
//! ```

pub mod dom;
pub mod error;
pub mod selector;

// Re-exports for convenience

// DOM
pub use dom::{parse_fragment, parse_html, parse_html_file, parse_html_with_engine};
pub use dom::{Document, Node, NodeId, NodeType};

// Engine
pub use selector::{CompiledSelector, Engine, EngineConfig, EngineStats};

// Tokens
pub use selector::{Combinator, Token, TokenGroup, TokenKind, TokenType};

// Ordering
pub use selector::{document_order, unique_sort};

// Error types
pub use error::{Error, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
