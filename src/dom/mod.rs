// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! DOM tree consumed by the selector engine
//!
//! Provides a DOM-like interface built on top of html5ever.

mod document;
mod node;
mod parser;

pub use document::Document;
pub(crate) use node::html_words;
pub use node::{Node, NodeData, NodeId, NodeType};
pub use parser::{parse_fragment, parse_html, parse_html_file, parse_html_with_engine};
