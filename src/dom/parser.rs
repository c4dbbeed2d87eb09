// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! HTML parser using html5ever

use std::path::Path;
use std::sync::Arc;

use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use html5ever::tree_builder::TreeBuilderOpts;
use html5ever::ParseOpts;
use markup5ever_rcdom::{Handle, NodeData as RcNodeData, RcDom};

use super::document::Document;
use super::node::{Node, NodeData, NodeType};
use crate::error::{Error, ErrorContext, Result};
use crate::selector::Engine;

/// Parse HTML string into a Document
pub fn parse_html(html: &str) -> Result<Document> {
    parse_html_into(html, Document::new())
}

/// Parse HTML string into a Document bound to an existing engine
pub fn parse_html_with_engine(html: &str, engine: Arc<Engine>) -> Result<Document> {
    parse_html_into(html, Document::with_engine(engine))
}

/// Read and parse an HTML file
pub fn parse_html_file(path: impl AsRef<Path>) -> Result<Document> {
    let path = path.as_ref();
    let html = std::fs::read_to_string(path).context(&format!("reading {}", path.display()))?;
    parse_html(&html)
}

fn parse_html_into(html: &str, doc: Document) -> Result<Document> {
    let opts = ParseOpts {
        tree_builder: TreeBuilderOpts {
            drop_doctype: false,
            ..Default::default()
        },
        ..Default::default()
    };

    let dom = parse_document(RcDom::default(), opts)
        .from_utf8()
        .read_from(&mut html.as_bytes())
        .map_err(|e| Error::HtmlParse(e.to_string()))?;

    // Convert html5ever DOM to our DOM
    let converter = DomConverter::new(&doc);
    converter.convert(&dom.document);

    tracing::trace!(elements = doc.element_count(), "Parsed HTML document");
    Ok(doc)
}

/// Converts html5ever DOM to our DOM
struct DomConverter<'a> {
    doc: &'a Document,
}

impl<'a> DomConverter<'a> {
    fn new(doc: &'a Document) -> Self {
        Self { doc }
    }

    fn convert(self, handle: &Handle) {
        let root = self.doc.root();
        for child in handle.children.borrow().iter() {
            self.convert_node(child, &root);
        }
    }

    fn convert_node(&self, handle: &Handle, parent: &Node) {
        let node_data = match handle.data {
            RcNodeData::Document => {
                // Skip document node, we already have one
                return;
            }
            RcNodeData::Doctype { .. } => {
                let mut data = NodeData::document();
                data.node_type = NodeType::DocumentType;
                data
            }
            RcNodeData::Text { ref contents } => NodeData::text(contents.borrow().to_string()),
            RcNodeData::Comment { ref contents } => NodeData::comment(contents.to_string()),
            RcNodeData::Element {
                ref name,
                ref attrs,
                ..
            } => {
                let mut data = NodeData::element(name.local.to_string(), false);

                // Add attributes
                for attr in attrs.borrow().iter() {
                    data.attributes
                        .push((attr.name.local.to_string(), attr.value.to_string()));
                }

                data
            }
            RcNodeData::ProcessingInstruction { .. } => {
                // Skip processing instructions
                return;
            }
        };

        let node = self.doc.insert(node_data);
        parent.append_child(&node);

        // Convert children
        for child in handle.children.borrow().iter() {
            self.convert_node(child, &node);
        }
    }
}

/// Parse HTML fragment; returns the top-level nodes of the fragment
pub fn parse_fragment(html: &str) -> Result<Vec<Node>> {
    let doc = parse_html(&format!("<div>{}</div>", html))?;
    match doc.query_selector("body > div")? {
        Some(wrapper) => Ok(wrapper.children()),
        None => Ok(vec![]),
    }
}
