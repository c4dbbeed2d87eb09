// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Document representation

use std::sync::Arc;

use super::node::{Node, NodeData, NodeId, NodeType, Tree};
use crate::error::Result;
use crate::selector::Engine;

/// Document: node storage plus the selector engine used to query it
#[derive(Debug, Clone)]
pub struct Document {
    /// Root node ID
    root_id: NodeId,
    /// Node storage
    pub(crate) tree: Arc<Tree>,
    /// Selector engine shared by every query on this document
    engine: Arc<Engine>,
}

impl Document {
    /// Create a new empty HTML document
    pub fn new() -> Self {
        Self::build(false, Arc::new(Engine::default()))
    }

    /// Create a new empty XML document (case-sensitive names)
    pub fn new_xml() -> Self {
        Self::build(true, Arc::new(Engine::default()))
    }

    /// Create an HTML document sharing an existing engine
    pub fn with_engine(engine: Arc<Engine>) -> Self {
        Self::build(false, engine)
    }

    fn build(xml: bool, engine: Arc<Engine>) -> Self {
        let root_id = NodeId::new();
        let tree = Tree::new(xml);
        tree.nodes.write().insert(root_id, NodeData::document());

        Self {
            root_id,
            tree: Arc::new(tree),
            engine,
        }
    }

    /// Whether this is an XML document
    pub fn is_xml(&self) -> bool {
        self.tree.is_xml()
    }

    /// The selector engine bound to this document
    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    /// Get the root node
    pub fn root(&self) -> Node {
        Node::new(self.root_id, self.tree.clone())
    }

    /// Get the document element (first element child of the root)
    pub fn document_element(&self) -> Option<Node> {
        self.root().element_children().into_iter().next()
    }

    /// Select all matching elements in document order
    pub fn select(&self, selector: &str) -> Result<Vec<Node>> {
        self.engine.select(selector, &self.root())
    }

    /// Query selector - find first matching element
    pub fn query_selector(&self, selector: &str) -> Result<Option<Node>> {
        Ok(self.select(selector)?.into_iter().next())
    }

    /// Check whether a node matches a selector
    pub fn matches(&self, node: &Node, selector: &str) -> Result<bool> {
        self.engine.matches(node, selector)
    }

    /// Keep the nodes of `nodes` that match a selector
    pub fn filter(&self, nodes: &[Node], selector: &str) -> Result<Vec<Node>> {
        self.engine.matches_in_set(nodes, selector)
    }

    /// Get element by ID
    pub fn get_element_by_id(&self, id: &str) -> Option<Node> {
        self.root().get_element_by_id(id)
    }

    /// Create a new element
    pub fn create_element(&self, tag: &str) -> Node {
        self.insert(NodeData::element(tag, self.is_xml()))
    }

    /// Create a text node
    pub fn create_text_node(&self, content: &str) -> Node {
        self.insert(NodeData::text(content))
    }

    /// Create an empty document fragment
    pub fn create_document_fragment(&self) -> Node {
        self.insert(NodeData::fragment())
    }

    pub(crate) fn insert(&self, data: NodeData) -> Node {
        let id = NodeId::new();
        self.tree.nodes.write().insert(id, data);
        Node::new(id, self.tree.clone())
    }

    /// Number of element nodes reachable from the root
    pub fn element_count(&self) -> usize {
        self.root().descendant_elements().len()
    }

    /// Check that the root is a document node
    pub fn is_well_formed(&self) -> bool {
        self.root().node_type() == NodeType::Document
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
