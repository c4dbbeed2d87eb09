// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! DOM Node types

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

/// Unique node identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u64);

impl NodeId {
    /// Create a new unique node ID
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

/// Node type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    /// Document node
    Document,
    /// Element node (like <div>, <p>, etc.)
    Element,
    /// Text node
    Text,
    /// Comment node
    Comment,
    /// Document type node (<!DOCTYPE>)
    DocumentType,
    /// Processing instruction
    ProcessingInstruction,
    /// Document fragment
    DocumentFragment,
}

/// Internal node data
#[derive(Debug)]
pub struct NodeData {
    /// Node type
    pub node_type: NodeType,
    /// Tag name (for elements)
    pub tag_name: Option<String>,
    /// Text content (for text/comment nodes)
    pub text_content: Option<String>,
    /// Attributes in source order (for elements)
    pub attributes: Vec<(String, String)>,
    /// Parent node ID
    pub parent: Option<NodeId>,
    /// Child node IDs
    pub children: Vec<NodeId>,
    /// Previous sibling ID
    pub prev_sibling: Option<NodeId>,
    /// Next sibling ID
    pub next_sibling: Option<NodeId>,
}

impl NodeData {
    fn blank(node_type: NodeType) -> Self {
        Self {
            node_type,
            tag_name: None,
            text_content: None,
            attributes: Vec::new(),
            parent: None,
            children: Vec::new(),
            prev_sibling: None,
            next_sibling: None,
        }
    }

    /// Create a new element node data. HTML names are stored lowercase.
    pub fn element(tag_name: impl Into<String>, xml: bool) -> Self {
        let tag_name = tag_name.into();
        let mut data = Self::blank(NodeType::Element);
        data.tag_name = Some(if xml { tag_name } else { tag_name.to_lowercase() });
        data
    }

    /// Create a new text node data
    pub fn text(content: impl Into<String>) -> Self {
        let mut data = Self::blank(NodeType::Text);
        data.text_content = Some(content.into());
        data
    }

    /// Create a new comment node data
    pub fn comment(content: impl Into<String>) -> Self {
        let mut data = Self::blank(NodeType::Comment);
        data.text_content = Some(content.into());
        data
    }

    /// Create a new document node data
    pub fn document() -> Self {
        Self::blank(NodeType::Document)
    }

    /// Create a new document fragment node data
    pub fn fragment() -> Self {
        Self::blank(NodeType::DocumentFragment)
    }
}

/// Node storage shared by every node of one document
#[derive(Debug)]
pub(crate) struct Tree {
    pub(crate) nodes: RwLock<HashMap<NodeId, NodeData>>,
    /// XML trees compare names case-sensitively
    xml: bool,
}

impl Tree {
    pub(crate) fn new(xml: bool) -> Self {
        Self {
            nodes: RwLock::new(HashMap::new()),
            xml,
        }
    }

    pub(crate) fn is_xml(&self) -> bool {
        self.xml
    }
}

/// A reference to a node in the DOM tree
#[derive(Debug, Clone)]
pub struct Node {
    /// Node ID
    pub id: NodeId,
    /// Reference to document's node storage
    tree: Arc<Tree>,
}

impl Node {
    /// Create a new node reference
    pub(crate) fn new(id: NodeId, tree: Arc<Tree>) -> Self {
        Self { id, tree }
    }

    fn wrap(&self, id: NodeId) -> Node {
        Node::new(id, self.tree.clone())
    }

    fn related(&self, pick: impl FnOnce(&NodeData) -> Option<NodeId>) -> Option<Node> {
        self.tree
            .nodes
            .read()
            .get(&self.id)
            .and_then(pick)
            .map(|id| self.wrap(id))
    }

    fn normalize_name(&self, name: &str) -> String {
        if self.tree.is_xml() {
            name.to_string()
        } else {
            name.to_lowercase()
        }
    }

    /// Check if this node belongs to an XML document
    pub fn is_xml(&self) -> bool {
        self.tree.is_xml()
    }

    /// Get the node type
    pub fn node_type(&self) -> NodeType {
        self.tree
            .nodes
            .read()
            .get(&self.id)
            .map(|n| n.node_type)
            .unwrap_or(NodeType::Element)
    }

    /// Get the tag name (uppercase for HTML, like browsers)
    pub fn tag_name(&self) -> Option<String> {
        self.local_name().map(|t| {
            if self.is_xml() {
                t
            } else {
                t.to_uppercase()
            }
        })
    }

    /// Get the tag name as stored (lowercase for HTML)
    pub fn local_name(&self) -> Option<String> {
        self.tree
            .nodes
            .read()
            .get(&self.id)
            .and_then(|n| n.tag_name.clone())
    }

    /// Get text content
    pub fn text_content(&self) -> String {
        let nodes = self.tree.nodes.read();
        collect_text_content(&nodes, self.id)
    }

    /// Set text content (replaces all children with a text node)
    pub fn set_text_content(&self, content: impl Into<String>) {
        let content = content.into();
        let mut nodes = self.tree.nodes.write();

        let is_text = match nodes.get(&self.id) {
            Some(node) => node.node_type == NodeType::Text,
            None => return,
        };
        if is_text {
            if let Some(node) = nodes.get_mut(&self.id) {
                node.text_content = Some(content);
            }
            return;
        }

        let old_children = nodes
            .get_mut(&self.id)
            .map(|n| std::mem::take(&mut n.children))
            .unwrap_or_default();
        for child_id in old_children {
            if let Some(child) = nodes.get_mut(&child_id) {
                child.parent = None;
                child.prev_sibling = None;
                child.next_sibling = None;
            }
        }

        let text_id = NodeId::new();
        let mut text_data = NodeData::text(content);
        text_data.parent = Some(self.id);
        nodes.insert(text_id, text_data);
        if let Some(parent) = nodes.get_mut(&self.id) {
            parent.children.push(text_id);
        }
    }

    /// Get an attribute value
    pub fn get_attribute(&self, name: &str) -> Option<String> {
        let name = self.normalize_name(name);
        self.tree.nodes.read().get(&self.id).and_then(|n| {
            n.attributes
                .iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| v.clone())
        })
    }

    /// Set an attribute value
    pub fn set_attribute(&self, name: impl AsRef<str>, value: impl Into<String>) {
        let name = self.normalize_name(name.as_ref());
        let value = value.into();
        if let Some(node) = self.tree.nodes.write().get_mut(&self.id) {
            match node.attributes.iter_mut().find(|(k, _)| *k == name) {
                Some(slot) => slot.1 = value,
                None => node.attributes.push((name, value)),
            }
        }
    }

    /// Check if has an attribute
    pub fn has_attribute(&self, name: &str) -> bool {
        self.get_attribute(name).is_some()
    }

    /// Get all attributes in source order
    pub fn attributes(&self) -> Vec<(String, String)> {
        self.tree
            .nodes
            .read()
            .get(&self.id)
            .map(|n| n.attributes.clone())
            .unwrap_or_default()
    }

    /// Get parent node
    pub fn parent(&self) -> Option<Node> {
        self.related(|n| n.parent)
    }

    /// Get child nodes
    pub fn children(&self) -> Vec<Node> {
        self.tree
            .nodes
            .read()
            .get(&self.id)
            .map(|n| n.children.iter().map(|&id| self.wrap(id)).collect())
            .unwrap_or_default()
    }

    /// Get child element nodes
    pub fn element_children(&self) -> Vec<Node> {
        let nodes = self.tree.nodes.read();
        nodes
            .get(&self.id)
            .map(|n| {
                n.children
                    .iter()
                    .filter(|id| is_element_id(&nodes, **id))
                    .map(|&id| self.wrap(id))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Get next sibling
    pub fn next_sibling(&self) -> Option<Node> {
        self.related(|n| n.next_sibling)
    }

    /// Get previous sibling
    pub fn prev_sibling(&self) -> Option<Node> {
        self.related(|n| n.prev_sibling)
    }

    /// Get the nearest following sibling that is an element
    pub fn next_element_sibling(&self) -> Option<Node> {
        let nodes = self.tree.nodes.read();
        let mut cur = nodes.get(&self.id).and_then(|n| n.next_sibling);
        while let Some(id) = cur {
            if is_element_id(&nodes, id) {
                return Some(self.wrap(id));
            }
            cur = nodes.get(&id).and_then(|n| n.next_sibling);
        }
        None
    }

    /// Get the nearest preceding sibling that is an element
    pub fn prev_element_sibling(&self) -> Option<Node> {
        let nodes = self.tree.nodes.read();
        let mut cur = nodes.get(&self.id).and_then(|n| n.prev_sibling);
        while let Some(id) = cur {
            if is_element_id(&nodes, id) {
                return Some(self.wrap(id));
            }
            cur = nodes.get(&id).and_then(|n| n.prev_sibling);
        }
        None
    }

    /// Position among the parent's children, if attached
    pub fn index(&self) -> Option<usize> {
        let nodes = self.tree.nodes.read();
        let parent = nodes.get(&self.id)?.parent?;
        nodes
            .get(&parent)?
            .children
            .iter()
            .position(|&id| id == self.id)
    }

    /// Ancestors from the parent upwards
    pub fn ancestors(&self) -> Vec<Node> {
        let nodes = self.tree.nodes.read();
        let mut out = Vec::new();
        let mut cur = nodes.get(&self.id).and_then(|n| n.parent);
        while let Some(id) = cur {
            out.push(self.wrap(id));
            cur = nodes.get(&id).and_then(|n| n.parent);
        }
        out
    }

    /// Topmost ancestor (the document node for attached nodes)
    pub fn root(&self) -> Node {
        self.ancestors().pop().unwrap_or_else(|| self.clone())
    }

    /// Check whether `other` is a strict descendant of this node
    pub fn contains(&self, other: &Node) -> bool {
        if !Arc::ptr_eq(&self.tree, &other.tree) {
            return false;
        }
        let nodes = self.tree.nodes.read();
        let mut cur = nodes.get(&other.id).and_then(|n| n.parent);
        while let Some(id) = cur {
            if id == self.id {
                return true;
            }
            cur = nodes.get(&id).and_then(|n| n.parent);
        }
        false
    }

    /// All descendant elements in document (pre-)order, excluding self
    pub fn descendant_elements(&self) -> Vec<Node> {
        let nodes = self.tree.nodes.read();
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = nodes
            .get(&self.id)
            .map(|n| n.children.iter().rev().copied().collect())
            .unwrap_or_default();

        while let Some(id) = stack.pop() {
            if let Some(data) = nodes.get(&id) {
                if data.node_type == NodeType::Element {
                    out.push(self.wrap(id));
                }
                stack.extend(data.children.iter().rev().copied());
            }
        }
        out
    }

    /// First descendant element carrying the given id
    pub fn get_element_by_id(&self, id: &str) -> Option<Node> {
        self.descendant_elements()
            .into_iter()
            .find(|n| n.get_attribute("id").as_deref() == Some(id))
    }

    /// Descendant elements with the given tag name (`*` for all)
    pub fn get_elements_by_tag_name(&self, tag: &str) -> Vec<Node> {
        let all = self.descendant_elements();
        if tag == "*" {
            return all;
        }
        let tag = self.normalize_name(tag);
        all.into_iter()
            .filter(|n| n.local_name().as_deref() == Some(tag.as_str()))
            .collect()
    }

    /// Descendant elements whose class list contains `class`
    pub fn get_elements_by_class_name(&self, class: &str) -> Vec<Node> {
        self.descendant_elements()
            .into_iter()
            .filter(|n| {
                n.get_attribute("class")
                    .map(|c| html_words(&c).any(|c| c == class))
                    .unwrap_or(false)
            })
            .collect()
    }

    /// Class names of this element, split on HTML whitespace
    pub fn class_list(&self) -> Vec<String> {
        self.get_attribute("class")
            .map(|c| html_words(&c).map(String::from).collect())
            .unwrap_or_default()
    }

    /// Check if this is an element node
    pub fn is_element(&self) -> bool {
        self.node_type() == NodeType::Element
    }

    /// Check if this is a text node
    pub fn is_text(&self) -> bool {
        self.node_type() == NodeType::Text
    }

    /// Append a child node
    pub fn append_child(&self, child: &Node) {
        let mut nodes = self.tree.nodes.write();

        // Collect info needed for updates
        let old_parent_id = nodes.get(&child.id).and_then(|d| d.parent);
        if old_parent_id.is_some() {
            unlink(&mut nodes, child.id);
        }
        let last_child_id = nodes.get(&self.id).and_then(|d| d.children.last().copied());

        // Update child's parent and reset siblings
        if let Some(child_data) = nodes.get_mut(&child.id) {
            child_data.parent = Some(self.id);
            child_data.prev_sibling = last_child_id;
            child_data.next_sibling = None;
        }

        // Update last child's next_sibling
        if let Some(last_id) = last_child_id {
            if let Some(last_child) = nodes.get_mut(&last_id) {
                last_child.next_sibling = Some(child.id);
            }
        }

        // Add to parent's children
        if let Some(parent_data) = nodes.get_mut(&self.id) {
            parent_data.children.push(child.id);
        }
    }

    /// Remove a child node
    pub fn remove_child(&self, child: &Node) {
        let mut nodes = self.tree.nodes.write();
        let is_child = nodes.get(&child.id).and_then(|d| d.parent) == Some(self.id);
        if is_child {
            unlink(&mut nodes, child.id);
        }
    }

    /// Get outer HTML
    pub fn outer_html(&self) -> String {
        let nodes = self.tree.nodes.read();
        serialize_node(&nodes, self.id)
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Node {}

impl std::hash::Hash for Node {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

fn is_element_id(nodes: &HashMap<NodeId, NodeData>, id: NodeId) -> bool {
    nodes
        .get(&id)
        .map(|d| d.node_type == NodeType::Element)
        .unwrap_or(false)
}

/// Detach a node from its parent and fix up sibling links
fn unlink(nodes: &mut HashMap<NodeId, NodeData>, id: NodeId) {
    let (parent, prev, next) = match nodes.get(&id) {
        Some(d) => (d.parent, d.prev_sibling, d.next_sibling),
        None => return,
    };

    if let Some(prev_id) = prev {
        if let Some(prev_node) = nodes.get_mut(&prev_id) {
            prev_node.next_sibling = next;
        }
    }
    if let Some(next_id) = next {
        if let Some(next_node) = nodes.get_mut(&next_id) {
            next_node.prev_sibling = prev;
        }
    }
    if let Some(parent_id) = parent {
        if let Some(parent_data) = nodes.get_mut(&parent_id) {
            parent_data.children.retain(|&c| c != id);
        }
    }
    if let Some(data) = nodes.get_mut(&id) {
        data.parent = None;
        data.prev_sibling = None;
        data.next_sibling = None;
    }
}

/// Recursively collect text content
/// Words of an attribute value separated by HTML (ASCII) whitespace
pub(crate) fn html_words(value: &str) -> impl Iterator<Item = &str> {
    value
        .split(|c: char| c.is_ascii_whitespace())
        .filter(|w| !w.is_empty())
}

fn collect_text_content(nodes: &HashMap<NodeId, NodeData>, node_id: NodeId) -> String {
    match nodes.get(&node_id) {
        Some(node) => match node.node_type {
            NodeType::Text => node.text_content.clone().unwrap_or_default(),
            NodeType::Element | NodeType::Document | NodeType::DocumentFragment => node
                .children
                .iter()
                .map(|&child_id| collect_text_content(nodes, child_id))
                .collect(),
            _ => String::new(),
        },
        None => String::new(),
    }
}

/// Serialize a node to HTML string
fn serialize_node(nodes: &HashMap<NodeId, NodeData>, node_id: NodeId) -> String {
    let Some(node) = nodes.get(&node_id) else {
        return String::new();
    };
    match node.node_type {
        NodeType::Text => html_escape(node.text_content.as_deref().unwrap_or("")),
        NodeType::Comment => {
            format!("<!--{}-->", node.text_content.as_deref().unwrap_or(""))
        }
        NodeType::Element => {
            let tag = node.tag_name.as_deref().unwrap_or("div");
            let attrs: String = node
                .attributes
                .iter()
                .map(|(k, v)| {
                    if v.is_empty() {
                        format!(" {}", k)
                    } else {
                        format!(" {}=\"{}\"", k, html_escape(v))
                    }
                })
                .collect();

            // Void elements
            let void_elements = [
                "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta",
                "param", "source", "track", "wbr",
            ];

            if void_elements.contains(&tag) {
                format!("<{}{}>", tag, attrs)
            } else {
                let children: String = node
                    .children
                    .iter()
                    .map(|&id| serialize_node(nodes, id))
                    .collect();
                format!("<{}{}>{}</{}>", tag, attrs, children, tag)
            }
        }
        NodeType::Document | NodeType::DocumentFragment => node
            .children
            .iter()
            .map(|&id| serialize_node(nodes, id))
            .collect(),
        NodeType::DocumentType => "<!DOCTYPE html>".to_string(),
        NodeType::ProcessingInstruction => String::new(),
    }
}

/// Escape HTML special characters
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;

    #[test]
    fn test_node_id() {
        let id1 = NodeId::new();
        let id2 = NodeId::new();
        assert_ne!(id1, id2);
        assert!(id1 < id2);
    }

    #[test]
    fn test_node_data() {
        let element = NodeData::element("DIV", false);
        assert_eq!(element.tag_name, Some("div".to_string()));
        assert_eq!(element.node_type, NodeType::Element);

        let xml_element = NodeData::element("Item", true);
        assert_eq!(xml_element.tag_name, Some("Item".to_string()));

        let text = NodeData::text("Hello");
        assert_eq!(text.text_content, Some("Hello".to_string()));
        assert_eq!(text.node_type, NodeType::Text);
    }

    #[test]
    fn test_sibling_links() {
        let doc = Document::new();
        let ul = doc.create_element("ul");
        let a = doc.create_element("li");
        let text = doc.create_text_node(" ");
        let b = doc.create_element("li");
        doc.root().append_child(&ul);
        ul.append_child(&a);
        ul.append_child(&text);
        ul.append_child(&b);

        assert_eq!(b.prev_element_sibling(), Some(a.clone()));
        assert_eq!(a.next_element_sibling(), Some(b.clone()));
        assert_eq!(b.prev_sibling(), Some(text.clone()));
        assert_eq!(b.index(), Some(2));

        ul.remove_child(&text);
        assert_eq!(b.prev_sibling(), Some(a.clone()));
        assert!(text.parent().is_none());
    }

    #[test]
    fn test_reparenting_unlinks() {
        let doc = Document::new();
        let first = doc.create_element("div");
        let second = doc.create_element("div");
        let child = doc.create_element("span");
        doc.root().append_child(&first);
        doc.root().append_child(&second);
        first.append_child(&child);

        second.append_child(&child);

        assert!(first.children().is_empty());
        assert_eq!(child.parent(), Some(second.clone()));
        assert!(second.contains(&child));
        assert!(!first.contains(&child));
    }

    #[test]
    fn test_descendants_in_document_order() {
        let doc = Document::new();
        let html = doc.create_element("html");
        let head = doc.create_element("head");
        let body = doc.create_element("body");
        let p = doc.create_element("p");
        doc.root().append_child(&html);
        html.append_child(&head);
        html.append_child(&body);
        body.append_child(&p);

        let all = doc.root().descendant_elements();
        assert_eq!(all, vec![html.clone(), head, body, p.clone()]);
        assert_eq!(p.root(), doc.root());
        assert!(doc.root().contains(&p));
        assert!(!p.contains(&p));
    }

    #[test]
    fn test_attribute_case() {
        let doc = Document::new();
        let div = doc.create_element("div");
        div.set_attribute("Data-Role", "main");
        assert_eq!(div.get_attribute("data-role"), Some("main".to_string()));

        let xml = Document::new_xml();
        let item = xml.create_element("Item");
        item.set_attribute("Key", "v");
        assert_eq!(item.get_attribute("Key"), Some("v".to_string()));
        assert_eq!(item.get_attribute("key"), None);
        assert_eq!(item.tag_name(), Some("Item".to_string()));
    }

    #[test]
    fn test_text_content() {
        let doc = Document::new();
        let p = doc.create_element("p");
        p.set_text_content("a < b");
        assert_eq!(p.text_content(), "a < b");
        assert_eq!(p.outer_html(), "<p>a &lt; b</p>");
    }

    #[test]
    fn test_class_words_split_on_ascii_whitespace() {
        let doc = Document::new();
        let p = doc.create_element("p");
        p.set_attribute("class", "x\u{a0}y\t z\x0cw");
        doc.root().append_child(&p);

        assert_eq!(p.class_list(), vec!["x\u{a0}y", "z", "w"]);
        assert!(doc.root().get_elements_by_class_name("x").is_empty());
        assert_eq!(doc.root().get_elements_by_class_name("w"), vec![p.clone()]);
    }
}
