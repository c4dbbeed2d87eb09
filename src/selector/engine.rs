// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Selector engine
//!
//! Owns the caches and scan state shared by every query against it. An
//! engine is `Send + Sync`; caches sit behind short-lived locks that are
//! never held while matchers run.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use lazy_static::lazy_static;
use parking_lot::Mutex;
use regex::Regex;
use serde::Serialize;

use crate::dom::{Node, NodeType};
use crate::error::{Error, Result};

use super::cache::{BoundedCache, ScanState};
use super::compiler::{CompiledSelector, Compiler};
use super::config::EngineConfig;
use super::filter::class_regex;
use super::matcher::Scope;
use super::token::TokenGroup;
use super::tokenizer;

lazy_static! {
    /// Single id, tag or class selector
    static ref QUICK_EXPR: Regex = Regex::new(r"^(?:#([\w-]+)|(\w+)|\.([\w-]+))$").unwrap();
}

#[derive(Debug, Default)]
struct Counters {
    selections: AtomicU64,
    fast_path_hits: AtomicU64,
    token_cache_hits: AtomicU64,
    token_cache_misses: AtomicU64,
    compiled_cache_hits: AtomicU64,
    compiled_cache_misses: AtomicU64,
    class_cache_hits: AtomicU64,
    class_cache_misses: AtomicU64,
    evictions: AtomicU64,
}

impl Counters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn reset(&self) {
        for counter in [
            &self.selections,
            &self.fast_path_hits,
            &self.token_cache_hits,
            &self.token_cache_misses,
            &self.compiled_cache_hits,
            &self.compiled_cache_misses,
            &self.class_cache_hits,
            &self.class_cache_misses,
            &self.evictions,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

/// Snapshot of engine activity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EngineStats {
    pub selections: u64,
    pub fast_path_hits: u64,
    pub token_cache_hits: u64,
    pub token_cache_misses: u64,
    pub compiled_cache_hits: u64,
    pub compiled_cache_misses: u64,
    pub class_cache_hits: u64,
    pub class_cache_misses: u64,
    pub evictions: u64,
    pub token_cache_entries: usize,
    pub compiled_cache_entries: usize,
    pub class_cache_entries: usize,
    pub scan_slots: usize,
}

impl EngineStats {
    /// Hit rate of the compiled-selector cache
    pub fn compiled_hit_rate(&self) -> f64 {
        let total = self.compiled_cache_hits + self.compiled_cache_misses;
        if total > 0 {
            self.compiled_cache_hits as f64 / total as f64
        } else {
            0.0
        }
    }
}

/// CSS selector engine
pub struct Engine {
    config: EngineConfig,
    class_cache: Mutex<BoundedCache<Regex>>,
    token_cache: Mutex<BoundedCache<Vec<TokenGroup>>>,
    compiled_cache: Mutex<BoundedCache<Arc<CompiledSelector>>>,
    scan: ScanState,
    counters: Counters,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("compiled_cache_entries", &self.compiled_cache.lock().len())
            .finish()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::build(EngineConfig::default())
    }
}

impl Engine {
    /// Create an engine with a validated configuration
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: EngineConfig) -> Self {
        let size = config.cache_size;
        Self {
            config,
            class_cache: Mutex::new(BoundedCache::new(size)),
            token_cache: Mutex::new(BoundedCache::new(size)),
            compiled_cache: Mutex::new(BoundedCache::new(size)),
            scan: ScanState::new(),
            counters: Counters::default(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub(crate) fn scan_state(&self) -> &ScanState {
        &self.scan
    }

    /// Tokenize a selector into comma groups (cached)
    pub fn tokenize(&self, selector: &str) -> Result<Vec<TokenGroup>> {
        let selector = selector.trim();
        if let Some(groups) = self.token_cache.lock().get(selector) {
            Counters::bump(&self.counters.token_cache_hits);
            return Ok(groups);
        }
        Counters::bump(&self.counters.token_cache_misses);

        let groups = tokenizer::tokenize(selector)?;
        self.remember(&self.token_cache, selector, groups.clone());
        Ok(groups)
    }

    /// Compile a selector (cached)
    pub fn compile(&self, selector: &str) -> Result<Arc<CompiledSelector>> {
        self.compile_at_depth(selector, 0)
    }

    pub(crate) fn compile_at_depth(&self, selector: &str, depth: usize) -> Result<Arc<CompiledSelector>> {
        let selector = selector.trim();
        if let Some(compiled) = self.compiled_cache.lock().get(selector) {
            Counters::bump(&self.counters.compiled_cache_hits);
            return Ok(compiled);
        }
        if depth > self.config.max_nesting {
            return Err(Error::NestingTooDeep {
                selector: selector.to_string(),
                limit: self.config.max_nesting,
            });
        }
        Counters::bump(&self.counters.compiled_cache_misses);

        let groups = self.tokenize(selector)?;
        let compiled = Arc::new(Compiler::new(self, selector, depth).compile(&groups)?);
        tracing::debug!(
            selector = %selector,
            groups = groups.len(),
            positional = compiled.has_set_matchers(),
            "Compiled selector"
        );

        self.remember(&self.compiled_cache, selector, compiled.clone());
        Ok(compiled)
    }

    /// Whole-word regex for a class name (cached)
    pub(crate) fn class_pattern(&self, name: &str) -> Result<Regex> {
        if let Some(pattern) = self.class_cache.lock().get(name) {
            Counters::bump(&self.counters.class_cache_hits);
            return Ok(pattern);
        }
        Counters::bump(&self.counters.class_cache_misses);

        let pattern = class_regex(name)?;
        self.remember(&self.class_cache, name, pattern.clone());
        Ok(pattern)
    }

    fn remember<V: Clone>(&self, cache: &Mutex<BoundedCache<V>>, key: &str, value: V) {
        if let Some(evicted) = cache.lock().insert(key, value) {
            Counters::bump(&self.counters.evictions);
            tracing::trace!(key = %evicted, "Evicted cache entry");
        }
    }

    /// Find every element under `context` matching `selector`, in document
    /// order without duplicates
    pub fn select(&self, selector: &str, context: &Node) -> Result<Vec<Node>> {
        self.select_inner(selector, context, None)
    }

    /// Like `select`, but results are restricted to the elements of `seed`
    pub fn select_with_seed(&self, selector: &str, context: &Node, seed: &[Node]) -> Result<Vec<Node>> {
        self.select_inner(selector, context, Some(seed))
    }

    fn select_inner(&self, selector: &str, context: &Node, seed: Option<&[Node]>) -> Result<Vec<Node>> {
        Counters::bump(&self.counters.selections);
        let selector = selector.trim();
        if selector.is_empty() || !is_search_context(context) {
            return Ok(Vec::new());
        }

        if seed.is_none() {
            if let Some(found) = self.fast_path(selector, context) {
                return Ok(found);
            }
        }

        let compiled = self.compile(selector)?;
        Ok(self.run(&compiled, context, seed))
    }

    /// Run a compiled selector under `context`
    pub fn select_compiled(&self, compiled: &CompiledSelector, context: &Node, seed: Option<&[Node]>) -> Vec<Node> {
        Counters::bump(&self.counters.selections);
        if !is_search_context(context) {
            return Vec::new();
        }
        self.run(compiled, context, seed)
    }

    fn run(&self, compiled: &CompiledSelector, context: &Node, seed: Option<&[Node]>) -> Vec<Node> {
        let found = compiled.execute(&self.scan, Scope::from_context(context), context.is_xml(), seed);
        tracing::trace!(
            selector = %compiled.source(),
            seeded = seed.is_some(),
            found = found.len(),
            "Selected"
        );
        found
    }

    /// Single id/tag/class selectors answered by direct DOM lookups
    fn fast_path(&self, selector: &str, context: &Node) -> Option<Vec<Node>> {
        if !self.config.native_lookups || context.is_xml() {
            return None;
        }
        let caps = QUICK_EXPR.captures(selector)?;

        let found = if let Some(id) = caps.get(1) {
            let root = context.root();
            root.get_element_by_id(id.as_str())
                .filter(|elem| root == *context || context.contains(elem))
                .into_iter()
                .collect()
        } else if let Some(tag) = caps.get(2) {
            context.get_elements_by_tag_name(tag.as_str())
        } else {
            let class = caps.get(3)?;
            context.get_elements_by_class_name(class.as_str())
        };

        Counters::bump(&self.counters.fast_path_hits);
        tracing::trace!(selector = %selector, found = found.len(), "Fast path lookup");
        Some(found)
    }

    /// Whether `node` matches `selector`
    pub fn matches(&self, node: &Node, selector: &str) -> Result<bool> {
        let selector = selector.trim();
        if selector.is_empty() {
            return Ok(false);
        }
        let compiled = self.compile(selector)?;
        Ok(self.matches_compiled(&compiled, node))
    }

    pub fn matches_compiled(&self, compiled: &CompiledSelector, node: &Node) -> bool {
        if !node.is_element() {
            return false;
        }
        !compiled
            .execute(&self.scan, Scope::Free, node.is_xml(), Some(std::slice::from_ref(node)))
            .is_empty()
    }

    /// The subset of `nodes` matching `selector`, in document order
    pub fn matches_in_set(&self, nodes: &[Node], selector: &str) -> Result<Vec<Node>> {
        let selector = selector.trim();
        if selector.is_empty() || nodes.is_empty() {
            return Ok(Vec::new());
        }
        let compiled = self.compile(selector)?;
        let xml = nodes.first().map(Node::is_xml).unwrap_or(false);
        Ok(compiled.execute(&self.scan, Scope::Free, xml, Some(nodes)))
    }

    /// Drop every cached entry and memo slot
    pub fn clear_caches(&self) {
        self.class_cache.lock().clear();
        self.token_cache.lock().clear();
        self.compiled_cache.lock().clear();
        self.scan.clear();
        tracing::debug!("Cleared selector caches");
    }

    pub fn stats(&self) -> EngineStats {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        EngineStats {
            selections: load(&self.counters.selections),
            fast_path_hits: load(&self.counters.fast_path_hits),
            token_cache_hits: load(&self.counters.token_cache_hits),
            token_cache_misses: load(&self.counters.token_cache_misses),
            compiled_cache_hits: load(&self.counters.compiled_cache_hits),
            compiled_cache_misses: load(&self.counters.compiled_cache_misses),
            class_cache_hits: load(&self.counters.class_cache_hits),
            class_cache_misses: load(&self.counters.class_cache_misses),
            evictions: load(&self.counters.evictions),
            token_cache_entries: self.token_cache.lock().len(),
            compiled_cache_entries: self.compiled_cache.lock().len(),
            class_cache_entries: self.class_cache.lock().len(),
            scan_slots: self.scan.slots(),
        }
    }

    pub fn reset_stats(&self) {
        self.counters.reset();
    }
}

fn is_search_context(node: &Node) -> bool {
    matches!(
        node.node_type(),
        NodeType::Element | NodeType::Document | NodeType::DocumentFragment
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{parse_html, Document};

    const LIST: &str = r#"<ul id="list"><li class="a">A</li><li class="b">B</li><li class="a b">C</li></ul>"#;

    fn texts(nodes: &[Node]) -> Vec<String> {
        nodes.iter().map(|n| n.text_content()).collect()
    }

    fn select(doc: &Document, selector: &str) -> Vec<String> {
        texts(&doc.select(selector).unwrap())
    }

    #[test]
    fn test_list_basics() {
        let doc = parse_html(LIST).unwrap();
        assert_eq!(select(&doc, "li.a"), vec!["A", "C"]);
        assert_eq!(select(&doc, "#list > li:first-child"), vec!["A"]);
        assert_eq!(select(&doc, "li:not(.a)"), vec!["B"]);
        assert_eq!(select(&doc, "li:nth-last-child(2)"), vec!["B"]);
        assert_eq!(select(&doc, "li.b, li.a"), vec!["A", "B", "C"]);
        assert_eq!(select(&doc, "li:eq(-1)"), vec!["C"]);
        assert_eq!(select(&doc, ".a.b"), vec!["C"]);
        assert_eq!(select(&doc, "ul li + li"), vec!["B", "C"]);
        assert_eq!(select(&doc, "li.a ~ li"), vec!["B", "C"]);
    }

    #[test]
    fn test_syntax_errors() {
        let doc = parse_html(LIST).unwrap();
        let err = doc.select("div[").unwrap_err();
        assert!(err.is_syntax());
        assert_eq!(err.selector(), Some("div["));
        assert!(doc.select("li >").is_err());
        assert!(doc.select("li > > a").is_err());
        assert!(matches!(
            doc.select("li:hover"),
            Err(Error::UnsupportedPseudo { .. })
        ));
        assert!(matches!(
            doc.select("li:eq(x)"),
            Err(Error::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_empty_selector_and_context() {
        let doc = parse_html(LIST).unwrap();
        assert!(doc.select("").unwrap().is_empty());
        assert!(doc.select("   ").unwrap().is_empty());

        let text = doc.create_text_node("x");
        assert!(doc.engine().select("li", &text).unwrap().is_empty());
        assert!(!doc.engine().matches(&text, "*").unwrap());
    }

    #[test]
    fn test_nth_arithmetic() {
        let doc = parse_html("<ol><li>1</li><li>2</li><li>3</li><li>4</li><li>5</li></ol>").unwrap();
        assert_eq!(select(&doc, "li:nth-child(2n+1)"), vec!["1", "3", "5"]);
        assert_eq!(select(&doc, "li:nth-child(odd)"), vec!["1", "3", "5"]);
        assert_eq!(select(&doc, "li:nth-child(even)"), vec!["2", "4"]);
        assert_eq!(select(&doc, "li:nth-child(-n+2)"), vec!["1", "2"]);
        assert_eq!(select(&doc, "li:nth-child(3)"), vec!["3"]);
        assert!(select(&doc, "li:nth-child(0n+0)").is_empty());
        assert_eq!(select(&doc, "li:nth-child(n)").len(), 5);
        assert_eq!(select(&doc, "li:nth-last-child(odd)"), vec!["1", "3", "5"]);
    }

    #[test]
    fn test_of_type_positions() {
        let doc = parse_html("<div><p>1</p><span>s</span><p>2</p><p>3</p></div>").unwrap();
        assert_eq!(select(&doc, "p:first-of-type"), vec!["1"]);
        assert_eq!(select(&doc, "p:last-of-type"), vec!["3"]);
        assert_eq!(select(&doc, "span:only-of-type"), vec!["s"]);
        assert_eq!(select(&doc, "p:nth-of-type(2)"), vec!["2"]);
        assert_eq!(select(&doc, "p:nth-last-of-type(1)"), vec!["3"]);
        assert!(select(&doc, "p:first-child:last-child").is_empty());
    }

    #[test]
    fn test_positional_pseudos() {
        let doc = parse_html(LIST).unwrap();
        assert_eq!(select(&doc, "li:first"), vec!["A"]);
        assert_eq!(select(&doc, "li:last"), vec!["C"]);
        assert_eq!(select(&doc, "li:even"), vec!["A", "C"]);
        assert_eq!(select(&doc, "li:odd"), vec!["B"]);
        assert_eq!(select(&doc, "li:lt(2)"), vec!["A", "B"]);
        assert_eq!(select(&doc, "li:gt(0)"), vec!["B", "C"]);
        assert_eq!(select(&doc, "li:nth(1)"), vec!["B"]);
        assert_eq!(select(&doc, "li.a:last"), vec!["C"]);
        assert_eq!(select(&doc, "li:gt(0).a"), vec!["C"]);
        assert_eq!(select(&doc, "li:not(:first)"), vec!["B", "C"]);
        assert_eq!(select(&doc, "li:first, li:last"), vec!["A", "C"]);
    }

    #[test]
    fn test_has_contains_lang() {
        let doc = parse_html(
            r#"<div lang="en-US"><p id="x"><b>bold</b> text</p><p lang="fr">bonjour</p></div>"#,
        )
        .unwrap();
        assert_eq!(select(&doc, "p:has(b)").len(), 1);
        assert_eq!(select(&doc, "div:has(> p)").len(), 1);
        assert_eq!(select(&doc, "p:contains(bonjour)"), vec!["bonjour"]);
        assert_eq!(select(&doc, "p:contains('bold t')").len(), 1);
        assert_eq!(select(&doc, "p:lang(en)"), vec!["bold text"]);
        assert_eq!(select(&doc, "p:lang(fr)"), vec!["bonjour"]);
        assert!(select(&doc, "p:lang(de)").is_empty());
        assert!(doc.select("p:lang(e n)").is_err());
    }

    #[test]
    fn test_form_pseudos() {
        let doc = parse_html(
            r#"<form><input id="t"><input type="checkbox" checked><input type="radio" disabled>
            <button>go</button><button type="reset">r</button><select><option selected>o</option></select>
            <textarea></textarea><h2>h</h2></form>"#,
        )
        .unwrap();
        let ids = |s: &str| doc.select(s).unwrap().len();
        assert_eq!(ids(":text"), 1);
        assert_eq!(ids(":checkbox:checked"), 1);
        assert_eq!(ids(":radio:disabled"), 1);
        assert_eq!(ids(":submit"), 1);
        assert_eq!(ids(":reset"), 1);
        assert_eq!(ids(":button"), 2);
        assert_eq!(ids(":input"), 7);
        assert_eq!(ids(":selected"), 1);
        assert_eq!(ids(":checked"), 2);
        assert_eq!(ids(":header"), 1);
        assert_eq!(ids("textarea:empty"), 1);
        assert_eq!(ids("form:parent"), 1);
        assert_eq!(ids(":root"), 1);
        assert_eq!(ids("input:enabled"), 2);
    }

    #[test]
    fn test_scoped_context() {
        let doc = parse_html(
            "<div id='outer'><p>1</p><div id='inner'><p>2</p><span><p>3</p></span></div></div>",
        )
        .unwrap();
        let engine = doc.engine();
        let inner = doc.get_element_by_id("inner").unwrap();

        assert_eq!(texts(&engine.select("p", &inner).unwrap()), vec!["2", "3"]);
        assert_eq!(texts(&engine.select("> p", &inner).unwrap()), vec!["2"]);
        assert_eq!(texts(&engine.select("div p", &inner).unwrap()), Vec::<String>::new());
        assert_eq!(texts(&engine.select("span p", &inner).unwrap()), vec!["3"]);
        assert_eq!(engine.select("#outer", &inner).unwrap().len(), 0);
    }

    #[test]
    fn test_leading_sibling_combinators() {
        let doc = parse_html(LIST).unwrap();
        let engine = doc.engine();
        let first = doc.query_selector("li.a").unwrap().unwrap();

        assert_eq!(texts(&engine.select("+ li", &first).unwrap()), vec!["B"]);
        assert_eq!(texts(&engine.select("~ li", &first).unwrap()), vec!["B", "C"]);
        assert_eq!(texts(&engine.select("~ li:last", &first).unwrap()), vec!["C"]);
    }

    #[test]
    fn test_detached_context() {
        let doc = Document::new();
        let div = doc.create_element("div");
        let span = doc.create_element("span");
        span.set_attribute("id", "s");
        div.append_child(&span);

        let engine = doc.engine();
        assert_eq!(engine.select("span", &div).unwrap(), vec![span.clone()]);
        assert_eq!(engine.select("#s", &div).unwrap(), vec![span.clone()]);
        assert!(engine.select("div", &div).unwrap().is_empty());
        assert!(engine.matches(&span, "div > span").unwrap());
        assert!(!engine.matches(&div, "span:first-child").unwrap());
        assert!(engine.matches(&span, "span:first-child").unwrap());
    }

    #[test]
    fn test_matches_partition() {
        let doc = parse_html(LIST).unwrap();
        let all = doc.select("li").unwrap();
        let engine = doc.engine();

        for selector in ["li.a", "li:first", "li:nth-child(2)", ".b"] {
            let hit = engine.matches_in_set(&all, selector).unwrap();
            let miss = engine.matches_in_set(&all, &format!(":not({selector})")).unwrap();
            assert_eq!(hit.len() + miss.len(), all.len(), "{selector}");
            assert!(hit.iter().all(|n| !miss.contains(n)), "{selector}");
        }
        assert!(engine.matches(&all[2], "li.a.b").unwrap());
        assert!(!engine.matches(&all[1], "li.a").unwrap());
        assert!(engine.matches(&all[0], "li:first").unwrap());
    }

    #[test]
    fn test_matches_in_set_sorts_and_dedups() {
        let doc = parse_html(LIST).unwrap();
        let all = doc.select("li").unwrap();
        let shuffled = vec![all[2].clone(), all[0].clone(), all[2].clone()];
        let found = doc.engine().matches_in_set(&shuffled, ".a").unwrap();
        assert_eq!(found, vec![all[0].clone(), all[2].clone()]);
    }

    #[test]
    fn test_seeded_select() {
        let doc = parse_html(LIST).unwrap();
        let all = doc.select("li").unwrap();
        let seed = vec![all[1].clone(), all[2].clone()];
        let found = doc
            .engine()
            .select_with_seed("li:first", &doc.root(), &seed)
            .unwrap();
        assert_eq!(texts(&found), vec!["B"]);
    }

    #[test]
    fn test_seeded_positional_respects_element_context() {
        let doc = parse_html(r#"<ul id="u1"><li>A</li></ul><ul id="u2"><li>B</li></ul>"#).unwrap();
        let engine = doc.engine();
        let all = doc.select("li").unwrap();
        let u2 = doc.get_element_by_id("u2").unwrap();

        for selector in ["li", "li:first", ":first", ":last", ":eq(0)"] {
            let found = engine.select_with_seed(selector, &u2, &all).unwrap();
            assert_eq!(texts(&found), vec!["B"], "{selector}");
        }
    }

    #[test]
    fn test_nested_selection_shares_memo() {
        let doc = parse_html(
            "<ul><li><p>1</p></li><li><p>2</p></li><li><span>s</span><p>3</p></li><li><p>4</p></li></ul>",
        )
        .unwrap();
        let engine = doc.engine();
        let cases = [
            ("li:nth-child(odd):has(p:nth-child(1))", vec!["1"]),
            ("ul li:not(li:nth-child(2)) p", vec!["1", "3", "4"]),
            ("ul li:nth-child(n+2):not(li:nth-child(3)) p:nth-child(1)", vec!["2", "4"]),
            ("li:has(p:nth-child(2)) ~ li:not(:has(span)) p", vec!["4"]),
        ];

        for (selector, expected) in cases {
            let found = doc.select(selector).unwrap();
            assert_eq!(texts(&found), expected, "{selector}");
            assert_eq!(doc.select(selector).unwrap(), found, "{selector}");

            let every = doc.root().descendant_elements();
            let one_by_one: Vec<Node> = every
                .into_iter()
                .filter(|n| engine.matches(n, selector).unwrap())
                .collect();
            assert_eq!(one_by_one, found, "{selector}");
        }
    }

    #[test]
    fn test_extreme_nth_offsets() {
        let doc = parse_html(LIST).unwrap();
        assert_eq!(select(&doc, "li:nth-child(n-9223372036854775808)").len(), 3);
        assert_eq!(select(&doc, "li:nth-child(-9223372036854775808n+1)"), vec!["A"]);
        assert!(select(&doc, "li:nth-child(-n-9223372036854775808)").is_empty());
    }

    #[test]
    fn test_empty_selector_arguments() {
        let doc = parse_html(LIST).unwrap();
        for selector in ["li:not()", "li:has( )", "li:not(:has())"] {
            assert!(doc.select(selector).unwrap_err().is_syntax(), "{selector}");
        }
    }

    #[test]
    fn test_deterministic_and_cache_transparent() {
        let doc = parse_html(LIST).unwrap();
        let engine = doc.engine();
        let selector = "ul > li:not(.b), li:nth-child(2)";

        let first = doc.select(selector).unwrap();
        let second = doc.select(selector).unwrap();
        engine.clear_caches();
        let third = doc.select(selector).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, third);
        assert_eq!(texts(&first), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_fast_paths_are_equivalent() {
        let html = r#"<div id="a" class="x"><p class="x y">1</p><P>2</P></div><p id="b">3</p>"#;
        let plain = Arc::new(Engine::new(EngineConfig::without_fast_paths()).unwrap());
        let fast = parse_html(html).unwrap();
        let slow = crate::dom::parse_html_with_engine(html, plain).unwrap();

        for selector in ["p", ".x", "#a", "#b", "div", "span"] {
            assert_eq!(
                texts(&fast.select(selector).unwrap()),
                texts(&slow.select(selector).unwrap()),
                "{selector}"
            );
        }
        assert!(fast.engine().stats().fast_path_hits > 0);
        assert_eq!(slow.engine().stats().fast_path_hits, 0);
    }

    #[test]
    fn test_class_paths_agree_on_non_ascii_whitespace() {
        let html = "<p class=\"x\u{a0}y\">1</p><p class=\"x\u{c}z\">2</p>";
        let plain = Arc::new(Engine::new(EngineConfig::without_fast_paths()).unwrap());
        let fast = parse_html(html).unwrap();
        let slow = crate::dom::parse_html_with_engine(html, plain).unwrap();

        for selector in [".x", ".z", "[class~=x]", "[class~=y]"] {
            assert_eq!(
                texts(&fast.select(selector).unwrap()),
                texts(&slow.select(selector).unwrap()),
                "{selector}"
            );
        }
        assert_eq!(select(&fast, ".x"), vec!["2"]);
        assert_eq!(select(&fast, "[class~=x]"), vec!["2"]);
    }

    #[test]
    fn test_xml_is_case_sensitive() {
        let doc = Document::new_xml();
        let root = doc.root();
        let item = doc.create_element("Item");
        let other = doc.create_element("item");
        root.append_child(&item);
        root.append_child(&other);

        let engine = doc.engine();
        assert_eq!(engine.select("Item", &root).unwrap(), vec![item.clone()]);
        assert_eq!(engine.select("item", &root).unwrap(), vec![other.clone()]);

        let html = parse_html("<DIV>x</DIV>").unwrap();
        assert_eq!(html.select("div").unwrap().len(), 1);
        assert_eq!(html.select("DiV").unwrap().len(), 1);
    }

    #[test]
    fn test_cache_bounds_and_stats() {
        let engine = Engine::new(EngineConfig::new().cache_size(2)).unwrap();
        let doc = Document::with_engine(Arc::new(engine));
        for selector in ["a b", "b c", "c d", "a b"] {
            doc.select(selector).unwrap();
        }
        let stats = doc.engine().stats();
        assert!(stats.compiled_cache_entries <= 2);
        assert!(stats.evictions > 0);
        assert_eq!(stats.selections, 4);
        assert_eq!(stats.compiled_cache_misses, 4);

        doc.engine().reset_stats();
        assert_eq!(doc.engine().stats().selections, 0);
        assert!(Engine::new(EngineConfig::new().cache_size(0)).is_err());
    }

    #[test]
    fn test_nesting_limit() {
        let engine = Engine::new(EngineConfig::new().max_nesting(2)).unwrap();
        assert!(engine.compile("a:not(b:not(c))").is_ok());
        assert!(matches!(
            engine.compile("a:not(b:not(c:not(d)))"),
            Err(Error::NestingTooDeep { limit: 2, .. })
        ));
    }

    #[test]
    fn test_selected_list_scenarios() {
        let doc = parse_html(r#"<ul id="list"><li>A</li><li class="sel">B</li><li>C</li></ul>"#).unwrap();
        let engine = doc.engine();

        assert_eq!(select(&doc, "#list > li:nth-child(2)"), vec!["B"]);
        assert_eq!(select(&doc, "#list li:not(.sel)"), vec!["A", "C"]);

        let all = doc.select("li").unwrap();
        let seed = vec![all[1].clone(), all[0].clone()];
        let found = engine.select_with_seed("#list > li", &doc.root(), &seed).unwrap();
        assert_eq!(found, vec![all[0].clone(), all[1].clone()]);

        assert!(engine.matches(&all[1], "li:nth-last-child(2)").unwrap());
        assert!(!engine.matches(&all[0], "li:nth-last-child(2)").unwrap());
    }

    #[test]
    fn test_engine_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Engine>();
        assert_send_sync::<Arc<CompiledSelector>>();

        let doc = parse_html(LIST).unwrap();
        let compiled = doc.engine().compile("li.a").unwrap();
        let root = doc.root();
        assert_eq!(doc.engine().select_compiled(&compiled, &root, None).len(), 2);
        assert!(doc.engine().matches_compiled(&compiled, &doc.select("li").unwrap()[0]));
    }
}
