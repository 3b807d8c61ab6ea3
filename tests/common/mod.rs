//! Shared test fixtures: an in-memory syntax backend over a hand-built
//! tree, plus node and document builders.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tower_lsp::lsp_types::{Position, Range, Url};

use astnav::error::Result;
use astnav::node::{kind, SyntaxNode};
use astnav::{Document, SyntaxBackend};

pub fn pos(line: u32, character: u32) -> Position {
    Position { line, character }
}

pub fn range(sl: u32, sc: u32, el: u32, ec: u32) -> Range {
    Range {
        start: pos(sl, sc),
        end: pos(el, ec),
    }
}

pub fn leaf(kind_tag: &str, r: Range) -> SyntaxNode {
    SyntaxNode {
        kind: kind_tag.to_string(),
        range: Some(r),
        children: None,
        detail: None,
    }
}

pub fn branch(kind_tag: &str, r: Range, children: Vec<SyntaxNode>) -> SyntaxNode {
    SyntaxNode {
        kind: kind_tag.to_string(),
        range: Some(r),
        children: Some(children),
        detail: None,
    }
}

/// Whole-document root: the only node without a range.
pub fn root(children: Vec<SyntaxNode>) -> SyntaxNode {
    SyntaxNode {
        kind: kind::TRANSLATION_UNIT.to_string(),
        range: None,
        children: Some(children),
        detail: None,
    }
}

pub fn test_uri() -> Url {
    Url::parse("file:///fixture.c").unwrap()
}

pub fn document(text: &str) -> Document {
    Document::new(test_uri(), text, 0)
}

fn contains(r: &Range, p: Position) -> bool {
    (r.start.line, r.start.character) <= (p.line, p.character)
        && (p.line, p.character) < (r.end.line, r.end.character)
}

fn deepest_at(node: &SyntaxNode, p: Position) -> Option<SyntaxNode> {
    // Children first: the probe answers with the deepest covering node.
    // Children are tried regardless of the parent's own range, matching
    // backends that report qualifier children outside the parent token.
    for child in node.children() {
        if let Some(found) = deepest_at(child, p) {
            return Some(found);
        }
    }
    match &node.range {
        Some(r) if contains(r, p) => Some(node.clone()),
        // The root never answers a point query; a probe between top-level
        // nodes finds nothing, like a real backend probing whitespace.
        _ => None,
    }
}

/// In-memory point-query backend over a fixed tree. Counts queries and
/// records every probed position so tests can assert on query traffic.
pub struct FixtureBackend {
    tree: SyntaxNode,
    queries: AtomicUsize,
    probes: Mutex<Vec<Position>>,
}

impl FixtureBackend {
    pub fn new(tree: SyntaxNode) -> Self {
        FixtureBackend {
            tree,
            queries: AtomicUsize::new(0),
            probes: Mutex::new(Vec::new()),
        }
    }

    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    /// Positions of every point probe issued so far.
    pub fn probed_positions(&self) -> Vec<Position> {
        self.probes.lock().unwrap().clone()
    }
}

#[async_trait]
impl SyntaxBackend for FixtureBackend {
    async fn query(&self, _uri: &Url, range: Option<Range>) -> Result<Option<SyntaxNode>> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        match range {
            None => Ok(Some(self.tree.clone())),
            Some(r) => {
                self.probes.lock().unwrap().push(r.start);
                Ok(deepest_at(&self.tree, r.start))
            }
        }
    }
}
