//! Parent resolution over a point-query-only tree.
//!
//! The backing service never reports a node's parent, so the resolver
//! discovers ancestors by scan-and-verify: walk backward from the node,
//! probe a one-character range, and test whether the probed node's subtree
//! contains the target as a direct child. A small per-document memo caches
//! the last resolved (leaf, parent) pair and is invalidated whenever the
//! document version moves.
//!
//! # Control flow
//!
//! ```text
//! parent_of(node)
//!       ├─→ cache check (direct-child test against the cached parent)
//!       ├─→ function-declaration shortcut → whole-document root
//!       ├─→ column-0 prototype probe → whole-document root
//!       └─→ scan loop: ScanCursor::advance → backend.query(one char)
//!              ├─→ no node          → keep scanning
//!              ├─→ child of target  → keep scanning
//!              ├─→ subtree miss     → rewind to probed node's start
//!              └─→ subtree hit      → parent (conversions re-resolved)
//! ```

use std::sync::Arc;

use dashmap::DashMap;
use futures::future::BoxFuture;
use futures::FutureExt;
use tower_lsp::lsp_types::{Position, Range, Url};
use tracing::{debug, trace};

use crate::backend::SyntaxBackend;
use crate::document::{Document, DocumentSnapshot};
use crate::error::{ResolveError, Result};
use crate::node::{kind, SyntaxNode};
use crate::scanner::{ScanCursor, ScanStep};

/// Per-document resolution memo. Created lazily on the first structural
/// request for a document; cleared whenever the version moves; dropped
/// with the document.
#[derive(Debug, Default)]
pub struct ResolutionState {
    version: i32,
    generation: u64,
    leaf: Option<SyntaxNode>,
    parent: Option<SyntaxNode>,
}

impl ResolutionState {
    fn clear(&mut self) {
        self.leaf = None;
        self.parent = None;
    }
}

/// One-character probe range at `position`.
pub(crate) fn one_char(position: Position) -> Range {
    Range {
        start: position,
        end: Position {
            line: position.line,
            character: position.character + 1,
        },
    }
}

/// Anchor position for an unqualified prototype line: the start of the
/// second whitespace-delimited token (the function name on a line like
/// `int foo(int);`). Token-splitting on whitespace is a heuristic carried
/// over from the behavior being matched; swapping in a grammar-aware check
/// only touches this function.
fn prototype_anchor(snapshot: &DocumentSnapshot, line: u32) -> Option<Position> {
    let text = snapshot.line_text(line);
    let mut in_token = false;
    let mut tokens_seen = 0;
    for (i, c) in text.chars().enumerate() {
        if c.is_whitespace() {
            in_token = false;
        } else if !in_token {
            in_token = true;
            tokens_seen += 1;
            if tokens_seen == 2 {
                return Some(Position {
                    line,
                    character: i as u32,
                });
            }
        }
    }
    None
}

/// Structural navigation engine: ancestor search, parent resolution, and
/// the per-document result cache. The backend handle is passed in
/// explicitly and shared; one navigator serves any number of documents.
pub struct StructuralNavigator<B> {
    pub(crate) backend: Arc<B>,
    states: DashMap<Url, ResolutionState>,
}

impl<B: SyntaxBackend> StructuralNavigator<B> {
    pub fn new(backend: Arc<B>) -> Self {
        StructuralNavigator {
            backend,
            states: DashMap::new(),
        }
    }

    /// Drops the resolution state for a closed document.
    pub fn forget_document(&self, uri: &Url) {
        self.states.remove(uri);
    }

    /// Resolves the semantically meaningful parent of `node`.
    ///
    /// Terminal cases resolve to the whole-document root (top of file,
    /// function declarations, prototype lines); the root itself is
    /// returned unchanged. Never returns an implicit-conversion node.
    pub async fn parent_of(&self, document: &Document, node: &SyntaxNode) -> Result<SyntaxNode> {
        let snapshot = document.snapshot().await;
        let generation = self.begin_request(&snapshot);
        if let Some(parent) = self.cached_parent_of(&snapshot, node) {
            debug!("Cache hit: parent of {} already resolved", node.kind);
            return Ok(parent);
        }
        let parent = self.resolve_parent(&snapshot, node).await?;
        self.commit(&snapshot, generation, node, &parent);
        Ok(parent)
    }

    /// Starts a request against the current document version: invalidates
    /// stale state and claims a fresh generation. A request writes its
    /// result back only while its generation is still the latest, so a
    /// superseded in-flight resolution discards itself.
    pub(crate) fn begin_request(&self, snapshot: &DocumentSnapshot) -> u64 {
        let mut state = self.states.entry(snapshot.uri.clone()).or_default();
        if state.version != snapshot.version {
            trace!(
                "Document {} moved from version {} to {}; clearing cached nodes",
                snapshot.uri,
                state.version,
                snapshot.version
            );
            state.clear();
            state.version = snapshot.version;
        }
        state.generation += 1;
        state.generation
    }

    /// The cached parent, if `node` is one of its direct children at the
    /// snapshot's version. O(children); no query, no tree walk.
    pub(crate) fn cached_parent_of(
        &self,
        snapshot: &DocumentSnapshot,
        node: &SyntaxNode,
    ) -> Option<SyntaxNode> {
        let state = self.states.get(&snapshot.uri)?;
        if state.version != snapshot.version {
            return None;
        }
        let parent = state.parent.as_ref()?;
        if parent.has_direct_child(node) {
            return Some(parent.clone());
        }
        None
    }

    /// The cached (leaf, parent) pair at the snapshot's version.
    pub(crate) fn cached_pair(
        &self,
        snapshot: &DocumentSnapshot,
    ) -> Option<(SyntaxNode, SyntaxNode)> {
        let state = self.states.get(&snapshot.uri)?;
        if state.version != snapshot.version {
            return None;
        }
        match (&state.leaf, &state.parent) {
            (Some(leaf), Some(parent)) => Some((leaf.clone(), parent.clone())),
            _ => None,
        }
    }

    /// Writes a resolved pair back, unless this request was superseded or
    /// the document moved while it was in flight.
    pub(crate) fn commit(
        &self,
        snapshot: &DocumentSnapshot,
        generation: u64,
        leaf: &SyntaxNode,
        parent: &SyntaxNode,
    ) {
        if let Some(mut state) = self.states.get_mut(&snapshot.uri) {
            if state.generation != generation || state.version != snapshot.version {
                trace!("Discarding superseded resolution for {}", snapshot.uri);
                return;
            }
            state.leaf = Some(leaf.clone());
            state.parent = Some(parent.clone());
        }
    }

    async fn root(&self, uri: &Url) -> Result<SyntaxNode> {
        self.backend
            .query(uri, None)
            .await?
            .ok_or_else(|| {
                ResolveError::MalformedNode("whole-document root query returned nothing".into())
            })
    }

    /// The orchestrator proper: everything in `parent_of` except the cache.
    /// Boxed because the compound-collapse and conversion rules recurse
    /// back into it.
    pub(crate) fn resolve_parent<'a>(
        &'a self,
        snapshot: &'a DocumentSnapshot,
        node: &'a SyntaxNode,
    ) -> BoxFuture<'a, Result<SyntaxNode>> {
        async move {
            // The root has no range to scan from; it is its own parent.
            let Some(range) = node.range else {
                return Ok(node.clone());
            };
            let start = range.start;

            // A top-level function's parent is always the root.
            if node.is_kind(kind::FUNCTION_DECLARATION) {
                debug!("Function declaration at {:?}; parent is document root", start);
                return self.root(&snapshot.uri).await;
            }

            // Unqualified prototype lines anchor at the function name, not
            // column 0; a prototype there also resolves to the root.
            if start.character == 0 {
                if let Some(anchor) = prototype_anchor(snapshot, start.line) {
                    if let Some(probe) =
                        self.backend.query(&snapshot.uri, Some(one_char(anchor))).await?
                    {
                        if probe.is_kind(kind::FUNCTION_PROTOTYPE) {
                            debug!("Prototype line at {}; parent is document root", start.line);
                            return self.root(&snapshot.uri).await;
                        }
                    }
                }
            }

            let mut cursor = ScanCursor::starting_at(start);
            let parent = loop {
                let position = match cursor.advance(snapshot) {
                    ScanStep::TopOfFile => {
                        debug!("Scan crossed top of file; parent is document root");
                        break self.root(&snapshot.uri).await?;
                    }
                    ScanStep::At(position) => position,
                };
                let candidate = match self
                    .backend
                    .query(&snapshot.uri, Some(one_char(position)))
                    .await?
                {
                    Some(candidate) => candidate,
                    None => continue,
                };
                trace!("Probe at {:?} returned {}", position, candidate.kind);

                // A qualifier or other direct child sits left of the node
                // but below it in the tree; it cannot be an ancestor.
                if node.has_direct_child(&candidate) {
                    trace!("Probed node is a child of the target; scanning on");
                    continue;
                }

                match self.find_descendant_parent(snapshot, &candidate, node).await? {
                    Some(parent) => break parent,
                    None => {
                        // Rewind past the whole candidate so the next probe
                        // does not re-derive the same node.
                        if let Some(r) = &candidate.range {
                            cursor.rewind_to(r.start);
                        }
                    }
                }
            };

            // Conversions are never the navigable parent.
            if parent.is_kind(kind::IMPLICIT_CONVERSION) {
                return self.resolve_parent(snapshot, &parent).await;
            }
            Ok(parent)
        }
        .boxed()
    }

    /// Pre-order depth-first search for the direct parent of `descendant`
    /// within the subtree rooted at `ancestor`. Leftmost-first, early exit
    /// on the first hit.
    ///
    /// A direct match under a compound block is resolved one level
    /// further: the compound's own parent is reported instead, unless that
    /// parent is again a compound block. Single-statement loop and
    /// conditional bodies thus report the control construct, not the brace
    /// block.
    pub(crate) fn find_descendant_parent<'a>(
        &'a self,
        snapshot: &'a DocumentSnapshot,
        ancestor: &'a SyntaxNode,
        descendant: &'a SyntaxNode,
    ) -> BoxFuture<'a, Result<Option<SyntaxNode>>> {
        async move {
            for child in ancestor.children() {
                if crate::node::same_node(child, descendant) {
                    // Collapse does not apply to a compound matched inside
                    // another compound; the outer block is the answer there,
                    // and the caller's "unless" check relies on seeing it.
                    if ancestor.is_kind(kind::COMPOUND_BLOCK)
                        && !descendant.is_kind(kind::COMPOUND_BLOCK)
                    {
                        let outer = self.resolve_parent(snapshot, ancestor).await?;
                        if outer.is_kind(kind::COMPOUND_BLOCK) {
                            return Ok(Some(ancestor.clone()));
                        }
                        trace!(
                            "Collapsed compound block into enclosing {}",
                            outer.kind
                        );
                        return Ok(Some(outer));
                    }
                    return Ok(Some(ancestor.clone()));
                }
                if let Some(found) = self
                    .find_descendant_parent(snapshot, child, descendant)
                    .await?
                {
                    return Ok(Some(found));
                }
            }
            Ok(None)
        }
        .boxed()
    }
}
