//! The point-query boundary to the language-analysis service.
//!
//! The backing service exposes the syntax tree only through point probes:
//! there is no "parent of node" request and no parent pointer on returned
//! nodes. Everything the resolver learns about tree shape, it learns by
//! querying a range and inspecting the returned subtree. The handle is
//! passed explicitly to whatever needs it; there is no process-global
//! connection.

use async_trait::async_trait;
use tower_lsp::lsp_types::{Range, Url};

use crate::error::Result;
use crate::node::SyntaxNode;

#[async_trait]
pub trait SyntaxBackend: Send + Sync {
    /// Queries the syntax node for a range of `uri`.
    ///
    /// * `range == None` requests the whole-document root (the only node
    ///   reported without a range of its own).
    /// * A one-character range `[pos, pos+1)` requests the deepest node
    ///   covering that character.
    ///
    /// Returns `Ok(None)` when no node covers the range, e.g. inside
    /// whitespace, comments, or macro-expanded text. Queries within one
    /// resolution request are issued strictly sequentially; the resolver
    /// never has two in flight for the same request.
    async fn query(&self, uri: &Url, range: Option<Range>) -> Result<Option<SyntaxNode>>;
}
