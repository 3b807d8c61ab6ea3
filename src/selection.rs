//! Caller-facing selection: resolve the node under the cursor together
//! with its meaningful parent, ready for the host editor to highlight and
//! to drive structural commands (sibling/child/parent moves, extract,
//! substitute, delete).

use tower_lsp::lsp_types::{Position, Range};
use tracing::debug;

use crate::backend::SyntaxBackend;
use crate::document::Document;
use crate::error::{ResolveError, Result};
use crate::node::{kind, same_node, SyntaxNode};
use crate::resolver::{one_char, StructuralNavigator};
use crate::scanner::{is_skippable_char, is_skippable_line};

/// A resolved (leaf, parent) pair. The leaf is what the editor highlights;
/// the parent scopes sibling navigation.
#[derive(Debug, Clone)]
pub struct StructuralSelection {
    pub leaf: SyntaxNode,
    pub parent: SyntaxNode,
}

impl StructuralSelection {
    /// Range the host editor should decorate; `None` only when the leaf is
    /// the whole-document root.
    pub fn highlight_range(&self) -> Option<Range> {
        self.leaf.range
    }

    fn leaf_index(&self) -> Option<usize> {
        self.parent
            .children()
            .iter()
            .position(|c| same_node(c, &self.leaf))
    }

    /// The leaf's following sibling under the resolved parent.
    pub fn next_sibling(&self) -> Option<&SyntaxNode> {
        self.parent.children().get(self.leaf_index()? + 1)
    }

    /// The leaf's preceding sibling under the resolved parent.
    pub fn prev_sibling(&self) -> Option<&SyntaxNode> {
        let index = self.leaf_index()?;
        if index == 0 {
            return None;
        }
        self.parent.children().get(index - 1)
    }

    /// The leaf's first child, for descending navigation.
    pub fn first_child(&self) -> Option<&SyntaxNode> {
        self.leaf.children().first()
    }
}

/// Parents a leaf is folded into before being reported: selecting an
/// operand or callee selects the whole expression.
fn is_promotable(node: &SyntaxNode) -> bool {
    node.is_kind(kind::CALL_EXPRESSION)
        || node.is_kind(kind::UNARY_OPERATOR)
        || node.is_kind(kind::BINARY_OPERATOR)
}

impl<B: SyntaxBackend> StructuralNavigator<B> {
    /// Resolves the structural selection at `cursor`.
    ///
    /// Reuses the cached pair when the document has not moved since the
    /// last resolution. Trivia under the cursor (blank/comment/preprocessor
    /// lines, whitespace, terminators) is rejected before any query is
    /// spent on it; an empty leaf query is the one user-visible failure.
    pub async fn select_at(
        &self,
        document: &Document,
        cursor: Position,
    ) -> Result<StructuralSelection> {
        let snapshot = document.snapshot().await;
        let generation = self.begin_request(&snapshot);

        if let Some((leaf, parent)) = self.cached_pair(&snapshot) {
            debug!("Reusing cached selection for {}", snapshot.uri);
            return Ok(StructuralSelection { leaf, parent });
        }

        if is_skippable_line(&snapshot, cursor.line) {
            return Err(ResolveError::NoNodeAtSelection);
        }
        match snapshot.char_at(cursor.line, cursor.character) {
            Some(c) if !is_skippable_char(c) => {}
            _ => return Err(ResolveError::NoNodeAtSelection),
        }

        let mut leaf = self
            .backend
            .query(&snapshot.uri, Some(one_char(cursor)))
            .await?
            .ok_or(ResolveError::NoNodeAtSelection)?;
        debug!("Leaf at {:?}: {}", cursor, leaf.kind);

        let mut parent = self.resolve_parent(&snapshot, &leaf).await?;

        // Promotion: a leaf directly under an operator or call expression
        // stands for that expression. Iterates; nested operators promote
        // until the parent is some other kind.
        while is_promotable(&parent) && parent.has_direct_child(&leaf) {
            debug!("Promoting {} to enclosing {}", leaf.kind, parent.kind);
            leaf = parent;
            parent = self.resolve_parent(&snapshot, &leaf).await?;
        }

        self.commit(&snapshot, generation, &leaf, &parent);
        Ok(StructuralSelection { leaf, parent })
    }
}
