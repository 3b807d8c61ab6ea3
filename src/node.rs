//! Syntax node model and structural identity.
//!
//! Nodes are immutable value snapshots returned per point query. Two queries
//! may return structurally equal but distinct values for the same syntax
//! element, so identity is decided by `same_node`, never by reference.

use serde::{Deserialize, Serialize};
use tower_lsp::lsp_types::Range;

/// Kind tags reported by the analysis backend.
///
/// The backend reports kinds as plain strings; these constants cover the
/// kinds the resolution algorithm special-cases.
pub mod kind {
    /// Brace-delimited statement sequence.
    pub const COMPOUND_BLOCK: &str = "compound-block";
    /// Synthetic wrapper for an automatic type conversion.
    pub const IMPLICIT_CONVERSION: &str = "implicit-conversion";
    /// Top-level function definition.
    pub const FUNCTION_DECLARATION: &str = "function-declaration";
    /// Function prototype (declaration without a body).
    pub const FUNCTION_PROTOTYPE: &str = "function-prototype";
    pub const CALL_EXPRESSION: &str = "call-expression";
    pub const UNARY_OPERATOR: &str = "unary-operator";
    pub const BINARY_OPERATOR: &str = "binary-operator";
    pub const DECLARATION_REFERENCE: &str = "declaration-reference";
    pub const NAMESPACE_QUALIFIER: &str = "namespace-qualifier";
    pub const VARIABLE_DECLARATION: &str = "variable-declaration";
    /// Whole-document root; the only node with no range.
    pub const TRANSLATION_UNIT: &str = "translation-unit";
}

/// A syntax node as reported by the analysis backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyntaxNode {
    /// Syntactic category tag, e.g. `declaration-reference`.
    pub kind: String,
    /// Half-open source range; absent on the whole-document root.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<Range>,
    /// Ordered children, source order; absent or empty on leaves.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<SyntaxNode>>,
    /// Kind-specific metadata such as operator text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl SyntaxNode {
    pub fn is_kind(&self, kind: &str) -> bool {
        self.kind == kind
    }

    pub fn children(&self) -> &[SyntaxNode] {
        self.children.as_deref().unwrap_or(&[])
    }

    pub fn has_children(&self) -> bool {
        !self.children().is_empty()
    }

    /// The single child of a wrapper node, if it has exactly one.
    pub fn sole_child(&self) -> Option<&SyntaxNode> {
        match self.children() {
            [child] => Some(child),
            _ => None,
        }
    }

    /// Whether `candidate` structurally equals one of this node's direct
    /// children. Direct children only; no tree walk.
    pub fn has_direct_child(&self, candidate: &SyntaxNode) -> bool {
        self.children().iter().any(|c| same_node(c, candidate))
    }
}

/// Structural identity: ranges and kinds coincide.
///
/// Implicit-conversion wrappers are transparent: a conversion node is equal
/// to whatever its sole child is equal to, unwrapping recursively on either
/// side. The relation is symmetric.
pub fn same_node(a: &SyntaxNode, b: &SyntaxNode) -> bool {
    if a.kind == kind::IMPLICIT_CONVERSION {
        if let Some(inner) = a.sole_child() {
            if same_node(inner, b) {
                return true;
            }
        }
    }
    if b.kind == kind::IMPLICIT_CONVERSION {
        if let Some(inner) = b.sole_child() {
            if same_node(a, inner) {
                return true;
            }
        }
    }
    a.range == b.range && a.kind == b.kind
}
