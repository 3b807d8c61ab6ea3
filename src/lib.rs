pub mod backend;
pub mod document;
pub mod error;
pub mod logging;
pub mod node;
pub mod resolver;
pub mod scanner;
pub mod selection;

pub use backend::SyntaxBackend;
pub use document::{Document, DocumentSnapshot};
pub use error::{ResolveError, Result};
pub use node::{kind, same_node, SyntaxNode};
pub use resolver::StructuralNavigator;
pub use selection::StructuralSelection;
