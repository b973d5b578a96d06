pub mod java;
pub mod parser;
pub mod tree;

pub use parser::{is_valid, parse};
pub use tree::{Span, StructuralNode, SyntaxTree};
