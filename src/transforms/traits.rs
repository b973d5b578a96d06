use std::path::Path;

use crate::core::finding::Finding;
use crate::index::{FileSymbols, SymbolIndex};
use crate::syntax::{StructuralNode, SyntaxTree};

pub enum TransformResult {
    Applied {
        tree: SyntaxTree,
        description: String,
        /// Lines of the structure the transform rewrote, when that reaches
        /// beyond the finding's own span (a whole comment block, say).
        target_lines: Option<(usize, usize)>,
    },
    NotApplicable { reason: String },
}

impl TransformResult {
    pub fn not_applicable(reason: impl Into<String>) -> Self {
        TransformResult::NotApplicable { reason: reason.into() }
    }
}

/// Everything a transform may consult besides the tree itself.
pub struct TransformContext<'a> {
    pub path: &'a Path,
    pub index: &'a SymbolIndex,
    /// Finding span mapped onto the current text.
    pub start_line: usize,
    pub end_line: usize,
    pub commented_code_threshold: f64,
}

impl<'a> TransformContext<'a> {
    pub fn symbols(&self) -> Option<&'a FileSymbols> {
        self.index.file(self.path)
    }

    pub fn on_target_lines(&self, node: &StructuralNode) -> bool {
        node.span().overlaps_lines(self.start_line, self.end_line)
    }
}

/// A deterministic rewrite bound to one finding category. Applying a
/// transform to its own output must yield `NotApplicable`.
pub trait Transform: Send + Sync {
    fn category(&self) -> &'static str;

    fn name(&self) -> &'static str;

    fn apply(&self, tree: &SyntaxTree, finding: &Finding, ctx: &TransformContext<'_>) -> TransformResult;
}
