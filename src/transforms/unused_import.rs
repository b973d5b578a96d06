use super::traits::{Transform, TransformContext, TransformResult};
use crate::core::finding::{Finding, UNUSED_IMPORT};
use crate::index::{ImportDecl, SymbolKind};
use crate::syntax::SyntaxTree;

pub struct RemoveUnusedImport;

fn names_import(import: &ImportDecl, name: &str) -> bool {
    import.path == name || import.display_path() == name || import.bound_name() == Some(name)
}

impl Transform for RemoveUnusedImport {
    fn category(&self) -> &'static str {
        UNUSED_IMPORT
    }

    fn name(&self) -> &'static str {
        "remove-unused-import"
    }

    fn apply(&self, tree: &SyntaxTree, finding: &Finding, ctx: &TransformContext<'_>) -> TransformResult {
        let Some(symbols) = ctx.symbols() else {
            return TransformResult::not_applicable("file is not indexed");
        };

        let candidates: Vec<&ImportDecl> = match finding.quoted_name() {
            Some(name) => symbols.imports.iter().filter(|i| names_import(i, name)).collect(),
            None => symbols
                .imports
                .iter()
                .filter(|i| i.span.overlaps_lines(ctx.start_line, ctx.end_line))
                .collect(),
        };
        if candidates.is_empty() {
            return TransformResult::not_applicable("no matching import declaration");
        }

        let mut patched = tree.clone();
        let mut removed = Vec::new();
        let mut kept = Vec::new();
        let mut target: Option<(usize, usize)> = None;
        for import in candidates {
            let used = symbols
                .symbol_at(SymbolKind::Import, &import.span)
                .map(|entry| ctx.index.is_used(entry))
                .unwrap_or(true);
            if used {
                kept.push(import.display_path());
            } else if patched.remove(&import.span) {
                removed.push(import.display_path());
                let (first, last) = (import.span.start_line, import.span.end_line);
                target = Some(target.map_or((first, last), |(a, b)| (a.min(first), b.max(last))));
            }
        }

        if removed.is_empty() {
            return TransformResult::not_applicable(format!(
                "import {} is still referenced or cannot be resolved statically",
                kept.join(", ")
            ));
        }
        TransformResult::Applied {
            tree: patched,
            description: format!("removed unused import {}", removed.join(", ")),
            target_lines: target,
        }
    }
}
