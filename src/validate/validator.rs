use std::path::Path;
use tracing::debug;

use super::diff::{line_hunk, LineHunk};
use super::signature::{drift, signatures};
use crate::core::config::ValidationConfig;
use crate::core::outcome::CandidatePatch;
use crate::index::{FileSymbols, SymbolIndex};
use crate::syntax::{self, SyntaxTree};

/// What the patch is allowed to touch: the finding's category and its line
/// span in the current text.
#[derive(Debug, Clone)]
pub struct PatchScope<'a> {
    pub category: &'a str,
    pub start_line: usize,
    pub end_line: usize,
}

impl<'a> PatchScope<'a> {
    /// The scope widened to also cover `first..=last`.
    pub fn covering(&self, first: usize, last: usize) -> PatchScope<'a> {
        PatchScope {
            category: self.category,
            start_line: self.start_line.min(first),
            end_line: self.end_line.max(last),
        }
    }
}

#[derive(Debug)]
pub enum Validation {
    Accepted { tree: SyntaxTree, hunk: LineHunk },
    Rejected(String),
}

impl Validation {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Validation::Accepted { .. })
    }
}

pub struct Validator {
    margin: usize,
    signature_categories: Vec<String>,
}

impl Validator {
    pub fn new(config: &ValidationConfig) -> Self {
        Self {
            margin: config.locality_margin,
            signature_categories: config.signature_change_categories.clone(),
        }
    }

    /// Checks a candidate against the current tree of its file. Each check
    /// short-circuits: parse, signatures, cross-file dependencies, locality.
    pub fn validate(
        &self,
        current: &SyntaxTree,
        patch: &CandidatePatch,
        scope: &PatchScope<'_>,
        index: &SymbolIndex,
    ) -> Validation {
        let Some(hunk) = line_hunk(current.source(), &patch.new_text) else {
            return Validation::Rejected("patch does not change the file".to_string());
        };

        let patched = match syntax::parse(&patch.new_text) {
            Ok(tree) => tree,
            Err(e) => return Validation::Rejected(format!("patched file does not parse: {}", e)),
        };

        if !self.signature_categories.iter().any(|c| c == scope.category) {
            let changes = drift(&signatures(current), &signatures(&patched));
            if !changes.is_empty() {
                return Validation::Rejected(format!("signature change: {}", changes.join("; ")));
            }
        }

        if let Err(reason) = check_dependencies(&patch.path, &patched, index) {
            return Validation::Rejected(reason);
        }

        let (first, last) = hunk.touched();
        let low = scope.start_line.saturating_sub(self.margin);
        let high = scope.end_line + self.margin;
        if first < low || last > high {
            return Validation::Rejected(format!(
                "patch touches lines {}-{}, outside {}-{} allowed around the finding",
                first,
                last,
                low.max(1),
                high
            ));
        }

        debug!(file = %patch.path.display(), start = hunk.start, removed = hunk.old_len, added = hunk.new_len, "patch validated");
        Validation::Accepted { tree: patched, hunk }
    }
}

/// Types importers rely on must still be declared, and names this file
/// still uses from other files must still resolve.
fn check_dependencies(path: &Path, patched: &SyntaxTree, index: &SymbolIndex) -> Result<(), String> {
    let after = FileSymbols::extract(path, patched);

    for edge in index.edges_to(path) {
        if !after.type_names().any(|t| t == edge.via) {
            return Err(format!(
                "{} is used by {} but no longer declared",
                edge.via,
                edge.from.display()
            ));
        }
    }

    for edge in index.edges_from(path) {
        if after.uses_of(&edge.via).is_empty() {
            continue;
        }
        let same_package = index
            .file(&edge.to)
            .map(|target| target.package == after.package)
            .unwrap_or(false);
        let static_owner = after
            .imports
            .iter()
            .any(|i| i.is_static && i.path.split('.').any(|part| part == edge.via));
        if !(after.resolves(&edge.via) || same_package || static_owner) {
            return Err(format!(
                "{} from {} no longer resolves",
                edge.via,
                edge.to.display()
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::outcome::Strategy;
    use crate::syntax::parse;
    use std::path::PathBuf;

    const UTIL: &str = "package app;\n\npublic class Util {\n    public static int twice(int x) { return x * 2; }\n}\n";
    const MAIN: &str = "package app.cli;\n\nimport app.Util;\nimport java.util.List;\n\nclass Main {\n    int run(boolean flag) {\n        if (flag == true) {\n            return Util.twice(1);\n        }\n        return 0;\n    }\n}\n";

    fn index() -> SymbolIndex {
        SymbolIndex::build(vec![
            (Path::new("app/Util.java"), UTIL),
            (Path::new("app/cli/Main.java"), MAIN),
        ])
    }

    fn validator() -> Validator {
        Validator::new(&ValidationConfig::default())
    }

    fn patch(path: &str, text: String) -> CandidatePatch {
        CandidatePatch {
            path: PathBuf::from(path),
            new_text: text,
            provenance: Strategy::Fallback,
            description: String::new(),
        }
    }

    fn scope(line: usize) -> PatchScope<'static> {
        PatchScope {
            category: "boolean-literal-comparison",
            start_line: line,
            end_line: line,
        }
    }

    fn reason(v: Validation) -> String {
        match v {
            Validation::Rejected(r) => r,
            Validation::Accepted { .. } => panic!("expected rejection"),
        }
    }

    #[test]
    fn test_accepts_local_body_edit() {
        let current = parse(MAIN).unwrap();
        let p = patch("app/cli/Main.java", MAIN.replace("flag == true", "flag"));
        let result = validator().validate(&current, &p, &scope(8), &index());
        assert!(result.is_accepted());
    }

    #[test]
    fn test_rejects_no_change_and_parse_failure() {
        let current = parse(MAIN).unwrap();
        let same = patch("app/cli/Main.java", MAIN.to_string());
        assert!(reason(validator().validate(&current, &same, &scope(8), &index())).contains("does not change"));
        let broken = patch("app/cli/Main.java", MAIN.replace("return 0;", "return 0"));
        assert!(reason(validator().validate(&current, &broken, &scope(11), &index())).contains("does not parse"));
    }

    #[test]
    fn test_rejects_signature_change_unless_authorized() {
        let current = parse(UTIL).unwrap();
        let p = patch("app/Util.java", UTIL.replace("int twice(int x)", "long twice(int x)"));
        let rejected = reason(validator().validate(&current, &p, &scope(4), &index()));
        assert!(rejected.contains("signature change"));

        let permissive = Validator::new(&ValidationConfig {
            locality_margin: 3,
            signature_change_categories: vec!["boolean-literal-comparison".to_string()],
        });
        assert!(permissive.validate(&current, &p, &scope(4), &index()).is_accepted());
    }

    #[test]
    fn test_rejects_broken_cross_file_resolution() {
        let current = parse(MAIN).unwrap();
        let p = patch("app/cli/Main.java", MAIN.replace("import app.Util;\n", ""));
        let rejected = reason(validator().validate(&current, &p, &scope(3), &index()));
        assert!(rejected.contains("no longer resolves"));
    }

    #[test]
    fn test_rejects_edits_far_from_finding() {
        let current = parse(MAIN).unwrap();
        let p = patch("app/cli/Main.java", MAIN.replace("import java.util.List;\n", ""));
        let rejected = reason(validator().validate(&current, &p, &scope(12), &index()));
        assert!(rejected.contains("outside"));
    }
}
