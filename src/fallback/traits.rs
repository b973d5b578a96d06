use anyhow::Result;
use async_trait::async_trait;
use std::fmt;

use super::context::SurroundingContext;
use crate::core::finding::Finding;

/// One request to the generative capability.
#[derive(Debug, Clone)]
pub struct FallbackRequest {
    pub file_text: String,
    pub finding: Finding,
    pub context: SurroundingContext,
    /// 0 for the first call, 1 for the reworded retry.
    pub attempt: usize,
}

impl FallbackRequest {
    pub fn prompt(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for FallbackRequest {
    fn fmt(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        let f = &self.finding;
        if self.attempt == 0 {
            writeln!(out, "You are refactoring Java code to resolve a static-analysis finding.")?;
        } else {
            writeln!(
                out,
                "Your previous answer could not be used. Reply with ONLY the complete corrected \
                 Java file inside a single ```java code block, with no other text."
            )?;
        }

        writeln!(out, "\nFINDING:\n- Category: {}", f.category)?;
        if let Some(rule) = &f.rule {
            writeln!(out, "- Rule: {}", rule)?;
        }
        writeln!(out, "- Message: {}", f.message)?;
        writeln!(out, "- File: {}", f.path.display())?;
        writeln!(out, "- Lines: {}-{}", f.line, f.last_line())?;

        if let Some(method) = &self.context.method {
            let m = &method.metrics;
            writeln!(
                out,
                "\nENCLOSING METHOD (lines {}-{}):\n{}\n- cyclomatic complexity: {}\n- cognitive complexity: {}\n- max nesting: {}\n- lines: {}",
                method.start_line, method.end_line, method.signature, m.cyclomatic, m.cognitive, m.max_nesting, m.lines
            )?;
        }
        if !self.context.imports.is_empty() {
            writeln!(out, "\nIMPORTS:\n{}", self.context.imports.join("\n"))?;
        }
        if !self.context.importers.is_empty() {
            writeln!(out, "\nFILES DEPENDING ON THIS ONE (keep public signatures unchanged):")?;
            for importer in &self.context.importers {
                writeln!(out, "- {}", importer.display())?;
            }
        }
        writeln!(out, "\nAROUND THE FINDING:\n{}", self.context.excerpt)?;
        writeln!(out, "FULL FILE:\n```java\n{}\n```", self.file_text.trim_end())?;
        writeln!(
            out,
            "\nChange only what is needed near the reported lines. Keep every public name, \
             parameter list and return type. Return the whole file in one ```java block."
        )
    }
}

/// The opaque text-in/text-out capability behind the fallback.
#[async_trait]
pub trait FixProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn propose(&self, request: &FallbackRequest) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::finding::COGNITIVE_COMPLEXITY;
    use std::path::PathBuf;

    fn request(attempt: usize) -> FallbackRequest {
        FallbackRequest {
            file_text: "class A {}\n".to_string(),
            finding: Finding::new(COGNITIVE_COMPLEXITY, "Refactor this method.", "src/A.java", 1),
            context: SurroundingContext {
                excerpt: "    1 | class A {}\n".to_string(),
                imports: vec![],
                method: None,
                importers: vec![PathBuf::from("src/B.java")],
            },
            attempt,
        }
    }

    #[test]
    fn test_prompt_contents() {
        let prompt = request(0).prompt();
        assert!(prompt.contains("- Category: cognitive-complexity"));
        assert!(prompt.contains("- src/B.java"));
        assert!(prompt.contains("```java\nclass A {}\n```"));
    }

    #[test]
    fn test_retry_prompt_is_reworded() {
        assert_ne!(request(0).prompt(), request(1).prompt());
        assert!(request(1).prompt().starts_with("Your previous answer could not be used."));
    }
}
