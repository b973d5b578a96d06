use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

pub const UNUSED_IMPORT: &str = "unused-import";
pub const UNUSED_LOCAL_VARIABLE: &str = "unused-local-variable";
pub const BOOLEAN_LITERAL_COMPARISON: &str = "boolean-literal-comparison";
pub const COMMENTED_OUT_CODE: &str = "commented-out-code";
pub const UTILITY_CLASS_CONSTRUCTOR: &str = "utility-class-constructor";
pub const COLLECTION_IS_EMPTY: &str = "collection-is-empty";
pub const COGNITIVE_COMPLEXITY: &str = "cognitive-complexity";

/// Maps an analyzer rule key onto the stable category it belongs to.
/// Unknown keys are returned unchanged.
pub fn category_for_rule(rule: &str) -> String {
    match rule {
        "java:S1128" => UNUSED_IMPORT,
        "java:S1481" | "java:UnusedLocalVariable" => UNUSED_LOCAL_VARIABLE,
        "java:S1125" => BOOLEAN_LITERAL_COMPARISON,
        "java:S125" => COMMENTED_OUT_CODE,
        "java:S1118" => UTILITY_CLASS_CONSTRUCTOR,
        "java:S1155" => COLLECTION_IS_EMPTY,
        "java:S3776" | "java:S134" => COGNITIVE_COMPLEXITY,
        other => other,
    }
    .to_string()
}

/// One issue reported by the analysis feed. Never mutated after loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    #[serde(default)]
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule: Option<String>,
    pub message: String,
    pub path: PathBuf,
    pub line: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_line: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_column: Option<usize>,
}

impl Finding {
    pub fn new(
        category: impl Into<String>,
        message: impl Into<String>,
        path: impl Into<PathBuf>,
        line: usize,
    ) -> Self {
        Self {
            category: category.into(),
            rule: None,
            message: message.into(),
            path: path.into(),
            line,
            column: None,
            end_line: None,
            end_column: None,
        }
    }

    pub fn last_line(&self) -> usize {
        self.end_line.unwrap_or(self.line).max(self.line)
    }

    /// First single-quoted or double-quoted name in the message, e.g.
    /// `java.util.List` in "Remove this unused import 'java.util.List'."
    pub fn quoted_name(&self) -> Option<&str> {
        for quote in ['\'', '"'] {
            let mut parts = self.message.split(quote);
            parts.next();
            if let Some(name) = parts.next() {
                if !name.is_empty() && !name.contains(char::is_whitespace) {
                    return Some(name);
                }
            }
        }
        None
    }

    pub fn label(&self) -> String {
        format!("{}:{} [{}]", self.path.display(), self.line, self.category)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SonarTextRange {
    start_line: usize,
    end_line: usize,
    start_offset: Option<usize>,
    end_offset: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SonarIssue {
    rule: String,
    message: String,
    component: String,
    line: Option<usize>,
    text_range: Option<SonarTextRange>,
}

#[derive(Debug, Deserialize)]
struct SonarResponse {
    issues: Vec<SonarIssue>,
}

impl SonarIssue {
    fn into_finding(self) -> Option<Finding> {
        let path = self.component.split_once(':').map(|(_, p)| p).unwrap_or(&self.component);
        let line = self
            .line
            .or_else(|| self.text_range.as_ref().map(|r| r.start_line))?;
        let range = self.text_range.as_ref();
        Some(Finding {
            category: category_for_rule(&self.rule),
            rule: Some(self.rule.clone()),
            message: self.message.clone(),
            path: PathBuf::from(path),
            line,
            column: range.and_then(|r| r.start_offset).map(|c| c + 1),
            end_line: range.map(|r| r.end_line),
            end_column: range.and_then(|r| r.end_offset).map(|c| c + 1),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FindingsDocument {
    Sonar(SonarResponse),
    Plain(Vec<Finding>),
}

/// Parses a findings document: either a plain list of findings or a Sonar
/// `issues/search` response. File-level issues without a line are dropped.
pub fn parse_findings(content: &str, yaml: bool) -> Result<Vec<Finding>> {
    let doc: FindingsDocument = if yaml {
        serde_yaml::from_str(content).context("invalid findings YAML")?
    } else {
        serde_json::from_str(content).context("invalid findings JSON")?
    };
    Ok(match doc {
        FindingsDocument::Plain(findings) => findings
            .into_iter()
            .map(|mut f| {
                if let Some(rule) = &f.rule {
                    if f.category.is_empty() {
                        f.category = category_for_rule(rule);
                    }
                }
                f
            })
            .collect(),
        FindingsDocument::Sonar(resp) => {
            let total = resp.issues.len();
            let findings: Vec<Finding> = resp.issues.into_iter().filter_map(SonarIssue::into_finding).collect();
            let dropped = total - findings.len();
            if dropped > 0 {
                warn!(dropped, "ignoring file-level issues without a line");
            }
            findings
        }
    })
}

pub fn load_findings(path: &Path) -> Result<Vec<Finding>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read findings file {}", path.display()))?;
    let yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yml") | Some("yaml")
    );
    parse_findings(&content, yaml)
}
