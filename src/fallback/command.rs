use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::traits::{FallbackRequest, FixProvider};

/// Runs an external command per request: the prompt goes to stdin, the reply
/// is read from stdout.
pub struct CommandProvider {
    program: String,
    args: Vec<String>,
}

impl CommandProvider {
    pub fn new(command: &[String]) -> Option<Self> {
        let (program, args) = command.split_first()?;
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }
}

#[async_trait]
impl FixProvider for CommandProvider {
    fn name(&self) -> &str {
        &self.program
    }

    async fn propose(&self, request: &FallbackRequest) -> Result<String> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .env("HYBRIDFIX_CATEGORY", &request.finding.category)
            .env("HYBRIDFIX_ATTEMPT", request.attempt.to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to start fallback command {}", self.program))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(request.prompt().as_bytes()).await?;
        }
        let output = child.wait_with_output().await?;
        if !output.status.success() {
            bail!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        String::from_utf8(output.stdout).context("fallback reply is not UTF-8")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::finding::{Finding, COGNITIVE_COMPLEXITY};
    use crate::fallback::context::SurroundingContext;

    fn request() -> FallbackRequest {
        FallbackRequest {
            file_text: "class A {}\n".to_string(),
            finding: Finding::new(COGNITIVE_COMPLEXITY, "Refactor.", "A.java", 1),
            context: SurroundingContext::default(),
            attempt: 0,
        }
    }

    #[test]
    fn test_empty_command_is_no_provider() {
        assert!(CommandProvider::new(&[]).is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_prompt_is_piped_through_command() {
        let provider = CommandProvider::new(&["cat".to_string()]).unwrap();
        let reply = provider.propose(&request()).await.unwrap();
        assert!(reply.contains("- Category: cognitive-complexity"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_command_is_an_error() {
        let provider = CommandProvider::new(&["false".to_string()]).unwrap();
        assert!(provider.propose(&request()).await.is_err());
    }
}
