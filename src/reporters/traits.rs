use anyhow::Result;

use crate::core::outcome::RunReport;

pub trait Reporter: Send + Sync {
    /// Reporter name for display
    fn name(&self) -> &str;

    /// File extension for the output file
    fn extension(&self) -> &str;

    /// Render a finished run as a string
    fn generate(&self, report: &RunReport) -> Result<String>;
}
