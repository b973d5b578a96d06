pub mod json;
pub mod markdown;
pub mod traits;

pub use json::JsonReporter;
pub use markdown::MarkdownReporter;
pub use traits::Reporter;

/// Picks the reporter for an output format name.
pub fn for_format(format: &str) -> Option<Box<dyn Reporter>> {
    match format {
        "json" => Some(Box::new(JsonReporter)),
        "markdown" | "md" => Some(Box::new(MarkdownReporter)),
        _ => None,
    }
}
