use anyhow::Result;
use clap::Args;
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::core::config::Config;
use crate::index::SymbolIndex;
use crate::utils::fs::load_snapshot;

#[derive(Args, Debug)]
pub struct IndexArgs {
    /// Path to the project to index (defaults to current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Only show this file (relative to the project path)
    #[arg(long)]
    pub file: Option<PathBuf>,
}

pub async fn execute(args: &IndexArgs) -> Result<()> {
    let config = Config::load(&args.path);
    let snapshot = load_snapshot(&args.path, &config)?;
    let index = SymbolIndex::build(snapshot.iter());
    println!("{}", render(&index, args.file.as_deref())?);
    Ok(())
}

fn render(index: &SymbolIndex, file: Option<&std::path::Path>) -> Result<String> {
    let output = match file {
        Some(path) => {
            let Some(report) = index.report(path) else {
                anyhow::bail!("{} is not an indexed Java source", path.display());
            };
            serde_json::to_value(report)?
        }
        None => {
            let mut files = BTreeMap::new();
            for symbols in index.files() {
                if let Some(report) = index.report(&symbols.path) {
                    files.insert(symbols.path.to_string_lossy().to_string(), serde_json::to_value(report)?);
                }
            }
            serde_json::json!({
                "files": files,
                "unparsed": index.unparsed().collect::<Vec<_>>(),
                "edges": index.edges().len(),
            })
        }
    };
    Ok(serde_json::to_string_pretty(&output)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn index() -> SymbolIndex {
        let files = [
            (Path::new("a/Util.java"), "package a;\npublic class Util {}\n"),
            (Path::new("b/Main.java"), "package b;\nimport a.Util;\nclass Main { Util u; }\n"),
        ];
        SymbolIndex::build(files)
    }

    #[test]
    fn test_render_single_file() {
        let out = render(&index(), Some(Path::new("a/Util.java"))).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed["importers"][0], "b/Main.java");
    }

    #[test]
    fn test_render_unknown_file_fails() {
        assert!(render(&index(), Some(Path::new("c/Nope.java"))).is_err());
    }

    #[test]
    fn test_render_whole_index() {
        let out = render(&index(), None).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert!(parsed["files"]["b/Main.java"].is_object());
        assert_eq!(parsed["edges"], 1);
        assert_eq!(parsed["unparsed"].as_array().unwrap().len(), 0);
    }
}
