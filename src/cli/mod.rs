pub mod commands;
pub mod output;
pub mod progress;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "hybridfix",
    version,
    about = "Safely fix static-analysis findings in Java code"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fix the findings listed in a findings file
    Fix(commands::fix::FixArgs),
    /// Print the symbol and dependency index of a project
    Index(commands::index::IndexArgs),
}
