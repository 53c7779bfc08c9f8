use std::{num::NonZeroUsize, path::PathBuf};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use crate::search::HighlightStyle;

#[derive(Debug, Parser)]
#[command(name = "yaa", about = "Yaml Search for Humans")]
pub struct Cli {
    /// Location of the search index (default: ./yaml_index)
    #[arg(long, global = true)]
    pub index_dir: Option<PathBuf>,

    /// Enable verbose debug logging
    #[arg(short, long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Index every YAML file below a folder
    #[command(visible_alias = "i")]
    Index(IndexArgs),
    /// Search the index
    #[command(visible_alias = "s")]
    Search(SearchArgs),
    /// Generate shell completions
    #[command(hide = true)]
    Completions(CompletionsArgs),
}

// -- Index --

#[derive(Debug, Parser)]
#[command(override_usage = "yaa index [options] <folder>")]
pub struct IndexArgs {
    /// Folder to index
    pub folder: Option<PathBuf>,
}

// -- Search --

#[derive(Debug, Parser)]
#[command(override_usage = "yaa search [options] <query...>")]
pub struct SearchArgs {
    /// Query terms, joined with spaces
    pub query: Vec<String>,

    /// Number of results to display
    #[arg(short, long, default_value = "10")]
    pub limit: NonZeroUsize,

    /// Path to save yaml files
    #[arg(short, long)]
    pub export: Option<PathBuf>,

    /// Overwrite existing files when exporting
    #[arg(short, long)]
    pub force: bool,

    /// Recreate each file's directory structure under the export path
    #[arg(long)]
    pub preserve_paths: bool,

    /// Highlight markup for excerpts
    #[arg(long, value_enum, default_value_t = HighlightStyle::Ansi)]
    pub highlight: HighlightStyle,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

// -- Completions --

#[derive(Debug, Parser)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

impl CompletionsArgs {
    /// Generate shell completions and print to stdout.
    pub fn generate(&self) {
        let mut cmd = Cli::command();
        clap_complete::generate(
            self.shell,
            &mut cmd,
            "yaa",
            &mut std::io::stdout(),
        );
    }
}
