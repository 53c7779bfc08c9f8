use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use yaa::{
    Error,
    IndexDir,
    cli::{Cli, Command, IndexArgs, SearchArgs},
    export::{self, ExportLayout, ExportRequest},
    ingestion,
    search::{self, SearchRequest},
};

fn init_tracing(debug: bool) {
    let filter = if let Ok(env) = std::env::var("YAA_LOG") {
        EnvFilter::new(env)
    } else if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);
    tracing::debug!("Debug logging enabled");

    let index_dir = IndexDir::resolve(cli.index_dir.as_deref());

    match cli.command {
        Command::Index(args) => cmd_index(&index_dir, &args),
        Command::Search(args) => cmd_search(&index_dir, &args),
        Command::Completions(args) => {
            args.generate();
            ExitCode::SUCCESS
        }
    }
}

fn cmd_index(index_dir: &IndexDir, args: &IndexArgs) -> ExitCode {
    let Some(folder) = args.folder.as_deref() else {
        eprintln!("Please provide a folder to index");
        return ExitCode::FAILURE;
    };

    match ingestion::index_directory(folder, index_dir) {
        Ok(report) => {
            if !report.skipped.is_empty() {
                tracing::warn!(
                    "{} of {} files skipped",
                    report.skipped.len(),
                    report.discovered
                );
            }
            println!("Indexing Done!");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("Indexing failed: {e}");
            ExitCode::FAILURE
        }
    }
}

fn cmd_search(index_dir: &IndexDir, args: &SearchArgs) -> ExitCode {
    if args.query.is_empty() {
        eprintln!("No query was found, use -h for help.");
        return ExitCode::FAILURE;
    }
    if args.force && args.export.is_none() {
        tracing::warn!("--force has no effect without --export");
    }

    let request =
        SearchRequest::from_terms(&args.query, args.limit, args.highlight);
    let results = match search::search_index_dir(index_dir, &request) {
        Ok(results) => results,
        Err(Error::IndexMissing(path)) => {
            tracing::error!(
                "Index was not found at {}; run `yaa index <folder>` first",
                path.display()
            );
            return ExitCode::FAILURE;
        }
        Err(e) => {
            tracing::error!("Search failed: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Some(dest) = args.export.as_ref().filter(|_| !results.is_empty()) {
        let ids: Vec<&str> =
            results.hits.iter().map(|h| h.id.as_str()).collect();
        let request = ExportRequest {
            dest: dest.clone(),
            force: args.force,
            layout: if args.preserve_paths {
                ExportLayout::Mirrored
            } else {
                ExportLayout::Flat
            },
        };
        return match export::export_all(&ids, &request) {
            Ok(report) => {
                println!(
                    "{} files exported to {}",
                    report.exported.len(),
                    dest.display()
                );
                ExitCode::SUCCESS
            }
            Err(e) => {
                tracing::error!("{e}");
                ExitCode::FAILURE
            }
        };
    }

    if args.json {
        if let Err(e) = search::format_json(&results) {
            tracing::error!("{e}");
            return ExitCode::FAILURE;
        }
    } else {
        search::format_human(&results);
    }
    ExitCode::SUCCESS
}
