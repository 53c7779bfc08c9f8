use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::{
    document::Document,
    error::Result,
    index_dir::IndexDir,
    spinner::Spinner,
    tantivy_index::{DocumentIndex, SearchIndex},
    walker,
};

/// Documents decoded from a batch of files, plus the files that had to be
/// skipped.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub documents: Vec<Document>,
    pub skipped: Vec<PathBuf>,
}

/// Outcome of a full `index` run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexReport {
    pub discovered: usize,
    pub indexed: usize,
    pub skipped: Vec<PathBuf>,
}

/// Read and decode one YAML file.
pub fn load_document(path: &Path) -> Result<Document> {
    let text = std::fs::read_to_string(path)?;
    Document::from_yaml(path, &text)
}

/// Read and decode files in parallel.
///
/// A file that cannot be read or decoded is logged and skipped; it never
/// fails the batch. Output keeps the input order.
pub fn load_documents(files: &[PathBuf]) -> LoadReport {
    let loaded: Vec<_> = files
        .par_iter()
        .map(|path| (path, load_document(path)))
        .collect();

    let mut report = LoadReport::default();
    for (path, result) in loaded {
        match result {
            Ok(doc) => report.documents.push(doc),
            Err(e) => {
                tracing::warn!(path = %path.display(), "skipping file: {e}");
                report.skipped.push(path.clone());
            }
        }
    }
    report
}

/// Add documents to the index in order. The first engine error aborts.
pub fn ingest<I: DocumentIndex>(
    index: &mut I,
    documents: &[Document],
) -> Result<usize> {
    for doc in documents {
        index.add(doc)?;
        tracing::debug!(path = %doc.id, "indexed");
    }
    Ok(documents.len())
}

/// Walk `root`, ingest every YAML file below it into `index` and close it.
///
/// A traversal or engine failure returns early without closing, so the
/// writes of the aborted run are not committed.
pub fn run_index<I: DocumentIndex>(
    mut index: I,
    root: &Path,
) -> Result<IndexReport> {
    let spinner = Spinner::start("Indexing");

    let files = walker::discover_yaml_files(root)?;
    let loaded = load_documents(&files);
    let indexed = ingest(&mut index, &loaded.documents)?;

    spinner.stop();
    index.close()?;

    tracing::info!(
        discovered = files.len(),
        indexed,
        skipped = loaded.skipped.len(),
        "indexing finished"
    );

    Ok(IndexReport {
        discovered: files.len(),
        indexed,
        skipped: loaded.skipped,
    })
}

/// Open or create the index at `index_dir` and index `root` into it.
pub fn index_directory(
    root: &Path,
    index_dir: &IndexDir,
) -> Result<IndexReport> {
    let index = SearchIndex::open_or_create(index_dir.path())?;
    run_index(index, root)
}
