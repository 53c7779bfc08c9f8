use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("index error: {0}")]
    Tantivy(#[from] tantivy::TantivyError),

    #[error("index directory error: {0}")]
    OpenDirectory(#[from] tantivy::directory::error::OpenDirectoryError),

    #[error("document rejected by index: {0}")]
    DocParsing(String),

    #[error("invalid query: {0}")]
    QueryParse(#[from] tantivy::query::QueryParserError),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("cannot walk {}: {source}", path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("top-level YAML value is not a mapping: {}", .0.display())]
    NotAMapping(PathBuf),

    #[error("index not found at {}", .0.display())]
    IndexMissing(PathBuf),

    #[error("directory is not empty and holds no index: {}", .0.display())]
    NotAnIndex(PathBuf),

    #[error("export path must be a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("destination file exists: {}", .0.display())]
    DestinationExists(PathBuf),

    #[error("refusing to overwrite the source file itself: {}", .0.display())]
    SameFile(PathBuf),

    #[error("export source has no file name: {}", .0.display())]
    NoFileName(PathBuf),
}
