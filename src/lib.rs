//! yaa - YAML search for humans.
//!
//! yaa walks a directory tree, decodes every `.yml`/`.yaml` file into a
//! generic mapping and indexes it with
//! [Tantivy](https://github.com/quickwit-oss/tantivy), keyed by the file's
//! path. Queries return ranked hits with highlighted excerpts, and matched
//! files can be copied out without clobbering existing ones.
//!
//! # Quick start
//!
//! ```no_run
//! use std::{num::NonZeroUsize, path::Path};
//!
//! use yaa::{
//!     IndexDir,
//!     export::{self, ExportLayout, ExportRequest},
//!     ingestion,
//!     search::{self, HighlightStyle, SearchRequest},
//! };
//!
//! let index_dir = IndexDir::resolve(None);
//! ingestion::index_directory(Path::new("manifests"), &index_dir).unwrap();
//!
//! let request = SearchRequest::from_terms(
//!     &["replicas:3"],
//!     NonZeroUsize::new(10).unwrap(),
//!     HighlightStyle::Ansi,
//! );
//! let results = search::search_index_dir(&index_dir, &request).unwrap();
//! for hit in &results.hits {
//!     println!("{} ({:.3})", hit.id, hit.score);
//! }
//!
//! let ids: Vec<_> = results.hits.iter().map(|h| h.id.as_str()).collect();
//! export::export_all(
//!     &ids,
//!     &ExportRequest {
//!         dest: "picked".into(),
//!         force: false,
//!         layout: ExportLayout::Flat,
//!     },
//! )
//! .unwrap();
//! ```

pub mod cli;
pub mod document;
pub mod error;
pub mod export;
pub mod index_dir;
pub mod ingestion;
pub mod search;
pub mod spinner;
pub mod tantivy_index;
pub mod walker;

pub use document::Document;
pub use error::{Error, Result};
pub use index_dir::IndexDir;
pub use tantivy_index::{DocumentIndex, SearchIndex};
