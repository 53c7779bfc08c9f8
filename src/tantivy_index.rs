use std::{ops::Range, path::Path, time::Instant};

use tantivy::{
    Index,
    IndexReader,
    IndexWriter,
    TantivyDocument,
    Term,
    collector::{Count, TopDocs},
    directory::MmapDirectory,
    query::QueryParser,
    schema::*,
    snippet::{Snippet, SnippetGenerator},
    tokenizer::{
        LowerCaser,
        RemoveLongFilter,
        SimpleTokenizer,
        Stemmer,
        TextAnalyzer,
    },
};

use crate::{
    document::Document,
    error::{Error, Result},
    search::{HighlightStyle, Hit, SearchRequest, SearchResults},
};

/// Field names used in the schema.
pub mod fields {
    pub const PATH: &str = "path";
    pub const BODY: &str = "body";
    pub const CONTENT: &str = "content";
}

/// Writer heap size in bytes.
pub const WRITER_MEMORY_BUDGET: usize = 15_000_000;

/// Upper bound on the length of a highlighted excerpt.
pub const SNIPPET_MAX_CHARS: usize = 150;

const ANSI_HIGHLIGHT_START: &str = "\x1b[43m";
const ANSI_HIGHLIGHT_END: &str = "\x1b[0m";

/// The narrow surface the indexing and search workflows need from a
/// full-text engine. Engine-native types stay behind it.
pub trait DocumentIndex {
    /// Insert a document, replacing any earlier one with the same ID.
    fn add(&mut self, document: &Document) -> Result<()>;

    /// Run a query and return ranked, highlighted hits.
    fn search(&self, request: &SearchRequest) -> Result<SearchResults>;

    /// Flush pending writes and release the index.
    fn close(self) -> Result<()>;
}

/// Resolved field handles for the schema.
#[derive(Clone, Copy)]
struct SchemaFields {
    path: Field,
    body: Field,
    content: Field,
}

impl SchemaFields {
    fn resolve(schema: &Schema) -> Result<Self> {
        Ok(Self {
            path: schema.get_field(fields::PATH)?,
            body: schema.get_field(fields::BODY)?,
            content: schema.get_field(fields::CONTENT)?,
        })
    }
}

/// A tantivy index of YAML documents keyed by source path.
pub struct SearchIndex {
    index: Index,
    reader: IndexReader,
    schema: Schema,
    fields: SchemaFields,
    writer: Option<IndexWriter>,
}

fn build_schema() -> Schema {
    let mut builder = Schema::builder();

    builder.add_text_field(fields::PATH, STRING | STORED);

    let stemmed = TextFieldIndexing::default()
        .set_tokenizer("en_stem")
        .set_index_option(IndexRecordOption::WithFreqsAndPositions);

    let body_opts = TextOptions::default()
        .set_indexing_options(stemmed.clone())
        .set_stored();
    builder.add_text_field(fields::BODY, body_opts);

    let content_opts = JsonObjectOptions::default()
        .set_indexing_options(stemmed)
        .set_stored();
    builder.add_json_field(fields::CONTENT, content_opts);

    builder.build()
}

fn register_tokenizers(index: &Index) {
    let en_stem = TextAnalyzer::builder(SimpleTokenizer::default())
        .filter(RemoveLongFilter::limit(40))
        .filter(LowerCaser)
        .filter(Stemmer::new(tantivy::tokenizer::Language::English))
        .build();
    index.tokenizers().register("en_stem", en_stem);
}

impl SearchIndex {
    /// Open the index in `dir`, creating it when the directory is absent or
    /// empty.
    ///
    /// A non-empty directory without index metadata is rejected with
    /// [`Error::NotAnIndex`] so unrelated files never get an index written
    /// next to them.
    pub fn open_or_create(dir: &Path) -> Result<Self> {
        let fresh = !dir.exists() || is_empty_dir(dir)?;
        std::fs::create_dir_all(dir)?;
        let mmap_dir = MmapDirectory::open(dir)?;

        let index = if Index::exists(&mmap_dir)
            .map_err(|e| tantivy::TantivyError::SystemError(e.to_string()))?
        {
            tracing::debug!(path = %dir.display(), "opening existing index");
            Index::open(mmap_dir)?
        } else if fresh {
            tracing::info!(path = %dir.display(), "creating new index");
            Index::create(
                mmap_dir,
                build_schema(),
                tantivy::IndexSettings::default(),
            )?
        } else {
            return Err(Error::NotAnIndex(dir.to_path_buf()));
        };

        Self::from_index(index)
    }

    /// Open an index that must already exist. Never creates anything.
    pub fn open_existing(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            return Err(Error::IndexMissing(dir.to_path_buf()));
        }
        let mmap_dir = MmapDirectory::open(dir)?;
        if !Index::exists(&mmap_dir)
            .map_err(|e| tantivy::TantivyError::SystemError(e.to_string()))?
        {
            return Err(Error::IndexMissing(dir.to_path_buf()));
        }

        Self::from_index(Index::open(mmap_dir)?)
    }

    /// Create an in-memory search index (for testing).
    pub fn open_in_ram() -> Result<Self> {
        Self::from_index(Index::create_in_ram(build_schema()))
    }

    fn from_index(index: Index) -> Result<Self> {
        register_tokenizers(&index);
        let schema = index.schema();
        let fields = SchemaFields::resolve(&schema)?;
        let reader = index.reader()?;

        Ok(Self {
            index,
            reader,
            schema,
            fields,
            writer: None,
        })
    }

    fn writer(&mut self) -> Result<&mut IndexWriter> {
        let writer = match self.writer.take() {
            Some(writer) => writer,
            None => self.index.writer(WRITER_MEMORY_BUDGET)?,
        };
        Ok(self.writer.insert(writer))
    }

    /// Make everything added so far visible to searches.
    pub fn commit(&mut self) -> Result<()> {
        if let Some(writer) = self.writer.as_mut() {
            writer.commit()?;
        }
        self.reader.reload()?;
        Ok(())
    }

    /// Number of live documents as of the last commit.
    pub fn num_docs(&self) -> Result<u64> {
        self.reader.reload()?;
        Ok(self.reader.searcher().num_docs())
    }

    fn to_tantivy(&self, document: &Document) -> Result<TantivyDocument> {
        use serde_json::Value as Json;

        let mut json = serde_json::Map::new();
        json.insert(fields::PATH.into(), Json::String(document.id.clone()));
        json.insert(fields::BODY.into(), Json::String(document.body_text()));
        json.insert(
            fields::CONTENT.into(),
            Json::Object(document.content.clone()),
        );

        let json = Json::Object(json).to_string();
        TantivyDocument::parse_json(&self.schema, &json)
            .map_err(|e| Error::DocParsing(e.to_string()))
    }
}

impl DocumentIndex for SearchIndex {
    fn add(&mut self, document: &Document) -> Result<()> {
        let doc = self.to_tantivy(document)?;
        let key = Term::from_field_text(self.fields.path, &document.id);

        let writer = self.writer()?;
        writer.delete_term(key);
        writer.add_document(doc)?;
        Ok(())
    }

    fn search(&self, request: &SearchRequest) -> Result<SearchResults> {
        let started = Instant::now();
        self.reader.reload()?;
        let searcher = self.reader.searcher();

        // Unknown field names resolve as key paths inside `content`.
        let parser = QueryParser::for_index(
            &self.index,
            vec![self.fields.body, self.fields.content],
        );
        let query = parser.parse_query(&request.query)?;

        let (top_docs, total_hits) = searcher.search(
            &query,
            &(TopDocs::with_limit(request.limit.get()), Count),
        )?;

        let mut generator =
            SnippetGenerator::create(&searcher, &*query, self.fields.body)?;
        generator.set_max_num_chars(SNIPPET_MAX_CHARS);

        let mut hits = Vec::with_capacity(top_docs.len());
        for (score, doc_address) in top_docs {
            let doc: TantivyDocument = searcher.doc(doc_address)?;
            let snippet = generator.snippet_from_doc(&doc);
            hits.push(Hit {
                id: extract_text(&doc, self.fields.path),
                score,
                excerpt: render_snippet(&snippet, request.highlight),
            });
        }

        Ok(SearchResults {
            query: request.query.clone(),
            total_hits,
            hits,
            took: started.elapsed(),
        })
    }

    fn close(mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.commit()?;
            writer.wait_merging_threads()?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for SearchIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchIndex").finish_non_exhaustive()
    }
}

fn is_empty_dir(dir: &Path) -> Result<bool> {
    if !dir.is_dir() {
        return Ok(false);
    }
    Ok(std::fs::read_dir(dir)?.next().is_none())
}

fn extract_text(doc: &TantivyDocument, field: Field) -> String {
    doc.get_first(field)
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string()
}

fn render_snippet(snippet: &Snippet, style: HighlightStyle) -> Option<String> {
    if snippet.is_empty() {
        return None;
    }
    Some(match style {
        HighlightStyle::Html => snippet.to_html(),
        HighlightStyle::Ansi => {
            mark_ranges(snippet.fragment(), snippet.highlighted())
        }
    })
}

fn mark_ranges(fragment: &str, ranges: &[Range<usize>]) -> String {
    let mut out = String::with_capacity(fragment.len() + ranges.len() * 9);
    let mut cursor = 0;
    for range in ranges {
        if range.start < cursor || range.end > fragment.len() {
            continue;
        }
        out.push_str(&fragment[cursor..range.start]);
        out.push_str(ANSI_HIGHLIGHT_START);
        out.push_str(&fragment[range.clone()]);
        out.push_str(ANSI_HIGHLIGHT_END);
        cursor = range.end;
    }
    out.push_str(&fragment[cursor..]);
    out
}
