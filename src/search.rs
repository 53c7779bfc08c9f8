use std::{fmt::Write as _, num::NonZeroUsize, time::Duration};

use serde::{Serialize, Serializer};

use crate::{
    error::Result,
    index_dir::IndexDir,
    tantivy_index::{DocumentIndex, SearchIndex},
};

/// Markup used to mark matched terms inside a hit's excerpt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum HighlightStyle {
    /// Terminal colours (yellow background).
    #[default]
    Ansi,
    /// `<b>` tags with HTML-escaped text.
    Html,
}

/// A free-text query bounded by a result limit.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    /// Passed to the engine's query grammar untouched.
    pub query: String,
    pub limit: NonZeroUsize,
    pub highlight: HighlightStyle,
}

impl SearchRequest {
    /// Join command-line terms with single spaces into one query string.
    pub fn from_terms<S: AsRef<str>>(
        terms: &[S],
        limit: NonZeroUsize,
        highlight: HighlightStyle,
    ) -> Self {
        let query = terms
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<_>>()
            .join(" ");
        Self {
            query,
            limit,
            highlight,
        }
    }
}

/// One ranked match.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hit {
    /// Source path of the matched document.
    pub id: String,
    pub score: f32,
    /// Rendered excerpt with highlight markup, when the body matched.
    pub excerpt: Option<String>,
}

/// Hits in engine order (descending relevance), at most `limit` of them.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResults {
    pub query: String,
    /// Number of matching documents before the limit was applied.
    pub total_hits: usize,
    pub hits: Vec<Hit>,
    #[serde(rename = "took_ms", serialize_with = "serialize_millis")]
    pub took: Duration,
}

impl SearchResults {
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

fn serialize_millis<S: Serializer>(
    took: &Duration,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_f64(took.as_micros() as f64 / 1000.0)
}

/// Run a request against an open index.
pub fn execute_search<I: DocumentIndex>(
    index: &I,
    request: &SearchRequest,
) -> Result<SearchResults> {
    let results = index.search(request)?;
    tracing::debug!(
        query = %request.query,
        hits = results.hits.len(),
        total = results.total_hits,
        "search finished"
    );
    Ok(results)
}

/// Open the index at `dir` without creating it and run the request.
///
/// A missing index surfaces as [`crate::Error::IndexMissing`], separate
/// from an empty result.
pub fn search_index_dir(
    dir: &IndexDir,
    request: &SearchRequest,
) -> Result<SearchResults> {
    let index = SearchIndex::open_existing(dir.path())?;
    execute_search(&index, request)
}

/// Render results for a terminal.
pub fn render_human(results: &SearchResults) -> String {
    let mut out = String::new();
    if results.is_empty() {
        out.push_str("No Match Found\n");
        return out;
    }

    let _ = writeln!(
        out,
        "{} matches, showing 1 through {}, took {:?}",
        results.total_hits,
        results.hits.len(),
        results.took
    );
    for (rank, hit) in results.hits.iter().enumerate() {
        let _ = writeln!(out, "{:>5}. {} ({:.6})", rank + 1, hit.id, hit.score);
        if let Some(excerpt) = &hit.excerpt {
            for line in excerpt.lines().filter(|l| !l.trim().is_empty()) {
                let _ = writeln!(out, "\t{line}");
            }
        }
    }
    out
}

/// Format results for human-readable terminal output.
pub fn format_human(results: &SearchResults) {
    print!("{}", render_human(results));
}

/// Format results as JSON output.
pub fn format_json(results: &SearchResults) -> Result<()> {
    let json = serde_json::to_string_pretty(results)?;
    println!("{json}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;

    fn limit(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    fn index_with(docs: &[(&str, &str)]) -> SearchIndex {
        let mut idx = SearchIndex::open_in_ram().unwrap();
        for (path, yaml) in docs {
            let doc =
                Document::from_yaml(std::path::Path::new(path), yaml).unwrap();
            idx.add(&doc).unwrap();
        }
        idx.commit().unwrap();
        idx
    }

    #[test]
    fn terms_are_joined_with_single_spaces() {
        let req = SearchRequest::from_terms(
            &["name:alpha", "AND", "beta"],
            limit(10),
            HighlightStyle::Ansi,
        );
        assert_eq!(req.query, "name:alpha AND beta");
    }

    #[test]
    fn zero_hits_is_not_an_error() {
        let idx = index_with(&[("a.yaml", "name: alpha")]);
        let req = SearchRequest::from_terms(
            &["gamma"],
            limit(10),
            HighlightStyle::Ansi,
        );

        let results = execute_search(&idx, &req).unwrap();
        assert!(results.is_empty());
        assert_eq!(results.total_hits, 0);
        assert_eq!(render_human(&results), "No Match Found\n");
    }

    #[test]
    fn limit_caps_hits_but_not_total() {
        let idx = index_with(&[
            ("a.yaml", "kind: service"),
            ("b.yaml", "kind: service"),
            ("c.yaml", "kind: service"),
        ]);
        let req = SearchRequest::from_terms(
            &["service"],
            limit(2),
            HighlightStyle::Ansi,
        );

        let results = execute_search(&idx, &req).unwrap();
        assert_eq!(results.hits.len(), 2);
        assert_eq!(results.total_hits, 3);
    }

    #[test]
    fn hits_keep_engine_order() {
        let idx = index_with(&[
            (
                "weak.yaml",
                "note: rust\nother: a long value with many words in it",
            ),
            ("strong.yaml", "lang: rust\nalso: rust"),
        ]);
        let req = SearchRequest::from_terms(
            &["rust"],
            limit(10),
            HighlightStyle::Ansi,
        );

        let results = execute_search(&idx, &req).unwrap();
        let scores: Vec<f32> = results.hits.iter().map(|h| h.score).collect();
        let mut sorted = scores.clone();
        sorted.sort_by(|a, b| b.total_cmp(a));
        assert_eq!(scores, sorted);
        assert_eq!(results.hits[0].id, "strong.yaml");
    }

    #[test]
    fn human_output_lists_hits_with_excerpts() {
        let idx = index_with(&[("a.yaml", "name: alpha")]);
        let req = SearchRequest::from_terms(
            &["alpha"],
            limit(10),
            HighlightStyle::Html,
        );

        let results = execute_search(&idx, &req).unwrap();
        let text = render_human(&results);

        assert!(text.starts_with("1 matches, showing 1 through 1, took "));
        assert!(text.contains("    1. a.yaml ("));
        assert!(text.contains("\tname: <b>alpha</b>"));
    }

    #[test]
    fn json_shape() {
        let results = SearchResults {
            query: "alpha".to_string(),
            total_hits: 1,
            hits: vec![Hit {
                id: "a.yaml".to_string(),
                score: 1.5,
                excerpt: None,
            }],
            took: Duration::from_millis(2),
        };
        let value = serde_json::to_value(&results).unwrap();

        assert_eq!(value["query"], "alpha");
        assert_eq!(value["total_hits"], 1);
        assert_eq!(value["hits"][0]["id"], "a.yaml");
        assert!(value["hits"][0]["excerpt"].is_null());
        assert_eq!(value["took_ms"], 2.0);
    }
}
