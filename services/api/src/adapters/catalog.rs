//! services/api/src/adapters/catalog.rs
//!
//! The Open Library adapter, implementing the `CatalogService` port. The
//! upstream may be slow, may fail, and may return partial data; every call
//! is bounded by the configured request timeout and failures surface as
//! `PortError::Upstream` rather than hanging the caller.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use readwell_core::domain::{CatalogBook, CatalogPage};
use readwell_core::ports::{CatalogService, PortError, PortResult};

const PLACEHOLDER_COVER: &str =
    "https://via.placeholder.com/200x300/3498db/ffffff?text=No+Cover";
const UNKNOWN_AUTHOR: &str = "Unknown Author";

/// Subjects cycled through for the trending query.
const POPULAR_SUBJECTS: &[&str] = &["fiction", "romance", "mystery", "science fiction", "biography"];

#[derive(Clone)]
pub struct OpenLibraryAdapter {
    client: reqwest::Client,
    base_url: String,
    covers_url: String,
}

impl OpenLibraryAdapter {
    /// Builds the adapter with its own HTTP client. `timeout` bounds every
    /// upstream request.
    pub fn new(base_url: String, covers_url: String, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url,
            covers_url,
        })
    }

    fn cover_url(&self, cover_id: Option<i64>) -> String {
        match cover_id {
            Some(id) => format!("{}/b/id/{}-L.jpg", self.covers_url, id),
            None => PLACEHOLDER_COVER.to_string(),
        }
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: &str) -> PortResult<T> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| PortError::Upstream(e.to_string()))?;
        if !response.status().is_success() {
            return Err(PortError::Upstream(format!(
                "Catalog returned HTTP {}",
                response.status()
            )));
        }
        response
            .json::<T>()
            .await
            .map_err(|e| PortError::Upstream(e.to_string()))
    }

    async fn search_page(
        &self,
        query_param: &str,
        page: i64,
        limit: i64,
        subject_limit: usize,
        description: String,
    ) -> PortResult<CatalogPage> {
        let url = format!(
            "{}/search.json?{}&page={}&limit={}",
            self.base_url, query_param, page, limit
        );
        let result: SearchResult = self.get_json(&url).await?;
        let books = result
            .docs
            .into_iter()
            .map(|doc| self.doc_to_book(doc, subject_limit, description.clone()))
            .collect();
        let total_pages = if limit > 0 {
            (result.num_found + limit - 1) / limit
        } else {
            0
        };
        Ok(CatalogPage {
            books,
            total: result.num_found,
            page,
            total_pages,
        })
    }

    fn doc_to_book(&self, doc: SearchDoc, subject_limit: usize, description: String) -> CatalogBook {
        CatalogBook {
            id: doc.key,
            title: doc.title.unwrap_or_default(),
            author: doc
                .author_name
                .and_then(|mut names| {
                    if names.is_empty() {
                        None
                    } else {
                        Some(names.remove(0))
                    }
                })
                .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
            cover: self.cover_url(doc.cover_i),
            year: doc.first_publish_year,
            subjects: doc
                .subject
                .map(|s| s.into_iter().take(subject_limit).collect())
                .unwrap_or_else(|| vec!["General".to_string()]),
            description,
            isbn: doc.isbn.and_then(|mut isbns| {
                if isbns.is_empty() {
                    None
                } else {
                    Some(isbns.remove(0))
                }
            }),
        }
    }
}

//=========================================================================================
// Upstream response shapes
//=========================================================================================

#[derive(Deserialize)]
struct SearchResult {
    #[serde(default)]
    num_found: i64,
    #[serde(default)]
    docs: Vec<SearchDoc>,
}

#[derive(Deserialize)]
struct SearchDoc {
    key: String,
    title: Option<String>,
    author_name: Option<Vec<String>>,
    cover_i: Option<i64>,
    first_publish_year: Option<i32>,
    subject: Option<Vec<String>>,
    isbn: Option<Vec<String>>,
}

#[derive(Deserialize)]
struct WorkDetail {
    key: String,
    title: Option<String>,
    description: Option<WorkDescription>,
    covers: Option<Vec<i64>>,
    subjects: Option<Vec<String>>,
    authors: Option<Vec<WorkAuthorRef>>,
}

/// Open Library serializes descriptions either as a bare string or as a
/// `{ "type": ..., "value": ... }` object.
#[derive(Deserialize)]
#[serde(untagged)]
enum WorkDescription {
    Text(String),
    Object { value: String },
}

impl WorkDescription {
    fn into_text(self) -> String {
        match self {
            WorkDescription::Text(text) => text,
            WorkDescription::Object { value } => value,
        }
    }
}

#[derive(Deserialize)]
struct WorkAuthorRef {
    author: Option<KeyRef>,
}

#[derive(Deserialize)]
struct KeyRef {
    key: String,
}

#[derive(Deserialize)]
struct AuthorDetail {
    name: Option<String>,
}

//=========================================================================================
// `CatalogService` Trait Implementation
//=========================================================================================

#[async_trait]
impl CatalogService for OpenLibraryAdapter {
    async fn search(&self, query: &str, page: i64, limit: i64) -> PortResult<CatalogPage> {
        let param = format!("q={}", urlencoding::encode(query));
        self.search_page(
            &param,
            page,
            limit,
            3,
            "Click \"Read Now\" to view this book".to_string(),
        )
        .await
    }

    async fn book(&self, book_id: &str) -> PortResult<CatalogBook> {
        // `book_id` is the provider's hierarchical key, e.g. /works/OL45883W.
        let url = format!("{}{}.json", self.base_url, book_id);
        let work: WorkDetail = self.get_json(&url).await?;

        // Author names need a second lookup via the work's author reference.
        let mut author = UNKNOWN_AUTHOR.to_string();
        if let Some(key) = work
            .authors
            .as_ref()
            .and_then(|authors| authors.first())
            .and_then(|a| a.author.as_ref())
            .map(|r| r.key.clone())
        {
            let author_url = format!("{}{}.json", self.base_url, key);
            if let Ok(detail) = self.get_json::<AuthorDetail>(&author_url).await {
                if let Some(name) = detail.name {
                    author = name;
                }
            }
        }

        Ok(CatalogBook {
            id: work.key,
            title: work.title.unwrap_or_default(),
            author,
            cover: self.cover_url(work.covers.and_then(|c| c.first().copied())),
            year: None,
            subjects: work.subjects.unwrap_or_else(|| vec!["General".to_string()]),
            description: work
                .description
                .map(WorkDescription::into_text)
                .unwrap_or_else(|| "No description available".to_string()),
            isbn: None,
        })
    }

    async fn popular(&self) -> PortResult<Vec<CatalogBook>> {
        let subject = POPULAR_SUBJECTS
            [(chrono::Utc::now().timestamp() as usize) % POPULAR_SUBJECTS.len()];
        let param = format!("q={}&sort=rating", urlencoding::encode(subject));
        let page = self
            .search_page(
                &param,
                1,
                12,
                2,
                "Popular book - Click \"Read Now\" to view".to_string(),
            )
            .await?;
        Ok(page.books)
    }

    async fn category(&self, genre: &str, page: i64, limit: i64) -> PortResult<CatalogPage> {
        let param = format!("subject={}", urlencoding::encode(genre));
        let description = format!("{genre} book - Click \"Read Now\" to view");
        self.search_page(&param, page, limit, 3, description).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter() -> OpenLibraryAdapter {
        OpenLibraryAdapter::new(
            "https://openlibrary.example".to_string(),
            "https://covers.example".to_string(),
            Duration::from_secs(10),
        )
        .unwrap()
    }

    #[test]
    fn search_doc_maps_with_full_data() {
        let doc: SearchDoc = serde_json::from_value(serde_json::json!({
            "key": "/works/OL45883W",
            "title": "Fantastic Mr Fox",
            "author_name": ["Roald Dahl", "Someone Else"],
            "cover_i": 6498519,
            "first_publish_year": 1970,
            "subject": ["Foxes", "Fiction", "Farmers", "Tunnels"],
            "isbn": ["9780140328721"]
        }))
        .unwrap();

        let book = adapter().doc_to_book(doc, 3, "desc".to_string());
        assert_eq!(book.id, "/works/OL45883W");
        assert_eq!(book.author, "Roald Dahl");
        assert_eq!(book.cover, "https://covers.example/b/id/6498519-L.jpg");
        assert_eq!(book.year, Some(1970));
        assert_eq!(book.subjects, vec!["Foxes", "Fiction", "Farmers"]);
        assert_eq!(book.isbn.as_deref(), Some("9780140328721"));
    }

    #[test]
    fn search_doc_maps_with_partial_data() {
        let doc: SearchDoc = serde_json::from_value(serde_json::json!({
            "key": "/works/OL1W",
            "title": "Bare Minimum"
        }))
        .unwrap();

        let book = adapter().doc_to_book(doc, 3, "desc".to_string());
        assert_eq!(book.author, UNKNOWN_AUTHOR);
        assert_eq!(book.cover, PLACEHOLDER_COVER);
        assert_eq!(book.year, None);
        assert_eq!(book.subjects, vec!["General"]);
        assert!(book.isbn.is_none());
    }

    #[test]
    fn work_description_accepts_both_shapes() {
        let text: WorkDescription = serde_json::from_value(serde_json::json!("plain")).unwrap();
        assert_eq!(text.into_text(), "plain");

        let object: WorkDescription = serde_json::from_value(serde_json::json!({
            "type": "/type/text",
            "value": "wrapped"
        }))
        .unwrap();
        assert_eq!(object.into_text(), "wrapped");
    }
}
