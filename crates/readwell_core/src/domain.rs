//! crates/readwell_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format,
//! with one exception: `Quote` derives serde because it is persisted as an
//! embedded document inside its parent reading-progress record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One user's rating of one book. At most one exists per `(user_id, book_id)`;
/// a second submission overwrites the first.
#[derive(Debug, Clone)]
pub struct Rating {
    pub id: Uuid,
    pub user_id: Uuid,
    pub book_id: String,
    pub book_title: String,
    pub rating: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Live-computed per-book rating summary. `average` is rounded to one
/// decimal place; `count` is the number of ratings scanned.
#[derive(Debug, Clone, PartialEq)]
pub struct BookAverage {
    pub average: f64,
    pub count: i64,
}

/// One entry of the weekly popularity ranking. `average_rating` is the
/// unrounded mean used for ordering.
#[derive(Debug, Clone, PartialEq)]
pub struct PopularBook {
    pub book_id: String,
    pub book_title: String,
    pub average_rating: f64,
    pub total_ratings: i64,
}

/// A quote captured while reading, owned exclusively by its parent
/// `ReadingProgress` record. Ordering within the parent is insertion order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    pub id: Uuid,
    pub text: String,
    pub chapter: Option<i32>,
    pub page: Option<i32>,
    pub created_at: DateTime<Utc>,
}

/// Where a user is in a book, plus their collected quotes. At most one
/// record exists per `(user_id, book_id)`.
#[derive(Debug, Clone)]
pub struct ReadingProgress {
    pub id: Uuid,
    pub user_id: Uuid,
    pub book_id: String,
    pub book_title: String,
    pub chapter: i32,
    pub page: i32,
    pub paragraph: i32,
    pub line_number: i32,
    pub quotes: Vec<Quote>,
    pub last_read_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The position fields a progress save may carry. Absent fields keep their
/// stored values; on first write they fall back to the default of 1.
#[derive(Debug, Clone, Default)]
pub struct ProgressFields {
    pub chapter: Option<i32>,
    pub page: Option<i32>,
    pub paragraph: Option<i32>,
    pub line_number: Option<i32>,
}

/// A partial update to an existing progress record. Unlike a save, this may
/// also replace the whole quote collection.
#[derive(Debug, Clone, Default)]
pub struct ProgressPatch {
    pub chapter: Option<i32>,
    pub page: Option<i32>,
    pub paragraph: Option<i32>,
    pub line_number: Option<i32>,
    pub quotes: Option<Vec<Quote>>,
}

/// The shelf a library entry lives on. The same book may sit on several
/// shelves at once; each `(user, book, kind)` triple is its own entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LibraryKind {
    Favorite,
    Bookmark,
    Saved,
}

impl LibraryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LibraryKind::Favorite => "favorite",
            LibraryKind::Bookmark => "bookmark",
            LibraryKind::Saved => "saved",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "favorite" => Some(LibraryKind::Favorite),
            "bookmark" => Some(LibraryKind::Bookmark),
            "saved" => Some(LibraryKind::Saved),
            _ => None,
        }
    }
}

/// A saved/favorite/bookmark entry in a user's library.
#[derive(Debug, Clone)]
pub struct LibraryEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub book_id: String,
    pub book_title: String,
    pub book_author: String,
    pub book_cover: String,
    pub kind: LibraryKind,
    pub added_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Result of a library membership check. Absence is a normal result, not an
/// error.
#[derive(Debug, Clone)]
pub struct LibraryCheck {
    pub in_library: bool,
    pub kind: Option<LibraryKind>,
}

/// A book in the self-hosted seed catalog, distinct from Catalog Provider
/// data.
#[derive(Debug, Clone)]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub cover: String,
    pub rating: f64,
    pub year: i32,
    pub genre: String,
    pub language: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// Filters for listing the local catalog.
#[derive(Debug, Clone, Default)]
pub struct BookFilter {
    pub search: Option<String>,
    pub genre: Option<String>,
    pub min_rating: Option<f64>,
    pub language: Option<String>,
    pub page: i64,
    pub limit: i64,
}

/// Fields for creating a local catalog book.
#[derive(Debug, Clone)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub cover: String,
    pub rating: f64,
    pub year: i32,
    pub genre: String,
    pub language: String,
    pub description: String,
}

// Represents a user - used throughout the app.
#[derive(Debug, Clone)]
pub struct User {
    pub user_id: Uuid,
    pub email: Option<String>,
}

// Only used internally for login/signup - contains sensitive data.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user_id: Uuid,
    pub email: String,
    pub hashed_password: String,
}

/// A book as returned by the external Catalog Provider.
#[derive(Debug, Clone)]
pub struct CatalogBook {
    pub id: String,
    pub title: String,
    pub author: String,
    pub cover: String,
    pub year: Option<i32>,
    pub subjects: Vec<String>,
    pub description: String,
    pub isbn: Option<String>,
}

/// One page of Catalog Provider search results.
#[derive(Debug, Clone)]
pub struct CatalogPage {
    pub books: Vec<CatalogBook>,
    pub total: i64,
    pub page: i64,
    pub total_pages: i64,
}
