//! crates/readwell_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the
//! core to be independent of specific external implementations like databases
//! or upstream catalog APIs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    Book, BookFilter, CatalogBook, CatalogPage, LibraryEntry, LibraryKind, NewBook,
    ProgressFields, ProgressPatch, Quote, Rating, ReadingProgress, User, UserCredentials,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services
/// (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Upstream service failure: {0}")]
    Upstream(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// The persistence port. Upsert methods must be implemented as single atomic
/// find-and-upsert operations keyed by their uniqueness constraint, never as
/// an existence check followed by a separate write. Quote append/removal must
/// mutate the embedded collection in place on the parent record.
#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- User and Auth Management ---
    async fn create_user_with_email(
        &self,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<User>;

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    async fn get_user(&self, user_id: Uuid) -> PortResult<User>;

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid>;

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;

    // --- Ratings ---
    async fn upsert_rating(
        &self,
        user_id: Uuid,
        book_id: &str,
        book_title: &str,
        rating: i32,
    ) -> PortResult<Rating>;

    async fn find_rating(&self, user_id: Uuid, book_id: &str) -> PortResult<Option<Rating>>;

    async fn ratings_for_book(&self, book_id: &str) -> PortResult<Vec<Rating>>;

    async fn ratings_for_user(&self, user_id: Uuid) -> PortResult<Vec<Rating>>;

    /// All ratings created at or after `cutoff`, for windowed aggregation.
    async fn ratings_since(&self, cutoff: DateTime<Utc>) -> PortResult<Vec<Rating>>;

    // --- Reading Progress ---
    /// Atomic upsert-merge: provided fields overwrite, absent fields keep
    /// their stored values (or the default of 1 on first write), and
    /// `last_read_at` always advances.
    async fn save_progress(
        &self,
        user_id: Uuid,
        book_id: &str,
        book_title: &str,
        fields: &ProgressFields,
    ) -> PortResult<ReadingProgress>;

    async fn find_progress(
        &self,
        user_id: Uuid,
        book_id: &str,
    ) -> PortResult<Option<ReadingProgress>>;

    /// Partial update of an existing record; returns `None` when no record
    /// exists (this operation never creates).
    async fn update_progress(
        &self,
        user_id: Uuid,
        book_id: &str,
        patch: &ProgressPatch,
    ) -> PortResult<Option<ReadingProgress>>;

    /// Atomic append of `quote` to the parent's collection, creating the
    /// parent with default position fields when absent. `book_title` is used
    /// only on the insert path.
    async fn append_quote(
        &self,
        user_id: Uuid,
        book_id: &str,
        book_title: &str,
        quote: &Quote,
    ) -> PortResult<ReadingProgress>;

    /// Atomic removal of the quote with `quote_id`; returns `None` when the
    /// parent record does not exist. A non-matching id leaves the collection
    /// unchanged.
    async fn remove_quote(
        &self,
        user_id: Uuid,
        book_id: &str,
        quote_id: Uuid,
    ) -> PortResult<Option<ReadingProgress>>;

    /// All progress records for the user, ordered by `last_read_at`
    /// descending.
    async fn list_progress(&self, user_id: Uuid) -> PortResult<Vec<ReadingProgress>>;

    // --- Library ---
    async fn upsert_library_entry(
        &self,
        user_id: Uuid,
        book_id: &str,
        kind: LibraryKind,
        book_title: &str,
        book_author: &str,
        book_cover: &str,
    ) -> PortResult<LibraryEntry>;

    /// Removes matching entries and returns how many were deleted. `kind` of
    /// `None` matches every kind for the pair.
    async fn remove_library_entries(
        &self,
        user_id: Uuid,
        book_id: &str,
        kind: Option<LibraryKind>,
    ) -> PortResult<u64>;

    /// The most recently added entry for the pair, any kind.
    async fn find_library_entry(
        &self,
        user_id: Uuid,
        book_id: &str,
    ) -> PortResult<Option<LibraryEntry>>;

    async fn list_library_entries(
        &self,
        user_id: Uuid,
        kind: Option<LibraryKind>,
    ) -> PortResult<Vec<LibraryEntry>>;

    // --- Local Book Catalog ---
    /// Returns the matching page of books plus the total match count.
    async fn list_books(&self, filter: &BookFilter) -> PortResult<(Vec<Book>, i64)>;

    async fn get_book(&self, book_id: Uuid) -> PortResult<Option<Book>>;

    async fn create_book(&self, book: &NewBook) -> PortResult<Book>;
}

/// The external Catalog Provider port. Implementations must bound every call
/// with a timeout and surface failures as `PortError::Upstream`.
#[async_trait]
pub trait CatalogService: Send + Sync {
    async fn search(&self, query: &str, page: i64, limit: i64) -> PortResult<CatalogPage>;

    /// `book_id` is the provider's hierarchical key (e.g. `/works/OL45883W`).
    async fn book(&self, book_id: &str) -> PortResult<CatalogBook>;

    async fn popular(&self) -> PortResult<Vec<CatalogBook>>;

    async fn category(&self, genre: &str, page: i64, limit: i64) -> PortResult<CatalogPage>;
}
