//! crates/readwell_core/src/library.rs
//!
//! The library engine: per-user saved/favorite/bookmark entries keyed by
//! `(user, book, kind)`, upsert-on-add and delete-on-remove.

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{LibraryCheck, LibraryEntry, LibraryKind};
use crate::ports::{DatabaseService, PortError, PortResult};

#[derive(Clone)]
pub struct LibraryEngine {
    store: Arc<dyn DatabaseService>,
}

impl LibraryEngine {
    pub fn new(store: Arc<dyn DatabaseService>) -> Self {
        Self { store }
    }

    /// Adds the book to the given shelf, or refreshes `added_at` when it is
    /// already there.
    pub async fn add_entry(
        &self,
        user_id: Uuid,
        book_id: &str,
        kind: LibraryKind,
        book_title: &str,
        book_author: Option<&str>,
        book_cover: Option<&str>,
    ) -> PortResult<LibraryEntry> {
        if book_id.is_empty() || book_title.is_empty() {
            return Err(PortError::Validation(
                "Book ID and title are required".to_string(),
            ));
        }
        self.store
            .upsert_library_entry(
                user_id,
                book_id,
                kind,
                book_title,
                book_author.unwrap_or("Unknown"),
                book_cover.unwrap_or(""),
            )
            .await
    }

    /// Removes the entry for `kind`, or every kind when `kind` is `None`.
    pub async fn remove_entry(
        &self,
        user_id: Uuid,
        book_id: &str,
        kind: Option<LibraryKind>,
    ) -> PortResult<()> {
        let deleted = self
            .store
            .remove_library_entries(user_id, book_id, kind)
            .await?;
        if deleted == 0 {
            return Err(PortError::NotFound(
                "Book not found in library".to_string(),
            ));
        }
        Ok(())
    }

    /// Membership check; absence is a normal result.
    pub async fn check_entry(&self, user_id: Uuid, book_id: &str) -> PortResult<LibraryCheck> {
        let entry = self.store.find_library_entry(user_id, book_id).await?;
        Ok(LibraryCheck {
            in_library: entry.is_some(),
            kind: entry.map(|e| e.kind),
        })
    }

    pub async fn list_entries(
        &self,
        user_id: Uuid,
        kind: Option<LibraryKind>,
    ) -> PortResult<Vec<LibraryEntry>> {
        self.store.list_library_entries(user_id, kind).await
    }
}
