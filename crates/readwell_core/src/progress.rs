//! crates/readwell_core/src/progress.rs
//!
//! The reading-progress engine: one record per `(user, book)` holding four
//! position fields and an insertion-ordered quote collection. Saves merge,
//! updates never create, quote append/removal are atomic on the parent
//! record.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::domain::{ProgressFields, ProgressPatch, Quote, ReadingProgress};
use crate::ports::{DatabaseService, PortError, PortResult};

#[derive(Clone)]
pub struct ProgressEngine {
    store: Arc<dyn DatabaseService>,
}

impl ProgressEngine {
    pub fn new(store: Arc<dyn DatabaseService>) -> Self {
        Self { store }
    }

    /// Create-or-merge: fields present in the request overwrite, fields
    /// omitted keep their stored values (defaults of 1 on first write).
    /// `last_read_at` always advances.
    pub async fn save_progress(
        &self,
        user_id: Uuid,
        book_id: &str,
        book_title: &str,
        fields: &ProgressFields,
    ) -> PortResult<ReadingProgress> {
        if book_id.is_empty() || book_title.is_empty() {
            return Err(PortError::Validation(
                "Book ID and title are required".to_string(),
            ));
        }
        validate_positions(&[
            fields.chapter,
            fields.page,
            fields.paragraph,
            fields.line_number,
        ])?;
        self.store
            .save_progress(user_id, book_id, book_title, fields)
            .await
    }

    /// Unlike `user_rating`, a missing progress record is an error. The read
    /// path distinguishes absence on purpose.
    pub async fn get_progress(&self, user_id: Uuid, book_id: &str) -> PortResult<ReadingProgress> {
        self.store
            .find_progress(user_id, book_id)
            .await?
            .ok_or_else(|| PortError::NotFound("Reading progress not found".to_string()))
    }

    /// Partial update of an existing record; never creates. A `quotes` field
    /// in the patch replaces the whole collection.
    pub async fn update_progress(
        &self,
        user_id: Uuid,
        book_id: &str,
        patch: &ProgressPatch,
    ) -> PortResult<ReadingProgress> {
        validate_positions(&[patch.chapter, patch.page, patch.paragraph, patch.line_number])?;
        if let Some(quotes) = &patch.quotes {
            if quotes.iter().any(|q| q.text.trim().is_empty()) {
                return Err(PortError::Validation(
                    "Quote text is required".to_string(),
                ));
            }
        }
        self.store
            .update_progress(user_id, book_id, patch)
            .await?
            .ok_or_else(|| PortError::NotFound("Reading progress not found".to_string()))
    }

    /// Appends a quote, auto-creating the parent record with default
    /// position fields when absent.
    pub async fn add_quote(
        &self,
        user_id: Uuid,
        book_id: &str,
        book_title: &str,
        text: &str,
        chapter: Option<i32>,
        page: Option<i32>,
    ) -> PortResult<ReadingProgress> {
        if book_id.is_empty() {
            return Err(PortError::Validation("Book ID is required".to_string()));
        }
        if text.trim().is_empty() {
            return Err(PortError::Validation(
                "Quote text is required".to_string(),
            ));
        }
        let quote = Quote {
            id: Uuid::new_v4(),
            text: text.to_string(),
            chapter,
            page,
            created_at: Utc::now(),
        };
        self.store
            .append_quote(user_id, book_id, book_title, &quote)
            .await
    }

    /// Removes the quote with `quote_id`. A non-matching id is a no-op; a
    /// missing parent record is NotFound.
    pub async fn delete_quote(
        &self,
        user_id: Uuid,
        book_id: &str,
        quote_id: Uuid,
    ) -> PortResult<ReadingProgress> {
        self.store
            .remove_quote(user_id, book_id, quote_id)
            .await?
            .ok_or_else(|| PortError::NotFound("Reading progress not found".to_string()))
    }

    pub async fn list_progress(&self, user_id: Uuid) -> PortResult<Vec<ReadingProgress>> {
        self.store.list_progress(user_id).await
    }
}

fn validate_positions(fields: &[Option<i32>]) -> PortResult<()> {
    if fields.iter().flatten().any(|v| *v < 0) {
        return Err(PortError::Validation(
            "Position fields must not be negative".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::InMemoryStore;

    fn engine() -> ProgressEngine {
        ProgressEngine::new(Arc::new(InMemoryStore::new()))
    }

    #[tokio::test]
    async fn first_save_fills_defaults() {
        let engine = engine();
        let user = Uuid::new_v4();
        let fields = ProgressFields {
            chapter: Some(3),
            ..Default::default()
        };
        let progress = engine
            .save_progress(user, "B1", "Book One", &fields)
            .await
            .unwrap();
        assert_eq!(progress.chapter, 3);
        assert_eq!(progress.page, 1);
        assert_eq!(progress.paragraph, 1);
        assert_eq!(progress.line_number, 1);
        assert!(progress.quotes.is_empty());
    }

    #[tokio::test]
    async fn save_merges_instead_of_resetting() {
        let engine = engine();
        let user = Uuid::new_v4();
        engine
            .save_progress(
                user,
                "B1",
                "Book One",
                &ProgressFields {
                    chapter: Some(1),
                    page: Some(7),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let merged = engine
            .save_progress(
                user,
                "B1",
                "Book One",
                &ProgressFields {
                    chapter: Some(3),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        // page survives the chapter-only save.
        assert_eq!(merged.chapter, 3);
        assert_eq!(merged.page, 7);
    }

    #[tokio::test]
    async fn save_advances_last_read_at() {
        let engine = engine();
        let user = Uuid::new_v4();
        let first = engine
            .save_progress(user, "B1", "Book One", &ProgressFields::default())
            .await
            .unwrap();
        let second = engine
            .save_progress(user, "B1", "Book One", &ProgressFields::default())
            .await
            .unwrap();
        assert!(second.last_read_at >= first.last_read_at);
    }

    #[tokio::test]
    async fn get_missing_progress_is_not_found() {
        let engine = engine();
        let err = engine.get_progress(Uuid::new_v4(), "B1").await.unwrap_err();
        assert!(matches!(err, PortError::NotFound(_)));
    }

    #[tokio::test]
    async fn update_never_creates() {
        let engine = engine();
        let err = engine
            .update_progress(
                Uuid::new_v4(),
                "B1",
                &ProgressPatch {
                    chapter: Some(2),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::NotFound(_)));
    }

    #[tokio::test]
    async fn update_replaces_quotes_wholesale() {
        let engine = engine();
        let user = Uuid::new_v4();
        engine
            .add_quote(user, "B1", "Book One", "first", None, None)
            .await
            .unwrap();
        engine
            .add_quote(user, "B1", "Book One", "second", None, None)
            .await
            .unwrap();

        let replacement = vec![Quote {
            id: Uuid::new_v4(),
            text: "only one now".to_string(),
            chapter: Some(4),
            page: None,
            created_at: Utc::now(),
        }];
        let updated = engine
            .update_progress(
                user,
                "B1",
                &ProgressPatch {
                    quotes: Some(replacement),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.quotes.len(), 1);
        assert_eq!(updated.quotes[0].text, "only one now");
    }

    #[tokio::test]
    async fn negative_position_is_rejected() {
        let engine = engine();
        let err = engine
            .save_progress(
                Uuid::new_v4(),
                "B1",
                "Book One",
                &ProgressFields {
                    page: Some(-1),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::Validation(_)));
    }

    #[tokio::test]
    async fn quotes_get_distinct_ids_in_insertion_order() {
        let engine = engine();
        let user = Uuid::new_v4();
        engine
            .add_quote(user, "B1", "Book One", "alpha", Some(1), None)
            .await
            .unwrap();
        let progress = engine
            .add_quote(user, "B1", "Book One", "beta", None, Some(12))
            .await
            .unwrap();

        assert_eq!(progress.quotes.len(), 2);
        assert_eq!(progress.quotes[0].text, "alpha");
        assert_eq!(progress.quotes[1].text, "beta");
        assert_ne!(progress.quotes[0].id, progress.quotes[1].id);
        // The parent was auto-created with default positions.
        assert_eq!(progress.chapter, 1);
        assert_eq!(progress.page, 1);
    }

    #[tokio::test]
    async fn empty_quote_text_is_rejected() {
        let engine = engine();
        let err = engine
            .add_quote(Uuid::new_v4(), "B1", "Book One", "   ", None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::Validation(_)));
    }

    #[tokio::test]
    async fn deleting_unknown_quote_id_is_a_noop() {
        let engine = engine();
        let user = Uuid::new_v4();
        engine
            .add_quote(user, "B1", "Book One", "keep me", None, None)
            .await
            .unwrap();
        let progress = engine
            .delete_quote(user, "B1", Uuid::new_v4())
            .await
            .unwrap();
        assert_eq!(progress.quotes.len(), 1);
        assert_eq!(progress.quotes[0].text, "keep me");
    }

    #[tokio::test]
    async fn deleting_quote_removes_only_that_quote() {
        let engine = engine();
        let user = Uuid::new_v4();
        let first = engine
            .add_quote(user, "B1", "Book One", "going away", None, None)
            .await
            .unwrap();
        engine
            .add_quote(user, "B1", "Book One", "staying", None, None)
            .await
            .unwrap();

        let target = first.quotes[0].id;
        let progress = engine.delete_quote(user, "B1", target).await.unwrap();
        assert_eq!(progress.quotes.len(), 1);
        assert_eq!(progress.quotes[0].text, "staying");
    }

    #[tokio::test]
    async fn deleting_middle_quote_keeps_survivor_order() {
        let engine = engine();
        let user = Uuid::new_v4();
        engine
            .add_quote(user, "B1", "Book One", "first", None, None)
            .await
            .unwrap();
        let with_middle = engine
            .add_quote(user, "B1", "Book One", "middle", None, None)
            .await
            .unwrap();
        engine
            .add_quote(user, "B1", "Book One", "last", None, None)
            .await
            .unwrap();

        let target = with_middle.quotes[1].id;
        let progress = engine.delete_quote(user, "B1", target).await.unwrap();
        assert_eq!(progress.quotes.len(), 2);
        assert_eq!(progress.quotes[0].text, "first");
        assert_eq!(progress.quotes[1].text, "last");
    }

    #[tokio::test]
    async fn deleting_from_missing_record_is_not_found() {
        let engine = engine();
        let err = engine
            .delete_quote(Uuid::new_v4(), "B1", Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::NotFound(_)));
    }

    #[tokio::test]
    async fn list_orders_by_last_read_desc() {
        let engine = engine();
        let user = Uuid::new_v4();
        engine
            .save_progress(user, "older", "Older", &ProgressFields::default())
            .await
            .unwrap();
        engine
            .save_progress(user, "newer", "Newer", &ProgressFields::default())
            .await
            .unwrap();
        // Touching the first book moves it back to the front.
        engine
            .save_progress(user, "older", "Older", &ProgressFields::default())
            .await
            .unwrap();

        let listed = engine.list_progress(user).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].book_id, "older");
        assert_eq!(listed[1].book_id, "newer");
    }

    #[tokio::test]
    async fn book_id_with_reserved_characters_round_trips() {
        let engine = engine();
        let user = Uuid::new_v4();
        let book_id = "/works/OL123W";
        engine
            .save_progress(user, book_id, "Slashy", &ProgressFields::default())
            .await
            .unwrap();
        let fetched = engine.get_progress(user, book_id).await.unwrap();
        assert_eq!(fetched.book_id, book_id);
    }
}
