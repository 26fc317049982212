//! crates/readwell_core/src/test_support.rs
//!
//! An in-memory `DatabaseService` used by the engine unit tests. It mirrors
//! the semantics the real adapter gets from the database: composite-key
//! upserts, merge-on-save, in-place quote mutation, and unique-key
//! enforcement.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::{
    Book, BookFilter, LibraryEntry, LibraryKind, NewBook, ProgressFields, ProgressPatch, Quote,
    Rating, ReadingProgress, User, UserCredentials,
};
use crate::ports::{DatabaseService, PortError, PortResult};

#[derive(Default)]
struct State {
    users: HashMap<Uuid, UserCredentials>,
    sessions: HashMap<String, (Uuid, DateTime<Utc>)>,
    ratings: Vec<Rating>,
    progress: Vec<ReadingProgress>,
    library: Vec<LibraryEntry>,
    books: Vec<Book>,
}

#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rewrites `created_at` for every rating of `book_id`, for windowing
    /// tests.
    pub async fn backdate_ratings(&self, book_id: &str, created_at: DateTime<Utc>) {
        let mut state = self.state.lock().await;
        for rating in state.ratings.iter_mut().filter(|r| r.book_id == book_id) {
            rating.created_at = created_at;
        }
    }
}

#[async_trait]
impl DatabaseService for InMemoryStore {
    async fn create_user_with_email(
        &self,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<User> {
        let mut state = self.state.lock().await;
        if state.users.values().any(|u| u.email == email) {
            return Err(PortError::Validation(
                "Email is already registered".to_string(),
            ));
        }
        let user_id = Uuid::new_v4();
        state.users.insert(
            user_id,
            UserCredentials {
                user_id,
                email: email.to_string(),
                hashed_password: hashed_password.to_string(),
            },
        );
        Ok(User {
            user_id,
            email: Some(email.to_string()),
        })
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let state = self.state.lock().await;
        state
            .users
            .values()
            .find(|u| u.email == email)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("User {email} not found")))
    }

    async fn get_user(&self, user_id: Uuid) -> PortResult<User> {
        let state = self.state.lock().await;
        state
            .users
            .get(&user_id)
            .map(|u| User {
                user_id: u.user_id,
                email: Some(u.email.clone()),
            })
            .ok_or_else(|| PortError::NotFound(format!("User {user_id} not found")))
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        let mut state = self.state.lock().await;
        state
            .sessions
            .insert(session_id.to_string(), (user_id, expires_at));
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        let state = self.state.lock().await;
        match state.sessions.get(session_id) {
            Some((user_id, expires_at)) if *expires_at > Utc::now() => Ok(*user_id),
            _ => Err(PortError::Unauthorized),
        }
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        let mut state = self.state.lock().await;
        state.sessions.remove(session_id);
        Ok(())
    }

    async fn upsert_rating(
        &self,
        user_id: Uuid,
        book_id: &str,
        book_title: &str,
        rating: i32,
    ) -> PortResult<Rating> {
        let mut state = self.state.lock().await;
        let now = Utc::now();
        if let Some(existing) = state
            .ratings
            .iter_mut()
            .find(|r| r.user_id == user_id && r.book_id == book_id)
        {
            existing.rating = rating;
            existing.book_title = book_title.to_string();
            existing.updated_at = now;
            return Ok(existing.clone());
        }
        let record = Rating {
            id: Uuid::new_v4(),
            user_id,
            book_id: book_id.to_string(),
            book_title: book_title.to_string(),
            rating,
            created_at: now,
            updated_at: now,
        };
        state.ratings.push(record.clone());
        Ok(record)
    }

    async fn find_rating(&self, user_id: Uuid, book_id: &str) -> PortResult<Option<Rating>> {
        let state = self.state.lock().await;
        Ok(state
            .ratings
            .iter()
            .find(|r| r.user_id == user_id && r.book_id == book_id)
            .cloned())
    }

    async fn ratings_for_book(&self, book_id: &str) -> PortResult<Vec<Rating>> {
        let state = self.state.lock().await;
        Ok(state
            .ratings
            .iter()
            .filter(|r| r.book_id == book_id)
            .cloned()
            .collect())
    }

    async fn ratings_for_user(&self, user_id: Uuid) -> PortResult<Vec<Rating>> {
        let state = self.state.lock().await;
        let mut listed: Vec<Rating> = state
            .ratings
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        listed.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(listed)
    }

    async fn ratings_since(&self, cutoff: DateTime<Utc>) -> PortResult<Vec<Rating>> {
        let state = self.state.lock().await;
        Ok(state
            .ratings
            .iter()
            .filter(|r| r.created_at >= cutoff)
            .cloned()
            .collect())
    }

    async fn save_progress(
        &self,
        user_id: Uuid,
        book_id: &str,
        book_title: &str,
        fields: &ProgressFields,
    ) -> PortResult<ReadingProgress> {
        let mut state = self.state.lock().await;
        let now = Utc::now();
        if let Some(existing) = state
            .progress
            .iter_mut()
            .find(|p| p.user_id == user_id && p.book_id == book_id)
        {
            existing.book_title = book_title.to_string();
            if let Some(chapter) = fields.chapter {
                existing.chapter = chapter;
            }
            if let Some(page) = fields.page {
                existing.page = page;
            }
            if let Some(paragraph) = fields.paragraph {
                existing.paragraph = paragraph;
            }
            if let Some(line_number) = fields.line_number {
                existing.line_number = line_number;
            }
            existing.last_read_at = now;
            existing.updated_at = now;
            return Ok(existing.clone());
        }
        let record = ReadingProgress {
            id: Uuid::new_v4(),
            user_id,
            book_id: book_id.to_string(),
            book_title: book_title.to_string(),
            chapter: fields.chapter.unwrap_or(1),
            page: fields.page.unwrap_or(1),
            paragraph: fields.paragraph.unwrap_or(1),
            line_number: fields.line_number.unwrap_or(1),
            quotes: Vec::new(),
            last_read_at: now,
            created_at: now,
            updated_at: now,
        };
        state.progress.push(record.clone());
        Ok(record)
    }

    async fn find_progress(
        &self,
        user_id: Uuid,
        book_id: &str,
    ) -> PortResult<Option<ReadingProgress>> {
        let state = self.state.lock().await;
        Ok(state
            .progress
            .iter()
            .find(|p| p.user_id == user_id && p.book_id == book_id)
            .cloned())
    }

    async fn update_progress(
        &self,
        user_id: Uuid,
        book_id: &str,
        patch: &ProgressPatch,
    ) -> PortResult<Option<ReadingProgress>> {
        let mut state = self.state.lock().await;
        let Some(existing) = state
            .progress
            .iter_mut()
            .find(|p| p.user_id == user_id && p.book_id == book_id)
        else {
            return Ok(None);
        };
        if let Some(chapter) = patch.chapter {
            existing.chapter = chapter;
        }
        if let Some(page) = patch.page {
            existing.page = page;
        }
        if let Some(paragraph) = patch.paragraph {
            existing.paragraph = paragraph;
        }
        if let Some(line_number) = patch.line_number {
            existing.line_number = line_number;
        }
        if let Some(quotes) = &patch.quotes {
            existing.quotes = quotes.clone();
        }
        existing.updated_at = Utc::now();
        Ok(Some(existing.clone()))
    }

    async fn append_quote(
        &self,
        user_id: Uuid,
        book_id: &str,
        book_title: &str,
        quote: &Quote,
    ) -> PortResult<ReadingProgress> {
        let mut state = self.state.lock().await;
        let now = Utc::now();
        if let Some(existing) = state
            .progress
            .iter_mut()
            .find(|p| p.user_id == user_id && p.book_id == book_id)
        {
            existing.quotes.push(quote.clone());
            existing.updated_at = now;
            return Ok(existing.clone());
        }
        let record = ReadingProgress {
            id: Uuid::new_v4(),
            user_id,
            book_id: book_id.to_string(),
            book_title: book_title.to_string(),
            chapter: 1,
            page: 1,
            paragraph: 1,
            line_number: 1,
            quotes: vec![quote.clone()],
            last_read_at: now,
            created_at: now,
            updated_at: now,
        };
        state.progress.push(record.clone());
        Ok(record)
    }

    async fn remove_quote(
        &self,
        user_id: Uuid,
        book_id: &str,
        quote_id: Uuid,
    ) -> PortResult<Option<ReadingProgress>> {
        let mut state = self.state.lock().await;
        let Some(existing) = state
            .progress
            .iter_mut()
            .find(|p| p.user_id == user_id && p.book_id == book_id)
        else {
            return Ok(None);
        };
        existing.quotes.retain(|q| q.id != quote_id);
        existing.updated_at = Utc::now();
        Ok(Some(existing.clone()))
    }

    async fn list_progress(&self, user_id: Uuid) -> PortResult<Vec<ReadingProgress>> {
        let state = self.state.lock().await;
        let mut listed: Vec<ReadingProgress> = state
            .progress
            .iter()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect();
        listed.sort_by(|a, b| b.last_read_at.cmp(&a.last_read_at));
        Ok(listed)
    }

    async fn upsert_library_entry(
        &self,
        user_id: Uuid,
        book_id: &str,
        kind: LibraryKind,
        book_title: &str,
        book_author: &str,
        book_cover: &str,
    ) -> PortResult<LibraryEntry> {
        let mut state = self.state.lock().await;
        let now = Utc::now();
        if let Some(existing) = state
            .library
            .iter_mut()
            .find(|e| e.user_id == user_id && e.book_id == book_id && e.kind == kind)
        {
            existing.book_title = book_title.to_string();
            existing.book_author = book_author.to_string();
            existing.book_cover = book_cover.to_string();
            existing.added_at = now;
            existing.updated_at = now;
            return Ok(existing.clone());
        }
        let entry = LibraryEntry {
            id: Uuid::new_v4(),
            user_id,
            book_id: book_id.to_string(),
            book_title: book_title.to_string(),
            book_author: book_author.to_string(),
            book_cover: book_cover.to_string(),
            kind,
            added_at: now,
            created_at: now,
            updated_at: now,
        };
        state.library.push(entry.clone());
        Ok(entry)
    }

    async fn remove_library_entries(
        &self,
        user_id: Uuid,
        book_id: &str,
        kind: Option<LibraryKind>,
    ) -> PortResult<u64> {
        let mut state = self.state.lock().await;
        let before = state.library.len();
        state.library.retain(|e| {
            !(e.user_id == user_id
                && e.book_id == book_id
                && kind.map_or(true, |k| e.kind == k))
        });
        Ok((before - state.library.len()) as u64)
    }

    async fn find_library_entry(
        &self,
        user_id: Uuid,
        book_id: &str,
    ) -> PortResult<Option<LibraryEntry>> {
        let state = self.state.lock().await;
        Ok(state
            .library
            .iter()
            .filter(|e| e.user_id == user_id && e.book_id == book_id)
            .max_by_key(|e| e.added_at)
            .cloned())
    }

    async fn list_library_entries(
        &self,
        user_id: Uuid,
        kind: Option<LibraryKind>,
    ) -> PortResult<Vec<LibraryEntry>> {
        let state = self.state.lock().await;
        let mut listed: Vec<LibraryEntry> = state
            .library
            .iter()
            .filter(|e| e.user_id == user_id && kind.map_or(true, |k| e.kind == k))
            .cloned()
            .collect();
        listed.sort_by(|a, b| b.added_at.cmp(&a.added_at));
        Ok(listed)
    }

    async fn list_books(&self, filter: &BookFilter) -> PortResult<(Vec<Book>, i64)> {
        let state = self.state.lock().await;
        let mut matches: Vec<Book> = state
            .books
            .iter()
            .filter(|b| {
                filter.search.as_deref().map_or(true, |s| {
                    let s = s.to_lowercase();
                    b.title.to_lowercase().contains(&s) || b.author.to_lowercase().contains(&s)
                }) && filter.genre.as_deref().map_or(true, |g| b.genre == g)
                    && filter.min_rating.map_or(true, |m| b.rating >= m)
                    && filter.language.as_deref().map_or(true, |l| b.language == l)
            })
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.title.cmp(&b.title));
        let total = matches.len() as i64;
        let offset = ((filter.page - 1).max(0) * filter.limit) as usize;
        let paged = matches
            .into_iter()
            .skip(offset)
            .take(filter.limit.max(0) as usize)
            .collect();
        Ok((paged, total))
    }

    async fn get_book(&self, book_id: Uuid) -> PortResult<Option<Book>> {
        let state = self.state.lock().await;
        Ok(state.books.iter().find(|b| b.id == book_id).cloned())
    }

    async fn create_book(&self, book: &NewBook) -> PortResult<Book> {
        let mut state = self.state.lock().await;
        let record = Book {
            id: Uuid::new_v4(),
            title: book.title.clone(),
            author: book.author.clone(),
            cover: book.cover.clone(),
            rating: book.rating,
            year: book.year,
            genre: book.genre.clone(),
            language: book.language.clone(),
            description: book.description.clone(),
            created_at: Utc::now(),
        };
        state.books.push(record.clone());
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(title: &str, author: &str, genre: &str, language: &str, rating: f64) -> NewBook {
        NewBook {
            title: title.to_string(),
            author: author.to_string(),
            cover: String::new(),
            rating,
            year: 2000,
            genre: genre.to_string(),
            language: language.to_string(),
            description: String::new(),
        }
    }

    async fn seeded() -> InMemoryStore {
        let store = InMemoryStore::new();
        for b in [
            book("Dune", "Frank Herbert", "scifi", "english", 4.8),
            book("Foundation", "Isaac Asimov", "scifi", "english", 4.6),
            book("The Great Gatsby", "F. Scott Fitzgerald", "fiction", "english", 4.5),
            book("Niebla", "Miguel de Unamuno", "fiction", "spanish", 4.2),
        ] {
            store.create_book(&b).await.unwrap();
        }
        store
    }

    fn one_page() -> BookFilter {
        BookFilter {
            page: 1,
            limit: 50,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn search_matches_title_and_author_case_insensitively() {
        let store = seeded().await;

        let (by_title, total) = store
            .list_books(&BookFilter {
                search: Some("dune".to_string()),
                ..one_page()
            })
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(by_title[0].title, "Dune");

        let (by_author, _) = store
            .list_books(&BookFilter {
                search: Some("ASIMOV".to_string()),
                ..one_page()
            })
            .await
            .unwrap();
        assert_eq!(by_author.len(), 1);
        assert_eq!(by_author[0].title, "Foundation");
    }

    #[tokio::test]
    async fn genre_rating_and_language_filters_combine() {
        let store = seeded().await;
        let (books, total) = store
            .list_books(&BookFilter {
                genre: Some("fiction".to_string()),
                min_rating: Some(4.4),
                language: Some("english".to_string()),
                ..one_page()
            })
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(books[0].title, "The Great Gatsby");
    }

    #[tokio::test]
    async fn pagination_slices_but_reports_full_total() {
        let store = seeded().await;
        let page = |n| BookFilter {
            page: n,
            limit: 3,
            ..Default::default()
        };

        let (first, total) = store.list_books(&page(1)).await.unwrap();
        assert_eq!(total, 4);
        assert_eq!(first.len(), 3);

        // Title ordering keeps the pages disjoint and stable.
        let (second, _) = store.list_books(&page(2)).await.unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].title, "The Great Gatsby");
    }
}
