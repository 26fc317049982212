//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete
//! implementation of the `DatabaseService` port from the core crate. It
//! handles all interactions with the PostgreSQL database using `sqlx`.
//!
//! Every composite-key write is a single `INSERT ... ON CONFLICT ... DO
//! UPDATE` statement, and the embedded quote collection is mutated in place
//! with JSONB operators, so the uniqueness and no-lost-update guarantees
//! come from the database rather than from read-modify-write sequences in
//! application code.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use readwell_core::domain::{
    Book, BookFilter, LibraryEntry, LibraryKind, NewBook, ProgressFields, ProgressPatch, Quote,
    Rating, ReadingProgress, User, UserCredentials,
};
use readwell_core::ports::{DatabaseService, PortError, PortResult};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Creates a new `PgStore`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn db_err(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    user_id: Uuid,
    email: String,
}
impl UserRecord {
    fn to_domain(self) -> User {
        User {
            user_id: self.user_id,
            email: Some(self.email),
        }
    }
}

#[derive(FromRow)]
struct CredentialsRecord {
    user_id: Uuid,
    email: String,
    hashed_password: String,
}
impl CredentialsRecord {
    fn to_domain(self) -> UserCredentials {
        UserCredentials {
            user_id: self.user_id,
            email: self.email,
            hashed_password: self.hashed_password,
        }
    }
}

#[derive(FromRow)]
struct RatingRecord {
    id: Uuid,
    user_id: Uuid,
    book_id: String,
    book_title: String,
    rating: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl RatingRecord {
    fn to_domain(self) -> Rating {
        Rating {
            id: self.id,
            user_id: self.user_id,
            book_id: self.book_id,
            book_title: self.book_title,
            rating: self.rating,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(FromRow)]
struct ProgressRecord {
    id: Uuid,
    user_id: Uuid,
    book_id: String,
    book_title: String,
    chapter: i32,
    page: i32,
    paragraph: i32,
    line_number: i32,
    quotes: Json<Vec<Quote>>,
    last_read_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl ProgressRecord {
    fn to_domain(self) -> ReadingProgress {
        ReadingProgress {
            id: self.id,
            user_id: self.user_id,
            book_id: self.book_id,
            book_title: self.book_title,
            chapter: self.chapter,
            page: self.page,
            paragraph: self.paragraph,
            line_number: self.line_number,
            quotes: self.quotes.0,
            last_read_at: self.last_read_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

const PROGRESS_COLUMNS: &str = "id, user_id, book_id, book_title, chapter, page, paragraph, \
     line_number, quotes, last_read_at, created_at, updated_at";

#[derive(FromRow)]
struct LibraryRecord {
    id: Uuid,
    user_id: Uuid,
    book_id: String,
    book_title: String,
    book_author: String,
    book_cover: String,
    kind: String,
    added_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl LibraryRecord {
    fn to_domain(self) -> PortResult<LibraryEntry> {
        let kind = LibraryKind::parse(&self.kind)
            .ok_or_else(|| PortError::Unexpected(format!("Unknown library kind {}", self.kind)))?;
        Ok(LibraryEntry {
            id: self.id,
            user_id: self.user_id,
            book_id: self.book_id,
            book_title: self.book_title,
            book_author: self.book_author,
            book_cover: self.book_cover,
            kind,
            added_at: self.added_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(FromRow)]
struct BookRecord {
    id: Uuid,
    title: String,
    author: String,
    cover: String,
    rating: f64,
    year: i32,
    genre: String,
    language: String,
    description: String,
    created_at: DateTime<Utc>,
}
impl BookRecord {
    fn to_domain(self) -> Book {
        Book {
            id: self.id,
            title: self.title,
            author: self.author,
            cover: self.cover,
            rating: self.rating,
            year: self.year,
            genre: self.genre,
            language: self.language,
            description: self.description,
            created_at: self.created_at,
        }
    }
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for PgStore {
    async fn create_user_with_email(
        &self,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "INSERT INTO users (email, hashed_password) VALUES ($1, $2) RETURNING user_id, email",
        )
        .bind(email)
        .bind(hashed_password)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                PortError::Validation("Email is already registered".to_string())
            }
            _ => db_err(e),
        })?;
        Ok(record.to_domain())
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, CredentialsRecord>(
            "SELECT user_id, email, hashed_password FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("User {email} not found")),
            _ => db_err(e),
        })?;
        Ok(record.to_domain())
    }

    async fn get_user(&self, user_id: Uuid) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT user_id, email FROM users WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("User {user_id} not found")),
            _ => db_err(e),
        })?;
        Ok(record.to_domain())
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query("INSERT INTO auth_sessions (id, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(session_id)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        let user_id: Option<(Uuid,)> = sqlx::query_as(
            "SELECT user_id FROM auth_sessions WHERE id = $1 AND expires_at > now()",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        user_id.map(|(id,)| id).ok_or(PortError::Unauthorized)
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn upsert_rating(
        &self,
        user_id: Uuid,
        book_id: &str,
        book_title: &str,
        rating: i32,
    ) -> PortResult<Rating> {
        let record = sqlx::query_as::<_, RatingRecord>(
            "INSERT INTO ratings (user_id, book_id, book_title, rating) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (user_id, book_id) DO UPDATE \
             SET rating = EXCLUDED.rating, book_title = EXCLUDED.book_title, updated_at = now() \
             RETURNING id, user_id, book_id, book_title, rating, created_at, updated_at",
        )
        .bind(user_id)
        .bind(book_id)
        .bind(book_title)
        .bind(rating)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(record.to_domain())
    }

    async fn find_rating(&self, user_id: Uuid, book_id: &str) -> PortResult<Option<Rating>> {
        let record = sqlx::query_as::<_, RatingRecord>(
            "SELECT id, user_id, book_id, book_title, rating, created_at, updated_at \
             FROM ratings WHERE user_id = $1 AND book_id = $2",
        )
        .bind(user_id)
        .bind(book_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(record.map(RatingRecord::to_domain))
    }

    async fn ratings_for_book(&self, book_id: &str) -> PortResult<Vec<Rating>> {
        let records = sqlx::query_as::<_, RatingRecord>(
            "SELECT id, user_id, book_id, book_title, rating, created_at, updated_at \
             FROM ratings WHERE book_id = $1",
        )
        .bind(book_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(records.into_iter().map(RatingRecord::to_domain).collect())
    }

    async fn ratings_for_user(&self, user_id: Uuid) -> PortResult<Vec<Rating>> {
        let records = sqlx::query_as::<_, RatingRecord>(
            "SELECT id, user_id, book_id, book_title, rating, created_at, updated_at \
             FROM ratings WHERE user_id = $1 ORDER BY updated_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(records.into_iter().map(RatingRecord::to_domain).collect())
    }

    async fn ratings_since(&self, cutoff: DateTime<Utc>) -> PortResult<Vec<Rating>> {
        let records = sqlx::query_as::<_, RatingRecord>(
            "SELECT id, user_id, book_id, book_title, rating, created_at, updated_at \
             FROM ratings WHERE created_at >= $1 ORDER BY created_at ASC",
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(records.into_iter().map(RatingRecord::to_domain).collect())
    }

    async fn save_progress(
        &self,
        user_id: Uuid,
        book_id: &str,
        book_title: &str,
        fields: &ProgressFields,
    ) -> PortResult<ReadingProgress> {
        // COALESCE against the stored row keeps omitted fields; the VALUES
        // side falls back to the column defaults of 1 on first write.
        let sql = format!(
            "INSERT INTO reading_progress \
                 (user_id, book_id, book_title, chapter, page, paragraph, line_number) \
             VALUES ($1, $2, $3, COALESCE($4::int, 1), COALESCE($5::int, 1), \
                     COALESCE($6::int, 1), COALESCE($7::int, 1)) \
             ON CONFLICT (user_id, book_id) DO UPDATE SET \
                 book_title = EXCLUDED.book_title, \
                 chapter = COALESCE($4::int, reading_progress.chapter), \
                 page = COALESCE($5::int, reading_progress.page), \
                 paragraph = COALESCE($6::int, reading_progress.paragraph), \
                 line_number = COALESCE($7::int, reading_progress.line_number), \
                 last_read_at = now(), \
                 updated_at = now() \
             RETURNING {PROGRESS_COLUMNS}"
        );
        let record = sqlx::query_as::<_, ProgressRecord>(&sql)
            .bind(user_id)
            .bind(book_id)
            .bind(book_title)
            .bind(fields.chapter)
            .bind(fields.page)
            .bind(fields.paragraph)
            .bind(fields.line_number)
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(record.to_domain())
    }

    async fn find_progress(
        &self,
        user_id: Uuid,
        book_id: &str,
    ) -> PortResult<Option<ReadingProgress>> {
        let sql = format!(
            "SELECT {PROGRESS_COLUMNS} FROM reading_progress \
             WHERE user_id = $1 AND book_id = $2"
        );
        let record = sqlx::query_as::<_, ProgressRecord>(&sql)
            .bind(user_id)
            .bind(book_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(record.map(ProgressRecord::to_domain))
    }

    async fn update_progress(
        &self,
        user_id: Uuid,
        book_id: &str,
        patch: &ProgressPatch,
    ) -> PortResult<Option<ReadingProgress>> {
        let quotes = patch.quotes.as_ref().map(|q| Json(q.clone()));
        let sql = format!(
            "UPDATE reading_progress SET \
                 chapter = COALESCE($3::int, chapter), \
                 page = COALESCE($4::int, page), \
                 paragraph = COALESCE($5::int, paragraph), \
                 line_number = COALESCE($6::int, line_number), \
                 quotes = COALESCE($7::jsonb, quotes), \
                 updated_at = now() \
             WHERE user_id = $1 AND book_id = $2 \
             RETURNING {PROGRESS_COLUMNS}"
        );
        let record = sqlx::query_as::<_, ProgressRecord>(&sql)
            .bind(user_id)
            .bind(book_id)
            .bind(patch.chapter)
            .bind(patch.page)
            .bind(patch.paragraph)
            .bind(patch.line_number)
            .bind(quotes)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(record.map(ProgressRecord::to_domain))
    }

    async fn append_quote(
        &self,
        user_id: Uuid,
        book_id: &str,
        book_title: &str,
        quote: &Quote,
    ) -> PortResult<ReadingProgress> {
        // Single-statement upsert-and-append: concurrent appends both land
        // because the `||` runs against the current row inside the update.
        let sql = format!(
            "INSERT INTO reading_progress (user_id, book_id, book_title, quotes) \
             VALUES ($1, $2, $3, jsonb_build_array($4::jsonb)) \
             ON CONFLICT (user_id, book_id) DO UPDATE SET \
                 quotes = reading_progress.quotes || jsonb_build_array($4::jsonb), \
                 updated_at = now() \
             RETURNING {PROGRESS_COLUMNS}"
        );
        let record = sqlx::query_as::<_, ProgressRecord>(&sql)
            .bind(user_id)
            .bind(book_id)
            .bind(book_title)
            .bind(Json(quote))
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(record.to_domain())
    }

    async fn remove_quote(
        &self,
        user_id: Uuid,
        book_id: &str,
        quote_id: Uuid,
    ) -> PortResult<Option<ReadingProgress>> {
        // Pull-by-filter: rebuilds the array without the matching element, so
        // an unknown id leaves the collection unchanged. The ordinality sort
        // keeps the survivors in insertion order; jsonb_agg alone does not
        // guarantee input order.
        let sql = format!(
            "UPDATE reading_progress SET \
                 quotes = (SELECT COALESCE(jsonb_agg(q ORDER BY ord), '[]'::jsonb) \
                           FROM jsonb_array_elements(reading_progress.quotes) \
                               WITH ORDINALITY AS t(q, ord) \
                           WHERE q->>'id' <> $3), \
                 updated_at = now() \
             WHERE user_id = $1 AND book_id = $2 \
             RETURNING {PROGRESS_COLUMNS}"
        );
        let record = sqlx::query_as::<_, ProgressRecord>(&sql)
            .bind(user_id)
            .bind(book_id)
            .bind(quote_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(record.map(ProgressRecord::to_domain))
    }

    async fn list_progress(&self, user_id: Uuid) -> PortResult<Vec<ReadingProgress>> {
        let sql = format!(
            "SELECT {PROGRESS_COLUMNS} FROM reading_progress \
             WHERE user_id = $1 ORDER BY last_read_at DESC"
        );
        let records = sqlx::query_as::<_, ProgressRecord>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(records.into_iter().map(ProgressRecord::to_domain).collect())
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
        let record = sqlx::query_as::<_, LibraryRecord>(
            "INSERT INTO library_entries \
                 (user_id, book_id, kind, book_title, book_author, book_cover) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (user_id, book_id, kind) DO UPDATE SET \
                 book_title = EXCLUDED.book_title, \
                 book_author = EXCLUDED.book_author, \
                 book_cover = EXCLUDED.book_cover, \
                 added_at = now(), \
                 updated_at = now() \
             RETURNING id, user_id, book_id, book_title, book_author, book_cover, kind, \
                       added_at, created_at, updated_at",
        )
        .bind(user_id)
        .bind(book_id)
        .bind(kind.as_str())
        .bind(book_title)
        .bind(book_author)
        .bind(book_cover)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;
        record.to_domain()
    }

    async fn remove_library_entries(
        &self,
        user_id: Uuid,
        book_id: &str,
        kind: Option<LibraryKind>,
    ) -> PortResult<u64> {
        let result = sqlx::query(
            "DELETE FROM library_entries \
             WHERE user_id = $1 AND book_id = $2 AND ($3::text IS NULL OR kind = $3)",
        )
        .bind(user_id)
        .bind(book_id)
        .bind(kind.map(|k| k.as_str()))
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(result.rows_affected())
    }

    async fn find_library_entry(
        &self,
        user_id: Uuid,
        book_id: &str,
    ) -> PortResult<Option<LibraryEntry>> {
        let record = sqlx::query_as::<_, LibraryRecord>(
            "SELECT id, user_id, book_id, book_title, book_author, book_cover, kind, \
                    added_at, created_at, updated_at \
             FROM library_entries WHERE user_id = $1 AND book_id = $2 \
             ORDER BY added_at DESC LIMIT 1",
        )
        .bind(user_id)
        .bind(book_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        record.map(LibraryRecord::to_domain).transpose()
    }

    async fn list_library_entries(
        &self,
        user_id: Uuid,
        kind: Option<LibraryKind>,
    ) -> PortResult<Vec<LibraryEntry>> {
        let records = sqlx::query_as::<_, LibraryRecord>(
            "SELECT id, user_id, book_id, book_title, book_author, book_cover, kind, \
                    added_at, created_at, updated_at \
             FROM library_entries \
             WHERE user_id = $1 AND ($2::text IS NULL OR kind = $2) \
             ORDER BY added_at DESC",
        )
        .bind(user_id)
        .bind(kind.map(|k| k.as_str()))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        records
            .into_iter()
            .map(LibraryRecord::to_domain)
            .collect()
    }

    async fn list_books(&self, filter: &BookFilter) -> PortResult<(Vec<Book>, i64)> {
        let pattern = filter.search.as_ref().map(|s| format!("%{s}%"));
        let offset = (filter.page - 1).max(0) * filter.limit;

        let records = sqlx::query_as::<_, BookRecord>(
            "SELECT id, title, author, cover, rating, year, genre, language, description, created_at \
             FROM books \
             WHERE ($1::text IS NULL OR title ILIKE $1 OR author ILIKE $1) \
               AND ($2::text IS NULL OR genre = $2) \
               AND ($3::float8 IS NULL OR rating >= $3) \
               AND ($4::text IS NULL OR language = $4) \
             ORDER BY title ASC \
             LIMIT $5 OFFSET $6",
        )
        .bind(pattern.as_deref())
        .bind(filter.genre.as_deref())
        .bind(filter.min_rating)
        .bind(filter.language.as_deref())
        .bind(filter.limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        let (total,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM books \
             WHERE ($1::text IS NULL OR title ILIKE $1 OR author ILIKE $1) \
               AND ($2::text IS NULL OR genre = $2) \
               AND ($3::float8 IS NULL OR rating >= $3) \
               AND ($4::text IS NULL OR language = $4)",
        )
        .bind(pattern.as_deref())
        .bind(filter.genre.as_deref())
        .bind(filter.min_rating)
        .bind(filter.language.as_deref())
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        Ok((
            records.into_iter().map(BookRecord::to_domain).collect(),
            total,
        ))
    }

    async fn get_book(&self, book_id: Uuid) -> PortResult<Option<Book>> {
        let record = sqlx::query_as::<_, BookRecord>(
            "SELECT id, title, author, cover, rating, year, genre, language, description, created_at \
             FROM books WHERE id = $1",
        )
        .bind(book_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(record.map(BookRecord::to_domain))
    }

    async fn create_book(&self, book: &NewBook) -> PortResult<Book> {
        let record = sqlx::query_as::<_, BookRecord>(
            "INSERT INTO books (title, author, cover, rating, year, genre, language, description) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING id, title, author, cover, rating, year, genre, language, description, created_at",
        )
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.cover)
        .bind(book.rating)
        .bind(book.year)
        .bind(&book.genre)
        .bind(&book.language)
        .bind(&book.description)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_check_violation() => {
                PortError::Validation("Invalid genre, language, or rating".to_string())
            }
            _ => db_err(e),
        })?;
        Ok(record.to_domain())
    }
}
