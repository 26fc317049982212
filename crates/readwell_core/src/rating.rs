//! crates/readwell_core/src/rating.rs
//!
//! The rating engine: one rating per `(user, book)` with replace semantics,
//! live average computation, and the sliding-window weekly popularity
//! ranking.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::domain::{BookAverage, PopularBook, Rating};
use crate::ports::{DatabaseService, PortError, PortResult};

/// Window width for `popular_this_week`, measured backward from now.
const POPULAR_WINDOW_DAYS: i64 = 7;
/// Groups with fewer ratings than this are excluded from the ranking.
const POPULAR_MIN_RATINGS: i64 = 2;
/// The ranking is truncated to this many books.
const POPULAR_LIMIT: usize = 20;

#[derive(Clone)]
pub struct RatingEngine {
    store: Arc<dyn DatabaseService>,
}

impl RatingEngine {
    pub fn new(store: Arc<dyn DatabaseService>) -> Self {
        Self { store }
    }

    /// Records or replaces the user's rating for a book. A repeat submission
    /// overwrites the stored value; the history is not retained.
    pub async fn submit_rating(
        &self,
        user_id: Uuid,
        book_id: &str,
        book_title: &str,
        rating: i32,
    ) -> PortResult<Rating> {
        if book_id.is_empty() || book_title.is_empty() {
            return Err(PortError::Validation(
                "Book ID, title, and rating are required".to_string(),
            ));
        }
        if !(1..=5).contains(&rating) {
            return Err(PortError::Validation(
                "Rating must be between 1 and 5".to_string(),
            ));
        }
        self.store
            .upsert_rating(user_id, book_id, book_title, rating)
            .await
    }

    /// The user's rating for a book, if any. A missing rating is an empty
    /// result, not an error.
    pub async fn user_rating(&self, user_id: Uuid, book_id: &str) -> PortResult<Option<Rating>> {
        self.store.find_rating(user_id, book_id).await
    }

    pub async fn ratings_for_user(&self, user_id: Uuid) -> PortResult<Vec<Rating>> {
        self.store.ratings_for_user(user_id).await
    }

    /// Recomputes the book's average on every call; no cached value exists.
    pub async fn book_average(&self, book_id: &str) -> PortResult<BookAverage> {
        let ratings = self.store.ratings_for_book(book_id).await?;
        if ratings.is_empty() {
            return Ok(BookAverage {
                average: 0.0,
                count: 0,
            });
        }
        let sum: i64 = ratings.iter().map(|r| i64::from(r.rating)).sum();
        let mean = sum as f64 / ratings.len() as f64;
        Ok(BookAverage {
            average: (mean * 10.0).round() / 10.0,
            count: ratings.len() as i64,
        })
    }

    /// Ranks books by ratings created in the last seven days. A point-in-time
    /// computation over a snapshot read; safe to call concurrently with
    /// submissions.
    pub async fn popular_this_week(&self) -> PortResult<Vec<PopularBook>> {
        let cutoff = Utc::now() - Duration::days(POPULAR_WINDOW_DAYS);
        let recent = self.store.ratings_since(cutoff).await?;
        Ok(rank_popular(&recent))
    }
}

/// Groups ratings by book and orders the groups by unrounded average
/// descending, then count descending. Groups with fewer than two ratings are
/// dropped and the result is truncated to the top twenty. Grouping preserves
/// first-encounter order so the sort stays stable across full ties.
pub fn rank_popular(ratings: &[Rating]) -> Vec<PopularBook> {
    struct Group {
        book_id: String,
        book_title: String,
        sum: i64,
        count: i64,
    }

    let mut groups: Vec<Group> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for rating in ratings {
        match index.get(rating.book_id.as_str()) {
            Some(&i) => {
                groups[i].sum += i64::from(rating.rating);
                groups[i].count += 1;
            }
            None => {
                index.insert(rating.book_id.as_str(), groups.len());
                groups.push(Group {
                    book_id: rating.book_id.clone(),
                    // The title carried by the group's first rating wins.
                    book_title: rating.book_title.clone(),
                    sum: i64::from(rating.rating),
                    count: 1,
                });
            }
        }
    }

    let mut popular: Vec<PopularBook> = groups
        .into_iter()
        .filter(|g| g.count >= POPULAR_MIN_RATINGS)
        .map(|g| PopularBook {
            book_id: g.book_id,
            book_title: g.book_title,
            // Unrounded on purpose: rounding before comparison could flip
            // tie-break outcomes.
            average_rating: g.sum as f64 / g.count as f64,
            total_ratings: g.count,
        })
        .collect();

    popular.sort_by(|a, b| {
        b.average_rating
            .partial_cmp(&a.average_rating)
            .unwrap_or(Ordering::Equal)
            .then(b.total_ratings.cmp(&a.total_ratings))
    });
    popular.truncate(POPULAR_LIMIT);
    popular
}
