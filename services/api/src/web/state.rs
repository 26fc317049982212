//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use std::sync::Arc;

use readwell_core::ports::{CatalogService, DatabaseService};
use readwell_core::{LibraryEngine, ProgressEngine, RatingEngine};

use crate::config::Config;

/// The shared application state, created once at startup and passed to all
/// handlers. Auth handlers talk to the store directly; the domain handlers
/// go through their engines.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub catalog: Arc<dyn CatalogService>,
    pub config: Arc<Config>,
    pub ratings: RatingEngine,
    pub progress: ProgressEngine,
    pub library: LibraryEngine,
}

impl AppState {
    pub fn new(
        db: Arc<dyn DatabaseService>,
        catalog: Arc<dyn CatalogService>,
        config: Arc<Config>,
    ) -> Self {
        Self {
            ratings: RatingEngine::new(db.clone()),
            progress: ProgressEngine::new(db.clone()),
            library: LibraryEngine::new(db.clone()),
            db,
            catalog,
            config,
        }
    }
}
