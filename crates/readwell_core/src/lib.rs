pub mod domain;
pub mod library;
pub mod ports;
pub mod progress;
pub mod rating;

#[cfg(test)]
pub(crate) mod test_support;

pub use domain::{
    Book, BookAverage, BookFilter, CatalogBook, CatalogPage, LibraryCheck, LibraryEntry,
    LibraryKind, NewBook, PopularBook, ProgressFields, ProgressPatch, Quote, Rating,
    ReadingProgress, User, UserCredentials,
};
pub use library::LibraryEngine;
pub use ports::{CatalogService, DatabaseService, PortError, PortResult};
pub use progress::ProgressEngine;
pub use rating::RatingEngine;
