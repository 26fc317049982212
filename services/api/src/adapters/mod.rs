pub mod catalog;
pub mod db;

pub use catalog::OpenLibraryAdapter;
pub use db::PgStore;
