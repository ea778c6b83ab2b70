///! Pulsar catalog: scraping, local snapshot, lookup and search
///!
///! The archive publishes its whole catalog as one HTML listing. Scraping it
///! yields every pulsar with its profile metadata (frequency, Stokes
///! parameters, citation, data URL) without downloading any profile data;
///! the result is kept in a JSON snapshot on disk and held in memory for
///! lookups.

// ============ Core Data Structures ============
mod types;
pub use types::{CatalogSnapshot, Profile, Pulsar, Stokes};

// ============ Scraper ============
mod scraper;
pub use scraper::CatalogScraper;

// ============ Snapshot Cache ============
mod cache;
pub use cache::CacheManager;

// ============ Search Engine ============
mod search;
pub use search::{normalize_name, search_multiple, search_pulsars, DEFAULT_THRESHOLD};

// ============ Manager ============
mod manager;
pub use manager::{Catalog, UpdateReport};
