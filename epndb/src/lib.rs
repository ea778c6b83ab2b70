//! Client for the EPN Database of Pulsar Profiles.
//!
//! The archive publishes pulse profiles for a few thousand pulsars at
//! <http://www.epta.eu.org/epndb>. This crate scrapes the published catalog
//! into structured records, keeps a local JSON snapshot of it, and turns
//! individual profiles into numeric arrays, interactive plots, and export
//! files.
//!
//! ```no_run
//! # async fn demo() -> epndb::Result<()> {
//! let catalog = epndb::Catalog::open(epndb::Config::default()).await?;
//! let pulsar = catalog.get("J0332+5434").await?;
//! println!("{pulsar}");
//! # Ok(())
//! # }
//! ```

// ============ Catalog: scrape, cache, lookup ============
pub mod catalog;

// ============ Profile data: fetch and parse ============
pub mod profile;

// ============ Output: plots and export files ============
pub mod export;
pub mod plot;

// ============ Ambient: configuration and errors ============
pub mod config;
pub mod error;

pub use catalog::{Catalog, Profile, Pulsar, Stokes, UpdateReport};
pub use config::Config;
pub use error::{Error, Result};
pub use profile::ProfileClient;

/// Version of the installed crate.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
