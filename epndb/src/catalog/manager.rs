///! Catalog manager - in-memory pulsar store over the scraper and snapshot
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use super::cache::CacheManager;
use super::scraper::CatalogScraper;
use super::search;
use super::types::Pulsar;
use crate::config::Config;
use crate::error::{Error, Result};

/// Outcome of a catalog update.
#[derive(Debug, Clone)]
pub struct UpdateReport {
    pub pulsar_count: usize,
    pub profile_count: usize,
    /// Whether the archive was scraped (false when served from the snapshot)
    pub scraped: bool,
    pub duration_seconds: f64,
}

/// The catalog of the EPN Database of Pulsar Profiles.
///
/// Holds every scraped pulsar in memory, keyed by normalized J-name, and
/// keeps the on-disk snapshot in sync. Lookups hand out owned records;
/// nothing here touches profile sample data.
pub struct Catalog {
    pulsars: Arc<RwLock<HashMap<String, Pulsar>>>,
    cache: CacheManager,
    scraper: CatalogScraper,
    config: Config,
}

impl Catalog {
    pub fn new(config: Config) -> Result<Self> {
        let scraper = CatalogScraper::new(
            &config.base_url,
            Duration::from_secs(config.request_timeout_secs),
        )?;
        let cache = CacheManager::new(&config.cache_dir);

        Ok(Self {
            pulsars: Arc::new(RwLock::new(HashMap::new())),
            cache,
            scraper,
            config,
        })
    }

    /// Open the catalog: serve the local snapshot, scraping the archive
    /// first when none exists yet.
    pub async fn open(config: Config) -> Result<Self> {
        let catalog = Self::new(config)?;
        catalog.update(false).await?;
        Ok(catalog)
    }

    /// Refresh the in-memory store.
    ///
    /// With `force` the archive is always rescraped and the snapshot
    /// rewritten; otherwise an existing snapshot is served as-is and the
    /// archive is only contacted when none is present.
    pub async fn update(&self, force: bool) -> Result<UpdateReport> {
        let start = std::time::Instant::now();

        let (pulsars, scraped) = if force || !self.cache.exists() {
            if force {
                self.cache.remove().await?;
            }
            let fresh = self.scraper.scrape().await?;
            let snapshot = self.cache.save(fresh).await?;
            (snapshot.pulsars, true)
        } else {
            (self.cache.load().await?.pulsars, false)
        };

        let mut store = self.pulsars.write().await;
        store.clear();
        for psr in pulsars {
            store.insert(search::normalize_name(&psr.jname), psr);
        }
        let pulsar_count = store.len();
        let profile_count = store.values().map(Pulsar::nprof).sum();
        drop(store);

        let report = UpdateReport {
            pulsar_count,
            profile_count,
            scraped,
            duration_seconds: start.elapsed().as_secs_f64(),
        };

        tracing::info!(
            "Catalog ready: {} pulsars, {} profiles ({}) in {:.2}s",
            report.pulsar_count,
            report.profile_count,
            if report.scraped { "scraped" } else { "from snapshot" },
            report.duration_seconds
        );

        Ok(report)
    }

    /// Exact lookup by J-name or B-name alias.
    pub async fn get(&self, name: &str) -> Result<Pulsar> {
        let key = search::normalize_name(name);
        let store = self.pulsars.read().await;

        if let Some(psr) = store.get(&key) {
            return Ok(psr.clone());
        }

        store
            .values()
            .find(|psr| {
                psr.bname
                    .as_deref()
                    .is_some_and(|b| search::normalize_name(b) == key)
            })
            .cloned()
            .ok_or_else(|| Error::NotFound(name.to_string()))
    }

    /// Fuzzy search; returns matching J-names ordered by relevance.
    pub async fn search(&self, query: &str) -> Vec<String> {
        let pulsars = self.all().await;
        search::search_pulsars(query, &pulsars, self.config.search_threshold)
    }

    /// Search several '/'-separated queries at once.
    pub async fn search_multiple(&self, input: &str) -> Vec<String> {
        let pulsars = self.all().await;
        search::search_multiple(input, &pulsars, self.config.search_threshold)
    }

    /// Every pulsar in the store, ordered by J-name.
    pub async fn all(&self) -> Vec<Pulsar> {
        let store = self.pulsars.read().await;
        let mut pulsars: Vec<Pulsar> = store.values().cloned().collect();
        pulsars.sort_by(|a, b| a.jname.cmp(&b.jname));
        pulsars
    }

    pub async fn len(&self) -> usize {
        self.pulsars.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.pulsars.read().await.is_empty()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::types::Profile;
    use tempfile::TempDir;

    fn sample_pulsars() -> Vec<Pulsar> {
        let mut b0329 = Pulsar::new("J0332+5434");
        b0329.bname = Some("B0329+54".to_string());
        b0329.declared_profiles = 1;
        b0329.profiles.push(Profile {
            url: "http://example.org/epndb/ascii/gl98/J0332+5434.txt".to_string(),
            freq_mhz: 610.0,
            stokes: "I".to_string(),
            citation: "gl98".to_string(),
        });

        vec![b0329, Pulsar::new("J0437-4715")]
    }

    async fn catalog_from_snapshot(dir: &TempDir) -> Catalog {
        let config = Config {
            cache_dir: dir.path().to_path_buf(),
            ..Config::default()
        };

        CacheManager::new(dir.path())
            .save(sample_pulsars())
            .await
            .unwrap();

        let catalog = Catalog::new(config).unwrap();
        catalog.update(false).await.unwrap();
        catalog
    }

    #[tokio::test]
    async fn test_update_from_snapshot() {
        let dir = TempDir::new().unwrap();
        let catalog = catalog_from_snapshot(&dir).await;

        assert_eq!(catalog.len().await, 2);
        assert!(!catalog.is_empty().await);
    }

    #[tokio::test]
    async fn test_get_by_jname_has_profiles() {
        let dir = TempDir::new().unwrap();
        let catalog = catalog_from_snapshot(&dir).await;

        let psr = catalog.get("J0332+5434").await.unwrap();
        assert!(!psr.profiles.is_empty());
        assert_eq!(psr.profiles[0].freq_mhz, 610.0);
    }

    #[tokio::test]
    async fn test_get_by_bname_alias() {
        let dir = TempDir::new().unwrap();
        let catalog = catalog_from_snapshot(&dir).await;

        let psr = catalog.get("B0329+54").await.unwrap();
        assert_eq!(psr.jname, "J0332+5434");
    }

    #[tokio::test]
    async fn test_get_unknown_is_not_found() {
        let dir = TempDir::new().unwrap();
        let catalog = catalog_from_snapshot(&dir).await;

        let err = catalog.get("J9999+9999").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(name) if name == "J9999+9999"));
    }

    #[tokio::test]
    async fn test_search_orders_all_by_name() {
        let dir = TempDir::new().unwrap();
        let catalog = catalog_from_snapshot(&dir).await;

        let names: Vec<String> = catalog.all().await.iter().map(|p| p.jname.clone()).collect();
        assert_eq!(names, vec!["J0332+5434", "J0437-4715"]);

        let hits = catalog.search("B0329+54").await;
        assert_eq!(hits, vec!["J0332+5434"]);
    }
}
