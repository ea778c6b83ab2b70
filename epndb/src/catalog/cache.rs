///! Local snapshot of the scraped catalog
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

use super::types::{CatalogSnapshot, Pulsar};
use crate::error::{Error, Result};

const CATALOG_FILE: &str = "catalog.json";

/// Cache manager for the catalog snapshot.
///
/// The snapshot is a single pretty-printed JSON file so it stays inspectable
/// with ordinary tools. Profile sample data is never cached; only the
/// catalog metadata is.
pub struct CacheManager {
    cache_dir: PathBuf,
}

impl CacheManager {
    pub fn new<P: AsRef<Path>>(cache_dir: P) -> Self {
        Self {
            cache_dir: cache_dir.as_ref().to_path_buf(),
        }
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.cache_dir.join(CATALOG_FILE)
    }

    pub fn exists(&self) -> bool {
        self.catalog_path().exists()
    }

    async fn ensure_cache_dir(&self) -> Result<()> {
        if !self.cache_dir.exists() {
            fs::create_dir_all(&self.cache_dir)
                .await
                .map_err(|e| Error::io(&self.cache_dir, e))?;
            info!("Created cache directory: {}", self.cache_dir.display());
        }
        Ok(())
    }

    /// Load the snapshot from disk.
    pub async fn load(&self) -> Result<CatalogSnapshot> {
        let path = self.catalog_path();

        if !path.exists() {
            debug!("No catalog snapshot at {}", path.display());
            return Err(Error::CacheMissing(path));
        }

        let content = fs::read_to_string(&path)
            .await
            .map_err(|e| Error::io(&path, e))?;

        let snapshot: CatalogSnapshot = serde_json::from_str(&content)
            .map_err(|e| Error::Parse(format!("catalog snapshot {}: {}", path.display(), e)))?;

        info!(
            "Loaded {} pulsars ({} profiles) from snapshot",
            snapshot.pulsar_count, snapshot.profile_count
        );
        Ok(snapshot)
    }

    /// Write a fresh snapshot, replacing any existing one.
    pub async fn save(&self, pulsars: Vec<Pulsar>) -> Result<CatalogSnapshot> {
        self.ensure_cache_dir().await?;

        let snapshot = CatalogSnapshot::new(pulsars);
        let path = self.catalog_path();
        let content = serde_json::to_string_pretty(&snapshot)
            .map_err(|e| Error::Parse(format!("serializing catalog snapshot: {e}")))?;

        fs::write(&path, content)
            .await
            .map_err(|e| Error::io(&path, e))?;

        debug!(
            "Saved {} pulsars to {}",
            snapshot.pulsar_count,
            path.display()
        );
        Ok(snapshot)
    }

    /// Delete the snapshot if present.
    pub async fn remove(&self) -> Result<()> {
        let path = self.catalog_path();
        if path.exists() {
            fs::remove_file(&path)
                .await
                .map_err(|e| Error::io(&path, e))?;
            debug!("Removed stale snapshot {}", path.display());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::types::Profile;
    use tempfile::TempDir;

    fn sample_pulsars() -> Vec<Pulsar> {
        vec![Pulsar {
            jname: "J0332+5434".to_string(),
            bname: Some("B0329+54".to_string()),
            declared_profiles: 1,
            profiles: vec![Profile {
                url: "http://example.org/epndb/ascii/gl98/J0332+5434.txt".to_string(),
                freq_mhz: 610.0,
                stokes: "I".to_string(),
                citation: "gl98".to_string(),
            }],
        }]
    }

    #[tokio::test]
    async fn test_save_then_load_round_trips() {
        let dir = TempDir::new().unwrap();
        let cache = CacheManager::new(dir.path());

        let saved = cache.save(sample_pulsars()).await.unwrap();
        assert!(cache.exists());

        let loaded = cache.load().await.unwrap();
        assert_eq!(loaded.pulsar_count, 1);
        assert_eq!(loaded.profile_count, 1);
        assert_eq!(loaded.pulsars, saved.pulsars);
    }

    #[tokio::test]
    async fn test_load_missing_is_cache_missing() {
        let dir = TempDir::new().unwrap();
        let cache = CacheManager::new(dir.path().join("nothing"));

        let err = cache.load().await.unwrap_err();
        assert!(matches!(err, Error::CacheMissing(_)));
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let cache = CacheManager::new(dir.path());

        cache.remove().await.unwrap();
        cache.save(sample_pulsars()).await.unwrap();
        cache.remove().await.unwrap();
        assert!(!cache.exists());
    }
}
