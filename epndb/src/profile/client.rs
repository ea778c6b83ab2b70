///! HTTP client for fetching profile data from the archive
use ndarray::{Array1, Array2};
use std::time::Duration;

use super::parser;
use crate::catalog::{Profile, Pulsar, Stokes};
use crate::error::{Error, Result};

const REQUEST_TIMEOUT_SECONDS: u64 = 60;
const MAX_RETRIES: u32 = 3;
const RETRY_DELAY_SECONDS: u64 = 2;

/// Outcome of a single request: a body, or the status the archive answered
/// with.
enum FetchOutcome {
    Body(String),
    Status(reqwest::StatusCode),
}

/// Client for downloading profile sample data.
///
/// Some pulsars are filed under their B1950 designation even though the
/// catalog links them by J-name, so a failed lookup is retried once with
/// the alias substituted into the path.
pub struct ProfileClient {
    client: reqwest::Client,
    max_retries: u32,
}

impl ProfileClient {
    pub fn new() -> Result<Self> {
        Self::with_timeout(Duration::from_secs(REQUEST_TIMEOUT_SECONDS), MAX_RETRIES)
    }

    pub fn with_timeout(timeout: Duration, max_retries: u32) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            max_retries: max_retries.max(1),
        })
    }

    /// Fetch the raw ASCII body of a profile.
    pub async fn fetch_text(&self, pulsar: &Pulsar, profile: &Profile) -> Result<String> {
        let status = match self.attempt(&profile.url).await? {
            FetchOutcome::Body(body) => return Ok(body),
            FetchOutcome::Status(status) => status,
        };

        if let Some(ref bname) = pulsar.bname {
            let alias_url = profile.url.replace(
                &format!("/{}/", pulsar.jname),
                &format!("/{}/", bname),
            );
            if alias_url != profile.url {
                tracing::debug!(
                    "HTTP {} for {}, retrying under alias {}",
                    status,
                    profile.url,
                    bname
                );
                match self.attempt(&alias_url).await? {
                    FetchOutcome::Body(body) => return Ok(body),
                    FetchOutcome::Status(status) => {
                        return Err(Error::Http {
                            status,
                            url: alias_url,
                        })
                    }
                }
            }
        }

        Err(Error::Http {
            status,
            url: profile.url.clone(),
        })
    }

    /// Fetch a profile as a sample matrix, one row per requested Stokes
    /// parameter (e.g. `"IQ"`).
    pub async fn fetch(
        &self,
        pulsar: &Pulsar,
        profile: &Profile,
        stokes: &str,
    ) -> Result<Array2<f64>> {
        let requested = Stokes::parse_many(stokes)?;
        for s in &requested {
            if !profile.stokes.contains(s.as_char()) {
                tracing::warn!(
                    "Stokes {} requested but profile lists only '{}'",
                    s,
                    profile.stokes
                );
            }
        }

        let text = self.fetch_text(pulsar, profile).await?;
        parser::parse_profile(&text, &requested)
    }

    /// Fetch a single Stokes parameter as a flat array. Defaults mirror the
    /// archive: total intensity (Stokes I).
    pub async fn fetch_single(
        &self,
        pulsar: &Pulsar,
        profile: &Profile,
        stokes: Stokes,
    ) -> Result<Array1<f64>> {
        let text = self.fetch_text(pulsar, profile).await?;
        parser::parse_single(&text, stokes)
    }

    /// One GET with bounded retries on transport errors. A response is
    /// returned as-is, whatever its status; only transport failures retry.
    async fn attempt(&self, url: &str) -> Result<FetchOutcome> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            if attempt > 1 {
                let delay = Duration::from_secs(RETRY_DELAY_SECONDS * attempt as u64);
                tracing::debug!(
                    "Retrying {} after {:?} (attempt {}/{})",
                    url,
                    delay,
                    attempt,
                    self.max_retries
                );
                tokio::time::sleep(delay).await;
            }

            match self.client.get(url).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return Ok(FetchOutcome::Body(response.text().await?));
                    }
                    return Ok(FetchOutcome::Status(status));
                }
                Err(e) => {
                    if attempt >= self.max_retries {
                        return Err(e.into());
                    }
                    tracing::warn!(
                        "Attempt {}/{} failed for {}: {}",
                        attempt,
                        self.max_retries,
                        url,
                        e
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pulsar_and_profile() -> (Pulsar, Profile) {
        let mut psr = Pulsar::new("J0332+5434");
        psr.bname = Some("B0329+54".to_string());
        let profile = Profile {
            url: "http://www.epta.eu.org/epndb/ascii/J0332+5434/gl98_610.txt".to_string(),
            freq_mhz: 610.0,
            stokes: "I".to_string(),
            citation: "gl98".to_string(),
        };
        psr.profiles.push(profile.clone());
        (psr, profile)
    }

    #[test]
    fn test_alias_url_substitution() {
        let (psr, profile) = pulsar_and_profile();
        let alias = profile.url.replace(
            &format!("/{}/", psr.jname),
            &format!("/{}/", psr.bname.as_deref().unwrap()),
        );
        assert_eq!(
            alias,
            "http://www.epta.eu.org/epndb/ascii/B0329+54/gl98_610.txt"
        );
    }

    #[tokio::test]
    #[ignore] // Requires network connection
    async fn test_fetch_live() {
        let (psr, profile) = pulsar_and_profile();
        let client = ProfileClient::new().unwrap();
        let data = client.fetch_single(&psr, &profile, Stokes::I).await.unwrap();
        assert!(!data.is_empty());
    }
}
