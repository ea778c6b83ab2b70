///! Web scraper for the catalog page of the EPN Database of Pulsar Profiles
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;

use super::types::{Profile, Pulsar};
use crate::error::{Error, Result};

/// Catalog entry header: J-name, optional B-name in parentheses, declared
/// profile count in brackets.
const ENTRY_PATTERN: &str =
    r"(J[0-9]{2,4}[+-][0-9]{2,4}[A-Z]?)\s*(?:\((B[0-9]{2,4}[+-][0-9]{2,4}[A-Z]?)\))?\s*\[([0-9]+)\]";

/// One profile inside an entry: frequency, Stokes parameters, citation tag.
const PROFILE_PATTERN: &str = r"([0-9]+\.[0-9]+)\s*MHz,\s*([IQUV]+)\s*\[([a-z]+\+?[0-9]+)\]";

/// Extensions the archive serves raw profiles under. Every one of them has
/// an ASCII mirror under `/ascii/` with a `.txt` suffix. `.psrfits` must be
/// checked before `.fits`.
const DATA_EXTENSIONS: &[&str] = &[".ar", ".epn", ".T8ch", ".psrfits", ".fits"];

/// Catalog scraper - fetches the pulsar listing from the archive.
///
/// The listing is a single page with one `<li>` per pulsar; each entry
/// carries the profile metadata as text and the profile files as links.
/// Scraping it does not download any profile data.
pub struct CatalogScraper {
    client: reqwest::Client,
    base_url: String,
    entry_re: Regex,
    profile_re: Regex,
    list_selector: Selector,
    link_selector: Selector,
}

impl CatalogScraper {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        let entry_re = Regex::new(ENTRY_PATTERN)
            .map_err(|e| Error::Parse(format!("invalid entry pattern: {e}")))?;
        let profile_re = Regex::new(PROFILE_PATTERN)
            .map_err(|e| Error::Parse(format!("invalid profile pattern: {e}")))?;
        let list_selector = Selector::parse("ul")
            .map_err(|e| Error::Parse(format!("invalid CSS selector: {e:?}")))?;
        let link_selector = Selector::parse("a")
            .map_err(|e| Error::Parse(format!("invalid CSS selector: {e:?}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            entry_re,
            profile_re,
            list_selector,
            link_selector,
        })
    }

    /// Fetch and parse the full catalog listing.
    pub async fn scrape(&self) -> Result<Vec<Pulsar>> {
        let url = format!("{}/list.php", self.base_url);
        tracing::debug!("Fetching catalog listing from {}", url);

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(Error::Http {
                status: response.status(),
                url,
            });
        }

        let body = response.text().await?;
        let pulsars = self.parse_listing(&body)?;

        tracing::info!("Scraped {} pulsars from the catalog", pulsars.len());
        if pulsars.is_empty() {
            tracing::warn!("Catalog listing yielded no pulsars");
        }

        Ok(pulsars)
    }

    /// Parse the listing HTML into pulsar records.
    ///
    /// Entries live as direct `<li>` children of the first `<ul>`; anything
    /// that does not match the entry grammar (navigation items, headers) is
    /// skipped. Profile metadata matches are paired with the entry's links
    /// in order, so an excess on either side is dropped.
    pub fn parse_listing(&self, html: &str) -> Result<Vec<Pulsar>> {
        let document = Html::parse_document(html);

        let list = document
            .select(&self.list_selector)
            .next()
            .ok_or_else(|| Error::Parse("no <ul> listing in catalog page".to_string()))?;

        let mut pulsars = Vec::new();
        for item in list.children().filter_map(ElementRef::wrap) {
            if item.value().name() != "li" {
                continue;
            }

            let text: String = item.text().collect();
            let Some(caps) = self.entry_re.captures(&text) else {
                continue;
            };

            let jname = caps[1].to_string();
            let bname = caps.get(2).map(|m| m.as_str().to_string());
            let declared_profiles = caps[3].parse().unwrap_or(0);

            let links: Vec<String> = item
                .select(&self.link_selector)
                .filter_map(|a| a.value().attr("href"))
                .map(|href| self.ascii_url(href))
                .collect();

            let profiles: Vec<Profile> = self
                .profile_re
                .captures_iter(&text)
                .zip(links)
                .map(|(prof, url)| Profile {
                    url,
                    freq_mhz: prof[1].parse().unwrap_or(0.0),
                    stokes: prof[2].to_string(),
                    citation: prof[3].to_string(),
                })
                .collect();

            if profiles.len() != declared_profiles {
                tracing::debug!(
                    "{}: catalog declares {} profiles, scraped {}",
                    jname,
                    declared_profiles,
                    profiles.len()
                );
            }

            pulsars.push(Pulsar {
                jname,
                bname,
                declared_profiles,
                profiles,
            });
        }

        Ok(pulsars)
    }

    /// Rewrite an entry link to the ASCII mirror of the profile.
    fn ascii_url(&self, href: &str) -> String {
        let mut link = format!("{}/ascii/{}", self.base_url, href.trim()).replace('#', "");
        for ext in DATA_EXTENSIONS {
            if link.ends_with(ext) {
                link.truncate(link.len() - ext.len());
                link.push_str(".txt");
                break;
            }
        }
        link
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scraper() -> CatalogScraper {
        CatalogScraper::new("http://www.epta.eu.org/epndb/", Duration::from_secs(5)).unwrap()
    }

    const LISTING: &str = r##"<html><body>
    <h1>Browse the database</h1>
    <ul>
      <li>J0332+5434 (B0329+54) [2]
        <ul>
          <li>408.50 MHz, I [gl98] <a href="#gl98/J0332+5434.epn">stream</a></li>
          <li>1408.00 MHz, IQUV [hx97] <a href="hx97/J0332+5434.ar">stream</a></li>
        </ul>
      </li>
      <li>J0437-4715 [1]
        <ul>
          <li>1440.00 MHz, IQUV [vhm+97] <a href="vhm+97/J0437-4715.psrfits">stream</a></li>
        </ul>
      </li>
      <li>About this listing</li>
    </ul>
    </body></html>"##;

    #[test]
    fn test_parse_listing() {
        let pulsars = scraper().parse_listing(LISTING).unwrap();
        assert_eq!(pulsars.len(), 2);

        let psr = &pulsars[0];
        assert_eq!(psr.jname, "J0332+5434");
        assert_eq!(psr.bname.as_deref(), Some("B0329+54"));
        assert_eq!(psr.declared_profiles, 2);
        assert_eq!(psr.profiles.len(), 2);
        assert_eq!(psr.profiles[0].freq_mhz, 408.5);
        assert_eq!(psr.profiles[0].stokes, "I");
        assert_eq!(psr.profiles[0].citation, "gl98");
        assert_eq!(
            psr.profiles[0].url,
            "http://www.epta.eu.org/epndb/ascii/gl98/J0332+5434.txt"
        );

        let psr = &pulsars[1];
        assert_eq!(psr.jname, "J0437-4715");
        assert_eq!(psr.bname, None);
        assert_eq!(psr.profiles[0].citation, "vhm+97");
        assert_eq!(
            psr.profiles[0].url,
            "http://www.epta.eu.org/epndb/ascii/vhm+97/J0437-4715.txt"
        );
    }

    #[test]
    fn test_ascii_url_extension_rewrites() {
        let s = scraper();
        let base = "http://www.epta.eu.org/epndb/ascii";
        assert_eq!(s.ascii_url("gl98/a.ar"), format!("{base}/gl98/a.txt"));
        assert_eq!(s.ascii_url("gl98/a.epn"), format!("{base}/gl98/a.txt"));
        assert_eq!(s.ascii_url("gl98/a.T8ch"), format!("{base}/gl98/a.txt"));
        assert_eq!(s.ascii_url("gl98/a.psrfits"), format!("{base}/gl98/a.txt"));
        assert_eq!(s.ascii_url("gl98/a.fits"), format!("{base}/gl98/a.txt"));
        assert_eq!(s.ascii_url("#gl98/a.txt"), format!("{base}/gl98/a.txt"));
    }

    #[test]
    fn test_non_matching_entries_skipped() {
        let html = "<ul><li>not a pulsar</li></ul>";
        let pulsars = scraper().parse_listing(html).unwrap();
        assert!(pulsars.is_empty());
    }

    #[test]
    fn test_missing_listing_is_parse_error() {
        let err = scraper().parse_listing("<html><body></body></html>").unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[tokio::test]
    #[ignore] // Requires network connection
    async fn test_scrape_live() {
        let pulsars = scraper().scrape().await.unwrap();
        assert!(!pulsars.is_empty());
    }
}
