use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// Stokes polarization parameters, in the column order the archive's ASCII
/// profile format stores them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stokes {
    I,
    Q,
    U,
    V,
}

impl Stokes {
    /// Position of this parameter among the data columns.
    pub fn column(self) -> usize {
        match self {
            Stokes::I => 0,
            Stokes::Q => 1,
            Stokes::U => 2,
            Stokes::V => 3,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Stokes::I => 'I',
            Stokes::Q => 'Q',
            Stokes::U => 'U',
            Stokes::V => 'V',
        }
    }

    pub fn from_char(c: char) -> Result<Self> {
        match c {
            'I' => Ok(Stokes::I),
            'Q' => Ok(Stokes::Q),
            'U' => Ok(Stokes::U),
            'V' => Ok(Stokes::V),
            other => Err(Error::Parse(format!("invalid Stokes parameter '{other}'"))),
        }
    }

    /// Parse a parameter string such as `"I"` or `"IQUV"`.
    pub fn parse_many(s: &str) -> Result<Vec<Self>> {
        if s.is_empty() {
            return Err(Error::Parse("no Stokes parameters requested".to_string()));
        }
        s.chars().map(Self::from_char).collect()
    }
}

impl fmt::Display for Stokes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// One published profile of a pulsar.
///
/// Owned by exactly one [`Pulsar`]; the archive records the observing
/// frequency, the Stokes parameters present in the data, and the paper the
/// observation was published in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Resolved URL of the ASCII rendition of the data
    pub url: String,

    /// Observing frequency in MHz
    pub freq_mhz: f64,

    /// Stokes parameters present, e.g. "IQUV"
    pub stokes: String,

    /// Literature citation tag, e.g. "gl98"
    pub citation: String,
}

impl Profile {
    /// One-line summary in the archive's own notation.
    pub fn summary(&self) -> String {
        format!("{:.2} MHz, {} [{}]", self.freq_mhz, self.stokes, self.citation)
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Profile at ν = {} MHz.", self.freq_mhz)
    }
}

/// A pulsar and the profiles the archive holds for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pulsar {
    /// J2000 catalog designation, the canonical identifier
    pub jname: String,

    /// B1950 alias, when the catalog lists one
    pub bname: Option<String>,

    /// Profile count declared by the catalog page
    pub declared_profiles: usize,

    pub profiles: Vec<Profile>,
}

impl Pulsar {
    pub fn new(jname: impl Into<String>) -> Self {
        Self {
            jname: jname.into(),
            bname: None,
            declared_profiles: 0,
            profiles: Vec::new(),
        }
    }

    /// Number of profiles actually scraped for this pulsar.
    pub fn nprof(&self) -> usize {
        self.profiles.len()
    }

    /// The profile observed closest to the given frequency.
    pub fn profile_at(&self, freq_mhz: f64) -> Option<&Profile> {
        self.profiles.iter().min_by(|a, b| {
            let da = (a.freq_mhz - freq_mhz).abs();
            let db = (b.freq_mhz - freq_mhz).abs();
            da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
        })
    }

    /// Multi-line information block, one row per field.
    pub fn info(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("{:<18}{}\n", "Name", self.jname));
        out.push_str(&format!(
            "{:<18}{}\n",
            "Alternate name",
            self.bname.as_deref().unwrap_or("-")
        ));
        out.push_str(&format!("{:<18}{}\n", "Profiles", self.nprof()));
        for profile in &self.profiles {
            out.push_str(&format!("  {}\n", profile.summary()));
        }
        out
    }
}

impl fmt::Display for Pulsar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PSR {}, with {} profiles.", self.jname, self.nprof())
    }
}

/// On-disk snapshot of a full catalog scrape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    /// When the scrape ran
    pub scraped_at: DateTime<Utc>,

    pub pulsar_count: usize,

    pub profile_count: usize,

    pub pulsars: Vec<Pulsar>,
}

impl CatalogSnapshot {
    pub fn new(pulsars: Vec<Pulsar>) -> Self {
        let profile_count = pulsars.iter().map(Pulsar::nprof).sum();
        Self {
            scraped_at: Utc::now(),
            pulsar_count: pulsars.len(),
            profile_count,
            pulsars,
        }
    }
}
