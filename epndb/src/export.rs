///! Profile export - serializes fetched profiles to external file formats
///!
///! ASCII keeps the archive's own column layout (and re-parses with the
///! profile parser), JSON is the lossless interchange format, CSV is for
///! spreadsheets, PSRFITS wraps the samples in a FITS primary HDU. HDF5 is
///! available behind the `hdf5` cargo feature since it needs the native
///! library.
use fitrs::{Fits, Hdu, HeaderValue};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::catalog::{Profile, Pulsar, Stokes};
use crate::error::{Error, Result};

/// Supported export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ascii,
    Json,
    Csv,
    Psrfits,
    #[cfg(feature = "hdf5")]
    Hdf5,
}

impl Format {
    /// Infer the format from a file extension.
    pub fn from_extension(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        Self::from_str(&ext)
    }
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "ascii" | "txt" | "asc" => Ok(Format::Ascii),
            "json" => Ok(Format::Json),
            "csv" => Ok(Format::Csv),
            "psrfits" | "fits" => Ok(Format::Psrfits),
            #[cfg(feature = "hdf5")]
            "hdf5" | "h5" => Ok(Format::Hdf5),
            #[cfg(not(feature = "hdf5"))]
            "hdf5" | "h5" => Err(Error::Export(
                "built without the `hdf5` feature".to_string(),
            )),
            other => Err(Error::Export(format!("unknown export format '{other}'"))),
        }
    }
}

/// A profile together with its fetched samples, as written to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileExport {
    pub jname: String,
    pub bname: Option<String>,
    pub freq_mhz: f64,
    /// Parameters actually exported, e.g. "IQ"
    pub stokes: String,
    pub citation: String,
    /// One row per Stokes parameter, one value per phase bin
    pub samples: Vec<Vec<f64>>,
}

impl ProfileExport {
    pub fn new(
        pulsar: &Pulsar,
        profile: &Profile,
        stokes: &[Stokes],
        data: &Array2<f64>,
    ) -> Result<Self> {
        if data.nrows() != stokes.len() {
            return Err(Error::Export(format!(
                "{} sample rows for {} Stokes parameters",
                data.nrows(),
                stokes.len()
            )));
        }

        Ok(Self {
            jname: pulsar.jname.clone(),
            bname: pulsar.bname.clone(),
            freq_mhz: profile.freq_mhz,
            stokes: stokes.iter().map(|s| s.as_char()).collect(),
            citation: profile.citation.clone(),
            samples: data.outer_iter().map(|row| row.to_vec()).collect(),
        })
    }

    /// Number of phase bins.
    pub fn nbin(&self) -> usize {
        self.samples.first().map_or(0, Vec::len)
    }

    /// The samples as a matrix, one row per Stokes parameter.
    pub fn to_array(&self) -> Result<Array2<f64>> {
        let nbin = self.nbin();
        if self.samples.iter().any(|row| row.len() != nbin) {
            return Err(Error::Parse("ragged sample rows".to_string()));
        }

        let mut data = Array2::zeros((self.samples.len(), nbin));
        for (i, row) in self.samples.iter().enumerate() {
            for (j, value) in row.iter().enumerate() {
                data[[i, j]] = *value;
            }
        }
        Ok(data)
    }
}

/// Write an export in the given format.
pub fn export(path: &Path, format: Format, profile: &ProfileExport) -> Result<()> {
    match format {
        Format::Ascii => write_ascii(path, profile),
        Format::Json => write_json(path, profile),
        Format::Csv => write_csv(path, profile),
        Format::Psrfits => write_psrfits(path, profile),
        #[cfg(feature = "hdf5")]
        Format::Hdf5 => write_hdf5(path, profile),
    }?;

    tracing::info!("Exported PSR {} to {}", profile.jname, path.display());
    Ok(())
}

/// The archive's own layout: header comments, then one line per phase bin
/// with three leading columns before the sample data.
pub fn write_ascii(path: &Path, profile: &ProfileExport) -> Result<()> {
    let nbin = profile.nbin();
    let mut out = String::new();

    out.push_str("# EPN Database of Pulsar Profiles\n");
    match profile.bname {
        Some(ref bname) => out.push_str(&format!("# PSR {} ({})\n", profile.jname, bname)),
        None => out.push_str(&format!("# PSR {}\n", profile.jname)),
    }
    out.push_str(&format!("# freq_mhz: {}\n", profile.freq_mhz));
    out.push_str(&format!("# stokes: {}\n", profile.stokes));
    out.push_str(&format!("# citation: {}\n", profile.citation));

    for bin in 0..nbin {
        out.push_str(&format!("{} {:.6} 1", bin, bin as f64 / nbin as f64));
        for row in &profile.samples {
            out.push_str(&format!(" {}", row[bin]));
        }
        out.push('\n');
    }

    fs::write(path, out).map_err(|e| Error::io(path, e))
}

/// Read back an ASCII export.
pub fn read_ascii(path: &Path) -> Result<ProfileExport> {
    let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;

    let mut jname = None;
    let mut bname = None;
    let mut freq_mhz = None;
    let mut stokes = None;
    let mut citation = None;

    for line in content.lines() {
        if let Some(rest) = line.strip_prefix("# PSR ") {
            match rest.split_once(" (") {
                Some((j, b)) => {
                    jname = Some(j.trim().to_string());
                    bname = Some(b.trim_end_matches(')').trim().to_string());
                }
                None => jname = Some(rest.trim().to_string()),
            }
        } else if let Some(rest) = line.strip_prefix("# freq_mhz: ") {
            freq_mhz = rest.trim().parse().ok();
        } else if let Some(rest) = line.strip_prefix("# stokes: ") {
            stokes = Some(rest.trim().to_string());
        } else if let Some(rest) = line.strip_prefix("# citation: ") {
            citation = Some(rest.trim().to_string());
        }
    }

    let jname = jname.ok_or_else(|| Error::Parse("missing '# PSR' header".to_string()))?;
    let freq_mhz =
        freq_mhz.ok_or_else(|| Error::Parse("missing '# freq_mhz' header".to_string()))?;
    let stokes = stokes.ok_or_else(|| Error::Parse("missing '# stokes' header".to_string()))?;
    let citation =
        citation.ok_or_else(|| Error::Parse("missing '# citation' header".to_string()))?;

    // Exported parameters sit in contiguous data columns, unlike the
    // archive's fixed IQUV layout, so the rows are read back positionally.
    let count = Stokes::parse_many(&stokes)?.len();
    let mut samples: Vec<Vec<f64>> = vec![Vec::new(); count];
    for (lineno, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        for (k, row) in samples.iter_mut().enumerate() {
            let field = fields.get(3 + k).ok_or_else(|| {
                Error::Parse(format!("line {}: missing data column {}", lineno + 1, 4 + k))
            })?;
            let value: f64 = field.parse().map_err(|_| {
                Error::Parse(format!("line {}: invalid value '{}'", lineno + 1, field))
            })?;
            row.push(value);
        }
    }

    if samples.iter().any(Vec::is_empty) {
        return Err(Error::Parse("export holds no samples".to_string()));
    }

    Ok(ProfileExport {
        jname,
        bname,
        freq_mhz,
        stokes,
        citation,
        samples,
    })
}

pub fn write_json(path: &Path, profile: &ProfileExport) -> Result<()> {
    let content = serde_json::to_string_pretty(profile)
        .map_err(|e| Error::Export(format!("serializing profile: {e}")))?;
    fs::write(path, content).map_err(|e| Error::io(path, e))
}

/// Read back a JSON export.
pub fn read_json(path: &Path) -> Result<ProfileExport> {
    let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    serde_json::from_str(&content)
        .map_err(|e| Error::Parse(format!("profile export {}: {}", path.display(), e)))
}

/// Header row `bin,<stokes...>`, then one record per phase bin.
pub fn write_csv(path: &Path, profile: &ProfileExport) -> Result<()> {
    let mut writer =
        csv::Writer::from_path(path).map_err(|e| Error::Export(format!("CSV open failed: {e}")))?;

    let mut header = vec!["bin".to_string()];
    header.extend(profile.stokes.chars().map(String::from));
    writer
        .write_record(&header)
        .map_err(|e| Error::Export(format!("CSV write failed: {e}")))?;

    for bin in 0..profile.nbin() {
        let mut record = vec![bin.to_string()];
        record.extend(profile.samples.iter().map(|row| row[bin].to_string()));
        writer
            .write_record(&record)
            .map_err(|e| Error::Export(format!("CSV write failed: {e}")))?;
    }

    writer
        .flush()
        .map_err(|e| Error::Export(format!("CSV flush failed: {e}")))
}

/// FITS file with the samples as the primary HDU; keywords stay within the
/// 8-character FITS limit.
pub fn write_psrfits(path: &Path, profile: &ProfileExport) -> Result<()> {
    let nbin = profile.nbin();
    let npol = profile.samples.len();

    let mut flat: Vec<f32> = Vec::with_capacity(nbin * npol);
    for row in &profile.samples {
        flat.extend(row.iter().map(|v| *v as f32));
    }

    let mut hdu = Hdu::new(&[nbin, npol], flat);
    hdu.insert(
        "OBJECT",
        HeaderValue::CharacterString(profile.jname.clone()),
    );
    if let Some(ref bname) = profile.bname {
        hdu.insert("BNAME", HeaderValue::CharacterString(bname.clone()));
    }
    hdu.insert("OBSFREQ", HeaderValue::RealFloatingNumber(profile.freq_mhz));
    hdu.insert(
        "STOKES",
        HeaderValue::CharacterString(profile.stokes.clone()),
    );
    hdu.insert(
        "CITREF",
        HeaderValue::CharacterString(profile.citation.clone()),
    );

    Fits::create(path, hdu).map_err(|e| Error::Export(format!("FITS write failed: {e:?}")))?;
    Ok(())
}

#[cfg(feature = "hdf5")]
pub fn write_hdf5(path: &Path, profile: &ProfileExport) -> Result<()> {
    use hdf5::types::VarLenUnicode;

    let err = |e: hdf5::Error| Error::Export(format!("HDF5 write failed: {e}"));

    let file = hdf5::File::create(path).map_err(err)?;
    let npol = profile.samples.len();
    let nbin = profile.nbin();
    let flat: Vec<f64> = profile.samples.iter().flatten().copied().collect();

    let dataset = file
        .new_dataset::<f64>()
        .shape((npol, nbin))
        .create("samples")
        .map_err(err)?;
    dataset.write_raw(&flat).map_err(err)?;

    let string_attr = |name: &str, value: &str| -> Result<()> {
        let value: VarLenUnicode = value
            .parse()
            .map_err(|e| Error::Export(format!("HDF5 attribute {name}: {e:?}")))?;
        dataset
            .new_attr::<VarLenUnicode>()
            .create(name)
            .map_err(err)?
            .write_scalar(&value)
            .map_err(err)
    };

    string_attr("jname", &profile.jname)?;
    if let Some(ref bname) = profile.bname {
        string_attr("bname", bname)?;
    }
    string_attr("stokes", &profile.stokes)?;
    string_attr("citation", &profile.citation)?;

    dataset
        .new_attr::<f64>()
        .create("freq_mhz")
        .map_err(err)?
        .write_scalar(&profile.freq_mhz)
        .map_err(err)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::parse_profile;
    use ndarray::array;
    use tempfile::TempDir;

    fn sample_export() -> ProfileExport {
        let mut pulsar = Pulsar::new("J0332+5434");
        pulsar.bname = Some("B0329+54".to_string());
        let profile = Profile {
            url: "http://example.org/x.txt".to_string(),
            freq_mhz: 610.25,
            stokes: "IQ".to_string(),
            citation: "gl98".to_string(),
        };
        let data = array![[1.5, 2.25, 9.125], [0.1, -0.2, 0.3]];

        ProfileExport::new(&pulsar, &profile, &[Stokes::I, Stokes::Q], &data).unwrap()
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            Format::from_extension(Path::new("a.json")).unwrap(),
            Format::Json
        );
        assert_eq!(
            Format::from_extension(Path::new("a.txt")).unwrap(),
            Format::Ascii
        );
        assert_eq!(
            Format::from_extension(Path::new("a.psrfits")).unwrap(),
            Format::Psrfits
        );
        assert!(Format::from_extension(Path::new("a.xyz")).is_err());
        assert!(Format::from_extension(Path::new("no_extension")).is_err());
    }

    #[test]
    fn test_json_round_trip_is_lossless() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("profile.json");
        let original = sample_export();

        write_json(&path, &original).unwrap();
        let restored = read_json(&path).unwrap();

        assert_eq!(restored, original);
    }

    #[test]
    fn test_ascii_round_trip_is_lossless() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("profile.txt");
        let original = sample_export();

        write_ascii(&path, &original).unwrap();
        let restored = read_ascii(&path).unwrap();

        assert_eq!(restored, original);
    }

    #[test]
    fn test_ascii_round_trip_single_parameter_subset() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("profile.txt");

        let pulsar = Pulsar::new("J0835-4510");
        let profile = Profile {
            url: "http://example.org/v.txt".to_string(),
            freq_mhz: 1413.0,
            stokes: "IQUV".to_string(),
            citation: "jhv+05".to_string(),
        };
        let data = array![[0.5, -0.25, 0.75]];
        let original = ProfileExport::new(&pulsar, &profile, &[Stokes::V], &data).unwrap();

        write_ascii(&path, &original).unwrap();
        let restored = read_ascii(&path).unwrap();
        assert_eq!(restored, original);
    }

    #[test]
    fn test_ascii_reparses_with_profile_parser() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("profile.txt");
        let original = sample_export();

        write_ascii(&path, &original).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        let data = parse_profile(&content, &[Stokes::I, Stokes::Q]).unwrap();

        assert_eq!(data, original.to_array().unwrap());
    }

    #[test]
    fn test_csv_has_header_and_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("profile.csv");

        write_csv(&path, &sample_export()).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();

        assert_eq!(lines.next(), Some("bin,I,Q"));
        assert_eq!(lines.clone().count(), 3);
        assert!(lines.next().unwrap().starts_with("0,1.5,0.1"));
    }

    #[test]
    fn test_psrfits_writes_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("profile.fits");

        write_psrfits(&path, &sample_export()).unwrap();
        assert!(path.exists());
        assert!(fs::metadata(&path).unwrap().len() > 0);
    }

    #[test]
    fn test_row_count_mismatch_is_export_error() {
        let pulsar = Pulsar::new("J0332+5434");
        let profile = Profile {
            url: "http://example.org/x.txt".to_string(),
            freq_mhz: 610.0,
            stokes: "I".to_string(),
            citation: "gl98".to_string(),
        };
        let data = array![[1.0, 2.0]];

        let err = ProfileExport::new(&pulsar, &profile, &[Stokes::I, Stokes::Q], &data);
        assert!(matches!(err, Err(Error::Export(_))));
    }
}
