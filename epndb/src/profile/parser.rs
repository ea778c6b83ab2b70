///! Parser for the archive's ASCII profile rendition
use ndarray::{Array1, Array2};

use crate::catalog::Stokes;
use crate::error::{Error, Result};

/// Leading columns (bin index and friends) before the sample data starts.
const DATA_COLUMN_OFFSET: usize = 3;

/// Parse an ASCII profile body into a sample matrix.
///
/// Blank lines and `#` comments are skipped; every other line is one phase
/// bin, whitespace-separated, with the Stokes data starting at the fourth
/// column. The result has one row per requested parameter, in request
/// order, and one column per phase bin.
pub fn parse_profile(text: &str, stokes: &[Stokes]) -> Result<Array2<f64>> {
    if stokes.is_empty() {
        return Err(Error::Parse("no Stokes parameters requested".to_string()));
    }

    let mut bins: Vec<Vec<f64>> = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.split_whitespace().collect();
        let mut sample = Vec::with_capacity(stokes.len());
        for s in stokes {
            let column = DATA_COLUMN_OFFSET + s.column();
            let field = fields.get(column).ok_or_else(|| {
                Error::Parse(format!(
                    "line {}: no column {} for Stokes {}",
                    lineno + 1,
                    column + 1,
                    s
                ))
            })?;
            let value: f64 = field.parse().map_err(|_| {
                Error::Parse(format!("line {}: invalid value '{}'", lineno + 1, field))
            })?;
            sample.push(value);
        }
        bins.push(sample);
    }

    if bins.is_empty() {
        return Err(Error::Parse("profile body holds no samples".to_string()));
    }

    let mut data = Array2::zeros((stokes.len(), bins.len()));
    for (bin, sample) in bins.iter().enumerate() {
        for (row, value) in sample.iter().enumerate() {
            data[[row, bin]] = *value;
        }
    }

    Ok(data)
}

/// Parse a single Stokes parameter as a flat array.
pub fn parse_single(text: &str, stokes: Stokes) -> Result<Array1<f64>> {
    let data = parse_profile(text, &[stokes])?;
    Ok(data.row(0).to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = "\
# PSR J0332+5434, 610.00 MHz
# bin phase weight I Q U V
0 0.000 1.0 1.5 0.1 0.0 -0.2
1 0.001 1.0 2.5 0.2 0.1 -0.1

2 0.002 1.0 9.5 0.3 0.2 0.0
";

    #[test]
    fn test_parse_stokes_i() {
        let data = parse_single(BODY, Stokes::I).unwrap();
        assert_eq!(data.len(), 3);
        assert_eq!(data[0], 1.5);
        assert_eq!(data[2], 9.5);
    }

    #[test]
    fn test_parse_multiple_parameters_in_request_order() {
        let data = parse_profile(BODY, &[Stokes::V, Stokes::I]).unwrap();
        assert_eq!(data.dim(), (2, 3));
        assert_eq!(data[[0, 0]], -0.2);
        assert_eq!(data[[1, 0]], 1.5);
    }

    #[test]
    fn test_comments_and_blank_lines_skipped() {
        let data = parse_profile(BODY, &[Stokes::I]).unwrap();
        assert_eq!(data.ncols(), 3);
    }

    #[test]
    fn test_missing_column_is_parse_error() {
        let body = "0 0.000 1.0 1.5\n";
        let err = parse_profile(body, &[Stokes::Q]).unwrap_err();
        assert!(matches!(err, Error::Parse(msg) if msg.contains("line 1")));
    }

    #[test]
    fn test_invalid_value_is_parse_error() {
        let body = "0 0.000 1.0 not-a-number\n";
        let err = parse_profile(body, &[Stokes::I]).unwrap_err();
        assert!(matches!(err, Error::Parse(msg) if msg.contains("not-a-number")));
    }

    #[test]
    fn test_empty_body_is_parse_error() {
        assert!(parse_profile("# only comments\n", &[Stokes::I]).is_err());
    }
}
