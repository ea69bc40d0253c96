// Released under MIT License.
// Copyright (c) 2025-2026 atomio_rs contributors

//! This module contains structures and methods for reading and writing
//! structure and trajectory files: the top-level [`parse`] dispatcher, the
//! per-format decoders, and shared numeric helpers.

use std::io::Read;

use flate2::read::GzDecoder;

use crate::errors::{ParseError, ParseWarning};
use crate::files::{self, FileFormat};
use crate::structures::trajectory::{Frame, Trajectory};

pub mod cif;
#[cfg(feature = "hdf5-input")]
pub mod hdf5_io;
pub mod json_io;
pub mod phonopy;
pub mod poscar;
pub mod xdatcar;
pub mod xyz;

/// Collector for recoverable faults raised while decoding a file.
///
/// Every warning is logged as it occurs and retained so the dispatcher can
/// attach the full list to the returned trajectory.
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<ParseWarning>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Diagnostics::default()
    }

    /// Log and retain a warning.
    pub fn warn(&mut self, warning: ParseWarning) {
        log::warn!("{}", warning);
        self.warnings.push(warning);
    }

    pub fn warnings(&self) -> &[ParseWarning] {
        &self.warnings
    }

    pub fn into_warnings(self) -> Vec<ParseWarning> {
        self.warnings
    }
}

/// Parse a structure or trajectory file of any supported format.
///
/// The format is detected from the optional file name hint and the content
/// itself (see [`files::detect`]). Gzip-compressed input is transparently
/// decompressed first. Single-structure formats yield a trajectory with one
/// frame at step 0.
///
/// ## Returns
/// The assembled [`Trajectory`], or `ParseError` if the format could not be
/// recognized or decoded. Recoverable faults (element fallbacks, skipped
/// frames) do not fail the parse; they are logged and collected into
/// the `warnings` field of the trajectory metadata.
pub fn parse(content: &[u8], filename: Option<&str>) -> Result<Trajectory, ParseError> {
    let (content, filename) = if content.starts_with(&[0x1f, 0x8b]) {
        let mut decoded = Vec::new();
        GzDecoder::new(content)
            .read_to_end(&mut decoded)
            .map_err(|error| ParseError::Decompress(error.to_string()))?;
        (decoded, filename.map(strip_gz_suffix))
    } else {
        (content.to_vec(), filename)
    };

    let detection = files::detect(&content, filename)?;
    log::debug!(
        "detected format {} (by {}) for `{}`",
        detection.format,
        detection.reason,
        filename.unwrap_or("<unnamed>")
    );

    let mut diagnostics = Diagnostics::new();
    let mut trajectory = match detection.format {
        FileFormat::Hdf5 => decode_hdf5(&content, &mut diagnostics)?,
        format => {
            let text = std::str::from_utf8(&content).map_err(|_| ParseError::NotText)?;
            decode_text(format, text, &mut diagnostics)?
        }
    };

    trajectory.metadata.filename = filename.map(|name| name.to_string());
    trajectory
        .metadata
        .warnings
        .extend(diagnostics.into_warnings());

    Ok(trajectory)
}

fn decode_text(
    format: FileFormat,
    text: &str,
    diagnostics: &mut Diagnostics,
) -> Result<Trajectory, ParseError> {
    let title_line = || {
        text.lines()
            .next()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
    };

    match format {
        FileFormat::Poscar => {
            let structure = poscar::parse_poscar_diag(text, diagnostics)?;
            let mut trajectory =
                Trajectory::assemble(vec![Frame::new(structure, 0)], format, None);
            trajectory.metadata.title = title_line();
            Ok(trajectory)
        }
        FileFormat::Xyz => {
            let frames = xyz::parse_xyz_frames_diag(text, diagnostics)?;
            Ok(Trajectory::assemble(frames, format, None))
        }
        FileFormat::Cif => {
            let structure = cif::parse_cif_diag(text, diagnostics)?;
            Ok(Trajectory::assemble(
                vec![Frame::new(structure, 0)],
                format,
                None,
            ))
        }
        FileFormat::Xdatcar => {
            let frames = xdatcar::parse_xdatcar_diag(text, diagnostics)?;
            let mut trajectory = Trajectory::assemble(frames, format, None);
            trajectory.metadata.title = title_line();
            Ok(trajectory)
        }
        FileFormat::Json => Ok(json_io::parse_json_diag(text, diagnostics)?),
        FileFormat::PhonopyYaml => {
            let structure =
                phonopy::parse_phonopy_diag(text, phonopy::CellSelector::Auto, diagnostics)?;
            Ok(Trajectory::assemble(
                vec![Frame::new(structure, 0)],
                format,
                None,
            ))
        }
        FileFormat::Hdf5 => unreachable!("binary formats are dispatched separately"),
    }
}

#[cfg(feature = "hdf5-input")]
fn decode_hdf5(
    content: &[u8],
    diagnostics: &mut Diagnostics,
) -> Result<Trajectory, ParseError> {
    Ok(hdf5_io::parse_hdf5_diag(content, diagnostics)?)
}

#[cfg(not(feature = "hdf5-input"))]
fn decode_hdf5(
    _content: &[u8],
    _diagnostics: &mut Diagnostics,
) -> Result<Trajectory, ParseError> {
    Err(ParseError::UnsupportedBinaryFormat {
        format: "HDF5".to_string(),
        suggestion: "Rebuild with the `hdf5-input` feature enabled, or convert the \
                     trajectory to extended XYZ."
            .to_string(),
    })
}

fn strip_gz_suffix(filename: &str) -> &str {
    filename.strip_suffix(".gz").unwrap_or(filename)
}

/// Normalize Fortran-style scientific notation (`1.5D-3`, `1.5*^-3`) to the
/// standard `1.5e-3` form.
pub(crate) fn normalize_scientific_notation(token: &str) -> String {
    token.trim().to_lowercase().replace('d', "e").replace("*^", "e")
}

/// Parse a floating-point token, accepting Fortran-style notation variants.
pub(crate) fn parse_coordinate(token: &str) -> Option<f64> {
    let value: f64 = normalize_scientific_notation(token).parse().ok()?;
    value.is_finite().then_some(value)
}

/// Split a coordinate line into tokens, repairing run-together negative
/// numbers such as `0.1-0.2-0.3` (missing whitespace between columns).
///
/// The repair only kicks in when whitespace splitting yields fewer than
/// three tokens: each token is then split at every `-` that is neither at
/// the start of the token nor part of an exponent.
///
/// ## Returns
/// The token list and whether a repair was applied.
pub(crate) fn coordinate_tokens(line: &str) -> (Vec<String>, bool) {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() >= 3 {
        return (tokens.into_iter().map(str::to_string).collect(), false);
    }

    let splitter = fancy_regex::Regex::new(r"(?<=[^eE])-")
        .expect("FATAL ATOMIO ERROR | io::coordinate_tokens | Could not construct regex.");

    let mut repaired = false;
    let mut out = Vec::new();
    for token in tokens {
        let mut cut_points = Vec::new();
        for found in splitter.find_iter(token).flatten() {
            cut_points.push(found.start());
        }

        if cut_points.is_empty() {
            out.push(token.to_string());
            continue;
        }

        repaired = true;
        let mut start = 0;
        for cut in cut_points {
            if cut > start {
                out.push(token[start..cut].to_string());
            }
            start = cut;
        }
        out.push(token[start..].to_string());
    }

    (out, repaired)
}

/// Statistics derived from a per-site force field: the largest force
/// magnitude and the root-mean-square magnitude.
pub(crate) fn force_stats(forces: &[[f64; 3]]) -> Option<(f64, f64)> {
    if forces.is_empty() {
        return None;
    }

    let magnitudes: Vec<f64> = forces.iter().map(crate::math::norm).collect();
    let max = magnitudes.iter().cloned().fold(f64::MIN, f64::max);
    let rms =
        (magnitudes.iter().map(|f| f * f).sum::<f64>() / magnitudes.len() as f64).sqrt();

    Some((max, rms))
}

/// Scalar invariants of a stress tensor: the von Mises equivalent stress,
/// the Frobenius norm, and the pressure (negative trace over three).
pub(crate) fn stress_invariants(stress: &[[f64; 3]; 3]) -> (f64, f64, f64) {
    let (s11, s22, s33) = (stress[0][0], stress[1][1], stress[2][2]);
    let (s12, s13, s23) = (stress[0][1], stress[0][2], stress[1][2]);

    let von_mises = (0.5
        * ((s11 - s22).powi(2) + (s22 - s33).powi(2) + (s33 - s11).powi(2))
        + 3.0 * (s12 * s12 + s13 * s13 + s23 * s23))
        .sqrt();

    let frobenius = stress
        .iter()
        .flatten()
        .map(|value| value * value)
        .sum::<f64>()
        .sqrt();

    let pressure = -(s11 + s22 + s33) / 3.0;

    (von_mises, frobenius, pressure)
}

/******************************/
/*         UNIT TESTS         */
/******************************/

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    #[test]
    fn scientific_notation_variants() {
        assert_approx_eq!(f64, parse_coordinate("1.5D-3").unwrap(), 1.5e-3);
        assert_approx_eq!(f64, parse_coordinate("1.5d+2").unwrap(), 150.0);
        assert_approx_eq!(f64, parse_coordinate("2.0*^-4").unwrap(), 2.0e-4);
        assert_approx_eq!(f64, parse_coordinate("-3.25E2").unwrap(), -325.0);
        assert!(parse_coordinate("abc").is_none());
    }

    #[test]
    fn coordinate_repair_splits_runtogether_negatives() {
        let (tokens, repaired) = coordinate_tokens("0.1-0.2-0.3");
        assert!(repaired);
        assert_eq!(tokens, vec!["0.1", "-0.2", "-0.3"]);
    }

    #[test]
    fn coordinate_repair_keeps_leading_minus() {
        let (tokens, repaired) = coordinate_tokens("-0.1-0.2-0.3");
        assert!(repaired);
        assert_eq!(tokens, vec!["-0.1", "-0.2", "-0.3"]);
    }

    #[test]
    fn coordinate_repair_preserves_exponents() {
        let (tokens, repaired) = coordinate_tokens("1.0e-5 2.0-3.0e-2");
        assert!(repaired);
        assert_eq!(tokens, vec!["1.0e-5", "2.0", "-3.0e-2"]);
    }

    #[test]
    fn well_formed_lines_are_untouched() {
        let (tokens, repaired) = coordinate_tokens("0.1 0.2 0.3");
        assert!(!repaired);
        assert_eq!(tokens, vec!["0.1", "0.2", "0.3"]);
    }

    #[test]
    fn force_statistics() {
        let forces = [[3.0, 0.0, 0.0], [0.0, 4.0, 0.0]];
        let (max, rms) = force_stats(&forces).unwrap();
        assert_approx_eq!(f64, max, 4.0);
        assert_approx_eq!(f64, rms, (12.5f64).sqrt());
        assert!(force_stats(&[]).is_none());
    }

    #[test]
    fn stress_invariants_hydrostatic() {
        // purely hydrostatic stress has zero von Mises component
        let stress = [[2.0, 0.0, 0.0], [0.0, 2.0, 0.0], [0.0, 0.0, 2.0]];
        let (von_mises, frobenius, pressure) = stress_invariants(&stress);
        assert_approx_eq!(f64, von_mises, 0.0, epsilon = 1e-12);
        assert_approx_eq!(f64, frobenius, (12.0f64).sqrt());
        assert_approx_eq!(f64, pressure, -2.0);
    }

    #[test]
    fn dispatcher_routes_xyz() {
        let content = b"2\nwater\nO 0.0 0.0 0.0\nH 0.0 0.0 0.96\n";
        let trajectory = parse(content, Some("water.xyz")).unwrap();
        assert_eq!(trajectory.frames.len(), 1);
        assert_eq!(trajectory.metadata.total_atoms, 2);
        assert_eq!(
            trajectory.metadata.source_format,
            Some(FileFormat::Xyz)
        );
        assert_eq!(trajectory.metadata.filename.as_deref(), Some("water.xyz"));
    }

    #[test]
    fn dispatcher_routes_braced_title_poscar() {
        // a brace in the free-form title must not route the file to the
        // JSON decoder
        let content = "\
{TiO2} rutile
1.0
4.6 0.0 0.0
0.0 4.6 0.0
0.0 0.0 3.0
Ti O
2 4
Direct
0.00 0.00 0.00
0.50 0.50 0.50
0.30 0.30 0.00
0.70 0.70 0.00
0.20 0.80 0.50
0.80 0.20 0.50
";
        let trajectory = parse(content.as_bytes(), None).unwrap();
        assert_eq!(trajectory.metadata.source_format, Some(FileFormat::Poscar));
        assert_eq!(trajectory.metadata.total_atoms, 6);
    }

    #[test]
    fn dispatcher_decompresses_gzip() {
        use flate2::write::GzEncoder;
        use flate2::Compression;
        use std::io::Write;

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(b"2\nwater\nO 0.0 0.0 0.0\nH 0.0 0.0 0.96\n")
            .unwrap();
        let compressed = encoder.finish().unwrap();

        let trajectory = parse(&compressed, Some("water.xyz.gz")).unwrap();
        assert_eq!(trajectory.metadata.filename.as_deref(), Some("water.xyz"));
        assert_eq!(trajectory.frames.len(), 1);
    }

    #[cfg(not(feature = "hdf5-input"))]
    #[test]
    fn hdf5_without_feature_is_unsupported() {
        let mut content = b"\x89HDF\r\n\x1a\n".to_vec();
        content.extend_from_slice(&[0u8; 64]);
        let error = parse(&content, None).unwrap_err();
        assert!(matches!(
            error,
            ParseError::UnsupportedBinaryFormat { .. }
        ));
    }
}
