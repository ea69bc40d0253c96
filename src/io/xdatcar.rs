// Released under MIT License.
// Copyright (c) 2025-2026 atomio_rs contributors

//! Implementation of functions for reading VASP XDATCAR trajectory files.

use regex::Regex;

use crate::errors::{ParseWarning, ParseXdatcarError};
use crate::io::{self, Diagnostics};
use crate::structures::element::resolve_symbol;
use crate::structures::lattice::Lattice;
use crate::structures::site::{Site, Species};
use crate::structures::structure::Structure;
use crate::structures::trajectory::{Frame, Quantity};

/// Parse the content of a VASP XDATCAR file into trajectory frames.
///
/// The header (title, scale factor, lattice, element symbols and counts)
/// is shared by all configurations; each `Direct configuration=` block then
/// contributes one frame whose step index is the configuration number.
///
/// Site identity always comes from the header. Some XDATCAR writers append
/// an element symbol to each coordinate line, but the header is the
/// authoritative source and a trailing symbol is ignored.
pub fn parse_xdatcar(content: &str) -> Result<Vec<Frame>, ParseXdatcarError> {
    let mut diagnostics = Diagnostics::new();
    parse_xdatcar_diag(content, &mut diagnostics)
}

pub(crate) fn parse_xdatcar_diag(
    content: &str,
    diagnostics: &mut Diagnostics,
) -> Result<Vec<Frame>, ParseXdatcarError> {
    // header (8 lines) plus at least one coordinate line
    let lines: Vec<&str> = content.trim().lines().collect();
    if lines.len() < 9 {
        return Err(ParseXdatcarError::TooShort(lines.len()));
    }

    let scale: f64 = io::parse_coordinate(lines[1])
        .ok_or_else(|| ParseXdatcarError::InvalidScaleFactor(lines[1].trim().to_string()))?;

    let mut matrix = [[0.0; 3]; 3];
    for (row, line) in lines[2..5].iter().enumerate() {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() != 3 {
            return Err(ParseXdatcarError::InvalidLatticeVector(
                line.trim().to_string(),
            ));
        }
        for (axis, token) in tokens.iter().enumerate() {
            let value = io::parse_coordinate(token).ok_or_else(|| {
                ParseXdatcarError::InvalidLatticeVector(line.trim().to_string())
            })?;
            matrix[row][axis] = value * scale;
        }
    }
    let lattice = Lattice::from_matrix(matrix);

    let symbol_line = lines[5].trim();
    let count_line = lines[6].trim();
    let raw_symbols: Vec<&str> = symbol_line.split_whitespace().collect();
    let counts: Vec<usize> = count_line
        .split_whitespace()
        .map(|token| token.parse::<usize>())
        .collect::<Result<_, _>>()
        .map_err(|_| {
            ParseXdatcarError::ElementCountMismatch(
                symbol_line.to_string(),
                count_line.to_string(),
            )
        })?;

    if raw_symbols.len() != counts.len() {
        return Err(ParseXdatcarError::ElementCountMismatch(
            symbol_line.to_string(),
            count_line.to_string(),
        ));
    }

    // expand the header into one element per site
    let mut elements = Vec::new();
    for (group, (raw, &count)) in raw_symbols.iter().zip(counts.iter()).enumerate() {
        let (element, substituted) = resolve_symbol(raw, group);
        if substituted {
            diagnostics.warn(ParseWarning::UnknownElement {
                symbol: raw.to_string(),
                fallback: element.to_string(),
            });
        }
        elements.extend(std::iter::repeat(element).take(count));
    }
    let total_atoms = elements.len();

    let step_regex = Regex::new(r"configuration=\s*(\d+)")
        .expect("FATAL ATOMIO ERROR | xdatcar::parse_xdatcar_diag | Could not construct regex.");

    let mut frames = Vec::new();
    let mut line_idx = 7;

    while line_idx < lines.len() {
        let header = lines[line_idx];
        line_idx += 1;

        if !header.contains("Direct configuration=") {
            continue;
        }

        let step = step_regex
            .captures(header)
            .and_then(|captures| captures[1].parse::<i64>().ok())
            .unwrap_or(frames.len() as i64 + 1);

        let mut sites = Vec::with_capacity(total_atoms);
        for atom_idx in 0..total_atoms {
            if line_idx >= lines.len() {
                break;
            }

            let position_line = lines[line_idx].trim();
            line_idx += 1;

            let (tokens, repaired) = io::coordinate_tokens(position_line);
            if repaired {
                diagnostics.warn(ParseWarning::RepairedCoordinates {
                    line: position_line.to_string(),
                });
            }

            let coords: Vec<f64> = tokens
                .iter()
                .take(3)
                .filter_map(|token| io::parse_coordinate(token))
                .collect();
            if coords.len() < 3 {
                diagnostics.warn(ParseWarning::SkippedSite {
                    line: position_line.to_string(),
                    reason: "expected three fractional coordinates".to_string(),
                });
                continue;
            }

            let element = elements[atom_idx];
            let abc = [coords[0], coords[1], coords[2]];
            let xyz = lattice.fractional_to_cartesian(&abc);

            sites.push(Site::new(
                Species::new(element),
                abc,
                xyz,
                format!("{}{}", element, atom_idx + 1),
            ));
        }

        if sites.len() == total_atoms {
            let mut frame =
                Frame::new(Structure::new(sites, Some(lattice.clone())), step);
            frame.metadata.insert(Quantity::Volume, lattice.volume);
            frames.push(frame);
        } else {
            diagnostics.warn(ParseWarning::SkippedFrame {
                index: frames.len(),
                reason: format!(
                    "configuration has {} valid sites but {} atoms are declared",
                    sites.len(),
                    total_atoms
                ),
            });
        }
    }

    if frames.is_empty() {
        return Err(ParseXdatcarError::NoConfigurations);
    }

    Ok(frames)
}

/******************************/
/*         UNIT TESTS         */
/******************************/

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    const RUTILE: &str = "\
Ti O2 md run
1.0
4.6 0.0 0.0
0.0 4.6 0.0
0.0 0.0 3.0
O Fe
2 1
Direct configuration=     1
0.0 0.0 0.0
0.5 0.5 0.5
0.25 0.25 0.25
Direct configuration=     5
0.1 0.0 0.0
0.6 0.5 0.5
0.35 0.25 0.25
";

    #[test]
    fn configurations_and_steps() {
        let frames = parse_xdatcar(RUTILE).unwrap();

        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].step, 1);
        assert_eq!(frames[1].step, 5);
        assert_eq!(frames[0].structure.n_sites(), 3);
        assert_approx_eq!(f64, frames[1].structure.sites[0].abc[0], 0.1);
    }

    #[test]
    fn header_defines_element_order() {
        let frames = parse_xdatcar(RUTILE).unwrap();
        let structure = &frames[0].structure;

        assert_eq!(structure.sites[0].element(), Some("O"));
        assert_eq!(structure.sites[1].element(), Some("O"));
        assert_eq!(structure.sites[2].element(), Some("Fe"));

        let counts = structure.element_counts();
        let pairs: Vec<_> = counts.iter().map(|(e, c)| (e.as_str(), *c)).collect();
        assert_eq!(pairs, vec![("O", 2), ("Fe", 1)]);
    }

    #[test]
    fn header_wins_over_trailing_symbols() {
        let content = "\
labeled positions
1.0
4.0 0.0 0.0
0.0 4.0 0.0
0.0 0.0 4.0
Fe
1
Direct configuration=     1
0.5 0.5 0.5 Ni
";
        let frames = parse_xdatcar(content).unwrap();
        assert_eq!(frames[0].structure.sites[0].element(), Some("Fe"));
    }

    #[test]
    fn fractional_to_cartesian() {
        let frames = parse_xdatcar(RUTILE).unwrap();
        let site = &frames[0].structure.sites[1];
        assert_approx_eq!(f64, site.xyz[0], 2.3, epsilon = 1e-10);
        assert_approx_eq!(f64, site.xyz[2], 1.5, epsilon = 1e-10);
    }

    #[test]
    fn scale_factor_applies_to_lattice() {
        let content = RUTILE.replace("1.0\n4.6", "2.0\n4.6");
        let frames = parse_xdatcar(&content).unwrap();
        let lattice = frames[0].structure.lattice.as_ref().unwrap();
        assert_approx_eq!(f64, lattice.a, 9.2, epsilon = 1e-10);
    }

    #[test]
    fn volume_recorded_per_frame() {
        let frames = parse_xdatcar(RUTILE).unwrap();
        assert_approx_eq!(
            f64,
            frames[0].metadata.get(Quantity::Volume).unwrap(),
            4.6 * 4.6 * 3.0,
            epsilon = 1e-10
        );
    }

    #[test]
    fn corrupt_configuration_is_dropped() {
        let content = "\
partial
1.0
4.0 0.0 0.0
0.0 4.0 0.0
0.0 0.0 4.0
H
2
Direct configuration=     1
0.0 0.0 0.0
bad line here
Direct configuration=     2
0.0 0.0 0.0
0.5 0.5 0.5
";
        let mut diagnostics = Diagnostics::new();
        let frames = parse_xdatcar_diag(content, &mut diagnostics).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].step, 2);
        assert!(diagnostics
            .warnings()
            .iter()
            .any(|w| matches!(w, ParseWarning::SkippedFrame { .. })));
    }

    #[test]
    fn mismatched_header_fails() {
        let content = "\
bad
1.0
4.0 0.0 0.0
0.0 4.0 0.0
0.0 0.0 4.0
Fe O
1
Direct configuration=     1
0.0 0.0 0.0
";
        assert!(matches!(
            parse_xdatcar(content),
            Err(ParseXdatcarError::ElementCountMismatch(_, _))
        ));
    }

    #[test]
    fn no_configurations_fails() {
        let content = "\
empty
1.0
4.0 0.0 0.0
0.0 4.0 0.0
0.0 0.0 4.0
Fe
1
0.0 0.0 0.0
0.1 0.1 0.1
0.2 0.2 0.2
";
        assert_eq!(
            parse_xdatcar(content),
            Err(ParseXdatcarError::NoConfigurations)
        );
    }
}
