// Released under MIT License.
// Copyright (c) 2025-2026 atomio_rs contributors

//! Implementation of functions for reading VASP POSCAR and CONTCAR files.

use crate::errors::{ParsePoscarError, ParseWarning};
use crate::io::{self, Diagnostics};
use crate::math::{self, Matrix3, Vector3};
use crate::structures::element::resolve_symbol;
use crate::structures::lattice::Lattice;
use crate::structures::site::{Site, Species};
use crate::structures::structure::Structure;

/// Parse the content of a POSCAR file into a [`Structure`].
///
/// Both VASP 5+ files (with an element symbol line) and VASP 4 files
/// (atom counts only) are supported, as are selective dynamics blocks,
/// `Direct` and `Cartesian` coordinate modes, negative (volume-based)
/// scale factors, and symbol or count lines spanning multiple lines.
///
/// Recoverable faults (unknown element symbols, repaired coordinate lines)
/// are logged through the `log` crate.
pub fn parse_poscar(content: &str) -> Result<Structure, ParsePoscarError> {
    let mut diagnostics = Diagnostics::new();
    parse_poscar_diag(content, &mut diagnostics)
}

pub(crate) fn parse_poscar_diag(
    content: &str,
    diagnostics: &mut Diagnostics,
) -> Result<Structure, ParsePoscarError> {
    let lines: Vec<&str> = content.trim_start().lines().collect();
    if lines.len() < 8 {
        return Err(ParsePoscarError::TooShort(lines.len()));
    }

    let mut scale: f64 = io::parse_coordinate(lines[1])
        .ok_or_else(|| ParsePoscarError::InvalidScaleFactor(lines[1].trim().to_string()))?;

    let mut lattice_vecs: Matrix3 = [[0.0; 3]; 3];
    for (row, line) in lines[2..5].iter().enumerate() {
        lattice_vecs[row] = parse_lattice_vector(line)?;
    }

    // a negative scale factor is interpreted as the target cell volume
    if scale < 0.0 {
        let volume = math::det_3x3(&lattice_vecs).abs();
        scale = (-scale / volume).cbrt();
    }

    for row in lattice_vecs.iter_mut() {
        for value in row.iter_mut() {
            *value *= scale;
        }
    }

    let (symbols, counts, mut line_index) = parse_species_block(&lines, diagnostics)?;

    if symbols.len() != counts.len() {
        return Err(ParsePoscarError::SymbolCountMismatch(
            symbols.len(),
            counts.len(),
        ));
    }

    // optional selective dynamics line precedes the coordinate mode
    let mut mode_line = lines
        .get(line_index)
        .map(|line| line.trim().to_uppercase())
        .ok_or(ParsePoscarError::MissingCoordinateMode)?;

    let selective_dynamics = mode_line.starts_with('S');
    if selective_dynamics {
        line_index += 1;
        mode_line = lines
            .get(line_index)
            .map(|line| line.trim().to_uppercase())
            .ok_or(ParsePoscarError::MissingCoordinateMode)?;
    }

    let direct = mode_line.starts_with('D');
    let cartesian = mode_line.starts_with('C') || mode_line.starts_with('K');
    if !direct && !cartesian {
        return Err(ParsePoscarError::UnknownCoordinateMode(mode_line));
    }

    let total: usize = counts.iter().sum();
    let lattice = Lattice::from_matrix(lattice_vecs);

    let mut sites = Vec::with_capacity(total);
    let mut coord_index = line_index + 1;
    let mut atom_offset = 0;

    for (group, (raw_symbol, &count)) in symbols.iter().zip(counts.iter()).enumerate() {
        let (element, substituted) = resolve_symbol(raw_symbol, group);
        if substituted {
            diagnostics.warn(ParseWarning::UnknownElement {
                symbol: raw_symbol.clone(),
                fallback: element.to_string(),
            });
        }

        for atom in 0..count {
            let line = lines
                .get(coord_index)
                .ok_or(ParsePoscarError::NotEnoughCoordinates(sites.len(), total))?;

            let coords = parse_coordinates(line, diagnostics)?;

            let (abc, xyz) = if direct {
                (coords, lattice.fractional_to_cartesian(&coords))
            } else {
                // Cartesian coordinates are also subject to the scale factor
                let xyz = [coords[0] * scale, coords[1] * scale, coords[2] * scale];
                (lattice.cartesian_to_fractional(&xyz), xyz)
            };

            let mut site = Site::new(
                Species::new(element),
                abc,
                xyz,
                format!("{}{}", element, atom_offset + atom + 1),
            );

            if selective_dynamics {
                let tokens: Vec<&str> = line.split_whitespace().collect();
                if tokens.len() >= 6 {
                    site.properties.selective_dynamics = Some([
                        tokens[3] == "T",
                        tokens[4] == "T",
                        tokens[5] == "T",
                    ]);
                }
            }

            sites.push(site);
            coord_index += 1;
        }

        atom_offset += count;
    }

    Ok(Structure::new(sites, Some(lattice)))
}

fn parse_lattice_vector(line: &str) -> Result<Vector3, ParsePoscarError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() != 3 {
        return Err(ParsePoscarError::InvalidLatticeVector(
            line.trim().to_string(),
        ));
    }

    let mut vector = [0.0; 3];
    for (axis, token) in tokens.iter().enumerate() {
        vector[axis] = io::parse_coordinate(token)
            .ok_or_else(|| ParsePoscarError::InvalidLatticeVector(line.trim().to_string()))?;
    }
    Ok(vector)
}

/// Parse the element symbol and atom count lines starting at line 5.
///
/// VASP 5+ files carry a symbol line (possibly spanning several lines)
/// followed by matching count lines; VASP 4 files carry counts only, in
/// which case placeholder symbols are synthesized per group.
///
/// ## Returns
/// The symbols, the counts, and the index of the line after the block.
fn parse_species_block(
    lines: &[&str],
    diagnostics: &mut Diagnostics,
) -> Result<(Vec<String>, Vec<usize>, usize), ParsePoscarError> {
    let start = 5;
    let first_token = lines[start].split_whitespace().next().unwrap_or("");
    let has_symbols = first_token.parse::<i64>().is_err();

    if !has_symbols {
        // VASP 4: counts only
        let counts = parse_counts(lines[start])?;
        let symbols = (0..counts.len())
            .map(|group| {
                let raw = format!("Element{}", group);
                let (fallback, _) = resolve_symbol(&raw, group);
                diagnostics.warn(ParseWarning::UnknownElement {
                    symbol: raw,
                    fallback: fallback.to_string(),
                });
                fallback.to_string()
            })
            .collect();
        return Ok((symbols, counts, start + 1));
    }

    // find where the numeric count lines begin, scanning a bounded window
    let mut symbol_lines = 1;
    for lookahead in 1..10 {
        match lines.get(start + lookahead) {
            Some(line) => {
                let token = line.split_whitespace().next().unwrap_or("");
                if token.parse::<i64>().is_ok() {
                    symbol_lines = lookahead;
                    break;
                }
            }
            None => break,
        }
    }

    let mut symbols = Vec::new();
    for line in lines.iter().skip(start).take(symbol_lines) {
        symbols.extend(line.split_whitespace().map(str::to_string));
    }

    // count lines need not mirror the symbol lines; consume numeric
    // lines until the coordinate mode line ends the block
    let mut counts = Vec::new();
    let mut line_index = start + symbol_lines;
    while let Some(line) = lines.get(line_index) {
        let token = line.split_whitespace().next().unwrap_or("");
        if token.parse::<i64>().is_err() {
            break;
        }
        counts.extend(parse_counts(line)?);
        line_index += 1;
    }

    Ok((symbols, counts, line_index))
}

fn parse_counts(line: &str) -> Result<Vec<usize>, ParsePoscarError> {
    line.split_whitespace()
        .map(|token| {
            token
                .parse::<usize>()
                .map_err(|_| ParsePoscarError::InvalidAtomCounts(line.trim().to_string()))
        })
        .collect()
}

fn parse_coordinates(
    line: &str,
    diagnostics: &mut Diagnostics,
) -> Result<Vector3, ParsePoscarError> {
    let (tokens, repaired) = io::coordinate_tokens(line);
    if repaired {
        diagnostics.warn(ParseWarning::RepairedCoordinates {
            line: line.trim().to_string(),
        });
    }

    if tokens.len() < 3 {
        return Err(ParsePoscarError::InvalidCoordinate(line.trim().to_string()));
    }

    let mut coords = [0.0; 3];
    for (axis, token) in tokens[..3].iter().enumerate() {
        coords[axis] = io::parse_coordinate(token)
            .ok_or_else(|| ParsePoscarError::InvalidCoordinate(token.to_string()))?;
    }
    Ok(coords)
}

/******************************/
/*         UNIT TESTS         */
/******************************/
