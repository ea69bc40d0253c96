// Released under MIT License.
// Copyright (c) 2025-2026 atomio_rs contributors

//! Implementation of functions for reading and writing XYZ and extended XYZ
//! files, both single-structure and multi-frame.

use regex::Regex;

use crate::errors::{ParseWarning, ParseXyzError};
use crate::io::{self, Diagnostics};
use crate::math::Matrix3;
use crate::structures::element::{resolve_symbol, PLACEHOLDER_SYMBOL};
use crate::structures::lattice::Lattice;
use crate::structures::site::{Site, Species};
use crate::structures::structure::Structure;
use crate::structures::trajectory::{Frame, FrameMetadata, Quantity, Trajectory};

/// Parse the content of an XYZ file into a single [`Structure`].
///
/// Multi-frame files are accepted; the *last* frame is returned, matching
/// the convention that the final frame of a relaxation is the converged
/// structure. Extended XYZ `Lattice="..."` comments are honored.
pub fn parse_xyz(content: &str) -> Result<Structure, ParseXyzError> {
    let mut diagnostics = Diagnostics::new();
    parse_xyz_diag(content, &mut diagnostics)
}

pub(crate) fn parse_xyz_diag(
    content: &str,
    diagnostics: &mut Diagnostics,
) -> Result<Structure, ParseXyzError> {
    let content = content.trim();
    if content.is_empty() {
        return Err(ParseXyzError::Empty);
    }

    let all_lines: Vec<&str> = content.lines().collect();

    // slice into frames by atom count so the last frame can be selected
    let mut last_frame: Option<&[&str]> = None;
    let mut index = 0;
    while index < all_lines.len() {
        match frame_bounds(&all_lines, index) {
            Some(end) => {
                last_frame = Some(&all_lines[index..end]);
                index = end;
            }
            None => index += 1,
        }
    }

    let lines = last_frame.unwrap_or(&all_lines);
    if lines.len() < 2 {
        return Err(ParseXyzError::TooShort(lines.len()));
    }

    let n_atoms: usize = lines[0]
        .trim()
        .parse()
        .map_err(|_| ParseXyzError::InvalidAtomCount(lines[0].trim().to_string()))?;

    let lattice = parse_comment_lattice(lines[1]).map(Lattice::from_matrix);

    let mut sites = Vec::with_capacity(n_atoms);
    for atom in 0..n_atoms {
        let line = lines
            .get(atom + 2)
            .ok_or(ParseXyzError::NotEnoughCoordinates(atom, n_atoms))?;
        sites.push(parse_site(line, atom, lattice.as_ref(), diagnostics)?);
    }

    Ok(Structure::new(sites, lattice))
}

/// Parse the content of a multi-frame XYZ trajectory.
///
/// Each frame contributes a [`Frame`] whose step index is taken from a
/// `step=`, `frame=`, or `ionic_step=` annotation in the comment line,
/// falling back to the running frame index. Known physical quantities in
/// the comment line (energies, temperatures, stress tensors, ...) are
/// collected into the frame metadata under their canonical names.
///
/// Frames that fail to decode are skipped with a warning rather than
/// aborting the whole trajectory.
pub fn parse_xyz_frames(content: &str) -> Result<Vec<Frame>, ParseXyzError> {
    let mut diagnostics = Diagnostics::new();
    parse_xyz_frames_diag(content, &mut diagnostics)
}

pub(crate) fn parse_xyz_frames_diag(
    content: &str,
    diagnostics: &mut Diagnostics,
) -> Result<Vec<Frame>, ParseXyzError> {
    let content = content.trim();
    if content.is_empty() {
        return Err(ParseXyzError::Empty);
    }

    let lines: Vec<&str> = content.lines().collect();
    let mut frames = Vec::new();
    let mut index = 0;

    while index < lines.len() {
        let end = match frame_bounds(&lines, index) {
            Some(end) => end,
            None => {
                index += 1;
                continue;
            }
        };

        match parse_frame(&lines[index..end], frames.len(), diagnostics) {
            Ok(frame) => frames.push(frame),
            Err(error) => diagnostics.warn(ParseWarning::SkippedFrame {
                index: frames.len(),
                reason: error.to_string(),
            }),
        }

        index = end;
    }

    if frames.is_empty() {
        return Err(ParseXyzError::NoFrames);
    }

    Ok(frames)
}

/// Bounds check for one frame starting at `start`: the line must hold a
/// positive atom count and enough lines must remain for the full frame.
/// Returns the exclusive end index of the frame.
fn frame_bounds(lines: &[&str], start: usize) -> Option<usize> {
    let n_atoms: usize = lines[start].trim().parse().ok().filter(|&n| n > 0)?;
    let end = start + n_atoms + 2;
    (end <= lines.len()).then_some(end)
}

fn parse_frame(
    lines: &[&str],
    frame_index: usize,
    diagnostics: &mut Diagnostics,
) -> Result<Frame, ParseXyzError> {
    let n_atoms: usize = lines[0]
        .trim()
        .parse()
        .map_err(|_| ParseXyzError::InvalidAtomCount(lines[0].trim().to_string()))?;

    let comment = lines[1];
    let step = parse_step(comment).unwrap_or(frame_index as i64);

    let mut metadata = FrameMetadata::default();
    scan_comment_metadata(comment, &mut metadata);

    let lattice = parse_comment_lattice(comment).map(Lattice::from_matrix);
    if let Some(lattice) = &lattice {
        metadata.insert(Quantity::Volume, lattice.volume);
    }

    let mut sites = Vec::with_capacity(n_atoms);
    for atom in 0..n_atoms {
        let line = lines
            .get(atom + 2)
            .ok_or(ParseXyzError::NotEnoughCoordinates(atom, n_atoms))?;
        sites.push(parse_site(line, atom, lattice.as_ref(), diagnostics)?);
    }

    let mut frame = Frame::new(Structure::new(sites, lattice), step);
    frame.metadata = metadata;
    Ok(frame)
}

fn parse_site(
    line: &str,
    atom_index: usize,
    lattice: Option<&Lattice>,
    diagnostics: &mut Diagnostics,
) -> Result<Site, ParseXyzError> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 4 {
        return Err(ParseXyzError::InvalidAtomLine(line.trim().to_string()));
    }

    let (element, substituted) = resolve_symbol(parts[0], atom_index);
    if substituted {
        diagnostics.warn(ParseWarning::UnknownElement {
            symbol: parts[0].to_string(),
            fallback: element.to_string(),
        });
    }

    let mut xyz = [0.0; 3];
    for (axis, token) in parts[1..4].iter().enumerate() {
        xyz[axis] = io::parse_coordinate(token)
            .ok_or_else(|| ParseXyzError::InvalidCoordinate(token.to_string()))?;
    }

    let abc = match lattice {
        Some(lattice) => lattice.cartesian_to_fractional(&xyz),
        None => [0.0; 3],
    };

    Ok(Site::new(
        Species::new(element),
        abc,
        xyz,
        format!("{}{}", element, atom_index + 1),
    ))
}

fn parse_step(comment: &str) -> Option<i64> {
    for key in ["step", "frame", "ionic_step"] {
        let pattern = format!(r"(?i)\b{}\s*[=:]?\s*(\d+)", key);
        let regex = Regex::new(&pattern)
            .expect("FATAL ATOMIO ERROR | xyz::parse_step | Could not construct regex.");
        if let Some(captures) = regex.captures(comment) {
            if let Ok(step) = captures[1].parse() {
                return Some(step);
            }
        }
    }
    None
}

const FLOAT_PATTERN: &str = r"([-+]?\d*\.?\d+(?:[eE][-+]?\d+)?)";

/// Extract known physical quantities from an extended XYZ comment line.
///
/// Key-value pairs inside a `Properties="..."` string take precedence; the
/// rest of the comment is then scanned per quantity with word-bounded alias
/// patterns, so a bare `E` alias cannot fire inside an unrelated word.
/// A quoted `stress="..."` tensor additionally yields the derived von Mises,
/// Frobenius, and pressure values.
fn scan_comment_metadata(comment: &str, metadata: &mut FrameMetadata) {
    let properties = Regex::new(r#"(?i)Properties\s*=\s*"?([^"]*)"?"#)
        .expect("FATAL ATOMIO ERROR | xyz::scan_comment_metadata | Could not construct regex.");
    if let Some(captures) = properties.captures(comment) {
        for part in captures[1].split_whitespace() {
            let Some((key, value)) = part.split_once('=') else {
                continue;
            };
            let (Some(quantity), Ok(value)) = (Quantity::from_alias(key), value.parse()) else {
                continue;
            };
            metadata.insert(quantity, value);
        }
    }

    for quantity in Quantity::ALL {
        if metadata.get(quantity).is_some() {
            continue;
        }
        for alias in quantity.aliases() {
            let pattern = format!(r"(?i)\b{}\b\s*[=:]?\s*{}", regex::escape(alias), FLOAT_PATTERN);
            let regex = Regex::new(&pattern).expect(
                "FATAL ATOMIO ERROR | xyz::scan_comment_metadata | Could not construct regex.",
            );
            if let Some(captures) = regex.captures(comment) {
                if let Ok(value) = captures[1].parse() {
                    metadata.insert(quantity, value);
                    break;
                }
            }
        }
    }

    let stress = Regex::new(r#"(?i)stress\s*=\s*"([^"]+)""#)
        .expect("FATAL ATOMIO ERROR | xyz::scan_comment_metadata | Could not construct regex.");
    if let Some(captures) = stress.captures(comment) {
        let values: Vec<f64> = captures[1]
            .split_whitespace()
            .filter_map(io::parse_coordinate)
            .collect();
        if values.len() == 9 {
            let tensor = vec9_to_mat3x3(&values);
            let (von_mises, frobenius, pressure) = io::stress_invariants(&tensor);
            metadata.stress = Some(tensor);
            // derived values take precedence over scalar annotations
            metadata.known.insert(Quantity::StressMax, von_mises);
            metadata.known.insert(Quantity::StressFrobenius, frobenius);
            metadata.known.insert(Quantity::Pressure, pressure);
        }
    }
}

fn parse_comment_lattice(comment: &str) -> Option<Matrix3> {
    let regex = Regex::new(r#"(?i)Lattice\s*=\s*"([^"]+)""#)
        .expect("FATAL ATOMIO ERROR | xyz::parse_comment_lattice | Could not construct regex.");
    let captures = regex.captures(comment)?;
    let values: Vec<f64> = captures[1]
        .split_whitespace()
        .filter_map(io::parse_coordinate)
        .collect();
    (values.len() == 9).then(|| vec9_to_mat3x3(&values))
}

fn vec9_to_mat3x3(values: &[f64]) -> Matrix3 {
    [
        [values[0], values[1], values[2]],
        [values[3], values[4], values[5]],
        [values[6], values[7], values[8]],
    ]
}

/// Write a structure in XYZ format: atom count, comment line, and one
/// `element x y z` line per site with Cartesian coordinates in Angstroms.
pub fn write_xyz(structure: &Structure) -> String {
    let mut lines = vec![structure.n_sites().to_string(), structure_comment(structure)];
    write_site_lines(structure, &mut lines);
    lines.join("\n") + "\n"
}

/// Write a trajectory as a concatenated multi-frame extended XYZ file.
///
/// Each frame comment carries the step index, the lattice matrix (when the
/// frame structure has one), and the frame energy (when known), so the
/// output round-trips through [`parse_xyz_frames`].
pub fn write_xyz_trajectory(trajectory: &Trajectory) -> String {
    let mut lines = Vec::new();

    for frame in &trajectory.frames {
        lines.push(frame.structure.n_sites().to_string());

        let mut comment = vec![format!("step={}", frame.step)];
        if let Some(lattice) = &frame.structure.lattice {
            let row = |row: &[f64; 3]| format!("{:.6} {:.6} {:.6}", row[0], row[1], row[2]);
            comment.push(format!(
                "Lattice=\"{} {} {}\"",
                row(&lattice.matrix[0]),
                row(&lattice.matrix[1]),
                row(&lattice.matrix[2])
            ));
        }
        if let Some(energy) = frame.metadata.get(Quantity::Energy) {
            comment.push(format!("energy={}", energy));
        }
        lines.push(comment.join(" "));

        write_site_lines(&frame.structure, &mut lines);
    }

    lines.join("\n") + "\n"
}

fn structure_comment(structure: &Structure) -> String {
    let mut parts = Vec::new();
    if let Some(id) = &structure.id {
        parts.push(id.clone());
    }
    let formula = structure.formula();
    if !formula.is_empty() {
        parts.push(formula);
    }
    if parts.is_empty() {
        "Generated from structure".to_string()
    } else {
        parts.join(" ")
    }
}

fn write_site_lines(structure: &Structure, lines: &mut Vec<String>) {
    for site in &structure.sites {
        let element = site.element().unwrap_or(PLACEHOLDER_SYMBOL);
        // prefer Cartesian coordinates, fall back to converting fractional ones
        let xyz = match (&structure.lattice, site.xyz == [0.0; 3] && site.abc != [0.0; 3]) {
            (Some(lattice), true) => lattice.fractional_to_cartesian(&site.abc),
            _ => site.xyz,
        };
        lines.push(format!(
            "{} {:.6} {:.6} {:.6}",
            element, xyz[0], xyz[1], xyz[2]
        ));
    }
}

/******************************/
/*         UNIT TESTS         */
/******************************/
