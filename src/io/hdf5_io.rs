// Released under MIT License.
// Copyright (c) 2025-2026 atomio_rs contributors

//! Implementation of functions for reading torch-sim HDF5 trajectory files.
//! Only available with the `hdf5-input` feature.

use std::io::Write;

use hdf5::File as H5File;

use crate::errors::{ParseHdf5Error, ParseWarning};
use crate::files::FileFormat;
use crate::io::Diagnostics;
use crate::math::Matrix3;
use crate::structures::element::{symbol_from_atomic_number, PLACEHOLDER_SYMBOL};
use crate::structures::lattice::Lattice;
use crate::structures::site::{Site, Species};
use crate::structures::structure::Structure;
use crate::structures::trajectory::{Frame, Quantity, Trajectory};

/// Dataset locations probed for each logical dataset, in order. Different
/// torch-sim versions nest the datasets under `data/` or at the root.
const POSITION_PATHS: [&str; 3] = ["data/positions", "positions", "coordinates"];
const ATOMIC_NUMBER_PATHS: [&str; 3] = ["data/atomic_numbers", "atomic_numbers", "numbers"];
const CELL_PATHS: [&str; 4] = ["data/cell", "cell", "cells", "box"];
const PBC_PATHS: [&str; 2] = ["data/pbc", "pbc"];
const POTENTIAL_ENERGY_PATHS: [&str; 2] = ["data/potential_energy", "potential_energy"];
const KINETIC_ENERGY_PATHS: [&str; 2] = ["data/kinetic_energy", "kinetic_energy"];

/// Parse in-memory content of a torch-sim HDF5 trajectory.
///
/// The bytes are staged to a temporary file first since the HDF5 library
/// only reads from the filesystem. Atom identity is constant across the
/// trajectory; positions are Cartesian. The concrete path each dataset was
/// found under is recorded in the trajectory metadata.
pub fn parse_hdf5(content: &[u8]) -> Result<Trajectory, ParseHdf5Error> {
    let mut diagnostics = Diagnostics::new();
    parse_hdf5_diag(content, &mut diagnostics)
}

pub(crate) fn parse_hdf5_diag(
    content: &[u8],
    diagnostics: &mut Diagnostics,
) -> Result<Trajectory, ParseHdf5Error> {
    let mut staged = tempfile::NamedTempFile::new()
        .map_err(|error| ParseHdf5Error::Staging(error.to_string()))?;
    staged
        .write_all(content)
        .map_err(|error| ParseHdf5Error::Staging(error.to_string()))?;
    staged
        .flush()
        .map_err(|error| ParseHdf5Error::Staging(error.to_string()))?;

    let file = H5File::open(staged.path())?;
    let mut datasets = indexmap::IndexMap::new();

    // required datasets
    let (numbers_path, numbers_dataset) = find_dataset(&file, &ATOMIC_NUMBER_PATHS)
        .ok_or_else(|| ParseHdf5Error::MissingDataset("atomic_numbers".to_string()))?;
    let (positions_path, positions_dataset) = find_dataset(&file, &POSITION_PATHS)
        .ok_or_else(|| ParseHdf5Error::MissingDataset("positions".to_string()))?;
    datasets.insert("atomic_numbers".to_string(), numbers_path);
    datasets.insert("positions".to_string(), positions_path.clone());

    let elements = read_elements(&numbers_dataset, diagnostics)?;
    let n_atoms = elements.len();

    let positions_shape = positions_dataset.shape();
    if positions_shape.len() != 3
        || positions_shape[1] != n_atoms
        || positions_shape[2] != 3
    {
        return Err(ParseHdf5Error::InvalidShape(
            positions_path,
            format!("{:?}, expected [frames, {}, 3]", positions_shape, n_atoms),
        ));
    }
    let n_frames = positions_shape[0];
    let positions = positions_dataset.read_raw::<f64>()?;

    let cells = match find_dataset(&file, &CELL_PATHS) {
        Some((path, dataset)) => {
            let cells = read_cells(&path, &dataset, n_frames)?;
            datasets.insert("cell".to_string(), path);
            Some(cells)
        }
        None => {
            diagnostics.warn(ParseWarning::MissingOptionalDataset {
                name: "cell".to_string(),
                effect: "structures carry no lattice".to_string(),
            });
            None
        }
    };

    let pbc = match find_dataset(&file, &PBC_PATHS) {
        Some((path, dataset)) => {
            let flags = dataset.read_raw::<i64>()?;
            datasets.insert("pbc".to_string(), path);
            if flags.len() >= 3 {
                [flags[0] != 0, flags[1] != 0, flags[2] != 0]
            } else {
                [true, true, true]
            }
        }
        None => [true, true, true],
    };

    let potential_energies =
        read_energy_series(&file, &POTENTIAL_ENERGY_PATHS, "potential_energy", &mut datasets)?;
    let kinetic_energies =
        read_energy_series(&file, &KINETIC_ENERGY_PATHS, "kinetic_energy", &mut datasets)?;

    let mut frames = Vec::with_capacity(n_frames);
    for frame_idx in 0..n_frames {
        let lattice = cells.as_ref().map(|cells| {
            let matrix = match cells.len() {
                1 => cells[0],
                _ => cells[frame_idx],
            };
            Lattice::from_matrix_pbc(matrix, pbc)
        });

        let mut sites = Vec::with_capacity(n_atoms);
        for atom_idx in 0..n_atoms {
            let offset = (frame_idx * n_atoms + atom_idx) * 3;
            let xyz = [positions[offset], positions[offset + 1], positions[offset + 2]];
            let abc = match &lattice {
                Some(lattice) => lattice.cartesian_to_fractional(&xyz),
                None => [0.0; 3],
            };
            let element = elements[atom_idx];
            sites.push(Site::new(
                Species::new(element),
                abc,
                xyz,
                format!("{}{}", element, atom_idx + 1),
            ));
        }

        let mut frame = Frame::new(Structure::new(sites, lattice), frame_idx as i64);
        if let Some(lattice) = &frame.structure.lattice {
            frame.metadata.insert(Quantity::Volume, lattice.volume);
        }
        if let Some(energy) = potential_energies.as_ref().and_then(|e| e.get(frame_idx)) {
            frame.metadata.insert(Quantity::Energy, *energy);
        }
        if let Some(energy) = kinetic_energies.as_ref().and_then(|e| e.get(frame_idx)) {
            frame.metadata.insert(Quantity::KineticEnergy, *energy);
        }
        frames.push(frame);
    }

    let mut trajectory = Trajectory::assemble(frames, FileFormat::Hdf5, None);
    trajectory.metadata.title = read_title(&file);
    trajectory.metadata.datasets = datasets;
    Ok(trajectory)
}

fn find_dataset(file: &H5File, paths: &[&str]) -> Option<(String, hdf5::Dataset)> {
    paths
        .iter()
        .find_map(|path| file.dataset(path).ok().map(|ds| (path.to_string(), ds)))
}

/// Read the atomic number table and map it to element symbols. Unknown
/// atomic numbers become the placeholder symbol.
fn read_elements(
    dataset: &hdf5::Dataset,
    diagnostics: &mut Diagnostics,
) -> Result<Vec<&'static str>, ParseHdf5Error> {
    let shape = dataset.shape();
    let numbers = dataset.read_raw::<i64>()?;

    // the table may be stored flat or as a single row per file
    let row: &[i64] = match shape.len() {
        1 => &numbers,
        2 if shape[0] >= 1 => &numbers[..shape[1]],
        _ => {
            return Err(ParseHdf5Error::InvalidShape(
                "atomic_numbers".to_string(),
                format!("{:?}, expected [n] or [1, n]", shape),
            ))
        }
    };

    Ok(row
        .iter()
        .map(|&z| match symbol_from_atomic_number(z) {
            Some(symbol) => symbol,
            None => {
                diagnostics.warn(ParseWarning::UnknownElement {
                    symbol: format!("Z={}", z),
                    fallback: PLACEHOLDER_SYMBOL.to_string(),
                });
                PLACEHOLDER_SYMBOL
            }
        })
        .collect())
}

/// Read the cell dataset: either one matrix per frame (`[frames, 3, 3]`)
/// or a single shared matrix (`[3, 3]`).
fn read_cells(
    path: &str,
    dataset: &hdf5::Dataset,
    n_frames: usize,
) -> Result<Vec<Matrix3>, ParseHdf5Error> {
    let shape = dataset.shape();
    let raw = dataset.read_raw::<f64>()?;

    let n_matrices = match shape.as_slice() {
        [3, 3] => 1,
        [frames, 3, 3] if *frames == n_frames => *frames,
        _ => {
            return Err(ParseHdf5Error::InvalidShape(
                path.to_string(),
                format!("{:?}, expected [3, 3] or [{}, 3, 3]", shape, n_frames),
            ))
        }
    };

    let mut cells = Vec::with_capacity(n_matrices);
    for matrix_idx in 0..n_matrices {
        let base = matrix_idx * 9;
        cells.push([
            [raw[base], raw[base + 1], raw[base + 2]],
            [raw[base + 3], raw[base + 4], raw[base + 5]],
            [raw[base + 6], raw[base + 7], raw[base + 8]],
        ]);
    }
    Ok(cells)
}

/// Read an optional per-frame scalar series stored as `[frames]` or
/// `[frames, 1]`.
fn read_energy_series(
    file: &H5File,
    paths: &[&str],
    name: &str,
    datasets: &mut indexmap::IndexMap<String, String>,
) -> Result<Option<Vec<f64>>, ParseHdf5Error> {
    let Some((path, dataset)) = find_dataset(file, paths) else {
        return Ok(None);
    };

    let shape = dataset.shape();
    let raw = dataset.read_raw::<f64>()?;
    let values = match shape.len() {
        1 => raw,
        2 if shape[1] == 1 => raw,
        _ => {
            return Err(ParseHdf5Error::InvalidShape(
                path,
                format!("{:?}, expected [frames] or [frames, 1]", shape),
            ))
        }
    };

    datasets.insert(name.to_string(), path);
    Ok(Some(values))
}

fn read_title(file: &H5File) -> Option<String> {
    let header = file.group("header").ok()?;
    let attribute = header.attr("title").ok()?;
    let title = attribute.read_scalar::<hdf5::types::VarLenUnicode>().ok()?;
    Some(title.to_string())
}

/******************************/
/*         UNIT TESTS         */
/******************************/
