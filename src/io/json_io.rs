// Released under MIT License.
// Copyright (c) 2025-2026 atomio_rs contributors

//! Implementation of functions for reading and writing pymatgen-style JSON:
//! single structures, arrays of frames, objects with a `frames` key, and
//! pymatgen `Trajectory` documents.

use serde_json::Value;

use crate::errors::ParseJsonError;
use crate::files::FileFormat;
use crate::io::{self, Diagnostics};
use crate::math::Matrix3;
use crate::structures::element::PLACEHOLDER_SYMBOL;
use crate::structures::lattice::Lattice;
use crate::structures::site::{Site, Species};
use crate::structures::structure::Structure;
use crate::structures::trajectory::{Frame, FrameMetadata, Quantity, Trajectory};

/// Parse JSON content into a [`Trajectory`].
///
/// Four layouts are recognized, probed in order:
/// 1. a JSON array of frames (each an object with a `structure` key, or
///    itself a structure with `sites`),
/// 2. a pymatgen `Trajectory` document (`"@class": "Trajectory"` with
///    `species`, `coords`, `lattice`, and `frame_properties`),
/// 3. an object with a `frames` array,
/// 4. a single structure object with a `sites` key (one frame at step 0).
pub fn parse_json(content: &str) -> Result<Trajectory, ParseJsonError> {
    let mut diagnostics = Diagnostics::new();
    parse_json_diag(content, &mut diagnostics)
}

pub(crate) fn parse_json_diag(
    content: &str,
    _diagnostics: &mut Diagnostics,
) -> Result<Trajectory, ParseJsonError> {
    let value: Value = serde_json::from_str(content)?;

    if let Value::Array(entries) = &value {
        let frames = frames_from_array(entries)?;
        return Ok(Trajectory::assemble(frames, FileFormat::Json, None));
    }

    let Value::Object(object) = &value else {
        return Err(ParseJsonError::UnrecognizedLayout);
    };

    if object.get("@class").and_then(Value::as_str) == Some("Trajectory") {
        return parse_pymatgen_trajectory(object);
    }

    if let Some(Value::Array(entries)) = object.get("frames") {
        let frames = frames_from_array(entries)?;
        return Ok(Trajectory::assemble(frames, FileFormat::Json, None));
    }

    if object.contains_key("sites") {
        let structure = structure_from_value(&value, 0)?;
        return Ok(Trajectory::assemble(
            vec![Frame::new(structure, 0)],
            FileFormat::Json,
            None,
        ));
    }

    Err(ParseJsonError::UnrecognizedLayout)
}

fn frames_from_array(entries: &[Value]) -> Result<Vec<Frame>, ParseJsonError> {
    let mut frames = Vec::with_capacity(entries.len());

    for (index, entry) in entries.iter().enumerate() {
        let Value::Object(object) = entry else {
            return Err(ParseJsonError::InvalidFrame(
                index,
                "frame is not an object".to_string(),
            ));
        };

        let structure = if let Some(structure) = object.get("structure") {
            structure_from_value(structure, index)?
        } else if object.contains_key("sites") {
            structure_from_value(entry, index)?
        } else {
            return Err(ParseJsonError::MissingStructure(index));
        };

        let step = object
            .get("step")
            .and_then(Value::as_i64)
            .unwrap_or(index as i64);

        // explicit metadata wins; otherwise scan the frame object itself
        let mut metadata = FrameMetadata::default();
        match object.get("metadata") {
            Some(Value::Object(map)) => metadata_from_map(map, &mut metadata),
            _ => metadata_from_map(object, &mut metadata),
        }

        let mut frame = Frame::new(structure, step);
        frame.metadata = metadata;
        frames.push(frame);
    }

    Ok(frames)
}

fn structure_from_value(value: &Value, index: usize) -> Result<Structure, ParseJsonError> {
    let mut structure: Structure = serde_json::from_value(value.clone())
        .map_err(|error| ParseJsonError::InvalidFrame(index, error.to_string()))?;

    // structure dicts may omit Cartesian coordinates and labels
    for (site_index, site) in structure.sites.iter_mut().enumerate() {
        if site.xyz == [0.0; 3] && site.abc != [0.0; 3] {
            if let Some(lattice) = &structure.lattice {
                site.xyz = lattice.fractional_to_cartesian(&site.abc);
            }
        }
        if site.label.is_empty() {
            let element = site.element().unwrap_or(PLACEHOLDER_SYMBOL);
            site.label = format!("{}{}", element, site_index + 1);
        }
    }

    Ok(structure)
}

/// Fold a JSON object into typed frame metadata: numeric values whose key
/// matches a known quantity alias land in the typed map, `forces` and
/// `stress` land in the typed vector fields (with their derived scalar
/// statistics), and everything else is kept verbatim in the extra bag.
fn metadata_from_map(map: &serde_json::Map<String, Value>, metadata: &mut FrameMetadata) {
    for (key, value) in map {
        match key.as_str() {
            // structural keys of a frame object are not metadata
            "structure" | "step" | "sites" | "metadata" => continue,
            // output of our own serializer
            "extra" => {
                if let Value::Object(extra) = value {
                    for (inner_key, inner_value) in extra {
                        metadata
                            .extra
                            .entry(inner_key.clone())
                            .or_insert_with(|| inner_value.clone());
                    }
                    continue;
                }
            }
            "known" => {
                if let Value::Object(known) = value {
                    for (inner_key, inner_value) in known {
                        if let (Some(quantity), Some(number)) =
                            (Quantity::from_alias(inner_key), inner_value.as_f64())
                        {
                            metadata.insert(quantity, number);
                        }
                    }
                }
                continue;
            }
            "forces" => {
                if let Some(forces) = vectors_from_value(value) {
                    if let Some((max, rms)) = io::force_stats(&forces) {
                        metadata.insert(Quantity::ForceMax, max);
                        metadata.insert(Quantity::ForceRms, rms);
                    }
                    metadata.forces = Some(forces);
                    continue;
                }
            }
            "stress" => {
                if let Some(stress) = matrix_from_value(value) {
                    let (von_mises, _, pressure) = io::stress_invariants(&stress);
                    metadata.insert(Quantity::StressMax, von_mises);
                    metadata.insert(Quantity::Pressure, pressure);
                    metadata.stress = Some(stress);
                    continue;
                }
            }
            _ => (),
        }

        match (Quantity::from_alias(key), value.as_f64()) {
            (Some(quantity), Some(number)) => metadata.insert(quantity, number),
            _ => {
                metadata.extra.insert(key.clone(), value.clone());
            }
        }
    }
}

fn parse_pymatgen_trajectory(
    object: &serde_json::Map<String, Value>,
) -> Result<Trajectory, ParseJsonError> {
    let species = object
        .get("species")
        .and_then(Value::as_array)
        .ok_or_else(|| invalid_pymatgen("missing `species` array"))?;
    let coords = object
        .get("coords")
        .and_then(Value::as_array)
        .ok_or_else(|| invalid_pymatgen("missing `coords` array"))?;
    let matrix = object
        .get("lattice")
        .and_then(matrix_from_value)
        .ok_or_else(|| invalid_pymatgen("missing or malformed `lattice` matrix"))?;

    let elements: Vec<String> = species
        .iter()
        .map(|entry| {
            entry
                .as_str()
                .map(str::to_string)
                .or_else(|| {
                    entry
                        .get("element")
                        .and_then(Value::as_str)
                        .map(str::to_string)
                })
                .ok_or_else(|| invalid_pymatgen("species entry has no element"))
        })
        .collect::<Result<_, _>>()?;

    let frame_properties = object
        .get("frame_properties")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    let charge = object.get("charge").and_then(Value::as_f64).unwrap_or(0.0);
    let constant_lattice = object.get("constant_lattice").and_then(Value::as_bool);

    let lattice = Lattice::from_matrix(matrix);

    let mut frames = Vec::with_capacity(coords.len());
    for (frame_index, frame_coords) in coords.iter().enumerate() {
        let frame_coords = frame_coords
            .as_array()
            .ok_or_else(|| invalid_pymatgen("coords frame is not an array"))?;

        if frame_coords.len() != elements.len() {
            return Err(invalid_pymatgen(
                "coords frame length does not match species length",
            ));
        }

        let mut sites = Vec::with_capacity(frame_coords.len());
        for (site_index, entry) in frame_coords.iter().enumerate() {
            let abc = vector_from_value(entry)
                .ok_or_else(|| invalid_pymatgen("coordinate entry is not a 3-vector"))?;
            let xyz = lattice.fractional_to_cartesian(&abc);
            let element = &elements[site_index];
            sites.push(Site::new(
                Species::new(element.clone()),
                abc,
                xyz,
                element.clone(),
            ));
        }

        let mut structure = Structure::new(sites, Some(lattice.clone()));
        structure.charge = charge;

        let mut metadata = FrameMetadata::default();
        if let Some(Value::Object(properties)) = frame_properties.get(frame_index) {
            metadata_from_map(properties, &mut metadata);
        }

        let mut frame = Frame::new(structure, frame_index as i64);
        frame.metadata = metadata;
        frames.push(frame);
    }

    let mut trajectory = Trajectory::assemble(frames, FileFormat::Json, None);
    trajectory.metadata.constant_lattice = constant_lattice;
    Ok(trajectory)
}

fn invalid_pymatgen(reason: &str) -> ParseJsonError {
    ParseJsonError::InvalidPymatgenTrajectory(reason.to_string())
}

/// Read a 3-vector from a JSON array of numbers.
fn vector_from_value(value: &Value) -> Option<[f64; 3]> {
    let entries = value.as_array()?;
    if entries.len() != 3 {
        return None;
    }
    Some([
        entries[0].as_f64()?,
        entries[1].as_f64()?,
        entries[2].as_f64()?,
    ])
}

/// Read a list of 3-vectors, unwrapping a pymatgen `{"data": [...]}` wrapper.
fn vectors_from_value(value: &Value) -> Option<Vec<[f64; 3]>> {
    let value = value.get("data").unwrap_or(value);
    value.as_array()?.iter().map(vector_from_value).collect()
}

/// Read a 3x3 matrix, unwrapping a pymatgen `{"data": [...]}` wrapper.
fn matrix_from_value(value: &Value) -> Option<Matrix3> {
    let value = value.get("data").unwrap_or(value);
    let rows = value.as_array()?;
    if rows.len() != 3 {
        return None;
    }
    Some([
        vector_from_value(&rows[0])?,
        vector_from_value(&rows[1])?,
        vector_from_value(&rows[2])?,
    ])
}

/// Serialize a structure as pretty-printed JSON.
pub fn structure_to_json(structure: &Structure) -> Result<String, ParseJsonError> {
    Ok(serde_json::to_string_pretty(structure)?)
}

/// Serialize trajectory frames as a pretty-printed JSON array that
/// [`parse_json`] reads back.
pub fn frames_to_json(frames: &[Frame]) -> Result<String, ParseJsonError> {
    Ok(serde_json::to_string_pretty(frames)?)
}

/******************************/
/*         UNIT TESTS         */
/******************************/
