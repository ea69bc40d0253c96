// Released under MIT License.
// Copyright (c) 2025-2026 atomio_rs contributors

//! Error and warning types returned by the `atomio_rs` library.

use thiserror::Error;

/// Error returned when a 3x3 matrix with a (near-)zero determinant
/// is passed to [`invert_3x3`](crate::math::invert_3x3).
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Matrix with determinant `{det}` is singular and cannot be inverted.")]
pub struct SingularMatrixError {
    pub det: f64,
}

/// Errors that can occur when parsing a POSCAR file.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParsePoscarError {
    #[error("POSCAR file is too short ({0} lines).")]
    TooShort(usize),
    #[error("Could not parse line `{0}` as a scale factor.")]
    InvalidScaleFactor(String),
    #[error("Could not parse line `{0}` as a lattice vector.")]
    InvalidLatticeVector(String),
    #[error("Could not parse `{0}` as a coordinate.")]
    InvalidCoordinate(String),
    #[error("Number of element symbols ({0}) does not match number of atom counts ({1}).")]
    SymbolCountMismatch(usize, usize),
    #[error("Could not parse line `{0}` as atom counts.")]
    InvalidAtomCounts(String),
    #[error("Coordinate mode line is missing.")]
    MissingCoordinateMode,
    #[error("Unknown coordinate mode `{0}`.")]
    UnknownCoordinateMode(String),
    #[error("File ended after {0} coordinate lines but {1} atoms were declared.")]
    NotEnoughCoordinates(usize, usize),
}

/// Errors that can occur when parsing an XYZ file.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseXyzError {
    #[error("XYZ file is empty.")]
    Empty,
    #[error("XYZ frame is too short ({0} lines).")]
    TooShort(usize),
    #[error("Could not parse line `{0}` as the number of atoms.")]
    InvalidAtomCount(String),
    #[error("Could not parse line `{0}` as an atom entry.")]
    InvalidAtomLine(String),
    #[error("Could not parse `{0}` as a coordinate.")]
    InvalidCoordinate(String),
    #[error("File ended after {0} coordinate lines but {1} atoms were declared.")]
    NotEnoughCoordinates(usize, usize),
    #[error("No valid frames found in XYZ trajectory.")]
    NoFrames,
}

/// Errors that can occur when parsing a CIF file.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseCifError {
    #[error("CIF file is too short ({0} lines).")]
    TooShort(usize),
    #[error("Could not parse `{1}` as a value for `{0}`.")]
    InvalidCellParameter(String, String),
    #[error("No atom sites found in CIF file.")]
    NoAtomSites,
}

/// Errors that can occur when parsing a VASP XDATCAR file.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseXdatcarError {
    #[error("XDATCAR file is too short ({0} lines).")]
    TooShort(usize),
    #[error("Could not parse line `{0}` as a scale factor.")]
    InvalidScaleFactor(String),
    #[error("Could not parse line `{0}` as a lattice vector.")]
    InvalidLatticeVector(String),
    #[error("Element symbols `{0}` do not match atom counts `{1}`.")]
    ElementCountMismatch(String, String),
    #[error("No valid configurations found in XDATCAR.")]
    NoConfigurations,
}

/// Errors that can occur when parsing pymatgen-style JSON input.
#[derive(Error, Debug)]
pub enum ParseJsonError {
    #[error("Content is not valid JSON: {0}.")]
    Syntax(#[from] serde_json::Error),
    #[error("Frame {0} does not contain a structure.")]
    MissingStructure(usize),
    #[error("Could not interpret frame {0}: {1}.")]
    InvalidFrame(usize, String),
    #[error("Invalid pymatgen trajectory: {0}.")]
    InvalidPymatgenTrajectory(String),
    #[error("JSON document is neither an array of frames, an object with a `frames` key, a pymatgen trajectory, nor a single structure.")]
    UnrecognizedLayout,
}

/// Errors that can occur when parsing a phonopy YAML cell export.
#[derive(Error, Debug)]
pub enum ParsePhonopyError {
    #[error("Content is not valid YAML: {0}.")]
    Yaml(#[from] serde_yaml::Error),
    #[error("No `{0}` block found in phonopy YAML file.")]
    MissingCell(String),
    #[error("Could not interpret cell block `{0}`: {1}.")]
    InvalidCell(String, String),
}

/// Errors that can occur when parsing a torch-sim HDF5 trajectory.
#[cfg(feature = "hdf5-input")]
#[derive(Error, Debug)]
pub enum ParseHdf5Error {
    #[error("Could not read HDF5 file: {0}.")]
    Hdf5(#[from] hdf5::Error),
    #[error("Could not stage HDF5 content for reading: {0}.")]
    Staging(String),
    #[error("Required dataset `{0}` was not found under any known location.")]
    MissingDataset(String),
    #[error("Dataset `{0}` has an unexpected shape: {1}.")]
    InvalidShape(String, String),
}

/// Top-level error returned by [`parse`](crate::io::parse).
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("File is empty.")]
    EmptyFile,
    #[error("Could not determine file format: {0}.")]
    UnrecognizedFormat(String),
    #[error("Unsupported binary format `{format}`. {suggestion}")]
    UnsupportedBinaryFormat { format: String, suggestion: String },
    #[error("Could not decompress gzip content: {0}.")]
    Decompress(String),
    #[error("File is not valid UTF-8 text.")]
    NotText,
    #[error("{0}")]
    Poscar(#[from] ParsePoscarError),
    #[error("{0}")]
    Xyz(#[from] ParseXyzError),
    #[error("{0}")]
    Cif(#[from] ParseCifError),
    #[error("{0}")]
    Xdatcar(#[from] ParseXdatcarError),
    #[error("{0}")]
    Json(#[from] ParseJsonError),
    #[error("{0}")]
    Phonopy(#[from] ParsePhonopyError),
    #[cfg(feature = "hdf5-input")]
    #[error("{0}")]
    Hdf5(#[from] ParseHdf5Error),
}

/// Recoverable faults encountered while decoding a file.
///
/// Warnings never abort a parse. They are logged through the `log` crate as
/// they occur and collected into
/// [`TrajectoryMetadata::warnings`](crate::structures::trajectory::TrajectoryMetadata)
/// so that callers can see exactly what was substituted or skipped.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseWarning {
    #[error("Unknown element symbol `{symbol}`; substituted fallback `{fallback}`.")]
    UnknownElement { symbol: String, fallback: String },
    #[error("Skipped frame {index}: {reason}.")]
    SkippedFrame { index: usize, reason: String },
    #[error("Skipped site line `{line}`: {reason}.")]
    SkippedSite { line: String, reason: String },
    #[error("Repaired malformed coordinate line `{line}`.")]
    RepairedCoordinates { line: String },
    #[error("Dataset `{name}` not present; {effect}.")]
    MissingOptionalDataset { name: String, effect: String },
}
