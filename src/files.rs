// Released under MIT License.
// Copyright (c) 2025-2026 atomio_rs contributors

//! File format recognition from file names and file content.

use crate::errors::ParseError;

/// Supported structure and trajectory file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// VASP POSCAR / CONTCAR.
    Poscar,
    /// XYZ or extended XYZ, single- or multi-frame.
    Xyz,
    /// Crystallographic Information File.
    Cif,
    /// VASP XDATCAR trajectory.
    Xdatcar,
    /// Torch-sim HDF5 trajectory.
    Hdf5,
    /// Pymatgen-style JSON (structure, trajectory, or array of frames).
    Json,
    /// Phonopy YAML cell export.
    PhonopyYaml,
}

impl FileFormat {
    pub fn name(&self) -> &'static str {
        match self {
            FileFormat::Poscar => "POSCAR",
            FileFormat::Xyz => "XYZ",
            FileFormat::Cif => "CIF",
            FileFormat::Xdatcar => "XDATCAR",
            FileFormat::Hdf5 => "HDF5",
            FileFormat::Json => "JSON",
            FileFormat::PhonopyYaml => "phonopy YAML",
        }
    }
}

impl std::fmt::Display for FileFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Outcome of format detection: the recognized format plus a short
/// description of what triggered the match, for logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    pub format: FileFormat,
    pub reason: &'static str,
}

impl Detection {
    fn new(format: FileFormat, reason: &'static str) -> Self {
        Detection { format, reason }
    }
}

/// Guess the format from the file name alone.
///
/// Returns `None` if the name is not conclusive. VASP files are frequently
/// named without any extension (`POSCAR`, `CONTCAR`, `XDATCAR`), so the base
/// name is matched as well as the extension.
pub fn from_name(filename: &str) -> Option<FileFormat> {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename)
        .to_lowercase();

    if base.contains("xdatcar") {
        return Some(FileFormat::Xdatcar);
    }
    if base.contains("poscar") || base.contains("contcar") || base.ends_with(".vasp") {
        return Some(FileFormat::Poscar);
    }
    if base.ends_with(".cif") {
        return Some(FileFormat::Cif);
    }
    if base.ends_with(".xyz") || base.ends_with(".extxyz") {
        return Some(FileFormat::Xyz);
    }
    if base.ends_with(".h5") || base.ends_with(".hdf5") {
        return Some(FileFormat::Hdf5);
    }
    if base.ends_with(".json") {
        return Some(FileFormat::Json);
    }
    if base.ends_with(".yaml") || base.ends_with(".yml") {
        return Some(FileFormat::PhonopyYaml);
    }

    None
}

/// Formats this library deliberately does not decode, recognized so the
/// caller gets an actionable message instead of a generic failure.
fn unsupported_by_name(filename: &str) -> Option<ParseError> {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename)
        .to_lowercase();

    let (format, suggestion) = if base.ends_with(".traj") {
        (
            "ASE trajectory",
            "Convert to extended XYZ with `ase convert input.traj output.xyz`.",
        )
    } else if base.ends_with(".dump") || base.ends_with(".lammpstrj") {
        (
            "LAMMPS dump",
            "Convert to extended XYZ, for example with OVITO or `ase convert`.",
        )
    } else if base.ends_with(".nc") || base.ends_with(".netcdf") {
        (
            "NetCDF trajectory",
            "Convert to extended XYZ, for example with MDAnalysis or `ase convert`.",
        )
    } else if base.ends_with(".dcd") {
        (
            "DCD trajectory",
            "Convert to extended XYZ, for example with MDAnalysis.",
        )
    } else {
        return None;
    };

    Some(ParseError::UnsupportedBinaryFormat {
        format: format.to_string(),
        suggestion: suggestion.to_string(),
    })
}

/// Recognize known binary containers from their magic bytes.
fn unsupported_by_magic(content: &[u8]) -> Option<ParseError> {
    let (format, suggestion) = if content.starts_with(b"- of Ulm") {
        (
            "ASE trajectory",
            "Convert to extended XYZ with `ase convert input.traj output.xyz`.",
        )
    } else if content.starts_with(b"CDF\x01") || content.starts_with(b"CDF\x02") {
        (
            "NetCDF trajectory",
            "Convert to extended XYZ, for example with MDAnalysis or `ase convert`.",
        )
    } else if content.len() >= 8 && &content[4..8] == b"CORD" {
        (
            "DCD trajectory",
            "Convert to extended XYZ, for example with MDAnalysis.",
        )
    } else {
        return None;
    };

    Some(ParseError::UnsupportedBinaryFormat {
        format: format.to_string(),
        suggestion: suggestion.to_string(),
    })
}

/// HDF5 superblock signature.
const HDF5_MAGIC: &[u8] = b"\x89HDF\r\n\x1a\n";

/// Heuristic binary check: a NUL byte or a high share of control characters
/// in the leading window means the content is not a text format.
fn looks_binary(content: &[u8]) -> bool {
    let window = &content[..content.len().min(8192)];
    if window.contains(&0) {
        return true;
    }
    let control = window
        .iter()
        .filter(|&&byte| byte < 0x09 || (byte > 0x0d && byte < 0x20))
        .count();
    control * 10 > window.len()
}

/// Detect the file format from content and an optional file name hint.
///
/// The name hint wins when conclusive; otherwise the content itself is
/// sniffed: binary magic bytes first, then text heuristics. Coordinate
/// layouts are tried before structured data, so a free-form title or
/// comment line containing `data_` or a brace cannot shadow an otherwise
/// well-formed XYZ or POSCAR body.
pub fn detect(content: &[u8], filename: Option<&str>) -> Result<Detection, ParseError> {
    if content.is_empty() {
        return Err(ParseError::EmptyFile);
    }

    if let Some(name) = filename {
        if let Some(format) = from_name(name) {
            return Ok(Detection::new(format, "file name"));
        }
        if let Some(error) = unsupported_by_name(name) {
            return Err(error);
        }
    }

    if content.starts_with(HDF5_MAGIC) {
        return Ok(Detection::new(FileFormat::Hdf5, "HDF5 magic bytes"));
    }
    if let Some(error) = unsupported_by_magic(content) {
        return Err(error);
    }
    if looks_binary(content) {
        return Err(ParseError::UnrecognizedFormat(
            "content is binary but matches no known container".to_string(),
        ));
    }

    let text = std::str::from_utf8(content).map_err(|_| ParseError::NotText)?;
    if text.trim_start().starts_with("ITEM: TIMESTEP") {
        return Err(ParseError::UnsupportedBinaryFormat {
            format: "LAMMPS dump".to_string(),
            suggestion: "Convert to extended XYZ, for example with OVITO or `ase convert`."
                .to_string(),
        });
    }
    if let Some(detection) = detect_text(text) {
        return Ok(detection);
    }

    Err(ParseError::UnrecognizedFormat(
        "content matches no known text format".to_string(),
    ))
}

fn detect_text(text: &str) -> Option<Detection> {
    if is_xyz(text) {
        return Some(Detection::new(FileFormat::Xyz, "XYZ frame layout"));
    }
    // checked before POSCAR: an XDATCAR shares the POSCAR header shape
    if text.contains("Direct configuration=") {
        return Some(Detection::new(
            FileFormat::Xdatcar,
            "XDATCAR configuration blocks",
        ));
    }
    if is_poscar(text) {
        return Some(Detection::new(FileFormat::Poscar, "POSCAR line layout"));
    }
    if is_cif(text) {
        return Some(Detection::new(FileFormat::Cif, "CIF data keywords"));
    }

    let trimmed = text.trim_start();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return Some(Detection::new(FileFormat::Json, "JSON bracket syntax"));
    }
    if is_phonopy_yaml(text) {
        return Some(Detection::new(FileFormat::PhonopyYaml, "phonopy YAML keys"));
    }

    None
}

fn is_phonopy_yaml(text: &str) -> bool {
    text.lines().take(200).any(|line| {
        line.starts_with("phonopy:")
            || line.starts_with("phono3py:")
            || line.starts_with("unit_cell:")
            || line.starts_with("primitive_cell:")
            || line.starts_with("supercell:")
    })
}

fn is_cif(text: &str) -> bool {
    text.lines().take(500).any(|line| {
        let line = line.trim_start();
        line.starts_with("data_")
            || line.starts_with("_cell_length_")
            || line.starts_with("_atom_site_")
            || line.trim_end() == "loop_"
    })
}

/// An XYZ file opens with a bare atom count followed (after the comment
/// line) by `symbol x y z` records.
fn is_xyz(text: &str) -> bool {
    let mut lines = text.lines();
    match lines.next().and_then(|l| l.trim().parse::<usize>().ok()) {
        Some(n) if n > 0 => (),
        _ => return false,
    }
    let _comment = lines.next();
    match lines.next() {
        Some(atom_line) => {
            let tokens: Vec<&str> = atom_line.split_whitespace().collect();
            tokens.len() >= 4
                && tokens[1..4]
                    .iter()
                    .all(|token| token.parse::<f64>().is_ok())
        }
        None => false,
    }
}

/// A POSCAR has a free-form comment, a numeric scale factor, then three
/// lattice vector lines.
fn is_poscar(text: &str) -> bool {
    let lines: Vec<&str> = text.lines().collect();
    if lines.len() < 8 {
        return false;
    }
    if lines[1].trim().parse::<f64>().is_err() {
        return false;
    }
    lines[2..5].iter().all(|line| {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        tokens.len() >= 3 && tokens[..3].iter().all(|token| token.parse::<f64>().is_ok())
    })
}

/******************************/
/*         UNIT TESTS         */
/******************************/
