// Released under MIT License.
// Copyright (c) 2025-2026 atomio_rs contributors

//! Implementation of the Frame and Trajectory structures, the trajectory
//! validator, and the statistics engine.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::errors::ParseWarning;
use crate::files::FileFormat;
use crate::structures::structure::Structure;

/// Physical quantities commonly attached to a trajectory frame.
///
/// Source formats label these inconsistently (`energy`, `E`, `etot`, ...);
/// decoders map all known aliases onto this closed enumeration so that
/// consumers can look up the common quantities without string matching.
/// Anything that does not fit lands in [`FrameMetadata::extra`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quantity {
    Energy,
    EnergyPerAtom,
    KineticEnergy,
    Volume,
    Pressure,
    Temperature,
    Bandgap,
    ForceMax,
    ForceRms,
    StressMax,
    StressFrobenius,
}

impl Quantity {
    /// Canonical metadata key for this quantity.
    pub fn key(&self) -> &'static str {
        match self {
            Quantity::Energy => "energy",
            Quantity::EnergyPerAtom => "energy_per_atom",
            Quantity::KineticEnergy => "kinetic_energy",
            Quantity::Volume => "volume",
            Quantity::Pressure => "pressure",
            Quantity::Temperature => "temperature",
            Quantity::Bandgap => "bandgap",
            Quantity::ForceMax => "force_max",
            Quantity::ForceRms => "force_rms",
            Quantity::StressMax => "stress_max",
            Quantity::StressFrobenius => "stress_frobenius",
        }
    }

    /// Alternative names under which source formats expose this quantity.
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            Quantity::Energy => &["energy", "E", "total_energy", "etot", "total_e"],
            Quantity::EnergyPerAtom => &["energy_per_atom", "e_per_atom", "energy/atom", "epa"],
            Quantity::KineticEnergy => &["kinetic_energy", "ekin"],
            Quantity::Volume => &["volume", "vol", "V", "cell_volume"],
            Quantity::Pressure => &["pressure", "P", "press"],
            Quantity::Temperature => &["temperature", "temp", "T", "kelvin"],
            Quantity::Bandgap => &["bandgap", "E_gap", "gap", "band_gap", "egap", "bg"],
            Quantity::ForceMax => &["max_force", "force_max", "fmax", "maximum_force"],
            Quantity::ForceRms => &["force_rms", "rms_force"],
            Quantity::StressMax => &["max_stress", "stress_max", "maximum_stress"],
            Quantity::StressFrobenius => {
                &["stress_frobenius", "frobenius_stress", "stress_frob"]
            }
        }
    }

    /// All quantities, in the order decoders probe them.
    pub const ALL: [Quantity; 11] = [
        Quantity::Energy,
        Quantity::EnergyPerAtom,
        Quantity::KineticEnergy,
        Quantity::Volume,
        Quantity::Pressure,
        Quantity::Temperature,
        Quantity::Bandgap,
        Quantity::ForceMax,
        Quantity::ForceRms,
        Quantity::StressMax,
        Quantity::StressFrobenius,
    ];

    /// Match a raw key (case-insensitively) against the canonical key and all
    /// aliases of every quantity.
    pub fn from_alias(key: &str) -> Option<Quantity> {
        Quantity::ALL.into_iter().find(|quantity| {
            quantity.key().eq_ignore_ascii_case(key)
                || quantity
                    .aliases()
                    .iter()
                    .any(|alias| alias.eq_ignore_ascii_case(key))
        })
    }
}

/// Per-frame metadata: a typed map of known physical quantities, typed
/// vector fields for forces and stress, and a residual free-form bag.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FrameMetadata {
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub known: IndexMap<Quantity, f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forces: Option<Vec<[f64; 3]>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stress: Option<[[f64; 3]; 3]>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub extra: IndexMap<String, serde_json::Value>,
}

impl FrameMetadata {
    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
            && self.forces.is_none()
            && self.stress.is_none()
            && self.extra.is_empty()
    }

    /// Record a known quantity, keeping the first value seen for each.
    pub fn insert(&mut self, quantity: Quantity, value: f64) {
        self.known.entry(quantity).or_insert(value);
    }

    pub fn get(&self, quantity: Quantity) -> Option<f64> {
        self.known.get(&quantity).copied()
    }
}

/// One timestep of a trajectory: a structure plus a step index and metadata.
///
/// Step indices are monotonic within a trajectory but are not required to
/// start at zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub structure: Structure,
    pub step: i64,
    #[serde(default, skip_serializing_if = "FrameMetadata::is_empty")]
    pub metadata: FrameMetadata,
}

impl Frame {
    pub fn new(structure: Structure, step: i64) -> Self {
        Frame {
            structure,
            step,
            metadata: FrameMetadata::default(),
        }
    }
}

/// Trajectory-level metadata stamped by the assembler.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TrajectoryMetadata {
    /// Format the trajectory was decoded from.
    pub source_format: Option<FileFormat>,
    pub filename: Option<String>,
    /// Title or comment carried by the source file header, if any.
    pub title: Option<String>,
    pub frame_count: usize,
    /// Total number of atoms in the first frame.
    pub total_atoms: usize,
    /// Elements present in the first frame, in first-appearance order.
    pub elements: Vec<String>,
    /// Per-element site counts of the first frame.
    pub element_counts: IndexMap<String, usize>,
    /// Concrete dataset paths discovered inside binary containers,
    /// keyed by logical dataset name. Useful for diagnosing files written
    /// by differing producer versions.
    pub datasets: IndexMap<String, String>,
    /// Whether all frames share one lattice, when the source declares it.
    pub constant_lattice: Option<bool>,
    /// Recoverable faults encountered while decoding.
    pub warnings: Vec<ParseWarning>,
}

/// An ordered sequence of frames plus trajectory-level metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    pub frames: Vec<Frame>,
    pub metadata: TrajectoryMetadata,
}

impl Trajectory {
    /// Wrap decoded frames into a trajectory, stamping element list,
    /// per-element counts, atom count, frame count, filename, and the
    /// source format tag.
    pub fn assemble(
        frames: Vec<Frame>,
        source_format: FileFormat,
        filename: Option<&str>,
    ) -> Self {
        let mut metadata = TrajectoryMetadata {
            source_format: Some(source_format),
            filename: filename.map(|name| name.to_string()),
            frame_count: frames.len(),
            ..TrajectoryMetadata::default()
        };

        if let Some(first) = frames.first() {
            let counts = first.structure.element_counts();
            metadata.total_atoms = first.structure.n_sites();
            metadata.elements = counts.keys().cloned().collect();
            metadata.element_counts = counts;
        }

        Trajectory { frames, metadata }
    }

    /// Validate structural invariants.
    ///
    /// ## Returns
    /// A list of human-readable messages, one per violation. An empty list
    /// means the trajectory is valid. Callers decide whether violations are
    /// fatal.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.frames.is_empty() {
            errors.push("Trajectory must have at least one frame".to_string());
        }

        for (index, frame) in self.frames.iter().enumerate() {
            if frame.structure.sites.is_empty() {
                errors.push(format!("Frame {} structure has no sites", index));
            }
        }

        errors
    }

    /// Derive lightweight summary statistics. Pure with respect to `self`.
    pub fn stats(&self) -> TrajectoryStats {
        let mut steps: Vec<i64> = self.frames.iter().map(|frame| frame.step).collect();
        steps.sort_unstable();

        let step_range = match (steps.first(), steps.last()) {
            (Some(&first), Some(&last)) => Some((first, last)),
            _ => None,
        };

        let atom_counts: Vec<usize> = self
            .frames
            .iter()
            .map(|frame| frame.structure.n_sites())
            .collect();
        let constant_atom_count = atom_counts.windows(2).all(|pair| pair[0] == pair[1]);

        let (total_atoms, atom_count_range) = if constant_atom_count {
            (atom_counts.first().copied(), None)
        } else {
            let min = atom_counts.iter().copied().min();
            let max = atom_counts.iter().copied().max();
            (None, min.zip(max))
        };

        TrajectoryStats {
            frame_count: self.frames.len(),
            steps,
            step_range,
            constant_atom_count,
            total_atoms,
            atom_count_range,
        }
    }
}

/// Summary statistics over an assembled trajectory.
#[derive(Debug, Clone, PartialEq)]
pub struct TrajectoryStats {
    pub frame_count: usize,
    /// Sorted step indices of all frames.
    pub steps: Vec<i64>,
    /// Smallest and largest step index.
    pub step_range: Option<(i64, i64)>,
    /// True if every frame has the same number of sites. Consumers use this
    /// to decide whether per-frame resampling is needed.
    pub constant_atom_count: bool,
    /// Atom count shared by all frames, when constant.
    pub total_atoms: Option<usize>,
    /// Smallest and largest atom count, when not constant.
    pub atom_count_range: Option<(usize, usize)>,
}

/******************************/
/*         UNIT TESTS         */
/******************************/

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structures::site::{Site, Species};

    fn frame_with_sites(n: usize, step: i64) -> Frame {
        let sites = (0..n)
            .map(|i| {
                Site::new(
                    Species::new("H"),
                    [0.0; 3],
                    [0.0; 3],
                    format!("H{}", i + 1),
                )
            })
            .collect();
        Frame::new(Structure::new(sites, None), step)
    }

    #[test]
    fn quantity_alias_lookup() {
        assert_eq!(Quantity::from_alias("etot"), Some(Quantity::Energy));
        assert_eq!(Quantity::from_alias("ENERGY"), Some(Quantity::Energy));
        assert_eq!(Quantity::from_alias("fmax"), Some(Quantity::ForceMax));
        assert_eq!(Quantity::from_alias("nonsense"), None);
    }

    #[test]
    fn assemble_stamps_metadata() {
        let trajectory = Trajectory::assemble(
            vec![frame_with_sites(3, 0)],
            FileFormat::Xyz,
            Some("water.xyz"),
        );

        assert_eq!(trajectory.metadata.frame_count, 1);
        assert_eq!(trajectory.metadata.total_atoms, 3);
        assert_eq!(trajectory.metadata.elements, vec!["H".to_string()]);
        assert_eq!(trajectory.metadata.filename.as_deref(), Some("water.xyz"));
        assert_eq!(trajectory.metadata.source_format, Some(FileFormat::Xyz));
    }

    #[test]
    fn validate_reports_empty_trajectory() {
        let trajectory = Trajectory::assemble(Vec::new(), FileFormat::Xyz, None);
        let errors = trajectory.validate();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("at least one frame"));
    }

    #[test]
    fn validate_reports_empty_frames() {
        let trajectory =
            Trajectory::assemble(vec![frame_with_sites(0, 0)], FileFormat::Xyz, None);
        let errors = trajectory.validate();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("no sites"));
    }

    #[test]
    fn stats_constant_atom_count() {
        let trajectory = Trajectory::assemble(
            vec![frame_with_sites(2, 5), frame_with_sites(2, 10)],
            FileFormat::Xyz,
            None,
        );
        let stats = trajectory.stats();

        assert_eq!(stats.frame_count, 2);
        assert_eq!(stats.steps, vec![5, 10]);
        assert_eq!(stats.step_range, Some((5, 10)));
        assert!(stats.constant_atom_count);
        assert_eq!(stats.total_atoms, Some(2));
        assert_eq!(stats.atom_count_range, None);
    }

    #[test]
    fn stats_variable_atom_count() {
        let trajectory = Trajectory::assemble(
            vec![frame_with_sites(1, 0), frame_with_sites(2, 1)],
            FileFormat::Xyz,
            None,
        );
        let stats = trajectory.stats();

        assert!(!stats.constant_atom_count);
        assert_eq!(stats.total_atoms, None);
        assert_eq!(stats.atom_count_range, Some((1, 2)));
    }

    #[test]
    fn stats_sorts_steps() {
        let trajectory = Trajectory::assemble(
            vec![frame_with_sites(1, 20), frame_with_sites(1, 5)],
            FileFormat::Xyz,
            None,
        );
        assert_eq!(trajectory.stats().steps, vec![5, 20]);
        assert_eq!(trajectory.stats().step_range, Some((5, 20)));
    }
}
