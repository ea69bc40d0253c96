// Released under MIT License.
// Copyright (c) 2025-2026 atomio_rs contributors

//! # atomio_rs: Atomistic Structure and Trajectory Parsing Library for Rust
//!
//! Rust library for reading atomistic structures and molecular dynamics
//! trajectories from the common formats of computational materials science.
//! Content is sniffed, decoded, and assembled into one canonical
//! [`Trajectory`](crate::structures::trajectory::Trajectory) model
//! independent of the source format.
//!
//! ## Usage
//!
//! Run
//!
//! ```bash
//! $ cargo add atomio_rs
//! ```
//!
//! Import the crate in your Rust code:
//! ```
//! use atomio_rs::prelude::*;
//! ```
//!
//! ## Examples
//!
//! #### Parsing a file of unknown format
//!
//! Hand the raw bytes to the dispatcher and let it sniff the format.
//! Gzip-compressed content is transparently decompressed.
//!
//! ```no_run
//! use atomio_rs::prelude::*;
//! use std::error::Error;
//!
//! fn main() -> Result<(), Box<dyn Error>> {
//!     let content = std::fs::read("XDATCAR.gz")?;
//!     let trajectory = parse(&content, Some("XDATCAR.gz"))?;
//!
//!     println!(
//!         "{} frames of {} atoms",
//!         trajectory.frames.len(),
//!         trajectory.metadata.total_atoms
//!     );
//!
//!     for frame in &trajectory.frames {
//!         if let Some(energy) = frame.metadata.get(Quantity::Energy) {
//!             println!("step {}: E = {energy}", frame.step);
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! #### Decoding a specific format
//!
//! Every decoder is also exposed directly, bypassing detection.
//!
//! ```no_run
//! use atomio_rs::io::poscar::parse_poscar;
//! use std::error::Error;
//!
//! fn main() -> Result<(), Box<dyn Error>> {
//!     let content = std::fs::read_to_string("POSCAR")?;
//!     let structure = parse_poscar(&content)?;
//!
//!     println!("{}", structure.formula());
//!
//!     Ok(())
//! }
//! ```
//!
//! #### Writing structures back out
//!
//! Structures and trajectories serialize to extended XYZ and JSON.
//!
//! ```no_run
//! use atomio_rs::prelude::*;
//! use atomio_rs::io::xyz::write_xyz_trajectory;
//! use std::error::Error;
//!
//! fn main() -> Result<(), Box<dyn Error>> {
//!     let content = std::fs::read("traj.xyz")?;
//!     let trajectory = parse(&content, Some("traj.xyz"))?;
//!     std::fs::write("out.xyz", write_xyz_trajectory(&trajectory))?;
//!     Ok(())
//! }
//! ```
//!
//! ## Error handling
//! Errors that can occur when working with `atomio_rs` are defined in the
//! `errors` module. The individual error types are however not exported into
//! the `prelude` module.
//!
//! If you want to use a specific error type from the `atomio_rs` library, you
//! will have to include it explicitly from the `errors` module. For instance,
//! if you want to directly work with errors that can occur when parsing a
//! POSCAR file, use:
//! ```
//! use atomio_rs::errors::ParsePoscarError;
//! ```
//!
//! Note that `atomio_rs` will still work correctly even if you do not
//! explicitly include the error types.
//!
//! ## Features
//! - [x] reading POSCAR/CONTCAR files (VASP 4 and 5, selective dynamics)
//! - [x] reading single- and multi-frame (extended) XYZ files
//! - [x] reading CIF files
//! - [x] reading VASP XDATCAR trajectories
//! - [x] reading pymatgen `Structure` and `Trajectory` JSON
//! - [x] reading phonopy/phono3py YAML cell exports
//! - [x] reading torch-sim HDF5 trajectories (`hdf5-input` feature)
//! - [x] transparent gzip decompression
//! - [x] content-based format detection
//! - [x] per-frame scalar metadata with alias normalization
//! - [x] writing extended XYZ and JSON
//! - [ ] reading ASE `.traj`, LAMMPS dump, NetCDF, and DCD trajectories
//!
//! ## License
//! This library is released under the MIT License.

/// Current version of the `atomio_rs` library.
pub const ATOMIO_VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod errors;
pub mod files;
pub mod io;
pub mod math;
pub mod structures;

/// Reexported basic `atomio_rs` structures and functions.
pub mod prelude {
    pub use crate::files::{detect, FileFormat};
    pub use crate::io::parse;
    pub use crate::structures::lattice::Lattice;
    pub use crate::structures::site::{Site, Species};
    pub use crate::structures::structure::Structure;
    pub use crate::structures::trajectory::{
        Frame, FrameMetadata, Quantity, Trajectory, TrajectoryStats,
    };
}
