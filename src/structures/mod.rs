// Released under MIT License.
// Copyright (c) 2025-2026 atomio_rs contributors

//! This module contains the definitions and methods of the data model:
//! elements, lattices, sites, structures, and trajectories.

pub mod element;
pub mod lattice;
pub mod site;
pub mod structure;
pub mod trajectory;
