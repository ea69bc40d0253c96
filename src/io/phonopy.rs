// Released under MIT License.
// Copyright (c) 2025-2026 atomio_rs contributors

//! Implementation of functions for reading phonopy and phono3py YAML cell
//! exports (`phonopy_params.yaml`, `phono3py_params.yaml`, ...).

use serde::Deserialize;

use crate::errors::{ParsePhonopyError, ParseWarning};
use crate::io::Diagnostics;
use crate::structures::element::resolve_symbol;
use crate::structures::lattice::Lattice;
use crate::structures::site::{Site, Species};
use crate::structures::structure::Structure;

/// Which cell block of a phonopy document to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CellSelector {
    /// Prefer `primitive_cell`, fall back to `unit_cell`, then `supercell`.
    #[default]
    Auto,
    Primitive,
    Unit,
    Supercell,
}

#[derive(Deserialize)]
struct PhonopyDocument {
    #[serde(default)]
    primitive_cell: Option<CellBlock>,
    #[serde(default)]
    unit_cell: Option<CellBlock>,
    #[serde(default)]
    supercell: Option<CellBlock>,
}

#[derive(Deserialize)]
struct CellBlock {
    lattice: Vec<[f64; 3]>,
    points: Vec<PointEntry>,
}

#[derive(Deserialize)]
struct PointEntry {
    symbol: String,
    coordinates: [f64; 3],
    #[serde(default)]
    mass: Option<f64>,
}

/// Parse a phonopy YAML document into a [`Structure`].
///
/// Only the selected cell block is interpreted; force constants, phonon
/// displacements, and the rest of the document are ignored. Documents can
/// carry megabytes of `phonon_displacements:` data, so everything from that
/// key onward is cut off before the YAML is even parsed.
pub fn parse_phonopy(
    content: &str,
    selector: CellSelector,
) -> Result<Structure, ParsePhonopyError> {
    let mut diagnostics = Diagnostics::new();
    parse_phonopy_diag(content, selector, &mut diagnostics)
}

pub(crate) fn parse_phonopy_diag(
    content: &str,
    selector: CellSelector,
    diagnostics: &mut Diagnostics,
) -> Result<Structure, ParsePhonopyError> {
    let content = truncate_displacements(content);
    let document: PhonopyDocument = serde_yaml::from_str(content)?;

    let (name, cell) = match selector {
        CellSelector::Primitive => ("primitive_cell", document.primitive_cell),
        CellSelector::Unit => ("unit_cell", document.unit_cell),
        CellSelector::Supercell => ("supercell", document.supercell),
        CellSelector::Auto => {
            let cell = document
                .primitive_cell
                .or(document.unit_cell)
                .or(document.supercell);
            ("primitive_cell or unit_cell", cell)
        }
    };

    let cell = cell.ok_or_else(|| ParsePhonopyError::MissingCell(name.to_string()))?;
    build_structure(name, cell, diagnostics)
}

fn build_structure(
    name: &str,
    cell: CellBlock,
    diagnostics: &mut Diagnostics,
) -> Result<Structure, ParsePhonopyError> {
    if cell.lattice.len() != 3 {
        return Err(ParsePhonopyError::InvalidCell(
            name.to_string(),
            format!("expected 3 lattice vectors, found {}", cell.lattice.len()),
        ));
    }
    let matrix = [cell.lattice[0], cell.lattice[1], cell.lattice[2]];
    let lattice = Lattice::from_matrix(matrix);

    if cell.points.is_empty() {
        return Err(ParsePhonopyError::InvalidCell(
            name.to_string(),
            "cell has no points".to_string(),
        ));
    }

    let mut sites = Vec::with_capacity(cell.points.len());
    for (index, point) in cell.points.into_iter().enumerate() {
        let (element, substituted) = resolve_symbol(&point.symbol, index);
        if substituted {
            diagnostics.warn(ParseWarning::UnknownElement {
                symbol: point.symbol.clone(),
                fallback: element.to_string(),
            });
        }

        let abc = point.coordinates;
        let xyz = lattice.fractional_to_cartesian(&abc);
        let mut site = Site::new(
            Species::new(element),
            abc,
            xyz,
            format!("{}{}", element, index + 1),
        );
        if let Some(mass) = point.mass {
            site.properties
                .extra
                .insert("mass".to_string(), serde_json::json!(mass));
        }
        sites.push(site);
    }

    Ok(Structure::new(sites, Some(lattice)))
}

/// Cut the document off at the `phonon_displacements:` key.
fn truncate_displacements(content: &str) -> &str {
    match content.find("\nphonon_displacements:") {
        Some(position) => &content[..position],
        None => content,
    }
}

/******************************/
/*         UNIT TESTS         */
/******************************/

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    const AGI: &str = "\
phono3py:
  version: 2.3.0
  frequency_unit_conversion_factor: 15.633302

space_group:
  type: \"P6_3mc\"
  number: 186

primitive_cell:
  lattice:
  - [     4.556340561269590,     0.000000000000000,     0.000000000000000 ]
  - [    -2.278170280634795,     3.945906674352911,     0.000000000000000 ]
  - [     0.000000000000000,     0.000000000000000,     7.446308720723541 ]
  points:
  - symbol: Ag
    coordinates: [  0.333333333333333,  0.666666666666667,  0.001734192635380 ]
    mass: 107.868200
  - symbol: I
    coordinates: [  0.333333333333333,  0.666666666666667,  0.376708787364615 ]
    mass: 126.904470

unit_cell:
  lattice:
  - [     9.112681122539180,     0.000000000000000,     0.000000000000000 ]
  - [    -4.556340561269590,     7.891813348705822,     0.000000000000000 ]
  - [     0.000000000000000,     0.000000000000000,     7.446308720723541 ]
  points:
  - symbol: Ag
    coordinates: [  0.166666666666667,  0.333333333333333,  0.001734192635380 ]
    mass: 107.868200
";

    #[test]
    fn auto_prefers_primitive_cell() {
        let structure = parse_phonopy(AGI, CellSelector::Auto).unwrap();
        assert_eq!(structure.n_sites(), 2);
        assert_approx_eq!(
            f64,
            structure.lattice.as_ref().unwrap().a,
            4.556340561269590,
            epsilon = 1e-12
        );
        assert_eq!(structure.sites[0].element(), Some("Ag"));
        assert_approx_eq!(f64, structure.sites[1].abc[2], 0.376708787364615);
    }

    #[test]
    fn explicit_unit_cell_selection() {
        let structure = parse_phonopy(AGI, CellSelector::Unit).unwrap();
        assert_eq!(structure.n_sites(), 1);
        assert_approx_eq!(
            f64,
            structure.lattice.as_ref().unwrap().a,
            9.112681122539180,
            epsilon = 1e-12
        );
    }

    #[test]
    fn mass_is_kept_as_site_property() {
        let structure = parse_phonopy(AGI, CellSelector::Auto).unwrap();
        let mass = structure.sites[0].properties.extra["mass"].as_f64().unwrap();
        assert_approx_eq!(f64, mass, 107.8682);
    }

    #[test]
    fn displacement_tail_is_ignored() {
        let content = format!(
            "{}\nphonon_displacements:\n- - 0.1\n  - 0.2\n  - 0.3\n",
            AGI
        );
        let structure = parse_phonopy(&content, CellSelector::Auto).unwrap();
        assert_eq!(structure.n_sites(), 2);
    }

    #[test]
    fn missing_cells_fail() {
        let content = "phono3py:\n  version: 2.3.0\nspace_group:\n  type: \"P6_3mc\"\n";
        assert!(matches!(
            parse_phonopy(content, CellSelector::Auto),
            Err(ParsePhonopyError::MissingCell(_))
        ));
        assert!(matches!(
            parse_phonopy(AGI, CellSelector::Supercell),
            Err(ParsePhonopyError::MissingCell(_))
        ));
    }

    #[test]
    fn invalid_yaml_fails() {
        assert!(matches!(
            parse_phonopy("invalid: yaml: content:", CellSelector::Auto),
            Err(ParsePhonopyError::Yaml(_))
        ));
    }

    #[test]
    fn truncated_lattice_fails() {
        let content = "\
unit_cell:
  lattice:
  - [ 4.0, 0.0, 0.0 ]
  - [ 0.0, 4.0, 0.0 ]
  points:
  - symbol: H
    coordinates: [ 0.0, 0.0, 0.0 ]
";
        assert!(matches!(
            parse_phonopy(content, CellSelector::Unit),
            Err(ParsePhonopyError::InvalidCell(_, _))
        ));
    }
}
