// Released under MIT License.
// Copyright (c) 2025-2026 atomio_rs contributors

//! Implementation of functions for reading CIF (Crystallographic
//! Information File) files.

use crate::errors::{ParseCifError, ParseWarning};
use crate::io::Diagnostics;
use crate::structures::element::resolve_symbol;
use crate::structures::lattice::Lattice;
use crate::structures::site::{Site, Species};
use crate::structures::structure::Structure;

/// Parse the content of a CIF file into a [`Structure`].
///
/// Cell parameters are picked up wherever they appear in the file (CIF keys
/// are order-independent) and default to a unit cube with right angles when
/// absent. Atom sites are read from the first `loop_` block whose headers
/// start with `_atom_site_`; the header order determines the column mapping,
/// so files with reordered columns parse correctly.
pub fn parse_cif(content: &str) -> Result<Structure, ParseCifError> {
    let mut diagnostics = Diagnostics::new();
    parse_cif_diag(content, &mut diagnostics)
}

pub(crate) fn parse_cif_diag(
    content: &str,
    diagnostics: &mut Diagnostics,
) -> Result<Structure, ParseCifError> {
    let lines: Vec<&str> = content.trim().lines().collect();
    if lines.len() < 2 {
        return Err(ParseCifError::TooShort(lines.len()));
    }

    let mut cell = [1.0, 1.0, 1.0, 90.0, 90.0, 90.0];
    const CELL_KEYS: [&str; 6] = [
        "_cell_length_a",
        "_cell_length_b",
        "_cell_length_c",
        "_cell_angle_alpha",
        "_cell_angle_beta",
        "_cell_angle_gamma",
    ];

    for line in &lines {
        let trimmed = line.trim();
        for (slot, key) in CELL_KEYS.iter().enumerate() {
            if trimmed.starts_with(key) {
                let token = trimmed.split_whitespace().nth(1).ok_or_else(|| {
                    ParseCifError::InvalidCellParameter(key.to_string(), String::new())
                })?;
                cell[slot] = parse_cif_number(token).ok_or_else(|| {
                    ParseCifError::InvalidCellParameter(key.to_string(), token.to_string())
                })?;
            }
        }
    }

    let lattice = Lattice::from_parameters(cell[0], cell[1], cell[2], cell[3], cell[4], cell[5]);

    let mut sites = Vec::new();
    let mut in_loop = false;
    let mut columns = AtomSiteColumns::default();
    let mut n_columns = 0;

    let mut line_idx = 0;
    while line_idx < lines.len() {
        let line = lines[line_idx].trim();

        if line == "loop_" {
            // gather the header block that follows and check it describes atom sites
            let mut headers = Vec::new();
            let mut next = line_idx + 1;
            while next < lines.len() && lines[next].trim().starts_with("_atom_site_") {
                headers.push(lines[next].trim());
                next += 1;
            }

            if !headers.is_empty() {
                in_loop = true;
                n_columns = headers.len();
                columns = AtomSiteColumns::from_headers(&headers);
                line_idx = next;
                continue;
            }
        }

        if in_loop {
            if line.is_empty() || line.starts_with("loop_") || line.starts_with("data_") {
                in_loop = false;
            } else if !line.starts_with('_') && !line.starts_with('#') {
                match parse_atom_site(line, n_columns, &columns, &lattice, sites.len()) {
                    Ok(Some((site, substituted_symbol))) => {
                        if let Some((raw, fallback)) = substituted_symbol {
                            diagnostics.warn(ParseWarning::UnknownElement {
                                symbol: raw,
                                fallback,
                            });
                        }
                        sites.push(site);
                    }
                    Ok(None) => (),
                    Err(reason) => diagnostics.warn(ParseWarning::SkippedSite {
                        line: line.to_string(),
                        reason,
                    }),
                }
            }
        }

        line_idx += 1;
    }

    if sites.is_empty() {
        return Err(ParseCifError::NoAtomSites);
    }

    Ok(Structure::new(sites, Some(lattice)))
}

/// Column indices of the recognized `_atom_site_` headers.
#[derive(Debug, Default)]
struct AtomSiteColumns {
    label: Option<usize>,
    symbol: Option<usize>,
    x: Option<usize>,
    y: Option<usize>,
    z: Option<usize>,
    occupancy: Option<usize>,
}

impl AtomSiteColumns {
    fn from_headers(headers: &[&str]) -> Self {
        let mut columns = AtomSiteColumns::default();
        for (index, header) in headers.iter().enumerate() {
            if header.contains("_atom_site_label") {
                columns.label = Some(index);
            } else if header.contains("_atom_site_type_symbol") {
                columns.symbol = Some(index);
            } else if header.contains("_atom_site_fract_x") {
                columns.x = Some(index);
            } else if header.contains("_atom_site_fract_y") {
                columns.y = Some(index);
            } else if header.contains("_atom_site_fract_z") {
                columns.z = Some(index);
            } else if header.contains("_atom_site_occupancy") {
                columns.occupancy = Some(index);
            }
        }
        columns
    }
}

/// Parse one atom site data row.
///
/// ## Returns
/// `Ok(None)` when the row is silently ignorable (too few columns or the
/// required headers are absent), `Err` with a reason when the row should be
/// reported as skipped, and otherwise the site plus the substituted symbol
/// pair when the element fell back.
#[allow(clippy::type_complexity)]
fn parse_atom_site(
    line: &str,
    n_columns: usize,
    columns: &AtomSiteColumns,
    lattice: &Lattice,
    site_index: usize,
) -> Result<Option<(Site, Option<(String, String)>)>, String> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < n_columns {
        return Ok(None);
    }

    let (Some(symbol_idx), Some(x_idx), Some(y_idx), Some(z_idx)) =
        (columns.symbol, columns.x, columns.y, columns.z)
    else {
        return Ok(None);
    };

    let abc = [
        parse_cif_number(tokens[x_idx]),
        parse_cif_number(tokens[y_idx]),
        parse_cif_number(tokens[z_idx]),
    ];
    let [Some(x), Some(y), Some(z)] = abc else {
        return Err("fractional coordinate is not a number".to_string());
    };
    let abc = [x, y, z];

    let raw_symbol = tokens[symbol_idx];
    let (element, substituted) = resolve_symbol(raw_symbol, site_index);

    let occupancy = columns
        .occupancy
        .and_then(|idx| parse_cif_number(tokens[idx]))
        .unwrap_or(1.0);

    let label = columns
        .label
        .map(|idx| tokens[idx].to_string())
        .unwrap_or_else(|| raw_symbol.to_string());

    let xyz = lattice.fractional_to_cartesian(&abc);
    let site = Site::new(Species::with_occupancy(element, occupancy), abc, xyz, label);

    let substitution =
        substituted.then(|| (raw_symbol.to_string(), element.to_string()));

    Ok(Some((site, substitution)))
}

/// Parse a CIF numeric value, stripping a trailing standard uncertainty in
/// parentheses (`4.916(3)`).
fn parse_cif_number(token: &str) -> Option<f64> {
    let bare = token.split('(').next().unwrap_or(token);
    crate::io::parse_coordinate(bare)
}

/******************************/
/*         UNIT TESTS         */
/******************************/

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    const QUARTZ: &str = "\
data_quartz
_cell_length_a 4.916
_cell_length_b 4.916
_cell_length_c 5.405
_cell_angle_alpha 90.0
_cell_angle_beta 90.0
_cell_angle_gamma 120.0

loop_
_atom_site_label
_atom_site_type_symbol
_atom_site_fract_x
_atom_site_fract_y
_atom_site_fract_z
_atom_site_occupancy
Si1 Si 0.4697 0.0000 0.0000 1.0
O1 O 0.4135 0.2669 0.1191 1.0
";

    #[test]
    fn cell_and_sites() {
        let structure = parse_cif(QUARTZ).unwrap();

        let lattice = structure.lattice.as_ref().unwrap();
        assert_approx_eq!(f64, lattice.a, 4.916, epsilon = 1e-10);
        assert_approx_eq!(f64, lattice.gamma, 120.0, epsilon = 1e-6);

        assert_eq!(structure.n_sites(), 2);
        assert_eq!(structure.sites[0].element(), Some("Si"));
        assert_eq!(structure.sites[0].label, "Si1");
        assert_approx_eq!(f64, structure.sites[1].abc[1], 0.2669);
    }

    #[test]
    fn cartesian_derived_from_fractional() {
        let content = "\
data_cubic
_cell_length_a 4.0
_cell_length_b 4.0
_cell_length_c 4.0

loop_
_atom_site_type_symbol
_atom_site_fract_x
_atom_site_fract_y
_atom_site_fract_z
Fe 0.5 0.5 0.5
";
        let structure = parse_cif(content).unwrap();
        assert_approx_eq!(f64, structure.sites[0].xyz[0], 2.0, epsilon = 1e-10);
    }

    #[test]
    fn uncertainty_parentheses_are_stripped() {
        let content = "\
data_esd
_cell_length_a 4.916(3)
_cell_length_b 4.916(3)
_cell_length_c 5.405(2)

loop_
_atom_site_type_symbol
_atom_site_fract_x
_atom_site_fract_y
_atom_site_fract_z
Si 0.4697(5) 0.0 0.0
";
        let structure = parse_cif(content).unwrap();
        assert_approx_eq!(
            f64,
            structure.lattice.as_ref().unwrap().a,
            4.916,
            epsilon = 1e-10
        );
        assert_approx_eq!(f64, structure.sites[0].abc[0], 0.4697);
    }

    #[test]
    fn reordered_columns() {
        let content = "\
data_reordered
_cell_length_a 3.0
_cell_length_b 3.0
_cell_length_c 3.0

loop_
_atom_site_fract_z
_atom_site_fract_y
_atom_site_fract_x
_atom_site_type_symbol
0.3 0.2 0.1 Na
";
        let structure = parse_cif(content).unwrap();
        let site = &structure.sites[0];
        assert_eq!(site.element(), Some("Na"));
        assert_approx_eq!(f64, site.abc[0], 0.1);
        assert_approx_eq!(f64, site.abc[2], 0.3);
    }

    #[test]
    fn bad_rows_are_skipped() {
        let content = "\
data_partial
_cell_length_a 3.0

loop_
_atom_site_type_symbol
_atom_site_fract_x
_atom_site_fract_y
_atom_site_fract_z
Fe 0.0 0.0 0.0
Co nan_x 0.5 0.5
Ni 0.25 0.25 0.25
";
        let mut diagnostics = Diagnostics::new();
        let structure = parse_cif_diag(content, &mut diagnostics).unwrap();
        assert_eq!(structure.n_sites(), 2);
        assert!(diagnostics
            .warnings()
            .iter()
            .any(|w| matches!(w, ParseWarning::SkippedSite { .. })));
    }

    #[test]
    fn missing_cell_defaults_to_unit_cube() {
        let content = "\
data_bare
loop_
_atom_site_type_symbol
_atom_site_fract_x
_atom_site_fract_y
_atom_site_fract_z
H 0.5 0.5 0.5
";
        let structure = parse_cif(content).unwrap();
        let lattice = structure.lattice.as_ref().unwrap();
        assert_approx_eq!(f64, lattice.volume, 1.0, epsilon = 1e-10);
    }

    #[test]
    fn no_atom_sites_fails() {
        let content = "data_empty\n_cell_length_a 4.0\n";
        assert_eq!(parse_cif(content), Err(ParseCifError::NoAtomSites));
    }

    #[test]
    fn invalid_cell_parameter_fails() {
        let content = "data_bad\n_cell_length_a abc\nloop_\n";
        assert!(matches!(
            parse_cif(content),
            Err(ParseCifError::InvalidCellParameter(_, _))
        ));
    }
}
