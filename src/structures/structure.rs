// Released under MIT License.
// Copyright (c) 2025-2026 atomio_rs contributors

//! Implementation of the Structure type: an ordered sequence of sites with
//! an optional lattice.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::structures::element::PLACEHOLDER_SYMBOL;
use crate::structures::lattice::Lattice;
use crate::structures::site::Site;

/// A single crystal structure or molecular snapshot.
///
/// A `Structure` is a plain value: fully owned wherever it is held, with no
/// back-references, constructed once by a decoder and never mutated after
/// assembly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Structure {
    pub sites: Vec<Site>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lattice: Option<Lattice>,
    /// Net charge of the whole structure.
    #[serde(default)]
    pub charge: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl Structure {
    /// Create a structure from sites and an optional lattice.
    pub fn new(sites: Vec<Site>, lattice: Option<Lattice>) -> Self {
        Structure {
            sites,
            lattice,
            charge: 0.0,
            id: None,
        }
    }

    /// Number of sites.
    pub fn n_sites(&self) -> usize {
        self.sites.len()
    }

    /// Per-element site counts, in first-appearance order. Sites with no
    /// resolvable species count under the placeholder symbol.
    pub fn element_counts(&self) -> IndexMap<String, usize> {
        let mut counts = IndexMap::new();
        for site in &self.sites {
            let element = site.element().unwrap_or(PLACEHOLDER_SYMBOL);
            *counts.entry(element.to_string()).or_insert(0) += 1;
        }
        counts
    }

    /// Plain concatenated formula such as `Fe2 O3`, used for export comments.
    pub fn formula(&self) -> String {
        self.element_counts()
            .iter()
            .map(|(element, count)| {
                if *count == 1 {
                    element.clone()
                } else {
                    format!("{}{}", element, count)
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/******************************/
/*         UNIT TESTS         */
/******************************/

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structures::site::Species;

    fn fe2o3() -> Structure {
        let mut sites = Vec::new();
        for i in 0..2 {
            sites.push(Site::new(
                Species::new("Fe"),
                [0.0; 3],
                [0.0; 3],
                format!("Fe{}", i + 1),
            ));
        }
        for i in 0..3 {
            sites.push(Site::new(
                Species::new("O"),
                [0.0; 3],
                [0.0; 3],
                format!("O{}", i + 1),
            ));
        }
        Structure::new(sites, None)
    }

    #[test]
    fn element_counts_preserve_order() {
        let counts = fe2o3().element_counts();
        let pairs: Vec<_> = counts.iter().map(|(e, c)| (e.as_str(), *c)).collect();
        assert_eq!(pairs, vec![("Fe", 2), ("O", 3)]);
    }

    #[test]
    fn formula() {
        assert_eq!(fe2o3().formula(), "Fe2 O3");
    }
}
