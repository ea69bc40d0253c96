// Released under MIT License.
// Copyright (c) 2025-2026 atomio_rs contributors

//! Implementation of the Species and Site structures.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::math::Vector3;

/// One chemical species occupying a site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Species {
    /// Element symbol, validated against the 118-element table at decode time.
    pub element: String,
    /// Fractional occupancy in (0, 1]. Below 1 for disordered sites.
    #[serde(default = "default_occu")]
    pub occu: f64,
    /// Oxidation state. Defaults to 0 when the source format does not provide one.
    #[serde(default)]
    pub oxidation_state: f64,
}

fn default_occu() -> f64 {
    1.0
}

impl Species {
    /// Create a fully occupied, neutral species.
    pub fn new(element: impl Into<String>) -> Self {
        Species {
            element: element.into(),
            occu: 1.0,
            oxidation_state: 0.0,
        }
    }

    /// Create a species with an explicit occupancy.
    pub fn with_occupancy(element: impl Into<String>, occu: f64) -> Self {
        Species {
            element: element.into(),
            occu,
            oxidation_state: 0.0,
        }
    }
}

/// Open property bag attached to a site.
///
/// Selective-dynamics flags are common enough to deserve a typed field;
/// anything else a source format exposes lands in `extra`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SiteProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selective_dynamics: Option<[bool; 3]>,
    #[serde(default, flatten)]
    pub extra: IndexMap<String, serde_json::Value>,
}

impl SiteProperties {
    pub fn is_empty(&self) -> bool {
        self.selective_dynamics.is_none() && self.extra.is_empty()
    }
}

/// One atomic position within a structure.
///
/// If the owning structure has a lattice, `abc` and `xyz` are mutually
/// derivable via the lattice matrix; decoders guarantee this at construction
/// and it is not re-validated later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    /// Species occupying this site. More than one entry for mixed occupancy.
    pub species: Vec<Species>,
    /// Fractional coordinates.
    #[serde(default)]
    pub abc: Vector3,
    /// Cartesian coordinates. Structure dicts may omit these; decoders
    /// recompute them from `abc` and the lattice after deserialization.
    #[serde(default)]
    pub xyz: Vector3,
    /// Human-readable label, typically `"<element><index>"`.
    #[serde(default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "SiteProperties::is_empty")]
    pub properties: SiteProperties,
}

impl Site {
    /// Create a single-species site.
    pub fn new(species: Species, abc: Vector3, xyz: Vector3, label: impl Into<String>) -> Self {
        Site {
            species: vec![species],
            abc,
            xyz,
            label: label.into(),
            properties: SiteProperties::default(),
        }
    }

    /// Element symbol of the first species, if any.
    pub fn element(&self) -> Option<&str> {
        self.species.first().map(|species| species.element.as_str())
    }
}

/******************************/
/*         UNIT TESTS         */
/******************************/

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn site_element() {
        let site = Site::new(Species::new("Fe"), [0.0; 3], [0.0; 3], "Fe1");
        assert_eq!(site.element(), Some("Fe"));
    }

    #[test]
    fn species_defaults_on_deserialization() {
        let species: Species = serde_json::from_str(r#"{"element": "O"}"#).unwrap();
        assert_eq!(species.occu, 1.0);
        assert_eq!(species.oxidation_state, 0.0);
    }

    #[test]
    fn empty_properties_are_not_serialized() {
        let site = Site::new(Species::new("H"), [0.0; 3], [0.0; 3], "H1");
        let json = serde_json::to_string(&site).unwrap();
        assert!(!json.contains("properties"));
    }
}
