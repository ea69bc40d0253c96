// Released under MIT License.
// Copyright (c) 2025-2026 atomio_rs contributors

//! Implementation of the Lattice structure and its methods.

use serde::{Deserialize, Serialize};

use crate::math::{self, Matrix3, Vector3};

/// A periodic cell: three lattice vectors stored as matrix rows, a
/// per-axis periodicity flag, and the scalar parameters derived from them.
///
/// The derived parameters are computed once at construction by the
/// linear-algebra kernel and never re-validated afterwards. The volume is
/// always non-negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "LatticeSeed")]
pub struct Lattice {
    /// Row vectors: each row is one lattice vector in Cartesian space.
    pub matrix: Matrix3,
    /// Periodic boundary flag per axis.
    pub pbc: [bool; 3],
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
    pub volume: f64,
}

/// Deserialization helper: only the matrix and periodicity flags are read
/// back; derived parameters are recomputed so they can never disagree with
/// the matrix.
#[derive(Deserialize)]
struct LatticeSeed {
    matrix: Matrix3,
    #[serde(default = "default_pbc")]
    pbc: [bool; 3],
}

fn default_pbc() -> [bool; 3] {
    [true, true, true]
}

impl From<LatticeSeed> for Lattice {
    fn from(seed: LatticeSeed) -> Self {
        Lattice::from_matrix_pbc(seed.matrix, seed.pbc)
    }
}

impl Lattice {
    /// Create a lattice from a matrix of row vectors, periodic along all axes.
    pub fn from_matrix(matrix: Matrix3) -> Self {
        Lattice::from_matrix_pbc(matrix, [true, true, true])
    }

    /// Create a lattice from a matrix of row vectors and explicit periodicity flags.
    pub fn from_matrix_pbc(matrix: Matrix3, pbc: [bool; 3]) -> Self {
        let params = math::lattice_params(&matrix);

        Lattice {
            matrix,
            pbc,
            a: params.a,
            b: params.b,
            c: params.c,
            alpha: params.alpha,
            beta: params.beta,
            gamma: params.gamma,
            volume: params.volume,
        }
    }

    /// Create a lattice from cell parameters (lengths and angles in degrees)
    /// using the standard crystallographic convention.
    pub fn from_parameters(a: f64, b: f64, c: f64, alpha: f64, beta: f64, gamma: f64) -> Self {
        Lattice::from_matrix(math::cell_to_lattice_matrix(a, b, c, alpha, beta, gamma))
    }

    /// Convert fractional coordinates to Cartesian coordinates.
    pub fn fractional_to_cartesian(&self, abc: &Vector3) -> Vector3 {
        math::fractional_to_cartesian(&self.matrix, abc)
    }

    /// Convert Cartesian coordinates to fractional coordinates.
    /// Falls back to per-axis division by the diagonal magnitudes if the
    /// lattice is singular.
    pub fn cartesian_to_fractional(&self, xyz: &Vector3) -> Vector3 {
        math::cartesian_to_fractional(&self.matrix, xyz)
    }

    /// Minimum-image distance between two Cartesian points in this lattice.
    pub fn minimum_image_distance(&self, pos1: &Vector3, pos2: &Vector3) -> f64 {
        math::minimum_image_distance(pos1, pos2, &self.matrix)
    }
}

/******************************/
/*         UNIT TESTS         */
/******************************/

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    #[test]
    fn from_matrix_derives_parameters() {
        let lattice = Lattice::from_matrix([[4.0, 0.0, 0.0], [0.0, 5.0, 0.0], [0.0, 0.0, 6.0]]);

        assert_approx_eq!(f64, lattice.a, 4.0);
        assert_approx_eq!(f64, lattice.b, 5.0);
        assert_approx_eq!(f64, lattice.c, 6.0);
        assert_approx_eq!(f64, lattice.volume, 120.0);
        assert_eq!(lattice.pbc, [true, true, true]);
    }

    #[test]
    fn serde_roundtrip_recomputes_identical_values() {
        let lattice = Lattice::from_parameters(4.5, 5.2, 6.8, 85.0, 92.0, 105.0);
        let json = serde_json::to_string(&lattice).unwrap();
        let back: Lattice = serde_json::from_str(&json).unwrap();
        assert_eq!(lattice, back);
    }

    #[test]
    fn deserialize_matrix_only() {
        let lattice: Lattice =
            serde_json::from_str(r#"{"matrix": [[2.0,0.0,0.0],[0.0,2.0,0.0],[0.0,0.0,2.0]]}"#)
                .unwrap();
        assert_approx_eq!(f64, lattice.volume, 8.0);
        assert_eq!(lattice.pbc, [true, true, true]);
    }
}
