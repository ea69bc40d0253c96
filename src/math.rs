// Released under MIT License.
// Copyright (c) 2025-2026 atomio_rs contributors

//! Linear algebra kernel for lattice math.
//!
//! Everything in this module is pure and stateless: 3x3 matrix operations,
//! lattice parameter computation, fractional/Cartesian coordinate conversion,
//! and minimum-image distances under periodic boundary conditions.
//!
//! Lattice matrices are stored as *row* vectors: each row of the matrix is one
//! lattice vector in Cartesian space. Converting Cartesian coordinates to
//! fractional coordinates therefore requires treating the columns as basis
//! vectors, i.e. transposing before inversion.

use crate::errors::SingularMatrixError;

/// A 3-vector of Cartesian or fractional coordinates.
pub type Vector3 = [f64; 3];

/// A 3x3 matrix of row vectors.
pub type Matrix3 = [[f64; 3]; 3];

/// Determinants with an absolute value below this threshold are treated as singular.
pub const SINGULAR_EPSILON: f64 = 1e-10;

/// Calculate the determinant of a 3x3 matrix.
pub fn det_3x3(m: &Matrix3) -> f64 {
    let [[a, b, c], [d, e, f], [g, h, i]] = *m;

    a * (e * i - f * h) - b * (d * i - f * g) + c * (d * h - e * g)
}

/// Invert a 3x3 matrix using the closed-form cofactor expansion.
///
/// ## Returns
/// The inverse matrix, or `SingularMatrixError` if the absolute value of the
/// determinant is below [`SINGULAR_EPSILON`]. A singular matrix never yields a
/// finite but meaningless inverse.
pub fn invert_3x3(m: &Matrix3) -> Result<Matrix3, SingularMatrixError> {
    let [[a, b, c], [d, e, f], [g, h, i]] = *m;

    let det = det_3x3(m);
    if det.abs() < SINGULAR_EPSILON {
        return Err(SingularMatrixError { det });
    }

    let inv_det = 1.0 / det;

    Ok([
        [
            (e * i - f * h) * inv_det,
            (c * h - b * i) * inv_det,
            (b * f - c * e) * inv_det,
        ],
        [
            (f * g - d * i) * inv_det,
            (a * i - c * g) * inv_det,
            (c * d - a * f) * inv_det,
        ],
        [
            (d * h - e * g) * inv_det,
            (b * g - a * h) * inv_det,
            (a * e - b * d) * inv_det,
        ],
    ])
}

/// Transpose a 3x3 matrix.
pub fn transpose(m: &Matrix3) -> Matrix3 {
    [
        [m[0][0], m[1][0], m[2][0]],
        [m[0][1], m[1][1], m[2][1]],
        [m[0][2], m[1][2], m[2][2]],
    ]
}

/// Multiply a 3x3 matrix by a 3-vector.
pub fn mat_vec_mul(m: &Matrix3, v: &Vector3) -> Vector3 {
    [
        m[0][0] * v[0] + m[0][1] * v[1] + m[0][2] * v[2],
        m[1][0] * v[0] + m[1][1] * v[1] + m[1][2] * v[2],
        m[2][0] * v[0] + m[2][1] * v[1] + m[2][2] * v[2],
    ]
}

/// Euclidean norm of a 3-vector.
pub fn norm(v: &Vector3) -> f64 {
    (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
}

/// Scalar lattice parameters derived from a lattice matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatticeParams {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    /// Angle between the b and c vectors, in degrees.
    pub alpha: f64,
    /// Angle between the a and c vectors, in degrees.
    pub beta: f64,
    /// Angle between the a and b vectors, in degrees.
    pub gamma: f64,
    /// Cell volume. Always non-negative.
    pub volume: f64,
}

/// Calculate lattice parameters (lengths, angles in degrees, volume) from
/// a lattice matrix of row vectors.
///
/// The volume is the absolute value of the scalar triple product and is
/// therefore always non-negative, even for left-handed lattices.
pub fn lattice_params(m: &Matrix3) -> LatticeParams {
    let [a_vec, b_vec, c_vec] = *m;

    let a = norm(&a_vec);
    let b = norm(&b_vec);
    let c = norm(&c_vec);

    let dot = |u: &Vector3, v: &Vector3| u[0] * v[0] + u[1] * v[1] + u[2] * v[2];

    let alpha = (dot(&b_vec, &c_vec) / (b * c)).acos().to_degrees();
    let beta = (dot(&a_vec, &c_vec) / (a * c)).acos().to_degrees();
    let gamma = (dot(&a_vec, &b_vec) / (a * b)).acos().to_degrees();

    let volume = det_3x3(m).abs();

    LatticeParams {
        a,
        b,
        c,
        alpha,
        beta,
        gamma,
        volume,
    }
}

/// Construct a lattice matrix from cell parameters (lengths and angles in
/// degrees) using the standard crystallographic convention: the first vector
/// lies along x, the second in the xy-plane, and the third completes the basis.
///
/// This is the algebraic inverse of [`lattice_params`].
pub fn cell_to_lattice_matrix(
    a: f64,
    b: f64,
    c: f64,
    alpha: f64,
    beta: f64,
    gamma: f64,
) -> Matrix3 {
    let alpha = alpha.to_radians();
    let beta = beta.to_radians();
    let gamma = gamma.to_radians();

    let bx = b * gamma.cos();
    let by = b * gamma.sin();

    let cx = c * beta.cos();
    let cy = c * (alpha.cos() - beta.cos() * gamma.cos()) / gamma.sin();
    let cz = (c * c - cx * cx - cy * cy).max(0.0).sqrt();

    [[a, 0.0, 0.0], [bx, by, 0.0], [cx, cy, cz]]
}

/// Convert fractional coordinates to Cartesian coordinates for a lattice
/// matrix of row vectors.
pub fn fractional_to_cartesian(matrix: &Matrix3, abc: &Vector3) -> Vector3 {
    mat_vec_mul(&transpose(matrix), abc)
}

/// Convert Cartesian coordinates to fractional coordinates for a lattice
/// matrix of row vectors.
///
/// ## Notes
/// - If the lattice is singular, this falls back to per-axis division by the
///   diagonal magnitudes instead of failing the whole conversion. Axes with a
///   (near-)zero diagonal entry yield a zero fractional component.
pub fn cartesian_to_fractional(matrix: &Matrix3, xyz: &Vector3) -> Vector3 {
    match invert_3x3(&transpose(matrix)) {
        Ok(inverse) => mat_vec_mul(&inverse, xyz),
        Err(_) => {
            let mut abc = [0.0; 3];
            for (axis, component) in abc.iter_mut().enumerate() {
                let diagonal = matrix[axis][axis];
                if diagonal.abs() >= SINGULAR_EPSILON {
                    *component = xyz[axis] / diagonal;
                }
            }
            abc
        }
    }
}

/// Calculate the minimum-image distance between two Cartesian points under
/// periodic boundary conditions given by a lattice matrix of row vectors.
///
/// The fractional difference vector is wrapped into `[-0.5, 0.5)` per axis,
/// which is equivalent to searching the 27 neighboring periodic images.
/// For a singular lattice the plain Euclidean distance is returned.
pub fn minimum_image_distance(pos1: &Vector3, pos2: &Vector3, matrix: &Matrix3) -> f64 {
    let inverse = match invert_3x3(&transpose(matrix)) {
        Ok(inverse) => inverse,
        Err(_) => {
            let diff = [pos1[0] - pos2[0], pos1[1] - pos2[1], pos1[2] - pos2[2]];
            return norm(&diff);
        }
    };

    let frac1 = mat_vec_mul(&inverse, pos1);
    let frac2 = mat_vec_mul(&inverse, pos2);

    let mut wrapped = [0.0; 3];
    for axis in 0..3 {
        let mut delta = frac1[axis] - frac2[axis];
        delta -= delta.floor();
        if delta >= 0.5 {
            delta -= 1.0;
        }
        wrapped[axis] = delta;
    }

    let cart = fractional_to_cartesian(matrix, &wrapped);
    norm(&cart)
}

/******************************/
/*         UNIT TESTS         */
/******************************/

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    const CUBIC: Matrix3 = [[4.0, 0.0, 0.0], [0.0, 4.0, 0.0], [0.0, 0.0, 4.0]];
    const TETRAGONAL: Matrix3 = [[3.0, 0.0, 0.0], [0.0, 3.0, 0.0], [0.0, 0.0, 5.0]];
    const TRICLINIC: Matrix3 = [[5.0, 0.1, 0.2], [-0.4, 6.1, 0.3], [0.7, -0.2, 7.3]];

    #[test]
    fn invert_identity() {
        let identity = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
        assert_eq!(invert_3x3(&identity).unwrap(), identity);
    }

    #[test]
    fn invert_roundtrip() {
        let inverse = invert_3x3(&TRICLINIC).unwrap();
        let product = [
            mat_vec_mul(&inverse, &TRICLINIC_COLS[0]),
            mat_vec_mul(&inverse, &TRICLINIC_COLS[1]),
            mat_vec_mul(&inverse, &TRICLINIC_COLS[2]),
        ];
        // product of inverse with the matrix columns must reproduce the identity columns
        for (i, col) in product.iter().enumerate() {
            for (j, value) in col.iter().enumerate() {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_approx_eq!(f64, *value, expected, epsilon = 1e-12);
            }
        }
    }

    const TRICLINIC_COLS: Matrix3 = [
        [5.0, -0.4, 0.7],
        [0.1, 6.1, -0.2],
        [0.2, 0.3, 7.3],
    ];

    #[test]
    fn invert_singular_fails() {
        // two identical rows make the matrix degenerate
        let degenerate = [[1.0, 2.0, 3.0], [1.0, 2.0, 3.0], [0.0, 0.0, 1.0]];
        assert!(invert_3x3(&degenerate).is_err());
    }

    #[test]
    fn params_cubic() {
        let params = lattice_params(&CUBIC);
        assert_approx_eq!(f64, params.a, 4.0);
        assert_approx_eq!(f64, params.b, 4.0);
        assert_approx_eq!(f64, params.c, 4.0);
        assert_approx_eq!(f64, params.alpha, 90.0);
        assert_approx_eq!(f64, params.beta, 90.0);
        assert_approx_eq!(f64, params.gamma, 90.0);
        assert_approx_eq!(f64, params.volume, 64.0);
    }

    #[test]
    fn volume_nonnegative_for_left_handed_lattice() {
        let left_handed = [[4.0, 0.0, 0.0], [0.0, 0.0, 4.0], [0.0, 4.0, 0.0]];
        assert!(det_3x3(&left_handed) < 0.0);
        assert_approx_eq!(f64, lattice_params(&left_handed).volume, 64.0);
    }

    #[test]
    fn cell_to_matrix_orthogonal() {
        let matrix = cell_to_lattice_matrix(5.0, 6.0, 7.0, 90.0, 90.0, 90.0);
        assert_approx_eq!(f64, matrix[0][0], 5.0, epsilon = 1e-10);
        assert_approx_eq!(f64, matrix[1][1], 6.0, epsilon = 1e-10);
        assert_approx_eq!(f64, matrix[2][2], 7.0, epsilon = 1e-10);
        assert_approx_eq!(f64, matrix[1][0], 0.0, epsilon = 1e-10);
        assert_approx_eq!(f64, matrix[2][0], 0.0, epsilon = 1e-10);
        assert_approx_eq!(f64, matrix[2][1], 0.0, epsilon = 1e-10);
    }

    #[test]
    fn cell_to_matrix_hexagonal() {
        let matrix = cell_to_lattice_matrix(4.0, 4.0, 6.0, 90.0, 90.0, 120.0);
        assert_approx_eq!(f64, matrix[1][0], -2.0, epsilon = 1e-6);
        assert_approx_eq!(f64, matrix[1][1], 3.4641016, epsilon = 1e-6);
        assert_approx_eq!(f64, matrix[2][2], 6.0, epsilon = 1e-6);
    }

    #[test]
    fn cell_to_matrix_inverts_lattice_params() {
        let matrix = cell_to_lattice_matrix(4.5, 5.2, 6.8, 85.0, 92.0, 105.0);
        let params = lattice_params(&matrix);
        assert_approx_eq!(f64, params.a, 4.5, epsilon = 1e-10);
        assert_approx_eq!(f64, params.b, 5.2, epsilon = 1e-10);
        assert_approx_eq!(f64, params.c, 6.8, epsilon = 1e-10);
        assert_approx_eq!(f64, params.alpha, 85.0, epsilon = 1e-6);
        assert_approx_eq!(f64, params.beta, 92.0, epsilon = 1e-6);
        assert_approx_eq!(f64, params.gamma, 105.0, epsilon = 1e-6);
    }

    #[test]
    fn coordinate_roundtrip() {
        for matrix in [CUBIC, TETRAGONAL, TRICLINIC] {
            let abc = [0.12, 0.57, 0.91];
            let xyz = fractional_to_cartesian(&matrix, &abc);
            let back = cartesian_to_fractional(&matrix, &xyz);
            for axis in 0..3 {
                assert_approx_eq!(f64, back[axis], abc[axis], epsilon = 1e-10);
            }
        }
    }

    #[test]
    fn cartesian_to_fractional_singular_fallback() {
        let singular = [[2.0, 0.0, 0.0], [2.0, 0.0, 0.0], [0.0, 0.0, 3.0]];
        let abc = cartesian_to_fractional(&singular, &[4.0, 1.0, 6.0]);
        assert_approx_eq!(f64, abc[0], 2.0);
        // second diagonal entry is zero, so that axis collapses to zero
        assert_approx_eq!(f64, abc[1], 0.0);
        assert_approx_eq!(f64, abc[2], 2.0);
    }

    #[test]
    fn minimum_image_wraps_across_boundary() {
        let pos1 = [0.2, 0.2, 0.2];
        let pos2 = [3.8, 0.2, 0.2];
        // direct distance is 3.6 but the nearest image is only 0.4 away
        assert_approx_eq!(
            f64,
            minimum_image_distance(&pos1, &pos2, &CUBIC),
            0.4,
            epsilon = 1e-10
        );
    }

    #[test]
    fn minimum_image_within_cell() {
        let pos1 = [1.0, 1.0, 1.0];
        let pos2 = [2.0, 1.0, 1.0];
        assert_approx_eq!(
            f64,
            minimum_image_distance(&pos1, &pos2, &CUBIC),
            1.0,
            epsilon = 1e-10
        );
    }
}
