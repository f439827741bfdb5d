//! Small dense linear algebra helpers used by the navigation solver.
use nalgebra::{DMatrix, DVector, Matrix4, MatrixXx4, Vector4};

use crate::error::Error;

/// Largest square matrix [inverse_symmetric] accepts.
pub const MAX_INVERSE_DIM: usize = 5;

/// Smallest accepted ratio between Cholesky pivots.
const SINGULAR_PIVOT_RATIO: f64 = 1.0E-7;

/// Inverts a symmetric positive definite matrix of dimension
/// up to [MAX_INVERSE_DIM].
pub fn inverse_symmetric(m: &DMatrix<f64>) -> Result<DMatrix<f64>, Error> {
    if !m.is_square() || m.nrows() == 0 || m.nrows() > MAX_INVERSE_DIM {
        return Err(Error::SingularMatrix);
    }

    let chol = m.clone().cholesky().ok_or(Error::NotPositiveDefinite)?;
    Ok(chol.inverse())
}

/// Inverse of a 4x4 normal matrix.
pub(crate) fn inverse_normal(n: &Matrix4<f64>) -> Result<Matrix4<f64>, Error> {
    let chol = n.cholesky().ok_or(Error::SingularMatrix)?;

    let diag = chol.l_dirty().diagonal();
    if diag.min() <= SINGULAR_PIVOT_RATIO * diag.max() {
        return Err(Error::SingularMatrix);
    }

    let inv = chol.inverse();

    if inv.iter().any(|v| !v.is_finite()) {
        return Err(Error::SingularMatrix);
    }

    Ok(inv)
}

/// Solves the weighted least squares problem `g.x = b`
/// with diagonal weights `w`.
///
/// ## Returns
/// - the solution vector `x`
/// - `(gᵀ.W.g)⁻¹`, which is the unscaled state covariance
pub fn weighted_least_squares(
    g: &MatrixXx4<f64>,
    b: &DVector<f64>,
    w: &DVector<f64>,
) -> Result<(Vector4<f64>, Matrix4<f64>), Error> {
    let nrows = g.nrows();

    if nrows < 4 {
        return Err(Error::UnderDetermined(nrows));
    }

    assert_eq!(b.len(), nrows, "measurement vector dimension mismatch");
    assert_eq!(w.len(), nrows, "weight vector dimension mismatch");

    let mut gtw = g.transpose();

    for (j, w_j) in w.iter().enumerate() {
        gtw.column_mut(j).scale_mut(*w_j);
    }

    let normal: Matrix4<f64> = &gtw * g;
    let v = inverse_normal(&normal)?;

    let x = v * (gtw * b);
    Ok((x, v))
}

/// Decomposes a symmetric matrix `m` into `U.diag(d).Uᵀ`, where
/// `U` is unit upper triangular. Only the upper triangle of `m` is used.
pub fn udu(m: &DMatrix<f64>) -> (DMatrix<f64>, DVector<f64>) {
    let n = m.nrows();

    let mut u = DMatrix::<f64>::zeros(n, n);
    let mut d = DVector::<f64>::zeros(n);

    for j in (0..n).rev() {
        let mut alpha = m[(j, j)];
        for k in j + 1..n {
            alpha -= d[k] * u[(j, k)] * u[(j, k)];
        }

        d[j] = alpha;
        u[(j, j)] = 1.0;

        for i in 0..j {
            let mut beta = m[(i, j)];
            for k in j + 1..n {
                beta -= d[k] * u[(i, k)] * u[(j, k)];
            }

            u[(i, j)] = if alpha != 0.0 { beta / alpha } else { 0.0 };
        }
    }

    (u, d)
}

/// Rebuilds `U.diag(d).Uᵀ` from [udu] factors.
pub fn reconstruct_udu(u: &DMatrix<f64>, d: &DVector<f64>) -> DMatrix<f64> {
    let n = u.nrows();
    let mut m = DMatrix::<f64>::zeros(n, n);

    for i in 0..n {
        for j in 0..n {
            let mut acc = 0.0;
            for k in i.max(j)..n {
                acc += u[(i, k)] * d[k] * u[(j, k)];
            }
            m[(i, j)] = acc;
        }
    }

    m
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::tests::init_logger;
    use rand::{prelude::*, rngs::SmallRng, SeedableRng};

    fn random_spd(rng: &mut SmallRng, n: usize) -> DMatrix<f64> {
        let r = DMatrix::<f64>::from_fn(n, n, |_, _| rng.random_range(-1.0..1.0));
        &r * r.transpose() + DMatrix::<f64>::identity(n, n) * n as f64
    }

    #[test]
    fn udu_reconstruction() {
        init_logger();

        let mut rng = SmallRng::seed_from_u64(0x5eed);

        for _ in 0..1000 {
            let n = rng.random_range(1..=5);
            let m = random_spd(&mut rng, n);

            let (u, d) = udu(&m);

            for i in 0..n {
                assert_eq!(u[(i, i)], 1.0);
                for j in 0..i {
                    assert_eq!(u[(i, j)], 0.0, "U is not upper triangular");
                }
            }

            let rebuilt = reconstruct_udu(&u, &d);
            let max = m.amax();
            let tol = n as f64 * f64::EPSILON * max;

            for (a, b) in rebuilt.iter().zip(m.iter()) {
                assert!((a - b).abs() <= tol, "udu error {} > {}", (a - b).abs(), tol);
            }
        }
    }

    #[test]
    fn symmetric_inverse() {
        init_logger();

        let mut rng = SmallRng::seed_from_u64(42);

        for _ in 0..200 {
            let n = rng.random_range(1..=5);
            let m = random_spd(&mut rng, n);
            let inv = inverse_symmetric(&m).unwrap();

            let id = &m * &inv;
            for i in 0..n {
                for j in 0..n {
                    let expected = if i == j { 1.0 } else { 0.0 };
                    assert!((id[(i, j)] - expected).abs() < 1e-9);
                }
            }
        }

        let too_large = DMatrix::<f64>::identity(6, 6);
        assert!(inverse_symmetric(&too_large).is_err());

        let negative = DMatrix::<f64>::from_diagonal_element(3, 3, -1.0);
        assert_eq!(
            inverse_symmetric(&negative),
            Err(Error::NotPositiveDefinite)
        );
    }

    #[test]
    fn least_squares() {
        init_logger();

        // y = 1 + 2a - b + 0.5c over an overdetermined grid
        let rows = [
            [1.0, 0.0, 0.0, 0.0],
            [1.0, 1.0, 0.0, 0.0],
            [1.0, 0.0, 1.0, 0.0],
            [1.0, 0.0, 0.0, 1.0],
            [1.0, 1.0, 1.0, 1.0],
            [1.0, 2.0, -1.0, 3.0],
        ];

        let g = MatrixXx4::from_fn(rows.len(), |i, j| rows[i][j]);
        let b = DVector::from_fn(rows.len(), |i, _| {
            rows[i][0] + 2.0 * rows[i][1] - rows[i][2] + 0.5 * rows[i][3]
        });
        let w = DVector::from_element(rows.len(), 1.0);

        let (x, v) = weighted_least_squares(&g, &b, &w).unwrap();

        for (value, expected) in x.iter().zip([1.0, 2.0, -1.0, 0.5]) {
            assert!((value - expected).abs() < 1e-9);
        }

        assert!((v - v.transpose()).amax() < 1e-12);

        let g = MatrixXx4::from_fn(3, |i, j| rows[i][j]);
        let b = DVector::from_element(3, 0.0);
        let w = DVector::from_element(3, 1.0);

        assert_eq!(
            weighted_least_squares(&g, &b, &w),
            Err(Error::UnderDetermined(3))
        );
    }

    #[test]
    fn singular_geometry() {
        init_logger();

        // last column is a copy of the first
        let g = MatrixXx4::from_fn(5, |i, j| match j {
            0 | 3 => 1.0,
            1 => i as f64,
            _ => (i * i) as f64,
        });

        let b = DVector::from_element(5, 1.0);
        let w = DVector::from_element(5, 1.0);

        assert!(weighted_least_squares(&g, &b, &w).is_err());
    }
}
