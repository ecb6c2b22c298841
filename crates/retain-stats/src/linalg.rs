//! Small dense linear algebra: enough for the regression fits in this crate.
//! Matrices are row-major `Vec<Vec<f64>>` and stay tiny (treatment plus a
//! handful of controls), so cubic algorithms are fine.

use retain_core::errors::StatsError;

/// Solve `a · x = b` by Gaussian elimination with partial pivoting.
/// `a` is consumed as a working copy.
pub fn solve(a: &[Vec<f64>], b: &[f64]) -> Result<Vec<f64>, StatsError> {
    let n = a.len();
    if b.len() != n {
        return Err(StatsError::DimensionMismatch {
            expected: n,
            actual: b.len(),
        });
    }
    let mut m: Vec<Vec<f64>> = a.iter().cloned().collect();
    let mut rhs = b.to_vec();

    for col in 0..n {
        // Pivot on the largest remaining entry in this column.
        let pivot_row = (col..n)
            .max_by(|&i, &j| {
                m[i][col]
                    .abs()
                    .partial_cmp(&m[j][col].abs())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .unwrap_or(col);
        if m[pivot_row][col].abs() < 1e-12 {
            return Err(StatsError::SingularMatrix {
                detail: format!("zero pivot at column {col}"),
            });
        }
        m.swap(col, pivot_row);
        rhs.swap(col, pivot_row);

        for row in (col + 1)..n {
            let factor = m[row][col] / m[col][col];
            for k in col..n {
                m[row][k] -= factor * m[col][k];
            }
            rhs[row] -= factor * rhs[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let mut sum = rhs[row];
        for col in (row + 1)..n {
            sum -= m[row][col] * x[col];
        }
        x[row] = sum / m[row][row];
    }
    Ok(x)
}

/// Invert a symmetric positive-definite matrix by solving against
/// identity columns.
pub fn invert(a: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, StatsError> {
    let n = a.len();
    let mut columns = Vec::with_capacity(n);
    for j in 0..n {
        let mut e = vec![0.0; n];
        e[j] = 1.0;
        columns.push(solve(a, &e)?);
    }
    // columns[j][i] is entry (i, j) of the inverse.
    let mut inv = vec![vec![0.0; n]; n];
    for (j, column) in columns.iter().enumerate() {
        for (i, value) in column.iter().enumerate() {
            inv[i][j] = *value;
        }
    }
    Ok(inv)
}

/// Eigenvalues of a symmetric matrix via cyclic Jacobi rotations.
pub fn symmetric_eigenvalues(a: &[Vec<f64>]) -> Vec<f64> {
    let n = a.len();
    let mut m: Vec<Vec<f64>> = a.iter().cloned().collect();

    for _sweep in 0..50 {
        let mut off_diagonal = 0.0;
        for i in 0..n {
            for j in (i + 1)..n {
                off_diagonal += m[i][j] * m[i][j];
            }
        }
        if off_diagonal < 1e-18 {
            break;
        }
        for p in 0..n {
            for q in (p + 1)..n {
                if m[p][q].abs() < 1e-15 {
                    continue;
                }
                let theta = (m[q][q] - m[p][p]) / (2.0 * m[p][q]);
                let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;
                for k in 0..n {
                    let mkp = m[k][p];
                    let mkq = m[k][q];
                    m[k][p] = c * mkp - s * mkq;
                    m[k][q] = s * mkp + c * mkq;
                }
                for k in 0..n {
                    let mpk = m[p][k];
                    let mqk = m[q][k];
                    m[p][k] = c * mpk - s * mqk;
                    m[q][k] = s * mpk + c * mqk;
                }
            }
        }
    }
    (0..n).map(|i| m[i][i]).collect()
}

/// Condition number of a design matrix, computed from the eigenvalues of
/// its Gram matrix (cond(X) = sqrt(λmax/λmin) of X'X).
pub fn condition_number(gram: &[Vec<f64>]) -> f64 {
    let eigenvalues = symmetric_eigenvalues(gram);
    let max = eigenvalues.iter().cloned().fold(f64::MIN, f64::max);
    let min = eigenvalues.iter().cloned().fold(f64::MAX, f64::min);
    if min <= 0.0 {
        f64::INFINITY
    } else {
        (max / min).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solve_recovers_known_solution() {
        let a = vec![vec![4.0, 1.0], vec![1.0, 3.0]];
        let b = vec![1.0, 2.0];
        let x = solve(&a, &b).unwrap();
        // Verify a·x == b.
        assert!((4.0 * x[0] + x[1] - 1.0).abs() < 1e-10);
        assert!((x[0] + 3.0 * x[1] - 2.0).abs() < 1e-10);
    }

    #[test]
    fn singular_matrix_is_rejected() {
        let a = vec![vec![1.0, 2.0], vec![2.0, 4.0]];
        assert!(solve(&a, &[1.0, 2.0]).is_err());
    }

    #[test]
    fn invert_times_original_is_identity() {
        let a = vec![vec![2.0, 1.0], vec![1.0, 2.0]];
        let inv = invert(&a).unwrap();
        for i in 0..2 {
            for j in 0..2 {
                let entry: f64 = (0..2).map(|k| a[i][k] * inv[k][j]).sum();
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!((entry - expected).abs() < 1e-10);
            }
        }
    }

    #[test]
    fn eigenvalues_of_diagonal_matrix() {
        let a = vec![vec![3.0, 0.0], vec![0.0, 7.0]];
        let mut eigs = symmetric_eigenvalues(&a);
        eigs.sort_by(|x, y| x.partial_cmp(y).unwrap());
        assert!((eigs[0] - 3.0).abs() < 1e-9);
        assert!((eigs[1] - 7.0).abs() < 1e-9);
    }

    #[test]
    fn identity_has_unit_condition_number() {
        let a = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        assert!((condition_number(&a) - 1.0).abs() < 1e-9);
    }
}
