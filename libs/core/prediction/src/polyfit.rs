//! Least-squares polynomial fit via the normal equations, solved by
//! Gaussian elimination with partial pivoting. Degrees used by the
//! polynomial prediction model are small (`<= 5`), so this is numerically
//! fine and avoids pulling in a linear-algebra crate for a handful of
//! coefficients.

/// Fits `y ≈ c0 + c1*x + ... + cd*x^d` to `samples`, returning `[c0..cd]`.
/// Falls back to a flat fit at the sample mean if the normal-equations
/// matrix is singular (e.g. too few distinct `x` values for the degree).
pub fn fit_polynomial(samples: &[(f64, f64)], degree: usize) -> Vec<f64> {
    let terms = degree + 1;
    if samples.is_empty() {
        return vec![0.0; terms];
    }

    // Normal equations: A^T A c = A^T y, where A's rows are [1, x, x^2, ...].
    let mut ata = vec![vec![0.0f64; terms]; terms];
    let mut aty = vec![0.0f64; terms];

    for &(x, y) in samples {
        let mut powers = vec![1.0f64; terms];
        for i in 1..terms {
            powers[i] = powers[i - 1] * x;
        }
        for i in 0..terms {
            aty[i] += powers[i] * y;
            for j in 0..terms {
                ata[i][j] += powers[i] * powers[j];
            }
        }
    }

    solve_linear_system(ata, aty).unwrap_or_else(|| {
        let mean_y = samples.iter().map(|(_, y)| y).sum::<f64>() / samples.len() as f64;
        let mut coeffs = vec![0.0; terms];
        coeffs[0] = mean_y;
        coeffs
    })
}

pub fn evaluate_polynomial(coefficients: &[f64], x: f64) -> f64 {
    coefficients
        .iter()
        .enumerate()
        .map(|(power, c)| c * x.powi(power as i32))
        .sum()
}

fn solve_linear_system(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Option<Vec<f64>> {
    let n = b.len();
    for col in 0..n {
        let pivot_row = (col..n).max_by(|&r1, &r2| {
            a[r1][col].abs().partial_cmp(&a[r2][col].abs()).unwrap()
        })?;
        if a[pivot_row][col].abs() < 1e-12 {
            return None;
        }
        a.swap(col, pivot_row);
        b.swap(col, pivot_row);

        let pivot = a[col][col];
        for j in col..n {
            a[col][j] /= pivot;
        }
        b[col] /= pivot;

        for row in 0..n {
            if row == col {
                continue;
            }
            let factor = a[row][col];
            if factor == 0.0 {
                continue;
            }
            for j in col..n {
                a[row][j] -= factor * a[col][j];
            }
            b[row] -= factor * b[col];
        }
    }
    Some(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fits_exact_line() {
        let samples: Vec<(f64, f64)> = (1..=10).map(|x| (x as f64, 2.0 * x as f64 + 1.0)).collect();
        let coeffs = fit_polynomial(&samples, 1);
        assert!((coeffs[0] - 1.0).abs() < 1e-6);
        assert!((coeffs[1] - 2.0).abs() < 1e-6);
    }

    #[test]
    fn fits_exact_quadratic() {
        let samples: Vec<(f64, f64)> = (1..=10)
            .map(|x| (x as f64, 3.0 * (x as f64).powi(2) - 2.0 * x as f64 + 5.0))
            .collect();
        let coeffs = fit_polynomial(&samples, 2);
        assert!((coeffs[2] - 3.0).abs() < 1e-4);
        assert!((coeffs[1] + 2.0).abs() < 1e-4);
        assert!((coeffs[0] - 5.0).abs() < 1e-3);
    }

    #[test]
    fn falls_back_to_mean_when_singular() {
        let samples = vec![(5.0, 10.0), (5.0, 20.0), (5.0, 30.0)];
        let coeffs = fit_polynomial(&samples, 2);
        assert!((coeffs[0] - 20.0).abs() < 1e-9);
    }
}
