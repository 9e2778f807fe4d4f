//! Glynn's formula with Gray-code sign vectors.
//!
//! ```text
//! perm(A) = 2^(1-n) Σ_δ (Π_k δ_k) Π_j Σ_i δ_i A[i, j]
//! ```
//! summed over sign vectors `δ ∈ {±1}^n` with `δ_0 = +1`. Only fields are
//! supported, since the final division is exact only there.

use ndarray as nd;
use crate::error::FockResult;
use super::{ FieldScalar, check_square, ryser::gray };

/// Permanent of a square real or complex matrix by Glynn's formula.
///
/// Visits `2^(n-1)` sign vectors, flipping a single sign per step.
pub fn permanent_glynn<T>(a: &nd::Array2<T>) -> FockResult<T>
where T: FieldScalar
{
    let view = a.view();
    let n = check_square(&view)?;
    // column sums weighted by the current signs
    let mut col_sums: Vec<T> = view.sum_axis(nd::Axis(0)).to_vec();
    let mut total: T = col_sums.iter().fold(T::one(), |acc, s| acc * *s);
    let mut positive = true;
    for k in 1..(1_u64 << (n - 1)) {
        let i = k.trailing_zeros() as usize + 1;
        let flipped_down = gray(k) & (1 << (i - 1)) != 0;
        col_sums.iter_mut().zip(view.row(i))
            .for_each(|(s, x)| {
                if flipped_down {
                    *s -= *x + *x;
                } else {
                    *s += *x + *x;
                }
            });
        positive = !positive;
        let prod = col_sums.iter().fold(T::one(), |acc, s| acc * *s);
        if positive { total += prod; } else { total -= prod; }
    }
    Ok(total / (1_u64 << (n - 1)) as f64)
}

#[cfg(test)]
mod test {
    use super::*;
    use num_complex::Complex64 as C64;
    use crate::{
        error::FockError,
        permanent::{ permanent, test_utils::* },
    };

    #[test]
    fn small_values() {
        assert_eq!(permanent_glynn(&nd::array![[1.0, 2.0], [3.0, 4.0]]).unwrap(), 10.0);
        assert_eq!(permanent_glynn(&nd::array![[2.5]]).unwrap(), 2.5);
        let ones = nd::Array2::<f64>::ones((8, 8));
        assert_eq!(permanent_glynn(&ones).unwrap(), 40320.0);
    }

    #[test]
    fn agrees_with_ryser() {
        for n in 1..=9 {
            let a = random_complex(n, n, 100 + n as u64);
            assert!(close(permanent_glynn(&a).unwrap(), permanent(&a).unwrap()));
        }
        let r = random_complex(7, 7, 3).mapv(|z| z.re);
        let diff = permanent_glynn(&r).unwrap() - permanent(&r).unwrap();
        assert!(diff.abs() < 1e-9);
        let z = random_complex(5, 5, 9);
        assert!(close(permanent_glynn(&z).unwrap(), brute_force(&z)));
    }

    #[test]
    fn bad_shapes() {
        let a = nd::Array2::<C64>::zeros((3, 2));
        assert!(matches!(permanent_glynn(&a), Err(FockError::Dimension(_))));
    }
}
