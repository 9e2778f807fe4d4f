//! Permanents of all one-row deletions of an `n × (n - 1)` matrix.
//!
//! All `n` permanents share a single Ryser sweep over the `n - 1` columns: at
//! each Gray-code step the row sums of every row are updated once, and the
//! product over all rows but `r` is read off prefix and suffix products for
//! each `r`. This costs `O(2^(n-1) n)` in total, against `O(2^(n-1) n^2)` for
//! `n` separate calls to [`permanent`][super::permanent].

use ndarray as nd;
use num_traits::{ One, Zero };
use crate::error::{ FockError, FockResult };
use super::{ PermanentScalar, check_order, ryser::gray };

/// Compute `perm(A with row i deleted)` for every row `i` of an
/// `n × (n - 1)` matrix.
pub fn sub_permanents<T>(a: &nd::Array2<T>) -> FockResult<Vec<T>>
where T: PermanentScalar
{
    let (rows, cols) = a.dim();
    if rows != cols + 1 {
        return Err(FockError::dimension(format!(
            "sub-permanents require an n × (n - 1) matrix, got {rows} × {cols}"
        )));
    }
    check_order(cols)?;
    let mut row_sums: Vec<T::Acc> = vec![T::Acc::zero(); rows];
    let mut prefix: Vec<T::Acc> = vec![T::Acc::one(); rows + 1];
    let mut suffix: Vec<T::Acc> = vec![T::Acc::one(); rows + 1];
    let mut totals: Vec<T::Acc> = vec![T::Acc::zero(); rows];
    for k in 1..(1_u64 << cols) {
        let j = k.trailing_zeros() as usize;
        let g = gray(k);
        if g & (1 << j) != 0 {
            row_sums.iter_mut().zip(a.column(j))
                .for_each(|(s, x)| { *s += x.widen(); });
        } else {
            row_sums.iter_mut().zip(a.column(j))
                .for_each(|(s, x)| { *s -= x.widen(); });
        }
        for i in 0..rows {
            prefix[i + 1] = prefix[i] * row_sums[i];
            suffix[rows - 1 - i] = suffix[rows - i] * row_sums[rows - 1 - i];
        }
        let subtract = (cols - g.count_ones() as usize) % 2 == 1;
        totals.iter_mut().enumerate()
            .for_each(|(r, t)| {
                let prod = prefix[r] * suffix[r + 1];
                if subtract { *t -= prod; } else { *t += prod; }
            });
    }
    totals.into_iter().map(T::narrow).collect()
}
