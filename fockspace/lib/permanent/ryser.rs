//! Ryser's formula with Gray-code column subsets.
//!
//! ```text
//! perm(A) = (-1)^n Σ_{S ⊆ {1..n}} (-1)^|S| Π_i Σ_{j ∈ S} A[i, j]
//! ```
//! Subsets are visited in Gray-code order, so each step adds or removes a
//! single column and each row sum is updated in constant time. Step `k`
//! toggles column `trailing_zeros(k)`, and the subset after step `k` is
//! `k ^ (k >> 1)`.

use ndarray as nd;
use num_traits::{ One, Zero };
use rayon::iter::{ IntoParallelIterator, ParallelIterator };
use crate::error::{ FockError, FockResult };
use super::{ PermanentScalar, check_square };

pub(crate) fn gray(k: u64) -> u64 { k ^ (k >> 1) }

/// Row sums over the columns of the Gray-code subset `g`.
fn row_sums_at<T>(a: &nd::ArrayView2<T>, g: u64) -> Vec<T::Acc>
where T: PermanentScalar
{
    a.rows().into_iter()
        .map(|row| {
            row.iter().enumerate()
                .filter(|(j, _)| g & (1 << j) != 0)
                .fold(T::Acc::zero(), |acc, (_, x)| acc + x.widen())
        })
        .collect()
}

/// Signed sum of Ryser terms for Gray-code steps `start..end`.
fn ryser_steps<T>(a: &nd::ArrayView2<T>, start: u64, end: u64) -> T::Acc
where T: PermanentScalar
{
    let n = a.nrows();
    let mut row_sums = row_sums_at(a, gray(start - 1));
    let mut total = T::Acc::zero();
    for k in start..end {
        let j = k.trailing_zeros() as usize;
        let g = gray(k);
        if g & (1 << j) != 0 {
            row_sums.iter_mut().zip(a.column(j))
                .for_each(|(s, x)| { *s += x.widen(); });
        } else {
            row_sums.iter_mut().zip(a.column(j))
                .for_each(|(s, x)| { *s -= x.widen(); });
        }
        let prod
            = row_sums.iter()
            .fold(T::Acc::one(), |acc, s| acc * *s);
        if (n - g.count_ones() as usize) % 2 == 1 {
            total -= prod;
        } else {
            total += prod;
        }
    }
    total
}

pub(crate) fn permanent_view<T>(a: nd::ArrayView2<T>) -> FockResult<T>
where T: PermanentScalar
{
    let n = check_square(&a)?;
    T::narrow(ryser_steps(&a, 1, 1 << n))
}

/// Permanent of a square matrix by Ryser's formula.
///
/// Takes `O(2^n n)` time and `O(n)` extra space. Fails with a dimension error
/// if the matrix is not square or is empty.
pub fn permanent<T>(a: &nd::Array2<T>) -> FockResult<T>
where T: PermanentScalar
{
    permanent_view(a.view())
}

/// Like [`permanent`], but splits the Gray-code sequence into blocks summed in
/// parallel.
///
/// Each block recomputes its starting row sums from scratch. Runs on rayon's
/// global pool if `threads` is `None`, otherwise on a dedicated pool of the
/// given size.
pub fn permanent_par<T>(a: &nd::Array2<T>, threads: Option<usize>)
    -> FockResult<T>
where T: PermanentScalar
{
    let view = a.view();
    let n = check_square(&view)?;
    let steps: u64 = 1 << n;
    let compute = || -> T::Acc {
        let blocks = (rayon::current_num_threads() as u64 * 4).max(1);
        let block_len = ((steps - 1) / blocks).max(1);
        let starts: Vec<u64> = (1..steps).step_by(block_len as usize).collect();
        starts.into_par_iter()
            .map(|start| {
                let end = (start + block_len).min(steps);
                ryser_steps(&view, start, end)
            })
            .reduce(T::Acc::zero, |mut acc, x| { acc += x; acc })
    };
    let total
        = match threads {
            None => compute(),
            Some(t) => {
                rayon::ThreadPoolBuilder::new()
                    .num_threads(t)
                    .build()
                    .map_err(|err| FockError::Config(err.to_string()))?
                    .install(compute)
            },
        };
    T::narrow(total)
}
