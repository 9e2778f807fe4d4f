//! Matrix permanents over integer, real, and complex entries.
//!
//! The permanent of an `n × n` matrix `A` is
//! ```text
//! perm(A) = Σ_σ Π_i A[i, σ(i)]
//! ```
//! summed over all permutations `σ`. All kernels here are exponential in `n`
//! and are generic over [`PermanentScalar`], which fixes the accumulator used
//! for each entry type:
//! - `i64` accumulates in wrapping 128-bit integers and fails if the result
//!   does not fit back into an `i64`;
//! - `f64` accumulates in `f64`;
//! - `Complex64` accumulates in `Complex64`.

use std::{
    fmt::Debug,
    num::Wrapping,
    ops::{ AddAssign, Div, SubAssign },
};
use ndarray as nd;
use num_complex::Complex64 as C64;
use num_traits::{ One, Zero };
use tracing::warn;
use crate::{
    config::{ Algorithm, PermanentConfig },
    error::{ FockError, FockResult },
};

pub mod ryser;
pub mod glynn;
pub mod sub;

pub use ryser::{ permanent, permanent_par };
pub use glynn::permanent_glynn;
pub use sub::sub_permanents;

/// Largest matrix order accepted by the kernels.
pub const MAX_ORDER: usize = 63;

/* Scalars ********************************************************************/

/// An entry type for which permanents can be computed.
pub trait PermanentScalar: Copy + Send + Sync + Debug + 'static {
    /// Type used for row sums and products.
    type Acc: Copy + Send + Sync + Debug + Zero + One + AddAssign + SubAssign;

    fn widen(self) -> Self::Acc;

    /// Convert an accumulated value back to the entry type.
    fn narrow(acc: Self::Acc) -> FockResult<Self>;
}

impl PermanentScalar for i64 {
    type Acc = Wrapping<i128>;

    fn widen(self) -> Self::Acc { Wrapping(i128::from(self)) }

    fn narrow(acc: Self::Acc) -> FockResult<Self> {
        i64::try_from(acc.0)
            .map_err(|_| FockError::range(
                format!("integer permanent {} overflows i64", acc.0)))
    }
}

impl PermanentScalar for f64 {
    type Acc = f64;

    fn widen(self) -> Self::Acc { self }

    fn narrow(acc: Self::Acc) -> FockResult<Self> { Ok(acc) }
}

impl PermanentScalar for C64 {
    type Acc = C64;

    fn widen(self) -> Self::Acc { self }

    fn narrow(acc: Self::Acc) -> FockResult<Self> { Ok(acc) }
}

/// Entry types forming a field, as needed by Glynn's formula.
pub trait FieldScalar: PermanentScalar<Acc = Self>
    + Zero
    + One
    + AddAssign
    + SubAssign
    + Div<f64, Output = Self>
{ }

impl FieldScalar for f64 { }

impl FieldScalar for C64 { }

/* Shape checks ***************************************************************/

pub(crate) fn check_square<T>(a: &nd::ArrayView2<T>) -> FockResult<usize> {
    let (rows, cols) = a.dim();
    if rows != cols {
        return Err(FockError::dimension(format!(
            "permanent requires a square matrix, got {rows} × {cols}")));
    }
    check_order(rows)?;
    Ok(rows)
}

pub(crate) fn check_order(n: usize) -> FockResult<()> {
    if n == 0 {
        return Err(FockError::dimension("permanent of an empty matrix"));
    }
    if n > MAX_ORDER {
        return Err(FockError::dimension(
            format!("matrix order {n} exceeds {MAX_ORDER}")));
    }
    Ok(())
}

/* Entry points ***************************************************************/

/// Like [`permanent`], for an array of unknown dimensionality.
pub fn permanent_dyn<T>(a: nd::ArrayViewD<T>) -> FockResult<T>
where T: PermanentScalar
{
    let shape = a.shape().to_vec();
    let a2: nd::ArrayView2<T>
        = a.into_dimensionality::<nd::Ix2>()
        .map_err(|_| FockError::dimension(format!(
            "permanent requires a 2-dimensional array, got shape {shape:?}")))?;
    ryser::permanent_view(a2)
}

/// Real part of the permanent of a complex matrix, taken over the real parts
/// of its entries.
///
/// Emits a warning if any discarded imaginary part is non-zero.
pub fn permanent_real(a: &nd::Array2<C64>) -> FockResult<f64> {
    if a.iter().any(|z| z.im != 0.0) {
        warn!("permanent_real: discarding non-zero imaginary parts");
    }
    let re: nd::Array2<f64> = a.mapv(|z| z.re);
    permanent(&re)
}

/// Compute a permanent using the configured algorithm and thread count.
pub fn permanent_with<T>(a: &nd::Array2<T>, config: &PermanentConfig)
    -> FockResult<T>
where T: FieldScalar
{
    match config.algorithm {
        Algorithm::Glynn => permanent_glynn(a),
        Algorithm::Ryser if config.threads > 1
            => permanent_par(a, Some(config.threads)),
        Algorithm::Ryser => permanent(a),
    }
}

#[cfg(test)]
pub(crate) mod test_utils {
    use itertools::Itertools;
    use ndarray as nd;
    use num_complex::Complex64 as C64;
    use rand::{ Rng, SeedableRng, rngs::StdRng };

    /// Sum over all permutations.
    pub fn brute_force(a: &nd::Array2<C64>) -> C64 {
        let n = a.nrows();
        (0..n).permutations(n)
            .map(|sigma| {
                sigma.iter().enumerate()
                    .map(|(i, j)| a[[i, *j]])
                    .product::<C64>()
            })
            .sum()
    }

    pub fn random_complex(rows: usize, cols: usize, seed: u64) -> nd::Array2<C64> {
        let mut rng = StdRng::seed_from_u64(seed);
        nd::Array2::from_shape_simple_fn((rows, cols), || {
            C64::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0))
        })
    }

    pub fn random_int(rows: usize, cols: usize, seed: u64) -> nd::Array2<i64> {
        let mut rng = StdRng::seed_from_u64(seed);
        nd::Array2::from_shape_simple_fn((rows, cols), || rng.gen_range(-5..=5))
    }

    pub fn close(a: C64, b: C64) -> bool {
        (a - b).norm() <= 1e-9 * (1.0 + b.norm())
    }
}
