//! Counting, ranking, and unranking of bounded compositions.
//!
//! A Fock state of `m` modes holding `n` photons is a composition of `n` into
//! `m` non-negative parts. All enumerations in this crate use the same
//! canonical order: *descending* lexicographic order of the occupation vector,
//! so that the leftmost mode varies slowest and larger leading occupations come
//! first. For (m = 3, n = 2) this is
//! ```text
//! [2,0,0] [1,1,0] [1,0,1] [0,2,0] [0,1,1] [0,0,2]
//! ```
//!
//! Sets of states are described by [`Bounds`], a box of per-mode occupation
//! bounds, and [`Region`], a signed (inclusion–exclusion) combination of boxes
//! representing a union of boxes. Every rank, unrank, and count is computed
//! from tables of partial sums ("bands") over the boxes, so that no operation
//! ever needs to visit the states it skips over.

use rustc_hash::FxHashMap as HashMap;
use tracing::debug;
use crate::error::{ FockError, FockResult };

/* Bounds *********************************************************************/

/// A box of per-mode occupation bounds over `m` modes holding exactly `n`
/// photons.
///
/// A state `s` lies in the box if and only if `lo[k] <= s[k] <= hi[k]` for all
/// `k` and `s` sums to `n`.
#[derive(Clone, Debug)]
pub(crate) struct Bounds {
    lo: Vec<usize>,
    hi: Vec<usize>,
    n: usize,
    // ways[k * (n + 1) + r] = number of ways to place r photons in modes k..m
    // while respecting the bounds; saturates at u64::MAX
    ways: Vec<u64>,
}

impl Bounds {
    /// Unconstrained box: every composition of `n` into `m` parts.
    pub(crate) fn full(m: usize, n: usize) -> Self {
        let w = n + 1;
        let mut ways: Vec<u64> = vec![0; (m + 1) * w];
        ways[m * w] = 1;
        // stars and bars: ways[k][r] = ways[k][r - 1] + ways[k + 1][r]
        for k in (0..m).rev() {
            for r in 0..=n {
                let below = if r > 0 { ways[k * w + r - 1] } else { 0 };
                ways[k * w + r] = below.saturating_add(ways[(k + 1) * w + r]);
            }
        }
        Self { lo: vec![0; m], hi: vec![n; m], n, ways }
    }

    /// Create a new box, returning `None` if no state can satisfy the bounds.
    ///
    /// Upper bounds are clipped to `n`.
    pub(crate) fn new(lo: Vec<usize>, hi: Vec<usize>, n: usize)
        -> Option<Self>
    {
        let m = lo.len();
        let hi: Vec<usize> = hi.into_iter().map(|h| h.min(n)).collect();
        let empty
            = lo.iter().zip(&hi).any(|(l, h)| l > h)
            || lo.iter().sum::<usize>() > n
            || hi.iter().sum::<usize>() < n;
        if empty { return None; }
        let w = n + 1;
        let mut ways: Vec<u64> = vec![0; (m + 1) * w];
        ways[m * w] = 1;
        for k in (0..m).rev() {
            for r in 0..=n {
                let top = hi[k].min(r);
                if lo[k] > top { continue; }
                ways[k * w + r]
                    = (lo[k]..=top)
                    .fold(0_u64, |acc, v| {
                        acc.saturating_add(ways[(k + 1) * w + r - v])
                    });
            }
        }
        Some(Self { lo, hi, n, ways })
    }

    pub(crate) fn m(&self) -> usize { self.lo.len() }

    pub(crate) fn lo(&self) -> &[usize] { &self.lo }

    pub(crate) fn hi(&self) -> &[usize] { &self.hi }

    /// Number of ways to distribute `r` photons over modes `k..m`.
    pub(crate) fn ways(&self, k: usize, r: usize) -> u64 {
        if r > self.n { return 0; }
        self.ways[k * (self.n + 1) + r]
    }

    /// Total number of states in the box.
    pub(crate) fn count(&self) -> u64 { self.ways(0, self.n) }

    /// Return `true` if the value `v` is allowed in mode `k`.
    pub(crate) fn allows(&self, k: usize, v: usize) -> bool {
        self.lo[k] <= v && v <= self.hi[k]
    }

    pub(crate) fn contains(&self, state: &[usize]) -> bool {
        state.len() == self.m()
            && state.iter().sum::<usize>() == self.n
            && state.iter().enumerate().all(|(k, v)| self.allows(k, *v))
    }

    /// Number of states in the box that precede `state` in canonical order.
    ///
    /// `state` itself does not need to lie in the box, but it must have `m`
    /// modes and hold `n` photons.
    pub(crate) fn rank_before(&self, state: &[usize]) -> u64 {
        let mut acc: u64 = 0;
        let mut rem: usize = self.n;
        for (k, &sk) in state.iter().enumerate() {
            // states sharing the prefix but with a larger value in mode k
            let top = self.hi[k].min(rem);
            let start = self.lo[k].max(sk + 1);
            if start <= top {
                acc = (start..=top)
                    .fold(acc, |a, v| a.saturating_add(self.ways(k + 1, rem - v)));
            }
            if !self.allows(k, sk) || sk > rem { break; }
            rem -= sk;
        }
        acc
    }

    /// Intersection of two boxes over the same `(m, n)`.
    pub(crate) fn intersect(&self, other: &Self) -> Option<Self> {
        let lo: Vec<usize>
            = self.lo.iter().zip(&other.lo).map(|(a, b)| *a.max(b)).collect();
        let hi: Vec<usize>
            = self.hi.iter().zip(&other.hi).map(|(a, b)| *a.min(b)).collect();
        Self::new(lo, hi, self.n)
    }

    /// Box of the `n - 1`-photon states `p` such that `p + e_k` lies in
    /// `self`.
    pub(crate) fn lowered(&self, k: usize) -> Option<Self> {
        if self.n == 0 || self.hi[k] == 0 { return None; }
        let mut lo = self.lo.clone();
        let mut hi = self.hi.clone();
        lo[k] = lo[k].saturating_sub(1);
        hi[k] -= 1;
        Self::new(lo, hi, self.n - 1)
    }

    fn key(&self) -> (Vec<usize>, Vec<usize>) {
        (self.lo.clone(), self.hi.clone())
    }
}

/* Region *********************************************************************/

/// A union of [`Bounds`], stored as its inclusion–exclusion expansion.
///
/// Every state of the union is counted exactly once by the signed sum of the
/// expansion's terms, which lets counts and ranks over the union be computed
/// as signed sums of per-box counts and ranks.
#[derive(Clone, Debug)]
pub(crate) struct Region {
    m: usize,
    n: usize,
    terms: Vec<(i64, Bounds)>,
    count: u64,
}

impl Region {
    /// All compositions of `n` into `m` parts.
    pub(crate) fn full(m: usize, n: usize) -> FockResult<Self> {
        Self::from_terms(m, n, vec![(1, Bounds::full(m, n))])
    }

    /// The union of a collection of boxes over the same `(m, n)`.
    ///
    /// An empty collection gives the empty region.
    pub(crate) fn union<I>(m: usize, n: usize, boxes: I) -> FockResult<Self>
    where I: IntoIterator<Item = Bounds>
    {
        // incremental inclusion–exclusion:
        //   1_{A ∪ B} = 1_A + 1_B - 1_{A ∩ B}
        let mut terms: Vec<(i64, Bounds)> = Vec::new();
        for b in boxes.into_iter() {
            let mut new_terms: Vec<(i64, Bounds)>
                = terms.iter()
                .filter_map(|(s, t)| t.intersect(&b).map(|i| (-s, i)))
                .collect();
            new_terms.push((1, b));
            terms.append(&mut new_terms);
            terms = merge_terms(terms);
        }
        debug!(m, n, terms = terms.len(), "built union region");
        Self::from_terms(m, n, terms)
    }

    fn from_terms(m: usize, n: usize, terms: Vec<(i64, Bounds)>)
        -> FockResult<Self>
    {
        if terms.iter().any(|(_, b)| b.count() == u64::MAX) {
            return Err(FockError::range(format!(
                "state space for m = {m}, n = {n} exceeds 64-bit indexing"
            )));
        }
        let count: i128
            = terms.iter()
            .map(|(s, b)| i128::from(*s) * i128::from(b.count()))
            .sum();
        let count = u64::try_from(count)
            .map_err(|_| FockError::range(format!(
                "state space for m = {m}, n = {n} exceeds 64-bit indexing"
            )))?;
        Ok(Self { m, n, terms, count })
    }

    pub(crate) fn count(&self) -> u64 { self.count }

    pub(crate) fn contains(&self, state: &[usize]) -> bool {
        if state.len() != self.m || state.iter().sum::<usize>() != self.n {
            return false;
        }
        let hits: i64
            = self.terms.iter()
            .filter(|(_, b)| b.contains(state))
            .map(|(s, _)| *s)
            .sum();
        hits > 0
    }

    /// Number of states in the region preceding `state` in canonical order.
    ///
    /// `state` must have `m` modes and hold `n` photons, but need not lie in
    /// the region.
    pub(crate) fn rank_before(&self, state: &[usize]) -> u64 {
        let r: i128
            = self.terms.iter()
            .map(|(s, b)| i128::from(*s) * i128::from(b.rank_before(state)))
            .sum();
        r.max(0) as u64
    }

    /// Canonical index of `state` in the region, or `None` if it is not a
    /// member.
    pub(crate) fn rank(&self, state: &[usize]) -> Option<u64> {
        self.contains(state).then(|| self.rank_before(state))
    }

    /// The `index`-th state of the region in canonical order, or `None` if
    /// `index >= count`.
    pub(crate) fn unrank(&self, index: u64) -> Option<Vec<usize>> {
        if index >= self.count { return None; }
        let mut index = i128::from(index);
        let mut state: Vec<usize> = Vec::with_capacity(self.m);
        // whether each term's box still admits the prefix built so far
        let mut alive: Vec<bool> = vec![true; self.terms.len()];
        let mut rem: usize = self.n;
        for k in 0..self.m {
            let mut chosen: Option<usize> = None;
            for v in (0..=rem).rev() {
                let c: i128
                    = self.terms.iter().zip(&alive)
                    .filter(|((_, b), a)| **a && b.allows(k, v))
                    .map(|((s, b), _)| {
                        i128::from(*s) * i128::from(b.ways(k + 1, rem - v))
                    })
                    .sum();
                if index < c {
                    chosen = Some(v);
                    break;
                }
                index -= c;
            }
            let v = chosen?;
            alive.iter_mut().zip(&self.terms)
                .for_each(|(a, (_, b))| { *a = *a && b.allows(k, v); });
            state.push(v);
            rem -= v;
        }
        Some(state)
    }

    /// The set of `n - 1`-photon states of `parent` that reach a state of
    /// `self` when one photon is added to mode `k`.
    pub(crate) fn descents(&self, parent: &Region, k: usize)
        -> FockResult<Region>
    {
        let terms: Vec<(i64, Bounds)>
            = parent.terms.iter()
            .flat_map(|(sp, bp)| {
                self.terms.iter()
                    .filter_map(move |(sc, bc)| {
                        bc.lowered(k)
                            .and_then(|low| bp.intersect(&low))
                            .map(|i| (sp * sc, i))
                    })
            })
            .collect();
        Self::from_terms(parent.m, parent.n, merge_terms(terms))
    }
}

// combine identical boxes and drop any whose signs cancel
fn merge_terms(terms: Vec<(i64, Bounds)>) -> Vec<(i64, Bounds)> {
    let mut signs: HashMap<(Vec<usize>, Vec<usize>), (i64, Bounds)>
        = HashMap::default();
    let mut order: Vec<(Vec<usize>, Vec<usize>)> = Vec::new();
    for (s, b) in terms.into_iter() {
        let key = b.key();
        match signs.get_mut(&key) {
            Some((acc, _)) => { *acc += s; },
            None => {
                order.push(key.clone());
                signs.insert(key, (s, b));
            },
        }
    }
    order.into_iter()
        .filter_map(|key| signs.remove(&key))
        .filter(|(s, _)| *s != 0)
        .collect()
}
