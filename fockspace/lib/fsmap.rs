//! Dense indexing of one-photon transitions between adjacent layers.
//!
//! Given a *child* array of `n`-photon states and a *parent* array of
//! `n - 1`-photon states over the same modes, a pair `(c, k)` of a child state
//! and a mode is valid when mode `k` of `c` is occupied and removing one photon
//! from it gives a parent state `p`. [`FSMap`] numbers the valid pairs densely,
//! ordered first by the rank of `p` and then by `k`, so that for unmasked
//! arrays the index of a pair is just `rank(p) * m + k`.

use std::borrow::Cow;
use ndarray as nd;
use num_complex::Complex64 as C64;
use once_cell::sync::OnceCell;
use crate::{
    combinatorics::Region,
    error::{ FockError, FockResult },
    fockstate::FockState,
    fsarray::FSArray,
};

#[derive(Clone, Debug)]
pub struct FSMap<'a> {
    child: &'a FSArray,
    parent: Cow<'a, FSArray>,
    // per mode: parents p such that p + e_k is in the child array; present
    // only when neither array is materialized
    descents: Option<Vec<Region>>,
    // per parent rank: number of valid pairs with a smaller parent rank
    offsets: OnceCell<Vec<u64>>,
}

impl<'a> FSMap<'a> {
    /// Map between `child` and an explicitly supplied `parent`.
    pub fn new(child: &'a FSArray, parent: &'a FSArray) -> FockResult<Self> {
        Self::build(child, Cow::Borrowed(parent))
    }

    /// Map between `child` and the unmasked array with one photon less.
    pub fn derived(child: &'a FSArray) -> FockResult<Self> {
        if child.n() == 0 {
            return Err(FockError::dimension(
                "cannot derive a parent layer from zero photons"));
        }
        let parent = FSArray::new(child.m(), child.n() - 1)?;
        Self::build(child, Cow::Owned(parent))
    }

    fn build(child: &'a FSArray, parent: Cow<'a, FSArray>) -> FockResult<Self> {
        if child.m() != parent.m() || parent.n() + 1 != child.n() {
            return Err(FockError::dimension(format!(
                "cannot map (m, n) = ({}, {}) onto (m, n) = ({}, {})",
                child.m(), child.n(), parent.m(), parent.n(),
            )));
        }
        let descents
            = match (child.region(), parent.region()) {
                (Some(c), Some(p)) => {
                    let regions: Vec<Region>
                        = (0..child.m())
                        .map(|k| c.descents(p, k))
                        .collect::<FockResult<_>>()?;
                    let total
                        = regions.iter()
                        .try_fold(0_u64, |acc, r| acc.checked_add(r.count()));
                    if total.is_none() {
                        return Err(FockError::range(
                            "number of transitions exceeds 64-bit indexing"));
                    }
                    Some(regions)
                },
                _ => None,
            };
        Ok(Self { child, parent, descents, offsets: OnceCell::new() })
    }

    pub fn m(&self) -> usize { self.child.m() }

    /// Photon number of the parent layer.
    pub fn n(&self) -> usize { self.parent.n() }

    pub fn child(&self) -> &FSArray { self.child }

    pub fn parent(&self) -> &FSArray { &self.parent }

    fn with_photon(state: &FockState, mode: usize) -> FockState {
        let mut occ = state.occupations().unwrap_or(&[]).to_vec();
        occ[mode] += 1;
        FockState::new(occ)
    }

    // offsets for materialized arrays, where closed forms are unavailable
    fn offsets(&self) -> &[u64] {
        self.offsets.get_or_init(|| {
            let m = self.m();
            let mut acc: u64 = 0;
            let mut offsets: Vec<u64> = Vec::new();
            for p in self.parent.iter() {
                offsets.push(acc);
                acc += (0..m)
                    .filter(|k| self.child.contains(&Self::with_photon(&p, *k)))
                    .count() as u64;
            }
            offsets.push(acc);
            offsets
        })
    }

    /// Number of valid `(child rank, mode)` pairs.
    pub fn size(&self) -> u64 {
        match &self.descents {
            Some(regions) => regions.iter().map(|r| r.count()).sum(),
            None => self.offsets().last().copied().unwrap_or(0),
        }
    }

    /// Number of parent states.
    pub fn count(&self) -> u64 { self.parent.count() }

    /// Dense index of the transition removing one photon from `mode` of the
    /// child state at `child_rank`.
    pub fn get(&self, child_rank: u64, mode: usize) -> FockResult<u64> {
        let m = self.m();
        if mode >= m {
            return Err(FockError::range(
                format!("mode {mode} out of range for {m} modes")));
        }
        let child = self.child.get(child_rank)?;
        let occ = child.occupations().unwrap_or(&[]);
        if occ[mode] == 0 {
            return Err(FockError::range(format!(
                "mode {mode} of child state {child} is empty")));
        }
        let mut reduced = occ.to_vec();
        reduced[mode] -= 1;
        let p_rank
            = self.parent.find(&FockState::new(reduced.clone()))?
            .ok_or_else(|| FockError::range(format!(
                "no parent state for removing a photon from mode {mode} \
                of {child}"
            )))?;
        match &self.descents {
            Some(regions) => {
                let before: u64
                    = regions.iter()
                    .map(|r| r.rank_before(&reduced))
                    .sum();
                let lower
                    = regions[..mode].iter()
                    .filter(|r| r.contains(&reduced))
                    .count() as u64;
                Ok(before + lower)
            },
            None => {
                let base = self.offsets()[p_rank as usize];
                let p = FockState::new(reduced);
                let lower
                    = (0..mode)
                    .filter(|k| self.child.contains(&Self::with_photon(&p, *k)))
                    .count() as u64;
                Ok(base + lower)
            },
        }
    }

    /// Rank in the child array of the parent state at `parent_rank` with one
    /// photon added to `mode`, or `None` if that state is not in the child
    /// array.
    pub fn child_of(&self, parent_rank: u64, mode: usize)
        -> FockResult<Option<u64>>
    {
        if mode >= self.m() {
            return Err(FockError::range(
                format!("mode {mode} out of range for {} modes", self.m())));
        }
        let p = self.parent.get(parent_rank)?;
        self.child.find(&Self::with_photon(&p, mode))
    }

    /// Rank in the parent array of the child state at `child_rank` with one
    /// photon removed from `mode`, or `None` if there is no such state.
    pub fn parent_of(&self, child_rank: u64, mode: usize)
        -> FockResult<Option<u64>>
    {
        if mode >= self.m() {
            return Err(FockError::range(
                format!("mode {mode} out of range for {} modes", self.m())));
        }
        let c = self.child.get(child_rank)?;
        let mut occ = c.occupations().unwrap_or(&[]).to_vec();
        if occ[mode] == 0 { return Ok(None); }
        occ[mode] -= 1;
        self.parent.find(&FockState::new(occ))
    }

    /// Propagate amplitudes from the parent layer to the child layer for one
    /// more photon entering input mode `mk` of the unitary `u`.
    ///
    /// Each child amplitude is the sum over its occupied modes `k` of
    /// `u[[k, mk]]` times the amplitude of the parent state with one photon
    /// less in mode `k`. Amplitudes are left unnormalized; see
    /// [`FSArray::norm_coefs`].
    pub fn compute_slos_layer(
        &self,
        u: nd::ArrayView2<C64>,
        mk: usize,
        parent_coefs: &[C64],
    ) -> FockResult<Vec<C64>>
    {
        let m = self.m();
        if u.nrows() != m || mk >= u.ncols() {
            return Err(FockError::dimension(format!(
                "unitary of shape {:?} incompatible with {m} modes and input \
                mode {mk}",
                u.shape(),
            )));
        }
        if parent_coefs.len() as u64 != self.parent.count() {
            return Err(FockError::dimension(format!(
                "{} parent amplitudes given for {} parent states",
                parent_coefs.len(), self.parent.count(),
            )));
        }
        let n_child = usize::try_from(self.child.count())
            .map_err(|_| FockError::range("child layer too large to store"))?;
        let mut coefs: Vec<C64> = vec![C64::new(0.0, 0.0); n_child];
        for (p, coef) in self.parent.iter().zip(parent_coefs) {
            if *coef == C64::new(0.0, 0.0) { continue; }
            for k in 0..m {
                if let Some(c) = self.child.find(&Self::with_photon(&p, k))? {
                    coefs[c as usize] += u[[k, mk]] * coef;
                }
            }
        }
        Ok(coefs)
    }
}
