//! Canonical enumeration of all Fock states with fixed mode and photon
//! numbers.
//!
//! An [`FSArray`] is a bijection between the states of `m` modes holding `n`
//! photons (optionally restricted by an [`FSMask`]) and the integers
//! `0..count()`, in descending lexicographic order of occupation vectors. The
//! states are never stored: ranks and unranks are computed from partial sums
//! of bounded-composition counts, so arrays with well over 10^14 states are as
//! cheap to build as small ones. Arrays restored from a snapshot are the
//! exception, and keep the snapshot's records in memory.

use std::{ cmp::Ordering, ops::MulAssign, path::{ Path, PathBuf } };
use crate::{
    combinatorics::Region,
    config::{ SnapshotAlphabet, SnapshotConfig },
    error::{ FockError, FockResult },
    fockstate::FockState,
    mask::FSMask,
    snapshot,
};

#[derive(Clone, Debug)]
enum Layout {
    Region(Region),
    Records { codes: Vec<u8>, count: u64 },
}

#[derive(Clone, Debug)]
pub struct FSArray {
    m: usize,
    n: usize,
    mask: Option<FSMask>,
    layout: Layout,
}

impl FSArray {
    /// All states of `m` modes holding `n` photons.
    pub fn new(m: usize, n: usize) -> FockResult<Self> {
        let region = Region::full(m, n)?;
        Ok(Self { m, n, mask: None, layout: Layout::Region(region) })
    }

    /// All states of `m` modes holding `n` photons that match every digit of
    /// at least one of the mask's patterns exactly.
    pub fn with_mask(m: usize, n: usize, mask: &FSMask) -> FockResult<Self> {
        if mask.m() != m {
            return Err(FockError::dimension(format!(
                "mask over {} modes applied to {m} modes", mask.m())));
        }
        let region
            = match mask.boxes(n) {
                Some(boxes) => Region::union(m, n, boxes)?,
                None => Region::full(m, n)?,
            };
        Ok(Self { m, n, mask: Some(mask.clone()), layout: Layout::Region(region) })
    }

    /// Restore an array saved by [`Self::save`].
    ///
    /// If `path` is a directory, the layer file for `(m, n)` inside it is
    /// read.
    pub fn load<P>(path: P, m: usize, n: usize) -> FockResult<Self>
    where P: AsRef<Path>
    {
        let codes = snapshot::load(path.as_ref(), m, n)?;
        let count = if n == 0 { 1 } else { (codes.len() / n) as u64 };
        Ok(Self { m, n, mask: None, layout: Layout::Records { codes, count } })
    }

    /// Write the array to `path` with the default configuration, returning the
    /// path written.
    ///
    /// If `path` is an existing directory, the file `layer-m<m>-n<n>.fsa` is
    /// written inside it.
    pub fn save<P>(&self, path: P) -> FockResult<PathBuf>
    where P: AsRef<Path>
    {
        self.save_with(path, &SnapshotConfig::default())
    }

    pub fn save_with<P>(&self, path: P, config: &SnapshotConfig)
        -> FockResult<PathBuf>
    where P: AsRef<Path>
    {
        snapshot::save(self, path.as_ref(), config.alphabet)
    }

    /// Like [`Self::save_with`], taking only the alphabet.
    pub fn save_alphabet<P>(&self, path: P, alphabet: SnapshotAlphabet)
        -> FockResult<PathBuf>
    where P: AsRef<Path>
    {
        snapshot::save(self, path.as_ref(), alphabet)
    }

    pub fn m(&self) -> usize { self.m }

    pub fn n(&self) -> usize { self.n }

    pub fn mask(&self) -> Option<&FSMask> { self.mask.as_ref() }

    /// Return `true` if the array holds its states in memory.
    pub fn is_materialized(&self) -> bool {
        matches!(self.layout, Layout::Records { .. })
    }

    pub(crate) fn region(&self) -> Option<&Region> {
        match &self.layout {
            Layout::Region(region) => Some(region),
            Layout::Records { .. } => None,
        }
    }

    /// Number of states.
    pub fn count(&self) -> u64 {
        match &self.layout {
            Layout::Region(region) => region.count(),
            Layout::Records { count, .. } => *count,
        }
    }

    /// Number of photon records in a snapshot of the array, `count() * n()`.
    pub fn size(&self) -> u64 {
        self.count().saturating_mul(self.n as u64)
    }

    fn occupation_at(&self, index: u64) -> Option<Vec<usize>> {
        match &self.layout {
            Layout::Region(region) => region.unrank(index),
            Layout::Records { codes, count } => {
                if index >= *count { return None; }
                let start = usize::try_from(index).ok()? * self.n;
                snapshot::decode(&codes[start..start + self.n], self.m).ok()
            },
        }
    }

    /// The `index`-th state in canonical order.
    pub fn get(&self, index: u64) -> FockResult<FockState> {
        self.occupation_at(index)
            .map(FockState::new)
            .ok_or_else(|| FockError::range(format!(
                "index {index} out of range for {} states", self.count())))
    }

    fn rank_of(&self, occ: &[usize]) -> Option<u64> {
        match &self.layout {
            Layout::Region(region) => region.rank(occ),
            Layout::Records { codes, .. } => {
                if self.n == 0 { return Some(0); }
                let mut key: Vec<u8> = Vec::with_capacity(self.n);
                snapshot::encode_into(occ, &mut key);
                let (mut lo, mut hi) = (0, codes.len() / self.n);
                while lo < hi {
                    let mid = (lo + hi) / 2;
                    let record = &codes[mid * self.n..(mid + 1) * self.n];
                    match record.cmp(key.as_slice()) {
                        Ordering::Less => { lo = mid + 1; },
                        Ordering::Greater => { hi = mid; },
                        Ordering::Equal => { return Some(mid as u64); },
                    }
                }
                None
            },
        }
    }

    /// Canonical index of `state`.
    ///
    /// Returns `Ok(None)` if the state has the right mode count but is not in
    /// the array, either because its photon count differs or because it is
    /// excluded by the mask.
    pub fn find(&self, state: &FockState) -> FockResult<Option<u64>> {
        if state.m() != self.m {
            return Err(FockError::dimension(format!(
                "state over {} modes looked up in an array over {} modes",
                state.m(), self.m,
            )));
        }
        let Some(occ) = state.occupations() else { return Ok(None); };
        if state.n() != self.n { return Ok(None); }
        Ok(self.rank_of(occ))
    }

    pub fn contains(&self, state: &FockState) -> bool {
        matches!(self.find(state), Ok(Some(_)))
    }

    /// Iterate over all states in canonical order.
    pub fn iter(&self) -> FSArrayIter<'_> {
        FSArrayIter { array: self, next: 0, end: self.count() }
    }

    /// Multiply each amplitude by `sqrt(prodnfact)` of the state at its index.
    pub fn norm_coefs<T>(&self, coefs: &mut [T]) -> FockResult<()>
    where T: MulAssign<f64>
    {
        if coefs.len() as u64 != self.count() {
            return Err(FockError::dimension(format!(
                "{} coefficients given for {} states",
                coefs.len(), self.count(),
            )));
        }
        coefs.iter_mut().zip(self.iter())
            .for_each(|(c, s)| { *c *= (s.prodnfact() as f64).sqrt(); });
        Ok(())
    }
}

/// Iterator over the states of an [`FSArray`].
#[derive(Clone, Debug)]
pub struct FSArrayIter<'a> {
    array: &'a FSArray,
    next: u64,
    end: u64,
}

impl<'a> Iterator for FSArrayIter<'a> {
    type Item = FockState;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.end { return None; }
        let state = self.array.occupation_at(self.next).map(FockState::new);
        self.next += 1;
        state
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let rem = usize::try_from(self.end - self.next).ok();
        (rem.unwrap_or(usize::MAX), rem)
    }
}

impl<'a> IntoIterator for &'a FSArray {
    type Item = FockState;
    type IntoIter = FSArrayIter<'a>;

    fn into_iter(self) -> Self::IntoIter { self.iter() }
}

#[cfg(test)]
mod test {
    use super::*;
    use num_complex::Complex64 as C64;
    use proptest::prelude::*;

    fn binom(n: u64, k: u64) -> u64 {
        (0..k).fold(1, |acc, i| acc * (n - i) / (i + 1))
    }

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("fockspace-{}-{name}", std::process::id()))
    }

    #[test]
    fn counts() {
        for m in 1..8 {
            for n in 0..8 {
                let array = FSArray::new(m, n).unwrap();
                assert_eq!(array.count(), binom((m + n - 1) as u64, n as u64));
            }
        }
        for m in 0..6 {
            let array = FSArray::new(m, 0).unwrap();
            assert_eq!(array.count(), 1);
            assert_eq!(array.size(), 0);
        }
        assert_eq!(FSArray::new(32, 16).unwrap().count(), 1503232609098);
    }

    #[test]
    fn canonical_order() {
        let array = FSArray::new(3, 2).unwrap();
        let states: Vec<String> = array.iter().map(|s| s.to_string()).collect();
        assert_eq!(
            states,
            ["|2,0,0>", "|1,1,0>", "|1,0,1>", "|0,2,0>", "|0,1,1>", "|0,0,2>"],
        );
        // restartable
        assert_eq!((&array).into_iter().count(), 6);
        assert_eq!(array.iter().count(), 6);
    }

    #[test]
    fn rank_unrank() {
        let array = FSArray::new(6, 5).unwrap();
        for i in 0..array.count() {
            assert_eq!(array.find(&array.get(i).unwrap()).unwrap(), Some(i));
        }
        assert!(matches!(array.get(array.count()), Err(FockError::Range(_))));
    }

    #[test]
    fn find_mismatches() {
        let array = FSArray::new(3, 2).unwrap();
        let wrong_n = FockState::new(vec![1, 1, 1]);
        assert_eq!(array.find(&wrong_n).unwrap(), None);
        let wrong_m = FockState::new(vec![1, 1]);
        assert!(matches!(array.find(&wrong_m), Err(FockError::Dimension(_))));
        assert!(!array.contains(&wrong_n));
        assert!(array.contains(&FockState::new(vec![0, 1, 1])));
    }

    #[test]
    fn large_space() {
        let array = FSArray::new(32, 16).unwrap();
        let last = array.get(array.count() - 1).unwrap();
        let mut expected = vec![0; 32];
        expected[31] = 16;
        assert_eq!(last, FockState::new(expected));
        let state = FockState::parse(
            "|1,0,2,0,0,0,1,0,0,0,0,3,0,0,0,0,0,0,1,0,0,0,4,0,0,0,0,0,2,0,1,1>"
        ).unwrap();
        let i = array.find(&state).unwrap().unwrap();
        assert_eq!(array.get(i).unwrap(), state);
    }

    #[test]
    fn masked_counts() {
        let mask = FSMask::with_patterns(6, 4, ["1    1"]).unwrap();
        let array = FSArray::with_mask(6, 4, &mask).unwrap();
        assert_eq!(FSArray::new(6, 4).unwrap().size(), 504);
        assert_eq!(array.count(), 10);
        assert_eq!(array.size(), 40);

        let mask = FSMask::with_patterns(12, 6, ["111         "]).unwrap();
        let array = FSArray::with_mask(12, 6, &mask).unwrap();
        assert_eq!(FSArray::new(12, 6).unwrap().size(), 74256);
        assert_eq!(array.size(), 990);

        let mask = FSMask::with_patterns(5, 3, [" 1 1 "]).unwrap();
        assert_eq!(FSArray::with_mask(5, 3, &mask).unwrap().count(), 3);
    }

    #[test]
    fn masked_order() {
        let mask = FSMask::with_patterns(4, 3, ["1   ", "  2 "]).unwrap();
        let array = FSArray::with_mask(4, 3, &mask).unwrap();
        let expected: Vec<FockState>
            = FSArray::new(4, 3).unwrap().iter()
            .filter(|s| mask.matches(s, false))
            .collect();
        let states: Vec<FockState> = array.iter().collect();
        assert_eq!(states, expected);
        for (i, s) in expected.iter().enumerate() {
            assert_eq!(array.find(s).unwrap(), Some(i as u64));
        }
        assert_eq!(array.find(&FockState::new(vec![3, 0, 0, 0])).unwrap(), None);
        assert!(matches!(
            FSArray::with_mask(5, 3, &mask),
            Err(FockError::Dimension(_)),
        ));
    }

    #[test]
    fn snapshot_payload() {
        let path = temp_path("payload.fsa");
        FSArray::new(3, 2).unwrap().save(&path).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(&bytes[0..3], b"FSA");
        assert_eq!(bytes[4], b'6');
        assert_eq!(&bytes[6..8], &[3, 2]);
        assert_eq!(&bytes[8..], b"AAABACBBBCCC");
    }

    #[test]
    fn snapshot_roundtrip() {
        let path = temp_path("roundtrip.fsa");
        let array = FSArray::new(5, 4).unwrap();
        array.save(&path).unwrap();
        let loaded = FSArray::load(&path, 5, 4).unwrap();
        assert!(loaded.is_materialized());
        assert_eq!(loaded.count(), array.count());
        for i in 0..array.count() {
            let s = array.get(i).unwrap();
            assert_eq!(loaded.get(i).unwrap(), s);
            assert_eq!(loaded.find(&s).unwrap(), Some(i));
        }
        assert!(matches!(
            FSArray::load(&path, 5, 3), Err(FockError::Consistency(_))));
        assert!(matches!(
            FSArray::load(&path, 4, 4), Err(FockError::Consistency(_))));
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(FSArray::load(&path, 5, 4), Err(FockError::Io(_))));
    }

    #[test]
    fn snapshot_directory() {
        let dir = temp_path("layers");
        std::fs::create_dir_all(&dir).unwrap();
        let written = FSArray::new(3, 1).unwrap().save(&dir).unwrap();
        assert_eq!(written, dir.join("layer-m3-n1.fsa"));
        let loaded = FSArray::load(&dir, 3, 1).unwrap();
        assert_eq!(loaded.count(), 3);
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn snapshot_vacuum() {
        let path = temp_path("vacuum.fsa");
        FSArray::new(4, 0).unwrap().save(&path).unwrap();
        let loaded = FSArray::load(&path, 4, 0).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded.count(), 1);
        assert_eq!(loaded.size(), 0);
        assert_eq!(loaded.get(0).unwrap(), FockState::vacuum(4));
        assert_eq!(loaded.find(&FockState::vacuum(4)).unwrap(), Some(0));
    }

    #[test]
    fn snapshot_bad_magic() {
        let path = temp_path("bad-magic.fsa");
        std::fs::write(&path, b"XYZ\x006\x00\x03\x02AAABACBBBCCC").unwrap();
        let res = FSArray::load(&path, 3, 2);
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(res, Err(FockError::Format(_))));
    }

    #[test]
    fn snapshot_alphabets() {
        let array = FSArray::new(27, 1).unwrap();
        let path = temp_path("alphabet.fsa");
        assert!(matches!(
            array.save_alphabet(&path, SnapshotAlphabet::Letters),
            Err(FockError::Format(_)),
        ));
        array.save_alphabet(&path, SnapshotAlphabet::Extended).unwrap();
        let loaded = FSArray::load(&path, 27, 1).unwrap();
        std::fs::remove_file(&path).unwrap();
        let mut last = vec![0; 27];
        last[26] = 1;
        assert_eq!(loaded.get(26).unwrap(), FockState::new(last));
        assert!(matches!(
            FSArray::new(192, 1).unwrap()
                .save_alphabet(&path, SnapshotAlphabet::Extended),
            Err(FockError::Format(_)),
        ));
    }

    #[test]
    fn normalization() {
        let array = FSArray::new(2, 2).unwrap();
        let mut coefs = vec![C64::new(1.0, 1.0); 3];
        array.norm_coefs(&mut coefs).unwrap();
        let r2 = 2.0_f64.sqrt();
        assert!((coefs[0] - C64::new(r2, r2)).norm() < 1e-12);
        assert!((coefs[1] - C64::new(1.0, 1.0)).norm() < 1e-12);
        assert!((coefs[2] - C64::new(r2, r2)).norm() < 1e-12);
        let mut short = vec![1.0_f64; 2];
        assert!(matches!(
            array.norm_coefs(&mut short), Err(FockError::Dimension(_))));
    }

    proptest! {
        #[test]
        fn unrank_rank_inverse(m in 1_usize..12, n in 0_usize..10, seed in any::<u64>()) {
            let array = FSArray::new(m, n).unwrap();
            let i = seed % array.count();
            let state = array.get(i).unwrap();
            prop_assert_eq!(state.n(), n);
            prop_assert_eq!(array.find(&state).unwrap(), Some(i));
        }

        #[test]
        fn advance_matches_index(m in 1_usize..6, n in 0_usize..6, seed in any::<u64>()) {
            let array = FSArray::new(m, n).unwrap();
            let i = seed % array.count();
            let k = (seed / 7) % (array.count() - i);
            let advanced = array.get(i).unwrap().advanced(k).unwrap();
            prop_assert_eq!(advanced, array.get(i + k).unwrap());
        }
    }
}
