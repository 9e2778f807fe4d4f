//! Pattern-based filters over Fock states.
//!
//! A mask over `m` modes is a list of patterns, each a string of `m`
//! characters. A digit `d` at position `p` constrains the occupation of mode
//! `p`; any other character is a wildcard, which caps the occupation at the
//! photons left over by the pattern's digits. A state passes the mask if it
//! passes at least one pattern, and a mask with no patterns passes everything.

use crate::{
    combinatorics::Bounds,
    error::{ FockError, FockResult },
    fockstate::FockState,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FSMask {
    m: usize,
    n: usize,
    patterns: Vec<String>,
    // per pattern, per mode: Some(digit) or None for a wildcard
    rules: Vec<Vec<Option<usize>>>,
}

impl FSMask {
    /// Mask without patterns.
    pub fn new(m: usize, n: usize) -> Self {
        Self { m, n, patterns: Vec::new(), rules: Vec::new() }
    }

    /// Create a mask from patterns, each of which must be exactly `m`
    /// characters long.
    pub fn with_patterns<I, S>(m: usize, n: usize, patterns: I)
        -> FockResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut mask = Self::new(m, n);
        for pattern in patterns.into_iter() {
            let pattern = pattern.as_ref();
            let rule: Vec<Option<usize>>
                = pattern.chars()
                .map(|c| c.to_digit(10).map(|d| d as usize))
                .collect();
            if rule.len() != m {
                return Err(FockError::dimension(format!(
                    "mask pattern '{pattern}' has {} characters, expected {m}",
                    rule.len(),
                )));
            }
            mask.patterns.push(pattern.to_string());
            mask.rules.push(rule);
        }
        Ok(mask)
    }

    pub fn m(&self) -> usize { self.m }

    pub fn n(&self) -> usize { self.n }

    pub fn patterns(&self) -> &[String] { &self.patterns }

    /// Return `true` if the mask has no patterns.
    pub fn is_empty(&self) -> bool { self.rules.is_empty() }

    fn digit_sum(rule: &[Option<usize>]) -> usize {
        rule.iter().flatten().sum()
    }

    fn matches_rule(&self, rule: &[Option<usize>], occ: &[usize], allow_missing: bool)
        -> bool
    {
        let cap = self.n as i64 - Self::digit_sum(rule) as i64;
        rule.iter().zip(occ)
            .all(|(r, &v)| match r {
                Some(d) if allow_missing => v <= *d,
                Some(d) => v == *d,
                None => (v as i64) <= cap,
            })
    }

    /// Test a state against the mask.
    ///
    /// With `allow_missing`, a digit is an upper bound on its mode rather than
    /// an exact value. States of another mode count and undefined states never
    /// match.
    pub fn matches(&self, state: &FockState, allow_missing: bool) -> bool {
        let Some(occ) = state.occupations() else { return false; };
        if occ.len() != self.m { return false; }
        self.rules.is_empty()
            || self.rules.iter()
                .any(|rule| self.matches_rule(rule, occ, allow_missing))
    }

    /// The boxes of `n`-photon states matching each pattern exactly, or
    /// `None` if the mask has no patterns.
    pub(crate) fn boxes(&self, n: usize) -> Option<Vec<Bounds>> {
        if self.rules.is_empty() { return None; }
        let boxes: Vec<Bounds>
            = self.rules.iter()
            .filter_map(|rule| {
                let cap = self.n.checked_sub(Self::digit_sum(rule));
                let lo: Vec<usize> = rule.iter().map(|r| r.unwrap_or(0)).collect();
                let hi: Vec<Option<usize>>
                    = rule.iter().map(|r| r.or(cap)).collect();
                // a negative cap leaves wildcard modes with no allowed value
                let hi: Vec<usize> = hi.into_iter().collect::<Option<_>>()?;
                Bounds::new(lo, hi, n)
            })
            .collect();
        Some(boxes)
    }
}
