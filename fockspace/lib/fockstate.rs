//! Multi-mode photon-occupation states.
//!
//! A [`FockState`] is an ordered list of `m` occupation numbers plus optional
//! per-photon labels. States can also be *undefined*: stepping past the end of
//! an enumeration with [`FockState::advance`] or parsing `"|,,>"` gives a state
//! that still knows its mode count but has no occupations. Undefined states
//! render as empty slots and refuse every arithmetic operation.

use std::{
    any::Any,
    cell::{ Ref, RefCell, RefMut },
    collections::BTreeMap,
    fmt,
    hash::{ Hash, Hasher },
    ops::{ Add, Mul },
    rc::Rc,
    str::FromStr,
};
use itertools::Itertools;
use crate::{
    annotation::Annotation,
    combinatorics::Region,
    error::{ FockError, FockResult },
};

/* FockState ******************************************************************/

/// Occupation numbers over `m` modes with optional per-photon labels.
///
/// Equality and hashing consider only the mode count and the occupations;
/// labels are carried along but never compared.
#[derive(Clone, Debug)]
pub struct FockState {
    m: usize,
    occupation: Option<Vec<usize>>,
    // mode -> one label per photon in that mode
    annotations: BTreeMap<usize, Vec<String>>,
}

impl Default for FockState {
    fn default() -> Self { Self::vacuum(0) }
}

impl FockState {
    /// All-zero state over `m` modes.
    pub fn vacuum(m: usize) -> Self {
        Self { m, occupation: Some(vec![0; m]), annotations: BTreeMap::new() }
    }

    pub fn new(occupation: Vec<usize>) -> Self {
        Self {
            m: occupation.len(),
            occupation: Some(occupation),
            annotations: BTreeMap::new(),
        }
    }

    /// Undefined state over `m` modes.
    pub fn undefined(m: usize) -> Self {
        Self { m, occupation: None, annotations: BTreeMap::new() }
    }

    /// Parse the textual representation; see [`FromStr`].
    pub fn parse(s: &str) -> FockResult<Self> { s.parse() }

    pub fn m(&self) -> usize { self.m }

    /// Total photon number; zero for an undefined state.
    pub fn n(&self) -> usize {
        self.occupation.as_ref().map(|occ| occ.iter().sum()).unwrap_or(0)
    }

    pub fn is_defined(&self) -> bool { self.occupation.is_some() }

    /// Return the occupation numbers, or `None` for an undefined state.
    pub fn occupations(&self) -> Option<&[usize]> {
        self.occupation.as_deref()
    }

    /// Iterate over occupation numbers; empty for an undefined state.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.occupation.iter().flat_map(|occ| occ.iter().copied())
    }

    fn defined(&self) -> FockResult<&[usize]> {
        self.occupation.as_deref()
            .ok_or_else(|| FockError::range("operation on an undefined state"))
    }

    fn norm_index(&self, i: isize) -> FockResult<usize> {
        let m = self.m as isize;
        let j = if i < 0 { i + m } else { i };
        (0..m).contains(&j)
            .then_some(j as usize)
            .ok_or_else(|| FockError::range(
                format!("mode index {i} out of range for {} modes", self.m)))
    }

    /// Occupation of mode `i`, where negative indices count from the end.
    pub fn get(&self, i: isize) -> FockResult<usize> {
        let k = self.norm_index(i)?;
        Ok(self.defined()?[k])
    }

    /// Product of the factorials of the occupations, saturating at
    /// `u64::MAX`.
    pub fn prodnfact(&self) -> u64 {
        self.iter()
            .flat_map(|v| 2..=v as u64)
            .fold(1_u64, |acc, f| acc.saturating_mul(f))
    }

    /// Mode holding the `k`-th photon, counting photons in ascending mode
    /// order.
    pub fn photon_mode(&self, k: usize) -> FockResult<usize> {
        let occ = self.defined()?;
        let mut seen: usize = 0;
        for (mode, v) in occ.iter().enumerate() {
            seen += v;
            if k < seen { return Ok(mode); }
        }
        Err(FockError::range(
            format!("photon index {k} out of range for {seen} photons")))
    }

    /// Index of the first photon in `mode`, or `None` if the mode is empty.
    pub fn first_photon(&self, mode: usize) -> FockResult<Option<usize>> {
        let occ = self.defined()?;
        if mode >= self.m {
            return Err(FockError::range(
                format!("mode index {mode} out of range for {} modes", self.m)));
        }
        Ok((occ[mode] > 0).then(|| occ[..mode].iter().sum()))
    }

    /// Element-wise sum of two states. Labels are not carried over.
    pub fn try_add(&self, other: &Self) -> FockResult<Self> {
        if self.m != other.m {
            return Err(FockError::dimension(format!(
                "cannot add states of {} and {} modes", self.m, other.m)));
        }
        let occupation: Vec<usize>
            = self.defined()?.iter()
            .zip(other.defined()?)
            .map(|(a, b)| a + b)
            .collect();
        Ok(Self::new(occupation))
    }

    /// In-place form of [`Self::try_add`]. Labels are cleared.
    pub fn add_assign_state(&mut self, other: &Self) -> FockResult<()> {
        *self = self.try_add(other)?;
        Ok(())
    }

    /// The state `k` steps further along the canonical enumeration of all
    /// states with the same `(m, n)`, or an undefined state if that runs past
    /// the end.
    pub fn advanced(&self, k: u64) -> FockResult<Self> {
        let occ = self.defined()?;
        let region = Region::full(self.m, self.n())?;
        let next
            = region.rank(occ)
            .and_then(|r| r.checked_add(k))
            .and_then(|r| region.unrank(r));
        Ok(next.map(Self::new).unwrap_or_else(|| Self::undefined(self.m)))
    }

    /// In-place form of [`Self::advanced`].
    pub fn advance(&mut self, k: u64) -> FockResult<()> {
        *self = self.advanced(k)?;
        Ok(())
    }

    /// Concatenate the modes of two states.
    pub fn tensor(&self, other: &Self) -> FockResult<Self> {
        let occupation: Vec<usize>
            = self.defined()?.iter()
            .chain(other.defined()?)
            .copied()
            .collect();
        let mut annotations = self.annotations.clone();
        annotations.extend(
            other.annotations.iter()
                .map(|(mode, labels)| (mode + self.m, labels.clone()))
        );
        Ok(Self { m: self.m + other.m, occupation: Some(occupation), annotations })
    }

    /// Compare with a value of any type; never equal to a non-`FockState`.
    pub fn eq_any(&self, other: &dyn Any) -> bool {
        other.downcast_ref::<Self>().is_some_and(|o| self == o)
    }

    /// Select modes with Python slice semantics.
    ///
    /// Labels on selected modes are kept.
    pub fn slice(&self, start: Option<isize>, stop: Option<isize>, step: isize)
        -> FockResult<Self>
    {
        let occ = self.defined()?;
        let idx = slice_indices(self.m, start, stop, step)?;
        let occupation: Vec<usize> = idx.iter().map(|k| occ[*k]).collect();
        let annotations: BTreeMap<usize, Vec<String>>
            = idx.iter().enumerate()
            .filter_map(|(j, k)| {
                self.annotations.get(k).map(|labels| (j, labels.clone()))
            })
            .collect();
        Ok(Self { m: idx.len(), occupation: Some(occupation), annotations })
    }

    /// Overwrite the modes selected by a slice with the occupations of
    /// `other`, which must have exactly as many modes as the slice.
    pub fn set_slice(
        &mut self,
        start: Option<isize>,
        stop: Option<isize>,
        step: isize,
        other: &Self,
    ) -> FockResult<()>
    {
        let src = other.defined()?;
        self.defined()?;
        let idx = slice_indices(self.m, start, stop, step)?;
        if idx.len() != other.m {
            return Err(FockError::dimension(format!(
                "cannot assign {} modes to a slice of length {}",
                other.m, idx.len(),
            )));
        }
        if let Some(occ) = self.occupation.as_mut() {
            for (j, k) in idx.iter().enumerate() {
                occ[*k] = src[j];
                match other.annotations.get(&j) {
                    Some(labels) => {
                        self.annotations.insert(*k, labels.clone());
                    },
                    None => { self.annotations.remove(k); },
                }
            }
        }
        Ok(())
    }

    /// Per-photon labels of a mode; empty if there are none. Unlabelled
    /// photons of a partly labelled mode show up as empty strings.
    pub fn mode_annotations(&self, mode: usize) -> &[String] {
        self.annotations.get(&mode).map(|l| l.as_slice()).unwrap_or(&[])
    }

    /// Replace the labels of a mode. An empty list, or one holding only empty
    /// strings, removes them.
    pub fn set_mode_annotations(&mut self, mode: usize, labels: Vec<String>)
        -> FockResult<()>
    {
        let occ = self.defined()?;
        if mode >= self.m {
            return Err(FockError::range(
                format!("mode index {mode} out of range for {} modes", self.m)));
        }
        if labels.iter().all(|l| l.trim().is_empty()) {
            self.annotations.remove(&mode);
            return Ok(());
        }
        if labels.len() != occ[mode] {
            return Err(FockError::dimension(format!(
                "{} labels given for {} photons in mode {mode}",
                labels.len(), occ[mode],
            )));
        }
        let labels: Vec<String>
            = labels.iter().map(|l| canonical_label(l)).collect();
        self.annotations.insert(mode, labels);
        Ok(())
    }

    pub fn clear_annotations(&mut self) { self.annotations.clear(); }

    pub fn has_annotations(&self) -> bool { !self.annotations.is_empty() }

    /// Label of the `k`-th photon, if it has one.
    pub fn photon_annotation(&self, k: usize) -> Option<&str> {
        let mode = self.photon_mode(k).ok()?;
        let first = self.first_photon(mode).ok()??;
        self.annotations.get(&mode)
            .and_then(|labels| labels.get(k - first))
            .filter(|l| !l.is_empty())
            .map(|l| l.as_str())
    }

    /// Return `true` if any photon carries a polarization label.
    pub fn has_polarization(&self) -> bool {
        self.annotations.values()
            .flatten()
            .any(|l| {
                l.parse::<Annotation>()
                    .map(|a| a.is_polarization())
                    .unwrap_or(false)
            })
    }
}

// Python's slice.indices, materialized
fn slice_indices(
    len: usize,
    start: Option<isize>,
    stop: Option<isize>,
    step: isize,
) -> FockResult<Vec<usize>>
{
    if step == 0 {
        return Err(FockError::range("slice step cannot be zero"));
    }
    let len = len as isize;
    let clip = |v: isize, lo: isize, hi: isize| -> isize {
        let v = if v < 0 { v + len } else { v };
        v.clamp(lo, hi)
    };
    let idx: Vec<usize>
        = if step > 0 {
            let a = start.map(|s| clip(s, 0, len)).unwrap_or(0);
            let b = stop.map(|s| clip(s, 0, len)).unwrap_or(len);
            (a..b).step_by(step as usize).map(|k| k as usize).collect()
        } else {
            let a = start.map(|s| clip(s, -1, len - 1)).unwrap_or(len - 1);
            let b = stop.map(|s| clip(s, -1, len - 1)).unwrap_or(-1);
            (b + 1..=a).rev().step_by(step.unsigned_abs())
                .map(|k| k as usize)
                .collect()
        };
    Ok(idx)
}

impl PartialEq for FockState {
    fn eq(&self, other: &Self) -> bool {
        self.m == other.m && self.occupation == other.occupation
    }
}

impl Eq for FockState { }

impl Hash for FockState {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.m.hash(state);
        self.occupation.hash(state);
    }
}

impl From<Vec<usize>> for FockState {
    fn from(occupation: Vec<usize>) -> Self { Self::new(occupation) }
}

impl From<&[usize]> for FockState {
    fn from(occupation: &[usize]) -> Self { Self::new(occupation.to_vec()) }
}

impl Add<&FockState> for &FockState {
    type Output = FockResult<FockState>;

    fn add(self, rhs: &FockState) -> Self::Output { self.try_add(rhs) }
}

impl Add<u64> for &FockState {
    type Output = FockResult<FockState>;

    fn add(self, k: u64) -> Self::Output { self.advanced(k) }
}

impl Mul<&FockState> for &FockState {
    type Output = FockResult<FockState>;

    fn mul(self, rhs: &FockState) -> Self::Output { self.tensor(rhs) }
}

impl fmt::Display for FockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "|")?;
        match &self.occupation {
            None => {
                write!(f, "{}", ",".repeat(self.m.saturating_sub(1)))?;
            },
            Some(occ) => {
                for (k, v) in occ.iter().enumerate() {
                    if k > 0 { write!(f, ",")?; }
                    write_mode(f, *v, self.annotations.get(&k))?;
                }
            },
        }
        write!(f, ">")
    }
}

// labelled photons grouped by label in order of first appearance, then the
// count of unlabelled ones
fn write_mode(f: &mut fmt::Formatter<'_>, v: usize, labels: Option<&Vec<String>>)
    -> fmt::Result
{
    let Some(labels) = labels.filter(|l| l.iter().any(|s| !s.is_empty()))
        else { return write!(f, "{v}"); };
    for l in labels.iter().filter(|l| !l.is_empty()).unique() {
        let c = labels.iter().filter(|x| *x == l).count();
        if c > 1 { write!(f, "{c}")?; }
        write!(f, "{{{l}}}")?;
    }
    let bare = labels.iter().filter(|l| l.is_empty()).count();
    if bare > 0 { write!(f, "{bare}")?; }
    Ok(())
}

/* parsing ********************************************************************/

// `key:value` labels are rewritten in canonical form; anything else is kept
// verbatim
fn canonical_label(label: &str) -> String {
    let label = label.trim();
    label.parse::<Annotation>()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| label.to_string())
}

fn closer_for(opener: char) -> &'static [char] {
    match opener {
        '|' => &['>', '〉'],
        '[' => &[']'],
        '(' => &[')'],
        _ => &[],
    }
}

// split on commas outside of {...} blocks
fn split_fields(inner: &str) -> FockResult<Vec<&str>> {
    let mut fields: Vec<&str> = Vec::new();
    let mut depth: usize = 0;
    let mut last: usize = 0;
    for (i, c) in inner.char_indices() {
        match c {
            '{' if depth == 0 => { depth = 1; },
            '{' => { return Err(FockError::format("nested '{' in label")); },
            '}' if depth == 1 => { depth = 0; },
            '}' => { return Err(FockError::format("unmatched '}'")); },
            ',' if depth == 0 => {
                fields.push(&inner[last..i]);
                last = i + 1;
            },
            _ => { },
        }
    }
    if depth != 0 {
        return Err(FockError::format("unterminated label"));
    }
    fields.push(&inner[last..]);
    Ok(fields)
}

// a run of items, each "<digits>" (unlabelled photons), "<digits>{label}"
// (that many photons sharing a label), or "{label}" (one photon)
fn parse_field(field: &str) -> FockResult<(usize, Vec<String>)> {
    let field = field.trim();
    if field.is_empty() {
        return Err(FockError::format("empty occupation in a defined state"));
    }
    let mut items: Vec<(usize, String)> = Vec::new();
    let mut rest = field;
    while !rest.is_empty() {
        let split = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        let (digits, after) = rest.split_at(split);
        let count: Option<usize>
            = (!digits.is_empty())
            .then(|| digits.parse::<usize>())
            .transpose()
            .map_err(|_| FockError::format(
                format!("invalid occupation number in '{field}'")))?;
        let tail = after.trim_start();
        match (count, tail.strip_prefix('{')) {
            (count, Some(body)) => {
                let end
                    = body.find('}')
                    .ok_or_else(|| FockError::format(
                        format!("unterminated label in '{field}'")))?;
                let count = count.unwrap_or(1);
                if count == 0 {
                    return Err(FockError::format(
                        format!("label attached to zero photons in '{field}'")));
                }
                items.push((count, canonical_label(&body[..end])));
                rest = body[end + 1..].trim_start();
            },
            (Some(count), None) if tail.len() == after.len() => {
                items.push((count, String::new()));
                rest = tail;
            },
            _ => {
                return Err(FockError::format(
                    format!("unexpected characters in '{field}'")));
            },
        }
    }
    let v: usize
        = items.iter()
        .try_fold(0_usize, |acc, (c, _)| acc.checked_add(*c))
        .ok_or_else(|| FockError::range(
            format!("occupation overflow in '{field}'")))?;
    let labels: Vec<String>
        = if items.iter().all(|(_, l)| l.is_empty()) {
            Vec::new()
        } else {
            items.into_iter()
                .flat_map(|(c, l)| std::iter::repeat(l).take(c))
                .collect()
        };
    Ok((v, labels))
}

impl FromStr for FockState {
    type Err = FockError;

    /// Parse `|v1,v2,...>`, `[v1,v2,...]`, or `(v1,v2,...)`.
    ///
    /// A slot is a run of items: `3` is three unlabelled photons, `2{P:H}`
    /// two photons labelled `P:H`, and `{P:V}` a single labelled photon, so
    /// `|{P:H}1,{P:V}>` holds two photons in mode 0. `key:value` labels are
    /// normalized, e.g. `{P:(0,0)}` reads as `{P:H}`, and an empty `{}` is an
    /// unlabelled photon. A state whose slots are all empty, e.g. `|,,>`, is
    /// undefined.
    fn from_str(s: &str) -> FockResult<Self> {
        let s = s.trim();
        let mut chars = s.chars();
        let opener
            = chars.next()
            .ok_or_else(|| FockError::format("empty Fock state string"))?;
        let closer
            = chars.next_back()
            .ok_or_else(|| FockError::format(format!("unterminated state '{s}'")))?;
        if !closer_for(opener).contains(&closer) {
            return Err(FockError::format(
                format!("mismatched or unsupported brackets in '{s}'")));
        }
        let inner = chars.as_str();
        if inner.trim().is_empty() { return Ok(Self::vacuum(0)); }
        let fields = split_fields(inner)?;
        if fields.iter().all(|f| f.trim().is_empty()) {
            return Ok(Self::undefined(fields.len()));
        }
        let mut occupation: Vec<usize> = Vec::with_capacity(fields.len());
        let mut annotations: BTreeMap<usize, Vec<String>> = BTreeMap::new();
        for (k, field) in fields.into_iter().enumerate() {
            let (v, labels) = parse_field(field)?;
            occupation.push(v);
            if !labels.is_empty() { annotations.insert(k, labels); }
        }
        Ok(Self { m: occupation.len(), occupation: Some(occupation), annotations })
    }
}

/* SharedFockState ************************************************************/

/// A shared, mutable handle to a [`FockState`].
///
/// Cloning the handle aliases the underlying state, so mutation through one
/// handle is visible through all of them. Use [`Self::deep_clone`] for an
/// independent copy.
#[derive(Clone, Debug, Default)]
pub struct SharedFockState(Rc<RefCell<FockState>>);

impl SharedFockState {
    pub fn new(state: FockState) -> Self { Self(Rc::new(RefCell::new(state))) }

    pub fn borrow(&self) -> Ref<'_, FockState> { self.0.borrow() }

    pub fn borrow_mut(&self) -> RefMut<'_, FockState> { self.0.borrow_mut() }

    /// Independent copy of the occupations and labels.
    pub fn deep_clone(&self) -> Self { Self::new(self.0.borrow().clone()) }

    /// Return `true` if both handles point to the same state.
    pub fn ptr_eq(&self, other: &Self) -> bool { Rc::ptr_eq(&self.0, &other.0) }
}

impl From<FockState> for SharedFockState {
    fn from(state: FockState) -> Self { Self::new(state) }
}

impl PartialEq for SharedFockState {
    fn eq(&self, other: &Self) -> bool { *self.0.borrow() == *other.0.borrow() }
}

impl fmt::Display for SharedFockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.borrow().fmt(f)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::collections::HashSet;

    fn fs(occ: &[usize]) -> FockState { FockState::from(occ) }

    #[test]
    fn construct() {
        let v = FockState::vacuum(3);
        assert_eq!(v.m(), 3);
        assert_eq!(v.n(), 0);
        assert_eq!(v.to_string(), "|0,0,0>");
        let s = fs(&[0, 1, 2]);
        assert_eq!(s.n(), 3);
        assert_eq!(s.to_string(), "|0,1,2>");
        assert_eq!(FockState::default().m(), 0);
    }

    #[test]
    fn parse_brackets() {
        for text in ["|0,1,2>", "[0,1,2]", "(0,1,2)", "|0,1,2〉", " | 0 , 1 ,2 > "] {
            assert_eq!(FockState::parse(text).unwrap(), fs(&[0, 1, 2]), "{text}");
        }
        for text in ["[0,1,2)", "{0,1,2}", "|0,1,2]", "|0,a,2>", "|0,1,2>x", ""] {
            assert!(
                matches!(FockState::parse(text), Err(FockError::Format(_))),
                "{text} should not parse",
            );
        }
    }

    #[test]
    fn parse_annotations() {
        let s = FockState::parse("|2{P:H},0,1{x}>").unwrap();
        assert_eq!(s, fs(&[2, 0, 1]));
        assert_eq!(s.mode_annotations(0), ["P:H", "P:H"]);
        assert!(s.mode_annotations(1).is_empty());
        assert_eq!(s.to_string(), "|2{P:H},0,{x}>");
        assert!(s.has_polarization());

        let s = FockState::parse("|{a}{b},1>").unwrap();
        assert_eq!(s, fs(&[2, 1]));
        assert_eq!(s.mode_annotations(0), ["a", "b"]);
        assert_eq!(s.to_string(), "|{a}{b},1>");
        assert_eq!(s.photon_annotation(1), Some("b"));
        assert_eq!(s.photon_annotation(2), None);
        assert!(!s.has_polarization());

        let s = FockState::parse("|1{P:(0.3,-0.5)},0>").unwrap();
        assert_eq!(s.mode_annotations(0), ["P:(0.3,-0.5)"]);

        for text in ["|0{a},0>", "|1{a,0>", "|1 2>", "|{a}x>", "|1,,2>"] {
            assert!(
                matches!(FockState::parse(text), Err(FockError::Format(_))),
                "{text} should not parse",
            );
        }

        let mut s = FockState::parse("|{a}{b},1>").unwrap();
        s.clear_annotations();
        assert!(!s.has_annotations());
        assert_eq!(s, fs(&[2, 1]));
    }

    #[test]
    fn labelled_photon_counts() {
        for text in ["|{P:H}>", "|{P:H}{P:V},1>", "|2{_:0.23}>", "|{P:H}1,{P:V}>"] {
            assert_eq!(FockState::parse(text).unwrap().to_string(), text);
        }
        let s = FockState::parse("|{P:H}1,{P:V}>").unwrap();
        assert_eq!(s, fs(&[2, 1]));
        assert_eq!(s.mode_annotations(0), ["P:H", ""]);
        assert_eq!(s.photon_annotation(0), Some("P:H"));
        assert_eq!(s.photon_annotation(1), None);
        assert_eq!(s.photon_annotation(2), Some("P:V"));

        let s = FockState::parse("|1,{A:0}2,0,{x}2{P:V}, 1>").unwrap();
        assert_eq!(s, fs(&[1, 3, 0, 3, 1]));
        assert_eq!(s.mode_annotations(1), ["A:0", "", ""]);
        assert_eq!(s.mode_annotations(3), ["x", "P:V", "P:V"]);
        assert_eq!(s.photon_annotation(6), Some("P:V"));
    }

    #[test]
    fn labels_normalized() {
        let cases = [
            ("|{}{P:D}>", "|{P:D}1>"),
            ("|{P:H}{P:H}>", "|2{P:H}>"),
            ("|{P:(0,0)}{P:H},0>", "|2{P:H},0>"),
            ("|2{P:(0,0)}{P:H},0>", "|3{P:H},0>"),
            ("|{_:1e0}{_:1}>", "|2{_:1}>"),
            ("|{},1>", "|1,1>"),
        ];
        for (text, rendered) in cases {
            assert_eq!(FockState::parse(text).unwrap().to_string(), rendered, "{text}");
        }
        assert!(!FockState::parse("|{},1>").unwrap().has_annotations());
    }

    #[test]
    fn undefined_states() {
        let s = FockState::parse("|,,>").unwrap();
        assert!(!s.is_defined());
        assert_eq!(s.m(), 3);
        assert_eq!(s.to_string(), "|,,>");
        assert!(matches!(s.get(0), Err(FockError::Range(_))));
        assert!(matches!(s.advanced(1), Err(FockError::Range(_))));
        assert!(matches!(s.try_add(&s), Err(FockError::Range(_))));

        let past = FockState::vacuum(2).advanced(1).unwrap();
        assert_eq!(past.to_string(), "|,>");
    }

    #[test]
    fn add_states() {
        let s = &fs(&[0, 1, 0]) + &fs(&[1, 0, 0]);
        assert_eq!(s.unwrap(), fs(&[1, 1, 0]));
        assert!(matches!(
            fs(&[0, 1]).try_add(&fs(&[0, 1, 0])),
            Err(FockError::Dimension(_)),
        ));
        let mut s = FockState::parse("|1{a},0>").unwrap();
        s.add_assign_state(&fs(&[0, 2])).unwrap();
        assert_eq!(s, fs(&[1, 2]));
        assert!(!s.has_annotations());
    }

    #[test]
    fn advance() {
        let expected = [
            [1, 1, 4], [1, 0, 5], [0, 6, 0], [0, 5, 1], [0, 4, 2],
            [0, 3, 3], [0, 2, 4], [0, 1, 5], [0, 0, 6],
        ];
        let mut s = fs(&[1, 2, 3]);
        for e in expected.iter() {
            s.advance(1).unwrap();
            assert_eq!(s, fs(e));
        }
        s.advance(1).unwrap();
        assert!(!s.is_defined());

        assert_eq!((&fs(&[1, 2, 3]) + 3_u64).unwrap(), fs(&[0, 6, 0]));
        assert_eq!(fs(&[6, 0, 0]).advanced(27).unwrap(), fs(&[0, 0, 6]));
    }

    #[test]
    fn equality_and_hash() {
        let a = FockState::parse("|1{x},2>").unwrap();
        let b = fs(&[1, 2]);
        assert_eq!(a, b);
        assert_ne!(b, fs(&[1, 2, 0]));
        assert!(b.eq_any(&a));
        assert!(!b.eq_any(&"|1,2>"));
        assert!(!b.eq_any(&vec![1_usize, 2]));
        let set: HashSet<FockState> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn indexing() {
        let s = fs(&[4, 5, 6]);
        assert_eq!(s.get(0).unwrap(), 4);
        assert_eq!(s.get(-1).unwrap(), 6);
        assert_eq!(s.get(-3).unwrap(), 4);
        assert!(matches!(s.get(3), Err(FockError::Range(_))));
        assert!(matches!(s.get(-4), Err(FockError::Range(_))));
    }

    #[test]
    fn slicing() {
        let s = fs(&[0, 1, 2, 3, 4]);
        assert_eq!(s.slice(Some(1), Some(3), 1).unwrap(), fs(&[1, 2]));
        assert_eq!(s.slice(None, None, 2).unwrap(), fs(&[0, 2, 4]));
        assert_eq!(s.slice(None, None, -1).unwrap(), fs(&[4, 3, 2, 1, 0]));
        assert_eq!(s.slice(Some(-2), None, 1).unwrap(), fs(&[3, 4]));
        assert_eq!(s.slice(Some(3), Some(0), -2).unwrap(), fs(&[3, 1]));
        let empty = s.slice(Some(3), Some(1), 1).unwrap();
        assert_eq!(empty.m(), 0);
        assert_eq!(empty.to_string(), "|>");
        assert!(matches!(s.slice(None, None, 0), Err(FockError::Range(_))));

        let a = FockState::parse("|1{x},2,{y}{z}>").unwrap();
        let b = a.slice(Some(2), None, 1).unwrap();
        assert_eq!(b.mode_annotations(0), ["y", "z"]);
    }

    #[test]
    fn slice_assignment() {
        let mut s = fs(&[0, 1, 2, 3, 4]);
        s.set_slice(Some(1), Some(3), 1, &fs(&[7, 8])).unwrap();
        assert_eq!(s, fs(&[0, 7, 8, 3, 4]));
        s.set_slice(None, None, 2, &fs(&[9, 9, 9])).unwrap();
        assert_eq!(s, fs(&[9, 7, 9, 3, 9]));
        assert!(matches!(
            s.set_slice(Some(0), Some(2), 1, &fs(&[1])),
            Err(FockError::Dimension(_)),
        ));
    }

    #[test]
    fn photons() {
        let s = fs(&[2, 0, 1]);
        assert_eq!(s.prodnfact(), 2);
        assert_eq!(fs(&[3, 4]).prodnfact(), 144);
        assert_eq!(s.photon_mode(0).unwrap(), 0);
        assert_eq!(s.photon_mode(2).unwrap(), 2);
        assert!(s.photon_mode(3).is_err());
        assert_eq!(s.first_photon(1).unwrap(), None);
        assert_eq!(s.first_photon(2).unwrap(), Some(2));
    }

    #[test]
    fn tensor() {
        let a = FockState::parse("|1,0>").unwrap();
        let b = FockState::parse("|2{x}>").unwrap();
        let c = (&a * &b).unwrap();
        assert_eq!(c, fs(&[1, 0, 2]));
        assert_eq!(c.mode_annotations(2), ["x", "x"]);
    }

    #[test]
    fn mode_annotations() {
        let mut s = fs(&[2, 1]);
        s.set_mode_annotations(0, vec!["a".into(), "b".into()]).unwrap();
        assert!(matches!(
            s.set_mode_annotations(1, vec!["a".into(), "b".into()]),
            Err(FockError::Dimension(_)),
        ));
        assert!(matches!(
            s.set_mode_annotations(2, vec!["a".into()]),
            Err(FockError::Range(_)),
        ));
        assert_eq!(s.to_string(), "|{a}{b},1>");
        s.set_mode_annotations(1, vec!["P:(0,0)".into()]).unwrap();
        assert_eq!(s.to_string(), "|{a}{b},{P:H}>");
        s.set_mode_annotations(0, vec![String::new(), String::new()]).unwrap();
        assert_eq!(s.to_string(), "|2,{P:H}>");
    }

    #[test]
    fn shared_aliasing() {
        let a = SharedFockState::new(fs(&[1, 0]));
        let alias = a.clone();
        let copy = a.deep_clone();
        alias.borrow_mut().add_assign_state(&fs(&[0, 1])).unwrap();
        assert_eq!(*a.borrow(), fs(&[1, 1]));
        assert_eq!(*copy.borrow(), fs(&[1, 0]));
        assert!(a.ptr_eq(&alias));
        assert!(!a.ptr_eq(&copy));
    }
}
