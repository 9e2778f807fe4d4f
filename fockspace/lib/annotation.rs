//! Structured photon labels of the form `key:value`.
//!
//! Labels attached to photons of a [`FockState`][crate::fockstate::FockState]
//! are free-form strings, but those following the `key:value` convention can
//! be parsed into an [`Annotation`] carrying a complex value. The key `P` is
//! reserved for polarization, whose value may also be given as one of the
//! letters `H`, `V`, `D`, `A`, `L`, `R`.

use std::{ f32::consts::PI, fmt, str::FromStr };
use num_complex::Complex32 as C32;
use once_cell::sync::Lazy;
use regex::Regex;
use crate::error::{ FockError, FockResult };

const FLOAT: &str = r"[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?";

static KEY_VALUE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*):(.*)$")
        .expect("invalid key-value regex")
});

static PAIR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^\(({FLOAT}),({FLOAT})\)$"))
        .expect("invalid pair regex")
});

static COMPLEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^({FLOAT})(?:([ij])|([+-])({FLOAT})[ij])?$"))
        .expect("invalid complex regex")
});

/// Key reserved for polarization annotations.
pub const POLARIZATION: &str = "P";

/// Named polarization states and their `(theta, phi)` angles, stored as
/// `theta + i phi`.
const POLARIZATIONS: [(char, f32, f32); 6] = [
    ('H', 0.0, 0.0),
    ('V', PI, 0.0),
    ('D', PI / 2.0, 0.0),
    ('A', PI / 2.0, PI),
    ('L', PI / 2.0, PI / 2.0),
    ('R', PI / 2.0, 3.0 * PI / 2.0),
];

/// A parsed `key:value` label.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Annotation {
    key: String,
    value: C32,
}

impl Annotation {
    pub fn new(key: &str, value: C32) -> Self {
        Self { key: key.to_string(), value }
    }

    pub fn key(&self) -> &str { &self.key }

    pub fn value(&self) -> C32 { self.value }

    /// Return `true` if the annotation has no key.
    pub fn is_empty(&self) -> bool { self.key.is_empty() }

    pub fn is_polarization(&self) -> bool { self.key == POLARIZATION }

    /// Return the polarization letter matching the value, if any.
    pub fn polarization_letter(&self) -> Option<char> {
        if !self.is_polarization() { return None; }
        POLARIZATIONS.iter()
            .find(|(_, re, im)| self.value == C32::new(*re, *im))
            .map(|(c, _, _)| *c)
    }
}

fn parse_float(s: &str) -> FockResult<f32> {
    s.parse::<f32>()
        .map_err(|_| FockError::format(format!("invalid number '{s}'")))
}

fn parse_value(key: &str, value: &str) -> FockResult<C32> {
    if key == POLARIZATION && value.len() == 1 {
        if let Some(c) = value.chars().next().filter(char::is_ascii_uppercase)
        {
            return POLARIZATIONS.iter()
                .find(|(p, _, _)| *p == c)
                .map(|(_, re, im)| C32::new(*re, *im))
                .ok_or_else(|| FockError::format(
                    format!("unknown polarization '{c}'")));
        }
    }
    if let Some(caps) = PAIR.captures(value) {
        return Ok(C32::new(parse_float(&caps[1])?, parse_float(&caps[2])?));
    }
    if let Some(caps) = COMPLEX.captures(value) {
        let first = parse_float(&caps[1])?;
        if caps.get(2).is_some() {
            return Ok(C32::new(0.0, first));
        }
        if let (Some(sign), Some(im)) = (caps.get(3), caps.get(4)) {
            let im = parse_float(im.as_str())?;
            let im = if sign.as_str() == "-" { -im } else { im };
            return Ok(C32::new(first, im));
        }
        return Ok(C32::new(first, 0.0));
    }
    Err(FockError::format(format!("cannot parse annotation value '{value}'")))
}

impl FromStr for Annotation {
    type Err = FockError;

    fn from_str(s: &str) -> FockResult<Self> {
        if s.is_empty() { return Ok(Self::default()); }
        let caps
            = KEY_VALUE.captures(s)
            .ok_or_else(|| FockError::format(
                format!("invalid annotation '{s}': expected 'key:value'")))?;
        let key = &caps[1];
        let value = parse_value(key, &caps[2])?;
        Ok(Self::new(key, value))
    }
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.key.is_empty() { return Ok(()); }
        write!(f, "{}:", self.key)?;
        if let Some(c) = self.polarization_letter() {
            write!(f, "{c}")
        } else if self.value.im == 0.0 {
            write!(f, "{}", self.value.re)
        } else {
            write!(f, "({},{})", self.value.re, self.value.im)
        }
    }
}
