//! Run-time configuration, read from TOML with environment overrides.
//!
//! ```toml
//! [permanent]
//! algorithm = "ryser"   # or "glynn"
//! threads = 4           # 0 or 1 runs on the calling thread
//!
//! [snapshot]
//! alphabet = "extended" # or "letters"
//! ```
//!
//! Every field is optional. After a file is read, the variables
//! `FOCKSPACE_PERMANENT_ALGORITHM`, `FOCKSPACE_PERMANENT_THREADS`, and
//! `FOCKSPACE_SNAPSHOT_ALPHABET` take precedence over its contents.

use std::{ env, fs, path::Path, str::FromStr };
use serde::Deserialize;
use crate::error::{ FockError, FockResult };

pub const ENV_ALGORITHM: &str = "FOCKSPACE_PERMANENT_ALGORITHM";
pub const ENV_THREADS: &str = "FOCKSPACE_PERMANENT_THREADS";
pub const ENV_ALPHABET: &str = "FOCKSPACE_SNAPSHOT_ALPHABET";

/// Top-level configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub permanent: PermanentConfig,
    pub snapshot: SnapshotConfig,
}

/// Algorithm used by [`permanent_with`][crate::permanent::permanent_with].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    #[default]
    Ryser,
    Glynn,
}

impl FromStr for Algorithm {
    type Err = FockError;

    fn from_str(s: &str) -> FockResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "ryser" => Ok(Self::Ryser),
            "glynn" => Ok(Self::Glynn),
            other => Err(FockError::Config(
                format!("unknown permanent algorithm '{other}'"))),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PermanentConfig {
    pub algorithm: Algorithm,
    /// Number of worker threads; `0` and `1` both mean sequential.
    pub threads: usize,
}

/// Encoding of mode indices in snapshot payloads.
///
/// Mode `k` is always written as the byte `b'A' + k`. `Letters` only allows
/// the 26 upper-case letters; `Extended` continues past `'Z'` through the
/// rest of the byte range, for at most 191 modes.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotAlphabet {
    Letters,
    #[default]
    Extended,
}

impl SnapshotAlphabet {
    /// Largest mode count the alphabet can encode.
    pub fn max_modes(self) -> usize {
        match self {
            Self::Letters => 26,
            Self::Extended => (u8::MAX - b'A') as usize + 1,
        }
    }
}

impl FromStr for SnapshotAlphabet {
    type Err = FockError;

    fn from_str(s: &str) -> FockResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "letters" => Ok(Self::Letters),
            "extended" => Ok(Self::Extended),
            other => Err(FockError::Config(
                format!("unknown snapshot alphabet '{other}'"))),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SnapshotConfig {
    pub alphabet: SnapshotAlphabet,
}

impl Config {
    /// Parse a configuration from TOML text, without environment overrides.
    pub fn from_toml_str(s: &str) -> FockResult<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Read a configuration file (defaults if `None`) and apply environment
    /// overrides.
    pub fn load(path: Option<&Path>) -> FockResult<Self> {
        let mut config
            = match path {
                Some(p) => Self::from_toml_str(&fs::read_to_string(p)?)?,
                None => Self::default(),
            };
        config.apply_overrides(|key| env::var(key).ok())?;
        Ok(config)
    }

    /// Apply overrides from a key lookup, usually the process environment.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> FockResult<()>
    where F: Fn(&str) -> Option<String>
    {
        if let Some(alg) = lookup(ENV_ALGORITHM) {
            self.permanent.algorithm = alg.parse()?;
        }
        if let Some(threads) = lookup(ENV_THREADS) {
            self.permanent.threads
                = threads.trim().parse()
                .map_err(|_| FockError::Config(
                    format!("invalid thread count '{threads}'")))?;
        }
        if let Some(alphabet) = lookup(ENV_ALPHABET) {
            self.snapshot.alphabet = alphabet.parse()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.permanent.algorithm, Algorithm::Ryser);
        assert_eq!(config.snapshot.alphabet, SnapshotAlphabet::Extended);
    }

    #[test]
    fn parse_toml() {
        let config = Config::from_toml_str(r#"
            [permanent]
            algorithm = "glynn"
            threads = 8

            [snapshot]
            alphabet = "letters"
        "#).unwrap();
        assert_eq!(config.permanent.algorithm, Algorithm::Glynn);
        assert_eq!(config.permanent.threads, 8);
        assert_eq!(config.snapshot.alphabet, SnapshotAlphabet::Letters);
        assert!(matches!(
            Config::from_toml_str("[permanent]\nalgorithm = \"laplace\""),
            Err(FockError::Config(_)),
        ));
        assert!(matches!(
            Config::from_toml_str("[plotting]\ndpi = 300"),
            Err(FockError::Config(_)),
        ));
    }

    #[test]
    fn overrides() {
        let mut config = Config::default();
        config.apply_overrides(|key| match key {
            ENV_ALGORITHM => Some("Glynn".into()),
            ENV_THREADS => Some(" 3 ".into()),
            _ => None,
        }).unwrap();
        assert_eq!(config.permanent.algorithm, Algorithm::Glynn);
        assert_eq!(config.permanent.threads, 3);
        assert_eq!(config.snapshot.alphabet, SnapshotAlphabet::Extended);

        let res = config.apply_overrides(|key| {
            (key == ENV_THREADS).then(|| "many".to_string())
        });
        assert!(matches!(res, Err(FockError::Config(_))));
    }

    #[test]
    fn alphabet_limits() {
        assert_eq!(SnapshotAlphabet::Letters.max_modes(), 26);
        assert_eq!(SnapshotAlphabet::Extended.max_modes(), 191);
    }
}
