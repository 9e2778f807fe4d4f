#![allow(dead_code, non_snake_case, non_upper_case_globals)]

//! Enumeration of multi-mode photon-occupation (Fock) states and computation
//! of matrix permanents, for simulating boson sampling.
//!
//! - [`FockState`]: a single occupation vector, with optional per-photon
//!   labels.
//! - [`FSArray`]: the canonical numbering of all states with `m` modes and `n`
//!   photons, optionally filtered by an [`FSMask`], computed without storing
//!   the states.
//! - [`FSMap`]: dense numbering of the one-photon transitions between an
//!   `n`-photon array and an `n - 1`-photon array.
//! - [`permanent`]: Ryser, Glynn, and shared-sweep sub-permanent kernels over
//!   `i64`, `f64`, and `Complex64` matrices.

pub mod error;
pub mod config;
pub(crate) mod combinatorics;
pub mod annotation;
pub mod fockstate;
pub mod mask;
pub mod fsarray;
pub mod snapshot;
pub mod fsmap;
pub mod permanent;

pub use error::{ FockError, FockResult };
pub use config::Config;
pub use annotation::Annotation;
pub use fockstate::{ FockState, SharedFockState };
pub use mask::FSMask;
pub use fsarray::FSArray;
pub use fsmap::FSMap;
