#![allow(dead_code, non_snake_case, non_upper_case_globals)]

//! Estimate the storage needed for all SLOS layers of `m` modes, from one
//! photon up to `m - 1`, as the running total of snapshot payloads and
//! transition tables.
//!
//! Usage: `size_scan [m_min] [m_max] [config.toml]`
//!
//! Layers too large for 64-bit indexing end the scan for that `m`.

use std::path::PathBuf;
use anyhow::Context;
use rayon::iter::{ IntoParallelIterator, ParallelIterator };
use tracing::{ info, warn };
use tracing_subscriber::{ fmt, prelude::*, EnvFilter };
use fockspace::{ Config, FSArray, FSMap, FockError };

const kb: f64 = 1024.0;
const Mb: f64 = 1024.0 * kb;
const Gb: f64 = 1024.0 * Mb;
const Tb: f64 = 1024.0 * Gb;

fn format_unit(v: f64) -> String {
    if v > 100.0 * Gb {
        format!("{:.2}Tb", v / Tb)
    } else if v > 100.0 * Mb {
        format!("{:.2}Gb", v / Gb)
    } else if v > 100.0 * kb {
        format!("{:.2}Mb", v / Mb)
    } else {
        format!("{:.2}Kb", v / kb)
    }
}

fn init_logging() {
    let filter
        = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .init();
}

// snapshot payload and transition-table sizes of one layer
fn layer_sizes(m: usize, n: usize) -> Result<(u64, u64), FockError> {
    let array = FSArray::new(m, n)?;
    let map = FSMap::derived(&array)?;
    Ok((array.size(), map.size()))
}

// cumulative sizes for n = 1..m
fn scan(m: usize) -> anyhow::Result<Vec<f64>> {
    let mut transitions: f64 = 0.0;
    let mut values: Vec<f64> = Vec::with_capacity(m);
    for n in 1..m {
        let (payload, table)
            = match layer_sizes(m, n) {
                Ok(sizes) => sizes,
                Err(FockError::Range(msg)) => {
                    warn!(m, n, "stopping scan: {msg}");
                    break;
                },
                Err(err) => {
                    return Err(err).with_context(|| {
                        format!("building layer (m, n) = ({m}, {n})")
                    });
                },
            };
        transitions += table as f64;
        values.push(transitions + payload as f64);
    }
    Ok(values)
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let args: Vec<String> = std::env::args().collect();
    let m_min: usize = args.get(1).map(|s| s.parse()).transpose()?.unwrap_or(50);
    let m_max: usize = args.get(2).map(|s| s.parse()).transpose()?.unwrap_or(m_min);
    let config = Config::load(args.get(3).map(PathBuf::from).as_deref())?;
    if config.permanent.threads > 1 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(config.permanent.threads)
            .build_global()?;
    }
    info!(m_min, m_max, "scanning layer sizes");

    let rows: Vec<(usize, anyhow::Result<Vec<f64>>)>
        = (m_min..=m_max).into_par_iter()
        .map(|m| (m, scan(m)))
        .collect();
    for (m, values) in rows.into_iter() {
        let values = values?;
        let line: Vec<String> = values.into_iter().map(format_unit).collect();
        println!("{} {}", m, line.join(" "));
    }
    Ok(())
}
