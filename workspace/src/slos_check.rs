#![allow(dead_code, non_snake_case, non_upper_case_globals)]

//! Compare output amplitudes of a linear-optical circuit computed layer by
//! layer (SLOS) with those computed from permanents of submatrices.
//!
//! Usage: `slos_check [m] [photons] [config.toml]`

use std::path::PathBuf;
use anyhow::{ bail, Context };
use itertools::Itertools;
use ndarray as nd;
use num_complex::Complex64 as C64;
use tracing::{ debug, info };
use tracing_subscriber::{ fmt, prelude::*, EnvFilter };
use fockspace::{
    Config,
    FSArray,
    FSMap,
    FockState,
    permanent::permanent_with,
};

fn init_logging() {
    let filter
        = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .init();
}

// discrete Fourier transform on m modes
fn fourier(m: usize) -> nd::Array2<C64> {
    let norm = (m as f64).sqrt().recip();
    nd::Array2::from_shape_fn((m, m), |(j, k)| {
        C64::from_polar(norm, std::f64::consts::TAU * (j * k) as f64 / m as f64)
    })
}

// u restricted to the rows of `output` and columns of `input`, with repeats
fn submatrix(u: &nd::Array2<C64>, output: &FockState, input: &FockState)
    -> nd::Array2<C64>
{
    let rows: Vec<usize>
        = output.iter().enumerate()
        .flat_map(|(k, v)| std::iter::repeat(k).take(v))
        .collect();
    let cols: Vec<usize>
        = input.iter().enumerate()
        .flat_map(|(k, v)| std::iter::repeat(k).take(v))
        .collect();
    u.select(nd::Axis(0), &rows).select(nd::Axis(1), &cols)
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let args: Vec<String> = std::env::args().collect();
    let m: usize = args.get(1).map(|s| s.parse()).transpose()?.unwrap_or(6);
    let photons: usize = args.get(2).map(|s| s.parse()).transpose()?.unwrap_or(3);
    let config = Config::load(args.get(3).map(PathBuf::from).as_deref())?;
    if photons == 0 || photons > m {
        bail!("need 0 < photons <= m, got photons = {photons}, m = {m}");
    }
    let u = fourier(m);
    let input = FockState::new(
        (0..m).map(|k| usize::from(k < photons)).collect());
    info!(%input, permanent = ?config.permanent, "propagating");

    // SLOS: one layer per input photon
    let layers: Vec<FSArray>
        = (0..=photons)
        .map(|n| FSArray::new(m, n))
        .collect::<Result<_, _>>()?;
    let mut coefs: Vec<C64> = vec![C64::new(1.0, 0.0)];
    // input photons occupy modes 0..photons, one each
    for n in 1..=photons {
        let mk = n - 1;
        let map = FSMap::new(&layers[n], &layers[n - 1])?;
        coefs = map.compute_slos_layer(u.view(), mk, &coefs)
            .with_context(|| format!("layer {n}"))?;
        debug!(n, states = coefs.len(), "layer done");
    }
    let output_layer = &layers[photons];
    output_layer.norm_coefs(&mut coefs)?;

    // permanents, one output state at a time
    let mut max_err: f64 = 0.0;
    let mut total_prob: f64 = 0.0;
    for (state, slos) in output_layer.iter().zip(coefs.iter()) {
        let sub = submatrix(&u, &state, &input);
        let perm = permanent_with(&sub, &config.permanent)?;
        let amp = perm / (state.prodnfact() as f64).sqrt();
        max_err = max_err.max((amp - slos).norm());
        total_prob += slos.norm_sqr();
    }
    let top: Vec<String>
        = output_layer.iter().zip(coefs.iter())
        .sorted_by(|(_, a), (_, b)| b.norm_sqr().total_cmp(&a.norm_sqr()))
        .take(5)
        .map(|(s, a)| format!("{s}: {:.6}", a.norm_sqr()))
        .collect();
    println!("states: {}", output_layer.count());
    println!("total probability: {total_prob:.12}");
    println!("max |SLOS - permanent|: {max_err:.3e}");
    println!("most likely outputs:\n  {}", top.join("\n  "));
    Ok(())
}
