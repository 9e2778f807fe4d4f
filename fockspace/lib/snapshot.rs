//! Binary snapshots of [`FSArray`]s.
//!
//! A snapshot is an 8-byte header followed by one record per state:
//! ```text
//! bytes 0..3   b"FSA"
//! byte  3      0
//! byte  4      format version (ASCII digit)
//! byte  5      0
//! byte  6      m
//! byte  7      n
//! bytes 8..    count records of n bytes each, in canonical order
//! ```
//! A record lists the mode of every photon in ascending order, with mode `k`
//! written as the byte `b'A' + k`. With this encoding, records in canonical
//! state order are also in ascending byte order.

use std::{
    fs,
    io::{ BufReader, BufWriter, Read, Write },
    path::{ Path, PathBuf },
};
use tracing::debug;
use crate::{
    config::SnapshotAlphabet,
    error::{ FockError, FockResult },
    fsarray::FSArray,
};

pub const MAGIC: &[u8; 3] = b"FSA";
pub const VERSION: u8 = b'6';
pub const HEADER_LEN: usize = 8;

/// File name used when a snapshot path is a directory.
pub fn layer_file_name(m: usize, n: usize) -> String {
    format!("layer-m{m}-n{n}.fsa")
}

/// Resolve a directory to the layer file inside it; other paths are returned
/// as-is.
pub fn resolve_path(path: &Path, m: usize, n: usize) -> PathBuf {
    if path.is_dir() {
        path.join(layer_file_name(m, n))
    } else {
        path.to_path_buf()
    }
}

/// Append the record of an occupation vector to `buf`.
pub(crate) fn encode_into(occ: &[usize], buf: &mut Vec<u8>) {
    occ.iter().enumerate()
        .for_each(|(k, v)| { buf.extend(std::iter::repeat(b'A' + k as u8).take(*v)); });
}

/// Occupation vector of a record over `m` modes.
pub(crate) fn decode(record: &[u8], m: usize) -> FockResult<Vec<usize>> {
    let mut occ: Vec<usize> = vec![0; m];
    for b in record.iter() {
        let k = b.checked_sub(b'A').map(usize::from)
            .filter(|k| *k < m)
            .ok_or_else(|| FockError::format(
                format!("invalid mode byte {b:#04x} for {m} modes")))?;
        occ[k] += 1;
    }
    Ok(occ)
}

/// Write an array to `path` and return the path written.
pub fn save(array: &FSArray, path: &Path, alphabet: SnapshotAlphabet)
    -> FockResult<PathBuf>
{
    let (m, n) = (array.m(), array.n());
    if m > alphabet.max_modes() {
        return Err(FockError::format(format!(
            "{m} modes cannot be encoded with the {alphabet:?} alphabet \
            (at most {})",
            alphabet.max_modes(),
        )));
    }
    let n_byte = u8::try_from(n)
        .map_err(|_| FockError::format(
            format!("photon count {n} does not fit in a snapshot header")))?;
    let path = resolve_path(path, m, n);
    debug!(path = %path.display(), m, n, count = array.count(), "saving snapshot");
    let mut out = BufWriter::new(fs::File::create(&path)?);
    out.write_all(MAGIC)?;
    out.write_all(&[0, VERSION, 0, m as u8, n_byte])?;
    let mut record: Vec<u8> = Vec::with_capacity(n);
    for state in array.iter() {
        record.clear();
        encode_into(state.occupations().unwrap_or(&[]), &mut record);
        out.write_all(&record)?;
    }
    out.flush()?;
    Ok(path)
}

/// Read the records of a snapshot, checking its header against `(m, n)`.
pub fn load(path: &Path, m: usize, n: usize) -> FockResult<Vec<u8>> {
    let path = resolve_path(path, m, n);
    debug!(path = %path.display(), m, n, "loading snapshot");
    let mut input = BufReader::new(fs::File::open(&path)?);
    let mut header = [0_u8; HEADER_LEN];
    input.read_exact(&mut header)
        .map_err(|_| FockError::format("truncated snapshot header"))?;
    if &header[0..3] != MAGIC || header[3] != 0 || header[5] != 0 {
        return Err(FockError::format("not an FSA snapshot"));
    }
    if !header[4].is_ascii_digit() {
        return Err(FockError::format(
            format!("invalid snapshot version byte {:#04x}", header[4])));
    }
    let (m_file, n_file) = (header[6] as usize, header[7] as usize);
    let max_modes = SnapshotAlphabet::Extended.max_modes();
    if m_file > max_modes {
        return Err(FockError::format(format!(
            "snapshot declares {m_file} modes; records can encode at most \
            {max_modes}"
        )));
    }
    if (m_file, n_file) != (m, n) {
        return Err(FockError::Consistency(format!(
            "snapshot holds (m, n) = ({m_file}, {n_file}), \
            expected ({m}, {n})"
        )));
    }
    let mut records: Vec<u8> = Vec::new();
    input.read_to_end(&mut records)?;
    validate(&records, m, n)?;
    Ok(records)
}

fn validate(records: &[u8], m: usize, n: usize) -> FockResult<()> {
    if n == 0 {
        return if records.is_empty() {
            Ok(())
        } else {
            Err(FockError::format("unexpected payload for zero photons"))
        };
    }
    if records.is_empty() || records.len() % n != 0 {
        return Err(FockError::format(format!(
            "payload of {} bytes is not a whole number of {n}-byte records",
            records.len(),
        )));
    }
    let valid = b'A' as usize..b'A' as usize + m;
    if let Some(b) = records.iter().find(|b| !valid.contains(&(**b as usize))) {
        return Err(FockError::format(
            format!("invalid mode byte {b:#04x} for {m} modes")));
    }
    let chunks: Vec<&[u8]> = records.chunks_exact(n).collect();
    if chunks.iter().any(|r| r.windows(2).any(|w| w[0] > w[1])) {
        return Err(FockError::format("snapshot record is not sorted"));
    }
    if chunks.windows(2).any(|w| w[0] >= w[1]) {
        return Err(FockError::format("snapshot records are out of order"));
    }
    Ok(())
}
