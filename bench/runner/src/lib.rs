use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{anyhow, bail, Context};
use average::{Estimate, MeanWithError};
use rand::seq::SliceRandom;
use rand::Rng;
use rand_distr::{Distribution, LogNormal, Uniform, Zipf};
use serde::Serialize;

pub const RESULTS_HEADER: &str = "model,workload time,build time,proof of work";

/// Table size used by the lookup-table model when the configuration leaves
/// the table disabled.
pub const DEFAULT_TABLE_SIZE: usize = 5;

fn decode_u64s(bytes: &[u8]) -> Vec<u64> {
    bytes
        .chunks_exact(8)
        .map(|chunk| {
            let mut buf = [0u8; 8];
            buf.copy_from_slice(chunk);
            u64::from_le_bytes(buf)
        })
        .collect()
}

fn encode_u64s(out: &mut impl Write, values: &[u64]) -> std::io::Result<()> {
    for value in values {
        out.write_all(&value.to_le_bytes())?;
    }
    Ok(())
}

/// Reads a SOSD key file: a little-endian `u64` count followed by that many
/// little-endian `u64` keys. Keys are returned sorted.
pub fn read_keys(path: &Path) -> anyhow::Result<Vec<u64>> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("failed to read keys from {}", path.display()))?;
    if bytes.len() < 8 {
        bail!("{} is missing its count header", path.display());
    }

    let (header, body) = bytes.split_at(8);
    let count = decode_u64s(header)[0] as usize;
    let mut keys = decode_u64s(body);
    if keys.len() < count {
        bail!(
            "{} announces {} keys but holds only {}",
            path.display(),
            count,
            keys.len()
        );
    }
    keys.truncate(count);
    keys.sort_unstable();

    Ok(keys)
}

pub fn write_keys(path: &Path, keys: &[u64]) -> anyhow::Result<()> {
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut out = BufWriter::new(file);
    out.write_all(&(keys.len() as u64).to_le_bytes())?;
    encode_u64s(&mut out, keys)?;
    out.flush()?;
    Ok(())
}

/// Reads a workload file of raw little-endian `u64` keys, without a header.
pub fn read_workload(path: &Path) -> anyhow::Result<Vec<u64>> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("failed to read workload from {}", path.display()))?;
    if bytes.len() % 8 != 0 {
        bail!("{} is not a whole number of u64 keys", path.display());
    }
    Ok(decode_u64s(&bytes))
}

pub fn write_workload(path: &Path, workload: &[u64]) -> anyhow::Result<()> {
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut out = BufWriter::new(file);
    encode_u64s(&mut out, workload)?;
    out.flush()?;
    Ok(())
}

/// Sorted keys drawn uniformly from the whole `u64` range.
pub fn uniform_keys(num: usize, rng: &mut impl Rng) -> Vec<u64> {
    let dist = Uniform::new_inclusive(u64::MIN, u64::MAX);
    let mut keys: Vec<u64> = dist.sample_iter(rng).take(num).collect();
    keys.sort_unstable();
    keys
}

/// Sorted, heavily clustered keys, `scale * LogNormal(0, sigma)`.
pub fn lognormal_keys(
    num: usize,
    sigma: f64,
    scale: f64,
    rng: &mut impl Rng,
) -> anyhow::Result<Vec<u64>> {
    let dist = LogNormal::new(0.0, sigma).map_err(|e| anyhow!("invalid sigma {sigma}: {e:?}"))?;
    // `as` saturates at u64::MAX
    let mut keys: Vec<u64> = dist
        .sample_iter(rng)
        .take(num)
        .map(|x: f64| (x * scale) as u64)
        .collect();
    keys.sort_unstable();
    Ok(keys)
}

/// Samples `size` queries over the distinct `keys`. Keys are ranked by how
/// often they occur (ties in random order) and the key of rank `r` is drawn
/// with probability proportional to `1 / r^alpha`. `keys` need not be sorted.
pub fn zipf_workload(
    keys: &[u64],
    size: usize,
    alpha: f64,
    rng: &mut impl Rng,
) -> anyhow::Result<Vec<u64>> {
    let mut sorted = keys.to_vec();
    sorted.sort_unstable();

    let mut counts: Vec<(u64, u64)> = Vec::new();
    for key in sorted {
        match counts.last_mut() {
            Some((last, count)) if *last == key => *count += 1,
            _ => counts.push((key, 1)),
        }
    }
    if counts.is_empty() {
        bail!("cannot generate a workload over an empty key set");
    }

    counts.shuffle(rng);
    counts.sort_by(|a, b| b.1.cmp(&a.1));

    let dist = Zipf::new(counts.len() as u64, alpha)
        .map_err(|e| anyhow!("invalid zipf parameters: {e:?}"))?;

    Ok((0..size)
        .map(|_| {
            let rank = dist.sample(rng) as usize;
            counts[rank.clamp(1, counts.len()) - 1].0
        })
        .collect())
}

/// Outcome of building one index and running the query workload against it.
#[derive(Debug, Serialize)]
pub struct Measurement {
    pub model: String,
    pub workload_time: Duration,
    pub build_time: Duration,
    /// Wrapping sum of every value found, keeping the queries observable
    pub proof_of_work: u64,

    /// Nanoseconds per query over the repeated workload passes
    #[serde(skip)]
    pub per_query: MeanWithError,
}

impl Measurement {
    pub fn csv_row(&self) -> String {
        format!(
            "{},{},{},{}",
            self.model,
            self.workload_time.as_secs_f64(),
            self.build_time.as_secs_f64(),
            self.proof_of_work
        )
    }
}

/// Runs `queries` through `get` `passes` times. The workload time and proof
/// of work are those of the first pass.
pub fn run_workload(
    model: impl Into<String>,
    build_time: Duration,
    queries: &[u64],
    passes: usize,
    mut get: impl FnMut(u64) -> Option<u64>,
) -> Measurement {
    let mut per_query = MeanWithError::new();
    let mut first = None;

    for _ in 0..passes.max(1) {
        let start = Instant::now();
        let mut sum = 0u64;
        for &key in queries {
            if let Some(value) = get(std::hint::black_box(key)) {
                sum = sum.wrapping_add(value);
            }
        }
        let elapsed = start.elapsed();

        if !queries.is_empty() {
            per_query.add(elapsed.as_nanos() as f64 / queries.len() as f64);
        }
        first.get_or_insert((elapsed, std::hint::black_box(sum)));
    }

    let (workload_time, proof_of_work) = first.unwrap_or_default();
    Measurement {
        model: model.into(),
        workload_time,
        build_time,
        proof_of_work,
        per_query,
    }
}

pub fn write_results(path: &Path, measurements: &[Measurement]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut out = BufWriter::new(file);
    writeln!(out, "{RESULTS_HEADER}")?;
    for measurement in measurements {
        writeln!(out, "{}", measurement.csv_row())?;
    }
    out.flush()?;
    Ok(())
}
