use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Context;
use bench_common::{
    lognormal_keys, read_keys, read_workload, run_workload, uniform_keys, write_keys,
    write_results, write_workload, zipf_workload, Measurement, DEFAULT_TABLE_SIZE,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use last_mile_search::{BinarySearch, Search};
use log::{debug, info};
use rand::Rng;
use rmi_engine::prelude::*;
use strum_macros::AsRefStr;

#[derive(Parser)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a SOSD key file
    Keys(KeysArgs),
    /// Generate a Zipf query workload over a key file
    Workload(WorkloadArgs),
    /// Benchmark binary search against the index variants
    Run(RunArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, AsRefStr, Default)]
pub enum KeyDistribution {
    #[default]
    Uniform,
    Lognormal,
}

#[derive(Args, Debug)]
pub struct KeysArgs {
    #[arg(long, help = "Output key file.")]
    pub output: PathBuf,

    #[arg(long, help = "Number of keys.", default_value_t = 1_000_000)]
    pub size: usize,

    #[arg(long, help = "Key distribution.", default_value = "uniform")]
    pub distribution: KeyDistribution,

    #[arg(long, help = "Log-normal shape parameter.", default_value_t = 2.0)]
    pub sigma: f64,

    #[arg(long, help = "Log-normal scale factor.", default_value_t = 1e9)]
    pub scale: f64,
}

#[derive(Args, Debug)]
pub struct WorkloadArgs {
    #[arg(long, help = "Key file to sample queries from.")]
    pub keys: PathBuf,

    #[arg(long, help = "Output workload file.")]
    pub output: PathBuf,

    #[arg(long, help = "Number of queries.", default_value_t = 100_000)]
    pub size: usize,

    #[arg(long, help = "Zipf exponent.", default_value_t = 1.1)]
    pub alpha: f64,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    #[arg(long, help = "Key file.")]
    pub keys: PathBuf,

    #[arg(long, help = "Workload used to weight the models and pick hot keys.")]
    pub train: Option<PathBuf>,

    #[arg(
        long,
        help = "Workload to time. Defaults to the training workload, then to every key."
    )]
    pub workload: Option<PathBuf>,

    #[arg(long, help = "JSON index configuration.")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Number of leaf models, overrides the configuration.")]
    pub leaves: Option<usize>,

    #[arg(long, help = "Hot-key table size, overrides the configuration.")]
    pub table_size: Option<usize>,

    #[arg(long, help = "Timed passes over the workload.", default_value_t = 5)]
    pub passes: usize,

    #[arg(long, help = "CSV results file.", default_value = "results/benchmark_result.csv")]
    pub results: PathBuf,
}

fn generate_keys(args: &KeysArgs) -> anyhow::Result<()> {
    let mut rng = rand::thread_rng();
    let keys = match args.distribution {
        KeyDistribution::Uniform => uniform_keys(args.size, &mut rng),
        KeyDistribution::Lognormal => lognormal_keys(args.size, args.sigma, args.scale, &mut rng)?,
    };

    write_keys(&args.output, &keys)?;
    info!(
        "wrote {} {} keys to {}",
        keys.len(),
        args.distribution.as_ref(),
        args.output.display()
    );
    Ok(())
}

fn generate_workload(args: &WorkloadArgs) -> anyhow::Result<()> {
    let keys = read_keys(&args.keys)?;
    let workload = zipf_workload(&keys, args.size, args.alpha, &mut rand::thread_rng())?;

    write_workload(&args.output, &workload)?;
    info!(
        "wrote {} queries (alpha {}) to {}",
        workload.len(),
        args.alpha,
        args.output.display()
    );
    Ok(())
}

fn load_config(args: &RunArgs) -> anyhow::Result<RmiConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            serde_json::from_str(&json)
                .with_context(|| format!("invalid configuration in {}", path.display()))?
        }
        None => RmiConfig::default(),
    };

    if let Some(leaves) = args.leaves {
        config.num_leaf_models = leaves;
    }
    if let Some(table_size) = args.table_size {
        config.table_size = table_size;
    }
    config.validate()?;

    Ok(config)
}

fn timed<T>(build: impl FnOnce() -> T) -> (T, Duration) {
    let start = Instant::now();
    let built = build();
    (built, start.elapsed())
}

fn run(args: &RunArgs) -> anyhow::Result<()> {
    let config = load_config(args)?;

    let keys = read_keys(&args.keys)?;
    let train = args.train.as_deref().map(read_workload).transpose()?;
    let workload = match (&args.workload, &train) {
        (Some(path), _) => read_workload(path)?,
        (None, Some(train)) => train.clone(),
        (None, None) => keys.clone(),
    };
    let train = train.unwrap_or_else(|| workload.clone());

    let mut rng = rand::thread_rng();
    let records: Vec<(u64, u64)> = keys
        .iter()
        .map(|&key| (key, rng.gen_range(0..1_000_000)))
        .collect();

    info!(
        "{} records, {} training queries, {} timed queries, {:?}",
        records.len(),
        train.len(),
        workload.len(),
        config
    );

    let mut measurements: Vec<Measurement> = Vec::new();

    // Binary search over the sorted records
    let mut sorted = records.clone();
    sorted.sort_by_key(|&(key, _)| key);
    let sorted_keys: Vec<u64> = sorted.iter().map(|&(key, _)| key).collect();
    measurements.push(run_workload(
        "binary search",
        Duration::ZERO,
        &workload,
        args.passes,
        |key| {
            let pos = BinarySearch::lower_bound(&sorted_keys, &key);
            (sorted_keys.get(pos) == Some(&key)).then(|| sorted[pos].1)
        },
    ));

    let plain = RmiConfig {
        weighting: Weighting::Uniform,
        table_size: 0,
        ..config.clone()
    };
    let (index, build_time) =
        timed(|| RecursiveModelIndex::build_from_workload(records.clone(), &[], &plain));
    let index = index?;
    info!("plain index: {}", serde_json::to_string(&index.stats())?);
    measurements.push(run_workload(
        "linear model",
        build_time,
        &workload,
        args.passes,
        |key| index.get_value(key).copied(),
    ));
    drop(index);

    let weighted = RmiConfig {
        weighting: Weighting::Workload,
        table_size: 0,
        ..config.clone()
    };
    let (index, build_time) =
        timed(|| RecursiveModelIndex::build_from_workload(records.clone(), &train, &weighted));
    let index = index?;
    info!("weighted index: {}", serde_json::to_string(&index.stats())?);
    measurements.push(run_workload(
        "weighted linear model",
        build_time,
        &workload,
        args.passes,
        |key| index.get_value(key).copied(),
    ));
    drop(index);

    let table_size = match config.table_size {
        0 => DEFAULT_TABLE_SIZE,
        n => n,
    };
    let lookup_table = RmiConfig {
        table_size,
        ..config.clone()
    };
    let (index, build_time) =
        timed(|| RecursiveModelIndex::build_from_workload(records.clone(), &train, &lookup_table));
    let index = index?;
    info!("lookup table index: {}", serde_json::to_string(&index.stats())?);
    measurements.push(run_workload(
        "lookup table linear model",
        build_time,
        &workload,
        args.passes,
        |key| index.get_value(key).copied(),
    ));

    let mut probes = LookupStats::default();
    for &key in &workload {
        probes.record(&index.lookup(key));
    }
    info!("lookup table model probes: {:?}", probes);

    for m in &measurements {
        println!(
            "{:<26} build {:>12}  workload {:>12}  {:>9.1} ± {:<6.1} ns/query  proof of work {}",
            m.model,
            humantime::format_duration(m.build_time).to_string(),
            humantime::format_duration(m.workload_time).to_string(),
            m.per_query.mean(),
            m.per_query.error(),
            m.proof_of_work
        );
    }

    debug!("{}", serde_json::to_string(&measurements)?);
    write_results(&args.results, &measurements)?;
    info!("results written to {}", args.results.display());

    Ok(())
}

fn main() -> anyhow::Result<()> {
    log_init::init();

    let cli = Cli::parse();
    match &cli.command {
        Commands::Keys(args) => generate_keys(args),
        Commands::Workload(args) => generate_workload(args),
        Commands::Run(args) => run(args),
    }
}
