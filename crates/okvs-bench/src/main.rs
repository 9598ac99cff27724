//! OKVS Bench
//!
//! Encodes random maps with fresh hash keys, checks every decode and reports
//! rate, encode time and the observed failure rate against `2^-λ`.
//!
//! Usage:
//!   cargo run --release --bin okvs-bench -- \
//!     --type h3-two-core-gct --n 4096 --l 128 --trials 100
//!
//!   cargo run --release --bin okvs-bench -- --config okvs.json --parallel

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use okvs::{Okvs, OkvsConfig, OkvsType};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "okvs-bench")]
#[command(about = "Measure OKVS encode/decode and failure rate")]
struct Args {
    /// JSON config; overrides --type, --n and --l
    #[arg(long)]
    config: Option<PathBuf>,

    /// Encoder type (e.g. gbf, mega-bin, h2-dfs-gct, h3-two-core-gct)
    #[arg(long = "type", default_value = "h3-two-core-gct")]
    okvs_type: OkvsType,

    /// Maximum number of keys
    #[arg(long, default_value_t = 1024)]
    n: usize,

    /// Value length in bits
    #[arg(long, default_value_t = 128)]
    l: usize,

    /// Number of encode trials, each with fresh hash keys
    #[arg(long, default_value_t = 10)]
    trials: usize,

    /// Run random fill and per-bin work on rayon
    #[arg(long)]
    parallel: bool,

    /// Seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Write the resolved config (with fresh hash keys) to this path
    #[arg(long)]
    write_config: Option<PathBuf>,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct Summary {
    okvs_type: OkvsType,
    n: usize,
    l: usize,
    m: usize,
    rate: f64,
    trials: usize,
    failures: usize,
    neg_log_failure_probability: usize,
    mean_encode_ms: f64,
    mean_decode_us: f64,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let mut rng = match args.seed {
        Some(seed) => ChaCha20Rng::seed_from_u64(seed),
        None => ChaCha20Rng::from_entropy(),
    };

    let config = resolve_config(&args, &mut rng)?;
    if let Some(path) = &args.write_config {
        config.to_json_file(path)?;
        tracing::info!(path = %path.display(), "Wrote config");
    }

    tracing::info!(
        okvs_type = %config.okvs_type,
        n = config.n,
        l = config.l,
        trials = args.trials,
        parallel = config.parallel,
        "Running OKVS trials"
    );

    let summary = run_trials(&config, args.trials, &mut rng)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }
    tracing::info!(
        m = summary.m,
        rate = summary.rate,
        mean_encode_ms = summary.mean_encode_ms,
        mean_decode_us = summary.mean_decode_us,
        "Done"
    );

    let bound = summary.trials as f64 * 2f64.powi(-(summary.neg_log_failure_probability as i32));
    if summary.failures > 0 {
        tracing::warn!(
            failures = summary.failures,
            trials = summary.trials,
            expected = bound,
            "Encoding failures observed"
        );
    } else {
        tracing::info!(trials = summary.trials, "No encoding failures");
    }

    Ok(())
}

/// Config from file or flags, with fresh hash keys
fn resolve_config(args: &Args, rng: &mut ChaCha20Rng) -> anyhow::Result<OkvsConfig> {
    let config = match &args.config {
        Some(path) => OkvsConfig::from_json_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => OkvsConfig::new(args.okvs_type, args.n, args.l),
    };
    let parallel = config.parallel || args.parallel;
    let config = config.with_random_keys(rng).with_parallel(parallel);
    config.validate()?;
    Ok(config)
}

fn random_map(rng: &mut ChaCha20Rng, n: usize, byte_l: usize) -> HashMap<u64, Vec<u8>> {
    let mut map = HashMap::with_capacity(n);
    while map.len() < n {
        let mut value = vec![0u8; byte_l];
        rng.fill_bytes(&mut value);
        map.insert(rng.next_u64(), value);
    }
    map
}

fn run_trials(config: &OkvsConfig, trials: usize, rng: &mut ChaCha20Rng) -> anyhow::Result<Summary> {
    let pb = ProgressBar::new(trials as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40}] {pos}/{len} trials ({msg})")?,
    );

    let mut failures = 0usize;
    let mut encode_time = Duration::ZERO;
    let mut decode_time = Duration::ZERO;
    let mut encoded = 0usize;
    let mut decoded = 0usize;
    let mut m = 0;
    let mut rate = 0.0;
    let mut neg_log = 0;

    for _ in 0..trials {
        let okvs = config.clone().with_random_keys(rng).build()?;
        m = okvs.m();
        rate = okvs.rate();
        neg_log = okvs.neg_log_failure_probability();

        let map = random_map(rng, config.n, okvs.byte_l());
        let start = Instant::now();
        let storage = match okvs.encode(&map, rng) {
            Ok(storage) => storage,
            Err(e) if e.is_retriable() => {
                failures += 1;
                tracing::debug!(error = %e, "Trial failed");
                pb.set_message(format!("{} failures", failures));
                pb.inc(1);
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        encode_time += start.elapsed();
        encoded += 1;

        let start = Instant::now();
        for (key, value) in &map {
            let got = okvs.decode(&storage, key);
            if &got != value {
                anyhow::bail!(
                    "decode mismatch for key {}: got {}, expected {}",
                    key,
                    hex::encode(&got),
                    hex::encode(value)
                );
            }
        }
        decode_time += start.elapsed();
        decoded += map.len();
        pb.inc(1);
    }
    pb.finish_with_message(format!("{} failures", failures));

    Ok(Summary {
        okvs_type: config.okvs_type,
        n: config.n,
        l: config.l,
        m,
        rate,
        trials,
        failures,
        neg_log_failure_probability: neg_log,
        mean_encode_ms: encode_time.as_secs_f64() * 1e3 / encoded.max(1) as f64,
        mean_decode_us: decode_time.as_secs_f64() * 1e6 / decoded.max(1) as f64,
    })
}
