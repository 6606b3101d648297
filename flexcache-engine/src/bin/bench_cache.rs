//! # Cache Benchmark Harness
//!
//! Purpose: Provide a repeatable benchmark driver for the cache engine so
//! baseline throughput of the three eviction policies can be compared over
//! time.
//!
//! ## Design Principles
//! 1. **Deterministic Workload**: Use a fixed PRNG seed for stable
//!    comparisons between runs.
//! 2. **Allocation Control**: Pre-build keys and values to keep setup costs
//!    off the hot path.
//! 3. **Policy Sweep**: Run the same workload against every policy unless
//!    one is pinned on the command line.

use std::env;
use std::hint::black_box;
use std::time::Instant;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use flexcache_engine::{CacheConfig, EvictionPolicy, FlexCache, FlexResult, Ttl};

const DEFAULT_KEY_COUNT: usize = 1 << 16;
const DEFAULT_OP_COUNT: usize = 1_000_000;
const DEFAULT_VALUE_SIZE: usize = 128;

struct BenchConfig {
    policies: Vec<EvictionPolicy>,
    key_count: usize,
    op_count: usize,
    value_size: usize,
}

impl BenchConfig {
    fn from_args() -> FlexResult<Self> {
        let mut args = env::args().skip(1);

        let policies = match args.next() {
            Some(name) if name == "all" => {
                vec![EvictionPolicy::Lru, EvictionPolicy::Fifo, EvictionPolicy::Random]
            }
            Some(name) => vec![name.parse::<EvictionPolicy>()?],
            None => vec![EvictionPolicy::Lru, EvictionPolicy::Fifo, EvictionPolicy::Random],
        };

        Ok(BenchConfig {
            policies,
            key_count: parse_usize(args.next(), DEFAULT_KEY_COUNT),
            op_count: parse_usize(args.next(), DEFAULT_OP_COUNT),
            value_size: parse_usize(args.next(), DEFAULT_VALUE_SIZE),
        })
    }
}

fn parse_usize(value: Option<String>, fallback: usize) -> usize {
    value.and_then(|raw| raw.parse().ok()).unwrap_or(fallback).max(1)
}

fn build_keys(count: usize) -> Vec<Vec<u8>> {
    (0..count)
        .map(|i| format!("bench:key:{i:016x}").into_bytes())
        .collect()
}

fn report(policy: EvictionPolicy, label: &str, ops: usize, elapsed: std::time::Duration) {
    let secs = elapsed.as_secs_f64();
    let ops_per_sec = (ops as f64) / secs;
    let nanos_per_op = (secs * 1e9) / (ops as f64);
    println!(
        "{policy:>6} {label}: {ops} ops in {secs:.3}s ({ops_per_sec:.0} ops/s, {nanos_per_op:.1} ns/op)"
    );
}

fn run_policy(config: &BenchConfig, policy: EvictionPolicy, keys: &[Vec<u8>]) -> FlexResult<()> {
    let cache: FlexCache<Vec<u8>> = FlexCache::with_config(CacheConfig {
        eviction_policy: policy,
        ..CacheConfig::default()
    });

    let start = Instant::now();
    for key in keys {
        cache.set(key, vec![0u8; config.value_size], Ttl::Never)?;
    }
    report(policy, "SET", keys.len(), start.elapsed());

    let mut rng = SmallRng::seed_from_u64(0x1234_5678_9ABC_DEF0);
    let start = Instant::now();
    for _ in 0..config.op_count {
        let key = &keys[rng.gen_range(0..keys.len())];
        black_box(cache.get(key));
    }
    report(policy, "GET", config.op_count, start.elapsed());

    // Churn: replace a random entry, exercising the delete and insert paths
    // together with the policy bookkeeping.
    let mut rng = SmallRng::seed_from_u64(0x0FED_CBA9_8765_4321);
    let start = Instant::now();
    for _ in 0..config.op_count {
        let key = &keys[rng.gen_range(0..keys.len())];
        cache.delete(key);
        cache.set(key, vec![0u8; config.value_size], Ttl::Never)?;
    }
    report(policy, "CHURN", config.op_count, start.elapsed());

    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    if let Err(err) = run() {
        eprintln!("bench_cache failed: {err}");
        std::process::exit(1);
    }
}

fn run() -> FlexResult<()> {
    let config = BenchConfig::from_args()?;
    let keys = build_keys(config.key_count);

    println!(
        "keys={}, ops={}, value_size={}",
        config.key_count, config.op_count, config.value_size
    );

    for &policy in &config.policies {
        run_policy(&config, policy, &keys)?;
    }

    Ok(())
}
