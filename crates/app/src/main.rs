//! semcom-sim: how well do three codings survive a noisy binary channel?
//!
//! Loads (or generates) a corpus of sentences with their knowledge-graph
//! triples, builds the shared codecs once, then sweeps the channel flip
//! probability. At each point every sample goes through the fixed-width,
//! Huffman and semantic-symbol strategies.
//!
//! # Usage
//!
//! ```bash
//! # Generated corpus, default sweep
//! cargo run --release -p semcom-sim
//!
//! # Own corpus, custom sweep, JSON output
//! cargo run --release -p semcom-sim -- --corpus webnlg.json --probs 0,0.05,0.1 --json
//! ```
//!
//! Logging goes to stderr and follows `RUST_LOG` (default `info`).

mod config;
mod corpus;
mod sweep;

use anyhow::{ensure, Context, Result};
use clap::Parser;
use semcom_sim_core::metrics::SweepPoint;
use semcom_sim_core::verbalize::LinearizingVerbalizer;
use semcom_sim_core::{BinarySymmetricChannel, ChannelConfig, RepetitionCode, Sample, SimulationContext};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::{Args, Config};
use crate::sweep::SweepPlan;

/// Everything `--json` prints.
#[derive(Serialize)]
struct Report<'a> {
    config: &'a Config,
    codebook_size: usize,
    codeword_width: usize,
    huffman_symbols: usize,
    points: &'a [SweepPoint],
}

fn main() {
    init_logging();

    let config = match Config::from_args(Args::parse()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e:#}");
            eprintln!("Run with --help for usage information");
            std::process::exit(1);
        }
    };

    if let Err(e) = run(&config) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // Keep an already-installed subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}

fn run(config: &Config) -> Result<()> {
    if config.print_config {
        config.print();
    }

    let samples = load_samples(config)?;
    let ctx = SimulationContext::from_samples(&samples, config.fixed_width, config.huffman)
        .context("building codecs from corpus")?;
    info!(
        codebook = ctx.codebook().len(),
        codeword_width = ctx.codebook().width(),
        huffman_symbols = ctx.huffman().code().table().len(),
        "codecs ready"
    );

    let plan = SweepPlan {
        probabilities: config.probabilities.clone(),
        repetition: RepetitionCode::new(config.repetition)?,
        trials: config.trials,
        seed: config.seed,
        accounting: config.fixed_width_accounting(),
    };
    let points = sweep::run_sweep(&ctx, &samples, &plan)?;

    if config.json {
        let report = Report {
            config,
            codebook_size: ctx.codebook().len(),
            codeword_width: ctx.codebook().width(),
            huffman_symbols: ctx.huffman().code().table().len(),
            points: &points,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    for point in &points {
        point.print_summary();
    }
    print_example(&ctx, &samples, &plan)?;
    Ok(())
}

fn load_samples(config: &Config) -> Result<Vec<Sample>> {
    let mut samples = match &config.corpus {
        Some(path) => corpus::load_corpus(path)?,
        None => corpus::generate_corpus(config.seed, config.samples),
    };

    if config.align {
        let before: usize = samples.iter().map(|s| s.triples.len()).sum();
        samples.iter_mut().for_each(corpus::align_sample);
        let after: usize = samples.iter().map(|s| s.triples.len()).sum();
        if after < before {
            warn!(dropped = before - after, "alignment removed triples not mentioned in text");
        }
    }

    ensure!(
        samples.iter().any(|s| !s.triples.is_empty()),
        "corpus has no triples to build a knowledge graph from"
    );
    Ok(samples)
}

/// Show what the first sample looks like after the noisiest point.
fn print_example(ctx: &SimulationContext, samples: &[Sample], plan: &SweepPlan) -> Result<()> {
    let Some(sample) = samples.first() else {
        return Ok(());
    };
    let Some(p) = plan.probabilities.iter().copied().reduce(f64::max) else {
        return Ok(());
    };
    let mut channel = BinarySymmetricChannel::new(ChannelConfig::new(p, plan.seed)?)?;
    let rec = ctx.reconstruct_sample(sample, plan.repetition, &mut channel)?;

    println!("\n=== Example at p = {p:.3} ===");
    println!("original:    {}", sample.text);
    println!("fixed-width: {}", rec.fixed_width.text);
    println!("huffman:     {}", rec.huffman.text);
    println!("semantic:    {}", rec.semantic.verbalize(&LinearizingVerbalizer));
    Ok(())
}
