//! Configuration for the semcom-sim application.
//!
//! Settings come from three layers, later ones winning:
//! built-in defaults, an optional TOML file (`--config`), then CLI flags.
//!
//! # Philosophy
//!
//! The tool should work with ZERO arguments: a fixed default seed drives
//! a generated sample corpus, so a bare run is fully reproducible.
//! `--print-config` shows the resolved values.

use anyhow::{ensure, Context, Result};
use clap::Parser;
use semcom_sim_core::codec::{DEFAULT_FALLBACK_WIDTH, DEFAULT_FIXED_WIDTH};
use semcom_sim_core::metrics::BitAccounting;
use semcom_sim_core::HuffmanConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_SEED: u64 = 42;
pub const DEFAULT_REPETITION: usize = 3;
pub const DEFAULT_PROBABILITIES: [f64; 7] = [0.0, 0.01, 0.05, 0.1, 0.2, 0.3, 0.5];
pub const DEFAULT_TRIALS: usize = 1;
pub const DEFAULT_SAMPLES: usize = 200;

#[derive(Parser, Debug, Default)]
#[command(name = "semcom-sim")]
#[command(about = "Compare fixed-width, Huffman and semantic-symbol coding over a noisy binary channel")]
pub struct Args {
    /// JSON corpus of {text, triples} samples (default: generate one)
    #[arg(long)]
    pub corpus: Option<PathBuf>,

    /// TOML file with the same settings; flags override it
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Random seed for the channel and the generated corpus
    #[arg(long)]
    pub seed: Option<u64>,

    /// Repetition factor (1 disables redundancy)
    #[arg(long)]
    pub rep: Option<usize>,

    /// Flip probabilities to sweep (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub probs: Option<Vec<f64>>,

    /// Bits per character for the fixed-width baseline
    #[arg(long)]
    pub fixed_width: Option<usize>,

    /// Bits for characters missing from the Huffman table
    #[arg(long)]
    pub fallback_width: Option<usize>,

    /// Report fixed-width size as 8 bits per UTF-8 byte
    #[arg(long)]
    pub utf8_bytes: bool,

    /// Passes over the corpus per flip probability
    #[arg(long)]
    pub trials: Option<usize>,

    /// Samples in the generated corpus
    #[arg(long)]
    pub samples: Option<usize>,

    /// Keep only triples whose head and tail occur in the sample text
    #[arg(long)]
    pub align: bool,

    /// Emit results as JSON instead of tables
    #[arg(long)]
    pub json: bool,

    /// Print the resolved configuration before running
    #[arg(long)]
    pub print_config: bool,
}

/// Settings accepted from a TOML file. Every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub corpus: Option<PathBuf>,
    pub seed: Option<u64>,
    pub repetition: Option<usize>,
    pub probabilities: Option<Vec<f64>>,
    pub fixed_width: Option<usize>,
    pub fallback_width: Option<usize>,
    pub utf8_bytes: Option<bool>,
    pub trials: Option<usize>,
    pub samples: Option<usize>,
    pub align: Option<bool>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("parsing config {}", path.display()))
    }
}

/// Complete configuration for a sweep.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Config {
    /// Corpus path (None = generate sample)
    pub corpus: Option<PathBuf>,
    pub seed: u64,
    pub repetition: usize,
    pub probabilities: Vec<f64>,
    pub fixed_width: usize,
    pub huffman: HuffmanConfig,
    pub utf8_bytes: bool,
    pub trials: usize,
    /// Generated corpus size; ignored with `corpus`
    pub samples: usize,
    pub align: bool,

    #[serde(skip)]
    pub json: bool,
    #[serde(skip)]
    pub print_config: bool,
}

impl Config {
    /// Resolve defaults, the optional TOML file and CLI flags.
    pub fn from_args(args: Args) -> Result<Self> {
        let file = match &args.config {
            Some(path) => FileConfig::from_file(path)?,
            None => FileConfig::default(),
        };
        Self::merge(args, file)
    }

    fn merge(args: Args, file: FileConfig) -> Result<Self> {
        let config = Config {
            corpus: args.corpus.or(file.corpus),
            seed: args.seed.or(file.seed).unwrap_or(DEFAULT_SEED),
            repetition: args.rep.or(file.repetition).unwrap_or(DEFAULT_REPETITION),
            probabilities: args
                .probs
                .or(file.probabilities)
                .unwrap_or_else(|| DEFAULT_PROBABILITIES.to_vec()),
            fixed_width: args.fixed_width.or(file.fixed_width).unwrap_or(DEFAULT_FIXED_WIDTH),
            huffman: HuffmanConfig {
                fallback_width: args
                    .fallback_width
                    .or(file.fallback_width)
                    .unwrap_or(DEFAULT_FALLBACK_WIDTH),
            },
            utf8_bytes: args.utf8_bytes || file.utf8_bytes.unwrap_or(false),
            trials: args.trials.or(file.trials).unwrap_or(DEFAULT_TRIALS),
            samples: args.samples.or(file.samples).unwrap_or(DEFAULT_SAMPLES),
            align: args.align || file.align.unwrap_or(false),
            json: args.json,
            print_config: args.print_config,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        ensure!(self.repetition >= 1, "repetition factor must be at least 1");
        ensure!(self.trials >= 1, "trials must be at least 1");
        ensure!(!self.probabilities.is_empty(), "no flip probabilities to sweep");
        if let Some(p) = self.probabilities.iter().find(|p| !(0.0..=1.0).contains(*p)) {
            anyhow::bail!("flip probability {p} is outside [0, 1]");
        }
        Ok(())
    }

    pub fn fixed_width_accounting(&self) -> BitAccounting {
        if self.utf8_bytes {
            BitAccounting::Utf8Bytes
        } else {
            BitAccounting::Codeword
        }
    }

    /// Print the configuration in human-readable form.
    pub fn print(&self) {
        println!("=== Configuration ===");
        match &self.corpus {
            Some(path) => println!("Corpus: {}", path.display()),
            None => println!("Corpus: (generate {} samples)", self.samples),
        }
        println!("Seed: {}", self.seed);
        println!("Align triples to text: {}", self.align);
        println!();
        println!("=== Coding ===");
        println!("Fixed width: {} bits/char", self.fixed_width);
        if self.utf8_bytes {
            println!("Fixed-width size reported as UTF-8 bytes");
        }
        println!("Huffman fallback width: {} bits", self.huffman.fallback_width);
        println!("Repetition: x{}", self.repetition);
        println!();
        println!("=== Sweep ===");
        let probs: Vec<String> = self.probabilities.iter().map(|p| format!("{p}")).collect();
        println!("Flip probabilities: {}", probs.join(", "));
        println!("Trials per point: {}", self.trials);
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_with_no_arguments() {
        let config = Config::merge(Args::default(), FileConfig::default()).unwrap();
        assert_eq!(config.seed, DEFAULT_SEED);
        assert_eq!(config.repetition, 3);
        assert_eq!(config.fixed_width, 7);
        assert_eq!(config.huffman.fallback_width, 8);
        assert_eq!(config.probabilities, DEFAULT_PROBABILITIES.to_vec());
        assert!(config.corpus.is_none());
        assert_eq!(config.fixed_width_accounting(), BitAccounting::Codeword);
    }

    #[test]
    fn test_utf8_bytes_from_file_or_flag() {
        let file: FileConfig = toml::from_str("utf8_bytes = true").unwrap();
        let config = Config::merge(Args::default(), file).unwrap();
        assert_eq!(config.fixed_width_accounting(), BitAccounting::Utf8Bytes);

        let args = Args::parse_from(["semcom-sim", "--utf8-bytes"]);
        let config = Config::merge(args, FileConfig::default()).unwrap();
        assert!(config.utf8_bytes);
    }

    #[test]
    fn test_cli_overrides_file() {
        let file: FileConfig = toml::from_str(
            r#"
            seed = 7
            repetition = 5
            probabilities = [0.1, 0.2]
            align = true
            "#,
        )
        .unwrap();
        let args = Args::parse_from(["semcom-sim", "--rep", "1", "--probs", "0,0.4"]);
        let config = Config::merge(args, file).unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.repetition, 1);
        assert_eq!(config.probabilities, vec![0.0, 0.4]);
        assert!(config.align);
    }

    #[test]
    fn test_unknown_file_key_rejected() {
        assert!(toml::from_str::<FileConfig>("flip = 0.1").is_err());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let args = Args::parse_from(["semcom-sim", "--probs", "0.1,1.5"]);
        assert!(Config::merge(args, FileConfig::default()).is_err());

        let args = Args::parse_from(["semcom-sim", "--rep", "0"]);
        assert!(Config::merge(args, FileConfig::default()).is_err());
    }
}
