//! Train a boundary-seeking GAN on MNIST.
//!
//! ```bash
//! # Defaults: 30000 epochs, batch size 32, samples every 200 epochs
//! bgan --data-dir data/ --output-dir images/
//!
//! # JSON config with command line overrides
//! RUST_LOG=debug bgan --config bgan.json --epochs 1000 --seed 42
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use bgan::{ manual_seed, Bgan, Dataset, TrainConfig, Result };


#[derive(Debug, Parser)]
#[command(name = "bgan")]
#[command(about = "Train a boundary-seeking GAN on MNIST", long_about = None)]
struct Cli {
  /// JSON file with training parameters
  #[arg(short, long)]
  config: Option<PathBuf>,

  #[arg(long)]
  epochs: Option<usize>,

  #[arg(long)]
  batch_size: Option<usize>,

  /// Write a sample grid every N epochs
  #[arg(long)]
  sample_interval: Option<usize>,

  #[arg(long)]
  latent_dim: Option<usize>,

  #[arg(long)]
  learning_rate: Option<f32>,

  /// Adam beta1
  #[arg(long)]
  beta1: Option<f32>,

  /// Directory holding the MNIST IDX files
  #[arg(long)]
  data_dir: Option<PathBuf>,

  /// Directory for generated sample images
  #[arg(long)]
  output_dir: Option<PathBuf>,

  #[arg(long)]
  seed: Option<u64>,
}

impl Cli {
  fn config(&self) -> Result<TrainConfig> {
    let mut config = match &self.config {
      Some(path) => TrainConfig::from_file(path)?,
      None => TrainConfig::default(),
    };
    if let Some(epochs) = self.epochs { config.epochs = epochs }
    if let Some(batch_size) = self.batch_size { config.batch_size = batch_size }
    if let Some(interval) = self.sample_interval { config.sample_interval = interval }
    if let Some(latent_dim) = self.latent_dim { config.latent_dim = latent_dim }
    if let Some(rate) = self.learning_rate { config.learning_rate = rate }
    if let Some(beta1) = self.beta1 { config.beta1 = beta1 }
    if let Some(dir) = &self.data_dir { config.data_dir = dir.clone() }
    if let Some(dir) = &self.output_dir { config.output_dir = dir.clone() }
    if self.seed.is_some() { config.seed = self.seed }
    config.validate()?;
    Ok(config)
  }
}

fn run(cli: Cli) -> Result<()> {
  let config = cli.config()?;
  if let Some(seed) = config.seed {
    manual_seed(seed);
  }
  info!("{config:?}");
  let dataset = Dataset::<f32>::load_mnist(&config.data_dir)?;
  let mut bgan = Bgan::new(config);
  bgan.train(&dataset)
}

fn main() -> ExitCode {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_target(false)
    .init();

  match run(Cli::parse()) {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      eprintln!("Error: {e}");
      ExitCode::FAILURE
    }
  }
}
