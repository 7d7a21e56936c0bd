use std::path::PathBuf;

use thiserror::Error;


/// Failures that end a training run.
///
/// Shape mismatches inside the tensor core are programming errors
/// and panic instead.

#[derive(Debug, Error)]
pub enum Error {
  #[error("I/O error: {0}")]
  Io(#[from] std::io::Error),

  #[error("Image error: {0}")]
  Image(#[from] image::ImageError),

  #[error("Config parse error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("Invalid config: {0}")]
  InvalidConfig(String),

  #[error("MNIST file not found: {}", .0.display())]
  MissingDataset(PathBuf),

  #[error("Path is not valid UTF-8: {}", .0.display())]
  InvalidPath(PathBuf),

  #[error("Malformed MNIST file {}: {reason}", path.display())]
  MalformedDataset { path: PathBuf, reason: String },

  #[error("Non-finite {phase} loss in epoch {epoch}")]
  NonFiniteLoss { epoch: usize, phase: &'static str },
}

pub type Result<T> = std::result::Result<T, Error>;
