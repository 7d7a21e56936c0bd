use std::fs;
use std::path::{ Path, PathBuf };

use serde::{ Serialize, Deserialize };

use crate::error::{ Error, Result };


/// Hyperparameters and paths of a training run.
///
/// Missing fields in a config file fall back to the defaults below.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrainConfig {
  pub epochs: usize,
  pub batch_size: usize,
  pub sample_interval: usize,
  pub latent_dim: usize,
  pub learning_rate: f32,
  pub beta1: f32,
  pub data_dir: PathBuf,
  pub output_dir: PathBuf,
  pub seed: Option<u64>,
}

impl Default for TrainConfig {
  fn default() -> Self {
    Self {
      epochs: 30000,
      batch_size: 32,
      sample_interval: 200,
      latent_dim: 100,
      learning_rate: 0.0002,
      beta1: 0.5,
      data_dir: PathBuf::from("data"),
      output_dir: PathBuf::from("images"),
      seed: None,
    }
  }
}

impl TrainConfig {
  /// Load a JSON config file and validate it.

  pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
    let json = fs::read_to_string(path)?;
    let config: Self = serde_json::from_str(&json)?;
    config.validate()?;
    Ok(config)
  }

  pub fn validate(&self) -> Result<()> {
    let positive = [
      ("batch_size", self.batch_size),
      ("sample_interval", self.sample_interval),
      ("latent_dim", self.latent_dim),
    ];
    if let Some((name, _)) = positive.iter().find(|(_, value)| *value == 0 ) {
      return Err(Error::InvalidConfig(format!("{name} must be positive")))
    }
    if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
      return Err(Error::InvalidConfig(format!("learning_rate must be positive, got {}", self.learning_rate)))
    }
    if !(0.0..1.0).contains(&self.beta1) {
      return Err(Error::InvalidConfig(format!("beta1 must lie in [0, 1), got {}", self.beta1)))
    }
    Ok(())
  }
}


#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Write;

  #[test]
  fn defaults_are_valid() {
    let config = TrainConfig::default();
    assert_eq!(config.epochs, 30000);
    assert_eq!(config.batch_size, 32);
    assert_eq!(config.sample_interval, 200);
    assert_eq!(config.latent_dim, 100);
    assert!(config.validate().is_ok());
  }

  #[test]
  fn rejects_zero_sizes() {
    let config = TrainConfig { batch_size: 0, ..Default::default() };
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("batch_size"));
    let config = TrainConfig { sample_interval: 0, ..Default::default() };
    assert!(config.validate().is_err());
    let config = TrainConfig { beta1: 1.0, ..Default::default() };
    assert!(config.validate().is_err());
  }

  #[test]
  fn partial_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{ "epochs": 10, "output_dir": "out" }}"#).unwrap();
    let config = TrainConfig::from_file(file.path()).unwrap();
    assert_eq!(config.epochs, 10);
    assert_eq!(config.output_dir, PathBuf::from("out"));
    assert_eq!(config.batch_size, 32);
  }

  #[test]
  fn invalid_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{ "batch_size": 0 }}"#).unwrap();
    assert!(matches!(TrainConfig::from_file(file.path()), Err(Error::InvalidConfig(_))));
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{ "epochs": "many" }}"#).unwrap();
    assert!(matches!(TrainConfig::from_file(file.path()), Err(Error::Json(_))));
  }
}
