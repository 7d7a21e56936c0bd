use std::fmt;

use tracing::{ info, debug };

use crate::{
  config::TrainConfig,
  data::Dataset,
  error::{ Error, Result },
  loss::{ binary_crossentropy, binary_accuracy, boundary_seeking_loss },
  model::{ build_generator, build_discriminator, Combined },
  nn::Sequential,
  optimize::{ Optimizer, Adam },
  sample::sample_images,
  scalar::Real,
  tensor::Tensor,
};


/// Losses and discriminator accuracy of a single training step.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepReport {
  pub d_loss: f64,
  pub accuracy: f64,
  pub g_loss: f64,
}

impl fmt::Display for StepReport {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "[D loss: {:.2}, acc.: {:.2}%] [G loss: {:.2}]", self.d_loss, self.accuracy * 100.0, self.g_loss)
  }
}


/// Boundary-seeking GAN trainer.
///
/// Generator and discriminator share one Adam optimizer, and with it one
/// step counter advanced by every update of either model. Moment estimates
/// are kept per parameter. The generator learns through the [Combined]
/// model, which never hands discriminator parameters to the optimizer.

#[derive(Debug)]
pub struct Bgan<T: Real> {
  pub config: TrainConfig,
  generator: Sequential<T>,
  discriminator: Sequential<T>,
  optimizer: Optimizer<T, Adam<T>>,
}

impl<T: Real> Bgan<T> {
  pub fn new(config: TrainConfig) -> Self {
    let optimizer = Optimizer::new(
      T::from(config.learning_rate).unwrap(),
      Adam::new(T::from(config.beta1).unwrap(), T::from(0.999).unwrap(), T::from(1e-7).unwrap()),
    );
    Self {
      discriminator: build_discriminator(),
      generator: build_generator(config.latent_dim),
      optimizer,
      config,
    }
  }

  pub fn generator(&self) -> &Sequential<T> {
    &self.generator
  }

  pub fn discriminator(&self) -> &Sequential<T> {
    &self.discriminator
  }

  pub fn optimizer(&self) -> &Optimizer<T, Adam<T>> {
    &self.optimizer
  }

  /// One optimizer step of the discriminator on a batch of images.
  /// Returns loss and accuracy as measured before the update.

  pub fn train_discriminator(&mut self, images: &Tensor<T>, targets: &Tensor<T>) -> (T, T) {
    let predictions = self.discriminator.run(&images.tracked(), true);
    let loss = binary_crossentropy(&predictions, targets);
    let accuracy = binary_accuracy(predictions.tensor(), targets);
    let value = loss.item();
    self.optimizer.minimize(&loss, &self.discriminator.parameters());
    (value, accuracy)
  }

  /// One optimizer step of the generator through the frozen discriminator.

  pub fn train_generator(&mut self, noise: &Tensor<T>) -> T {
    let combined = Combined::new(&self.generator, &self.discriminator);
    let loss = boundary_seeking_loss(&combined.run(&noise.tracked()));
    let value = loss.item();
    self.optimizer.minimize(&loss, &combined.trainable_parameters());
    value
  }

  /// Train the discriminator on a random real batch and a generated batch,
  /// then train the generator on the same noise.

  pub fn train_step(&mut self, epoch: usize, dataset: &Dataset<T>) -> Result<StepReport> {
    let batch_size = self.config.batch_size;
    let images = dataset.sample_batch(batch_size);
    let noise = Tensor::randn(&[batch_size, self.config.latent_dim]);
    let generated = self.generator.predict(&noise);

    let valid = Tensor::ones(&[batch_size, 1]);
    let fake = Tensor::zeros(&[batch_size, 1]);
    let (loss_real, acc_real) = self.train_discriminator(&images, &valid);
    let (loss_fake, acc_fake) = self.train_discriminator(&generated, &fake);
    let half = T::from(0.5).unwrap();
    let d_loss = to_f64(half * (loss_real + loss_fake));
    let accuracy = to_f64(half * (acc_real + acc_fake));
    if !d_loss.is_finite() {
      return Err(Error::NonFiniteLoss { epoch, phase: "discriminator" })
    }

    let g_loss = to_f64(self.train_generator(&noise));
    if !g_loss.is_finite() {
      return Err(Error::NonFiniteLoss { epoch, phase: "generator" })
    }

    Ok(StepReport { d_loss, accuracy, g_loss })
  }

  /// Run the configured number of epochs, logging progress and
  /// writing a sample grid every `sample_interval` epochs.

  pub fn train(&mut self, dataset: &Dataset<T>) -> Result<()> {
    info!(
      "Training for {} epochs, batch size {}, {} generator / {} discriminator parameters",
      self.config.epochs,
      self.config.batch_size,
      self.generator.num_parameters(),
      self.discriminator.num_parameters(),
    );
    for epoch in 0..self.config.epochs {
      let report = self.train_step(epoch, dataset)?;
      info!("{epoch} {report}");
      if epoch % self.config.sample_interval == 0 {
        let path = sample_images(&self.generator, self.config.latent_dim, epoch, &self.config.output_dir)?;
        debug!("Epoch {epoch} samples at {}", path.display());
      }
    }
    Ok(())
  }
}

fn to_f64<T: Real>(value: T) -> f64 {
  value.to_f64().unwrap_or(f64::NAN)
}


#[cfg(test)]
mod tests {
  use super::*;
  use crate::internal::manual_seed;

  fn tiny_config() -> TrainConfig {
    TrainConfig {
      batch_size: 2,
      latent_dim: 4,
      ..Default::default()
    }
  }

  fn snapshot(model: &Sequential<f32>) -> Vec<Vec<f32>> {
    model.parameters().iter().map(|p| p.tensor().to_vec() ).collect()
  }

  #[test]
  fn single_step() {
    manual_seed(61);
    let mut bgan = Bgan::<f32>::new(tiny_config());
    let pixels: Vec<u8> = (0..2 * 784).map(|i| (i % 256) as u8 ).collect();
    let real = Dataset::from_pixels(&pixels).images().clone();
    let fake = Tensor::zeros(&[2,28,28,1]);

    let before = snapshot(bgan.discriminator());
    let (loss_real, acc_real) = bgan.train_discriminator(&real, &Tensor::ones(&[2,1]));
    let (loss_fake, acc_fake) = bgan.train_discriminator(&fake, &Tensor::zeros(&[2,1]));
    assert!(loss_real.is_finite() && loss_fake.is_finite());
    assert!((0.0..=1.0).contains(&acc_real) && (0.0..=1.0).contains(&acc_fake));
    assert_ne!(before, snapshot(bgan.discriminator()));

    let g_loss = bgan.train_generator(&Tensor::randn(&[2,4]));
    assert!(g_loss.is_finite() && g_loss >= 0.0);
  }

  #[test]
  fn generator_step_freezes_discriminator() {
    manual_seed(62);
    let mut bgan = Bgan::<f32>::new(tiny_config());
    let d_before = snapshot(bgan.discriminator());
    let g_before = snapshot(bgan.generator());
    bgan.train_generator(&Tensor::randn(&[2,4]));
    assert_eq!(d_before, snapshot(bgan.discriminator()));
    assert_ne!(g_before, snapshot(bgan.generator()));
    // Gradients flowing into the discriminator were discarded
    assert!(bgan.discriminator().parameters().iter()
      .all(|p| p.grad().unwrap().param_iter().all(|g| g == 0.0 )));
  }

  fn saturate(bgan: &Bgan<f32>, bias: f32) {
    let parameters = bgan.discriminator().parameters();
    let output_bias = &parameters[parameters.len() - 1];
    output_bias.tensor().assign(&Tensor::fill(&[1], bias));
  }

  #[test]
  fn saturated_discriminator_stops_generator() {
    manual_seed(64);
    let mut bgan = Bgan::<f32>::new(tiny_config());
    // Sigmoid of the output rounds to exactly 1.0 in f32
    saturate(&bgan, 1000.0);
    let pixels: Vec<u8> = (0..2 * 784).map(|i| (i % 256) as u8 ).collect();
    let result = bgan.train_step(5, &Dataset::from_pixels(&pixels));
    assert!(matches!(result, Err(Error::NonFiniteLoss { epoch: 5, phase: "generator" })), "{result:?}");
  }

  #[test]
  fn nan_discriminator_stops_discriminator() {
    manual_seed(65);
    let mut bgan = Bgan::<f32>::new(tiny_config());
    saturate(&bgan, f32::NAN);
    let pixels: Vec<u8> = (0..2 * 784).map(|i| (i % 256) as u8 ).collect();
    let result = bgan.train_step(0, &Dataset::from_pixels(&pixels));
    assert!(matches!(result, Err(Error::NonFiniteLoss { epoch: 0, phase: "discriminator" })), "{result:?}");
  }

  #[test]
  fn models_share_step_counter() {
    manual_seed(66);
    let mut bgan = Bgan::<f32>::new(tiny_config());
    let pixels: Vec<u8> = (0..2 * 784).map(|i| (i * 3 % 256) as u8 ).collect();
    let dataset = Dataset::from_pixels(&pixels);
    bgan.train_step(0, &dataset).unwrap();
    assert_eq!(bgan.optimizer().steps(), 3);
    bgan.train_step(1, &dataset).unwrap();
    assert_eq!(bgan.optimizer().steps(), 6);
  }

  #[test]
  fn training_loop_writes_samples() {
    manual_seed(63);
    let dir = tempfile::tempdir().unwrap();
    let config = TrainConfig {
      epochs: 3,
      sample_interval: 2,
      output_dir: dir.path().to_path_buf(),
      ..tiny_config()
    };
    let pixels: Vec<u8> = (0..4 * 784).map(|i| (i * 7 % 256) as u8 ).collect();
    let mut bgan = Bgan::<f32>::new(config);
    bgan.train(&Dataset::from_pixels(&pixels)).unwrap();
    assert!(dir.path().join("mnist_0.png").is_file());
    assert!(!dir.path().join("mnist_1.png").exists());
    assert!(dir.path().join("mnist_2.png").is_file());
  }

  #[test]
  fn report_format() {
    let report = StepReport { d_loss: 0.6931, accuracy: 0.5, g_loss: 1.234 };
    assert_eq!(report.to_string(), "[D loss: 0.69, acc.: 50.00%] [G loss: 1.23]");
  }
}
