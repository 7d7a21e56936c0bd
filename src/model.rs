use tracing::debug;

use crate::{
  nn::{ Sequential, Dense, BatchNorm, LeakyReLU, Activation, Flatten, Reshape },
  scalar::Real,
  variable::Variable,
};

/// Dimensions of a single MNIST image: rows, columns, channels.
pub const IMG_SHAPE: [usize; 3] = [28, 28, 1];

const ALPHA: f64 = 0.2;
const MOMENTUM: f64 = 0.8;


fn img_size() -> usize {
  IMG_SHAPE.iter().product()
}

fn leaky<T: Real>() -> LeakyReLU<T> {
  LeakyReLU::new(T::from(ALPHA).unwrap())
}

fn batchnorm<T: Real>(size: usize) -> BatchNorm<T> {
  BatchNorm::new(size, T::from(MOMENTUM).unwrap())
}


/// Map latent vectors `[N, latent_dim]` to images `[N, 28, 28, 1]` in [-1, 1].

pub fn build_generator<T: Real>(latent_dim: usize) -> Sequential<T> {
  let model = Sequential::new("generator", &[latent_dim])
    .with(Dense::new(latent_dim, 256))
    .with(leaky())
    .with(batchnorm(256))
    .with(Dense::new(256, 512))
    .with(leaky())
    .with(batchnorm(512))
    .with(Dense::new(512, 1024))
    .with(leaky())
    .with(batchnorm(1024))
    .with(Dense::new(1024, img_size()))
    .with(Activation::Tanh)
    .with(Reshape::new(&IMG_SHAPE));
  debug!("{}", model.summary());
  model
}


/// Map images `[N, 28, 28, 1]` to validity scores `[N, 1]` in [0, 1].

pub fn build_discriminator<T: Real>() -> Sequential<T> {
  let model = Sequential::new("discriminator", &IMG_SHAPE)
    .with(Flatten)
    .with(Dense::new(img_size(), 512))
    .with(leaky())
    .with(Dense::new(512, 256))
    .with(leaky())
    .with(Dense::new(256, 1))
    .with(Activation::Sigmoid);
  debug!("{}", model.summary());
  model
}


/// Generator stacked onto the discriminator.
///
/// Only the generator's parameters are exposed for training, which
/// keeps the discriminator frozen while the combined model is optimized.

#[derive(Debug, Clone, Copy)]
pub struct Combined<'a, T: Real> {
  pub generator: &'a Sequential<T>,
  pub discriminator: &'a Sequential<T>,
}

impl<'a, T: Real> Combined<'a, T> {
  pub fn new(generator: &'a Sequential<T>, discriminator: &'a Sequential<T>) -> Self {
    Self { generator, discriminator }
  }

  /// Validity of freshly generated images. The generator runs in training mode.

  pub fn run(&self, noise: &Variable<T>) -> Variable<T> {
    let images = self.generator.run(noise, true);
    self.discriminator.run(&images, true)
  }

  pub fn trainable_parameters(&self) -> Vec<Variable<T>> {
    self.generator.parameters()
  }
}


#[cfg(test)]
mod tests {
  use super::*;
  use proptest::prelude::*;
  use crate::{ Tensor, ops::BaseOps, internal::manual_seed };

  #[test]
  fn generator_shapes() {
    manual_seed(31);
    let generator = build_generator::<f32>(100);
    assert_eq!(generator.output_dims(), IMG_SHAPE.to_vec());
    let images = generator.predict(&Tensor::randn(&[3,100]));
    assert_eq!(images.shape().dims, vec![3,28,28,1]);
    // 3 dense + 3 batchnorm layers with two parameter tensors each, plus the output layer
    assert_eq!(generator.parameters().len(), 14);
  }

  #[test]
  fn discriminator_shapes() {
    manual_seed(32);
    let discriminator = build_discriminator::<f32>();
    assert_eq!(discriminator.output_dims(), vec![1]);
    let validity = discriminator.predict(&Tensor::zeros(&[2,28,28,1]));
    assert_eq!(validity.shape().dims, vec![2,1]);
    assert_eq!(discriminator.num_parameters(), 784 * 512 + 512 + 512 * 256 + 256 + 256 + 1);
  }

  #[test]
  fn combined_trains_generator_only() {
    manual_seed(33);
    let generator = build_generator::<f32>(4);
    let discriminator = build_discriminator::<f32>();
    let combined = Combined::new(&generator, &discriminator);
    let ids: Vec<usize> = combined.trainable_parameters().iter().map(|p| p.id() ).collect();
    assert_eq!(ids, generator.parameters().iter().map(|p| p.id() ).collect::<Vec<_>>());
    assert!(discriminator.parameters().iter().all(|p| !ids.contains(&p.id()) ));
    let validity = combined.run(&Tensor::randn(&[2,4]).tracked());
    assert_eq!(validity.shape().dims, vec![2,1]);
  }

  proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn output_ranges(seed in any::<u64>(), scale in 0.1f32..10.0) {
      manual_seed(seed);
      let generator = build_generator::<f32>(8);
      let discriminator = build_discriminator::<f32>();
      let images = generator.predict(&(Tensor::randn(&[2,8]) * scale));
      prop_assert!(images.param_iter().all(|x| (-1.0..=1.0).contains(&x) ));
      let validity = discriminator.predict(&(Tensor::randn(&[2,28,28,1]) * scale));
      prop_assert!(validity.param_iter().all(|x| (0.0..=1.0).contains(&x) ));
    }
  }
}
