use std::fmt::Debug;

use itertools::Itertools;

use crate::{
  ops::*,
  scalar::Real,
  tensor::Tensor,
  variable::Variable,
};


/// A building block of a [Sequential] model.
///
/// Layers own their trainable parameters as [trained](Tensor::trained)
/// variables and get re-executed for every run of the model, creating a
/// fresh computation graph each time.

pub trait Layer<T: Real>: Debug {
  /// Apply the layer to a batch. `train` selects training behaviour
  /// for layers that act differently during inference.
  fn run(&self, input: &Variable<T>, train: bool) -> Variable<T>;

  /// Output dimensions for a single sample, given the input sample dimensions.
  fn output_dims(&self, input: &[usize]) -> Vec<usize>;

  fn name(&self) -> &'static str;

  fn parameters(&self) -> Vec<Variable<T>> {
    vec![]
  }
}


/// Fully connected layer with Glorot-uniform weights and zero bias.

#[derive(Debug)]
pub struct Dense<T: Real> {
  weights: Variable<T>,
  bias: Variable<T>,
}

impl<T: Real> Dense<T> {
  pub fn new(input_size: usize, size: usize) -> Self {
    Self {
      weights: Tensor::glorot_uniform(&[input_size, size]).trained(),
      bias: Tensor::zeros(&[size]).trained(),
    }
  }

  pub fn units(&self) -> usize {
    self.bias.dim(0)
  }
}

impl<T: Real> Layer<T> for Dense<T> {
  fn run(&self, input: &Variable<T>, _train: bool) -> Variable<T> {
    input.mm(&self.weights) + &self.bias
  }

  fn output_dims(&self, _input: &[usize]) -> Vec<usize> {
    vec![self.units()]
  }

  fn name(&self) -> &'static str {
    "Dense"
  }

  fn parameters(&self) -> Vec<Variable<T>> {
    vec![self.weights.clone(), self.bias.clone()]
  }
}


/// Batch normalization over the feature dimension of a `[batch, features]` input.
///
/// In training mode the batch is normalized with its own (biased) statistics.
/// The moving averages receive the batch mean and the batch variance scaled by
/// `n / (n - (1 + epsilon))`. Inference uses the moving averages only and
/// leaves them untouched.

#[derive(Debug)]
pub struct BatchNorm<T: Real> {
  gamma: Variable<T>,
  beta: Variable<T>,
  moving_mean: Tensor<T>,
  moving_variance: Tensor<T>,
  pub momentum: T,
  pub epsilon: T,
}

impl<T: Real> BatchNorm<T> {
  pub fn new(size: usize, momentum: T) -> Self {
    Self {
      gamma: Tensor::ones(&[size]).trained(),
      beta: Tensor::zeros(&[size]).trained(),
      moving_mean: Tensor::zeros(&[size]),
      moving_variance: Tensor::ones(&[size]),
      momentum,
      epsilon: T::from(1e-3).unwrap(),
    }
  }

  pub fn moving_mean(&self) -> &Tensor<T> {
    &self.moving_mean
  }

  pub fn moving_variance(&self) -> &Tensor<T> {
    &self.moving_variance
  }

  fn update_moving(&self, mean: &Tensor<T>, variance: &Tensor<T>, batch_size: usize) {
    let rest = T::one() - self.momentum;
    let n = T::from(batch_size).unwrap();
    let unbiased = variance * (n / (n - (T::one() + self.epsilon)));
    self.moving_mean.assign(&(&self.moving_mean * self.momentum + mean * rest));
    self.moving_variance.assign(&(&self.moving_variance * self.momentum + unbiased * rest));
  }
}

impl<T: Real> Layer<T> for BatchNorm<T> {
  fn run(&self, input: &Variable<T>, train: bool) -> Variable<T> {
    let normalized = if train {
      let mean = input.batch_mean();
      let centered = input - &mean;
      let variance = centered.sqr().batch_mean();
      self.update_moving(mean.tensor(), variance.tensor(), input.dim(0));
      centered / (&variance + self.epsilon).sqrt()
    } else {
      let deviation = (&self.moving_variance + self.epsilon).sqrt();
      (input - &self.moving_mean.tracked()) / &deviation.tracked()
    };
    normalized * &self.gamma + &self.beta
  }

  fn output_dims(&self, input: &[usize]) -> Vec<usize> {
    input.to_vec()
  }

  fn name(&self) -> &'static str {
    "BatchNorm"
  }

  fn parameters(&self) -> Vec<Variable<T>> {
    vec![self.gamma.clone(), self.beta.clone()]
  }
}


#[derive(Debug, Clone)]
pub struct LeakyReLU<T: Real> {
  pub alpha: T,
}

impl<T: Real> LeakyReLU<T> {
  pub fn new(alpha: T) -> Self {
    Self { alpha }
  }
}

impl<T: Real> Layer<T> for LeakyReLU<T> {
  fn run(&self, input: &Variable<T>, _train: bool) -> Variable<T> {
    input.leaky_relu(self.alpha)
  }

  fn output_dims(&self, input: &[usize]) -> Vec<usize> {
    input.to_vec()
  }

  fn name(&self) -> &'static str {
    "LeakyReLU"
  }
}


/// Parameterless output activations.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
  Tanh,
  Sigmoid,
}

impl<T: Real> Layer<T> for Activation {
  fn run(&self, input: &Variable<T>, _train: bool) -> Variable<T> {
    match self {
      Self::Tanh => input.tanh(),
      Self::Sigmoid => input.sigmoid(),
    }
  }

  fn output_dims(&self, input: &[usize]) -> Vec<usize> {
    input.to_vec()
  }

  fn name(&self) -> &'static str {
    match self {
      Self::Tanh => "Tanh",
      Self::Sigmoid => "Sigmoid",
    }
  }
}


/// Collapse all sample dimensions into one.

#[derive(Debug, Clone, Default)]
pub struct Flatten;

impl<T: Real> Layer<T> for Flatten {
  fn run(&self, input: &Variable<T>, _train: bool) -> Variable<T> {
    let dims = &input.shape().dims;
    input.reshape(&[dims[0], dims[1..].iter().product()])
  }

  fn output_dims(&self, input: &[usize]) -> Vec<usize> {
    vec![input.iter().product()]
  }

  fn name(&self) -> &'static str {
    "Flatten"
  }
}


/// Reshape every sample to the given dimensions, keeping the batch dimension.

#[derive(Debug, Clone)]
pub struct Reshape {
  pub dims: Vec<usize>,
}

impl Reshape {
  pub fn new(dims: &[usize]) -> Self {
    Self { dims: dims.to_vec() }
  }
}

impl<T: Real> Layer<T> for Reshape {
  fn run(&self, input: &Variable<T>, _train: bool) -> Variable<T> {
    let dims: Vec<usize> = std::iter::once(input.dim(0))
      .chain(self.dims.iter().copied())
      .collect();
    input.reshape(&dims)
  }

  fn output_dims(&self, _input: &[usize]) -> Vec<usize> {
    self.dims.clone()
  }

  fn name(&self) -> &'static str {
    "Reshape"
  }
}


/// Linear stack of layers.

#[derive(Debug)]
pub struct Sequential<T: Real> {
  pub name: String,
  input_dims: Vec<usize>,
  layers: Vec<Box<dyn Layer<T>>>,
}

impl<T: Real> Sequential<T> {
  /// Create an empty model accepting samples of `input_dims`.

  pub fn new(name: &str, input_dims: &[usize]) -> Self {
    Self {
      name: name.to_string(),
      input_dims: input_dims.to_vec(),
      layers: vec![],
    }
  }

  pub fn with(mut self, layer: impl Layer<T> + 'static) -> Self {
    self.layers.push(Box::new(layer));
    self
  }

  pub fn output_dims(&self) -> Vec<usize> {
    self.layers.iter()
      .fold(self.input_dims.clone(), |dims, layer| layer.output_dims(&dims) )
  }

  pub fn run(&self, input: &Variable<T>, train: bool) -> Variable<T> {
    self.layers.iter()
      .fold(input.clone(), |x, layer| layer.run(&x, train) )
  }

  /// Run the model in inference mode on untracked data.

  pub fn predict(&self, input: &Tensor<T>) -> Tensor<T> {
    self.run(&input.tracked(), false).tensor().detach()
  }

  pub fn parameters(&self) -> Vec<Variable<T>> {
    self.layers.iter()
      .flat_map(|layer| layer.parameters() )
      .collect()
  }

  pub fn num_parameters(&self) -> usize {
    self.parameters().iter()
      .map(|param| param.size() )
      .sum()
  }

  /// Tabular overview of all layers, their output shapes and parameter counts.

  pub fn summary(&self) -> String {
    let mut dims = self.input_dims.clone();
    let rows = self.layers.iter().map(|layer| {
      dims = layer.output_dims(&dims);
      let count: usize = layer.parameters().iter().map(|p| p.size() ).sum();
      format!("{:<12} {:<16} {:>10}", layer.name(), format!("[{}]", dims.iter().join(", ")), count)
    }).join("\n");
    format!(
      "Model \"{}\"\n{:<12} {:<16} {:>10}\n{}\nTrainable params: {}",
      self.name, "Layer", "Output", "Params", rows, self.num_parameters(),
    )
  }
}
