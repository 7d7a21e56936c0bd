use std::collections::HashMap;

use crate::{
  scalar::Real,
  tensor::Tensor,
  variable::Variable,
  ops::{ BaseOps, Hops },
};


/// An optimization strategy to be used with [Optimizer].

pub trait Strategy<R: Real> {
  /// Compute the change to be added to parameter `id`, given its gradient.
  fn update(&mut self, id: usize, grad: &Tensor<R>, rate: R, step: usize) -> Tensor<R>;
}


/// Generic optimizer that allows for several optimization [strategies](Strategy) to be used.
///
/// The step counter advances with every call to [minimize](Optimizer::minimize),
/// while strategy state is kept per parameter. Models optimized through
/// the same instance therefore share one step count.

#[derive(Debug)]
pub struct Optimizer<R: Real, S: Strategy<R>> {
  strategy: S,
  pub learning_rate: R,
  step: usize,
}

impl<R: Real, S: Strategy<R>> Optimizer<R, S> {
  pub fn new(learning_rate: R, strategy: S) -> Self {
    Self { strategy, learning_rate, step: 1 }
  }

  /// Back-propagate `loss`, update only the given `params` and reset all
  /// gradients in the graph. Parameters that are part of the graph but
  /// not listed keep their values.

  pub fn minimize(&mut self, loss: &Variable<R>, params: &[Variable<R>]) {
    // Compute gradients
    loss.backward();

    // Optimize individual parameters
    for param in params {
      let Some(grad) = param.grad() else { continue };

      // Execute strategy
      let change = self.strategy.update(param.id(), grad, self.learning_rate, self.step);

      // Apply change
      param.tensor().op_assign(&change, |w, c| *w += c );
    }

    // Reset gradients
    loss.reset();

    self.step += 1;
  }

  pub fn steps(&self) -> usize {
    self.step - 1
  }
}


/// Stochastic Gradient Descent strategy

#[derive(Debug, Clone, Default)]
pub struct SGD;

impl<R: Real> Strategy<R> for SGD {
  fn update(&mut self, _id: usize, grad: &Tensor<R>, rate: R, _step: usize) -> Tensor<R> {
    grad * -rate
  }
}


/// Adaptive Movement Estimation strategy (ADAM)

#[derive(Debug, Clone)]
pub struct Adam<R: Real> {
  pub beta1: R,
  pub beta2: R,
  pub epsilon: R,
  m: HashMap<usize, Tensor<R>>,
  v: HashMap<usize, Tensor<R>>,
}

impl<R: Real> Adam<R> {
  pub fn new(beta1: R, beta2: R, epsilon: R) -> Self {
    Self {
      beta1,
      beta2,
      epsilon,
      m: HashMap::new(),
      v: HashMap::new(),
    }
  }
}

impl<R: Real> Default for Adam<R> {
  fn default() -> Self {
    Self::new(R::from(0.9).unwrap(), R::from(0.999).unwrap(), R::from(1e-7).unwrap())
  }
}

impl<R: Real> Strategy<R> for Adam<R> {
  fn update(&mut self, id: usize, grad: &Tensor<R>, rate: R, step: usize) -> Tensor<R> {
    let dims = &grad.shape().dims;
    let m = self.m.entry(id).or_insert_with(|| Tensor::zeros(dims) );
    m.assign(&(&*m * self.beta1 + grad * (R::one() - self.beta1)));
    let v = self.v.entry(id).or_insert_with(|| Tensor::zeros(dims) );
    v.assign(&(&*v * self.beta2 + grad.sqr() * (R::one() - self.beta2)));
    // Bias correction folded into the step size
    let step = R::from(step).unwrap();
    let rate = rate * (R::one() - self.beta2.powf(step)).sqrt() / (R::one() - self.beta1.powf(step));
    &self.m[&id] * -rate / (self.v[&id].sqrt() + self.epsilon)
  }
}
