//! Objectives for discriminator and generator training.

use crate::{
  ops::*,
  scalar::Real,
  tensor::Tensor,
  variable::Variable,
};

/// Fuzz factor keeping logarithms finite.
pub const EPSILON: f64 = 1e-7;

fn epsilon<T: Real>() -> T {
  T::from(EPSILON).unwrap()
}

fn complement<T: Real>(p: &Variable<T>) -> Variable<T> {
  -p + T::one()
}


/// Mean binary cross-entropy between predicted probabilities and targets.
///
/// Predictions get clipped to `[eps, 1 - eps]` first.

pub fn binary_crossentropy<T: Real>(predictions: &Variable<T>, targets: &Tensor<T>) -> Variable<T> {
  let eps = epsilon();
  let p = predictions.clamp(eps, T::one() - eps);
  let y = targets.tracked();
  let likelihood = &y * &p.log() + complement(&y) * complement(&p).log();
  -likelihood.mean(0)
}


/// Fraction of predictions that land on the target's side of 0.5.

pub fn binary_accuracy<T: Real>(predictions: &Tensor<T>, targets: &Tensor<T>) -> T {
  let half = T::from(0.5).unwrap();
  predictions
    .gt(&Tensor::scalar(half))
    .numeric::<T>()
    .zip(targets, |(a, b)| if a == b { T::one() } else { T::zero() })
    .mean(0)
    .item()
}


/// Boundary-seeking generator objective
/// `0.5 * mean((log(p) - log(1 - p))^2 + eps)`.
///
/// It only depends on the discriminator's predictions, pulling them
/// towards the decision boundary at 0.5. Predictions are not clipped.

pub fn boundary_seeking_loss<T: Real>(predictions: &Variable<T>) -> Variable<T> {
  let log_odds = predictions.log() - complement(predictions).log();
  (log_odds.sqr() + epsilon::<T>()).mean(0) * T::from(0.5).unwrap()
}


#[cfg(test)]
mod tests {
  use super::*;
  use proptest::prelude::*;
  use crate::internal::manual_seed;

  fn boundary(p: f64) -> f64 {
    boundary_seeking_loss(&Tensor::vec(&[p]).tracked()).item()
  }

  #[test]
  fn crossentropy() {
    let p = Tensor::<f64>::new(&[2,1], vec![0.5, 0.5]).tracked();
    let loss = binary_crossentropy(&p, &Tensor::new(&[2,1], vec![1.0, 0.0])).item();
    assert!((loss - 2.0f64.ln()).abs() < 1e-12);
  }

  #[test]
  fn crossentropy_clips() {
    let p = Tensor::<f64>::new(&[2,1], vec![0.0, 1.0]).tracked();
    let loss = binary_crossentropy(&p, &Tensor::new(&[2,1], vec![1.0, 0.0])).item();
    assert!(loss.is_finite());
    assert!((loss + (1e-7f64).ln()).abs() < 1e-6);
  }

  #[test]
  fn accuracy() {
    let p = Tensor::<f64>::new(&[4,1], vec![0.9, 0.2, 0.6, 0.4]);
    let y = Tensor::new(&[4,1], vec![1.0, 0.0, 0.0, 0.0]);
    assert_eq!(binary_accuracy(&p, &y), 0.75);
  }

  #[test]
  fn boundary_at_half() {
    assert!((boundary(0.5) - 0.5 * 1e-7).abs() < 1e-15);
  }

  #[test]
  fn gradients() {
    manual_seed(21);
    let targets = Tensor::new(&[3,2], vec![1.0, 0.0, 1.0, 1.0, 0.0, 0.0]);
    let diff = Variable::<f64>::check_gradients(&[3,2], |x| binary_crossentropy(&x.sigmoid(), &targets) );
    assert!(diff < 1e-6, "{diff}");
    let diff = Variable::<f64>::check_gradients(&[3,1], |x| boundary_seeking_loss(&x.sigmoid()) );
    assert!(diff < 1e-6, "{diff}");
  }

  proptest! {
    #[test]
    fn boundary_symmetric(p in 0.001f64..0.999) {
      let (a, b) = (boundary(p), boundary(1.0 - p));
      prop_assert!(a >= 0.0);
      prop_assert!((a - b).abs() <= 1e-9 * (1.0 + a), "{} != {}", a, b);
    }

    #[test]
    fn accuracy_bounded(values in prop::collection::vec(0.0f64..1.0, 1..16)) {
      let p = Tensor::vec(&values);
      let y = Tensor::ones(&[values.len()]);
      let acc = binary_accuracy(&p, &y);
      prop_assert!((0.0..=1.0).contains(&acc));
    }
  }
}
