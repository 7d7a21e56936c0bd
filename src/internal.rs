use std::cell::RefCell;

use rand::{ Rng, SeedableRng, rngs::StdRng };

use crate::scalar::Real;


thread_local! {
  static RNG: RefCell<StdRng> = RefCell::new(StdRng::from_entropy());
}

/// Reseed the random number generator used for parameter
/// initialization, noise and batch sampling on this thread.

pub fn manual_seed(seed: u64) {
  RNG.with(|rng| *rng.borrow_mut() = StdRng::seed_from_u64(seed) );
}

pub(crate) fn with_rng<R>(cb: impl FnOnce(&mut StdRng) -> R) -> R {
  RNG.with(|rng| cb(&mut rng.borrow_mut()) )
}

#[inline]
pub fn negative_index(i: isize, n: usize, start_behind: bool) -> usize {
  if i < 0 {
    let offset = if start_behind { 1 } else { 0 };
    (n as isize + i + offset) as usize
  } else {
    i as usize
  }
}


// Polar Box-Muller transformation

pub fn randn<T: Real>() -> (T, T) {
  loop {
    let (u, v) = with_rng(|rng| (
      rng.gen_range(-T::one(), T::one()),
      rng.gen_range(-T::one(), T::one()),
    ));
    let r = u * u + v * v;
    // Try again if outside unit circle
    if r == T::zero() || r >= T::one() { continue }
    let c = (T::from(-2.0).unwrap() * r.ln() / r).sqrt();
    return (u * c, v * c)
  }
}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn negative() {
    assert_eq!(negative_index(-1, 3, false), 2);
    assert_eq!(negative_index(-1, 3, true), 3);
    assert_eq!(negative_index(1, 3, false), 1);
  }

  #[test]
  fn seeded_draws_repeat() {
    manual_seed(7);
    let a: (f64, f64) = randn();
    manual_seed(7);
    let b: (f64, f64) = randn();
    assert_eq!(a, b);
  }
}
