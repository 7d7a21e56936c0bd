use std::ops::{ Add, Sub, Mul, Div };

use crate::internal::*;
use crate::Shape;
use crate::scalar::{ Inner, Numeric, Real };


/// The four arithmetic operators with a common output type.
///
/// This trait gets implemented automatically for all types
/// that satisfy its dependent traits.

pub trait Arithmetic<Rhs = Self, Output = Self>:
  Add<Rhs, Output = Output> +
  Sub<Rhs, Output = Output> +
  Mul<Rhs, Output = Output> +
  Div<Rhs, Output = Output>
{}

impl<L, Rhs, Output> Arithmetic<Rhs, Output> for L where
  L: Add<Rhs, Output = Output> +
     Sub<Rhs, Output = Output> +
     Mul<Rhs, Output = Output> +
     Div<Rhs, Output = Output>
{}


/// Low-level compute operations.

pub trait Cops<I: Numeric> {
  fn matmul(&self, rhs: &Self) -> Vec<I>;
}


/// Differentiable mid-level operations that are also implemented
/// for non-differentiable [Inner] types.

pub trait BaseOps<I: Inner>: Clone {
  fn scalar(item: I) -> Self;
  fn shape(&self) -> &Shape;
  fn broadcast(&self, dims: &[usize]) -> Self;
  fn reshape(&self, dims: &[usize]) -> Self;
  fn transpose(&self, dim1: isize, dim2: isize) -> Self;

  fn dim(&self, dim: isize) -> usize {
    self.shape()[dim]
  }
}


/// Differentiable mid-level operations that are also implemented
/// for non-differentiable [Numeric] inner types.

pub trait NumericOps<I: Numeric>: Arithmetic + Arithmetic<I> + Sized {
  /// Collapse all dimensions starting at `dim` by summing them up.
  fn sum(&self, dim: isize) -> Self;
  fn mm(&self, rhs: &Self) -> Self;
}


/// Differentiable mid-level operations.

pub trait RealOps<I: Real>: std::ops::Neg<Output = Self> + Sized {
  fn powf(&self, exp: I) -> Self;
  fn log(&self) -> Self;
  fn exp(&self) -> Self;
  fn tanh(&self) -> Self;
  fn sigmoid(&self) -> Self;
  fn leaky_relu(&self, alpha: I) -> Self;
  fn clamp(&self, min: I, max: I) -> Self;
}


/// High-level operations, implemented exclusively on top of
/// the mid-level ops and other Hops. As a result, these are all
/// differentiable when called on a [Variable](crate::Variable).

pub trait Hops<I>: BaseOps<I> + NumericOps<I> + RealOps<I>
where
  I: Real,
  for<'a> &'a Self: Arithmetic<&'a Self, Self> + Arithmetic<I, Self>,
{
  fn sqr(&self) -> Self {
    self.powf(I::from(2.0).unwrap())
  }

  fn sqrt(&self) -> Self {
    self.powf(I::from(0.5).unwrap())
  }

  fn mean(&self, dim: isize) -> Self {
    let udim = negative_index(dim, self.shape().rank(), false);
    let n: usize = self.shape().dims[udim..].iter().product();
    self.sum(dim) / I::from(n).unwrap()
  }

  /// Mean across the leading (batch) dimension of a matrix.

  fn batch_mean(&self) -> Self {
    self.transpose(0, 1).mean(-1)
  }
}
