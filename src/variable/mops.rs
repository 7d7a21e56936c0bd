use crate::{
  internal::*,
  shape::Shape,
  tensor::Tensor,
  variable::{ Variable, BinaryOp, UnaryOp },
  scalar::Real,
  ops::{ BaseOps, NumericOps, RealOps },
};


impl<T: Real> BaseOps<T> for Variable<T> {
  fn scalar(item: T) -> Self {
    Self::from_tensor(Tensor::scalar(item), false)
  }

  fn shape(&self) -> &Shape {
    self.node.data.shape()
  }

  fn broadcast(&self, dims: &[usize]) -> Self {
    if self.shape().dims == dims { return self.clone() }
    self.unary_op(Broadcast { dims: dims.to_vec() })
  }

  fn reshape(&self, dims: &[usize]) -> Self {
    if self.shape().dims == dims { return self.clone() }
    self.unary_op(Reshape { dims: dims.to_vec() })
  }

  fn transpose(&self, dim1: isize, dim2: isize) -> Self {
    self.unary_op(Transpose { dim1, dim2 })
  }
}

impl<T: Real> NumericOps<T> for Variable<T> {
  fn sum(&self, dim: isize) -> Self {
    self.unary_op(Sum { dim })
  }

  fn mm(&self, rhs: &Self) -> Self {
    self.binary_op(MatMul, rhs)
  }
}

impl<T: Real> RealOps<T> for Variable<T> {
  fn powf(&self, exp: T) -> Self {
    self.unary_op(Powf { exp: as_f64(exp) })
  }

  fn log(&self) -> Self {
    self.unary_op(Log)
  }

  fn exp(&self) -> Self {
    self.unary_op(Exp)
  }

  fn tanh(&self) -> Self {
    self.unary_op(Tanh)
  }

  fn sigmoid(&self) -> Self {
    self.unary_op(Sigmoid)
  }

  fn leaky_relu(&self, alpha: T) -> Self {
    self.unary_op(LeakyReLU { alpha: as_f64(alpha) })
  }

  fn clamp(&self, min: T, max: T) -> Self {
    self.unary_op(Clamp { min: as_f64(min), max: as_f64(max) })
  }
}

fn as_f64<T: Real>(value: T) -> f64 {
  value.to_f64().unwrap()
}

fn from_f64<T: Real>(value: f64) -> T {
  T::from(value).unwrap()
}

// Expand both operands to their common shape, recording
// the broadcast so gradients can be summed back
fn broadcast_pair<T: Real>(lhs: &Variable<T>, rhs: &Variable<T>) -> (Variable<T>, Variable<T>) {
  if lhs.shape().dims == rhs.shape().dims { return (lhs.clone(), rhs.clone()) }
  let dims = Shape::broadcast_dims(&lhs.shape().dims, &rhs.shape().dims);
  (lhs.broadcast(&dims), rhs.broadcast(&dims))
}

impl<T: Real> std::ops::Neg for &Variable<T> {
  type Output = Variable<T>;

  fn neg(self) -> Self::Output {
    self * -T::one()
  }
}

impl<T: Real> std::ops::Neg for Variable<T> {
  type Output = Variable<T>;

  fn neg(self) -> Self::Output {
    -&self
  }
}

macro_rules! add_operator {
  ($op:ident, $meth:ident, $symbol:tt) => {
    impl<T: Real> std::ops::$op for &Variable<T> { // &tensor * &other
      type Output = Variable<T>;

      fn $meth(self, rhs: Self) -> Variable<T> {
        let (lhs, rhs) = broadcast_pair(self, rhs);
        lhs.binary_op($op, &rhs)
      }
    }

    impl<T: Real> std::ops::$op for Variable<T> { // tensor * other
      type Output = Variable<T>;

      fn $meth(self, rhs: Self) -> Variable<T> {
        &self $symbol &rhs
      }
    }

    impl<T: Real> std::ops::$op<Variable<T>> for &Variable<T> { // &tensor * other
      type Output = Variable<T>;

      fn $meth(self, rhs: Variable<T>) -> Variable<T> {
        self $symbol &rhs
      }
    }

    impl<T: Real> std::ops::$op<&Variable<T>> for Variable<T> { // tensor * &other
      type Output = Variable<T>;

      fn $meth(self, rhs: &Variable<T>) -> Variable<T> {
        &self $symbol rhs
      }
    }

    impl<T: Real> std::ops::$op<T> for &Variable<T> { // &tensor * T
      type Output = Variable<T>;

      fn $meth(self, rhs: T) -> Variable<T> {
        self $symbol &Variable::scalar(rhs)
      }
    }

    impl<T: Real> std::ops::$op<T> for Variable<T> { // tensor * T
      type Output = Variable<T>;

      fn $meth(self, rhs: T) -> Variable<T> {
        &self $symbol &Variable::scalar(rhs)
      }
    }

    impl std::ops::$op<&Variable<f32>> for f32 { // f32 * &tensor
      type Output = Variable<f32>;

      fn $meth(self, rhs: &Variable<f32>) -> Variable<f32> {
        Variable::scalar(self) $symbol rhs
      }
    }

    impl std::ops::$op<Variable<f32>> for f32 { // f32 * tensor
      type Output = Variable<f32>;

      fn $meth(self, rhs: Variable<f32>) -> Variable<f32> {
        Variable::scalar(self) $symbol &rhs
      }
    }

    impl std::ops::$op<&Variable<f64>> for f64 { // f64 * &tensor
      type Output = Variable<f64>;

      fn $meth(self, rhs: &Variable<f64>) -> Variable<f64> {
        Variable::scalar(self) $symbol rhs
      }
    }

    impl std::ops::$op<Variable<f64>> for f64 { // f64 * tensor
      type Output = Variable<f64>;

      fn $meth(self, rhs: Variable<f64>) -> Variable<f64> {
        Variable::scalar(self) $symbol &rhs
      }
    }
  };
}

add_operator!(Add, add, +);
add_operator!(Sub, sub, -);
add_operator!(Mul, mul, *);
add_operator!(Div, div, /);


#[derive(Debug, Clone)]
pub struct Add;

impl<T: Real> BinaryOp<T> for Add {
  fn run(&self, lhs: &Tensor<T>, rhs: &Tensor<T>) -> Tensor<T> {
    lhs + rhs
  }

  fn derive(&self, _lhs: &Tensor<T>, _rhs: &Tensor<T>, grad: &Tensor<T>) -> (Tensor<T>, Tensor<T>)
  {(
    grad.clone(),
    grad.clone(),
  )}
}


#[derive(Debug, Clone)]
pub struct Sub;

impl<T: Real> BinaryOp<T> for Sub {
  fn run(&self, lhs: &Tensor<T>, rhs: &Tensor<T>) -> Tensor<T> {
    lhs - rhs
  }

  fn derive(&self, _lhs: &Tensor<T>, _rhs: &Tensor<T>, grad: &Tensor<T>) -> (Tensor<T>, Tensor<T>)
  {(
    grad.clone(),
    -grad,
  )}
}


#[derive(Debug, Clone)]
pub struct Mul;

impl<T: Real> BinaryOp<T> for Mul {
  fn run(&self, lhs: &Tensor<T>, rhs: &Tensor<T>) -> Tensor<T> {
    lhs * rhs
  }

  fn derive(&self, lhs: &Tensor<T>, rhs: &Tensor<T>, grad: &Tensor<T>) -> (Tensor<T>, Tensor<T>)
  {(
    grad * rhs,
    grad * lhs,
  )}
}


#[derive(Debug, Clone)]
pub struct Div;

impl<T: Real> BinaryOp<T> for Div {
  fn run(&self, lhs: &Tensor<T>, rhs: &Tensor<T>) -> Tensor<T> {
    lhs / rhs
  }

  fn derive(&self, lhs: &Tensor<T>, rhs: &Tensor<T>, grad: &Tensor<T>) -> (Tensor<T>, Tensor<T>)
  {(
    grad / rhs,
    -(grad * lhs) / (rhs * rhs),
  )}
}


#[derive(Debug, Clone)]
pub struct MatMul;

impl<T: Real> BinaryOp<T> for MatMul {
  fn run(&self, lhs: &Tensor<T>, rhs: &Tensor<T>) -> Tensor<T> {
    lhs.mm(rhs)
  }

  fn derive(&self, lhs: &Tensor<T>, rhs: &Tensor<T>, grad: &Tensor<T>) -> (Tensor<T>, Tensor<T>)
  {(
    grad.mm(&rhs.transpose(0, 1)),
    lhs.transpose(0, 1).mm(grad),
  )}
}


#[derive(Debug, Clone)]
pub struct Broadcast {
  dims: Vec<usize>,
}

impl<T: Real> UnaryOp<T> for Broadcast {
  fn run(&self, lhs: &Tensor<T>) -> Tensor<T> {
    lhs.broadcast(&self.dims)
  }

  fn derive(&self, lhs: &Tensor<T>, grad: &Tensor<T>) -> Tensor<T> {
    grad.sum_to(&lhs.shape().dims)
  }
}


#[derive(Debug, Clone)]
pub struct Reshape {
  dims: Vec<usize>,
}

impl<T: Real> UnaryOp<T> for Reshape {
  fn run(&self, lhs: &Tensor<T>) -> Tensor<T> {
    lhs.reshape(&self.dims)
  }

  fn derive(&self, lhs: &Tensor<T>, grad: &Tensor<T>) -> Tensor<T> {
    grad.reshape(&lhs.shape().dims)
  }
}


#[derive(Debug, Clone)]
pub struct Transpose {
  dim1: isize,
  dim2: isize,
}

impl<T: Real> UnaryOp<T> for Transpose {
  fn run(&self, lhs: &Tensor<T>) -> Tensor<T> {
    lhs.transpose(self.dim1, self.dim2)
  }

  fn derive(&self, _lhs: &Tensor<T>, grad: &Tensor<T>) -> Tensor<T> {
    grad.transpose(self.dim1, self.dim2)
  }
}


#[derive(Debug, Clone)]
pub struct Sum {
  dim: isize,
}

impl<T: Real> UnaryOp<T> for Sum {
  fn run(&self, lhs: &Tensor<T>) -> Tensor<T> {
    lhs.sum(self.dim)
  }

  fn derive(&self, lhs: &Tensor<T>, grad: &Tensor<T>) -> Tensor<T> {
    // Re-insert the collapsed dimensions and spread the gradient over them
    let dims = &lhs.shape().dims;
    let dim = negative_index(self.dim, dims.len(), false);
    let mut kept = dims[..dim].to_vec();
    kept.resize(dims.len(), 1);
    grad.reshape(&kept).broadcast(dims)
  }
}


#[derive(Debug, Clone)]
pub struct Powf {
  exp: f64,
}

impl<T: Real> UnaryOp<T> for Powf {
  fn run(&self, lhs: &Tensor<T>) -> Tensor<T> {
    lhs.powf(from_f64(self.exp))
  }

  fn derive(&self, lhs: &Tensor<T>, grad: &Tensor<T>) -> Tensor<T> {
    let exp: T = from_f64(self.exp);
    grad * lhs.powf(exp - T::one()) * exp
  }
}


#[derive(Debug, Clone)]
pub struct Log;

impl<T: Real> UnaryOp<T> for Log {
  fn run(&self, lhs: &Tensor<T>) -> Tensor<T> {
    lhs.log()
  }

  fn derive(&self, lhs: &Tensor<T>, grad: &Tensor<T>) -> Tensor<T> {
    grad / lhs
  }
}


#[derive(Debug, Clone)]
pub struct Exp;

impl<T: Real> UnaryOp<T> for Exp {
  fn run(&self, lhs: &Tensor<T>) -> Tensor<T> {
    lhs.exp()
  }

  fn derive(&self, lhs: &Tensor<T>, grad: &Tensor<T>) -> Tensor<T> {
    grad * lhs.exp()
  }
}


#[derive(Debug, Clone)]
pub struct Tanh;

impl<T: Real> UnaryOp<T> for Tanh {
  fn run(&self, lhs: &Tensor<T>) -> Tensor<T> {
    lhs.tanh()
  }

  fn derive(&self, lhs: &Tensor<T>, grad: &Tensor<T>) -> Tensor<T> {
    let result = lhs.tanh();
    grad * result.vectorize(|t| T::one() - t * t )
  }
}


#[derive(Debug, Clone)]
pub struct Sigmoid;

impl<T: Real> UnaryOp<T> for Sigmoid {
  fn run(&self, lhs: &Tensor<T>) -> Tensor<T> {
    lhs.sigmoid()
  }

  fn derive(&self, lhs: &Tensor<T>, grad: &Tensor<T>) -> Tensor<T> {
    let result = lhs.sigmoid();
    grad * result.vectorize(|s| s * (T::one() - s) )
  }
}


#[derive(Debug, Clone)]
pub struct LeakyReLU {
  alpha: f64,
}

impl<T: Real> UnaryOp<T> for LeakyReLU {
  fn run(&self, lhs: &Tensor<T>) -> Tensor<T> {
    lhs.leaky_relu(from_f64(self.alpha))
  }

  fn derive(&self, lhs: &Tensor<T>, grad: &Tensor<T>) -> Tensor<T> {
    let alpha: T = from_f64(self.alpha);
    grad * lhs.vectorize(|a| if a > T::zero() { T::one() } else { alpha })
  }
}


#[derive(Debug, Clone)]
pub struct Clamp {
  min: f64,
  max: f64,
}

impl<T: Real> UnaryOp<T> for Clamp {
  fn run(&self, lhs: &Tensor<T>) -> Tensor<T> {
    lhs.clamp(from_f64(self.min), from_f64(self.max))
  }

  fn derive(&self, lhs: &Tensor<T>, grad: &Tensor<T>) -> Tensor<T> {
    let (min, max): (T, T) = (from_f64(self.min), from_f64(self.max));
    grad * lhs.vectorize(|a| if a >= min && a <= max { T::one() } else { T::zero() })
  }
}
