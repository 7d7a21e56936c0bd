use std::rc::Rc;
use std::cell::{ Ref, RefCell };

use rand::Rng;

mod cops;
mod lops;

use crate::{
  internal::*,
  shape::Shape,
  variable::Variable,
  scalar::{ Inner, Numeric, Real },
  ops::{ BaseOps, Hops },
};


/// Multidimensional array.
///
/// Tensors may contain any type that satisfies [Inner], but
/// additional methods are available for [Numeric], [Real]
/// and [boolean](bool) inner types.
///
/// Cloning a tensor is cheap, as clones share their storage.
/// [Real] tensor types can be wrapped in a [Variable] by
/// calling [tracked](Tensor::tracked) or [trained](Tensor::trained).

#[derive(Debug, Clone)]
pub struct Tensor<T: Inner> {
  shape: Shape,
  data: Rc<RefCell<Vec<T>>>,
}

impl<T: Real> Hops<T> for Tensor<T> {}

impl<T: Inner> PartialEq for Tensor<T> {
  fn eq(&self, rhs: &Self) -> bool {
    self.shape.dims == rhs.shape.dims &&
      self.param_iter().zip(rhs.param_iter()).all(|(a, b)| a == b )
  }
}

impl<T: Inner> Tensor<T> {
  pub fn from_shape(shape: Shape, data: Vec<T>) -> Self {
    assert_eq!(shape.size(), data.len(),
      "{} doesn't match data length {}", shape, data.len());
    Self { shape, data: Rc::new(RefCell::new(data)) }
  }

  pub fn new(dims: &[usize], data: Vec<T>) -> Self {
    Self::from_shape(Shape::new(dims), data)
  }

  pub fn vec(vec: &[T]) -> Self {
    Self::new(&[vec.len()], vec.to_vec())
  }

  pub fn fill(dims: &[usize], filler: T) -> Self {
    Self::new(dims, vec![filler; dims.iter().product()])
  }

  pub fn raw(&self) -> Ref<'_, Vec<T>> {
    self.data.borrow()
  }

  /// Elements in logical order.

  pub fn to_vec(&self) -> Vec<T> {
    self.param_iter().collect()
  }

  pub fn size(&self) -> usize {
    self.shape.size()
  }

  pub fn rank(&self) -> usize {
    self.shape.rank()
  }

  /// Overwrite our elements with those of another tensor,
  /// broadcasting it if needed.

  pub fn assign(&self, other: &Self) {
    self.op_assign(other, |a, b| *a = b );
  }

  pub fn op_assign(&self, other: &Self, cb: impl Fn(&mut T, T)) {
    let values: Vec<T> = other.broadcast(&self.shape.dims).param_iter().collect();
    let mut data = self.data.borrow_mut();
    for (i, value) in self.shape.iter().zip(values) {
      cb(&mut data[i], value);
    }
  }

  pub fn refill(&self, filler: T) {
    let mut data = self.data.borrow_mut();
    for i in self.shape.iter() {
      data[i] = filler;
    }
  }

  pub fn contiguous(&self) -> Self {
    if self.shape.contiguous() {
      self.clone()
    } else {
      self.detach()
    }
  }

  /// Copy into fresh storage.

  pub fn detach(&self) -> Self {
    self.vectorize(|a| a )
  }

  pub fn zip<O,F>(&self, rhs: &Self, cb: F) -> Tensor<O>
  where
    O: Inner,
    F: Fn((T, T)) -> O,
  {
    let dims = Shape::broadcast_dims(&self.shape.dims, &rhs.shape.dims);
    let lhs = self.broadcast(&dims);
    let rhs = rhs.broadcast(&dims);
    let data = lhs.param_iter()
      .zip(rhs.param_iter())
      .map(cb)
      .collect();
    Tensor::new(&dims, data)
  }

  pub fn vectorize<O,F>(&self, cb: F) -> Tensor<O>
  where
    O: Inner,
    F: FnMut(T) -> O,
  {
    let data = self.param_iter().map(cb).collect();
    Tensor::new(&self.shape.dims, data)
  }

  pub fn param_iter(&self) -> TensorIterator<'_, T> {
    TensorIterator::new(self)
  }

  /// Zero-copy view of the sub-tensor at the given leading indices.

  pub fn at(&self, indices: &[usize]) -> Self {
    Self { shape: self.shape.take(indices), data: self.data.clone() }
  }

  pub fn item(&self) -> T {
    assert!(self.size() == 1,
      "Can't extract item from non-scalar {}", self.shape);
    self.raw()[self.shape.offset]
  }

  pub fn view(&self, dims: &[usize]) -> Self {
    Self { shape: self.shape.view(dims), data: self.data.clone() }
  }
}

impl<T: Numeric> Tensor<T> {
  pub fn zeros(dims: &[usize]) -> Self {
    Self::fill(dims, T::zero())
  }

  pub fn ones(dims: &[usize]) -> Self {
    Self::fill(dims, T::one())
  }

  pub fn arrange(dims: &[usize], start: T, step: T) -> Self {
    Self::new(dims, (0..dims.iter().product())
      .map(|i| T::from(i).unwrap() * step + start )
      .collect())
  }

  /// Sum a single dimension, keeping it with size one.

  pub fn sum_over(&self, dim: isize) -> Self {
    let dim = negative_index(dim, self.rank(), false);
    let dims = &self.shape.dims;
    let outer: usize = dims[..dim].iter().product();
    let inner: usize = dims[dim + 1..].iter().product();
    let n = dims[dim];
    let data = self.to_vec();
    let mut out = vec![T::zero(); outer * inner];
    for o in 0..outer {
      for k in 0..n {
        let row = (o * n + k) * inner;
        for i in 0..inner {
          out[o * inner + i] += data[row + i];
        }
      }
    }
    let mut dims = dims.clone();
    dims[dim] = 1;
    Tensor::new(&dims, out)
  }

  /// Reverse a broadcast by summing the expanded dimensions.

  pub fn sum_to(&self, dims: &[usize]) -> Self {
    let mut out = self.clone();
    while out.rank() > dims.len() {
      let rest = out.shape.dims[1..].to_vec();
      out = out.sum_over(0).reshape(&rest);
    }
    for (d, &n) in dims.iter().enumerate() {
      if n == 1 && out.shape.dims[d] != 1 {
        out = out.sum_over(d as isize);
      }
    }
    assert_eq!(out.shape.dims, dims, "Cannot sum {} to {:?}", self.shape, dims);
    out
  }

  pub fn gt(&self, rhs: &Self) -> Tensor<bool> {
    self.zip(rhs, |(a, b)| a > b )
  }

}

impl<T: Real> Tensor<T> {
  pub fn uniform(dims: &[usize], low: T, high: T) -> Self {
    let data = with_rng(|rng| {
      (0..dims.iter().product::<usize>())
        .map(|_| rng.gen_range(low, high) )
        .collect()
    });
    Self::new(dims, data)
  }

  /// Samples from the standard normal distribution.

  pub fn randn(dims: &[usize]) -> Self {
    let len: usize = dims.iter().product();
    let mut data = Vec::with_capacity(len + 1);
    while data.len() < len {
      let (r1, r2) = randn();
      data.push(r1);
      data.push(r2);
    }
    data.truncate(len);
    Self::new(dims, data)
  }

  /// Xavier/Glorot uniform initialization for a `[fan_in, fan_out]` matrix.

  pub fn glorot_uniform(dims: &[usize]) -> Self {
    let fans = T::from(dims[0] + dims[dims.len() - 1]).unwrap();
    let limit = (T::from(6.0).unwrap() / fans).sqrt();
    Self::uniform(dims, -limit, limit)
  }

  pub fn trained(&self) -> Variable<T> {
    Variable::from_tensor(self.clone(), true)
  }

  pub fn tracked(&self) -> Variable<T> {
    Variable::from(self)
  }
}

impl Tensor<bool> {
  pub fn numeric<O: Numeric>(&self) -> Tensor<O> {
    self.vectorize(|a| if a { O::one() } else { O::zero() })
  }
}

impl<T: Inner> std::fmt::Display for Tensor<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    write!(f, "Tensor{:?} ", self.shape.dims)?;
    print_chunks(0, &self.shape.dims, &self.to_vec(), f)
  }
}

fn print_chunks<T: std::fmt::Debug>(idx: usize, dims: &[usize], vec: &[T], f: &mut std::fmt::Formatter) -> std::fmt::Result {
  let indent = "  ".repeat(idx);
  if dims.is_empty() {
    write!(f, "{indent}{:?}", vec[0])?;
  } else if idx == dims.len() - 1 {
    writeln!(f, "{indent}{:?}", vec)?;
  } else {
    writeln!(f, "{indent}[")?;
    for chunk in vec.chunks((vec.len() / dims[idx]).max(1)) {
      print_chunks(idx + 1, dims, chunk, f)?;
    }
    writeln!(f, "{indent}]")?;
  }
  Ok(())
}


pub struct TensorIterator<'a, T: Inner> {
  data: Ref<'a, Vec<T>>,
  shape_iter: Box<dyn Iterator<Item=usize> + 'a>,
}

impl<'a, T: Inner> TensorIterator<'a, T> {
  fn new(tensor: &'a Tensor<T>) -> Self {
    Self {
      data: tensor.data.borrow(),
      shape_iter: tensor.shape.iter(),
    }
  }
}

impl<T: Inner> Iterator for TensorIterator<'_, T> {
  type Item = T;

  fn next(&mut self) -> Option<Self::Item> {
    self.shape_iter.next().map(|i| self.data[i] )
  }
}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn index() {
    let x = Tensor::new(&[2,2,2], vec![1, 2, 3, 4, 5, 6, 7, 8]);
    assert_eq!(x.at(&[0,0]), Tensor::vec(&[1, 2]));
    assert_eq!(x.at(&[1,1]), Tensor::vec(&[7, 8]));
    assert_eq!(x.at(&[0,1,1]).item(), 4);
    assert_eq!(x.at(&[0]), Tensor::new(&[2,2], vec![1, 2, 3, 4]));
  }

  #[test]
  fn broadcast() {
    let x = Tensor::new(&[1,2,3], vec![1, 2, 3, 4, 5, 6]);

    let y = Tensor::new(&[1], vec![1]);
    assert_eq!(&x + &y, Tensor::new(&[1,2,3], vec![2, 3, 4, 5, 6, 7]));

    let y = Tensor::new(&[3], vec![1, 2, 3]);
    assert_eq!(&x + &y, Tensor::new(&[1,2,3], vec![2, 4, 6, 5, 7, 9]));

    let y = Tensor::new(&[2,1], vec![10, 20]);
    assert_eq!(&x + &y, Tensor::new(&[1,2,3], vec![11, 12, 13, 24, 25, 26]));
  }

  #[test]
  fn sum_over() {
    let a = Tensor::arrange(&[3,2,2], 0, 1).sum_over(1);
    assert_eq!(a, Tensor::new(&[3,1,2], vec![2, 4, 10, 12, 18, 20]));
  }

  #[test]
  fn sum_to() {
    let grad = Tensor::arrange(&[2,3], 1, 1);
    assert_eq!(grad.sum_to(&[3]), Tensor::vec(&[5, 7, 9]));
    assert_eq!(grad.sum_to(&[2,1]), Tensor::new(&[2,1], vec![6, 15]));
    assert_eq!(grad.sum_to(&[]).item(), 21);
  }

  #[test]
  fn assign_through_view() {
    let x = Tensor::zeros(&[2,2]);
    x.at(&[1]).assign(&Tensor::vec(&[3, 4]));
    assert_eq!(x, Tensor::new(&[2,2], vec![0, 0, 3, 4]));
    x.op_assign(&Tensor::scalar(1), |a, b| *a += b );
    assert_eq!(x, Tensor::new(&[2,2], vec![1, 1, 4, 5]));
  }

  #[test]
  fn transposed_copy() {
    let x = Tensor::arrange(&[2,3], 0, 1).transpose(0, 1);
    assert_eq!(x.to_vec(), vec![0, 3, 1, 4, 2, 5]);
    assert!(x.contiguous().shape().contiguous());
    assert_eq!(x.contiguous().to_vec(), vec![0, 3, 1, 4, 2, 5]);
  }

  #[test]
  fn randn_statistics() {
    manual_seed(1);
    let x = Tensor::<f64>::randn(&[4001]);
    let values = x.to_vec();
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let var = values.iter().map(|v| (v - mean).powi(2) ).sum::<f64>() / values.len() as f64;
    assert!(mean.abs() < 0.1);
    assert!((var - 1.0).abs() < 0.1);
  }

  #[test]
  fn glorot_limits() {
    let w = Tensor::<f32>::glorot_uniform(&[100, 200]);
    let limit = (6.0f32 / 300.0).sqrt();
    assert!(w.param_iter().all(|a| a >= -limit && a < limit ));
  }
}
