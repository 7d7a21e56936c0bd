use crate::internal::*;


/// The shape of a [Tensor](crate::Tensor).
///
/// Besides its dimensions, a shape stores the strides and offset used
/// to locate its elements inside the tensor's storage. Views like
/// transposes and broadcasts only ever change the shape.

#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
  pub dims: Vec<usize>,
  pub(crate) strides: Vec<isize>,
  pub(crate) offset: usize,
}

impl Shape {
  pub fn new(dims: &[usize]) -> Self {
    Self {
      dims: dims.to_vec(),
      strides: Self::make_strides(dims),
      offset: 0,
    }
  }

  fn make_strides(dims: &[usize]) -> Vec<isize> {
    let mut strides = vec![1; dims.len()];
    for i in (1..dims.len()).rev() {
      strides[i - 1] = dims[i] as isize * strides[i];
    }
    strides
  }

  pub fn size(&self) -> usize {
    self.dims.iter().product()
  }

  pub fn rank(&self) -> usize {
    self.dims.len()
  }

  pub fn contiguous(&self) -> bool {
    self.strides == Self::make_strides(&self.dims)
  }

  /// Storage indices of all elements in logical order.

  pub fn iter(&self) -> Box<dyn Iterator<Item=usize> + '_> {
    if self.contiguous() {
      Box::new(self.offset..self.offset + self.size())
    } else {
      Box::new(ShapeIterator::new(self))
    }
  }

  pub(crate) fn index(&self, indices: &[usize]) -> usize {
    assert!(indices.len() <= self.rank(),
      "Too many indices for {}", self);
    (indices.iter()
      .zip(&self.strides)
      .map(|(&i, &s)| i as isize * s )
      .sum::<isize>() + self.offset as isize) as usize
  }

  /// Reinterpret contiguous memory with new dimensions.

  pub fn view(&self, dims: &[usize]) -> Self {
    assert!(self.contiguous(), "Cannot view non-contiguous {}", self);
    let size: usize = dims.iter().product();
    assert_eq!(size, self.size(), "Cannot view {} as {:?}", self, dims);
    Self { dims: dims.to_vec(), strides: Self::make_strides(dims), offset: self.offset }
  }

  /// Drop the leading dimensions by fixing them to the given indices.

  pub fn take(&self, indices: &[usize]) -> Self {
    Self {
      dims: self.dims[indices.len()..].to_vec(),
      strides: self.strides[indices.len()..].to_vec(),
      offset: self.index(indices),
    }
  }

  pub fn transpose(&self, dim1: isize, dim2: isize) -> Self {
    let dim1 = negative_index(dim1, self.rank(), false);
    let dim2 = negative_index(dim2, self.rank(), false);
    let mut shape = self.clone();
    shape.dims.swap(dim1, dim2);
    shape.strides.swap(dim1, dim2);
    shape
  }

  /// Dimensions two shapes broadcast to, aligned from the right.

  pub fn broadcast_dims(lhs: &[usize], rhs: &[usize]) -> Vec<usize> {
    let rank = lhs.len().max(rhs.len());
    let mut dims = vec![0; rank];
    for i in 0..rank {
      let a = if i < lhs.len() { lhs[lhs.len() - 1 - i] } else { 1 };
      let b = if i < rhs.len() { rhs[rhs.len() - 1 - i] } else { 1 };
      assert!(a == b || a == 1 || b == 1,
        "Could not broadcast {:?} & {:?}", lhs, rhs);
      dims[rank - 1 - i] = a.max(b);
    }
    dims
  }

  /// Stretch to the given dimensions without copying, by
  /// setting the strides of expanded dimensions to zero.

  pub fn broadcast(&self, dims: &[usize]) -> Self {
    assert!(self.rank() <= dims.len(),
      "Could not broadcast {} to {:?}", self, dims);
    let lead = dims.len() - self.rank();
    let strides = dims.iter()
      .enumerate()
      .map(|(d, &n)| {
        if d < lead { return 0 }
        let own = self.dims[d - lead];
        assert!(own == n || own == 1, "Could not broadcast {} to {:?}", self, dims);
        if own == n { self.strides[d - lead] } else { 0 }
      })
      .collect();
    Self { dims: dims.to_vec(), strides, offset: self.offset }
  }
}

impl std::ops::Index<isize> for Shape {
  type Output = usize;

  fn index(&self, i: isize) -> &usize {
    &self.dims[negative_index(i, self.rank(), false)]
  }
}

impl std::fmt::Display for Shape {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    write!(f, "Shape{:?}", self.dims)
  }
}


/// Iterate through a [Shape]'s storage indices, honoring its strides.

pub struct ShapeIterator<'a> {
  shape: &'a Shape,
  counter: Vec<usize>,
  idx: isize,
  remaining: usize,
}

impl<'a> ShapeIterator<'a> {
  fn new(shape: &'a Shape) -> Self {
    Self {
      counter: vec![0; shape.rank()],
      idx: shape.offset as isize,
      remaining: shape.size(),
      shape,
    }
  }
}

impl Iterator for ShapeIterator<'_> {
  type Item = usize;

  fn next(&mut self) -> Option<Self::Item> {
    if self.remaining == 0 { return None }
    self.remaining -= 1;
    let out = self.idx as usize;
    // Odometer over dimensions, rightmost fastest
    for d in (0..self.counter.len()).rev() {
      self.counter[d] += 1;
      if self.counter[d] < self.shape.dims[d] {
        self.idx += self.shape.strides[d];
        break
      }
      self.counter[d] = 0;
      self.idx -= self.shape.strides[d] * (self.shape.dims[d] as isize - 1);
    }
    Some(out)
  }
}
