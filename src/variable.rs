use std::rc::Rc;
use std::collections::HashSet;
use std::sync::atomic::{ AtomicUsize, Ordering };
use std::fmt::Debug;

mod mops;

use crate::{
  tensor::Tensor,
  scalar::Real,
  ops::{ BaseOps, NumericOps, Hops },
};


pub fn make_id() -> usize {
  static LAST_ID: AtomicUsize = AtomicUsize::new(0);
  LAST_ID.fetch_add(1, Ordering::Relaxed)
}


/// Unary computational operation that can also compute its derivative.

pub trait UnaryOp<T: Real>: Debug {
  fn run(&self, lhs: &Tensor<T>) -> Tensor<T>;
  fn derive(&self, lhs: &Tensor<T>, grad: &Tensor<T>) -> Tensor<T>;
}


/// Binary computational operation that can also compute its derivative.

pub trait BinaryOp<T: Real>: Debug {
  fn run(&self, lhs: &Tensor<T>, rhs: &Tensor<T>) -> Tensor<T>;
  fn derive(&self, lhs: &Tensor<T>, rhs: &Tensor<T>, grad: &Tensor<T>) -> (Tensor<T>, Tensor<T>);
}


#[derive(Debug)]
enum Op<T: Real> {
  Unary(Box<dyn UnaryOp<T>>),
  Binary(Box<dyn BinaryOp<T>>),
}


/// Node in a computation graph, containing a [Variable]'s data and gradient,
/// as well as the operation used to create it.

#[derive(Debug)]
struct Node<T: Real> {
  id: usize,
  data: Tensor<T>,
  grad: Option<Tensor<T>>,
  op: Option<Op<T>>,
  previous: Vec<Rc<Self>>,
  trainable: bool,
}

impl<T: Real> Node<T> {
  fn reset_gradient(&self, filler: T) {
    if let Some(grad) = &self.grad {
      grad.refill(filler);
    }
  }

  fn backward(&self) {
    let (Some(op), Some(grad)) = (&self.op, &self.grad) else { return };
    let lhs = &self.previous[0].data;
    let changes = match op {
      Op::Unary(op) => vec![op.derive(lhs, grad)],
      Op::Binary(op) => {
        let rhs = &self.previous[1].data;
        let (change_l, change_r) = op.derive(lhs, rhs, grad);
        vec![change_l, change_r]
      },
    };
    for (change, prev) in changes.iter().zip(&self.previous) {
      if let Some(grad) = &prev.grad {
        grad.op_assign(change, |a, b| *a += b );
      }
    }
  }
}


/// Variables track the computational operations used to create them and allow
/// for computing their gradient with respect to all input variables involved.
///
/// They get created by calling [tracked](Tensor::tracked) or
/// [trained](Tensor::trained) on any differentiable [Tensor] type.
///
/// Variables dereference to their underlying [Tensor] automatically for
/// non-differentiable operations. Differentiable operations, on the other hand,
/// will always return another Variable.

#[derive(Debug, Clone)]
pub struct Variable<T: Real> {
  node: Rc<Node<T>>,
}

impl<T: Real> Hops<T> for Variable<T> {}

impl<T: Real> std::ops::Deref for Variable<T> {
  type Target = Tensor<T>;

  fn deref(&self) -> &Self::Target {
    &self.node.data
  }
}

impl<T: Real> PartialEq for Variable<T> {
  fn eq(&self, rhs: &Self) -> bool {
    self.node.data == rhs.node.data
  }
}

impl<T: Real> From<&Tensor<T>> for Variable<T> {
  fn from(tensor: &Tensor<T>) -> Self {
    Self::from_tensor(tensor.clone(), false)
  }
}

impl<T: Real> Variable<T> {
  pub(crate) fn from_tensor(tensor: Tensor<T>, trainable: bool) -> Self {
    Self {
      node: Rc::new(Node {
        id: make_id(),
        grad: trainable.then(|| Tensor::zeros(&tensor.shape().dims) ),
        data: tensor,
        op: None,
        previous: vec![],
        trainable,
      }),
    }
  }

  fn operation(op: Op<T>, data: Tensor<T>, grad: bool, previous: Vec<Rc<Node<T>>>) -> Self {
    Self {
      node: Rc::new(Node {
        id: make_id(),
        grad: grad.then(|| Tensor::zeros(&data.shape().dims) ),
        data,
        op: Some(op),
        previous,
        trainable: false,
      }),
    }
  }

  pub fn id(&self) -> usize {
    self.node.id
  }

  pub fn tensor(&self) -> &Tensor<T> {
    &self.node.data
  }

  pub fn grad(&self) -> Option<&Tensor<T>> {
    self.node.grad.as_ref()
  }

  pub fn unary_op(&self, op: impl UnaryOp<T> + 'static) -> Self {
    let data = op.run(&self.node.data);
    Self::operation(
      Op::Unary(Box::new(op)),
      data,
      self.grad().is_some(),
      vec![self.node.clone()],
    )
  }

  pub fn binary_op(&self, op: impl BinaryOp<T> + 'static, rhs: &Self) -> Self {
    let data = op.run(&self.node.data, &rhs.node.data);
    Self::operation(
      Op::Binary(Box::new(op)),
      data,
      self.grad().is_some() || rhs.grad().is_some(),
      vec![self.node.clone(), rhs.node.clone()],
    )
  }

  /// Compute gradients across this Variable's entire graph.

  pub fn backward(&self) {
    let Some(grad) = self.grad() else {
      panic!("Cannot compute gradients for constant {self}")
    };
    grad.refill(T::one());
    for node in self.history().iter().rev() {
      node.backward();
    }
  }

  /// List all trainable parameters in this Variable's graph.

  pub fn parameters(&self) -> Vec<Self> {
    self.history()
      .into_iter()
      .filter(|node| node.trainable )
      .map(|node| Self { node } )
      .collect()
  }

  /// Set gradients to zero for this Variable's entire graph.

  pub fn reset(&self) {
    for node in self.history() {
      node.reset_gradient(T::zero());
    }
  }

  // Nodes in topological order, inputs first
  fn history(&self) -> Vec<Rc<Node<T>>> {
    let mut history = vec![];
    Self::history_recurse(&self.node, &mut history, &mut HashSet::new());
    history
  }

  fn history_recurse(node: &Rc<Node<T>>, history: &mut Vec<Rc<Node<T>>>, visited: &mut HashSet<usize>) {
    if !visited.insert(node.id) { return }
    for prev in &node.previous {
      Self::history_recurse(prev, history, visited);
    }
    history.push(node.clone());
  }

  /// Compute a function's gradient with respect to a generated
  /// input numerically and compare it to the automatically derived
  /// solution. Returns the mean absolute difference.
  ///
  /// Supply any function to check that it gets differentiated correctly.

  pub fn check_gradients<F>(dims: &[usize], generator: F) -> T
  where
    F: Fn(&Self) -> Self
  {
    let eps = T::from(1e-4).unwrap();
    let input = Tensor::randn(dims);
    let var = input.trained();
    // Compute gradient using auto diff
    let output = generator(&var).sum(0);
    output.backward();
    let grad = var.grad().unwrap().to_vec();
    // Compute gradient numerically for every element of input
    let base = input.to_vec();
    let eval = |values: Vec<T>| generator(&Tensor::new(dims, values).tracked()).sum(0).item();
    let total = base.iter().enumerate().fold(T::zero(), |acc, (i, _)| {
      let mut next = base.clone();
      next[i] += eps;
      let mut prev = base.clone();
      prev[i] -= eps;
      let numeric = (eval(next) - eval(prev)) / (eps + eps);
      let diff = numeric - grad[i];
      acc + if diff < T::zero() { -diff } else { diff }
    });
    total / T::from(base.len()).unwrap()
  }
}

impl<T: Real> std::fmt::Display for Variable<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    let title = if self.node.trainable { "Trainable" } else {
      if self.node.grad.is_some() { "Computed" } else { "Tracked" }
    };
    write!(f, "{title} {}", self.tensor())
  }
}


#[cfg(test)]
mod tests {
  use super::*;
  use crate::ops::RealOps;

  #[test]
  fn x_squared() {
    let x = Tensor::vec(&[3.0, 5.0]).trained();
    let z = &x * &x + 2.0;
    z.backward();
    assert_eq!(z.tensor(), &Tensor::vec(&[11.0, 27.0]));
    assert_eq!(x.grad(), Some(&Tensor::vec(&[6.0, 10.0])));
  }

  #[test]
  fn constants_have_no_gradient() {
    let c = Tensor::vec(&[1.0, 2.0]).tracked();
    let w = Tensor::vec(&[0.5, 0.5]).trained();
    let y = (&c * &w).sum(0);
    assert!(c.grad().is_none());
    assert!(y.grad().is_some());
    assert_eq!(y.parameters().len(), 1);
    assert_eq!(y.parameters()[0].id(), w.id());
  }

  #[test]
  fn reset_clears_graph() {
    let w = Tensor::<f64>::vec(&[1.0, -1.0]).trained();
    let y = w.sigmoid().sum(0);
    y.backward();
    assert!(w.grad().unwrap().param_iter().any(|g| g != 0.0 ));
    y.reset();
    assert!(w.grad().unwrap().param_iter().all(|g| g == 0.0 ));
  }

  #[test]
  fn shared_subgraph_accumulates() {
    let x = Tensor::<f64>::vec(&[2.0]).trained();
    let a = x.log();
    let y = (&a + &a).sum(0);
    y.backward();
    assert!((x.grad().unwrap().item() - 1.0).abs() < 1e-12);
  }

  #[test]
  #[should_panic]
  fn backward_on_constant() {
    Tensor::<f64>::vec(&[1.0]).tracked().sum(0).backward();
  }
}
