use rand::distributions::uniform::SampleUniform;
use num_traits::{ NumAssignOps, Num, NumCast };


/// All types that may be used in a [Tensor](crate::Tensor).
///
/// This trait gets implemented automatically for all types
/// that satisfy its dependent traits.

pub trait Inner: PartialEq + Clone + Copy + std::fmt::Debug + 'static {}
impl<T: PartialEq + Clone + Copy + std::fmt::Debug + 'static> Inner for T {}


/// All numeric types.
///
/// Implemented for the primitive integer and float types. Floats
/// override [gemm](Numeric::gemm) with an accelerated kernel when
/// the `unsafe` feature is enabled.

pub trait Numeric: Inner + PartialOrd + Num + NumCast + NumAssignOps + std::iter::Sum {
  /// Row-major matrix product `c = a · b` of an `m × k` and
  /// a `k × n` matrix. `c` gets overwritten.

  fn gemm(m: usize, k: usize, n: usize, a: &[Self], b: &[Self], c: &mut [Self]) {
    for value in c.iter_mut() { *value = Self::zero() }
    for i in 0..m {
      for p in 0..k {
        let a_ip = a[i * k + p];
        let row = &b[p * n..(p + 1) * n];
        for (out, &b_pj) in c[i * n..(i + 1) * n].iter_mut().zip(row) {
          *out += a_ip * b_pj;
        }
      }
    }
  }
}

macro_rules! numeric {
  ($($t:ty),*) => { $(impl Numeric for $t {})* };
}

numeric!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize);

impl Numeric for f32 {
  #[cfg(feature = "unsafe")]
  fn gemm(m: usize, k: usize, n: usize, a: &[Self], b: &[Self], c: &mut [Self]) {
    assert!(a.len() >= m * k && b.len() >= k * n && c.len() >= m * n);
    unsafe {
      matrixmultiply::sgemm(
        m, k, n,
        1.0,
        a.as_ptr(), k as isize, 1,
        b.as_ptr(), n as isize, 1,
        0.0,
        c.as_mut_ptr(), n as isize, 1,
      );
    }
  }
}

impl Numeric for f64 {
  #[cfg(feature = "unsafe")]
  fn gemm(m: usize, k: usize, n: usize, a: &[Self], b: &[Self], c: &mut [Self]) {
    assert!(a.len() >= m * k && b.len() >= k * n && c.len() >= m * n);
    unsafe {
      matrixmultiply::dgemm(
        m, k, n,
        1.0,
        a.as_ptr(), k as isize, 1,
        b.as_ptr(), n as isize, 1,
        0.0,
        c.as_mut_ptr(), n as isize, 1,
      );
    }
  }
}


/// All signed numeric types.
///
/// This trait gets implemented automatically for all types
/// that satisfy its dependent traits.

pub trait Signed: Numeric + num_traits::Signed {}
impl<T: Numeric + num_traits::Signed> Signed for T {}


/// All continuous numeric types. Gradients can be computed
/// for [Variables](crate::Variable) of these.
///
/// This trait gets implemented automatically for all types
/// that satisfy its dependent traits.

pub trait Real: Signed + num_traits::real::Real + SampleUniform {}
impl<T: Signed + num_traits::real::Real + SampleUniform> Real for T {}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn gemm_integer() {
    let a = [1, 2, 3, 4, 5, 6];
    let b = [1, 2, 3, 4, 5, 6];
    let mut c = [0; 4];
    i32::gemm(2, 3, 2, &a, &b, &mut c);
    assert_eq!(c, [22, 28, 49, 64]);
  }

  #[test]
  fn gemm_float_overwrites() {
    let a = [1.0f32, 0.0, 0.0, 1.0];
    let b = [2.0f32, 3.0, 4.0, 5.0];
    let mut c = [9.0f32; 4];
    f32::gemm(2, 2, 2, &a, &b, &mut c);
    assert_eq!(c, [2.0, 3.0, 4.0, 5.0]);
  }
}
