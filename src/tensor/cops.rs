use crate::{
  tensor::Tensor,
  scalar::Numeric,
  ops::Cops,
};


impl<T: Numeric> Cops<T> for Tensor<T> {
  fn matmul(&self, rhs: &Self) -> Vec<T> {
    let lhs = self.contiguous();
    let rhs = rhs.contiguous();

    let rows_l = lhs.shape.dims[0];
    let cols_l = lhs.shape.dims[1];
    let cols_r = rhs.shape.dims[1];

    let data_l = lhs.data.borrow();
    let data_r = rhs.data.borrow();
    let offset_l = lhs.shape.offset;
    let offset_r = rhs.shape.offset;

    let mut data = vec![T::zero(); rows_l * cols_r];
    T::gemm(
      rows_l,
      cols_l,
      cols_r,
      &data_l[offset_l..offset_l + rows_l * cols_l],
      &data_r[offset_r..offset_r + cols_l * cols_r],
      &mut data,
    );
    data
  }
}
