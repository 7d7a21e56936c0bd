use std::fs;
use std::path::{ Path, PathBuf };

use image::{ GrayImage, Luma };
use itertools::iproduct;
use tracing::debug;

use crate::{
  nn::Sequential,
  ops::BaseOps,
  scalar::Real,
  tensor::Tensor,
  error::Result,
};

/// Rows and columns of the sample grid.
pub const GRID: (usize, usize) = (5, 5);


fn to_pixel<T: Real>(value: T) -> u8 {
  // [-1, 1] -> [0, 1] -> [0, 255]
  let half = T::from(0.5).unwrap();
  let unit = (value * half + half).to_f64().unwrap_or(0.0).clamp(0.0, 1.0);
  (unit * 255.0).round() as u8
}


/// Arrange `rows * cols` images of shape `[h, w, 1]` with values in [-1, 1]
/// into a single grayscale image.

pub fn image_grid<T: Real>(images: &Tensor<T>, rows: usize, cols: usize) -> GrayImage {
  let dims = &images.shape().dims;
  assert!(dims.len() == 4 && dims[0] >= rows * cols,
    "Expected at least {} images of shape [h, w, 1], got {}", rows * cols, images.shape());
  let (height, width) = (dims[1], dims[2]);
  let data = images.contiguous().to_vec();
  let tile = height * width * dims[3];
  let mut grid = GrayImage::new((cols * width) as u32, (rows * height) as u32);
  for (r, c, y, x) in iproduct!(0..rows, 0..cols, 0..height, 0..width) {
    let value = data[(r * cols + c) * tile + (y * width + x) * dims[3]];
    grid.put_pixel((c * width + x) as u32, (r * height + y) as u32, Luma([to_pixel(value)]));
  }
  grid
}


/// Generate a 5x5 grid of digits in inference mode and save it
/// as `<output_dir>/mnist_<epoch>.png`, creating the directory if needed.

pub fn sample_images<T: Real>(generator: &Sequential<T>, latent_dim: usize, epoch: usize, output_dir: &Path) -> Result<PathBuf> {
  let (rows, cols) = GRID;
  let noise = Tensor::randn(&[rows * cols, latent_dim]);
  let images = generator.predict(&noise);
  fs::create_dir_all(output_dir)?;
  let path = output_dir.join(format!("mnist_{epoch}.png"));
  image_grid(&images, rows, cols).save(&path)?;
  debug!("Saved samples to {}", path.display());
  Ok(path)
}


#[cfg(test)]
mod tests {
  use super::*;
  use crate::{ model::build_generator, internal::manual_seed };

  #[test]
  fn pixels() {
    assert_eq!(to_pixel(-1.0f32), 0);
    assert_eq!(to_pixel(1.0f32), 255);
    assert_eq!(to_pixel(0.0f64), 128);
    assert_eq!(to_pixel(3.0f64), 255);
  }

  #[test]
  fn grid_layout() {
    // Image i is filled with a constant value derived from i
    let values: Vec<f32> = (0..4)
      .flat_map(|i| vec![i as f32 / 3.0 * 2.0 - 1.0; 6] )
      .collect();
    let images = Tensor::new(&[4,2,3,1], values);
    let grid = image_grid(&images, 2, 2);
    assert_eq!(grid.dimensions(), (6, 4));
    assert_eq!(grid.get_pixel(0, 0)[0], 0);
    assert_eq!(grid.get_pixel(5, 3)[0], 255);
    assert_eq!(grid.get_pixel(3, 0)[0], to_pixel(-1.0f32 / 3.0));
  }

  #[test]
  fn writes_png() {
    manual_seed(51);
    let dir = tempfile::tempdir().unwrap();
    let output_dir = dir.path().join("images");
    let generator = build_generator::<f32>(4);
    let path = sample_images(&generator, 4, 200, &output_dir).unwrap();
    assert_eq!(path, output_dir.join("mnist_200.png"));
    let written = image::open(&path).unwrap().to_luma8();
    assert_eq!(written.dimensions(), (140, 140));
  }
}
