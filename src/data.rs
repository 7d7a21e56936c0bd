use std::fs::File;
use std::io::Read;
use std::path::Path;

use mnist::{ Mnist, MnistBuilder };
use rand::Rng;
use tracing::info;

use crate::{
  internal::with_rng,
  model::IMG_SHAPE,
  scalar::Real,
  tensor::Tensor,
  ops::BaseOps,
  error::{ Error, Result },
};

const TRAIN_LEN: usize = 60_000;
const TEST_LEN: usize = 10_000;

const IMAGES_MAGIC: u32 = 0x0803;
const LABELS_MAGIC: u32 = 0x0801;

/// IDX files expected in the data directory.
pub const MNIST_FILES: [&str; 4] = [
  "train-images-idx3-ubyte",
  "train-labels-idx1-ubyte",
  "t10k-images-idx3-ubyte",
  "t10k-labels-idx1-ubyte",
];


/// Magic number and total byte length of each file in [MNIST_FILES].

fn idx_layout(file: &str) -> (u32, u64) {
  let len = (if file.starts_with("train") { TRAIN_LEN } else { TEST_LEN }) as u64;
  let pixels = (IMG_SHAPE[0] * IMG_SHAPE[1]) as u64;
  if file.contains("images") {
    (IMAGES_MAGIC, 16 + len * pixels)
  } else {
    (LABELS_MAGIC, 8 + len)
  }
}

/// Verify an IDX header and length, so the decoder only sees well-formed files.

fn check_idx(path: &Path, magic: u32, expected: u64) -> Result<()> {
  let malformed = |reason: String| Error::MalformedDataset { path: path.to_path_buf(), reason };
  let found = path.metadata()?.len();
  if found != expected {
    return Err(malformed(format!("expected {expected} bytes, found {found}")))
  }
  let mut header = [0u8; 4];
  File::open(path)?.read_exact(&mut header)?;
  let actual = u32::from_be_bytes(header);
  if actual != magic {
    return Err(malformed(format!("expected magic number {magic:#06x}, found {actual:#06x}")))
  }
  Ok(())
}


/// Map a raw pixel intensity from [0, 255] to [-1, 1].

pub fn rescale<T: Real>(pixel: u8) -> T {
  T::from(pixel).unwrap() / T::from(127.5).unwrap() - T::one()
}


/// Training images, rescaled to [-1, 1] and shaped `[N, 28, 28, 1]`.

#[derive(Debug, Clone)]
pub struct Dataset<T: Real> {
  images: Tensor<T>,
}

impl<T: Real> Dataset<T> {
  /// Build from concatenated 28x28 grayscale images.

  pub fn from_pixels(pixels: &[u8]) -> Self {
    let size: usize = IMG_SHAPE.iter().product();
    assert!(pixels.len() % size == 0,
      "Pixel buffer of length {} does not hold whole images", pixels.len());
    let dims = [pixels.len() / size, IMG_SHAPE[0], IMG_SHAPE[1], IMG_SHAPE[2]];
    Self {
      images: Tensor::new(&dims, pixels.iter().map(|&p| rescale(p) ).collect()),
    }
  }

  /// Load the MNIST training split from IDX files in `dir`.
  /// Labels and the test split are decoded too, but only their shapes get reported.
  ///
  /// Every file is checked for its magic number and length before decoding.

  pub fn load_mnist(dir: &Path) -> Result<Self> {
    let base = dir.to_str().ok_or_else(|| Error::InvalidPath(dir.to_path_buf()) )?;
    for file in MNIST_FILES {
      let path = dir.join(file);
      if !path.is_file() { return Err(Error::MissingDataset(path)) }
    }
    for file in MNIST_FILES {
      let (magic, len) = idx_layout(file);
      check_idx(&dir.join(file), magic, len)?;
    }
    let base = format!("{}/", base.trim_end_matches('/'));
    let Mnist { trn_img, trn_lbl, tst_img, tst_lbl, .. } = MnistBuilder::new()
      .label_format_digit()
      .base_path(&base)
      .training_set_length(TRAIN_LEN as u32)
      .validation_set_length(0)
      .test_set_length(TEST_LEN as u32)
      .finalize();
    let [rows, cols, _] = IMG_SHAPE;
    info!(
      "Loaded MNIST: train images ({}, {rows}, {cols}), train labels ({},), test images ({}, {rows}, {cols}), test labels ({},)",
      trn_img.len() / (rows * cols), trn_lbl.len(), tst_img.len() / (rows * cols), tst_lbl.len(),
    );
    Ok(Self::from_pixels(&trn_img))
  }

  pub fn len(&self) -> usize {
    self.images.shape().dims[0]
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  pub fn images(&self) -> &Tensor<T> {
    &self.images
  }

  /// Draw `batch_size` images uniformly at random, with replacement.

  pub fn sample_batch(&self, batch_size: usize) -> Tensor<T> {
    let len = self.len();
    assert!(len > 0, "Cannot sample from an empty dataset");
    let indices: Vec<usize> = with_rng(|rng| {
      (0..batch_size).map(|_| rng.gen_range(0, len) ).collect()
    });
    let data = indices.iter()
      .flat_map(|&i| self.images.at(&[i]).to_vec() )
      .collect();
    Tensor::new(&[batch_size, IMG_SHAPE[0], IMG_SHAPE[1], IMG_SHAPE[2]], data)
  }
}


#[cfg(test)]
mod tests {
  use super::*;
  use crate::internal::manual_seed;

  #[test]
  fn rescale_round_trip() {
    for pixel in 0..=255u8 {
      let y: f64 = rescale(pixel);
      assert!((-1.0..=1.0).contains(&y));
      assert!(((y + 1.0) * 127.5 - pixel as f64).abs() < 1e-9);
    }
    assert_eq!(rescale::<f32>(0), -1.0);
    assert_eq!(rescale::<f32>(255), 1.0);
  }

  #[test]
  fn sample_batch() {
    manual_seed(41);
    let pixels: Vec<u8> = (0..3).flat_map(|i| vec![i as u8 * 100; 784] ).collect();
    let dataset = Dataset::<f32>::from_pixels(&pixels);
    assert_eq!(dataset.len(), 3);
    let batch = dataset.sample_batch(5);
    assert_eq!(batch.shape().dims, vec![5,28,28,1]);
    for i in 0..5 {
      let image = batch.at(&[i]).to_vec();
      assert!(image.iter().all(|&p| p == image[0] ));
      assert!([0u8, 100, 200].iter().any(|&p| rescale::<f32>(p) == image[0] ));
    }
  }

  #[test]
  fn missing_files() {
    let dir = tempfile::tempdir().unwrap();
    match Dataset::<f32>::load_mnist(dir.path()) {
      Err(Error::MissingDataset(path)) => assert!(path.ends_with("train-images-idx3-ubyte")),
      other => panic!("Expected missing dataset, got {:?}", other.map(|d| d.len() )),
    }
  }

  #[test]
  fn malformed_files() {
    let dir = tempfile::tempdir().unwrap();
    for file in MNIST_FILES {
      let (magic, len) = idx_layout(file);
      let mut bytes = vec![0u8; len as usize];
      bytes[..4].copy_from_slice(&magic.to_be_bytes());
      std::fs::write(dir.path().join(file), bytes).unwrap();
    }
    // Truncated test labels
    std::fs::write(dir.path().join("t10k-labels-idx1-ubyte"), [0u8, 0, 8, 1]).unwrap();
    match Dataset::<f32>::load_mnist(dir.path()) {
      Err(Error::MalformedDataset { path, reason }) => {
        assert!(path.ends_with("t10k-labels-idx1-ubyte"));
        assert_eq!(reason, "expected 10008 bytes, found 4");
      },
      other => panic!("Expected malformed dataset, got {:?}", other.map(|d| d.len() )),
    }
    // Image file carrying a label header
    let (_, len) = idx_layout("train-images-idx3-ubyte");
    let mut bytes = vec![0u8; len as usize];
    bytes[..4].copy_from_slice(&LABELS_MAGIC.to_be_bytes());
    std::fs::write(dir.path().join("train-images-idx3-ubyte"), bytes).unwrap();
    match Dataset::<f32>::load_mnist(dir.path()) {
      Err(Error::MalformedDataset { path, reason }) => {
        assert!(path.ends_with("train-images-idx3-ubyte"));
        assert!(reason.contains("magic number"), "{reason}");
      },
      other => panic!("Expected malformed dataset, got {:?}", other.map(|d| d.len() )),
    }
  }

  #[cfg(unix)]
  #[test]
  fn non_utf8_directory() {
    use std::os::unix::ffi::OsStrExt;
    let dir = Path::new(std::ffi::OsStr::from_bytes(b"data-\xff"));
    match Dataset::<f32>::load_mnist(dir) {
      Err(Error::InvalidPath(path)) => assert_eq!(path, dir),
      other => panic!("Expected invalid path, got {:?}", other.map(|d| d.len() )),
    }
  }
}
