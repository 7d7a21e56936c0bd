//! Boundary-seeking GAN on MNIST, built on a small eager autograd core.
//! CPU only. Few dependencies.
//!
//! # Features
//!
//! - **Eager auto-grad**: [Variable]s record the operations used to create them.
//! Models get re-executed for every batch, creating a fresh computation graph.
//!
//! - **Broadcasting**: Tensors with differing but compatible shapes get
//! broadcasted to matching dimensions automatically, including their gradients.
//!
//! - **Zero-copy views**: Tensors may be indexed, reshaped, transposed and
//! broadcasted without copying any data in most situations.
//!
//! - **Layers**: Dense, batch normalization and activations composed into
//! [Sequential](nn::Sequential) models.
//!
//! - **Training**: The [Bgan] trainer alternates discriminator and generator
//! steps through one shared ADAM optimizer, and dumps sample grids as PNG.
//!
//! # Examples
//!
//! Evaluating and minimizing a non-linear function:
//! ```
//! use bgan::{ ops::*, Tensor, optimize::{ Optimizer, Adam } };
//!
//! // Create trainable variables from tensors
//! let w = Tensor::randn(&[2, 8]).trained();
//! let b = Tensor::zeros(&[8]).trained();
//!
//! // Use a standard optimizer
//! let mut optimizer = Optimizer::new(0.001, Adam::default());
//!
//! // Basic training loop
//! for _ in 0..100 {
//!
//!   // Track training data for compute operations to be recorded
//!   let x = Tensor::new(&[1, 2], vec![1.0, 2.0]).tracked();
//!
//!   // Compute loss
//!   let loss = ((x.mm(&w) + &b).tanh() - 0.5).sqr().mean(0);
//!
//!   // Back-prop, optimize and reset gradients
//!   optimizer.minimize(&loss, &loss.parameters());
//! }
//! ```
//!
//! Training the GAN on MNIST files in `data/`:
//! ```no_run
//! use bgan::{ Bgan, Dataset, TrainConfig };
//!
//! let config = TrainConfig { epochs: 1000, ..Default::default() };
//! let dataset = Dataset::<f32>::load_mnist(&config.data_dir)?;
//! Bgan::new(config).train(&dataset)?;
//! # Ok::<(), bgan::Error>(())
//! ```
//!
//! # Optional features
//!
//! - `unsafe` *(default)*: Accelerated matrix math using [matrixmultiply] crate.

mod internal;
mod shape;
mod tensor;
mod variable;

pub mod ops;
pub mod scalar;
pub mod optimize;
pub mod nn;
pub mod loss;
pub mod model;
pub mod data;
pub mod sample;
pub mod config;
pub mod error;
pub mod train;

pub use internal::manual_seed;
pub use shape::Shape;
pub use tensor::Tensor;
pub use variable::{ Variable, UnaryOp, BinaryOp };
pub use config::TrainConfig;
pub use data::Dataset;
pub use error::{ Error, Result };
pub use train::{ Bgan, StepReport };
