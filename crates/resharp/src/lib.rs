//! # resharp
//!
//! Adversarial image restoration: a generator/discriminator pair for joint
//! deblurring and 4× super-resolution, written in pure Rust.
//!
//! ## Modules
//!
//! - **core** — Tensor engine: dense f32 NCHW tensors, shapes, element-wise
//!   and batch operations
//! - **nn** — Layers: convolutions, padding, normalization, activations,
//!   residual blocks, the fixed Gaussian blur prior, weight initialization
//! - **models** — Architectures: generator variants and the patch
//!   discriminator, typed configuration, device-parallel dispatch
//! - **train** — Orchestration: epoch/iteration scheduling, learning-rate
//!   decay, checkpoints, metrics, inference sessions

/// Core tensor engine.
pub use resharp_core as core;

/// Neural network layers.
pub use resharp_nn as nn;

/// Network architectures and device dispatch.
pub use resharp_models as models;

/// Training orchestration and checkpoints.
pub use resharp_train as train;
