//! # mpgemm engine
//!
//! Mixed-precision GEMM: low-bit quantized integer weights multiplied by
//! floating-point activations, producing `f32` results.
//!
//! This crate provides:
//! - `Naive` reference backend (the correctness oracle)
//! - `LUT` backend that replaces per-element multiplies with table lookups
//! - Bias / activation post-processing on flattened result buffers
//! - Error metrics for validating one backend against another
//!
//! ## Example
//!
//! ```rust
//! use mpgemm_engine::{ActivationKind, Engine, measure_error};
//!
//! let weights: Vec<u8> = vec![1, 0, 0, 1];
//! let activations = vec![1.0f32, 2.0, 3.0, 4.0];
//!
//! let naive = Engine::new("naive").unwrap();
//! let mut lut = Engine::new("lut").unwrap();
//! lut.generate_lut(4).unwrap();
//!
//! let reference = naive.matmul(&weights, &activations, 2, 2, 2).unwrap();
//! let candidate = lut.matmul(&weights, &activations, 2, 2, 2).unwrap();
//! assert_eq!(reference, vec![1.0, 2.0, 3.0, 4.0]);
//!
//! let stats = measure_error(&reference, &candidate).unwrap();
//! assert_eq!(stats.max_error, 0.0);
//!
//! let biased = lut.add_bias(&candidate, 2, 2, &[-2.0, 0.0]).unwrap();
//! let out = lut.apply_activation(&biased, 2, 2, ActivationKind::ReLU).unwrap();
//! assert_eq!(out, vec![0.0, 2.0, 1.0, 4.0]);
//! ```

pub mod api;
mod core;
mod saf;

pub use saf::*;
