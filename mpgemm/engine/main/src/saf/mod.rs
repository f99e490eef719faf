//! Facade re-exports for mpgemm-engine

pub use crate::api::error::*;
pub use crate::api::traits::*;
pub use crate::api::types::*;

// Backends
pub use crate::core::engine::Engine;
pub use crate::core::lut::LutBackend;
pub use crate::core::naive::NaiveBackend;

// Values
pub use crate::core::matrix::{ActivationMatrix, QuantizedMatrix, ResultMatrix};

// Post-processing and diagnostics
pub use crate::core::metrics::measure_error;
pub use crate::core::post::{add_bias, add_bias_inplace, apply_activation, apply_activation_inplace};

// Level codec
pub use crate::core::levels::{
    decode_signed_level, dequantize_uniform, encode_signed_level, encode_signed_levels,
    max_level, quantize_uniform, validate_bit_width, validate_levels,
};

// Runtime
pub use crate::core::runtime::{OptProfile, RuntimeConfig};
