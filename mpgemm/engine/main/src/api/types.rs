//! Core types for quantized GEMM

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::api::error::{GemmError, GemmResult};

/// Largest supported weight bit-width. LUT rows hold `2^bit_width` entries.
pub const MAX_BIT_WIDTH: u32 = 8;

/// Bit-width used when callers don't pick one (INT4).
pub const DEFAULT_BIT_WIDTH: u32 = 4;

/// Upper bound on contraction rows per LUT block.
pub const LUT_K_BLOCK: usize = 64;

/// Byte budget for one LUT block's product table. Wide or high bit-width
/// problems get fewer rows per block; a block always holds at least one row.
pub const LUT_SCRATCH_BYTES: usize = 16 << 20;

/// LUT table rows are padded to a multiple of this many f32 lanes (one AVX2 register).
pub const LUT_ROW_ALIGN: usize = 8;

/// GEMM problem dimensions: `[M x K] x [K x N] -> [M x N]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GemmDims {
    pub m: usize,
    pub k: usize,
    pub n: usize,
}

impl GemmDims {
    /// Validate dimensions: all positive and every operand length fits in `usize`.
    pub fn new(m: usize, k: usize, n: usize) -> GemmResult<Self> {
        if m == 0 || k == 0 || n == 0 {
            return Err(GemmError::InvalidShape(format!(
                "dimensions must be > 0, got M={}, K={}, N={}",
                m, k, n
            )));
        }
        for (a, b) in [(m, k), (k, n), (m, n)] {
            if a.checked_mul(b).is_none() {
                return Err(GemmError::InvalidShape(format!(
                    "dimension product {} x {} overflows usize",
                    a, b
                )));
            }
        }
        Ok(Self { m, k, n })
    }

    /// Number of weight levels: `M*K`.
    pub fn weights_len(&self) -> usize {
        self.m * self.k
    }

    /// Number of activation values: `K*N`.
    pub fn activations_len(&self) -> usize {
        self.k * self.n
    }

    /// Number of result values: `M*N`.
    pub fn output_len(&self) -> usize {
        self.m * self.n
    }

    /// Check operand lengths against these dimensions.
    pub fn check_operands(&self, weights_len: usize, activations_len: usize) -> GemmResult<()> {
        if weights_len != self.weights_len() {
            return Err(GemmError::shape("weights", self.weights_len(), weights_len));
        }
        if activations_len != self.activations_len() {
            return Err(GemmError::shape(
                "activations",
                self.activations_len(),
                activations_len,
            ));
        }
        Ok(())
    }
}

impl fmt::Display for GemmDims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}x{}]x[{}x{}]", self.m, self.k, self.k, self.n)
    }
}

/// Computation backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Reference triple-loop GEMM.
    Naive,
    /// Lookup-table accelerated GEMM.
    Lut,
}

impl BackendKind {
    /// All backends, in reporting order.
    pub const ALL: [BackendKind; 2] = [BackendKind::Naive, BackendKind::Lut];

    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Naive => "naive",
            BackendKind::Lut => "lut",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = GemmError;

    fn from_str(s: &str) -> GemmResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "naive" => Ok(BackendKind::Naive),
            "lut" => Ok(BackendKind::Lut),
            other => Err(GemmError::Configuration(format!(
                "unknown backend '{}' (expected 'naive' or 'lut')",
                other
            ))),
        }
    }
}

/// Pointwise activation applied to a result buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationKind {
    /// No-op (also accepted as "linear").
    #[default]
    Identity,
    /// `max(0, x)`
    #[serde(rename = "relu")]
    ReLU,
    /// `1 / (1 + e^-x)`
    Sigmoid,
    /// `tanh(x)`
    Tanh,
    /// GELU, tanh approximation
    Gelu,
    /// SiLU (Swish): `x * sigmoid(x)`
    Silu,
}

impl ActivationKind {
    pub const ALL: [ActivationKind; 6] = [
        ActivationKind::Identity,
        ActivationKind::ReLU,
        ActivationKind::Sigmoid,
        ActivationKind::Tanh,
        ActivationKind::Gelu,
        ActivationKind::Silu,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivationKind::Identity => "identity",
            ActivationKind::ReLU => "relu",
            ActivationKind::Sigmoid => "sigmoid",
            ActivationKind::Tanh => "tanh",
            ActivationKind::Gelu => "gelu",
            ActivationKind::Silu => "silu",
        }
    }
}

impl fmt::Display for ActivationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivationKind {
    type Err = GemmError;

    fn from_str(s: &str) -> GemmResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "identity" | "linear" => Ok(ActivationKind::Identity),
            "relu" => Ok(ActivationKind::ReLU),
            "sigmoid" => Ok(ActivationKind::Sigmoid),
            "tanh" => Ok(ActivationKind::Tanh),
            "gelu" => Ok(ActivationKind::Gelu),
            "silu" | "swish" => Ok(ActivationKind::Silu),
            other => Err(GemmError::Configuration(format!(
                "unknown activation kind '{}'",
                other
            ))),
        }
    }
}

/// Aggregate error between a reference buffer and a candidate buffer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ErrorStats {
    /// Mean squared error.
    pub mse: f64,
    /// Maximum absolute error.
    pub max_error: f64,
    /// Mean absolute error.
    pub mean_abs_error: f64,
    /// Largest `|reference[i]|`, the magnitude `relative_max_error` is scaled by.
    pub max_reference: f64,
}

impl ErrorStats {
    /// `max_error` relative to the reference magnitude.
    pub fn relative_max_error(&self) -> f64 {
        self.max_error / self.max_reference.max(f64::EPSILON)
    }

    /// True when `max_error <= abs_tol`.
    pub fn within(&self, abs_tol: f64) -> bool {
        self.max_error <= abs_tol
    }
}
