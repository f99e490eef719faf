//! Backend and element traits

use half::{bf16, f16};

use crate::api::error::GemmResult;
use crate::api::types::GemmDims;

/// Floating-point element an activation matrix can be stored in.
///
/// Storage precision is the caller's choice; backends always accumulate in `f32`.
pub trait ActivationElement: Copy + Send + Sync + 'static {
    fn to_f32(self) -> f32;
}

impl ActivationElement for f32 {
    #[inline(always)]
    fn to_f32(self) -> f32 {
        self
    }
}

impl ActivationElement for f64 {
    #[inline(always)]
    fn to_f32(self) -> f32 {
        self as f32
    }
}

impl ActivationElement for f16 {
    #[inline(always)]
    fn to_f32(self) -> f32 {
        f16::to_f32(self)
    }
}

impl ActivationElement for bf16 {
    #[inline(always)]
    fn to_f32(self) -> f32 {
        bf16::to_f32(self)
    }
}

/// A GEMM computation backend.
///
/// `weights` is a row-major `[M x K]` buffer of unsigned levels, `activations` a
/// row-major `[K x N]` buffer. Implementations validate everything before computing
/// and return a freshly allocated `[M x N]` buffer.
pub trait GemmBackend {
    /// Label used in logs and benchmark reports.
    fn name(&self) -> &'static str;

    fn matmul<A: ActivationElement>(
        &self,
        weights: &[u8],
        activations: &[A],
        dims: GemmDims,
    ) -> GemmResult<Vec<f32>>;
}
