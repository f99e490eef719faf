use crate::api::error::{GemmError, GemmResult};
use crate::api::traits::{ActivationElement, GemmBackend};
use crate::api::types::{ActivationKind, BackendKind, GemmDims};
use crate::core::lut::LutBackend;
use crate::core::matrix::{ActivationMatrix, QuantizedMatrix, ResultMatrix};
use crate::core::naive::NaiveBackend;
use crate::core::post;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Backend {
    Naive(NaiveBackend),
    Lut(LutBackend),
}

/// Quantized GEMM façade over one selected backend.
///
/// ```rust
/// use mpgemm_engine::{BackendKind, Engine};
///
/// let mut engine = Engine::with_backend(BackendKind::Lut);
/// engine.generate_lut(4).unwrap();
/// let out = engine.matmul(&[1u8, 2, 3, 4], &[5.0f32, 6.0, 7.0, 8.0], 2, 2, 2).unwrap();
/// assert_eq!(out, vec![19.0, 22.0, 43.0, 50.0]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Engine {
    backend: Backend,
}

impl Engine {
    /// Select a backend by name (`"naive"` or `"lut"`, case-insensitive).
    pub fn new(backend_name: &str) -> GemmResult<Self> {
        Ok(Self::with_backend(backend_name.parse()?))
    }

    pub fn with_backend(kind: BackendKind) -> Self {
        let backend = match kind {
            BackendKind::Naive => Backend::Naive(NaiveBackend::new()),
            BackendKind::Lut => Backend::Lut(LutBackend::new()),
        };
        Self { backend }
    }

    pub fn kind(&self) -> BackendKind {
        match self.backend {
            Backend::Naive(_) => BackendKind::Naive,
            Backend::Lut(_) => BackendKind::Lut,
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match &self.backend {
            Backend::Naive(b) => b.name(),
            Backend::Lut(b) => b.name(),
        }
    }

    /// Bit-width fixed by [`generate_lut`](Self::generate_lut); `None` for the naive
    /// backend or an unconfigured LUT backend.
    pub fn bit_width(&self) -> Option<u32> {
        match &self.backend {
            Backend::Naive(_) => None,
            Backend::Lut(b) => b.bit_width(),
        }
    }

    /// Fix the weight bit-width for the LUT backend.
    ///
    /// Fails with `UnsupportedOperation` on the naive backend, which has no tables.
    pub fn generate_lut(&mut self, bit_width: u32) -> GemmResult<()> {
        match &mut self.backend {
            Backend::Lut(b) => b.generate_lut(bit_width),
            Backend::Naive(_) => Err(GemmError::UnsupportedOperation(
                "generate_lut is only available on the lut backend".to_string(),
            )),
        }
    }

    /// `[M x K]` weight levels times `[K x N]` activations, returning `[M x N]`.
    pub fn matmul<A: ActivationElement>(
        &self,
        weights: &[u8],
        activations: &[A],
        m: usize,
        k: usize,
        n: usize,
    ) -> GemmResult<Vec<f32>> {
        let dims = GemmDims::new(m, k, n)?;
        match &self.backend {
            Backend::Naive(b) => b.matmul(weights, activations, dims),
            Backend::Lut(b) => b.matmul(weights, activations, dims),
        }
    }

    /// Typed form of [`matmul`](Self::matmul).
    pub fn matmul_matrices<A: ActivationElement>(
        &self,
        weights: &QuantizedMatrix,
        activations: &ActivationMatrix<A>,
    ) -> GemmResult<ResultMatrix> {
        if weights.cols() != activations.rows() {
            return Err(GemmError::shape(
                "activation rows",
                weights.cols(),
                activations.rows(),
            ));
        }
        let (m, k, n) = (weights.rows(), weights.cols(), activations.cols());
        let out = self.matmul(&weights.unpack(), activations.as_slice(), m, k, n)?;
        ResultMatrix::new(out, m, n)
    }

    pub fn add_bias(&self, c: &[f32], m: usize, n: usize, bias: &[f32]) -> GemmResult<Vec<f32>> {
        post::add_bias(c, m, n, bias)
    }

    pub fn apply_activation(
        &self,
        c: &[f32],
        m: usize,
        n: usize,
        kind: ActivationKind,
    ) -> GemmResult<Vec<f32>> {
        post::apply_activation(c, m, n, kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_parses_names() {
        assert_eq!(Engine::new("naive").unwrap().kind(), BackendKind::Naive);
        assert_eq!(Engine::new(" Lut").unwrap().kind(), BackendKind::Lut);
        assert!(matches!(Engine::new("blas"), Err(GemmError::Configuration(_))));
    }

    #[test]
    fn test_generate_lut_on_naive() {
        let mut engine = Engine::new("naive").unwrap();
        assert!(matches!(
            engine.generate_lut(4),
            Err(GemmError::UnsupportedOperation(_))
        ));
        assert_eq!(engine.bit_width(), None);
    }

    #[test]
    fn test_accessors() {
        let mut engine = Engine::with_backend(BackendKind::Lut);
        assert_eq!(engine.backend_name(), "lut");
        assert_eq!(engine.bit_width(), None);
        engine.generate_lut(3).unwrap();
        assert_eq!(engine.bit_width(), Some(3));
        assert_eq!(Engine::with_backend(BackendKind::Naive).backend_name(), "naive");
    }

    #[test]
    fn test_zero_dims() {
        let engine = Engine::new("naive").unwrap();
        let err = engine.matmul::<f32>(&[], &[], 0, 2, 2).unwrap_err();
        assert!(err.is_shape_error());
    }

    #[test]
    fn test_matmul_matrices() {
        let mut engine = Engine::new("lut").unwrap();
        engine.generate_lut(4).unwrap();
        let w = QuantizedMatrix::from_levels(&[1, 2, 3, 4, 5, 6], 3, 2, 4).unwrap();
        let a = ActivationMatrix::new(vec![7.0f32, 8.0, 9.0, 10.0, 11.0, 12.0, 13.0, 14.0], 2, 4)
            .unwrap();
        let out = engine.matmul_matrices(&w, &a).unwrap();
        assert_eq!((out.rows(), out.cols()), (3, 4));
        assert_eq!(out.row(2), &[101.0, 112.0, 123.0, 134.0]);

        let bad = ActivationMatrix::new(vec![1.0f32; 3], 3, 1).unwrap();
        assert_eq!(
            engine.matmul_matrices(&w, &bad).unwrap_err(),
            GemmError::shape("activation rows", 2, 3)
        );
    }
}
