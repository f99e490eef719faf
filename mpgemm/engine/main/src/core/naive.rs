use std::time::Instant;

use rayon::prelude::*;

use crate::api::error::GemmResult;
use crate::api::traits::{ActivationElement, GemmBackend};
use crate::api::types::GemmDims;
use crate::core::runtime::par_rows_threshold;

/// Reference quantized GEMM.
///
/// Every output cell is `sum_k level(i,k) * activation(k,j)` accumulated in `f32`
/// with ascending `k`. Levels are taken at their integer value; any `u8` is
/// accepted. This is the oracle every other backend is measured against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NaiveBackend;

impl NaiveBackend {
    pub fn new() -> Self {
        Self
    }

    pub(crate) fn compute<A: ActivationElement>(
        &self,
        weights: &[u8],
        activations: &[A],
        dims: GemmDims,
        parallel: bool,
    ) -> GemmResult<Vec<f32>> {
        dims.check_operands(weights.len(), activations.len())?;
        let GemmDims { k, n, .. } = dims;

        let mut output = vec![0.0f32; dims.output_len()];
        if parallel {
            output
                .par_chunks_mut(n)
                .enumerate()
                .for_each(|(i, out_row)| {
                    naive_row(&weights[i * k..(i + 1) * k], activations, n, out_row)
                });
        } else {
            for (i, out_row) in output.chunks_mut(n).enumerate() {
                naive_row(&weights[i * k..(i + 1) * k], activations, n, out_row);
            }
        }
        Ok(output)
    }
}

/// One output row, i-k-j order: the k loop is outermost so each cell sums in
/// ascending k.
#[inline]
fn naive_row<A: ActivationElement>(w_row: &[u8], activations: &[A], n: usize, out_row: &mut [f32]) {
    for (k, &w) in w_row.iter().enumerate() {
        let level = w as f32;
        let a_row = &activations[k * n..(k + 1) * n];
        for (out, &a) in out_row.iter_mut().zip(a_row) {
            *out += level * a.to_f32();
        }
    }
}

impl GemmBackend for NaiveBackend {
    fn name(&self) -> &'static str {
        "naive"
    }

    fn matmul<A: ActivationElement>(
        &self,
        weights: &[u8],
        activations: &[A],
        dims: GemmDims,
    ) -> GemmResult<Vec<f32>> {
        let _t = if log::log_enabled!(log::Level::Trace) { Some(Instant::now()) } else { None };
        let output = self.compute(weights, activations, dims, dims.m >= par_rows_threshold())?;
        if let Some(t) = _t {
            log::trace!("[perf] naive::matmul {} {:.3}ms", dims, t.elapsed().as_secs_f64() * 1000.0);
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::error::GemmError;

    fn dims(m: usize, k: usize, n: usize) -> GemmDims {
        GemmDims::new(m, k, n).unwrap()
    }

    #[test]
    fn test_identity_weights() {
        let out = NaiveBackend
            .matmul(&[1, 0, 0, 1], &[1.0f32, 2.0, 3.0, 4.0], dims(2, 2, 2))
            .unwrap();
        assert_eq!(out, vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_square_fixture() {
        // [[1,2],[3,4]] x [[5,6],[7,8]]
        let out = NaiveBackend
            .matmul(&[1, 2, 3, 4], &[5.0f32, 6.0, 7.0, 8.0], dims(2, 2, 2))
            .unwrap();
        assert_eq!(out, vec![19.0, 22.0, 43.0, 50.0]);
    }

    #[test]
    fn test_non_square_fixture() {
        // [[1,2],[3,4],[5,6]] x [[7,8,9,10],[11,12,13,14]]
        let w = [1u8, 2, 3, 4, 5, 6];
        let a = [7.0f32, 8.0, 9.0, 10.0, 11.0, 12.0, 13.0, 14.0];
        let out = NaiveBackend.matmul(&w, &a, dims(3, 2, 4)).unwrap();
        assert_eq!(
            out,
            vec![29.0, 32.0, 35.0, 38.0, 65.0, 72.0, 79.0, 86.0, 101.0, 112.0, 123.0, 134.0]
        );
    }

    #[test]
    fn test_accepts_full_u8_range() {
        let out = NaiveBackend.matmul(&[255u8], &[2.0f32], dims(1, 1, 1)).unwrap();
        assert_eq!(out, vec![510.0]);
    }

    #[test]
    fn test_shape_mismatch() {
        let err = NaiveBackend
            .matmul(&[1, 2, 3], &[1.0f32; 4], dims(2, 2, 2))
            .unwrap_err();
        assert_eq!(err, GemmError::shape("weights", 4, 3));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let (m, k, n) = (37, 19, 11);
        let w: Vec<u8> = (0..m * k).map(|i| (i * 5 % 16) as u8).collect();
        let a: Vec<f32> = (0..k * n).map(|i| (i as f32 * 0.731).sin()).collect();
        let seq = NaiveBackend.compute(&w, &a, dims(m, k, n), false).unwrap();
        let par = NaiveBackend.compute(&w, &a, dims(m, k, n), true).unwrap();
        assert_eq!(seq, par);
    }

    #[test]
    fn test_half_activations() {
        let a: Vec<half::f16> = [1.5f32, -2.0].iter().map(|&v| half::f16::from_f32(v)).collect();
        let out = NaiveBackend.matmul(&[2u8, 3], &a, dims(1, 2, 1)).unwrap();
        assert_eq!(out, vec![-3.0]);
    }
}
