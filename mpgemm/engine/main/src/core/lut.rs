use std::time::Instant;

use rayon::prelude::*;

use crate::api::error::{GemmError, GemmResult};
use crate::api::traits::{ActivationElement, GemmBackend};
use crate::api::types::{GemmDims, LUT_K_BLOCK, LUT_ROW_ALIGN, LUT_SCRATCH_BYTES};
use crate::core::levels::{level_count, validate_bit_width, validate_levels};
use crate::core::runtime::par_rows_threshold;
use crate::core::simd;

/// Partial-product table for one block of activation rows.
///
/// Layout is `[row][level][j]` with each `[j]` run padded to `stride` floats:
/// entry `(r, l, j)` holds `l * activation(k0 + r, j)`.
#[derive(Debug)]
pub(crate) struct ProductTable {
    levels: usize,
    n: usize,
    stride: usize,
    rows: usize,
    data: Vec<f32>,
}

impl ProductTable {
    /// Allocate scratch for up to `max_rows` activation rows of width `n`.
    pub fn new(bit_width: u32, n: usize, max_rows: usize) -> GemmResult<Self> {
        validate_bit_width(bit_width)?;
        let levels = level_count(bit_width);
        let stride = n.div_ceil(LUT_ROW_ALIGN) * LUT_ROW_ALIGN;
        let len = max_rows
            .checked_mul(levels)
            .and_then(|v| v.checked_mul(stride))
            .ok_or_else(|| {
                GemmError::InvalidShape(format!(
                    "LUT of {} rows x {} levels x {} columns overflows usize",
                    max_rows, levels, stride
                ))
            })?;
        Ok(Self {
            levels,
            n,
            stride,
            rows: 0,
            data: vec![0.0f32; len],
        })
    }

    /// Fill the table from activation rows `k0..k1` (row-major, width `n`).
    ///
    /// # Panics
    /// If the block is larger than the allocated scratch.
    pub fn fill<A: ActivationElement>(&mut self, activations: &[A], k0: usize, k1: usize, parallel: bool) {
        let rows = k1 - k0;
        let row_len = self.levels * self.stride;
        assert!(rows * row_len <= self.data.len(), "LUT block of {} rows exceeds scratch", rows);

        let (n, stride, levels) = (self.n, self.stride, self.levels);
        let block = &activations[k0 * n..k1 * n];
        let fill_row = |(r, dst): (usize, &mut [f32])| {
            fill_levels(&block[r * n..(r + 1) * n], dst, n, stride, levels)
        };
        let used = &mut self.data[..rows * row_len];
        if parallel {
            used.par_chunks_mut(row_len).enumerate().for_each(fill_row);
        } else {
            used.chunks_mut(row_len).enumerate().for_each(fill_row);
        }
        self.rows = rows;
    }

    /// Products of block row `r` with `level`, `n` floats.
    ///
    /// # Panics
    /// If `r` is past the filled rows or `level` past the configured levels.
    #[inline]
    pub fn row(&self, r: usize, level: u8) -> &[f32] {
        assert!(
            r < self.rows && (level as usize) < self.levels,
            "LUT lookup (row {}, level {}) outside {} rows x {} levels",
            r,
            level,
            self.rows,
            self.levels
        );
        let start = (r * self.levels + level as usize) * self.stride;
        &self.data[start..start + self.n]
    }

    /// Single product `level * activation(k0 + r, j)`.
    #[cfg(test)]
    pub fn get(&self, r: usize, level: u8, j: usize) -> f32 {
        self.row(r, level)[j]
    }

    /// Rows filled by the last `fill`.
    #[cfg(test)]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Padded width of each level run.
    #[cfg(test)]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Bytes of scratch held.
    pub fn size_bytes(&self) -> usize {
        self.data.len() * std::mem::size_of::<f32>()
    }
}

/// Activation rows per LUT block: as many as fit in `LUT_SCRATCH_BYTES`, at
/// least one, at most `LUT_K_BLOCK` and never more than `k`.
pub(crate) fn block_rows_for(bit_width: u32, n: usize, k: usize) -> usize {
    let stride = n.div_ceil(LUT_ROW_ALIGN) * LUT_ROW_ALIGN;
    let row_bytes = level_count(bit_width)
        .saturating_mul(stride)
        .saturating_mul(std::mem::size_of::<f32>());
    (LUT_SCRATCH_BYTES / row_bytes.max(1))
        .clamp(1, LUT_K_BLOCK)
        .min(k)
}

/// Write `levels` runs for one activation row into `dst`.
///
/// Level 1 is the widened activation itself and every other level is scaled
/// from it, so level 0 is `0.0 * a` (keeps `-0.0` and NaN as a multiply would).
fn fill_levels<A: ActivationElement>(a_row: &[A], dst: &mut [f32], n: usize, stride: usize, levels: usize) {
    let (head, tail) = dst.split_at_mut(2 * stride);
    let (zero, one) = head.split_at_mut(stride);
    for (d, &a) in one[..n].iter_mut().zip(a_row) {
        *d = a.to_f32();
    }
    let base = &one[..n];
    simd::scale_into(&mut zero[..n], base, 0.0);
    for (l, run) in tail.chunks_mut(stride).take(levels - 2).enumerate() {
        simd::scale_into(&mut run[..n], base, (l + 2) as f32);
    }
}

/// Lookup-table quantized GEMM.
///
/// `generate_lut` fixes the weight bit-width. Each `matmul` builds per-call
/// product tables over blocks of activation rows sized to `LUT_SCRATCH_BYTES`
/// (at most `LUT_K_BLOCK` rows), then for every
/// output row adds the table row selected by each weight level. Cells accumulate
/// in ascending `k`, so results match [`NaiveBackend`](super::naive::NaiveBackend)
/// exactly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LutBackend {
    bit_width: Option<u32>,
}

impl LutBackend {
    pub fn new() -> Self {
        Self { bit_width: None }
    }

    /// Configure the backend for `bit_width`-bit weight levels.
    pub fn generate_lut(&mut self, bit_width: u32) -> GemmResult<()> {
        validate_bit_width(bit_width)?;
        self.bit_width = Some(bit_width);
        log::debug!(
            "[lut] configured for {}-bit levels ({} table rows per activation row)",
            bit_width,
            level_count(bit_width)
        );
        Ok(())
    }

    /// Configured bit-width, if `generate_lut` has been called.
    pub fn bit_width(&self) -> Option<u32> {
        self.bit_width
    }

    pub fn is_configured(&self) -> bool {
        self.bit_width.is_some()
    }

    pub(crate) fn compute<A: ActivationElement>(
        &self,
        weights: &[u8],
        activations: &[A],
        dims: GemmDims,
        parallel: bool,
    ) -> GemmResult<Vec<f32>> {
        let bit_width = self.bit_width.ok_or_else(|| {
            GemmError::NotConfigured("generate_lut must be called before matmul".to_string())
        })?;
        dims.check_operands(weights.len(), activations.len())?;
        validate_levels(weights, bit_width)?;

        let GemmDims { k, n, .. } = dims;
        let block_rows = block_rows_for(bit_width, n, k);
        let mut table = ProductTable::new(bit_width, n, block_rows)?;
        log::debug!(
            "[lut] {} bit_width={} block_rows={} table={:.1}KB",
            dims,
            bit_width,
            block_rows,
            table.size_bytes() as f64 / 1024.0
        );

        let mut output = vec![0.0f32; dims.output_len()];
        for k0 in (0..k).step_by(block_rows) {
            let k1 = (k0 + block_rows).min(k);
            table.fill(activations, k0, k1, parallel);

            let table = &table;
            let accumulate = |(i, out_row): (usize, &mut [f32])| {
                let w_block = &weights[i * k + k0..i * k + k1];
                for (r, &level) in w_block.iter().enumerate() {
                    simd::add_assign(out_row, table.row(r, level));
                }
            };
            if parallel {
                output.par_chunks_mut(n).enumerate().for_each(accumulate);
            } else {
                output.chunks_mut(n).enumerate().for_each(accumulate);
            }
        }
        Ok(output)
    }
}

impl GemmBackend for LutBackend {
    fn name(&self) -> &'static str {
        "lut"
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
            log::trace!("[perf] lut::matmul {} {:.3}ms", dims, t.elapsed().as_secs_f64() * 1000.0);
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::naive::NaiveBackend;

    fn dims(m: usize, k: usize, n: usize) -> GemmDims {
        GemmDims::new(m, k, n).unwrap()
    }

    fn configured(bit_width: u32) -> LutBackend {
        let mut lut = LutBackend::new();
        lut.generate_lut(bit_width).unwrap();
        lut
    }

    fn fixture(m: usize, k: usize, n: usize, bit_width: u32) -> (Vec<u8>, Vec<f32>) {
        let max = level_count(bit_width);
        let w = (0..m * k).map(|i| ((i * 7 + i / 3) % max) as u8).collect();
        let a = (0..k * n).map(|i| (i as f32 * 0.377).cos() * 3.0).collect();
        (w, a)
    }

    #[test]
    fn test_not_configured() {
        let err = LutBackend::new()
            .matmul(&[1, 0, 0, 1], &[1.0f32; 4], dims(2, 2, 2))
            .unwrap_err();
        assert!(matches!(err, GemmError::NotConfigured(_)));
    }

    #[test]
    fn test_generate_lut_rejects_bit_width() {
        let mut lut = LutBackend::new();
        assert!(matches!(lut.generate_lut(0), Err(GemmError::Configuration(_))));
        assert!(matches!(lut.generate_lut(9), Err(GemmError::Configuration(_))));
        assert_eq!(lut.bit_width(), None);
        lut.generate_lut(2).unwrap();
        assert_eq!(lut.bit_width(), Some(2));
    }

    #[test]
    fn test_level_out_of_range() {
        let err = configured(4)
            .matmul(&[1, 16, 0, 1], &[1.0f32; 4], dims(2, 2, 2))
            .unwrap_err();
        assert_eq!(
            err,
            GemmError::LevelOutOfRange {
                index: 1,
                level: 16,
                bit_width: 4
            }
        );
    }

    #[test]
    fn test_identity_weights() {
        let out = configured(4)
            .matmul(&[1, 0, 0, 1], &[1.0f32, 2.0, 3.0, 4.0], dims(2, 2, 2))
            .unwrap();
        assert_eq!(out, vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_matches_naive_across_bit_widths() {
        for bit_width in 1..=8 {
            let (m, k, n) = (5, 9, 13);
            let (w, a) = fixture(m, k, n, bit_width);
            let expected = NaiveBackend.matmul(&w, &a, dims(m, k, n)).unwrap();
            let got = configured(bit_width).matmul(&w, &a, dims(m, k, n)).unwrap();
            assert_eq!(got, expected, "bit_width {}", bit_width);
        }
    }

    #[test]
    fn test_block_boundaries() {
        // K spans two full blocks and a partial one
        let (m, k, n) = (3, 2 * LUT_K_BLOCK + 5, 17);
        let (w, a) = fixture(m, k, n, 4);
        let expected = NaiveBackend.matmul(&w, &a, dims(m, k, n)).unwrap();
        let got = configured(4).matmul(&w, &a, dims(m, k, n)).unwrap();
        assert_eq!(got, expected);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let (m, k, n) = (70, 33, 9);
        let (w, a) = fixture(m, k, n, 3);
        let lut = configured(3);
        let seq = lut.compute(&w, &a, dims(m, k, n), false).unwrap();
        let par = lut.compute(&w, &a, dims(m, k, n), true).unwrap();
        assert_eq!(seq, par);
    }

    #[test]
    fn test_product_table_layout() {
        let a = [1.5f32, -2.0, 0.25];
        let mut table = ProductTable::new(2, 3, 1).unwrap();
        assert_eq!(table.stride(), LUT_ROW_ALIGN);
        table.fill(&a, 0, 1, false);
        assert_eq!(table.rows(), 1);
        assert_eq!(table.row(0, 1), &a);
        assert_eq!(table.row(0, 3), &[4.5, -6.0, 0.75]);
        assert_eq!(table.get(0, 2, 1), -4.0);
        assert_eq!(table.get(0, 0, 0), 0.0);
        assert_eq!(table.size_bytes(), 4 * LUT_ROW_ALIGN * 4);
    }

    #[test]
    #[should_panic(expected = "outside 2 rows x 4 levels")]
    fn test_row_rejects_level_past_table() {
        let a = [1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0];
        let mut table = ProductTable::new(2, 3, 2).unwrap();
        table.fill(&a, 0, 2, false);
        table.row(0, 4);
    }

    #[test]
    fn test_block_rows_for() {
        assert_eq!(block_rows_for(4, 128, 1000), LUT_K_BLOCK);
        assert_eq!(block_rows_for(4, 128, 10), 10);
        // 256 levels x 4096 floats = 4 MiB per activation row
        assert_eq!(block_rows_for(8, 4096, 1000), LUT_SCRATCH_BYTES / (4 << 20));
        // A single row over budget still gets a one-row block
        assert_eq!(block_rows_for(8, 65536, 1000), 1);
    }

    #[test]
    fn test_wide_eight_bit_table_within_budget() {
        let (m, k, n) = (2, 11, 4096);
        let block_rows = block_rows_for(8, n, k);
        assert!(block_rows < k);
        let table = ProductTable::new(8, n, block_rows).unwrap();
        assert!(table.size_bytes() <= LUT_SCRATCH_BYTES);

        let (w, a) = fixture(m, k, n, 8);
        let expected = NaiveBackend.matmul(&w, &a, dims(m, k, n)).unwrap();
        let got = configured(8).matmul(&w, &a, dims(m, k, n)).unwrap();
        assert_eq!(got, expected);
    }

    #[test]
    fn test_reconfigure_changes_range() {
        let mut lut = configured(8);
        let w = [200u8];
        assert!(lut.matmul(&w, &[1.0f32], dims(1, 1, 1)).is_ok());
        lut.generate_lut(4).unwrap();
        assert!(lut.matmul(&w, &[1.0f32], dims(1, 1, 1)).is_err());
    }
}
