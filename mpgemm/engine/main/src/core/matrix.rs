//! Matrix value types for quantized GEMM.
//!
//! `QuantizedMatrix` stores unsigned weight levels bit-packed at `bit_width` bits
//! per element, LSB-first across little-endian bytes. For 4-bit levels this is two
//! levels per byte with the even index in the low nibble.
//!
//! `ActivationMatrix` and `ResultMatrix` are plain row-major buffers.

use crate::api::error::{GemmError, GemmResult};
use crate::api::traits::ActivationElement;
use crate::api::types::MAX_BIT_WIDTH;
use crate::core::levels::{level_mask, validate_bit_width};

/// Row-major matrix of unsigned weight levels, bit-packed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantizedMatrix {
    rows: usize,
    cols: usize,
    bit_width: u32,
    packed: Vec<u8>,
}

impl QuantizedMatrix {
    /// All-zero matrix of the given shape and bit-width.
    pub fn zeros(rows: usize, cols: usize, bit_width: u32) -> GemmResult<Self> {
        validate_bit_width(bit_width)?;
        let len = rows.checked_mul(cols).ok_or_else(|| {
            GemmError::InvalidShape(format!("{} x {} overflows usize", rows, cols))
        })?;
        let bits = len.checked_mul(bit_width as usize).ok_or_else(|| {
            GemmError::InvalidShape(format!("{} levels of {} bits overflow usize", len, bit_width))
        })?;
        Ok(Self {
            rows,
            cols,
            bit_width,
            packed: vec![0u8; bits.div_ceil(8)],
        })
    }

    /// Pack a flat row-major level buffer. Every level must fit in `bit_width` bits.
    pub fn from_levels(levels: &[u8], rows: usize, cols: usize, bit_width: u32) -> GemmResult<Self> {
        let mut m = Self::zeros(rows, cols, bit_width)?;
        if levels.len() != m.len() {
            return Err(GemmError::shape("levels", m.len(), levels.len()));
        }
        let max = level_mask(bit_width);
        for (index, &level) in levels.iter().enumerate() {
            if level > max {
                return Err(GemmError::LevelOutOfRange {
                    index,
                    level,
                    bit_width,
                });
            }
            m.write(index, level);
        }
        Ok(m)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn bit_width(&self) -> u32 {
        self.bit_width
    }

    /// Number of logical levels (`rows * cols`).
    pub fn len(&self) -> usize {
        self.rows * self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Packed storage bytes.
    pub fn packed_bytes(&self) -> &[u8] {
        &self.packed
    }

    /// Bytes used by the packed storage.
    pub fn size_bytes(&self) -> usize {
        self.packed.len()
    }

    /// Level at `(i, j)`.
    ///
    /// # Panics
    /// If `i >= rows` or `j >= cols`.
    pub fn get(&self, i: usize, j: usize) -> u8 {
        assert!(
            i < self.rows && j < self.cols,
            "index ({}, {}) out of bounds for {}x{} matrix",
            i,
            j,
            self.rows,
            self.cols
        );
        self.read(i * self.cols + j)
    }

    /// Set the level at `(i, j)`. Levels wider than `bit_width` are rejected.
    ///
    /// # Panics
    /// If `i >= rows` or `j >= cols`.
    pub fn set(&mut self, i: usize, j: usize, level: u8) -> GemmResult<()> {
        assert!(
            i < self.rows && j < self.cols,
            "index ({}, {}) out of bounds for {}x{} matrix",
            i,
            j,
            self.rows,
            self.cols
        );
        let index = i * self.cols + j;
        if level > level_mask(self.bit_width) {
            return Err(GemmError::LevelOutOfRange {
                index,
                level,
                bit_width: self.bit_width,
            });
        }
        self.write(index, level);
        Ok(())
    }

    /// Iterate levels in row-major order.
    pub fn levels(&self) -> impl Iterator<Item = u8> + '_ {
        (0..self.len()).map(move |idx| self.read(idx))
    }

    /// Unpack into one `u8` per level, row-major. This is the layout backends consume.
    pub fn unpack(&self) -> Vec<u8> {
        if self.bit_width == MAX_BIT_WIDTH {
            return self.packed.clone();
        }
        self.levels().collect()
    }

    fn read(&self, idx: usize) -> u8 {
        let bit = idx * self.bit_width as usize;
        let byte = bit / 8;
        let shift = bit % 8;
        let mut word = self.packed[byte] as u16;
        if byte + 1 < self.packed.len() {
            word |= (self.packed[byte + 1] as u16) << 8;
        }
        ((word >> shift) as u8) & level_mask(self.bit_width)
    }

    fn write(&mut self, idx: usize, level: u8) {
        let bit = idx * self.bit_width as usize;
        let byte = bit / 8;
        let shift = bit % 8;
        let mask = (level_mask(self.bit_width) as u16) << shift;
        let value = ((level as u16) << shift) & mask;

        let spans = shift + self.bit_width as usize > 8;
        let mut word = self.packed[byte] as u16;
        if spans {
            word |= (self.packed[byte + 1] as u16) << 8;
        }
        word = (word & !mask) | value;
        self.packed[byte] = word as u8;
        if spans {
            self.packed[byte + 1] = (word >> 8) as u8;
        }
    }
}

/// Row-major `[K x N]` activation matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivationMatrix<A: ActivationElement = f32> {
    rows: usize,
    cols: usize,
    data: Vec<A>,
}

impl<A: ActivationElement> ActivationMatrix<A> {
    pub fn new(data: Vec<A>, rows: usize, cols: usize) -> GemmResult<Self> {
        let expected = rows.checked_mul(cols).ok_or_else(|| {
            GemmError::InvalidShape(format!("{} x {} overflows usize", rows, cols))
        })?;
        if data.len() != expected {
            return Err(GemmError::shape("activations", expected, data.len()));
        }
        Ok(Self { rows, cols, data })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn as_slice(&self) -> &[A] {
        &self.data
    }

    pub fn get(&self, i: usize, j: usize) -> A {
        self.data[i * self.cols + j]
    }

    /// Row `k` of the matrix.
    pub fn row(&self, k: usize) -> &[A] {
        &self.data[k * self.cols..(k + 1) * self.cols]
    }

    /// Widen every element to `f32`.
    pub fn to_f32_vec(&self) -> Vec<f32> {
        self.data.iter().map(|&v| v.to_f32()).collect()
    }

    pub fn into_vec(self) -> Vec<A> {
        self.data
    }
}

/// Row-major `[M x N]` GEMM output.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f32>,
}

impl ResultMatrix {
    pub fn new(data: Vec<f32>, rows: usize, cols: usize) -> GemmResult<Self> {
        let expected = rows.checked_mul(cols).ok_or_else(|| {
            GemmError::InvalidShape(format!("{} x {} overflows usize", rows, cols))
        })?;
        if data.len() != expected {
            return Err(GemmError::shape("result", expected, data.len()));
        }
        Ok(Self { rows, cols, data })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn get(&self, i: usize, j: usize) -> f32 {
        self.data[i * self.cols + j]
    }

    pub fn row(&self, i: usize) -> &[f32] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }
}
