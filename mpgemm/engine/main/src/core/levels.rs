//! Weight-level helpers: bit-width validation, range checks, and the caller-side
//! codecs for folding signed weights and scale/zero-point quantization into the
//! unsigned level range the engine consumes.

use crate::api::error::{GemmError, GemmResult};
use crate::api::types::MAX_BIT_WIDTH;

/// Largest level representable in `bit_width` bits. Callers validate `bit_width`.
#[inline]
pub(crate) fn level_mask(bit_width: u32) -> u8 {
    debug_assert!((1..=MAX_BIT_WIDTH).contains(&bit_width));
    ((1u16 << bit_width) - 1) as u8
}

/// Number of distinct levels (`2^bit_width`).
#[inline]
pub(crate) fn level_count(bit_width: u32) -> usize {
    1usize << bit_width
}

pub fn validate_bit_width(bit_width: u32) -> GemmResult<()> {
    if bit_width == 0 || bit_width > MAX_BIT_WIDTH {
        return Err(GemmError::Configuration(format!(
            "bit_width must be in 1..={}, got {}",
            MAX_BIT_WIDTH, bit_width
        )));
    }
    Ok(())
}

/// Largest valid level for `bit_width`, after validating it.
pub fn max_level(bit_width: u32) -> GemmResult<u8> {
    validate_bit_width(bit_width)?;
    Ok(level_mask(bit_width))
}

/// Reject the first level that does not fit in `bit_width` bits.
pub fn validate_levels(levels: &[u8], bit_width: u32) -> GemmResult<()> {
    let max = max_level(bit_width)?;
    match levels.iter().position(|&l| l > max) {
        Some(index) => Err(GemmError::LevelOutOfRange {
            index,
            level: levels[index],
            bit_width,
        }),
        None => Ok(()),
    }
}

/// Fold a signed weight into the unsigned level range (two's complement):
/// `-1 -> 2^bw - 1`, `-2^(bw-1) -> 2^(bw-1)`.
pub fn encode_signed_level(value: i8, bit_width: u32) -> GemmResult<u8> {
    validate_bit_width(bit_width)?;
    let half = 1i16 << (bit_width - 1);
    let v = value as i16;
    if v < -half || v >= half {
        return Err(GemmError::Configuration(format!(
            "signed weight {} does not fit in {} bits (range {}..={})",
            value,
            bit_width,
            -half,
            half - 1
        )));
    }
    Ok((v as u8) & level_mask(bit_width))
}

/// Inverse of [`encode_signed_level`]: levels `>= 2^(bw-1)` map to `level - 2^bw`.
pub fn decode_signed_level(level: u8, bit_width: u32) -> GemmResult<i8> {
    validate_bit_width(bit_width)?;
    if level > level_mask(bit_width) {
        return Err(GemmError::LevelOutOfRange {
            index: 0,
            level,
            bit_width,
        });
    }
    let half = 1i16 << (bit_width - 1);
    let l = level as i16;
    let signed = if l < half { l } else { l - (1i16 << bit_width) };
    Ok(signed as i8)
}

/// Bulk form of [`encode_signed_level`].
pub fn encode_signed_levels(values: &[i8], bit_width: u32) -> GemmResult<Vec<u8>> {
    values
        .iter()
        .map(|&v| encode_signed_level(v, bit_width))
        .collect()
}

/// Uniform affine quantization: `clamp(round(x / scale) + zero_point, 0, 2^bw - 1)`.
pub fn quantize_uniform(x: f32, scale: f32, zero_point: i32, bit_width: u32) -> GemmResult<u8> {
    validate_bit_width(bit_width)?;
    if !scale.is_finite() || scale == 0.0 {
        return Err(GemmError::Configuration(format!(
            "quantization scale must be finite and non-zero, got {}",
            scale
        )));
    }
    let q = (x / scale).round() as i64 + zero_point as i64;
    Ok(q.clamp(0, level_mask(bit_width) as i64) as u8)
}

/// Uniform affine dequantization: `(level - zero_point) * scale`.
pub fn dequantize_uniform(level: u8, scale: f32, zero_point: i32) -> f32 {
    (level as i32 - zero_point) as f32 * scale
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_mask() {
        assert_eq!(level_mask(1), 1);
        assert_eq!(level_mask(4), 15);
        assert_eq!(level_mask(8), 255);
        assert_eq!(level_count(4), 16);
    }

    #[test]
    fn test_max_level_validates() {
        assert_eq!(max_level(4).unwrap(), 15);
        assert_eq!(max_level(8).unwrap(), 255);
        assert!(matches!(max_level(9), Err(GemmError::Configuration(_))));
        assert!(matches!(max_level(0), Err(GemmError::Configuration(_))));
    }

    #[test]
    fn test_validate_bit_width() {
        assert!(validate_bit_width(0).is_err());
        assert!(validate_bit_width(9).is_err());
        for bw in 1..=8 {
            assert!(validate_bit_width(bw).is_ok());
        }
    }

    #[test]
    fn test_validate_levels_reports_first_offender() {
        let err = validate_levels(&[0, 15, 16, 200], 4).unwrap_err();
        assert_eq!(
            err,
            GemmError::LevelOutOfRange {
                index: 2,
                level: 16,
                bit_width: 4
            }
        );
        assert!(validate_levels(&[0, 15, 7], 4).is_ok());
    }

    #[test]
    fn test_signed_fold_int4() {
        // raw 7, 8, 0, 15 -> 7, -8, 0, -1
        let decoded: Vec<i8> = [7u8, 8, 0, 15]
            .iter()
            .map(|&l| decode_signed_level(l, 4).unwrap())
            .collect();
        assert_eq!(decoded, vec![7, -8, 0, -1]);
        assert_eq!(encode_signed_levels(&[7, -8, 0, -1], 4).unwrap(), vec![7, 8, 0, 15]);
    }

    #[test]
    fn test_signed_fold_rejects_out_of_range() {
        assert!(encode_signed_level(8, 4).is_err());
        assert!(encode_signed_level(-9, 4).is_err());
        assert_eq!(encode_signed_level(-128, 8).unwrap(), 128);
        assert_eq!(decode_signed_level(128, 8).unwrap(), -128);
    }

    #[test]
    fn test_quantize_uniform_clamps() {
        assert_eq!(quantize_uniform(0.26, 0.1, 0, 4).unwrap(), 3);
        assert_eq!(quantize_uniform(5.0, 0.1, 0, 4).unwrap(), 15);
        assert_eq!(quantize_uniform(-1.0, 0.1, 0, 4).unwrap(), 0);
        assert_eq!(quantize_uniform(-0.3, 0.1, 8, 4).unwrap(), 5);
        assert!(quantize_uniform(1.0, 0.0, 0, 4).is_err());
    }

    #[test]
    fn test_dequantize_uniform() {
        assert!((dequantize_uniform(5, 0.1, 8) + 0.3).abs() < 1e-6);
        assert_eq!(dequantize_uniform(3, 2.0, 0), 6.0);
    }
}
